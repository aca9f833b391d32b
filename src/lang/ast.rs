//! Source-language syntax tree.
//!
//! The analyzed language is a small C-style procedural language (methods
//! with typed parameters, counter loops, foreach, invocations, member
//! access, annotations and doc comments). The tree is deliberately plain:
//! the pattern extractor consumes it through ordinary matches, and hosts
//! with their own front end can build it directly instead of going
//! through the text parser.

use crate::core::error::{Diagnostic, Span};

/// A parsed compilation unit.
#[derive(Debug, Clone, Default)]
pub struct SourceFile {
    /// Every method found, in source order (class bodies are flattened).
    pub methods: Vec<Method>,
    /// Interface declarations, used for polymorphic-target detection.
    pub interfaces: Vec<Interface>,
    /// Comments encountered anywhere in the file.
    pub comments: Vec<Comment>,
    /// Recovery diagnostics; parsing never fails outright.
    pub diagnostics: Vec<Diagnostic>,
}

impl SourceFile {
    /// Find a method by name.
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Comments whose span falls inside `span`.
    pub fn comments_within(&self, span: Span) -> impl Iterator<Item = &Comment> {
        self.comments
            .iter()
            .filter(move |c| c.span.start() >= span.start() && c.span.end() <= span.end())
    }
}

/// An interface declaration: a named set of method signatures.
#[derive(Debug, Clone)]
pub struct Interface {
    /// Interface name.
    pub name: String,
    /// Declared member signatures.
    pub members: Vec<MethodSignature>,
}

/// A bodiless method signature (interface member or abstract method).
#[derive(Debug, Clone)]
pub struct MethodSignature {
    /// Member name.
    pub name: String,
    /// Parameter count.
    pub arity: usize,
}

/// Modifiers that matter to the analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// `abstract` — polymorphic target.
    pub is_abstract: bool,
    /// `virtual` (without `sealed`) — polymorphic target.
    pub is_virtual: bool,
    /// `sealed` — devirtualized.
    pub is_sealed: bool,
    /// `async` — asynchronous decoration.
    pub is_async: bool,
    /// `static`.
    pub is_static: bool,
}

/// An attribute-style annotation: `[Complexity("O(n log n)")]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Annotation name.
    pub name: String,
    /// Single string argument, when present.
    pub argument: Option<String>,
}

/// A method declaration with its body.
#[derive(Debug, Clone)]
pub struct Method {
    /// Method name.
    pub name: String,
    /// Declared return type, when present.
    pub return_type: Option<String>,
    /// Parameters in declaration order.
    pub params: Vec<Param>,
    /// The body block (empty for abstract methods).
    pub body: Block,
    /// Modifiers.
    pub modifiers: Modifiers,
    /// Annotations preceding the declaration.
    pub annotations: Vec<Annotation>,
    /// Doc-comment lines (`///`) preceding the declaration.
    pub doc_comment: Vec<String>,
    /// Source span of the whole declaration.
    pub span: Span,
}

impl Method {
    /// Parameter position by name.
    pub fn param_index(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p.name == name)
    }
}

/// A typed parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Declared type name (`int`, `int[]`, `List`, `ISorter`, …).
    pub type_name: String,
    /// Parameter name.
    pub name: String,
}

impl Param {
    /// Whether the declared type is an array or collection shape.
    pub fn is_collection(&self) -> bool {
        self.type_name.ends_with("[]")
            || matches!(
                self.type_name.as_str(),
                "List" | "Array" | "Dictionary" | "HashSet" | "Queue" | "Stack" | "Span"
            )
    }

    /// Whether the declared type is a string.
    pub fn is_string(&self) -> bool {
        self.type_name == "string" || self.type_name == "String"
    }

    /// Whether the declared type names an interface by the `I`-prefix
    /// convention (`ISorter`, `IComparer`).
    pub fn is_interface_shaped(&self) -> bool {
        let mut chars = self.type_name.chars();
        matches!(
            (chars.next(), chars.next()),
            (Some('I'), Some(second)) if second.is_ascii_uppercase()
        )
    }
}

/// A `{ … }` block.
#[derive(Debug, Clone, Default)]
pub struct Block {
    /// Statements in order.
    pub statements: Vec<Stmt>,
    /// Source span.
    pub span: Span,
}

impl Block {
    /// True when the block holds no statements.
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// A statement.
#[derive(Debug, Clone)]
pub enum Stmt {
    /// `int x = e;` / `var x = e;`
    Local {
        /// Declared type, when written.
        ty: Option<String>,
        /// Variable name.
        name: String,
        /// Initializer.
        init: Option<Expr>,
        /// Source span.
        span: Span,
    },
    /// A bare expression statement.
    Expr {
        /// The expression.
        expr: Expr,
        /// Source span.
        span: Span,
    },
    /// `if (cond) { … } else { … }`
    If {
        /// Condition.
        cond: Expr,
        /// Then branch.
        then_branch: Block,
        /// Else branch (an `else if` nests another `If`).
        else_branch: Option<Block>,
        /// Source span.
        span: Span,
    },
    /// `while (cond) { … }`
    While {
        /// Condition.
        cond: Expr,
        /// Body.
        body: Block,
        /// Source span.
        span: Span,
    },
    /// `do { … } while (cond);`
    DoWhile {
        /// Body.
        body: Block,
        /// Condition.
        cond: Expr,
        /// Source span.
        span: Span,
    },
    /// `for (init; cond; update) { … }`
    For {
        /// Init statement (local or expression).
        init: Option<Box<Stmt>>,
        /// Loop condition.
        cond: Option<Expr>,
        /// Update expression.
        update: Option<Expr>,
        /// Body.
        body: Block,
        /// Source span.
        span: Span,
    },
    /// `foreach (var x in e) { … }`
    ForEach {
        /// Element variable name.
        var_name: String,
        /// Iterated expression.
        iterable: Expr,
        /// Body.
        body: Block,
        /// Source span.
        span: Span,
    },
    /// `return e;`
    Return {
        /// Returned value, when present.
        value: Option<Expr>,
        /// Source span.
        span: Span,
    },
    /// `throw e;`
    Throw {
        /// Thrown value.
        value: Expr,
        /// Source span.
        span: Span,
    },
    /// `break;`
    Break {
        /// Source span.
        span: Span,
    },
    /// `continue;`
    Continue {
        /// Source span.
        span: Span,
    },
    /// A nested block.
    Block(Block),
    /// A region the parser recovered past.
    Error {
        /// Source span.
        span: Span,
    },
}

impl Stmt {
    /// Source span of the statement.
    pub fn span(&self) -> Span {
        match self {
            Stmt::Local { span, .. }
            | Stmt::Expr { span, .. }
            | Stmt::If { span, .. }
            | Stmt::While { span, .. }
            | Stmt::DoWhile { span, .. }
            | Stmt::For { span, .. }
            | Stmt::ForEach { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::Throw { span, .. }
            | Stmt::Break { span }
            | Stmt::Continue { span }
            | Stmt::Error { span } => *span,
            Stmt::Block(block) => block.span,
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `&&`
    And,
    /// `||`
    Or,
}

/// Compound-assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    /// `=`
    Assign,
    /// `+=`
    Add,
    /// `-=`
    Sub,
    /// `*=`
    Mul,
    /// `/=`
    Div,
    /// `%=`
    Mod,
    /// `<<=`
    Shl,
    /// `>>=`
    Shr,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-`
    Neg,
    /// `!`
    Not,
}

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Integer literal.
    IntLit(i64),
    /// Floating literal.
    FloatLit(f64),
    /// Boolean literal.
    BoolLit(bool),
    /// `null`.
    NullLit,
    /// String literal.
    StringLit(String),
    /// Identifier reference.
    Ident(String),
    /// `target.name`
    Member {
        /// The accessed value.
        target: Box<Expr>,
        /// Member name.
        name: String,
    },
    /// `target[index]`
    Index {
        /// The indexed value.
        target: Box<Expr>,
        /// Index expression.
        index: Box<Expr>,
    },
    /// `callee(args…)` — callee is an identifier or member access.
    Call {
        /// Called expression.
        callee: Box<Expr>,
        /// Arguments in order.
        args: Vec<Expr>,
    },
    /// Unary operator application.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// Operand.
        operand: Box<Expr>,
    },
    /// Binary operator application.
    Binary {
        /// The operator.
        op: BinOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
    /// Assignment, plain or compound.
    Assign {
        /// Assigned place.
        target: Box<Expr>,
        /// The operator.
        op: AssignOp,
        /// Assigned value.
        value: Box<Expr>,
    },
    /// `x++` / `--x` and friends.
    IncDec {
        /// Mutated place.
        target: Box<Expr>,
        /// `true` for `++`.
        increment: bool,
    },
    /// `new Type(args…)` / `new Type[size]`
    New {
        /// Constructed type name.
        type_name: String,
        /// Constructor or size arguments.
        args: Vec<Expr>,
    },
    /// `await e`
    Await(Box<Expr>),
    /// A sub-expression the parser recovered past.
    Error,
}

impl Expr {
    /// The identifier name, when this is a bare identifier.
    pub fn as_ident(&self) -> Option<&str> {
        match self {
            Expr::Ident(name) => Some(name),
            _ => None,
        }
    }

    /// The callee's terminal name for a call: `f(…)` gives `f`,
    /// `list.Sort(…)` gives `Sort`.
    pub fn callee_name(&self) -> Option<&str> {
        match self {
            Expr::Ident(name) => Some(name),
            Expr::Member { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// A retained comment.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    /// Comment text without delimiters.
    pub text: String,
    /// Source span.
    pub span: Span,
    /// True for `///` doc comments.
    pub doc: bool,
}

impl Comment {
    /// Whether the text carries an unfinished-work marker.
    pub fn has_incomplete_marker(&self) -> bool {
        const MARKERS: [&str; 5] = ["TODO", "FIXME", "HACK", "XXX", "UNDONE"];
        MARKERS.iter().any(|m| self.text.contains(m))
    }
}
