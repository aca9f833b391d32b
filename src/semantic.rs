//! Semantic lookup.
//!
//! The extractor never inspects syntax alone to decide what a call
//! means: it asks a [`SemanticModel`], which resolves an invocation to a
//! method in the compilation, a library call, a polymorphic target, or
//! `Unresolved`. [`FileSemantics`] is the built-in model over a single
//! parsed file; hosts with a richer front end can implement the trait
//! themselves.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::lang::{Expr, Method, SourceFile, Stmt};

/// What an invocation resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A method declared in the analyzed compilation (by index).
    Method(usize),
    /// A standard-library call, to be looked up in the complexity table.
    Library {
        /// Receiver type name (normalized by the table).
        type_name: String,
        /// Member name.
        method: String,
        /// Argument count.
        arity: usize,
    },
    /// A polymorphic target (interface, abstract, or virtual non-sealed):
    /// the concrete cost is unknowable statically.
    Polymorphic {
        /// Declared receiver type or declaring type name.
        type_name: String,
        /// Member name.
        member: String,
    },
    /// The semantic model could not resolve the callee.
    Unresolved,
}

/// Resolves identifiers and invocations to declarations.
pub trait SemanticModel {
    /// Resolve an invocation expression appearing inside `caller`.
    fn resolve_call(&self, caller: &Method, callee: &Expr, arity: usize) -> Resolution;

    /// The declared type of a name visible in `caller` (parameter or
    /// local), when known.
    fn declared_type(&self, caller: &Method, name: &str) -> Option<String>;

    /// The method declarations of the compilation, for call-graph
    /// construction.
    fn method_count(&self) -> usize;

    /// A method by index.
    fn method_at(&self, index: usize) -> Option<&Method>;
}

/// Built-in semantic model over one parsed [`SourceFile`].
pub struct FileSemantics<'src> {
    file: &'src SourceFile,
    method_indices: FxHashMap<String, usize>,
    interface_names: FxHashSet<String>,
}

impl<'src> FileSemantics<'src> {
    /// Index a parsed file.
    pub fn new(file: &'src SourceFile) -> Self {
        let method_indices = file
            .methods
            .iter()
            .enumerate()
            .map(|(i, m)| (m.name.clone(), i))
            .collect();
        let interface_names = file.interfaces.iter().map(|i| i.name.clone()).collect();
        FileSemantics {
            file,
            method_indices,
            interface_names,
        }
    }

    /// The underlying file.
    pub fn file(&self) -> &SourceFile {
        self.file
    }

    /// Whether a type name denotes an interface: declared in the file, or
    /// following the `IName` convention.
    fn is_interface_type(&self, type_name: &str) -> bool {
        if self.interface_names.contains(type_name) {
            return true;
        }
        let mut chars = type_name.chars();
        matches!(
            (chars.next(), chars.next()),
            (Some('I'), Some(second)) if second.is_ascii_uppercase()
        )
    }

    fn receiver_type(&self, caller: &Method, receiver: &Expr) -> Option<String> {
        match receiver {
            Expr::Ident(name) => self.declared_type(caller, name),
            // Chained receivers: give the table a chance via the member name.
            Expr::Member { .. } | Expr::Index { .. } | Expr::Call { .. } => None,
            _ => None,
        }
    }
}

/// Find the declared type of a local in a statement list.
fn local_type<'a>(statements: &'a [Stmt], name: &str) -> Option<&'a str> {
    for stmt in statements {
        match stmt {
            Stmt::Local {
                ty: Some(ty),
                name: local_name,
                ..
            } if local_name == name => return Some(ty),
            Stmt::Local {
                ty: None,
                name: local_name,
                init: Some(Expr::New { type_name, .. }),
                ..
            } if local_name == name => return Some(type_name),
            Stmt::If {
                then_branch,
                else_branch,
                ..
            } => {
                if let Some(ty) = local_type(&then_branch.statements, name) {
                    return Some(ty);
                }
                if let Some(branch) = else_branch {
                    if let Some(ty) = local_type(&branch.statements, name) {
                        return Some(ty);
                    }
                }
            }
            Stmt::While { body, .. }
            | Stmt::DoWhile { body, .. }
            | Stmt::For { body, .. }
            | Stmt::ForEach { body, .. } => {
                if let Some(ty) = local_type(&body.statements, name) {
                    return Some(ty);
                }
            }
            Stmt::Block(block) => {
                if let Some(ty) = local_type(&block.statements, name) {
                    return Some(ty);
                }
            }
            _ => {}
        }
    }
    None
}

impl SemanticModel for FileSemantics<'_> {
    fn resolve_call(&self, caller: &Method, callee: &Expr, arity: usize) -> Resolution {
        match callee {
            Expr::Ident(name) => match self.method_indices.get(name) {
                Some(&index) => {
                    let target = &self.file.methods[index];
                    if target.modifiers.is_abstract
                        || (target.modifiers.is_virtual && !target.modifiers.is_sealed)
                    {
                        Resolution::Polymorphic {
                            type_name: String::new(),
                            member: name.clone(),
                        }
                    } else {
                        Resolution::Method(index)
                    }
                }
                None => Resolution::Unresolved,
            },
            Expr::Member { target, name } => {
                match self.receiver_type(caller, target) {
                    Some(type_name) if self.is_interface_type(&type_name) => {
                        Resolution::Polymorphic {
                            type_name,
                            member: name.clone(),
                        }
                    }
                    Some(type_name) => Resolution::Library {
                        type_name,
                        method: name.clone(),
                        arity,
                    },
                    // Unknown receiver: let the table try by member name.
                    None => Resolution::Library {
                        type_name: String::new(),
                        method: name.clone(),
                        arity,
                    },
                }
            }
            _ => Resolution::Unresolved,
        }
    }

    fn declared_type(&self, caller: &Method, name: &str) -> Option<String> {
        if let Some(param) = caller.params.iter().find(|p| p.name == name) {
            return Some(param.type_name.clone());
        }
        local_type(&caller.body.statements, name).map(str::to_owned)
    }

    fn method_count(&self) -> usize {
        self.file.methods.len()
    }

    fn method_at(&self, index: usize) -> Option<&Method> {
        self.file.methods.get(index)
    }
}
