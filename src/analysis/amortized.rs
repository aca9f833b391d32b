//! Amortized-analysis idiom recognition.
//!
//! Syntactic matchers for the classic amortized patterns, organized as a
//! priority-ordered registry (union-find and doubling-resize highest).
//! Each match yields an `Amortized` expression carrying both the
//! amortized and worst-case figures; the first matching pattern wins.

use crate::core::expr::{AmortizedMethod, Complexity};
use crate::core::variable::Variable;
use crate::lang::{AssignOp, BinOp, Block, Expr, Method, Stmt};

/// A recognized amortized idiom.
#[derive(Debug, Clone, PartialEq)]
pub struct AmortizedMatch {
    /// Stable pattern name for tooltips.
    pub pattern: &'static str,
    /// The amortized expression (amortized + worst-case costs).
    pub complexity: Complexity,
}

/// One syntactic matcher.
trait AmortizedPattern {
    fn name(&self) -> &'static str;
    fn priority(&self) -> i32;
    fn matches(&self, method: &Method) -> bool;
    fn complexity(&self, var: &Variable) -> Complexity;
}

/// Recursive find with path compression: `parent[x] = find(parent[x])`.
struct UnionFindPattern;

impl AmortizedPattern for UnionFindPattern {
    fn name(&self) -> &'static str {
        "union-find-path-compression"
    }

    fn priority(&self) -> i32 {
        100
    }

    fn matches(&self, method: &Method) -> bool {
        any_expr(&method.body, &mut |expr| {
            let Expr::Assign {
                target,
                op: AssignOp::Assign,
                value,
            } = expr
            else {
                return false;
            };
            // target: parent[x]; value: self-call with parent[x] inside.
            let Expr::Index { target: array, .. } = target.as_ref() else {
                return false;
            };
            let Expr::Call { callee, args } = value.as_ref() else {
                return false;
            };
            callee.callee_name() == Some(method.name.as_str())
                && args.iter().any(|arg| {
                    matches!(
                        arg,
                        Expr::Index { target: inner, .. }
                            if inner == array
                    )
                })
        })
    }

    fn complexity(&self, var: &Variable) -> Complexity {
        Complexity::amortized(
            Complexity::inverse_ackermann(var.clone()),
            Complexity::logarithmic(1.0, 2.0, var.clone()),
            AmortizedMethod::Potential,
            Some("rank-plus-path".to_owned()),
        )
    }
}

/// `if (count == capacity) { resize to capacity * 2 }`.
struct DoublingResizePattern;

impl AmortizedPattern for DoublingResizePattern {
    fn name(&self) -> &'static str {
        "dynamic-array-doubling"
    }

    fn priority(&self) -> i32 {
        90
    }

    fn matches(&self, method: &Method) -> bool {
        any_stmt(&method.body, &mut |stmt| {
            let Stmt::If {
                cond, then_branch, ..
            } = stmt
            else {
                return false;
            };
            let full_check = matches!(
                cond,
                Expr::Binary {
                    op: BinOp::Eq | BinOp::Ge,
                    left,
                    right,
                } if mentions_word(left, "count") && mentions_word(right, "capacity")
            );
            full_check && block_doubles_capacity(then_branch)
        })
    }

    fn complexity(&self, var: &Variable) -> Complexity {
        Complexity::amortized(
            Complexity::one(),
            Complexity::variable(var.clone()),
            AmortizedMethod::Aggregate,
            None,
        )
    }
}

/// Hash-load threshold check followed by a rehash.
struct RehashPattern;

impl AmortizedPattern for RehashPattern {
    fn name(&self) -> &'static str {
        "hash-load-rehash"
    }

    fn priority(&self) -> i32 {
        80
    }

    fn matches(&self, method: &Method) -> bool {
        any_stmt(&method.body, &mut |stmt| {
            let Stmt::If {
                cond, then_branch, ..
            } = stmt
            else {
                return false;
            };
            let load_check = expr_mentions_any(cond, &["load", "threshold", "factor"]);
            let rehashes = any_expr_in_block(then_branch, &mut |expr| {
                matches!(
                    expr,
                    Expr::Call { callee, .. }
                        if callee
                            .callee_name()
                            .is_some_and(|n| n.contains("Rehash") || n.contains("Resize"))
                )
            });
            load_check && rehashes
        })
    }

    fn complexity(&self, var: &Variable) -> Complexity {
        Complexity::amortized(
            Complexity::one(),
            Complexity::variable(var.clone()),
            AmortizedMethod::Accounting,
            None,
        )
    }
}

/// Binary-counter increment: `while (bits[i] == 1) { flip … }`.
struct BinaryCounterPattern;

impl AmortizedPattern for BinaryCounterPattern {
    fn name(&self) -> &'static str {
        "binary-counter"
    }

    fn priority(&self) -> i32 {
        70
    }

    fn matches(&self, method: &Method) -> bool {
        any_stmt(&method.body, &mut |stmt| {
            let (Stmt::While { cond, body, .. } | Stmt::DoWhile { body, cond, .. }) = stmt
            else {
                return false;
            };
            let checks_bit = matches!(
                cond,
                Expr::Binary {
                    op: BinOp::Eq,
                    left,
                    right,
                } if matches!(left.as_ref(), Expr::Index { .. })
                    && matches!(right.as_ref(), Expr::IntLit(1))
            );
            let flips = any_expr_in_block(body, &mut |expr| {
                matches!(
                    expr,
                    Expr::Assign { target, value, .. }
                        if matches!(target.as_ref(), Expr::Index { .. })
                            && matches!(value.as_ref(), Expr::IntLit(0))
                )
            });
            checks_bit && flips
        })
    }

    fn complexity(&self, var: &Variable) -> Complexity {
        Complexity::amortized(
            Complexity::one(),
            Complexity::logarithmic(1.0, 2.0, var.clone()),
            AmortizedMethod::Aggregate,
            Some("bit-flip-credit".to_owned()),
        )
    }
}

/// Multipop: a loop popping until empty or a budget runs out.
struct MultiPopPattern;

impl AmortizedPattern for MultiPopPattern {
    fn name(&self) -> &'static str {
        "stack-multipop"
    }

    fn priority(&self) -> i32 {
        60
    }

    fn matches(&self, method: &Method) -> bool {
        any_stmt(&method.body, &mut |stmt| {
            let (Stmt::While { body, .. } | Stmt::DoWhile { body, .. }) = stmt else {
                return false;
            };
            any_expr_in_block(body, &mut |expr| {
                matches!(
                    expr,
                    Expr::Call { callee, .. }
                        if callee.callee_name() == Some("Pop")
                )
            })
        })
    }

    fn complexity(&self, var: &Variable) -> Complexity {
        Complexity::amortized(
            Complexity::one(),
            Complexity::variable(var.clone()),
            AmortizedMethod::Accounting,
            None,
        )
    }
}

/// Match a method against the registry, highest priority first.
pub fn match_amortized(method: &Method, var: &Variable) -> Option<AmortizedMatch> {
    let patterns: [&dyn AmortizedPattern; 5] = [
        &UnionFindPattern,
        &DoublingResizePattern,
        &RehashPattern,
        &BinaryCounterPattern,
        &MultiPopPattern,
    ];
    // The array is kept priority-sorted; assert the invariant in debug.
    debug_assert!(patterns.windows(2).all(|w| w[0].priority() >= w[1].priority()));
    patterns
        .iter()
        .find(|p| p.matches(method))
        .map(|p| AmortizedMatch {
            pattern: p.name(),
            complexity: p.complexity(var),
        })
}

// ---------------------------------------------------------------------
// Small traversal helpers
// ---------------------------------------------------------------------

fn mentions_word(expr: &Expr, word: &str) -> bool {
    expr_mentions_any(expr, &[word])
}

fn expr_mentions_any(expr: &Expr, words: &[&str]) -> bool {
    let hit = |name: &str| {
        let lower = name.to_lowercase();
        words.iter().any(|w| lower.contains(w))
    };
    match expr {
        Expr::Ident(name) => hit(name),
        Expr::Member { target, name } => hit(name) || expr_mentions_any(target, words),
        Expr::Index { target, index } => {
            expr_mentions_any(target, words) || expr_mentions_any(index, words)
        }
        Expr::Call { callee, args } => {
            expr_mentions_any(callee, words) || args.iter().any(|a| expr_mentions_any(a, words))
        }
        Expr::Unary { operand, .. } => expr_mentions_any(operand, words),
        Expr::Binary { left, right, .. } => {
            expr_mentions_any(left, words) || expr_mentions_any(right, words)
        }
        Expr::Assign { target, value, .. } => {
            expr_mentions_any(target, words) || expr_mentions_any(value, words)
        }
        Expr::IncDec { target, .. } => expr_mentions_any(target, words),
        Expr::New { args, .. } => args.iter().any(|a| expr_mentions_any(a, words)),
        Expr::Await(inner) => expr_mentions_any(inner, words),
        _ => false,
    }
}

fn block_doubles_capacity(block: &Block) -> bool {
    any_expr_in_block(block, &mut |expr| match expr {
        // capacity = capacity * 2 / capacity *= 2
        Expr::Assign { target, op, value } => {
            let target_is_capacity = mentions_word(target, "capacity") || mentions_word(target, "size");
            target_is_capacity
                && (matches!(op, AssignOp::Mul | AssignOp::Shl)
                    || matches!(
                        value.as_ref(),
                        Expr::Binary { op: BinOp::Mul | BinOp::Shl, .. }
                    ))
        }
        // new T[capacity * 2]
        Expr::New { args, .. } => args.iter().any(|a| {
            matches!(
                a,
                Expr::Binary { op: BinOp::Mul | BinOp::Shl, left, .. }
                    if mentions_word(left, "capacity") || mentions_word(left, "size")
            )
        }),
        _ => false,
    })
}

fn any_stmt(block: &Block, predicate: &mut dyn FnMut(&Stmt) -> bool) -> bool {
    fn walk(statements: &[Stmt], predicate: &mut dyn FnMut(&Stmt) -> bool) -> bool {
        for stmt in statements {
            if predicate(stmt) {
                return true;
            }
            let nested = match stmt {
                Stmt::If {
                    then_branch,
                    else_branch,
                    ..
                } => {
                    walk(&then_branch.statements, predicate)
                        || else_branch
                            .as_ref()
                            .is_some_and(|b| walk(&b.statements, predicate))
                }
                Stmt::While { body, .. }
                | Stmt::DoWhile { body, .. }
                | Stmt::For { body, .. }
                | Stmt::ForEach { body, .. } => walk(&body.statements, predicate),
                Stmt::Block(block) => walk(&block.statements, predicate),
                _ => false,
            };
            if nested {
                return true;
            }
        }
        false
    }
    walk(&block.statements, predicate)
}

fn any_expr(block: &Block, predicate: &mut dyn FnMut(&Expr) -> bool) -> bool {
    any_stmt(block, &mut |stmt| {
        let exprs: Vec<&Expr> = match stmt {
            Stmt::Local { init: Some(e), .. }
            | Stmt::Expr { expr: e, .. }
            | Stmt::Throw { value: e, .. } => vec![e],
            Stmt::Return { value: Some(e), .. } => vec![e],
            Stmt::If { cond, .. }
            | Stmt::While { cond, .. }
            | Stmt::DoWhile { cond, .. } => vec![cond],
            Stmt::For { cond, update, .. } => {
                cond.iter().chain(update.iter()).collect()
            }
            Stmt::ForEach { iterable, .. } => vec![iterable],
            _ => vec![],
        };
        exprs.into_iter().any(|e| walk_expr(e, predicate))
    })
}

fn any_expr_in_block(block: &Block, predicate: &mut dyn FnMut(&Expr) -> bool) -> bool {
    any_expr(block, predicate)
}

fn walk_expr(expr: &Expr, predicate: &mut dyn FnMut(&Expr) -> bool) -> bool {
    if predicate(expr) {
        return true;
    }
    match expr {
        Expr::Member { target, .. } => walk_expr(target, predicate),
        Expr::Index { target, index } => {
            walk_expr(target, predicate) || walk_expr(index, predicate)
        }
        Expr::Call { callee, args } => {
            walk_expr(callee, predicate) || args.iter().any(|a| walk_expr(a, predicate))
        }
        Expr::Unary { operand, .. } => walk_expr(operand, predicate),
        Expr::Binary { left, right, .. } => {
            walk_expr(left, predicate) || walk_expr(right, predicate)
        }
        Expr::Assign { target, value, .. } => {
            walk_expr(target, predicate) || walk_expr(value, predicate)
        }
        Expr::IncDec { target, .. } => walk_expr(target, predicate),
        Expr::New { args, .. } => args.iter().any(|a| walk_expr(a, predicate)),
        Expr::Await(inner) => walk_expr(inner, predicate),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::parse_source;

    fn match_first(source: &str) -> Option<AmortizedMatch> {
        let file = parse_source(source);
        match_amortized(&file.methods[0], &Variable::n())
    }

    #[test]
    fn recognizes_dynamic_array_doubling() {
        let matched = match_first(
            "void Add(int item) {\n  if (count == capacity) { capacity = capacity * 2; Copy(); }\n  items[count] = item; count++;\n}",
        )
        .unwrap();
        assert_eq!(matched.pattern, "dynamic-array-doubling");
        assert_eq!(matched.complexity.big_o(), "O(1)");
    }

    #[test]
    fn recognizes_union_find_path_compression() {
        let matched = match_first(
            "int Find(int x) {\n  if (parent[x] != x) { parent[x] = Find(parent[x]); }\n  return parent[x];\n}",
        )
        .unwrap();
        assert_eq!(matched.pattern, "union-find-path-compression");
        assert_eq!(matched.complexity.big_o(), "O(α(n))");
    }

    #[test]
    fn recognizes_binary_counter() {
        let matched = match_first(
            "void Increment() {\n  int i = 0;\n  while (bits[i] == 1) { bits[i] = 0; i++; }\n  bits[i] = 1;\n}",
        )
        .unwrap();
        assert_eq!(matched.pattern, "binary-counter");
    }

    #[test]
    fn recognizes_multipop() {
        let matched = match_first(
            "void MultiPop(int k) {\n  while (count > 0 && k > 0) { stack.Pop(); k--; count--; }\n}",
        )
        .unwrap();
        assert_eq!(matched.pattern, "stack-multipop");
    }

    #[test]
    fn union_find_outranks_multipop() {
        // Contains both a pop loop and path compression; the higher
        // priority pattern must win.
        let matched = match_first(
            "int Find(int x) {\n  while (work.Count > 0) { work.Pop(); }\n  if (parent[x] != x) { parent[x] = Find(parent[x]); }\n  return parent[x];\n}",
        )
        .unwrap();
        assert_eq!(matched.pattern, "union-find-path-compression");
    }

    #[test]
    fn plain_methods_do_not_match() {
        assert!(match_first("int id(int x) { return x; }").is_none());
    }
}
