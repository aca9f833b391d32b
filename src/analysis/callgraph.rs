//! Call-graph construction and ordering.
//!
//! A directed multigraph over the compilation's methods, one edge per
//! invocation. Analysis proceeds leaves-first so every callee's bound is
//! known when its caller is processed; strongly connected components
//! (mutual recursion) are surfaced as units and delegated to the
//! mutual-recurrence reducer. Built once per session, then read-only.

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use tracing::debug;

use crate::lang::{Expr, Stmt};
use crate::semantic::{Resolution, SemanticModel};

/// One unit of the leaves-first analysis order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisUnit {
    /// A single method (possibly directly recursive).
    Single(usize),
    /// A mutual-recursion cycle, all members solved together.
    Cycle(Vec<usize>),
}

/// The call graph of one compilation.
pub struct CallGraph {
    graph: DiGraph<usize, ()>,
    nodes: Vec<NodeIndex>,
}

impl CallGraph {
    /// Build the graph by resolving every invocation in every method.
    pub fn build(semantics: &dyn SemanticModel) -> Self {
        let mut graph = DiGraph::new();
        let nodes: Vec<NodeIndex> = (0..semantics.method_count())
            .map(|index| graph.add_node(index))
            .collect();

        for caller in 0..semantics.method_count() {
            let Some(method) = semantics.method_at(caller) else {
                continue;
            };
            let mut callees = Vec::new();
            collect_calls(&method.body.statements, &mut |callee, arity| {
                // Self-recognition by name covers single-method fragments.
                if callee.as_ident() == Some(method.name.as_str()) {
                    callees.push(caller);
                    return;
                }
                if let Resolution::Method(target) = semantics.resolve_call(method, callee, arity)
                {
                    callees.push(target);
                }
            });
            for target in callees {
                graph.add_edge(nodes[caller], nodes[target], ());
            }
        }

        debug!(
            methods = nodes.len(),
            edges = graph.edge_count(),
            "call graph built"
        );
        CallGraph { graph, nodes }
    }

    /// Direct callees of a method (with duplicates, one per call site).
    pub fn callees(&self, index: usize) -> Vec<usize> {
        self.graph
            .edges_directed(self.nodes[index], Direction::Outgoing)
            .map(|e| self.graph[e.target()])
            .collect()
    }

    /// Direct callers of a method.
    pub fn callers(&self, index: usize) -> Vec<usize> {
        self.graph
            .edges_directed(self.nodes[index], Direction::Incoming)
            .map(|e| self.graph[e.source()])
            .collect()
    }

    /// Methods nobody calls.
    pub fn entry_points(&self) -> Vec<usize> {
        (0..self.nodes.len())
            .filter(|&i| self.callers(i).iter().all(|&c| c == i))
            .collect()
    }

    /// Methods that call nobody.
    pub fn leaves(&self) -> Vec<usize> {
        (0..self.nodes.len())
            .filter(|&i| self.callees(i).iter().all(|&c| c == i))
            .collect()
    }

    /// Leaves-first topological order over single methods.
    ///
    /// `Err` carries the cycles when the graph is not acyclic; callers
    /// then use [`CallGraph::analysis_order`] instead.
    pub fn topological_order(&self) -> Result<Vec<usize>, Vec<Vec<usize>>> {
        match toposort(&self.graph, None) {
            // toposort yields callers before callees; reverse for
            // leaves-first.
            Ok(order) => Ok(order.into_iter().rev().map(|n| self.graph[n]).collect()),
            Err(_) => Err(self
                .cycles()
                .into_iter()
                .filter(|scc| scc.len() > 1)
                .collect()),
        }
    }

    /// All strongly connected components with more than one member, or
    /// with a self-loop.
    pub fn cycles(&self) -> Vec<Vec<usize>> {
        tarjan_scc(&self.graph)
            .into_iter()
            .map(|scc| scc.into_iter().map(|n| self.graph[n]).collect())
            .collect()
    }

    /// The leaves-first analysis order: SCCs of the condensation,
    /// callees before callers, multi-member SCCs flagged as cycles.
    pub fn analysis_order(&self) -> Vec<AnalysisUnit> {
        // Tarjan yields SCCs in reverse topological order of the
        // condensation, which with caller→callee edges is leaves-first.
        tarjan_scc(&self.graph)
            .into_iter()
            .map(|scc| {
                if scc.len() == 1 {
                    AnalysisUnit::Single(self.graph[scc[0]])
                } else {
                    let mut members: Vec<usize> =
                        scc.into_iter().map(|n| self.graph[n]).collect();
                    members.sort_unstable();
                    AnalysisUnit::Cycle(members)
                }
            })
            .collect()
    }

    /// Whether `from` can reach `to` through calls.
    pub fn is_reachable(&self, from: usize, to: usize) -> bool {
        petgraph::algo::has_path_connecting(&self.graph, self.nodes[from], self.nodes[to], None)
    }
}

/// Invoke `sink` for every call expression in a statement list.
fn collect_calls(statements: &[Stmt], sink: &mut impl FnMut(&Expr, usize)) {
    for stmt in statements {
        match stmt {
            Stmt::Local { init: Some(e), .. }
            | Stmt::Expr { expr: e, .. }
            | Stmt::Throw { value: e, .. } => collect_calls_expr(e, sink),
            Stmt::Return { value: Some(e), .. } => collect_calls_expr(e, sink),
            Stmt::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                collect_calls_expr(cond, sink);
                collect_calls(&then_branch.statements, sink);
                if let Some(branch) = else_branch {
                    collect_calls(&branch.statements, sink);
                }
            }
            Stmt::While { cond, body, .. } | Stmt::DoWhile { body, cond, .. } => {
                collect_calls_expr(cond, sink);
                collect_calls(&body.statements, sink);
            }
            Stmt::For {
                init,
                cond,
                update,
                body,
                ..
            } => {
                if let Some(init) = init {
                    collect_calls(std::slice::from_ref(init), sink);
                }
                if let Some(cond) = cond {
                    collect_calls_expr(cond, sink);
                }
                if let Some(update) = update {
                    collect_calls_expr(update, sink);
                }
                collect_calls(&body.statements, sink);
            }
            Stmt::ForEach { iterable, body, .. } => {
                collect_calls_expr(iterable, sink);
                collect_calls(&body.statements, sink);
            }
            Stmt::Block(block) => collect_calls(&block.statements, sink),
            _ => {}
        }
    }
}

fn collect_calls_expr(expr: &Expr, sink: &mut impl FnMut(&Expr, usize)) {
    match expr {
        Expr::Call { callee, args } => {
            sink(callee, args.len());
            collect_calls_expr(callee, sink);
            for arg in args {
                collect_calls_expr(arg, sink);
            }
        }
        Expr::Member { target, .. } => collect_calls_expr(target, sink),
        Expr::Index { target, index } => {
            collect_calls_expr(target, sink);
            collect_calls_expr(index, sink);
        }
        Expr::Unary { operand, .. } | Expr::Await(operand) => collect_calls_expr(operand, sink),
        Expr::Binary { left, right, .. } => {
            collect_calls_expr(left, sink);
            collect_calls_expr(right, sink);
        }
        Expr::Assign { target, value, .. } => {
            collect_calls_expr(target, sink);
            collect_calls_expr(value, sink);
        }
        Expr::IncDec { target, .. } => collect_calls_expr(target, sink),
        Expr::New { args, .. } => {
            for arg in args {
                collect_calls_expr(arg, sink);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::parse_source;
    use crate::semantic::FileSemantics;

    fn graph_of(source: &str) -> (crate::lang::SourceFile, Vec<AnalysisUnit>) {
        let file = parse_source(source);
        let semantics = FileSemantics::new(&file);
        let graph = CallGraph::build(&semantics);
        let order = graph.analysis_order();
        (file, order)
    }

    #[test]
    fn callees_come_before_callers() {
        let (file, order) = graph_of(
            "int leaf(int n) { return n; }\nint mid(int n) { return leaf(n); }\nint top(int n) { return mid(n); }",
        );
        let position = |name: &str| {
            let index = file.methods.iter().position(|m| m.name == name).unwrap();
            order
                .iter()
                .position(|u| matches!(u, AnalysisUnit::Single(i) if *i == index))
                .unwrap()
        };
        assert!(position("leaf") < position("mid"));
        assert!(position("mid") < position("top"));
    }

    #[test]
    fn mutual_recursion_surfaces_as_a_cycle() {
        let (file, order) = graph_of(
            "bool isEven(int n) { if (n == 0) { return true; } return isOdd(n - 1); }\nbool isOdd(int n) { if (n == 0) { return false; } return isEven(n - 1); }",
        );
        assert_eq!(file.methods.len(), 2);
        assert!(order
            .iter()
            .any(|u| matches!(u, AnalysisUnit::Cycle(members) if members.len() == 2)));
    }

    #[test]
    fn direct_recursion_stays_single() {
        let (_, order) = graph_of("int f(int n) { if (n <= 1) { return 1; } return f(n - 1); }");
        assert_eq!(order.len(), 1);
        assert!(matches!(order[0], AnalysisUnit::Single(0)));
    }

    #[test]
    fn toposort_fails_on_cycles_with_cycle_report() {
        let file = parse_source(
            "void a(int n) { b(n); }\nvoid b(int n) { a(n - 1); }",
        );
        let semantics = FileSemantics::new(&file);
        let graph = CallGraph::build(&semantics);
        let cycles = graph.topological_order().unwrap_err();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].len(), 2);
    }

    #[test]
    fn entries_and_leaves_enumerate() {
        let file = parse_source(
            "int leaf(int n) { return n; }\nint top(int n) { return leaf(n); }",
        );
        let semantics = FileSemantics::new(&file);
        let graph = CallGraph::build(&semantics);
        assert_eq!(graph.leaves(), vec![0]);
        assert_eq!(graph.entry_points(), vec![1]);
        assert!(graph.is_reachable(1, 0));
        assert!(!graph.is_reachable(0, 1));
    }
}
