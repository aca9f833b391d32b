//! The pattern extractor.
//!
//! Walks one method bottom-up, composing per-statement costs with the
//! rules in [`super::compose`], inferring loop bounds, collecting
//! recursive calls into a recurrence, matching amortized idioms and
//! recording the raw material for the confidence score. Array indexing
//! and simple arithmetic normalize to O(1); only calls, loops and
//! allocations can raise a statement's cost.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::analysis::amortized::{match_amortized, AmortizedMatch};
use crate::analysis::compose::{apply_call, branch, nest, sequence};
use crate::analysis::context::AnalysisContext;
use crate::analysis::effects::{detect, EffectDecorations};
use crate::analysis::loops::{
    infer_for_bound, infer_foreach_bound, infer_while_bound, size_expr, LoopPattern,
};
use crate::analysis::recursion::{
    classify_call, midpoint_locals, to_recurrence, ArgReduction, RecursiveCall,
};
use crate::core::confidence::Confidence;
use crate::core::expr::{AllocationSite, Complexity, MemoryProfile};
use crate::lang::{Expr, Method, Stmt};
use crate::recurrence::RecurrenceRelation;
use crate::semantic::{Resolution, SemanticModel};
use crate::simplification::simplify_expr;
use crate::stdlib::{conservative_default, LibraryTable, Provenance};

/// The extractor's verdict on one method.
#[derive(Debug, Clone)]
pub struct MethodAnalysis {
    /// Composed non-recursive cost, simplified.
    pub complexity: Complexity,
    /// The recurrence, when the method recurses into itself.
    pub recurrence: Option<RecurrenceRelation>,
    /// Calls into other members of the same SCC (mutual recursion),
    /// with their argument reductions.
    pub cycle_calls: Vec<(usize, RecursiveCall)>,
    /// Extraction confidence (solver confidence is composed later).
    pub confidence: Confidence,
    /// Human-readable warnings.
    pub warnings: Vec<String>,
    /// Matched amortized idiom, if any.
    pub amortized: Option<AmortizedMatch>,
    /// Parallel/probabilistic/async decorations.
    pub decorations: EffectDecorations,
    /// Space profile.
    pub space: MemoryProfile,
    /// Polymorphic dependencies (`Type.Member`) blocking a tight bound.
    pub polymorphic_dependencies: Vec<String>,
    /// True when a recursive call passes its argument through unreduced.
    pub non_reducing_recursion: bool,
}

/// Extracts patterns from methods, given semantics, the library table
/// and the bounds of already-analyzed callees.
pub struct PatternExtractor<'a> {
    semantics: &'a dyn SemanticModel,
    table: &'a dyn LibraryTable,
    callee_bounds: &'a FxHashMap<usize, Complexity>,
    cycle_members: &'a [usize],
    max_call_depth: usize,
}

impl<'a> PatternExtractor<'a> {
    /// Create an extractor. `callee_bounds` holds solved bounds by
    /// method index; `cycle_members` lists the indices of the SCC the
    /// current method belongs to (empty outside cycles).
    pub fn new(
        semantics: &'a dyn SemanticModel,
        table: &'a dyn LibraryTable,
        callee_bounds: &'a FxHashMap<usize, Complexity>,
        cycle_members: &'a [usize],
        max_call_depth: usize,
    ) -> Self {
        PatternExtractor {
            semantics,
            table,
            callee_bounds,
            cycle_members,
            max_call_depth,
        }
    }

    /// Analyze one method. `self_index` is the method's own index in the
    /// compilation, used to recognize direct recursion.
    pub fn analyze(&self, method: &Method, self_index: Option<usize>) -> MethodAnalysis {
        let ctx = AnalysisContext::for_method(method, self.max_call_depth);
        let mut walker = Walker {
            extractor: self,
            method,
            self_index,
            midpoints: midpoint_locals(method),
            recursive_calls: Vec::new(),
            cycle_calls: Vec::new(),
            warnings: Vec::new(),
            polymorphic_dependencies: Vec::new(),
            library_calls: 0,
            unresolved_calls: 0,
            unknown_loops: 0,
            allocations: Vec::new(),
            loop_multiplier: Complexity::one(),
        };

        let body_cost = walker.block_cost(&method.body.statements, &ctx);
        let work = simplify_expr(body_cost);
        let primary = ctx.primary_variable();

        let non_reducing = walker.recursive_calls.iter().any(|c| {
            matches!(
                c.reduction,
                ArgReduction::PassThrough | ArgReduction::Unknown
            )
        });
        let recurrence = to_recurrence(&walker.recursive_calls, work.clone(), primary.clone());
        if recurrence.is_some() {
            debug!(method = %method.name, "recurrence detected");
        }

        let amortized = match_amortized(method, &primary);

        // Confidence: structural baseline, degraded per uncertainty
        // source found during the walk.
        let confidence = Confidence::STRUCTURAL
            .penalize(Confidence::LIBRARY_CALL, walker.library_calls)
            .penalize(
                Confidence::POLYMORPHIC_CALL,
                walker.polymorphic_dependencies.len() + walker.unresolved_calls,
            )
            .penalize(Confidence::new(0.8), walker.unknown_loops);

        let complexity = match &amortized {
            Some(matched) => matched.complexity.clone(),
            None => work,
        };

        let space = walker.space_profile(recurrence.as_ref());

        MethodAnalysis {
            complexity,
            recurrence: if amortized.is_some() { None } else { recurrence },
            cycle_calls: walker.cycle_calls,
            confidence,
            warnings: walker.warnings,
            amortized,
            decorations: detect(method),
            space,
            polymorphic_dependencies: walker.polymorphic_dependencies,
            non_reducing_recursion: non_reducing,
        }
    }
}

struct Walker<'a, 'b> {
    extractor: &'b PatternExtractor<'a>,
    method: &'b Method,
    self_index: Option<usize>,
    midpoints: Vec<String>,
    recursive_calls: Vec<RecursiveCall>,
    cycle_calls: Vec<(usize, RecursiveCall)>,
    warnings: Vec<String>,
    polymorphic_dependencies: Vec<String>,
    library_calls: usize,
    unresolved_calls: usize,
    unknown_loops: usize,
    allocations: Vec<AllocationSite>,
    loop_multiplier: Complexity,
}

impl Walker<'_, '_> {
    fn block_cost(&mut self, statements: &[Stmt], ctx: &AnalysisContext) -> Complexity {
        sequence(statements.iter().map(|s| self.stmt_cost(s, ctx)).collect::<Vec<_>>())
    }

    fn stmt_cost(&mut self, stmt: &Stmt, ctx: &AnalysisContext) -> Complexity {
        match stmt {
            Stmt::Local { init, .. } => init
                .as_ref()
                .map_or_else(Complexity::one, |e| self.expr_cost(e, ctx)),
            Stmt::Expr { expr, .. } => self.expr_cost(expr, ctx),
            Stmt::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                let cond_cost = self.expr_cost(cond, ctx);
                let then_cost = self.block_cost(&then_branch.statements, ctx);
                let else_cost = else_branch
                    .as_ref()
                    .map(|b| self.block_cost(&b.statements, ctx));
                let branches = match else_cost {
                    Some(e) => branch([then_cost, e]),
                    None => branch([then_cost, Complexity::one()]),
                };
                Complexity::plus(cond_cost, branches)
            }
            Stmt::While { cond, body, .. } | Stmt::DoWhile { body, cond, .. } => {
                let bound = infer_while_bound(cond, body, ctx);
                if bound.pattern == LoopPattern::Unknown {
                    self.unknown_loops += 1;
                }
                let iterations = bound.iteration_count();
                let cond_cost = self.expr_cost(cond, ctx);
                let body_cost = self.loop_body_cost(&body.statements, &iterations, ctx);
                nest(iterations, Complexity::plus(cond_cost, body_cost))
            }
            Stmt::For {
                init,
                cond,
                update,
                body,
                ..
            } => {
                let init_cost = init
                    .as_deref()
                    .map_or_else(Complexity::one, |s| self.stmt_cost(s, ctx));
                let bound = infer_for_bound(init.as_deref(), cond.as_ref(), update.as_ref(), ctx);
                if bound.pattern == LoopPattern::Unknown {
                    self.unknown_loops += 1;
                    self.warnings.push(format!(
                        "loop in '{}' has an unrecognized bound; assuming linear",
                        self.method.name
                    ));
                }
                let iterations = bound.iteration_count();
                let body_cost = self.loop_body_cost(&body.statements, &iterations, ctx);
                Complexity::plus(init_cost, nest(iterations, body_cost))
            }
            Stmt::ForEach {
                iterable, body, ..
            } => {
                // The element variable carries no size of its own.
                let bound = infer_foreach_bound(iterable, ctx);
                let iterations = bound.iteration_count();
                let body_cost = self.loop_body_cost(&body.statements, &iterations, ctx);
                nest(iterations, body_cost)
            }
            Stmt::Return { value, .. } => value
                .as_ref()
                .map_or_else(Complexity::one, |e| self.expr_cost(e, ctx)),
            Stmt::Throw { value, .. } => self.expr_cost(value, ctx),
            Stmt::Block(block) => self.block_cost(&block.statements, ctx),
            Stmt::Break { .. } | Stmt::Continue { .. } | Stmt::Error { .. } => Complexity::one(),
        }
    }

    /// Body cost with the allocation multiplier scaled by this loop.
    fn loop_body_cost(
        &mut self,
        statements: &[Stmt],
        iterations: &Complexity,
        ctx: &AnalysisContext,
    ) -> Complexity {
        let saved = self.loop_multiplier.clone();
        self.loop_multiplier =
            simplify_expr(Complexity::multiply(saved.clone(), iterations.clone()));
        let cost = self.block_cost(statements, ctx);
        self.loop_multiplier = saved;
        cost
    }

    fn expr_cost(&mut self, expr: &Expr, ctx: &AnalysisContext) -> Complexity {
        match expr {
            Expr::Call { callee, args } => {
                let args_cost = sequence(
                    args.iter()
                        .map(|a| self.expr_cost(a, ctx))
                        .collect::<Vec<_>>(),
                );
                let call_cost = self.call_cost(callee, args, ctx);
                Complexity::plus(args_cost, call_cost)
            }
            Expr::New { type_name, args } => {
                let size = args
                    .first()
                    .and_then(|a| size_expr(a, ctx))
                    .unwrap_or_else(Complexity::one);
                let scaled = simplify_expr(Complexity::multiply(
                    self.loop_multiplier.clone(),
                    size.clone(),
                ));
                self.allocations.push(AllocationSite {
                    label: type_name.clone(),
                    size: std::sync::Arc::new(scaled),
                    on_heap: true,
                });
                // Allocating and default-initializing n slots costs n.
                if size.is_constant() {
                    Complexity::one()
                } else {
                    size
                }
            }
            Expr::Assign { target, value, .. } => Complexity::plus(
                self.expr_cost(target, ctx),
                self.expr_cost(value, ctx),
            ),
            Expr::Binary { left, right, .. } => Complexity::plus(
                self.expr_cost(left, ctx),
                self.expr_cost(right, ctx),
            ),
            Expr::Unary { operand, .. } | Expr::Await(operand) => self.expr_cost(operand, ctx),
            Expr::Member { target, .. } => self.expr_cost(target, ctx),
            Expr::Index { target, index } => Complexity::plus(
                self.expr_cost(target, ctx),
                self.expr_cost(index, ctx),
            ),
            Expr::IncDec { target, .. } => self.expr_cost(target, ctx),
            // Literals, identifiers, indexing and arithmetic are unit work.
            _ => Complexity::one(),
        }
    }

    fn call_cost(&mut self, callee: &Expr, args: &[Expr], ctx: &AnalysisContext) -> Complexity {
        // Direct recursion is recognized by name before resolution so a
        // self-call works even in a single-method fragment.
        if callee.as_ident() == Some(self.method.name.as_str()) {
            self.recursive_calls
                .push(classify_call(args, self.method, &self.midpoints));
            return Complexity::one();
        }

        match self
            .extractor
            .semantics
            .resolve_call(self.method, callee, args.len())
        {
            Resolution::Method(index) => {
                if Some(index) == self.self_index {
                    self.recursive_calls
                        .push(classify_call(args, self.method, &self.midpoints));
                    return Complexity::one();
                }
                if self.extractor.cycle_members.contains(&index) {
                    self.cycle_calls
                        .push((index, classify_call(args, self.method, &self.midpoints)));
                    return Complexity::one();
                }
                match self.extractor.callee_bounds.get(&index) {
                    Some(bound) => self.instantiate_callee(index, bound.clone(), args, ctx),
                    None => {
                        self.warnings.push(format!(
                            "call to '{}' before its bound is known; assuming constant",
                            callee.callee_name().unwrap_or("?")
                        ));
                        self.unresolved_calls += 1;
                        Complexity::one()
                    }
                }
            }
            Resolution::Library {
                type_name,
                method,
                arity,
            } => {
                let entry = self
                    .extractor
                    .table
                    .lookup(&type_name, &method, arity)
                    .unwrap_or_else(conservative_default);
                if entry.provenance == Provenance::Heuristic {
                    self.warnings.push(format!(
                        "no table entry for {}.{}; conservative linear bound",
                        if type_name.is_empty() { "?" } else { &type_name },
                        method
                    ));
                }
                self.library_calls += 1;
                // Rebase the entry's canonical n onto the receiver's
                // size variable when the receiver is mapped.
                let receiver_var = match callee {
                    Expr::Member { target, .. } => target
                        .as_ident()
                        .and_then(|name| ctx.variable_for(name).cloned()),
                    _ => None,
                };
                match receiver_var {
                    Some(var) => entry
                        .complexity
                        .substitute(&crate::core::variable::Variable::n(), &Complexity::variable(var)),
                    None => entry.complexity,
                }
            }
            Resolution::Polymorphic { type_name, member } => {
                let dependency = if type_name.is_empty() {
                    member
                } else {
                    format!("{}.{}", type_name, member)
                };
                self.polymorphic_dependencies.push(dependency);
                Complexity::one()
            }
            Resolution::Unresolved => {
                self.unresolved_calls += 1;
                self.warnings.push(format!(
                    "unresolved call to '{}'; assuming constant work",
                    callee.callee_name().unwrap_or("?")
                ));
                Complexity::one()
            }
        }
    }

    /// Substitute caller-side size expressions into a callee bound.
    fn instantiate_callee(
        &mut self,
        index: usize,
        bound: Complexity,
        args: &[Expr],
        ctx: &AnalysisContext,
    ) -> Complexity {
        let Some(callee) = self.extractor.semantics.method_at(index) else {
            return bound;
        };
        let callee_ctx = AnalysisContext::for_method(callee, self.extractor.max_call_depth);
        let mut substitutions = Vec::new();
        for (position, param) in callee.params.iter().enumerate() {
            let Some(formal) = callee_ctx.variable_for(&param.name) else {
                continue;
            };
            let actual = args
                .get(position)
                .and_then(|a| size_expr(a, ctx))
                .unwrap_or_else(|| Complexity::variable(ctx.primary_variable()));
            substitutions.push((formal.clone(), actual));
        }
        apply_call(&bound, &substitutions)
    }

    /// Assemble the space profile from allocations and recursion shape.
    fn space_profile(&self, recurrence: Option<&RecurrenceRelation>) -> MemoryProfile {
        let stack = match recurrence {
            Some(rec) => {
                let var = rec.variable().clone();
                let divides = rec.terms().iter().any(|t| t.scale < 1.0);
                if divides {
                    Complexity::logarithmic(1.0, 2.0, var)
                } else {
                    Complexity::variable(var)
                }
            }
            None => Complexity::one(),
        };
        let heap = simplify_expr(sequence(
            self.allocations
                .iter()
                .map(|site| (*site.size).clone())
                .collect::<Vec<_>>(),
        ));
        let mut profile = MemoryProfile::from_parts(stack, heap, self.allocations.clone());
        profile.tail_recursive = recurrence
            .is_some_and(|rec| rec.terms().len() == 1 && rec.terms()[0].coefficient == 1.0);
        profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::parse_source;
    use crate::semantic::FileSemantics;
    use crate::stdlib::BuiltinTable;

    fn analyze(source: &str) -> MethodAnalysis {
        analyze_nth(source, 0, &FxHashMap::default())
    }

    fn analyze_nth(
        source: &str,
        index: usize,
        bounds: &FxHashMap<usize, Complexity>,
    ) -> MethodAnalysis {
        let file = parse_source(source);
        let semantics = FileSemantics::new(&file);
        let table = BuiltinTable::new();
        let extractor = PatternExtractor::new(&semantics, &table, bounds, &[], 10);
        extractor.analyze(&file.methods[index], Some(index))
    }

    #[test]
    fn linear_scan_composes_to_linear() {
        let analysis = analyze(
            "int find(int[] arr, int x) {\n  for (int i = 0; i < arr.Length; i++) {\n    if (arr[i] == x) { return i; }\n  }\n  return -1;\n}",
        );
        assert!(analysis.recurrence.is_none());
        assert_eq!(analysis.complexity.big_o(), "O(n)");
        assert!(analysis.confidence.value() >= 0.9);
    }

    #[test]
    fn nested_loops_compose_to_quadratic() {
        let analysis = analyze(
            "void bubble(int[] arr) {\n  for (int i = 0; i < arr.Length; i++) {\n    for (int j = 0; j < arr.Length; j++) {\n      if (arr[j] > arr[i]) { swap(arr, i, j); }\n    }\n  }\n}",
        );
        assert_eq!(analysis.complexity.big_o(), "O(n²)");
    }

    #[test]
    fn halving_while_composes_to_logarithmic() {
        let analysis = analyze(
            "int search(int[] arr, int target) {\n  int left = 0;\n  int right = arr.Length;\n  while (left <= right) {\n    int mid = (left + right) / 2;\n    if (arr[mid] == target) { return mid; }\n    if (arr[mid] < target) { left = mid + 1; } else { right = mid - 1; }\n  }\n  return -1;\n}",
        );
        assert_eq!(analysis.complexity.big_o(), "O(log n)");
    }

    #[test]
    fn recursion_yields_a_recurrence() {
        let analysis = analyze(
            "int fib(int n) {\n  if (n <= 1) { return 1; }\n  return fib(n - 1) + fib(n - 2);\n}",
        );
        let rec = analysis.recurrence.expect("expected recurrence");
        assert_eq!(rec.terms().len(), 2);
        assert!(rec.is_linear_candidate());
        assert!(!analysis.non_reducing_recursion);
    }

    #[test]
    fn pass_through_recursion_is_flagged() {
        let analysis = analyze("int spin(int n) { return spin(n); }");
        assert!(analysis.non_reducing_recursion);
        assert!(analysis.recurrence.is_some());
    }

    #[test]
    fn merge_sort_shape_yields_master_template() {
        let bounds = FxHashMap::default();
        let analysis = analyze_nth(
            "void ms(int[] a, int l, int r) {\n  if (l < r) {\n    int m = (l + r) / 2;\n    ms(a, l, m);\n    ms(a, m + 1, r);\n  }\n}",
            0,
            &bounds,
        );
        let rec = analysis.recurrence.expect("expected recurrence");
        assert!(rec.is_master_candidate());
        assert_eq!(rec.terms()[0].coefficient, 2.0);
        assert_eq!(rec.terms()[0].scale, 0.5);
    }

    #[test]
    fn library_sort_call_costs_linearithmic() {
        let analysis = analyze("void run(int[] arr) { arr.Sort(); }");
        assert_eq!(analysis.complexity.big_o(), "O(n log n)");
        assert!(analysis.confidence.value() < 0.95);
    }

    #[test]
    fn callee_bounds_substitute_actuals() {
        let source = "int helper(int m) { for (int i = 0; i < m; i++) { } return 0; }\nint driver(int n) { return helper(n); }";
        let mut bounds = FxHashMap::default();
        bounds.insert(0usize, Complexity::variable(crate::core::variable::Variable::n()));
        let analysis = analyze_nth(source, 1, &bounds);
        assert_eq!(analysis.complexity.big_o(), "O(n)");
    }

    #[test]
    fn polymorphic_call_records_dependency() {
        let analysis = analyze_nth(
            "interface ISorter { void Sort(int[] a); }\nvoid run(ISorter sorter, int[] a) { sorter.Sort(a); }",
            0,
            &FxHashMap::default(),
        );
        assert_eq!(analysis.polymorphic_dependencies.len(), 1);
        assert!(analysis.confidence.value() < 0.7);
    }

    #[test]
    fn array_allocation_costs_and_records_space() {
        let analysis = analyze("int[] make(int n) { int[] buf = new int[n]; return buf; }");
        assert_eq!(analysis.complexity.big_o(), "O(n)");
        assert_eq!(analysis.space.allocations.len(), 1);
    }

    #[test]
    fn amortized_idiom_overrides_composition() {
        let analysis = analyze(
            "void Add(int item) {\n  if (count == capacity) {\n    capacity = capacity * 2;\n    int[] bigger = new int[capacity];\n    items.CopyTo(bigger);\n    items = bigger;\n  }\n  items[count] = item;\n  count++;\n}",
        );
        let matched = analysis.amortized.expect("expected amortized match");
        assert_eq!(matched.pattern, "dynamic-array-doubling");
        assert_eq!(analysis.complexity.big_o(), "O(1)");
    }
}
