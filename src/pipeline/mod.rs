//! The analysis pipeline.
//!
//! A single-threaded cooperative pipeline per document: parse →
//! scope-detect → fragment-analyze → compose. Methods are processed in
//! leaves-first topological order so callee bounds are available to
//! callers; mutual-recursion cycles are solved as one unit and emitted
//! together. Every entry point takes a cancellation token checked at
//! phase boundaries and per method; budgets produce partial results
//! that are never cached. Parallelism across documents is the driver's
//! business (see `analyze_documents` under the `parallel` feature);
//! within one document, one thread drives the passes.

pub mod cache;
pub mod options;
pub mod progress;
pub mod result;

pub use cache::{content_hash, AnalysisCache};
pub use options::AnalysisOptions;
pub use progress::{CollectingListener, NullListener, Phase, ProgressEvent, ProgressListener};
pub use result::{DocumentDiagnostic, DocumentResult, IncompleteRegion, MethodResult, ResultTag};

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::analysis::{AnalysisUnit, CallGraph, MethodAnalysis, PatternExtractor};
use crate::classify;
use crate::core::confidence::Confidence;
use crate::core::expr::{Complexity, ComplexityKind};
use crate::core::variable::Variable;
use crate::lang::{parse_source, Method, SourceFile};
use crate::oracle::SymbolicOracle;
use crate::semantic::FileSemantics;
use crate::simplification::simplify_expr;
use crate::solvers::{self, IntegralOracle, SolverOutcome};
use crate::speculation::{self, Speculation};
use crate::stdlib::{BuiltinTable, LibraryTable};

/// Cooperative cancellation flag, cloneable across threads.
#[derive(Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// A fresh, un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// The top-level analyzer.
pub struct Analyzer {
    options: AnalysisOptions,
    table: Arc<dyn LibraryTable>,
    oracle: Option<SymbolicOracle>,
    cache: AnalysisCache,
}

impl Default for Analyzer {
    fn default() -> Self {
        Analyzer::new()
    }
}

impl Analyzer {
    /// An analyzer with default options and the built-in library table.
    pub fn new() -> Self {
        Analyzer::with_options(AnalysisOptions::default())
    }

    /// An analyzer with the given options.
    pub fn with_options(options: AnalysisOptions) -> Self {
        let oracle = if options.use_symbolic_math_oracle {
            options
                .oracle_command
                .clone()
                .map(SymbolicOracle::new)
        } else {
            None
        };
        Analyzer {
            options,
            table: Arc::new(BuiltinTable::new()),
            oracle,
            cache: AnalysisCache::new(),
        }
    }

    /// Replace the library table.
    #[must_use]
    pub fn with_table(mut self, table: Arc<dyn LibraryTable>) -> Self {
        self.table = table;
        self
    }

    /// Seed the incremental cache (e.g. loaded from disk).
    #[must_use]
    pub fn with_cache(mut self, cache: AnalysisCache) -> Self {
        self.cache = cache;
        self
    }

    /// The incremental cache, for persistence.
    pub fn cache(&self) -> &AnalysisCache {
        &self.cache
    }

    /// Convenience entry point: no cancellation, no progress.
    pub fn analyze_str(&self, source: &str) -> DocumentResult {
        self.analyze_source("<memory>", source, &CancellationToken::new(), &NullListener)
    }

    /// Analyze one document.
    pub fn analyze_source(
        &self,
        document: &str,
        source: &str,
        token: &CancellationToken,
        listener: &dyn ProgressListener,
    ) -> DocumentResult {
        listener.analysis_started(document);
        let soft_budget = Duration::from_millis(self.options.analysis_timeout_ms);
        let started = Instant::now();

        listener.phase_started(Phase::Parse);
        let file = parse_source(source);
        let mut diagnostics: Vec<DocumentDiagnostic> = file
            .diagnostics
            .iter()
            .map(|d| DocumentDiagnostic {
                message: d.message.clone(),
                location: (d.span.start(), d.span.end()),
            })
            .collect();
        listener.phase_completed(Phase::Parse);

        if token.is_cancelled() {
            return self.partial(document, Vec::new(), diagnostics, Vec::new(), "cancelled");
        }

        listener.phase_started(Phase::ScopeDetect);
        let semantics = FileSemantics::new(&file);
        let graph = CallGraph::build(&semantics);
        let order = graph.analysis_order();
        listener.phase_completed(Phase::ScopeDetect);

        if token.is_cancelled() {
            return self.partial(document, Vec::new(), diagnostics, Vec::new(), "cancelled");
        }

        listener.phase_started(Phase::FragmentAnalyze);
        let total = file.methods.len();
        let mut completed = 0usize;
        let mut bounds: FxHashMap<usize, Complexity> = FxHashMap::default();
        let mut emitted: Vec<(MethodResult, Complexity)> = Vec::new();
        let mut incomplete_regions: Vec<IncompleteRegion> = Vec::new();

        'units: for unit in order {
            if token.is_cancelled() {
                diagnostics.push(DocumentDiagnostic {
                    message: format!("analysis cancelled after {} method(s)", completed),
                    location: (0, 0),
                });
                break 'units;
            }
            if started.elapsed() > soft_budget {
                warn!(document, completed, "per-document budget exceeded");
                diagnostics.push(DocumentDiagnostic {
                    message: format!(
                        "analysis budget exceeded after {} method(s); remaining methods skipped",
                        completed
                    ),
                    location: (0, 0),
                });
                break 'units;
            }

            match unit {
                AnalysisUnit::Single(index) => {
                    let (result, bound) = self.analyze_single(
                        index,
                        &file,
                        &semantics,
                        &bounds,
                        source,
                        listener,
                        &mut incomplete_regions,
                    );
                    bounds.insert(index, bound.clone());
                    completed += 1;
                    listener.progress(completed, total, &result.method_name);
                    emitted.push((result, bound));
                }
                AnalysisUnit::Cycle(members) => {
                    let cycle_results = self.analyze_cycle(&members, &file, &semantics, &bounds);
                    for (index, result, bound) in cycle_results {
                        bounds.insert(index, bound.clone());
                        completed += 1;
                        listener.progress(completed, total, &result.method_name);
                        emitted.push((result, bound));
                    }
                }
            }
        }
        listener.phase_completed(Phase::FragmentAnalyze);

        listener.phase_started(Phase::Compose);
        let aggregate = emitted
            .iter()
            .map(|(_, bound)| bound.clone())
            .reduce(Complexity::max_of)
            .map(simplify_expr)
            .unwrap_or_else(Complexity::one);
        let methods = emitted.into_iter().map(|(result, _)| result).collect();
        listener.phase_completed(Phase::Compose);

        listener.analysis_completed();
        DocumentResult {
            document: document.to_owned(),
            methods,
            aggregate_complexity: aggregate.big_o(),
            diagnostics,
            incomplete_regions,
        }
    }

    /// Analyze every document, fanning out across threads.
    #[cfg(feature = "parallel")]
    pub fn analyze_documents(&self, documents: &[(&str, &str)]) -> Vec<DocumentResult> {
        use rayon::prelude::*;
        documents
            .par_iter()
            .map(|(name, source)| {
                self.analyze_source(name, source, &CancellationToken::new(), &NullListener)
            })
            .collect()
    }

    fn partial(
        &self,
        document: &str,
        methods: Vec<MethodResult>,
        mut diagnostics: Vec<DocumentDiagnostic>,
        incomplete_regions: Vec<IncompleteRegion>,
        why: &str,
    ) -> DocumentResult {
        diagnostics.push(DocumentDiagnostic {
            message: format!("analysis {}", why),
            location: (0, 0),
        });
        DocumentResult {
            document: document.to_owned(),
            methods,
            aggregate_complexity: "O(1)".to_owned(),
            diagnostics,
            incomplete_regions,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn analyze_single(
        &self,
        index: usize,
        file: &SourceFile,
        semantics: &FileSemantics<'_>,
        bounds: &FxHashMap<usize, Complexity>,
        source: &str,
        listener: &dyn ProgressListener,
        incomplete_regions: &mut Vec<IncompleteRegion>,
    ) -> (MethodResult, Complexity) {
        let method = &file.methods[index];
        let text = method_text(source, method);
        let hash = content_hash(text);

        if let Some(hit) = self.cache.get(&hash) {
            debug!(method = %method.name, "cache hit");
            let bound = speculation::parse_big_o(&hit.time_complexity)
                .unwrap_or_else(|_| Complexity::variable(Variable::n()));
            return (hit, bound);
        }

        let method_started = Instant::now();
        let verdict = speculation::speculate(method, &file.comments);

        let (result, bound) = match verdict {
            Speculation::Contract { complexity, .. } => {
                let result = self.assemble(
                    method,
                    complexity.clone(),
                    Confidence::CONTRACT,
                    ResultTag::Complete,
                    vec!["declared complexity contract".to_owned()],
                    false,
                    false,
                    None,
                );
                (result, complexity)
            }
            Speculation::Incomplete { reason, kind } => {
                incomplete_regions.push(IncompleteRegion {
                    method_name: method.name.clone(),
                    reason: reason.clone(),
                });
                let confidence = match kind {
                    crate::speculation::IncompleteKind::Definite => Confidence::INCOMPLETE,
                    crate::speculation::IncompleteKind::Likely => Confidence::STUB,
                };
                let result = self.assemble(
                    method,
                    Complexity::one(),
                    confidence,
                    ResultTag::Incomplete,
                    vec![reason],
                    false,
                    false,
                    None,
                );
                (result, Complexity::one())
            }
            Speculation::Stub { reason } => {
                let result = self.assemble(
                    method,
                    Complexity::one(),
                    Confidence::STUB,
                    ResultTag::Complete,
                    vec![format!("stub body: {}", reason)],
                    false,
                    false,
                    None,
                );
                (result, Complexity::one())
            }
            Speculation::Empty => {
                incomplete_regions.push(IncompleteRegion {
                    method_name: method.name.clone(),
                    reason: "empty method body".to_owned(),
                });
                let result = self.assemble(
                    method,
                    Complexity::one(),
                    Confidence::CONTRACT,
                    ResultTag::Complete,
                    vec!["empty method body".to_owned()],
                    false,
                    false,
                    None,
                );
                (result, Complexity::one())
            }
            Speculation::None => {
                let analyzed = catch_unwind(AssertUnwindSafe(|| {
                    let extractor = PatternExtractor::new(
                        semantics,
                        self.table.as_ref(),
                        bounds,
                        &[],
                        self.options.max_call_depth,
                    );
                    extractor.analyze(method, Some(index))
                }));
                match analyzed {
                    Ok(analysis) => self.finish_structural(method, analysis, file),
                    Err(_) => {
                        listener.error(&format!(
                            "internal error while analyzing '{}'",
                            method.name
                        ));
                        let bound = Complexity::variable(Variable::n());
                        let result = self.assemble(
                            method,
                            bound.clone(),
                            Confidence::NONE,
                            ResultTag::Complete,
                            vec!["internal invariant violation; conservative bound".to_owned()],
                            false,
                            false,
                            None,
                        );
                        (result, bound)
                    }
                }
            }
        };

        // Hard per-method budget: abandon and fall back speculatively.
        if method_started.elapsed() > Duration::from_millis(self.options.per_method_timeout_ms) {
            warn!(method = %method.name, "per-method budget exceeded");
            let bound = Complexity::variable(Variable::n());
            let fallback = self.assemble(
                method,
                bound.clone(),
                Confidence::STUB,
                ResultTag::Timeout,
                vec!["per-method budget exceeded; speculative fallback".to_owned()],
                false,
                false,
                None,
            );
            return (fallback, bound);
        }

        self.cache.insert(hash, result.clone());
        (result, bound)
    }

    /// Solve and assemble a structurally analyzed method.
    fn finish_structural(
        &self,
        method: &Method,
        analysis: MethodAnalysis,
        file: &SourceFile,
    ) -> (MethodResult, Complexity) {
        let mut notes = analysis.warnings.clone();
        let mut confidence = analysis.confidence;

        let complexity = match &analysis.recurrence {
            Some(recurrence) if analysis.non_reducing_recursion => {
                notes.push("non-reducing recurrence; conservative bound".to_owned());
                confidence = confidence.combine(Confidence::UNCERTAIN);
                conservative_recursive_bound(recurrence.work(), recurrence.variable())
            }
            Some(recurrence) => {
                let oracle = self.oracle.as_ref().map(|o| o as &dyn IntegralOracle);
                let outcome = solvers::solve_with_oracle(recurrence, oracle);
                confidence = confidence.combine(outcome.confidence());
                match outcome {
                    SolverOutcome::NotApplicable {
                        reason,
                        violated,
                        suggestions,
                    } => {
                        notes.push(format!("recurrence not solvable: {}", reason));
                        notes.extend(violated);
                        notes.extend(suggestions.into_iter().map(|s| format!("hint: {}", s)));
                        confidence = confidence.combine(Confidence::UNCERTAIN);
                        conservative_recursive_bound(recurrence.work(), recurrence.variable())
                    }
                    outcome => {
                        if let SolverOutcome::MasterApplicable {
                            case,
                            regularity_verified,
                            ..
                        } = &outcome
                        {
                            notes.push(format!("master theorem {:?}", case));
                            if !regularity_verified {
                                notes.push("regularity unverified".to_owned());
                            }
                        }
                        outcome
                            .solution()
                            .cloned()
                            .unwrap_or_else(|| Complexity::variable(Variable::n()))
                    }
                }
            }
            None => analysis.complexity.clone(),
        };
        let complexity = simplify_expr(complexity);

        // TODO-family markers degrade confidence without replacing the
        // structural result.
        let markers = speculation::marker_penalty(method, &file.comments);
        confidence = confidence.penalize(Confidence::INCOMPLETE_MARKER, markers);
        if markers > 0 {
            notes.push(format!("{} unfinished-work marker(s)", markers));
        }

        // Polymorphic targets make the figure a lower bound only.
        if !analysis.polymorphic_dependencies.is_empty() {
            confidence = Confidence::new(
                confidence.value().min(Confidence::UNCERTAIN.value()),
            );
            notes.push(format!(
                "lower bound only; depends on {}",
                analysis.polymorphic_dependencies.join(", ")
            ));
        }

        if let Some(matched) = &analysis.amortized {
            notes.push(format!("amortized pattern: {}", matched.pattern));
        }
        if analysis.decorations.parallel {
            notes.push("parallel construct detected; bound is sequential work".to_owned());
        }

        let worst = match complexity.kind() {
            ComplexityKind::Amortized { worst, .. } => Some(worst.big_o()),
            _ => None,
        };
        if let Some(worst) = &worst {
            notes.push(format!("worst case {}", worst));
        }

        let space = self.options.show_space_complexity.then(|| {
            simplify_expr((*analysis.space.total).clone()).big_o()
        });

        let is_amortized = analysis.amortized.is_some()
            || matches!(complexity.kind(), ComplexityKind::Amortized { .. });
        let result = self.assemble(
            method,
            complexity.clone(),
            confidence,
            ResultTag::Complete,
            notes,
            is_amortized,
            analysis.decorations.probabilistic,
            space,
        );
        (result, complexity)
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        &self,
        method: &Method,
        complexity: Complexity,
        confidence: Confidence,
        tag: ResultTag,
        mut notes: Vec<String>,
        is_amortized: bool,
        is_probabilistic: bool,
        space: Option<String>,
    ) -> MethodResult {
        let requires_review = !confidence.meets(self.options.min_confidence_to_emit);
        let review_reason = requires_review.then(|| {
            notes
                .first()
                .cloned()
                .unwrap_or_else(|| "confidence below review threshold".to_owned())
        });
        if self.options.show_confidence {
            notes.push(format!("confidence {}", confidence));
        }
        let dominant = dominant_term(&complexity);

        MethodResult {
            method_name: method.name.clone(),
            file_location: (method.span.start(), method.span.end()),
            time_complexity: complexity.big_o(),
            space_complexity: space,
            confidence: confidence.value(),
            is_amortized,
            is_probabilistic,
            dominant_term: dominant,
            tooltip: (!notes.is_empty()).then(|| notes.join("; ")),
            requires_review,
            review_reason,
            tag,
        }
    }

    /// Analyze a mutual-recursion cycle as one unit.
    fn analyze_cycle(
        &self,
        members: &[usize],
        file: &SourceFile,
        semantics: &FileSemantics<'_>,
        bounds: &FxHashMap<usize, Complexity>,
    ) -> Vec<(usize, MethodResult, Complexity)> {
        use crate::analysis::recursion::ArgReduction;
        use crate::solvers::mutual::{solve_cycle, CycleCall, MutualComponent};

        let extractor = PatternExtractor::new(
            semantics,
            self.table.as_ref(),
            bounds,
            members,
            self.options.max_call_depth,
        );

        let analyses: Vec<(usize, MethodAnalysis)> = members
            .iter()
            .map(|&index| (index, extractor.analyze(&file.methods[index], Some(index))))
            .collect();

        let components: Vec<MutualComponent> = analyses
            .iter()
            .map(|(index, analysis)| {
                let call = analysis
                    .cycle_calls
                    .first()
                    .map(|(_, recursive)| match recursive.reduction {
                        ArgReduction::Scaled(factor) => CycleCall {
                            coefficient: analysis.cycle_calls.len() as f64,
                            scale: factor,
                            reduction: 0.0,
                        },
                        ArgReduction::Decreased(amount) => CycleCall {
                            coefficient: analysis.cycle_calls.len() as f64,
                            scale: 1.0,
                            reduction: amount,
                        },
                        _ => CycleCall {
                            coefficient: 1.0,
                            scale: 1.0,
                            reduction: 0.0,
                        },
                    })
                    .unwrap_or(CycleCall {
                        coefficient: 1.0,
                        scale: 1.0,
                        reduction: 0.0,
                    });
                MutualComponent {
                    name: file.methods[*index].name.clone(),
                    work: analysis.complexity.clone(),
                    call,
                }
            })
            .collect();

        let variable = Variable::n();
        let oracle = self.oracle.as_ref().map(|o| o as &dyn IntegralOracle);
        let outcome = solve_cycle(&components, variable.clone(), oracle);
        let cycle_names: Vec<&str> = components.iter().map(|c| c.name.as_str()).collect();

        let (solution, solver_confidence, extra_note) = match &outcome {
            SolverOutcome::NotApplicable { reason, .. } => {
                let work = components
                    .iter()
                    .map(|c| c.work.clone())
                    .reduce(Complexity::plus)
                    .map(simplify_expr)
                    .unwrap_or_else(Complexity::one);
                (
                    conservative_recursive_bound(&work, &variable),
                    Confidence::UNCERTAIN,
                    Some(format!("mutual recursion not solvable: {}", reason)),
                )
            }
            outcome => (
                outcome
                    .solution()
                    .cloned()
                    .map(simplify_expr)
                    .unwrap_or_else(|| Complexity::variable(variable.clone())),
                outcome.confidence(),
                None,
            ),
        };

        // Every member of the cycle shares the asymptotic result.
        analyses
            .into_iter()
            .map(|(index, analysis)| {
                let mut notes = analysis.warnings.clone();
                notes.push(format!(
                    "mutual recursion cycle: {}",
                    cycle_names.join(" -> ")
                ));
                if let Some(extra) = &extra_note {
                    notes.push(extra.clone());
                }
                let confidence = analysis.confidence.combine(solver_confidence);
                let result = self.assemble(
                    &file.methods[index],
                    solution.clone(),
                    confidence,
                    ResultTag::Complete,
                    notes,
                    false,
                    analysis.decorations.probabilistic,
                    None,
                );
                (index, result, solution.clone())
            })
            .collect()
    }
}

/// The conservative fallback bound `max(n·g(n), g(n))` used when no
/// solver applies.
fn conservative_recursive_bound(work: &Complexity, variable: &Variable) -> Complexity {
    simplify_expr(Complexity::max_of(
        Complexity::multiply(Complexity::variable(variable.clone()), work.clone()),
        work.clone(),
    ))
}

/// The dominant summand's rendering, when one can be named.
fn dominant_term(complexity: &Complexity) -> Option<String> {
    let var = complexity.dominant_variable()?;
    let class = classify::classify(complexity, &var);
    match class.form {
        classify::Form::Unknown => None,
        _ => Some(complexity.to_string()),
    }
}

/// The method's source slice, for content hashing.
fn method_text<'a>(source: &'a str, method: &Method) -> &'a str {
    let start = method.span.start().min(source.len());
    let end = method.span.end().min(source.len());
    source.get(start..end).unwrap_or("")
}
