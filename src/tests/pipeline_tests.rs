//! End-to-end pipeline scenarios.

use crate::pipeline::{CancellationToken, NullListener, ResultTag};
use crate::{analyze, analyze_method, AnalysisOptions, Analyzer};

#[test]
fn linear_scan_is_linear_with_high_confidence() {
    let result = analyze(
        "int find(int[] arr, int x) {\n  for (int i = 0; i < arr.Length; i++) {\n    if (arr[i] == x) { return i; }\n  }\n  return -1;\n}",
    );
    let method = result.method("find").unwrap();
    assert_eq!(method.time_complexity, "O(n)");
    assert!(method.confidence >= 0.9, "got {}", method.confidence);
    assert!(!method.requires_review);
}

#[test]
fn binary_search_is_logarithmic() {
    let result = analyze(
        "int search(int[] arr, int target) {\n  int left = 0;\n  int right = arr.Length - 1;\n  while (left <= right) {\n    int mid = (left + right) / 2;\n    if (arr[mid] == target) { return mid; }\n    if (arr[mid] < target) { left = mid + 1; } else { right = mid - 1; }\n  }\n  return -1;\n}",
    );
    let method = result.method("search").unwrap();
    assert_eq!(method.time_complexity, "O(log n)");
    assert!(method.confidence >= 0.85, "got {}", method.confidence);
}

#[test]
fn bubble_sort_nesting_is_quadratic() {
    let result = analyze(
        "void sort(int n, int[] arr) {\n  for (int i = 0; i < n - 1; i++) {\n    for (int j = 0; j < n - i - 1; j++) {\n      if (arr[j] > arr[j + 1]) {\n        int tmp = arr[j];\n        arr[j] = arr[j + 1];\n        arr[j + 1] = tmp;\n      }\n    }\n  }\n}",
    );
    let method = result.method("sort").unwrap();
    assert_eq!(method.time_complexity, "O(n²)");
}

#[test]
fn naive_fibonacci_is_exponential() {
    let result = analyze(
        "int fib(int n) {\n  if (n <= 1) { return 1; }\n  return fib(n - 1) + fib(n - 2);\n}",
    );
    let method = result.method("fib").unwrap();
    // Dominant characteristic root is the golden ratio.
    assert_eq!(method.time_complexity, "O(1.618^n)");
    assert!(method.confidence >= 0.9);
}

#[test]
fn merge_sort_solves_as_linearithmic() {
    let result = analyze(
        "void merge(int[] arr, int lo, int mid, int hi) {\n  int[] buffer = new int[arr.Length];\n  for (int i = 0; i < arr.Length; i++) { buffer[i] = arr[i]; }\n}\nvoid ms(int[] arr, int lo, int hi) {\n  if (lo < hi) {\n    int mid = (lo + hi) / 2;\n    ms(arr, lo, mid);\n    ms(arr, mid + 1, hi);\n    merge(arr, lo, mid, hi);\n  }\n}",
    );
    let method = result.method("ms").unwrap();
    assert_eq!(method.time_complexity, "O(n log n)");
    assert!(method
        .tooltip
        .as_deref()
        .unwrap_or("")
        .contains("Case2"));
}

#[test]
fn not_implemented_body_reports_incomplete() {
    let result = analyze("int f(int n) { throw new NotImplementedException(); }");
    let method = result.method("f").unwrap();
    assert_eq!(method.tag, ResultTag::Incomplete);
    assert!(method.confidence <= 0.2, "got {}", method.confidence);
    assert_eq!(result.incomplete_regions.len(), 1);
}

#[test]
fn empty_body_is_constant_at_high_confidence() {
    let result = analyze("void noop() { }");
    let method = result.method("noop").unwrap();
    assert_eq!(method.time_complexity, "O(1)");
    assert!(method.confidence >= 0.9);
}

#[test]
fn literal_bounded_loop_is_constant_not_linear() {
    let bound = analyze_method(
        "void warm() { for (int i = 0; i < 1000; i++) { touch(i); } }",
        "warm",
    );
    assert_eq!(bound.as_deref(), Some("O(1)"));
}

#[test]
fn indexing_inside_a_linear_loop_stays_linear() {
    // Array indexing and simple arithmetic are unit cost; the loop must
    // not inflate to quadratic.
    let bound = analyze_method(
        "int total(int[] arr) {\n  int acc = 0;\n  for (int i = 0; i < arr.Length; i++) { acc = acc + arr[i]; }\n  return acc;\n}",
        "total",
    );
    assert_eq!(bound.as_deref(), Some("O(n)"));
}

#[test]
fn declared_contract_wins_over_stub_shape() {
    let result = analyze("[Complexity(\"O(n log n)\")]\nint mystery() { return 0; }");
    let method = result.method("mystery").unwrap();
    assert_eq!(method.time_complexity, "O(n log n)");
    assert!((method.confidence - 0.9).abs() < 1e-9);
}

#[test]
fn doc_comment_contract_is_honored() {
    let result = analyze(
        "/// Runs in O(n²) time on adversarial input.\nint mystery() { return 0; }",
    );
    let method = result.method("mystery").unwrap();
    assert_eq!(method.time_complexity, "O(n²)");
}

#[test]
fn callee_bounds_flow_into_callers() {
    let result = analyze(
        "int work(int[] data) {\n  int acc = 0;\n  foreach (var x in data) { acc = acc + x; }\n  return acc;\n}\nint driver(int[] data) {\n  return work(data);\n}",
    );
    assert_eq!(result.method("work").unwrap().time_complexity, "O(n)");
    assert_eq!(result.method("driver").unwrap().time_complexity, "O(n)");
}

#[test]
fn library_sort_in_a_loop_multiplies() {
    let result = analyze(
        "void all(int[] arr) {\n  for (int i = 0; i < arr.Length; i++) {\n    arr.Sort();\n  }\n}",
    );
    let method = result.method("all").unwrap();
    // n iterations of an n log n sort.
    assert_eq!(method.time_complexity, "O(n² log n)");
}

#[test]
fn union_find_reports_inverse_ackermann() {
    let result = analyze(
        "int Find(int x) {\n  if (parent[x] != x) { parent[x] = Find(parent[x]); }\n  return parent[x];\n}",
    );
    let method = result.method("Find").unwrap();
    assert_eq!(method.time_complexity, "O(α(n))");
    assert!(method.is_amortized);
}

#[test]
fn dynamic_array_append_is_amortized_constant() {
    let result = analyze(
        "void Add(int item) {\n  if (count == capacity) {\n    capacity = capacity * 2;\n    int[] next = new int[capacity];\n    items.CopyTo(next);\n    items = next;\n  }\n  items[count] = item;\n  count = count + 1;\n}",
    );
    let method = result.method("Add").unwrap();
    assert_eq!(method.time_complexity, "O(1)");
    assert!(method.is_amortized);
    assert!(method.tooltip.as_deref().unwrap().contains("worst case O(n)"));
}

#[test]
fn rng_usage_marks_results_probabilistic() {
    let result = analyze(
        "int pick(int[] arr) {\n  var rng = new Random();\n  return arr[rng.Next(arr.Length)];\n}",
    );
    let method = result.method("pick").unwrap();
    assert!(method.is_probabilistic);
}

#[test]
fn todo_markers_reduce_confidence() {
    let clean = analyze(
        "int f(int n) {\n  for (int i = 0; i < n; i++) { g(i); }\n  return 0;\n}",
    );
    let marked = analyze(
        "int f(int n) {\n  // TODO: cache partial sums\n  for (int i = 0; i < n; i++) { g(i); }\n  return 0;\n}",
    );
    let clean_confidence = clean.method("f").unwrap().confidence;
    let marked_confidence = marked.method("f").unwrap().confidence;
    assert!(marked_confidence < clean_confidence);
    assert!((marked_confidence - clean_confidence * 0.6).abs() < 1e-9);
}

#[test]
fn polymorphic_targets_cap_confidence() {
    let result = analyze(
        "interface ISorter { void Sort(int[] a); }\nvoid run(ISorter sorter, int[] a) { sorter.Sort(a); }",
    );
    let method = result.method("run").unwrap();
    assert!(method.confidence <= 0.5);
    assert!(method.tooltip.as_deref().unwrap().contains("lower bound"));
}

#[test]
fn aggregate_is_the_maximum_over_methods() {
    let result = analyze(
        "int one(int[] a) { foreach (var x in a) { use(x); } return 0; }\nvoid two(int n, int[] a) {\n  for (int i = 0; i < n; i++) {\n    for (int j = 0; j < n; j++) { touch(a, i, j); }\n  }\n}",
    );
    assert_eq!(result.aggregate_complexity, "O(n²)");
}

#[test]
fn pipeline_is_deterministic_across_runs() {
    let source = "int fib(int n) {\n  if (n <= 1) { return 1; }\n  return fib(n - 1) + fib(n - 2);\n}\nint scan(int[] arr) {\n  int acc = 0;\n  foreach (var x in arr) { acc = acc + x; }\n  return acc;\n}";
    // Fresh analyzers: no shared cache between the runs.
    let first = Analyzer::new().analyze_str(source);
    let second = Analyzer::new().analyze_str(source);
    assert_eq!(first, second);
}

#[test]
fn zero_soft_budget_skips_the_batch() {
    let analyzer =
        Analyzer::with_options(AnalysisOptions::new().analysis_timeout_ms(0));
    // Force a measurable elapsed time before the first unit by giving
    // the parser something to chew.
    let source = "int a1(int n) { return n; }\nint a2(int n) { return n; }";
    let result = analyzer.analyze_source(
        "doc",
        source,
        &CancellationToken::new(),
        &NullListener,
    );
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.message.contains("budget")));
}

#[test]
fn parse_recovery_still_analyzes_good_methods() {
    let result = analyze(
        "int broken(int n) { int x = ; return; }\nint fine(int[] a) { foreach (var v in a) { use(v); } return 0; }",
    );
    assert!(!result.diagnostics.is_empty());
    assert_eq!(result.method("fine").unwrap().time_complexity, "O(n)");
}
