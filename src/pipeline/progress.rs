//! Progress events.
//!
//! Events fire in the order: started → (phase-started →
//! phase-completed)* → progress* → completed/error. Listeners are
//! called synchronously from the pipeline thread.

use std::sync::Mutex;

/// Pipeline phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Recovery parsing.
    Parse,
    /// Semantic indexing and call-graph construction.
    ScopeDetect,
    /// Per-method extraction and solving.
    FragmentAnalyze,
    /// Result assembly and aggregation.
    Compose,
}

/// Callback interface for analysis progress.
pub trait ProgressListener {
    /// A document analysis began.
    fn analysis_started(&self, document: &str) {
        let _ = document;
    }

    /// A phase began.
    fn phase_started(&self, phase: Phase) {
        let _ = phase;
    }

    /// A phase finished.
    fn phase_completed(&self, phase: Phase) {
        let _ = phase;
    }

    /// Per-method progress inside the analyze phase.
    fn progress(&self, completed: usize, total: usize, current_item: &str) {
        let _ = (completed, total, current_item);
    }

    /// The document analysis finished.
    fn analysis_completed(&self) {}

    /// An internal error was converted to an event.
    fn error(&self, message: &str) {
        let _ = message;
    }
}

/// A listener that ignores everything.
pub struct NullListener;

impl ProgressListener for NullListener {}

/// A recorded progress event (testing aid).
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Analysis started.
    Started(String),
    /// Phase started.
    PhaseStarted(Phase),
    /// Phase completed.
    PhaseCompleted(Phase),
    /// Per-method progress.
    Progress {
        /// Methods finished.
        completed: usize,
        /// Methods total.
        total: usize,
        /// Current method name.
        current: String,
    },
    /// Analysis completed.
    Completed,
    /// Error event.
    Error(String),
}

/// A listener that records every event in order.
#[derive(Default)]
pub struct CollectingListener {
    events: Mutex<Vec<ProgressEvent>>,
}

impl CollectingListener {
    /// A fresh collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded events, in order.
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    fn push(&self, event: ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl ProgressListener for CollectingListener {
    fn analysis_started(&self, document: &str) {
        self.push(ProgressEvent::Started(document.to_owned()));
    }

    fn phase_started(&self, phase: Phase) {
        self.push(ProgressEvent::PhaseStarted(phase));
    }

    fn phase_completed(&self, phase: Phase) {
        self.push(ProgressEvent::PhaseCompleted(phase));
    }

    fn progress(&self, completed: usize, total: usize, current_item: &str) {
        self.push(ProgressEvent::Progress {
            completed,
            total,
            current: current_item.to_owned(),
        });
    }

    fn analysis_completed(&self) {
        self.push(ProgressEvent::Completed);
    }

    fn error(&self, message: &str) {
        self.push(ProgressEvent::Error(message.to_owned()));
    }
}
