//! Interface to the external code-execution engine.
//!
//! The engine compiles and runs snippets; this crate only renders what it
//! reports. One engine instance backs one session.

mod recording;

pub use recording::RecordingEngine;

use crate::models::{Diagnostic, Entry, SnippetEvent};

/// What one complete snippet produced.
#[derive(Debug, Clone, Default)]
pub struct EvalStep {
    /// Text the snippet wrote to standard output while running.
    pub output: String,
    pub events: Vec<SnippetEvent>,
}

/// Result of evaluating a chunk of source that may hold several snippets.
#[derive(Debug, Clone, Default)]
pub struct EvalOutcome {
    pub steps: Vec<EvalStep>,
    /// Trailing source that did not form a complete snippet.
    pub incomplete: Option<String>,
}

pub trait Engine: Send {
    /// Evaluates every complete snippet in `source`, in order.
    fn eval(&mut self, source: &str) -> EvalOutcome;

    /// Every entry of the session, in creation order.
    fn entries(&self) -> Vec<Entry>;

    /// Drops an active entry, returning the resulting events.
    fn drop_entry(&mut self, id: &str) -> Vec<SnippetEvent>;

    /// Current value of a variable entry.
    fn var_value(&self, id: &str) -> Option<String>;

    fn diagnostics(&self, id: &str) -> Vec<Diagnostic>;

    /// Names a recoverable entry is waiting for.
    fn unresolved(&self, id: &str) -> Vec<String>;

    /// Discards every entry.
    fn reset(&mut self);
}

/// Creates one engine per session.
pub trait EngineFactory: Send + Sync {
    fn create(&self) -> Box<dyn Engine>;
}

impl<F> EngineFactory for F
where
    F: Fn() -> Box<dyn Engine> + Send + Sync,
{
    fn create(&self) -> Box<dyn Engine> {
        self()
    }
}
