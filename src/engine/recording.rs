use crate::models::{Diagnostic, Entry, EntryKind, EntryStatus, SnippetEvent};

use super::{Engine, EvalOutcome, EvalStep};

/// Stand-in engine that executes nothing.
///
/// Every submitted chunk becomes one statement entry, so listing, dropping
/// and the feedback commands work end to end without a real engine.
#[derive(Debug)]
pub struct RecordingEngine {
    entries: Vec<Entry>,
    next_id: u32,
}

impl Default for RecordingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }
}

impl Engine for RecordingEngine {
    fn eval(&mut self, source: &str) -> EvalOutcome {
        let source = source.trim();
        if source.is_empty() {
            return EvalOutcome::default();
        }
        let entry = Entry {
            id: self.next_id.to_string(),
            name: String::new(),
            kind: EntryKind::Statement,
            status: EntryStatus::Valid,
            source: source.to_string(),
            type_name: String::new(),
            signature: None,
        };
        self.next_id += 1;
        self.entries.push(entry.clone());
        tracing::debug!(id = %entry.id, "Recorded snippet");

        EvalOutcome {
            steps: vec![EvalStep {
                output: String::new(),
                events: vec![SnippetEvent::created(entry)],
            }],
            incomplete: None,
        }
    }

    fn entries(&self) -> Vec<Entry> {
        self.entries.clone()
    }

    fn drop_entry(&mut self, id: &str) -> Vec<SnippetEvent> {
        let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) else {
            return Vec::new();
        };
        let previous = entry.status;
        entry.status = EntryStatus::Dropped;
        vec![SnippetEvent {
            previous_status: previous,
            signature_changed: false,
            ..SnippetEvent::created(entry.clone())
        }]
    }

    fn var_value(&self, _id: &str) -> Option<String> {
        None
    }

    fn diagnostics(&self, _id: &str) -> Vec<Diagnostic> {
        Vec::new()
    }

    fn unresolved(&self, _id: &str) -> Vec<String> {
        Vec::new()
    }

    fn reset(&mut self) {
        self.entries.clear();
        self.next_id = 1;
    }
}
