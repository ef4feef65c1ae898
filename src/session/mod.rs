//! One conversation with an execution engine.
//!
//! A [`Session`] owns its engine, its feedback modes and the transcript of
//! the request being processed. Requests for the same session are
//! serialized by the [`SessionRegistry`].

mod diagnostics;
mod display;
mod input;
mod registry;
mod transcript;

pub use diagnostics::render_diagnostic;
pub use display::{to_action, unresolved_text};
pub use input::{is_command, split_input, Input};
pub use registry::SessionRegistry;
pub use transcript::{Transcript, MESSAGE_PREFIX};

use std::sync::Arc;

use uuid::Uuid;

use crate::commands;
use crate::db::{Preferences, FEEDBACK_KEY, MODE_KEY};
use crate::engine::Engine;
use crate::feedback::ModeStore;
use crate::models::EvaluationResult;

pub struct Session {
    id: Uuid,
    pub(crate) engine: Box<dyn Engine>,
    pub(crate) feedback: ModeStore,
    pub(crate) prefs: Arc<dyn Preferences>,
    pub(crate) out: Transcript,
    terminated: bool,
}

impl Session {
    /// Starts a session: installs the predefined modes, then restores the
    /// retained modes and the retained feedback mode. A notice about
    /// discarded retained modes leads the first response.
    pub fn start(id: Uuid, engine: Box<dyn Engine>, prefs: Arc<dyn Preferences>) -> Self {
        let mut session = Self {
            id,
            engine,
            feedback: ModeStore::new(),
            prefs,
            out: Transcript::default(),
            terminated: false,
        };
        commands::install_predefined_modes(&mut session.feedback);
        session.restore_retained();
        tracing::info!(session = %id, mode = session.feedback.current_name(), "Session started");
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn feedback(&self) -> &ModeStore {
        &self.feedback
    }

    /// Whether `/exit` has ended this session.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub(crate) fn terminate(&mut self) {
        self.terminated = true;
    }

    /// Evaluates submitted text: code chunks go to the engine, command lines
    /// to the command dispatcher. Stops after `/exit`.
    pub fn evaluate(&mut self, code: &str) -> EvaluationResult {
        let mut status = true;
        for input in split_input(code) {
            if self.terminated {
                break;
            }
            let ok = match input {
                Input::Code(chunk) => self.eval_code(&chunk),
                Input::Command(line) => commands::dispatch(self, &line),
            };
            status &= ok;
        }
        EvaluationResult::new(status, self.out.take())
    }

    fn eval_code(&mut self, chunk: &str) -> bool {
        let outcome = self.engine.eval(chunk);
        let mut ok = true;
        for step in outcome.steps {
            self.out.raw(&step.output);
            for event in &step.events {
                ok &= self.report_event(event);
            }
        }
        if let Some(rest) = outcome.incomplete {
            self.out.error(&format!("Incomplete input:\n{}", rest.trim_end()));
            ok = false;
        }
        ok
    }

    fn restore_retained(&mut self) {
        match self.prefs.get(MODE_KEY) {
            Ok(Some(blob)) => match self.feedback.restore_encoded(&blob) {
                Ok(count) => tracing::debug!(count, "Restored retained feedback modes"),
                Err(e) => {
                    tracing::warn!(error = %e, "Discarding retained feedback modes");
                    self.out.error(&e.to_string());
                    if let Err(e) = self.prefs.remove(MODE_KEY) {
                        tracing::error!(error = %e, "Failed to remove retained feedback modes");
                    }
                }
            },
            Ok(None) => {}
            Err(e) => tracing::error!(error = %e, "Failed to read retained feedback modes"),
        }

        match self.prefs.get(FEEDBACK_KEY) {
            Ok(Some(name)) => {
                let restored = self
                    .feedback
                    .retain_current(&name)
                    .and_then(|full| self.feedback.set_current(&full));
                if let Err(e) = restored {
                    tracing::warn!(mode = %name, error = %e, "Ignoring retained feedback mode");
                }
            }
            Ok(None) => {}
            Err(e) => tracing::error!(error = %e, "Failed to read retained feedback mode"),
        }
    }

    /// Persists every retained mode.
    pub(crate) fn save_retained_modes(&mut self) {
        let blob = self.feedback.encoded_retained();
        let saved = if blob.is_empty() {
            self.prefs.remove(MODE_KEY)
        } else {
            self.prefs.put(MODE_KEY, &blob)
        };
        if let Err(e) = saved {
            tracing::error!(error = %e, "Failed to save retained feedback modes");
            self.out.error("Retained feedback modes could not be saved");
        }
    }

    /// Persists the retained feedback mode.
    pub(crate) fn save_retained_feedback(&mut self) {
        let Some(name) = self.feedback.retained_current().map(str::to_string) else {
            return;
        };
        if let Err(e) = self.prefs.put(FEEDBACK_KEY, &name) {
            tracing::error!(error = %e, "Failed to save retained feedback mode");
            self.out.error("Retained feedback mode could not be saved");
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("mode", &self.feedback.current_name())
            .field("terminated", &self.terminated)
            .finish()
    }
}
