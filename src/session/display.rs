//! Classifies engine events and renders them through the current mode.

use crate::feedback::{
    EventFields, FormatAction, FormatErrors, FormatResolve, FormatUnresolved, FormatWhen, Selector,
};
use crate::models::{Diagnostic, Entry, EntryKind, EntryStatus, SnippetEvent};

use super::diagnostics::render_diagnostic;
use super::Session;

/// Maps a status transition to the action axis.
pub fn to_action(status: EntryStatus, previous: EntryStatus, signature_changed: bool) -> FormatAction {
    if status.is_active() {
        if previous.is_active() {
            if signature_changed {
                FormatAction::Replaced
            } else {
                FormatAction::Modified
            }
        } else {
            FormatAction::Added
        }
    } else if status == EntryStatus::Overwritten {
        FormatAction::Overwrote
    } else {
        FormatAction::Dropped
    }
}

/// Unresolved names as a phrase: `" a"`, `" a, and b"`, `" a, b, and c"`.
pub fn unresolved_text(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [only] => format!(" {}", only),
        [init @ .., last] => format!(" {}, and {}", init.join(", "), last),
    }
}

fn resolution(status: EntryStatus) -> FormatResolve {
    match status {
        EntryStatus::RecoverableDefined => FormatResolve::Defined,
        EntryStatus::RecoverableNotDefined => FormatResolve::NotDefined,
        _ => FormatResolve::Ok,
    }
}

/// Everything needed to render one entry's line.
struct Rendering<'a> {
    entry: &'a Entry,
    action: FormatAction,
    when: FormatWhen,
    value: Option<&'a str>,
    unresolved: Vec<String>,
    errors: Vec<&'a Diagnostic>,
}

impl Session {
    /// Renders one event from an evaluation or a drop. Returns false when
    /// the event means the input failed.
    pub(crate) fn report_event(&mut self, event: &SnippetEvent) -> bool {
        let entry = &event.entry;
        let errors: Vec<&Diagnostic> = event.diagnostics.iter().filter(|d| d.is_error).collect();

        if !event.is_primary() {
            if entry.kind.is_declaration() {
                self.render_entry(Rendering {
                    entry,
                    action: to_action(entry.status, event.previous_status, event.signature_changed),
                    when: FormatWhen::Update,
                    value: None,
                    unresolved: event.unresolved.clone(),
                    errors,
                });
            }
            return true;
        }

        self.print_diagnostics(&entry.source, &event.diagnostics);

        if entry.status == EntryStatus::Rejected {
            if errors.is_empty() {
                self.out.error("Failed");
            }
            return false;
        }

        if let Some(exception) = &event.exception {
            self.out.error(&format!("Exception {}", exception));
            return false;
        }

        self.render_entry(Rendering {
            entry,
            action: to_action(entry.status, event.previous_status, event.signature_changed),
            when: FormatWhen::Primary,
            value: event.value.as_deref(),
            unresolved: event.unresolved.clone(),
            errors,
        });
        true
    }

    /// Prints the resolution state of an entry listed by `/methods` or
    /// `/types`, if the current mode has anything to say about it.
    pub(crate) fn report_status(&mut self, entry: &Entry) {
        let Some(case) = entry.kind.format_case() else {
            return;
        };
        let unresolved = self.engine.unresolved(&entry.id);
        let error_lines: Vec<String> = self
            .engine
            .diagnostics(&entry.id)
            .iter()
            .filter(|d| d.is_error)
            .flat_map(|d| d.message.lines().map(str::to_string).collect::<Vec<_>>())
            .collect();

        let selector = Selector::of(
            case,
            FormatAction::Used,
            FormatWhen::Update,
            resolution(entry.status),
            FormatUnresolved::bucket(unresolved.len()),
            FormatErrors::bucket(error_lines.len()),
        );
        let unresolved = unresolved_text(&unresolved);
        let fields = EventFields {
            name: &entry.name,
            type_name: &entry.type_name,
            value: None,
            unresolved: &unresolved,
            error_lines: &error_lines,
        };
        match self
            .feedback
            .current()
            .render_event("resolve", &selector, &fields)
        {
            Ok(text) if !text.trim().is_empty() => self.out.notice(&format!("    {}", text)),
            Ok(_) => {}
            Err(e) => self.out.error(&e.to_string()),
        }
    }

    fn render_entry(&mut self, rendering: Rendering<'_>) {
        let entry = rendering.entry;
        let case = match entry.kind {
            EntryKind::Erroneous => return,
            EntryKind::OtherExpression => {
                self.out.notice(&format!(
                    "Unexpected expression form -- value is: {}",
                    rendering.value.unwrap_or_default()
                ));
                return;
            }
            kind => match kind.format_case() {
                Some(case) => case,
                None => return,
            },
        };

        let error_lines: Vec<String> = rendering
            .errors
            .iter()
            .flat_map(|d| render_diagnostic(&entry.source, d))
            .collect();
        let selector = Selector::of(
            case,
            rendering.action,
            rendering.when,
            resolution(entry.status),
            FormatUnresolved::bucket(rendering.unresolved.len()),
            FormatErrors::bucket(rendering.errors.len()),
        );
        let unresolved = unresolved_text(&rendering.unresolved);
        let fields = EventFields {
            name: &entry.name,
            type_name: &entry.type_name,
            value: rendering.value,
            unresolved: &unresolved,
            error_lines: &error_lines,
        };

        match self.feedback.current().display(&selector, &fields) {
            Ok(text) => self.out.raw(&text),
            Err(e) => {
                tracing::warn!(id = %entry.id, error = %e, "Display failed");
                self.out.error(&e.to_string());
            }
        }
    }
}
