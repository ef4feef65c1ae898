//! Feedback rendering for evaluation transcripts.
//!
//! # Core Concepts
//!
//! - [`Selector`]: a six-axis classification key (case, action, when,
//!   resolve, unresolved, errors). Every reported event is classified into a
//!   singleton selector; settings are guarded by set-valued selectors.
//! - [`Mode`]: a named bundle of per-field templates. Each field holds an
//!   ordered list of [`Setting`]s and later settings take priority.
//! - [`ModeStore`]: the per-session collection of modes plus the current and
//!   retained pointers.
//!
//! Rendering walks a field's settings from newest to oldest and takes the
//! first one whose selector covers the event's selector. Templates may pull
//! in other fields with `{field}` references.

mod format;
mod mode;
mod selector;
mod store;

pub use format::EventFields;
pub use mode::{Mode, Setting, RECORD_SEPARATOR, TRUNCATION_FIELD};
pub use selector::{
    FormatAction, FormatCase, FormatErrors, FormatResolve, FormatUnresolved, FormatWhen,
    Selector, SelectorKind,
};
pub use store::ModeStore;

use thiserror::Error;

/// Failures raised while parsing selectors, managing modes or rendering.
///
/// The `Display` text of each variant is the message shown to the user.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FeedbackError {
    #[error("Not a valid selector '{token}' in '{section}'")]
    InvalidSelectorSyntax { token: String, section: String },

    #[error("Selector kind in multiple sections of selector list '{section}' in '{token}'")]
    MultipleSectionsForAxis { token: String, section: String },

    #[error("Different selector kinds in same sections of selector list '{section}' in '{token}'")]
    MixedAxisKinds { token: String, section: String },

    #[error("Expected a new feedback mode name. '{0}' is a known feedback mode")]
    ModeAlreadyExists(String),

    #[error("Does not match any current feedback mode: {0}")]
    UnknownMode(String),

    #[error("Matches more than one current feedback mode: {name}\nThe matches are:{}", candidate_list(.candidates))]
    AmbiguousMode {
        name: String,
        candidates: Vec<String>,
    },

    #[error("Not valid with a predefined mode: {0}")]
    ReadOnlyMode(String),

    #[error("The current feedback mode '{0}' cannot be deleted, use '/set feedback' first")]
    CurrentModeUndeletable(String),

    #[error("The retained feedback mode '{0}' cannot be deleted, use '/set feedback -retain' first")]
    RetainedModeUndeletable(String),

    #[error("'{0}' must be retained before it can be the retained feedback mode")]
    ModeNotRetained(String),

    #[error("Retained feedback modes are corrupted, discarding them: {0}")]
    ModeDecodeCorruption(String),

    #[error("Field '{field}' refers back to itself")]
    TemplateCycleDetected { field: String },

    #[error("Truncation length must be an integer: {0}")]
    InvalidTruncationLength(String),
}

fn candidate_list(candidates: &[String]) -> String {
    candidates.iter().map(|c| format!("\n   {}", c)).collect()
}
