//! Data model shared between the engine, the session and the HTTP layer.
//!
//! - [`Entry`]: one tracked snippet, owned by the execution engine.
//! - [`SnippetEvent`]: a status change of an entry, as reported after an
//!   evaluation or a drop.
//! - [`EvaluationRequest`] / [`EvaluationResult`]: the request and response
//!   bodies of the evaluation endpoint.

mod entry;
mod evaluation;

pub use entry::*;
pub use evaluation::*;
