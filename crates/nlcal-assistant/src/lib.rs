//! The language side of nlcal.
//!
//! A [`LanguageModel`] classifies a message into a
//! [`Command`](nlcal_core::Command) and extracts the structured data each
//! command needs. [`gemini::GeminiModel`] is the real backend and
//! [`ScriptedModel`] replays canned answers in tests.

pub mod error;
pub mod gemini;
pub mod model;

pub use error::{AssistantError, AssistantResult};
pub use gemini::GeminiModel;
pub use model::{BoxFuture, EventQuery, LanguageModel, ScriptedModel};
