//! Google Gemini backend.
//!
//! Calls `models/{model}:generateContent` with the API key in the
//! `x-goog-api-key` header. Event extraction uses function calling with a
//! forced call, so the arguments arrive as structured JSON.

mod client;
mod prompts;
mod tools;
mod types;

pub use client::{DEFAULT_MODEL, GeminiModel};
pub use tools::{CREATE_EVENT, FIND_EVENT, create_event_declaration, find_event_declaration};
