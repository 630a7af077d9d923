//! Errors from talking to the language model.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssistantError {
    /// The request never got an HTTP response.
    #[error("model request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with an error status.
    #[error("model API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The model answered in text where a function call was required.
    #[error("the model did not call `{function}`, try rephrasing")]
    NoFunctionCall { function: &'static str },

    /// The response did not have the expected shape.
    #[error("cannot decode model response: {0}")]
    Decode(String),

    #[error("model configuration error: {0}")]
    Configuration(String),
}

pub type AssistantResult<T> = Result<T, AssistantError>;
