//! CLI error types.

use nlcal_assistant::AssistantError;
use nlcal_core::{NormalizeError, ZoneError};
use nlcal_providers::ProviderError;
use thiserror::Error;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Assistant(#[from] AssistantError),

    /// The model's event could not be turned into a calendar entry.
    #[error("cannot create the event: {0}")]
    Normalize(#[from] NormalizeError),

    #[error("configuration error: {0}")]
    Zone(#[from] ZoneError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
