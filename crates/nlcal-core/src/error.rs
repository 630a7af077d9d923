//! Error types for time parsing and event normalization.

use thiserror::Error;

/// A date string that is not in the accepted ISO-8601 subset.
///
/// Accepted: a bare `YYYY-MM-DD` date, or a `YYYY-MM-DDTHH:MM[:SS[.fff]]`
/// date-time with an optional `±HH:MM` / `Z` offset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot read {input:?} as an ISO date or date-time: {reason}")]
pub struct ParseError {
    /// The text that was received.
    pub input: String,
    /// What was wrong with it.
    pub reason: &'static str,
}

impl ParseError {
    pub(crate) fn new(input: impl Into<String>, reason: &'static str) -> Self {
        Self {
            input: input.into(),
            reason,
        }
    }
}

/// An unknown IANA timezone name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown timezone {0:?} (expected an IANA name such as \"Europe/Warsaw\")")]
pub struct ZoneError(pub String);

/// Why a model draft could not be turned into a calendar event.
///
/// All variants stem from the input itself, so none of them is worth
/// retrying with the same draft.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// Required draft fields are absent or blank.
    #[error("missing required field(s): {}", .missing.join(", "))]
    Validation {
        /// Every missing field, in declaration order.
        missing: Vec<&'static str>,
    },

    /// A date field could not be parsed.
    #[error("invalid {field}: {source}")]
    Parse {
        /// The draft field that held the text.
        field: &'static str,
        /// The underlying parse failure, including the received text.
        #[source]
        source: ParseError,
    },

    /// The start date has no valid future occurrence (e.g. a February 29
    /// that cannot be carried into the current or next year).
    #[error("no representable future date for start {start:?}")]
    UnresolvableDate {
        /// The start text as received.
        start: String,
    },
}

impl NormalizeError {
    /// Returns a short machine-readable kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::Parse { .. } => "parse",
            Self::UnresolvableDate { .. } => "unresolvable_date",
        }
    }
}
