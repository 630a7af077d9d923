//! The closed set of things a user can ask for.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A classified user request.
///
/// Serialized with a `command` tag, e.g.
/// `{"command":"switch_calendar","calendar":"Work"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    AddEvent,
    ListEvents,
    RemoveEvent,
    /// The request could not be classified.
    ClarificationNeeded,
    /// Make another calendar the active one.
    SwitchCalendar { calendar: String },
}

impl Command {
    /// All labels the classifier may answer with.
    pub const LABELS: [&'static str; 5] = [
        "add_event",
        "list_events",
        "remove_event",
        "switch_calendar",
        "clarification_needed",
    ];

    /// Returns the wire label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::AddEvent => "add_event",
            Self::ListEvents => "list_events",
            Self::RemoveEvent => "remove_event",
            Self::ClarificationNeeded => "clarification_needed",
            Self::SwitchCalendar { .. } => "switch_calendar",
        }
    }

    /// Maps a bare label to a command. `switch_calendar` needs a target and
    /// is only accepted through [`Command::from_response`].
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "add_event" => Some(Self::AddEvent),
            "list_events" => Some(Self::ListEvents),
            "remove_event" => Some(Self::RemoveEvent),
            "clarification_needed" => Some(Self::ClarificationNeeded),
            _ => None,
        }
    }

    /// Interprets raw classifier output.
    ///
    /// Accepts a tagged JSON object, a JSON string, or a bare label.
    /// Anything else becomes [`Command::ClarificationNeeded`].
    pub fn from_response(text: &str) -> Self {
        let text = text.trim();

        if let Ok(command) = serde_json::from_str::<Command>(text) {
            return command;
        }

        let label = match serde_json::from_str::<String>(text) {
            Ok(label) => label,
            Err(_) => text.trim_matches(|c: char| c == '"' || c == '\'' || c == '.').to_string(),
        };

        Self::from_label(&label).unwrap_or_else(|| {
            debug!(response = %text, "unrecognized classifier output");
            Self::ClarificationNeeded
        })
    }
}
