//! Function declarations offered to the model.

use nlcal_core::EventColor;
use serde_json::{Value, json};

pub const CREATE_EVENT: &str = "create_event";
pub const FIND_EVENT: &str = "find_event";

/// Arguments deserialize into [`nlcal_core::RawEventDraft`].
pub fn create_event_declaration() -> Value {
    let colors: Vec<&str> = EventColor::ALL.iter().map(EventColor::name).collect();
    json!({
        "name": CREATE_EVENT,
        "description": "Create a calendar event.",
        "parameters": {
            "type": "object",
            "properties": {
                "title": {
                    "type": "string",
                    "description": "Short event title in the user's language."
                },
                "start_iso": {
                    "type": "string",
                    "description": "Local start as YYYY-MM-DDTHH:MM:SS, without offset."
                },
                "end_iso": {
                    "type": "string",
                    "description": "Local end as YYYY-MM-DDTHH:MM:SS, without offset."
                },
                "timezone": {
                    "type": "string",
                    "description": "IANA timezone of start_iso and end_iso."
                },
                "description": { "type": "string" },
                "location": { "type": "string" },
                "color": {
                    "type": "string",
                    "enum": colors,
                    "description": "Only when the user asked for a color."
                }
            },
            "required": ["title", "start_iso", "end_iso", "timezone"]
        }
    })
}

pub fn find_event_declaration() -> Value {
    json!({
        "name": FIND_EVENT,
        "description": "Identify an existing calendar event the user refers to.",
        "parameters": {
            "type": "object",
            "properties": {
                "title": {
                    "type": "string",
                    "description": "Words from the event title, empty if the user gave none."
                },
                "date": {
                    "type": "string",
                    "description": "Day of the event as YYYY-MM-DD."
                }
            },
            "required": ["title", "date"]
        }
    })
}
