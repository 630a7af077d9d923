//! Event types.
//!
//! - [`RawEventDraft`]: what the language model extracted, unchecked
//! - [`NormalizedEvent`]: a validated, future-biased event ready for the
//!   calendar API
//! - [`EventColor`]: the calendar's fixed color palette

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Event fields as produced by the model's `create_event` call.
///
/// Any key may be absent; absent keys deserialize to empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawEventDraft {
    pub title: String,
    pub start_iso: String,
    /// May be empty: the normalizer then applies the default duration.
    pub end_iso: String,
    /// IANA zone name. May be empty: the default zone is used.
    pub timezone: String,
    pub description: String,
    pub location: String,
    /// A color name such as `"red"` or a numeric color id.
    pub color: String,
}

impl RawEventDraft {
    /// Creates a draft with a title and start.
    pub fn new(title: impl Into<String>, start_iso: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            start_iso: start_iso.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_end(mut self, end_iso: impl Into<String>) -> Self {
        self.end_iso = end_iso.into();
        self
    }

    #[must_use]
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Lists the required fields that are empty or whitespace, in
    /// declaration order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.start_iso.trim().is_empty() {
            missing.push("start_iso");
        }
        missing
    }
}

/// A calendar-ready event.
///
/// `start_iso` and `end_iso` are zone-naive wall-clock strings
/// (`2025-08-14T10:00:00`) to be read in `timezone`. `end_iso` is always
/// strictly after `start_iso`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    pub title: String,
    pub start_iso: String,
    pub end_iso: String,
    /// IANA zone name the two timestamps are expressed in.
    pub timezone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<EventColor>,
}

impl fmt::Display for NormalizedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} to {}, {})",
            self.title, self.start_iso, self.end_iso, self.timezone
        )
    }
}

/// The eleven event colors offered by Google Calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventColor {
    LightBlue,
    Green,
    Purple,
    Pink,
    Yellow,
    Orange,
    Turquoise,
    Gray,
    Blue,
    LightGreen,
    Red,
}

impl EventColor {
    pub const ALL: [EventColor; 11] = [
        Self::LightBlue,
        Self::Green,
        Self::Purple,
        Self::Pink,
        Self::Yellow,
        Self::Orange,
        Self::Turquoise,
        Self::Gray,
        Self::Blue,
        Self::LightGreen,
        Self::Red,
    ];

    /// Applied when an event is created without a color.
    pub const DEFAULT: EventColor = Self::Yellow;

    /// Returns the calendar API `colorId`.
    pub fn id(&self) -> &'static str {
        match self {
            Self::LightBlue => "1",
            Self::Green => "2",
            Self::Purple => "3",
            Self::Pink => "4",
            Self::Yellow => "5",
            Self::Orange => "6",
            Self::Turquoise => "7",
            Self::Gray => "8",
            Self::Blue => "9",
            Self::LightGreen => "10",
            Self::Red => "11",
        }
    }

    /// Returns the English name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::LightBlue => "light blue",
            Self::Green => "green",
            Self::Purple => "purple",
            Self::Pink => "pink",
            Self::Yellow => "yellow",
            Self::Orange => "orange",
            Self::Turquoise => "turquoise",
            Self::Gray => "gray",
            Self::Blue => "blue",
            Self::LightGreen => "light green",
            Self::Red => "red",
        }
    }
}

impl fmt::Display for EventColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for an unrecognized color.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event color {0:?}")]
pub struct UnknownColor(pub String);

impl FromStr for EventColor {
    type Err = UnknownColor;

    /// Accepts names in any case with spaces, dashes or underscores
    /// (`"Light-Blue"`, `"light_blue"`), `grey`, and ids `"1"`..`"11"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();
        let key = if key == "grey" { "gray".to_string() } else { key };

        Self::ALL
            .into_iter()
            .find(|color| color.id() == key || color.name().replace(' ', "") == key)
            .ok_or_else(|| UnknownColor(s.to_string()))
    }
}
