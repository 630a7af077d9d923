//! Events as read back from a calendar.

use chrono::{DateTime, NaiveDate, Utc};
use nlcal_core::{LocalZone, TimeWindow};
use serde::{Deserialize, Serialize};

/// Start or end of a stored event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum EventTime {
    /// A specific instant.
    DateTime(DateTime<Utc>),
    /// A whole day, without a time.
    AllDay(NaiveDate),
}

impl EventTime {
    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::AllDay(_))
    }

    /// Returns the instant this time begins, reading all-day dates at
    /// midnight in `zone`.
    pub fn instant_in(&self, zone: LocalZone) -> DateTime<Utc> {
        match self {
            Self::DateTime(dt) => *dt,
            Self::AllDay(date) => zone.at(date.and_time(chrono::NaiveTime::MIN)).instant(),
        }
    }

    /// Renders for display on `zone`'s wall clock, e.g. `2025-08-14 10:00`
    /// or `2025-08-14 (all day)`.
    pub fn display_in(&self, zone: LocalZone) -> String {
        match self {
            Self::DateTime(dt) => zone
                .at_instant(*dt)
                .local()
                .format("%Y-%m-%d %H:%M")
                .to_string(),
            Self::AllDay(date) => format!("{} (all day)", date.format("%Y-%m-%d")),
        }
    }
}

/// An event stored in a calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Backend identifier, used for deletion.
    pub id: String,
    pub title: String,
    pub start: EventTime,
    pub end: EventTime,
    pub location: Option<String>,
    /// Link to the event in the calendar's web UI.
    pub html_link: Option<String>,
}

impl CalendarEvent {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        start: EventTime,
        end: EventTime,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            start,
            end,
            location: None,
            html_link: None,
        }
    }

    /// Checks whether the event overlaps `window`, the way the calendar
    /// API's `timeMin`/`timeMax` filter does.
    pub fn overlaps(&self, window: &TimeWindow, zone: LocalZone) -> bool {
        self.start.instant_in(zone) < window.end && self.end.instant_in(zone) > window.start
    }

    /// Case-insensitive substring match on the title.
    pub fn title_contains(&self, needle: &str) -> bool {
        self.title
            .to_lowercase()
            .contains(needle.trim().to_lowercase().as_str())
    }
}

/// What the backend returns after creating an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedEvent {
    pub id: String,
    /// Opaque link to the new event, shown to the user.
    pub html_link: Option<String>,
}
