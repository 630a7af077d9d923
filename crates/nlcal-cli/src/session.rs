//! One conversation with the assistant.
//!
//! A [`Session`] owns the conversation history and the active calendar.
//! Each user message is classified into a [`Command`] and handled against
//! the calendar provider.

use std::sync::Arc;

use chrono::Duration;
use nlcal_assistant::{EventQuery, LanguageModel};
use nlcal_core::{
    Command, ConversationHistory, EventNormalizer, LocalZone, TimeWindow, ZonedTimestamp,
};
use nlcal_providers::{CalendarEvent, CalendarProvider};
use tracing::{debug, info};

use crate::error::CliResult;

/// How far ahead a listing looks.
pub const LIST_HORIZON_DAYS: i64 = 30;

/// Most events fetched for one day when looking for the one to remove.
const REMOVE_SEARCH_LIMIT: usize = 250;

pub struct Session {
    model: Arc<dyn LanguageModel>,
    provider: Arc<dyn CalendarProvider>,
    normalizer: EventNormalizer,
    history: ConversationHistory,
    calendar_id: String,
    list_limit: usize,
}

impl Session {
    /// Starts with the `primary` calendar, ten turns of history and a
    /// listing limit of ten.
    pub fn new(
        model: Arc<dyn LanguageModel>,
        provider: Arc<dyn CalendarProvider>,
        zone: LocalZone,
    ) -> Self {
        Self {
            model,
            provider,
            normalizer: EventNormalizer::new(zone),
            history: ConversationHistory::default(),
            calendar_id: "primary".to_string(),
            list_limit: 10,
        }
    }

    #[must_use]
    pub fn with_history_size(mut self, size: usize) -> Self {
        self.history = ConversationHistory::new(size);
        self
    }

    #[must_use]
    pub fn with_list_limit(mut self, limit: usize) -> Self {
        self.list_limit = limit;
        self
    }

    #[must_use]
    pub fn with_calendar(mut self, calendar_id: impl Into<String>) -> Self {
        self.calendar_id = calendar_id.into();
        self
    }

    pub fn zone(&self) -> LocalZone {
        self.normalizer.default_zone()
    }

    pub fn calendar_id(&self) -> &str {
        &self.calendar_id
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Handles one message and returns the reply to show.
    ///
    /// `now` is captured by the caller when the message arrives. The
    /// message joins the history afterwards, whether or not it succeeded.
    pub async fn handle(&mut self, text: &str, now: ZonedTimestamp) -> CliResult<String> {
        let text = text.trim();
        let result = self.dispatch(text, now).await;
        self.history.push(text);
        result
    }

    async fn dispatch(&mut self, text: &str, now: ZonedTimestamp) -> CliResult<String> {
        let command = self.model.classify(text, &self.history).await?;
        debug!(command = command.label(), "dispatching");

        match command {
            Command::AddEvent => self.add_event(text, now).await,
            Command::ListEvents => self.list_events(now).await,
            Command::RemoveEvent => self.remove_event(text, now).await,
            Command::ClarificationNeeded => Ok(
                "Sorry, I did not get that. I can add, show or remove events, \
                 or switch to another calendar. Could you rephrase?"
                    .to_string(),
            ),
            Command::SwitchCalendar { calendar } => self.switch_calendar(&calendar).await,
        }
    }

    async fn add_event(&self, text: &str, now: ZonedTimestamp) -> CliResult<String> {
        let draft = self.model.draft_event(text, now, self.zone()).await?;
        debug!(?draft, "model draft");
        let event = self.normalizer.normalize(&draft, &now)?;
        let created = self.provider.insert_event(&self.calendar_id, &event).await?;
        info!(event_id = %created.id, "event added");

        let mut reply = format!(
            "Added \"{}\" from {} to {} ({}).",
            event.title, event.start_iso, event.end_iso, event.timezone
        );
        if let Some(link) = created.html_link {
            reply.push('\n');
            reply.push_str(&link);
        }
        Ok(reply)
    }

    async fn list_events(&self, now: ZonedTimestamp) -> CliResult<String> {
        let window = TimeWindow::from_now(&now, Duration::days(LIST_HORIZON_DAYS));
        let events = self
            .provider
            .list_events(&self.calendar_id, window, self.list_limit)
            .await?;

        if events.is_empty() {
            return Ok(format!(
                "No events in the next {} days.",
                LIST_HORIZON_DAYS
            ));
        }
        Ok(self.render(&events))
    }

    async fn remove_event(&self, text: &str, now: ZonedTimestamp) -> CliResult<String> {
        let query = self.model.locate_event(text, now, self.zone()).await?;
        let EventQuery { title_hint, date } = &query;
        debug!(title_hint = %title_hint, %date, "looking for event to remove");

        let window = TimeWindow::for_date(*date, self.zone().tz());
        let candidates: Vec<CalendarEvent> = self
            .provider
            .list_events(&self.calendar_id, window, REMOVE_SEARCH_LIMIT)
            .await?
            .into_iter()
            .filter(|event| event.title_contains(title_hint))
            .collect();

        match candidates.as_slice() {
            [] => Ok(if title_hint.is_empty() {
                format!("No events on {}.", date)
            } else {
                format!("No event matching \"{}\" on {}.", title_hint, date)
            }),
            [event] => {
                self.provider
                    .delete_event(&self.calendar_id, &event.id)
                    .await?;
                info!(event_id = %event.id, "event removed");
                Ok(format!(
                    "Removed \"{}\" ({}).",
                    event.title,
                    event.start.display_in(self.zone())
                ))
            }
            several => Ok(format!(
                "{} events on {} match, please be more specific:\n{}",
                several.len(),
                date,
                self.render(several)
            )),
        }
    }

    async fn switch_calendar(&mut self, name: &str) -> CliResult<String> {
        let calendars = self.provider.list_calendars().await?;
        match calendars.iter().find(|c| c.matches(name)) {
            Some(calendar) => {
                self.calendar_id = calendar.id.clone();
                info!(calendar_id = %calendar.id, "switched calendar");
                Ok(format!("Now using calendar \"{}\".", calendar.name))
            }
            None => {
                let names: Vec<&str> = calendars.iter().map(|c| c.name.as_str()).collect();
                Ok(format!(
                    "No calendar called \"{}\". Available: {}.",
                    name,
                    names.join(", ")
                ))
            }
        }
    }

    /// One `start – title` line per event.
    fn render(&self, events: &[CalendarEvent]) -> String {
        events
            .iter()
            .map(|e| format!("{} – {}", e.start.display_in(self.zone()), e.title))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
