//! The [`CalendarProvider`] trait and its in-process implementations.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use nlcal_core::{LocalZone, NormalizedEvent, TimeWindow};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::event::{CalendarEvent, CreatedEvent, EventTime};

/// A calendar the account can see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarInfo {
    pub id: String,
    /// Display name.
    pub name: String,
    pub description: Option<String>,
    pub is_primary: bool,
    /// IANA zone configured on the calendar.
    pub timezone: Option<String>,
}

impl CalendarInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            is_primary: false,
            timezone: None,
        }
    }

    #[must_use]
    pub fn with_primary(mut self, is_primary: bool) -> Self {
        self.is_primary = is_primary;
        self
    }

    #[must_use]
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    /// Case-insensitive match against the id or the display name.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim();
        self.id.eq_ignore_ascii_case(query) || self.name.to_lowercase() == query.to_lowercase()
    }
}

/// Boxed future returned by provider methods, keeping the trait object-safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A calendar backend.
///
/// Calendar ids are backend-specific; `"primary"` names the account's
/// main calendar on Google.
pub trait CalendarProvider: Send + Sync {
    /// Short backend name used in errors and logs, e.g. `google`.
    fn name(&self) -> &str;

    /// Creates an event.
    fn insert_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event: &'a NormalizedEvent,
    ) -> BoxFuture<'a, ProviderResult<CreatedEvent>>;

    /// Lists events overlapping `window`, ordered by start, at most
    /// `max_results` of them. Recurring events are expanded into instances.
    fn list_events<'a>(
        &'a self,
        calendar_id: &'a str,
        window: TimeWindow,
        max_results: usize,
    ) -> BoxFuture<'a, ProviderResult<Vec<CalendarEvent>>>;

    /// Deletes one event.
    fn delete_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<()>>;

    /// Lists the calendars the account can see.
    fn list_calendars(&self) -> BoxFuture<'_, ProviderResult<Vec<CalendarInfo>>>;

    /// Whether usable credentials are loaded. Does not touch the network.
    fn is_authenticated(&self) -> bool;
}

/// A provider that fails every call with the same error.
///
/// Stands in for a backend that could not be set up, so the failure is
/// reported when the user first needs the calendar.
#[derive(Debug)]
pub struct ErrorProvider {
    name: String,
    error: ProviderError,
}

impl ErrorProvider {
    pub fn new(name: impl Into<String>, error: ProviderError) -> Self {
        Self {
            name: name.into(),
            error,
        }
    }

    fn error(&self) -> ProviderError {
        ProviderError::new(self.error.code(), self.error.message()).with_provider(&self.name)
    }
}

impl CalendarProvider for ErrorProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn insert_event<'a>(
        &'a self,
        _calendar_id: &'a str,
        _event: &'a NormalizedEvent,
    ) -> BoxFuture<'a, ProviderResult<CreatedEvent>> {
        let error = self.error();
        Box::pin(async move { Err(error) })
    }

    fn list_events<'a>(
        &'a self,
        _calendar_id: &'a str,
        _window: TimeWindow,
        _max_results: usize,
    ) -> BoxFuture<'a, ProviderResult<Vec<CalendarEvent>>> {
        let error = self.error();
        Box::pin(async move { Err(error) })
    }

    fn delete_event<'a>(
        &'a self,
        _calendar_id: &'a str,
        _event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        let error = self.error();
        Box::pin(async move { Err(error) })
    }

    fn list_calendars(&self) -> BoxFuture<'_, ProviderResult<Vec<CalendarInfo>>> {
        let error = self.error();
        Box::pin(async move { Err(error) })
    }

    fn is_authenticated(&self) -> bool {
        false
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    calendars: Vec<CalendarInfo>,
    events: HashMap<String, Vec<CalendarEvent>>,
    next_id: u64,
}

/// A calendar kept in process memory.
///
/// Used for tests and `--dry-run`. All-day events are placed on the
/// given zone's midnight when filtering.
#[derive(Debug)]
pub struct MemoryProvider {
    zone: LocalZone,
    state: Mutex<MemoryState>,
}

impl MemoryProvider {
    /// Creates a provider with a single `primary` calendar.
    pub fn new(zone: LocalZone) -> Self {
        let mut state = MemoryState::default();
        state
            .calendars
            .push(CalendarInfo::new("primary", "Primary").with_primary(true));
        state.events.insert("primary".to_string(), Vec::new());
        Self {
            zone,
            state: Mutex::new(state),
        }
    }

    /// Adds another calendar.
    #[must_use]
    pub fn with_calendar(mut self, info: CalendarInfo) -> Self {
        let state = self.state.get_mut();
        state.events.entry(info.id.clone()).or_default();
        state.calendars.push(info);
        self
    }

    /// Seeds an existing event.
    #[must_use]
    pub fn with_event(mut self, calendar_id: &str, event: CalendarEvent) -> Self {
        self.state
            .get_mut()
            .events
            .entry(calendar_id.to_string())
            .or_default()
            .push(event);
        self
    }

    /// Returns a snapshot of one calendar's events, in insertion order.
    pub async fn events(&self, calendar_id: &str) -> Vec<CalendarEvent> {
        self.state
            .lock()
            .await
            .events
            .get(calendar_id)
            .cloned()
            .unwrap_or_default()
    }
}

impl CalendarProvider for MemoryProvider {
    fn name(&self) -> &str {
        "memory"
    }

    fn insert_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event: &'a NormalizedEvent,
    ) -> BoxFuture<'a, ProviderResult<CreatedEvent>> {
        Box::pin(async move {
            let zone = LocalZone::from_name(&event.timezone)
                .map_err(|e| ProviderError::bad_request(e.to_string()).with_provider("memory"))?;
            let parse = |text: &str| {
                zone.parse(text)
                    .map(|ts| EventTime::DateTime(ts.instant()))
                    .map_err(|e| ProviderError::bad_request(e.to_string()).with_provider("memory"))
            };
            let start = parse(&event.start_iso)?;
            let end = parse(&event.end_iso)?;

            let mut state = self.state.lock().await;
            state.next_id += 1;
            let id = format!("mem-{}", state.next_id);
            let events = state.events.get_mut(calendar_id).ok_or_else(|| {
                ProviderError::not_found(format!("calendar {}", calendar_id)).with_provider("memory")
            })?;

            let mut stored = CalendarEvent::new(&id, &event.title, start, end);
            stored.location = event.location.clone();
            stored.html_link = Some(format!("memory://{}/{}", calendar_id, id));
            let created = CreatedEvent {
                id: id.clone(),
                html_link: stored.html_link.clone(),
            };
            events.push(stored);
            debug!(calendar_id, id = %id, "stored event in memory");
            Ok(created)
        })
    }

    fn list_events<'a>(
        &'a self,
        calendar_id: &'a str,
        window: TimeWindow,
        max_results: usize,
    ) -> BoxFuture<'a, ProviderResult<Vec<CalendarEvent>>> {
        Box::pin(async move {
            let state = self.state.lock().await;
            let events = state.events.get(calendar_id).ok_or_else(|| {
                ProviderError::not_found(format!("calendar {}", calendar_id)).with_provider("memory")
            })?;
            let mut found: Vec<CalendarEvent> = events
                .iter()
                .filter(|event| event.overlaps(&window, self.zone))
                .cloned()
                .collect();
            found.sort_by_key(|event| event.start.instant_in(self.zone));
            found.truncate(max_results);
            Ok(found)
        })
    }

    fn delete_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            let events = state.events.get_mut(calendar_id).ok_or_else(|| {
                ProviderError::not_found(format!("calendar {}", calendar_id)).with_provider("memory")
            })?;
            let before = events.len();
            events.retain(|event| event.id != event_id);
            if events.len() == before {
                return Err(
                    ProviderError::not_found(format!("event {}", event_id)).with_provider("memory")
                );
            }
            Ok(())
        })
    }

    fn list_calendars(&self) -> BoxFuture<'_, ProviderResult<Vec<CalendarInfo>>> {
        Box::pin(async move { Ok(self.state.lock().await.calendars.clone()) })
    }

    fn is_authenticated(&self) -> bool {
        true
    }
}
