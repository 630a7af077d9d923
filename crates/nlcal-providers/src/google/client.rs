//! Google Calendar API v3 over HTTP.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use nlcal_core::{EventColor, NormalizedEvent, TimeWindow};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::event::{CalendarEvent, CreatedEvent, EventTime};

const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Largest page the events endpoint serves.
const MAX_PAGE_SIZE: usize = 2500;

/// Stateless client; the caller supplies a current access token per call.
#[derive(Debug, Clone)]
pub struct GoogleCalendarClient {
    http_client: reqwest::Client,
    api_base: String,
}

impl GoogleCalendarClient {
    pub fn new(timeout: Duration, user_agent: &str) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                ProviderError::configuration(format!("failed to create HTTP client: {}", e))
            })?;
        Ok(Self {
            http_client,
            api_base: CALENDAR_API_BASE.to_string(),
        })
    }

    fn events_url(&self, calendar_id: &str) -> String {
        format!(
            "{}/calendars/{}/events",
            self.api_base,
            urlencoding::encode(calendar_id)
        )
    }

    /// `events.insert`.
    pub async fn insert_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event: &NormalizedEvent,
    ) -> ProviderResult<CreatedEvent> {
        let body = InsertBody::from_event(event);
        debug!(calendar_id, summary = %body.summary, start = %body.start.date_time, "inserting event");

        let response = self
            .http_client
            .post(self.events_url(calendar_id))
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(request_error)?;
        let created: ApiEvent = read_json(check_status(response).await?).await?;

        Ok(CreatedEvent {
            id: created.id.unwrap_or_default(),
            html_link: created.html_link,
        })
    }

    /// `events.list` with recurring events expanded, following pages until
    /// `max_results` events are collected.
    pub async fn list_events(
        &self,
        access_token: &str,
        calendar_id: &str,
        window: TimeWindow,
        max_results: usize,
    ) -> ProviderResult<Vec<CalendarEvent>> {
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        while events.len() < max_results {
            let page_size = (max_results - events.len()).min(MAX_PAGE_SIZE);
            let mut request = self
                .http_client
                .get(self.events_url(calendar_id))
                .bearer_auth(access_token)
                .query(&[
                    ("timeMin", window.start.to_rfc3339()),
                    ("timeMax", window.end.to_rfc3339()),
                    ("singleEvents", "true".to_string()),
                    ("orderBy", "startTime".to_string()),
                    ("maxResults", page_size.to_string()),
                ]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let response = request.send().await.map_err(request_error)?;
            let page: EventListResponse = read_json(check_status(response).await?).await?;
            events.extend(page.items.into_iter().filter_map(convert_event));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        events.truncate(max_results);
        debug!(calendar_id, count = events.len(), "listed events");
        Ok(events)
    }

    /// `events.delete`.
    pub async fn delete_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event_id: &str,
    ) -> ProviderResult<()> {
        let url = format!(
            "{}/{}",
            self.events_url(calendar_id),
            urlencoding::encode(event_id)
        );
        let response = self
            .http_client
            .delete(url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(request_error)?;
        check_status(response).await?;
        Ok(())
    }

    /// `calendarList.list`.
    pub async fn list_calendars(&self, access_token: &str) -> ProviderResult<Vec<CalendarListEntry>> {
        let response = self
            .http_client
            .get(format!("{}/users/me/calendarList", self.api_base))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(request_error)?;
        let list: CalendarListResponse = read_json(check_status(response).await?).await?;
        Ok(list.items)
    }
}

fn request_error(e: reqwest::Error) -> ProviderError {
    let message = if e.is_timeout() {
        "request timed out".to_string()
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        format!("request failed: {}", e)
    };
    ProviderError::network(message).with_source(e)
}

async fn check_status(response: reqwest::Response) -> ProviderResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.text().await.unwrap_or_default();
    let mut error = ProviderError::from_status(status.as_u16(), &body);
    if let Some(secs) = retry_after {
        error = ProviderError::new(
            error.code(),
            format!("{}, retry after {} seconds", error.message(), secs),
        );
    }
    Err(error)
}

async fn read_json<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> ProviderResult<T> {
    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::network(format!("failed to read response: {}", e)))?;
    serde_json::from_str(&body)
        .map_err(|e| ProviderError::invalid_response(format!("unexpected response: {}", e)))
}

/// Skips cancelled events and events whose times do not parse.
fn convert_event(event: ApiEvent) -> Option<CalendarEvent> {
    if event.status.as_deref() == Some("cancelled") {
        return None;
    }
    let id = event.id?;
    let start = match event.start.as_ref().and_then(ApiEventTime::to_event_time) {
        Some(start) => start,
        None => {
            warn!(id = %id, "skipping event without a readable start");
            return None;
        }
    };
    let end = event
        .end
        .as_ref()
        .and_then(ApiEventTime::to_event_time)
        .unwrap_or(start);

    let mut converted = CalendarEvent::new(id, event.summary.unwrap_or_default(), start, end);
    converted.location = event.location;
    converted.html_link = event.html_link;
    Some(converted)
}

/// Request body for `events.insert`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InsertBody<'a> {
    summary: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a str>,
    color_id: &'static str,
    start: InsertTime<'a>,
    end: InsertTime<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InsertTime<'a> {
    date_time: &'a str,
    time_zone: &'a str,
}

impl<'a> InsertBody<'a> {
    fn from_event(event: &'a NormalizedEvent) -> Self {
        Self {
            summary: &event.title,
            description: event.description.as_deref(),
            location: event.location.as_deref(),
            color_id: event.color.unwrap_or(EventColor::DEFAULT).id(),
            start: InsertTime {
                date_time: &event.start_iso,
                time_zone: &event.timezone,
            },
            end: InsertTime {
                date_time: &event.end_iso,
                time_zone: &event.timezone,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListResponse {
    #[serde(default)]
    items: Vec<ApiEvent>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEvent {
    id: Option<String>,
    summary: Option<String>,
    location: Option<String>,
    start: Option<ApiEventTime>,
    end: Option<ApiEventTime>,
    html_link: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEventTime {
    date: Option<String>,
    date_time: Option<String>,
}

impl ApiEventTime {
    fn to_event_time(&self) -> Option<EventTime> {
        if let Some(dt) = &self.date_time {
            return DateTime::parse_from_rfc3339(dt)
                .map(|dt| EventTime::DateTime(dt.with_timezone(&Utc)))
                .map_err(|e| warn!(value = %dt, error = %e, "bad dateTime"))
                .ok();
        }
        let date = self.date.as_ref()?;
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map(EventTime::AllDay)
            .map_err(|e| warn!(value = %date, error = %e, "bad date"))
            .ok()
    }
}

#[derive(Debug, Deserialize)]
struct CalendarListResponse {
    #[serde(default)]
    items: Vec<CalendarListEntry>,
}

/// One entry of the account's calendar list.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarListEntry {
    pub id: String,
    #[serde(default)]
    pub summary: String,
    /// The user's own name for a shared calendar.
    pub summary_override: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub primary: bool,
    pub time_zone: Option<String>,
}
