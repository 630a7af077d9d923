//! [`CalendarProvider`] for Google Calendar.

use nlcal_core::{NormalizedEvent, TimeWindow};
use tokio::sync::Mutex as TokioMutex;
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};
use crate::event::{CalendarEvent, CreatedEvent};
use crate::provider::{BoxFuture, CalendarInfo, CalendarProvider};

use super::client::{CalendarListEntry, GoogleCalendarClient};
use super::config::GoogleConfig;
use super::oauth::OAuthClient;
use super::tokens::TokenStorage;

const PROVIDER_NAME: &str = "google";

/// Google Calendar through the v3 REST API.
///
/// Tokens are loaded from `token_path` on construction and refreshed on
/// demand. Nothing interactive happens until [`authenticate`] is called.
///
/// [`authenticate`]: GoogleProvider::authenticate
pub struct GoogleProvider {
    config: GoogleConfig,
    token_storage: TokenStorage,
    oauth_client: OAuthClient,
    api_client: GoogleCalendarClient,
    /// Serializes refreshes so concurrent calls do not each hit the token endpoint.
    refresh_lock: TokioMutex<()>,
}

impl GoogleProvider {
    pub fn new(config: GoogleConfig) -> ProviderResult<Self> {
        config.validate().map_err(|e| e.with_provider(PROVIDER_NAME))?;

        let token_storage = TokenStorage::new(&config.token_path);
        token_storage
            .load()
            .map_err(|e| e.with_provider(PROVIDER_NAME))?;

        let oauth_client = OAuthClient::new(config.credentials.clone(), config.timeout)?;
        let api_client = GoogleCalendarClient::new(config.timeout, &config.user_agent)?;

        Ok(Self {
            config,
            token_storage,
            oauth_client,
            api_client,
            refresh_lock: TokioMutex::new(()),
        })
    }

    pub fn config(&self) -> &GoogleConfig {
        &self.config
    }

    /// Runs the browser consent flow and stores the resulting tokens.
    ///
    /// Without `force`, returns early when the stored grant is still usable
    /// and covers the configured scopes.
    pub async fn authenticate(&self, force: bool) -> ProviderResult<()> {
        if !force && self.is_authenticated() && !self.needs_reauth() {
            info!("already authenticated with Google");
            return Ok(());
        }

        info!("starting Google authentication flow");
        let tokens = self
            .oauth_client
            .authorize(&self.config.scopes, self.config.loopback_port_range)
            .await
            .map_err(|e| e.with_provider(PROVIDER_NAME))?;
        self.token_storage
            .set(tokens)
            .map_err(|e| e.with_provider(PROVIDER_NAME))?;

        info!(path = %self.token_storage.path().display(), "authentication successful");
        Ok(())
    }

    /// Whether the stored grant is missing or lacks a configured scope.
    pub fn needs_reauth(&self) -> bool {
        self.token_storage.needs_reauth(&self.config.scopes)
    }

    /// Forgets the stored tokens.
    pub fn logout(&self) -> ProviderResult<()> {
        self.token_storage
            .clear()
            .map_err(|e| e.with_provider(PROVIDER_NAME))
    }

    /// Returns a usable access token, refreshing it first when expired.
    async fn access_token(&self) -> ProviderResult<String> {
        let tokens = self.token_storage.get().ok_or_else(|| {
            ProviderError::authentication("not authenticated, run `nlcal auth google`")
                .with_provider(PROVIDER_NAME)
        })?;
        if !tokens.is_expired() {
            return Ok(tokens.access_token);
        }

        let _guard = self.refresh_lock.lock().await;
        // Another task may have refreshed while we waited.
        if let Some(current) = self.token_storage.get()
            && !current.is_expired()
        {
            return Ok(current.access_token);
        }

        let refresh_token = tokens.refresh_token.ok_or_else(|| {
            ProviderError::authentication(
                "access token expired and no refresh token is stored, run `nlcal auth google`",
            )
            .with_provider(PROVIDER_NAME)
        })?;

        debug!("refreshing expired access token");
        let response = self
            .oauth_client
            .refresh(&refresh_token)
            .await
            .map_err(|e| e.with_provider(PROVIDER_NAME))?;
        let access_token = response.access_token.clone();
        self.token_storage
            .update(
                response.access_token,
                response.refresh_token,
                response.expires_in,
            )
            .map_err(|e| e.with_provider(PROVIDER_NAME))?;
        Ok(access_token)
    }

    async fn insert_event_impl(
        &self,
        calendar_id: &str,
        event: &NormalizedEvent,
    ) -> ProviderResult<CreatedEvent> {
        let token = self.access_token().await?;
        let created = self
            .api_client
            .insert_event(&token, calendar_id, event)
            .await
            .map_err(|e| e.with_provider(PROVIDER_NAME))?;
        info!(calendar_id, event_id = %created.id, "created event");
        Ok(created)
    }

    async fn list_events_impl(
        &self,
        calendar_id: &str,
        window: TimeWindow,
        max_results: usize,
    ) -> ProviderResult<Vec<CalendarEvent>> {
        if max_results == 0 {
            return Ok(Vec::new());
        }
        let token = self.access_token().await?;
        self.api_client
            .list_events(&token, calendar_id, window, max_results)
            .await
            .map_err(|e| e.with_provider(PROVIDER_NAME))
    }

    async fn delete_event_impl(&self, calendar_id: &str, event_id: &str) -> ProviderResult<()> {
        let token = self.access_token().await?;
        self.api_client
            .delete_event(&token, calendar_id, event_id)
            .await
            .map_err(|e| e.with_provider(PROVIDER_NAME))?;
        info!(calendar_id, event_id, "deleted event");
        Ok(())
    }

    async fn list_calendars_impl(&self) -> ProviderResult<Vec<CalendarInfo>> {
        let token = self.access_token().await?;
        let entries = self
            .api_client
            .list_calendars(&token)
            .await
            .map_err(|e| e.with_provider(PROVIDER_NAME))?;
        Ok(entries.into_iter().map(calendar_info).collect())
    }
}

fn calendar_info(entry: CalendarListEntry) -> CalendarInfo {
    let name = match entry.summary_override {
        Some(name) => name,
        None if entry.summary.is_empty() => entry.id.clone(),
        None => entry.summary,
    };
    let mut info = CalendarInfo::new(entry.id, name).with_primary(entry.primary);
    if let Some(tz) = entry.time_zone {
        info = info.with_timezone(tz);
    }
    info.description = entry.description;
    info
}

impl CalendarProvider for GoogleProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn insert_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event: &'a NormalizedEvent,
    ) -> BoxFuture<'a, ProviderResult<CreatedEvent>> {
        Box::pin(self.insert_event_impl(calendar_id, event))
    }

    fn list_events<'a>(
        &'a self,
        calendar_id: &'a str,
        window: TimeWindow,
        max_results: usize,
    ) -> BoxFuture<'a, ProviderResult<Vec<CalendarEvent>>> {
        Box::pin(self.list_events_impl(calendar_id, window, max_results))
    }

    fn delete_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(self.delete_event_impl(calendar_id, event_id))
    }

    fn list_calendars(&self) -> BoxFuture<'_, ProviderResult<Vec<CalendarInfo>>> {
        Box::pin(self.list_calendars_impl())
    }

    fn is_authenticated(&self) -> bool {
        self.token_storage.has_valid_tokens() || self.token_storage.has_refresh_token()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;
    use crate::google::config::OAuthCredentials;
    use crate::google::tokens::TokenInfo;

    fn config(dir: &tempfile::TempDir) -> GoogleConfig {
        GoogleConfig::new(OAuthCredentials::new(
            "test-client.apps.googleusercontent.com",
            "test-secret",
        ))
        .with_token_path(dir.path().join("token.json"))
    }

    #[test]
    fn rejects_invalid_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let config = GoogleConfig::new(OAuthCredentials::new("nope", "s"))
            .with_token_path(dir.path().join("token.json"));
        let err = GoogleProvider::new(config).err().unwrap();
        assert_eq!(err.code(), ProviderErrorCode::ConfigurationError);
        assert_eq!(err.provider(), Some("google"));
    }

    #[test]
    fn not_authenticated_without_token_file() {
        let dir = tempfile::tempdir().unwrap();
        let provider = GoogleProvider::new(config(&dir)).unwrap();
        assert_eq!(provider.name(), "google");
        assert!(!provider.is_authenticated());
        assert!(provider.needs_reauth());
    }

    #[test]
    fn expired_token_with_refresh_token_counts_as_authenticated() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        TokenStorage::new(&config.token_path)
            .set(TokenInfo::new(
                "old",
                Some("refresh".into()),
                Some(0),
                config.scopes.clone(),
            ))
            .unwrap();

        let provider = GoogleProvider::new(config).unwrap();
        assert!(provider.is_authenticated());
        assert!(!provider.needs_reauth());
    }

    #[tokio::test]
    async fn calls_fail_with_auth_hint_when_not_logged_in() {
        let dir = tempfile::tempdir().unwrap();
        let provider = GoogleProvider::new(config(&dir)).unwrap();
        let err = provider.list_calendars().await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
        assert!(err.message().contains("nlcal auth google"));
    }

    #[tokio::test]
    async fn expired_token_without_refresh_token_is_an_auth_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        TokenStorage::new(&config.token_path)
            .set(TokenInfo::new("old", None, Some(0), config.scopes.clone()))
            .unwrap();

        let provider = GoogleProvider::new(config).unwrap();
        assert!(!provider.is_authenticated());
        let err = provider.delete_event("primary", "x").await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
    }

    #[test]
    fn calendar_entry_prefers_override_name() {
        let entry = CalendarListEntry {
            id: "abc@group.calendar.google.com".into(),
            summary: "Team".into(),
            summary_override: Some("My team".into()),
            description: None,
            primary: false,
            time_zone: Some("Europe/Warsaw".into()),
        };
        let info = calendar_info(entry);
        assert_eq!(info.name, "My team");
        assert_eq!(info.timezone.as_deref(), Some("Europe/Warsaw"));
        assert!(!info.is_primary);
    }

    #[test]
    fn logout_removes_token_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        let path = config.token_path.clone();
        TokenStorage::new(&path)
            .set(TokenInfo::new("a", None, None, vec![]))
            .unwrap();
        let provider = GoogleProvider::new(config).unwrap();
        provider.logout().unwrap();
        assert!(!path.exists());
        assert!(!provider.is_authenticated());
    }
}
