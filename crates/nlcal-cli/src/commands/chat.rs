//! `nlcal chat` and `nlcal ask`.

use std::sync::Arc;

use nlcal_assistant::GeminiModel;
use nlcal_providers::{CalendarProvider, MemoryProvider};
use tokio::io::BufReader;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::CliResult;
use crate::repl;
use crate::session::Session;

/// Wires the model and the calendar backend from configuration.
///
/// A Google backend that cannot be set up does not stop the session; its
/// error is reported on the first calendar request instead. An invalid
/// configuration does.
pub fn build_session(config: &AppConfig, dry_run: bool) -> CliResult<Session> {
    config.validate()?;
    let zone = config.zone()?;
    let model = GeminiModel::new(config.resolve_api_key()?)?.with_model(&config.gemini.model);

    let provider: Arc<dyn CalendarProvider> = if dry_run {
        info!("dry run, events are kept in memory");
        Arc::new(MemoryProvider::new(zone))
    } else {
        google_provider(config)
    };

    let mut session = Session::new(Arc::new(model), provider, zone)
        .with_history_size(config.general.history_size)
        .with_list_limit(config.general.list_limit);
    if !dry_run {
        session = session.with_calendar(&config.google.calendar_id);
    }
    Ok(session)
}

#[cfg(feature = "google")]
fn google_provider(config: &AppConfig) -> Arc<dyn CalendarProvider> {
    use nlcal_providers::ErrorProvider;
    use nlcal_providers::google::GoogleProvider;

    match config
        .google
        .to_provider_config()
        .and_then(GoogleProvider::new)
    {
        Ok(provider) => {
            if !provider.is_authenticated() {
                warn!("not authenticated with Google Calendar, run `nlcal auth google`");
            }
            Arc::new(provider)
        }
        Err(e) => {
            warn!(error = %e, "Google Calendar is unavailable");
            Arc::new(ErrorProvider::new("google", e))
        }
    }
}

#[cfg(not(feature = "google"))]
fn google_provider(_config: &AppConfig) -> Arc<dyn CalendarProvider> {
    use nlcal_providers::{ErrorProvider, ProviderError};

    warn!("built without Google Calendar support");
    Arc::new(ErrorProvider::new(
        "google",
        ProviderError::configuration("built without Google Calendar support, use --dry-run"),
    ))
}

pub async fn chat(config: &AppConfig, dry_run: bool) -> CliResult<()> {
    let mut session = build_session(config, dry_run)?;
    println!(
        "nlcal: calendar {} in {}. Type your request, or \"exit\" to quit.",
        session.calendar_id(),
        session.zone()
    );
    let stdin = BufReader::new(tokio::io::stdin());
    repl::run(&mut session, stdin, &mut std::io::stdout()).await
}

pub async fn ask(config: &AppConfig, dry_run: bool, text: &str) -> CliResult<()> {
    let mut session = build_session(config, dry_run)?;
    let now = session.zone().now();
    let reply = session.handle(text, now).await?;
    println!("{}", reply);
    Ok(())
}
