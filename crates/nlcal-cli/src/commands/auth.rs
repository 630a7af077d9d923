//! `nlcal auth google`.

use nlcal_providers::CalendarProvider;
use nlcal_providers::google::GoogleProvider;
use tracing::info;

use crate::config::AppConfig;
use crate::error::CliResult;

/// Runs the browser consent flow unless usable tokens are already stored.
pub async fn google(config: &AppConfig, force: bool) -> CliResult<()> {
    let provider_config = config.google.to_provider_config()?;
    let token_path = provider_config.token_path.clone();
    let provider = GoogleProvider::new(provider_config)?;

    if provider.is_authenticated() && !provider.needs_reauth() && !force {
        println!("Already authenticated with Google Calendar.");
        println!("Use --force to authenticate again.");
        return Ok(());
    }

    println!("A browser window will open to authorize access to Google Calendar.");
    println!("If it does not, open the URL printed below.");
    provider.authenticate(true).await?;

    info!(path = %token_path.display(), "Google tokens saved");
    println!("Authentication successful. Tokens saved to {}.", token_path.display());
    Ok(())
}
