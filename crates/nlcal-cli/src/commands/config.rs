//! `nlcal config`.

use std::path::Path;

use crate::config::AppConfig;
use crate::error::CliResult;

pub fn dump(config: &AppConfig, path: &Path) -> CliResult<()> {
    println!("# {}", path.display());
    print!("{}", config.to_toml()?);
    Ok(())
}

pub fn validate(config: &AppConfig) -> CliResult<()> {
    config.validate()?;

    match config.resolve_api_key() {
        Ok(_) => println!("Gemini API key resolves."),
        Err(e) => println!("warning: {}", e),
    }

    #[cfg(feature = "google")]
    match config.google.to_provider_config() {
        Ok(_) => println!("Google credentials are valid."),
        Err(e) => println!("warning: {}", e),
    }

    println!("Configuration is valid.");
    Ok(())
}

pub fn path(path: &Path) -> CliResult<()> {
    let status = if path.exists() { "" } else { " (not created yet)" };
    println!("config: {}{}", path.display(), status);
    Ok(())
}
