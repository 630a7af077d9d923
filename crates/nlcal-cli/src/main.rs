//! nlcal CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use nlcal_core::{TracingConfig, init_tracing};

use nlcal_cli::cli::{AuthProvider, Cli, Command, ConfigAction};
use nlcal_cli::commands;
use nlcal_cli::config::AppConfig;
use nlcal_cli::error::CliResult;

#[tokio::main]
async fn main() -> ExitCode {
    // Load `.env` before clap reads env-backed flags.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let tracing_config = if cli.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::interactive()
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let config_path = cli.config.clone().unwrap_or_else(AppConfig::default_path);
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(timezone) = cli.timezone {
        config.general.timezone = timezone;
    }

    match cli.command {
        None | Some(Command::Chat) => commands::chat::chat(&config, cli.dry_run).await,
        Some(Command::Ask { text }) => {
            commands::chat::ask(&config, cli.dry_run, &text.join(" ")).await
        }
        Some(Command::Auth { provider }) => match provider {
            #[cfg(feature = "google")]
            AuthProvider::Google { force } => commands::auth::google(&config, force).await,
        },
        Some(Command::Config { action }) => match action {
            ConfigAction::Dump => commands::config::dump(&config, &config_path),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(&config_path),
        },
    }
}
