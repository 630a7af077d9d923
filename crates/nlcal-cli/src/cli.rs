//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// nlcal - manage your calendar in plain language
#[derive(Debug, Parser)]
#[command(name = "nlcal")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, global = true, env = "NLCAL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// IANA timezone overriding `general.timezone`, e.g. Europe/Warsaw
    #[arg(long, global = true)]
    pub timezone: Option<String>,

    /// Keep events in memory instead of touching Google Calendar
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive conversation (the default)
    Chat,

    /// Handle a single request and exit
    Ask {
        /// The request, e.g. "dodaj spotkanie jutro o 15"
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Authentication commands
    Auth {
        #[command(subcommand)]
        provider: AuthProvider,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum AuthProvider {
    /// Authorize access to Google Calendar
    #[cfg(feature = "google")]
    Google {
        /// Re-run the browser flow even when tokens are stored
        #[arg(long, short)]
        force: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Dump,

    /// Check the configuration
    Validate,

    /// Show the configuration file path
    Path,
}
