//! `config.toml`.
//!
//! Lives at `~/.config/nlcal/config.toml` unless `--config` or
//! `NLCAL_CONFIG` points elsewhere. Every key is optional:
//!
//! ```toml
//! [general]
//! timezone = "Europe/Warsaw"
//! history_size = 10
//! list_limit = 10
//!
//! [gemini]
//! api_key = "env::GEMINI_API_KEY"
//! model = "gemini-2.0-flash"
//!
//! [google]
//! credentials_file = "credentials.json"
//! calendar_id = "primary"
//! ```

use std::path::{Path, PathBuf};

use nlcal_assistant::gemini::DEFAULT_MODEL;
use nlcal_core::{DEFAULT_HISTORY_SIZE, LocalZone};
use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};
use crate::secret;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralSettings,
    pub gemini: GeminiSettings,
    pub google: GoogleSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// IANA zone used when the user does not name one.
    pub timezone: String,
    /// Earlier turns shown to the classifier.
    pub history_size: usize,
    /// Most events printed by a listing.
    pub list_limit: usize,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            timezone: "Europe/Warsaw".to_string(),
            history_size: DEFAULT_HISTORY_SIZE,
            list_limit: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiSettings {
    /// Supports `env::` and `pass::` references.
    pub api_key: String,
    pub model: String,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_key: "env::GEMINI_API_KEY".to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSettings {
    /// OAuth client file downloaded from Google Cloud Console.
    pub credentials_file: PathBuf,
    /// Defaults to the user data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_path: Option<PathBuf>,
    /// Calendar active when a session starts.
    pub calendar_id: String,
}

impl Default for GoogleSettings {
    fn default() -> Self {
        Self {
            credentials_file: PathBuf::from("credentials.json"),
            token_path: None,
            calendar_id: "primary".to_string(),
        }
    }
}

impl AppConfig {
    /// Reads the file at `path`, or the default path when `None`.
    ///
    /// A missing default file yields the defaults; a missing explicit file
    /// is an error.
    pub fn load(path: Option<&Path>) -> CliResult<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn load_from(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
            .map_err(|e| CliError::Config(format!("failed to parse {}: {}", path.display(), e)))
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nlcal")
            .join("config.toml")
    }

    pub fn to_toml(&self) -> CliResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("failed to serialize config: {}", e)))
    }

    /// The configured default zone.
    pub fn zone(&self) -> CliResult<LocalZone> {
        Ok(LocalZone::from_name(self.general.timezone.trim())?)
    }

    pub fn resolve_api_key(&self) -> CliResult<String> {
        secret::resolve(&self.gemini.api_key)
            .map_err(|e| CliError::Config(format!("cannot resolve gemini.api_key: {}", e)))
    }

    /// Checks everything that does not need the network or the Gemini key.
    pub fn validate(&self) -> CliResult<()> {
        self.zone()?;
        if self.general.list_limit == 0 {
            return Err(CliError::Config(
                "general.list_limit must be at least 1".to_string(),
            ));
        }
        if self.gemini.model.trim().is_empty() {
            return Err(CliError::Config("gemini.model must not be empty".to_string()));
        }
        if self.google.calendar_id.trim().is_empty() {
            return Err(CliError::Config(
                "google.calendar_id must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(feature = "google")]
impl GoogleSettings {
    /// Reads the credentials file and builds the provider settings.
    pub fn to_provider_config(
        &self,
    ) -> nlcal_providers::ProviderResult<nlcal_providers::google::GoogleConfig> {
        use nlcal_providers::google::{GoogleConfig, OAuthCredentials};

        let credentials = OAuthCredentials::from_file(&self.credentials_file)?;
        let mut config = GoogleConfig::new(credentials);
        if let Some(path) = &self.token_path {
            config = config.with_token_path(path);
        }
        config.validate()?;
        Ok(config)
    }
}
