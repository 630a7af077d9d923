//! Google Calendar backend.
//!
//! Authorization uses the installed-app OAuth flow with PKCE: a listener on
//! `127.0.0.1` receives the redirect, the code is exchanged for tokens, and
//! the tokens are stored under the user's data directory. Expired access
//! tokens are refreshed transparently.
//!
//! ```ignore
//! use nlcal_providers::google::{GoogleConfig, GoogleProvider, OAuthCredentials};
//!
//! let credentials = OAuthCredentials::from_file("credentials.json")?;
//! let provider = GoogleProvider::new(GoogleConfig::new(credentials))?;
//! if !provider.is_authenticated() {
//!     provider.authenticate(false).await?;
//! }
//! ```

mod client;
mod config;
mod oauth;
mod provider;
mod tokens;

pub use client::{CalendarListEntry, GoogleCalendarClient};
pub use config::{GoogleConfig, OAuthCredentials, SCOPE_CALENDAR, SCOPE_CALENDAR_EVENTS};
pub use oauth::{OAuthClient, PkceFlow, TokenResponse};
pub use provider::GoogleProvider;
pub use tokens::{TokenInfo, TokenStorage};
