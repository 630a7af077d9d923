//! Calendar backends for nlcal.
//!
//! - [`CalendarProvider`] is the trait the assistant talks to
//! - [`MemoryProvider`] keeps events in process memory
//! - [`google::GoogleProvider`] talks to Google Calendar (feature `google`)
//! - [`ProviderError`] carries a [`ProviderErrorCode`] for callers to branch on

pub mod error;
pub mod event;
#[cfg(feature = "google")]
pub mod google;
pub mod provider;

pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use event::{CalendarEvent, CreatedEvent, EventTime};
pub use provider::{BoxFuture, CalendarInfo, CalendarProvider, ErrorProvider, MemoryProvider};
