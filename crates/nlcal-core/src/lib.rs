//! Core types: zoned time, future projection, event normalization, commands

pub mod command;
pub mod error;
pub mod event;
pub mod history;
pub mod normalize;
pub mod project;
pub mod time;
pub mod tracing;
pub mod zone;

pub use command::Command;
pub use error::{NormalizeError, ParseError, ZoneError};
pub use event::{EventColor, NormalizedEvent, RawEventDraft, UnknownColor};
pub use history::{ConversationHistory, DEFAULT_HISTORY_SIZE};
pub use normalize::{DEFAULT_DURATION_MINUTES, EventNormalizer};
pub use project::project_forward;
pub use time::{TimeWindow, Zone, ZonedTimestamp};
pub use self::tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
pub use zone::{LocalZone, WIRE_FORMAT};
