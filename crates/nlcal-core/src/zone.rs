//! The configured default zone, with the ISO parser and wire formatter.
//!
//! The calendar API wants a zone-naive local string plus a separate zone
//! field, while the model emits ISO strings that may or may not carry an
//! offset. [`LocalZone`] bridges the two: [`LocalZone::parse`] reads model
//! output, placing offset-less values in the zone, and
//! [`LocalZone::format`] renders any timestamp back on the zone's wall
//! clock.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;

use crate::error::{ParseError, ZoneError};
use crate::time::{Zone, ZonedTimestamp};

/// Wire format for zone-naive local date-times, e.g. `2025-08-14T10:00:00`.
pub const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M%#z",
];

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// An IANA zone used as the default for offset-less input and as the
/// wall clock for output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalZone {
    tz: Tz,
}

impl LocalZone {
    /// Creates a local zone.
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Looks up an IANA zone by name.
    pub fn from_name(name: &str) -> Result<Self, ZoneError> {
        name.trim()
            .parse::<Tz>()
            .map(Self::new)
            .map_err(|_| ZoneError(name.to_string()))
    }

    /// Returns the IANA name.
    pub fn name(&self) -> &'static str {
        self.tz.name()
    }

    /// Returns the underlying timezone.
    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// Returns this zone as a timestamp [`Zone`].
    pub fn zone(&self) -> Zone {
        Zone::Named(self.tz)
    }

    /// Reads the system clock. Call once per logical operation and pass
    /// the result down.
    pub fn now(&self) -> ZonedTimestamp {
        self.at_instant(Utc::now())
    }

    /// Places an absolute instant on this zone's wall clock.
    pub fn at_instant(&self, instant: DateTime<Utc>) -> ZonedTimestamp {
        ZonedTimestamp::from_instant(instant, self.tz)
    }

    /// Interprets wall-clock fields in this zone.
    pub fn at(&self, local: NaiveDateTime) -> ZonedTimestamp {
        ZonedTimestamp::from_local(local, self.tz)
    }

    /// Parses an ISO date or date-time.
    ///
    /// - A bare `YYYY-MM-DD` becomes midnight in this zone.
    /// - A trailing `Z` means UTC.
    /// - An explicit offset is kept as a fixed-offset zone.
    /// - A date-time without an offset is placed in this zone.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] for anything outside that subset.
    pub fn parse(&self, text: &str) -> Result<ZonedTimestamp, ParseError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ParseError::new(text, "empty"));
        }
        if !has_date_prefix(trimmed) {
            return Err(ParseError::new(text, "expected a YYYY-MM-DD date"));
        }

        if trimmed.len() == 10 {
            let date = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .map_err(|_| ParseError::new(text, "no such calendar date"))?;
            return Ok(self.at(date.and_time(NaiveTime::MIN)));
        }

        let normalized = match trimmed.get(10..11) {
            Some("T") | Some("t") => format!("{}T{}", &trimmed[..10], &trimmed[11..]),
            Some(" ") => format!("{}T{}", &trimmed[..10], &trimmed[11..]),
            _ => return Err(ParseError::new(text, "expected 'T' between date and time")),
        };

        let normalized = match normalized
            .strip_suffix('Z')
            .or_else(|| normalized.strip_suffix('z'))
        {
            Some(body) => format!("{}+00:00", body),
            None => normalized,
        };

        for format in OFFSET_FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(&normalized, format) {
                return Ok(ZonedTimestamp::from_instant(
                    dt.with_timezone(&Utc),
                    *dt.offset(),
                ));
            }
        }

        for format in NAIVE_FORMATS {
            if let Ok(local) = NaiveDateTime::parse_from_str(&normalized, format) {
                return Ok(self.at(local));
            }
        }

        Err(ParseError::new(text, "malformed time or offset"))
    }

    /// Renders a timestamp on this zone's wall clock, without offset and
    /// with second precision.
    pub fn format(&self, ts: &ZonedTimestamp) -> String {
        ts.with_zone(self.tz).local().format(WIRE_FORMAT).to_string()
    }
}

impl Default for LocalZone {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl FromStr for LocalZone {
    type Err = ZoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

impl fmt::Display for LocalZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Checks the fixed `YYYY-MM-DD` shape, which chrono alone would accept
/// more loosely (single-digit months, signed years).
fn has_date_prefix(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() >= 10
        && bytes[..10].iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset, TimeZone, Timelike};

    fn warsaw() -> LocalZone {
        LocalZone::from_name("Europe/Warsaw").unwrap()
    }

    mod parse {
        use super::*;

        #[test]
        fn bare_date_is_midnight_in_default_zone() {
            let ts = warsaw().parse("2025-08-14").unwrap();
            assert_eq!(ts.time().hour(), 0);
            assert_eq!(ts.time().minute(), 0);
            assert_eq!(ts.time().second(), 0);
            assert_eq!(ts.zone(), warsaw().zone());
        }

        #[test]
        fn zulu_suffix_is_utc() {
            let ts = warsaw().parse("2025-08-14T10:00:00Z").unwrap();
            assert_eq!(ts.zone(), Zone::utc());
            assert_eq!(ts.instant(), Utc.with_ymd_and_hms(2025, 8, 14, 10, 0, 0).unwrap());
            // Warsaw is two hours ahead of UTC in August.
            assert_eq!(ts.with_zone(warsaw().tz()).time().hour(), 12);
        }

        #[test]
        fn explicit_offset_is_kept() {
            let ts = warsaw().parse("2025-08-14T10:00:00-07:00").unwrap();
            let offset = FixedOffset::west_opt(7 * 3600).unwrap();
            assert_eq!(ts.zone(), Zone::Fixed(offset));
            assert_eq!(ts.time().hour(), 10);
        }

        #[test]
        fn compact_offset() {
            let ts = warsaw().parse("2025-08-14T10:00:00+0200").unwrap();
            assert_eq!(ts.instant(), Utc.with_ymd_and_hms(2025, 8, 14, 8, 0, 0).unwrap());
        }

        #[test]
        fn naive_datetime_gets_default_zone_not_utc() {
            let ts = warsaw().parse("2025-08-14T10:00:00").unwrap();
            assert_eq!(ts.zone(), warsaw().zone());
            assert_eq!(ts.instant(), Utc.with_ymd_and_hms(2025, 8, 14, 8, 0, 0).unwrap());
        }

        #[test]
        fn accepts_minutes_fractions_and_space() {
            let zone = warsaw();
            assert_eq!(zone.parse("2025-08-14T10:30").unwrap().time().minute(), 30);
            assert_eq!(
                zone.parse("2025-08-14 10:30:15").unwrap().time().second(),
                15
            );
            let frac = zone.parse("2025-08-14T10:30:15.250").unwrap();
            assert_eq!(frac.time().nanosecond(), 250_000_000);
        }

        #[test]
        fn rejects_garbage() {
            let zone = warsaw();
            for input in [
                "",
                "tomorrow",
                "2025-8-14",
                "14-08-2025",
                "2025-02-30",
                "2025-08-14T25:00",
                "2025-08-14X10:00",
                "2025-08-14T10:00:00+99:99",
            ] {
                let err = zone.parse(input).unwrap_err();
                assert_eq!(err.input, input, "input {:?}", input);
            }
        }
    }

    mod format {
        use super::*;

        #[test]
        fn renders_zone_naive_second_precision() {
            let zone = warsaw();
            let ts = zone.at(
                NaiveDate::from_ymd_opt(2025, 8, 14)
                    .unwrap()
                    .and_hms_milli_opt(10, 0, 0, 500)
                    .unwrap(),
            );
            insta::assert_snapshot!(zone.format(&ts), @"2025-08-14T10:00:00");
        }

        #[test]
        fn converts_into_default_zone() {
            let zone = warsaw();
            let ts = zone.parse("2025-08-14T10:00:00Z").unwrap();
            assert_eq!(zone.format(&ts), "2025-08-14T12:00:00");
        }

        #[test]
        fn round_trips_local_wall_clock() {
            let zone = warsaw();
            for input in [
                "2025-08-14",
                "2025-08-14T10:00:00",
                "2025-01-01T00:00:00",
                "2024-02-29T23:59:59",
                "2025-10-26T02:30:00",
                "2025-03-30T02:30:00",
            ] {
                let formatted = zone.format(&zone.parse(input).unwrap());
                let expected = if input.len() == 10 {
                    format!("{}T00:00:00", input)
                } else {
                    input.to_string()
                };
                assert_eq!(formatted, expected);
            }
        }

        #[test]
        fn spring_forward_gap_keeps_wall_clock() {
            let zone = warsaw();
            let ts = zone.parse("2025-03-30T02:30:00").unwrap();
            assert_eq!(zone.format(&ts), "2025-03-30T02:30:00");
            assert_eq!(zone.format(&ts.shifted(Duration::hours(1))), "2025-03-30T03:30:00");
        }

        #[test]
        fn shifted_renders_next_day() {
            let zone = warsaw();
            let ts = zone.parse("2025-08-14T23:30:00").unwrap();
            assert_eq!(zone.format(&ts.shifted(Duration::hours(1))), "2025-08-15T00:30:00");
        }
    }

    mod zone_lookup {
        use super::*;

        #[test]
        fn known_and_unknown_names() {
            assert_eq!(warsaw().name(), "Europe/Warsaw");
            assert_eq!(" UTC ".parse::<LocalZone>().unwrap().name(), "UTC");
            assert!(LocalZone::from_name("Europe/Atlantis").is_err());
        }
    }
}
