//! Time types for event normalization.
//!
//! This module provides [`ZonedTimestamp`], an instant that remembers the
//! zone its wall-clock fields are read in, the [`Zone`] it carries, and
//! [`TimeWindow`] for calendar queries.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, NaiveTime,
    Offset, TimeZone, Utc,
};
use chrono_tz::Tz;

/// The zone used to interpret a timestamp's wall-clock fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    /// An IANA zone with daylight-saving rules (e.g. `Europe/Warsaw`).
    Named(Tz),
    /// A fixed UTC offset, as written in an offset-qualified ISO string.
    Fixed(FixedOffset),
}

impl Zone {
    /// The zero UTC offset, used for `Z`-suffixed input.
    pub fn utc() -> Self {
        Self::Fixed(Utc.fix())
    }

    /// Returns the zone identifier: the IANA name or the `±HH:MM` offset.
    pub fn name(&self) -> String {
        match self {
            Self::Named(tz) => tz.name().to_string(),
            Self::Fixed(offset) => offset.to_string(),
        }
    }

    /// Maps a wall-clock value in this zone to an instant.
    ///
    /// Ambiguous values (DST fall-back) take the earlier instant. Values
    /// inside a DST gap are read with the offset in force before the gap,
    /// so `02:30` on a spring-forward night lands on the `03:30` instant.
    fn resolve(&self, local: NaiveDateTime) -> DateTime<Utc> {
        match self {
            Self::Fixed(offset) => {
                (local - Duration::seconds(i64::from(offset.local_minus_utc()))).and_utc()
            }
            Self::Named(tz) => match tz.from_local_datetime(&local) {
                LocalResult::Single(dt) => dt.with_timezone(&Utc),
                LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
                LocalResult::None => {
                    let before = tz
                        .offset_from_utc_datetime(&(local - Duration::days(1)))
                        .fix();
                    (local - Duration::seconds(i64::from(before.local_minus_utc()))).and_utc()
                }
            },
        }
    }

    /// Reads an instant on this zone's wall clock.
    fn wall_clock(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        match self {
            Self::Named(tz) => instant.with_timezone(tz).naive_local(),
            Self::Fixed(offset) => instant.with_timezone(offset).naive_local(),
        }
    }
}

impl From<Tz> for Zone {
    fn from(tz: Tz) -> Self {
        Self::Named(tz)
    }
}

impl From<FixedOffset> for Zone {
    fn from(offset: FixedOffset) -> Self {
        Self::Fixed(offset)
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(tz) => f.write_str(tz.name()),
            Self::Fixed(offset) => write!(f, "{}", offset),
        }
    }
}

/// A point in time together with the zone its wall clock is read in.
///
/// Equality and ordering compare the absolute instant, so the same moment
/// written in two zones compares equal. Arithmetic through [`shifted`]
/// works on the wall clock: adding a day keeps the time of day across a
/// DST change.
///
/// The wall clock a timestamp was built from is kept as written, even
/// when it falls in a DST gap and has no exact instant.
///
/// [`shifted`]: ZonedTimestamp::shifted
#[derive(Debug, Clone, Copy)]
pub struct ZonedTimestamp {
    instant: DateTime<Utc>,
    local: NaiveDateTime,
    zone: Zone,
}

impl ZonedTimestamp {
    /// Creates a timestamp from wall-clock fields in the given zone.
    pub fn from_local(local: NaiveDateTime, zone: impl Into<Zone>) -> Self {
        let zone = zone.into();
        Self {
            instant: zone.resolve(local),
            local,
            zone,
        }
    }

    /// Creates a timestamp from an absolute instant, read in the given zone.
    pub fn from_instant(instant: DateTime<Utc>, zone: impl Into<Zone>) -> Self {
        let zone = zone.into();
        Self {
            instant,
            local: zone.wall_clock(instant),
            zone,
        }
    }

    /// Returns the absolute instant.
    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }

    /// Returns the zone.
    pub fn zone(&self) -> Zone {
        self.zone
    }

    /// Returns the wall-clock date and time in this timestamp's zone.
    pub fn local(&self) -> NaiveDateTime {
        self.local
    }

    /// Returns the wall-clock calendar date.
    pub fn date(&self) -> NaiveDate {
        self.local().date()
    }

    /// Returns the wall-clock time of day.
    pub fn time(&self) -> NaiveTime {
        self.local().time()
    }

    /// Returns the same instant read in another zone.
    ///
    /// Reading in the timestamp's own zone is a no-op.
    pub fn with_zone(&self, zone: impl Into<Zone>) -> Self {
        let zone = zone.into();
        if zone == self.zone {
            return *self;
        }
        Self::from_instant(self.instant, zone)
    }

    /// Adds a duration to the wall clock and re-resolves it in the same zone.
    pub fn shifted(&self, duration: Duration) -> Self {
        Self::from_local(self.local() + duration, self.zone)
    }

    /// Replaces the year, keeping month, day and time of day.
    ///
    /// Returns `None` when the date does not exist in the target year
    /// (February 29 outside a leap year).
    pub fn with_year(&self, year: i32) -> Option<Self> {
        self.local()
            .with_year(year)
            .map(|local| Self::from_local(local, self.zone))
    }
}

impl PartialEq for ZonedTimestamp {
    fn eq(&self, other: &Self) -> bool {
        self.instant == other.instant
    }
}

impl Eq for ZonedTimestamp {}

impl Hash for ZonedTimestamp {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.instant.hash(state);
    }
}

impl PartialOrd for ZonedTimestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ZonedTimestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.instant.cmp(&other.instant)
    }
}

impl fmt::Display for ZonedTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.local().format("%Y-%m-%dT%H:%M:%S"), self.zone)
    }
}

/// A time window for querying calendar events.
///
/// Represents a half-open interval `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    pub start: DateTime<Utc>,
    /// End of the window (exclusive).
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a window, swapping the bounds if they arrive reversed.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// Creates a window starting at `now` and extending `duration` ahead.
    pub fn from_now(now: &ZonedTimestamp, duration: Duration) -> Self {
        Self::new(now.instant(), now.instant() + duration)
    }

    /// Creates a window covering one calendar day in the given zone.
    pub fn for_date(date: NaiveDate, zone: impl Into<Zone>) -> Self {
        let zone = zone.into();
        let start = ZonedTimestamp::from_local(date.and_time(NaiveTime::MIN), zone);
        let end = start.shifted(Duration::days(1));
        Self::new(start.instant(), end.instant())
    }

    /// Returns the duration of this window.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Checks if an instant falls within this window.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Europe::Warsaw;

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    mod zoned_timestamp {
        use super::*;

        #[test]
        fn resolves_named_zone_with_dst() {
            let summer = ZonedTimestamp::from_local(local(2025, 8, 14, 10, 0), Warsaw);
            assert_eq!(summer.instant(), utc(2025, 8, 14, 8, 0));

            let winter = ZonedTimestamp::from_local(local(2025, 1, 14, 10, 0), Warsaw);
            assert_eq!(winter.instant(), utc(2025, 1, 14, 9, 0));
        }

        #[test]
        fn equality_compares_instants() {
            let warsaw = ZonedTimestamp::from_local(local(2025, 8, 14, 10, 0), Warsaw);
            let as_utc = warsaw.with_zone(Zone::utc());
            assert_eq!(warsaw, as_utc);
            assert_eq!(as_utc.local(), local(2025, 8, 14, 8, 0));
        }

        #[test]
        fn shifted_keeps_wall_clock_across_dst() {
            // Europe/Warsaw springs forward on 2025-03-30.
            let before = ZonedTimestamp::from_local(local(2025, 3, 29, 10, 0), Warsaw);
            let after = before.shifted(Duration::days(1));
            assert_eq!(after.local(), local(2025, 3, 30, 10, 0));
            assert_eq!(after.instant() - before.instant(), Duration::hours(23));
        }

        #[test]
        fn gap_time_keeps_wall_clock() {
            // 02:30 does not exist in Warsaw on 2025-03-30.
            let gap = ZonedTimestamp::from_local(local(2025, 3, 30, 2, 30), Warsaw);
            assert_eq!(gap.local(), local(2025, 3, 30, 2, 30));
            assert_eq!(gap.instant(), utc(2025, 3, 30, 1, 30));
            assert_eq!(gap.with_zone(Zone::utc()).local(), local(2025, 3, 30, 1, 30));
        }

        #[test]
        fn ambiguous_time_takes_earliest() {
            // Europe/Warsaw falls back on 2025-10-26, 02:30 happens twice.
            let fold = ZonedTimestamp::from_local(local(2025, 10, 26, 2, 30), Warsaw);
            assert_eq!(fold.instant(), utc(2025, 10, 26, 0, 30));
        }

        #[test]
        fn with_year_rejects_missing_leap_day() {
            let leap = ZonedTimestamp::from_local(local(2024, 2, 29, 9, 0), Warsaw);
            assert!(leap.with_year(2025).is_none());
            assert_eq!(
                leap.with_year(2028).unwrap().local(),
                local(2028, 2, 29, 9, 0)
            );
        }

        #[test]
        fn fixed_offset_zone() {
            let offset = FixedOffset::east_opt(2 * 3600).unwrap();
            let ts = ZonedTimestamp::from_local(local(2025, 8, 14, 10, 0), offset);
            assert_eq!(ts.instant(), utc(2025, 8, 14, 8, 0));
            assert_eq!(ts.zone().name(), "+02:00");
        }

        #[test]
        fn display() {
            let ts = ZonedTimestamp::from_local(local(2025, 8, 14, 10, 0), Warsaw);
            assert_eq!(ts.to_string(), "2025-08-14T10:00:00 [Europe/Warsaw]");
        }
    }

    mod time_window {
        use super::*;

        #[test]
        fn reversed_bounds_are_swapped() {
            let window = TimeWindow::new(utc(2025, 2, 5, 17, 0), utc(2025, 2, 5, 9, 0));
            assert_eq!(window.start, utc(2025, 2, 5, 9, 0));
            assert_eq!(window.duration(), Duration::hours(8));
        }

        #[test]
        fn contains_is_half_open() {
            let window = TimeWindow::new(utc(2025, 2, 5, 9, 0), utc(2025, 2, 5, 17, 0));
            assert!(window.contains(utc(2025, 2, 5, 9, 0)));
            assert!(window.contains(utc(2025, 2, 5, 16, 59)));
            assert!(!window.contains(utc(2025, 2, 5, 17, 0)));
        }

        #[test]
        fn for_date_in_named_zone() {
            let date = NaiveDate::from_ymd_opt(2025, 8, 14).unwrap();
            let window = TimeWindow::for_date(date, Warsaw);
            assert_eq!(window.start, utc(2025, 8, 13, 22, 0));
            assert_eq!(window.end, utc(2025, 8, 14, 22, 0));
        }

        #[test]
        fn from_now() {
            let now = ZonedTimestamp::from_local(local(2025, 8, 14, 10, 0), Warsaw);
            let window = TimeWindow::from_now(&now, Duration::days(30));
            assert_eq!(window.start, now.instant());
            assert_eq!(window.duration(), Duration::days(30));
        }
    }
}
