//! Moving past dates into the future.
//!
//! A model asked for "Friday at 10" or "May 10th" sometimes answers with a
//! date that already passed. [`project_forward`] turns such a date into its
//! next occurrence instead of letting it land in the past.

use chrono::{Datelike, Duration};

use crate::time::ZonedTimestamp;

/// Returns the earliest occurrence of `start` that is not before `now`.
///
/// Rules, first match wins:
///
/// 1. `start >= now`: `start` unchanged.
/// 2. Same calendar day as `now` but an earlier time: the same time
///    tomorrow.
/// 3. Otherwise the same month, day and time in `now`'s year, or in the
///    following year when that is still past or does not exist.
///
/// Calendar fields are compared on `start`'s wall clock, with `now` read
/// in the same zone, and the result keeps `start`'s zone.
///
/// Returns `None` when rule 3 finds no valid date in either year, which
/// only happens for February 29. No nearby date is substituted.
pub fn project_forward(start: ZonedTimestamp, now: &ZonedTimestamp) -> Option<ZonedTimestamp> {
    if start >= *now {
        return Some(start);
    }

    let now_here = now.with_zone(start.zone());
    if start.date() == now_here.date() {
        return Some(start.shifted(Duration::days(1)));
    }

    let year = now_here.date().year();
    match start.with_year(year) {
        Some(candidate) if candidate >= *now => Some(candidate),
        _ => start.with_year(year + 1),
    }
}
