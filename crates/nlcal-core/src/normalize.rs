//! Turning model drafts into calendar-ready events.

use chrono::Duration;
use tracing::{debug, warn};

use crate::error::NormalizeError;
use crate::event::{EventColor, NormalizedEvent, RawEventDraft};
use crate::project::project_forward;
use crate::time::ZonedTimestamp;
use crate::zone::LocalZone;

/// Length given to events without a usable end.
pub const DEFAULT_DURATION_MINUTES: i64 = 60;

/// Validates a [`RawEventDraft`], resolves its zone, moves a past start
/// into the future and fills in a missing end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventNormalizer {
    default_zone: LocalZone,
}

impl EventNormalizer {
    /// Creates a normalizer using `default_zone` for drafts without a
    /// usable timezone.
    pub fn new(default_zone: LocalZone) -> Self {
        Self { default_zone }
    }

    pub fn default_zone(&self) -> LocalZone {
        self.default_zone
    }

    /// Normalizes a draft relative to `now`.
    ///
    /// The event zone is the draft's timezone, or the default zone when the
    /// draft has none or names an unknown one. Offset-less dates are read
    /// in the event zone, and both ends are rendered on its wall clock, so
    /// `start_iso`/`end_iso` always agree with the returned `timezone`.
    /// Offset-qualified input keeps its instant: `10:00Z` with
    /// `America/New_York` renders as `06:00`.
    ///
    /// # Errors
    ///
    /// - [`NormalizeError::Validation`] listing every blank required field
    /// - [`NormalizeError::Parse`] when a date does not parse
    /// - [`NormalizeError::UnresolvableDate`] when the start has no future
    ///   occurrence
    pub fn normalize(
        &self,
        draft: &RawEventDraft,
        now: &ZonedTimestamp,
    ) -> Result<NormalizedEvent, NormalizeError> {
        let missing = draft.missing_fields();
        if !missing.is_empty() {
            return Err(NormalizeError::Validation { missing });
        }

        let zone = self.event_zone(&draft.timezone);

        let parsed_start = zone
            .parse(&draft.start_iso)
            .map_err(|source| NormalizeError::Parse {
                field: "start_iso",
                source,
            })?;
        let start =
            project_forward(parsed_start, now).ok_or_else(|| NormalizeError::UnresolvableDate {
                start: draft.start_iso.clone(),
            })?;
        if start != parsed_start {
            debug!(from = %parsed_start, to = %start, "moved past start into the future");
        }

        let default_end = start.shifted(Duration::minutes(DEFAULT_DURATION_MINUTES));
        let end = if draft.end_iso.trim().is_empty() {
            default_end
        } else {
            let end = zone
                .parse(&draft.end_iso)
                .map_err(|source| NormalizeError::Parse {
                    field: "end_iso",
                    source,
                })?;
            if end > start {
                end
            } else {
                debug!(end = %end, start = %start, "end not after start, using default duration");
                default_end
            }
        };

        Ok(NormalizedEvent {
            title: draft.title.trim().to_string(),
            start_iso: zone.format(&start),
            end_iso: zone.format(&end),
            timezone: zone.name().to_string(),
            description: non_empty(&draft.description),
            location: non_empty(&draft.location),
            color: parse_color(&draft.color),
        })
    }

    fn event_zone(&self, name: &str) -> LocalZone {
        if name.trim().is_empty() {
            return self.default_zone;
        }
        match LocalZone::from_name(name) {
            Ok(zone) => zone,
            Err(e) => {
                warn!(error = %e, fallback = %self.default_zone, "ignoring draft timezone");
                self.default_zone
            }
        }
    }
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_color(text: &str) -> Option<EventColor> {
    if text.trim().is_empty() {
        return None;
    }
    match text.parse() {
        Ok(color) => Some(color),
        Err(e) => {
            warn!(error = %e, "dropping event color");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn normalizer() -> EventNormalizer {
        EventNormalizer::new(LocalZone::from_name("Europe/Warsaw").unwrap())
    }

    fn now() -> ZonedTimestamp {
        normalizer().default_zone().at(
            NaiveDate::from_ymd_opt(2025, 8, 20)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
        )
    }

    mod validation {
        use super::*;

        #[test]
        fn empty_title_is_reported() {
            let draft = RawEventDraft::new("", "2025-08-21T10:00:00");
            let err = normalizer().normalize(&draft, &now()).unwrap_err();
            assert_eq!(
                err,
                NormalizeError::Validation {
                    missing: vec!["title"]
                }
            );
        }

        #[test]
        fn all_missing_fields_reported_together() {
            let draft = RawEventDraft::default();
            let err = normalizer().normalize(&draft, &now()).unwrap_err();
            assert_eq!(
                err,
                NormalizeError::Validation {
                    missing: vec!["title", "start_iso"]
                }
            );
        }

        #[test]
        fn unparseable_start() {
            let draft = RawEventDraft::new("Dentist", "next friday");
            match normalizer().normalize(&draft, &now()).unwrap_err() {
                NormalizeError::Parse { field, source } => {
                    assert_eq!(field, "start_iso");
                    assert_eq!(source.input, "next friday");
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }

        #[test]
        fn unparseable_end() {
            let draft = RawEventDraft::new("Dentist", "2025-08-21T10:00").with_end("later");
            let err = normalizer().normalize(&draft, &now()).unwrap_err();
            assert_eq!(err.kind(), "parse");
            assert!(err.to_string().starts_with("invalid end_iso"));
        }

        #[test]
        fn unresolvable_leap_day() {
            let draft = RawEventDraft::new("Leap party", "2020-02-29T09:00");
            let err = normalizer().normalize(&draft, &now()).unwrap_err();
            assert_eq!(
                err,
                NormalizeError::UnresolvableDate {
                    start: "2020-02-29T09:00".into()
                }
            );
        }
    }

    mod timing {
        use super::*;

        #[test]
        fn missing_end_gets_one_hour() {
            let draft = RawEventDraft::new("Dentist", "2025-08-21T10:00:00");
            let event = normalizer().normalize(&draft, &now()).unwrap();
            assert_eq!(event.start_iso, "2025-08-21T10:00:00");
            assert_eq!(event.end_iso, "2025-08-21T11:00:00");
            assert_eq!(event.timezone, "Europe/Warsaw");
        }

        #[test]
        fn explicit_end_is_kept() {
            let draft =
                RawEventDraft::new("Workshop", "2025-08-21T10:00").with_end("2025-08-21T13:30");
            let event = normalizer().normalize(&draft, &now()).unwrap();
            assert_eq!(event.end_iso, "2025-08-21T13:30:00");
        }

        #[test]
        fn end_before_start_falls_back_to_default() {
            let draft =
                RawEventDraft::new("Workshop", "2025-08-21T10:00").with_end("2025-08-21T09:00");
            let event = normalizer().normalize(&draft, &now()).unwrap();
            assert_eq!(event.end_iso, "2025-08-21T11:00:00");
        }

        #[test]
        fn end_equal_to_start_falls_back_to_default() {
            let draft =
                RawEventDraft::new("Workshop", "2025-08-21T10:00").with_end("2025-08-21T10:00");
            let event = normalizer().normalize(&draft, &now()).unwrap();
            assert_eq!(event.end_iso, "2025-08-21T11:00:00");
        }

        #[test]
        fn past_start_is_projected_with_default_end() {
            let draft = RawEventDraft::new("Birthday", "2024-05-10T12:00:00");
            let event = normalizer().normalize(&draft, &now()).unwrap();
            assert_eq!(event.start_iso, "2026-05-10T12:00:00");
            assert_eq!(event.end_iso, "2026-05-10T13:00:00");
        }

        #[test]
        fn earlier_today_moves_to_tomorrow() {
            let draft = RawEventDraft::new("Coffee", "2025-08-20T08:00:00");
            let event = normalizer().normalize(&draft, &now()).unwrap();
            assert_eq!(event.start_iso, "2025-08-21T08:00:00");
            assert_eq!(event.end_iso, "2025-08-21T09:00:00");
        }

        #[test]
        fn utc_input_is_rendered_on_local_clock() {
            let draft = RawEventDraft::new("Call", "2025-08-21T10:00:00Z");
            let event = normalizer().normalize(&draft, &now()).unwrap();
            assert_eq!(event.start_iso, "2025-08-21T12:00:00");
            assert_eq!(event.end_iso, "2025-08-21T13:00:00");
        }

        #[test]
        fn end_is_always_after_start() {
            let zone = normalizer().default_zone();
            for (start, end) in [
                ("2025-08-21T10:00", ""),
                ("2025-08-21T10:00", "2025-08-21T10:00"),
                ("2025-08-21T23:30", ""),
                ("2024-01-01", "2023-01-01"),
                ("2025-08-20T09:00", "2025-08-20T09:30"),
            ] {
                let draft = RawEventDraft::new("x", start).with_end(end);
                let event = normalizer().normalize(&draft, &now()).unwrap();
                let start = zone.parse(&event.start_iso).unwrap();
                let end = zone.parse(&event.end_iso).unwrap();
                assert!(end > start, "{:?}", event);
                assert!(start >= now(), "{:?}", event);
            }
        }
    }

    mod zones {
        use super::*;

        #[test]
        fn draft_timezone_is_used() {
            let draft = RawEventDraft::new("Call", "2025-08-21T10:00").with_timezone("Asia/Tokyo");
            let event = normalizer().normalize(&draft, &now()).unwrap();
            assert_eq!(event.timezone, "Asia/Tokyo");
            assert_eq!(event.start_iso, "2025-08-21T10:00:00");
        }

        #[test]
        fn offset_input_is_rendered_in_draft_timezone() {
            let draft = RawEventDraft::new("Call", "2025-08-21T10:00:00Z")
                .with_timezone("America/New_York");
            let event = normalizer().normalize(&draft, &now()).unwrap();
            assert_eq!(event.timezone, "America/New_York");
            assert_eq!(event.start_iso, "2025-08-21T06:00:00");
            assert_eq!(event.end_iso, "2025-08-21T07:00:00");

            let new_york = LocalZone::from_name("America/New_York").unwrap();
            let start = new_york.parse(&event.start_iso).unwrap();
            assert_eq!(start, LocalZone::default().parse("2025-08-21T10:00:00").unwrap());
        }

        #[test]
        fn same_day_is_judged_in_draft_timezone() {
            // 10:00 Warsaw is 04:00 in New York, still 2025-08-20 there.
            let draft =
                RawEventDraft::new("Call", "2025-08-20T03:00").with_timezone("America/New_York");
            let event = normalizer().normalize(&draft, &now()).unwrap();
            assert_eq!(event.start_iso, "2025-08-21T03:00:00");
        }

        #[test]
        fn unknown_timezone_falls_back_to_default() {
            let draft =
                RawEventDraft::new("Call", "2025-08-21T10:00").with_timezone("Mars/Olympus");
            let event = normalizer().normalize(&draft, &now()).unwrap();
            assert_eq!(event.timezone, "Europe/Warsaw");
        }
    }

    mod extras {
        use super::*;

        #[test]
        fn optional_fields_are_trimmed_and_colors_parsed() {
            let mut draft = RawEventDraft::new("  Gym  ", "2025-08-21T18:00").with_color("Green");
            draft.location = " Downtown ".into();
            let event = normalizer().normalize(&draft, &now()).unwrap();
            assert_eq!(event.title, "Gym");
            assert_eq!(event.location.as_deref(), Some("Downtown"));
            assert_eq!(event.description, None);
            assert_eq!(event.color, Some(EventColor::Green));
        }

        #[test]
        fn unknown_color_is_dropped() {
            let draft = RawEventDraft::new("Gym", "2025-08-21T18:00").with_color("magenta");
            let event = normalizer().normalize(&draft, &now()).unwrap();
            assert_eq!(event.color, None);
        }
    }
}
