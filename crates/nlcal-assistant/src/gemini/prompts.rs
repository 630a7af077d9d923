//! System instructions for each model call.

use nlcal_core::{ConversationHistory, EventColor, LocalZone, ZonedTimestamp};

use super::tools::{CREATE_EVENT, FIND_EVENT};

const CLASSIFIER: &str = "\
You act as a command classifier for a calendar assistant.
The user writes in Polish or English.
Answer with exactly ONE of these labels as a JSON string: add_event, list_events, remove_event, clarification_needed.
When the user wants to work on another calendar, answer with {\"command\":\"switch_calendar\",\"calendar\":\"<calendar name>\"} instead.
Give no explanation. If the request is unclear, answer clarification_needed.
Examples:
Dodaj spotkanie na jutro o 15 -> \"add_event\"
Pokaż mi nadchodzące wydarzenia -> \"list_events\"
Usuń wydarzenie jutro o 12 -> \"remove_event\"
Przełącz na kalendarz Praca -> {\"command\":\"switch_calendar\",\"calendar\":\"Praca\"}
Coś o wydarzeniu, ale nie wiem jak -> \"clarification_needed\"";

pub fn classifier_instructions(history: &ConversationHistory) -> String {
    let mut text = CLASSIFIER.to_string();
    if !history.is_empty() {
        text.push_str("\nEarlier messages from the user, oldest first:");
        for turn in history.iter() {
            text.push_str("\n- ");
            text.push_str(turn);
        }
    }
    text
}

fn clock(now: ZonedTimestamp, zone: LocalZone) -> String {
    let local = now.with_zone(zone.tz()).local();
    format!(
        "Today is {} ({}) and the local time is {} in {}.",
        local.format("%Y-%m-%d"),
        local.format("%A"),
        local.format("%H:%M"),
        zone.name()
    )
}

pub fn event_instructions(now: ZonedTimestamp, zone: LocalZone) -> String {
    let colors: Vec<&str> = EventColor::ALL.iter().map(EventColor::name).collect();
    format!(
        "{clock}
Turn the user's request into a call to {function}.
If the request names only a day (for example \"jutro\" or \"za dwa dni\"), start at 10:00.
Unless the user gives an end or a duration, end one hour after the start.
When the date is ambiguous, prefer the nearest future date.
Write start_iso and end_iso as local times and set timezone to {zone} unless the user names another timezone.
Set color only when the user asks for one. Allowed colors: {colors}.
Keep the title in the user's language.",
        clock = clock(now, zone),
        function = CREATE_EVENT,
        zone = zone.name(),
        colors = colors.join(", "),
    )
}

pub fn locate_instructions(now: ZonedTimestamp, zone: LocalZone) -> String {
    format!(
        "{clock}
The user wants to remove an event. Call {function} with the day of the event as YYYY-MM-DD in {zone} and the words that identify its title.
Count relative days such as \"jutro\" from today. When the date is ambiguous, prefer the nearest future date.
Leave title empty if the user does not name the event.",
        clock = clock(now, zone),
        function = FIND_EVENT,
        zone = zone.name(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use insta::assert_snapshot;

    fn warsaw() -> LocalZone {
        LocalZone::from_name("Europe/Warsaw").unwrap()
    }

    fn now() -> ZonedTimestamp {
        let zone = warsaw();
        zone.at(
            NaiveDate::from_ymd_opt(2025, 8, 14)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
        )
    }

    #[test]
    fn event_prompt() {
        assert_snapshot!(event_instructions(now(), warsaw()), @r#"
        Today is 2025-08-14 (Thursday) and the local time is 09:30 in Europe/Warsaw.
        Turn the user's request into a call to create_event.
        If the request names only a day (for example "jutro" or "za dwa dni"), start at 10:00.
        Unless the user gives an end or a duration, end one hour after the start.
        When the date is ambiguous, prefer the nearest future date.
        Write start_iso and end_iso as local times and set timezone to Europe/Warsaw unless the user names another timezone.
        Set color only when the user asks for one. Allowed colors: light blue, green, purple, pink, yellow, orange, turquoise, gray, blue, light green, red.
        Keep the title in the user's language.
        "#);
    }

    #[test]
    fn clock_uses_the_given_zone() {
        let utc = LocalZone::default();
        assert!(locate_instructions(now(), utc).starts_with(
            "Today is 2025-08-14 (Thursday) and the local time is 07:30 in UTC."
        ));
    }

    #[test]
    fn classifier_lists_history() {
        let mut history = ConversationHistory::new(3);
        assert!(!classifier_instructions(&history).contains("Earlier messages"));

        history.push("dodaj spotkanie");
        history.push("jutro o 10");
        let text = classifier_instructions(&history);
        assert!(text.ends_with(
            "Earlier messages from the user, oldest first:\n- dodaj spotkanie\n- jutro o 10"
        ));
    }
}
