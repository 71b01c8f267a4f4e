use super::models::{CalendarEvent, EventDateTime, EventTime, Meeting, UNTITLED_MEETING};
use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use tracing::warn;

const DATETIME_DISPLAY: &str = "%d %b %Y %I:%M %p";
const DATE_DISPLAY: &str = "%d %b %Y";

/// Convert an API start/end value into an [`EventTime`] in `timezone`.
///
/// `dateTime` wins over `date` when both are present. Unparseable or empty
/// values yield `None`.
pub fn parse_event_time(value: &EventDateTime, timezone: &Tz) -> Option<EventTime> {
    if let Some(date_time) = &value.date_time {
        return match DateTime::parse_from_rfc3339(date_time) {
            Ok(dt) => Some(EventTime::DateTime(dt.with_timezone(timezone))),
            Err(e) => {
                warn!("Failed to parse event dateTime '{}': {}", date_time, e);
                None
            }
        };
    }

    if let Some(date) = &value.date {
        return match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
            Ok(date) => Some(EventTime::Date(date)),
            Err(e) => {
                warn!("Failed to parse event date '{}': {}", date, e);
                None
            }
        };
    }

    None
}

/// Normalize a raw API event into a [`Meeting`]
pub fn normalize_event(event: CalendarEvent, timezone: &Tz) -> Meeting {
    let start = event
        .start
        .as_ref()
        .and_then(|start| parse_event_time(start, timezone));
    let end = event
        .end
        .as_ref()
        .and_then(|end| parse_event_time(end, timezone));

    let meeting_link = event.hangout_link.clone().or_else(|| {
        event.conference_data.as_ref().and_then(|data| {
            data.entry_points
                .iter()
                .find(|entry| entry.entry_point_type.as_deref() == Some("video"))
                .and_then(|entry| entry.uri.clone())
        })
    });

    Meeting {
        id: event.id.unwrap_or_default(),
        summary: event
            .summary
            .unwrap_or_else(|| UNTITLED_MEETING.to_string()),
        start,
        end,
        description: event.description.unwrap_or_default(),
        attendees: event
            .attendees
            .into_iter()
            .filter_map(|attendee| attendee.email)
            .collect(),
        meeting_link,
    }
}

impl EventTime {
    /// Human readable form, e.g. `05 Mar 2025 02:30 PM` or `05 Mar 2025`
    pub fn display(&self) -> String {
        match self {
            EventTime::DateTime(dt) => dt.format(DATETIME_DISPLAY).to_string(),
            EventTime::Date(date) => date.format(DATE_DISPLAY).to_string(),
        }
    }
}

/// Display an optional start/end, mirroring the list view's "Invalid date"
pub fn display_time(value: Option<&EventTime>) -> String {
    value
        .map(EventTime::display)
        .unwrap_or_else(|| "Invalid date".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::google_calendar::models::{
        Attendee, ConferenceData, EntryPoint,
    };
    use chrono::Timelike;

    fn timed(value: &str) -> EventDateTime {
        EventDateTime {
            date_time: Some(value.to_string()),
            ..Default::default()
        }
    }

    fn all_day(value: &str) -> EventDateTime {
        EventDateTime {
            date: Some(value.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_datetime_is_converted_to_timezone() {
        let tz: Tz = chrono_tz::Asia::Kolkata;
        let parsed = parse_event_time(&timed("2025-03-05T09:00:00Z"), &tz).unwrap();

        match parsed {
            EventTime::DateTime(dt) => {
                assert_eq!(dt.timezone(), tz);
                assert_eq!(dt.hour(), 14);
                assert_eq!(dt.minute(), 30);
            }
            other => panic!("expected datetime, got {:?}", other),
        }
    }

    #[test]
    fn test_all_day_has_no_time_component() {
        let tz: Tz = chrono_tz::UTC;
        let parsed = parse_event_time(&all_day("2025-03-05"), &tz).unwrap();

        assert_eq!(
            parsed,
            EventTime::Date(NaiveDate::from_ymd_opt(2025, 3, 5).unwrap())
        );
        assert!(parsed.is_all_day());
    }

    #[test]
    fn test_missing_or_bad_values_are_none() {
        let tz: Tz = chrono_tz::UTC;
        assert!(parse_event_time(&EventDateTime::default(), &tz).is_none());
        assert!(parse_event_time(&timed("tomorrow-ish"), &tz).is_none());
        assert!(parse_event_time(&all_day("05.03.2025"), &tz).is_none());
    }

    #[test]
    fn test_normalize_defaults() {
        let meeting = normalize_event(
            CalendarEvent {
                start: Some(all_day("2025-03-05")),
                end: Some(all_day("2025-03-06")),
                ..Default::default()
            },
            &chrono_tz::UTC,
        );

        assert_eq!(meeting.id, "");
        assert_eq!(meeting.summary, UNTITLED_MEETING);
        assert_eq!(meeting.description, "");
        assert!(meeting.attendees.is_empty());
        assert!(meeting.meeting_link.is_none());
    }

    #[test]
    fn test_normalize_attendees_and_link() {
        let meeting = normalize_event(
            CalendarEvent {
                id: Some("abc".to_string()),
                summary: Some("Planning".to_string()),
                attendees: vec![
                    Attendee {
                        email: Some("a@example.com".to_string()),
                    },
                    Attendee { email: None },
                    Attendee {
                        email: Some("b@example.com".to_string()),
                    },
                ],
                conference_data: Some(ConferenceData {
                    entry_points: vec![
                        EntryPoint {
                            entry_point_type: Some("phone".to_string()),
                            uri: Some("tel:+1-555".to_string()),
                        },
                        EntryPoint {
                            entry_point_type: Some("video".to_string()),
                            uri: Some("https://meet.google.com/abc-defg-hij".to_string()),
                        },
                    ],
                }),
                ..Default::default()
            },
            &chrono_tz::UTC,
        );

        assert_eq!(meeting.attendees, vec!["a@example.com", "b@example.com"]);
        assert_eq!(
            meeting.meeting_link.as_deref(),
            Some("https://meet.google.com/abc-defg-hij")
        );
    }

    #[test]
    fn test_hangout_link_wins() {
        let meeting = normalize_event(
            CalendarEvent {
                hangout_link: Some("https://meet.google.com/xyz".to_string()),
                conference_data: Some(ConferenceData {
                    entry_points: vec![EntryPoint {
                        entry_point_type: Some("video".to_string()),
                        uri: Some("https://meet.google.com/other".to_string()),
                    }],
                }),
                ..Default::default()
            },
            &chrono_tz::UTC,
        );
        assert_eq!(
            meeting.meeting_link.as_deref(),
            Some("https://meet.google.com/xyz")
        );
    }

    #[test]
    fn test_display() {
        let tz: Tz = chrono_tz::Asia::Kolkata;
        let at = parse_event_time(&timed("2025-03-05T09:00:00Z"), &tz);
        let day = parse_event_time(&all_day("2025-03-05"), &tz);

        assert_eq!(display_time(at.as_ref()), "05 Mar 2025 02:30 PM");
        assert_eq!(display_time(day.as_ref()), "05 Mar 2025");
        assert_eq!(display_time(None), "Invalid date");
    }
}
