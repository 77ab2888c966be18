//! Google Calendar JSON payloads and their conversion to and from the
//! types in [`crate::types`].

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::ApiError;
use crate::types::{CalendarRef, CreatedEvent, EventRecord, EventSpan, NewEvent, UNTITLED};

#[derive(Debug, Deserialize)]
pub(crate) struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GoogleCalendarEntry {
    #[serde(default)]
    id: String,
    #[serde(default)]
    summary: String,
}

impl From<GoogleCalendarEntry> for CalendarRef {
    fn from(entry: GoogleCalendarEntry) -> Self {
        CalendarRef {
            id: entry.id,
            name: entry.summary,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GoogleEvent {
    #[serde(default)]
    id: String,
    summary: Option<String>,
    location: Option<String>,
    description: Option<String>,
    start: Option<GoogleEventTime>,
    end: Option<GoogleEventTime>,
    html_link: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleEventTime {
    date: Option<NaiveDate>,
    date_time: Option<DateTime<FixedOffset>>,
}

enum Moment {
    Date(NaiveDate),
    Timestamp(DateTime<FixedOffset>),
}

impl GoogleEventTime {
    fn moment(&self) -> Option<Moment> {
        match (self.date_time, self.date) {
            (Some(dt), _) => Some(Moment::Timestamp(dt)),
            (None, Some(d)) => Some(Moment::Date(d)),
            (None, None) => None,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl TryFrom<GoogleEvent> for EventRecord {
    type Error = ApiError;

    fn try_from(event: GoogleEvent) -> Result<Self, Self::Error> {
        let invalid = |reason: &str| ApiError::InvalidEvent {
            id: event.id.clone(),
            reason: reason.to_string(),
        };

        let start = event.start.as_ref().and_then(GoogleEventTime::moment);
        let end = event.end.as_ref().and_then(GoogleEventTime::moment);

        let span = match (start, end) {
            (Some(Moment::Date(start)), Some(Moment::Date(end))) => EventSpan::AllDay { start, end },
            (Some(Moment::Timestamp(start)), Some(Moment::Timestamp(end))) => {
                EventSpan::Timed { start, end }
            }
            (None, _) => return Err(invalid("no start time")),
            (_, None) => return Err(invalid("no end time")),
            _ => return Err(invalid("start and end mix a date with a timestamp")),
        };

        Ok(EventRecord {
            summary: non_empty(event.summary).unwrap_or_else(|| UNTITLED.to_string()),
            location: non_empty(event.location),
            description: non_empty(event.description),
            id: event.id,
            span,
        })
    }
}

impl From<GoogleEvent> for CreatedEvent {
    fn from(event: GoogleEvent) -> Self {
        CreatedEvent {
            id: event.id,
            summary: non_empty(event.summary).unwrap_or_else(|| UNTITLED.to_string()),
            html_link: event.html_link.unwrap_or_default(),
        }
    }
}

/// Request body for `events.insert`. Optional keys are left out entirely
/// rather than sent empty.
#[derive(Debug, Serialize)]
pub(crate) struct EventBody<'a> {
    summary: &'a str,
    start: EventTimeBody,
    end: EventTimeBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventTimeBody {
    #[serde(serialize_with = "rfc3339")]
    date_time: DateTime<FixedOffset>,
    time_zone: &'static str,
}

impl From<DateTime<FixedOffset>> for EventTimeBody {
    fn from(date_time: DateTime<FixedOffset>) -> Self {
        EventTimeBody {
            date_time,
            time_zone: "UTC",
        }
    }
}

fn rfc3339<S: Serializer>(dt: &DateTime<FixedOffset>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&dt.to_rfc3339())
}

impl<'a> From<&'a NewEvent> for EventBody<'a> {
    fn from(event: &'a NewEvent) -> Self {
        EventBody {
            summary: &event.summary,
            start: event.start.into(),
            end: event.end.into(),
            location: event.location.as_deref().filter(|l| !l.is_empty()),
            description: event.description.as_deref().filter(|d| !d.is_empty()),
        }
    }
}

/// Google's error envelope: `{"error": {"code": 404, "message": "Not Found"}}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

pub(crate) fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error.message)
        .filter(|m| !m.is_empty())
}
