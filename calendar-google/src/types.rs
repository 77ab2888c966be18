//! Calendar records as the rest of the tool sees them.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate};

/// Shown for events that have no summary.
pub const UNTITLED: &str = "(No title)";

/// A calendar from the user's calendar list.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarRef {
    pub id: String,
    pub name: String,
}

/// When an event happens. Start and end always use the same representation.
#[derive(Debug, Clone, PartialEq)]
pub enum EventSpan {
    AllDay {
        start: NaiveDate,
        end: NaiveDate,
    },
    /// Timestamps keep the offset the service reported them in.
    Timed {
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    },
}

impl EventSpan {
    pub fn is_all_day(&self) -> bool {
        matches!(self, EventSpan::AllDay { .. })
    }

    /// Calendar date the event starts on, in its own zone.
    pub fn start_date(&self) -> NaiveDate {
        match self {
            EventSpan::AllDay { start, .. } => *start,
            EventSpan::Timed { start, .. } => start.date_naive(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub id: String,
    pub summary: String,
    pub span: EventSpan,
    pub location: Option<String>,
    pub description: Option<String>,
}

/// `[start, start + days)`, the range an event listing is bounded by.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventWindow {
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
}

impl EventWindow {
    /// `None` when `start + days` is not a representable instant.
    pub fn new(start: DateTime<FixedOffset>, days: i64) -> Option<Self> {
        let end = Duration::try_days(days).and_then(|span| start.checked_add_signed(span))?;
        Some(EventWindow { start, end })
    }

    pub fn start(&self) -> DateTime<FixedOffset> {
        self.start
    }

    pub fn end(&self) -> DateTime<FixedOffset> {
        self.end
    }
}

/// An event listing request: recurring series are expanded into single
/// occurrences and results come back ordered by start time.
#[derive(Debug, Clone, PartialEq)]
pub struct EventQuery {
    pub window: EventWindow,
    pub max_results: u32,
}

/// A timed event to create.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub summary: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub location: Option<String>,
    pub description: Option<String>,
}

impl NewEvent {
    pub fn new(
        summary: impl Into<String>,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Self {
        NewEvent {
            summary: summary.into(),
            start,
            end,
            location: None,
            description: None,
        }
    }

    /// Empty strings count as absent.
    pub fn with_location(mut self, location: Option<String>) -> Self {
        self.location = location.filter(|l| !l.is_empty());
        self
    }

    /// Empty strings count as absent.
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.is_empty());
        self
    }
}

/// What the service answers after creating an event.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedEvent {
    pub id: String,
    pub summary: String,
    pub html_link: String,
}
