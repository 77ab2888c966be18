//! Plain-text rendering of calendar records.

use calendar_google::types::{CalendarRef, CreatedEvent, EventRecord, EventSpan};

const BORDER_WIDTH: usize = 80;

/// Line drawn between entries.
pub fn border() -> String {
    "_".repeat(BORDER_WIDTH)
}

pub trait Render {
    fn render(&self) -> String;
}

impl Render for CalendarRef {
    fn render(&self) -> String {
        format!("👨{}\n🗓️{}", self.name, self.id)
    }
}

impl Render for EventRecord {
    fn render(&self) -> String {
        let when = match &self.span {
            EventSpan::AllDay { .. } => "⏰All Day Event".to_string(),
            // Each timestamp is shown in the zone it came with
            EventSpan::Timed { start, end } => {
                format!("⏰Time: {}-{}", start.format("%H:%M"), end.format("%H:%M"))
            }
        };

        format!(
            "📅Date: {}\n{}\n📝Summary: {}",
            self.span.start_date(),
            when,
            self.summary
        )
    }
}

impl Render for CreatedEvent {
    fn render(&self) -> String {
        format!(
            "✅ Event created successfully!\n📝 Summary: {}\n🆔 Event ID: {}\n🔗 Link: {}",
            self.summary, self.id, self.html_link
        )
    }
}
