use std::io::Write;

use calendar_google::CalendarApi;
use calendar_google::types::NewEvent;
use chrono::Duration;
use clap::Args;

use super::CommandError;
use crate::datetime::{now_utc, parse_iso_datetime};
use crate::render::{Render, border};

#[derive(Args, Debug, Clone)]
pub struct NewEventArgs {
    /// Event title
    #[arg(short = 'S', long)]
    pub summary: String,

    /// Start date/time (ISO format, defaults to now)
    #[arg(short, long)]
    pub start: Option<String>,

    /// End date/time (ISO format, defaults to one hour after start)
    #[arg(short, long)]
    pub end: Option<String>,

    /// Event location
    #[arg(short, long)]
    pub location: Option<String>,

    /// Event description
    #[arg(short, long)]
    pub description: Option<String>,
}

pub async fn run<W: Write>(
    api: &dyn CalendarApi,
    calendar_id: &str,
    args: &NewEventArgs,
    verbose: bool,
    out: &mut W,
) -> Result<(), CommandError> {
    let start = match &args.start {
        Some(start) => parse_iso_datetime(start)?,
        None => now_utc(),
    };
    let end = match &args.end {
        Some(end) => parse_iso_datetime(end)?,
        None => start + Duration::hours(1),
    };

    let event = NewEvent::new(args.summary.as_str(), start, end)
        .with_location(args.location.clone())
        .with_description(args.description.clone());

    if verbose {
        writeln!(out, "Creating event in calendar '{calendar_id}'")?;
        writeln!(out, "Summary: {}", event.summary)?;
        writeln!(out, "Start: {}", event.start.to_rfc3339())?;
        writeln!(out, "End: {}", event.end.to_rfc3339())?;
        if let Some(location) = &event.location {
            writeln!(out, "Location: {location}")?;
        }
        if let Some(description) = &event.description {
            writeln!(out, "Description: {description}")?;
        }
    }

    let created = api.insert_event(calendar_id, &event).await?;

    writeln!(out, "{}", border())?;
    writeln!(out, "{}", created.render())?;
    writeln!(out, "{}", border())?;

    Ok(())
}
