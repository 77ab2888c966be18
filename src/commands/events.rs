use std::io::Write;

use anyhow::anyhow;
use calendar_google::CalendarApi;
use calendar_google::types::{EventQuery, EventWindow};
use clap::Args;

use super::CommandError;
use crate::datetime::{now_utc, parse_iso_datetime};
use crate::render::{Render, border};

#[derive(Args, Debug, Clone)]
pub struct EventsArgs {
    /// Maximum number of events to list
    #[arg(short, long, default_value_t = 10)]
    pub number: u32,

    /// Number of days to look ahead
    #[arg(short = 't', long = "timeout", default_value_t = 7, allow_negative_numbers = true)]
    pub days: i64,

    /// Start date (ISO format, defaults to now)
    #[arg(short, long)]
    pub date: Option<String>,
}

pub async fn run<W: Write>(
    api: &dyn CalendarApi,
    calendar_id: &str,
    args: &EventsArgs,
    verbose: bool,
    out: &mut W,
) -> Result<(), CommandError> {
    let start = match &args.date {
        Some(date) => parse_iso_datetime(date)?,
        None => now_utc(),
    };
    let window = EventWindow::new(start, args.days).ok_or_else(|| {
        anyhow!(
            "Time range of {} days from {} is out of range",
            args.days,
            start.to_rfc3339()
        )
    })?;

    if verbose {
        writeln!(
            out,
            "Fetching {} events from calendar '{}'",
            args.number, calendar_id
        )?;
        writeln!(
            out,
            "Time range: {} to {}",
            window.start().to_rfc3339(),
            window.end().to_rfc3339()
        )?;
    }

    let query = EventQuery {
        window,
        max_results: args.number,
    };
    let events = api.list_events(calendar_id, &query).await?;

    if events.is_empty() {
        writeln!(out, "No upcoming events found.")?;
        return Ok(());
    }

    for event in &events {
        writeln!(out, "{}", border())?;
        writeln!(out, "{}", event.render())?;
    }
    writeln!(out, "{}", border())?;
    writeln!(out, "\nTotal events: {}", events.len())?;

    Ok(())
}
