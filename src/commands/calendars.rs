use std::io::Write;

use calendar_google::CalendarApi;

use super::CommandError;
use crate::render::{Render, border};

pub async fn run<W: Write>(
    api: &dyn CalendarApi,
    verbose: bool,
    out: &mut W,
) -> Result<(), CommandError> {
    let calendars = api.list_calendars().await?;

    if verbose {
        writeln!(out, "Found {} calendar(s)\n", calendars.len())?;
    }

    for calendar in &calendars {
        writeln!(out, "{}", border())?;
        writeln!(out, "{}", calendar.render())?;
    }
    writeln!(out, "{}", border())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fake::FakeApi;
    use crate::commands::report;
    use calendar_google::StatusCode;
    use calendar_google::types::CalendarRef;

    fn api() -> FakeApi {
        FakeApi {
            calendars: vec![
                CalendarRef {
                    id: "me@example.com".into(),
                    name: "Me".into(),
                },
                CalendarRef {
                    id: "team@group.calendar.google.com".into(),
                    name: "Team".into(),
                },
            ],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn lists_calendars_in_service_order() {
        let mut out = Vec::new();
        run(&api(), false, &mut out).await.unwrap();

        let b = border();
        let expected = format!(
            "{b}\n👨Me\n🗓️me@example.com\n{b}\n👨Team\n🗓️team@group.calendar.google.com\n{b}\n"
        );
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[tokio::test]
    async fn verbose_prefixes_a_count() {
        let mut out = Vec::new();
        run(&api(), true, &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with(&format!("Found 2 calendar(s)\n\n{}", border())));
    }

    #[tokio::test]
    async fn remote_failure_is_reported() {
        let mut out = Vec::new();
        let result = run(&FakeApi::failing(StatusCode::FORBIDDEN), false, &mut out).await;
        report(result, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("An error occurred: <HttpError 403 Forbidden"));
        assert!(!text.contains(&border()));
    }
}
