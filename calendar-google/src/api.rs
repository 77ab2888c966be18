//! Google Calendar v3 REST calls.

use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::{ApiError, ApiResult};
use crate::session::Credential;
use crate::types::{CalendarRef, CreatedEvent, EventQuery, EventRecord, NewEvent};
use crate::wire::{self, EventBody, GoogleCalendarEntry, GoogleEvent, ListResponse};

const API_BASE: &str = "https://www.googleapis.com/calendar/v3/";

/// The remote calendar operations the CLI needs.
#[async_trait]
pub trait CalendarApi: Send + Sync {
    /// Every calendar on the user's list, in service order, in one call.
    async fn list_calendars(&self) -> ApiResult<Vec<CalendarRef>>;

    async fn list_events(&self, calendar_id: &str, query: &EventQuery)
    -> ApiResult<Vec<EventRecord>>;

    async fn insert_event(&self, calendar_id: &str, event: &NewEvent) -> ApiResult<CreatedEvent>;
}

pub struct GoogleCalendar {
    http: reqwest::Client,
    base: Url,
    access_token: String,
}

impl GoogleCalendar {
    pub fn new(credential: &Credential) -> ApiResult<Self> {
        Ok(GoogleCalendar {
            http: reqwest::Client::builder().build()?,
            base: Url::parse(API_BASE)?,
            access_token: credential.token.clone(),
        })
    }

    /// Point requests somewhere other than googleapis.com.
    pub fn with_base_url(mut self, base: Url) -> Self {
        self.base = base;
        self
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = request.bearer_auth(&self.access_token).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = wire::error_message(&body)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
            debug!(%status, %message, "Google Calendar request failed");
            return Err(ApiError::Status { status, message });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl CalendarApi for GoogleCalendar {
    async fn list_calendars(&self) -> ApiResult<Vec<CalendarRef>> {
        let url = self.url(&["users", "me", "calendarList"]);
        debug!(%url, "GET calendar list");

        let list: ListResponse<GoogleCalendarEntry> = self.send(self.http.get(url)).await?;

        Ok(list.items.into_iter().map(CalendarRef::from).collect())
    }

    async fn list_events(
        &self,
        calendar_id: &str,
        query: &EventQuery,
    ) -> ApiResult<Vec<EventRecord>> {
        let url = self.url(&["calendars", calendar_id, "events"]);
        debug!(%url, "GET events");

        let params = [
            ("timeMin", query.window.start().to_rfc3339()),
            ("timeMax", query.window.end().to_rfc3339()),
            ("maxResults", query.max_results.to_string()),
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
        ];

        let list: ListResponse<GoogleEvent> =
            self.send(self.http.get(url).query(&params)).await?;

        list.items.into_iter().map(EventRecord::try_from).collect()
    }

    async fn insert_event(&self, calendar_id: &str, event: &NewEvent) -> ApiResult<CreatedEvent> {
        let url = self.url(&["calendars", calendar_id, "events"]);
        debug!(%url, "POST event");

        let body = EventBody::from(event);
        let created: GoogleEvent = self.send(self.http.post(url).json(&body)).await?;

        Ok(created.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventWindow;
    use chrono::DateTime;
    use reqwest::StatusCode;
    use std::collections::BTreeMap;
    use std::net::Ipv4Addr;
    use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// One request as the server saw it.
    struct Recorded {
        request_line: String,
        headers: Vec<String>,
        body: String,
    }

    impl Recorded {
        fn header(&self, name: &str) -> Option<&str> {
            self.headers.iter().find_map(|line| {
                let (key, value) = line.split_once(':')?;
                key.eq_ignore_ascii_case(name).then(|| value.trim())
            })
        }
    }

    /// Answer a single request on a loopback port with `status` and `reply`.
    async fn serve_once(status: &'static str, reply: &'static str) -> (Url, JoinHandle<Recorded>) {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut reader = BufReader::new(stream);

            let mut request_line = String::new();
            reader.read_line(&mut request_line).await.unwrap();

            let mut headers = Vec::new();
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).await.unwrap();
                if line.trim().is_empty() {
                    break;
                }
                headers.push(line.trim().to_string());
            }

            let mut recorded = Recorded {
                request_line: request_line.trim().to_string(),
                headers,
                body: String::new(),
            };
            let length = recorded
                .header("content-length")
                .map(|v| v.parse::<usize>().unwrap())
                .unwrap_or(0);
            let mut body = vec![0; length];
            reader.read_exact(&mut body).await.unwrap();
            recorded.body = String::from_utf8(body).unwrap();

            let mut stream = reader.into_inner();
            let response = format!(
                "HTTP/1.1 {status}\r\n\
                Content-Type: application/json\r\n\
                Content-Length: {}\r\n\
                Connection: close\r\n\
                \r\n\
                {reply}",
                reply.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();

            recorded
        });

        let base = Url::parse(&format!("http://127.0.0.1:{port}/calendar/v3/")).unwrap();
        (base, server)
    }

    fn local(base: Url) -> GoogleCalendar {
        GoogleCalendar {
            http: reqwest::Client::builder().no_proxy().build().unwrap(),
            base,
            access_token: "ya29.test".into(),
        }
    }

    #[tokio::test]
    async fn list_events_sends_window_and_expansion_params() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"items":[{"id":"e1","summary":"Standup",
                "start":{"dateTime":"2024-01-16T09:00:00+02:00"},
                "end":{"dateTime":"2024-01-16T10:00:00+02:00"}}]}"#,
        )
        .await;

        let start = DateTime::parse_from_rfc3339("2024-01-15T08:00:00+02:00").unwrap();
        let query = EventQuery {
            window: EventWindow::new(start, 3).unwrap(),
            max_results: 5,
        };
        let events = local(base).list_events("primary", &query).await.unwrap();
        let request = server.await.unwrap();

        let mut parts = request.request_line.split_whitespace();
        assert_eq!(parts.next(), Some("GET"));
        let target = parts.next().unwrap();
        let (path, params) = target.split_once('?').unwrap();
        assert_eq!(path, "/calendar/v3/calendars/primary/events");

        let params: Vec<&str> = params.split('&').collect();
        assert!(params.contains(&"timeMin=2024-01-15T08%3A00%3A00%2B02%3A00"));
        assert!(params.contains(&"timeMax=2024-01-18T08%3A00%3A00%2B02%3A00"));
        assert!(params.contains(&"maxResults=5"));
        assert!(params.contains(&"singleEvents=true"));
        assert!(params.contains(&"orderBy=startTime"));
        assert_eq!(request.header("authorization"), Some("Bearer ya29.test"));

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].summary, "Standup");
        assert_eq!(events[0].span.start_date().to_string(), "2024-01-16");
    }

    #[tokio::test]
    async fn error_envelope_becomes_status_error() {
        let (base, server) = serve_once(
            "404 Not Found",
            r#"{"error":{"code":404,"message":"Not Found","errors":[]}}"#,
        )
        .await;

        let err = local(base).list_calendars().await.unwrap_err();
        let request = server.await.unwrap();

        assert!(request.request_line.starts_with("GET /calendar/v3/users/me/calendarList "));
        assert!(err.is_remote());
        match err {
            ApiError::Status { status, message } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(message, "Not Found");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn insert_posts_only_the_given_fields() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"id":"evt1","summary":"Standup",
                "htmlLink":"https://www.google.com/calendar/event?eid=evt1",
                "start":{"dateTime":"2024-01-15T09:00:00Z"},
                "end":{"dateTime":"2024-01-15T09:30:00Z"}}"#,
        )
        .await;

        let event = NewEvent::new(
            "Standup",
            DateTime::parse_from_rfc3339("2024-01-15T09:00:00+00:00").unwrap(),
            DateTime::parse_from_rfc3339("2024-01-15T09:30:00+00:00").unwrap(),
        );
        let created = local(base).insert_event("primary", &event).await.unwrap();
        let request = server.await.unwrap();

        assert_eq!(
            request.request_line,
            "POST /calendar/v3/calendars/primary/events HTTP/1.1"
        );
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.header("authorization"), Some("Bearer ya29.test"));

        let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
        let mut keys: Vec<&String> = body.as_object().unwrap().keys().collect();
        keys.sort();
        assert_eq!(keys, ["end", "start", "summary"]);
        assert_eq!(
            body["start"],
            serde_json::json!({"dateTime": "2024-01-15T09:00:00+00:00", "timeZone": "UTC"})
        );

        assert_eq!(created.id, "evt1");
        assert_eq!(created.html_link, "https://www.google.com/calendar/event?eid=evt1");
    }

    fn client() -> GoogleCalendar {
        let credential = Credential {
            token: "t".into(),
            refresh_token: None,
            token_uri: None,
            client_id: None,
            client_secret: None,
            scopes: vec![],
            expiry: None,
            extra: BTreeMap::new(),
        };
        GoogleCalendar::new(&credential).unwrap()
    }

    #[test]
    fn calendar_ids_are_path_encoded() {
        let url = client().url(&["calendars", "team#holiday@group.v.calendar.google.com", "events"]);
        assert_eq!(
            url.as_str(),
            "https://www.googleapis.com/calendar/v3/calendars/team%23holiday@group.v.calendar.google.com/events"
        );
    }

    #[test]
    fn calendar_list_url() {
        assert_eq!(
            client().url(&["users", "me", "calendarList"]).as_str(),
            "https://www.googleapis.com/calendar/v3/users/me/calendarList"
        );
    }

    #[test]
    fn base_url_can_be_overridden() {
        let api = client().with_base_url(Url::parse("http://127.0.0.1:9000/v3/").unwrap());
        assert_eq!(
            api.url(&["calendars", "primary", "events"]).as_str(),
            "http://127.0.0.1:9000/v3/calendars/primary/events"
        );
    }
}
