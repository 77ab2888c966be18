//! Ways of obtaining a brand new credential.

use std::net::Ipv4Addr;
use std::path::PathBuf;

use async_trait::async_trait;
use google_calendar::Client;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info};

use crate::app_config::ClientSecret;
use crate::error::{AuthError, AuthResult};
use crate::session::TokenGrant;

/// Obtains user consent for `scopes` and returns the resulting tokens.
#[async_trait]
pub trait AuthStrategy: Send + Sync {
    async fn authorize(&self, client: &ClientSecret, scopes: &[String]) -> AuthResult<TokenGrant>;
}

/// Browser consent with a loopback redirect.
pub struct InteractiveAuth {
    open_browser: bool,
}

impl Default for InteractiveAuth {
    fn default() -> Self {
        InteractiveAuth { open_browser: true }
    }
}

impl InteractiveAuth {
    /// Only print the consent URL.
    pub fn without_browser() -> Self {
        InteractiveAuth {
            open_browser: false,
        }
    }
}

#[async_trait]
impl AuthStrategy for InteractiveAuth {
    async fn authorize(&self, client: &ClientSecret, scopes: &[String]) -> AuthResult<TokenGrant> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .map_err(|e| AuthError::Callback(format!("failed to bind local listener: {e}")))?;
        let port = listener
            .local_addr()
            .map_err(|e| AuthError::Callback(e.to_string()))?
            .port();
        info!(port, "waiting for OAuth callback");

        let mut google = Client::new(
            client.client_id.clone(),
            client.client_secret.clone(),
            redirect_uri(port),
            String::new(),
            String::new(),
        );

        let auth_url = google.user_consent_url(scopes);

        eprintln!("\nOpen this URL in your browser to authenticate:\n");
        eprintln!("{}\n", auth_url);

        if self.open_browser && open::that(&auth_url).is_err() {
            eprintln!("(Could not open browser automatically, please copy the URL above)");
        }

        let callback = wait_for_callback(&listener).await?;

        eprintln!("\nReceived authorization code, exchanging for tokens...");

        let token = google
            .get_access_token(&callback.code, &callback.state)
            .await
            .map_err(|e| AuthError::Exchange(e.to_string()))?;

        eprintln!("Authentication successful!");

        Ok(token.into())
    }
}

/// For unattended runs: never prompts, fails instead.
pub struct HeadlessAuth {
    token_path: PathBuf,
}

impl HeadlessAuth {
    pub fn new(token_path: impl Into<PathBuf>) -> Self {
        HeadlessAuth {
            token_path: token_path.into(),
        }
    }
}

#[async_trait]
impl AuthStrategy for HeadlessAuth {
    async fn authorize(&self, _: &ClientSecret, _: &[String]) -> AuthResult<TokenGrant> {
        Err(AuthError::InteractionRequired(self.token_path.clone()))
    }
}

fn redirect_uri(port: u16) -> String {
    format!("http://localhost:{}/", port)
}

#[derive(Debug, PartialEq)]
struct Callback {
    code: String,
    state: String,
}

/// What one request to the loopback listener carried.
#[derive(Debug, PartialEq)]
enum CallbackRequest {
    Granted(Callback),
    Denied(String),
    /// Anything else the browser asks for, e.g. `/favicon.ico`.
    Unrelated,
}

/// Parse a request line such as `GET /?code=xxx&state=yyy HTTP/1.1`.
fn parse_request_line(request_line: &str) -> AuthResult<CallbackRequest> {
    let target = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| AuthError::Callback("invalid HTTP request".into()))?;

    let url = url::Url::parse(&format!("http://localhost{}", target))
        .map_err(|e| AuthError::Callback(e.to_string()))?;
    let param = |name: &str| {
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.to_string())
    };

    if let Some(error) = param("error") {
        return Ok(CallbackRequest::Denied(error));
    }

    Ok(match param("code") {
        Some(code) => CallbackRequest::Granted(Callback {
            code,
            state: param("state").unwrap_or_default(),
        }),
        None => CallbackRequest::Unrelated,
    })
}

async fn wait_for_callback(listener: &TcpListener) -> AuthResult<Callback> {
    loop {
        let (stream, _) = listener
            .accept()
            .await
            .map_err(|e| AuthError::Callback(format!("failed to accept connection: {e}")))?;

        let mut reader = BufReader::new(stream);
        let mut request_line = String::new();
        reader
            .read_line(&mut request_line)
            .await
            .map_err(|e| AuthError::Callback(format!("failed to read request: {e}")))?;

        // Drain headers so closing the socket doesn't reset the browser
        let mut header = String::new();
        loop {
            header.clear();
            let read = reader
                .read_line(&mut header)
                .await
                .map_err(|e| AuthError::Callback(format!("failed to read request: {e}")))?;
            if read == 0 || header.trim().is_empty() {
                break;
            }
        }
        let mut stream = reader.into_inner();

        match parse_request_line(&request_line)? {
            CallbackRequest::Granted(callback) => {
                respond(
                    &mut stream,
                    "200 OK",
                    "<h1>Authentication successful!</h1>\
                     <p>You can close this window and return to the terminal.</p>",
                )
                .await?;
                return Ok(callback);
            }
            CallbackRequest::Denied(error) => {
                respond(
                    &mut stream,
                    "200 OK",
                    "<h1>Authentication failed.</h1><p>You can close this window.</p>",
                )
                .await?;
                return Err(AuthError::ConsentDenied(error));
            }
            CallbackRequest::Unrelated => {
                debug!(request = request_line.trim(), "ignoring request on callback port");
                respond(&mut stream, "404 Not Found", "").await?;
            }
        }
    }
}

async fn respond(stream: &mut TcpStream, status: &str, body: &str) -> AuthResult<()> {
    let response = format!(
        "HTTP/1.1 {status}\r\n\
        Content-Type: text/html\r\n\
        Connection: close\r\n\
        \r\n\
        <html><body>{body}</body></html>"
    );

    stream
        .write_all(response.as_bytes())
        .await
        .map_err(|e| AuthError::Callback(format!("failed to answer browser: {e}")))?;
    stream
        .flush()
        .await
        .map_err(|e| AuthError::Callback(e.to_string()))
}
