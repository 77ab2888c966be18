//! Error types for the credential lifecycle and the Calendar API.

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised while obtaining, refreshing or persisting a credential.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error(
        "OAuth client file not found at {0}\n\n\
        Download it from https://console.cloud.google.com/apis/credentials\n\
        (OAuth client ID, type \"Desktop app\") and save it at that path."
    )]
    MissingClientSecret(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write credential to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize credential: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(
        "No usable credential at {0} and interactive sign-in is disabled.\n\
        Run once with auth = \"interactive\" to create it."
    )]
    InteractionRequired(PathBuf),

    #[error("Authorization was denied: {0}")]
    ConsentDenied(String),

    #[error("OAuth callback failed: {0}")]
    Callback(String),

    #[error("Failed to exchange authorization code: {0}")]
    Exchange(String),

    #[error("Failed to refresh token: {0}")]
    Refresh(String),
}

/// Errors raised by calls to the Calendar REST API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The service answered with a non-success status.
    #[error("<HttpError {status}: \"{message}\">")]
    Status { status: StatusCode, message: String },

    #[error("Request to Google Calendar failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid API URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Event {id} is malformed: {reason}")]
    InvalidEvent { id: String, reason: String },
}

impl ApiError {
    /// Whether this is the service itself signalling a failure.
    pub fn is_remote(&self) -> bool {
        matches!(self, ApiError::Status { .. })
    }
}

pub type AuthResult<T> = Result<T, AuthError>;
pub type ApiResult<T> = Result<T, ApiError>;
