//! Google Calendar access for calendar-cli.
//!
//! - [`session`]: the credential lifecycle (load, refresh, authorize, persist)
//! - [`authenticate`]: interactive and headless authorization strategies
//! - [`api`]: the Calendar REST calls behind the [`CalendarApi`] trait
//! - [`types`]: typed calendar and event records

pub mod api;
pub mod app_config;
pub mod authenticate;
pub mod error;
pub mod refresh;
pub mod session;
pub mod types;
mod wire;

pub use api::{CalendarApi, GoogleCalendar};
pub use authenticate::{AuthStrategy, HeadlessAuth, InteractiveAuth};
pub use error::{ApiError, AuthError};
pub use session::{Credential, CredentialConfig, CredentialManager};

pub use reqwest::StatusCode;
