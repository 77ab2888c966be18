pub mod calendars;
pub mod events;
pub mod new;

use std::io::Write;

use calendar_google::ApiError;
use thiserror::Error;

use crate::datetime::{DateParseError, FORMAT_HINT};

/// How a command can fail, as far as the user is concerned.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The calendar service answered with an error.
    #[error(transparent)]
    Remote(ApiError),
    #[error(transparent)]
    DateParse(#[from] DateParseError),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl From<ApiError> for CommandError {
    fn from(err: ApiError) -> Self {
        if err.is_remote() {
            CommandError::Remote(err)
        } else {
            CommandError::Unexpected(err.into())
        }
    }
}

impl From<std::io::Error> for CommandError {
    fn from(err: std::io::Error) -> Self {
        CommandError::Unexpected(err.into())
    }
}

/// Print the errors a user can act on; anything else is returned.
pub fn report<W: Write>(result: Result<(), CommandError>, out: &mut W) -> anyhow::Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(CommandError::Remote(err)) => {
            writeln!(out, "An error occurred: {err}")?;
            Ok(())
        }
        Err(CommandError::DateParse(err)) => {
            writeln!(out, "Error parsing date/time: {err}")?;
            writeln!(out, "{FORMAT_HINT}")?;
            Ok(())
        }
        Err(CommandError::Unexpected(err)) => Err(err),
    }
}
