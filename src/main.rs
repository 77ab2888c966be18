mod commands;
mod config;
mod datetime;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use calendar_google::{
    AuthStrategy, CredentialManager, GoogleCalendar, HeadlessAuth, InteractiveAuth,
};
use clap::{Arg, ArgAction, CommandFactory, FromArgMatches, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::commands::events::EventsArgs;
use crate::commands::new::NewEventArgs;
use crate::config::{AuthMode, Settings};

#[derive(Parser)]
#[command(name = "calendar-cli", version, disable_version_flag = true)]
#[command(about = "Google Calendar CLI Tool")]
struct Cli {
    /// Calendar ID to use
    #[arg(short, long, global = true, default_value = "primary")]
    calendar: String,

    /// Enable verbose output
    #[arg(long, global = true)]
    verbose: bool,

    /// Path to a settings file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all calendar IDs linked to this user
    Calendars,
    /// List upcoming events
    Events(EventsArgs),
    /// Create a new event
    New(NewEventArgs),
}

fn cli_command() -> clap::Command {
    Cli::command().arg(
        Arg::new("version")
            .short('v')
            .long("version")
            .action(ArgAction::Version)
            .help("Print version"),
    )
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let mut command = cli_command();
    let matches = command.clone().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    init_tracing(cli.verbose);

    let Some(subcommand) = cli.command else {
        command.print_help()?;
        return Ok(());
    };

    let settings = Settings::load(cli.config.as_deref())?;
    let credential = credential_manager(&settings).obtain_credential().await?;
    let api = GoogleCalendar::new(&credential)?;

    let mut out = std::io::stdout().lock();
    let result = match subcommand {
        Commands::Calendars => commands::calendars::run(&api, cli.verbose, &mut out).await,
        Commands::Events(args) => {
            commands::events::run(&api, &cli.calendar, &args, cli.verbose, &mut out).await
        }
        Commands::New(args) => {
            commands::new::run(&api, &cli.calendar, &args, cli.verbose, &mut out).await
        }
    };

    commands::report(result, &mut out)
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("warn,calendar_cli={level},calendar_google={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn credential_manager(settings: &Settings) -> CredentialManager {
    let config = settings.credential_config();
    let strategy: Box<dyn AuthStrategy> = match settings.auth {
        AuthMode::Interactive if settings.opens_browser() => Box::new(InteractiveAuth::default()),
        AuthMode::Interactive => Box::new(InteractiveAuth::without_browser()),
        AuthMode::Headless => Box::new(HeadlessAuth::new(config.token_path.clone())),
    };
    debug!(token = %config.token_path.display(), auth = ?settings.auth, "credential settings");

    CredentialManager::new(config, strategy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let matches = cli_command().try_get_matches_from(args).unwrap();
        Cli::from_arg_matches(&matches).unwrap()
    }

    #[test]
    fn command_definition_is_consistent() {
        cli_command().debug_assert();
    }

    #[test]
    fn globals_default_when_absent() {
        let cli = parse(&["calendar-cli", "calendars"]);
        assert_eq!(cli.calendar, "primary");
        assert!(!cli.verbose);
        assert!(cli.config.is_none());
        assert!(matches!(cli.command, Some(Commands::Calendars)));
    }

    #[test]
    fn globals_may_follow_the_subcommand() {
        let cli = parse(&["calendar-cli", "events", "-c", "team", "--verbose", "-n", "3"]);
        assert_eq!(cli.calendar, "team");
        assert!(cli.verbose);
        match cli.command {
            Some(Commands::Events(args)) => {
                assert_eq!(args.number, 3);
                assert_eq!(args.days, 7);
                assert!(args.date.is_none());
            }
            _ => panic!("expected events"),
        }
    }

    #[test]
    fn new_requires_a_summary() {
        assert!(cli_command().try_get_matches_from(["calendar-cli", "new"]).is_err());

        let cli = parse(&[
            "calendar-cli", "new", "-S", "Standup", "-s", "2024-01-15T09:00:00", "-l", "Room 4",
        ]);
        match cli.command {
            Some(Commands::New(args)) => {
                assert_eq!(args.summary, "Standup");
                assert_eq!(args.start.as_deref(), Some("2024-01-15T09:00:00"));
                assert_eq!(args.location.as_deref(), Some("Room 4"));
                assert!(args.end.is_none());
            }
            _ => panic!("expected new"),
        }
    }

    #[test]
    fn short_v_prints_version() {
        let err = cli_command()
            .try_get_matches_from(["calendar-cli", "-v"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
        assert_eq!(err.to_string().trim(), "calendar-cli 1.0.0");
    }

    #[test]
    fn no_subcommand_is_allowed() {
        let cli = parse(&["calendar-cli"]);
        assert!(cli.command.is_none());
    }
}
