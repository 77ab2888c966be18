use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use calendar_google::CredentialConfig;
use serde::Deserialize;
use tracing::debug;

/// How to get a credential when the stored one can't be used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Open a browser and wait for consent on a loopback port
    #[default]
    Interactive,
    /// Fail instead of prompting
    Headless,
}

/// Optional settings file; every key falls back to the defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Where the credential is persisted (default: ./token.json)
    pub token_path: Option<PathBuf>,

    /// OAuth client file from the Google Cloud console (default: ./credentials.json)
    pub client_secret_path: Option<PathBuf>,

    /// OAuth scopes to request (default: full calendar access)
    pub scopes: Option<Vec<String>>,

    #[serde(default)]
    pub auth: AuthMode,

    /// Launch a browser for interactive consent (default: true)
    pub open_browser: Option<bool>,
}

impl Settings {
    /// Default location (~/.config/calendar-cli/config.toml)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("calendar-cli").join("config.toml"))
    }

    /// Load from `--config` if given, else from the default location if a
    /// file exists there, else use defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::load_from(&path),
                None => {
                    debug!("no settings file, using defaults");
                    Ok(Settings::default())
                }
            },
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;

        let settings: Settings = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

        debug!(path = %path.display(), ?settings, "loaded settings");

        Ok(settings)
    }

    /// When false, interactive consent only prints the URL.
    pub fn opens_browser(&self) -> bool {
        self.open_browser.unwrap_or(true)
    }

    pub fn credential_config(&self) -> CredentialConfig {
        let defaults = CredentialConfig::default();

        CredentialConfig {
            token_path: self.token_path.clone().unwrap_or(defaults.token_path),
            client_secret_path: self
                .client_secret_path
                .clone()
                .unwrap_or(defaults.client_secret_path),
            scopes: self.scopes.clone().unwrap_or(defaults.scopes),
        }
    }
}
