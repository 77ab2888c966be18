//! Obtains a valid Google credential, reusing, refreshing or re-authorizing
//! as needed, and keeps the on-disk token file in sync.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app_config::ClientSecret;
use crate::authenticate::AuthStrategy;
use crate::error::{AuthError, AuthResult};
use crate::refresh::{GoogleRefresher, TokenRefresher};

pub const TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Read/write access to every calendar the user owns.
pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";

/// Seconds before `expiry` at which a token already counts as expired.
const EXPIRY_MARGIN_SECS: i64 = 225;

/// Bearer token plus what is needed to refresh it.
///
/// Serialized in Google's "authorized user" JSON shape so token files
/// written by other Google client libraries can be reused as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
    /// Keys we don't interpret (e.g. `universe_domain`), kept on rewrite.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Token endpoint answer, from either a code exchange or a refresh.
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Seconds until the access token expires; zero or less means unknown.
    pub expires_in: i64,
}

impl From<google_calendar::AccessToken> for TokenGrant {
    fn from(token: google_calendar::AccessToken) -> Self {
        TokenGrant {
            access_token: token.access_token,
            refresh_token: Some(token.refresh_token).filter(|t| !t.is_empty()),
            expires_in: token.expires_in,
        }
    }
}

impl TokenGrant {
    fn expiry_from(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        (self.expires_in > 0).then(|| now + Duration::seconds(self.expires_in))
    }
}

impl Credential {
    /// Build a fresh credential from a completed authorization.
    pub fn issued(
        grant: TokenGrant,
        client: &ClientSecret,
        scopes: &[String],
        now: DateTime<Utc>,
    ) -> Self {
        Credential {
            expiry: grant.expiry_from(now),
            token: grant.access_token,
            refresh_token: grant.refresh_token,
            token_uri: Some(TOKEN_URI.to_string()),
            client_id: Some(client.client_id.clone()),
            client_secret: Some(client.client_secret.clone()),
            scopes: scopes.to_vec(),
            extra: BTreeMap::new(),
        }
    }

    /// Apply a refresh result. Google usually omits the refresh token on
    /// refresh, in which case the current one is kept.
    pub fn refreshed(&self, grant: TokenGrant, now: DateTime<Utc>) -> Self {
        Credential {
            expiry: grant.expiry_from(now),
            token: grant.access_token,
            refresh_token: grant.refresh_token.or_else(|| self.refresh_token.clone()),
            ..self.clone()
        }
    }

    /// A credential without an expiry never expires.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry.is_some_and(|expiry| now + Duration::seconds(EXPIRY_MARGIN_SECS) >= expiry)
    }

    /// Whether the recorded scopes include every requested scope. A file
    /// that records no scopes is trusted.
    pub fn covers(&self, scopes: &[String]) -> bool {
        self.scopes.is_empty() || scopes.iter().all(|s| self.scopes.contains(s))
    }

    /// OAuth client stored alongside the token, if complete.
    fn client(&self) -> Option<ClientSecret> {
        Some(ClientSecret {
            client_id: self.client_id.clone()?,
            client_secret: self.client_secret.clone()?,
        })
    }
}

/// The token file on disk.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CredentialStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when no token file exists yet.
    pub fn load(&self) -> AuthResult<Option<Credential>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&self.path).map_err(|source| AuthError::Read {
            path: self.path.clone(),
            source,
        })?;

        let credential = serde_json::from_str(&contents).map_err(|source| AuthError::Parse {
            path: self.path.clone(),
            source,
        })?;

        Ok(Some(credential))
    }

    /// Replace the whole file: write a sibling temp file, then rename it
    /// over the old one.
    pub fn save(&self, credential: &Credential) -> AuthResult<()> {
        let contents = serde_json::to_string_pretty(credential)?;
        let write_err = |source| AuthError::Write {
            path: self.path.clone(),
            source,
        };

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        std::fs::create_dir_all(dir).map_err(write_err)?;

        let mut file = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
        file.write_all(contents.as_bytes()).map_err(write_err)?;
        file.as_file().sync_all().map_err(write_err)?;

        // Owner-only, the file holds OAuth tokens
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.as_file()
                .set_permissions(std::fs::Permissions::from_mode(0o600))
                .map_err(write_err)?;
        }

        file.persist(&self.path).map_err(|e| write_err(e.error))?;
        debug!(path = %self.path.display(), "credential saved");

        Ok(())
    }
}

/// Where the credential lives and what it must grant.
#[derive(Debug, Clone)]
pub struct CredentialConfig {
    pub token_path: PathBuf,
    pub client_secret_path: PathBuf,
    pub scopes: Vec<String>,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        CredentialConfig {
            token_path: PathBuf::from("token.json"),
            client_secret_path: PathBuf::from("credentials.json"),
            scopes: vec![CALENDAR_SCOPE.to_string()],
        }
    }
}

pub struct CredentialManager {
    store: CredentialStore,
    client_secret_path: PathBuf,
    scopes: Vec<String>,
    strategy: Box<dyn AuthStrategy>,
    refresher: Box<dyn TokenRefresher>,
}

impl CredentialManager {
    pub fn new(config: CredentialConfig, strategy: Box<dyn AuthStrategy>) -> Self {
        CredentialManager {
            store: CredentialStore::new(config.token_path),
            client_secret_path: config.client_secret_path,
            scopes: config.scopes,
            strategy,
            refresher: Box::new(GoogleRefresher),
        }
    }

    pub fn with_refresher(mut self, refresher: Box<dyn TokenRefresher>) -> Self {
        self.refresher = refresher;
        self
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Return a credential that is valid right now.
    ///
    /// A stored, unexpired credential is returned untouched. An expired one
    /// is refreshed when it carries a refresh token. Anything else goes
    /// through the authorization strategy. The token file is rewritten only
    /// after a refresh or a new authorization.
    pub async fn obtain_credential(&self) -> AuthResult<Credential> {
        let now = Utc::now();

        if let Some(credential) = self.store.load()? {
            if !credential.covers(&self.scopes) {
                info!(
                    path = %self.store.path().display(),
                    "stored credential lacks requested scopes, re-authorizing"
                );
            } else if !credential.is_expired_at(now) {
                debug!("stored credential is still valid");
                return Ok(credential);
            } else if credential.refresh_token.is_some() {
                info!("access token expired, refreshing");
                let client = match credential.client() {
                    Some(client) => client,
                    None => ClientSecret::load(&self.client_secret_path)?,
                };
                let grant = self.refresher.refresh(&credential, &client).await?;
                let refreshed = credential.refreshed(grant, Utc::now());
                self.store.save(&refreshed)?;
                return Ok(refreshed);
            } else {
                info!("access token expired and no refresh token, re-authorizing");
            }
        }

        let client = ClientSecret::load(&self.client_secret_path)?;
        let grant = self.strategy.authorize(&client, &self.scopes).await?;
        let credential = Credential::issued(grant, &client, &self.scopes, Utc::now());
        self.store.save(&credential)?;

        Ok(credential)
    }
}
