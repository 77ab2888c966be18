//! OAuth client registration provided by the operator.
//!
//! This is the `credentials.json` file downloaded from the Google Cloud
//! console. It is only ever read.

use std::path::Path;

use serde::Deserialize;

use crate::error::{AuthError, AuthResult};

/// Google OAuth client credentials (operator-provided).
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
}

/// Google wraps the client under a key naming the application type.
#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum ClientSecretFile {
    Installed(ClientSecret),
    Web(ClientSecret),
}

impl ClientSecret {
    pub fn load(path: &Path) -> AuthResult<Self> {
        if !path.exists() {
            return Err(AuthError::MissingClientSecret(path.to_path_buf()));
        }

        let contents = std::fs::read_to_string(path).map_err(|source| AuthError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let file: ClientSecretFile =
            serde_json::from_str(&contents).map_err(|source| AuthError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(match file {
            ClientSecretFile::Installed(secret) | ClientSecretFile::Web(secret) => secret,
        })
    }
}
