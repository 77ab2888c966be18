//! Exchange a refresh token for a new access token.

use async_trait::async_trait;
use google_calendar::Client;
use tracing::debug;

use crate::app_config::ClientSecret;
use crate::error::{AuthError, AuthResult};
use crate::session::{Credential, TokenGrant};

#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, credential: &Credential, client: &ClientSecret)
    -> AuthResult<TokenGrant>;
}

/// Refreshes against Google's token endpoint.
pub struct GoogleRefresher;

#[async_trait]
impl TokenRefresher for GoogleRefresher {
    async fn refresh(
        &self,
        credential: &Credential,
        client: &ClientSecret,
    ) -> AuthResult<TokenGrant> {
        let google = Client::new(
            client.client_id.clone(),
            client.client_secret.clone(),
            String::new(),
            credential.token.clone(),
            credential.refresh_token.clone().unwrap_or_default(),
        );

        let token = google
            .refresh_access_token()
            .await
            .map_err(|e| AuthError::Refresh(e.to_string()))?;
        debug!(expires_in = token.expires_in, "token refreshed");

        Ok(token.into())
    }
}
