//! Implements the `Authenticator` trait by asking Google's `tokeninfo` endpoint to verify an ID
//! token.

use crate::auth::{Authenticator, Identity};
use crate::error::Res;
use anyhow::{bail, Context};
use serde::Deserialize;
use tracing::{debug, trace};

const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";
const ISSUERS: &[&str] = &["accounts.google.com", "https://accounts.google.com"];
const DEFAULT_NAME: &str = "User";

pub(super) struct GoogleAuthenticator {
    client_id: String,
    http: reqwest::Client,
}

impl GoogleAuthenticator {
    pub(super) fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            http: reqwest::Client::new(),
        }
    }
}

/// The subset of the `tokeninfo` response that we check or use. Google returns every claim as a
/// string, including booleans.
#[derive(Debug, Clone, Default, Deserialize)]
struct TokenInfo {
    aud: String,
    iss: String,
    email: Option<String>,
    email_verified: Option<String>,
    name: Option<String>,
    picture: Option<String>,
    nonce: Option<String>,
}

#[async_trait::async_trait]
impl Authenticator for GoogleAuthenticator {
    async fn authenticate(&self, id_token: &str, nonce: Option<&str>) -> Res<Identity> {
        trace!("Verifying ID token with Google");
        let response = self
            .http
            .get(TOKENINFO_URL)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .context("Failed to reach Google to verify the ID token")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            bail!("Google rejected the ID token with status {status}: {body}");
        }

        let info: TokenInfo = response
            .json()
            .await
            .context("Failed to parse Google tokeninfo response")?;
        let identity = check_claims(info, &self.client_id, nonce)?;
        debug!("Verified ID token for {}", identity.email);
        Ok(identity)
    }
}

/// Checks audience, issuer, email and nonce, then builds the `Identity`. A missing name becomes
/// "User" and a missing picture becomes an empty string.
fn check_claims(info: TokenInfo, client_id: &str, nonce: Option<&str>) -> Res<Identity> {
    if info.aud != client_id {
        bail!("The ID token was issued to a different client '{}'", info.aud);
    }
    if !ISSUERS.contains(&info.iss.as_str()) {
        bail!("The ID token has an unexpected issuer '{}'", info.iss);
    }
    if let Some(expected) = nonce {
        if info.nonce.as_deref() != Some(expected) {
            bail!("The ID token nonce does not match this login attempt");
        }
    }
    let email = match info.email {
        Some(email) if !email.is_empty() => email,
        _ => bail!("The ID token has no email claim, was the 'email' scope requested?"),
    };
    if info.email_verified.as_deref() == Some("false") {
        bail!("The email address {email} has not been verified with Google");
    }
    Ok(Identity {
        email,
        name: info.name.unwrap_or_else(|| DEFAULT_NAME.to_string()),
        picture: info.picture.unwrap_or_default(),
    })
}
