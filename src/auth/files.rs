//! Serialization structures for the files under `$FINTRACK_HOME/.secrets`:
//! - `client_secret.json`: OAuth 2.0 client credentials downloaded from Google Cloud Console
//! - `session.json`: the identity of the logged-in user

use crate::auth::Identity;
use crate::error::Res;
use crate::utils;
use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// The credentials inside `client_secret.json`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub(crate) struct ClientCredentials {
    pub(crate) client_id: String,
    pub(crate) client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub(crate) auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub(crate) token_uri: String,
    #[serde(default)]
    pub(crate) redirect_uris: Vec<String>,
}

fn default_auth_uri() -> String {
    GOOGLE_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

/// Google wraps the credentials in either an `installed` or a `web` object depending on the
/// application type chosen in the console. Both are accepted.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ClientSecretFile {
    Installed(ClientCredentials),
    Web(ClientCredentials),
}

impl ClientSecretFile {
    pub(crate) async fn load(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        utils::deserialize(path).await.with_context(|| {
            format!(
                "Unable to load the OAuth client secret from {}. Run 'fintrack init' with the \
                client secret JSON downloaded from Google Cloud Console.",
                path.display()
            )
        })
    }

    pub(crate) fn credentials(&self) -> &ClientCredentials {
        match self {
            ClientSecretFile::Installed(c) | ClientSecretFile::Web(c) => c,
        }
    }

    pub(crate) fn client_id(&self) -> &str {
        &self.credentials().client_id
    }
}

/// The contents of `session.json`. Its existence is what "logged in" means.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub(crate) struct SessionFile {
    pub(crate) identity: Identity,
    pub(crate) logged_in_at: DateTime<Utc>,
}

impl SessionFile {
    pub(crate) fn new(identity: Identity) -> Self {
        Self {
            identity,
            logged_in_at: Utc::now(),
        }
    }

    /// Loads the session, failing with a hint to run `fintrack login` if there is none.
    pub(crate) async fn load(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            bail!("You are not logged in. Run 'fintrack login' first.");
        }
        utils::deserialize(path).await
    }

    /// Writes the session with owner-only permissions.
    pub(crate) async fn save(&self, path: impl Into<PathBuf>) -> Res<()> {
        let path = path.into();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize session")?;
        utils::write(&path, json).await?;

        #[cfg(unix)]
        {
            use std::fs::Permissions;
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, Permissions::from_mode(0o600))
                .context("Failed to set file permissions")?;
        }

        Ok(())
    }

    /// Removes the session file. Returns `false` if there was nothing to remove.
    pub(crate) async fn delete(path: impl AsRef<Path>) -> Res<bool> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(false);
        }
        utils::remove_file(path).await?;
        Ok(true)
    }
}
