//! The identity collaborator: turns a Google ID token into an `Identity`.
//!
//! `Authenticator` is the seam. `GoogleAuthenticator` verifies tokens with Google; when
//! `FINTRACK_IN_TEST_MODE` is set, `TestAuthenticator` is used instead so that the whole program
//! can run without the network.

mod files;
mod google;
mod oauth;
mod test_auth;

pub(crate) use files::{ClientSecretFile, SessionFile};
pub(crate) use oauth::login_flow;

use crate::error::Res;
use crate::Config;
use serde::{Deserialize, Serialize};

const TEST_MODE_ENV: &str = "FINTRACK_IN_TEST_MODE";

/// The logged-in user, as reported by the identity provider.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub email: String,
    pub name: String,
    pub picture: String,
}

/// Verifies an ID token and reports who it belongs to.
#[async_trait::async_trait]
pub trait Authenticator: Send + Sync {
    /// Returns the identity in `id_token`, or an error if the token is invalid, expired, or was
    /// issued to a different client. When `nonce` is given, the token must carry the same nonce.
    async fn authenticate(&self, id_token: &str, nonce: Option<&str>) -> Res<Identity>;
}

/// Whether we talk to Google or to the built-in test identity provider.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum Mode {
    #[default]
    Google,
    Testing,
}

impl Mode {
    /// `Mode::Testing` when `FINTRACK_IN_TEST_MODE` is set and non-empty, otherwise
    /// `Mode::Google`.
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Testing,
            _ => Mode::Google,
        }
    }
}

/// Creates the `Authenticator` for `mode`. Google mode needs the OAuth client id from the client
/// secret file, because a token is only accepted if it was issued to this client.
pub(crate) async fn authenticator(config: &Config, mode: Mode) -> Res<Box<dyn Authenticator>> {
    Ok(match mode {
        Mode::Google => {
            let secret = ClientSecretFile::load(config.client_secret_path()).await?;
            Box::new(google::GoogleAuthenticator::new(secret.client_id()))
        }
        Mode::Testing => Box::new(test_auth::TestAuthenticator),
    })
}
