//! Authentication command handlers.
//!
//! This module implements the CLI commands for:
//! - `fintrack login` - Google sign-in in the browser, or verification of a supplied ID token
//! - `fintrack logout` - Forget the signed-in user
//! - `fintrack whoami` - Show the signed-in user

use crate::auth::{self, ClientSecretFile, Identity, Mode, SessionFile};
use crate::commands::Out;
use crate::error::{Error, ErrorType, IntoResult};
use crate::session::Session;
use crate::{Config, Result};

/// Handles the `fintrack login` command.
///
/// With `id_token`, the token is verified directly. Without one, the browser sign-in is run and
/// the returned token is verified against the nonce we generated. Either way the session file is
/// written and the user's ledger is loaded to confirm the store is reachable.
///
/// In `Mode::Testing` there is no browser flow, so `id_token` is required.
pub async fn login(config: &Config, mode: Mode, id_token: Option<&str>) -> Result<Out<Identity>> {
    let session = match (id_token, mode) {
        (Some(token), _) => Session::login(config, mode, token, None).await?,
        (None, Mode::Testing) => {
            return Err(Error::msg(
                ErrorType::Auth,
                "In test mode the browser sign-in is unavailable, pass --id-token",
            ))
        }
        (None, Mode::Google) => {
            let secret = ClientSecretFile::load(config.client_secret_path())
                .await
                .pub_result(ErrorType::Config)?;
            let tokens = auth::login_flow(&secret, config.oauth_callback_port())
                .await
                .pub_result(ErrorType::Auth)?;
            Session::login(config, mode, &tokens.id_token, Some(&tokens.nonce)).await?
        }
    };

    let identity = session.identity().clone();
    let message = format!(
        "Logged in as {} <{}>, {} transactions on record",
        identity.name,
        identity.email,
        session.ledger().len()
    );
    Ok(Out::new(message, identity))
}

/// Handles the `fintrack logout` command.
pub async fn logout(config: &Config) -> Result<Out<()>> {
    Ok(if Session::logout(config).await? {
        "Logged out".into()
    } else {
        "Nobody was logged in".into()
    })
}

/// Handles the `fintrack whoami` command.
pub async fn whoami(config: &Config) -> Result<Out<Identity>> {
    let session = SessionFile::load(config.session_path())
        .await
        .pub_result(ErrorType::Auth)?;
    let identity = session.identity;
    let message = format!(
        "{} <{}>, logged in since {}",
        identity.name,
        identity.email,
        session.logged_in_at.format("%Y-%m-%d %H:%M UTC")
    );
    Ok(Out::new(message, identity))
}
