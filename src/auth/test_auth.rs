//! Implements the `Authenticator` trait without a network so that the program can be run
//! top-to-bottom in test mode.
//!
//! Note: this is compiled even in the "production" version of this app; it is selected by
//! `Mode::Testing`.

use crate::auth::{Authenticator, Identity};
use crate::error::Res;
use anyhow::{bail, Context};

const PREFIX: &str = "test:";

/// Accepts tokens of the form `test:<email>:<name>` (the name is optional) and rejects anything
/// else. Nonces are ignored.
pub(super) struct TestAuthenticator;

#[async_trait::async_trait]
impl Authenticator for TestAuthenticator {
    async fn authenticate(&self, id_token: &str, _nonce: Option<&str>) -> Res<Identity> {
        let rest = id_token
            .strip_prefix(PREFIX)
            .context("Invalid test token, expected 'test:<email>:<name>'")?;
        let (email, name) = match rest.split_once(':') {
            Some((email, name)) => (email, name),
            None => (rest, ""),
        };
        if !email.contains('@') {
            bail!("Invalid test token, '{email}' is not an email address");
        }
        Ok(Identity {
            email: email.to_string(),
            name: if name.is_empty() { "User" } else { name }.to_string(),
            picture: String::new(),
        })
    }
}
