//! The `Session` binds one logged-in `Identity` to that user's `Ledger` and the `Store` it is
//! persisted in. Logging in creates one, logging out ends it. Every ledger operation goes through
//! a session, so there is no ambient "current user".

use crate::auth::{self, Identity, Mode, SessionFile};
use crate::error::{ErrorType, IntoResult};
use crate::ledger::{HistoryRow, Ledger, SeriesKind, SummaryView};
use crate::model::{Candidate, TxnId};
use crate::store::Store;
use crate::{Config, Result};
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub struct Session {
    identity: Identity,
    ledger: Ledger,
    store: Arc<dyn Store>,
    timeout: Duration,
}

impl Session {
    /// Starts a session for `identity`, hydrating its ledger from `store`.
    ///
    /// # Errors
    /// `ErrorType::Persistence` if the store cannot list the user's transactions in time.
    pub async fn start(identity: Identity, store: Arc<dyn Store>, timeout: Duration) -> Result<Self> {
        let ledger = Ledger::load(&*store, identity.email.clone(), timeout).await?;
        Ok(Self {
            identity,
            ledger,
            store,
            timeout,
        })
    }

    /// Verifies `id_token`, starts the session and then records the identity in the session file.
    /// Nothing is recorded if the ledger cannot be loaded.
    ///
    /// # Errors
    /// - `ErrorType::Auth` if the token is rejected.
    /// - `ErrorType::Io` if the session file cannot be written.
    /// - `ErrorType::Persistence` if the ledger cannot be loaded.
    pub async fn login(
        config: &Config,
        mode: Mode,
        id_token: &str,
        nonce: Option<&str>,
    ) -> Result<Self> {
        let authenticator = auth::authenticator(config, mode)
            .await
            .pub_result(ErrorType::Config)?;
        let identity = authenticator
            .authenticate(id_token, nonce)
            .await
            .context("Sign-in failed")
            .pub_result(ErrorType::Auth)?;
        let session = Self::resume_as(config, identity).await?;
        SessionFile::new(session.identity.clone())
            .save(config.session_path())
            .await
            .pub_result(ErrorType::Io)?;
        info!("Logged in as {}", session.identity.email);
        Ok(session)
    }

    /// Starts the session recorded by the last `login`.
    ///
    /// # Errors
    /// `ErrorType::Auth` if nobody is logged in.
    pub async fn resume(config: &Config) -> Result<Self> {
        let file = SessionFile::load(config.session_path())
            .await
            .pub_result(ErrorType::Auth)?;
        debug!(
            "Resuming session for {} from {}",
            file.identity.email, file.logged_in_at
        );
        Self::resume_as(config, file.identity).await
    }

    async fn resume_as(config: &Config, identity: Identity) -> Result<Self> {
        let store: Arc<dyn Store> = Arc::new(config.store().clone());
        Self::start(identity, store, config.store_timeout()).await
    }

    /// Ends the session by removing the session file. The persisted transactions are kept.
    /// Returns `false` if nobody was logged in.
    pub async fn logout(config: &Config) -> Result<bool> {
        SessionFile::delete(config.session_path())
            .await
            .pub_result(ErrorType::Io)
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Validates `candidate` and appends it to this user's ledger and store.
    pub async fn append(&mut self, candidate: Candidate) -> Result<TxnId> {
        self.ledger
            .append(&*self.store, candidate, self.timeout)
            .await
    }

    pub fn summarize(&self, kind: SeriesKind) -> SummaryView {
        self.ledger.summarize(kind)
    }

    pub fn history(&self) -> Vec<HistoryRow> {
        self.ledger.history()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Amount;
    use crate::store::MemoryStore;
    use crate::test::TestEnv;

    fn ada() -> Identity {
        Identity {
            email: "ada@example.com".to_string(),
            name: "Ada".to_string(),
            picture: String::new(),
        }
    }

    #[tokio::test]
    async fn test_session_is_scoped_to_one_user() {
        let store = Arc::new(MemoryStore::default());
        let timeout = Duration::from_secs(1);

        let mut ada_session = Session::start(ada(), store.clone(), timeout).await.unwrap();
        ada_session
            .append(Candidate::new("2024-01-01", "Coffee", "4.50", "Food"))
            .await
            .unwrap();

        let bob = Identity {
            email: "bob@example.com".to_string(),
            ..ada()
        };
        let bob_session = Session::start(bob, store.clone(), timeout).await.unwrap();
        assert!(bob_session.ledger().is_empty());

        let again = Session::start(ada(), store, timeout).await.unwrap();
        assert_eq!(again.ledger().len(), 1);
        assert_eq!(again.ledger().total(), "4.50".parse::<Amount>().unwrap());
    }

    #[tokio::test]
    async fn test_start_fails_when_store_is_down() {
        let store = Arc::new(MemoryStore::default());
        store.fail_lists(true);
        let err = Session::start(ada(), store, Duration::from_secs(1))
            .await
            .err()
            .unwrap();
        assert!(err.is_persistence());
    }

    #[tokio::test]
    async fn test_login_resume_logout() {
        let env = TestEnv::new().await;
        let config = env.config();

        let err = Session::resume(&config).await.err().unwrap();
        assert!(err.is_auth());

        let mut session = Session::login(&config, Mode::Testing, "test:ada@example.com:Ada", None)
            .await
            .unwrap();
        assert_eq!(session.identity().name, "Ada");
        session
            .append(Candidate::new("2024-02-10", "Groceries", "50", "Food"))
            .await
            .unwrap();

        let resumed = Session::resume(&config).await.unwrap();
        assert_eq!(resumed.identity(), &ada());
        assert_eq!(resumed.ledger().len(), 1);
        assert_eq!(resumed.history()[0].number, 1);

        assert!(Session::logout(&config).await.unwrap());
        assert!(!Session::logout(&config).await.unwrap());
        assert!(Session::resume(&config).await.err().unwrap().is_auth());
    }

    #[tokio::test]
    async fn test_login_does_not_record_session_when_ledger_load_fails() {
        let env = TestEnv::new().await;
        let config = env.config();
        let options = sqlx::sqlite::SqliteConnectOptions::new().filename(config.sqlite_path());
        let pool = sqlx::SqlitePool::connect_with(options).await.unwrap();
        sqlx::query("DROP TABLE transactions")
            .execute(&pool)
            .await
            .unwrap();
        pool.close().await;

        let err = Session::login(&config, Mode::Testing, "test:ada@example.com:Ada", None)
            .await
            .err()
            .unwrap();
        assert!(err.is_persistence());
        assert!(!config.session_path().exists());
        assert!(Session::resume(&config).await.err().unwrap().is_auth());
    }

    #[tokio::test]
    async fn test_login_rejects_bad_token() {
        let env = TestEnv::new().await;
        let err = Session::login(&env.config(), Mode::Testing, "not-a-token", None)
            .await
            .err()
            .unwrap();
        assert!(err.is_auth());
        assert!(!env.config().session_path().exists());
    }
}
