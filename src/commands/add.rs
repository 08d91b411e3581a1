use crate::args::AddArgs;
use crate::commands::Out;
use crate::error::{Error, ErrorType};
use crate::model::{Entry, DATE_FORMAT};
use crate::session::Session;
use crate::{Config, Result};
use tracing::debug;

/// Handles the `fintrack add` command: validates the expense and appends it to the signed-in
/// user's ledger. Nothing is recorded if validation or the store write fails.
pub async fn add(config: &Config, args: AddArgs) -> Result<Out<Entry>> {
    let mut session = Session::resume(config).await?;
    let today = chrono::Local::now().date_naive().format(DATE_FORMAT).to_string();
    let candidate = args.candidate(&today);
    debug!("Adding {candidate:?}");

    let id = session.append(candidate).await?;
    let entry = session
        .ledger()
        .entries()
        .iter()
        .find(|e| e.id == id)
        .cloned()
        .ok_or_else(|| Error::msg(ErrorType::Io, format!("Transaction {id} went missing")))?;
    let t = &entry.transaction;
    let message = format!(
        "Recorded {} for {} in {} on {}, total spent is now {}",
        t.amount(),
        if t.description().is_empty() {
            "(no description)"
        } else {
            t.description()
        },
        t.category(),
        t.date().format(DATE_FORMAT),
        session.ledger().total()
    );
    Ok(Out::new(message, entry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    fn args(amount: &str, category: &str) -> AddArgs {
        AddArgs::new(
            Some("2024-01-01".to_string()),
            None,
            "Coffee",
            amount,
            category,
        )
    }

    #[tokio::test]
    async fn test_add() {
        let env = TestEnv::new().await;
        let config = env.config();
        env.login("ada@example.com").await;

        let out = add(&config, args("4.50", "food")).await.unwrap();
        assert!(out.message().contains("$4.50"));
        assert!(out.message().contains("Food"));
        assert_eq!(config.store().count_transactions().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_add_rejected() {
        let env = TestEnv::new().await;
        let config = env.config();
        env.login("ada@example.com").await;

        let err = add(&config, args("0", "Food")).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Validation);
        let err = add(&config, args("5", "Rent")).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Validation);
        assert_eq!(config.store().count_transactions().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_add_requires_login() {
        let env = TestEnv::new().await;
        let err = add(&env.config(), args("1", "Food")).await.unwrap_err();
        assert!(err.is_auth());
    }
}
