//! A `Store` backed by a local SQLite file.

use crate::error::Res;
use crate::model::{parse_date, parse_time, Amount, Category, Entry, Transaction, TxnId};
use crate::model::{DATE_FORMAT, TIME_FORMAT};
use crate::store::migrations::{self, CURRENT_VERSION};
use crate::store::Store;
use anyhow::{bail, Context};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, trace};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    path: PathBuf,
}

impl SqliteStore {
    /// - Validates that no file currently exists at `path`
    /// - Creates a new SQLite file at `path`
    /// - Initializes the database schema
    pub async fn init(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        if path.exists() {
            bail!("A database already exists at {}", path.display());
        }
        Self::open(path, true).await
    }

    /// - Validates that there is a SQLite file at `path`
    /// - Updates the database schema with migrations if it is out-of-date
    pub async fn load(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            bail!("The database file is missing '{}'", path.display());
        }
        Self::open(path, false).await
    }

    async fn open(path: &Path, create: bool) -> Res<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(create)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .with_context(|| format!("Unable to open SQLite database at {}", path.display()))?;

        let version = migrations::current_version(&pool).await?;
        if version > CURRENT_VERSION {
            bail!(
                "The database at {} has schema version {version}, but this program only \
                understands up to version {CURRENT_VERSION}. Is a newer version of fintrack \
                installed?",
                path.display()
            );
        }
        migrations::run(&pool, version, CURRENT_VERSION).await?;
        debug!("Opened SQLite store at {}", path.display());

        Ok(Self {
            pool,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of transactions across all users.
    pub async fn count_transactions(&self) -> Res<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM transactions")
            .fetch_one(&self.pool)
            .await
            .context("Unable to count transactions")?;
        let n: i64 = row.try_get("n")?;
        Ok(u64::try_from(n).unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl Store for SqliteStore {
    async fn list(&self, user_key: &str) -> Res<Vec<Entry>> {
        trace!("list for {user_key}");
        let rows = sqlx::query(
            "SELECT id, date, time, description, amount, category FROM transactions \
            WHERE user_key = ? ORDER BY seq",
        )
        .bind(user_key)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Unable to query transactions for {user_key}"))?;

        rows.iter().map(row_to_entry).collect()
    }

    async fn append(&self, user_key: &str, transaction: &Transaction) -> Res<TxnId> {
        let id = Uuid::new_v4().to_string();
        trace!("append {id} for {user_key}");
        sqlx::query(
            "INSERT INTO transactions (id, user_key, date, time, description, amount, category) \
            VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(user_key)
        .bind(transaction.date().format(DATE_FORMAT).to_string())
        .bind(transaction.time().map(|t| t.format(TIME_FORMAT).to_string()))
        .bind(transaction.description())
        .bind(transaction.amount().plain())
        .bind(transaction.category().to_string())
        .execute(&self.pool)
        .await
        .with_context(|| format!("Unable to insert transaction for {user_key}"))?;
        Ok(TxnId::new(id))
    }
}

fn row_to_entry(row: &SqliteRow) -> Res<Entry> {
    let id: String = row.try_get("id")?;
    let date: String = row.try_get("date")?;
    let time: Option<String> = row.try_get("time")?;
    let description: String = row.try_get("description")?;
    let amount: String = row.try_get("amount")?;
    let category: String = row.try_get("category")?;

    let transaction = Transaction::new(
        parse_date(&date)?,
        time.as_deref().map(parse_time).transpose()?,
        description,
        Amount::from_str(&amount)?,
        Category::from_str(&category)?,
    )
    .with_context(|| format!("Stored transaction {id} is invalid"))?;
    Ok(Entry::new(TxnId::new(id), transaction))
}
