//! Configuration file handling for fintrack.
//!
//! The configuration file is stored at `$FINTRACK_HOME/config.json` and contains settings for
//! the store timeout, the OAuth redirect port, and the locations of the secret files.

use crate::error::{ErrorType, IntoResult, Res};
use crate::store::SqliteStore;
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_NAME: &str = "fintrack";
const CONFIG_VERSION: u8 = 1;
const STORE_TIMEOUT_SECS: u64 = 10;
const OAUTH_CALLBACK_PORT: u16 = 3030;
const SECRETS: &str = ".secrets";
const CLIENT_SECRET_JSON: &str = "client_secret.json";
const SESSION_JSON: &str = "session.json";
const CONFIG_JSON: &str = "config.json";
const FINTRACK_SQLITE: &str = "fintrack.sqlite";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$FINTRACK_HOME` and from there it loads `$FINTRACK_HOME/config.json`. It provides
/// paths to other items that are either configurable or are expected in a certain location within
/// the home directory, and it holds the open store.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    store: SqliteStore,
    sqlite_path: PathBuf,
}

impl Config {
    /// Creates the data directory, its subdirectories and:
    /// - Creates an initial `config.json` file with default settings
    /// - Moves `secret_file` into its default location in the data dir
    /// - Creates the SQLite store
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of data directory, e.g. `$HOME/fintrack`
    /// - `secret_file` - The downloaded OAuth 2.0 client credentials JSON. This will be moved from
    ///   the `secret_file` path to its default location and name in the data directory.
    pub async fn create(dir: impl Into<PathBuf>, secret_file: &Path) -> Res<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the fintrack home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if config_path.exists() {
            bail!(
                "A fintrack home already exists at '{}', refusing to overwrite it",
                root.display()
            );
        }

        let secrets_dir = root.join(SECRETS);
        utils::make_dir(&secrets_dir).await?;
        let secret_destination = secrets_dir.join(CLIENT_SECRET_JSON);
        utils::rename(secret_file, secret_destination).await?;

        let config_file = ConfigFile::default();
        config_file.save(&config_path).await?;

        let sqlite_path = root.join(FINTRACK_SQLITE);
        let store = SqliteStore::init(&sqlite_path)
            .await
            .context("Unable to create SQLite store")?;

        Ok(Self {
            root,
            secrets: secrets_dir,
            config_path,
            config_file,
            store,
            sqlite_path,
        })
    }

    /// This will
    /// - validate that `fintrack_home` exists and that the config file exists
    /// - load the config file
    /// - validate that the secrets directory exists
    /// - open the store
    pub async fn load(fintrack_home: impl Into<PathBuf>) -> Res<Self> {
        let maybe_relative = fintrack_home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The fintrack home is missing, run 'fintrack init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let secrets = root.join(SECRETS);
        if !secrets.is_dir() {
            bail!("The secrets directory is missing '{}'", secrets.display())
        }

        let sqlite_path = root.join(FINTRACK_SQLITE);
        let store = SqliteStore::load(&sqlite_path)
            .await
            .context("Unable to load SQLite store")?;

        Ok(Self {
            root,
            secrets,
            config_path,
            config_file,
            store,
            sqlite_path,
        })
    }

    /// `load` for callers outside the crate: failures are tagged `ErrorType::Config`.
    pub async fn open(fintrack_home: impl Into<PathBuf>) -> Result<Self> {
        Self::load(fintrack_home)
            .await
            .pub_result(ErrorType::Config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    pub fn store(&self) -> &SqliteStore {
        &self.store
    }

    pub fn sqlite_path(&self) -> &Path {
        &self.sqlite_path
    }

    /// How long a single store call may take before it counts as failed.
    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.config_file.store_timeout_secs)
    }

    pub fn oauth_callback_port(&self) -> u16 {
        self.config_file.oauth_callback_port
    }

    /// Returns the stored `client_secret_path` if it is absolute, otherwise resolves the relative
    /// path.
    pub fn client_secret_path(&self) -> PathBuf {
        self.resolve(self.config_file.client_secret_path())
    }

    /// Returns the stored `session_path` if it is absolute, otherwise resolves the relative path.
    pub fn session_path(&self) -> PathBuf {
        self.resolve(self.config_file.session_path())
    }

    fn resolve(&self, p: PathBuf) -> PathBuf {
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "fintrack",
///   "config_version": 1,
///   "store_timeout_secs": 10,
///   "oauth_callback_port": 3030,
///   "client_secret_path": ".secrets/client_secret.json",
///   "session_path": ".secrets/session.json"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "fintrack"
    app_name: String,

    config_version: u8,

    #[serde(default = "default_store_timeout_secs")]
    store_timeout_secs: u64,

    #[serde(default = "default_oauth_callback_port")]
    oauth_callback_port: u16,

    /// Path to the OAuth 2.0 client credentials file (optional, relative to the home directory or
    /// absolute). Defaults to $FINTRACK_HOME/.secrets/client_secret.json
    #[serde(skip_serializing_if = "Option::is_none")]
    client_secret_path: Option<PathBuf>,

    /// Path to the session file (optional, relative to the home directory or absolute). Defaults
    /// to $FINTRACK_HOME/.secrets/session.json
    #[serde(skip_serializing_if = "Option::is_none")]
    session_path: Option<PathBuf>,
}

fn default_store_timeout_secs() -> u64 {
    STORE_TIMEOUT_SECS
}

fn default_oauth_callback_port() -> u16 {
    OAUTH_CALLBACK_PORT
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            store_timeout_secs: STORE_TIMEOUT_SECS,
            oauth_callback_port: OAUTH_CALLBACK_PORT,
            client_secret_path: None,
            session_path: None,
        }
    }
}

impl ConfigFile {
    async fn load(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path).await?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        anyhow::ensure!(
            config.store_timeout_secs > 0,
            "Invalid store_timeout_secs in config file: it must be at least 1"
        );

        Ok(config)
    }

    async fn save(&self, path: impl AsRef<Path>) -> Res<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    fn client_secret_path(&self) -> PathBuf {
        self.client_secret_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(CLIENT_SECRET_JSON))
    }

    fn session_path(&self) -> PathBuf {
        self.session_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(SESSION_JSON))
    }
}
