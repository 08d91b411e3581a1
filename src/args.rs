//! These structs provide the CLI interface for the fintrack CLI.

use crate::commands::OutputFormat;
use crate::ledger::SeriesKind;
use crate::model::Candidate;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing::level_filters::LevelFilter;

/// fintrack: A command-line personal finance tracker.
///
/// Sign in with your Google account, record your expenses as you make them, and see where the
/// money went: totals, your most frequent category, per-category spending and a weekly or daily
/// spending series.
///
/// You will need a Google OAuth client (a "Desktop app" client from Google Cloud Console) to sign
/// in. Download its JSON credentials and pass them to `fintrack init`.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and initialize the configuration files.
    ///
    /// This is the first command you should run. Decide what directory you want to store data in
    /// and pass it as --fintrack-home (by default it is $HOME/fintrack), and download the OAuth
    /// client credentials JSON for your Google Cloud project.
    Init(InitArgs),
    /// Sign in with Google.
    Login(LoginArgs),
    /// Sign out. Your transactions are kept.
    Logout,
    /// Show who is signed in.
    Whoami,
    /// Record an expense.
    Add(AddArgs),
    /// List your transactions, newest first.
    History(HistoryArgs),
    /// Show your spending statistics.
    Summary(SummaryArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where fintrack data and configuration is held. Defaults to ~/fintrack
    #[arg(long, env = "FINTRACK_HOME", default_value_t = default_fintrack_home())]
    fintrack_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, fintrack_home: PathBuf) -> Self {
        Self {
            log_level,
            fintrack_home: fintrack_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn fintrack_home(&self) -> &DisplayPath {
        &self.fintrack_home
    }
}

/// (Not shown): Args for the `fintrack init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The path to your downloaded OAuth client credentials. This file will be moved to the
    /// default secrets location in the main data directory.
    #[arg(long)]
    client_secret: PathBuf,
}

impl InitArgs {
    pub fn new(client_secret: impl Into<PathBuf>) -> Self {
        Self {
            client_secret: client_secret.into(),
        }
    }

    pub fn client_secret(&self) -> &Path {
        &self.client_secret
    }
}

/// (Not shown): Args for the `fintrack login` command.
#[derive(Debug, Parser, Clone)]
pub struct LoginArgs {
    /// Verify this Google ID token instead of opening the browser sign-in.
    #[arg(long)]
    id_token: Option<String>,
}

impl LoginArgs {
    pub fn new(id_token: Option<String>) -> Self {
        Self { id_token }
    }

    pub fn id_token(&self) -> Option<&str> {
        self.id_token.as_deref()
    }
}

/// (Not shown): Args for the `fintrack add` command.
#[derive(Debug, Parser, Clone)]
pub struct AddArgs {
    /// The date of the expense, YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    date: Option<String>,

    /// The time of day, HH:MM or HH:MM:SS.
    #[arg(long)]
    time: Option<String>,

    /// What the money was spent on.
    #[arg(long, default_value = "")]
    description: String,

    /// The amount spent, e.g. 4.50 or $1,234.50. Must be greater than zero.
    #[arg(long)]
    amount: String,

    /// One of: Food, Transport, Entertainment, Bills, Shopping, Other
    #[arg(long)]
    category: String,
}

impl AddArgs {
    pub fn new(
        date: Option<String>,
        time: Option<String>,
        description: impl Into<String>,
        amount: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            date,
            time,
            description: description.into(),
            amount: amount.into(),
            category: category.into(),
        }
    }

    /// Builds the unvalidated form input, using `today` when no date was given.
    pub fn candidate(&self, today: &str) -> Candidate {
        Candidate {
            date: self.date.clone().unwrap_or_else(|| today.to_string()),
            time: self.time.clone(),
            description: self.description.clone(),
            amount: self.amount.clone(),
            category: self.category.clone(),
        }
    }
}

/// (Not shown): Args for the `fintrack history` command.
#[derive(Debug, Parser, Clone)]
pub struct HistoryArgs {
    /// How to print the history.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

impl HistoryArgs {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }
}

/// (Not shown): Args for the `fintrack summary` command.
#[derive(Debug, Parser, Clone)]
pub struct SummaryArgs {
    /// The spending series: weekly sums across all time, or daily sums for the current month.
    #[arg(long, value_enum, default_value_t = SeriesKind::Daily)]
    series: SeriesKind,
}

impl SummaryArgs {
    pub fn new(series: SeriesKind) -> Self {
        Self { series }
    }

    pub fn series(&self) -> SeriesKind {
        self.series
    }
}

fn default_fintrack_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("fintrack"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --fintrack-home or FINTRACK_HOME instead of relying on the \
                default home directory. If you continue using the program right now, you may \
                have problems!",
            );
            PathBuf::from("fintrack")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}
