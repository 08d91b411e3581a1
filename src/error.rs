//! Error types for the public API.
//!
//! Internally we propagate `anyhow::Error` (see `Res`). At the public boundary the error is tagged
//! with an `ErrorType` so that a host can tell a bad form entry from a store outage without
//! matching on message text.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

/// The internal result type.
pub(crate) type Res<T> = std::result::Result<T, anyhow::Error>;

/// The public result type.
pub type Result<T> = std::result::Result<T, Error>;

/// The kind of failure, as seen by a caller.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// A candidate transaction was rejected: bad amount, unknown category or invalid date.
    Validation,
    /// A statistic that needs at least one transaction was requested on an empty ledger.
    EmptyLedger,
    /// The store was unreachable, timed out, or rejected a read or write.
    Persistence,
    /// The identity provider rejected the token, or nobody is logged in.
    Auth,
    /// The home directory or one of its files is missing or malformed.
    Config,
    /// Any other filesystem or runtime failure.
    Io,
}

serde_plain::derive_display_from_serialize!(ErrorType);

/// A public error: an `anyhow::Error` chain together with its `ErrorType`.
pub struct Error {
    error_type: ErrorType,
    inner: anyhow::Error,
}

impl Error {
    pub(crate) fn new(error_type: ErrorType, inner: anyhow::Error) -> Self {
        Self { error_type, inner }
    }

    /// Convenience for building an error from a message.
    pub(crate) fn msg(error_type: ErrorType, message: impl Display) -> Self {
        Self::new(error_type, anyhow::anyhow!("{message}"))
    }

    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }

    pub fn is_validation(&self) -> bool {
        self.error_type == ErrorType::Validation
    }

    pub fn is_empty_ledger(&self) -> bool {
        self.error_type == ErrorType::EmptyLedger
    }

    pub fn is_persistence(&self) -> bool {
        self.error_type == ErrorType::Persistence
    }

    pub fn is_auth(&self) -> bool {
        self.error_type == ErrorType::Auth
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {:?}", self.error_type, self.inner)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // The alternate form prints the whole context chain: "outer: inner: root".
        write!(f, "{:#}", self.inner)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

/// Converts an internal result into a public one by tagging the error with an `ErrorType`.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| Error::new(error_type, e.into()))
    }
}
