use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory, its subdirectories and:
/// - Creates an initial `config.json` file with default settings
/// - Moves `secret_file` into its default location in the data dir
/// - Creates the SQLite store
///
/// # Arguments
/// - `fintrack_home` - The directory that will be the root of data directory, e.g.
///   `$HOME/fintrack`
/// - `secret_file` - The downloaded OAuth 2.0 client credentials JSON needed to sign in with
///   Google.
///
/// # Errors
/// - Returns an error if any file operations fail.
pub async fn init(fintrack_home: &Path, secret_file: &Path) -> Result<Out<()>> {
    let config = Config::create(fintrack_home, secret_file)
        .await
        .context("Unable to create the data directory and configs")
        .pub_result(ErrorType::Config)?;
    Ok(format!(
        "Successfully created the fintrack directory at {}. Run 'fintrack login' next.",
        config.root().display()
    )
    .into())
}
