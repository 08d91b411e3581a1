use clap::Parser;
use fintrack::args::{Args, Command};
use fintrack::{commands, Config, Mode, Result};
use std::process::ExitCode;
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, trace};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().fintrack_home().path();

    // This allows for running the program without hitting Google. When FINTRACK_IN_TEST_MODE is
    // set and non-zero in length, then the mode will be Mode::Testing, otherwise Mode::Google.
    let mode = Mode::from_env();

    let _: () = match args.command() {
        Command::Init(init_args) => commands::init(home, init_args.client_secret())
            .await?
            .print(),

        Command::Login(login_args) => {
            let config = Config::open(home).await?;
            commands::login(&config, mode, login_args.id_token())
                .await?
                .print()
        }

        Command::Logout => commands::logout(&Config::open(home).await?).await?.print(),

        Command::Whoami => commands::whoami(&Config::open(home).await?).await?.print(),

        Command::Add(add_args) => {
            let config = Config::open(home).await?;
            commands::add(&config, add_args.clone()).await?.print()
        }

        Command::History(history_args) => {
            let config = Config::open(home).await?;
            commands::history(&config, history_args.format())
                .await?
                .print()
        }

        Command::Summary(summary_args) => {
            let config = Config::open(home).await?;
            commands::summary(&config, summary_args.series())
                .await?
                .print()
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
