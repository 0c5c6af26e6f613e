//! bibops - batch-process MARC21 records through the WorldCat Metadata
//! API: add, replace, and validate bibliographic records, resolve
//! current control numbers, and delete or replace local holdings
//! records.

use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod context;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();

    let default_filter = if args.command.common().verbose {
        "bibops=debug,info"
    } else {
        "bibops=info,warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let result = match &args.command {
        Command::Add(common) => commands::add::execute(common).await,
        Command::Replace(common) => commands::replace::execute(common).await,
        Command::Validate { common, mode } => commands::validate::execute(common, *mode).await,
        Command::Current(common) => commands::current::execute(common).await,
        Command::DeleteLhr(common) => commands::delete_lhr::execute(common).await,
        Command::ReplaceLhr(common) => commands::replace_lhr::execute(common).await,
    };

    // A quota abort is a clean exit: everything written so far is
    // flushed and the run simply stops early.
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "run failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
