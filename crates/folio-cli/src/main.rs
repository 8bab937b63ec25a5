//! `folio`: command-line front end for a Folio wiki store.
//!
//! # Usage
//!
//! ```text
//! folio --user alice create "Release Notes" --tags "docs, release"
//! folio --user alice checkout release-notes
//! folio --user alice edit release-notes --file notes.md
//! folio --user alice publish release-notes
//! folio compare release-notes 1 2 --mode semantic
//! ```
//!
//! Settings come from `folio.toml` (or `--config`) and `FOLIO_*`
//! environment variables: `store_path`, `user`, `diff_mode`, `max_retries`.
//!
//! Failures exit with 2 for invalid input, 3 when something is not found,
//! 4 on a conflict (such as a page already checked out), 5 when the acting
//! user is not allowed, and 1 otherwise.

mod commands;
mod retry;
mod settings;

use std::{path::PathBuf, process::ExitCode};

use anyhow::Context as _;
use clap::Parser;
use commands::{App, Command};
use folio_core::{ErrorKind, user::UserRef};
use folio_store_sqlite::SqliteStore;
use settings::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "folio", version, about = "Revisioned wiki pages with checkout locking")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "folio.toml")]
  config: PathBuf,

  /// Acting user; overrides `user` from the configuration.
  #[arg(short, long)]
  user: Option<String>,

  /// Print results as JSON.
  #[arg(long, global = true)]
  json: bool,

  #[command(subcommand)]
  command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config)?;

  let store = SqliteStore::open(&settings.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", settings.store_path))?;

  let user = cli.user.or_else(|| settings.user.clone()).map(UserRef::from);
  let app = App { store, settings, user, json: cli.json };
  match app.run(cli.command).await {
    Ok(()) => Ok(ExitCode::SUCCESS),
    Err(e) => {
      eprintln!("error: {e:#}");
      Ok(ExitCode::from(exit_status(&e)))
    }
  }
}

fn exit_status(err: &anyhow::Error) -> u8 {
  let kind = err
    .downcast_ref::<folio_store_sqlite::Error>()
    .and_then(folio_store_sqlite::Error::core)
    .map(folio_core::Error::kind);
  match kind {
    Some(ErrorKind::Invalid) => 2,
    Some(ErrorKind::NotFound) => 3,
    Some(ErrorKind::Conflict) => 4,
    Some(ErrorKind::Forbidden) => 5,
    None => 1,
  }
}
