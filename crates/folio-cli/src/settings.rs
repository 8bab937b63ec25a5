//! Layered configuration: an optional TOML file overlaid by `FOLIO_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use folio_core::diff::DiffMode;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// SQLite database file. A leading `~/` is expanded.
  pub store_path:  PathBuf,
  /// Acting user when `--user` is not given.
  pub user:        Option<String>,
  /// Strategy used by `compare` when `--mode` is not given.
  pub diff_mode:   DiffMode,
  /// How many times a busy store is retried before giving up.
  pub max_retries: u32,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      store_path:  PathBuf::from("folio.db"),
      user:        None,
      diff_mode:   DiffMode::Inline,
      max_retries: 3,
    }
  }
}

impl Settings {
  /// Read `path` (if it exists) and the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("FOLIO"))
      .build()
      .with_context(|| format!("failed to read config file {}", path.display()))?;

    let mut settings: Self = settings
      .try_deserialize()
      .context("failed to deserialise settings")?;
    settings.store_path = expand_tilde(&settings.store_path);
    Ok(settings)
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
