//! Error type for `folio-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A domain rule blocked the operation.
  #[error(transparent)]
  Core(#[from] folio_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("background task failed: {0}")]
  Task(#[from] tokio::task::JoinError),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("corrupt column value: {0}")]
  Decode(String),
}

impl Error {
  /// The domain error, if this is one.
  pub fn core(&self) -> Option<&folio_core::Error> {
    match self {
      Self::Core(e) => Some(e),
      _ => None,
    }
  }

  /// `true` when SQLite reported lock contention. The operation did not
  /// happen and can be retried as-is.
  pub fn is_transient(&self) -> bool {
    let sqlite = match self {
      Self::Sqlite(e) | Self::Database(tokio_rusqlite::Error::Rusqlite(e)) => e,
      _ => return false,
    };
    matches!(
      sqlite.sqlite_error_code(),
      Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked)
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
