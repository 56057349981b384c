//! Error type for `aspect-store-sqlite`.

use aspect_core::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// Collection and field names are interpolated into SQL and must be plain
  /// identifiers.
  #[error("invalid name: {0:?}")]
  InvalidName(String),

  #[error("unsupported filter value for field {0:?}")]
  UnsupportedFilter(String),

  #[error("index bootstrap failed: {0}")]
  Bootstrap(#[source] StoreError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for StoreError {
  fn from(e: Error) -> Self {
    match e {
      Error::Database(tokio_rusqlite::Error::ConnectionClosed)
      | Error::Database(tokio_rusqlite::Error::Close(_)) => {
        StoreError::Unavailable("connection closed".to_owned())
      }
      Error::Database(tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(
        err,
        msg,
      ))) if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        || err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
      {
        StoreError::DuplicateKey { index: violated_index(msg.as_deref()) }
      }
      Error::Json(e) => StoreError::Malformed(e.to_string()),
      Error::Bootstrap(e) => e,
      other => StoreError::Rejected(other.to_string()),
    }
  }
}

/// Pull the index name out of SQLite's constraint message.
///
/// Expression indexes report `UNIQUE constraint failed: index 'NAME'`; column
/// constraints report the column list, which is returned as is.
fn violated_index(msg: Option<&str>) -> String {
  let Some(msg) = msg else {
    return "unknown".to_owned();
  };
  let detail = msg
    .strip_prefix("UNIQUE constraint failed: ")
    .unwrap_or(msg);
  match detail.strip_prefix("index '").and_then(|s| s.strip_suffix('\'')) {
    Some(name) => name.to_owned(),
    None => detail.to_owned(),
  }
}
