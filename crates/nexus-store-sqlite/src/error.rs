//! Error type for `nexus-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] nexus_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  /// A column held a value that does not map onto a domain type.
  #[error("decode error: {0}")]
  Decode(String),

  #[error("email already registered: {0}")]
  DuplicateEmail(String),

  #[error("user {0} already owns an alumni profile")]
  ProfileExists(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
