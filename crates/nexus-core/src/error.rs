//! Error types for `nexus-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A bookmark mutation was attempted without a logged-in viewer.
  #[error("you must be logged in to do this")]
  Unauthenticated,

  #[error("malformed session token: {0}")]
  InvalidToken(String),

  #[error("unknown bookmark item type: {0:?}")]
  UnknownItemType(String),

  /// The backend collaborator (HTTP API or store) rejected the call.
  #[error("backend error: {0}")]
  Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// Box an arbitrary backend error.
  pub fn backend<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Backend(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
