//! User accounts and server-side sessions.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A registered account. The password hash never leaves the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub user_id:       Uuid,
  pub email:         String,
  #[serde(skip)]
  pub password_hash: String,
  pub is_admin:      bool,
  pub created_at:    DateTime<Utc>,
}

/// Input to [`crate::store::DirectoryStore::create_user`].
#[derive(Debug, Clone)]
pub struct NewUser {
  pub email:         String,
  /// argon2 PHC string.
  pub password_hash: String,
  pub is_admin:      bool,
}

/// A login session, keyed by the SHA-256 of the token secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
  pub token_hash: String,
  pub user_id:    Uuid,
  pub created_at: DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
}

impl Session {
  pub fn is_expired(&self, now: DateTime<Utc>) -> bool { self.expires_at <= now }
}
