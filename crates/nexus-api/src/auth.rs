//! Accounts, sessions and the bearer-token extractor.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/register` | Body: `{"email","password","name"?}`; 201 |
//! | `POST` | `/auth/login` | Body: `{"email","password"}`; 401 on mismatch |
//! | `POST` | `/auth/logout` | Revokes the presented token; 204 |
//! | `GET`  | `/auth/me` | Claims of the presented token |

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  Json,
  extract::{FromRequestParts, State},
  http::{HeaderMap, StatusCode, header, request::Parts},
  response::IntoResponse,
};
use chrono::{DateTime, Duration, Utc};
use nexus_core::{
  account::{NewUser, Session, User},
  record::{AlumniProfile, AlumniRecord},
  session::{SessionClaims, ViewerContext, encode_token, split_token},
  store::DirectoryStore,
};
use rand_core::{OsRng, RngCore as _};
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

use crate::{AppState, error::ApiError};

const MIN_PASSWORD_LEN: usize = 8;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Session and account policy for this server instance.
#[derive(Debug, Clone)]
pub struct AuthConfig {
  pub session_ttl:  Duration,
  /// Accounts registered with one of these emails become administrators.
  pub admin_emails: Vec<String>,
}

impl Default for AuthConfig {
  fn default() -> Self {
    Self { session_ttl: Duration::hours(24 * 7), admin_emails: Vec::new() }
  }
}

impl AuthConfig {
  fn is_admin_email(&self, email: &str) -> bool {
    self.admin_emails.iter().any(|a| a.eq_ignore_ascii_case(email))
  }
}

// ─── Passwords and secrets ───────────────────────────────────────────────────

/// Hash `password` into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| ApiError::BadRequest(format!("cannot hash password: {e}")))
}

pub fn verify_password(password: &str, phc: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(phc) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}

/// The form in which a token secret is stored.
pub fn hash_secret(secret: &str) -> String { hex::encode(Sha256::digest(secret.as_bytes())) }

/// Extract the token from an `Authorization: Bearer …` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// An authenticated caller. Identity comes from the session row, never from
/// the client-readable claims segment.
#[derive(Debug, Clone)]
pub struct AuthUser {
  pub user:       User,
  pub viewer:     ViewerContext,
  pub token_hash: String,
  pub expires_at: DateTime<Utc>,
}

impl AuthUser {
  /// Owners may edit their own profile; administrators may edit any.
  pub fn can_edit(&self, record: &AlumniRecord) -> bool {
    self.viewer.is_admin || self.viewer.owns(record)
  }

  pub fn require_admin(&self) -> Result<(), ApiError> {
    if self.viewer.is_admin {
      Ok(())
    } else {
      Err(ApiError::Forbidden("administrator only".into()))
    }
  }

  pub fn claims(&self) -> SessionClaims {
    SessionClaims {
      id:        self.viewer.viewer_id,
      alumni_id: self.viewer.alumni_id,
      is_admin:  self.viewer.is_admin,
      exp:       self.expires_at.timestamp(),
    }
  }
}

/// Resolve a bearer token to its user. Expired sessions are deleted.
pub async fn authenticate<S>(store: &S, token: &str) -> Result<AuthUser, ApiError>
where
  S: DirectoryStore,
{
  let (_, secret) = split_token(token).map_err(|_| ApiError::Unauthorized)?;
  let token_hash = hash_secret(secret);

  let session = store
    .get_session(token_hash.clone())
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::Unauthorized)?;

  if session.is_expired(Utc::now()) {
    store
      .delete_session(token_hash)
      .await
      .map_err(ApiError::store)?;
    return Err(ApiError::Unauthorized);
  }

  let user = store
    .get_user(session.user_id)
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::Unauthorized)?;

  let alumni_id = store
    .find_alumni_by_user(user.user_id)
    .await
    .map_err(ApiError::store)?
    .map(|r| r.id);

  Ok(AuthUser {
    viewer: ViewerContext {
      viewer_id: user.user_id,
      alumni_id,
      is_admin: user.is_admin,
    },
    user,
    token_hash,
    expires_at: session.expires_at,
  })
}

impl<S> FromRequestParts<AppState<S>> for AuthUser
where
  S: DirectoryStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer_token(&parts.headers).ok_or(ApiError::Unauthorized)?;
    authenticate(state.store.as_ref(), token).await
  }
}

// ─── Sessions ────────────────────────────────────────────────────────────────

/// Body returned by register and login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
  pub token:  String,
  pub claims: SessionClaims,
}

async fn issue_session<S>(state: &AppState<S>, user: &User) -> Result<TokenResponse, ApiError>
where
  S: DirectoryStore,
{
  let mut raw = [0u8; 32];
  OsRng.fill_bytes(&mut raw);
  let secret = hex::encode(raw);

  let now = Utc::now();
  let expires_at = now + state.auth.session_ttl;
  let alumni_id = state
    .store
    .find_alumni_by_user(user.user_id)
    .await
    .map_err(ApiError::store)?
    .map(|r| r.id);

  state
    .store
    .create_session(Session {
      token_hash: hash_secret(&secret),
      user_id: user.user_id,
      created_at: now,
      expires_at,
    })
    .await
    .map_err(ApiError::store)?;

  let claims = SessionClaims {
    id: user.user_id,
    alumni_id,
    is_admin: user.is_admin,
    exp: expires_at.timestamp(),
  };
  let token = encode_token(&claims, &secret)?;
  Ok(TokenResponse { token, claims })
}

// ─── Register ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub email:    String,
  pub password: String,
  /// When present, a profile with this name is created for the account.
  pub name:     Option<String>,
}

/// `POST /auth/register`
pub async fn register<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DirectoryStore + 'static,
{
  let email = body.email.trim().to_owned();
  if !email.contains('@') {
    return Err(ApiError::BadRequest("invalid email".into()));
  }
  if body.password.chars().count() < MIN_PASSWORD_LEN {
    return Err(ApiError::BadRequest(format!(
      "password must be at least {MIN_PASSWORD_LEN} characters"
    )));
  }

  let existing = state
    .store
    .find_user_by_email(email.clone())
    .await
    .map_err(ApiError::store)?;
  if existing.is_some() {
    return Err(ApiError::Conflict(format!("{email} is already registered")));
  }

  let is_admin = state.auth.is_admin_email(&email);
  let user = state
    .store
    .create_user(NewUser {
      email: email.clone(),
      password_hash: hash_password(&body.password)?,
      is_admin,
    })
    .await
    .map_err(ApiError::store)?;

  if let Some(name) = body.name.map(|n| n.trim().to_owned())
    && !name.is_empty()
  {
    let profile = AlumniProfile { name, email: Some(email), ..Default::default() };
    state
      .store
      .create_alumni(Some(user.user_id), profile, is_admin)
      .await
      .map_err(ApiError::store)?;
  }

  tracing::info!(user_id = %user.user_id, is_admin, "account registered");
  let response = issue_session(&state, &user).await?;
  Ok((StatusCode::CREATED, Json(response)))
}

// ─── Login / logout ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

/// `POST /auth/login`
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<TokenResponse>, ApiError>
where
  S: DirectoryStore + 'static,
{
  let user = state
    .store
    .find_user_by_email(body.email.trim().to_owned())
    .await
    .map_err(ApiError::store)?;

  let Some(user) = user.filter(|u| verify_password(&body.password, &u.password_hash)) else {
    tracing::warn!("failed login attempt");
    return Err(ApiError::Unauthorized);
  };

  tracing::info!(user_id = %user.user_id, "logged in");
  Ok(Json(issue_session(&state, &user).await?))
}

/// `POST /auth/logout`
pub async fn logout<S>(
  State(state): State<AppState<S>>,
  auth: AuthUser,
) -> Result<StatusCode, ApiError>
where
  S: DirectoryStore + 'static,
{
  state
    .store
    .delete_session(auth.token_hash)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(user_id = %auth.user.user_id, "logged out");
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /auth/me`
pub async fn me(auth: AuthUser) -> Json<SessionClaims> { Json(auth.claims()) }

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  #[test]
  fn password_roundtrip() {
    let phc = hash_password("correct horse").unwrap();
    assert!(phc.starts_with("$argon2"));
    assert!(verify_password("correct horse", &phc));
    assert!(!verify_password("wrong horse", &phc));
    assert!(!verify_password("correct horse", "not-a-phc-string"));
  }

  #[test]
  fn bearer_header_parsing() {
    let mut headers = HeaderMap::new();
    assert_eq!(bearer_token(&headers), None);

    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
    assert_eq!(bearer_token(&headers), None);

    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer  abc.def "));
    assert_eq!(bearer_token(&headers), Some("abc.def"));
  }

  #[test]
  fn secret_hash_is_stable_hex() {
    let h = hash_secret("deadbeef");
    assert_eq!(h.len(), 64);
    assert_eq!(h, hash_secret("deadbeef"));
    assert_ne!(h, hash_secret("deadbeee"));
  }
}
