//! Session tokens and the viewer context derived from them.
//!
//! A token has two dot-separated segments: the base64url-encoded JSON
//! [`SessionClaims`] and a hex-encoded random secret. Clients only ever read
//! the claims segment; the server authorises requests by the secret.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD as B64};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, record::AlumniRecord};

// ─── Claims ──────────────────────────────────────────────────────────────────

/// The readable part of a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
  /// The user account id.
  pub id:        Uuid,
  /// The alumni profile owned by the user, if one existed at login.
  #[serde(default)]
  pub alumni_id: Option<Uuid>,
  #[serde(default)]
  pub is_admin:  bool,
  /// Expiry as a unix timestamp (seconds).
  pub exp:       i64,
}

impl SessionClaims {
  pub fn is_expired(&self, now: DateTime<Utc>) -> bool { self.exp <= now.timestamp() }
}

// ─── Token codec ─────────────────────────────────────────────────────────────

/// Assemble a token from its claims and the hex secret.
pub fn encode_token(claims: &SessionClaims, secret: &str) -> Result<String> {
  let json = serde_json::to_vec(claims)?;
  Ok(format!("{}.{secret}", B64.encode(json)))
}

/// Split a token into `(claims_segment, secret)`.
pub fn split_token(token: &str) -> Result<(&str, &str)> {
  let token = token.trim();
  let (claims, secret) = token
    .split_once('.')
    .ok_or_else(|| Error::InvalidToken("missing separator".into()))?;
  if claims.is_empty() || secret.is_empty() || secret.contains('.') {
    return Err(Error::InvalidToken("expected two non-empty segments".into()));
  }
  Ok((claims, secret))
}

/// Decode the claims segment of a token without verifying it.
pub fn decode_claims(token: &str) -> Result<SessionClaims> {
  let (claims, _) = split_token(token)?;
  let bytes = B64
    .decode(claims)
    .map_err(|e| Error::InvalidToken(e.to_string()))?;
  serde_json::from_slice(&bytes).map_err(|e| Error::InvalidToken(e.to_string()))
}

// ─── ViewerContext ───────────────────────────────────────────────────────────

/// Who is looking at the directory. An anonymous viewer is represented as
/// `Option::<ViewerContext>::None` throughout the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerContext {
  pub viewer_id: Uuid,
  pub alumni_id: Option<Uuid>,
  pub is_admin:  bool,
}

impl ViewerContext {
  pub fn from_claims(claims: &SessionClaims) -> Self {
    Self {
      viewer_id: claims.id,
      alumni_id: claims.alumni_id,
      is_admin:  claims.is_admin,
    }
  }

  /// Derive the viewer from an optional token. Missing, malformed or expired
  /// tokens yield an anonymous viewer.
  pub fn from_token(token: Option<&str>) -> Option<Self> {
    Self::from_token_at(token, Utc::now())
  }

  pub fn from_token_at(token: Option<&str>, now: DateTime<Utc>) -> Option<Self> {
    let claims = decode_claims(token?).ok()?;
    if claims.is_expired(now) {
      return None;
    }
    Some(Self::from_claims(&claims))
  }

  /// Whether `record` is the viewer's own profile.
  pub fn owns(&self, record: &AlumniRecord) -> bool {
    self.alumni_id == Some(record.id) || record.user_id == Some(self.viewer_id)
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn claims(exp: i64) -> SessionClaims {
    SessionClaims {
      id:        Uuid::from_u128(10),
      alumni_id: Some(Uuid::from_u128(1)),
      is_admin:  false,
      exp,
    }
  }

  #[test]
  fn claims_survive_the_token() {
    let token = encode_token(&claims(2_000_000_000), "deadbeef").unwrap();
    assert_eq!(decode_claims(&token).unwrap(), claims(2_000_000_000));
    assert_eq!(split_token(&token).unwrap().1, "deadbeef");
  }

  #[test]
  fn garbage_tokens_are_anonymous() {
    let now = Utc.timestamp_opt(1_000, 0).unwrap();
    assert!(ViewerContext::from_token_at(None, now).is_none());
    assert!(ViewerContext::from_token_at(Some(""), now).is_none());
    assert!(ViewerContext::from_token_at(Some("not-a-token"), now).is_none());
    assert!(ViewerContext::from_token_at(Some("!!!.abc"), now).is_none());
    assert!(ViewerContext::from_token_at(Some("a.b.c"), now).is_none());
  }

  #[test]
  fn expired_tokens_are_anonymous() {
    let token = encode_token(&claims(500), "00").unwrap();
    let before = Utc.timestamp_opt(499, 0).unwrap();
    let after = Utc.timestamp_opt(500, 0).unwrap();
    assert!(ViewerContext::from_token_at(Some(&token), before).is_some());
    assert!(ViewerContext::from_token_at(Some(&token), after).is_none());
  }

  #[test]
  fn ownership_by_alumni_or_user_id() {
    let viewer = ViewerContext::from_claims(&claims(0));
    let mine = AlumniRecord::new(Uuid::from_u128(1), "me");
    let mut linked = AlumniRecord::new(Uuid::from_u128(2), "also me");
    linked.user_id = Some(Uuid::from_u128(10));
    let other = AlumniRecord::new(Uuid::from_u128(3), "someone");
    assert!(viewer.owns(&mine));
    assert!(viewer.owns(&linked));
    assert!(!viewer.owns(&other));
  }
}
