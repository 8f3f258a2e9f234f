//! Async HTTP client wrapping the SorboNexus JSON API.
//!
//! Response shapes are normalised here, once: records may carry their id as
//! `_id` (handled by the serde alias on [`AlumniRecord`]) and some endpoints
//! wrap a record in a `{"profile": {...}}` envelope.

use std::time::Duration;

use nexus_core::{
  backend::DirectoryBackend,
  bookmark::{Bookmark, BookmarkItemType, NewBookmark},
  record::{AlumniProfile, AlumniRecord},
  session::SessionClaims,
};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ClientError {
  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),

  /// Non-2xx response; `message` is the server's `{"error": ...}` text.
  #[error("{status}: {message}")]
  Status { status: u16, message: String },

  #[error("unexpected response shape: {0}")]
  Decode(#[from] serde_json::Error),

  #[error("not logged in")]
  NotLoggedIn,
}

// ─── Normalisation ───────────────────────────────────────────────────────────

/// Decode one record, unwrapping a `{"profile": {...}}` envelope if present.
pub fn normalize_record(value: Value) -> Result<AlumniRecord, serde_json::Error> {
  let value = match value {
    Value::Object(mut map) if map.get("profile").is_some_and(Value::is_object) => {
      map.remove("profile").unwrap_or_default()
    }
    other => other,
  };
  serde_json::from_value(value)
}

/// Decode a snapshot: either a bare array or `{"alumni": [...]}`.
pub fn normalize_records(value: Value) -> Result<Vec<AlumniRecord>, serde_json::Error> {
  let items = match value {
    Value::Array(items) => items,
    Value::Object(mut map) => match map.remove("alumni") {
      Some(Value::Array(items)) => items,
      _ => return serde_json::from_value(Value::Object(map)),
    },
    other => return serde_json::from_value(other),
  };
  items.into_iter().map(normalize_record).collect()
}

/// A 404 on `DELETE /bookmarks/{id}` means there was nothing left to remove.
fn removal_outcome(result: Result<(), ClientError>) -> Result<bool, ClientError> {
  match result {
    Ok(()) => Ok(true),
    Err(ClientError::Status { status: 404, .. }) => Ok(false),
    Err(e) => Err(e),
  }
}

// ─── Client ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TokenResponse {
  token:  String,
  claims: SessionClaims,
}

/// Async HTTP client for the SorboNexus REST API.
///
/// Holds the session token of the logged-in account, if any.
#[derive(Clone)]
pub struct ApiClient {
  client:   Client,
  base_url: String,
  token:    Option<String>,
}

impl ApiClient {
  pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self { client, base_url: base_url.into(), token: None })
  }

  pub fn token(&self) -> Option<&str> { self.token.as_deref() }

  #[cfg(test)]
  pub fn with_token(mut self, token: impl Into<String>) -> Self {
    self.token = Some(token.into());
    self
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.base_url.trim_end_matches('/'), path)
  }

  fn auth(&self, req: RequestBuilder) -> RequestBuilder {
    match &self.token {
      Some(token) => req.bearer_auth(token),
      None => req,
    }
  }

  async fn check(resp: Response) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    let message = resp
      .json::<Value>()
      .await
      .ok()
      .and_then(|v| v.get("error")?.as_str().map(str::to_owned))
      .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_owned());
    Err(ClientError::Status { status: status.as_u16(), message })
  }

  // ── Session ───────────────────────────────────────────────────────────────

  /// `POST /api/auth/login`: keeps the returned token for later calls.
  pub async fn login(&mut self, email: &str, password: &str) -> Result<SessionClaims, ClientError> {
    let resp = self
      .client
      .post(self.url("/auth/login"))
      .json(&serde_json::json!({ "email": email, "password": password }))
      .send()
      .await?;
    let body: TokenResponse = Self::check(resp).await?.json().await?;
    tracing::info!(user_id = %body.claims.id, "logged in");
    self.token = Some(body.token);
    Ok(body.claims)
  }

  /// `POST /api/auth/logout`. The local token is dropped even if the server
  /// call fails.
  pub async fn logout(&mut self) -> Result<(), ClientError> {
    let Some(token) = self.token.take() else {
      return Ok(());
    };
    let resp = self
      .client
      .post(self.url("/auth/logout"))
      .bearer_auth(token)
      .send()
      .await?;
    Self::check(resp).await?;
    Ok(())
  }

  // ── Profiles ──────────────────────────────────────────────────────────────

  /// `PUT /api/alumni/{id}`
  pub async fn update_profile(
    &self,
    id: Uuid,
    profile: &AlumniProfile,
  ) -> Result<AlumniRecord, ClientError> {
    if self.token.is_none() {
      return Err(ClientError::NotLoggedIn);
    }
    let resp = self
      .auth(self.client.put(self.url(&format!("/alumni/{id}"))))
      .json(profile)
      .send()
      .await?;
    let value: Value = Self::check(resp).await?.json().await?;
    Ok(normalize_record(value)?)
  }
}

// ─── DirectoryBackend impl ───────────────────────────────────────────────────

impl DirectoryBackend for ApiClient {
  type Error = ClientError;

  async fn fetch_alumni(&self) -> Result<Vec<AlumniRecord>, ClientError> {
    let resp = self.auth(self.client.get(self.url("/alumni"))).send().await?;
    let value: Value = Self::check(resp).await?.json().await?;
    Ok(normalize_records(value)?)
  }

  async fn add_bookmark(&self, input: NewBookmark) -> Result<Bookmark, ClientError> {
    let resp = self
      .auth(self.client.post(self.url("/bookmarks")))
      .json(&input)
      .send()
      .await?;
    Ok(Self::check(resp).await?.json().await?)
  }

  async fn remove_bookmark(
    &self,
    item_id: Uuid,
    item_type: BookmarkItemType,
  ) -> Result<bool, ClientError> {
    let resp = self
      .auth(self.client.delete(self.url(&format!("/bookmarks/{item_id}"))))
      .query(&[("itemType", item_type.to_string())])
      .send()
      .await?;
    removal_outcome(Self::check(resp).await.map(|_| ()))
  }

  async fn list_bookmarks(
    &self,
    user_id: Uuid,
    item_type: BookmarkItemType,
  ) -> Result<Vec<Bookmark>, ClientError> {
    let resp = self
      .auth(self.client.get(self.url(&format!("/bookmarks/user/{user_id}"))))
      .query(&[("itemType", item_type.to_string())])
      .send()
      .await?;
    Ok(Self::check(resp).await?.json().await?)
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn envelope_and_underscore_id_are_unwrapped() {
    let record = normalize_record(json!({
      "profile": { "_id": "00000000-0000-0000-0000-000000000003", "name": "Inès" }
    }))
    .unwrap();
    assert_eq!(record.id, Uuid::from_u128(3));
    assert_eq!(record.name, "Inès");
  }

  #[test]
  fn snapshot_shapes() {
    let bare = json!([
      { "id": "00000000-0000-0000-0000-000000000001", "name": "A" },
      { "profile": { "_id": "00000000-0000-0000-0000-000000000002", "name": "B" } }
    ]);
    let records = normalize_records(bare).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].id, Uuid::from_u128(2));

    let wrapped = json!({
      "alumni": [{ "_id": "00000000-0000-0000-0000-000000000009", "name": "C" }]
    });
    assert_eq!(normalize_records(wrapped).unwrap()[0].id, Uuid::from_u128(9));

    assert!(normalize_records(json!({ "name": "no id" })).is_err());
  }

  #[test]
  fn missing_bookmark_counts_as_removed() {
    let not_found = ClientError::Status { status: 404, message: "bookmark not found".into() };
    assert!(!removal_outcome(Err(not_found)).unwrap());
    assert!(removal_outcome(Ok(())).unwrap());

    let forbidden = ClientError::Status { status: 403, message: "forbidden".into() };
    assert!(matches!(
      removal_outcome(Err(forbidden)),
      Err(ClientError::Status { status: 403, .. })
    ));
  }

  #[test]
  fn urls_are_rooted_under_api() {
    let client = ApiClient::new("http://localhost:8080/").unwrap();
    assert_eq!(client.url("/alumni"), "http://localhost:8080/api/alumni");
    assert!(client.token().is_none());
  }

  #[tokio::test]
  async fn profile_update_requires_a_session() {
    let client = ApiClient::new("http://localhost:9").unwrap();
    let err = client
      .update_profile(Uuid::from_u128(1), &AlumniProfile::default())
      .await
      .unwrap_err();
    assert!(matches!(err, ClientError::NotLoggedIn));
  }
}
