//! Router tests over an in-memory SQLite store.

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
};
use chrono::Duration;
use nexus_core::session::decode_claims;
use nexus_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::{AppState, AuthConfig, api_router};

async fn make_state(auth: AuthConfig) -> AppState<SqliteStore> {
  let store = SqliteStore::open_in_memory().await.unwrap();
  AppState::new(store, auth)
}

async fn default_state() -> AppState<SqliteStore> {
  make_state(AuthConfig {
    admin_emails: vec!["admin@sorbonne.fr".into()],
    ..Default::default()
  })
  .await
}

async fn send(
  state: &AppState<SqliteStore>,
  method: &str,
  uri: &str,
  token: Option<&str>,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(token) = token {
    builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
  }
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  let resp = api_router(state.clone())
    .oneshot(builder.body(body).unwrap())
    .await
    .unwrap();

  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
  };
  (status, value)
}

/// Register an account and return its token.
async fn register(state: &AppState<SqliteStore>, email: &str, name: Option<&str>) -> String {
  let (status, body) = send(
    state,
    "POST",
    "/auth/register",
    None,
    Some(json!({ "email": email, "password": "motdepasse", "name": name })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  body["token"].as_str().unwrap().to_owned()
}

// ── Accounts ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn register_login_me_logout() {
  let state = default_state().await;
  let token = register(&state, "marie@sorbonne.fr", Some("Marie")).await;
  let claims = decode_claims(&token).unwrap();
  assert!(claims.alumni_id.is_some());
  assert!(!claims.is_admin);

  let (status, body) = send(&state, "GET", "/auth/me", Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["id"], json!(claims.id));
  assert_eq!(body["alumniId"], json!(claims.alumni_id));

  let (status, body) = send(
    &state,
    "POST",
    "/auth/login",
    None,
    Some(json!({ "email": "MARIE@sorbonne.fr", "password": "motdepasse" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  let second = body["token"].as_str().unwrap().to_owned();

  let (status, _) = send(&state, "POST", "/auth/logout", Some(&token), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (status, _) = send(&state, "GET", "/auth/me", Some(&token), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  // Other sessions of the same user survive.
  let (status, _) = send(&state, "GET", "/auth/me", Some(&second), None).await;
  assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn bad_credentials_and_duplicates() {
  let state = default_state().await;
  register(&state, "a@b.fr", None).await;

  let (status, body) = send(
    &state,
    "POST",
    "/auth/login",
    None,
    Some(json!({ "email": "a@b.fr", "password": "nope-nope" })),
  )
  .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert!(body["error"].is_string());

  let (status, _) = send(
    &state,
    "POST",
    "/auth/register",
    None,
    Some(json!({ "email": "A@B.fr", "password": "motdepasse" })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (status, _) = send(
    &state,
    "POST",
    "/auth/register",
    None,
    Some(json!({ "email": "c@d.fr", "password": "court" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn forged_and_expired_tokens_are_rejected() {
  let state = make_state(AuthConfig {
    session_ttl: Duration::seconds(-1),
    ..Default::default()
  })
  .await;
  let token = register(&state, "a@b.fr", None).await;
  let (status, _) = send(&state, "GET", "/auth/me", Some(&token), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let state = default_state().await;
  let token = register(&state, "a@b.fr", None).await;
  let (claims, _) = token.split_once('.').unwrap();
  let forged = format!("{claims}.{}", "0".repeat(64));
  let (status, _) = send(&state, "GET", "/auth/me", Some(&forged), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  let (status, _) = send(&state, "GET", "/auth/me", None, None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ── Alumni ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn profile_create_and_conflict() {
  let state = default_state().await;
  let (status, _) = send(&state, "POST", "/alumni", None, Some(json!({ "name": "X" }))).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let token = register(&state, "a@b.fr", None).await;
  let body = json!({ "name": " " });
  let (status, _) = send(&state, "POST", "/alumni", Some(&token), Some(body)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, body) = send(
    &state,
    "POST",
    "/alumni",
    Some(&token),
    Some(json!({
      "name": "Alice",
      "field": ["Physique"],
      "schoolsApplied": [{ "name": "Sorbonne Université", "status": "accepted" }]
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  let id = body["id"].as_str().unwrap().to_owned();

  let (status, body) = send(&state, "GET", &format!("/alumni/{id}"), None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["schoolsApplied"][0]["status"], "accepted");

  let body = json!({ "name": "Again" });
  let (status, _) = send(&state, "POST", "/alumni", Some(&token), Some(body)).await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (status, _) = send(&state, "GET", &format!("/alumni/{}", Uuid::new_v4()), None, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn snapshot_includes_hidden_records() {
  let state = default_state().await;
  let token = register(&state, "a@b.fr", Some("Alice")).await;
  let alumni_id = decode_claims(&token).unwrap().alumni_id.unwrap();
  send(
    &state,
    "PUT",
    &format!("/alumni/{alumni_id}"),
    Some(&token),
    Some(json!({ "name": "Alice", "hidden": true })),
  )
  .await;

  let (status, body) = send(&state, "GET", "/alumni", None, None).await;
  assert_eq!(status, StatusCode::OK);
  let list = body.as_array().unwrap();
  assert_eq!(list.len(), 1);
  assert_eq!(list[0]["hidden"], true);
}

#[tokio::test]
async fn only_owner_or_admin_may_edit() {
  let state = default_state().await;
  let owner = register(&state, "owner@b.fr", Some("Owner")).await;
  let other = register(&state, "other@b.fr", Some("Other")).await;
  let admin = register(&state, "admin@sorbonne.fr", None).await;
  assert!(decode_claims(&admin).unwrap().is_admin);

  let id = decode_claims(&owner).unwrap().alumni_id.unwrap();
  let uri = format!("/alumni/{id}");
  let edit = json!({ "name": "Owner Renamed", "position": "Doctorante" });

  let (status, _) = send(&state, "PUT", &uri, Some(&other), Some(edit.clone())).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, body) = send(&state, "PUT", &uri, Some(&owner), Some(edit)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["position"], "Doctorante");

  let (status, _) = send(&state, "DELETE", &uri, Some(&other), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  let (status, _) = send(&state, "DELETE", &uri, Some(&admin), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (status, _) = send(&state, "GET", &uri, None, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Library ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn library_writes_are_admin_only() {
  let state = default_state().await;
  let user = register(&state, "a@b.fr", None).await;
  let admin = register(&state, "admin@sorbonne.fr", None).await;
  let link = json!({ "title": "BU Sciences", "url": "https://bu.sorbonne-universite.fr" });

  let (status, _) = send(&state, "POST", "/links", Some(&user), Some(link.clone())).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  let (status, _) = send(&state, "POST", "/links", Some(&admin), Some(link)).await;
  assert_eq!(status, StatusCode::CREATED);

  let (status, _) = send(
    &state,
    "POST",
    "/resources",
    Some(&admin),
    Some(json!({ "title": "Guide", "fileUrl": "https://files.example.org/guide.pdf" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);

  let (_, links) = send(&state, "GET", "/links", None, None).await;
  assert_eq!(links.as_array().unwrap().len(), 1);
  let (_, resources) = send(&state, "GET", "/resources", None, None).await;
  assert_eq!(resources[0]["fileUrl"], "https://files.example.org/guide.pdf");
}

// ── Bookmarks ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn bookmark_lifecycle() {
  let state = default_state().await;
  let token = register(&state, "a@b.fr", None).await;
  let user_id = decode_claims(&token).unwrap().id;
  let item = Uuid::new_v4();
  let body = json!({ "itemId": item, "itemType": "alumni" });

  let (status, first) = send(&state, "POST", "/bookmarks", Some(&token), Some(body.clone())).await;
  assert_eq!(status, StatusCode::CREATED);
  let (status, second) = send(&state, "POST", "/bookmarks", Some(&token), Some(body)).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(first["bookmarkId"], second["bookmarkId"]);

  let (status, list) = send(
    &state,
    "GET",
    &format!("/bookmarks/user/{user_id}?itemType=alumni"),
    Some(&token),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(list.as_array().unwrap().len(), 1);

  let (_, links) = send(
    &state,
    "GET",
    &format!("/bookmarks/user/{user_id}?itemType=link"),
    Some(&token),
    None,
  )
  .await;
  assert!(links.as_array().unwrap().is_empty());

  let uri = format!("/bookmarks/{item}?itemType=video");
  let (status, _) = send(&state, "DELETE", &uri, Some(&token), None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let uri = format!("/bookmarks/{item}?itemType=alumni");
  let (status, _) = send(&state, "DELETE", &uri, Some(&token), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (status, _) = send(&state, "DELETE", &uri, Some(&token), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bookmarks_of_others_are_private() {
  let state = default_state().await;
  let alice = register(&state, "alice@b.fr", None).await;
  let bob = register(&state, "bob@b.fr", None).await;
  let admin = register(&state, "admin@sorbonne.fr", None).await;
  let alice_id = decode_claims(&alice).unwrap().id;
  let uri = format!("/bookmarks/user/{alice_id}");

  let (status, _) = send(&state, "GET", &uri, Some(&bob), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  let (status, _) = send(&state, "GET", &uri, Some(&admin), None).await;
  assert_eq!(status, StatusCode::OK);
  let (status, _) = send(&state, "GET", &uri, None, None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}
