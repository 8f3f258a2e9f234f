//! Handlers for `/alumni` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/alumni` | Full snapshot, creation order, no filtering |
//! | `POST`   | `/alumni` | Creates the caller's own profile; 409 if one exists |
//! | `GET`    | `/alumni/{id}` | 404 if not found |
//! | `PUT`    | `/alumni/{id}` | Owner or admin |
//! | `DELETE` | `/alumni/{id}` | Owner or admin |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use nexus_core::{
  record::{AlumniProfile, AlumniRecord},
  store::DirectoryStore,
};
use uuid::Uuid;

use crate::{AppState, auth::AuthUser, error::ApiError};

fn validate(profile: &AlumniProfile) -> Result<(), ApiError> {
  if profile.name.trim().is_empty() {
    return Err(ApiError::BadRequest("name is required".into()));
  }
  if profile.grades.iter().any(|g| !g.value.is_finite()) {
    return Err(ApiError::BadRequest("grades must be finite numbers".into()));
  }
  Ok(())
}

async fn load<S>(store: &S, id: Uuid) -> Result<AlumniRecord, ApiError>
where
  S: DirectoryStore,
{
  store
    .get_alumni(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("alumni {id} not found")))
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /alumni`
pub async fn list<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<AlumniRecord>>, ApiError>
where
  S: DirectoryStore + 'static,
{
  let alumni = state.store.list_alumni().await.map_err(ApiError::store)?;
  Ok(Json(alumni))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /alumni/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<AlumniRecord>, ApiError>
where
  S: DirectoryStore + 'static,
{
  Ok(Json(load(state.store.as_ref(), id).await?))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /alumni`: returns 201 + the stored record.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  auth: AuthUser,
  Json(profile): Json<AlumniProfile>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DirectoryStore + 'static,
{
  validate(&profile)?;
  if auth.viewer.alumni_id.is_some() {
    return Err(ApiError::Conflict("a profile already exists for this account".into()));
  }

  let record = state
    .store
    .create_alumni(Some(auth.user.user_id), profile, auth.user.is_admin)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(alumni_id = %record.id, user_id = %auth.user.user_id, "profile created");
  Ok((StatusCode::CREATED, Json(record)))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /alumni/{id}`: body is the full editable profile.
pub async fn update<S>(
  State(state): State<AppState<S>>,
  auth: AuthUser,
  Path(id): Path<Uuid>,
  Json(profile): Json<AlumniProfile>,
) -> Result<Json<AlumniRecord>, ApiError>
where
  S: DirectoryStore + 'static,
{
  validate(&profile)?;
  let existing = load(state.store.as_ref(), id).await?;
  if !auth.can_edit(&existing) {
    return Err(ApiError::Forbidden("not your profile".into()));
  }

  let record = state
    .store
    .update_alumni(id, profile)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("alumni {id} not found")))?;
  tracing::info!(alumni_id = %id, hidden = record.hidden, "profile updated");
  Ok(Json(record))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /alumni/{id}`
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  auth: AuthUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: DirectoryStore + 'static,
{
  let existing = load(state.store.as_ref(), id).await?;
  if !auth.can_edit(&existing) {
    return Err(ApiError::Forbidden("not your profile".into()));
  }

  let deleted = state.store.delete_alumni(id).await.map_err(ApiError::store)?;
  if !deleted {
    return Err(ApiError::NotFound(format!("alumni {id} not found")));
  }
  tracing::info!(alumni_id = %id, "profile deleted");
  Ok(StatusCode::NO_CONTENT)
}
