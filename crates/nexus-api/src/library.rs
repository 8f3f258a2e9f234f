//! Handlers for the curated library: `/links` and `/resources`.
//! Anyone may list; only administrators may add.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use nexus_core::{
  library::{Link, NewLink, NewResource, Resource},
  store::DirectoryStore,
};

use crate::{AppState, auth::AuthUser, error::ApiError};

fn require(field: &str, value: &str) -> Result<(), ApiError> {
  if value.trim().is_empty() {
    return Err(ApiError::BadRequest(format!("{field} is required")));
  }
  Ok(())
}

/// `GET /links`
pub async fn list_links<S>(State(state): State<AppState<S>>) -> Result<Json<Vec<Link>>, ApiError>
where
  S: DirectoryStore + 'static,
{
  Ok(Json(state.store.list_links().await.map_err(ApiError::store)?))
}

/// `POST /links`
pub async fn create_link<S>(
  State(state): State<AppState<S>>,
  auth: AuthUser,
  Json(body): Json<NewLink>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DirectoryStore + 'static,
{
  auth.require_admin()?;
  require("title", &body.title)?;
  require("url", &body.url)?;
  let link = state.store.add_link(body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(link)))
}

/// `GET /resources`
pub async fn list_resources<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Resource>>, ApiError>
where
  S: DirectoryStore + 'static,
{
  Ok(Json(state.store.list_resources().await.map_err(ApiError::store)?))
}

/// `POST /resources`: `fileUrl` points into the external object store.
pub async fn create_resource<S>(
  State(state): State<AppState<S>>,
  auth: AuthUser,
  Json(body): Json<NewResource>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DirectoryStore + 'static,
{
  auth.require_admin()?;
  require("title", &body.title)?;
  require("fileUrl", &body.file_url)?;
  let resource = state.store.add_resource(body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(resource)))
}
