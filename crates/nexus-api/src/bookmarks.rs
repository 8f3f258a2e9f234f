//! Handlers for `/bookmarks` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/bookmarks` | Body: `{"itemId","itemType"}`; 201, idempotent |
//! | `DELETE` | `/bookmarks/{itemId}?itemType=` | 404 if not bookmarked |
//! | `GET`    | `/bookmarks/user/{userId}[?itemType=]` | Self or admin only |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use nexus_core::{
  bookmark::{Bookmark, BookmarkItemType, NewBookmark},
  store::DirectoryStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, auth::AuthUser, error::ApiError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemTypeParams {
  pub item_type: Option<String>,
}

impl ItemTypeParams {
  fn parse(&self) -> Result<Option<BookmarkItemType>, ApiError> {
    Ok(
      self
        .item_type
        .as_deref()
        .map(BookmarkItemType::parse)
        .transpose()?,
    )
  }
}

/// `POST /bookmarks`
pub async fn add<S>(
  State(state): State<AppState<S>>,
  auth: AuthUser,
  Json(body): Json<NewBookmark>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DirectoryStore + 'static,
{
  let bookmark = state
    .store
    .add_bookmark(auth.user.user_id, body)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(bookmark)))
}

/// `DELETE /bookmarks/{itemId}?itemType=`
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  auth: AuthUser,
  Path(item_id): Path<Uuid>,
  Query(params): Query<ItemTypeParams>,
) -> Result<StatusCode, ApiError>
where
  S: DirectoryStore + 'static,
{
  let item_type = params
    .parse()?
    .ok_or_else(|| ApiError::BadRequest("itemType is required".into()))?;

  let removed = state
    .store
    .remove_bookmark(auth.user.user_id, item_id, item_type)
    .await
    .map_err(ApiError::store)?;
  if !removed {
    return Err(ApiError::NotFound(format!("no {item_type} bookmark on {item_id}")));
  }
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /bookmarks/user/{userId}[?itemType=]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  auth: AuthUser,
  Path(user_id): Path<Uuid>,
  Query(params): Query<ItemTypeParams>,
) -> Result<Json<Vec<Bookmark>>, ApiError>
where
  S: DirectoryStore + 'static,
{
  if auth.viewer.viewer_id != user_id && !auth.viewer.is_admin {
    return Err(ApiError::Forbidden("cannot read another user's bookmarks".into()));
  }

  let bookmarks = state
    .store
    .list_bookmarks(user_id, params.parse()?)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(bookmarks))
}
