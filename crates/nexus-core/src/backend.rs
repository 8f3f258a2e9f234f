//! The `DirectoryBackend` trait: the client's view of the CRUD API.
//!
//! Implemented over HTTP by `nexus-cli`. The pipeline in this crate only
//! needs the directory snapshot and the bookmark endpoints.

use std::future::Future;

use uuid::Uuid;

use crate::{
  bookmark::{Bookmark, BookmarkItemType, NewBookmark},
  record::AlumniRecord,
};

/// Remote operations consumed by [`crate::directory::Directory`] and
/// [`crate::bookmark::Bookmarks`].
///
/// Bookmark mutations act on behalf of whichever viewer the implementation
/// is authenticated as.
pub trait DirectoryBackend: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// `GET /api/alumni`: the full, unfiltered snapshot.
  fn fetch_alumni(
    &self,
  ) -> impl Future<Output = Result<Vec<AlumniRecord>, Self::Error>> + Send + '_;

  /// `POST /api/bookmarks`
  fn add_bookmark(
    &self,
    input: NewBookmark,
  ) -> impl Future<Output = Result<Bookmark, Self::Error>> + Send + '_;

  /// `DELETE /api/bookmarks/{item_id}?itemType=`. Returns `false` if the
  /// backend had no such bookmark; that still counts as removed.
  fn remove_bookmark(
    &self,
    item_id: Uuid,
    item_type: BookmarkItemType,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// `GET /api/bookmarks/user/{user_id}?itemType=`
  fn list_bookmarks(
    &self,
    user_id: Uuid,
    item_type: BookmarkItemType,
  ) -> impl Future<Output = Result<Vec<Bookmark>, Self::Error>> + Send + '_;
}
