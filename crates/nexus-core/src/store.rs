//! The `DirectoryStore` trait: the persistence seam of the backend.
//!
//! Implemented by storage backends (e.g. `nexus-store-sqlite`). The REST
//! layer (`nexus-api`) depends on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  account::{NewUser, Session, User},
  bookmark::{Bookmark, BookmarkItemType, NewBookmark},
  library::{Link, NewLink, NewResource, Resource},
  record::{AlumniProfile, AlumniRecord},
};

/// Abstraction over a SorboNexus store backend.
///
/// All methods return `Send` futures so the trait can be used behind `axum`
/// on a multi-threaded tokio runtime.
pub trait DirectoryStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Accounts ──────────────────────────────────────────────────────────

  /// Persist a new account. Fails if the email is already registered.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Case-insensitive lookup by email.
  fn find_user_by_email(
    &self,
    email: String,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  // ── Sessions ──────────────────────────────────────────────────────────

  fn create_session(
    &self,
    session: Session,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_session(
    &self,
    token_hash: String,
  ) -> impl Future<Output = Result<Option<Session>, Self::Error>> + Send + '_;

  /// Returns `false` if there was no such session.
  fn delete_session(
    &self,
    token_hash: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Alumni ────────────────────────────────────────────────────────────

  /// The full directory snapshot, in creation order.
  fn list_alumni(
    &self,
  ) -> impl Future<Output = Result<Vec<AlumniRecord>, Self::Error>> + Send + '_;

  fn get_alumni(
    &self,
    alumni_id: Uuid,
  ) -> impl Future<Output = Result<Option<AlumniRecord>, Self::Error>> + Send + '_;

  /// The profile owned by `user_id`, if any.
  fn find_alumni_by_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<AlumniRecord>, Self::Error>> + Send + '_;

  /// Create a profile. A user may own at most one profile.
  fn create_alumni(
    &self,
    user_id: Option<Uuid>,
    profile: AlumniProfile,
    is_admin: bool,
  ) -> impl Future<Output = Result<AlumniRecord, Self::Error>> + Send + '_;

  /// Replace the editable fields of a profile. Returns `None` if absent.
  fn update_alumni(
    &self,
    alumni_id: Uuid,
    profile: AlumniProfile,
  ) -> impl Future<Output = Result<Option<AlumniRecord>, Self::Error>> + Send + '_;

  /// Delete a profile together with its schools, grades and the bookmarks
  /// pointing at it. Returns `false` if absent.
  fn delete_alumni(
    &self,
    alumni_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Library ───────────────────────────────────────────────────────────

  fn list_links(&self) -> impl Future<Output = Result<Vec<Link>, Self::Error>> + Send + '_;

  fn add_link(
    &self,
    input: NewLink,
  ) -> impl Future<Output = Result<Link, Self::Error>> + Send + '_;

  fn list_resources(
    &self,
  ) -> impl Future<Output = Result<Vec<Resource>, Self::Error>> + Send + '_;

  fn add_resource(
    &self,
    input: NewResource,
  ) -> impl Future<Output = Result<Resource, Self::Error>> + Send + '_;

  // ── Bookmarks ─────────────────────────────────────────────────────────

  /// Bookmark an item. Adding an existing bookmark returns the stored one.
  fn add_bookmark(
    &self,
    user_id: Uuid,
    input: NewBookmark,
  ) -> impl Future<Output = Result<Bookmark, Self::Error>> + Send + '_;

  /// Returns `false` if the bookmark did not exist.
  fn remove_bookmark(
    &self,
    user_id: Uuid,
    item_id: Uuid,
    item_type: BookmarkItemType,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// A user's bookmarks, optionally restricted to one item type, oldest
  /// first.
  fn list_bookmarks(
    &self,
    user_id: Uuid,
    item_type: Option<BookmarkItemType>,
  ) -> impl Future<Output = Result<Vec<Bookmark>, Self::Error>> + Send + '_;
}
