//! Bookmarks and the viewer-scoped bookmark aggregator.
//!
//! The aggregator only changes its local set after the backend has confirmed
//! the mutation, so there is never anything to roll back.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator as _, IntoStaticStr};
use uuid::Uuid;

use crate::{
  Error, Result, backend::DirectoryBackend, session::ViewerContext,
};

// ─── Item type ───────────────────────────────────────────────────────────────

/// The kind of item a bookmark points at. String forms match the wire
/// protocol (`itemType=alumni|ressource|link`).
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BookmarkItemType {
  Alumni,
  Ressource,
  Link,
}

impl BookmarkItemType {
  /// Parse the wire form, mapping failures to [`Error::UnknownItemType`].
  pub fn parse(s: &str) -> Result<Self> {
    s.parse().map_err(|_| Error::UnknownItemType(s.to_owned()))
  }
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// A persisted bookmark as returned by the bookmark API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
  pub bookmark_id: Uuid,
  pub user_id:     Uuid,
  pub item_id:     Uuid,
  pub item_type:   BookmarkItemType,
  pub created_at:  DateTime<Utc>,
}

/// Body of `POST /api/bookmarks`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBookmark {
  pub item_id:   Uuid,
  pub item_type: BookmarkItemType,
}

// ─── BookmarkSet ─────────────────────────────────────────────────────────────

/// Bookmarked item ids, partitioned by item type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookmarkSet {
  items: HashMap<BookmarkItemType, HashSet<Uuid>>,
}

impl BookmarkSet {
  pub fn new() -> Self { Self::default() }

  pub fn contains(&self, item_id: Uuid, item_type: BookmarkItemType) -> bool {
    self
      .items
      .get(&item_type)
      .is_some_and(|ids| ids.contains(&item_id))
  }

  pub fn insert(&mut self, item_id: Uuid, item_type: BookmarkItemType) -> bool {
    self.items.entry(item_type).or_default().insert(item_id)
  }

  pub fn remove(&mut self, item_id: Uuid, item_type: BookmarkItemType) -> bool {
    self
      .items
      .get_mut(&item_type)
      .is_some_and(|ids| ids.remove(&item_id))
  }

  pub fn len(&self) -> usize { self.items.values().map(HashSet::len).sum() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  pub fn clear(&mut self) { self.items.clear() }
}

// ─── Aggregator ──────────────────────────────────────────────────────────────

/// The current viewer's bookmarks, kept in sync with a [`DirectoryBackend`].
#[derive(Debug, Clone, Default)]
pub struct Bookmarks {
  viewer: Option<ViewerContext>,
  set:    BookmarkSet,
}

impl Bookmarks {
  pub fn new() -> Self { Self::default() }

  pub fn viewer(&self) -> Option<&ViewerContext> { self.viewer.as_ref() }

  /// Switch viewers. Any change of identity (login, logout, another account)
  /// drops the cached set; call [`Bookmarks::refresh`] afterwards.
  pub fn set_viewer(&mut self, viewer: Option<ViewerContext>) {
    if self.viewer.map(|v| v.viewer_id) != viewer.map(|v| v.viewer_id) {
      self.set.clear();
    }
    self.viewer = viewer;
  }

  pub fn set(&self) -> &BookmarkSet { &self.set }

  pub fn is_bookmarked(&self, item_id: Uuid, item_type: BookmarkItemType) -> bool {
    self.set.contains(item_id, item_type)
  }

  /// Flip the bookmark on `(item_id, item_type)` and return the new
  /// membership. The local set is left untouched if the backend fails.
  pub async fn toggle<B>(
    &mut self,
    backend: &B,
    item_id: Uuid,
    item_type: BookmarkItemType,
  ) -> Result<bool>
  where
    B: DirectoryBackend,
  {
    if self.viewer.is_none() {
      return Err(Error::Unauthenticated);
    }

    if self.set.contains(item_id, item_type) {
      // Already gone server-side (e.g. the profile was deleted) is a removal too.
      backend
        .remove_bookmark(item_id, item_type)
        .await
        .map_err(Error::backend)?;
      self.set.remove(item_id, item_type);
      Ok(false)
    } else {
      backend
        .add_bookmark(NewBookmark { item_id, item_type })
        .await
        .map_err(Error::backend)?;
      self.set.insert(item_id, item_type);
      Ok(true)
    }
  }

  /// Re-fetch every item type and replace the cached set wholesale. If any
  /// fetch fails the previous set is kept.
  pub async fn refresh<B>(&mut self, backend: &B) -> Result<()>
  where
    B: DirectoryBackend,
  {
    let Some(viewer) = self.viewer else {
      self.set.clear();
      return Ok(());
    };

    let mut fresh = BookmarkSet::new();
    for item_type in BookmarkItemType::iter() {
      let bookmarks = backend
        .list_bookmarks(viewer.viewer_id, item_type)
        .await
        .map_err(Error::backend)?;
      // Trust the requested partition over the echoed item type.
      for b in bookmarks {
        fresh.insert(b.item_id, item_type);
      }
    }

    self.set = fresh;
    Ok(())
  }
}
