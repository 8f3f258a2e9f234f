//! The search/filter predicate applied to visible records.

use uuid::Uuid;

use crate::{
  bookmark::{BookmarkItemType, BookmarkSet},
  record::AlumniRecord,
};

/// User-controlled inputs that narrow the directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryFilter {
  /// Free-text query; blank matches everything.
  pub query:         String,
  /// Selected domain chips. A record must carry *all* of them.
  pub domains:       Vec<String>,
  /// Only show alumni the viewer has bookmarked.
  pub bookmark_only: bool,
}

impl DirectoryFilter {
  /// Add `domain` if absent, remove it if present.
  pub fn toggle_domain(&mut self, domain: &str) {
    if let Some(pos) = self.domains.iter().position(|d| d == domain) {
      self.domains.remove(pos);
    } else {
      self.domains.push(domain.to_owned());
    }
  }

  pub fn matches(&self, record: &AlumniRecord, bookmarks: &BookmarkSet) -> bool {
    matches(record, &self.query, &self.domains, self.bookmark_only, bookmarks)
  }
}

/// The full inclusion test: text AND domains AND bookmark.
pub fn matches(
  record: &AlumniRecord,
  query: &str,
  selected_domains: &[String],
  bookmark_only: bool,
  bookmarks: &BookmarkSet,
) -> bool {
  matches_text(record, query)
    && matches_domains(record, selected_domains)
    && matches_bookmark(record.id, bookmark_only, bookmarks)
}

/// Case-insensitive substring search over the searchable fields. Only
/// accepted schools are searchable.
pub fn matches_text(record: &AlumniRecord, query: &str) -> bool {
  let needle = query.trim().to_lowercase();
  if needle.is_empty() {
    return true;
  }
  let hit = |s: &str| s.to_lowercase().contains(&needle);

  hit(&record.name)
    || hit(&record.position)
    || hit(&record.degree)
    || record.field.iter().any(|f| hit(f))
    || hit(&record.avatar)
    || record.future_goals.as_deref().is_some_and(hit)
    || record.annee_fin_l3.as_deref().is_some_and(hit)
    || record.accepted_schools().any(hit)
}

/// Every selected domain must appear in at least one of the record's tags.
pub fn matches_domains(record: &AlumniRecord, selected_domains: &[String]) -> bool {
  selected_domains.iter().all(|domain| {
    let domain = domain.to_lowercase();
    record
      .field
      .iter()
      .any(|tag| tag.to_lowercase().contains(&domain))
  })
}

pub fn matches_bookmark(id: Uuid, bookmark_only: bool, bookmarks: &BookmarkSet) -> bool {
  !bookmark_only || bookmarks.contains(id, BookmarkItemType::Alumni)
}
