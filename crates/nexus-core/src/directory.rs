//! The alumni directory store: the in-memory snapshot plus the view state
//! (filter, shuffle, page) used to render it.
//!
//! Fetches are sequenced. [`Directory::begin_fetch`] hands out a ticket and
//! only the most recently issued ticket may replace the snapshot, so an older
//! response that resolves late is dropped instead of overwriting newer data.

use std::collections::BTreeSet;

use rand::{Rng, SeedableRng as _, rngs::StdRng};

use crate::{
  backend::DirectoryBackend,
  bookmark::BookmarkSet,
  filter::DirectoryFilter,
  page::{PAGE_SIZE, page_count, paginate},
  policy::{DirectoryPolicy, is_visible},
  record::AlumniRecord,
  session::ViewerContext,
};

// ─── Pipeline ────────────────────────────────────────────────────────────────

/// Visible records that pass `filter`, with the viewer's own record added
/// back if the filter dropped it. Snapshot order is preserved.
pub fn select<'a>(
  snapshot: &'a [AlumniRecord],
  filter: &DirectoryFilter,
  bookmarks: &BookmarkSet,
  viewer: Option<&ViewerContext>,
) -> Vec<&'a AlumniRecord> {
  let mut selected: Vec<&AlumniRecord> = snapshot
    .iter()
    .filter(|r| is_visible(r, viewer) && filter.matches(r, bookmarks))
    .collect();

  if let Some(v) = viewer
    && let Some(own) = snapshot.iter().find(|r| v.owns(r))
    && !selected.iter().any(|r| r.id == own.id)
  {
    selected.insert(0, own);
  }

  selected
}

/// [`select`] followed by the deterministic policy order.
pub fn arrange<'a>(
  snapshot: &'a [AlumniRecord],
  filter: &DirectoryFilter,
  bookmarks: &BookmarkSet,
  viewer: Option<&ViewerContext>,
  policy: &DirectoryPolicy,
) -> Vec<&'a AlumniRecord> {
  policy.order(select(snapshot, filter, bookmarks, viewer), viewer)
}

// ─── Fetch sequencing ────────────────────────────────────────────────────────

/// Handed out by [`Directory::begin_fetch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct FetchTicket(u64);

/// What [`Directory::complete_fetch`] did with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
  /// The snapshot was replaced; carries the new record count.
  Applied(usize),
  /// A newer fetch was started since; the response was ignored.
  Stale,
  /// The fetch failed; the previous snapshot was kept.
  Failed,
}

// ─── Page ────────────────────────────────────────────────────────────────────

/// One rendered page of the directory.
#[derive(Debug, Clone)]
pub struct DirectoryPage<'a> {
  pub items:      Vec<&'a AlumniRecord>,
  /// 1-indexed.
  pub page:       usize,
  pub page_count: usize,
  /// Records across all pages.
  pub total:      usize,
}

// ─── Directory ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Directory {
  policy:       DirectoryPolicy,
  snapshot:     Vec<AlumniRecord>,
  filter:       DirectoryFilter,
  /// Seed of the active shuffled order; `None` means the default order.
  shuffle_seed: Option<u64>,
  page:         usize,
  page_size:    usize,
  issued:       u64,
  loading:      bool,
  error:        Option<String>,
}

impl Directory {
  pub fn new(policy: DirectoryPolicy) -> Self {
    Self {
      policy,
      snapshot: Vec::new(),
      filter: DirectoryFilter::default(),
      shuffle_seed: None,
      page: 1,
      page_size: PAGE_SIZE,
      issued: 0,
      loading: false,
      error: None,
    }
  }

  pub fn with_page_size(mut self, page_size: usize) -> Self {
    self.page_size = page_size.max(1);
    self
  }

  // ── Accessors ─────────────────────────────────────────────────────────────

  pub fn snapshot(&self) -> &[AlumniRecord] { &self.snapshot }

  pub fn policy(&self) -> &DirectoryPolicy { &self.policy }

  pub fn filter(&self) -> &DirectoryFilter { &self.filter }

  pub fn page(&self) -> usize { self.page }

  pub fn is_loading(&self) -> bool { self.loading }

  pub fn is_shuffled(&self) -> bool { self.shuffle_seed.is_some() }

  /// Message of the last failed fetch, cleared by the next successful one.
  pub fn error(&self) -> Option<&str> { self.error.as_deref() }

  pub fn get(&self, id: uuid::Uuid) -> Option<&AlumniRecord> {
    self.snapshot.iter().find(|r| r.id == id)
  }

  /// Distinct domain tags across the snapshot, sorted.
  pub fn domains(&self) -> Vec<String> {
    self
      .snapshot
      .iter()
      .flat_map(|r| r.field.iter().map(|f| f.trim()))
      .filter(|f| !f.is_empty())
      .map(str::to_owned)
      .collect::<BTreeSet<_>>()
      .into_iter()
      .collect()
  }

  // ── Fetching ──────────────────────────────────────────────────────────────

  pub fn begin_fetch(&mut self) -> FetchTicket {
    self.issued += 1;
    self.loading = true;
    FetchTicket(self.issued)
  }

  pub fn complete_fetch<E>(
    &mut self,
    ticket: FetchTicket,
    result: Result<Vec<AlumniRecord>, E>,
  ) -> FetchOutcome
  where
    E: std::fmt::Display,
  {
    if ticket.0 != self.issued {
      return FetchOutcome::Stale;
    }
    self.loading = false;

    match result {
      Ok(records) => {
        let count = records.len();
        self.snapshot = records;
        self.error = None;
        self.shuffle_seed = None;
        self.page = self.page.min(page_count(count, self.page_size));
        FetchOutcome::Applied(count)
      }
      Err(e) => {
        self.error = Some(e.to_string());
        FetchOutcome::Failed
      }
    }
  }

  /// Fetch a fresh snapshot from `backend`.
  pub async fn refresh<B>(&mut self, backend: &B) -> FetchOutcome
  where
    B: DirectoryBackend,
  {
    let ticket = self.begin_fetch();
    let result = backend.fetch_alumni().await;
    self.complete_fetch(ticket, result)
  }

  // ── Filter inputs ─────────────────────────────────────────────────────────

  /// Any change to the filter drops the shuffled order and returns to page 1.
  pub fn set_filter(&mut self, filter: DirectoryFilter) {
    if filter != self.filter {
      self.filter = filter;
      self.filter_changed();
    }
  }

  pub fn set_query(&mut self, query: impl Into<String>) {
    let query = query.into();
    if query != self.filter.query {
      self.filter.query = query;
      self.filter_changed();
    }
  }

  pub fn toggle_domain(&mut self, domain: &str) {
    self.filter.toggle_domain(domain);
    self.filter_changed();
  }

  pub fn clear_domains(&mut self) {
    if !self.filter.domains.is_empty() {
      self.filter.domains.clear();
      self.filter_changed();
    }
  }

  pub fn set_bookmark_only(&mut self, bookmark_only: bool) {
    if bookmark_only != self.filter.bookmark_only {
      self.filter.bookmark_only = bookmark_only;
      self.filter_changed();
    }
  }

  fn filter_changed(&mut self) {
    self.shuffle_seed = None;
    self.page = 1;
  }

  // ── Ordering ──────────────────────────────────────────────────────────────

  /// Switch to a freshly shuffled order.
  pub fn shuffle<R>(&mut self, rng: &mut R)
  where
    R: Rng + ?Sized,
  {
    self.shuffle_seed = Some(rng.r#gen());
    self.page = 1;
  }

  /// Return to the deterministic order.
  pub fn reset_order(&mut self) { self.shuffle_seed = None }

  // ── Views ─────────────────────────────────────────────────────────────────

  /// The full ordered list for `viewer`.
  pub fn view(
    &self,
    viewer: Option<&ViewerContext>,
    bookmarks: &BookmarkSet,
  ) -> Vec<&AlumniRecord> {
    match self.shuffle_seed {
      None => arrange(&self.snapshot, &self.filter, bookmarks, viewer, &self.policy),
      Some(seed) => {
        let selected = select(&self.snapshot, &self.filter, bookmarks, viewer);
        let mut rng = StdRng::seed_from_u64(seed);
        self.policy.shuffle(selected, viewer, &mut rng)
      }
    }
  }

  /// The current page of [`Directory::view`].
  pub fn current_page(
    &self,
    viewer: Option<&ViewerContext>,
    bookmarks: &BookmarkSet,
  ) -> DirectoryPage<'_> {
    let all = self.view(viewer, bookmarks);
    DirectoryPage {
      items:      paginate(&all, self.page_size, self.page).to_vec(),
      page:       self.page,
      page_count: page_count(all.len(), self.page_size),
      total:      all.len(),
    }
  }

  // ── Paging ────────────────────────────────────────────────────────────────

  pub fn set_page(&mut self, page: usize) { self.page = page.max(1) }

  pub fn next_page(&mut self, total: usize) {
    if self.page < page_count(total, self.page_size) {
      self.page += 1;
    }
  }

  pub fn prev_page(&mut self) {
    if self.page > 1 {
      self.page -= 1;
    }
  }
}

impl Default for Directory {
  fn default() -> Self { Self::new(DirectoryPolicy::default()) }
}

#[cfg(test)]
mod tests {
  use rand::{SeedableRng as _, rngs::StdRng};
  use uuid::Uuid;

  use crate::{
    backend::testing::FakeBackend,
    bookmark::BookmarkItemType,
    record::SchoolApplication,
  };

  use super::*;

  fn rec(id: u128, name: &str) -> AlumniRecord {
    AlumniRecord::new(Uuid::from_u128(id), name)
  }

  fn ids(records: &[&AlumniRecord]) -> Vec<u128> {
    records.iter().map(|r| r.id.as_u128()).collect()
  }

  fn me() -> ViewerContext {
    ViewerContext {
      viewer_id: Uuid::from_u128(900),
      alumni_id: Some(Uuid::from_u128(3)),
      is_admin:  false,
    }
  }

  fn snapshot() -> Vec<AlumniRecord> {
    let mut physicist = rec(1, "Paul");
    physicist.field = vec!["Physique".into()];
    let mut chemist = rec(2, "Chloé");
    chemist.field = vec!["Physique".into(), "Chimie".into()];
    chemist.is_admin = true;
    let mut own = rec(3, "Moi");
    own.hidden = true;
    own.field = vec!["Biologie".into()];
    let mut hidden = rec(4, "Invisible");
    hidden.hidden = true;
    let mut graduate = rec(5, "Sarah");
    graduate.schools_applied = vec![SchoolApplication::accepted("Sorbonne")];
    vec![physicist, chemist, own, hidden, graduate]
  }

  fn loaded() -> Directory {
    let mut dir = Directory::default();
    let ticket = dir.begin_fetch();
    let outcome = dir.complete_fetch(ticket, Ok::<_, String>(snapshot()));
    assert_eq!(outcome, FetchOutcome::Applied(5));
    dir
  }

  #[test]
  fn own_record_survives_every_filter() {
    let mut dir = loaded();
    let bookmarks = BookmarkSet::new();
    let viewer = me();

    for filter in [
      DirectoryFilter::default(),
      DirectoryFilter { query: "sorbonne".into(), ..Default::default() },
      DirectoryFilter { domains: vec!["Chimie".into()], ..Default::default() },
      DirectoryFilter { bookmark_only: true, ..Default::default() },
      DirectoryFilter { query: "zzz".into(), domains: vec!["X".into()], bookmark_only: true },
    ] {
      dir.set_filter(filter);
      let view = dir.view(Some(&viewer), &bookmarks);
      assert_eq!(view[0].id.as_u128(), 3);
    }
  }

  #[test]
  fn hidden_records_are_dropped_for_plain_viewers() {
    let dir = loaded();
    let bookmarks = BookmarkSet::new();
    assert_eq!(ids(&dir.view(Some(&me()), &bookmarks)), [3, 2, 1, 5]);
    assert_eq!(ids(&dir.view(None, &bookmarks)), [2, 1, 5]);

    let admin = ViewerContext { viewer_id: Uuid::from_u128(1), alumni_id: None, is_admin: true };
    assert_eq!(ids(&dir.view(Some(&admin), &bookmarks)), [2, 1, 3, 4, 5]);
  }

  #[test]
  fn domain_and_bookmark_filters() {
    let mut dir = loaded();
    let mut bookmarks = BookmarkSet::new();
    dir.toggle_domain("Physique");
    dir.toggle_domain("Chimie");
    assert_eq!(ids(&dir.view(None, &bookmarks)), [2]);

    dir.clear_domains();
    dir.set_bookmark_only(true);
    assert!(dir.view(None, &bookmarks).is_empty());
    bookmarks.insert(Uuid::from_u128(5), BookmarkItemType::Alumni);
    assert_eq!(ids(&dir.view(None, &bookmarks)), [5]);
  }

  #[test]
  fn filter_changes_reset_page_and_shuffle() {
    let mut dir = loaded().with_page_size(2);
    let mut rng = StdRng::seed_from_u64(3);
    dir.set_page(2);
    dir.shuffle(&mut rng);
    assert!(dir.is_shuffled());
    assert_eq!(dir.page(), 1);

    dir.set_page(2);
    dir.set_query("a");
    assert!(!dir.is_shuffled());
    assert_eq!(dir.page(), 1);

    dir.shuffle(&mut rng);
    dir.set_query("a");
    assert!(dir.is_shuffled(), "unchanged query keeps the shuffle");
    dir.set_bookmark_only(true);
    assert!(!dir.is_shuffled());

    dir.shuffle(&mut rng);
    dir.toggle_domain("Physique");
    assert!(!dir.is_shuffled());
  }

  #[test]
  fn shuffled_view_is_stable_and_pinned() {
    let mut records: Vec<_> = (1..=30).map(|i| rec(i, "x")).collect();
    records[2].hidden = true;
    let mut dir = Directory::new(DirectoryPolicy::new(Some(Uuid::from_u128(10))));
    let ticket = dir.begin_fetch();
    dir.complete_fetch(ticket, Ok::<_, String>(records));

    let bookmarks = BookmarkSet::new();
    let viewer = me();
    let default = ids(&dir.view(Some(&viewer), &bookmarks));

    dir.shuffle(&mut StdRng::seed_from_u64(11));
    let first = ids(&dir.view(Some(&viewer), &bookmarks));
    let second = ids(&dir.view(Some(&viewer), &bookmarks));
    assert_eq!(first, second);
    assert_eq!(first[..2], [3, 10]);

    let mut a = first.clone();
    let mut b = default.clone();
    a.sort_unstable();
    b.sort_unstable();
    assert_eq!(a, b);

    dir.reset_order();
    assert_eq!(ids(&dir.view(Some(&viewer), &bookmarks)), default);
  }

  #[test]
  fn stale_fetches_are_ignored() {
    let mut dir = Directory::default();
    let older = dir.begin_fetch();
    let newer = dir.begin_fetch();

    let applied = dir.complete_fetch(newer, Ok::<_, String>(vec![rec(1, "new")]));
    assert_eq!(applied, FetchOutcome::Applied(1));
    let stale = dir.complete_fetch(older, Ok::<_, String>(vec![rec(2, "old"), rec(3, "old")]));
    assert_eq!(stale, FetchOutcome::Stale);
    assert_eq!(dir.snapshot().len(), 1);
    assert!(!dir.is_loading());
  }

  #[test]
  fn failed_fetch_keeps_snapshot() {
    let mut dir = loaded();
    let ticket = dir.begin_fetch();
    let outcome = dir.complete_fetch(ticket, Err::<Vec<AlumniRecord>, _>("timeout"));
    assert_eq!(outcome, FetchOutcome::Failed);
    assert_eq!(dir.snapshot().len(), 5);
    assert_eq!(dir.error(), Some("timeout"));
  }

  #[tokio::test]
  async fn refresh_through_backend() {
    let backend = FakeBackend::with_alumni(snapshot());
    let mut dir = Directory::default();
    assert_eq!(dir.refresh(&backend).await, FetchOutcome::Applied(5));

    backend.fail_next(true);
    assert_eq!(dir.refresh(&backend).await, FetchOutcome::Failed);
    assert_eq!(dir.snapshot().len(), 5);
    assert!(dir.error().is_some());

    assert_eq!(dir.refresh(&backend).await, FetchOutcome::Applied(5));
    assert!(dir.error().is_none());
  }

  #[test]
  fn pages_of_thirty() {
    let records: Vec<_> = (1..=30).map(|i| rec(i, "x")).collect();
    let mut dir = Directory::default();
    let ticket = dir.begin_fetch();
    dir.complete_fetch(ticket, Ok::<_, String>(records));
    let bookmarks = BookmarkSet::new();

    let page = dir.current_page(None, &bookmarks);
    assert_eq!((page.items.len(), page.page_count, page.total), (12, 3, 30));

    let total = page.total;
    dir.next_page(total);
    dir.next_page(total);
    dir.next_page(total);
    let last = dir.current_page(None, &bookmarks);
    assert_eq!((last.page, last.items.len()), (3, 6));

    dir.set_page(4);
    assert!(dir.current_page(None, &bookmarks).items.is_empty());
  }

  #[test]
  fn domains_are_sorted_and_distinct() {
    assert_eq!(loaded().domains(), ["Biologie", "Chimie", "Physique"]);
  }
}
