//! Application state machine and event dispatcher.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use nexus_core::{
  Error as CoreError,
  bookmark::{BookmarkItemType, Bookmarks},
  directory::{Directory, DirectoryPage, FetchOutcome},
  policy::DirectoryPolicy,
  record::{AlumniProfile, AlumniRecord},
  session::ViewerContext,
};
use uuid::Uuid;

use crate::{
  client::ApiClient,
  events::{AppEvent, EventBus, EventStream},
};

// ─── Screen ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
  /// Focus on the paginated directory.
  Directory,
  /// Focus on one alumnus.
  Detail,
}

/// Login credentials supplied on the command line or in the config file.
#[derive(Debug, Clone)]
pub struct Credentials {
  pub email:    String,
  pub password: String,
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App {
  pub screen:       Screen,
  pub directory:    Directory,
  pub bookmarks:    Bookmarks,
  /// Recomputed from the client's token on every session event.
  pub viewer:       Option<ViewerContext>,
  /// Cursor position within the current page.
  pub cursor:       usize,
  /// Record shown on the detail screen.
  pub selected:     Option<Uuid>,
  /// Whether keystrokes go to the search box.
  pub searching:    bool,
  pub status_msg:   String,
  pub client:       ApiClient,
  credentials:      Option<Credentials>,
  events:           EventBus,
  inbox:            EventStream,
}

impl App {
  pub fn new(client: ApiClient, policy: DirectoryPolicy, credentials: Option<Credentials>) -> Self {
    let events = EventBus::default();
    let inbox = events.subscribe();
    Self {
      screen: Screen::Directory,
      directory: Directory::new(policy),
      bookmarks: Bookmarks::new(),
      viewer: None,
      cursor: 0,
      selected: None,
      searching: false,
      status_msg: String::new(),
      client,
      credentials,
      events,
      inbox,
    }
  }

  // ── Derived views ─────────────────────────────────────────────────────────

  pub fn page(&self) -> DirectoryPage<'_> {
    self
      .directory
      .current_page(self.viewer.as_ref(), self.bookmarks.set())
  }

  /// The record under the cursor on the current page.
  pub fn cursor_record(&self) -> Option<&AlumniRecord> {
    let page = self.page();
    let idx = self.cursor.min(page.items.len().saturating_sub(1));
    page.items.get(idx).copied()
  }

  pub fn selected_record(&self) -> Option<&AlumniRecord> {
    self.selected.and_then(|id| self.directory.get(id))
  }

  /// The viewer's own profile, if logged in and present in the snapshot.
  pub fn own_record(&self) -> Option<&AlumniRecord> {
    let viewer = self.viewer.as_ref()?;
    self.directory.snapshot().iter().find(|r| viewer.owns(r))
  }

  pub fn is_logged_in(&self) -> bool { self.viewer.is_some() }

  pub fn has_credentials(&self) -> bool { self.credentials.is_some() }

  // ── Session ───────────────────────────────────────────────────────────────

  /// Log in with the configured credentials, if any.
  pub async fn login(&mut self) {
    let Some(creds) = self.credentials.clone() else {
      self.status_msg = "Aucun identifiant configuré (--email / --password)".into();
      return;
    };
    match self.client.login(&creds.email, &creds.password).await {
      Ok(_) => {
        self.status_msg = format!("Connecté en tant que {}", creds.email);
        self.events.publish(AppEvent::LoggedIn);
      }
      Err(e) => {
        tracing::warn!(error = %e, "login failed");
        self.status_msg = format!("Échec de la connexion : {e}");
      }
    }
  }

  pub async fn logout(&mut self) {
    if let Err(e) = self.client.logout().await {
      tracing::warn!(error = %e, "logout failed server-side");
    }
    self.status_msg = "Déconnecté".into();
    self.events.publish(AppEvent::LoggedOut);
  }

  fn sync_viewer(&mut self) {
    self.viewer = ViewerContext::from_token(self.client.token());
    self.bookmarks.set_viewer(self.viewer);
  }

  /// Drain pending events and refresh what depends on them.
  pub async fn process_events(&mut self) {
    let events = self.inbox.drain();
    if events.is_empty() {
      return;
    }

    let session_changed = events
      .iter()
      .any(|e| matches!(e, AppEvent::LoggedIn | AppEvent::LoggedOut));
    let profile_changed = events.contains(&AppEvent::ProfileUpdated);

    if session_changed {
      self.sync_viewer();
      self.cursor = 0;
    }
    if profile_changed {
      self.refresh_directory().await;
    }
    self.refresh_bookmarks().await;
  }

  // ── Data loading ──────────────────────────────────────────────────────────

  pub async fn refresh_directory(&mut self) {
    self.status_msg = "Chargement des alumni…".into();
    match self.directory.refresh(&self.client).await {
      FetchOutcome::Applied(n) => self.status_msg = format!("{n} alumni chargés"),
      FetchOutcome::Stale => {}
      FetchOutcome::Failed => {
        let msg = self.directory.error().unwrap_or("unknown error");
        tracing::warn!(error = msg, "alumni fetch failed");
        self.status_msg = format!("Erreur : {msg}");
      }
    }
  }

  pub async fn refresh_bookmarks(&mut self) {
    if let Err(e) = self.bookmarks.refresh(&self.client).await {
      tracing::warn!(error = %e, "bookmark refresh failed");
      self.status_msg = format!("Favoris indisponibles : {e}");
    }
  }

  // ── Actions ───────────────────────────────────────────────────────────────

  async fn toggle_bookmark(&mut self, id: Uuid) {
    match self
      .bookmarks
      .toggle(&self.client, id, BookmarkItemType::Alumni)
      .await
    {
      Ok(true) => self.status_msg = "Ajouté aux favoris".into(),
      Ok(false) => self.status_msg = "Retiré des favoris".into(),
      Err(CoreError::Unauthenticated) => {
        self.status_msg = "Connectez-vous (L) pour ajouter des favoris".into();
      }
      Err(e) => self.status_msg = format!("Favori non enregistré : {e}"),
    }
  }

  /// Flip the `hidden` flag on the viewer's own profile.
  async fn toggle_own_visibility(&mut self) {
    let Some(own) = self.own_record() else {
      self.status_msg = "Vous n'avez pas de profil à modifier".into();
      return;
    };
    let id = own.id;
    let mut profile = AlumniProfile::from(own);
    profile.hidden = !profile.hidden;

    match self.client.update_profile(id, &profile).await {
      Ok(record) => {
        self.status_msg = if record.hidden {
          "Votre profil est maintenant masqué".into()
        } else {
          "Votre profil est maintenant public".into()
        };
        self.events.publish(AppEvent::ProfileUpdated);
      }
      Err(e) => self.status_msg = format!("Échec de la mise à jour : {e}"),
    }
  }

  fn toggle_domain_at(&mut self, index: usize) {
    if let Some(domain) = self.directory.domains().get(index).cloned() {
      self.directory.toggle_domain(&domain);
      self.cursor = 0;
    }
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return Ok(false);
    }

    if self.searching {
      self.handle_search_key(key);
      return Ok(true);
    }

    match self.screen {
      Screen::Directory => self.handle_directory_key(key).await,
      Screen::Detail => self.handle_detail_key(key).await,
    }
  }

  /// Search edits apply live; the directory resets to page 1 on each change.
  fn handle_search_key(&mut self, key: KeyEvent) {
    let mut query = self.directory.filter().query.clone();
    match key.code {
      KeyCode::Esc => {
        self.searching = false;
        query.clear();
      }
      KeyCode::Enter => self.searching = false,
      KeyCode::Backspace => {
        query.pop();
      }
      KeyCode::Char(c) => query.push(c),
      _ => {}
    }
    self.directory.set_query(query);
    self.cursor = 0;
  }

  async fn handle_directory_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    match key.code {
      KeyCode::Char('q') => return Ok(false),

      // Navigation within the page
      KeyCode::Down | KeyCode::Char('j') => {
        if self.cursor + 1 < self.page().items.len() {
          self.cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => self.cursor = self.cursor.saturating_sub(1),

      // Pages
      KeyCode::Right | KeyCode::Char('n') => {
        let total = self.page().total;
        self.directory.next_page(total);
        self.cursor = 0;
      }
      KeyCode::Left | KeyCode::Char('p') => {
        self.directory.prev_page();
        self.cursor = 0;
      }

      KeyCode::Enter => {
        if let Some(id) = self.cursor_record().map(|r| r.id) {
          self.selected = Some(id);
          self.screen = Screen::Detail;
        }
      }

      // Filters
      KeyCode::Char('/') => self.searching = true,
      KeyCode::Char(c @ '1'..='9') => {
        let index = c as usize - '1' as usize;
        self.toggle_domain_at(index);
      }
      KeyCode::Char('0') => {
        self.directory.clear_domains();
        self.cursor = 0;
      }
      KeyCode::Char('f') => {
        let on = !self.directory.filter().bookmark_only;
        self.directory.set_bookmark_only(on);
        self.cursor = 0;
      }

      // Ordering
      KeyCode::Char('s') => {
        self.directory.shuffle(&mut rand::thread_rng());
        self.cursor = 0;
      }
      KeyCode::Char('o') => self.directory.reset_order(),

      // Remote actions
      KeyCode::Char('b') => {
        if let Some(id) = self.cursor_record().map(|r| r.id) {
          self.toggle_bookmark(id).await;
        }
      }
      KeyCode::Char('r') => {
        self.refresh_directory().await;
        self.refresh_bookmarks().await;
      }
      KeyCode::Char('h') => self.toggle_own_visibility().await,
      KeyCode::Char('L') => {
        if self.is_logged_in() {
          self.logout().await;
        } else {
          self.login().await;
        }
      }

      _ => {}
    }
    Ok(true)
  }

  async fn handle_detail_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    match key.code {
      KeyCode::Char('q') => return Ok(false),
      KeyCode::Esc | KeyCode::Left | KeyCode::Backspace => {
        self.screen = Screen::Directory;
        self.selected = None;
      }
      KeyCode::Char('b') => {
        if let Some(id) = self.selected {
          self.toggle_bookmark(id).await;
        }
      }
      _ => {}
    }
    Ok(true)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn app_with(records: Vec<AlumniRecord>) -> App {
    let client = ApiClient::new("http://localhost:9").unwrap();
    let mut app = App::new(client, DirectoryPolicy::default(), None);
    let ticket = app.directory.begin_fetch();
    let _ = app
      .directory
      .complete_fetch::<std::convert::Infallible>(ticket, Ok(records));
    app
  }

  fn record(n: u128, name: &str, field: &[&str]) -> AlumniRecord {
    let mut r = AlumniRecord::new(Uuid::from_u128(n), name);
    r.field = field.iter().map(|s| s.to_string()).collect();
    r
  }

  fn key(code: KeyCode) -> KeyEvent { KeyEvent::from(code) }

  /// Accepts every bookmark mutation without touching the network.
  struct Accepting;

  impl nexus_core::backend::DirectoryBackend for Accepting {
    type Error = std::convert::Infallible;

    async fn fetch_alumni(&self) -> Result<Vec<AlumniRecord>, Self::Error> { Ok(Vec::new()) }

    async fn add_bookmark(
      &self,
      input: nexus_core::bookmark::NewBookmark,
    ) -> Result<nexus_core::bookmark::Bookmark, Self::Error> {
      Ok(nexus_core::bookmark::Bookmark {
        bookmark_id: Uuid::new_v4(),
        user_id:     Uuid::from_u128(100),
        item_id:     input.item_id,
        item_type:   input.item_type,
        created_at:  chrono::Utc::now(),
      })
    }

    async fn remove_bookmark(&self, _: Uuid, _: BookmarkItemType) -> Result<bool, Self::Error> {
      Ok(true)
    }

    async fn list_bookmarks(
      &self,
      _: Uuid,
      _: BookmarkItemType,
    ) -> Result<Vec<nexus_core::bookmark::Bookmark>, Self::Error> {
      Ok(Vec::new())
    }
  }

  fn claims() -> nexus_core::session::SessionClaims {
    nexus_core::session::SessionClaims {
      id:        Uuid::from_u128(100),
      alumni_id: Some(Uuid::from_u128(1)),
      is_admin:  false,
      exp:       i64::MAX,
    }
  }

  #[tokio::test]
  async fn typing_a_query_filters_live() {
    let mut app = app_with(vec![
      record(1, "Alice", &["Physique"]),
      record(2, "Bruno", &["Chimie"]),
    ]);
    for code in [KeyCode::Char('/'), KeyCode::Char('b'), KeyCode::Char('r')] {
      app.handle_key(key(code)).await.unwrap();
    }
    assert!(app.searching);
    assert_eq!(app.directory.filter().query, "br");
    assert_eq!(app.page().total, 1);

    app.handle_key(key(KeyCode::Esc)).await.unwrap();
    assert!(!app.searching);
    assert_eq!(app.page().total, 2);
  }

  #[tokio::test]
  async fn number_keys_toggle_sorted_domains() {
    let mut app = app_with(vec![
      record(1, "Alice", &["Physique"]),
      record(2, "Bruno", &["Chimie"]),
    ]);
    // Domains sort as ["Chimie", "Physique"].
    app.handle_key(key(KeyCode::Char('2'))).await.unwrap();
    assert_eq!(app.directory.filter().domains, ["Physique"]);
    assert_eq!(app.page().items[0].name, "Alice");

    app.handle_key(key(KeyCode::Char('0'))).await.unwrap();
    assert!(app.directory.filter().domains.is_empty());
  }

  #[tokio::test]
  async fn anonymous_bookmark_is_refused_locally() {
    let mut app = app_with(vec![record(1, "Alice", &[])]);
    app.handle_key(key(KeyCode::Char('b'))).await.unwrap();
    assert!(app.status_msg.contains("Connectez-vous"));
    assert!(app.bookmarks.set().is_empty());
  }

  #[tokio::test]
  async fn shuffle_then_filter_restores_default_order() {
    let records = (1..=20).map(|n| record(n, &format!("N{n}"), &[])).collect();
    let mut app = app_with(records);
    app.handle_key(key(KeyCode::Char('s'))).await.unwrap();
    assert!(app.directory.is_shuffled());
    app.handle_key(key(KeyCode::Char('f'))).await.unwrap();
    assert!(!app.directory.is_shuffled());
    assert_eq!(app.directory.page(), 1);
  }

  #[tokio::test]
  async fn login_event_derives_the_viewer_from_the_token() {
    let token = nexus_core::session::encode_token(&claims(), "00ff").unwrap();
    let client = ApiClient::new("http://localhost:9").unwrap().with_token(token);
    let mut app = App::new(client, DirectoryPolicy::default(), None);
    assert!(app.viewer.is_none());

    app.events.publish(AppEvent::LoggedIn);
    app.process_events().await;

    let viewer = app.viewer.unwrap();
    assert_eq!(viewer.viewer_id, Uuid::from_u128(100));
    assert_eq!(viewer.alumni_id, Some(Uuid::from_u128(1)));
    assert_eq!(app.bookmarks.viewer(), Some(&viewer));
  }

  #[tokio::test]
  async fn logout_event_clears_viewer_and_bookmarks() {
    let mut app = app_with(vec![record(1, "Alice", &[]), record(2, "Bruno", &[])]);
    let viewer = ViewerContext::from_claims(&claims());
    app.viewer = Some(viewer);
    app.bookmarks.set_viewer(Some(viewer));
    app
      .bookmarks
      .toggle(&Accepting, Uuid::from_u128(2), BookmarkItemType::Alumni)
      .await
      .unwrap();
    assert!(app.bookmarks.is_bookmarked(Uuid::from_u128(2), BookmarkItemType::Alumni));

    app.events.publish(AppEvent::LoggedOut);
    app.process_events().await;

    assert!(app.viewer.is_none());
    assert!(app.bookmarks.viewer().is_none());
    assert!(app.bookmarks.set().is_empty());
  }

  #[tokio::test]
  async fn profile_update_event_refetches_the_directory() {
    let mut app = app_with(vec![record(1, "Alice", &[])]);
    assert!(app.directory.error().is_none());

    app.events.publish(AppEvent::ProfileUpdated);
    app.process_events().await;

    // Nothing listens on port 9, so the refetch fails but keeps the snapshot.
    assert!(app.directory.error().is_some());
    assert!(app.status_msg.starts_with("Erreur"));
    assert_eq!(app.page().total, 1);
  }

  #[tokio::test]
  async fn paging_and_detail() {
    let records = (1..=30).map(|n| record(n, &format!("N{n}"), &[])).collect();
    let mut app = app_with(records);
    app.handle_key(key(KeyCode::Char('n'))).await.unwrap();
    app.handle_key(key(KeyCode::Char('n'))).await.unwrap();
    app.handle_key(key(KeyCode::Char('n'))).await.unwrap();
    assert_eq!(app.directory.page(), 3);
    assert_eq!(app.page().items.len(), 6);

    app.handle_key(key(KeyCode::Enter)).await.unwrap();
    assert_eq!(app.screen, Screen::Detail);
    assert_eq!(app.selected_record().unwrap().name, "N25");
    app.handle_key(key(KeyCode::Esc)).await.unwrap();
    assert_eq!(app.screen, Screen::Directory);
  }
}
