//! JSON REST API for SorboNexus.
//!
//! Exposes an axum [`Router`] backed by any [`DirectoryStore`]. TLS and
//! transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", nexus_api::api_router(state))
//! ```

pub mod alumni;
pub mod auth;
pub mod bookmarks;
pub mod error;
pub mod library;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post},
};
use nexus_core::store::DirectoryStore;
use tower_http::trace::TraceLayer;

pub use auth::AuthConfig;
pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S: DirectoryStore> {
  pub store: Arc<S>,
  pub auth:  Arc<AuthConfig>,
}

impl<S: DirectoryStore> AppState<S> {
  pub fn new(store: S, auth: AuthConfig) -> Self {
    Self { store: Arc::new(store), auth: Arc::new(auth) }
  }
}

impl<S: DirectoryStore> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), auth: Arc::clone(&self.auth) }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: DirectoryStore + 'static,
{
  Router::new()
    // Accounts
    .route("/auth/register", post(auth::register::<S>))
    .route("/auth/login", post(auth::login::<S>))
    .route("/auth/logout", post(auth::logout::<S>))
    .route("/auth/me", get(auth::me))
    // Alumni
    .route("/alumni", get(alumni::list::<S>).post(alumni::create::<S>))
    .route(
      "/alumni/{id}",
      get(alumni::get_one::<S>)
        .put(alumni::update::<S>)
        .delete(alumni::remove::<S>),
    )
    // Library
    .route("/links", get(library::list_links::<S>).post(library::create_link::<S>))
    .route(
      "/resources",
      get(library::list_resources::<S>).post(library::create_resource::<S>),
    )
    // Bookmarks
    .route("/bookmarks", post(bookmarks::add::<S>))
    .route("/bookmarks/{item_id}", delete(bookmarks::remove::<S>))
    .route("/bookmarks/user/{user_id}", get(bookmarks::list::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

#[cfg(test)]
mod tests;
