//! Core types and the directory pipeline for SorboNexus.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! pipeline turns a raw alumni snapshot into the rendered directory:
//!
//! visibility ([`policy::is_visible`]) → search/filter ([`filter`]) →
//! ordering or shuffle ([`policy::DirectoryPolicy`]) → pagination
//! ([`page`]), with [`directory::Directory`] holding the state in between.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
#![allow(async_fn_in_trait)]

pub mod account;
pub mod backend;
pub mod bookmark;
pub mod directory;
pub mod error;
pub mod filter;
pub mod library;
pub mod page;
pub mod policy;
pub mod record;
pub mod session;
pub mod store;

pub use error::{Error, Result};
