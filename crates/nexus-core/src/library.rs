//! The curated library: external links and downloadable resources.
//!
//! Resource files live in an external object store; only their URL is kept.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
  pub link_id:     Uuid,
  pub title:       String,
  pub url:         String,
  pub description: Option<String>,
  pub category:    Option<String>,
  pub created_at:  DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLink {
  pub title:       String,
  pub url:         String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub category:    Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
  pub resource_id: Uuid,
  pub title:       String,
  pub description: Option<String>,
  pub category:    Option<String>,
  /// Location of the file in the object store.
  pub file_url:    String,
  pub created_at:  DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewResource {
  pub title:       String,
  pub file_url:    String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub category:    Option<String>,
}
