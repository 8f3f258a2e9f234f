//! Configuration and seeding for the SorboNexus server binary.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::Duration;
use nexus_api::AuthConfig;
use nexus_core::{
  account::NewUser,
  library::{NewLink, NewResource},
  record::AlumniProfile,
  store::DirectoryStore,
};
use serde::Deserialize;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `NEXUS_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:              String,
  #[serde(default = "default_port")]
  pub port:              u16,
  #[serde(default = "default_store_path")]
  pub store_path:        PathBuf,
  #[serde(default = "default_session_ttl_hours")]
  pub session_ttl_hours: i64,
  /// JSON file loaded into an empty store at startup.
  #[serde(default)]
  pub seed_path:         Option<PathBuf>,
  #[serde(default)]
  pub admin_emails:      Vec<String>,
}

fn default_host() -> String { "127.0.0.1".into() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/sorbonexus/nexus.db") }

fn default_session_ttl_hours() -> i64 { 24 * 7 }

impl ServerConfig {
  /// Load from an optional TOML file overlaid with the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("NEXUS")
          .try_parsing(true)
          .list_separator(",")
          .with_list_parse_key("admin_emails"),
      )
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn auth_config(&self) -> AuthConfig {
    AuthConfig {
      session_ttl:  Duration::hours(self.session_ttl_hours),
      admin_emails: self.admin_emails.clone(),
    }
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Seed data ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedUser {
  pub email:         String,
  /// argon2 PHC string, as printed by `server --hash-password`.
  pub password_hash: String,
  #[serde(default)]
  pub is_admin:      bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedAlumnus {
  /// Links the profile to the seeded account with this email.
  #[serde(default)]
  pub owner_email: Option<String>,
  #[serde(default)]
  pub is_admin:    bool,
  #[serde(flatten)]
  pub profile:     AlumniProfile,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SeedData {
  pub users:     Vec<SeedUser>,
  pub alumni:    Vec<SeedAlumnus>,
  pub links:     Vec<NewLink>,
  pub resources: Vec<NewResource>,
}

impl SeedData {
  pub fn from_file(path: &Path) -> anyhow::Result<Self> {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("failed to read seed file {path:?}"))?;
    serde_json::from_str(&raw).with_context(|| format!("malformed seed file {path:?}"))
  }
}

/// Load `seed` into `store`. Returns `false` without writing anything if the
/// store already holds alumni.
pub async fn apply_seed<S>(store: &S, seed: SeedData) -> anyhow::Result<bool>
where
  S: DirectoryStore,
{
  if !store.list_alumni().await?.is_empty() {
    tracing::info!("store already populated; skipping seed");
    return Ok(false);
  }

  for user in seed.users {
    let exists = store.find_user_by_email(user.email.clone()).await?.is_some();
    if exists {
      continue;
    }
    store
      .create_user(NewUser {
        email:         user.email,
        password_hash: user.password_hash,
        is_admin:      user.is_admin,
      })
      .await?;
  }

  for entry in seed.alumni {
    let owner = match &entry.owner_email {
      Some(email) => Some(
        store
          .find_user_by_email(email.clone())
          .await?
          .with_context(|| format!("seed alumnus references unknown user {email}"))?
          .user_id,
      ),
      None => None,
    };
    let record = store
      .create_alumni(owner, entry.profile, entry.is_admin)
      .await?;
    tracing::info!(alumni_id = %record.id, name = %record.name, "seeded alumnus");
  }

  for link in seed.links {
    store.add_link(link).await?;
  }
  for resource in seed.resources {
    store.add_resource(resource).await?;
  }
  Ok(true)
}
