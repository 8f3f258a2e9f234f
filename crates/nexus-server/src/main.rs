//! SorboNexus API server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) overlaid with
//! `NEXUS_*` environment variables, opens the SQLite store, optionally seeds
//! it, and serves the JSON API under `/api`.
//!
//! # Password hash generation
//!
//! Seed files carry argon2 PHC strings rather than passwords:
//!
//! ```sh
//! cargo run -p nexus-server --bin server -- --hash-password
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use axum::Router;
use clap::Parser;
use nexus_api::{AppState, api_router, auth::hash_password};
use nexus_server::{SeedData, ServerConfig, apply_seed, expand_tilde};
use nexus_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "SorboNexus API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,

  /// JSON seed file; overrides `seed_path` from the configuration.
  #[arg(long)]
  seed: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if cli.hash_password {
    let password = read_password()?;
    println!("{}", hash_password(&password)?);
    return Ok(());
  }

  let server_cfg = ServerConfig::load(&cli.config)?;
  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if let Some(seed_path) = cli.seed.or_else(|| server_cfg.seed_path.clone()) {
    let seed_path = expand_tilde(&seed_path);
    let seeded = apply_seed(&store, SeedData::from_file(&seed_path)?).await?;
    if seeded {
      tracing::info!(path = ?seed_path, "store seeded");
    }
  }

  let state = AppState::new(store, server_cfg.auth_config());
  let app = Router::new().nest("/api", api_router(state));
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(async {
      tokio::signal::ctrl_c().await.ok();
      tracing::info!("shutting down");
    })
    .await
    .context("server error")?;

  Ok(())
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}
