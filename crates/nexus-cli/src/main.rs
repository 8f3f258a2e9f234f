//! `nexus`: terminal client for the SorboNexus alumni directory.
//!
//! # Usage
//!
//! ```sh
//! nexus --url http://localhost:8080
//! nexus --email camille@sorbonne.fr --password secret
//! nexus --config ~/.config/sorbonexus/config.toml --log-file /tmp/nexus.log
//! ```

mod app;
mod client;
mod events;
mod ui;

use std::{
  fs::File,
  io,
  path::{Path, PathBuf},
  sync::Mutex,
  time::Duration,
};

use anyhow::{Context, Result};
use app::{App, Credentials};
use clap::Parser;
use client::ApiClient;
use crossterm::{
  event::{self, Event},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use nexus_core::policy::DirectoryPolicy;
use ratatui::{Terminal, backend::CrosstermBackend};
use serde::Deserialize;
use uuid::Uuid;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "nexus", about = "Terminal client for the SorboNexus alumni directory")]
struct Args {
  /// Path to a TOML config file (url, email, password, site_owner_id).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the SorboNexus server (default: http://localhost:8080).
  #[arg(long, env = "NEXUS_URL")]
  url: Option<String>,

  /// Account email; together with the password, logs in at startup.
  #[arg(long, env = "NEXUS_EMAIL")]
  email: Option<String>,

  #[arg(long, env = "NEXUS_PASSWORD")]
  password: Option<String>,

  /// Record id of the site owner, pinned near the top of the directory.
  #[arg(long, env = "NEXUS_SITE_OWNER")]
  site_owner_id: Option<Uuid>,

  /// Write logs to this file. The terminal is owned by the UI, so nothing
  /// is logged without it.
  #[arg(long, value_name = "FILE")]
  log_file: Option<PathBuf>,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:           Option<String>,
  #[serde(default)]
  email:         Option<String>,
  #[serde(default)]
  password:      Option<String>,
  #[serde(default)]
  site_owner_id: Option<Uuid>,
}

fn init_logging(path: &Path) -> Result<()> {
  let file =
    File::create(path).with_context(|| format!("creating log file {}", path.display()))?;
  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "nexus_cli=debug,nexus_core=debug".into()),
    )
    .with_ansi(false)
    .with_writer(Mutex::new(file))
    .init();
  Ok(())
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  if let Some(path) = &args.log_file {
    init_logging(path)?;
  }

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let base_url = args
    .url
    .or(file_cfg.url)
    .unwrap_or_else(|| "http://localhost:8080".to_string());
  let credentials = match (args.email.or(file_cfg.email), args.password.or(file_cfg.password)) {
    (Some(email), Some(password)) => Some(Credentials { email, password }),
    _ => None,
  };
  let policy = DirectoryPolicy::new(args.site_owner_id.or(file_cfg.site_owner_id));

  let client = ApiClient::new(base_url).context("building HTTP client")?;
  let mut app = App::new(client, policy, credentials);

  if app.has_credentials() {
    app.login().await;
    app.process_events().await;
  }
  app.refresh_directory().await;

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  // Run the event loop; restore terminal even on error.
  let run_result = run_event_loop(&mut terminal, &mut app).await;

  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

// ─── Event loop ───────────────────────────────────────────────────────────────

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App,
) -> Result<()> {
  loop {
    app.process_events().await;
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(Event::Key(key)) = maybe_event
      && !app.handle_key(key).await?
    {
      break;
    }
  }

  Ok(())
}
