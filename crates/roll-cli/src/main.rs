//! `roll` — terminal UI for tracking class attendance.
//!
//! # Usage
//!
//! ```
//! roll --database ~/roll.db
//! roll --backend firestore --config ~/.config/roll/config.toml
//! ```

mod app;
mod form;
mod settings;
mod ui;

use std::{fs::OpenOptions, io, sync::Mutex, time::Duration};

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use crossterm::{
  event::{self, Event, KeyEventKind},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use roll_core::{access::Tracker, store::DocumentStore};
use roll_store_firestore::FirestoreStore;
use roll_store_sqlite::SqliteStore;
use settings::{BackendKind, Overrides, Settings, expand_tilde};
use tracing::info;
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "roll", about = "Terminal UI for tracking class attendance")]
struct Args {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE", env = "ROLL_CONFIG")]
  config: Option<std::path::PathBuf>,

  /// Document store to use.
  #[arg(long, value_enum)]
  backend: Option<BackendKind>,

  /// SQLite database file (sqlite backend only; default: roll.db).
  #[arg(long, value_name = "FILE")]
  database: Option<std::path::PathBuf>,

  /// Where to write logs; the terminal is taken by the UI (default: roll.log).
  #[arg(long, value_name = "FILE")]
  log_file: Option<std::path::PathBuf>,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  let settings = Settings::load(&Overrides {
    config:   args.config.map(|p| expand_tilde(&p)),
    backend:  args.backend,
    database: args.database,
    log_file: args.log_file,
  })?;

  init_logging(&settings)?;
  info!(backend = settings.backend.as_str(), "starting roll");

  match settings.backend {
    BackendKind::Sqlite => {
      let path = expand_tilde(&settings.sqlite.path);
      let store = SqliteStore::open(&path)
        .await
        .with_context(|| format!("opening database {}", path.display()))?;
      run(App::new(Tracker::new(store))).await
    }
    BackendKind::Firestore => {
      let store = FirestoreStore::new(settings.firestore_config()?)
        .context("creating firestore client")?;
      run(App::new(Tracker::new(store))).await
    }
  }
}

/// Send `tracing` output to the log file. `RUST_LOG` overrides the default
/// `info` level.
fn init_logging(settings: &Settings) -> Result<()> {
  let path = expand_tilde(&settings.log_file);
  let file = OpenOptions::new()
    .create(true)
    .append(true)
    .open(&path)
    .with_context(|| format!("opening log file {}", path.display()))?;

  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(Mutex::new(file))
    .with_ansi(false)
    .init();
  Ok(())
}

async fn run<S: DocumentStore>(mut app: App<S>) -> Result<()> {
  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  // Run the event loop; restore terminal even on error.
  let run_result = run_event_loop(&mut terminal, &mut app).await;

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

// ─── Event loop ───────────────────────────────────────────────────────────────

async fn run_event_loop<S: DocumentStore>(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App<S>,
) -> Result<()> {
  // Show "Loading…" while the first fetch is in flight.
  terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;
  app.controller.load().await;

  loop {
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    match maybe_event {
      Some(Event::Key(key)) if key.kind == KeyEventKind::Press => {
        if !app.handle_key(key).await? {
          break;
        }
      }
      // Resize and the rest redraw on the next iteration.
      _ => {}
    }
  }

  Ok(())
}
