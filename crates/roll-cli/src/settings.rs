//! Layered configuration: TOML file, then `ROLL_*` environment variables,
//! then command-line flags.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use roll_store_firestore::FirestoreConfig;
use serde::Deserialize;

/// Which document store backs the tracker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
  /// A local SQLite file.
  #[default]
  Sqlite,
  /// Cloud Firestore over its REST API.
  Firestore,
}

impl BackendKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Sqlite => "sqlite",
      Self::Firestore => "firestore",
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SqliteSettings {
  #[serde(default = "default_database")]
  pub path: PathBuf,
}

impl Default for SqliteSettings {
  fn default() -> Self { Self { path: default_database() } }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FirestoreSettings {
  #[serde(default = "default_endpoint")]
  pub endpoint:   String,
  #[serde(default)]
  pub project_id: String,
  #[serde(default = "default_firestore_database")]
  pub database:   String,
  #[serde(default)]
  pub api_key:    String,
}

impl Default for FirestoreSettings {
  fn default() -> Self {
    Self {
      endpoint:   default_endpoint(),
      project_id: String::new(),
      database:   default_firestore_database(),
      api_key:    String::new(),
    }
  }
}

/// Fully-resolved settings for one run.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  #[serde(default)]
  pub backend:   BackendKind,
  #[serde(default = "default_log_file")]
  pub log_file:  PathBuf,
  #[serde(default)]
  pub sqlite:    SqliteSettings,
  #[serde(default)]
  pub firestore: FirestoreSettings,
}

fn default_database() -> PathBuf { PathBuf::from("roll.db") }

fn default_log_file() -> PathBuf { PathBuf::from("roll.log") }

fn default_endpoint() -> String { FirestoreConfig::DEFAULT_ENDPOINT.to_string() }

fn default_firestore_database() -> String { FirestoreConfig::DEFAULT_DATABASE.to_string() }

/// Command-line values that take precedence over every other source.
#[derive(Debug, Default)]
pub struct Overrides {
  pub config:   Option<PathBuf>,
  pub backend:  Option<BackendKind>,
  pub database: Option<PathBuf>,
  pub log_file: Option<PathBuf>,
}

/// `ROLL_` variables, with `__` separating nested keys
/// (`ROLL_FIRESTORE__API_KEY` → `firestore.api_key`).
fn environment() -> config::Environment {
  config::Environment::with_prefix("ROLL")
    .prefix_separator("_")
    .separator("__")
}

impl Settings {
  pub fn load(overrides: &Overrides) -> Result<Self> { Self::load_with(overrides, environment()) }

  fn load_with(overrides: &Overrides, env: config::Environment) -> Result<Self> {
    let mut builder = config::Config::builder();
    if let Some(path) = &overrides.config {
      builder = builder.add_source(config::File::from(path.as_path()));
    }

    let settings = builder
      .add_source(env)
      .set_override_option("backend", overrides.backend.map(BackendKind::as_str))?
      .set_override_option("sqlite.path", overrides.database.as_deref().map(path_string))?
      .set_override_option("log_file", overrides.log_file.as_deref().map(path_string))?
      .build()
      .context("failed to read configuration")?;

    settings
      .try_deserialize()
      .context("failed to deserialise settings")
  }

  /// Connection settings for the Firestore backend.
  pub fn firestore_config(&self) -> Result<FirestoreConfig> {
    let fs = &self.firestore;
    if fs.project_id.is_empty() {
      bail!("firestore backend selected but firestore.project_id is not set");
    }
    Ok(FirestoreConfig {
      endpoint:   fs.endpoint.clone(),
      project_id: fs.project_id.clone(),
      database:   fs.database.clone(),
      api_key:    fs.api_key.clone(),
    })
  }
}

fn path_string(path: &Path) -> String { path.to_string_lossy().into_owned() }

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
