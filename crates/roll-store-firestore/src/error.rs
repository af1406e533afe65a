//! Error type for `roll-store-firestore`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// The API answered with a non-success status.
  #[error("{what} → {status}: {body}")]
  Status {
    what:   &'static str,
    status: reqwest::StatusCode,
    body:   String,
  },

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// A typed value that cannot be represented as plain JSON (or vice versa).
  #[error("value codec error: {0}")]
  Codec(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
