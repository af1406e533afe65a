//! Error types for `roll-core`.

use thiserror::Error;

/// Every failure an intent can surface to the user.
#[derive(Debug, Error)]
pub enum Error {
  /// Network, auth, quota or I/O failure on any store call.
  #[error("store unavailable: {0}")]
  StoreUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

  /// The target of an update vanished.
  #[error("{collection} document not found: {id}")]
  NotFound { collection: &'static str, id: String },

  /// Rejected input, or a stored document that does not decode.
  #[error("{0}")]
  ValidationFailed(String),
}

impl Error {
  /// Wrap a backend error.
  pub fn unavailable<E>(source: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::StoreUnavailable(Box::new(source))
  }

  pub fn validation(message: impl Into<String>) -> Self {
    Self::ValidationFailed(message.into())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
