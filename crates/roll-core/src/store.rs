//! The `DocumentStore` trait and the document shape it traffics in.
//!
//! The trait is implemented by storage backends (`roll-store-sqlite`,
//! `roll-store-firestore`). The data access layer in [`crate::access`]
//! depends on this abstraction, not on any concrete backend.

use std::future::Future;

/// The `subjects` collection.
pub const SUBJECTS: &str = "subjects";

/// The `attendance` collection.
pub const ATTENDANCE: &str = "attendance";

/// The body of a document: a JSON object.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// A document as returned by a store read.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
  /// Store-assigned identifier, unique within its collection.
  pub id:     String,
  pub fields: Fields,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a schema-less document store with per-collection CRUD
/// and equality queries.
///
/// No ordering is promised for reads, and no operation spans more than one
/// document atomically.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes.
pub trait DocumentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Insert a new document and return the identifier the store assigned.
  fn insert<'a>(
    &'a self,
    collection: &'a str,
    fields: Fields,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;

  /// Every document in `collection`.
  fn get_all<'a>(
    &'a self,
    collection: &'a str,
  ) -> impl Future<Output = Result<Vec<Document>, Self::Error>> + Send + 'a;

  /// Documents in `collection` whose top-level `field` equals `value`.
  fn get_where_eq<'a>(
    &'a self,
    collection: &'a str,
    field: &'a str,
    value: &'a serde_json::Value,
  ) -> impl Future<Output = Result<Vec<Document>, Self::Error>> + Send + 'a;

  /// Overwrite the top-level fields present in `patch`, leaving the others
  /// alone. Returns `false` if no document with `id` exists.
  fn update<'a>(
    &'a self,
    collection: &'a str,
    id: &'a str,
    patch: Fields,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Remove a document. Returns `false` if the backend knows that no
  /// document with `id` existed.
  fn delete<'a>(
    &'a self,
    collection: &'a str,
    id: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}
