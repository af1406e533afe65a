//! Encoding and decoding helpers between documents and the plain-text
//! representations stored in SQLite columns.
//!
//! Bodies are stored as compact JSON objects. Ids are simple (unhyphenated)
//! UUIDv4 strings.

use roll_core::store::{Document, Fields};
use serde_json::Value;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Ids ─────────────────────────────────────────────────────────────────────

pub fn new_doc_id() -> String { Uuid::new_v4().simple().to_string() }

// ─── Bodies ──────────────────────────────────────────────────────────────────

pub fn encode_body(fields: &Fields) -> Result<String> { Ok(serde_json::to_string(fields)?) }

pub fn encode_value(value: &Value) -> Result<String> { Ok(serde_json::to_string(value)?) }

/// JSON path selecting a top-level member, quoted so that any field name is
/// taken literally.
pub fn field_path(field: &str) -> String { format!("$.\"{field}\"") }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `documents` row.
pub struct RawDocument {
  pub doc_id: String,
  pub body:   String,
}

impl RawDocument {
  pub fn into_document(self, collection: &str) -> Result<Document> {
    match serde_json::from_str(&self.body)? {
      Value::Object(fields) => Ok(Document { id: self.doc_id, fields }),
      _ => Err(Error::NotAnObject {
        collection: collection.to_owned(),
        id:         self.doc_id,
      }),
    }
  }
}
