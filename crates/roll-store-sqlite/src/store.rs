//! [`SqliteStore`] — the SQLite implementation of [`DocumentStore`].

use std::path::Path;

use roll_core::store::{Document, DocumentStore, Fields};
use serde_json::Value;
use tracing::debug;

use crate::{
  Result,
  encode::{RawDocument, encode_body, encode_value, field_path, new_doc_id},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A document store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open a private in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a `SELECT doc_id, body` statement and decode the rows.
  async fn select(
    &self,
    collection: &str,
    sql: &'static str,
    params: Vec<String>,
  ) -> Result<Vec<Document>> {
    let raws: Vec<RawDocument> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), |row| {
            Ok(RawDocument {
              doc_id: row.get(0)?,
              body:   row.get(1)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|raw| raw.into_document(collection))
      .collect()
  }
}

// ─── DocumentStore impl ──────────────────────────────────────────────────────

impl DocumentStore for SqliteStore {
  type Error = crate::Error;

  async fn insert(&self, collection: &str, fields: Fields) -> Result<String> {
    let doc_id = new_doc_id();
    let body = encode_body(&fields)?;

    let collection_str = collection.to_owned();
    let id_str = doc_id.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO documents (collection, doc_id, body) VALUES (?1, ?2, ?3)",
          rusqlite::params![collection_str, id_str, body],
        )?;
        Ok(())
      })
      .await?;

    debug!(%collection, id = %doc_id, "inserted document");
    Ok(doc_id)
  }

  async fn get_all(&self, collection: &str) -> Result<Vec<Document>> {
    self
      .select(
        collection,
        "SELECT doc_id, body FROM documents WHERE collection = ?1 ORDER BY rowid",
        vec![collection.to_owned()],
      )
      .await
  }

  async fn get_where_eq(
    &self,
    collection: &str,
    field: &str,
    value: &Value,
  ) -> Result<Vec<Document>> {
    // Both sides go through json_extract so strings, numbers and booleans
    // compare as SQL values rather than as JSON text.
    self
      .select(
        collection,
        "SELECT doc_id, body FROM documents
         WHERE collection = ?1
           AND json_extract(body, ?2) = json_extract(?3, '$')
         ORDER BY rowid",
        vec![collection.to_owned(), field_path(field), encode_value(value)?],
      )
      .await
  }

  async fn update(&self, collection: &str, id: &str, patch: Fields) -> Result<bool> {
    let patch_str = encode_body(&patch)?;
    let collection_str = collection.to_owned();
    let id_str = id.to_owned();

    // RFC 7396 merge patch: members present in `patch` replace the stored
    // ones, everything else is kept.
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE documents SET body = json_patch(body, ?3)
           WHERE collection = ?1 AND doc_id = ?2",
          rusqlite::params![collection_str, id_str, patch_str],
        )?)
      })
      .await?;

    debug!(%collection, %id, changed, "updated document");
    Ok(changed > 0)
  }

  async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
    let collection_str = collection.to_owned();
    let id_str = id.to_owned();

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM documents WHERE collection = ?1 AND doc_id = ?2",
          rusqlite::params![collection_str, id_str],
        )?)
      })
      .await?;

    debug!(%collection, %id, removed, "deleted document");
    Ok(removed > 0)
  }
}
