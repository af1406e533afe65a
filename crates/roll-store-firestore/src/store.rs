//! [`FirestoreStore`] — the Firestore REST implementation of
//! [`DocumentStore`].

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use roll_core::store::{Document, DocumentStore, Fields};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::{
  Error, Result,
  value::{decode_fields, encode_fields, encode_value},
};

/// Page size requested when listing a collection.
const PAGE_SIZE: &str = "300";

/// Connection settings for a Firestore database.
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
  /// Base URL, e.g. `https://firestore.googleapis.com` or an emulator.
  pub endpoint:   String,
  pub project_id: String,
  /// Database id; Firestore's default database is `(default)`.
  pub database:   String,
  /// Web API key, sent as the `key` query parameter. May be empty (emulator).
  pub api_key:    String,
}

impl FirestoreConfig {
  pub const DEFAULT_ENDPOINT: &'static str = "https://firestore.googleapis.com";
  pub const DEFAULT_DATABASE: &'static str = "(default)";
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RawDocument {
  /// `projects/{p}/databases/{d}/documents/{collection}/{id}`
  name:   String,
  #[serde(default)]
  fields: Map<String, Value>,
}

impl RawDocument {
  fn into_document(self) -> Result<Document> {
    let id = self
      .name
      .rsplit('/')
      .next()
      .filter(|id| !id.is_empty())
      .ok_or_else(|| Error::Codec(format!("document name without id: {:?}", self.name)))?
      .to_owned();
    Ok(Document { id, fields: decode_fields(&self.fields)? })
  }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
  #[serde(default)]
  documents:       Vec<RawDocument>,
  next_page_token: Option<String>,
}

/// One element of a `runQuery` response stream. Elements without a document
/// only carry progress metadata.
#[derive(Deserialize)]
struct QueryResult {
  document: Option<RawDocument>,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A document store backed by Cloud Firestore.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based. Requests
/// carry no timeout and are never retried.
#[derive(Clone)]
pub struct FirestoreStore {
  client: Client,
  config: FirestoreConfig,
}

impl FirestoreStore {
  pub fn new(config: FirestoreConfig) -> Result<Self> {
    let client = Client::builder().build()?;
    Ok(Self { client, config })
  }

  /// `…/v1/projects/{project}/databases/{database}/documents`
  fn documents_url(&self) -> String {
    format!(
      "{}/v1/projects/{}/databases/{}/documents",
      self.config.endpoint.trim_end_matches('/'),
      self.config.project_id,
      self.config.database,
    )
  }

  fn collection_url(&self, collection: &str) -> String {
    format!("{}/{collection}", self.documents_url())
  }

  fn document_url(&self, collection: &str, id: &str) -> String {
    format!("{}/{collection}/{id}", self.documents_url())
  }

  fn auth(&self, req: RequestBuilder) -> RequestBuilder {
    if self.config.api_key.is_empty() {
      req
    } else {
      req.query(&[("key", self.config.api_key.as_str())])
    }
  }
}

/// Turn a non-success response into [`Error::Status`].
async fn check(resp: Response, what: &'static str) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let body = resp.text().await.unwrap_or_default();
  Err(Error::Status { what, status, body })
}

// ─── DocumentStore impl ──────────────────────────────────────────────────────

impl DocumentStore for FirestoreStore {
  type Error = Error;

  /// `POST …/documents/{collection}`
  async fn insert(&self, collection: &str, fields: Fields) -> Result<String> {
    let resp = self
      .auth(self.client.post(self.collection_url(collection)))
      .json(&json!({ "fields": encode_fields(&fields) }))
      .send()
      .await?;
    let created: RawDocument = check(resp, "create document").await?.json().await?;
    let doc = created.into_document()?;

    debug!(%collection, id = %doc.id, "inserted document");
    Ok(doc.id)
  }

  /// `GET …/documents/{collection}`, following page tokens.
  async fn get_all(&self, collection: &str) -> Result<Vec<Document>> {
    let mut docs = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
      let mut req = self
        .auth(self.client.get(self.collection_url(collection)))
        .query(&[("pageSize", PAGE_SIZE)]);
      if let Some(token) = &page_token {
        req = req.query(&[("pageToken", token.as_str())]);
      }

      let page: ListResponse = check(req.send().await?, "list documents")
        .await?
        .json()
        .await?;
      for raw in page.documents {
        docs.push(raw.into_document()?);
      }

      match page.next_page_token {
        Some(token) if !token.is_empty() => page_token = Some(token),
        _ => break,
      }
    }

    debug!(%collection, count = docs.len(), "listed documents");
    Ok(docs)
  }

  /// `POST …/documents:runQuery` with a single equality filter.
  async fn get_where_eq(
    &self,
    collection: &str,
    field: &str,
    value: &Value,
  ) -> Result<Vec<Document>> {
    let body = json!({
      "structuredQuery": {
        "from": [{ "collectionId": collection }],
        "where": {
          "fieldFilter": {
            "field": { "fieldPath": field },
            "op": "EQUAL",
            "value": encode_value(value),
          }
        }
      }
    });

    let resp = self
      .auth(self.client.post(format!("{}:runQuery", self.documents_url())))
      .json(&body)
      .send()
      .await?;
    let results: Vec<QueryResult> = check(resp, "run query").await?.json().await?;

    let docs = results
      .into_iter()
      .filter_map(|r| r.document)
      .map(RawDocument::into_document)
      .collect::<Result<Vec<_>>>()?;

    debug!(%collection, %field, count = docs.len(), "queried documents");
    Ok(docs)
  }

  /// `PATCH …/documents/{collection}/{id}` masked to the patched fields and
  /// conditional on the document existing.
  ///
  /// An unmasked PATCH replaces the whole document, so an empty patch only
  /// checks that the document exists.
  async fn update(&self, collection: &str, id: &str, patch: Fields) -> Result<bool> {
    if patch.is_empty() {
      let resp = self
        .auth(self.client.get(self.document_url(collection, id)))
        .send()
        .await?;
      if resp.status() == StatusCode::NOT_FOUND {
        return Ok(false);
      }
      check(resp, "get document").await?;
      return Ok(true);
    }

    let mut params: Vec<(&str, &str)> = patch
      .keys()
      .map(|k| ("updateMask.fieldPaths", k.as_str()))
      .collect();
    params.push(("currentDocument.exists", "true"));

    let resp = self
      .auth(self.client.patch(self.document_url(collection, id)))
      .query(&params)
      .json(&json!({ "fields": encode_fields(&patch) }))
      .send()
      .await?;

    if resp.status() == StatusCode::NOT_FOUND {
      debug!(%collection, %id, "update target missing");
      return Ok(false);
    }
    check(resp, "update document").await?;

    debug!(%collection, %id, "updated document");
    Ok(true)
  }

  /// `DELETE …/documents/{collection}/{id}`.
  ///
  /// Firestore answers the same whether or not the document existed, so this
  /// always reports `true`.
  async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
    let resp = self
      .auth(self.client.delete(self.document_url(collection, id)))
      .send()
      .await?;
    check(resp, "delete document").await?;

    debug!(%collection, %id, "deleted document");
    Ok(true)
  }
}

#[cfg(test)]
mod tests {
  use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
  };

  use axum::{
    Router,
    extract::State,
    http::{Method, StatusCode as HttpStatus, Uri},
  };
  use roll_core::{
    Error as CoreError,
    access::Tracker,
    store::SUBJECTS,
    subject::SubjectPatch,
  };

  use super::*;

  fn store(endpoint: &str) -> FirestoreStore {
    FirestoreStore::new(FirestoreConfig {
      endpoint:   endpoint.into(),
      project_id: "class-performance".into(),
      database:   FirestoreConfig::DEFAULT_DATABASE.into(),
      api_key:    String::new(),
    })
    .unwrap()
  }

  #[test]
  fn urls_are_built_from_config() {
    let s = store("http://localhost:8080/");
    assert_eq!(
      s.document_url("subjects", "abc"),
      "http://localhost:8080/v1/projects/class-performance/databases/(default)/documents/subjects/abc"
    );
  }

  #[test]
  fn document_id_is_last_name_segment() {
    let raw: RawDocument = serde_json::from_value(json!({
      "name": "projects/p/databases/(default)/documents/attendance/Xy12",
      "fields": { "attended": { "booleanValue": false } },
      "createTime": "2025-10-19T08:00:00Z"
    }))
    .unwrap();
    let doc = raw.into_document().unwrap();
    assert_eq!(doc.id, "Xy12");
    assert_eq!(doc.fields["attended"], false);
  }

  #[test]
  fn query_results_skip_progress_only_elements() {
    let results: Vec<QueryResult> = serde_json::from_value(json!([
      { "readTime": "2025-10-19T08:00:00Z" }
    ]))
    .unwrap();
    assert!(results[0].document.is_none());
  }

  #[test]
  fn empty_collection_listing_decodes() {
    let page: ListResponse = serde_json::from_value(json!({})).unwrap();
    assert!(page.documents.is_empty());
    assert!(page.next_page_token.is_none());
  }

  // ─── Over HTTP ───────────────────────────────────────────────────────────

  const DOCS: &str = "projects/class-performance/databases/(default)/documents";

  /// A request as the fake server saw it.
  #[derive(Debug, Clone)]
  struct Seen {
    method: Method,
    uri:    String,
    body:   String,
  }

  /// Answers every request with the next canned reply, in order.
  #[derive(Clone, Default)]
  struct Fake {
    replies: Arc<Mutex<VecDeque<(u16, Value)>>>,
    seen:    Arc<Mutex<Vec<Seen>>>,
  }

  impl Fake {
    fn seen(&self) -> Vec<Seen> { self.seen.lock().unwrap().clone() }
  }

  async fn reply(
    State(fake): State<Fake>,
    method: Method,
    uri: Uri,
    body: String,
  ) -> (HttpStatus, String) {
    fake.seen.lock().unwrap().push(Seen { method, uri: uri.to_string(), body });
    let (status, json) = fake
      .replies
      .lock()
      .unwrap()
      .pop_front()
      .unwrap_or((500, json!({"error": "no reply queued"})));
    (HttpStatus::from_u16(status).unwrap(), json.to_string())
  }

  /// Start a fake Firestore on an ephemeral port and a store pointed at it.
  async fn serve(replies: Vec<(u16, Value)>) -> (FirestoreStore, Fake) {
    let fake = Fake::default();
    fake.replies.lock().unwrap().extend(replies);

    let app = Router::new().fallback(reply).with_state(fake.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
      .await
      .expect("bind fake firestore");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve fake firestore") });

    (store(&format!("http://{addr}")), fake)
  }

  fn subject_doc(id: &str, name: &str) -> Value {
    json!({
      "name": format!("{DOCS}/subjects/{id}"),
      "fields": {
        "name": { "stringValue": name },
        "schedule": { "arrayValue": { "values": [{ "mapValue": { "fields": {
          "day": { "stringValue": "Monday" },
          "startTime": { "stringValue": "09:00" },
          "endTime": { "stringValue": "10:00" }
        }}}]}},
        "totalClasses": { "integerValue": "2" },
        "attendedClasses": { "integerValue": "1" }
      }
    })
  }

  #[tokio::test]
  async fn insert_returns_id_from_created_name() {
    let (s, fake) = serve(vec![(200, subject_doc("Nw7", "Math"))]).await;

    let body: Fields = serde_json::from_value(json!({"name": "Math", "totalClasses": 0})).unwrap();
    let id = s.insert("subjects", body).await.unwrap();
    assert_eq!(id, "Nw7");

    let seen = fake.seen();
    assert_eq!(seen[0].method, Method::POST);
    assert!(seen[0].uri.ends_with("/documents/subjects"), "{}", seen[0].uri);
    let sent: Value = serde_json::from_str(&seen[0].body).unwrap();
    assert_eq!(sent["fields"]["name"], json!({"stringValue": "Math"}));
    assert_eq!(sent["fields"]["totalClasses"], json!({"integerValue": "0"}));
  }

  #[tokio::test]
  async fn get_all_follows_page_tokens() {
    let (s, fake) = serve(vec![
      (200, json!({ "documents": [subject_doc("a", "Art")], "nextPageToken": "p2" })),
      (200, json!({ "documents": [subject_doc("b", "Biology")] })),
    ])
    .await;

    let docs = s.get_all("subjects").await.unwrap();
    let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, ["a", "b"]);
    assert_eq!(docs[1].fields["totalClasses"], 2);

    let seen = fake.seen();
    assert_eq!(seen.len(), 2);
    assert!(!seen[0].uri.contains("pageToken"));
    assert!(seen[1].uri.contains("pageToken=p2"), "{}", seen[1].uri);
  }

  #[tokio::test]
  async fn run_query_drops_elements_without_document() {
    let entry = json!({
      "name": format!("{DOCS}/attendance/e1"),
      "fields": {
        "subjectId": { "stringValue": "s1" },
        "attended": { "booleanValue": true }
      }
    });
    let (s, fake) = serve(vec![(
      200,
      json!([
        { "readTime": "2026-10-19T08:00:00Z" },
        { "document": entry, "readTime": "2026-10-19T08:00:00Z" }
      ]),
    )])
    .await;

    let docs = s
      .get_where_eq("attendance", "subjectId", &json!("s1"))
      .await
      .unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id, "e1");

    let seen = fake.seen();
    assert!(seen[0].uri.ends_with("/documents:runQuery"), "{}", seen[0].uri);
    let sent: Value = serde_json::from_str(&seen[0].body).unwrap();
    let filter = &sent["structuredQuery"]["where"]["fieldFilter"];
    assert_eq!(filter["op"], "EQUAL");
    assert_eq!(filter["value"], json!({"stringValue": "s1"}));
  }

  #[tokio::test]
  async fn update_of_missing_document_is_not_found() {
    let (s, fake) = serve(vec![(404, json!({"error": {"code": 404, "status": "NOT_FOUND"}}))]).await;

    let tracker = Tracker::new(s);
    let patch = SubjectPatch { name: Some("Gone".into()), schedule: None };
    let err = tracker.update_subject("missing", &patch).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound { collection: SUBJECTS, .. }));

    let seen = fake.seen();
    assert_eq!(seen[0].method, Method::PATCH);
    assert!(seen[0].uri.contains("updateMask.fieldPaths=name"), "{}", seen[0].uri);
    assert!(seen[0].uri.contains("currentDocument.exists=true"), "{}", seen[0].uri);
  }

  #[tokio::test]
  async fn empty_patch_never_sends_a_patch() {
    let (s, fake) = serve(vec![
      (200, subject_doc("a", "Art")),
      (404, json!({})),
    ])
    .await;

    assert!(s.update("subjects", "a", Fields::new()).await.unwrap());
    assert!(!s.update("subjects", "b", Fields::new()).await.unwrap());
    assert!(fake.seen().iter().all(|r| r.method == Method::GET));
  }

  #[tokio::test]
  async fn server_errors_become_status_errors() {
    let (s, _fake) = serve(vec![(503, json!({"error": {"status": "UNAVAILABLE"}}))]).await;

    match s.get_all("subjects").await {
      Err(Error::Status { what, status, body }) => {
        assert_eq!(what, "list documents");
        assert_eq!(status.as_u16(), 503);
        assert!(body.contains("UNAVAILABLE"));
      }
      other => panic!("expected a status error, got {other:?}"),
    }
  }
}
