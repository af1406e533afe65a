//! Encoding and decoding between domain types and store documents.
//!
//! Stored documents are schema-less, so every read goes through a typed
//! decode here. A document with missing or mistyped fields fails with
//! [`Error::ValidationFailed`] instead of leaking half-filled values upward.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
  Error, Result,
  entry::AttendanceEntry,
  store::{Document, Fields},
  subject::{ClassSlot, Subject, SubjectDraft, SubjectPatch},
};

// ─── Document bodies ─────────────────────────────────────────────────────────

/// Body of a `subjects` document.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubjectBody {
  name:             String,
  schedule:         Vec<ClassSlot>,
  total_classes:    u32,
  attended_classes: u32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  created_at:       Option<DateTime<Utc>>,
}

/// Body of an `attendance` document.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntryBody {
  subject_id:     String,
  date:           DateTime<Utc>,
  attended:       bool,
  #[serde(default)]
  learning_notes: String,
  timestamp:      i64,
}

fn to_fields<T: Serialize>(body: &T) -> Result<Fields> {
  match serde_json::to_value(body) {
    Ok(Value::Object(fields)) => Ok(fields),
    Ok(other) => Err(Error::validation(format!(
      "document body must be an object, got {other}"
    ))),
    Err(e) => Err(Error::validation(e.to_string())),
  }
}

fn from_fields<T: DeserializeOwned>(
  collection: &str,
  doc: Document,
) -> Result<(String, T)> {
  let id = doc.id;
  serde_json::from_value(Value::Object(doc.fields))
    .map(|body| (id.clone(), body))
    .map_err(|e| Error::validation(format!("malformed {collection} document {id}: {e}")))
}

// ─── Subjects ────────────────────────────────────────────────────────────────

/// Fields for a freshly created subject: counters start at zero.
pub fn encode_new_subject(draft: &SubjectDraft, created_at: DateTime<Utc>) -> Result<Fields> {
  to_fields(&SubjectBody {
    name:             draft.name.trim().to_owned(),
    schedule:         draft.schedule.clone(),
    total_classes:    0,
    attended_classes: 0,
    created_at:       Some(created_at),
  })
}

/// Fields for a partial subject update; only the present members appear.
pub fn encode_subject_patch(patch: &SubjectPatch) -> Result<Fields> {
  let mut fields = Fields::new();
  if let Some(name) = &patch.name {
    fields.insert("name".into(), Value::String(name.trim().to_owned()));
  }
  if let Some(schedule) = &patch.schedule {
    let schedule =
      serde_json::to_value(schedule).map_err(|e| Error::validation(e.to_string()))?;
    fields.insert("schedule".into(), schedule);
  }
  Ok(fields)
}

/// Fields that overwrite a subject's counters.
pub fn encode_counters(total_classes: u32, attended_classes: u32) -> Fields {
  let mut fields = Fields::new();
  fields.insert("totalClasses".into(), total_classes.into());
  fields.insert("attendedClasses".into(), attended_classes.into());
  fields
}

/// Decode a stored subject, enforcing the same rules as a fresh draft plus
/// `attended <= total`.
pub fn decode_subject(doc: Document) -> Result<Subject> {
  let (id, body): (String, SubjectBody) = from_fields(crate::store::SUBJECTS, doc)?;

  let draft = SubjectDraft { name: body.name, schedule: body.schedule };
  draft.validate().map_err(|e| match e {
    Error::ValidationFailed(reason) => Error::validation(format!("subject {id}: {reason}")),
    other => other,
  })?;
  if body.attended_classes > body.total_classes {
    return Err(Error::validation(format!(
      "subject {id} has attended {} of {} classes",
      body.attended_classes, body.total_classes
    )));
  }

  Ok(Subject {
    id,
    name: draft.name,
    schedule: draft.schedule,
    total_classes: body.total_classes,
    attended_classes: body.attended_classes,
    created_at: body.created_at,
  })
}

// ─── Attendance ──────────────────────────────────────────────────────────────

/// Fields for a new attendance entry recorded at `date`.
pub fn encode_new_entry(
  subject_id: &str,
  date: DateTime<Utc>,
  attended: bool,
  learning_notes: &str,
) -> Result<Fields> {
  to_fields(&EntryBody {
    subject_id: subject_id.to_owned(),
    date,
    attended,
    learning_notes: learning_notes.to_owned(),
    timestamp: date.timestamp_millis(),
  })
}

pub fn decode_entry(doc: Document) -> Result<AttendanceEntry> {
  let (id, body): (String, EntryBody) = from_fields(crate::store::ATTENDANCE, doc)?;
  Ok(AttendanceEntry {
    id,
    subject_id: body.subject_id,
    date: body.date,
    attended: body.attended,
    learning_notes: body.learning_notes,
    timestamp: body.timestamp,
  })
}
