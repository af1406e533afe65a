//! [`Tracker`] — typed operations over the two collections.
//!
//! Every backend error becomes [`Error::StoreUnavailable`]; every document
//! read back passes through [`crate::codec`].

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, error};

use crate::{
  Error, Result, codec,
  entry::AttendanceEntry,
  store::{ATTENDANCE, DocumentStore, SUBJECTS},
  subject::{Subject, SubjectDraft, SubjectPatch},
};

/// The data access layer of the attendance tracker.
#[derive(Debug, Clone)]
pub struct Tracker<S> {
  store: S,
}

impl<S: DocumentStore> Tracker<S> {
  pub fn new(store: S) -> Self { Self { store } }

  /// The backing store.
  pub fn store(&self) -> &S { &self.store }

  // ── Subjects ──────────────────────────────────────────────────────────────

  /// Every subject that decodes. Documents that fail validation are logged
  /// and left out so one bad record cannot hide the rest.
  pub async fn list_subjects(&self) -> Result<Vec<Subject>> {
    let docs = self.store.get_all(SUBJECTS).await.map_err(Error::unavailable)?;
    debug!(count = docs.len(), "fetched subjects");

    let subjects = docs
      .into_iter()
      .filter_map(|doc| {
        let id = doc.id.clone();
        codec::decode_subject(doc)
          .inspect_err(|e| error!(%id, error = %e, "skipping malformed subject"))
          .ok()
      })
      .collect();
    Ok(subjects)
  }

  /// Insert a subject with zeroed counters. The draft is expected to have
  /// been validated already.
  pub async fn create_subject(&self, draft: &SubjectDraft) -> Result<Subject> {
    let created_at = Utc::now();
    let fields = codec::encode_new_subject(draft, created_at)?;
    let id = self
      .store
      .insert(SUBJECTS, fields)
      .await
      .map_err(Error::unavailable)?;
    debug!(%id, "created subject");

    Ok(Subject {
      id,
      name: draft.name.trim().to_owned(),
      schedule: draft.schedule.clone(),
      total_classes: 0,
      attended_classes: 0,
      created_at: Some(created_at),
    })
  }

  /// Change a subject's name and/or schedule.
  pub async fn update_subject(&self, id: &str, patch: &SubjectPatch) -> Result<()> {
    if patch.is_empty() {
      return Ok(());
    }
    let fields = codec::encode_subject_patch(patch)?;
    let found = self
      .store
      .update(SUBJECTS, id, fields)
      .await
      .map_err(Error::unavailable)?;
    if !found {
      return Err(Error::NotFound { collection: SUBJECTS, id: id.to_owned() });
    }
    Ok(())
  }

  /// Remove a subject. Its attendance entries stay where they are, and a
  /// subject that is already gone counts as deleted.
  pub async fn delete_subject(&self, id: &str) -> Result<()> {
    let existed = self
      .store
      .delete(SUBJECTS, id)
      .await
      .map_err(Error::unavailable)?;
    if !existed {
      debug!(%id, "subject already absent");
    }
    Ok(())
  }

  // ── Attendance ────────────────────────────────────────────────────────────

  /// Append an attendance entry, then bump the subject's counters.
  ///
  /// The counters are computed from `subject`, the caller's snapshot, and
  /// written as absolute values. The two writes are not atomic: if the
  /// second one fails the entry remains and the error is returned.
  pub async fn record_attendance(
    &self,
    subject: &Subject,
    attended: bool,
    notes: &str,
  ) -> Result<AttendanceEntry> {
    let date = Utc::now();
    let fields = codec::encode_new_entry(&subject.id, date, attended, notes)?;
    let entry_id = self
      .store
      .insert(ATTENDANCE, fields)
      .await
      .map_err(Error::unavailable)?;

    let total = subject.total_classes.saturating_add(1);
    let attended_count = if attended {
      subject.attended_classes.saturating_add(1)
    } else {
      subject.attended_classes
    };

    let found = self
      .store
      .update(SUBJECTS, &subject.id, codec::encode_counters(total, attended_count))
      .await
      .map_err(Error::unavailable)?;
    if !found {
      return Err(Error::NotFound { collection: SUBJECTS, id: subject.id.clone() });
    }
    debug!(subject = %subject.id, entry = %entry_id, attended, "recorded attendance");

    Ok(AttendanceEntry {
      id: entry_id,
      subject_id: subject.id.clone(),
      date,
      attended,
      learning_notes: notes.to_owned(),
      timestamp: date.timestamp_millis(),
    })
  }

  /// Every entry recorded for `subject_id`, in store order.
  pub async fn list_attendance_for(&self, subject_id: &str) -> Result<Vec<AttendanceEntry>> {
    let key = Value::String(subject_id.to_owned());
    let docs = self
      .store
      .get_where_eq(ATTENDANCE, "subjectId", &key)
      .await
      .map_err(Error::unavailable)?;
    docs.into_iter().map(codec::decode_entry).collect()
  }
}
