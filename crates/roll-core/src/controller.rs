//! Application state and the intents that change it.
//!
//! The controller owns the subject list and the transient selection state of
//! the UI. Mutating intents never patch the list locally: after a successful
//! write the whole list is fetched again, so displayed counters always match
//! the store.

use tracing::{error, info};

use crate::{
  Result,
  access::Tracker,
  entry::AttendanceEntry,
  store::DocumentStore,
  subject::{Subject, SubjectDraft, SubjectPatch},
};

// ─── Notices ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
  Success,
  Error,
}

/// A transient, user-visible notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
  pub level:   NoticeLevel,
  pub message: String,
}

impl Notice {
  pub fn success(message: impl Into<String>) -> Self {
    Self { level: NoticeLevel::Success, message: message.into() }
  }

  pub fn error(message: impl Into<String>) -> Self {
    Self { level: NoticeLevel::Error, message: message.into() }
  }
}

/// A subject together with its attendance entries, as fetched.
#[derive(Debug, Clone)]
pub struct HistoryView {
  pub subject: Subject,
  pub entries: Vec<AttendanceEntry>,
}

// ─── Controller ──────────────────────────────────────────────────────────────

pub struct Controller<S> {
  tracker: Tracker<S>,

  /// Subjects as of the last successful fetch.
  pub subjects: Vec<Subject>,

  /// Subject whose attendance form is open.
  pub selected_for_attendance: Option<Subject>,

  /// Subject whose edit form is open.
  pub editing_subject: Option<Subject>,

  pub add_form_visible: bool,

  pub history_view: Option<HistoryView>,

  /// `true` until the first fetch has finished, successfully or not.
  pub loading: bool,

  pub notice: Option<Notice>,
}

impl<S: DocumentStore> Controller<S> {
  pub fn new(tracker: Tracker<S>) -> Self {
    Self {
      tracker,
      subjects: Vec::new(),
      selected_for_attendance: None,
      editing_subject: None,
      add_form_visible: false,
      history_view: None,
      loading: true,
      notice: None,
    }
  }

  pub fn tracker(&self) -> &Tracker<S> { &self.tracker }

  // ── Loading ───────────────────────────────────────────────────────────────

  /// Initial fetch. Clears `loading` whatever the outcome.
  pub async fn load(&mut self) {
    self.refresh().await;
    self.loading = false;
  }

  /// Replace the subject list with the store's. On failure the old list
  /// stays and an error notice is raised.
  pub async fn refresh(&mut self) {
    match self.tracker.list_subjects().await {
      Ok(subjects) => self.subjects = subjects,
      Err(e) => {
        error!(error = %e, "failed to fetch subjects");
        self.notice = Some(Notice::error(format!("Failed to fetch subjects: {e}")));
      }
    }
  }

  // ── Notices ───────────────────────────────────────────────────────────────

  pub fn notify(&mut self, notice: Notice) { self.notice = Some(notice); }

  pub fn dismiss_notice(&mut self) { self.notice = None; }

  fn fail(&mut self, action: &str, e: &crate::Error) {
    error!(error = %e, "failed to {action}");
    self.notice = Some(Notice::error(format!("Failed to {action}: {e}")));
  }

  // ── Add ───────────────────────────────────────────────────────────────────

  pub fn show_add_form(&mut self) { self.add_form_visible = true; }

  pub fn close_add_form(&mut self) { self.add_form_visible = false; }

  pub async fn add_subject(&mut self, draft: SubjectDraft) -> Result<()> {
    let result = match draft.validate() {
      Ok(()) => self.tracker.create_subject(&draft).await.map(|_| ()),
      Err(e) => Err(e),
    };
    if let Err(e) = result {
      self.fail("add subject", &e);
      return Err(e);
    }

    info!(name = %draft.name.trim(), "subject added");
    self.notice = Some(Notice::success("Subject added successfully"));
    self.add_form_visible = false;
    self.refresh().await;
    Ok(())
  }

  // ── Edit ──────────────────────────────────────────────────────────────────

  pub fn begin_edit(&mut self, subject: Subject) { self.editing_subject = Some(subject); }

  pub fn cancel_edit(&mut self) { self.editing_subject = None; }

  /// Replace a subject's name and schedule. Counters are left alone.
  pub async fn edit_subject(&mut self, id: &str, draft: SubjectDraft) -> Result<()> {
    let result = match draft.validate() {
      Ok(()) => {
        self
          .tracker
          .update_subject(id, &SubjectPatch::from(draft))
          .await
      }
      Err(e) => Err(e),
    };
    if let Err(e) = result {
      self.fail("update subject", &e);
      return Err(e);
    }

    info!(%id, "subject updated");
    self.notice = Some(Notice::success("Subject updated successfully"));
    self.editing_subject = None;
    self.refresh().await;
    Ok(())
  }

  // ── Delete ────────────────────────────────────────────────────────────────

  /// Delete a subject. Its attendance entries are kept.
  pub async fn delete_subject(&mut self, id: &str) -> Result<()> {
    if let Err(e) = self.tracker.delete_subject(id).await {
      self.fail("delete subject", &e);
      return Err(e);
    }

    info!(%id, "subject deleted");
    self.notice = Some(Notice::success("Subject deleted successfully"));
    self.refresh().await;
    Ok(())
  }

  // ── Attendance ────────────────────────────────────────────────────────────

  /// Open the attendance form for `subject`. Both quick "Present" and
  /// "Absent" actions land here; the choice is made in the form.
  pub fn open_attendance_form(&mut self, subject: Subject) {
    self.selected_for_attendance = Some(subject);
  }

  pub fn cancel_attendance(&mut self) { self.selected_for_attendance = None; }

  /// Record attendance for the selected subject. Does nothing if no
  /// attendance form is open.
  pub async fn submit_attendance(&mut self, attended: bool, notes: &str) -> Result<()> {
    let Some(subject) = self.selected_for_attendance.clone() else {
      return Ok(());
    };

    if let Err(e) = self.tracker.record_attendance(&subject, attended, notes).await {
      self.fail("mark attendance", &e);
      return Err(e);
    }

    info!(subject = %subject.id, attended, "attendance marked");
    self.notice = Some(Notice::success("Attendance marked successfully"));
    self.selected_for_attendance = None;
    self.refresh().await;
    Ok(())
  }

  // ── History ───────────────────────────────────────────────────────────────

  pub async fn view_history(&mut self, subject: Subject) -> Result<()> {
    match self.tracker.list_attendance_for(&subject.id).await {
      Ok(entries) => {
        self.history_view = Some(HistoryView { subject, entries });
        Ok(())
      }
      Err(e) => {
        self.fail("fetch attendance history", &e);
        Err(e)
      }
    }
  }

  pub fn close_history(&mut self) { self.history_view = None; }
}
