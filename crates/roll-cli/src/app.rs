//! Presentation state and key dispatch.
//!
//! [`App`] owns only widget state (cursor, filter, form contents). Everything
//! that touches the store is an intent on the [`Controller`].

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use roll_core::{
  access::Tracker,
  controller::{Controller, Notice},
  store::DocumentStore,
  subject::Subject,
};

use crate::form::{AttendanceForm, FormAction, SubjectForm};

// ─── Screen ───────────────────────────────────────────────────────────────────

/// What currently has keyboard focus. Derived from controller and widget
/// state rather than stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
  SubjectList,
  Filter,
  ConfirmDelete,
  SubjectForm,
  Attendance,
  History,
}

// ─── App ──────────────────────────────────────────────────────────────────────

pub struct App<S> {
  pub controller: Controller<S>,

  /// Cursor position within the *filtered* subject list.
  pub list_cursor: usize,

  /// Current fuzzy-filter string (only active when `filter_active`).
  pub filter: String,

  /// Whether the user is typing a filter query.
  pub filter_active: bool,

  /// Whether the quick Present/Absent row is open on the cursor card.
  pub quick_mark: bool,

  /// Subject awaiting delete confirmation.
  pub confirm_delete: Option<Subject>,

  /// Contents of the add/edit form while it is open.
  pub subject_form: Option<SubjectForm>,

  pub attendance_form: AttendanceForm,

  /// Row offset within the history table.
  pub history_scroll: usize,
}

impl<S: DocumentStore> App<S> {
  pub fn new(tracker: Tracker<S>) -> Self {
    Self {
      controller: Controller::new(tracker),
      list_cursor: 0,
      filter: String::new(),
      filter_active: false,
      quick_mark: false,
      confirm_delete: None,
      subject_form: None,
      attendance_form: AttendanceForm::default(),
      history_scroll: 0,
    }
  }

  pub fn screen(&self) -> Screen {
    let c = &self.controller;
    if self.confirm_delete.is_some() {
      Screen::ConfirmDelete
    } else if c.history_view.is_some() {
      Screen::History
    } else if c.add_form_visible || c.editing_subject.is_some() {
      Screen::SubjectForm
    } else if c.selected_for_attendance.is_some() {
      Screen::Attendance
    } else if self.filter_active {
      Screen::Filter
    } else {
      Screen::SubjectList
    }
  }

  // ── Filtered list ─────────────────────────────────────────────────────────

  /// Subjects that match the current filter query.
  pub fn filtered_subjects(&self) -> Vec<&Subject> {
    if self.filter.is_empty() {
      return self.controller.subjects.iter().collect();
    }
    let matcher = SkimMatcherV2::default();
    self
      .controller
      .subjects
      .iter()
      .filter(|s| matcher.fuzzy_match(&s.name, &self.filter).is_some())
      .collect()
  }

  /// The subject under the list cursor in the filtered view, if any.
  pub fn cursor_subject(&self) -> Option<&Subject> {
    self.filtered_subjects().get(self.list_cursor).copied()
  }

  /// Keep the cursor inside the list after it shrinks.
  fn clamp_cursor(&mut self) {
    let len = self.filtered_subjects().len();
    self.list_cursor = self.list_cursor.min(len.saturating_sub(1));
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    // Global: Ctrl-C quits from anywhere.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return Ok(false);
    }

    // Notices last until the next key press.
    self.controller.dismiss_notice();

    let cont = match self.screen() {
      Screen::SubjectList => self.handle_list_key(key).await,
      Screen::Filter => {
        self.handle_filter_key(key);
        true
      }
      Screen::ConfirmDelete => {
        self.handle_confirm_key(key).await;
        true
      }
      Screen::SubjectForm => {
        self.handle_subject_form_key(key).await;
        true
      }
      Screen::Attendance => {
        self.handle_attendance_key(key).await;
        true
      }
      Screen::History => {
        self.handle_history_key(key);
        true
      }
    };
    Ok(cont)
  }

  fn handle_filter_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.filter_active = false;
        self.filter.clear();
        self.list_cursor = 0;
      }
      KeyCode::Enter => {
        self.filter_active = false;
        self.list_cursor = 0;
      }
      KeyCode::Backspace => {
        self.filter.pop();
        self.list_cursor = 0;
      }
      KeyCode::Char(c) => {
        self.filter.push(c);
        self.list_cursor = 0;
      }
      _ => {}
    }
  }

  async fn handle_list_key(&mut self, key: KeyEvent) -> bool {
    // The quick-mark row captures its two choices. Both open the same
    // attendance form; the actual choice is made there.
    if self.quick_mark {
      if let KeyCode::Char('p' | 'x') = key.code {
        self.quick_mark = false;
        if let Some(subject) = self.cursor_subject().cloned() {
          self.attendance_form = AttendanceForm::default();
          self.controller.open_attendance_form(subject);
        }
        return true;
      }
      if key.code == KeyCode::Esc {
        self.quick_mark = false;
        return true;
      }
    }

    match key.code {
      // Quit
      KeyCode::Char('q') => return false,

      // Navigation
      KeyCode::Down | KeyCode::Char('j') => {
        let len = self.filtered_subjects().len();
        if len > 0 && self.list_cursor + 1 < len {
          self.list_cursor += 1;
          self.quick_mark = false;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        if self.list_cursor > 0 {
          self.list_cursor -= 1;
          self.quick_mark = false;
        }
      }

      // Filter
      KeyCode::Char('/') => {
        self.filter_active = true;
        self.filter.clear();
        self.list_cursor = 0;
        self.quick_mark = false;
      }

      // Intents
      KeyCode::Char('a') => {
        self.subject_form = Some(SubjectForm::blank());
        self.controller.show_add_form();
      }
      KeyCode::Char('e') => {
        if let Some(subject) = self.cursor_subject().cloned() {
          self.subject_form = Some(SubjectForm::from_subject(&subject));
          self.controller.begin_edit(subject);
        }
      }
      KeyCode::Char('d') => {
        self.confirm_delete = self.cursor_subject().cloned();
      }
      KeyCode::Char('m') => {
        self.quick_mark = !self.quick_mark && self.cursor_subject().is_some();
      }
      KeyCode::Enter | KeyCode::Char('h') => {
        if let Some(subject) = self.cursor_subject().cloned()
          && self.controller.view_history(subject).await.is_ok()
        {
          self.history_scroll = 0;
        }
      }
      KeyCode::Char('r') => {
        self.controller.refresh().await;
        self.clamp_cursor();
      }

      _ => {}
    }
    true
  }

  async fn handle_confirm_key(&mut self, key: KeyEvent) {
    let Some(subject) = self.confirm_delete.take() else { return };
    if let KeyCode::Char('y' | 'Y') = key.code
      && self.controller.delete_subject(&subject.id).await.is_ok()
    {
      self.clamp_cursor();
    }
  }

  async fn handle_subject_form_key(&mut self, key: KeyEvent) {
    let Some(form) = self.subject_form.as_mut() else {
      // Form state went missing; fall back to a fresh one.
      self.subject_form = Some(match &self.controller.editing_subject {
        Some(subject) => SubjectForm::from_subject(subject),
        None => SubjectForm::blank(),
      });
      return;
    };

    match form.handle_key(key) {
      FormAction::Pending => {}
      FormAction::Cancel => {
        self.subject_form = None;
        self.controller.close_add_form();
        self.controller.cancel_edit();
      }
      FormAction::Submit(()) => {
        let editing = self.controller.editing_subject.as_ref().map(|s| s.id.clone());
        let action = if editing.is_some() { "update subject" } else { "add subject" };

        let draft = match form.to_draft() {
          Ok(draft) => draft,
          Err(e) => {
            self.controller.notify(Notice::error(format!("Failed to {action}: {e}")));
            return;
          }
        };

        let result = match editing {
          Some(id) => self.controller.edit_subject(&id, draft).await,
          None => self.controller.add_subject(draft).await,
        };
        if result.is_ok() {
          self.subject_form = None;
          self.clamp_cursor();
        }
      }
    }
  }

  async fn handle_attendance_key(&mut self, key: KeyEvent) {
    match self.attendance_form.handle_key(key) {
      FormAction::Pending => {}
      FormAction::Cancel => {
        self.attendance_form = AttendanceForm::default();
        self.controller.cancel_attendance();
      }
      FormAction::Submit(attended) => {
        let notes = self.attendance_form.notes.trim_end().to_owned();
        if self
          .controller
          .submit_attendance(attended, &notes)
          .await
          .is_ok()
        {
          self.attendance_form = AttendanceForm::default();
        }
      }
    }
  }

  fn handle_history_key(&mut self, key: KeyEvent) {
    let len = self
      .controller
      .history_view
      .as_ref()
      .map_or(0, |h| h.entries.len());
    match key.code {
      KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter => {
        self.controller.close_history();
        self.history_scroll = 0;
      }
      KeyCode::Down | KeyCode::Char('j') => {
        if self.history_scroll + 1 < len {
          self.history_scroll += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.history_scroll = self.history_scroll.saturating_sub(1);
      }
      _ => {}
    }
  }
}

#[cfg(test)]
mod tests {
  use roll_core::{
    controller::NoticeLevel,
    subject::{ClassSlot, SubjectDraft, Weekday},
  };
  use roll_store_sqlite::SqliteStore;

  use super::*;

  async fn app() -> App<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let mut app = App::new(Tracker::new(store));
    app.controller.load().await;
    app
  }

  async fn with_math() -> App<SqliteStore> {
    let mut app = app().await;
    app
      .controller
      .add_subject(SubjectDraft {
        name:     "Math".into(),
        schedule: vec![ClassSlot {
          day:        Weekday::Monday,
          start_time: "09:00".parse().unwrap(),
          end_time:   "10:00".parse().unwrap(),
        }],
      })
      .await
      .unwrap();
    app
  }

  fn key(code: KeyCode) -> KeyEvent { KeyEvent::new(code, KeyModifiers::NONE) }

  async fn press(app: &mut App<SqliteStore>, code: KeyCode) -> bool {
    app.handle_key(key(code)).await.unwrap()
  }

  async fn type_str(app: &mut App<SqliteStore>, s: &str) {
    for c in s.chars() {
      press(app, KeyCode::Char(c)).await;
    }
  }

  #[tokio::test]
  async fn add_subject_through_the_form() {
    let mut app = app().await;
    press(&mut app, KeyCode::Char('a')).await;
    assert_eq!(app.screen(), Screen::SubjectForm);

    type_str(&mut app, "History").await;
    press(&mut app, KeyCode::Tab).await;
    press(&mut app, KeyCode::Tab).await;
    type_str(&mut app, "13:00").await;
    press(&mut app, KeyCode::Tab).await;
    type_str(&mut app, "14:00").await;
    press(&mut app, KeyCode::Enter).await;

    assert_eq!(app.screen(), Screen::SubjectList);
    assert!(app.subject_form.is_none());
    assert_eq!(app.controller.subjects.len(), 1);
    assert_eq!(app.controller.subjects[0].name, "History");
  }

  #[tokio::test]
  async fn bad_form_input_keeps_form_open() {
    let mut app = app().await;
    press(&mut app, KeyCode::Char('a')).await;
    type_str(&mut app, "History").await;
    press(&mut app, KeyCode::Enter).await;

    assert_eq!(app.screen(), Screen::SubjectForm);
    assert_eq!(app.controller.notice.as_ref().unwrap().level, NoticeLevel::Error);
    assert!(app.controller.subjects.is_empty());

    press(&mut app, KeyCode::Esc).await;
    assert_eq!(app.screen(), Screen::SubjectList);
    assert!(app.controller.notice.is_none());
  }

  #[tokio::test]
  async fn both_quick_marks_open_the_attendance_form() {
    for choice in ['p', 'x'] {
      let mut app = with_math().await;
      press(&mut app, KeyCode::Char('m')).await;
      assert!(app.quick_mark);
      press(&mut app, KeyCode::Char(choice)).await;

      assert_eq!(app.screen(), Screen::Attendance);
      assert!(!app.quick_mark);
      // Opening the form records nothing by itself.
      assert_eq!(app.controller.subjects[0].total_classes, 0);
    }
  }

  #[tokio::test]
  async fn attendance_form_records_absence() {
    let mut app = with_math().await;
    press(&mut app, KeyCode::Char('m')).await;
    press(&mut app, KeyCode::Char('p')).await;

    type_str(&mut app, "skipped").await;
    press(&mut app, KeyCode::BackTab).await;
    press(&mut app, KeyCode::Enter).await;

    assert_eq!(app.screen(), Screen::SubjectList);
    let subject = &app.controller.subjects[0];
    assert_eq!((subject.total_classes, subject.attended_classes), (1, 0));

    press(&mut app, KeyCode::Char('h')).await;
    assert_eq!(app.screen(), Screen::History);
    let history = app.controller.history_view.as_ref().unwrap();
    assert_eq!(history.entries[0].learning_notes, "skipped");
    assert!(!history.entries[0].attended);

    press(&mut app, KeyCode::Esc).await;
    assert_eq!(app.screen(), Screen::SubjectList);
  }

  #[tokio::test]
  async fn delete_requires_confirmation() {
    let mut app = with_math().await;

    press(&mut app, KeyCode::Char('d')).await;
    assert_eq!(app.screen(), Screen::ConfirmDelete);
    press(&mut app, KeyCode::Char('n')).await;
    assert_eq!(app.controller.subjects.len(), 1);

    press(&mut app, KeyCode::Char('d')).await;
    press(&mut app, KeyCode::Char('y')).await;
    assert!(app.controller.subjects.is_empty());
    assert_eq!(app.list_cursor, 0);
  }

  #[tokio::test]
  async fn edit_prefills_and_keeps_counters() {
    let mut app = with_math().await;
    let subject = app.controller.subjects[0].clone();
    app.controller.open_attendance_form(subject);
    app.controller.submit_attendance(true, "").await.unwrap();

    press(&mut app, KeyCode::Char('e')).await;
    assert_eq!(app.subject_form.as_ref().unwrap().name, "Math");
    type_str(&mut app, " II").await;
    press(&mut app, KeyCode::Enter).await;

    let subject = &app.controller.subjects[0];
    assert_eq!(subject.name, "Math II");
    assert_eq!((subject.total_classes, subject.attended_classes), (1, 1));
  }

  #[tokio::test]
  async fn filter_narrows_by_name() {
    let mut app = with_math().await;
    press(&mut app, KeyCode::Char('a')).await;
    type_str(&mut app, "Biology").await;
    press(&mut app, KeyCode::Tab).await;
    press(&mut app, KeyCode::Tab).await;
    type_str(&mut app, "08:00").await;
    press(&mut app, KeyCode::Tab).await;
    type_str(&mut app, "09:00").await;
    press(&mut app, KeyCode::Enter).await;
    assert_eq!(app.filtered_subjects().len(), 2);

    press(&mut app, KeyCode::Char('/')).await;
    type_str(&mut app, "bio").await;
    assert_eq!(app.screen(), Screen::Filter);
    let names: Vec<&str> = app.filtered_subjects().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["Biology"]);

    press(&mut app, KeyCode::Esc).await;
    assert_eq!(app.filtered_subjects().len(), 2);
  }

  #[tokio::test]
  async fn q_quits_from_the_list() {
    let mut app = app().await;
    assert!(!press(&mut app, KeyCode::Char('q')).await);
  }
}
