//! Local widget state for the subject and attendance forms.
//!
//! Forms only hold what the user typed. Turning that into a
//! [`SubjectDraft`] is where unparseable input is rejected.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use roll_core::{
  Error, Result,
  subject::{ClassSlot, SlotTime, Subject, SubjectDraft, Weekday},
};

/// Longest accepted time input (`HH:MM`).
const TIME_LEN: usize = 5;

/// What a key press asks of the owner of a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction<T = ()> {
  /// Keep editing.
  Pending,
  Submit(T),
  Cancel,
}

// ─── Subject form ────────────────────────────────────────────────────────────

/// One time slot as typed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SlotInput {
  pub day:   Weekday,
  pub start: String,
  pub end:   String,
}

/// The field under the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
  Name,
  Day(usize),
  Start(usize),
  End(usize),
}

/// State of the add/edit subject form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectForm {
  pub name:  String,
  pub slots: Vec<SlotInput>,
  /// Index into the flattened field order: name, then day/start/end per slot.
  focus:     usize,
}

impl SubjectForm {
  /// An empty form with a single Monday slot.
  pub fn blank() -> Self {
    Self {
      name:  String::new(),
      slots: vec![SlotInput::default()],
      focus: 0,
    }
  }

  /// A form pre-filled from an existing subject.
  pub fn from_subject(subject: &Subject) -> Self {
    let mut slots: Vec<SlotInput> = subject
      .schedule
      .iter()
      .map(|slot| SlotInput {
        day:   slot.day,
        start: slot.start_time.to_string(),
        end:   slot.end_time.to_string(),
      })
      .collect();
    if slots.is_empty() {
      slots.push(SlotInput::default());
    }
    Self { name: subject.name.clone(), slots, focus: 0 }
  }

  fn field_count(&self) -> usize { 1 + 3 * self.slots.len() }

  pub fn focused(&self) -> Field {
    match self.focus {
      0 => Field::Name,
      n => {
        let slot = (n - 1) / 3;
        match (n - 1) % 3 {
          0 => Field::Day(slot),
          1 => Field::Start(slot),
          _ => Field::End(slot),
        }
      }
    }
  }

  pub fn focus_next(&mut self) { self.focus = (self.focus + 1) % self.field_count(); }

  pub fn focus_prev(&mut self) {
    self.focus = (self.focus + self.field_count() - 1) % self.field_count();
  }

  /// Append a Monday slot and move to its day selector.
  pub fn add_slot(&mut self) {
    self.slots.push(SlotInput::default());
    self.focus = 1 + 3 * (self.slots.len() - 1);
  }

  /// Remove the slot under the cursor; the last remaining slot stays.
  pub fn remove_focused_slot(&mut self) {
    if self.slots.len() <= 1 {
      return;
    }
    let slot = match self.focused() {
      Field::Day(i) | Field::Start(i) | Field::End(i) => i,
      Field::Name => return,
    };
    self.slots.remove(slot);
    self.focus = self.focus.min(self.field_count() - 1);
  }

  fn focused_text(&mut self) -> Option<&mut String> {
    match self.focused() {
      Field::Name => Some(&mut self.name),
      Field::Start(i) => self.slots.get_mut(i).map(|s| &mut s.start),
      Field::End(i) => self.slots.get_mut(i).map(|s| &mut s.end),
      Field::Day(_) => None,
    }
  }

  fn type_char(&mut self, c: char) {
    let is_time = matches!(self.focused(), Field::Start(_) | Field::End(_));
    let Some(text) = self.focused_text() else { return };
    if is_time && (!(c.is_ascii_digit() || c == ':') || text.len() >= TIME_LEN) {
      return;
    }
    text.push(c);
  }

  fn cycle_day(&mut self, forward: bool) {
    if let Field::Day(i) = self.focused()
      && let Some(slot) = self.slots.get_mut(i)
    {
      slot.day = if forward { slot.day.next() } else { slot.day.prev() };
    }
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> FormAction {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
      KeyCode::Esc => return FormAction::Cancel,
      KeyCode::Enter => return FormAction::Submit(()),
      KeyCode::Char('n') if ctrl => self.add_slot(),
      KeyCode::Char('d') if ctrl => self.remove_focused_slot(),
      KeyCode::Tab | KeyCode::Down => self.focus_next(),
      KeyCode::BackTab | KeyCode::Up => self.focus_prev(),
      KeyCode::Left => self.cycle_day(false),
      KeyCode::Right | KeyCode::Char(' ') if matches!(self.focused(), Field::Day(_)) => {
        self.cycle_day(true)
      }
      KeyCode::Backspace => {
        if let Some(text) = self.focused_text() {
          text.pop();
        }
      }
      KeyCode::Char(c) if !ctrl => self.type_char(c),
      _ => {}
    }
    FormAction::Pending
  }

  /// Parse what was typed. Empty or malformed times are rejected here; the
  /// controller checks the rest.
  pub fn to_draft(&self) -> Result<SubjectDraft> {
    let schedule = self
      .slots
      .iter()
      .enumerate()
      .map(|(i, slot)| -> Result<ClassSlot> {
        let parse = |label: &str, text: &str| {
          text.parse::<SlotTime>().map_err(|_| {
            Error::validation(format!("time slot {}: {label} time must be HH:MM", i + 1))
          })
        };
        Ok(ClassSlot {
          day:        slot.day,
          start_time: parse("start", &slot.start)?,
          end_time:   parse("end", &slot.end)?,
        })
      })
      .collect::<Result<Vec<_>>>()?;

    Ok(SubjectDraft { name: self.name.clone(), schedule })
  }
}

// ─── Attendance form ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttendanceFocus {
  #[default]
  Notes,
  Present,
  Absent,
}

/// State of the attendance form: free-text notes and two submit buttons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttendanceForm {
  pub notes: String,
  pub focus: AttendanceFocus,
}

impl AttendanceForm {
  /// Returns `Submit(attended)` when one of the buttons is pressed.
  pub fn handle_key(&mut self, key: KeyEvent) -> FormAction<bool> {
    use AttendanceFocus::*;

    match key.code {
      KeyCode::Esc => return FormAction::Cancel,
      KeyCode::Tab => {
        self.focus = match self.focus {
          Notes => Present,
          Present => Absent,
          Absent => Notes,
        }
      }
      KeyCode::BackTab => {
        self.focus = match self.focus {
          Notes => Absent,
          Present => Notes,
          Absent => Present,
        }
      }
      KeyCode::Enter => match self.focus {
        Notes => self.notes.push('\n'),
        Present => return FormAction::Submit(true),
        Absent => return FormAction::Submit(false),
      },
      KeyCode::Left | KeyCode::Right if self.focus != Notes => {
        self.focus = if self.focus == Present { Absent } else { Present };
      }
      KeyCode::Backspace if self.focus == Notes => {
        self.notes.pop();
      }
      KeyCode::Char(c)
        if self.focus == Notes && !key.modifiers.contains(KeyModifiers::CONTROL) =>
      {
        self.notes.push(c)
      }
      _ => {}
    }
    FormAction::Pending
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn key(code: KeyCode) -> KeyEvent { KeyEvent::new(code, KeyModifiers::NONE) }

  fn ctrl(c: char) -> KeyEvent { KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL) }

  fn type_str(form: &mut SubjectForm, s: &str) {
    for c in s.chars() {
      form.handle_key(key(KeyCode::Char(c)));
    }
  }

  #[test]
  fn blank_form_has_one_monday_slot() {
    let form = SubjectForm::blank();
    assert_eq!(form.slots, vec![SlotInput::default()]);
    assert_eq!(form.slots[0].day, Weekday::Monday);
    assert_eq!(form.focused(), Field::Name);
  }

  #[test]
  fn typing_builds_a_draft() {
    let mut form = SubjectForm::blank();
    type_str(&mut form, "Math");
    form.handle_key(key(KeyCode::Tab));
    form.handle_key(key(KeyCode::Right));
    form.handle_key(key(KeyCode::Tab));
    type_str(&mut form, "09:00");
    form.handle_key(key(KeyCode::Tab));
    type_str(&mut form, "10:30x9");

    let draft = form.to_draft().unwrap();
    assert_eq!(draft.name, "Math");
    assert_eq!(draft.schedule.len(), 1);
    assert_eq!(draft.schedule[0].day, Weekday::Tuesday);
    assert_eq!(draft.schedule[0].start_time.to_string(), "09:00");
    assert_eq!(draft.schedule[0].end_time.to_string(), "10:30");
    assert!(draft.validate().is_ok());
  }

  #[test]
  fn empty_times_are_rejected() {
    let mut form = SubjectForm::blank();
    type_str(&mut form, "Math");
    assert!(matches!(form.to_draft(), Err(Error::ValidationFailed(_))));
  }

  #[test]
  fn last_slot_cannot_be_removed() {
    let mut form = SubjectForm::blank();
    form.handle_key(key(KeyCode::Tab));
    form.handle_key(ctrl('d'));
    assert_eq!(form.slots.len(), 1);

    form.handle_key(ctrl('n'));
    assert_eq!(form.slots.len(), 2);
    assert_eq!(form.focused(), Field::Day(1));

    form.handle_key(ctrl('d'));
    assert_eq!(form.slots.len(), 1);
    assert!(matches!(form.focused(), Field::Name | Field::Day(0) | Field::Start(0) | Field::End(0)));
  }

  #[test]
  fn focus_wraps_both_ways() {
    let mut form = SubjectForm::blank();
    form.handle_key(key(KeyCode::BackTab));
    assert_eq!(form.focused(), Field::End(0));
    form.handle_key(key(KeyCode::Tab));
    assert_eq!(form.focused(), Field::Name);
  }

  #[test]
  fn edit_form_is_prefilled() {
    let subject = Subject {
      id:               "s1".into(),
      name:             "Physics".into(),
      schedule:         vec![ClassSlot {
        day:        Weekday::Thursday,
        start_time: "14:00".parse().unwrap(),
        end_time:   "15:00".parse().unwrap(),
      }],
      total_classes:    3,
      attended_classes: 2,
      created_at:       None,
    };
    let form = SubjectForm::from_subject(&subject);
    assert_eq!(form.name, "Physics");
    assert_eq!(form.slots[0].start, "14:00");
    assert_eq!(form.to_draft().unwrap().schedule, subject.schedule);
  }

  #[test]
  fn attendance_buttons_submit_choice() {
    let mut form = AttendanceForm::default();
    for c in "limits".chars() {
      assert_eq!(form.handle_key(key(KeyCode::Char(c))), FormAction::Pending);
    }
    form.handle_key(key(KeyCode::Enter));
    assert_eq!(form.notes, "limits\n");

    form.handle_key(key(KeyCode::Tab));
    assert_eq!(form.handle_key(key(KeyCode::Enter)), FormAction::Submit(true));

    form.handle_key(key(KeyCode::Right));
    assert_eq!(form.handle_key(key(KeyCode::Enter)), FormAction::Submit(false));

    assert_eq!(form.handle_key(key(KeyCode::Esc)), FormAction::Cancel);
  }
}
