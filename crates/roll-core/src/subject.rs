//! Subject — a tracked class with a weekly schedule and attendance counters.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::IntoEnumIterator;

use crate::{Error, Result};

/// Below this percentage a subject is flagged as low attendance.
pub const LOW_ATTENDANCE_THRESHOLD: f64 = 75.0;

// ─── Schedule ────────────────────────────────────────────────────────────────

/// A teaching day. Weekends are not schedulable.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::EnumIter,
)]
pub enum Weekday {
  #[default]
  Monday,
  Tuesday,
  Wednesday,
  Thursday,
  Friday,
}

impl Weekday {
  /// The following day, wrapping Friday back to Monday.
  pub fn next(self) -> Self {
    Self::iter()
      .cycle()
      .skip_while(|d| *d != self)
      .nth(1)
      .unwrap_or(self)
  }

  /// The preceding day, wrapping Monday back to Friday.
  pub fn prev(self) -> Self {
    Self::iter()
      .rev()
      .cycle()
      .skip_while(|d| *d != self)
      .nth(1)
      .unwrap_or(self)
  }
}

/// A wall-clock time of day, written as 24-hour `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SlotTime(NaiveTime);

impl SlotTime {
  const FORMAT: &'static str = "%H:%M";

  pub fn new(hour: u32, minute: u32) -> Option<Self> {
    NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
  }
}

impl FromStr for SlotTime {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let s = s.trim();
    // chrono accepts single-digit hours; the wire format does not.
    if s.len() != 5 {
      return Err(Error::validation(format!("{s:?} is not a HH:MM time")));
    }
    NaiveTime::parse_from_str(s, Self::FORMAT)
      .map(Self)
      .map_err(|_| Error::validation(format!("{s:?} is not a HH:MM time")))
  }
}

impl fmt::Display for SlotTime {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0.format(Self::FORMAT))
  }
}

impl Serialize for SlotTime {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for SlotTime {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
  }
}

/// One weekly occurrence of a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSlot {
  pub day:        Weekday,
  pub start_time: SlotTime,
  pub end_time:   SlotTime,
}

// ─── Subject ─────────────────────────────────────────────────────────────────

/// A subject as read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Subject {
  /// Store-assigned; never changes.
  pub id:               String,
  pub name:             String,
  pub schedule:         Vec<ClassSlot>,
  pub total_classes:    u32,
  pub attended_classes: u32,
  pub created_at:       Option<DateTime<Utc>>,
}

impl Subject {
  /// `attended / total * 100`, or `0.0` before the first class.
  pub fn attendance_percentage(&self) -> f64 {
    attendance_percentage(self.attended_classes, self.total_classes)
  }

  pub fn is_low_attendance(&self) -> bool {
    is_low_attendance(self.attendance_percentage())
  }
}

pub fn attendance_percentage(attended: u32, total: u32) -> f64 {
  if total == 0 {
    return 0.0;
  }
  f64::from(attended) / f64::from(total) * 100.0
}

pub fn is_low_attendance(percentage: f64) -> bool {
  percentage < LOW_ATTENDANCE_THRESHOLD
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// User input for creating or editing a subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectDraft {
  pub name:     String,
  pub schedule: Vec<ClassSlot>,
}

impl SubjectDraft {
  /// Check the draft before any store call is made.
  pub fn validate(&self) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(Error::validation("subject name must not be empty"));
    }
    if self.schedule.is_empty() {
      return Err(Error::validation("schedule needs at least one time slot"));
    }
    for (i, slot) in self.schedule.iter().enumerate() {
      if slot.end_time <= slot.start_time {
        return Err(Error::validation(format!(
          "time slot {} must end after it starts",
          i + 1
        )));
      }
    }
    Ok(())
  }
}

/// Partial update of a subject. Counters are deliberately absent: only
/// attendance recording touches them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectPatch {
  pub name:     Option<String>,
  pub schedule: Option<Vec<ClassSlot>>,
}

impl SubjectPatch {
  pub fn is_empty(&self) -> bool { self.name.is_none() && self.schedule.is_none() }
}

impl From<SubjectDraft> for SubjectPatch {
  fn from(draft: SubjectDraft) -> Self {
    Self {
      name:     Some(draft.name),
      schedule: Some(draft.schedule),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn slot(day: Weekday, start: &str, end: &str) -> ClassSlot {
    ClassSlot {
      day,
      start_time: start.parse().unwrap(),
      end_time: end.parse().unwrap(),
    }
  }

  #[test]
  fn percentage_is_zero_without_classes() {
    assert_eq!(attendance_percentage(0, 0), 0.0);
    assert!(is_low_attendance(attendance_percentage(0, 0)));
  }

  #[test]
  fn percentage_boundary() {
    assert_eq!(attendance_percentage(3, 4), 75.0);
    assert!(!is_low_attendance(75.0));
    assert!(is_low_attendance(74.9));
    assert!(is_low_attendance(attendance_percentage(749, 1000)));
  }

  #[test]
  fn slot_time_requires_two_digit_hours() {
    assert_eq!("09:00".parse::<SlotTime>().unwrap(), SlotTime::new(9, 0).unwrap());
    assert!("9:00".parse::<SlotTime>().is_err());
    assert!("24:00".parse::<SlotTime>().is_err());
    assert!("".parse::<SlotTime>().is_err());
  }

  #[test]
  fn slot_serialises_with_wire_names() {
    let json = serde_json::to_value(slot(Weekday::Monday, "09:00", "10:00")).unwrap();
    assert_eq!(
      json,
      serde_json::json!({"day": "Monday", "startTime": "09:00", "endTime": "10:00"})
    );
  }

  #[test]
  fn weekday_rejects_weekends() {
    assert!("Saturday".parse::<Weekday>().is_err());
    assert_eq!("Friday".parse::<Weekday>().unwrap(), Weekday::Friday);
  }

  #[test]
  fn weekday_cycle_wraps_both_ways() {
    assert_eq!(Weekday::Monday.next(), Weekday::Tuesday);
    assert_eq!(Weekday::Friday.next(), Weekday::Monday);
    assert_eq!(Weekday::Wednesday.prev(), Weekday::Tuesday);
    assert_eq!(Weekday::Monday.prev(), Weekday::Friday);

    for day in Weekday::iter() {
      assert_eq!(day.next().prev(), day);
    }
    let mut day = Weekday::Monday;
    for _ in 0..5 {
      day = day.next();
    }
    assert_eq!(day, Weekday::Monday);
  }

  #[test]
  fn draft_validation() {
    let ok = SubjectDraft {
      name:     "Math".into(),
      schedule: vec![slot(Weekday::Monday, "09:00", "10:00")],
    };
    assert!(ok.validate().is_ok());

    let blank = SubjectDraft { name: "   ".into(), ..ok.clone() };
    assert!(matches!(blank.validate(), Err(Error::ValidationFailed(_))));

    let unscheduled = SubjectDraft { schedule: vec![], ..ok.clone() };
    assert!(matches!(unscheduled.validate(), Err(Error::ValidationFailed(_))));

    let backwards = SubjectDraft {
      schedule: vec![slot(Weekday::Tuesday, "11:00", "10:00")],
      ..ok
    };
    assert!(matches!(backwards.validate(), Err(Error::ValidationFailed(_))));
  }
}
