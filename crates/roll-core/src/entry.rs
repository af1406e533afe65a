//! Attendance entries, one record per marking action.

use chrono::{DateTime, Utc};

/// One timestamped record of presence or absence for a subject.
///
/// Entries are written once and never updated or deleted. The subject they
/// point at may be deleted independently, leaving the entry orphaned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceEntry {
  pub id:             String,
  pub subject_id:     String,
  /// When the entry was recorded.
  pub date:           DateTime<Utc>,
  pub attended:       bool,
  /// May be empty.
  pub learning_notes: String,
  /// Epoch milliseconds; only used for ordering.
  pub timestamp:      i64,
}

/// Entries ordered newest first.
///
/// Stores return query results in no particular order, so every history
/// display goes through here.
pub fn newest_first(entries: &[AttendanceEntry]) -> Vec<&AttendanceEntry> {
  let mut sorted: Vec<&AttendanceEntry> = entries.iter().collect();
  sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
  sorted
}
