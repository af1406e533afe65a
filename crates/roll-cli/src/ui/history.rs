//! Per-subject attendance history.

use chrono::{Datelike, Local, NaiveDate};
use ratatui::{
  Frame,
  layout::{Constraint, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Paragraph, Row, Table, TableState},
};
use roll_core::{entry::newest_first, store::DocumentStore};

use crate::app::App;

pub fn draw<S: DocumentStore>(f: &mut Frame, area: Rect, app: &App<S>) {
  let Some(history) = &app.controller.history_view else { return };

  let title = format!(" {} · Attendance History ", history.subject.name);
  let width = area.width.saturating_sub(4);
  let height = area.height.saturating_sub(2);
  let inner = super::popup(f, area, width, height, &title, Color::Cyan);

  if history.entries.is_empty() {
    f.render_widget(
      Paragraph::new("No attendance records found").style(Style::default().fg(Color::DarkGray)),
      inner,
    );
    return;
  }

  let header = Row::new(["Date", "Status", "Learning Notes"])
    .style(Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED));

  let rows: Vec<Row> = newest_first(&history.entries)
    .into_iter()
    .map(|entry| {
      let date = format_long_date(entry.date.with_timezone(&Local).date_naive());
      let status = if entry.attended {
        Span::styled("Present", Style::default().fg(Color::Green))
      } else {
        Span::styled("Absent", Style::default().fg(Color::Red))
      };
      let notes = match entry.learning_notes.trim() {
        "" => "-".to_string(),
        notes => notes.replace('\n', " "),
      };
      Row::new(vec![Line::from(date), Line::from(status), Line::from(notes)])
    })
    .collect();

  let mut state = TableState::default().with_offset(app.history_scroll);
  f.render_stateful_widget(
    Table::new(rows, [
      Constraint::Length(22),
      Constraint::Length(8),
      Constraint::Min(10),
    ])
    .header(header)
    .column_spacing(2),
    inner,
    &mut state,
  );
}

/// `October 19th, 2026`
pub fn format_long_date(date: NaiveDate) -> String {
  format!(
    "{} {}{}, {}",
    date.format("%B"),
    date.day(),
    ordinal_suffix(date.day()),
    date.year()
  )
}

fn ordinal_suffix(day: u32) -> &'static str {
  match (day % 10, day % 100) {
    (_, 11..=13) => "th",
    (1, _) => "st",
    (2, _) => "nd",
    (3, _) => "rd",
    _ => "th",
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

  #[test]
  fn long_dates_carry_ordinals() {
    assert_eq!(format_long_date(date(2026, 10, 19)), "October 19th, 2026");
    assert_eq!(format_long_date(date(2026, 3, 1)), "March 1st, 2026");
    assert_eq!(format_long_date(date(2026, 3, 22)), "March 22nd, 2026");
    assert_eq!(format_long_date(date(2026, 3, 23)), "March 23rd, 2026");
  }

  #[test]
  fn teens_take_th() {
    for d in 11..=13 {
      assert!(format_long_date(date(2026, 1, d)).ends_with(&format!("{d}th, 2026")));
    }
  }
}
