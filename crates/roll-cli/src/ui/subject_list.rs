//! Subject cards.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use roll_core::{store::DocumentStore, subject::Subject};

use crate::app::App;

/// Cells in the attendance gauge.
const GAUGE_WIDTH: usize = 20;

/// Render the subject list into `area`.
pub fn draw<S: DocumentStore>(f: &mut Frame, area: Rect, app: &App<S>) {
  let filtered = app.filtered_subjects();
  let total = app.controller.subjects.len();

  // Title with count.
  let title = if app.filter_active || !app.filter.is_empty() {
    format!(" Subjects ({}/{}) ", filtered.len(), total)
  } else {
    format!(" Subjects ({}) ", total)
  };

  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let mut inner_area = block.inner(area);
  f.render_widget(block, area);

  // Filter bar along the bottom edge.
  if (app.filter_active || !app.filter.is_empty()) && inner_area.height > 2 {
    let filter_area = Rect {
      x:      inner_area.x,
      y:      inner_area.y + inner_area.height - 1,
      width:  inner_area.width,
      height: 1,
    };
    inner_area.height = inner_area.height.saturating_sub(1);

    let filter_text = if app.filter_active {
      format!("/{}_", app.filter)
    } else {
      format!("/{}", app.filter)
    };
    f.render_widget(
      Paragraph::new(filter_text).style(Style::default().fg(Color::Yellow)),
      filter_area,
    );
  }

  if filtered.is_empty() {
    let hint = if total == 0 {
      "No subjects yet. Press [a] to add one."
    } else {
      "No subjects match the filter."
    };
    f.render_widget(
      Paragraph::new(hint).style(Style::default().fg(Color::DarkGray)),
      inner_area,
    );
    return;
  }

  let items: Vec<ListItem> = filtered
    .iter()
    .enumerate()
    .map(|(i, subject)| {
      let is_cursor = i == app.list_cursor;
      ListItem::new(card(subject, is_cursor && app.quick_mark))
    })
    .collect();

  let mut state = ListState::default();
  state.select(Some(app.list_cursor));

  f.render_stateful_widget(
    List::new(items)
      .highlight_style(Style::default().bg(Color::Rgb(30, 30, 60)))
      .highlight_symbol("▌"),
    inner_area,
    &mut state,
  );
}

fn card(subject: &Subject, quick_mark: bool) -> Vec<Line<'static>> {
  let pct = subject.attendance_percentage();
  let accent = if subject.is_low_attendance() { Color::Red } else { Color::Green };

  let mut lines = vec![
    Line::from(vec![
      Span::styled(
        subject.name.clone(),
        Style::default().add_modifier(Modifier::BOLD),
      ),
      Span::raw("  "),
      Span::styled(
        format!("{pct:.1}%"),
        Style::default().fg(accent).add_modifier(Modifier::BOLD),
      ),
    ]),
    Line::from(vec![
      Span::styled(gauge(pct), Style::default().fg(accent)),
      Span::styled(
        format!(" {}/{} classes", subject.attended_classes, subject.total_classes),
        Style::default().fg(Color::Gray),
      ),
    ]),
  ];

  for slot in &subject.schedule {
    lines.push(Line::from(Span::styled(
      format!("  {}: {} - {}", slot.day, slot.start_time, slot.end_time),
      Style::default().fg(Color::DarkGray),
    )));
  }

  if quick_mark {
    lines.push(Line::from(vec![
      Span::styled("  [p] Present", Style::default().fg(Color::Green)),
      Span::raw("   "),
      Span::styled("[x] Absent", Style::default().fg(Color::Red)),
    ]));
  }

  lines.push(Line::default());
  lines
}

/// A text bar filled in proportion to `pct`.
fn gauge(pct: f64) -> String {
  let filled = ((pct / 100.0) * GAUGE_WIDTH as f64).round() as usize;
  let filled = filled.min(GAUGE_WIDTH);
  format!("{}{}", "█".repeat(filled), "░".repeat(GAUGE_WIDTH - filled))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn gauge_fills_proportionally() {
    assert_eq!(gauge(0.0), "░".repeat(GAUGE_WIDTH));
    assert_eq!(gauge(100.0), "█".repeat(GAUGE_WIDTH));
    assert_eq!(gauge(75.0).chars().filter(|&c| c == '█').count(), 15);
  }
}
