//! Attendance popup: notes plus Present/Absent buttons.

use chrono::Local;
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Paragraph, Wrap},
};
use roll_core::store::DocumentStore;

use crate::{app::App, form::AttendanceFocus};

pub fn draw<S: DocumentStore>(f: &mut Frame, area: Rect, app: &App<S>) {
  let Some(subject) = &app.controller.selected_for_attendance else { return };
  let form = &app.attendance_form;

  let title = format!(" Mark attendance: {} ", subject.name);
  let inner = super::popup(f, area, 60, 14, &title, Color::Cyan);

  let notes_focused = form.focus == AttendanceFocus::Notes;
  let notes_style = if notes_focused {
    Style::default().fg(Color::Yellow)
  } else {
    Style::default()
  };

  let mut lines = vec![
    Line::from(Span::styled(
      Local::now().format("%A, %B %-d").to_string(),
      Style::default().fg(Color::DarkGray),
    )),
    Line::from(Span::styled(
      "What did you learn today?",
      Style::default().add_modifier(Modifier::BOLD),
    )),
  ];
  for (i, text) in form.notes.split('\n').enumerate() {
    let is_last = i == form.notes.matches('\n').count();
    let text = if notes_focused && is_last { format!("{text}_") } else { text.to_string() };
    lines.push(Line::from(Span::styled(format!("  {text}"), notes_style)));
  }
  lines.push(Line::default());
  lines.push(Line::from(vec![
    button("Present", Color::Green, form.focus == AttendanceFocus::Present),
    Span::raw("   "),
    button("Absent", Color::Red, form.focus == AttendanceFocus::Absent),
  ]));

  f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn button(label: &'static str, color: Color, focused: bool) -> Span<'static> {
  let style = if focused {
    Style::default()
      .fg(Color::Black)
      .bg(color)
      .add_modifier(Modifier::BOLD)
  } else {
    Style::default().fg(color)
  };
  Span::styled(format!("[ {label} ]"), style)
}
