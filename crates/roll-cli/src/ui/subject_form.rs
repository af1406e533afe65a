//! Add/edit subject popup.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::Paragraph,
};
use roll_core::store::DocumentStore;

use crate::{
  app::App,
  form::{Field, SubjectForm},
};

pub fn draw<S: DocumentStore>(f: &mut Frame, area: Rect, app: &App<S>) {
  let Some(form) = &app.subject_form else { return };

  let title = if app.controller.editing_subject.is_some() {
    " Edit subject "
  } else {
    " Add subject "
  };
  let height = 6 + form.slots.len() as u16;
  let inner = super::popup(f, area, 56, height, title, Color::Cyan);
  f.render_widget(Paragraph::new(lines(form)), inner);
}

fn lines(form: &SubjectForm) -> Vec<Line<'static>> {
  let focus = form.focused();
  let mut lines = vec![
    Line::from(vec![
      Span::raw("Name:     "),
      input(&form.name, focus == Field::Name, ""),
    ]),
    Line::default(),
    Line::from(Span::styled("Schedule", Style::default().add_modifier(Modifier::BOLD))),
  ];

  for (i, slot) in form.slots.iter().enumerate() {
    lines.push(Line::from(vec![
      Span::raw(format!("{:>2}. ", i + 1)),
      selector(&slot.day.to_string(), focus == Field::Day(i)),
      Span::raw("  "),
      input(&slot.start, focus == Field::Start(i), "HH:MM"),
      Span::raw(" - "),
      input(&slot.end, focus == Field::End(i), "HH:MM"),
    ]));
  }

  lines.push(Line::default());
  lines.push(Line::from(Span::styled(
    "Enter save  Esc cancel  ^N add slot  ^D remove slot",
    Style::default().fg(Color::DarkGray),
  )));
  lines
}

fn input(text: &str, focused: bool, placeholder: &str) -> Span<'static> {
  if focused {
    Span::styled(
      format!("{text}_"),
      Style::default().fg(Color::Yellow).add_modifier(Modifier::UNDERLINED),
    )
  } else if text.is_empty() {
    Span::styled(placeholder.to_string(), Style::default().fg(Color::DarkGray))
  } else {
    Span::raw(text.to_string())
  }
}

fn selector(text: &str, focused: bool) -> Span<'static> {
  let label = format!("‹ {text:<9} ›");
  if focused {
    Span::styled(label, Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
  } else {
    Span::raw(label)
  }
}
