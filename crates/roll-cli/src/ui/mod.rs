//! Frame layout: header, subject list with overlays, status bar.

pub mod attendance_form;
pub mod history;
pub mod subject_form;
pub mod subject_list;

use chrono::Local;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Flex, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Clear, Paragraph},
};
use roll_core::{controller::NoticeLevel, store::DocumentStore};

use crate::app::{App, Screen};

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw<S: DocumentStore>(f: &mut Frame, app: &App<S>) {
  let area = f.area();

  // Vertical stack: header, body, status bar.
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(area);

  draw_header(f, rows[0], app);
  draw_body(f, rows[1], app);
  draw_status(f, rows[2], app);
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header<S: DocumentStore>(f: &mut Frame, area: Rect, app: &App<S>) {
  let date = Local::now().format("%A, %Y-%m-%d").to_string();

  let left = Span::styled(
    " roll  Class Attendance Tracker",
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );
  let low = app
    .controller
    .subjects
    .iter()
    .filter(|s| s.is_low_attendance())
    .count();
  let right = Span::styled(
    format!("{} subjects  {low} low  {date} ", app.controller.subjects.len()),
    Style::default().fg(Color::Gray),
  );

  // Simple left-right header: pad the middle.
  let left_width = left.content.chars().count() as u16;
  let right_width = right.content.chars().count() as u16;
  let pad = area
    .width
    .saturating_sub(left_width)
    .saturating_sub(right_width);

  let line = Line::from(vec![
    left,
    Span::raw(" ".repeat(pad as usize)),
    right,
  ]);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(line), inner);
}

// ─── Body ─────────────────────────────────────────────────────────────────────

fn draw_body<S: DocumentStore>(f: &mut Frame, area: Rect, app: &App<S>) {
  if app.controller.loading {
    f.render_widget(
      Paragraph::new("Loading…").style(Style::default().fg(Color::DarkGray)),
      centered(area, 12, 1),
    );
    return;
  }

  subject_list::draw(f, area, app);

  // Overlays sit on top of the list.
  match app.screen() {
    Screen::SubjectForm => subject_form::draw(f, area, app),
    Screen::Attendance => attendance_form::draw(f, area, app),
    Screen::History => history::draw(f, area, app),
    Screen::ConfirmDelete => draw_confirm(f, area, app),
    Screen::SubjectList | Screen::Filter => {}
  }
}

fn draw_confirm<S: DocumentStore>(f: &mut Frame, area: Rect, app: &App<S>) {
  let Some(subject) = &app.confirm_delete else { return };

  let inner = popup(f, area, 50, 6, " Delete subject ", Color::Red);
  let lines = vec![
    Line::from(format!("Delete \"{}\"?", subject.name)),
    Line::from(Span::styled(
      "Its attendance records are kept.",
      Style::default().fg(Color::DarkGray),
    )),
    Line::default(),
    Line::from(vec![
      Span::styled("[y]", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
      Span::raw(" delete   "),
      Span::styled("[n]", Style::default().add_modifier(Modifier::BOLD)),
      Span::raw(" keep"),
    ]),
  ];
  f.render_widget(Paragraph::new(lines), inner);
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status<S: DocumentStore>(f: &mut Frame, area: Rect, app: &App<S>) {
  let (mode_label, hints) = match app.screen() {
    Screen::SubjectList if app.quick_mark => ("MARK", "p present  x absent  Esc cancel"),
    Screen::SubjectList => (
      "NORMAL",
      "↑↓/jk navigate  a add  e edit  d delete  m mark  h history  / search  q quit",
    ),
    Screen::Filter => ("SEARCH", "Type to filter  Esc clear  Enter keep"),
    Screen::ConfirmDelete => ("DELETE", "y confirm  any other key cancels"),
    Screen::SubjectForm => (
      "FORM",
      "Tab/↑↓ field  ←→ day  ^N add slot  ^D remove slot  Enter save  Esc cancel",
    ),
    Screen::Attendance => ("MARK", "Tab field  Enter on a button submits  Esc cancel"),
    Screen::History => ("HISTORY", "↑↓/jk scroll  Esc back"),
  };

  let (text, text_style) = match &app.controller.notice {
    Some(notice) => {
      let color = match notice.level {
        NoticeLevel::Success => Color::Green,
        NoticeLevel::Error => Color::Red,
      };
      (notice.message.as_str(), Style::default().fg(color).add_modifier(Modifier::BOLD))
    }
    None => (hints, Style::default().fg(Color::DarkGray)),
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );
  let text_span = Span::styled(format!("  {text}"), text_style);

  let line = Line::from(vec![mode_span, text_span]);
  f.render_widget(
    Paragraph::new(line).style(Style::default().bg(Color::Black)),
    area,
  );
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

/// A `width` × `height` rect centred in `area`, clipped to fit.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
  let [row] = Layout::vertical([Constraint::Length(height.min(area.height))])
    .flex(Flex::Center)
    .areas(area);
  let [cell] = Layout::horizontal([Constraint::Length(width.min(area.width))])
    .flex(Flex::Center)
    .areas(row);
  cell
}

/// Clear a centred box, draw its border, and return the inner area.
pub fn popup(f: &mut Frame, area: Rect, width: u16, height: u16, title: &str, accent: Color) -> Rect {
  let rect = centered(area, width, height);
  let block = Block::default()
    .title(title.to_string())
    .borders(Borders::ALL)
    .border_style(Style::default().fg(accent));
  let inner = block.inner(rect);
  f.render_widget(Clear, rect);
  f.render_widget(block, rect);
  inner
}
