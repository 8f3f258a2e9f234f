//! Right pane: full profile of one alumnus.

use nexus_core::{bookmark::BookmarkItemType, record::AlumniRecord};
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::app::{App, Screen};

pub fn draw(f: &mut Frame, area: Rect, app: &App, record: &AlumniRecord) {
  let border = if app.screen == Screen::Detail { Color::Cyan } else { Color::DarkGray };
  let block = Block::default()
    .title(format!(" {} ", record.name))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(border));

  let para = Paragraph::new(lines(app, record))
    .block(block)
    .wrap(Wrap { trim: false });
  f.render_widget(para, area);
}

fn lines<'a>(app: &App, record: &'a AlumniRecord) -> Vec<Line<'a>> {
  let label = Style::default().fg(Color::DarkGray);
  let mut out = Vec::new();

  let mut title = vec![Span::styled(
    record.name.as_str(),
    Style::default().add_modifier(Modifier::BOLD),
  )];
  if app.bookmarks.is_bookmarked(record.id, BookmarkItemType::Alumni) {
    title.push(Span::styled("  ★", Style::default().fg(Color::Magenta)));
  }
  out.push(Line::from(title));

  if !record.degree.is_empty() {
    out.push(Line::from(record.degree.as_str()));
  }
  if !record.position.is_empty() {
    out.push(Line::from(Span::styled(
      record.position.as_str(),
      Style::default().fg(Color::Gray),
    )));
  }
  if !record.field.is_empty() {
    out.push(Line::from(Span::styled(
      record.field.join(" · "),
      Style::default().fg(Color::Yellow),
    )));
  }

  // ── Schools ──
  if !record.schools_applied.is_empty() {
    out.push(Line::raw(""));
    out.push(Line::from(Span::styled("Écoles", label)));
    for school in &record.schools_applied {
      let (sym, color) = if school.is_accepted() { ("✓", Color::Green) } else { ("✗", Color::Red) };
      out.push(Line::from(vec![
        Span::styled(format!("  {sym} "), Style::default().fg(color)),
        Span::raw(school.name.as_str()),
      ]));
    }
  }

  if !record.grades.is_empty() {
    out.push(Line::raw(""));
    out.push(Line::from(Span::styled("Notes", label)));
    for grade in &record.grades {
      out.push(Line::raw(format!("  {:<20} {:.2}", grade.subject, grade.value)));
    }
  }

  // ── Free-text fields ──
  let extras = [
    ("Projet", &record.future_goals),
    ("Fin de L3", &record.annee_fin_l3),
    ("Nationalités", &record.nationalities),
    ("LinkedIn", &record.linkedin),
    ("Email", &record.email),
  ];
  let mut first = true;
  for (name, value) in extras {
    let Some(value) = value.as_deref().filter(|v| !v.is_empty()) else {
      continue;
    };
    if first {
      out.push(Line::raw(""));
      first = false;
    }
    out.push(Line::from(vec![
      Span::styled(format!("{name:<14}"), label),
      Span::raw(value),
    ]));
  }

  if record.hidden {
    out.push(Line::raw(""));
    out.push(Line::from(Span::styled(
      "Profil masqué : visible seulement par vous et les administrateurs.",
      Style::default().fg(Color::Red),
    )));
  }
  out
}
