//! TUI rendering: orchestrates all panes.

pub mod alumni_detail;
pub mod alumni_list;

use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph},
};

use crate::app::{App, Screen};

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw(f: &mut Frame, app: &App) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Length(1), // domain chips
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(f.area());

  draw_header(f, rows[0], app);
  draw_domains(f, rows[1], app);
  draw_body(f, rows[2], app);
  draw_status(f, rows[3], app);
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
  let left = Span::styled(
    " SorboNexus  annuaire des alumni",
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );
  let who = match (&app.viewer, app.own_record()) {
    (Some(_), Some(own)) => format!("{} ", own.name),
    (Some(v), None) if v.is_admin => "admin ".to_string(),
    (Some(_), None) => "connecté ".to_string(),
    (None, _) => "anonyme ".to_string(),
  };
  let right = Span::styled(who, Style::default().fg(Color::Gray));

  let pad = area
    .width
    .saturating_sub(left.width() as u16)
    .saturating_sub(right.width() as u16);
  let line = Line::from(vec![left, Span::raw(" ".repeat(pad as usize)), right]);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(line), inner);
}

// ─── Domain chips ─────────────────────────────────────────────────────────────

fn draw_domains(f: &mut Frame, area: Rect, app: &App) {
  let selected = &app.directory.filter().domains;
  let mut spans = vec![Span::styled(" domaines ", Style::default().fg(Color::DarkGray))];

  for (i, domain) in app.directory.domains().iter().take(9).enumerate() {
    let on = selected.iter().any(|d| d.eq_ignore_ascii_case(domain));
    let style = if on {
      Style::default().fg(Color::Black).bg(Color::Yellow)
    } else {
      Style::default().fg(Color::Yellow)
    };
    spans.push(Span::styled(format!("{}:{domain}", i + 1), style));
    spans.push(Span::raw(" "));
  }
  if app.directory.filter().bookmark_only {
    spans.push(Span::styled("★ favoris", Style::default().fg(Color::Magenta)));
  }
  f.render_widget(Paragraph::new(Line::from(spans)), area);
}

// ─── Body ─────────────────────────────────────────────────────────────────────

fn draw_body(f: &mut Frame, area: Rect, app: &App) {
  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
    .split(area);

  alumni_list::draw(f, cols[0], app);

  let shown = match app.screen {
    Screen::Detail => app.selected_record(),
    Screen::Directory => app.cursor_record(),
  };
  match shown {
    Some(record) => alumni_detail::draw(f, cols[1], app, record),
    None => draw_empty_detail(f, cols[1], app),
  }
}

fn draw_empty_detail(f: &mut Frame, area: Rect, app: &App) {
  let block = Block::default()
    .title(" Profil ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);

  let text = if app.directory.is_loading() {
    "Chargement…"
  } else {
    "Aucun alumni ne correspond à ces critères."
  };
  f.render_widget(
    Paragraph::new(text).style(Style::default().fg(Color::DarkGray)),
    inner,
  );
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
  let (mode_label, hints) = match app.screen {
    _ if app.searching => ("RECHERCHE", "Tapez pour filtrer  Esc effacer  Entrée valider"),
    Screen::Directory => (
      "ANNUAIRE",
      "jk déplacer  n/p page  / chercher  1-9 domaine  f favoris  b favori  s mélanger  o ordre  \
       L connexion  q quitter",
    ),
    Screen::Detail => ("FICHE", "b favori  Esc retour  q quitter"),
  };

  let status = if app.status_msg.is_empty() {
    hints.to_string()
  } else {
    app.status_msg.clone()
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );
  let hint_span = Span::styled(format!("  {status}"), Style::default().fg(Color::DarkGray));

  f.render_widget(
    Paragraph::new(Line::from(vec![mode_span, hint_span]))
      .style(Style::default().bg(Color::Black)),
    area,
  );
}
