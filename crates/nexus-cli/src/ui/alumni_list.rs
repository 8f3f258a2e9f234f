//! Left pane: search box and the current page of alumni.

use nexus_core::bookmark::BookmarkItemType;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::app::{App, Screen};

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Length(3), Constraint::Min(0)])
    .split(area);

  draw_search(f, rows[0], app);
  draw_list(f, rows[1], app);
}

fn draw_search(f: &mut Frame, area: Rect, app: &App) {
  let query = &app.directory.filter().query;
  let border = if app.searching { Color::Cyan } else { Color::DarkGray };

  let text = if app.searching {
    Line::from(vec![
      Span::styled("/", Style::default().fg(Color::Cyan)),
      Span::raw(query.as_str()),
      Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
    ])
  } else if query.is_empty() {
    Line::from(Span::styled(
      "nom, poste, diplôme ou école…",
      Style::default().fg(Color::DarkGray),
    ))
  } else {
    Line::from(vec![
      Span::styled("/", Style::default().fg(Color::DarkGray)),
      Span::raw(query.as_str()),
    ])
  };

  let block = Block::default()
    .title(" Recherche ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(border));
  f.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_list(f: &mut Frame, area: Rect, app: &App) {
  let page = app.page();

  let mut title = format!(" Alumni  page {}/{} ({}) ", page.page, page.page_count, page.total);
  if app.directory.is_shuffled() {
    title.push_str("⇄ ");
  }

  let items: Vec<ListItem> = page
    .items
    .iter()
    .map(|record| {
      let mark = if app.bookmarks.is_bookmarked(record.id, BookmarkItemType::Alumni) {
        "★ "
      } else {
        "  "
      };
      let mut spans = vec![
        Span::styled(mark, Style::default().fg(Color::Magenta)),
        Span::raw(record.name.clone()),
      ];
      if app.viewer.is_some_and(|v| v.owns(record)) {
        spans.push(Span::styled(" (vous)", Style::default().fg(Color::Cyan)));
      }
      if record.is_admin {
        spans.push(Span::styled(" admin", Style::default().fg(Color::Yellow)));
      }
      if record.hidden {
        spans.push(Span::styled(" masqué", Style::default().fg(Color::Red)));
      }
      if !record.position.is_empty() {
        spans.push(Span::styled(
          format!("  {}", record.position),
          Style::default().fg(Color::DarkGray),
        ));
      }
      ListItem::new(Line::from(spans))
    })
    .collect();

  let focused = app.screen == Screen::Directory && !app.searching;
  let border = if focused { Color::Cyan } else { Color::DarkGray };
  let list = List::new(items)
    .block(
      Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border)),
    )
    .highlight_style(
      Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("▶ ");

  let mut state = ListState::default();
  if !page.items.is_empty() {
    state.select(Some(app.cursor.min(page.items.len() - 1)));
  }
  f.render_stateful_widget(list, area, &mut state);
}
