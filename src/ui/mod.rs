pub mod components;
pub mod renderfns;
pub mod view;
pub mod views;

use crate::app::App;
use ratatui::prelude::*;
use ratatui::widgets::{ListState, Paragraph};

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Footer
    ])
    .split(frame.area());

  let shortcuts = app.current_view().map(|v| v.shortcuts()).unwrap_or_default();
  renderfns::draw_header(frame, chunks[0], app.title(), app.api_url(), &shortcuts);

  if let Some(view) = app.current_view_mut() {
    view.render(frame, chunks[1]);
  }
  app.command_input().render_overlay(frame, chunks[1]);

  renderfns::draw_footer(frame, chunks[2], &app.breadcrumb(), app.message());
}

/// Keep a list selection inside `len` items, selecting the first when there is none
pub fn ensure_valid_selection(state: &mut ListState, len: usize) {
  if len == 0 {
    state.select(None);
  } else {
    match state.selected() {
      Some(i) if i >= len => state.select(Some(len - 1)),
      None => state.select(Some(0)),
      _ => {}
    }
  }
}

/// List/panel title reflecting load and error state. Data stays visible on error.
pub fn status_title(name: &str, count: Option<usize>, loading: bool, error: Option<&str>) -> String {
  match (error, count) {
    (Some(e), _) => format!(" {} (error: {}) ", name, e),
    (None, None) if loading => format!(" {} (loading...) ", name),
    (None, Some(n)) => format!(" {} ({}) ", name, n),
    (None, None) => format!(" {} ", name),
  }
}

/// Centered one-line message for empty, loading or failed panels
pub fn placeholder(frame: &mut Frame, area: Rect, text: &str, color: Color) {
  let paragraph = Paragraph::new(text)
    .style(Style::default().fg(color))
    .alignment(Alignment::Center);
  let y = area.y + area.height / 2;
  frame.render_widget(paragraph, Rect::new(area.x, y, area.width, 1.min(area.height)));
}
