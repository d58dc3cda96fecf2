use crate::router::Route;
use crate::ui::view::{Shortcut, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

pub struct NotFoundView;

impl View for NotFoundView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('h') | KeyCode::Enter => ViewAction::Navigate(Route::Home),
      KeyCode::Char('q') | KeyCode::Esc => ViewAction::Pop,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let text = vec![
      Line::from(Span::styled("404", Style::default().fg(Color::Red).bold())),
      Line::from("Page not found"),
      Line::from(Span::styled(
        "Press h to go home",
        Style::default().fg(Color::DarkGray),
      )),
    ];
    let paragraph = Paragraph::new(text)
      .alignment(Alignment::Center)
      .block(Block::default().borders(Borders::ALL));
    frame.render_widget(paragraph, area);
  }

  fn route(&self) -> Route {
    Route::NotFound
  }

  fn breadcrumb_label(&self) -> String {
    "Not found".to_string()
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new("h", "home").with_priority(20),
      Shortcut::new("q", "back").with_priority(90),
    ]
  }
}
