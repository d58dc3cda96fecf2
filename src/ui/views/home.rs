use crate::router::Route;
use crate::ui::view::{Shortcut, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

const ENTRIES: &[(&str, &str, Route)] = &[
  ("Users", "Create, view, edit and delete user accounts", Route::Users),
  ("Tasks", "Create and follow tasks as workers process them", Route::Tasks),
  ("New user", "Register an account", Route::UserCreate),
  ("New task", "Queue a task for a user", Route::TaskCreate),
];

/// Entry screen linking to the main areas
pub struct HomeView {
  title: String,
  list_state: ListState,
}

impl HomeView {
  pub fn new(title: &str) -> Self {
    Self {
      title: title.to_string(),
      list_state: ListState::default().with_selected(Some(0)),
    }
  }
}

impl View for HomeView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.list_state.select_next();
        ViewAction::None
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.list_state.select_previous();
        ViewAction::None
      }
      KeyCode::Char('u') => ViewAction::Push(Route::Users),
      KeyCode::Char('t') => ViewAction::Push(Route::Tasks),
      KeyCode::Enter => self
        .list_state
        .selected()
        .and_then(|i| ENTRIES.get(i))
        .map(|(_, _, route)| ViewAction::Push(*route))
        .unwrap_or(ViewAction::None),
      KeyCode::Char('q') | KeyCode::Esc => ViewAction::Pop,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Length(4), Constraint::Min(0)])
      .split(area);

    let banner = Paragraph::new(vec![
      Line::from(Span::styled(
        self.title.as_str(),
        Style::default().fg(Color::Cyan).bold(),
      )),
      Line::from(Span::styled(
        "Manage users and the tasks the workers pick up.",
        Style::default().fg(Color::DarkGray),
      )),
    ])
    .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(banner, chunks[0]);

    let items: Vec<ListItem> = ENTRIES
      .iter()
      .map(|(name, description, route)| {
        ListItem::new(Line::from(vec![
          Span::styled(format!("{:<10}", name), Style::default().fg(Color::Yellow)),
          Span::styled(format!("{:<12}", route.to_string()), Style::default().fg(Color::DarkGray)),
          Span::raw(*description),
        ]))
      })
      .collect();

    let list = List::new(items)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");
    frame.render_stateful_widget(list, chunks[1], &mut self.list_state);
  }

  fn route(&self) -> Route {
    Route::Home
  }

  fn breadcrumb_label(&self) -> String {
    "Home".to_string()
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new(":", "command").with_priority(10),
      Shortcut::new("u", "users").with_priority(20),
      Shortcut::new("t", "tasks").with_priority(21),
      Shortcut::new("q", "quit").with_priority(90),
    ]
  }
}
