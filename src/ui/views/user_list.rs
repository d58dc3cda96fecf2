use crate::api::types::User;
use crate::context::Context;
use crate::query::Subscription;
use crate::router::Route;
use crate::ui::components::{KeyResult, SearchEvent, SearchInput};
use crate::ui::renderfns::truncate;
use crate::ui::view::{Shortcut, View, ViewAction};
use crate::ui::{ensure_valid_selection, placeholder, status_title};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState};

/// Polled table of all users
pub struct UserListView {
  users: Subscription<Vec<User>>,
  list_state: ListState,
  search: SearchInput,
}

impl UserListView {
  pub fn new(ctx: &Context) -> Self {
    Self {
      users: ctx.users(true),
      list_state: ListState::default(),
      search: SearchInput::new(),
    }
  }

  /// Users matching the search filter, in backend order
  fn visible(&self) -> Vec<User> {
    let Some(users) = self.users.data() else {
      return Vec::new();
    };
    users
      .iter()
      .filter(|u| self.search.matches(&[u.username.as_str(), u.email.as_str()]))
      .cloned()
      .collect()
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let snapshot = self.users.snapshot();
    let users = self.visible();
    ensure_valid_selection(&mut self.list_state, users.len());

    let title = status_title(
      "Users",
      snapshot.data.as_ref().map(|_| users.len()),
      snapshot.is_loading(),
      snapshot.error.as_deref(),
    );
    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if users.is_empty() {
      let inner = block.inner(area);
      frame.render_widget(block, area);
      let (text, color) = if snapshot.is_loading() {
        ("Loading users...", Color::DarkGray)
      } else if snapshot.data.is_none() && snapshot.error.is_some() {
        ("Failed to load users. Press 'r' to retry.", Color::Red)
      } else if !self.search.query().is_empty() {
        ("No users match the filter.", Color::DarkGray)
      } else {
        ("No users found. Press 'n' to create one.", Color::DarkGray)
      };
      placeholder(frame, inner, text, color);
      return;
    }

    let items: Vec<ListItem> = users
      .iter()
      .map(|user| {
        let (active, active_color) = if user.is_active {
          ("active", Color::Green)
        } else {
          ("inactive", Color::DarkGray)
        };
        ListItem::new(Line::from(vec![
          Span::styled(format!("{:<6}", user.id), Style::default().fg(Color::Cyan)),
          Span::raw(" "),
          Span::styled(
            format!("{:<20}", truncate(&user.username, 20)),
            Style::default().fg(Color::White).bold(),
          ),
          Span::raw(" "),
          Span::raw(format!("{:<32}", truncate(&user.email, 32))),
          Span::raw(" "),
          Span::styled(active, Style::default().fg(active_color)),
        ]))
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }

  // Key handling helpers for or_else chain pattern
  fn handle_overlays(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match self.search.handle_key(key) {
      KeyResult::Handled => Some(ViewAction::None),
      KeyResult::Event(SearchEvent::Changed(_)) => {
        self.list_state.select(Some(0));
        Some(ViewAction::None)
      }
      KeyResult::Event(SearchEvent::Submitted) => Some(ViewAction::None),
      KeyResult::NotHandled => None,
    }
  }

  fn handle_navigation(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.list_state.select_next();
        Some(ViewAction::None)
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.list_state.select_previous();
        Some(ViewAction::None)
      }
      _ => None,
    }
  }

  fn handle_actions(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char('r') => {
        self.users.refetch();
        Some(ViewAction::None)
      }
      KeyCode::Char('n') => Some(ViewAction::Push(Route::UserCreate)),
      KeyCode::Enter => {
        let idx = self.list_state.selected()?;
        let user = self.visible().into_iter().nth(idx)?;
        Some(ViewAction::Push(Route::UserDetail(user.id)))
      }
      KeyCode::Char('q') | KeyCode::Esc => Some(ViewAction::Pop),
      _ => None,
    }
  }
}

impl View for UserListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    self
      .handle_overlays(key)
      .or_else(|| self.handle_navigation(key))
      .or_else(|| self.handle_actions(key))
      .unwrap_or(ViewAction::None)
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_list(frame, area);
    self.search.render_overlay(frame, area);
  }

  fn route(&self) -> Route {
    Route::Users
  }

  fn breadcrumb_label(&self) -> String {
    if self.search.query().is_empty() {
      "Users".to_string()
    } else {
      format!("Users [/{}]", self.search.query())
    }
  }

  fn captures_input(&self) -> bool {
    self.search.is_active()
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new(":", "command").with_priority(10),
      Shortcut::new("/", "filter").with_priority(20),
      Shortcut::new("n", "new").with_priority(30),
      Shortcut::new("r", "refresh").with_priority(40),
      Shortcut::new("q", "back").with_priority(90),
    ]
  }
}
