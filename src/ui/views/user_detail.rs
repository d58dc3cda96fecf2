use super::user_create::validate_user_form;
use crate::api::types::{Task, User, UserUpdate};
use crate::context::Context;
use crate::query::{Mutation, MutationOutcome, QueryKey, Subscription};
use crate::router::Route;
use crate::ui::components::{ConfirmDialog, ConfirmEvent, Form, FormEvent, KeyResult};
use crate::ui::renderfns::{format_timestamp, status_color, status_icon, status_label, truncate};
use crate::ui::view::{Shortcut, View, ViewAction};
use crate::ui::{ensure_valid_selection, placeholder, status_title};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// One user with their tasks; supports editing and deletion
pub struct UserDetailView {
  id: i64,
  ctx: Context,
  user: Subscription<Option<User>>,
  tasks: Subscription<Vec<Task>>,
  list_state: ListState,
  editing: Option<Form>,
  confirm: ConfirmDialog,
  save: Mutation<User>,
  delete: Mutation<()>,
}

impl UserDetailView {
  pub fn new(id: i64, ctx: &Context) -> Self {
    Self {
      id,
      ctx: ctx.clone(),
      user: ctx.user(id),
      tasks: ctx.user_tasks(id),
      list_state: ListState::default(),
      editing: None,
      confirm: ConfirmDialog::new(),
      save: Mutation::new(ctx.queries.clone()),
      delete: Mutation::new(ctx.queries.clone()),
    }
  }

  fn start_editing(&mut self) {
    if let Some(user) = self.user.found() {
      self.save.reset();
      self.editing = Some(
        Form::new()
          .text("Username", &user.username)
          .text("Email", &user.email)
          .secret("Password (leave blank to keep)"),
      );
    }
  }

  fn submit(&mut self) {
    let Some(form) = self.editing.as_mut() else {
      return;
    };
    if !validate_user_form(form, false) {
      return;
    }

    let password = form.value(2);
    let update = UserUpdate {
      username: Some(form.value(0).trim().to_string()),
      email: Some(form.value(1).trim().to_string()),
      password: (!password.trim().is_empty()).then(|| password.to_string()),
      is_active: None,
    };
    let api = self.ctx.api.clone();
    let id = self.id;
    self.save.run(
      async move { api.update_user(id, &update).await.map_err(|e| e.to_string()) },
      [QueryKey::User(id), QueryKey::Users],
    );
  }

  fn remove(&mut self) {
    let api = self.ctx.api.clone();
    let id = self.id;
    self.delete.run(
      async move { api.delete_user(id).await.map_err(|e| e.to_string()) },
      [QueryKey::Users],
    );
  }

  fn render_user(&self, frame: &mut Frame, area: Rect) {
    let snapshot = self.user.snapshot();
    let mut title = format!(" User #{} ", self.id);
    if let Some(error) = &snapshot.error {
      title = format!(" User #{} (error: {}) ", self.id, error);
    }
    if self.delete.is_pending() {
      title = format!(" User #{} (deleting...) ", self.id);
    }
    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let Some(Some(user)) = snapshot.data.as_deref().cloned() else {
      let inner = block.inner(area);
      frame.render_widget(block, area);
      let (text, color) = match (&snapshot.data, &snapshot.error) {
        (Some(_), _) => ("User not found.", Color::Red),
        (None, Some(_)) => ("Failed to load user.", Color::Red),
        (None, None) => ("Loading user...", Color::DarkGray),
      };
      placeholder(frame, inner, text, color);
      return;
    };

    let label = |s: &'static str| Span::styled(format!("{:<10}", s), Style::default().fg(Color::DarkGray));
    let (active, active_color) = if user.is_active {
      ("Active", Color::Green)
    } else {
      ("Inactive", Color::DarkGray)
    };
    let mut lines = vec![
      Line::from(vec![label("Username"), Span::styled(user.username.clone(), Style::default().bold())]),
      Line::from(vec![label("Email"), Span::raw(user.email.clone())]),
      Line::from(vec![label("Status"), Span::styled(active, Style::default().fg(active_color))]),
      Line::from(vec![label("Created"), Span::raw(format_timestamp(&user.created_at))]),
      Line::from(vec![label("Updated"), Span::raw(format_timestamp(&user.updated_at))]),
    ];
    if let Some(error) = self.delete.error() {
      lines.push(Line::from(Span::styled(
        format!("Delete failed: {}", error),
        Style::default().fg(Color::Red),
      )));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
  }

  fn render_tasks(&mut self, frame: &mut Frame, area: Rect) {
    let snapshot = self.tasks.snapshot();
    let tasks: &[Task] = snapshot.data.as_deref().map(|v| v.as_slice()).unwrap_or(&[]);
    ensure_valid_selection(&mut self.list_state, tasks.len());

    let block = Block::default()
      .title(status_title(
        "Tasks",
        snapshot.data.as_ref().map(|v| v.len()),
        snapshot.is_loading(),
        snapshot.error.as_deref(),
      ))
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if tasks.is_empty() {
      let inner = block.inner(area);
      frame.render_widget(block, area);
      let text = if snapshot.is_loading() {
        "Loading tasks..."
      } else {
        "No tasks for this user."
      };
      placeholder(frame, inner, text, Color::DarkGray);
      return;
    }

    let items: Vec<ListItem> = tasks
      .iter()
      .map(|task| {
        let color = status_color(&task.status);
        ListItem::new(Line::from(vec![
          Span::styled(format!("{:<6}", task.id), Style::default().fg(Color::Cyan)),
          Span::styled(
            format!("{} {:<12}", status_icon(&task.status), status_label(&task.status)),
            Style::default().fg(color),
          ),
          Span::raw(truncate(&task.title, 60)),
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

  fn handle_form(&mut self, key: KeyEvent) -> Option<ViewAction> {
    let form = self.editing.as_mut()?;
    match form.handle_key(key) {
      KeyResult::Event(FormEvent::Submitted) => self.submit(),
      KeyResult::Event(FormEvent::Cancelled) => self.editing = None,
      _ => {}
    }
    Some(ViewAction::None)
  }

  fn handle_overlays(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match self.confirm.handle_key(key) {
      KeyResult::Event(ConfirmEvent::Confirmed) => {
        self.remove();
        Some(ViewAction::None)
      }
      KeyResult::NotHandled => None,
      _ => Some(ViewAction::None),
    }
  }

  fn handle_actions(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Enter => {
        let idx = self.list_state.selected()?;
        let tasks = self.tasks.data()?;
        let task = tasks.get(idx)?;
        return Some(ViewAction::Push(Route::TaskDetail(task.id)));
      }
      KeyCode::Char('e') => self.start_editing(),
      KeyCode::Char('d') => {
        if let Some(user) = self.user.found() {
          self.confirm.show(format!("Delete user {}?", user.username));
        }
      }
      KeyCode::Char('r') => {
        self.user.refetch();
        self.tasks.refetch();
      }
      KeyCode::Char('q') | KeyCode::Esc => return Some(ViewAction::Pop),
      _ => return None,
    }
    Some(ViewAction::None)
  }
}

impl View for UserDetailView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    self
      .handle_form(key)
      .or_else(|| self.handle_overlays(key))
      .or_else(|| self.handle_actions(key))
      .unwrap_or(ViewAction::None)
  }

  fn tick(&mut self) -> ViewAction {
    match self.save.pump() {
      Some(MutationOutcome::Success(_)) => self.editing = None,
      Some(MutationOutcome::Failure(error)) => {
        if let Some(form) = self.editing.as_mut() {
          form.set_error(error);
        }
      }
      None => {}
    }

    match self.delete.pump() {
      Some(MutationOutcome::Success(())) => ViewAction::Navigate(Route::Users),
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    if let Some(form) = &self.editing {
      let title = if self.save.is_pending() {
        format!(" Edit user #{} (saving...) ", self.id)
      } else {
        format!(" Edit user #{} ", self.id)
      };
      let block = Block::default()
        .title(title)
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
      let inner = block.inner(area);
      frame.render_widget(block, area);
      form.render(frame, inner);
      return;
    }

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Length(8), Constraint::Min(3)])
      .split(area);
    self.render_user(frame, chunks[0]);
    self.render_tasks(frame, chunks[1]);
    self.confirm.render_overlay(frame, area);
  }

  fn route(&self) -> Route {
    Route::UserDetail(self.id)
  }

  fn breadcrumb_label(&self) -> String {
    self
      .user
      .found()
      .map(|u| u.username)
      .unwrap_or_else(|| format!("User #{}", self.id))
  }

  fn captures_input(&self) -> bool {
    self.editing.is_some() || self.confirm.is_active()
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    if self.editing.is_some() {
      return vec![
        Shortcut::new("ctrl-s", "save").with_priority(20),
        Shortcut::new("esc", "cancel").with_priority(90),
      ];
    }
    vec![
      Shortcut::new(":", "command").with_priority(10),
      Shortcut::new("e", "edit").with_priority(20),
      Shortcut::new("d", "delete").with_priority(30),
      Shortcut::new("enter", "open task").with_priority(40),
      Shortcut::new("q", "back").with_priority(90),
    ]
  }
}
