use crate::api::types::{Task, TaskUpdate};
use crate::context::Context;
use crate::query::{Mutation, MutationOutcome, QueryKey, Subscription};
use crate::router::Route;
use crate::ui::components::{ConfirmDialog, ConfirmEvent, Form, FormEvent, KeyResult};
use crate::ui::placeholder;
use crate::ui::renderfns::{
  format_optional_timestamp, format_timestamp, status_color, status_icon, status_label,
};
use crate::ui::view::{Shortcut, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// A single task, polled so worker progress shows up without input
pub struct TaskDetailView {
  id: i64,
  ctx: Context,
  task: Subscription<Option<Task>>,
  editing: Option<Form>,
  confirm: ConfirmDialog,
  save: Mutation<Task>,
  delete: Mutation<()>,
}

impl TaskDetailView {
  pub fn new(id: i64, ctx: &Context) -> Self {
    Self {
      id,
      ctx: ctx.clone(),
      task: ctx.task(id),
      editing: None,
      confirm: ConfirmDialog::new(),
      save: Mutation::new(ctx.queries.clone()),
      delete: Mutation::new(ctx.queries.clone()),
    }
  }

  fn start_editing(&mut self) {
    if let Some(task) = self.task.found() {
      self.save.reset();
      self.editing = Some(
        Form::new()
          .text("Title", &task.title)
          .text("Description", task.description.as_deref().unwrap_or("")),
      );
    }
  }

  fn submit(&mut self) {
    let Some(task) = self.task.found() else {
      return;
    };
    let Some(form) = self.editing.as_mut() else {
      return;
    };

    form.clear_errors();
    let title = form.value(0).trim().to_string();
    if title.is_empty() {
      form.set_field_error(0, "Title is required");
      return;
    }

    let update = TaskUpdate {
      title: Some(title),
      description: Some(form.value(1).to_string()),
      ..TaskUpdate::default()
    };
    let api = self.ctx.api.clone();
    let id = self.id;
    self.save.run(
      async move { api.update_task(id, &update).await.map_err(|e| e.to_string()) },
      [QueryKey::Task(id), QueryKey::Tasks, QueryKey::UserTasks(task.user_id)],
    );
  }

  fn remove(&mut self) {
    let Some(task) = self.task.found() else {
      return;
    };
    let api = self.ctx.api.clone();
    let id = self.id;
    self.delete.run(
      async move { api.delete_task(id).await.map_err(|e| e.to_string()) },
      [QueryKey::Tasks, QueryKey::UserTasks(task.user_id)],
    );
  }

  fn render_task(&self, frame: &mut Frame, area: Rect) {
    let snapshot = self.task.snapshot();
    let title = if self.delete.is_pending() {
      format!(" Task #{} (deleting...) ", self.id)
    } else if let Some(error) = &snapshot.error {
      format!(" Task #{} (error: {}) ", self.id, error)
    } else {
      format!(" Task #{} ", self.id)
    };
    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let Some(Some(task)) = snapshot.data.as_deref().cloned() else {
      let inner = block.inner(area);
      frame.render_widget(block, area);
      let (text, color) = match (&snapshot.data, &snapshot.error) {
        (Some(_), _) => ("Task not found.", Color::Red),
        (None, Some(_)) => ("Failed to load task.", Color::Red),
        (None, None) => ("Loading task...", Color::DarkGray),
      };
      placeholder(frame, inner, text, color);
      return;
    };

    let label = |s: &'static str| Span::styled(format!("{:<12}", s), Style::default().fg(Color::DarkGray));
    let color = status_color(&task.status);
    let mut lines = vec![
      Line::from(vec![label("Title"), Span::styled(task.title.clone(), Style::default().bold())]),
      Line::from(vec![
        label("Status"),
        Span::styled(
          format!("{} {}", status_icon(&task.status), status_label(&task.status)),
          Style::default().fg(color).bold(),
        ),
      ]),
      Line::from(vec![label("Owner"), Span::raw(format!("user #{}", task.user_id))]),
      Line::from(vec![label("Created"), Span::raw(format_timestamp(&task.created_at))]),
      Line::from(vec![label("Updated"), Span::raw(format_timestamp(&task.updated_at))]),
      Line::from(""),
      Line::from(label("Description")),
      Line::from(
        task
          .description
          .clone()
          .filter(|d| !d.is_empty())
          .unwrap_or_else(|| "No description".to_string()),
      ),
    ];

    let has_worker_info = task.worker_id.is_some()
      || task.started_at.is_some()
      || task.completed_at.is_some()
      || task.error_message.is_some();
    if has_worker_info {
      lines.push(Line::from(""));
      lines.push(Line::from(Span::styled("Processing", Style::default().fg(Color::Cyan).bold())));
      lines.push(Line::from(vec![
        label("Worker"),
        Span::raw(task.worker_id.clone().unwrap_or_else(|| "-".to_string())),
      ]));
      lines.push(Line::from(vec![
        label("Started"),
        Span::raw(format_optional_timestamp(task.started_at.as_ref())),
      ]));
      lines.push(Line::from(vec![
        label("Completed"),
        Span::raw(format_optional_timestamp(task.completed_at.as_ref())),
      ]));
      if let Some(error) = &task.error_message {
        lines.push(Line::from(vec![
          label("Error"),
          Span::styled(error.clone(), Style::default().fg(Color::Red)),
        ]));
      }
    }

    if let Some(error) = self.delete.error() {
      lines.push(Line::from(""));
      lines.push(Line::from(Span::styled(
        format!("Delete failed: {}", error),
        Style::default().fg(Color::Red),
      )));
    }

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
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
      KeyCode::Char('e') => self.start_editing(),
      KeyCode::Char('d') => {
        if let Some(task) = self.task.found() {
          self.confirm.show(format!("Delete task \"{}\"?", task.title));
        }
      }
      KeyCode::Char('o') => {
        let task = self.task.found()?;
        return Some(ViewAction::Push(Route::UserDetail(task.user_id)));
      }
      KeyCode::Char('r') => self.task.refetch(),
      KeyCode::Char('q') | KeyCode::Esc => return Some(ViewAction::Pop),
      _ => return None,
    }
    Some(ViewAction::None)
  }
}

impl View for TaskDetailView {
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
      Some(MutationOutcome::Success(())) => ViewAction::Navigate(Route::Tasks),
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    if let Some(form) = &self.editing {
      let title = if self.save.is_pending() {
        format!(" Edit task #{} (saving...) ", self.id)
      } else {
        format!(" Edit task #{} ", self.id)
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

    self.render_task(frame, area);
    self.confirm.render_overlay(frame, area);
  }

  fn route(&self) -> Route {
    Route::TaskDetail(self.id)
  }

  fn breadcrumb_label(&self) -> String {
    format!("Task #{}", self.id)
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
      Shortcut::new("o", "owner").with_priority(40),
      Shortcut::new("q", "back").with_priority(90),
    ]
  }
}
