use crate::api::types::Task;
use crate::context::Context;
use crate::query::Subscription;
use crate::router::Route;
use crate::ui::components::{KeyResult, SearchEvent, SearchInput};
use crate::ui::renderfns::{status_color, status_icon, status_label, truncate};
use crate::ui::view::{Shortcut, View, ViewAction};
use crate::ui::{ensure_valid_selection, placeholder, status_title};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState};

/// Worker id plus the most recent worker timestamp
fn worker_column(task: &Task) -> String {
  let worker = task
    .worker_id
    .as_deref()
    .map(|w| truncate(w, 12))
    .unwrap_or_else(|| "-".to_string());
  let time = match (task.started_at, task.completed_at) {
    (_, Some(done)) => format!("done {}", done.format("%H:%M:%S")),
    (Some(started), None) => format!("started {}", started.format("%H:%M:%S")),
    (None, None) => String::new(),
  };
  format!("{:<12} {}", worker, time)
}

/// Polled list of all tasks with their worker status
pub struct TaskListView {
  tasks: Subscription<Vec<Task>>,
  list_state: ListState,
  search: SearchInput,
}

impl TaskListView {
  pub fn new(ctx: &Context) -> Self {
    Self {
      tasks: ctx.tasks(),
      list_state: ListState::default(),
      search: SearchInput::new(),
    }
  }

  fn visible(&self) -> Vec<Task> {
    let Some(tasks) = self.tasks.data() else {
      return Vec::new();
    };
    tasks
      .iter()
      .filter(|t| {
        self.search.matches(&[
          t.title.as_str(),
          t.description.as_deref().unwrap_or(""),
          status_label(&t.status),
        ])
      })
      .cloned()
      .collect()
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let snapshot = self.tasks.snapshot();
    let tasks = self.visible();
    ensure_valid_selection(&mut self.list_state, tasks.len());

    let block = Block::default()
      .title(status_title(
        "Tasks",
        snapshot.data.as_ref().map(|_| tasks.len()),
        snapshot.is_loading(),
        snapshot.error.as_deref(),
      ))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if tasks.is_empty() {
      let inner = block.inner(area);
      frame.render_widget(block, area);
      let (text, color) = if snapshot.is_loading() {
        ("Loading tasks...", Color::DarkGray)
      } else if snapshot.data.is_none() && snapshot.error.is_some() {
        ("Failed to load tasks. Press 'r' to retry.", Color::Red)
      } else if !self.search.query().is_empty() {
        ("No tasks match the filter.", Color::DarkGray)
      } else {
        ("No tasks found. Press 'n' to create one.", Color::DarkGray)
      };
      placeholder(frame, inner, text, color);
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
          Span::styled(
            format!("{:<40}", truncate(&task.title, 40)),
            Style::default().fg(Color::White).bold(),
          ),
          Span::styled(
            format!(" {:<10}", format!("user #{}", task.user_id)),
            Style::default().fg(Color::DarkGray),
          ),
          Span::styled(format!(" {}", worker_column(task)), Style::default().fg(Color::Magenta)),
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
        self.tasks.refetch();
        Some(ViewAction::None)
      }
      KeyCode::Char('n') => Some(ViewAction::Push(Route::TaskCreate)),
      KeyCode::Enter => {
        let idx = self.list_state.selected()?;
        let task = self.visible().into_iter().nth(idx)?;
        Some(ViewAction::Push(Route::TaskDetail(task.id)))
      }
      KeyCode::Char('q') | KeyCode::Esc => Some(ViewAction::Pop),
      _ => None,
    }
  }
}

impl View for TaskListView {
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
    Route::Tasks
  }

  fn breadcrumb_label(&self) -> String {
    if self.search.query().is_empty() {
      "Tasks".to_string()
    } else {
      format!("Tasks [/{}]", self.search.query())
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
