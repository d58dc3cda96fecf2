use crate::api::types::{Task, TaskCreate, User};
use crate::context::Context;
use crate::query::{Mutation, MutationOutcome, QueryKey, Subscription};
use crate::router::Route;
use crate::ui::components::{Form, FormEvent, KeyResult, Picker, PickerEvent};
use crate::ui::view::{Shortcut, View, ViewAction};
use crossterm::event::KeyEvent;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders};

const TITLE: usize = 0;
const DESCRIPTION: usize = 1;
const OWNER: usize = 2;

fn owner_label(user: &User) -> String {
  format!("{} <{}>", user.username, user.email)
}

/// Form for queueing a new task; the owner is picked from the user list
pub struct TaskCreateView {
  ctx: Context,
  users: Subscription<Vec<User>>,
  form: Form,
  picker: Picker,
  owner: Option<i64>,
  create: Mutation<Task>,
}

impl TaskCreateView {
  pub fn new(ctx: &Context) -> Self {
    Self {
      ctx: ctx.clone(),
      users: ctx.users(false),
      form: Form::new()
        .text("Title", "")
        .text("Description", "")
        .choice("Owner", ""),
      picker: Picker::new(),
      owner: None,
      create: Mutation::new(ctx.queries.clone()),
    }
  }

  fn open_picker(&mut self) {
    let snapshot = self.users.snapshot();
    if let Some(users) = &snapshot.data {
      let options = users.iter().map(|u| (u.id, owner_label(u))).collect();
      self.picker.show("Owner", options, self.owner);
      return;
    }

    let message = match snapshot.error {
      Some(error) => format!("Could not load users: {}", error),
      None => "Users are still loading".to_string(),
    };
    self.form.set_field_error(OWNER, message);
  }

  fn choose_owner(&mut self, id: i64) {
    let label = self
      .users
      .data()
      .and_then(|users| users.iter().find(|u| u.id == id).map(owner_label))
      .unwrap_or_else(|| format!("user #{}", id));
    self.owner = Some(id);
    self.form.set_value(OWNER, &label);
  }

  fn submit(&mut self) {
    self.form.clear_errors();
    let title = self.form.value(TITLE).trim().to_string();
    if title.is_empty() {
      self.form.set_field_error(TITLE, "Title is required");
    }
    if self.owner.is_none() {
      self.form.set_field_error(OWNER, "Owner is required");
    }
    let Some(user_id) = self.owner.filter(|_| !self.form.has_errors()) else {
      return;
    };

    let description = self.form.value(DESCRIPTION).trim();
    let input = TaskCreate {
      title,
      description: (!description.is_empty()).then(|| description.to_string()),
      user_id,
    };
    let api = self.ctx.api.clone();
    self.create.run(
      async move { api.create_task(&input).await.map_err(|e| e.to_string()) },
      [QueryKey::Tasks, QueryKey::UserTasks(user_id)],
    );
  }
}

impl View for TaskCreateView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match self.picker.handle_key(key) {
      KeyResult::Event(PickerEvent::Selected(id)) => {
        self.choose_owner(id);
        return ViewAction::None;
      }
      KeyResult::NotHandled => {}
      _ => return ViewAction::None,
    }

    match self.form.handle_key(key) {
      KeyResult::Event(FormEvent::Submitted) => self.submit(),
      KeyResult::Event(FormEvent::Choose(_)) => self.open_picker(),
      KeyResult::Event(FormEvent::Cancelled) => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn tick(&mut self) -> ViewAction {
    match self.create.pump() {
      Some(MutationOutcome::Success(_)) => ViewAction::Navigate(Route::Tasks),
      Some(MutationOutcome::Failure(error)) => {
        self.form.set_error(error);
        ViewAction::None
      }
      None => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let title = if self.create.is_pending() {
      " New task (creating...) "
    } else {
      " New task "
    };
    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    self.form.render(frame, inner);
    self.picker.render_overlay(frame, area);
  }

  fn route(&self) -> Route {
    Route::TaskCreate
  }

  fn breadcrumb_label(&self) -> String {
    "New task".to_string()
  }

  fn captures_input(&self) -> bool {
    true
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new("ctrl-s", "create").with_priority(20),
      Shortcut::new("enter", "pick owner").with_priority(30),
      Shortcut::new("esc", "cancel").with_priority(90),
    ]
  }
}
