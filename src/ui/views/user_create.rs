use crate::api::types::{User, UserCreate};
use crate::context::Context;
use crate::query::{Mutation, MutationOutcome, QueryKey};
use crate::router::Route;
use crate::ui::components::{Form, FormEvent, KeyResult};
use crate::ui::view::{Shortcut, View, ViewAction};
use crossterm::event::KeyEvent;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders};
use regex::Regex;
use std::sync::LazyLock;

const USERNAME: usize = 0;
const EMAIL: usize = 1;
const PASSWORD: usize = 2;

static EMAIL_PATTERN: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").expect("email pattern is valid"));
const MIN_PASSWORD_LEN: usize = 6;

/// Check the username/email/password fields of `form`, marking failures on
/// the fields. An empty password is accepted when `password_required` is false.
pub(super) fn validate_user_form(form: &mut Form, password_required: bool) -> bool {
  form.clear_errors();

  if form.value(USERNAME).trim().is_empty() {
    form.set_field_error(USERNAME, "Username is required");
  }

  let email = form.value(EMAIL).trim().to_string();
  if email.is_empty() {
    form.set_field_error(EMAIL, "Email is required");
  } else if !EMAIL_PATTERN.is_match(&email) {
    form.set_field_error(EMAIL, "Email is invalid");
  }

  let password = form.value(PASSWORD).to_string();
  if password.trim().is_empty() {
    if password_required {
      form.set_field_error(PASSWORD, "Password is required");
    }
  } else if password.chars().count() < MIN_PASSWORD_LEN {
    form.set_field_error(PASSWORD, "Password must be at least 6 characters");
  }

  !form.has_errors()
}

/// Registration form
pub struct UserCreateView {
  ctx: Context,
  form: Form,
  create: Mutation<User>,
}

impl UserCreateView {
  pub fn new(ctx: &Context) -> Self {
    Self {
      ctx: ctx.clone(),
      form: Form::new()
        .text("Username", "")
        .text("Email", "")
        .secret("Password"),
      create: Mutation::new(ctx.queries.clone()),
    }
  }

  fn submit(&mut self) {
    if !validate_user_form(&mut self.form, true) {
      return;
    }

    let input = UserCreate {
      username: self.form.value(USERNAME).trim().to_string(),
      email: self.form.value(EMAIL).trim().to_string(),
      password: self.form.value(PASSWORD).to_string(),
    };
    let api = self.ctx.api.clone();
    self.create.run(
      async move { api.create_user(&input).await.map_err(|e| e.to_string()) },
      [QueryKey::Users],
    );
  }
}

impl View for UserCreateView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match self.form.handle_key(key) {
      KeyResult::Event(FormEvent::Submitted) => {
        self.submit();
        ViewAction::None
      }
      KeyResult::Event(FormEvent::Cancelled) => ViewAction::Pop,
      _ => ViewAction::None,
    }
  }

  fn tick(&mut self) -> ViewAction {
    match self.create.pump() {
      Some(MutationOutcome::Success(_)) => ViewAction::Navigate(Route::Users),
      Some(MutationOutcome::Failure(error)) => {
        self.form.set_error(error);
        ViewAction::None
      }
      None => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let title = if self.create.is_pending() {
      " New user (creating...) "
    } else {
      " New user "
    };
    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    self.form.render(frame, inner);
  }

  fn route(&self) -> Route {
    Route::UserCreate
  }

  fn breadcrumb_label(&self) -> String {
    "New user".to_string()
  }

  fn captures_input(&self) -> bool {
    true
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new("ctrl-s", "create").with_priority(20),
      Shortcut::new("esc", "cancel").with_priority(90),
    ]
  }
}
