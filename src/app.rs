use crate::commands::CommandAction;
use crate::config::Config;
use crate::context::Context;
use crate::event::{Event, EventHandler};
use crate::router::Route;
use crate::ui;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::view::{View, ViewAction};
use crate::ui::views;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;
use tracing::{debug, info};

/// How often the cache is pumped and the screen redrawn without input
const TICK_RATE: Duration = Duration::from_millis(100);

/// Main application state
pub struct App {
  ctx: Context,

  /// Header title
  title: String,

  /// Backend base url, shown in the header
  api_url: String,

  /// Navigation stack - Home is always at index 0
  view_stack: Vec<Box<dyn View>>,

  /// Command prompt (after pressing :)
  command: CommandInput,

  /// Transient status line message, cleared on the next key
  message: Option<String>,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(ctx: Context, config: &Config, start: Route) -> Self {
    let title = config.display_title().to_string();
    let mut app = Self {
      ctx,
      title,
      api_url: config.api.url.clone(),
      view_stack: Vec::new(),
      command: CommandInput::new(),
      message: None,
      should_quit: false,
    };

    app.push(Route::Home);
    if start != Route::Home {
      app.push(start);
    }
    app
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut events = EventHandler::new(TICK_RATE);
    let result = self.event_loop(&mut terminal, &mut events).await;

    // Cleanup terminal, even when the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop<B: Backend>(
    &mut self,
    terminal: &mut Terminal<B>,
    events: &mut EventHandler,
  ) -> Result<()> {
    while !self.should_quit() {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(Event::Key(key)) => self.handle_key(key),
        Some(Event::Tick) => {}
        None => break,
      }
      // Every event also settles whatever the network delivered meanwhile
      self.tick();
    }
    info!("quitting");
    Ok(())
  }

  pub fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }
    self.message = None;

    // Views taking text input get `:` as a character
    let captures = self.current_view().is_some_and(|v| v.captures_input());
    if !captures || self.command.is_active() {
      match self.command.handle_key(key) {
        KeyResult::Event(CommandEvent::Submitted(action)) => {
          self.run_command(action);
          return;
        }
        KeyResult::Event(CommandEvent::Cancelled) | KeyResult::Handled => return,
        KeyResult::NotHandled => {}
      }
    }

    if let Some(view) = self.view_stack.last_mut() {
      let action = view.handle_key(key);
      self.apply(action);
    }
  }

  /// Apply settled fetches, then let the visible view react to its mutations.
  pub fn tick(&mut self) {
    self.ctx.queries.pump();
    if let Some(view) = self.view_stack.last_mut() {
      let action = view.tick();
      self.apply(action);
    }
  }

  fn run_command(&mut self, action: CommandAction) {
    debug!(?action, "command");
    match action {
      CommandAction::Navigate(route) => self.go_to(route),
      CommandAction::Refresh => {
        self.ctx.queries.invalidate_all();
        self.message = Some("Refreshing".to_string());
      }
      CommandAction::Quit => self.should_quit = true,
    }
  }

  fn apply(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Push(route) => self.push(route),
      ViewAction::Navigate(route) => {
        self.view_stack.pop();
        self.go_to(route);
      }
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.should_quit = true;
        }
      }
    }
  }

  /// Return to `route` if it is on the stack, otherwise open it on top
  fn go_to(&mut self, route: Route) {
    match self.view_stack.iter().rposition(|v| v.route() == route) {
      Some(pos) => self.view_stack.truncate(pos + 1),
      None => self.push(route),
    }
  }

  fn push(&mut self, route: Route) {
    info!(%route, "open view");
    let view = views::build(route, &self.ctx, &self.title);
    self.view_stack.push(view);
  }

  // Accessors for UI rendering
  pub fn current_view(&self) -> Option<&dyn View> {
    self.view_stack.last().map(|v| &**v)
  }

  pub fn current_view_mut(&mut self) -> Option<&mut Box<dyn View>> {
    self.view_stack.last_mut()
  }

  pub fn command_input(&self) -> &CommandInput {
    &self.command
  }

  pub fn title(&self) -> &str {
    &self.title
  }

  pub fn api_url(&self) -> &str {
    &self.api_url
  }

  pub fn message(&self) -> Option<&str> {
    self.message.as_deref()
  }

  pub fn should_quit(&self) -> bool {
    self.should_quit
  }

  pub fn breadcrumb(&self) -> Vec<String> {
    self
      .view_stack
      .iter()
      .map(|v| v.breadcrumb_label())
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::memory::MemoryApi;
  use crate::api::types::{TaskStatus, UserCreate};
  use crate::api::TaskApi;
  use ratatui::backend::TestBackend;
  use std::sync::Arc;

  struct Harness {
    app: App,
    terminal: Terminal<TestBackend>,
    api: Arc<MemoryApi>,
    config: Config,
  }

  impl Harness {
    fn new(start: Route) -> Self {
      Self::with_config(start, Config::default())
    }

    fn with_config(start: Route, config: Config) -> Self {
      let api = Arc::new(MemoryApi::new());
      let ctx = Context::new(api.clone(), &config);
      let app = App::new(ctx, &config, start);
      let terminal = Terminal::new(TestBackend::new(110, 30)).unwrap();
      Self {
        app,
        terminal,
        api,
        config,
      }
    }

    /// Let spawned requests finish and apply them
    async fn settle(&mut self) {
      for _ in 0..5 {
        tokio::time::sleep(Duration::from_millis(1)).await;
        self.app.tick();
      }
    }

    fn press(&mut self, code: KeyCode) {
      self.app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn ctrl(&mut self, c: char) {
      self
        .app
        .handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL));
    }

    fn type_str(&mut self, s: &str) {
      for c in s.chars() {
        self.press(KeyCode::Char(c));
      }
    }

    fn screen(&mut self) -> String {
      let app = &mut self.app;
      self.terminal.draw(|frame| ui::draw(frame, app)).unwrap();
      let buffer = self.terminal.backend().buffer();
      let width = buffer.area.width as usize;
      buffer
        .content
        .chunks(width)
        .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
    }

    fn route(&self) -> Option<Route> {
      self.app.current_view().map(|v| v.route())
    }
  }

  #[tokio::test(start_paused = true)]
  async fn test_starts_at_requested_route_above_home() {
    let mut h = Harness::new(Route::Tasks);
    assert_eq!(h.route(), Some(Route::Tasks));
    assert_eq!(h.app.breadcrumb(), vec!["Home", "Tasks"]);

    h.press(KeyCode::Char('q'));
    assert_eq!(h.route(), Some(Route::Home));
    h.press(KeyCode::Char('q'));
    assert!(h.app.should_quit());
  }

  #[tokio::test(start_paused = true)]
  async fn test_command_navigation_reuses_stack() {
    let mut h = Harness::new(Route::Home);
    h.type_str(":users");
    h.press(KeyCode::Enter);
    assert_eq!(h.route(), Some(Route::Users));

    h.type_str(":/tasks/42");
    h.press(KeyCode::Enter);
    assert_eq!(h.route(), Some(Route::TaskDetail(42)));

    // Back to a route already on the stack pops down to it
    h.type_str(":users");
    h.press(KeyCode::Enter);
    assert_eq!(h.app.breadcrumb(), vec!["Home", "Users"]);

    h.type_str(":/projects");
    h.press(KeyCode::Enter);
    assert_eq!(h.route(), Some(Route::NotFound));
    assert!(h.screen().contains("Page not found"));
  }

  #[tokio::test(start_paused = true)]
  async fn test_colon_is_text_inside_forms() {
    let mut h = Harness::new(Route::UserCreate);
    h.type_str("a:b");
    assert!(!h.app.command_input().is_active());
    assert!(h.screen().contains("a:b"));
  }

  #[tokio::test(start_paused = true)]
  async fn test_refresh_command_refetches_visible_queries() {
    let mut h = Harness::new(Route::Users);
    h.settle().await;
    assert_eq!(h.api.calls("list_users"), 1);

    h.type_str(":refresh");
    h.press(KeyCode::Enter);
    h.settle().await;
    assert_eq!(h.api.calls("list_users"), 2);
    assert_eq!(h.app.message(), Some("Refreshing"));
  }

  #[tokio::test(start_paused = true)]
  async fn test_user_form_validation_blocks_request() {
    let mut h = Harness::new(Route::UserCreate);
    h.type_str("alice");
    h.press(KeyCode::Tab);
    h.type_str("not-an-email");
    h.ctrl('s');
    h.settle().await;

    let screen = h.screen();
    assert!(screen.contains("Email is invalid"));
    assert!(screen.contains("Password is required"));
    assert_eq!(h.api.calls("create_user"), 0);
    assert_eq!(h.route(), Some(Route::UserCreate));
  }

  #[tokio::test(start_paused = true)]
  async fn test_backend_error_shows_on_form() {
    let mut h = Harness::new(Route::UserCreate);
    h.api
      .create_user(&UserCreate {
        username: "taken".to_string(),
        email: "alice@example.com".to_string(),
        password: "secret1".to_string(),
      })
      .await
      .unwrap();

    h.type_str("alice");
    h.press(KeyCode::Tab);
    h.type_str("alice@example.com");
    h.press(KeyCode::Tab);
    h.type_str("secret1");
    h.press(KeyCode::Enter);
    h.settle().await;

    assert!(h.screen().contains("Email already registered"));
    assert_eq!(h.route(), Some(Route::UserCreate));
  }

  #[tokio::test(start_paused = true)]
  async fn test_leaving_form_before_save_settles_still_refreshes_list() {
    let config = Config {
      stale_time_ms: 60_000,
      poll_interval_ms: 60_000,
      ..Config::default()
    };
    let mut h = Harness::with_config(Route::Home, config);

    h.type_str(":users");
    h.press(KeyCode::Enter);
    h.settle().await;
    assert!(h.screen().contains("No users found"));
    h.press(KeyCode::Char('q'));

    h.type_str(":new-user");
    h.press(KeyCode::Enter);
    h.type_str("alice");
    h.press(KeyCode::Tab);
    h.type_str("alice@example.com");
    h.press(KeyCode::Tab);
    h.type_str("secret1");
    h.ctrl('s');
    h.press(KeyCode::Esc);
    assert_eq!(h.route(), Some(Route::Home));
    h.settle().await;
    assert_eq!(h.api.calls("create_user"), 1);

    // The cached list is still fresh by age, but the save marked it stale
    h.type_str(":users");
    h.press(KeyCode::Enter);
    h.settle().await;
    assert_eq!(h.api.calls("list_users"), 2);
    assert!(h.screen().contains("alice@example.com"));
  }

  #[tokio::test(start_paused = true)]
  async fn test_user_lifecycle() {
    let mut h = Harness::new(Route::UserCreate);

    // Create
    h.type_str("alice");
    h.press(KeyCode::Tab);
    h.type_str("alice@example.com");
    h.press(KeyCode::Tab);
    h.type_str("secret1");
    h.ctrl('s');
    h.settle().await;

    assert_eq!(h.route(), Some(Route::Users));
    assert_eq!(h.app.breadcrumb(), vec!["Home", "Users"]);
    assert!(h.screen().contains("alice@example.com"));

    // Detail
    h.press(KeyCode::Enter);
    h.settle().await;
    assert_eq!(h.route(), Some(Route::UserDetail(1)));
    assert!(h.screen().contains("User #1"));

    // Edit
    h.press(KeyCode::Char('e'));
    h.type_str("2");
    h.ctrl('s');
    h.settle().await;
    let screen = h.screen();
    assert!(screen.contains("alice2"));
    assert!(!screen.contains("Edit user"));

    // The list underneath was refreshed by the same save
    h.press(KeyCode::Char('q'));
    assert!(h.screen().contains("alice2"));

    // Delete
    h.press(KeyCode::Enter);
    h.settle().await;
    h.press(KeyCode::Char('d'));
    assert!(h.screen().contains("Delete user alice2?"));
    h.press(KeyCode::Char('y'));
    h.settle().await;

    assert_eq!(h.route(), Some(Route::Users));
    assert_eq!(h.app.breadcrumb(), vec!["Home", "Users"]);
    let screen = h.screen();
    assert!(!screen.contains("alice2"));
    assert!(screen.contains("No users found"));
  }

  #[tokio::test(start_paused = true)]
  async fn test_edit_with_blank_password_keeps_it() {
    let mut h = Harness::new(Route::Home);
    let user = h
      .api
      .create_user(&UserCreate {
        username: "alice".to_string(),
        email: "a@x.com".to_string(),
        password: "secret1".to_string(),
      })
      .await
      .unwrap();

    h.type_str(&format!(":/users/{}", user.id));
    h.press(KeyCode::Enter);
    h.settle().await;

    // Whitespace reads as "unchanged", not as a two-character password
    h.press(KeyCode::Char('e'));
    h.press(KeyCode::Tab);
    h.press(KeyCode::Tab);
    h.type_str("  ");
    h.ctrl('s');
    h.settle().await;
    assert_eq!(h.api.calls("update_user"), 1);
    assert_eq!(h.api.password(user.id), Some("secret1".to_string()));
    assert!(!h.screen().contains("Edit user"));

    // A short real password is still rejected before any request
    h.press(KeyCode::Char('e'));
    h.press(KeyCode::Tab);
    h.press(KeyCode::Tab);
    h.type_str("abc");
    h.ctrl('s');
    h.settle().await;
    assert!(h.screen().contains("Password must be at least 6 characters"));
    assert_eq!(h.api.calls("update_user"), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_task_status_follows_backend_without_input() {
    let mut h = Harness::new(Route::Home);
    let owner = h
      .api
      .create_user(&UserCreate {
        username: "worker-owner".to_string(),
        email: "owner@example.com".to_string(),
        password: "secret1".to_string(),
      })
      .await
      .unwrap();

    h.type_str(":new-task");
    h.press(KeyCode::Enter);
    assert_eq!(h.route(), Some(Route::TaskCreate));
    h.settle().await;

    h.type_str("Write report");
    h.press(KeyCode::Tab);
    h.press(KeyCode::Tab);
    h.press(KeyCode::Enter); // open owner picker
    assert!(h.screen().contains("worker-owner <owner@example.com>"));
    h.press(KeyCode::Enter); // pick
    h.ctrl('s');
    h.settle().await;

    assert_eq!(h.route(), Some(Route::Tasks));
    let screen = h.screen();
    assert!(screen.contains("Write report"));
    assert!(screen.contains("Pending"));
    assert!(screen.contains(&format!("user #{}", owner.id)));

    h.api.set_task_status(1, TaskStatus::Done);
    tokio::time::sleep(h.config.poll_interval()).await;
    h.settle().await;

    let screen = h.screen();
    assert!(screen.contains("Done"));
    assert!(!screen.contains("Pending"));
  }

  #[tokio::test(start_paused = true)]
  async fn test_missing_record_and_failed_load_read_differently() {
    let mut h = Harness::new(Route::TaskDetail(99));
    h.settle().await;
    let screen = h.screen();
    assert!(screen.contains("Task not found."));
    assert!(!screen.contains("Failed to load"));

    h.api.set_unavailable(true);
    h.type_str(":/users/5");
    h.press(KeyCode::Enter);
    h.settle().await;
    let screen = h.screen();
    assert!(screen.contains("Failed to load user."));
    assert!(screen.contains("connection refused"));
    assert!(!screen.contains("User not found."));
  }

  #[tokio::test(start_paused = true)]
  async fn test_unknown_status_renders_as_pending() {
    let mut h = Harness::new(Route::Home);
    let owner = h
      .api
      .create_user(&UserCreate {
        username: "bob".to_string(),
        email: "bob@example.com".to_string(),
        password: "secret1".to_string(),
      })
      .await
      .unwrap();
    let task = h
      .api
      .create_task(&crate::api::types::TaskCreate {
        title: "Archive logs".to_string(),
        description: None,
        user_id: owner.id,
      })
      .await
      .unwrap();
    h.api
      .set_task_status(task.id, TaskStatus::Other("archived".to_string()));

    h.type_str(&format!(":/tasks/{}", task.id));
    h.press(KeyCode::Enter);
    h.settle().await;

    let screen = h.screen();
    assert!(screen.contains("Archive logs"));
    assert!(screen.contains("Pending"));
    assert!(!screen.contains("archived"));
  }
}
