use crate::router::Route;
use crossterm::event::KeyEvent;
use ratatui::prelude::*;

/// A keyboard shortcut hint for display in the header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutInfo {
  pub key: &'static str,
  pub label: &'static str,
  pub priority: u8, // Lower = shown first
}

impl ShortcutInfo {
  pub const fn new(key: &'static str, label: &'static str) -> Self {
    Self {
      key,
      label,
      priority: 100,
    }
  }

  pub const fn with_priority(mut self, priority: u8) -> Self {
    self.priority = priority;
    self
  }
}

// Shorter name for view code
pub type Shortcut = ShortcutInfo;

/// Actions that a view can request in response to user input or a settled mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewAction {
  /// No action needed
  None,
  /// Open a route on top of the current view
  Push(Route),
  /// Leave the current view for a route (back to it if it is underneath)
  Navigate(Route),
  /// Pop current view from stack (go back)
  Pop,
}

/// Trait for view behavior
///
/// Views handle their own input modes (search, edit, etc.) and return
/// actions for the App to execute. This creates a clean delegation chain:
/// App → View → Components
///
/// Views hold query subscriptions for the data they show; the App pumps the
/// shared cache on every tick, and `tick()` lets views react to settled
/// mutations.
pub trait View {
  /// Handle a key event, returning an action for App to execute
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction;

  /// Render the view to the frame
  fn render(&mut self, frame: &mut Frame, area: Rect);

  /// The route this view was opened for
  fn route(&self) -> Route;

  /// Get the breadcrumb label for this view
  fn breadcrumb_label(&self) -> String;

  /// Called on each tick, after the cache has been pumped
  fn tick(&mut self) -> ViewAction {
    ViewAction::None
  }

  /// Whether the view is taking text input, so global keys like `:` must not be intercepted
  fn captures_input(&self) -> bool {
    false
  }

  /// Get keyboard shortcuts to display in the header
  /// Override this to provide view-specific shortcuts
  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}
