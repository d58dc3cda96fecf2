//! Maps url-like paths to screens.

use std::fmt;

/// A screen address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
  Home,
  Users,
  UserCreate,
  UserDetail(i64),
  Tasks,
  TaskCreate,
  TaskDetail(i64),
  NotFound,
}

impl Route {
  /// Parse a path such as `/users/7`, `tasks/new` or `/`.
  ///
  /// Anything unrecognised routes to `NotFound`.
  pub fn parse(path: &str) -> Self {
    let segments: Vec<&str> = path
      .trim()
      .split('/')
      .filter(|s| !s.is_empty())
      .collect();

    match segments.as_slice() {
      [] => Self::Home,
      ["users"] => Self::Users,
      ["users", "new"] => Self::UserCreate,
      ["users", id] => id.parse().map(Self::UserDetail).unwrap_or(Self::NotFound),
      ["tasks"] => Self::Tasks,
      ["tasks", "new"] => Self::TaskCreate,
      ["tasks", id] => id.parse().map(Self::TaskDetail).unwrap_or(Self::NotFound),
      _ => Self::NotFound,
    }
  }
}

impl fmt::Display for Route {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Home => write!(f, "/"),
      Self::Users => write!(f, "/users"),
      Self::UserCreate => write!(f, "/users/new"),
      Self::UserDetail(id) => write!(f, "/users/{}", id),
      Self::Tasks => write!(f, "/tasks"),
      Self::TaskCreate => write!(f, "/tasks/new"),
      Self::TaskDetail(id) => write!(f, "/tasks/{}", id),
      Self::NotFound => write!(f, "/404"),
    }
  }
}
