use std::fmt;

/// Logical identity of a cacheable read.
///
/// Keys are flat: invalidating `Tasks` does not touch `Task(7)`. Callers that
/// change an entity invalidate every key that shows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
  /// All users
  Users,
  /// A single user
  User(i64),
  /// All tasks
  Tasks,
  /// A single task
  Task(i64),
  /// Tasks owned by a user
  UserTasks(i64),
}

impl fmt::Display for QueryKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Users => write!(f, "users"),
      Self::User(id) => write!(f, "user/{}", id),
      Self::Tasks => write!(f, "tasks"),
      Self::Task(id) => write!(f, "task/{}", id),
      Self::UserTasks(id) => write!(f, "user-tasks/{}", id),
    }
  }
}
