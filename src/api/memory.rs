//! In-memory backend used by view and end-to-end tests.

use super::error::{ApiError, ApiResult};
use super::types::{Task, TaskCreate, TaskStatus, TaskUpdate, User, UserCreate, UserUpdate};
use super::TaskApi;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Default)]
struct State {
  users: BTreeMap<i64, User>,
  tasks: BTreeMap<i64, Task>,
  passwords: BTreeMap<i64, String>,
  next_user_id: i64,
  next_task_id: i64,
  calls: Vec<String>,
  unavailable: bool,
}

/// Behaves like the task service for the endpoints the client uses.
#[derive(Default)]
pub struct MemoryApi {
  state: Mutex<State>,
}

fn not_found(what: &str) -> ApiError {
  ApiError::Status {
    status: 404,
    message: format!("{} not found", what),
  }
}

impl MemoryApi {
  pub fn new() -> Self {
    Self::default()
  }

  fn with_state<R>(&self, call: String, f: impl FnOnce(&mut State) -> ApiResult<R>) -> ApiResult<R> {
    let mut state = self.state.lock().unwrap();
    state.calls.push(call);
    if state.unavailable {
      return Err(ApiError::Network("connection refused".to_string()));
    }
    f(&mut state)
  }

  /// Fail every request as if the server were down.
  pub fn set_unavailable(&self, unavailable: bool) {
    self.state.lock().unwrap().unavailable = unavailable;
  }

  /// Stand-in for the worker moving a task along.
  pub fn set_task_status(&self, id: i64, status: TaskStatus) {
    let mut state = self.state.lock().unwrap();
    if let Some(task) = state.tasks.get_mut(&id) {
      task.status = status;
      task.updated_at = Utc::now();
    }
  }

  /// Password currently stored for a user.
  pub fn password(&self, id: i64) -> Option<String> {
    let state = self.state.lock().unwrap();
    state.passwords.get(&id).cloned()
  }

  /// Number of calls made to an operation, e.g. `"list_tasks"`.
  pub fn calls(&self, operation: &str) -> usize {
    let state = self.state.lock().unwrap();
    state.calls.iter().filter(|c| c.as_str() == operation).count()
  }
}

#[async_trait]
impl TaskApi for MemoryApi {
  async fn list_users(&self) -> ApiResult<Vec<User>> {
    self.with_state("list_users".into(), |s| Ok(s.users.values().cloned().collect()))
  }

  async fn get_user(&self, id: i64) -> ApiResult<User> {
    self.with_state("get_user".into(), |s| {
      s.users.get(&id).cloned().ok_or_else(|| not_found("User"))
    })
  }

  async fn create_user(&self, input: &UserCreate) -> ApiResult<User> {
    self.with_state("create_user".into(), |s| {
      if s.users.values().any(|u| u.email == input.email) {
        return Err(ApiError::Status {
          status: 400,
          message: "Email already registered".to_string(),
        });
      }
      s.next_user_id += 1;
      let now = Utc::now();
      let user = User {
        id: s.next_user_id,
        username: input.username.clone(),
        email: input.email.clone(),
        is_active: true,
        created_at: now,
        updated_at: now,
      };
      s.users.insert(user.id, user.clone());
      s.passwords.insert(user.id, input.password.clone());
      Ok(user)
    })
  }

  async fn update_user(&self, id: i64, input: &UserUpdate) -> ApiResult<User> {
    self.with_state("update_user".into(), |s| {
      let user = s.users.get_mut(&id).ok_or_else(|| not_found("User"))?;
      if let Some(username) = &input.username {
        user.username = username.clone();
      }
      if let Some(email) = &input.email {
        user.email = email.clone();
      }
      if let Some(is_active) = input.is_active {
        user.is_active = is_active;
      }
      user.updated_at = Utc::now();
      let user = user.clone();
      if let Some(password) = &input.password {
        s.passwords.insert(id, password.clone());
      }
      Ok(user)
    })
  }

  async fn delete_user(&self, id: i64) -> ApiResult<()> {
    self.with_state("delete_user".into(), |s| {
      s.users.remove(&id).map(|_| ()).ok_or_else(|| not_found("User"))
    })
  }

  async fn list_tasks(&self) -> ApiResult<Vec<Task>> {
    self.with_state("list_tasks".into(), |s| Ok(s.tasks.values().cloned().collect()))
  }

  async fn get_task(&self, id: i64) -> ApiResult<Task> {
    self.with_state("get_task".into(), |s| {
      s.tasks.get(&id).cloned().ok_or_else(|| not_found("Task"))
    })
  }

  async fn list_user_tasks(&self, user_id: i64) -> ApiResult<Vec<Task>> {
    self.with_state("list_user_tasks".into(), |s| {
      Ok(
        s.tasks
          .values()
          .filter(|t| t.user_id == user_id)
          .cloned()
          .collect(),
      )
    })
  }

  async fn create_task(&self, input: &TaskCreate) -> ApiResult<Task> {
    self.with_state("create_task".into(), |s| {
      if !s.users.contains_key(&input.user_id) {
        return Err(ApiError::Status {
          status: 404,
          message: format!("User with id {} not found", input.user_id),
        });
      }
      s.next_task_id += 1;
      let now = Utc::now();
      let task = Task {
        id: s.next_task_id,
        title: input.title.clone(),
        description: input.description.clone(),
        status: TaskStatus::Pending,
        user_id: input.user_id,
        worker_id: None,
        started_at: None,
        completed_at: None,
        error_message: None,
        created_at: now,
        updated_at: now,
      };
      s.tasks.insert(task.id, task.clone());
      Ok(task)
    })
  }

  async fn update_task(&self, id: i64, input: &TaskUpdate) -> ApiResult<Task> {
    self.with_state("update_task".into(), |s| {
      let task = s.tasks.get_mut(&id).ok_or_else(|| not_found("Task"))?;
      if let Some(title) = &input.title {
        task.title = title.clone();
      }
      if let Some(description) = &input.description {
        task.description = Some(description.clone());
      }
      if let Some(status) = &input.status {
        task.status = status.clone();
      }
      if let Some(worker_id) = &input.worker_id {
        task.worker_id = Some(worker_id.clone());
      }
      if let Some(error_message) = &input.error_message {
        task.error_message = Some(error_message.clone());
      }
      task.updated_at = Utc::now();
      Ok(task.clone())
    })
  }

  async fn delete_task(&self, id: i64) -> ApiResult<()> {
    self.with_state("delete_task".into(), |s| {
      s.tasks.remove(&id).map(|_| ()).ok_or_else(|| not_found("Task"))
    })
  }
}
