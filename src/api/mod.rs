//! Access to the task service REST API.

pub mod client;
pub mod error;
#[cfg(test)]
pub mod memory;
pub mod types;

use async_trait::async_trait;
use error::ApiResult;
use types::{Task, TaskCreate, TaskUpdate, User, UserCreate, UserUpdate};

pub use client::HttpClient;

/// Operations the views need from the backend.
///
/// `HttpClient` is the real implementation; tests use an in-memory one.
#[async_trait]
pub trait TaskApi: Send + Sync {
  async fn list_users(&self) -> ApiResult<Vec<User>>;
  async fn get_user(&self, id: i64) -> ApiResult<User>;
  async fn create_user(&self, input: &UserCreate) -> ApiResult<User>;
  async fn update_user(&self, id: i64, input: &UserUpdate) -> ApiResult<User>;
  async fn delete_user(&self, id: i64) -> ApiResult<()>;

  async fn list_tasks(&self) -> ApiResult<Vec<Task>>;
  async fn get_task(&self, id: i64) -> ApiResult<Task>;
  async fn list_user_tasks(&self, user_id: i64) -> ApiResult<Vec<Task>>;
  async fn create_task(&self, input: &TaskCreate) -> ApiResult<Task>;
  async fn update_task(&self, id: i64, input: &TaskUpdate) -> ApiResult<Task>;
  async fn delete_task(&self, id: i64) -> ApiResult<()>;
}
