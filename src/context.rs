//! Shared handles passed to every view, and the query definitions built on them.

use crate::api::error::ApiResult;
use crate::api::types::{Task, User};
use crate::api::TaskApi;
use crate::config::Config;
use crate::query::{QueryClient, QueryKey, QueryOptions, Subscription};
use std::sync::Arc;
use std::time::Duration;

/// A 404 is an answer ("no such record"), not a failed load.
fn found<T>(result: ApiResult<T>) -> Result<Option<T>, String> {
  match result {
    Ok(value) => Ok(Some(value)),
    Err(e) if e.status() == Some(404) => Ok(None),
    Err(e) => Err(e.to_string()),
  }
}

/// Everything a view needs to read and write data.
#[derive(Clone)]
pub struct Context {
  pub api: Arc<dyn TaskApi>,
  pub queries: QueryClient,
  pub poll_interval: Duration,
  pub stale_time: Duration,
}

impl Context {
  pub fn new(api: Arc<dyn TaskApi>, config: &Config) -> Self {
    Self {
      api,
      queries: QueryClient::new(config.gc_time()),
      poll_interval: config.poll_interval(),
      stale_time: config.stale_time(),
    }
  }

  fn options(&self, polling: bool) -> QueryOptions {
    let options = if polling {
      QueryOptions::polling(self.poll_interval)
    } else {
      QueryOptions::default()
    };
    options.with_stale_time(self.stale_time)
  }

  pub fn users(&self, polling: bool) -> Subscription<Vec<User>> {
    let api = self.api.clone();
    self.queries.subscribe(
      QueryKey::Users,
      move || {
        let api = api.clone();
        async move { api.list_users().await.map_err(|e| e.to_string()) }
      },
      self.options(polling),
    )
  }

  pub fn user(&self, id: i64) -> Subscription<Option<User>> {
    let api = self.api.clone();
    self.queries.subscribe(
      QueryKey::User(id),
      move || {
        let api = api.clone();
        async move { found(api.get_user(id).await) }
      },
      self.options(true),
    )
  }

  pub fn tasks(&self) -> Subscription<Vec<Task>> {
    let api = self.api.clone();
    self.queries.subscribe(
      QueryKey::Tasks,
      move || {
        let api = api.clone();
        async move { api.list_tasks().await.map_err(|e| e.to_string()) }
      },
      self.options(true),
    )
  }

  pub fn task(&self, id: i64) -> Subscription<Option<Task>> {
    let api = self.api.clone();
    self.queries.subscribe(
      QueryKey::Task(id),
      move || {
        let api = api.clone();
        async move { found(api.get_task(id).await) }
      },
      self.options(true),
    )
  }

  pub fn user_tasks(&self, user_id: i64) -> Subscription<Vec<Task>> {
    let api = self.api.clone();
    self.queries.subscribe(
      QueryKey::UserTasks(user_id),
      move || {
        let api = api.clone();
        async move { api.list_user_tasks(user_id).await.map_err(|e| e.to_string()) }
      },
      self.options(true),
    )
  }
}
