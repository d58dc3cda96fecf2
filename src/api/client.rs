use crate::api::error::{error_detail, ApiError, ApiResult};
use crate::api::types::{Task, TaskCreate, TaskUpdate, User, UserCreate, UserUpdate};
use crate::api::TaskApi;
use crate::config::ApiConfig;
use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// REST client for the task service
#[derive(Clone)]
pub struct HttpClient {
  http: reqwest::Client,
  base: Url,
}

impl HttpClient {
  pub fn new(config: &ApiConfig) -> Result<Self> {
    let base = Url::parse(&config.url)
      .map_err(|e| eyre!("Invalid API url '{}': {}", config.url, e))?;

    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { http, base })
  }

  /// Base url the client talks to
  pub fn base_url(&self) -> &str {
    self.base.as_str()
  }

  fn endpoint(&self, path: &str) -> ApiResult<Url> {
    let url = format!("{}/api{}", self.base.as_str().trim_end_matches('/'), path);
    Url::parse(&url).map_err(|e| ApiError::Network(format!("invalid url {}: {}", url, e)))
  }

  fn request(&self, method: Method, path: &str) -> ApiResult<RequestBuilder> {
    let url = self.endpoint(path)?;
    debug!(%method, %url, "request");
    Ok(self.http.request(method, url))
  }

  async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
    let response = self.request(Method::GET, path)?.send().await?;
    decode(response).await
  }

  async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> ApiResult<T>
  where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
  {
    let response = self.request(method, path)?.json(body).send().await?;
    decode(response).await
  }

  async fn delete(&self, path: &str) -> ApiResult<()> {
    let response = self.request(Method::DELETE, path)?.send().await?;
    check_status(response).await.map(|_| ())
  }
}

/// Turn non-success statuses into `ApiError::Status`, returning the body otherwise.
async fn check_status(response: Response) -> ApiResult<String> {
  let status = response.status();
  let body = response.text().await?;

  if status.is_success() {
    return Ok(body);
  }

  let message = error_detail(&body).unwrap_or_else(|| {
    status
      .canonical_reason()
      .unwrap_or("Request failed")
      .to_string()
  });
  warn!(status = status.as_u16(), %message, "request failed");
  Err(ApiError::Status {
    status: status.as_u16(),
    message,
  })
}

/// Validate the body against the expected shape.
async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
  let body = check_status(response).await?;
  serde_json::from_str(&body).map_err(|e| {
    warn!(error = %e, "response did not match expected shape");
    ApiError::Validation(e.to_string())
  })
}

#[async_trait]
impl TaskApi for HttpClient {
  async fn list_users(&self) -> ApiResult<Vec<User>> {
    self.get("/users").await
  }

  async fn get_user(&self, id: i64) -> ApiResult<User> {
    self.get(&format!("/users/{}", id)).await
  }

  async fn create_user(&self, input: &UserCreate) -> ApiResult<User> {
    self.send_json(Method::POST, "/users", input).await
  }

  async fn update_user(&self, id: i64, input: &UserUpdate) -> ApiResult<User> {
    self
      .send_json(Method::PUT, &format!("/users/{}", id), input)
      .await
  }

  async fn delete_user(&self, id: i64) -> ApiResult<()> {
    self.delete(&format!("/users/{}", id)).await
  }

  async fn list_tasks(&self) -> ApiResult<Vec<Task>> {
    self.get("/tasks").await
  }

  async fn get_task(&self, id: i64) -> ApiResult<Task> {
    self.get(&format!("/tasks/{}", id)).await
  }

  async fn list_user_tasks(&self, user_id: i64) -> ApiResult<Vec<Task>> {
    self.get(&format!("/tasks/user/{}", user_id)).await
  }

  async fn create_task(&self, input: &TaskCreate) -> ApiResult<Task> {
    self.send_json(Method::POST, "/tasks", input).await
  }

  async fn update_task(&self, id: i64, input: &TaskUpdate) -> ApiResult<Task> {
    self
      .send_json(Method::PUT, &format!("/tasks/{}", id), input)
      .await
  }

  async fn delete_task(&self, id: i64) -> ApiResult<()> {
    self.delete(&format!("/tasks/{}", id)).await
  }
}
