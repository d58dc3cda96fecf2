use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Worker status of a task.
///
/// The backend drives every transition. Values this client does not know
/// are kept verbatim in `Other` and displayed like `Pending`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
  Pending,
  InProgress,
  Done,
  Failed,
  Other(String),
}

impl TaskStatus {
  pub fn as_str(&self) -> &str {
    match self {
      Self::Pending => "pending",
      Self::InProgress => "wip",
      Self::Done => "done",
      Self::Failed => "failed",
      Self::Other(raw) => raw,
    }
  }
}

impl From<String> for TaskStatus {
  fn from(raw: String) -> Self {
    match raw.as_str() {
      "pending" => Self::Pending,
      "wip" | "in_progress" => Self::InProgress,
      "done" => Self::Done,
      "failed" => Self::Failed,
      _ => Self::Other(raw),
    }
  }
}

impl From<TaskStatus> for String {
  fn from(status: TaskStatus) -> Self {
    status.as_str().to_string()
  }
}

/// A user account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
  pub id: i64,
  pub username: String,
  pub email: String,
  pub is_active: bool,
  #[serde(deserialize_with = "deserialize_timestamp")]
  pub created_at: DateTime<Utc>,
  #[serde(deserialize_with = "deserialize_timestamp")]
  pub updated_at: DateTime<Utc>,
}

/// A task and its worker bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
  pub id: i64,
  pub title: String,
  #[serde(default)]
  pub description: Option<String>,
  pub status: TaskStatus,
  pub user_id: i64,
  #[serde(default)]
  pub worker_id: Option<String>,
  #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
  pub started_at: Option<DateTime<Utc>>,
  #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
  pub completed_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub error_message: Option<String>,
  #[serde(deserialize_with = "deserialize_timestamp")]
  pub created_at: DateTime<Utc>,
  #[serde(deserialize_with = "deserialize_timestamp")]
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserCreate {
  pub username: String,
  pub email: String,
  pub password: String,
}

/// Partial user update; `None` fields are left out of the request body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserUpdate {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub username: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub email: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub password: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskCreate {
  pub title: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub user_id: i64,
}

/// Partial task update; `None` fields are left out of the request body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskUpdate {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub title: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status: Option<TaskStatus>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub worker_id: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error_message: Option<String>,
}

/// Parse RFC 3339, or a naive ISO-8601 timestamp taken as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Utc));
  }
  NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
    .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
    .ok()
    .map(|dt| dt.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
  D: Deserializer<'de>,
{
  let s = String::deserialize(deserializer)?;
  parse_timestamp(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", s)))
}

fn deserialize_optional_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
  D: Deserializer<'de>,
{
  match Option::<String>::deserialize(deserializer)? {
    Some(s) => parse_timestamp(&s)
      .map(Some)
      .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", s))),
    None => Ok(None),
  }
}
