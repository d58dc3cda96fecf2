use serde::Deserialize;
use thiserror::Error;

/// Failure at the HTTP boundary.
///
/// Upstream layers only see the message (`to_string()`); the variants exist
/// so the client can log and test them.
#[derive(Debug, Error)]
pub enum ApiError {
  /// No usable response arrived
  #[error("network error: {0}")]
  Network(String),

  /// The response body does not have the expected shape
  #[error("unexpected response: {0}")]
  Validation(String),

  /// The backend answered with a non-success status
  #[error("{message}")]
  Status { status: u16, message: String },
}

impl ApiError {
  pub fn status(&self) -> Option<u16> {
    match self {
      Self::Status { status, .. } => Some(*status),
      _ => None,
    }
  }
}

impl From<reqwest::Error> for ApiError {
  fn from(e: reqwest::Error) -> Self {
    Self::Network(e.to_string())
  }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Deserialize)]
struct ErrorBody {
  detail: Detail,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Detail {
  Message(String),
  Items(Vec<DetailItem>),
}

#[derive(Deserialize)]
struct DetailItem {
  msg: String,
}

/// Extract the human-readable `detail` from an error body.
pub(crate) fn error_detail(body: &str) -> Option<String> {
  let body: ErrorBody = serde_json::from_str(body).ok()?;
  match body.detail {
    Detail::Message(message) => Some(message),
    Detail::Items(items) if !items.is_empty() => Some(
      items
        .into_iter()
        .map(|item| item.msg)
        .collect::<Vec<_>>()
        .join("; "),
    ),
    Detail::Items(_) => None,
  }
}
