use crate::api::types::TaskStatus;
use chrono::{DateTime, Utc};
use ratatui::prelude::Color;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Display label for a task status. Unknown values read as pending.
pub fn status_label(status: &TaskStatus) -> &'static str {
  match status {
    TaskStatus::InProgress => "In Progress",
    TaskStatus::Done => "Done",
    TaskStatus::Failed => "Failed",
    TaskStatus::Pending | TaskStatus::Other(_) => "Pending",
  }
}

pub fn status_color(status: &TaskStatus) -> Color {
  match status {
    TaskStatus::InProgress => Color::Blue,
    TaskStatus::Done => Color::Green,
    TaskStatus::Failed => Color::Red,
    TaskStatus::Pending | TaskStatus::Other(_) => Color::Yellow,
  }
}

pub fn status_icon(status: &TaskStatus) -> &'static str {
  match status {
    TaskStatus::InProgress => "◐",
    TaskStatus::Done => "●",
    TaskStatus::Failed => "✗",
    TaskStatus::Pending | TaskStatus::Other(_) => "○",
  }
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
  ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Optional timestamps render as "-"
pub fn format_optional_timestamp(ts: Option<&DateTime<Utc>>) -> String {
  ts.map(format_timestamp).unwrap_or_else(|| "-".to_string())
}
