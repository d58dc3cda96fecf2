use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
  pub api: ApiConfig,
  /// How often visible lists and details refetch, in milliseconds
  pub poll_interval_ms: u64,
  /// Cached data younger than this is not refetched when a view opens
  pub stale_time_ms: u64,
  /// Unobserved cache entries are dropped after this many seconds
  pub gc_time_secs: u64,
  /// Custom title for header (defaults to the API host)
  pub title: Option<String>,
  /// Log file (defaults to $XDG_DATA_HOME/taskdeck/taskdeck.log)
  pub log_file: Option<PathBuf>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      api: ApiConfig::default(),
      poll_interval_ms: 1000,
      stale_time_ms: 0,
      gc_time_secs: 300,
      title: None,
      log_file: None,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  /// Base url of the backend; `/api/...` is appended
  pub url: String,
  pub timeout_secs: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      url: "http://localhost:8000".to_string(),
      timeout_secs: 10,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./taskdeck.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/taskdeck/config.yaml
  ///
  /// Without any file the defaults are used. `TASKDECK_API_URL` overrides the url.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Self::default(),
    };

    if let Some(url) = Self::url_from_env() {
      config.api.url = url;
    }

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("taskdeck.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("taskdeck").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> std::result::Result<Self, serde_yaml::Error> {
    // An empty file is a valid, all-defaults config
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(contents)
  }

  fn url_from_env() -> Option<String> {
    std::env::var("TASKDECK_API_URL")
      .ok()
      .filter(|url| !url.trim().is_empty())
  }

  pub fn poll_interval(&self) -> Duration {
    Duration::from_millis(self.poll_interval_ms)
  }

  pub fn stale_time(&self) -> Duration {
    Duration::from_millis(self.stale_time_ms)
  }

  pub fn gc_time(&self) -> Duration {
    Duration::from_secs(self.gc_time_secs)
  }

  /// Header title: configured title or the API host.
  pub fn display_title(&self) -> &str {
    if let Some(title) = &self.title {
      return title;
    }
    let url = self.api.url.as_str();
    url
      .strip_prefix("https://")
      .or_else(|| url.strip_prefix("http://"))
      .unwrap_or(url)
      .split('/')
      .next()
      .unwrap_or(url)
  }

  /// Where logs go when `log_file` is not set.
  pub fn default_log_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("taskdeck").join("taskdeck.log"))
  }
}
