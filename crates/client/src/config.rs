use std::path::PathBuf;
use std::time::Duration;

use bugboard_core::error::CoreError;

/// Default backend URL, matching the development server.
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Client configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Backend base URL without a trailing slash.
    pub api_url: String,
    /// Per-request timeout in seconds (default: `30`).
    pub timeout_secs: u64,
    /// Where the session token and user are persisted between runs.
    pub session_file: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: 30,
            session_file: PathBuf::from(".bugboard-session.json"),
        }
    }
}

impl ClientConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                 | Default                  |
    /// |-------------------------|--------------------------|
    /// | `BUGBOARD_API_URL`      | `http://localhost:8080`  |
    /// | `BUGBOARD_TIMEOUT_SECS` | `30`                     |
    /// | `BUGBOARD_SESSION_FILE` | `.bugboard-session.json` |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let defaults = Self::default();

        let api_url = lookup("BUGBOARD_API_URL")
            .map(|v| normalize_url(&v))
            .transpose()?
            .unwrap_or(defaults.api_url);

        let timeout_secs = match lookup("BUGBOARD_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                CoreError::Validation(format!(
                    "BUGBOARD_TIMEOUT_SECS must be a whole number of seconds, got '{raw}'"
                ))
            })?,
            None => defaults.timeout_secs,
        };

        let session_file = lookup("BUGBOARD_SESSION_FILE")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.session_file);

        Ok(Self {
            api_url,
            timeout_secs,
            session_file,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Validate a base URL and strip any trailing slash.
pub fn normalize_url(raw: &str) -> Result<String, CoreError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = reqwest::Url::parse(trimmed)
        .map_err(|e| CoreError::Validation(format!("Invalid API URL '{raw}': {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(CoreError::Validation(format!(
            "API URL must use http or https, got '{raw}'"
        )));
    }
    Ok(trimmed.to_string())
}
