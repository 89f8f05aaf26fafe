use bugboard_core::error::CoreError;

use crate::session::SessionError;

/// Errors from the BugBoard REST client and its views.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("API error ({status}): {}", .message.as_deref().unwrap_or("no details"))]
    Api {
        status: u16,
        /// The server's structured `message`/`error` text, when it sent one.
        message: Option<String>,
    },

    /// A client-side rule refused the action before any request was made.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The same control already has a request in flight.
    #[error("Already in progress: {0}")]
    Busy(&'static str),

    #[error("Session storage failed: {0}")]
    Session(#[from] SessionError),
}

/// Convenience alias for client results.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            ApiError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404) || matches!(self, ApiError::Core(CoreError::NotFound { .. }))
    }

    /// Authentication or authorization failure, from the server or from a
    /// client-side policy denial.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
            || matches!(
                self,
                ApiError::Core(CoreError::Unauthorized(_) | CoreError::Forbidden(_))
            )
    }

    pub fn is_validation(&self) -> bool {
        matches!(self.status(), Some(400) | Some(422))
            || matches!(self, ApiError::Core(CoreError::Validation(_)))
    }

    /// Text to show the user: the server's message when available, the
    /// client-side reason for local refusals, otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Api {
                message: Some(msg), ..
            } => msg.clone(),
            ApiError::Core(CoreError::Validation(msg))
            | ApiError::Core(CoreError::Forbidden(msg))
            | ApiError::Core(CoreError::Unauthorized(msg))
            | ApiError::Core(CoreError::Conflict(msg)) => msg.clone(),
            ApiError::Busy(_) => "Please wait for the previous request to finish".to_string(),
            _ => fallback.to_string(),
        }
    }
}

/// Pull a human-readable message out of an error response body.
///
/// Prefers a JSON `message` field, then `error`; falls back to a short
/// plain-text body. Returns `None` for empty or HTML/oversized bodies.
pub fn extract_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(trimmed) {
        return ["message", "error"]
            .iter()
            .find_map(|key| json.get(key).and_then(|v| v.as_str()))
            .map(str::to_string)
            .or_else(|| json.as_str().map(str::to_string));
    }
    if trimmed.starts_with('<') || trimmed.len() > 300 {
        return None;
    }
    Some(trimmed.to_string())
}
