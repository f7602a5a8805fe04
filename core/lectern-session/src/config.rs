//! Session configuration.

use crate::error::{SessionError, SessionResult};
use crate::violation::LogoutReason;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Endpoints and timeouts used by the session controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Base URL of the backend API (e.g. `https://api.example.com/api`).
    pub api_base_url: String,
    /// Path of the token refresh endpoint.
    pub refresh_path: String,
    /// Authentication endpoints. A device-violation code returned by any of
    /// these never triggers a logout.
    pub auth_paths: Vec<String>,
    /// Login entry point the user is redirected to on terminal failure.
    pub login_path: String,
    /// Per-request timeout (seconds).
    pub request_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000/api".to_string(),
            refresh_path: "/auth/refresh".to_string(),
            auth_paths: vec![
                "/auth/login".to_string(),
                "/auth/register".to_string(),
                "/auth/refresh".to_string(),
            ],
            login_path: "/login".to_string(),
            request_timeout_secs: 60,
        }
    }
}

impl SessionConfig {
    /// Loads a config from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> SessionResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| SessionError::Config(format!("{}: {e}", path.display())))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Absolute URL for an API path.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Returns true if `path` (query string ignored) is an authentication
    /// endpoint. The refresh path always counts.
    pub fn is_auth_endpoint(&self, path: &str) -> bool {
        let path = normalize(path);
        normalize(&self.refresh_path) == path
            || self.auth_paths.iter().any(|p| normalize(p) == path)
    }

    /// Login redirect target carrying the reason code.
    pub fn login_url(&self, reason: LogoutReason) -> String {
        format!(
            "{}?reason={}",
            self.login_path,
            urlencoding::encode(reason.code())
        )
    }
}

fn normalize(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    let path = path.trim_end_matches('/');
    if path.is_empty() { "/" } else { path }
}
