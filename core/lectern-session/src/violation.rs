//! Device-policy violation signal and logout reasons.

use serde::Deserialize;
use std::fmt;

/// Error code the backend returns when this device's binding was revoked.
pub const DEVICE_INVALIDATED_CODE: &str = "DEVICE_INVALIDATED";

/// Error body shape shared by backend failures.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    /// Parses an error body, returning `None` if it isn't JSON.
    pub fn parse(body: &[u8]) -> Option<Self> {
        serde_json::from_slice(body).ok()
    }

    /// Human-readable message, falling back to the raw body.
    pub fn describe(body: &[u8]) -> String {
        Self::parse(body)
            .and_then(|b| b.message.or(b.error).or(b.code))
            .unwrap_or_else(|| {
                let text = String::from_utf8_lossy(body);
                text.chars().take(200).collect()
            })
    }
}

/// A policy code carried by an error response.
///
/// Only [`ViolationCode::DeviceInvalidated`] ends the session; other codes
/// are kept so new policies can be recognized without reparsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationCode {
    DeviceInvalidated,
    Other(String),
}

impl ViolationCode {
    /// Extracts the code from a response body, if any.
    pub fn from_body(body: &[u8]) -> Option<Self> {
        let code = ErrorBody::parse(body)?.code?;
        Some(Self::from_code(&code))
    }

    /// Maps a raw code string.
    pub fn from_code(code: &str) -> Self {
        if code == DEVICE_INVALIDATED_CODE {
            ViolationCode::DeviceInvalidated
        } else {
            ViolationCode::Other(code.to_string())
        }
    }

    /// The logout this code forces, if any.
    pub fn logout_reason(&self) -> Option<LogoutReason> {
        match self {
            ViolationCode::DeviceInvalidated => Some(LogoutReason::DeviceInvalidated),
            ViolationCode::Other(_) => None,
        }
    }
}

/// Why a session was terminated. Sent to the login screen as `?reason=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogoutReason {
    /// The backend revoked this device's binding.
    DeviceInvalidated,
    /// The refresh token could not be exchanged.
    SessionExpired,
}

impl LogoutReason {
    /// Query-string code.
    pub fn code(&self) -> &'static str {
        match self {
            LogoutReason::DeviceInvalidated => "device_invalidated",
            LogoutReason::SessionExpired => "session_expired",
        }
    }

    /// Parses a query-string code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "device_invalidated" => Some(LogoutReason::DeviceInvalidated),
            "session_expired" => Some(LogoutReason::SessionExpired),
            _ => None,
        }
    }

    /// Explanation shown on the login screen.
    pub fn message(&self) -> &'static str {
        match self {
            LogoutReason::DeviceInvalidated => {
                "You were signed out because this account is now active on another device. \
                 Sign in again to continue on this device."
            }
            LogoutReason::SessionExpired => "Your session has expired. Please sign in again.",
        }
    }
}

impl fmt::Display for LogoutReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
