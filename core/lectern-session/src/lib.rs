//! Device-bound session handling for Lectern.
//!
//! Every authenticated request goes through [`SessionController::execute`],
//! which attaches the bearer token and device fingerprint and decides what a
//! failure means:
//!
//! - **Device invalidated**: the backend revoked this device's binding. The
//!   session ends immediately (checked before any 401 handling).
//! - **Unauthorized**: the access token expired. One refresh, one retry.
//! - **Refresh failed**: the session ends.
//!
//! Ending a session purges stored credentials and redirects to the login
//! entry point exactly once, no matter how many requests fail together.
//!
//! # Example
//!
//! ```
//! use lectern_session::{LogoutReason, SessionConfig};
//!
//! let config = SessionConfig::default();
//! assert_eq!(
//!     config.login_url(LogoutReason::DeviceInvalidated),
//!     "/login?reason=device_invalidated"
//! );
//! assert!(config.is_auth_endpoint("/auth/refresh"));
//! ```

mod config;
mod controller;
mod credentials;
mod error;
mod navigator;
mod violation;

pub use config::SessionConfig;
pub use controller::{ApiRequest, ApiResponse, Method, RequestState, SessionController};
pub use credentials::{CredentialStore, SessionCredentials};
pub use error::{SessionError, SessionResult};
pub use navigator::Navigator;
pub use violation::{ErrorBody, LogoutReason, ViolationCode, DEVICE_INVALIDATED_CODE};
