//! Session recovery controller.
//!
//! Owns the session credentials and drives every authenticated request
//! through the refresh-and-retry / terminal-logout state machine.

use crate::config::SessionConfig;
use crate::credentials::{CredentialStore, SessionCredentials};
use crate::error::{SessionError, SessionResult};
use crate::navigator::Navigator;
use crate::violation::{ErrorBody, LogoutReason, ViolationCode};
use lectern_device::{DeviceIdentityManager, DEVICE_ID_HEADER};
use lectern_storage::{keys, KeyValueStore};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

pub use reqwest::Method;

/// Where a request is in its retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    /// First attempt.
    Initial,
    /// Already retried after a token refresh; a further 401 is final.
    Retried,
}

/// A replayable API request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base URL.
    pub path: String,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            body: Some(body),
        }
    }
}

/// A successful, fully buffered response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> SessionResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.body
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Attaches credentials to outbound requests and recovers from (or ends
/// the session on) authorization failures.
pub struct SessionController {
    config: SessionConfig,
    client: Client,
    credentials: CredentialStore,
    durable: Arc<dyn KeyValueStore>,
    session: Arc<dyn KeyValueStore>,
    devices: Arc<DeviceIdentityManager>,
    navigator: Arc<dyn Navigator>,
    /// Held for the duration of a refresh exchange.
    refresh_lock: tokio::sync::Mutex<()>,
    /// Set once a logout starts; cleared by [`SessionController::establish`].
    logging_out: Mutex<Option<LogoutReason>>,
}

impl SessionController {
    /// Creates a controller.
    ///
    /// `durable` holds credentials and the device fingerprint; `session` is
    /// the per-process scope wiped on logout.
    pub fn new(
        config: SessionConfig,
        durable: Arc<dyn KeyValueStore>,
        session: Arc<dyn KeyValueStore>,
        devices: Arc<DeviceIdentityManager>,
        navigator: Arc<dyn Navigator>,
    ) -> SessionResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| SessionError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            config,
            client,
            credentials: CredentialStore::new(durable.clone()),
            durable,
            session,
            devices,
            navigator,
            refresh_lock: tokio::sync::Mutex::new(()),
            logging_out: Mutex::new(None),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Installs credentials obtained by an external login and re-arms the
    /// logout latch.
    pub fn establish(&self, credentials: &SessionCredentials) -> SessionResult<()> {
        self.credentials.save(credentials)?;
        *self.lock_logout() = None;
        info!("Session established");
        Ok(())
    }

    /// Currently stored credentials.
    pub fn credentials(&self) -> SessionResult<Option<SessionCredentials>> {
        Ok(self.credentials.load()?)
    }

    /// Returns true once a terminal logout has started.
    pub fn is_logging_out(&self) -> bool {
        self.lock_logout().is_some()
    }

    /// Sends `request`, refreshing and retrying once on 401 and ending the
    /// session on device invalidation or refresh failure.
    pub async fn execute(&self, request: &ApiRequest) -> SessionResult<ApiResponse> {
        let pending = *self.lock_logout();
        if let Some(reason) = pending {
            return Err(SessionError::Terminated(reason));
        }

        let auth_endpoint = self.config.is_auth_endpoint(&request.path);
        let mut state = RequestState::Initial;

        loop {
            let access_token = self.credentials.load()?.map(|c| c.access_token);
            let response = self.send(request, access_token.as_deref()).await?;
            let status = response.status();

            if status.is_success() {
                let body = response.bytes().await?.to_vec();
                return Ok(ApiResponse {
                    status: status.as_u16(),
                    body,
                });
            }

            let body = response.bytes().await?;

            // Device violations win over generic 401 handling, except on
            // auth endpoints where a logout would loop back to login.
            if !auth_endpoint {
                if let Some(reason) =
                    ViolationCode::from_body(&body).and_then(|c| c.logout_reason())
                {
                    warn!("{} {} rejected: device binding revoked", request.method, request.path);
                    return Err(self.terminate(reason));
                }
            }

            if status == StatusCode::UNAUTHORIZED && !auth_endpoint {
                match state {
                    RequestState::Initial => {
                        debug!("{} {} returned 401, recovering", request.method, request.path);
                        self.recover(access_token.as_deref()).await?;
                        state = RequestState::Retried;
                        continue;
                    }
                    RequestState::Retried => {
                        warn!("{} {} still unauthorized after refresh", request.method, request.path);
                    }
                }
            }

            return Err(SessionError::Status {
                status: status.as_u16(),
                message: ErrorBody::describe(&body),
            });
        }
    }

    /// Convenience wrapper: GET and decode JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> SessionResult<T> {
        self.execute(&ApiRequest::get(path)).await?.json()
    }

    async fn send(
        &self,
        request: &ApiRequest,
        access_token: Option<&str>,
    ) -> SessionResult<reqwest::Response> {
        let device_id = self.devices.get_or_create_device_id()?;
        let mut builder = self
            .client
            .request(request.method.clone(), self.config.url(&request.path))
            .header(DEVICE_ID_HEADER, device_id.as_str());
        if let Some(token) = access_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        Ok(builder.send().await?)
    }

    /// Makes sure the stored access token is newer than `failed_token`,
    /// refreshing if nobody else already did.
    async fn recover(&self, failed_token: Option<&str>) -> SessionResult<()> {
        let _guard = self.refresh_lock.lock().await;

        let pending = *self.lock_logout();
        if let Some(reason) = pending {
            return Err(SessionError::Terminated(reason));
        }

        let current = match self.credentials.load()? {
            Some(c) => c,
            None => {
                warn!("No refresh token available");
                return Err(self.terminate(LogoutReason::SessionExpired));
            }
        };

        if Some(current.access_token.as_str()) != failed_token {
            debug!("Access token already refreshed by a concurrent request");
            return Ok(());
        }

        match self.refresh(&current.refresh_token).await {
            Ok(renewed) => {
                self.credentials.save(&renewed)?;
                debug!("Access token refreshed");
                Ok(())
            }
            Err(e) => {
                warn!("Token refresh failed: {e}");
                Err(self.terminate(LogoutReason::SessionExpired))
            }
        }
    }

    async fn refresh(&self, refresh_token: &str) -> SessionResult<SessionCredentials> {
        let device_id = self.devices.get_or_create_device_id()?;
        let response = self
            .client
            .post(self.config.url(&self.config.refresh_path))
            .header(DEVICE_ID_HEADER, device_id.as_str())
            .json(&RefreshRequest { refresh_token })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await?;
            return Err(SessionError::Status {
                status: status.as_u16(),
                message: ErrorBody::describe(&body),
            });
        }

        let body: RefreshResponse = serde_json::from_slice(&response.bytes().await?)?;
        Ok(SessionCredentials {
            access_token: body.access_token,
            refresh_token: body
                .refresh_token
                .unwrap_or_else(|| refresh_token.to_string()),
        })
    }

    /// Ends the session. Only the first caller purges storage and redirects.
    fn terminate(&self, reason: LogoutReason) -> SessionError {
        {
            let mut logging_out = self.lock_logout();
            if let Some(existing) = *logging_out {
                debug!("Logout already in progress ({existing})");
                return SessionError::Terminated(existing);
            }
            *logging_out = Some(reason);
        }

        info!("Terminating session: {reason}");
        if let Err(e) = self.session.clear() {
            warn!("Failed to clear session storage: {e}");
        }
        // The fingerprint belongs to the device manager and survives logout.
        if let Err(e) = self.durable.retain(&[keys::DEVICE_ID]) {
            warn!("Failed to clear durable storage: {e}");
        }
        self.navigator.redirect(&self.config.login_url(reason));

        SessionError::Terminated(reason)
    }

    fn lock_logout(&self) -> std::sync::MutexGuard<'_, Option<LogoutReason>> {
        self.logging_out.lock().unwrap_or_else(|p| p.into_inner())
    }
}
