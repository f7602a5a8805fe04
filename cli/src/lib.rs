//! Wiring behind the `lectern` command-line client.
//!
//! Builds the storage, device, session and content layers from command-line
//! settings, and turns their results into printable summaries.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use lectern_content::{BlobRegistry, ContentError, ContentGateway, ContentRef, ContentSource};
use lectern_device::{DeviceIdentityManager, ResetAcknowledgement};
use lectern_session::{
    Navigator, SessionConfig, SessionController, SessionCredentials, SessionError,
};
use lectern_storage::{default_store_path, FileStore, KeyValueStore, MemoryStore};
use lectern_types::{DeviceId, LectureRef, ViewerIdentity};
use lectern_viewer::{Canvas, DisplayList, WatermarkPlan};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Global options shared by every command.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// JSON session config file.
    pub config: Option<PathBuf>,
    /// Overrides the config's API base URL.
    pub api_base_url: Option<String>,
    /// Durable store file. Defaults to the platform data directory.
    pub store: Option<PathBuf>,
}

impl Settings {
    /// Session config after applying file and flag overrides.
    pub fn session_config(&self) -> Result<SessionConfig> {
        let mut config = match &self.config {
            Some(path) => SessionConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => SessionConfig::default(),
        };
        if let Some(url) = &self.api_base_url {
            config.api_base_url = url.clone();
        }
        Ok(config)
    }

    pub fn store_path(&self) -> PathBuf {
        self.store.clone().unwrap_or_else(default_store_path)
    }
}

/// Prints login redirects instead of navigating.
#[derive(Debug, Default)]
pub struct ConsoleNavigator {
    last: Mutex<Option<String>>,
}

impl ConsoleNavigator {
    pub fn last_redirect(&self) -> Option<String> {
        self.last.lock().ok().and_then(|l| l.clone())
    }
}

impl Navigator for ConsoleNavigator {
    fn redirect(&self, target: &str) {
        warn!("Session ended, sign in again at {target}");
        if let Ok(mut last) = self.last.lock() {
            *last = Some(target.to_string());
        }
    }
}

/// What `resolve` found for a lecture.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResolveSummary {
    Video {
        url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        expires_at: Option<DateTime<Utc>>,
        identity: ViewerIdentity,
    },
    Document {
        blob_url: String,
        bytes: usize,
        identity: ViewerIdentity,
    },
    Unavailable,
    LoggedOut {
        reason: String,
        redirect: Option<String>,
    },
}

/// Fully wired client over a file-backed durable store.
pub struct Client {
    devices: Arc<DeviceIdentityManager>,
    session: Arc<SessionController>,
    gateway: ContentGateway,
    navigator: Arc<ConsoleNavigator>,
}

impl Client {
    pub fn open(settings: &Settings) -> Result<Self> {
        let config = settings.session_config()?;
        let path = settings.store_path();
        let durable: Arc<dyn KeyValueStore> = Arc::new(
            FileStore::open(path.clone())
                .with_context(|| format!("Failed to open store {}", path.display()))?,
        );
        debug!("Using store {}", path.display());

        let devices = Arc::new(DeviceIdentityManager::new(durable.clone()));
        let navigator = Arc::new(ConsoleNavigator::default());
        let session = Arc::new(SessionController::new(
            config,
            durable,
            Arc::new(MemoryStore::new()),
            devices.clone(),
            navigator.clone(),
        )?);
        let gateway = ContentGateway::new(session.clone(), BlobRegistry::new());

        Ok(Self {
            devices,
            session,
            gateway,
            navigator,
        })
    }

    /// Stored device fingerprint, created on first use.
    pub fn device_id(&self) -> Result<DeviceId> {
        Ok(self.devices.get_or_create_device_id()?)
    }

    /// Discards the fingerprint and returns the new one.
    pub fn reset_device(&self) -> Result<DeviceId> {
        self.devices.reset(ResetAcknowledgement::user_confirmed())?;
        self.device_id()
    }

    /// Stores credentials obtained elsewhere.
    pub fn login(&self, access_token: &str, refresh_token: &str) -> Result<()> {
        self.session
            .establish(&SessionCredentials::new(access_token, refresh_token))?;
        Ok(())
    }

    pub fn has_credentials(&self) -> Result<bool> {
        Ok(self.session.credentials()?.is_some())
    }

    /// Resolves a lecture and the viewer identity without keeping any
    /// content around.
    pub async fn resolve(&self, lecture: &LectureRef) -> Result<ResolveSummary> {
        match self.try_resolve(lecture).await {
            Err(Failure::Terminated(reason)) => Ok(ResolveSummary::LoggedOut {
                reason,
                redirect: self.navigator.last_redirect(),
            }),
            Err(Failure::Other(e)) => Err(e),
            Ok(summary) => Ok(summary),
        }
    }

    async fn try_resolve(&self, lecture: &LectureRef) -> Result<ResolveSummary, Failure> {
        let content = self.gateway.resolve(lecture).await.map_err(Failure::from)?;
        if !content.is_available() {
            return Ok(ResolveSummary::Unavailable);
        }
        let identity = self.gateway.viewer_identity().await.map_err(Failure::from)?;

        Ok(match content {
            ContentRef::Video(signed) => ResolveSummary::Video {
                url: signed.url,
                expires_at: signed.expires_at,
                identity,
            },
            ContentRef::Document(doc) => ResolveSummary::Document {
                blob_url: doc.handle.url().to_string(),
                bytes: doc.handle.len(),
                identity,
            },
            ContentRef::Unavailable => ResolveSummary::Unavailable,
        })
    }
}

enum Failure {
    Terminated(String),
    Other(anyhow::Error),
}

impl From<ContentError> for Failure {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::Session(SessionError::Terminated(reason)) => {
                Failure::Terminated(reason.code().to_string())
            }
            other => Failure::Other(other.into()),
        }
    }
}

/// Watermark tiling for a surface, using the default text measure.
pub fn plan_watermark(width: u32, height: u32, identity: &ViewerIdentity) -> WatermarkPlan {
    let canvas = DisplayList::new(width, height);
    let font_px = WatermarkPlan::font_px_for(width, height);
    let text_width = canvas.measure_text(&identity.watermark_text(), font_px);
    WatermarkPlan::compute(width, height, text_width, font_px)
}
