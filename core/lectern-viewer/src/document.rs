//! Page-at-a-time document viewer.

use crate::canvas::{Canvas, DisplayList, FramePresenter, Layer, PageRaster};
use crate::config::ViewerConfig;
use crate::error::{ViewerError, ViewerResult};
use crate::guard::{FullscreenState, ListenerScope, ShortcutPolicy, ViewerHost};
use crate::watermark::{apply_watermark, MAX_SURFACE};
use async_trait::async_trait;
use lectern_content::BlobHandle;
use lectern_types::ViewerIdentity;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Failures reported by a [`DocumentEngine`].
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// The bytes are not a readable document.
    #[error("parse error: {0}")]
    Parse(String),

    /// A page could not be rasterized.
    #[error("render error: {0}")]
    Render(String),
}

impl From<EngineError> for ViewerError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Parse(msg) => ViewerError::Malformed(msg),
            EngineError::Render(msg) => ViewerError::Transient(msg),
        }
    }
}

/// Parses documents. Implemented by the host's PDF engine.
#[async_trait]
pub trait DocumentEngine: Send + Sync {
    async fn open(&self, bytes: Arc<[u8]>) -> Result<Box<dyn DocumentHandle>, EngineError>;
}

/// An opened document.
#[async_trait]
pub trait DocumentHandle: Send + Sync {
    /// Number of pages, at least 1 for a well-formed document.
    fn page_count(&self) -> u32;

    /// Rasterizes 1-based `page` at `scale` (1.0 = natural size).
    async fn rasterize(&self, page: u32, scale: f32) -> Result<PageRaster, EngineError>;
}

/// Where the viewer is in its lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentState {
    /// Mounted, first page not yet presented.
    Loading,
    /// `page` of `total` is on screen at `zoom`.
    Ready { page: u32, total: u32, zoom: f32 },
    /// The last render failed.
    Failed(ViewerError),
}

/// A mounted document.
///
/// Holds the blob the document was parsed from; dropping the viewer clears
/// the presented frame, revokes the blob and removes the input guards.
pub struct DocumentViewer {
    config: ViewerConfig,
    document: Box<dyn DocumentHandle>,
    identity: ViewerIdentity,
    presenter: Arc<dyn FramePresenter>,
    host: Arc<dyn ViewerHost>,
    fullscreen: FullscreenState,
    page: u32,
    zoom: f32,
    state: DocumentState,
    _listeners: ListenerScope,
    blob: BlobHandle,
}

impl DocumentViewer {
    /// Parses `blob`, mounts a viewer over it and presents page 1.
    ///
    /// A parse failure is [`ViewerError::Malformed`]. A first-page render
    /// failure still returns the viewer, in [`DocumentState::Failed`], so
    /// the caller can [`retry`](Self::retry).
    pub async fn open(
        engine: &dyn DocumentEngine,
        blob: BlobHandle,
        identity: ViewerIdentity,
        presenter: Arc<dyn FramePresenter>,
        host: Arc<dyn ViewerHost>,
        config: ViewerConfig,
    ) -> ViewerResult<Self> {
        let document = engine.open(blob.shared_bytes()).await?;
        let mut viewer = Self::mount(blob, document, identity, presenter, host, config)?;
        if let Err(e) = viewer.render().await {
            warn!("First page failed to render: {e}");
        }
        Ok(viewer)
    }

    /// Mounts a viewer over an already parsed document, without rendering.
    pub fn mount(
        blob: BlobHandle,
        document: Box<dyn DocumentHandle>,
        identity: ViewerIdentity,
        presenter: Arc<dyn FramePresenter>,
        host: Arc<dyn ViewerHost>,
        config: ViewerConfig,
    ) -> ViewerResult<Self> {
        if document.page_count() == 0 {
            return Err(ViewerError::Malformed("document has no pages".into()));
        }

        let fullscreen = FullscreenState::new();
        let listeners =
            ListenerScope::install(host.clone(), ShortcutPolicy::document(), Some(&fullscreen));
        let zoom = config.clamp_zoom(1.0);

        Ok(Self {
            config,
            document,
            identity,
            presenter,
            host,
            fullscreen,
            page: 1,
            zoom,
            state: DocumentState::Loading,
            _listeners: listeners,
            blob,
        })
    }

    pub fn state(&self) -> &DocumentState {
        &self.state
    }

    /// Current 1-based page.
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn total_pages(&self) -> u32 {
        self.document.page_count()
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Local URL of the blob backing this viewer.
    pub fn blob_url(&self) -> &str {
        self.blob.url()
    }

    /// Rasterizes the current page, stamps the watermark on it and
    /// presents the frame.
    pub async fn render(&mut self) -> ViewerResult<()> {
        let raster = match self.document.rasterize(self.page, self.zoom).await {
            Ok(raster) => raster,
            Err(e) => {
                let err = ViewerError::from(e);
                self.state = DocumentState::Failed(err.clone());
                return Err(err);
            }
        };

        let (width, height) = (raster.width(), raster.height());
        if width > MAX_SURFACE || height > MAX_SURFACE {
            let err = ViewerError::Transient(format!(
                "page raster {width}x{height} exceeds the {MAX_SURFACE} px limit"
            ));
            warn!("Refusing to present page {}: {err}", self.page);
            self.state = DocumentState::Failed(err.clone());
            return Err(err);
        }
        let mut frame = DisplayList::new(width, height);
        frame.begin_layer(Layer::Content);
        frame.draw_raster(Arc::new(raster));
        let tiles = apply_watermark(&mut frame, width, height, &self.identity);
        self.presenter.present(frame);

        debug!(
            "Presented page {}/{} at {:.2}x ({tiles} watermark tiles)",
            self.page,
            self.total_pages(),
            self.zoom
        );
        self.state = DocumentState::Ready {
            page: self.page,
            total: self.total_pages(),
            zoom: self.zoom,
        };
        Ok(())
    }

    /// Re-renders the current page after a failure.
    pub async fn retry(&mut self) -> ViewerResult<()> {
        self.render().await
    }

    /// Moves to the next page. Returns false at the last page.
    pub async fn next_page(&mut self) -> ViewerResult<bool> {
        self.go_to_page(self.page.saturating_add(1)).await
    }

    /// Moves to the previous page. Returns false at page 1.
    pub async fn prev_page(&mut self) -> ViewerResult<bool> {
        self.go_to_page(self.page.saturating_sub(1)).await
    }

    /// Moves to `page`, clamped to the document. Returns false if that is
    /// the current page.
    pub async fn go_to_page(&mut self, page: u32) -> ViewerResult<bool> {
        let page = page.clamp(1, self.total_pages());
        if page == self.page {
            return Ok(false);
        }
        self.page = page;
        self.render().await?;
        Ok(true)
    }

    pub async fn zoom_in(&mut self) -> ViewerResult<bool> {
        self.set_zoom(self.zoom + self.config.zoom_step).await
    }

    pub async fn zoom_out(&mut self) -> ViewerResult<bool> {
        self.set_zoom(self.zoom - self.config.zoom_step).await
    }

    /// Sets the zoom factor, clamped to the configured bounds, and
    /// re-renders. Returns false if the zoom didn't change.
    pub async fn set_zoom(&mut self, zoom: f32) -> ViewerResult<bool> {
        let zoom = self.config.clamp_zoom(zoom);
        if (zoom - self.zoom).abs() < f32::EPSILON {
            return Ok(false);
        }
        self.zoom = zoom;
        self.render().await?;
        Ok(true)
    }

    /// Asks the host to flip fullscreen. [`is_fullscreen`](Self::is_fullscreen)
    /// changes once the host reports the transition.
    pub fn toggle_fullscreen(&self) {
        self.host.request_fullscreen(!self.fullscreen.is_active());
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen.is_active()
    }

    /// Unmounts the viewer.
    pub fn unmount(self) {}
}

impl Drop for DocumentViewer {
    fn drop(&mut self) {
        self.presenter.clear();
        debug!("Document viewer unmounted, releasing {}", self.blob.url());
    }
}
