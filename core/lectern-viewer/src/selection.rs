//! Lecture selection.
//!
//! Each `select` takes a new epoch before doing any work. Content is
//! resolved and parsed without holding the view lock; the result is
//! installed only if its epoch is still the latest, otherwise it is dropped
//! (revoking any blob it carried).

use crate::canvas::FramePresenter;
use crate::config::ViewerConfig;
use crate::document::{DocumentEngine, DocumentHandle, DocumentState, DocumentViewer};
use crate::error::{ViewerError, ViewerResult};
use crate::guard::ViewerHost;
use crate::video::{PlaybackSurface, VideoViewer};
use chrono::Utc;
use lectern_content::{BlobHandle, ContentRef, ContentSource, SignedUrl};
use lectern_types::{LectureId, LectureRef, ViewerIdentity};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Monotonic selection counter.
#[derive(Debug, Default)]
pub struct SelectionEpoch(AtomicU64);

impl SelectionEpoch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new selection and returns its epoch.
    pub fn advance(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, epoch: u64) -> bool {
        self.current() == epoch
    }
}

/// What the viewer area is showing.
pub enum ActiveView {
    Empty,
    Loading(LectureId),
    Document(DocumentViewer),
    Video(VideoViewer),
    /// The lecture has no protected content.
    Unavailable(LectureId),
    Failed {
        lecture: LectureRef,
        error: ViewerError,
    },
}

impl ActiveView {
    /// Short label for logs and status lines.
    pub fn label(&self) -> &'static str {
        match self {
            ActiveView::Empty => "empty",
            ActiveView::Loading(_) => "loading",
            ActiveView::Document(_) => "document",
            ActiveView::Video(_) => "video",
            ActiveView::Unavailable(_) => "unavailable",
            ActiveView::Failed { .. } => "failed",
        }
    }

    /// Playback or paging state of the mounted surface.
    pub fn surface_state(&self) -> Option<SurfaceState> {
        match self {
            ActiveView::Document(viewer) => Some(SurfaceState::Document {
                page: viewer.page(),
                total_pages: viewer.total_pages(),
                zoom: viewer.zoom(),
            }),
            ActiveView::Video(viewer) => Some(SurfaceState::Video {
                position: viewer.position(),
                duration: viewer.duration(),
            }),
            _ => None,
        }
    }
}

/// Result of a `select` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// The lecture's content is mounted.
    Shown,
    /// The lecture has nothing to show.
    Unavailable,
    /// A newer selection arrived first; this one was discarded.
    Superseded,
}

/// Position within the mounted surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceState {
    Document {
        page: u32,
        total_pages: u32,
        zoom: f32,
    },
    Video {
        position: Duration,
        duration: Option<Duration>,
    },
}

enum Prepared {
    Unavailable,
    Document {
        blob: BlobHandle,
        document: Box<dyn DocumentHandle>,
        identity: ViewerIdentity,
    },
    Video {
        url: SignedUrl,
        identity: ViewerIdentity,
    },
}

/// The lecture viewer area.
pub struct LectureViewer {
    source: Arc<dyn ContentSource>,
    engine: Arc<dyn DocumentEngine>,
    host: Arc<dyn ViewerHost>,
    presenter: Arc<dyn FramePresenter>,
    playback: Arc<dyn PlaybackSurface>,
    config: ViewerConfig,
    epoch: SelectionEpoch,
    active: Mutex<ActiveView>,
}

impl LectureViewer {
    pub fn new(
        source: Arc<dyn ContentSource>,
        engine: Arc<dyn DocumentEngine>,
        host: Arc<dyn ViewerHost>,
        presenter: Arc<dyn FramePresenter>,
        playback: Arc<dyn PlaybackSurface>,
        config: ViewerConfig,
    ) -> Self {
        Self {
            source,
            engine,
            host,
            presenter,
            playback,
            config,
            epoch: SelectionEpoch::new(),
            active: Mutex::new(ActiveView::Empty),
        }
    }

    /// Locks and returns the current view, e.g. to page or zoom a
    /// mounted document.
    pub async fn view(&self) -> MutexGuard<'_, ActiveView> {
        self.active.lock().await
    }

    /// Epoch of the latest selection.
    pub fn epoch(&self) -> u64 {
        self.epoch.current()
    }

    /// Shows `lecture`, replacing whatever was shown.
    ///
    /// Errors are also recorded as [`ActiveView::Failed`], unless a newer
    /// selection has taken over.
    pub async fn select(&self, lecture: LectureRef) -> ViewerResult<SelectOutcome> {
        let epoch = self.epoch.advance();
        {
            let mut active = self.active.lock().await;
            if !self.epoch.is_current(epoch) {
                return Ok(SelectOutcome::Superseded);
            }
            *active = ActiveView::Loading(lecture.id.clone());
        }
        debug!("Selecting lecture {} (epoch {epoch})", lecture.id);

        let prepared = self.prepare(&lecture).await;

        let mut active = self.active.lock().await;
        if !self.epoch.is_current(epoch) {
            debug!("Discarding stale content for lecture {}", lecture.id);
            return Ok(SelectOutcome::Superseded);
        }

        match prepared {
            Ok(Prepared::Unavailable) => {
                info!("No content for lecture {}", lecture.id);
                *active = ActiveView::Unavailable(lecture.id);
                Ok(SelectOutcome::Unavailable)
            }
            Ok(Prepared::Video { url, identity }) => {
                // Signed URLs are short-lived; a stale one is fetched again on retry.
                if url.is_expired(Utc::now()) {
                    let error = ViewerError::Transient("playback URL has expired".into());
                    return Err(fail(&mut active, lecture, error));
                }
                *active = ActiveView::Video(VideoViewer::mount(
                    &url,
                    identity,
                    self.playback.clone(),
                    self.host.clone(),
                    &self.config,
                ));
                Ok(SelectOutcome::Shown)
            }
            Ok(Prepared::Document {
                blob,
                document,
                identity,
            }) => {
                let mounted = DocumentViewer::mount(
                    blob,
                    document,
                    identity,
                    self.presenter.clone(),
                    self.host.clone(),
                    self.config.clone(),
                );
                let viewer = match mounted {
                    Ok(viewer) => viewer,
                    Err(error) => return Err(fail(&mut active, lecture, error)),
                };
                *active = ActiveView::Document(viewer);
                if let ActiveView::Document(viewer) = &mut *active {
                    viewer.render().await?;
                }
                Ok(SelectOutcome::Shown)
            }
            Err(error) => Err(fail(&mut active, lecture, error)),
        }
    }

    /// Retries after a retryable failure.
    ///
    /// Re-renders a document whose last render failed, or re-selects a
    /// lecture whose loading failed transiently. Non-retryable failures are
    /// returned unchanged.
    pub async fn retry(&self) -> ViewerResult<SelectOutcome> {
        let lecture = {
            let mut active = self.active.lock().await;
            match &mut *active {
                ActiveView::Document(viewer)
                    if matches!(viewer.state(), DocumentState::Failed(_)) =>
                {
                    viewer.retry().await?;
                    return Ok(SelectOutcome::Shown);
                }
                ActiveView::Failed { lecture, error } => {
                    if !error.is_retryable() {
                        return Err(error.clone());
                    }
                    lecture.clone()
                }
                ActiveView::Unavailable(_) => return Ok(SelectOutcome::Unavailable),
                _ => return Ok(SelectOutcome::Shown),
            }
        };
        self.select(lecture).await
    }

    /// Drops the mounted surface and ignores any selection still in
    /// flight.
    pub async fn unmount(&self) {
        self.epoch.advance();
        *self.active.lock().await = ActiveView::Empty;
        debug!("Lecture viewer unmounted");
    }

    async fn prepare(&self, lecture: &LectureRef) -> ViewerResult<Prepared> {
        let content = self.source.resolve(lecture).await?;
        if !content.is_available() {
            return Ok(Prepared::Unavailable);
        }

        let identity = self.source.viewer_identity().await?;
        if identity.is_blank() {
            return Err(ViewerError::Transient(
                "viewer identity is unavailable".into(),
            ));
        }

        match content {
            ContentRef::Video(url) => Ok(Prepared::Video { url, identity }),
            ContentRef::Document(doc) => {
                let document = self.engine.open(doc.handle.shared_bytes()).await?;
                Ok(Prepared::Document {
                    blob: doc.handle,
                    document,
                    identity,
                })
            }
            ContentRef::Unavailable => Ok(Prepared::Unavailable),
        }
    }
}

fn fail(active: &mut ActiveView, lecture: LectureRef, error: ViewerError) -> ViewerError {
    warn!("Lecture {} failed to load: {error}", lecture.id);
    *active = ActiveView::Failed {
        lecture,
        error: error.clone(),
    };
    error
}
