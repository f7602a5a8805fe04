#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use lectern_content::{
    BlobRegistry, ContentError, ContentRef, ContentResult, ContentSource, DocumentBlob, SignedUrl,
};
use lectern_session::{LogoutReason, SessionError};
use lectern_types::{ContentKind, LectureId, LectureRef, ViewerIdentity};
use lectern_viewer::{
    ControlsPolicy, DisplayList, DocumentEngine, DocumentHandle, EngineError, FramePresenter,
    FullscreenObserver, KeyChord, KeyDisposition, KeyHandler, LectureViewer, ListenerId,
    PageRaster, PlaybackSurface, Unsupported, ViewerConfig, ViewerHost,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

pub const BASE_WIDTH: u32 = 200;
pub const BASE_HEIGHT: u32 = 260;

pub fn identity() -> ViewerIdentity {
    ViewerIdentity::new("a@x.com", "+911234567890")
}

pub fn lecture(id: &str, kind: ContentKind) -> LectureRef {
    LectureRef::new(LectureId::parse(id).unwrap(), kind)
}

// ── Host ────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeHost {
    next_id: AtomicU64,
    keys: Mutex<HashMap<u64, KeyHandler>>,
    context_menus: Mutex<HashSet<u64>>,
    fullscreen: Mutex<HashMap<u64, FullscreenObserver>>,
    pub fullscreen_requests: Mutex<Vec<bool>>,
    refuse: bool,
}

impl FakeHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A host that can't intercept anything.
    pub fn refusing() -> Arc<Self> {
        Arc::new(Self {
            refuse: true,
            ..Default::default()
        })
    }

    /// Runs every installed key interceptor.
    pub fn press(&self, chord: &KeyChord) -> Vec<KeyDisposition> {
        self.keys
            .lock()
            .unwrap()
            .values()
            .map(|handler| handler(chord))
            .collect()
    }

    /// True if any interceptor suppresses `chord`.
    pub fn suppresses(&self, chord: &KeyChord) -> bool {
        self.press(chord)
            .iter()
            .any(|d| matches!(d, KeyDisposition::Suppress { .. }))
    }

    /// Simulates the platform entering or leaving fullscreen.
    pub fn emit_fullscreen(&self, on: bool) {
        for observer in self.fullscreen.lock().unwrap().values() {
            observer(on);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.keys.lock().unwrap().len()
            + self.context_menus.lock().unwrap().len()
            + self.fullscreen.lock().unwrap().len()
    }

    pub fn context_menu_blocked(&self) -> bool {
        !self.context_menus.lock().unwrap().is_empty()
    }

    fn id(&self) -> Result<u64, Unsupported> {
        if self.refuse {
            return Err(Unsupported("interception not available".into()));
        }
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

impl ViewerHost for FakeHost {
    fn add_key_interceptor(&self, handler: KeyHandler) -> Result<ListenerId, Unsupported> {
        let id = self.id()?;
        self.keys.lock().unwrap().insert(id, handler);
        Ok(ListenerId(id))
    }

    fn add_context_menu_blocker(&self) -> Result<ListenerId, Unsupported> {
        let id = self.id()?;
        self.context_menus.lock().unwrap().insert(id);
        Ok(ListenerId(id))
    }

    fn add_fullscreen_observer(
        &self,
        observer: FullscreenObserver,
    ) -> Result<ListenerId, Unsupported> {
        let id = self.id()?;
        self.fullscreen.lock().unwrap().insert(id, observer);
        Ok(ListenerId(id))
    }

    fn remove_listener(&self, id: ListenerId) {
        self.keys.lock().unwrap().remove(&id.0);
        self.context_menus.lock().unwrap().remove(&id.0);
        self.fullscreen.lock().unwrap().remove(&id.0);
    }

    fn request_fullscreen(&self, enter: bool) {
        self.fullscreen_requests.lock().unwrap().push(enter);
    }
}

// ── Presenter ───────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingPresenter {
    current: Mutex<Option<DisplayList>>,
    frames: AtomicUsize,
    clears: AtomicUsize,
}

impl RecordingPresenter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn current(&self) -> Option<DisplayList> {
        self.current.lock().unwrap().clone()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.load(Ordering::SeqCst)
    }

    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl FramePresenter for RecordingPresenter {
    fn present(&self, frame: DisplayList) {
        self.frames.fetch_add(1, Ordering::SeqCst);
        *self.current.lock().unwrap() = Some(frame);
    }

    fn clear(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
        *self.current.lock().unwrap() = None;
    }
}

// ── Document engine ─────────────────────────────────────────────

/// Opens anything not starting with `BAD`. Pages rasterize to blank
/// `BASE_WIDTH x BASE_HEIGHT` pages scaled by the zoom.
pub struct FakeEngine {
    pages: u32,
    page_size: (u32, u32),
    render_failures: Arc<AtomicUsize>,
    pub rasterized: Arc<Mutex<Vec<(u32, f32)>>>,
}

impl FakeEngine {
    pub fn new(pages: u32) -> Arc<Self> {
        Self::with_page_size(pages, BASE_WIDTH, BASE_HEIGHT)
    }

    /// Pages of `width x height` px at zoom 1.0.
    pub fn with_page_size(pages: u32, width: u32, height: u32) -> Arc<Self> {
        Arc::new(Self {
            pages,
            page_size: (width, height),
            render_failures: Arc::new(AtomicUsize::new(0)),
            rasterized: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// Makes the next `n` rasterizations fail.
    pub fn fail_next_renders(&self, n: usize) {
        self.render_failures.store(n, Ordering::SeqCst);
    }

    pub fn last_rasterized(&self) -> Option<(u32, f32)> {
        self.rasterized.lock().unwrap().last().copied()
    }
}

#[async_trait]
impl DocumentEngine for FakeEngine {
    async fn open(&self, bytes: Arc<[u8]>) -> Result<Box<dyn DocumentHandle>, EngineError> {
        if bytes.starts_with(b"BAD") {
            return Err(EngineError::Parse("invalid PDF header".into()));
        }
        Ok(Box::new(FakeDocument {
            pages: self.pages,
            page_size: self.page_size,
            render_failures: self.render_failures.clone(),
            rasterized: self.rasterized.clone(),
        }))
    }
}

struct FakeDocument {
    pages: u32,
    page_size: (u32, u32),
    render_failures: Arc<AtomicUsize>,
    rasterized: Arc<Mutex<Vec<(u32, f32)>>>,
}

#[async_trait]
impl DocumentHandle for FakeDocument {
    fn page_count(&self) -> u32 {
        self.pages
    }

    async fn rasterize(&self, page: u32, scale: f32) -> Result<PageRaster, EngineError> {
        let pending = self.render_failures.load(Ordering::SeqCst);
        if pending > 0 {
            self.render_failures.store(pending - 1, Ordering::SeqCst);
            return Err(EngineError::Render("raster buffer lost".into()));
        }
        self.rasterized.lock().unwrap().push((page, scale));
        let width = (self.page_size.0 as f32 * scale).round() as u32;
        let height = (self.page_size.1 as f32 * scale).round() as u32;
        Ok(PageRaster::blank(width, height))
    }
}

// ── Playback surface ────────────────────────────────────────────

pub struct FakeSurface {
    pub loads: Mutex<Vec<(String, ControlsPolicy)>>,
    unloads: AtomicUsize,
    overlays: AtomicUsize,
    last_overlay: Mutex<Option<DisplayList>>,
    viewport: (u32, u32),
}

impl FakeSurface {
    pub fn new(width: u32, height: u32) -> Arc<Self> {
        Arc::new(Self {
            loads: Mutex::new(Vec::new()),
            unloads: AtomicUsize::new(0),
            overlays: AtomicUsize::new(0),
            last_overlay: Mutex::new(None),
            viewport: (width, height),
        })
    }

    pub fn overlay_count(&self) -> usize {
        self.overlays.load(Ordering::SeqCst)
    }

    pub fn unload_count(&self) -> usize {
        self.unloads.load(Ordering::SeqCst)
    }

    pub fn last_overlay(&self) -> Option<DisplayList> {
        self.last_overlay.lock().unwrap().clone()
    }
}

impl PlaybackSurface for FakeSurface {
    fn load(&self, url: &str, controls: &ControlsPolicy) {
        self.loads.lock().unwrap().push((url.to_string(), *controls));
    }

    fn unload(&self) {
        self.unloads.fetch_add(1, Ordering::SeqCst);
    }

    fn position(&self) -> Duration {
        Duration::from_secs(42)
    }

    fn duration(&self) -> Option<Duration> {
        Some(Duration::from_secs(600))
    }

    fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    fn present_overlay(&self, overlay: DisplayList) {
        self.overlays.fetch_add(1, Ordering::SeqCst);
        *self.last_overlay.lock().unwrap() = Some(overlay);
    }
}

// ── Content source ──────────────────────────────────────────────

#[derive(Clone)]
pub enum FakeContent {
    Document(Vec<u8>),
    Video(String),
    /// A video whose signed URL expired a minute ago.
    ExpiredVideo(String),
    Missing,
    Broken(String),
    Revoked,
}

pub struct FakeSource {
    pub blobs: BlobRegistry,
    content: Mutex<HashMap<String, FakeContent>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    identity: Mutex<ViewerIdentity>,
    pub resolves: AtomicUsize,
}

impl FakeSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            blobs: BlobRegistry::new(),
            content: Mutex::new(HashMap::new()),
            gates: Mutex::new(HashMap::new()),
            identity: Mutex::new(identity()),
            resolves: AtomicUsize::new(0),
        })
    }

    pub fn set(&self, id: &str, content: FakeContent) {
        self.content.lock().unwrap().insert(id.to_string(), content);
    }

    pub fn set_identity(&self, identity: ViewerIdentity) {
        *self.identity.lock().unwrap() = identity;
    }

    /// Holds resolution of `id` until [`release`](Self::release).
    pub fn gate(&self, id: &str) {
        self.gates
            .lock()
            .unwrap()
            .insert(id.to_string(), Arc::new(Notify::new()));
    }

    pub fn release(&self, id: &str) {
        if let Some(gate) = self.gates.lock().unwrap().get(id) {
            gate.notify_one();
        }
    }
}

#[async_trait]
impl ContentSource for FakeSource {
    async fn resolve(&self, lecture: &LectureRef) -> ContentResult<ContentRef> {
        self.resolves.fetch_add(1, Ordering::SeqCst);
        let gate = self.gates.lock().unwrap().get(lecture.id.as_str()).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let content = self
            .content
            .lock()
            .unwrap()
            .get(lecture.id.as_str())
            .cloned()
            .unwrap_or(FakeContent::Missing);

        match (content, lecture.kind) {
            (_, None) | (FakeContent::Missing, _) => Ok(ContentRef::Unavailable),
            (FakeContent::Document(bytes), Some(ContentKind::Document)) => {
                Ok(ContentRef::Document(DocumentBlob {
                    lecture_id: lecture.id.clone(),
                    handle: self.blobs.register(bytes),
                }))
            }
            (FakeContent::Video(url), Some(ContentKind::Video)) => {
                Ok(ContentRef::Video(SignedUrl {
                    url,
                    expires_at: None,
                }))
            }
            (FakeContent::ExpiredVideo(url), Some(ContentKind::Video)) => {
                Ok(ContentRef::Video(SignedUrl {
                    url,
                    expires_at: Some(Utc::now() - chrono::Duration::minutes(1)),
                }))
            }
            (FakeContent::Broken(msg), _) => Err(ContentError::Malformed(msg)),
            (FakeContent::Revoked, _) => Err(ContentError::Session(SessionError::Terminated(
                LogoutReason::DeviceInvalidated,
            ))),
            _ => Ok(ContentRef::Unavailable),
        }
    }

    async fn viewer_identity(&self) -> ContentResult<ViewerIdentity> {
        Ok(self.identity.lock().unwrap().clone())
    }
}

// ── Wiring ──────────────────────────────────────────────────────

pub struct Rig {
    pub viewer: LectureViewer,
    pub source: Arc<FakeSource>,
    pub engine: Arc<FakeEngine>,
    pub host: Arc<FakeHost>,
    pub presenter: Arc<RecordingPresenter>,
    pub surface: Arc<FakeSurface>,
}

pub fn rig() -> Rig {
    let source = FakeSource::new();
    let engine = FakeEngine::new(5);
    let host = FakeHost::new();
    let presenter = RecordingPresenter::new();
    let surface = FakeSurface::new(640, 360);
    let viewer = LectureViewer::new(
        source.clone(),
        engine.clone(),
        host.clone(),
        presenter.clone(),
        surface.clone(),
        ViewerConfig::default(),
    );
    Rig {
        viewer,
        source,
        engine,
        host,
        presenter,
        surface,
    }
}
