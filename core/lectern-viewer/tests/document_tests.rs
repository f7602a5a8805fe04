mod common;

use common::{identity, FakeEngine, FakeHost, RecordingPresenter, BASE_HEIGHT, BASE_WIDTH};
use lectern_content::BlobRegistry;
use lectern_viewer::{
    DisplayList, DocumentState, DocumentViewer, DrawOp, KeyChord, KeyDisposition, Layer,
    Shortcut, ViewerConfig, ViewerError, WatermarkPlan, WATERMARK_ANGLE_DEG, WATERMARK_FILL,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

struct Mounted {
    viewer: DocumentViewer,
    blobs: BlobRegistry,
    engine: Arc<FakeEngine>,
    host: Arc<FakeHost>,
    presenter: Arc<RecordingPresenter>,
}

async fn open(pages: u32) -> Mounted {
    open_on(pages, FakeHost::new()).await
}

async fn open_on(pages: u32, host: Arc<FakeHost>) -> Mounted {
    open_with(FakeEngine::new(pages), host).await
}

async fn open_with(engine: Arc<FakeEngine>, host: Arc<FakeHost>) -> Mounted {
    let blobs = BlobRegistry::new();
    let presenter = RecordingPresenter::new();
    let viewer = DocumentViewer::open(
        engine.as_ref(),
        blobs.register(b"%PDF-1.7 lecture".to_vec()),
        identity(),
        presenter.clone(),
        host.clone(),
        ViewerConfig::default(),
    )
    .await
    .unwrap();
    Mounted {
        viewer,
        blobs,
        engine,
        host,
        presenter,
    }
}

fn raster_size(frame: &DisplayList) -> (u32, u32) {
    match frame.ops(Layer::Content) {
        [DrawOp::Raster(raster)] => (raster.width(), raster.height()),
        other => panic!("expected a single raster, got {other:?}"),
    }
}

// ── Rendering ───────────────────────────────────────────────────

#[tokio::test]
async fn first_page_is_watermarked_with_identity() {
    let m = open(5).await;

    assert_eq!(
        m.viewer.state(),
        &DocumentState::Ready {
            page: 1,
            total: 5,
            zoom: 1.0
        }
    );

    let frame = m.presenter.current().unwrap();
    assert_eq!(raster_size(&frame), (BASE_WIDTH, BASE_HEIGHT));

    let stamps: Vec<_> = frame.watermark_stamps().collect();
    assert!(!stamps.is_empty());
    for stamp in &stamps {
        assert_eq!(&*stamp.text, "a@x.com | +911234567890");
        assert_eq!(stamp.angle_rad, WATERMARK_ANGLE_DEG.to_radians());
        assert_eq!(stamp.fill, WATERMARK_FILL);
    }
}

#[tokio::test]
async fn zoom_rerenders_without_residual_watermark() {
    let mut m = open(5).await;
    let before = m.presenter.current().unwrap();

    assert!(m.viewer.set_zoom(2.0).await.unwrap());

    let after = m.presenter.current().unwrap();
    let (width, height) = raster_size(&after);
    assert_eq!((width, height), (BASE_WIDTH * 2, BASE_HEIGHT * 2));
    assert_eq!(m.engine.last_rasterized(), Some((1, 2.0)));

    // Exactly one fresh tiling for the new size, nothing carried over.
    let font = WatermarkPlan::font_px_for(width, height);
    let text_width = "a@x.com | +911234567890".len() as f32 * font * 0.6;
    let plan = WatermarkPlan::compute(width, height, text_width, font);
    assert_eq!(after.watermark_stamps().count(), plan.tiles.len());
    assert!(after.watermark_stamps().all(|s| s.font_px == font));
    assert_ne!(
        before.watermark_stamps().count(),
        0,
        "initial frame should be stamped too"
    );

    for (x, y) in [(10.0, 10.0), (200.0, 260.0), (390.0, 510.0)] {
        assert!(after.watermark_alpha_at(x, y) <= WATERMARK_FILL.a + 1e-6);
    }
}

#[tokio::test]
async fn rerendering_same_page_is_idempotent() {
    let mut m = open(3).await;
    let first = m.presenter.current().unwrap();

    m.viewer.render().await.unwrap();
    let second = m.presenter.current().unwrap();

    assert_eq!(first, second);
    assert_eq!(m.presenter.frame_count(), 2);
}

// ── Paging and zoom bounds ──────────────────────────────────────

#[tokio::test]
async fn tall_page_is_watermarked_to_its_far_edge() {
    // Narrow pages keep the raster buffer small while the long side passes 8192 px.
    let mut m = open_with(FakeEngine::with_page_size(1, 40, 4_000), FakeHost::new()).await;
    assert_eq!(m.viewer.set_zoom(3.0).await, Ok(true));

    let frame = m.presenter.current().unwrap();
    assert_eq!(raster_size(&frame), (120, 12_000));
    let stamps: Vec<_> = frame.watermark_stamps().collect();
    let lowest = stamps.iter().map(|s| s.y).fold(f32::MIN, f32::max);
    assert!(lowest >= 12_000.0, "lowest tile anchor at {lowest}");

    for y in (0..12_000).step_by(250) {
        let covered = stamps
            .iter()
            .any(|s| (s.x - 60.0).hypot(s.y - y as f32) <= 400.0);
        assert!(covered, "no tile near y = {y}");
    }
}

#[tokio::test]
async fn oversized_raster_is_refused() {
    let mut m = open_with(FakeEngine::with_page_size(1, 4, 11_000), FakeHost::new()).await;
    let presented = m.presenter.frame_count();

    let err = m.viewer.set_zoom(3.0).await.unwrap_err();

    assert!(matches!(err, ViewerError::Transient(_)));
    assert_eq!(m.viewer.state(), &DocumentState::Failed(err));
    assert_eq!(m.presenter.frame_count(), presented);

    assert_eq!(m.viewer.set_zoom(1.0).await, Ok(true));
    assert!(matches!(m.viewer.state(), DocumentState::Ready { zoom, .. } if *zoom == 1.0));
}

#[tokio::test]
async fn paging_is_clamped_to_document() {
    let mut m = open(3).await;

    assert!(!m.viewer.prev_page().await.unwrap());
    assert_eq!(m.viewer.page(), 1);

    assert!(m.viewer.next_page().await.unwrap());
    assert!(m.viewer.next_page().await.unwrap());
    assert!(!m.viewer.next_page().await.unwrap());
    assert_eq!(m.viewer.page(), 3);
    assert_eq!(m.engine.last_rasterized(), Some((3, 1.0)));

    assert!(m.viewer.go_to_page(0).await.unwrap());
    assert_eq!(m.viewer.page(), 1);
    assert!(m.viewer.go_to_page(99).await.unwrap());
    assert_eq!(m.viewer.page(), 3);
}

#[tokio::test]
async fn boundary_navigation_does_not_rerender() {
    let mut m = open(1).await;
    let frames = m.presenter.frame_count();

    m.viewer.next_page().await.unwrap();
    m.viewer.prev_page().await.unwrap();

    assert_eq!(m.presenter.frame_count(), frames);
}

#[tokio::test]
async fn zoom_is_clamped_to_bounds() {
    let mut m = open(2).await;

    assert!(m.viewer.set_zoom(10.0).await.unwrap());
    assert_eq!(m.viewer.zoom(), 3.0);
    assert!(!m.viewer.zoom_in().await.unwrap());

    assert!(m.viewer.set_zoom(0.1).await.unwrap());
    assert_eq!(m.viewer.zoom(), 0.5);
    assert!(!m.viewer.zoom_out().await.unwrap());

    assert!(m.viewer.zoom_in().await.unwrap());
    assert_eq!(m.viewer.zoom(), 0.75);
}

// ── Failures ────────────────────────────────────────────────────

#[tokio::test]
async fn parse_failure_is_malformed_and_not_retryable() {
    let blobs = BlobRegistry::new();
    let engine = FakeEngine::new(1);
    let result = DocumentViewer::open(
        engine.as_ref(),
        blobs.register(b"BAD bytes".to_vec()),
        identity(),
        RecordingPresenter::new(),
        FakeHost::new(),
        ViewerConfig::default(),
    )
    .await;

    let err = result.err().unwrap();
    assert_eq!(err, ViewerError::Malformed("invalid PDF header".into()));
    assert!(!err.is_retryable());
    assert!(err.to_string().contains("invalid PDF header"));
    assert_eq!(blobs.live_count(), 0);
}

#[tokio::test]
async fn render_failure_is_retryable() {
    let mut m = open(4).await;
    m.viewer.next_page().await.unwrap();
    m.engine.fail_next_renders(1);

    let err = m.viewer.zoom_in().await.unwrap_err();
    assert!(err.is_retryable());
    assert!(matches!(m.viewer.state(), DocumentState::Failed(ViewerError::Transient(_))));

    m.viewer.retry().await.unwrap();
    assert_eq!(
        m.viewer.state(),
        &DocumentState::Ready {
            page: 2,
            total: 4,
            zoom: 1.25
        }
    );
}

#[tokio::test]
async fn first_page_failure_still_mounts() {
    let blobs = BlobRegistry::new();
    let engine = FakeEngine::new(2);
    engine.fail_next_renders(1);

    let mut viewer = DocumentViewer::open(
        engine.as_ref(),
        blobs.register(b"%PDF".to_vec()),
        identity(),
        RecordingPresenter::new(),
        FakeHost::new(),
        ViewerConfig::default(),
    )
    .await
    .unwrap();

    assert!(matches!(viewer.state(), DocumentState::Failed(_)));
    viewer.retry().await.unwrap();
    assert!(matches!(viewer.state(), DocumentState::Ready { page: 1, .. }));
}

// ── Input guards ────────────────────────────────────────────────

#[tokio::test]
async fn print_and_save_are_suppressed_while_mounted() {
    let m = open(2).await;

    let print = m.host.press(&KeyChord::ctrl("p"));
    assert_eq!(
        print,
        vec![KeyDisposition::Suppress {
            shortcut: Shortcut::Print,
            notice: Shortcut::Print.notice(),
        }]
    );
    assert!(m.host.suppresses(&KeyChord::meta("s")));
    assert!(!m.host.suppresses(&KeyChord::key("p")));
    assert!(!m.host.suppresses(&KeyChord::ctrl("c")));
    assert!(m.host.context_menu_blocked());
}

#[tokio::test]
async fn unmount_removes_listeners_and_revokes_blob() {
    let m = open(2).await;
    assert_eq!(m.host.listener_count(), 3);
    assert_eq!(m.blobs.live_count(), 1);

    m.viewer.unmount();

    assert_eq!(m.host.listener_count(), 0);
    assert!(!m.host.suppresses(&KeyChord::ctrl("p")));
    assert_eq!(m.blobs.live_count(), 0);
    assert_eq!(m.presenter.clear_count(), 1);
    assert!(m.presenter.current().is_none());
}

#[tokio::test]
async fn renders_when_host_cannot_intercept() {
    let m = open_on(2, FakeHost::refusing()).await;

    assert_eq!(m.host.listener_count(), 0);
    assert!(matches!(m.viewer.state(), DocumentState::Ready { .. }));
    assert!(m.presenter.current().unwrap().watermark_stamps().count() > 0);
}

// ── Fullscreen ──────────────────────────────────────────────────

#[tokio::test]
async fn fullscreen_follows_host_notifications() {
    let m = open(1).await;

    m.viewer.toggle_fullscreen();
    assert_eq!(*m.host.fullscreen_requests.lock().unwrap(), vec![true]);
    // Requesting alone doesn't flip local state.
    assert!(!m.viewer.is_fullscreen());

    m.host.emit_fullscreen(true);
    assert!(m.viewer.is_fullscreen());

    // User leaves fullscreen with an OS gesture.
    m.host.emit_fullscreen(false);
    assert!(!m.viewer.is_fullscreen());

    m.viewer.toggle_fullscreen();
    assert_eq!(*m.host.fullscreen_requests.lock().unwrap(), vec![true, true]);
}
