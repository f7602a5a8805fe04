//! Secure viewer for Lectern protected content.
//!
//! Renders lecture documents and videos so the viewer identity is always
//! stamped over what is shown, and so the usual extraction affordances
//! (print, save, context menu, download controls) are switched off while a
//! viewer is mounted.
//!
//! # Components
//!
//! - **Canvas**: drawing seam plus [`DisplayList`], the layered frame
//!   handed to the host for presentation
//! - **Watermark**: tiled, rotated identity text over any surface
//! - **Document**: page-at-a-time PDF rendering with zoom and paging
//! - **Video**: signed-URL playback with a periodically redrawn overlay
//! - **Guard**: keyboard/context-menu/fullscreen listeners scoped to a
//!   mounted viewer
//! - **Selection**: lecture switching where the latest selection wins
//!
//! Platform facilities (PDF engine, playback element, input events) are
//! traits implemented by the host.

mod canvas;
mod config;
mod document;
mod error;
mod guard;
mod selection;
mod video;
mod watermark;

pub use canvas::{Canvas, DisplayList, DrawOp, FramePresenter, Layer, PageRaster, Rgba, TextStamp};
pub use config::ViewerConfig;
pub use document::{
    DocumentEngine, DocumentHandle, DocumentState, DocumentViewer, EngineError,
};
pub use error::{ViewerError, ViewerResult};
pub use guard::{
    FullscreenObserver, FullscreenState, KeyChord, KeyDisposition, KeyHandler, ListenerId,
    ListenerScope, Shortcut, ShortcutPolicy, Unsupported, ViewerHost,
};
pub use selection::{ActiveView, LectureViewer, SelectOutcome, SelectionEpoch, SurfaceState};
pub use video::{ControlsPolicy, PlaybackSurface, VideoViewer};
pub use watermark::{
    apply_watermark, TilePlacement, WatermarkPlan, MAX_SURFACE, MIN_SURFACE, WATERMARK_ANGLE_DEG,
    WATERMARK_FILL,
};
