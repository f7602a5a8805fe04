//! Signed-URL video viewer with a periodically redrawn watermark overlay.

use crate::canvas::DisplayList;
use crate::config::ViewerConfig;
use crate::guard::{ListenerScope, ShortcutPolicy, ViewerHost};
use crate::watermark::apply_watermark;
use lectern_content::SignedUrl;
use lectern_types::ViewerIdentity;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Native playback affordances the surface may expose. The default turns
/// off everything that lets the stream leave the viewer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlsPolicy {
    pub download: bool,
    pub picture_in_picture: bool,
    pub remote_playback: bool,
}

/// The host's video element.
pub trait PlaybackSurface: Send + Sync {
    /// Starts loading `url` with the given native controls.
    fn load(&self, url: &str, controls: &ControlsPolicy);

    /// Stops playback and forgets the source.
    fn unload(&self);

    /// Current playback position.
    fn position(&self) -> Duration;

    /// Media duration, once known.
    fn duration(&self) -> Option<Duration>;

    /// Displayed size in px.
    fn viewport(&self) -> (u32, u32);

    /// Replaces the overlay drawn above the video.
    fn present_overlay(&self, overlay: DisplayList);
}

/// A mounted video.
pub struct VideoViewer {
    surface: Arc<dyn PlaybackSurface>,
    overlay_task: JoinHandle<()>,
    _listeners: ListenerScope,
}

impl VideoViewer {
    /// Loads `url` into `surface` and starts the overlay task.
    ///
    /// Must be called inside a tokio runtime.
    pub fn mount(
        url: &SignedUrl,
        identity: ViewerIdentity,
        surface: Arc<dyn PlaybackSurface>,
        host: Arc<dyn ViewerHost>,
        config: &ViewerConfig,
    ) -> Self {
        let listeners = ListenerScope::install(host, ShortcutPolicy::video(), None);
        surface.load(&url.url, &ControlsPolicy::default());
        info!("Video mounted");

        let period = config.overlay_refresh();
        let overlay_surface = surface.clone();
        let overlay_task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                redraw_overlay(overlay_surface.as_ref(), &identity);
            }
        });

        Self {
            surface,
            overlay_task,
            _listeners: listeners,
        }
    }

    pub fn position(&self) -> Duration {
        self.surface.position()
    }

    pub fn duration(&self) -> Option<Duration> {
        self.surface.duration()
    }

    /// Unmounts the viewer.
    pub fn unmount(self) {}
}

fn redraw_overlay(surface: &dyn PlaybackSurface, identity: &ViewerIdentity) {
    let (width, height) = surface.viewport();
    let mut overlay = DisplayList::new(width, height);
    apply_watermark(&mut overlay, width, height, identity);
    surface.present_overlay(overlay);
}

impl Drop for VideoViewer {
    fn drop(&mut self) {
        self.overlay_task.abort();
        self.surface.unload();
        debug!("Video viewer unmounted");
    }
}
