//! Input guards scoped to a mounted viewer.
//!
//! A viewer registers its keyboard interceptor, context-menu blocker and
//! fullscreen observer through a [`ListenerScope`]. Dropping the scope
//! removes every listener it installed, whichever way the viewer goes
//! away. Registration failures are logged and ignored: suppression fails
//! open, the watermark is what actually deters.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Host-assigned listener identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// The host can't install this kind of listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unsupported(pub String);

impl fmt::Display for Unsupported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported: {}", self.0)
    }
}

impl std::error::Error for Unsupported {}

/// A key press as reported by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyChord {
    /// Key value (`"p"`, `"F12"`, ...).
    pub key: String,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl KeyChord {
    /// A plain key with no modifiers.
    pub fn key(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    /// `key` with Ctrl held.
    pub fn ctrl(key: impl Into<String>) -> Self {
        Self {
            ctrl: true,
            ..Self::key(key)
        }
    }

    /// `key` with Cmd held.
    pub fn meta(key: impl Into<String>) -> Self {
        Self {
            meta: true,
            ..Self::key(key)
        }
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    fn is(&self, key: &str) -> bool {
        self.key.eq_ignore_ascii_case(key)
    }

    fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Extraction shortcuts a viewer can block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shortcut {
    Print,
    Save,
    DevTools,
    ViewSource,
}

impl Shortcut {
    /// Identifies which shortcut, if any, `chord` triggers.
    pub fn classify(chord: &KeyChord) -> Option<Self> {
        if chord.is("F12") {
            return Some(Shortcut::DevTools);
        }
        if !chord.command() {
            return None;
        }
        let inspector_key = chord.is("i") || chord.is("j") || chord.is("c");
        if inspector_key && (chord.shift || (chord.meta && chord.alt)) {
            return Some(Shortcut::DevTools);
        }
        if chord.is("p") {
            Some(Shortcut::Print)
        } else if chord.is("s") {
            Some(Shortcut::Save)
        } else if chord.is("u") {
            Some(Shortcut::ViewSource)
        } else {
            None
        }
    }

    /// Notice shown when the shortcut is suppressed.
    pub fn notice(&self) -> &'static str {
        match self {
            Shortcut::Print => "Printing is disabled for protected content.",
            Shortcut::Save => "Saving is disabled for protected content.",
            Shortcut::DevTools => "Developer tools are disabled while viewing protected content.",
            Shortcut::ViewSource => "Viewing the page source is disabled for protected content.",
        }
    }
}

/// Which shortcuts a viewer suppresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutPolicy {
    blocked: Vec<Shortcut>,
}

impl ShortcutPolicy {
    /// Print and save.
    pub fn document() -> Self {
        Self {
            blocked: vec![Shortcut::Print, Shortcut::Save],
        }
    }

    /// Save, devtools and view-source.
    pub fn video() -> Self {
        Self {
            blocked: vec![Shortcut::Save, Shortcut::DevTools, Shortcut::ViewSource],
        }
    }

    /// Decides what happens to `chord`.
    pub fn dispose(&self, chord: &KeyChord) -> KeyDisposition {
        match Shortcut::classify(chord) {
            Some(shortcut) if self.blocked.contains(&shortcut) => KeyDisposition::Suppress {
                shortcut,
                notice: shortcut.notice(),
            },
            _ => KeyDisposition::Pass,
        }
    }
}

/// Interceptor verdict for a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyDisposition {
    /// Let the host handle the key normally.
    Pass,
    /// Cancel the default action and show `notice`.
    Suppress {
        shortcut: Shortcut,
        notice: &'static str,
    },
}

pub type KeyHandler = Box<dyn Fn(&KeyChord) -> KeyDisposition + Send + Sync>;
pub type FullscreenObserver = Box<dyn Fn(bool) + Send + Sync>;

/// Platform services a mounted viewer relies on.
pub trait ViewerHost: Send + Sync {
    /// Installs a document-level key interceptor.
    fn add_key_interceptor(&self, handler: KeyHandler) -> Result<ListenerId, Unsupported>;

    /// Suppresses the context menu over the rendered surface.
    fn add_context_menu_blocker(&self) -> Result<ListenerId, Unsupported>;

    /// Subscribes to platform fullscreen changes.
    fn add_fullscreen_observer(
        &self,
        observer: FullscreenObserver,
    ) -> Result<ListenerId, Unsupported>;

    fn remove_listener(&self, id: ListenerId);

    /// Asks the platform to enter or leave fullscreen. The outcome arrives
    /// through the fullscreen observer.
    fn request_fullscreen(&self, enter: bool);
}

/// Fullscreen flag driven by platform notifications, not local intent.
#[derive(Debug, Clone, Default)]
pub struct FullscreenState {
    active: Arc<AtomicBool>,
}

impl FullscreenState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn observer(&self) -> FullscreenObserver {
        let active = self.active.clone();
        Box::new(move |on| active.store(on, Ordering::SeqCst))
    }
}

/// Listeners installed for one mounted viewer. Removes them on drop.
pub struct ListenerScope {
    host: Arc<dyn ViewerHost>,
    ids: Vec<ListenerId>,
}

impl ListenerScope {
    /// Installs the key interceptor for `policy`, the context-menu blocker,
    /// and, when given, a fullscreen observer feeding `fullscreen`.
    pub fn install(
        host: Arc<dyn ViewerHost>,
        policy: ShortcutPolicy,
        fullscreen: Option<&FullscreenState>,
    ) -> Self {
        let mut scope = Self {
            host: host.clone(),
            ids: Vec::new(),
        };

        let handler: KeyHandler = Box::new(move |chord| policy.dispose(chord));
        scope.track("key interceptor", host.add_key_interceptor(handler));
        scope.track("context menu blocker", host.add_context_menu_blocker());
        if let Some(state) = fullscreen {
            scope.track(
                "fullscreen observer",
                host.add_fullscreen_observer(state.observer()),
            );
        }
        scope
    }

    /// Number of listeners currently installed.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn track(&mut self, what: &str, result: Result<ListenerId, Unsupported>) {
        match result {
            Ok(id) => self.ids.push(id),
            Err(e) => warn!("Could not install {what}, continuing without it: {e}"),
        }
    }
}

impl Drop for ListenerScope {
    fn drop(&mut self) {
        for id in self.ids.drain(..) {
            self.host.remove_listener(id);
        }
        debug!("Viewer listeners removed");
    }
}
