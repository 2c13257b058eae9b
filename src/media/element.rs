use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::backend::MediaBackend;

static NEXT_ELEMENT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    fn next() -> Self {
        Self(NEXT_ELEMENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "media#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Music,
    Sound,
}

/// Buffering hint handed to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preload {
    /// No hint; the backend buffers as it sees fit for playback.
    #[default]
    Unset,
    Metadata,
    Auto,
}

/// Where a video element currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    /// Parked in the off-screen pool, buffer retained.
    #[default]
    Pool,
    Stage,
}

/// Whether a play request originates inside a genuine user gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Gesture,
    Programmatic,
}

/// Outcome of an attempt to start playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayAttempt {
    Started,
    /// Refused by the platform's autoplay policy; the element stays paused.
    Blocked,
}

impl PlayAttempt {
    pub fn started(self) -> bool {
        self == Self::Started
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub paused: bool,
    pub position: f64,
    pub duration: Option<f64>,
    pub muted: bool,
    /// Mute state the content asked for; restored when global audio returns.
    pub default_muted: bool,
    pub looping: bool,
    pub preload: Preload,
    pub placement: Placement,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            paused: true,
            position: 0.0,
            duration: None,
            muted: false,
            default_muted: false,
            looping: false,
            preload: Preload::Unset,
            placement: Placement::Pool,
        }
    }
}

/// A reusable audio or video element. The media cache owns these; everyone
/// else holds a [`MediaHandle`] and never destroys the element.
pub struct MediaElement {
    id: ElementId,
    kind: MediaKind,
    src: String,
    backend: Arc<dyn MediaBackend>,
    state: Mutex<PlaybackState>,
}

pub type MediaHandle = Arc<MediaElement>;

impl fmt::Debug for MediaElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaElement")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("src", &self.src)
            .field("state", &*self.state())
            .finish()
    }
}

impl MediaElement {
    pub(crate) fn create(
        kind: MediaKind,
        src: &str,
        preload: Preload,
        backend: Arc<dyn MediaBackend>,
    ) -> MediaHandle {
        let element = Arc::new(Self {
            id: ElementId::next(),
            kind,
            src: src.to_owned(),
            backend,
            state: Mutex::new(PlaybackState {
                preload,
                ..PlaybackState::default()
            }),
        });
        element.backend.prepare(&element);
        element
    }

    fn state(&self) -> MutexGuard<'_, PlaybackState> {
        self.state.lock().expect("media element state poisoned")
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn is_paused(&self) -> bool {
        self.state().paused
    }

    pub fn is_muted(&self) -> bool {
        self.state().muted
    }

    pub fn is_looping(&self) -> bool {
        self.state().looping
    }

    pub fn position(&self) -> f64 {
        self.state().position
    }

    pub fn duration(&self) -> Option<f64> {
        self.state().duration
    }

    pub fn preload(&self) -> Preload {
        self.state().preload
    }

    pub fn placement(&self) -> Placement {
        self.state().placement
    }

    pub fn default_muted(&self) -> bool {
        self.state().default_muted
    }

    /// Ask the backend to start playback. The backend sees the element with
    /// its state unlocked, so it may inspect mute/position freely.
    pub fn play(&self, activation: Activation) -> PlayAttempt {
        let attempt = self.backend.play(self, activation);
        if attempt.started() {
            self.state().paused = false;
        }
        attempt
    }

    pub fn pause(&self) {
        self.state().paused = true;
        self.backend.pause(self);
    }

    pub fn seek(&self, position: f64) {
        self.state().position = position.max(0.0);
        self.backend.seek(self, position.max(0.0));
    }

    pub fn rewind(&self) {
        self.seek(0.0);
    }

    pub fn set_muted(&self, muted: bool) {
        {
            let mut state = self.state();
            if state.muted == muted {
                return;
            }
            state.muted = muted;
        }
        self.backend.set_muted(self, muted);
    }

    /// Sets both the current and the content-requested mute state.
    pub fn configure_muted(&self, muted: bool) {
        self.state().default_muted = muted;
        self.set_muted(muted);
    }

    pub fn set_looping(&self, looping: bool) {
        self.state().looping = looping;
    }

    pub fn set_preload(&self, preload: Preload) {
        {
            let mut state = self.state();
            if state.preload == preload {
                return;
            }
            state.preload = preload;
        }
        self.backend.prepare(self);
    }

    pub fn set_placement(&self, placement: Placement) {
        self.state().placement = placement;
    }

    /// Mirror the backend's playback clock.
    pub fn sync_time(&self, position: f64, duration: f64) {
        let mut state = self.state();
        state.position = position;
        if duration.is_finite() && duration > 0.0 {
            state.duration = Some(duration);
        }
    }

    pub fn mark_ended(&self) {
        let mut state = self.state();
        state.paused = true;
        if let Some(duration) = state.duration {
            state.position = duration;
        }
    }
}
