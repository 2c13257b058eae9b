use tokio::sync::mpsc;

use crate::media::ElementId;
use crate::stage::OverlayId;

/// Capacity of the player's event channel (inputs, timers, media clock).
const EVENT_CHANNEL_CAPACITY: usize = 256;

pub type EventSender = mpsc::Sender<PlayerEvent>;
pub type EventReceiver = mpsc::Receiver<PlayerEvent>;

pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::channel(EVENT_CHANNEL_CAPACITY)
}

/// Everything the run loop reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    Input(Input),
    Timer(TimerEvent),
    Media(MediaEvent),
    /// Eager preload of every path's first video, shortly after boot.
    Warmup,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    SelectPath(usize),
    StageClick,
    /// Click on an overlay element. Never falls through to the stage when the
    /// overlay owns its clicks.
    OverlayClick(OverlayId),
    Key {
        key: Key,
        in_text_input: bool,
    },
    ToggleAudio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Space,
    Enter,
    ArrowRight,
    Char(char),
}

impl Input {
    pub fn key(key: Key) -> Self {
        Self::Key {
            key,
            in_text_input: false,
        }
    }
}

impl From<Input> for PlayerEvent {
    fn from(input: Input) -> Self {
        Self::Input(input)
    }
}

impl From<MediaEvent> for PlayerEvent {
    fn from(event: MediaEvent) -> Self {
        Self::Media(event)
    }
}

/// A timer firing. `epoch` is the render generation that installed it;
/// events from an older generation are stale and dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct TimerEvent {
    pub epoch: u64,
    pub kind: TimerKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    SlideAdvance,
    ShowOverlay(OverlayId),
    HideOverlay(OverlayId),
    OverlayAudio(OverlayId),
    RevealStep { cursor: usize },
    AutoAdvanceStep { cursor: usize },
}

/// Reports from the media backend's playback clock.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    TimeUpdate {
        element: ElementId,
        position: f64,
        duration: f64,
    },
    Ended {
        element: ElementId,
    },
}
