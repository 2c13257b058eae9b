use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use serde::Deserialize;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::element::{Activation, ElementId, MediaElement, MediaKind, PlayAttempt};
use crate::events::{EventSender, MediaEvent, PlayerEvent};

/// Platform side of media playback: decoding, output and buffering.
///
/// The engine keeps its own model of every element; the backend is told
/// about each change and decides whether playback may start.
pub trait MediaBackend: Send + Sync {
    /// Called on creation and whenever the preload hint changes.
    fn prepare(&self, _element: &MediaElement) {}

    /// Fire-and-forget fetch into the platform image cache.
    fn prefetch_image(&self, _src: &str) {}

    fn play(&self, element: &MediaElement, activation: Activation) -> PlayAttempt;

    fn pause(&self, _element: &MediaElement) {}

    fn seek(&self, _element: &MediaElement, _position: f64) {}

    fn set_muted(&self, _element: &MediaElement, _muted: bool) {}
}

/// When the platform lets media start without a user gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AutoplayPolicy {
    /// Everything may start programmatically.
    Allow,
    /// Muted video may autoplay; anything audible needs a gesture.
    #[default]
    RequireGesture,
    /// Nothing starts outside a gesture.
    Block,
}

impl AutoplayPolicy {
    pub fn permits(self, kind: MediaKind, muted: bool, activation: Activation) -> bool {
        if activation == Activation::Gesture {
            return true;
        }
        match self {
            Self::Allow => true,
            Self::RequireGesture => kind == MediaKind::Video && muted,
            Self::Block => false,
        }
    }
}

/// Simulated playback clock for video elements.
#[derive(Debug, Clone)]
pub struct SimulatedClock {
    pub events: EventSender,
    pub clip_length: Duration,
    pub tick: Duration,
}

/// Backend without real output. Applies an autoplay policy and, when given a
/// clock, reports time updates and clip ends for playing videos.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    policy: AutoplayPolicy,
    clock: Option<SimulatedClock>,
    running: Mutex<HashMap<ElementId, CancellationToken>>,
    prefetched: Mutex<HashSet<String>>,
}

impl HeadlessBackend {
    pub fn new(policy: AutoplayPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn with_clock(mut self, clock: SimulatedClock) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn policy(&self) -> AutoplayPolicy {
        self.policy
    }

    pub fn prefetched_images(&self) -> usize {
        self.prefetched.lock().expect("prefetch set poisoned").len()
    }

    fn stop_clock(&self, id: ElementId) {
        if let Some(token) = self.running.lock().expect("clock map poisoned").remove(&id) {
            token.cancel();
        }
    }

    fn start_clock(&self, element: &MediaElement) {
        let Some(clock) = self.clock.clone() else {
            return;
        };
        if element.kind() != MediaKind::Video {
            return;
        }
        let token = CancellationToken::new();
        if let Some(previous) = self
            .running
            .lock()
            .expect("clock map poisoned")
            .insert(element.id(), token.clone())
        {
            previous.cancel();
        }

        let id = element.id();
        let looping = element.is_looping();
        let total = clock.clip_length.as_secs_f64();
        let step = clock.tick.as_secs_f64();
        let mut position = element.position().min(total);
        tokio::spawn(async move {
            let mut ticker = interval(clock.tick);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        position = (position + step).min(total);
                        let update = MediaEvent::TimeUpdate { element: id, position, duration: total };
                        if clock.events.send(PlayerEvent::Media(update)).await.is_err() {
                            break;
                        }
                        if position >= total {
                            if looping {
                                position = 0.0;
                                continue;
                            }
                            let _ = clock
                                .events
                                .send(PlayerEvent::Media(MediaEvent::Ended { element: id }))
                                .await;
                            break;
                        }
                    }
                }
            }
            trace!(element = %id, "simulated clock stopped");
        });
    }
}

impl MediaBackend for HeadlessBackend {
    fn prepare(&self, element: &MediaElement) {
        trace!(element = %element.id(), src = element.src(), preload = ?element.preload(), "prepare");
    }

    fn prefetch_image(&self, src: &str) {
        if self
            .prefetched
            .lock()
            .expect("prefetch set poisoned")
            .insert(src.to_owned())
        {
            debug!(src, "image prefetch");
        }
    }

    fn play(&self, element: &MediaElement, activation: Activation) -> PlayAttempt {
        if !self
            .policy
            .permits(element.kind(), element.is_muted(), activation)
        {
            debug!(element = %element.id(), src = element.src(), ?activation, "autoplay refused");
            return PlayAttempt::Blocked;
        }
        self.start_clock(element);
        PlayAttempt::Started
    }

    fn pause(&self, element: &MediaElement) {
        self.stop_clock(element.id());
    }

    fn seek(&self, element: &MediaElement, _position: f64) {
        // The clock restarts from the element's position on the next play.
        if !element.is_paused() {
            self.start_clock(element);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gestures_always_pass_the_policy() {
        for policy in [
            AutoplayPolicy::Allow,
            AutoplayPolicy::RequireGesture,
            AutoplayPolicy::Block,
        ] {
            assert!(policy.permits(MediaKind::Sound, false, Activation::Gesture));
        }
    }

    #[test]
    fn require_gesture_lets_only_muted_video_autoplay() {
        let policy = AutoplayPolicy::RequireGesture;
        assert!(policy.permits(MediaKind::Video, true, Activation::Programmatic));
        assert!(!policy.permits(MediaKind::Video, false, Activation::Programmatic));
        assert!(!policy.permits(MediaKind::Music, true, Activation::Programmatic));
        assert!(!AutoplayPolicy::Block.permits(MediaKind::Video, true, Activation::Programmatic));
    }

    #[test]
    fn image_prefetch_is_recorded_once() {
        let backend = HeadlessBackend::new(AutoplayPolicy::Allow);
        backend.prefetch_image("a.png");
        backend.prefetch_image("a.png");
        backend.prefetch_image("b.png");
        assert_eq!(backend.prefetched_images(), 2);
        assert_eq!(backend.policy(), AutoplayPolicy::Allow);
    }
}
