use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::audio::{AudioDirector, Bus, PlayOptions};
use crate::events::{PlayerEvent, TimerEvent, TimerKind};
use crate::listeners::{Listener, Listeners};
use crate::media::{Activation, MediaCache};
use crate::slides::OverlayDef;
use crate::stage::Stage;
use crate::teardown::{Disposer, DrainReport, TeardownRegistry};
use crate::timers::Timers;

/// Application context: the caches, buses, registries and stage that the
/// renderer and overlay engine work against. Built once at startup.
pub struct AppContext {
    pub media: MediaCache,
    pub audio: AudioDirector,
    pub listeners: Listeners,
    pub teardown: TeardownRegistry,
    pub timers: Timers,
    pub stage: Stage,
    /// Render generation; bumped on every transition.
    pub epoch: u64,
    pub end_freeze_margin: Duration,
}

impl AppContext {
    /// Install a slide-scoped timer.
    pub fn schedule(&mut self, delay: Duration, kind: TimerKind) {
        let disposer = self.timers.schedule(delay, self.epoch, kind);
        self.teardown.register(disposer);
    }

    /// Like [`schedule`](Self::schedule) but also hands back the token so the
    /// caller can cancel early.
    pub fn schedule_cancellable(&mut self, delay: Duration, kind: TimerKind) -> CancellationToken {
        let event = PlayerEvent::Timer(TimerEvent {
            epoch: self.epoch,
            kind,
        });
        let token = self.timers.start(delay, event);
        self.teardown.register(Disposer::cancel(token.clone()));
        token
    }

    /// Install a slide-scoped listener.
    pub fn listen(&mut self, listener: Listener) {
        let disposer = self.listeners.install(listener);
        self.teardown.register(disposer);
    }

    pub fn drain_teardown(&mut self) -> DrainReport {
        self.teardown.drain(&mut self.listeners, &mut self.audio)
    }

    /// Play every music/sound cue an overlay carries.
    pub fn play_overlay_audio(&mut self, overlay: &OverlayDef, activation: Activation) {
        for cue in &overlay.layout.music {
            self.audio
                .play_cue(&mut self.media, Bus::Music, cue, activation);
        }
        for cue in &overlay.layout.sound {
            self.audio
                .play_cue(&mut self.media, Bus::Sound, cue, activation);
        }
        if let Some(src) = overlay.sound_src() {
            self.audio
                .play_sound(&mut self.media, src, PlayOptions::sound(), activation);
        }
    }
}
