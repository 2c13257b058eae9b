//! Music and sound-effect buses plus the single on/off control shared with
//! video.

use std::sync::Arc;

use tracing::{debug, info};

use crate::media::{Activation, ElementId, MediaCache, MediaHandle, PlayAttempt};
use crate::slides::AudioCue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bus {
    /// One track at a time, normally.
    Music,
    /// Overlapping effects.
    Sound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayOptions {
    pub stop_others: bool,
    pub looping: bool,
}

impl PlayOptions {
    pub fn music() -> Self {
        Self {
            stop_others: true,
            looping: false,
        }
    }

    pub fn sound() -> Self {
        Self {
            stop_others: false,
            looping: false,
        }
    }

    pub fn for_bus(bus: Bus) -> Self {
        match bus {
            Bus::Music => Self::music(),
            Bus::Sound => Self::sound(),
        }
    }

    pub fn for_cue(bus: Bus, cue: &AudioCue) -> Self {
        let defaults = Self::for_bus(bus);
        Self {
            stop_others: cue.stop_others.unwrap_or(defaults.stop_others),
            looping: cue.looping,
        }
    }

    pub fn looping(mut self) -> Self {
        self.looping = true;
        self
    }
}

/// A started (or refused) play request.
#[derive(Debug, Clone)]
pub struct Playing {
    pub element: MediaHandle,
    pub attempt: PlayAttempt,
}

#[derive(Debug)]
pub struct AudioDirector {
    music_enabled: bool,
    sound_enabled: bool,
    active_music: Vec<MediaHandle>,
    active_sound: Vec<MediaHandle>,
    active_video: Vec<MediaHandle>,
    /// Audio paused by the global toggle, resumed when it flips back on.
    held: Vec<ElementId>,
}

impl Default for AudioDirector {
    fn default() -> Self {
        Self::new(true, true)
    }
}

impl AudioDirector {
    pub fn new(music_enabled: bool, sound_enabled: bool) -> Self {
        Self {
            music_enabled,
            sound_enabled,
            active_music: Vec::new(),
            active_sound: Vec::new(),
            active_video: Vec::new(),
            held: Vec::new(),
        }
    }

    pub fn is_enabled(&self, bus: Bus) -> bool {
        match bus {
            Bus::Music => self.music_enabled,
            Bus::Sound => self.sound_enabled,
        }
    }

    pub fn music_enabled(&self) -> bool {
        self.music_enabled
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    /// The user-facing switch reads "on" while either bus is enabled.
    pub fn audio_enabled(&self) -> bool {
        self.music_enabled || self.sound_enabled
    }

    pub fn active(&self, bus: Bus) -> &[MediaHandle] {
        match bus {
            Bus::Music => &self.active_music,
            Bus::Sound => &self.active_sound,
        }
    }

    pub fn active_videos(&self) -> &[MediaHandle] {
        &self.active_video
    }

    fn active_mut(&mut self, bus: Bus) -> &mut Vec<MediaHandle> {
        match bus {
            Bus::Music => &mut self.active_music,
            Bus::Sound => &mut self.active_sound,
        }
    }

    /// Start `src` on `bus`. Returns `None` while the bus is disabled.
    pub fn play(
        &mut self,
        media: &mut MediaCache,
        bus: Bus,
        src: &str,
        options: PlayOptions,
        activation: Activation,
    ) -> Option<Playing> {
        if !self.is_enabled(bus) {
            debug!(?bus, src, "bus disabled; play ignored");
            return None;
        }
        let element = media.audio(bus, src);
        if options.stop_others {
            self.stop_others(bus, &element);
        }
        element.set_looping(options.looping);

        let active = self.active(bus).iter().any(|e| Arc::ptr_eq(e, &element));
        if bus == Bus::Music && active && !element.is_paused() {
            return Some(Playing {
                element,
                attempt: PlayAttempt::Started,
            });
        }

        element.rewind();
        let attempt = element.play(activation);
        if !attempt.started() {
            debug!(?bus, src, "audio playback blocked");
        }
        if !active {
            self.active_mut(bus).push(Arc::clone(&element));
        }
        Some(Playing { element, attempt })
    }

    pub fn play_music(
        &mut self,
        media: &mut MediaCache,
        src: &str,
        options: PlayOptions,
        activation: Activation,
    ) -> Option<Playing> {
        self.play(media, Bus::Music, src, options, activation)
    }

    pub fn play_sound(
        &mut self,
        media: &mut MediaCache,
        src: &str,
        options: PlayOptions,
        activation: Activation,
    ) -> Option<Playing> {
        self.play(media, Bus::Sound, src, options, activation)
    }

    pub fn play_cue(
        &mut self,
        media: &mut MediaCache,
        bus: Bus,
        cue: &AudioCue,
        activation: Activation,
    ) -> Option<Playing> {
        self.play(media, bus, &cue.src, PlayOptions::for_cue(bus, cue), activation)
    }

    /// Pause keeps position and membership so `resume` can pick it up.
    pub fn pause(&mut self, bus: Bus, src: &str) -> bool {
        match self.active(bus).iter().find(|e| e.src() == src) {
            Some(element) => {
                element.pause();
                true
            }
            None => false,
        }
    }

    /// Resume the first paused member of the bus.
    pub fn resume(&mut self, bus: Bus, activation: Activation) -> Option<Playing> {
        if !self.is_enabled(bus) {
            return None;
        }
        let element = self
            .active(bus)
            .iter()
            .find(|e| e.is_paused())
            .map(Arc::clone)?;
        let attempt = element.play(activation);
        Some(Playing { element, attempt })
    }

    /// Stop resets position and drops membership.
    pub fn stop(&mut self, bus: Bus, src: &str) -> bool {
        let active = self.active_mut(bus);
        let Some(index) = active.iter().position(|e| e.src() == src) else {
            return false;
        };
        let element = active.remove(index);
        halt(&element);
        self.held.retain(|id| *id != element.id());
        true
    }

    pub fn stop_bus(&mut self, bus: Bus) {
        let stopped = std::mem::take(self.active_mut(bus));
        for element in &stopped {
            halt(element);
            self.held.retain(|id| *id != element.id());
        }
        if !stopped.is_empty() {
            debug!(?bus, count = stopped.len(), "bus stopped");
        }
    }

    pub fn stop_all(&mut self) {
        self.stop_bus(Bus::Music);
        self.stop_bus(Bus::Sound);
    }

    fn stop_others(&mut self, bus: Bus, keep: &MediaHandle) {
        let active = self.active_mut(bus);
        let (kept, stopped): (Vec<_>, Vec<_>) =
            active.drain(..).partition(|e| Arc::ptr_eq(e, keep));
        *active = kept;
        for element in &stopped {
            halt(element);
            self.held.retain(|id| *id != element.id());
        }
    }

    /// Start tracking a video for the global mute.
    pub fn track_video(&mut self, element: &MediaHandle) {
        if !self.active_video.iter().any(|e| Arc::ptr_eq(e, element)) {
            self.active_video.push(Arc::clone(element));
        }
        if !self.audio_enabled() {
            element.set_muted(true);
        }
    }

    pub fn release_video(&mut self, element: &MediaHandle) {
        self.active_video.retain(|e| !Arc::ptr_eq(e, element));
    }

    /// Flip both buses together, carrying active audio and videos along.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.music_enabled = enabled;
        self.sound_enabled = enabled;
        if enabled {
            let held = std::mem::take(&mut self.held);
            for element in self.active_music.iter().chain(self.active_sound.iter()) {
                if held.contains(&element.id()) {
                    let _ = element.play(Activation::Gesture);
                }
            }
            for video in &self.active_video {
                video.set_muted(video.default_muted());
            }
        } else {
            for element in self.active_music.iter().chain(self.active_sound.iter()) {
                if !element.is_paused() {
                    element.pause();
                    self.held.push(element.id());
                }
            }
            for video in &self.active_video {
                video.set_muted(true);
            }
        }
        info!(enabled, "audio toggled");
    }

    pub fn toggle(&mut self) -> bool {
        let enabled = !self.audio_enabled();
        self.set_enabled(enabled);
        enabled
    }
}

fn halt(element: &MediaHandle) {
    element.pause();
    element.rewind();
}
