//! Navigation state machine.
//!
//! `BOOT -> SPLASH <-> RUNNING(path, slide)`. Every transition goes through
//! [`Player::set_state`]: drain the teardown registry, swap in the new mode,
//! redraw from scratch. Transitions made inside a click or key press carry
//! [`Activation::Gesture`] into the redraw; timers and media events do not.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::audio::{AudioDirector, Bus, PlayOptions};
use crate::config::Configuration;
use crate::context::AppContext;
use crate::events::{
    EventReceiver, EventSender, Input, Key, MediaEvent, PlayerEvent, TimerEvent, TimerKind,
};
use crate::listeners::{ClickRoute, Listeners};
use crate::media::{Activation, MediaBackend, MediaCache, MediaHandle, PlayAttempt};
use crate::overlay::{self, Sequence, Step};
use crate::render;
use crate::slides::{OverlayAction, OverlayDef, OverlayKind, Slide, SlidesConfig, SlidesError};
use crate::stage::{OverlayId, Screen, SplashButton, Stage, View};
use crate::surface::{MountError, Surface};
use crate::teardown::TeardownRegistry;
use crate::timers::Timers;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Boot,
    Splash,
    /// Indices exist only while running.
    Running { path: usize, slide: usize },
}

/// The single mutable application record. `mode` is replaced only by
/// [`Player::set_state`].
#[derive(Debug)]
pub struct ApplicationState {
    pub mode: Mode,
    pub config: Option<Arc<SlidesConfig>>,
    pub boot_error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PlayerSettings {
    pub warmup_delay: Duration,
    pub end_freeze_margin: Duration,
    pub music_enabled: bool,
    pub sound_enabled: bool,
    pub splash_music: Option<String>,
    pub select_sound: Option<String>,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self::from(&Configuration::default())
    }
}

impl From<&Configuration> for PlayerSettings {
    fn from(cfg: &Configuration) -> Self {
        Self {
            warmup_delay: cfg.warmup_delay,
            end_freeze_margin: cfg.end_freeze_margin,
            music_enabled: cfg.audio.music_enabled,
            sound_enabled: cfg.audio.sound_enabled,
            splash_music: cfg.audio.splash_music.clone(),
            select_sound: cfg.audio.select_sound.clone(),
        }
    }
}

/// Work deferred to the next animation frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameTask {
    Advance { epoch: u64 },
}

pub struct Player {
    state: ApplicationState,
    ctx: AppContext,
    surface: Box<dyn Surface>,
    settings: PlayerSettings,
    splash: Vec<SplashButton>,
    sequence: Option<Sequence>,
    frames: VecDeque<FrameTask>,
    warmup: Option<CancellationToken>,
    to_self: EventSender,
    events: EventReceiver,
}

impl Player {
    pub fn new(
        settings: PlayerSettings,
        backend: Arc<dyn MediaBackend>,
        surface: Box<dyn Surface>,
        to_self: EventSender,
        events: EventReceiver,
    ) -> Result<Self, MountError> {
        surface.require_mounts()?;
        let ctx = AppContext {
            media: MediaCache::new(backend),
            audio: AudioDirector::new(settings.music_enabled, settings.sound_enabled),
            listeners: Listeners::default(),
            teardown: TeardownRegistry::default(),
            timers: Timers::new(to_self.clone()),
            stage: Stage::default(),
            epoch: 0,
            end_freeze_margin: settings.end_freeze_margin,
        };
        Ok(Self {
            state: ApplicationState {
                mode: Mode::Boot,
                config: None,
                boot_error: None,
            },
            ctx,
            surface,
            settings,
            splash: Vec::new(),
            sequence: None,
            frames: VecDeque::new(),
            warmup: None,
            to_self,
            events,
        })
    }

    /// Leave `BOOT` with a loaded document, or stay there showing the error.
    pub fn boot(&mut self, loaded: Result<SlidesConfig, SlidesError>) -> Result<(), SlidesError> {
        match loaded {
            Ok(config) => {
                info!(paths = config.paths.len(), "slides loaded");
                self.splash = config
                    .paths
                    .iter()
                    .enumerate()
                    .map(|(index, path)| SplashButton {
                        index,
                        title: path.title.clone(),
                        image: path.image.clone(),
                    })
                    .collect();
                for button in &self.splash {
                    self.ctx.media.preload_image(&button.image);
                }
                self.state.config = Some(Arc::new(config));
                self.set_state(Mode::Splash, Activation::Programmatic);
                self.warmup = Some(
                    self.ctx
                        .timers
                        .start(self.settings.warmup_delay, PlayerEvent::Warmup),
                );
                Ok(())
            }
            Err(err) => {
                error!("boot failed: {err}");
                self.state.boot_error = Some(err.to_string());
                self.present();
                Err(err)
            }
        }
    }

    pub fn sender(&self) -> EventSender {
        self.to_self.clone()
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn state(&self) -> &ApplicationState {
        &self.state
    }

    pub fn stage(&self) -> &Stage {
        &self.ctx.stage
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    pub fn media(&mut self) -> &mut MediaCache {
        &mut self.ctx.media
    }

    pub fn audio(&self) -> &AudioDirector {
        &self.ctx.audio
    }

    pub fn sequence(&self) -> Option<&Sequence> {
        self.sequence.as_ref()
    }

    pub fn splash_buttons(&self) -> &[SplashButton] {
        &self.splash
    }

    pub fn screen(&self) -> Screen {
        match (self.state.mode, &self.state.boot_error) {
            (Mode::Boot, Some(message)) => Screen::Failed(message.clone()),
            (Mode::Boot, None) => Screen::Boot,
            (Mode::Splash, _) => Screen::Splash,
            (Mode::Running { path, slide }, _) => Screen::Running { path, slide },
        }
    }

    /// The transition function: drain, swap, redraw.
    pub fn set_state(&mut self, mode: Mode, activation: Activation) {
        let drained = self.ctx.drain_teardown();
        self.sequence = None;
        let from = self.state.mode;
        self.state.mode = mode;
        self.ctx.epoch += 1;
        info!(
            ?from,
            to = ?mode,
            teardown = drained.ran,
            teardown_failed = drained.failed,
            ?activation,
            "state transition"
        );
        self.render(activation);
    }

    fn render(&mut self, activation: Activation) {
        match self.state.mode {
            Mode::Boot => self.ctx.stage.clear(),
            Mode::Splash => {
                self.ctx.stage.clear();
                if let Some(src) = &self.settings.splash_music {
                    self.ctx.audio.play_music(
                        &mut self.ctx.media,
                        src,
                        PlayOptions::music().looping(),
                        activation,
                    );
                }
            }
            Mode::Running { path, slide } => {
                let Some(config) = self.state.config.clone() else {
                    return;
                };
                match render::render_slide(&mut self.ctx, &config, path, slide, activation) {
                    Some(rendered) => self.sequence = rendered.sequence,
                    None => warn!(path, slide, "no such slide"),
                }
            }
        }
        self.present();
    }

    fn present(&mut self) {
        let view = View {
            screen: self.screen(),
            splash: &self.splash,
            stage: &self.ctx.stage,
        };
        self.surface.present(&view);
    }

    fn current_slide(&self) -> Option<(Arc<SlidesConfig>, usize, usize)> {
        let Mode::Running { path, slide } = self.state.mode else {
            return None;
        };
        let config = self.state.config.clone()?;
        Some((config, path, slide))
    }

    fn next_mode(&self) -> Option<Mode> {
        let (config, path, slide) = self.current_slide()?;
        let total = config.path(path)?.slides.len();
        if slide + 1 < total {
            Some(Mode::Running {
                path,
                slide: slide + 1,
            })
        } else {
            Some(Mode::Splash)
        }
    }

    pub fn select_path(&mut self, index: usize) {
        let Some(config) = self.state.config.clone() else {
            return;
        };
        match config.path(index) {
            Some(path) if !path.slides.is_empty() => {}
            Some(_) => {
                warn!(path = index, "path has no slides; selection ignored");
                return;
            }
            None => {
                warn!(path = index, "no such path");
                return;
            }
        }
        if let Some(src) = &self.settings.select_sound {
            self.ctx.audio.play_sound(
                &mut self.ctx.media,
                src,
                PlayOptions::sound(),
                Activation::Gesture,
            );
        }
        self.ctx.audio.stop_bus(Bus::Music);
        self.set_state(
            Mode::Running {
                path: index,
                slide: 0,
            },
            Activation::Gesture,
        );
    }

    /// Escape. Splash music restarts inside the key press.
    pub fn return_to_splash(&mut self) {
        if self.state.config.is_none() {
            return;
        }
        self.set_state(Mode::Splash, Activation::Gesture);
    }

    /// Deferred advance: the index update happens on the next frame.
    pub fn move_to_next_slide(&mut self) {
        if matches!(self.state.mode, Mode::Running { .. }) {
            self.frames.push_back(FrameTask::Advance {
                epoch: self.ctx.epoch,
            });
        }
    }

    /// Gesture advance: transition synchronously, then start the new base
    /// video while still inside the gesture.
    pub fn go_to_next_slide_from_user_gesture(&mut self) {
        let Some(next) = self.next_mode() else {
            return;
        };
        self.set_state(next, Activation::Gesture);
        self.attempt_base_playback(Activation::Gesture);
    }

    /// Try to start the staged base video. `None` when there is none.
    pub fn attempt_base_playback(&mut self, activation: Activation) -> Option<PlayAttempt> {
        let element = self.ctx.stage.base_video()?.clone();
        let attempt = element.play(activation);
        self.ctx.stage.set_playback_blocked(!attempt.started());
        if !attempt.started() {
            debug!(src = element.src(), ?activation, "base video still blocked");
        }
        Some(attempt)
    }

    pub fn toggle_audio(&mut self) -> bool {
        self.ctx.audio.toggle()
    }

    /// Run everything queued for this frame.
    pub fn on_frame(&mut self) {
        let tasks = std::mem::take(&mut self.frames);
        for task in tasks {
            match task {
                FrameTask::Advance { epoch } if epoch == self.ctx.epoch => {
                    if let Some(next) = self.next_mode() {
                        self.set_state(next, Activation::Programmatic);
                    }
                }
                FrameTask::Advance { epoch } => {
                    debug!(epoch, current = self.ctx.epoch, "stale frame advance dropped");
                }
            }
        }
    }

    /// Handle every event already waiting on the channel.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events.try_recv() {
            self.dispatch(event);
            handled += 1;
        }
        handled
    }

    pub fn dispatch(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::Input(input) => self.on_input(input),
            PlayerEvent::Timer(timer) => self.on_timer(timer),
            PlayerEvent::Media(media) => self.on_media(media),
            PlayerEvent::Warmup => {
                if let Some(config) = self.state.config.clone() {
                    self.ctx.media.warm_first_videos(&config);
                }
            }
        }
    }

    fn on_input(&mut self, input: Input) {
        match input {
            Input::SelectPath(index) => {
                if self.state.mode == Mode::Splash {
                    self.select_path(index);
                }
            }
            Input::StageClick => self.on_stage_click(),
            Input::OverlayClick(id) => self.on_overlay_click(id),
            Input::Key { key, in_text_input } => self.on_key(key, in_text_input),
            Input::ToggleAudio => {
                self.toggle_audio();
            }
        }
    }

    fn on_key(&mut self, key: Key, in_text_input: bool) {
        match key {
            Key::Escape => self.return_to_splash(),
            Key::Space | Key::Enter | Key::ArrowRight => {
                if !in_text_input && matches!(self.state.mode, Mode::Running { .. }) {
                    self.go_to_next_slide_from_user_gesture();
                }
            }
            Key::Char('m' | 'M') if !in_text_input => {
                self.toggle_audio();
            }
            Key::Char(_) => {}
        }
    }

    fn on_stage_click(&mut self) {
        if !matches!(self.state.mode, Mode::Running { .. }) {
            return;
        }
        match self.ctx.listeners.stage_click() {
            Some(ClickRoute::AdvanceSlide) => self.go_to_next_slide_from_user_gesture(),
            Some(ClickRoute::AdvanceSequence) => self.advance_sequence(),
            None => {}
        }
    }

    fn on_overlay_click(&mut self, id: OverlayId) {
        let Some(node) = self.ctx.stage.node(id) else {
            return;
        };
        // A hidden overlay is not hit; the click lands on the stage.
        if !node.visible || !node.absorbs_clicks {
            self.on_stage_click();
            return;
        }
        let is_video = matches!(node.kind, OverlayKind::Video { .. });
        let action = node.action;
        let element = node.element.clone();
        match (is_video, action, element) {
            (true, _, Some(element)) => toggle_playback(&element),
            (_, Some(OverlayAction::Next), _) => {
                if self.sequence.is_some() {
                    self.advance_sequence();
                } else {
                    self.go_to_next_slide_from_user_gesture();
                }
            }
            (_, Some(OverlayAction::Skip), _) => self.go_to_next_slide_from_user_gesture(),
            _ => {}
        }
    }

    /// Stage click or `next` action.
    fn advance_sequence(&mut self) {
        let Some((config, path, slide)) = self.current_slide() else {
            return;
        };
        let Some(mut sequence) = self.sequence.take() else {
            return;
        };
        let overlays = slide_overlays(&config, path, slide);
        let step = sequence.advance(&mut self.ctx, overlays, Activation::Gesture);
        self.sequence = Some(sequence);
        if step == Step::Exhausted {
            self.go_to_next_slide_from_user_gesture();
        }
    }

    fn on_timer(&mut self, timer: TimerEvent) {
        if timer.epoch != self.ctx.epoch {
            debug!(?timer, current = self.ctx.epoch, "stale timer dropped");
            return;
        }
        let Some((config, path, slide)) = self.current_slide() else {
            return;
        };
        let overlays = slide_overlays(&config, path, slide);
        match timer.kind {
            TimerKind::SlideAdvance => self.move_to_next_slide(),
            TimerKind::ShowOverlay(id) => overlay::timed::on_show(&mut self.ctx, overlays, id),
            TimerKind::HideOverlay(id) => overlay::timed::on_hide(&mut self.ctx, id),
            TimerKind::OverlayAudio(id) => overlay::timed::on_audio(&mut self.ctx, overlays, id),
            TimerKind::RevealStep { cursor } => {
                if let Some(sequence) = self.sequence.as_mut() {
                    sequence.on_reveal(&mut self.ctx, overlays, cursor);
                }
            }
            TimerKind::AutoAdvanceStep { cursor } => {
                let step = match self.sequence.as_mut() {
                    Some(sequence) => sequence.on_auto_advance(&mut self.ctx, overlays, cursor),
                    None => Step::Ignored,
                };
                // Not inside a gesture, so the slide change waits for a frame.
                if step == Step::Exhausted {
                    self.move_to_next_slide();
                }
            }
        }
    }

    fn on_media(&mut self, event: MediaEvent) {
        match event {
            MediaEvent::TimeUpdate {
                element,
                position,
                duration,
            } => {
                let Some(handle) = self.ctx.media.element(element).cloned() else {
                    return;
                };
                handle.sync_time(position, duration);
                if let Some((listener, margin)) = self.ctx.listeners.end_freeze(element) {
                    if duration - position <= margin {
                        handle.pause();
                        handle.seek((duration - margin).max(0.0));
                        self.ctx.listeners.remove(listener);
                        debug!(src = handle.src(), position, "video frozen before end");
                    }
                }
            }
            MediaEvent::Ended { element } => {
                if let Some(handle) = self.ctx.media.element(element) {
                    handle.mark_ended();
                }
                if self.ctx.listeners.wants_video_end(element) {
                    self.move_to_next_slide();
                }
            }
        }
    }

    /// Drive the player until cancelled or the channel closes.
    pub async fn run(mut self, cancel: CancellationToken, frame_interval: Duration) -> Result<()> {
        let mut frames = interval(frame_interval);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                maybe_event = self.events.recv() => match maybe_event {
                    Some(event) => self.dispatch(event),
                    None => break,
                },
                _ = frames.tick() => self.on_frame(),
            }
        }
        self.shutdown();
        Ok(())
    }

    pub fn shutdown(&mut self) {
        if let Some(token) = self.warmup.take() {
            token.cancel();
        }
        let drained = self.ctx.drain_teardown();
        self.ctx.audio.stop_all();
        info!(teardown = drained.ran, "player stopped");
    }
}

fn slide_overlays(config: &SlidesConfig, path: usize, slide: usize) -> &[OverlayDef] {
    config
        .slide(path, slide)
        .map(|s: &Slide| s.overlays.as_slice())
        .unwrap_or_default()
}

fn toggle_playback(element: &MediaHandle) {
    if element.is_paused() {
        let _ = element.play(Activation::Gesture);
    } else {
        element.pause();
    }
}
