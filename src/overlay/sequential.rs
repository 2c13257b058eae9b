use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::context::AppContext;
use crate::events::TimerKind;
use crate::media::Activation;
use crate::slides::OverlayDef;
use crate::stage::OverlayId;

/// Result of asking the sequence to move on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Advanced,
    /// A pre-show delay is pending; the request was dropped.
    Ignored,
    /// The cursor moved past the last overlay; the slide should advance.
    Exhausted,
}

/// Handle to a running click-driven overlay sequence. Owned by the player
/// for the lifetime of one slide.
#[derive(Debug)]
pub struct Sequence {
    persistent: Vec<OverlayId>,
    steps: Vec<OverlayId>,
    cursor: usize,
    waiting: bool,
    step_timer: Option<CancellationToken>,
}

impl Sequence {
    /// Render persistent overlays, schedule sound overlays, and reveal the
    /// first step.
    pub fn start(ctx: &mut AppContext, overlays: &[OverlayDef], activation: Activation) -> Self {
        let mut persistent = Vec::new();
        let mut steps = Vec::new();
        for (index, def) in overlays.iter().enumerate() {
            let id = OverlayId(index);
            if def.is_sound() {
                match def.delay() {
                    Some(delay) => ctx.schedule(delay, TimerKind::OverlayAudio(id)),
                    None => ctx.play_overlay_audio(def, activation),
                }
            } else if def.is_persistent() {
                super::mount(ctx, id, def);
                super::show(ctx, id, def, activation);
                persistent.push(id);
            } else {
                steps.push(id);
            }
        }

        let mut sequence = Self {
            persistent,
            steps,
            cursor: 0,
            waiting: false,
            step_timer: None,
        };
        if !sequence.steps.is_empty() {
            sequence.enter(ctx, overlays, activation);
        }
        debug!(
            steps = sequence.steps.len(),
            persistent = sequence.persistent.len(),
            "overlay sequence started"
        );
        sequence
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn is_waiting(&self) -> bool {
        self.waiting
    }

    pub fn current(&self) -> Option<OverlayId> {
        self.steps.get(self.cursor).copied()
    }

    pub fn persistent(&self) -> &[OverlayId] {
        &self.persistent
    }

    /// Stage click, `next` action, or auto-advance.
    pub fn advance(
        &mut self,
        ctx: &mut AppContext,
        overlays: &[OverlayDef],
        activation: Activation,
    ) -> Step {
        if self.waiting {
            debug!(cursor = self.cursor, "advance ignored while overlay delay pending");
            return Step::Ignored;
        }
        if self.cursor >= self.steps.len() {
            return Step::Exhausted;
        }
        self.leave(ctx);
        self.cursor += 1;
        if self.cursor >= self.steps.len() {
            return Step::Exhausted;
        }
        self.enter(ctx, overlays, activation);
        Step::Advanced
    }

    /// Pre-show delay for step `cursor` elapsed.
    pub fn on_reveal(&mut self, ctx: &mut AppContext, overlays: &[OverlayDef], cursor: usize) {
        if cursor != self.cursor || !self.waiting {
            return;
        }
        self.waiting = false;
        self.step_timer = None;
        if let Some(id) = self.current() {
            if let Some(def) = overlays.get(id.0) {
                super::show(ctx, id, def, Activation::Programmatic);
            }
        }
    }

    /// Dwell time for step `cursor` elapsed.
    pub fn on_auto_advance(
        &mut self,
        ctx: &mut AppContext,
        overlays: &[OverlayDef],
        cursor: usize,
    ) -> Step {
        if cursor != self.cursor {
            return Step::Ignored;
        }
        self.step_timer = None;
        self.advance(ctx, overlays, Activation::Programmatic)
    }

    fn enter(&mut self, ctx: &mut AppContext, overlays: &[OverlayDef], activation: Activation) {
        let Some(id) = self.current() else {
            return;
        };
        let Some(def) = overlays.get(id.0) else {
            return;
        };
        super::mount(ctx, id, def);
        let cursor = self.cursor;
        match (def.layout.auto_advance, def.delay()) {
            (true, Some(delay)) => {
                super::show(ctx, id, def, activation);
                self.step_timer = Some(
                    ctx.schedule_cancellable(delay, TimerKind::AutoAdvanceStep { cursor }),
                );
            }
            (false, Some(delay)) => {
                self.waiting = true;
                self.step_timer =
                    Some(ctx.schedule_cancellable(delay, TimerKind::RevealStep { cursor }));
            }
            (_, None) => super::show(ctx, id, def, activation),
        }
    }

    fn leave(&mut self, ctx: &mut AppContext) {
        if let Some(token) = self.step_timer.take() {
            token.cancel();
        }
        self.waiting = false;
        if let Some(id) = self.current() {
            super::unmount(ctx, id);
        }
    }
}
