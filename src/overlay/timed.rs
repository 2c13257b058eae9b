use crate::context::AppContext;
use crate::events::TimerKind;
use crate::media::Activation;
use crate::slides::OverlayDef;
use crate::stage::OverlayId;

/// Lay out every overlay on its own clock, independent of the others and of
/// slide advance. Pending show/hide timers are slide-scoped and die with the
/// teardown drain.
pub fn start(ctx: &mut AppContext, overlays: &[OverlayDef], activation: Activation) {
    for (index, def) in overlays.iter().enumerate() {
        let id = OverlayId(index);
        if def.is_sound() {
            match def.show_at() {
                Some(at) => ctx.schedule(at, TimerKind::OverlayAudio(id)),
                None => ctx.play_overlay_audio(def, activation),
            }
            continue;
        }

        super::mount(ctx, id, def);
        match def.show_at() {
            Some(at) => ctx.schedule(at, TimerKind::ShowOverlay(id)),
            None => super::show(ctx, id, def, activation),
        }
        if let Some(at) = def.hide_at() {
            ctx.schedule(at, TimerKind::HideOverlay(id));
        }
    }
}

pub fn on_show(ctx: &mut AppContext, overlays: &[OverlayDef], id: OverlayId) {
    if let Some(def) = overlays.get(id.0) {
        super::show(ctx, id, def, Activation::Programmatic);
    }
}

pub fn on_hide(ctx: &mut AppContext, id: OverlayId) {
    super::hide(ctx, id);
}

pub fn on_audio(ctx: &mut AppContext, overlays: &[OverlayDef], id: OverlayId) {
    if let Some(def) = overlays.get(id.0) {
        ctx.play_overlay_audio(def, Activation::Programmatic);
    }
}
