//! Overlay engine.
//!
//! Each slide runs its overlays in exactly one of two modes: [`timed`], where
//! every overlay follows its own `showAt`/`hideAt` offsets, or
//! [`sequential`], where overlays are revealed one at a time by clicks,
//! `next` actions and auto-advance timers.

pub mod sequential;
pub mod timed;

use tracing::trace;

use crate::context::AppContext;
use crate::media::Activation;
use crate::slides::{OverlayDef, OverlayKind};
use crate::stage::{OverlayId, OverlayNode};
use crate::teardown::Disposer;

pub use sequential::{Sequence, Step};

/// Put a hidden node for `def` on the stage. Sound overlays have no visible
/// element and are skipped.
pub fn mount(ctx: &mut AppContext, id: OverlayId, def: &OverlayDef) -> bool {
    if def.is_sound() {
        return false;
    }
    let element = match &def.kind {
        OverlayKind::Video {
            src,
            looping,
            muted,
            ..
        } => {
            let element = ctx.media.video(src);
            ctx.media.promote(&element);
            element.rewind();
            element.set_looping(*looping);
            element.configure_muted(*muted);
            ctx.audio.track_video(&element);
            ctx.teardown
                .register(Disposer::release_video(element.clone()));
            Some(element)
        }
        _ => None,
    };
    ctx.stage.insert(OverlayNode {
        id,
        kind: def.kind.clone(),
        rect: def.rect(),
        class_list: def.layout.class_list.clone(),
        visible: false,
        persistent: def.is_persistent(),
        absorbs_clicks: def.absorbs_clicks(),
        action: def.action(),
        element,
    });
    true
}

/// Make the overlay visible. Its audio starts now, and an autoplay video
/// overlay starts playing.
pub fn show(ctx: &mut AppContext, id: OverlayId, def: &OverlayDef, activation: Activation) {
    if ctx.stage.set_visible(id, true) {
        trace!(overlay = id.0, "overlay shown");
        if let OverlayKind::Video { autoplay: true, .. } = def.kind {
            if let Some(element) = ctx.stage.node(id).and_then(|n| n.element.clone()) {
                let _ = element.play(activation);
            }
        }
    }
    ctx.play_overlay_audio(def, activation);
}

pub fn hide(ctx: &mut AppContext, id: OverlayId) {
    if ctx.stage.set_visible(id, false) {
        trace!(overlay = id.0, "overlay hidden");
        if let Some(element) = ctx.stage.node(id).and_then(|n| n.element.as_ref()) {
            element.pause();
        }
    }
}

pub fn unmount(ctx: &mut AppContext, id: OverlayId) {
    if let Some(node) = ctx.stage.remove(id) {
        if let Some(element) = node.element {
            element.pause();
        }
    }
}
