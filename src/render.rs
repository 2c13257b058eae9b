//! Slide renderer: turns the current slide into stage content and wires its
//! advance trigger. Everything it installs goes through the teardown
//! registry.
//!
//! `activation` is how the render was triggered. A render inside a click or
//! key press passes [`Activation::Gesture`] so media started during it keeps
//! the gesture's playback privilege.

use tracing::{debug, trace};

use crate::audio::Bus;
use crate::context::AppContext;
use crate::events::TimerKind;
use crate::listeners::{ClickRoute, Listener};
use crate::media::{Activation, MediaHandle, PlayAttempt};
use crate::overlay::{self, Sequence};
use crate::slides::{Advance, BaseMedia, SlidesConfig};
use crate::stage::BaseLayer;
use crate::teardown::Disposer;

/// What a render leaves behind for the player to hold on to.
#[derive(Debug, Default)]
pub struct RenderedSlide {
    /// Present only in sequential overlay mode.
    pub sequence: Option<Sequence>,
    pub base_video: Option<MediaHandle>,
}

pub fn render_slide(
    ctx: &mut AppContext,
    config: &SlidesConfig,
    path_index: usize,
    slide_index: usize,
    activation: Activation,
) -> Option<RenderedSlide> {
    let path = config.path(path_index)?;
    let slide = path.slides.get(slide_index)?;
    let mut rendered = RenderedSlide::default();

    ctx.stage.clear();

    // Video owns the audio channel while it plays.
    if slide.base.is_video() {
        ctx.audio.stop_bus(Bus::Music);
        ctx.audio.stop_bus(Bus::Sound);
    }

    ctx.media.preload_overlay_assets(&slide.overlays);

    match &slide.base {
        BaseMedia::Image { src, alt } => {
            ctx.media.preload_image(src);
            ctx.stage.set_base(BaseLayer::Image {
                src: src.clone(),
                alt: alt.clone(),
            });
        }
        BaseMedia::Video {
            src,
            poster,
            muted,
            controls,
            caption,
        } => {
            let element = ctx.media.video(src);
            ctx.media.promote(&element);
            element.rewind();
            element.set_looping(false);
            element.configure_muted(*muted);
            ctx.audio.track_video(&element);
            ctx.teardown
                .register(Disposer::release_video(element.clone()));

            if slide.advance != Advance::VideoEnd {
                let margin = ctx.end_freeze_margin.as_secs_f64();
                ctx.listen(Listener::EndFreeze {
                    element: element.id(),
                    margin,
                });
            }

            ctx.stage.set_base(BaseLayer::Video {
                element: element.clone(),
                poster: poster.clone(),
                controls: *controls,
                caption: caption.clone(),
            });
            if element.play(activation) == PlayAttempt::Blocked {
                debug!(src, ?activation, "base video autoplay blocked");
                ctx.stage.set_playback_blocked(true);
            }
            rendered.base_video = Some(element);
        }
    }

    if slide.uses_sequential_overlays() {
        ctx.listen(Listener::StageClick(ClickRoute::AdvanceSequence));
        rendered.sequence = Some(Sequence::start(ctx, &slide.overlays, activation));
    } else {
        match slide.advance {
            Advance::Click => ctx.listen(Listener::StageClick(ClickRoute::AdvanceSlide)),
            Advance::Timer => {
                let delay = slide.duration().unwrap_or_default();
                ctx.schedule(delay, TimerKind::SlideAdvance);
            }
            Advance::VideoEnd => {
                if let Some(element) = &rendered.base_video {
                    ctx.listen(Listener::VideoEnded {
                        element: element.id(),
                    });
                }
            }
        }
        overlay::timed::start(ctx, &slide.overlays, activation);
    }

    ctx.stage.set_counter(slide_index, path.slides.len());
    if slide.preloads_next() {
        if let Some(next) = path.slides.get(slide_index + 1) {
            trace!(next = slide_index + 1, "preloading next slide");
            ctx.media.preload_slide(next);
        }
    }
    ctx.stage.focus();

    debug!(
        path = path_index,
        slide = slide_index,
        advance = ?slide.advance,
        sequential = rendered.sequence.is_some(),
        "slide rendered"
    );
    Some(rendered)
}
