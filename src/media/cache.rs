use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use super::backend::MediaBackend;
use super::element::{ElementId, MediaElement, MediaHandle, MediaKind, Placement, Preload};
use crate::audio::Bus;
use crate::slides::{BaseMedia, OverlayDef, OverlayKind, Slide, SlidesConfig};

/// Session-lifetime cache of media elements keyed by source.
///
/// Asking twice for the same source always yields the same element, so a
/// buffered video survives between visits. Entries are never evicted.
pub struct MediaCache {
    backend: Arc<dyn MediaBackend>,
    videos: HashMap<String, MediaHandle>,
    music: HashMap<String, MediaHandle>,
    sounds: HashMap<String, MediaHandle>,
    by_id: HashMap<ElementId, MediaHandle>,
    images: HashSet<String>,
}

impl MediaCache {
    pub fn new(backend: Arc<dyn MediaBackend>) -> Self {
        Self {
            backend,
            videos: HashMap::new(),
            music: HashMap::new(),
            sounds: HashMap::new(),
            by_id: HashMap::new(),
            images: HashSet::new(),
        }
    }

    /// Fetch-or-create. New videos are parked in the off-screen pool with a
    /// cheap metadata-only preload hint.
    pub fn video(&mut self, src: &str) -> MediaHandle {
        if let Some(existing) = self.videos.get(src) {
            return Arc::clone(existing);
        }
        let element = MediaElement::create(
            MediaKind::Video,
            src,
            Preload::Metadata,
            Arc::clone(&self.backend),
        );
        debug!(element = %element.id(), src, "video element pooled");
        self.videos.insert(src.to_owned(), Arc::clone(&element));
        self.by_id.insert(element.id(), Arc::clone(&element));
        element
    }

    pub fn audio(&mut self, bus: Bus, src: &str) -> MediaHandle {
        let (entries, kind) = match bus {
            Bus::Music => (&mut self.music, MediaKind::Music),
            Bus::Sound => (&mut self.sounds, MediaKind::Sound),
        };
        if let Some(existing) = entries.get(src) {
            return Arc::clone(existing);
        }
        let element = MediaElement::create(kind, src, Preload::Auto, Arc::clone(&self.backend));
        debug!(element = %element.id(), src, ?bus, "audio element created");
        entries.insert(src.to_owned(), Arc::clone(&element));
        self.by_id.insert(element.id(), Arc::clone(&element));
        element
    }

    pub fn find_video(&self, src: &str) -> Option<&MediaHandle> {
        self.videos.get(src)
    }

    pub fn element(&self, id: ElementId) -> Option<&MediaHandle> {
        self.by_id.get(&id)
    }

    /// Move a pooled video onto the stage: drop the preload hint so normal
    /// playback buffering takes over.
    pub fn promote(&self, element: &MediaHandle) {
        element.set_preload(Preload::Unset);
        element.set_placement(Placement::Stage);
    }

    /// Returns `true` when the image had not been requested before.
    pub fn preload_image(&mut self, src: &str) -> bool {
        if src.is_empty() || !self.images.insert(src.to_owned()) {
            return false;
        }
        self.backend.prefetch_image(src);
        true
    }

    pub fn preload_overlay_assets(&mut self, overlays: &[OverlayDef]) {
        for overlay in overlays {
            match &overlay.kind {
                OverlayKind::Image { src, .. } => {
                    self.preload_image(src);
                }
                OverlayKind::Video { src, poster, .. } => {
                    self.video(src);
                    if let Some(poster) = poster {
                        self.preload_image(poster);
                    }
                }
                _ => {}
            }
            for cue in &overlay.layout.music {
                self.audio(Bus::Music, &cue.src);
            }
            for cue in &overlay.layout.sound {
                self.audio(Bus::Sound, &cue.src);
            }
            if let Some(src) = overlay.sound_src() {
                self.audio(Bus::Sound, src);
            }
        }
    }

    /// Primary asset plus overlay assets of a slide about to be shown.
    pub fn preload_slide(&mut self, slide: &Slide) {
        match &slide.base {
            BaseMedia::Image { src, .. } => {
                self.preload_image(src);
            }
            BaseMedia::Video { src, poster, .. } => {
                self.video(src);
                if let Some(poster) = poster {
                    self.preload_image(poster);
                }
            }
        }
        self.preload_overlay_assets(&slide.overlays);
    }

    /// Pool the first video of every path. Returns how many paths had one.
    pub fn warm_first_videos(&mut self, config: &SlidesConfig) -> usize {
        let mut warmed = 0;
        for path in &config.paths {
            let first = path.slides.iter().find_map(|slide| match &slide.base {
                BaseMedia::Video { src, .. } => Some(src.as_str()),
                BaseMedia::Image { .. } => None,
            });
            if let Some(src) = first {
                self.video(src);
                warmed += 1;
            }
        }
        debug!(warmed, "first videos pooled");
        warmed
    }

    pub fn video_count(&self) -> usize {
        self.videos.len()
    }

    pub fn audio_count(&self, bus: Bus) -> usize {
        match bus {
            Bus::Music => self.music.len(),
            Bus::Sound => self.sounds.len(),
        }
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{AutoplayPolicy, HeadlessBackend};

    fn cache() -> MediaCache {
        MediaCache::new(Arc::new(HeadlessBackend::new(AutoplayPolicy::Allow)))
    }

    #[test]
    fn same_source_yields_same_element() {
        let mut cache = cache();
        let a = cache.video("clip.mp4");
        let b = cache.video("clip.mp4");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.video_count(), 1);
        assert_eq!(a.preload(), Preload::Metadata);
        assert_eq!(a.placement(), Placement::Pool);
    }

    #[test]
    fn music_and_sound_caches_are_separate() {
        let mut cache = cache();
        let music = cache.audio(Bus::Music, "a.mp3");
        let sound = cache.audio(Bus::Sound, "a.mp3");
        assert!(!Arc::ptr_eq(&music, &sound));
        assert_eq!(music.kind(), MediaKind::Music);
        assert_eq!(sound.preload(), Preload::Auto);
        assert!(Arc::ptr_eq(&music, &cache.audio(Bus::Music, "a.mp3")));
    }

    #[test]
    fn promote_clears_hint() {
        let mut cache = cache();
        let clip = cache.video("clip.mp4");
        cache.promote(&clip);
        assert_eq!(clip.preload(), Preload::Unset);
        assert_eq!(clip.placement(), Placement::Stage);
        assert!(Arc::ptr_eq(cache.element(clip.id()).unwrap(), &clip));
    }

    #[test]
    fn image_preload_is_deduplicated() {
        let mut cache = cache();
        assert!(cache.preload_image("a.png"));
        assert!(!cache.preload_image("a.png"));
        assert!(!cache.preload_image(""));
        assert_eq!(cache.image_count(), 1);
    }
}
