//! The slides document: selectable paths, their ordered slides, the base
//! media layer of each slide and the overlays stacked on top of it.
//!
//! The document is JSON, loaded once at boot and immutable afterwards. All
//! time offsets (`duration`, `delay`, `showAt`, `hideAt`) are milliseconds.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde::de::{self, Deserializer};
use serde_json::Value;
use thiserror::Error;

use crate::stage::PercentRect;

/// Fatal boot failures. Any of these keeps the player in `BOOT`.
#[derive(Debug, Error)]
pub enum SlidesError {
    #[error("failed to read slides document {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("slides document is not valid JSON: {0}")]
    Syntax(#[source] serde_json::Error),
    #[error("slides document must be a JSON object")]
    NotAnObject,
    #[error("slides document field `paths` must be an array")]
    PathsNotArray,
    #[error("malformed slides document: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("paths[{path}].slides[{slide}]: {reason}")]
    InvalidSlide {
        path: usize,
        slide: usize,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlidesConfig {
    pub paths: Vec<SlidePath>,
}

/// One selectable branch of the experience. Identified by its index.
#[derive(Debug, Clone, Deserialize)]
pub struct SlidePath {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub slides: Vec<Slide>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    pub base: BaseMedia,
    #[serde(default)]
    pub overlays: Vec<OverlayDef>,
    #[serde(default)]
    pub advance: Advance,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub preload_next: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Advance {
    #[default]
    Click,
    Timer,
    VideoEnd,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BaseMedia {
    Image {
        src: String,
        #[serde(default)]
        alt: String,
    },
    Video {
        src: String,
        #[serde(default)]
        poster: Option<String>,
        #[serde(default)]
        muted: bool,
        #[serde(default)]
        controls: bool,
        #[serde(default)]
        caption: Option<String>,
    },
}

impl BaseMedia {
    pub fn src(&self) -> &str {
        match self {
            Self::Image { src, .. } | Self::Video { src, .. } => src,
        }
    }

    pub fn is_video(&self) -> bool {
        matches!(self, Self::Video { .. })
    }
}

/// An overlay: shared layout/timing fields plus the variant payload.
#[derive(Debug, Clone, Deserialize)]
pub struct OverlayDef {
    #[serde(flatten)]
    pub layout: OverlayLayout,
    #[serde(flatten)]
    pub kind: OverlayKind,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OverlayLayout {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub w: Option<f32>,
    pub h: Option<f32>,
    #[serde(deserialize_with = "class_list")]
    pub class_list: Vec<String>,
    pub persistent: bool,
    pub delay: Option<f64>,
    pub auto_advance: bool,
    pub show_at: Option<f64>,
    pub hide_at: Option<f64>,
    pub music: Vec<AudioCue>,
    pub sound: Vec<AudioCue>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OverlayKind {
    Text {
        #[serde(default)]
        html: String,
    },
    Image {
        src: String,
        #[serde(default)]
        alt: String,
    },
    #[serde(rename_all = "camelCase")]
    Button {
        #[serde(default)]
        text: String,
        #[serde(default)]
        action: Option<OverlayAction>,
        #[serde(default)]
        aria_label: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Hotspot {
        #[serde(default)]
        action: Option<OverlayAction>,
        #[serde(default)]
        aria_label: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Video {
        src: String,
        #[serde(default, rename = "loop")]
        looping: bool,
        #[serde(default)]
        autoplay: bool,
        #[serde(default)]
        muted: bool,
        #[serde(default)]
        poster: Option<String>,
        #[serde(default)]
        play_label: Option<String>,
    },
    Sound {
        #[serde(default)]
        src: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayAction {
    Next,
    Skip,
}

/// A music or sound-effect request attached to an overlay.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioCue {
    pub src: String,
    #[serde(default)]
    pub stop_others: Option<bool>,
    #[serde(default, rename = "loop", alias = "loops")]
    pub looping: bool,
}

impl SlidesConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SlidesError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| SlidesError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Structural checks first so the boot error names the actual problem,
    /// then the typed decode, then per-slide invariants.
    pub fn from_json_str(raw: &str) -> Result<Self, SlidesError> {
        let value: Value = serde_json::from_str(raw).map_err(SlidesError::Syntax)?;
        let Some(object) = value.as_object() else {
            return Err(SlidesError::NotAnObject);
        };
        if !object.get("paths").is_some_and(Value::is_array) {
            return Err(SlidesError::PathsNotArray);
        }
        let config: Self = serde_json::from_value(value).map_err(SlidesError::Malformed)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SlidesError> {
        for (path_idx, path) in self.paths.iter().enumerate() {
            for (slide_idx, slide) in path.slides.iter().enumerate() {
                slide
                    .check()
                    .map_err(|reason| SlidesError::InvalidSlide {
                        path: path_idx,
                        slide: slide_idx,
                        reason,
                    })?;
            }
        }
        Ok(())
    }

    pub fn path(&self, index: usize) -> Option<&SlidePath> {
        self.paths.get(index)
    }

    pub fn slide(&self, path: usize, slide: usize) -> Option<&Slide> {
        self.paths.get(path)?.slides.get(slide)
    }
}

impl Slide {
    fn check(&self) -> Result<(), &'static str> {
        match self.advance {
            Advance::Timer => match self.duration {
                Some(ms) if ms.is_finite() && ms >= 0.0 => {}
                _ => return Err("advance \"timer\" requires a non-negative duration"),
            },
            Advance::VideoEnd if !self.base.is_video() => {
                return Err("advance \"video-end\" requires a video base");
            }
            _ => {}
        }
        Ok(())
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration.and_then(millis)
    }

    /// Preloading of the following slide is on unless explicitly disabled.
    pub fn preloads_next(&self) -> bool {
        self.preload_next != Some(false)
    }

    /// Click-advanced slides with overlays run them as a click-driven sequence.
    pub fn uses_sequential_overlays(&self) -> bool {
        self.advance == Advance::Click && !self.overlays.is_empty()
    }
}

impl OverlayDef {
    pub fn is_sound(&self) -> bool {
        matches!(self.kind, OverlayKind::Sound { .. })
    }

    pub fn is_persistent(&self) -> bool {
        self.layout.persistent
    }

    /// Only strictly positive delays count.
    pub fn delay(&self) -> Option<Duration> {
        self.layout
            .delay
            .filter(|ms| *ms > 0.0)
            .and_then(millis)
    }

    pub fn show_at(&self) -> Option<Duration> {
        self.layout.show_at.and_then(millis)
    }

    pub fn hide_at(&self) -> Option<Duration> {
        self.layout.hide_at.and_then(millis)
    }

    pub fn rect(&self) -> PercentRect {
        PercentRect {
            x: self.layout.x,
            y: self.layout.y,
            w: self.layout.w,
            h: self.layout.h,
        }
    }

    pub fn action(&self) -> Option<OverlayAction> {
        match &self.kind {
            OverlayKind::Button { action, .. } | OverlayKind::Hotspot { action, .. } => *action,
            _ => None,
        }
    }

    /// Buttons, hotspots and videos own their clicks; text and images let
    /// them fall through to the stage.
    pub fn absorbs_clicks(&self) -> bool {
        matches!(
            self.kind,
            OverlayKind::Button { .. } | OverlayKind::Hotspot { .. } | OverlayKind::Video { .. }
        )
    }

    /// A `sound` overlay may name its effect directly via `src`.
    pub fn sound_src(&self) -> Option<&str> {
        match &self.kind {
            OverlayKind::Sound { src } => src.as_deref(),
            _ => None,
        }
    }
}

fn millis(ms: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(ms / 1000.0).ok()
}

fn class_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Classes {
        Joined(String),
        Listed(Vec<String>),
    }

    match Classes::deserialize(deserializer) {
        Ok(Classes::Joined(raw)) => Ok(raw.split_whitespace().map(str::to_owned).collect()),
        Ok(Classes::Listed(list)) => Ok(list),
        Err(_) => Err(de::Error::custom(
            "classList must be a string or an array of strings",
        )),
    }
}
