use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

use crate::media::AutoplayPolicy;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Configuration {
    /// JSON slides document. Relative paths resolve against the YAML file.
    pub slides: PathBuf,
    /// Delay after boot before every path's first video is pooled.
    #[serde(with = "humantime_serde")]
    pub warmup_delay: Duration,
    /// Cadence of the animation-frame queue.
    #[serde(with = "humantime_serde")]
    pub frame_interval: Duration,
    /// Remaining time at which a non-advancing base video is frozen.
    #[serde(with = "humantime_serde")]
    pub end_freeze_margin: Duration,
    pub audio: AudioOptions,
    pub headless: HeadlessOptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct AudioOptions {
    pub music_enabled: bool,
    pub sound_enabled: bool,
    /// Looping music played while the splash is up.
    pub splash_music: Option<String>,
    /// Effect played when a path is selected.
    pub select_sound: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct HeadlessOptions {
    pub autoplay: AutoplayPolicy,
    /// Simulate a playback clock so video-end advance works without output.
    pub simulate_clock: bool,
    #[serde(with = "humantime_serde")]
    pub clip_length: Duration,
    #[serde(with = "humantime_serde")]
    pub tick: Duration,
}

impl Configuration {
    const DEFAULT_SLIDES: &'static str = "slides.json";

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut cfg: Self = serde_yaml::from_str(&s)?;
        if cfg.slides.is_relative() {
            if let Some(dir) = path.parent() {
                cfg.slides = dir.join(&cfg.slides);
            }
        }
        Ok(cfg)
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(
            !self.slides.as_os_str().is_empty(),
            "slides must name a JSON document"
        );
        ensure!(
            !self.frame_interval.is_zero(),
            "frame-interval must be greater than zero"
        );
        ensure!(
            self.end_freeze_margin < Duration::from_secs(1),
            "end-freeze-margin must be shorter than one second"
        );
        self.audio.validate()?;
        self.headless.validate()?;
        Ok(self)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            slides: PathBuf::from(Self::DEFAULT_SLIDES),
            warmup_delay: Duration::from_millis(500),
            frame_interval: Duration::from_millis(16),
            end_freeze_margin: Duration::from_millis(50),
            audio: AudioOptions::default(),
            headless: HeadlessOptions::default(),
        }
    }
}

impl AudioOptions {
    fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("splash-music", &self.splash_music),
            ("select-sound", &self.select_sound),
        ] {
            if let Some(src) = value {
                ensure!(
                    !src.trim().is_empty(),
                    "audio.{} must not be blank when provided",
                    field
                );
            }
        }
        Ok(())
    }
}

impl Default for AudioOptions {
    fn default() -> Self {
        Self {
            music_enabled: true,
            sound_enabled: true,
            splash_music: None,
            select_sound: None,
        }
    }
}

impl HeadlessOptions {
    fn validate(&self) -> Result<()> {
        if self.simulate_clock {
            ensure!(!self.tick.is_zero(), "headless.tick must be greater than zero");
            ensure!(
                self.clip_length >= self.tick,
                "headless.clip-length must be at least one tick"
            );
        }
        Ok(())
    }
}

impl Default for HeadlessOptions {
    fn default() -> Self {
        Self {
            autoplay: AutoplayPolicy::default(),
            simulate_clock: true,
            clip_length: Duration::from_secs(10),
            tick: Duration::from_millis(250),
        }
    }
}
