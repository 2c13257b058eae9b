use std::fmt;

use thiserror::Error;
use tracing::{debug, info};

use crate::stage::{BaseLayer, Screen, View};

/// Containers a surface must provide before the player can start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountPoint {
    AppRoot,
    Splash,
    SplashButtons,
    Stage,
    StageContent,
}

impl MountPoint {
    pub const ALL: [Self; 5] = [
        Self::AppRoot,
        Self::Splash,
        Self::SplashButtons,
        Self::Stage,
        Self::StageContent,
    ];
}

impl fmt::Display for MountPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AppRoot => "app root",
            Self::Splash => "splash",
            Self::SplashButtons => "splash buttons",
            Self::Stage => "stage",
            Self::StageContent => "stage content",
        })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MountError {
    #[error("required mount point missing: {0}")]
    Missing(MountPoint),
}

/// Where the player's views end up.
pub trait Surface {
    fn has_mount(&self, point: MountPoint) -> bool;

    fn present(&mut self, view: &View<'_>);

    fn require_mounts(&self) -> Result<(), MountError> {
        match MountPoint::ALL.into_iter().find(|p| !self.has_mount(*p)) {
            Some(point) => Err(MountError::Missing(point)),
            None => Ok(()),
        }
    }
}

/// Surface that only logs what it is asked to draw.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    missing: Vec<MountPoint>,
    presented: u64,
    last_screen: Option<Screen>,
}

impl HeadlessSurface {
    pub fn without(missing: impl IntoIterator<Item = MountPoint>) -> Self {
        Self {
            missing: missing.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn presented(&self) -> u64 {
        self.presented
    }

    pub fn last_screen(&self) -> Option<&Screen> {
        self.last_screen.as_ref()
    }
}

impl Surface for HeadlessSurface {
    fn has_mount(&self, point: MountPoint) -> bool {
        !self.missing.contains(&point)
    }

    fn present(&mut self, view: &View<'_>) {
        self.presented += 1;
        self.last_screen = Some(view.screen.clone());
        match &view.screen {
            Screen::Boot => debug!("booting"),
            Screen::Failed(message) => info!(reason = message.as_str(), "fatal: player halted"),
            Screen::Splash => {
                let titles: Vec<&str> = view.splash.iter().map(|b| b.title.as_str()).collect();
                info!(paths = ?titles, "splash");
            }
            Screen::Running { path, slide } => {
                let base = match view.stage.base() {
                    Some(BaseLayer::Image { src, .. }) => src.as_str(),
                    Some(BaseLayer::Video { element, .. }) => element.src(),
                    None => "",
                };
                let overlays: Vec<usize> =
                    view.stage.visible_overlays().map(|n| n.id.0).collect();
                info!(
                    path,
                    slide,
                    base,
                    counter = view.stage.counter().unwrap_or_default(),
                    ?overlays,
                    blocked = view.stage.playback_blocked(),
                    "stage"
                );
            }
        }
    }
}
