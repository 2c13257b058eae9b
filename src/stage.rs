//! Presentation model handed to a surface: the splash buttons and the stage
//! with its base layer, overlay nodes and slide counter.

use std::fmt::Write as _;

use crate::media::MediaHandle;
use crate::slides::{OverlayAction, OverlayKind};

/// Position of an overlay in its slide's overlay list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayId(pub usize);

/// Percentage box over the stage. Absent edges are unconstrained.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PercentRect {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub w: Option<f32>,
    pub h: Option<f32>,
}

impl PercentRect {
    /// Inline CSS for web-based surfaces, e.g. `left:10%;top:20%;width:30%`.
    pub fn to_css(&self) -> String {
        let mut css = String::new();
        for (prop, value) in [
            ("left", self.x),
            ("top", self.y),
            ("width", self.w),
            ("height", self.h),
        ] {
            if let Some(value) = value {
                if !css.is_empty() {
                    css.push(';');
                }
                let _ = write!(css, "{prop}:{value}%");
            }
        }
        css
    }
}

#[derive(Debug, Clone)]
pub enum BaseLayer {
    Image {
        src: String,
        alt: String,
    },
    Video {
        element: MediaHandle,
        poster: Option<String>,
        controls: bool,
        caption: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct OverlayNode {
    pub id: OverlayId,
    pub kind: OverlayKind,
    pub rect: PercentRect,
    pub class_list: Vec<String>,
    pub visible: bool,
    pub persistent: bool,
    pub absorbs_clicks: bool,
    pub action: Option<OverlayAction>,
    /// Backing element of a video overlay.
    pub element: Option<MediaHandle>,
}

#[derive(Debug, Clone, Default)]
pub struct Stage {
    base: Option<BaseLayer>,
    overlays: Vec<OverlayNode>,
    counter: Option<String>,
    focused: bool,
    playback_blocked: bool,
}

impl Stage {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn set_base(&mut self, base: BaseLayer) {
        self.base = Some(base);
    }

    pub fn base(&self) -> Option<&BaseLayer> {
        self.base.as_ref()
    }

    pub fn base_video(&self) -> Option<&MediaHandle> {
        match &self.base {
            Some(BaseLayer::Video { element, .. }) => Some(element),
            _ => None,
        }
    }

    /// Insert or replace the node with the same id. Nodes stack in document
    /// order whatever order they were mounted in.
    pub fn insert(&mut self, node: OverlayNode) {
        match self.overlays.binary_search_by_key(&node.id, |n| n.id) {
            Ok(index) => self.overlays[index] = node,
            Err(index) => self.overlays.insert(index, node),
        }
    }

    pub fn node(&self, id: OverlayId) -> Option<&OverlayNode> {
        self.overlays.iter().find(|n| n.id == id)
    }

    pub fn set_visible(&mut self, id: OverlayId, visible: bool) -> bool {
        match self.overlays.iter_mut().find(|n| n.id == id) {
            Some(node) => {
                node.visible = visible;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: OverlayId) -> Option<OverlayNode> {
        let index = self.overlays.iter().position(|n| n.id == id)?;
        Some(self.overlays.remove(index))
    }

    pub fn overlays(&self) -> &[OverlayNode] {
        &self.overlays
    }

    pub fn visible_overlays(&self) -> impl Iterator<Item = &OverlayNode> {
        self.overlays.iter().filter(|n| n.visible)
    }

    pub fn set_counter(&mut self, index: usize, total: usize) {
        self.counter = Some(format!("{} / {}", index + 1, total));
    }

    pub fn counter(&self) -> Option<&str> {
        self.counter.as_deref()
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Set when the base video was refused by the autoplay policy, so a
    /// surface can offer a tap-to-play affordance.
    pub fn set_playback_blocked(&mut self, blocked: bool) {
        self.playback_blocked = blocked;
    }

    pub fn playback_blocked(&self) -> bool {
        self.playback_blocked
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplashButton {
    pub index: usize,
    pub title: String,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Boot,
    Failed(String),
    Splash,
    Running { path: usize, slide: usize },
}

/// Everything a surface needs to draw one frame of the app.
#[derive(Debug)]
pub struct View<'a> {
    pub screen: Screen,
    pub splash: &'a [SplashButton],
    pub stage: &'a Stage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_skips_absent_edges() {
        let rect = PercentRect {
            x: Some(10.0),
            y: None,
            w: Some(25.5),
            h: None,
        };
        assert_eq!(rect.to_css(), "left:10%;width:25.5%");
        assert_eq!(PercentRect::default().to_css(), "");
    }

    #[test]
    fn counter_is_one_based() {
        let mut stage = Stage::default();
        stage.set_counter(1, 2);
        assert_eq!(stage.counter(), Some("2 / 2"));
        stage.clear();
        assert_eq!(stage.counter(), None);
    }

    #[test]
    fn overlays_stack_in_document_order() {
        let node = |id| OverlayNode {
            id: OverlayId(id),
            kind: OverlayKind::Text {
                html: String::new(),
            },
            rect: PercentRect::default(),
            class_list: Vec::new(),
            visible: true,
            persistent: false,
            absorbs_clicks: false,
            action: None,
            element: None,
        };
        let mut stage = Stage::default();
        stage.insert(node(2));
        stage.insert(node(0));
        stage.insert(node(1));
        stage.insert(node(0));
        let ids: Vec<usize> = stage.overlays().iter().map(|n| n.id.0).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }
}
