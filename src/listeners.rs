use std::collections::BTreeMap;

use crate::media::ElementId;
use crate::teardown::Disposer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Where a click on the bare stage goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickRoute {
    /// Timed mode: the click advances the slide.
    AdvanceSlide,
    /// Sequential mode: the click advances the overlay cursor.
    AdvanceSequence,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Listener {
    StageClick(ClickRoute),
    VideoEnded { element: ElementId },
    /// Pause `element` once the remaining time drops to `margin` seconds.
    EndFreeze { element: ElementId, margin: f64 },
}

/// Transition-scoped event listeners. Installing one hands back the
/// disposer that removes it.
#[derive(Debug, Default)]
pub struct Listeners {
    next: u64,
    entries: BTreeMap<ListenerId, Listener>,
}

impl Listeners {
    pub fn install(&mut self, listener: Listener) -> Disposer {
        let id = ListenerId(self.next);
        self.next += 1;
        self.entries.insert(id, listener);
        Disposer::listener(id)
    }

    pub fn remove(&mut self, id: ListenerId) -> Option<Listener> {
        self.entries.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The most recently installed stage-click route wins.
    pub fn stage_click(&self) -> Option<ClickRoute> {
        self.entries.values().rev().find_map(|l| match l {
            Listener::StageClick(route) => Some(*route),
            _ => None,
        })
    }

    pub fn wants_video_end(&self, element: ElementId) -> bool {
        self.entries
            .values()
            .any(|l| matches!(l, Listener::VideoEnded { element: e } if *e == element))
    }

    pub fn end_freeze(&self, element: ElementId) -> Option<(ListenerId, f64)> {
        self.entries.iter().find_map(|(id, l)| match l {
            Listener::EndFreeze { element: e, margin } if *e == element => Some((*id, *margin)),
            _ => None,
        })
    }
}
