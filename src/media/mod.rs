//! Media elements, the session cache that owns them, and the backend seam
//! through which they reach the platform.

mod backend;
mod cache;
mod element;

pub use backend::{AutoplayPolicy, HeadlessBackend, MediaBackend, SimulatedClock};
pub use cache::MediaCache;
pub use element::{
    Activation, ElementId, MediaElement, MediaHandle, MediaKind, Placement, PlayAttempt,
    PlaybackState, Preload,
};
