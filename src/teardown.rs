//! Transition-scoped cleanup.
//!
//! Anything that installs a timer, listener or other side effect for the
//! current slide registers the disposer it got back. Before every state
//! transition the registry is drained last-in-first-out and left empty.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::audio::AudioDirector;
use crate::listeners::{ListenerId, Listeners};
use crate::media::{MediaHandle, Placement};

type Callback = Box<dyn FnOnce() -> Result<()> + Send>;

/// One undo step.
pub struct Disposer(Action);

enum Action {
    Cancel(CancellationToken),
    Listener(ListenerId),
    ReleaseVideo(MediaHandle),
    Callback(Callback),
}

impl fmt::Debug for Disposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Action::Cancel(_) => f.write_str("Disposer::Cancel"),
            Action::Listener(id) => write!(f, "Disposer::Listener({id:?})"),
            Action::ReleaseVideo(element) => write!(f, "Disposer::ReleaseVideo({})", element.id()),
            Action::Callback(_) => f.write_str("Disposer::Callback"),
        }
    }
}

impl Disposer {
    pub fn cancel(token: CancellationToken) -> Self {
        Self(Action::Cancel(token))
    }

    pub fn listener(id: ListenerId) -> Self {
        Self(Action::Listener(id))
    }

    /// Pause a staged video, return it to the pool and stop tracking it.
    pub fn release_video(element: MediaHandle) -> Self {
        Self(Action::ReleaseVideo(element))
    }

    pub fn from_fn(f: impl FnOnce() -> Result<()> + Send + 'static) -> Self {
        Self(Action::Callback(Box::new(f)))
    }

    fn dispose(self, listeners: &mut Listeners, audio: &mut AudioDirector) -> Result<()> {
        match self.0 {
            Action::Cancel(token) => token.cancel(),
            Action::Listener(id) => {
                listeners.remove(id);
            }
            Action::ReleaseVideo(element) => {
                element.pause();
                element.set_placement(Placement::Pool);
                audio.release_video(&element);
            }
            Action::Callback(f) => f()?,
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub ran: usize,
    pub failed: usize,
}

#[derive(Debug, Default)]
pub struct TeardownRegistry {
    handlers: Vec<Disposer>,
}

impl TeardownRegistry {
    pub fn register(&mut self, disposer: Disposer) {
        self.handlers.push(disposer);
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run every disposer, newest first. A disposer that errors or panics is
    /// logged and skipped; the rest still run.
    pub fn drain(&mut self, listeners: &mut Listeners, audio: &mut AudioDirector) -> DrainReport {
        let mut report = DrainReport::default();
        while let Some(disposer) = self.handlers.pop() {
            report.ran += 1;
            match catch_unwind(AssertUnwindSafe(|| disposer.dispose(listeners, audio))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    report.failed += 1;
                    debug!("teardown callback failed: {err:#}");
                }
                Err(_) => {
                    report.failed += 1;
                    debug!("teardown callback panicked");
                }
            }
        }
        report
    }
}
