use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::events::{EventSender, PlayerEvent, TimerEvent, TimerKind};
use crate::teardown::Disposer;

/// One-shot timers delivered as events on the player channel.
#[derive(Debug, Clone)]
pub struct Timers {
    to_player: EventSender,
}

impl Timers {
    pub fn new(to_player: EventSender) -> Self {
        Self { to_player }
    }

    /// Deliver `event` after `delay` unless the returned token is cancelled.
    pub fn start(&self, delay: Duration, event: PlayerEvent) -> CancellationToken {
        let token = CancellationToken::new();
        let cancel = token.clone();
        let to_player = self.to_player.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    trace!(?event, "timer cancelled");
                }
                _ = sleep(delay) => {
                    let _ = to_player.send(event).await;
                }
            }
        });
        token
    }

    pub fn schedule(&self, delay: Duration, epoch: u64, kind: TimerKind) -> Disposer {
        Disposer::cancel(self.start(delay, PlayerEvent::Timer(TimerEvent { epoch, kind })))
    }
}
