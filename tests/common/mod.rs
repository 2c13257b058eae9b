//! Helpers for driving a headless player from the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use kiosk_player::events::{self, PlayerEvent};
use kiosk_player::media::{AutoplayPolicy, HeadlessBackend};
use kiosk_player::player::{Player, PlayerSettings};
use kiosk_player::slides::SlidesConfig;
use kiosk_player::surface::HeadlessSurface;

/// Player on a headless backend without a playback clock.
pub fn headless_player(settings: PlayerSettings, policy: AutoplayPolicy) -> Player {
    let (tx, rx) = events::channel();
    let backend = Arc::new(HeadlessBackend::new(policy));
    Player::new(settings, backend, Box::new(HeadlessSurface::default()), tx, rx)
        .expect("headless surface provides every mount")
}

/// Headless player already past boot with the given slides document.
pub fn booted_player(json: &str) -> Player {
    booted_with(PlayerSettings::default(), AutoplayPolicy::Allow, json)
}

pub fn booted_with(settings: PlayerSettings, policy: AutoplayPolicy, json: &str) -> Player {
    let mut player = headless_player(settings, policy);
    let config = SlidesConfig::from_json_str(json).expect("test slides must parse");
    player.boot(Ok(config)).expect("boot");
    player
}

/// Feed one event and handle everything it caused on the channel.
pub fn send(player: &mut Player, event: impl Into<PlayerEvent>) {
    player.dispatch(event.into());
    player.pump();
}
