mod common;

use std::sync::Arc;
use std::time::Duration;

use kiosk_player::audio::Bus;
use kiosk_player::events::{self, Input, Key, MediaEvent};
use kiosk_player::media::{
    Activation, AutoplayPolicy, HeadlessBackend, MediaHandle, Placement, SimulatedClock,
};
use kiosk_player::player::{Mode, Player, PlayerSettings};
use kiosk_player::slides::SlidesConfig;
use kiosk_player::surface::HeadlessSurface;

use common::{booted_player, booted_with, headless_player, send};

const VIDEO_PATHS: &str = r#"{"paths":[{"title":"V","image":"v.png","slides":[
    {"base":{"type":"video","src":"intro.mp4","caption":"Welcome"},"advance":"video-end"},
    {"base":{"type":"video","src":"loop.mp4","muted":true},"advance":"click"},
    {"base":{"type":"image","src":"end.png"}}
]}]}"#;

fn base_video(player: &Player) -> MediaHandle {
    player.stage().base_video().cloned().unwrap()
}

async fn settle(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn same_source_is_the_same_element_across_visits() {
    let mut player = booted_player(VIDEO_PATHS);
    send(&mut player, Input::SelectPath(0));
    let first = base_video(&player);
    assert_eq!(first.placement(), Placement::Stage);

    send(&mut player, Input::key(Key::Escape));
    assert_eq!(first.placement(), Placement::Pool);
    assert!(first.is_paused());

    send(&mut player, Input::SelectPath(0));
    let second = base_video(&player);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.position(), 0.0);
}

#[tokio::test]
async fn video_end_advances_on_the_next_frame() {
    let mut player = booted_player(VIDEO_PATHS);
    send(&mut player, Input::SelectPath(0));
    let intro = base_video(&player);

    send(&mut player, MediaEvent::Ended { element: intro.id() });
    assert_eq!(player.mode(), Mode::Running { path: 0, slide: 0 });
    player.on_frame();
    assert_eq!(player.mode(), Mode::Running { path: 0, slide: 1 });
}

#[tokio::test]
async fn clicks_do_not_advance_video_end_slides() {
    let mut player = booted_player(VIDEO_PATHS);
    send(&mut player, Input::SelectPath(0));
    send(&mut player, Input::StageClick);
    assert_eq!(player.mode(), Mode::Running { path: 0, slide: 0 });
}

#[tokio::test]
async fn non_advancing_video_freezes_before_its_end() {
    let mut player = booted_player(VIDEO_PATHS);
    send(&mut player, Input::SelectPath(0));
    send(&mut player, Input::StageClick);
    send(&mut player, Input::key(Key::ArrowRight));
    // Keyboard advance is a gesture; slide 1 is a click slide.
    assert_eq!(player.mode(), Mode::Running { path: 0, slide: 1 });
    let clip = base_video(&player);
    assert!(!clip.is_paused());
    assert_eq!(player.context().listeners.len(), 2);

    send(
        &mut player,
        MediaEvent::TimeUpdate {
            element: clip.id(),
            position: 5.0,
            duration: 10.0,
        },
    );
    assert!(!clip.is_paused());

    send(
        &mut player,
        MediaEvent::TimeUpdate {
            element: clip.id(),
            position: 9.97,
            duration: 10.0,
        },
    );
    assert!(clip.is_paused());
    assert!((clip.position() - 9.95).abs() < 1e-9);
    // The freeze fires once.
    assert_eq!(player.context().listeners.len(), 1);
    assert_eq!(player.mode(), Mode::Running { path: 0, slide: 1 });
}

#[tokio::test]
async fn audio_toggle_mutes_videos_and_silences_buses() {
    let json = r#"{"paths":[{"title":"V","image":"v.png","slides":[
        {"base":{"type":"video","src":"intro.mp4"},"advance":"video-end"},
        {"base":{"type":"video","src":"talk.mp4"},"advance":"video-end"},
        {"base":{"type":"video","src":"loop.mp4","muted":true},"advance":"click"}
    ]}]}"#;
    let mut player = booted_player(json);
    send(&mut player, Input::SelectPath(0));
    let intro = base_video(&player);
    assert!(!intro.is_muted());

    send(&mut player, Input::ToggleAudio);
    assert!(!player.audio().audio_enabled());
    assert!(player.audio().active_videos().iter().all(|v| v.is_muted()));

    // A video staged while audio is off starts muted too.
    send(&mut player, MediaEvent::Ended { element: intro.id() });
    player.on_frame();
    let talk = base_video(&player);
    assert_eq!(talk.src(), "talk.mp4");
    assert!(!talk.default_muted());
    assert!(talk.is_muted());

    send(&mut player, Input::key(Key::Char('m')));
    assert!(player.audio().audio_enabled());
    assert!(!talk.is_muted());

    // Content-muted videos stay muted when audio comes back.
    send(&mut player, Input::ToggleAudio);
    send(&mut player, MediaEvent::Ended { element: talk.id() });
    player.on_frame();
    send(&mut player, Input::ToggleAudio);
    let clip = base_video(&player);
    assert_eq!(clip.src(), "loop.mp4");
    assert!(clip.is_muted());
}

#[tokio::test]
async fn disabled_music_bus_skips_splash_music() {
    let settings = PlayerSettings {
        music_enabled: false,
        splash_music: Some("theme.mp3".into()),
        ..PlayerSettings::default()
    };
    let mut player = headless_player(settings, AutoplayPolicy::Allow);
    player
        .boot(SlidesConfig::from_json_str(VIDEO_PATHS))
        .unwrap();
    assert_eq!(player.mode(), Mode::Splash);
    assert!(player.audio().active(Bus::Music).is_empty());
    assert_eq!(player.media().audio_count(Bus::Music), 0);
    assert!(player.audio().sound_enabled());
}

#[tokio::test]
async fn splash_music_stops_when_a_path_is_chosen() {
    let settings = PlayerSettings {
        splash_music: Some("theme.mp3".into()),
        select_sound: Some("select.wav".into()),
        ..PlayerSettings::default()
    };
    let mut player = headless_player(settings, AutoplayPolicy::Allow);
    player
        .boot(SlidesConfig::from_json_str(VIDEO_PATHS))
        .unwrap();
    let music = player.audio().active(Bus::Music).to_vec();
    assert_eq!(music.len(), 1);
    assert!(music[0].is_looping());
    assert!(!music[0].is_paused());

    send(&mut player, Input::SelectPath(0));
    assert!(player.audio().active(Bus::Music).is_empty());
    assert!(music[0].is_paused());
    // The base video clears the sound bus as it takes over.
    assert!(player.audio().active(Bus::Sound).is_empty());
}

#[tokio::test]
async fn blocked_autoplay_waits_for_a_gesture() {
    let mut player = headless_player(PlayerSettings::default(), AutoplayPolicy::Block);
    player
        .boot(SlidesConfig::from_json_str(VIDEO_PATHS))
        .unwrap();
    // Choosing a path is itself a gesture.
    send(&mut player, Input::SelectPath(0));
    let intro = base_video(&player);
    assert!(!intro.is_paused());

    send(&mut player, MediaEvent::Ended { element: intro.id() });
    player.on_frame();
    let clip = base_video(&player);
    assert!(clip.is_paused());
    assert!(player.stage().playback_blocked());

    let attempt = player.attempt_base_playback(Activation::Gesture).unwrap();
    assert!(attempt.started());
    assert!(!clip.is_paused());
    assert!(!player.stage().playback_blocked());
}

#[tokio::test]
async fn gesture_advance_starts_the_next_video_inside_the_gesture() {
    let json = r#"{"paths":[{"title":"V","image":"v.png","slides":[
        {"base":{"type":"image","src":"1.png"}},
        {"base":{"type":"video","src":"talk.mp4"}}
    ]}]}"#;
    let mut player = headless_player(PlayerSettings::default(), AutoplayPolicy::RequireGesture);
    player.boot(SlidesConfig::from_json_str(json)).unwrap();
    send(&mut player, Input::SelectPath(0));
    send(&mut player, Input::StageClick);

    let talk = base_video(&player);
    assert!(!talk.is_paused());
    assert!(!player.stage().playback_blocked());
}

#[tokio::test(start_paused = true)]
async fn simulated_clock_drives_video_end_advance() {
    let (tx, rx) = events::channel();
    let backend = HeadlessBackend::new(AutoplayPolicy::Allow).with_clock(SimulatedClock {
        events: tx.clone(),
        clip_length: Duration::from_secs(1),
        tick: Duration::from_millis(250),
    });
    let mut player = Player::new(
        PlayerSettings::default(),
        Arc::new(backend),
        Box::new(HeadlessSurface::default()),
        tx,
        rx,
    )
    .unwrap();
    player
        .boot(SlidesConfig::from_json_str(VIDEO_PATHS))
        .unwrap();
    send(&mut player, Input::SelectPath(0));

    for _ in 0..6 {
        settle(250).await;
        player.pump();
        player.on_frame();
    }
    assert_eq!(player.mode(), Mode::Running { path: 0, slide: 1 });
}

#[tokio::test]
async fn splash_music_resumes_inside_the_final_click() {
    let json = r#"{"paths":[{"title":"A","image":"a.png","slides":[
        {"base":{"type":"image","src":"1.png"}},
        {"base":{"type":"image","src":"2.png"}}
    ]}]}"#;
    let settings = PlayerSettings {
        splash_music: Some("theme.mp3".into()),
        ..PlayerSettings::default()
    };
    let mut player = booted_with(settings, AutoplayPolicy::RequireGesture, json);
    // Boot is not a gesture; the first attempt is refused.
    let theme = player.audio().active(Bus::Music).to_vec();
    assert_eq!(theme.len(), 1);
    assert!(theme[0].is_paused());

    send(&mut player, Input::SelectPath(0));
    send(&mut player, Input::StageClick);
    send(&mut player, Input::StageClick);
    assert_eq!(player.mode(), Mode::Splash);
    let music = player.audio().active(Bus::Music).to_vec();
    assert_eq!(music.len(), 1);
    assert!(Arc::ptr_eq(&music[0], &theme[0]));
    assert!(!music[0].is_paused());

    send(&mut player, Input::SelectPath(0));
    send(&mut player, Input::key(Key::Escape));
    assert!(!player.audio().active(Bus::Music)[0].is_paused());
}

#[tokio::test]
async fn deferred_advance_does_not_claim_the_gesture() {
    let json = r#"{"paths":[{"title":"V","image":"v.png","slides":[
        {"base":{"type":"video","src":"intro.mp4","muted":true},"advance":"video-end"},
        {"base":{"type":"video","src":"talk.mp4"}}
    ]}]}"#;
    let mut player = booted_with(PlayerSettings::default(), AutoplayPolicy::RequireGesture, json);
    send(&mut player, Input::SelectPath(0));
    let intro = base_video(&player);
    assert!(!intro.is_paused());

    send(&mut player, MediaEvent::Ended { element: intro.id() });
    player.on_frame();
    assert!(base_video(&player).is_paused());
    assert!(player.stage().playback_blocked());
}

const PRELOAD: &str = r#"{"paths":[{"title":"P","image":"p.png","slides":[
    {"base":{"type":"image","src":"1.png"},"preloadNext":PRELOAD_NEXT},
    {"base":{"type":"video","src":"talk.mp4","poster":"talk.png"}}
]}]}"#;

#[tokio::test]
async fn next_slide_media_is_preloaded() {
    let mut player = booted_player(&PRELOAD.replace("PRELOAD_NEXT", "true"));
    send(&mut player, Input::SelectPath(0));
    assert_eq!(player.media().video_count(), 1);
    let talk = player.media().find_video("talk.mp4").cloned().unwrap();
    assert_eq!(talk.placement(), Placement::Pool);
    // Splash image, current base, next poster.
    assert_eq!(player.media().image_count(), 3);
}

#[tokio::test]
async fn preload_next_false_skips_the_next_slide() {
    let mut player = booted_player(&PRELOAD.replace("PRELOAD_NEXT", "false"));
    send(&mut player, Input::SelectPath(0));
    assert_eq!(player.media().video_count(), 0);
    assert_eq!(player.media().image_count(), 2);
}
