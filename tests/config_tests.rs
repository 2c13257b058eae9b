use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use kiosk_player::config::Configuration;
use kiosk_player::media::AutoplayPolicy;

#[test]
fn parse_kebab_case_config() {
    let yaml = r#"
slides: "/srv/kiosk/slides.json"
warmup-delay: 750ms
end-freeze-margin: 40ms
audio:
  music-enabled: false
  splash-music: "audio/theme.mp3"
headless:
  autoplay: block
  clip-length: 3s
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(cfg.slides, PathBuf::from("/srv/kiosk/slides.json"));
    assert_eq!(cfg.warmup_delay, Duration::from_millis(750));
    assert_eq!(cfg.end_freeze_margin, Duration::from_millis(40));
    assert!(!cfg.audio.music_enabled);
    assert!(cfg.audio.sound_enabled);
    assert_eq!(cfg.audio.splash_music.as_deref(), Some("audio/theme.mp3"));
    assert_eq!(cfg.headless.autoplay, AutoplayPolicy::Block);
    assert_eq!(cfg.headless.clip_length, Duration::from_secs(3));
    assert_eq!(cfg.headless.tick, Duration::from_millis(250));
}

#[test]
fn empty_document_uses_defaults() {
    let cfg: Configuration = serde_yaml::from_str("{}").unwrap();
    assert_eq!(cfg.slides, PathBuf::from("slides.json"));
    assert_eq!(cfg.warmup_delay, Duration::from_millis(500));
    assert_eq!(cfg.frame_interval, Duration::from_millis(16));
    assert_eq!(cfg.end_freeze_margin, Duration::from_millis(50));
    assert_eq!(cfg.headless.autoplay, AutoplayPolicy::RequireGesture);
    assert!(cfg.validated().is_ok());
}

#[test]
fn unknown_fields_are_rejected() {
    let err = serde_yaml::from_str::<Configuration>("slide: x.json\n").unwrap_err();
    assert!(err.to_string().contains("unknown field"));
}

#[test]
fn validation_rejects_zero_frame_interval() {
    let cfg: Configuration = serde_yaml::from_str("frame-interval: 0s\n").unwrap();
    let err = cfg.validated().unwrap_err();
    assert!(err.to_string().contains("frame-interval"));
}

#[test]
fn validation_rejects_blank_audio_sources() {
    let cfg: Configuration = serde_yaml::from_str("audio:\n  select-sound: \"  \"\n").unwrap();
    let err = cfg.validated().unwrap_err();
    assert!(err.to_string().contains("select-sound"));
}

#[test]
fn validation_rejects_clip_shorter_than_tick() {
    let yaml = r#"
headless:
  clip-length: 100ms
  tick: 250ms
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert!(cfg.validated().is_err());
}

#[test]
fn relative_slides_path_resolves_against_config_dir() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kiosk.yaml");
    fs::write(&path, "slides: content/slides.json\n").unwrap();

    let cfg = Configuration::from_yaml_file(&path).unwrap();
    assert_eq!(cfg.slides, dir.path().join("content/slides.json"));
}

#[test]
fn absolute_slides_path_is_kept() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kiosk.yaml");
    fs::write(&path, "slides: /opt/slides.json\n").unwrap();

    let cfg = Configuration::from_yaml_file(&path).unwrap();
    assert_eq!(cfg.slides, PathBuf::from("/opt/slides.json"));
}

#[test]
fn missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.yaml");
    let err = Configuration::from_yaml_file(&path).unwrap_err();
    assert!(err.to_string().contains("absent.yaml"));
}
