pub mod audio;
pub mod config;
pub mod context;
pub mod events;
pub mod listeners;
pub mod media;
pub mod overlay;
pub mod player;
pub mod render;
pub mod slides;
pub mod stage;
pub mod surface;
pub mod teardown;
pub mod timers;
pub mod tasks {
    pub mod console;
}
