use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use humantime::format_duration;
use tokio::io::BufReader;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use kiosk_player::config::Configuration;
use kiosk_player::events;
use kiosk_player::media::{HeadlessBackend, SimulatedClock};
use kiosk_player::player::{Player, PlayerSettings};
use kiosk_player::slides::{Advance, SlidesConfig};
use kiosk_player::surface::HeadlessSurface;
use kiosk_player::tasks;

#[derive(Debug, Parser)]
#[command(
    name = "kiosk-player",
    version,
    about = "slide-based kiosk presentation player"
)]
struct Args {
    /// Path to YAML config
    #[arg(value_name = "CONFIG")]
    config: PathBuf,
    /// Validate the configuration and slides, print a summary, and exit
    #[arg(long)]
    check: bool,
    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) -> Result<()> {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("info,kiosk_player=debug"),
        _ => EnvFilter::new("info,kiosk_player=trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let Args {
        config,
        check,
        verbose,
    } = Args::parse();
    init_tracing(verbose)?;

    let cfg = Configuration::from_yaml_file(&config)
        .with_context(|| format!("failed to load configuration from {}", config.display()))?
        .validated()
        .context("invalid configuration values")?;
    tracing::info!(
        slides = %cfg.slides.display(),
        warmup = %format_duration(cfg.warmup_delay),
        frame = %format_duration(cfg.frame_interval),
        autoplay = ?cfg.headless.autoplay,
        "loaded configuration from {}",
        config.display()
    );

    if check {
        let slides = SlidesConfig::from_json_file(&cfg.slides)?;
        print_summary(&slides);
        return Ok(());
    }

    let (to_player, from_inputs) = events::channel();
    let cancel = CancellationToken::new();

    let mut backend = HeadlessBackend::new(cfg.headless.autoplay);
    if cfg.headless.simulate_clock {
        backend = backend.with_clock(SimulatedClock {
            events: to_player.clone(),
            clip_length: cfg.headless.clip_length,
            tick: cfg.headless.tick,
        });
    }

    let mut player = Player::new(
        PlayerSettings::from(&cfg),
        Arc::new(backend),
        Box::new(HeadlessSurface::default()),
        to_player.clone(),
        from_inputs,
    )
    .context("surface is missing a mount point")?;

    // A broken slides document halts in BOOT with the message shown.
    player
        .boot(SlidesConfig::from_json_file(&cfg.slides))
        .context("player failed to boot")?;

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler failed: {err}");
                return;
            }
            tracing::info!("ctrl-c received; initiating shutdown");
            cancel.cancel();
        });
    }

    let mut tasks = JoinSet::new();

    // Console
    tasks.spawn({
        let to_player = to_player.clone();
        let cancel = cancel.clone();
        async move {
            let stdin = BufReader::new(tokio::io::stdin());
            tasks::console::run(stdin, to_player, cancel)
                .await
                .context("console task failed")
        }
    });
    drop(to_player);

    if let Err(e) = player
        .run(cancel.clone(), cfg.frame_interval)
        .await
        .context("player failed")
    {
        tracing::error!("{e:?}");
    }
    cancel.cancel();

    // Wait for the remaining tasks to finish
    while let Some(res) = tasks.join_next().await {
        match res {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("task error: {e:?}"),
            Err(e) => tracing::error!("join error: {e}"),
        }
    }

    Ok(())
}

fn print_summary(slides: &SlidesConfig) {
    println!("# slides check\n# paths: {}\n", slides.paths.len());
    for (idx, path) in slides.paths.iter().enumerate() {
        let modes: Vec<&str> = path
            .slides
            .iter()
            .map(|slide| match slide.advance {
                Advance::Click => "click",
                Advance::Timer => "timer",
                Advance::VideoEnd => "video-end",
            })
            .collect();
        println!(
            "  {:>3}: {} ({} slides) [{}]",
            idx,
            path.title,
            path.slides.len(),
            modes.join(", ")
        );
    }
}
