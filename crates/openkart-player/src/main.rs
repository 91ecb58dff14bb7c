/// OpenKart Player: desktop front end for the OpenKart racing core
///
/// Architecture:
///   engine/  : minifb window, keyboard mapping, frame loop
///   openkart-core  : tracks, physics, AI, renderer (library crate)
///   openkart-common: TOML configuration (library crate)

mod engine;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use openkart_common::{AppConfig, TrackSource};
use openkart_core::{GeneratorParams, Track};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "openkart", version, about = "Pseudo-3D kart racing")]
struct Args {
    /// TOML config file. Missing files fall back to defaults.
    #[arg(short, long, default_value = "openkart.toml")]
    config: PathBuf,

    /// Race on a generated track built from this seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of players (1 or 2)
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=2))]
    players: u8,

    /// Ghost difficulty multiplier
    #[arg(short, long)]
    difficulty: Option<f32>,

    /// Laps needed to finish
    #[arg(short, long)]
    laps: Option<u32>,

    /// Race without pickups
    #[arg(long)]
    no_items: bool,
}

impl Args {
    /// Command-line values win over the config file.
    fn apply(&self, config: &mut AppConfig) {
        if let Some(seed) = self.seed {
            config.race.track = TrackSource::Generated;
            config.race.seed = seed;
        }
        if let Some(difficulty) = self.difficulty {
            config.race.difficulty = difficulty;
        }
        if let Some(laps) = self.laps {
            config.race.laps = laps;
        }
        if self.no_items {
            config.race.items = false;
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load(&args.config)
        .with_context(|| format!("Failed to load config {}", args.config.display()))?;
    args.apply(&mut config);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(format!("openkart={}", config.log_level).parse()?))
        .init();

    tracing::info!("OpenKart Player v{}", env!("CARGO_PKG_VERSION"));
    if !args.config.exists() {
        // The loader's own message predates the subscriber
        tracing::info!("No config at {}, using defaults", args.config.display());
    }
    config.validate().context("Invalid configuration")?;
    tracing::info!(
        "Config: {} | {} players | {} laps | difficulty {:.1}",
        args.config.display(),
        args.players,
        config.race.laps,
        config.race.difficulty
    );

    let track = build_track(&config)?;
    engine::run(&config, track, usize::from(args.players))
}

fn build_track(config: &AppConfig) -> Result<Arc<Track>> {
    let race = &config.race;
    let track = match race.track {
        TrackSource::Demo => Track::demo(race.seed),
        TrackSource::Generated => Track::generate(race.seed, &GeneratorParams::default()),
    }
    .with_context(|| format!("Failed to build {} track (seed {})", race.track.display_name(), race.seed))?;
    tracing::info!(
        "Track: {} | {} segments | {:.0} units | {} checkpoints",
        race.track.display_name(),
        track.segments().len(),
        track.total_length(),
        track.checkpoints().len()
    );
    Ok(Arc::new(track))
}
