//! Headless horde simulation runner.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use horde_core::MapDescription;
use horde_lib::{DEFAULT_MAP, Effect, Options, RoutePolicy, Simulation};
use horde_paths::SchedulerMode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Policy {
    Replan,
    Follow,
}

impl From<Policy> for RoutePolicy {
    fn from(p: Policy) -> Self {
        match p {
            Policy::Replan => RoutePolicy::Replan,
            Policy::Follow => RoutePolicy::Follow,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "horde")]
#[command(about = "Run the zombie pursuit simulation without a screen")]
struct Cli {
    /// Map file; `#` is a wall, `Z` a spawn tile. Defaults to the bundled map.
    #[arg(long)]
    map: Option<PathBuf>,
    /// TOML options file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 3600)]
    ticks: u64,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    tile_length: Option<i32>,
    #[arg(long)]
    fps: Option<u32>,
    #[arg(long, value_enum)]
    policy: Option<Policy>,
    /// Run searches on the simulation thread.
    #[arg(long)]
    inline: bool,
    /// Tick at which the survivor picks up "through walls".
    #[arg(long)]
    through_walls_at: Option<u64>,
    /// Tick at which the horde is frozen.
    #[arg(long)]
    freeze_at: Option<u64>,
}

impl Cli {
    fn options(&self) -> Result<Options> {
        let mut opts = match &self.config {
            Some(path) => Options::load(path)?,
            None => Options::default(),
        };
        if let Some(seed) = self.seed {
            opts.seed = seed;
        }
        if let Some(tile_length) = self.tile_length {
            opts.tile_length = tile_length;
        }
        if let Some(fps) = self.fps {
            opts.fps = fps;
        }
        if let Some(policy) = self.policy {
            opts.route_policy = policy.into();
        }
        if self.inline {
            opts.scheduler = SchedulerMode::Inline;
        }
        Ok(opts)
    }

    fn map(&self) -> Result<MapDescription> {
        let text = match &self.map {
            Some(path) => fs::read_to_string(path)
                .with_context(|| format!("failed to read map {}", path.display()))?,
            None => DEFAULT_MAP.to_owned(),
        };
        MapDescription::parse(&text).context("malformed map")
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let opts = cli.options()?;
    let map = cli.map()?;
    let fps = u64::from(opts.fps);

    let mut sim = Simulation::new(opts, &map).context("failed to start the simulation")?;
    for tick in 0..cli.ticks {
        if cli.through_walls_at == Some(tick) {
            sim.activate(Effect::ThroughWalls);
        }
        if cli.freeze_at == Some(tick) {
            sim.activate(Effect::Freeze);
        }
        let report = sim.tick()?;
        debug!(?report, "tick");
        if tick % fps == 0 {
            info!(
                tick,
                seekers = report.seekers,
                contacts = report.contacts,
                survivor = %report.survivor,
                "progress"
            );
        }
    }

    let summary = sim.finish()?;
    info!("{summary}");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
