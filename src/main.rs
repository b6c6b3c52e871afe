use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use junction_sim::simulation::{
    build_controller, ConsoleSink, FileFeed, LaneFileWriter, SimConfig, TimerFeed, VehicleFeed,
    VehicleGenerator, DEFAULT_HIGH_WATER, DEFAULT_LOW_WATER, DEFAULT_QUEUE_CAPACITY,
};

#[derive(Parser)]
#[command(name = "junction_sim")]
#[command(about = "Four-way intersection traffic simulation")]
struct Cli {
    /// Number of ticks to run before shutting down
    #[arg(long, default_value = "2000")]
    ticks: u64,

    /// Simulated milliseconds per tick
    #[arg(long, default_value = "30")]
    delta_ms: u64,

    /// Seed for reproducible vehicle generation
    #[arg(long)]
    seed: Option<u64>,

    /// Poll lane<ROAD>.txt files in this directory instead of generating vehicles
    #[arg(long)]
    feed_dir: Option<PathBuf>,

    /// Write this many generated records into --feed-dir and exit
    #[arg(long, requires = "feed_dir")]
    produce: Option<usize>,

    /// Live vehicles on the priority lane above which it gets priority
    #[arg(long, default_value_t = DEFAULT_HIGH_WATER)]
    high_water: usize,

    /// Live vehicles on the priority lane at which priority is released
    #[arg(long, default_value_t = DEFAULT_LOW_WATER)]
    low_water: usize,

    /// Queue capacity per lane
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    capacity: usize,

    /// Vehicle speed in pixels per tick
    #[arg(long, default_value = "4")]
    speed: f32,

    /// Light toggle duration in milliseconds
    #[arg(long, default_value = "5000")]
    light_ms: u64,

    /// Sleep for one tick delta between ticks
    #[arg(long)]
    realtime: bool,

    /// Log a snapshot summary every this many ticks
    #[arg(long, default_value = "100")]
    report_every: u64,
}

impl Cli {
    fn config(&self) -> SimConfig {
        let mut config = SimConfig::default().with_light_duration(Duration::from_millis(self.light_ms));
        config.tick_delta = Duration::from_millis(self.delta_ms);
        config.high_water = self.high_water;
        config.low_water = self.low_water;
        config.queue_capacity = self.capacity;
        config.vehicle_speed = self.speed;
        config
    }

    fn generator(&self, config: &SimConfig) -> VehicleGenerator {
        let threshold = config.feed.priority_threshold;
        match self.seed {
            Some(seed) => VehicleGenerator::new_with_seed(seed, threshold),
            None => VehicleGenerator::new(threshold),
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.config();
    config.validate().context("Invalid simulation configuration")?;

    if let (Some(count), Some(dir)) = (cli.produce, &cli.feed_dir) {
        return produce(dir, count, cli.generator(&config));
    }

    run_headless(&cli, config)
}

/// Write generated records for another process to consume
fn produce(dir: &Path, count: usize, mut generator: VehicleGenerator) -> Result<()> {
    let writer = LaneFileWriter::create(dir)
        .with_context(|| format!("Failed to initialize feed files in {:?}", dir))?;
    let written = writer
        .produce(&mut generator, count)
        .context("Failed to write feed records")?;
    for request in &written {
        info!("Generated vehicle {}", request);
    }
    info!("Wrote {} records to {:?}", written.len(), dir);
    Ok(())
}

/// Run the simulation without any graphics
fn run_headless(cli: &Cli, config: SimConfig) -> Result<()> {
    info!("Running intersection simulation in headless mode...");
    info!(
        "Ticks: {}, Delta: {}ms, high/low water: {}/{}",
        cli.ticks, cli.delta_ms, config.high_water, config.low_water
    );

    let mut feed: Box<dyn VehicleFeed> = match &cli.feed_dir {
        Some(dir) => {
            info!("Polling feed files in {:?}", dir);
            Box::new(FileFeed::new(dir.clone()))
        }
        None => Box::new(TimerFeed::new(cli.generator(&config), &config.feed)),
    };
    let pace = cli.realtime.then_some(config.tick_delta);
    let mut sink = ConsoleSink::new(Some(cli.ticks), cli.report_every);

    let mut controller = build_controller(config)?;
    let released = controller.run(feed.as_mut(), &mut sink, pace);

    controller.stats().log_summary(controller.time(), released);
    Ok(())
}
