//! # engine_app: physics demo
//!
//! Builds a small scene (a concave ground, a stack of crates, a player that
//! only collides with the ground and a marker carried by the top crate) and
//! steps it through the physics pipeline at a fixed tick rate.
//!
//! Set `RUST_LOG=engine_app=debug,engine_physics=debug` for per-frame output.

mod scene;
mod tick;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use engine_physics::{PhysicsConfig, PhysicsPipeline};
use tracing::info;
use tracing_subscriber::EnvFilter;

use scene::Scene;
use tick::{TickConfig, TickLoop};

#[derive(Parser)]
#[command(name = "engine_app", about = "Headless 2D rigid-body physics demo")]
struct Args {
    /// Number of frames to simulate (0 = run until interrupted)
    #[arg(short, long, default_value_t = 300)]
    frames: u64,

    /// Fixed ticks per second
    #[arg(short, long, default_value_t = 60.0)]
    tick_rate: f64,

    /// Sub-steps per frame, overriding the config file
    #[arg(short, long)]
    substeps: Option<u32>,

    /// Worker threads for the narrow phase (0 = single-threaded)
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// Physics configuration as JSON
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of stacked crates
    #[arg(short, long, default_value_t = 9)]
    boxes: usize,

    /// Step as fast as possible instead of in real time
    #[arg(long)]
    fast: bool,
}

fn load_config(args: &Args) -> Result<PhysicsConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => PhysicsConfig::default(),
    };
    if let Some(substeps) = args.substeps {
        config = config.with_substeps(substeps);
    }
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("engine_app=info".parse()?))
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    info!(
        substeps = config.substeps,
        gravity = %config.gravity,
        threads = args.threads,
        "physics demo starting"
    );

    let pipeline = PhysicsPipeline::new(config)?;
    let scene = Scene::demo(args.boxes)?;
    info!(bodies = scene.transforms.len(), "scene built");

    let tick_config = TickConfig {
        tick_rate: args.tick_rate,
        max_ticks: args.frames,
        realtime: !args.fast,
    };
    let mut tick_loop = TickLoop::new(tick_config, scene, pipeline);
    if args.threads > 0 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(args.threads)
            .thread_name(|i| format!("physics-{i}"))
            .build()?;
        tick_loop = tick_loop.with_pool(pool);
    }

    tick_loop.run()?;

    let totals = tick_loop.totals();
    info!(
        ticks = tick_loop.tick_id(),
        pairs = totals.candidate_pairs,
        contacts = totals.contacts,
        "simulation finished"
    );
    for (label, position) in tick_loop.scene().positions() {
        info!(label, x = position.x, y = position.y, "final position");
    }
    Ok(())
}
