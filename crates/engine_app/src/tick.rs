//! Fixed-timestep tick loop driving the physics pipeline.

use std::time::{Duration, Instant};

use engine_physics::{CollisionSolver, FrameStats, ImpulseSolver, PhysicsError, PhysicsPipeline};
use rayon::ThreadPool;
use tracing::{debug, info, warn};

use crate::scene::Scene;

/// Configuration for the tick loop.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Target ticks per second.
    pub tick_rate: f64,
    /// Maximum number of ticks to run (0 = unlimited).
    pub max_ticks: u64,
    /// Sleep between ticks to hold the target rate.
    pub realtime: bool,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            max_ticks: 0,
            realtime: true,
        }
    }
}

/// Owns the scene and steps it once per tick.
pub struct TickLoop<S: CollisionSolver = ImpulseSolver> {
    tick_id: u64,
    config: TickConfig,
    scene: Scene,
    pipeline: PhysicsPipeline<S>,
    pool: Option<ThreadPool>,
    totals: FrameStats,
}

impl<S: CollisionSolver> TickLoop<S> {
    #[must_use]
    pub fn new(config: TickConfig, scene: Scene, pipeline: PhysicsPipeline<S>) -> Self {
        Self {
            tick_id: 0,
            config,
            scene,
            pipeline,
            pool: None,
            totals: FrameStats::default(),
        }
    }

    /// Run narrow-phase work on `pool`.
    #[must_use]
    pub fn with_pool(mut self, pool: ThreadPool) -> Self {
        self.pool = Some(pool);
        self
    }

    #[must_use]
    pub fn tick_id(&self) -> u64 {
        self.tick_id
    }

    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Counters summed over every tick so far.
    #[must_use]
    pub fn totals(&self) -> FrameStats {
        self.totals
    }

    /// Run one tick of the simulation.
    ///
    /// # Errors
    ///
    /// Propagates pipeline failures; the tick counter still advances.
    pub fn tick(&mut self, dt: f64) -> Result<FrameStats, PhysicsError> {
        self.tick_id += 1;
        let stats = self.scene.step(&self.pipeline, dt as f32, self.pool.as_ref())?;

        self.totals.bodies = stats.bodies;
        self.totals.candidate_pairs += stats.candidate_pairs;
        self.totals.contacts += stats.contacts;
        self.totals.written_back += stats.written_back;

        debug!(
            tick_id = self.tick_id,
            dt,
            bodies = stats.bodies,
            pairs = stats.candidate_pairs,
            contacts = stats.contacts,
            "tick"
        );
        Ok(stats)
    }

    /// Run the tick loop for the configured number of ticks, or indefinitely.
    ///
    /// # Errors
    ///
    /// Stops at the first failing tick.
    pub fn run(&mut self) -> Result<(), PhysicsError> {
        let tick_duration = Duration::from_secs_f64(1.0 / self.config.tick_rate);
        let mut tick_count = 0u64;

        info!(
            tick_rate = self.config.tick_rate,
            max_ticks = self.config.max_ticks,
            "starting tick loop"
        );

        loop {
            let start = Instant::now();

            self.tick(tick_duration.as_secs_f64())?;

            tick_count += 1;
            if self.config.max_ticks > 0 && tick_count >= self.config.max_ticks {
                info!(ticks = tick_count, "tick loop complete");
                return Ok(());
            }

            let elapsed = start.elapsed();
            if elapsed > tick_duration {
                warn!(
                    tick_id = self.tick_id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = tick_duration.as_millis() as u64,
                    "tick exceeded time budget"
                );
            } else if self.config.realtime {
                std::thread::sleep(tick_duration - elapsed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use engine_physics::PhysicsConfig;

    use super::*;

    fn tick_loop(config: TickConfig) -> TickLoop {
        let pipeline = PhysicsPipeline::new(PhysicsConfig::default()).unwrap();
        TickLoop::new(config, Scene::demo(3).unwrap(), pipeline)
    }

    #[test]
    fn test_tick_advances_counter() {
        let mut tick_loop = tick_loop(TickConfig::default());
        assert_eq!(tick_loop.tick_id(), 0);
        tick_loop.tick(1.0 / 60.0).unwrap();
        assert_eq!(tick_loop.tick_id(), 1);
        let stats = tick_loop.tick(1.0 / 60.0).unwrap();
        assert_eq!(tick_loop.tick_id(), 2);
        // ground, three crates, player, marker
        assert_eq!(stats.bodies, 6);
        assert_eq!(stats.written_back, 6);
    }

    #[test]
    fn test_run_limited_ticks() {
        let config = TickConfig {
            tick_rate: 1000.0, // fast for testing
            max_ticks: 5,
            realtime: true,
        };
        let mut tick_loop = tick_loop(config);
        tick_loop.run().unwrap();
        assert_eq!(tick_loop.tick_id(), 5);
        assert_eq!(tick_loop.totals().written_back, 30);
    }

    #[test]
    fn test_pool_and_serial_runs_agree() {
        let config = TickConfig {
            max_ticks: 20,
            realtime: false,
            ..TickConfig::default()
        };
        let pipeline = PhysicsPipeline::new(PhysicsConfig::default().with_parallel_threshold(0))
            .unwrap();
        let pool = rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap();
        let mut parallel =
            TickLoop::new(config.clone(), Scene::demo(6).unwrap(), pipeline).with_pool(pool);
        let mut serial = tick_loop(TickConfig {
            realtime: false,
            ..config
        });
        serial.scene = Scene::demo(6).unwrap();

        parallel.run().unwrap();
        serial.run().unwrap();
        assert_eq!(parallel.scene().positions(), serial.scene().positions());
    }
}
