//! Swarm demo
//!
//! Runs a headless swarm of agents through a sparse grid: agents drift around
//! (and sometimes out of) the grid, one update runs per simulated frame and
//! every query shape is exercised against the swarm each frame.
//!
//! Usage: `swarm_demo [config.toml|config.ron] [frames]`

use rand::Rng;
use sparse_grid::foundation::logging;
use sparse_grid::prelude::*;

const NUM_AGENTS: usize = 2000;
const DEFAULT_FRAMES: usize = 600;
const FRAME_TIME: f32 = 1.0 / 60.0;
const AGENT_SPEED: f32 = 400.0;
const REPORT_INTERVAL: usize = 120;
const SCAN_RADIUS: f32 = 600.0;

/// Errors that stop the demo
#[derive(thiserror::Error, Debug)]
enum DemoError {
    #[error("Failed to load grid config: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build grid: {0}")]
    Grid(#[from] GridError),
}

/// One simulated agent
struct Agent {
    position: Vec3,
    velocity: Vec3,
    grid: ObjectGridState,
}

impl GridObject for Agent {
    fn grid_location(&self) -> Vec3 {
        self.position
    }

    fn grid_state(&self) -> &ObjectGridState {
        &self.grid
    }

    fn grid_state_mut(&mut self) -> &mut ObjectGridState {
        &mut self.grid
    }
}

/// Running totals of query results
#[derive(Default)]
struct QueryStats {
    sphere: usize,
    capsule: usize,
    boxed: usize,
    rotated: usize,
    cone: usize,
}

struct SwarmApp {
    agents: HandleMap<Agent>,
    grid: SparseGrid<Handle>,
    world_min: Vec3,
    world_max: Vec3,
    stats: QueryStats,
    elapsed: f32,
}

impl SwarmApp {
    fn new(config: &SparseGridConfig) -> Result<Self, DemoError> {
        let grid = SparseGrid::new(config)?;

        // Let agents wander a little past the grid so boundary cells fill up
        let (width, height) = config.world_size();
        let margin = Vec3::new(width as f32 * 0.1, height as f32 * 0.1, 0.0);
        let origin = Vec3::new(config.origin.x as f32, config.origin.y as f32, -50.0);
        let world_min = origin - margin;
        let world_max = origin + Vec3::new(width as f32, height as f32, 100.0) + margin;

        Ok(Self {
            agents: HandleMap::new(),
            grid,
            world_min,
            world_max,
            stats: QueryStats::default(),
            elapsed: 0.0,
        })
    }

    fn spawn_agents(&mut self, count: usize) {
        let mut rng = rand::thread_rng();
        for _ in 0..count {
            let position = Vec3::new(
                rng.gen_range(self.world_min.x..self.world_max.x),
                rng.gen_range(self.world_min.y..self.world_max.y),
                rng.gen_range(self.world_min.z..self.world_max.z),
            );
            let heading = rng.gen_range(0.0..std::f32::consts::TAU);
            let velocity = Vec3::new(heading.cos(), heading.sin(), 0.0) * AGENT_SPEED * rng.gen_range(0.5..1.5);

            self.agents.insert(Agent {
                position,
                velocity,
                grid: ObjectGridState::new(),
            });
        }

        let registered = self.grid.register_all(&mut self.agents);
        log::debug!("Spawned {} agents, {} registered", count, registered);
    }

    fn move_agents(&mut self, delta_time: f32) {
        let (min, max) = (self.world_min, self.world_max);
        for agent in self.agents.values_mut() {
            agent.position += agent.velocity * delta_time;

            // Bounce off the simulation bounds
            for axis in 0..2 {
                if agent.position[axis] < min[axis] || agent.position[axis] > max[axis] {
                    agent.velocity[axis] = -agent.velocity[axis];
                    agent.position[axis] = agent.position[axis].clamp(min[axis], max[axis]);
                }
            }
        }
    }

    /// Despawn a few agents and spawn replacements to exercise registration churn
    fn churn(&mut self) {
        let mut rng = rand::thread_rng();
        let victims: Vec<Handle> = self
            .agents
            .keys()
            .filter(|_| rng.gen_bool(0.01))
            .collect();

        for &handle in &victims {
            self.grid.unregister(&mut self.agents, handle);
            self.agents.remove(handle);
        }

        if !victims.is_empty() {
            log::debug!("Despawned {} agents", victims.len());
            self.spawn_agents(victims.len());
        }
    }

    fn run_queries(&mut self) {
        let center = (self.world_min + self.world_max) * 0.5;
        let sweep = self.elapsed * 0.5;
        let direction = Vec3::new(sweep.cos(), sweep.sin(), 0.0);

        self.stats.sphere += self.grid.query_sphere(&self.agents, center, SCAN_RADIUS).len();
        self.stats.capsule += self
            .grid
            .query_capsule(&self.agents, center, direction, SCAN_RADIUS * 0.25, SCAN_RADIUS * 2.0)
            .len();
        self.stats.boxed += self
            .grid
            .query_box(&self.agents, center + direction * SCAN_RADIUS, Vec3::repeat(SCAN_RADIUS * 0.5))
            .len();
        self.stats.rotated += self
            .grid
            .query_rotated_box(
                &self.agents,
                center,
                Quat::from_axis_angle(&Vec3::z_axis(), sweep),
                Vec3::new(SCAN_RADIUS * 2.0, SCAN_RADIUS * 0.2, 100.0),
            )
            .len();
        self.stats.cone += self
            .grid
            .query_cone(&self.agents, center, direction, SCAN_RADIUS * 3.0, 0.35)
            .len();
    }

    fn report(&self, frame: usize) {
        let populations = self.grid.cell_populations();
        let busiest = populations.iter().copied().max().unwrap_or(0);
        let empty = populations.iter().filter(|&&count| count == 0).count();
        let memory = self.grid.memory_info();

        log::info!(
            "Frame {}: {} agents in {} cells, busiest cell {}, {} empty",
            frame,
            self.grid.len(),
            self.grid.cell_count(),
            busiest,
            empty
        );
        log::info!(
            "  Memory: registration {}/{} bytes, cells {}/{} bytes",
            memory.registration_used,
            memory.registration_allocated,
            memory.cell_used,
            memory.cell_allocated
        );

        #[cfg(feature = "grid-bounds")]
        if let Some(bounds) = self.grid.object_bounds().bounding_box() {
            log::debug!("  Object bounds: {:?} .. {:?}", bounds.min, bounds.max);
        }
    }

    fn run(&mut self, frames: usize) {
        self.spawn_agents(NUM_AGENTS);
        log::info!("Swarm of {} agents registered", self.grid.len());

        for frame in 1..=frames {
            self.elapsed += FRAME_TIME;
            self.move_agents(FRAME_TIME);
            self.churn();
            self.grid.update(&mut self.agents);
            self.run_queries();

            if frame % REPORT_INTERVAL == 0 {
                self.report(frame);
            }
        }

        let frames = frames.max(1) as f32;
        log::info!(
            "Average hits per frame: sphere {:.1}, capsule {:.1}, box {:.1}, rotated box {:.1}, cone {:.1}",
            self.stats.sphere as f32 / frames,
            self.stats.capsule as f32 / frames,
            self.stats.boxed as f32 / frames,
            self.stats.rotated as f32 / frames,
            self.stats.cone as f32 / frames,
        );

        self.grid.empty(&mut self.agents);
        log::info!("Grid emptied, {} agents still alive", self.agents.len());
    }
}

fn main() -> Result<(), DemoError> {
    logging::init_with_default_filter("info");

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => SparseGridConfig::load_from_file(path)?,
        None => SparseGridConfig::default(),
    };
    let frames = args
        .next()
        .and_then(|frames| frames.parse().ok())
        .unwrap_or(DEFAULT_FRAMES);

    println!("=== Sparse Grid Swarm Demo ===");
    println!("Grid: {config}");
    println!("Simulating {NUM_AGENTS} agents for {frames} frames (RUST_LOG=debug for more detail)");

    let mut app = SwarmApp::new(&config)?;
    app.run(frames);
    Ok(())
}
