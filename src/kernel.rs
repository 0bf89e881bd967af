//! Simulation kernel (§4.11, component K).
//!
//! Grounded on the teacher's `game::GameWorld` — an owning root struct wired
//! up via a fixed `FixedUpdate`-schedule stage order — but with Bevy's
//! ECS/`App`/`Plugin` scheduling removed entirely per Design Notes §9: the
//! kernel is a plain struct with an explicit `tick(dt)` and never schedules
//! itself.

use std::collections::HashSet;

use serde::Serialize;

use crate::agent::{Agent, AgentState};
use crate::config::SimConfig;
use crate::error::LayoutError;
use crate::fire::FireGrid;
use crate::firefighter::{self, Firefighter, FirefighterEngine};
use crate::geometry::{Rect, Vec2};
use crate::grid::PassabilityGrid;
use crate::layout::VenueLayout;
use crate::metrics::MetricsAggregator;
use crate::pathfinding;
use crate::queue::QueueManager;
use crate::rng::SimRng;
use crate::smoke::SmokeGrid;
use crate::spatial_hash::SpatialHash;
use crate::spawn::SpawnController;

/// dt is clamped to this, per §5.
pub const MAX_DT: f64 = 0.05;

pub struct SimulationKernel {
    config: SimConfig,
    layout: VenueLayout,
    grid: PassabilityGrid,
    fire: FireGrid,
    smoke: SmokeGrid,
    spatial_hash: SpatialHash,
    agents: Vec<Agent>,
    queues: QueueManager,
    firefighters: Vec<Firefighter>,
    ff_engine: FirefighterEngine,
    spawner: SpawnController,
    metrics: MetricsAggregator,
    rng: SimRng,
    blocked_exits: HashSet<String>,
    sim_time: f64,
    running: bool,
    evacuating: bool,
    next_agent_id: u32,
    tick_count: u64,
}

impl SimulationKernel {
    pub fn new(config: SimConfig, layout: VenueLayout) -> Result<Self, LayoutError> {
        layout.validate()?;
        let wall_rects: Vec<Rect> = layout.walls.iter().map(|w| w.rect).collect();
        let grid = PassabilityGrid::build(layout.width, layout.height, &wall_rects);
        let fire = FireGrid::new(grid.rows, grid.cols);
        let smoke = SmokeGrid::new(grid.rows, grid.cols);
        let spatial_hash = SpatialHash::new(2.0 * config.crowd.personal_space);
        let metrics = MetricsAggregator::new(layout.width, layout.height, config.thresholds.heatmap_cell_size);
        let queues = QueueManager::new(layout.attractors.len());
        let rng = SimRng::from_seed(config.rng_seed);

        Ok(Self {
            config,
            layout,
            grid,
            fire,
            smoke,
            spatial_hash,
            agents: Vec::new(),
            queues,
            firefighters: Vec::new(),
            ff_engine: FirefighterEngine::new(),
            spawner: SpawnController::new(),
            metrics,
            rng,
            blocked_exits: HashSet::new(),
            sim_time: 0.0,
            running: false,
            evacuating: false,
            next_agent_id: 0,
            tick_count: 0,
        })
    }

    /// Clears agents, metrics, fire, queues and firefighters, and rebuilds
    /// the derived grids from the current layout/config, per §4.11.
    pub fn reset(&mut self) {
        let wall_rects: Vec<Rect> = self.layout.walls.iter().map(|w| w.rect).collect();
        self.grid = PassabilityGrid::build(self.layout.width, self.layout.height, &wall_rects);
        self.fire = FireGrid::new(self.grid.rows, self.grid.cols);
        self.smoke = SmokeGrid::new(self.grid.rows, self.grid.cols);
        self.spatial_hash = SpatialHash::new(2.0 * self.config.crowd.personal_space);
        self.metrics = MetricsAggregator::new(self.layout.width, self.layout.height, self.config.thresholds.heatmap_cell_size);
        self.queues = QueueManager::new(self.layout.attractors.len());
        self.agents.clear();
        self.firefighters.clear();
        self.ff_engine.reset();
        self.spawner.reset();
        self.rng = SimRng::from_seed(self.config.rng_seed);
        self.blocked_exits.clear();
        self.sim_time = 0.0;
        self.running = false;
        self.evacuating = false;
        self.next_agent_id = 0;
        self.tick_count = 0;
    }

    pub fn update_config(&mut self, config: SimConfig) {
        self.config = config;
    }

    pub fn update_layout(&mut self, layout: VenueLayout) -> Result<(), LayoutError> {
        layout.validate()?;
        self.layout = layout;
        self.reset();
        Ok(())
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_evacuating(&self) -> bool {
        self.evacuating
    }

    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn active_agent_count(&self) -> usize {
        self.agents.iter().filter(|a| a.is_active()).count()
    }

    /// Ignites the cell at `(x, y)`. Triggers evacuation immediately if this
    /// is the first ignition of the run, per §4.4.
    pub fn start_fire(&mut self, x: f64, y: f64) {
        let (row, col) = self.grid.world_to_cell(x, y);
        let first = self.fire.ignite(row, col, self.sim_time, &self.grid);
        if first {
            tracing::info!(x, y, "fire ignited");
            self.trigger_evacuation();
        }
    }

    /// Updates the blocked-exit set. Affected agents re-plan on their next
    /// `tick`, since the per-agent update phase re-validates its target exit
    /// every tick (§4.6).
    pub fn set_blocked_exits(&mut self, ids: HashSet<String>) {
        self.blocked_exits = ids;
    }

    pub fn blocked_exits(&self) -> &HashSet<String> {
        &self.blocked_exits
    }

    fn trigger_evacuation(&mut self) {
        if self.evacuating {
            return;
        }
        self.evacuating = true;
        tracing::info!(sim_time = self.sim_time, "evacuation triggered");

        let blocked = self.blocked_exits.clone();
        for i in 0..self.agents.len() {
            if !self.agents[i].is_active() || self.agents[i].state == AgentState::Evacuating {
                continue;
            }
            if let Some(idx) = self.agents[i].target_attractor.take() {
                match self.agents[i].state {
                    AgentState::Queuing => self.queues.remove(idx, self.agents[i].id),
                    AgentState::AtAttractor => self.queues.leave_service(idx),
                    _ => {}
                }
            }
            self.agents[i].state = AgentState::Evacuating;
            self.agents[i].at_until = None;
            self.agents[i].desired_speed *= self.config.evacuation.panic_speed_multiplier;
            replan_to_exit(&mut self.agents[i], &self.layout, &self.grid, &blocked);
        }
    }

    fn service_queues(&mut self) {
        for idx in 0..self.layout.attractors.len() {
            if !self.layout.attractors[idx].queueing {
                continue;
            }
            while let Some(agent_id) = self.queues.try_serve_next(idx) {
                let at_until = self.sim_time + self.layout.attractors[idx].service_time_secs;
                let agent = &mut self.agents[agent_id as usize];
                agent.state = AgentState::AtAttractor;
                agent.at_until = Some(at_until);
            }
        }
    }

    /// Advances the world by `dt` seconds (clamped to [`MAX_DT`]) through the
    /// phases listed in §2: evacuation check, fire spread, smoke diffusion,
    /// firefighter update, spawn, spatial hash rebuild, per-agent update,
    /// queue service, density computation, clock advance.
    pub fn tick(&mut self, dt: f64) {
        if !self.running {
            return;
        }
        let dt = dt.min(MAX_DT);

        if self.config.evacuation.enabled
            && !self.evacuating
            && self.sim_time >= self.config.evacuation.trigger_time_secs
        {
            self.trigger_evacuation();
        }

        self.fire.spread(dt, &self.grid);
        self.smoke.step(dt, &self.fire);

        let wall_rects: Vec<Rect> = self.layout.walls.iter().map(|w| w.rect).collect();

        let entrance_positions: Vec<Vec2> = self.layout.entrances.iter().map(|e| e.position).collect();
        let new_firefighters = self.ff_engine.maybe_spawn(self.sim_time, self.fire.fire_start_time, &entrance_positions);
        self.firefighters.extend(new_firefighters);
        firefighter::update(
            &mut self.firefighters,
            dt,
            &mut self.fire,
            &self.grid,
            &wall_rects,
            self.layout.width,
            self.layout.height,
        );

        let mut newly_spawned = self.spawner.update(
            self.sim_time,
            &self.config,
            &self.layout,
            &self.grid,
            &self.queues,
            &mut self.rng,
            &mut self.next_agent_id,
        );
        if self.evacuating {
            let blocked = self.blocked_exits.clone();
            for agent in newly_spawned.iter_mut() {
                agent.target_attractor = None;
                agent.state = AgentState::Evacuating;
                agent.desired_speed *= self.config.evacuation.panic_speed_multiplier;
                replan_to_exit(agent, &self.layout, &self.grid, &blocked);
            }
        }
        self.agents.extend(newly_spawned);

        self.spatial_hash.clear();
        for agent in self.agents.iter().filter(|a| a.is_active()) {
            self.spatial_hash.insert(agent.id, agent.pos.x, agent.pos.y);
        }

        for i in 0..self.agents.len() {
            if !self.agents[i].is_active() {
                continue;
            }
            let pos = self.agents[i].pos;
            let query_radius = self.agents[i].neighbor_query_radius();
            let neighbor_ids = self.spatial_hash.query(pos.x, pos.y, query_radius);
            let self_id = self.agents[i].id;
            let mut neighbors: Vec<(Vec2, f64)> = Vec::with_capacity(neighbor_ids.len());
            for &id in &neighbor_ids {
                if id == self_id {
                    continue;
                }
                let other = &self.agents[id as usize];
                neighbors.push((other.pos, other.radius));
            }

            let agent = &mut self.agents[i];
            if let Some((spawn_time, exit_time)) = step_agent(
                agent,
                dt,
                self.sim_time,
                &self.layout,
                &self.grid,
                &self.fire,
                &self.smoke,
                &wall_rects,
                &neighbors,
                &self.config,
                &mut self.queues,
                &self.blocked_exits,
            ) {
                self.metrics.record_exit(exit_time, spawn_time);
            }
        }

        self.service_queues();

        self.metrics.compute(
            &self.agents,
            dt,
            self.config.thresholds.warning_density,
            self.config.thresholds.danger_density,
        );
        self.metrics.snapshot_queue_lengths(&self.queues, self.layout.attractors.len());

        self.sim_time += dt;
        self.tick_count += 1;
        crate::profile_log!(
            self.tick_count,
            "[SIM STATUS] tick: {} | sim_time: {:.1} | agents: {} | firefighters: {} | evacuating: {}",
            self.tick_count,
            self.sim_time,
            self.active_agent_count(),
            self.firefighters.len(),
            self.evacuating,
        );
    }

    pub fn get_frame(&self) -> FrameSnapshot {
        let agents: Vec<AgentSnapshot> = self
            .agents
            .iter()
            .filter(|a| a.is_active())
            .map(|a| AgentSnapshot {
                id: a.id,
                x: a.pos.x,
                y: a.pos.y,
                vx: a.vel.x,
                vy: a.vel.y,
                radius: a.radius,
                state: a.state,
            })
            .collect();

        let firefighters: Vec<FirefighterSnapshot> = self
            .firefighters
            .iter()
            .map(|ff| FirefighterSnapshot {
                id: ff.id,
                x: ff.pos.x,
                y: ff.pos.y,
                extinguishing: ff.extinguishing,
                target_row: ff.target_cell.map(|(r, _)| r),
                target_col: ff.target_cell.map(|(_, c)| c),
            })
            .collect();

        let fire_grid: Vec<bool> = (0..self.fire.rows() * self.fire.cols())
            .map(|i| self.fire.is_burning(i / self.fire.cols(), i % self.fire.cols()))
            .collect();

        FrameSnapshot {
            agents,
            density_grid: self.metrics.density_grid().to_vec(),
            density_rows: self.metrics.rows(),
            density_cols: self.metrics.cols(),
            sim_time: self.sim_time,
            running: self.running,
            evacuating: self.evacuating,
            fire_rows: self.fire.rows(),
            fire_cols: self.fire.cols(),
            fire_grid: Some(fire_grid),
            smoke_grid: Some(self.smoke.as_slice().to_vec()),
            firefighters,
            blocked_exits: self.blocked_exits.iter().cloned().collect(),
            metrics: self.metrics_snapshot(),
        }
    }

    pub fn get_metrics(&self) -> MetricsSnapshot {
        self.metrics_snapshot()
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            peak_density: self.metrics.peak_density(),
            time_above_warning: self.metrics.time_above_warning(),
            time_above_danger: self.metrics.time_above_danger(),
            p95_egress_seconds: self.metrics.p95_egress_seconds(),
            exited_count: self.metrics.egress_times().len(),
            queue_lengths: self.metrics.queue_lengths().to_vec(),
        }
    }
}

fn replan_to_exit(agent: &mut Agent, layout: &VenueLayout, grid: &PassabilityGrid, blocked_exits: &HashSet<String>) {
    if let Some(idx) = crate::layout::select_exit(&layout.exits, blocked_exits, agent.pos) {
        agent.target_exit = Some(idx);
        let goal = layout.exits[idx].position;
        let waypoints = pathfinding::plan(grid, (agent.pos.x, agent.pos.y), (goal.x, goal.y));
        agent.set_path(waypoints.into_iter().map(|(x, y)| Vec2::new(x, y)).collect());
    }
}

/// Advances one agent's FSM transitions and motion for one tick. Returns
/// `Some((spawn_time, exit_time))` when this call absorbed the agent into an
/// exit, so the caller can record an egress time.
#[allow(clippy::too_many_arguments)]
fn step_agent(
    agent: &mut Agent,
    dt: f64,
    sim_time: f64,
    layout: &VenueLayout,
    grid: &PassabilityGrid,
    fire: &FireGrid,
    smoke: &SmokeGrid,
    wall_rects: &[Rect],
    neighbors: &[(Vec2, f64)],
    cfg: &SimConfig,
    queues: &mut QueueManager,
    blocked_exits: &HashSet<String>,
) -> Option<(f64, f64)> {
    if !agent.is_active() {
        return None;
    }

    match agent.state {
        AgentState::AtAttractor => {
            if let Some(at_until) = agent.at_until {
                if sim_time >= at_until {
                    if let Some(idx) = agent.target_attractor.take() {
                        queues.leave_service(idx);
                    }
                    agent.at_until = None;
                    agent.state = AgentState::SeekingExit;
                    replan_to_exit(agent, layout, grid, blocked_exits);
                }
            }
        }
        AgentState::Queuing => {
            // waits for the queue-service phase to promote it.
        }
        AgentState::SeekingAttractor => {
            agent.advance_waypoint_if_arrived();
            if agent.path_finished() {
                if let Some(idx) = agent.target_attractor {
                    let attractor = &layout.attractors[idx];
                    if cfg.queue_enabled && attractor.queueing {
                        queues.enqueue(idx, agent.id);
                        agent.state = AgentState::Queuing;
                    } else {
                        queues.enter_service_directly(idx);
                        agent.at_until = Some(sim_time + attractor.service_time_secs);
                        agent.state = AgentState::AtAttractor;
                    }
                }
            }
        }
        AgentState::SeekingExit | AgentState::Evacuating => {
            agent.advance_waypoint_if_arrived();
            let needs_replan = match agent.target_exit {
                Some(idx) => blocked_exits.contains(&layout.exits[idx].id),
                None => true,
            };
            if needs_replan {
                replan_to_exit(agent, layout, grid, blocked_exits);
            }
            if let Some(idx) = agent.target_exit {
                let exit = &layout.exits[idx];
                if !blocked_exits.contains(&exit.id) {
                    let radius = exit.absorption_radius(agent.radius);
                    if agent.pos.distance(exit.position) <= radius {
                        agent.state = AgentState::Exited;
                        agent.exit_time = Some(sim_time);
                        agent.vel = Vec2::ZERO;
                        return Some((agent.spawn_time, sim_time));
                    }
                }
            }
        }
        AgentState::Exited => return None,
    }

    if !agent.is_active() {
        return None;
    }

    if agent.is_stuck() {
        agent.stuck_timer = 0.0;
        match agent.state {
            AgentState::SeekingAttractor => {
                if let Some(idx) = agent.target_attractor {
                    let goal = layout.attractors[idx].center;
                    let waypoints = pathfinding::plan(grid, (agent.pos.x, agent.pos.y), (goal.x, goal.y));
                    agent.set_path(waypoints.into_iter().map(|(x, y)| Vec2::new(x, y)).collect());
                }
            }
            AgentState::SeekingExit | AgentState::Evacuating => {
                replan_to_exit(agent, layout, grid, blocked_exits);
            }
            _ => {}
        }
    }

    let v_des = agent.desired_velocity(smoke);
    let mut force = agent.steering_force(v_des);
    force += agent.agent_repulsion_force(neighbors, cfg.crowd.personal_space, cfg.crowd.avoidance_strength);
    force += agent.wall_repulsion_force(wall_rects);
    force += agent.fire_repulsion_force(fire);
    agent.integrate(force, dt, layout.width, layout.height, wall_rects);

    None
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentSnapshot {
    pub id: u32,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub radius: f64,
    pub state: AgentState,
}

#[derive(Debug, Clone, Serialize)]
pub struct FirefighterSnapshot {
    pub id: u32,
    pub x: f64,
    pub y: f64,
    pub extinguishing: bool,
    pub target_row: Option<usize>,
    pub target_col: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub peak_density: f64,
    pub time_above_warning: f64,
    pub time_above_danger: f64,
    pub p95_egress_seconds: Option<f64>,
    pub exited_count: usize,
    pub queue_lengths: Vec<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FrameSnapshot {
    pub agents: Vec<AgentSnapshot>,
    pub density_grid: Vec<f64>,
    pub density_rows: usize,
    pub density_cols: usize,
    pub sim_time: f64,
    pub running: bool,
    pub evacuating: bool,
    pub fire_rows: usize,
    pub fire_cols: usize,
    pub fire_grid: Option<Vec<bool>>,
    pub smoke_grid: Option<Vec<f64>>,
    pub firefighters: Vec<FirefighterSnapshot>,
    pub blocked_exits: Vec<String>,
    pub metrics: MetricsSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ArrivalMode, SimConfig};
    use crate::layout::{Attractor, Entrance, Exit, VenueLayout, Wall};

    fn open_room_layout() -> VenueLayout {
        VenueLayout {
            version: 1,
            width: 10.0,
            height: 10.0,
            walls: vec![],
            entrances: vec![Entrance {
                id: "e0".into(),
                position: Vec2::new(0.5, 5.0),
                width: 1.0,
            }],
            exits: vec![Exit {
                id: "x0".into(),
                position: Vec2::new(9.5, 5.0),
                width: 1.0,
                capacity: 2.0,
            }],
            attractors: vec![],
        }
    }

    fn fast_linear_config(n: u32) -> SimConfig {
        let mut cfg = SimConfig::default();
        cfg.population.n = n;
        cfg.population.arrival_mode = ArrivalMode::Linear;
        cfg.population.arrival_duration_minutes = 2.0;
        cfg.evacuation.enabled = false;
        cfg.queue_enabled = true;
        cfg
    }

    /// E1 — open room, single exit: everyone spawned over the arrival window
    /// eventually exits, with density staying under the spec's example cap.
    #[test]
    fn e1_open_room_all_agents_eventually_exit() {
        let layout = open_room_layout();
        let cfg = fast_linear_config(50);
        let mut kernel = SimulationKernel::new(cfg, layout).expect("valid layout");
        kernel.start();

        for _ in 0..12_000 {
            kernel.tick(0.05);
        }

        let metrics = kernel.get_metrics();
        assert_eq!(metrics.exited_count, 50);
        assert_eq!(kernel.active_agent_count(), 0);
        assert!(metrics.peak_density <= 1.5);
        assert_eq!(metrics.time_above_danger, 0.0);
    }

    /// E2 — fire ignition triggers evacuation within the same call.
    #[test]
    fn e2_fire_ignition_triggers_evacuation_immediately() {
        let mut layout = open_room_layout();
        layout.width = 20.0;
        layout.height = 20.0;
        layout.exits.push(Exit {
            id: "x1".into(),
            position: Vec2::new(19.5, 15.0),
            width: 1.0,
            capacity: 2.0,
        });
        let cfg = fast_linear_config(20);
        let mut kernel = SimulationKernel::new(cfg, layout).expect("valid layout");
        kernel.start();

        for _ in 0..1200 {
            kernel.tick(0.05);
        }
        assert!(!kernel.is_evacuating());

        kernel.start_fire(10.0, 10.0);
        assert!(kernel.is_evacuating());

        kernel.tick(0.05);
        for agent in kernel.agents.iter().filter(|a| a.is_active()) {
            assert_eq!(agent.state, AgentState::Evacuating);
        }
    }

    /// E3 — blocking the nearest exit mid-run reroutes active agents within
    /// one tick.
    #[test]
    fn e3_blocking_nearest_exit_reroutes_agents() {
        let mut layout = open_room_layout();
        layout.width = 20.0;
        layout.height = 20.0;
        layout.exits = vec![
            Exit { id: "near".into(), position: Vec2::new(5.0, 19.5), width: 1.0, capacity: 2.0 },
            Exit { id: "far".into(), position: Vec2::new(15.0, 19.5), width: 1.0, capacity: 2.0 },
        ];
        layout.entrances = vec![Entrance { id: "e0".into(), position: Vec2::new(10.0, 0.5), width: 1.0 }];
        let mut cfg = fast_linear_config(10);
        cfg.population.arrival_mode = ArrivalMode::Burst;
        let mut kernel = SimulationKernel::new(cfg, layout).expect("valid layout");
        kernel.start();
        kernel.tick(0.05);

        for agent in &kernel.agents {
            assert_eq!(agent.target_exit, Some(0));
        }

        let mut blocked = HashSet::new();
        blocked.insert("near".to_string());
        kernel.set_blocked_exits(blocked);
        kernel.tick(0.05);

        for agent in kernel.agents.iter().filter(|a| a.is_active()) {
            assert_eq!(agent.target_exit, Some(1));
        }
    }

    #[test]
    fn dt_above_cap_is_clamped() {
        let layout = open_room_layout();
        let cfg = fast_linear_config(0);
        let mut kernel = SimulationKernel::new(cfg, layout).expect("valid layout");
        kernel.start();
        let before = kernel.sim_time();
        kernel.tick(5.0);
        assert!((kernel.sim_time() - before - MAX_DT).abs() < 1e-12);
    }

    #[test]
    fn zero_population_spawns_no_agents() {
        let layout = open_room_layout();
        let cfg = fast_linear_config(0);
        let mut kernel = SimulationKernel::new(cfg, layout).expect("valid layout");
        kernel.start();
        for _ in 0..100 {
            kernel.tick(0.05);
        }
        assert_eq!(kernel.active_agent_count(), 0);
    }

    #[test]
    fn paused_kernel_does_not_advance() {
        let layout = open_room_layout();
        let cfg = fast_linear_config(10);
        let mut kernel = SimulationKernel::new(cfg, layout).expect("valid layout");
        // never started: `running` defaults to false.
        kernel.tick(0.05);
        assert_eq!(kernel.sim_time(), 0.0);
        assert_eq!(kernel.active_agent_count(), 0);
    }

    /// Property 9 — determinism: two fresh kernels with identical config,
    /// layout and RNG seed produce identical metric trajectories.
    #[test]
    fn e6_same_seed_yields_identical_metrics() {
        let layout = open_room_layout();
        let cfg = fast_linear_config(30);

        let mut a = SimulationKernel::new(cfg.clone(), layout.clone()).expect("valid layout");
        let mut b = SimulationKernel::new(cfg, layout).expect("valid layout");
        a.start();
        b.start();

        for _ in 0..2000 {
            a.tick(0.05);
            b.tick(0.05);
            assert_eq!(a.get_metrics().peak_density, b.get_metrics().peak_density);
            assert_eq!(a.active_agent_count(), b.active_agent_count());
        }
    }

    /// Property 1/2 — agents stay within venue bounds and out of walls.
    #[test]
    fn agents_stay_within_bounds_and_out_of_walls() {
        let mut layout = open_room_layout();
        layout.walls.push(Wall {
            id: "w0".into(),
            rect: Rect::new(Vec2::new(4.0, 0.0), Vec2::new(6.0, 8.0)),
        });
        let mut cfg = fast_linear_config(20);
        cfg.population.arrival_mode = ArrivalMode::Burst;
        let mut kernel = SimulationKernel::new(cfg, layout.clone()).expect("valid layout");
        kernel.start();

        for _ in 0..400 {
            kernel.tick(0.05);
            for agent in kernel.agents.iter().filter(|a| a.is_active()) {
                assert!(agent.pos.x >= agent.radius - 1e-6 && agent.pos.x <= layout.width - agent.radius + 1e-6);
                assert!(agent.pos.y >= agent.radius - 1e-6 && agent.pos.y <= layout.height - agent.radius + 1e-6);
                for wall in &layout.walls {
                    assert!(!wall.rect.contains(agent.pos));
                }
            }
        }
    }

    #[test]
    fn attractor_with_queueing_serves_one_at_a_time() {
        let mut layout = open_room_layout();
        layout.attractors.push(Attractor {
            id: "bar".into(),
            label: "Bar".into(),
            center: Vec2::new(5.0, 5.0),
            radius: 1.0,
            weight: 1.0,
            service_time_secs: 5.0,
            queueing: true,
            queue_capacity: 10,
        });
        let mut cfg = fast_linear_config(5);
        cfg.population.arrival_mode = ArrivalMode::Burst;
        let mut kernel = SimulationKernel::new(cfg, layout).expect("valid layout");
        kernel.start();

        for _ in 0..600 {
            kernel.tick(0.05);
            let serving = kernel.agents.iter().filter(|a| a.state == AgentState::AtAttractor).count();
            assert!(serving <= 1);
        }
    }
}
