//! Spawn controller (§4.9, component I).
//!
//! The teacher has no arrival-curve spawner of its own — its only spawn
//! paths are Bevy `Commands`-driven, one-shot batch helpers fired from input
//! (`game::stress_test::spawn_batch_at`, `game::control::debug`,
//! `game::unit::spawn_test_unit`), not a target-count curve evaluated against
//! elapsed time. The target-count-per-tick technique below (compute
//! `target(t)`, spawn the shortfall) is local logic with no teacher
//! analogue; only the surrounding style — a plain struct owning a counter,
//! `SimRng` for every stochastic draw — carries over from the rest of this
//! crate.

use crate::agent::Agent;
use crate::config::{ArrivalMode, SimConfig};
use crate::grid::PassabilityGrid;
use crate::layout::VenueLayout;
use crate::pathfinding;
use crate::queue::QueueManager;
use crate::rng::{normal_cdf, SimRng};

const ENTRANCE_ALONG_STRIP_JITTER: f64 = 0.4;
const ENTRANCE_DEPTH_JITTER: f64 = 0.25;

#[derive(Debug, Default)]
pub struct SpawnController {
    spawned_so_far: u32,
}

impl SpawnController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.spawned_so_far = 0;
    }

    pub fn spawned_so_far(&self) -> u32 {
        self.spawned_so_far
    }

    /// Target cumulative spawn count at time `t`, per §4.9's three curves.
    fn target_count(t: f64, cfg: &SimConfig) -> f64 {
        let n = cfg.population.n as f64;
        let duration_secs = cfg.population.arrival_duration_minutes * 60.0;
        match cfg.population.arrival_mode {
            ArrivalMode::Burst => n,
            ArrivalMode::Linear => {
                if duration_secs <= 0.0 {
                    n
                } else {
                    (t / duration_secs).min(1.0) * n
                }
            }
            ArrivalMode::Gaussian => {
                let mean = 0.5 * duration_secs;
                let std_dev = 0.2 * duration_secs;
                normal_cdf(t, mean, std_dev) * n
            }
        }
    }

    /// Spawns `⌊target(t)⌋ − spawned_so_far` agents this tick, assigning
    /// each a fresh id from `next_id` (incremented in place).
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &mut self,
        sim_time: f64,
        cfg: &SimConfig,
        layout: &VenueLayout,
        grid: &PassabilityGrid,
        queues: &QueueManager,
        rng: &mut SimRng,
        next_id: &mut u32,
    ) -> Vec<Agent> {
        if layout.entrances.is_empty() {
            return Vec::new();
        }

        let target = Self::target_count(sim_time, cfg).floor() as u32;
        let to_spawn = target.saturating_sub(self.spawned_so_far);
        let mut spawned = Vec::with_capacity(to_spawn as usize);

        for _ in 0..to_spawn {
            let entrance = &layout.entrances[rng.index(layout.entrances.len())];
            let along = rng.range(
                -ENTRANCE_ALONG_STRIP_JITTER * entrance.width,
                ENTRANCE_ALONG_STRIP_JITTER * entrance.width,
            );
            let depth = rng.range(-ENTRANCE_DEPTH_JITTER, ENTRANCE_DEPTH_JITTER);
            let pos_x = (entrance.position.x + along).clamp(0.0, layout.width);
            let pos_y = (entrance.position.y + depth).clamp(0.0, layout.height);
            let pos = crate::geometry::Vec2::new(pos_x, pos_y);

            let speed = rng.normal_clamped(cfg.speed.mean, cfg.speed.std_dev(), cfg.speed.min, cfg.speed.max);
            let radius = rng.range(crate::agent::MIN_RADIUS, crate::agent::MAX_RADIUS);

            let mut agent = Agent::new(*next_id, pos, radius, speed, sim_time);
            *next_id += 1;

            let target_attractor = crate::queue::select_attractor(&layout.attractors, queues, rng);
            agent.target_attractor = target_attractor;

            let goal = match target_attractor {
                Some(idx) => layout.attractors[idx].center,
                None => {
                    let blocked = Default::default();
                    match crate::layout::select_exit(&layout.exits, &blocked, pos) {
                        Some(exit_idx) => {
                            agent.target_exit = Some(exit_idx);
                            agent.state = crate::agent::AgentState::SeekingExit;
                            layout.exits[exit_idx].position
                        }
                        None => pos,
                    }
                }
            };

            let waypoints = pathfinding::plan(grid, (pos.x, pos.y), (goal.x, goal.y));
            agent.set_path(waypoints.into_iter().map(|(x, y)| crate::geometry::Vec2::new(x, y)).collect());

            spawned.push(agent);
        }

        self.spawned_so_far += to_spawn;
        spawned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::layout::{Entrance, Exit, VenueLayout};

    fn layout() -> VenueLayout {
        VenueLayout {
            version: 1,
            width: 10.0,
            height: 10.0,
            walls: vec![],
            entrances: vec![Entrance {
                id: "e0".into(),
                position: crate::geometry::Vec2::new(0.5, 5.0),
                width: 1.0,
            }],
            exits: vec![Exit {
                id: "x0".into(),
                position: crate::geometry::Vec2::new(9.5, 5.0),
                width: 1.0,
                capacity: 2.0,
            }],
            attractors: vec![],
        }
    }

    #[test]
    fn burst_mode_targets_full_population_at_t_zero() {
        let mut cfg = SimConfig::default();
        cfg.population.arrival_mode = ArrivalMode::Burst;
        cfg.population.n = 10;
        assert_eq!(SpawnController::target_count(0.0, &cfg), 10.0);
    }

    #[test]
    fn linear_mode_ramps_proportionally_to_elapsed_time() {
        let mut cfg = SimConfig::default();
        cfg.population.arrival_mode = ArrivalMode::Linear;
        cfg.population.n = 100;
        cfg.population.arrival_duration_minutes = 1.0;
        assert!((SpawnController::target_count(30.0, &cfg) - 50.0).abs() < 1e-9);
        assert_eq!(SpawnController::target_count(120.0, &cfg), 100.0);
    }

    #[test]
    fn spawns_shortfall_and_tracks_cumulative_count() {
        let layout = layout();
        let grid = PassabilityGrid::build(layout.width, layout.height, &[]);
        let queues = QueueManager::new(0);
        let mut rng = SimRng::from_seed(1);
        let mut next_id = 0u32;
        let mut cfg = SimConfig::default();
        cfg.population.arrival_mode = ArrivalMode::Burst;
        cfg.population.n = 5;

        let mut spawner = SpawnController::new();
        let spawned = spawner.update(0.0, &cfg, &layout, &grid, &queues, &mut rng, &mut next_id);
        assert_eq!(spawned.len(), 5);
        assert_eq!(spawner.spawned_so_far(), 5);

        let none_more = spawner.update(0.01, &cfg, &layout, &grid, &queues, &mut rng, &mut next_id);
        assert!(none_more.is_empty());
    }

    #[test]
    fn no_entrances_means_no_spawns() {
        let mut layout = layout();
        layout.entrances.clear();
        let grid = PassabilityGrid::build(layout.width, layout.height, &[]);
        let queues = QueueManager::new(0);
        let mut rng = SimRng::from_seed(1);
        let mut next_id = 0u32;
        let mut cfg = SimConfig::default();
        cfg.population.n = 5;

        let mut spawner = SpawnController::new();
        let spawned = spawner.update(0.0, &cfg, &layout, &grid, &queues, &mut rng, &mut next_id);
        assert!(spawned.is_empty());
    }
}
