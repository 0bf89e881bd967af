//! Agent state machine and motion (§4.6, component F — the largest single
//! share of the kernel).
//!
//! Grounded on the teacher's `simulation::components` (plain `Component`
//! structs for position/velocity/collider) and `simulation::physics`
//! (`seek`, `apply_velocity` — steering-then-integrate, clamp, then
//! constrain to map bounds) translated from Bevy ECS queries into methods on
//! an owned `Agent` struct, per Design Notes §9 ("owned state + ids" instead
//! of entity/component indirection).

use serde::{Deserialize, Serialize};

use crate::fire::FireGrid;
use crate::geometry::{Rect, Vec2};
use crate::smoke::SmokeGrid;

pub const MIN_RADIUS: f64 = 0.22;
pub const MAX_RADIUS: f64 = 0.28;
pub const STEERING_TAU: f64 = 0.5;
pub const WAYPOINT_ARRIVAL_DIST: f64 = 0.6;
pub const STUCK_SPEED_THRESHOLD: f64 = 0.05;
pub const STUCK_TIME_LIMIT: f64 = 2.5;

const AGENT_REPULSION_A: f64 = 2.0;
const AGENT_REPULSION_B: f64 = 0.15;
const AGENT_QUERY_RADIUS_EXTRA: f64 = 1.5;
const WALL_REPULSION_A: f64 = 3.0;
const WALL_REPULSION_B: f64 = 0.1;
const WALL_REPULSION_RANGE: f64 = 1.5;
const FIRE_REPULSION_STRENGTH: f64 = 10.0;
const FIRE_REPULSION_DECAY: f64 = 0.4;
const FIRE_REPULSION_CELL_WINDOW: isize = 6;
const MAX_SPEED_MULTIPLIER: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    SeekingAttractor,
    Queuing,
    AtAttractor,
    SeekingExit,
    Evacuating,
    Exited,
}

#[derive(Debug, Clone)]
pub struct Agent {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f64,
    pub desired_speed: f64,
    pub state: AgentState,
    pub target_attractor: Option<usize>,
    pub target_exit: Option<usize>,
    pub path: Vec<Vec2>,
    pub path_index: usize,
    pub spawn_time: f64,
    pub exit_time: Option<f64>,
    pub at_until: Option<f64>,
    pub stuck_timer: f64,
}

impl Agent {
    pub fn new(id: u32, pos: Vec2, radius: f64, desired_speed: f64, spawn_time: f64) -> Self {
        Self {
            id,
            pos,
            vel: Vec2::ZERO,
            radius,
            desired_speed,
            state: AgentState::SeekingAttractor,
            target_attractor: None,
            target_exit: None,
            path: Vec::new(),
            path_index: 0,
            spawn_time,
            exit_time: None,
            at_until: None,
            stuck_timer: 0.0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state != AgentState::Exited
    }

    pub fn set_path(&mut self, waypoints: Vec<Vec2>) {
        self.path = waypoints;
        self.path_index = 0;
    }

    pub fn current_waypoint(&self) -> Option<Vec2> {
        self.path.get(self.path_index).copied()
    }

    /// `true` once the agent has consumed every waypoint (the "end-of-path"
    /// event in §4.6's transition table).
    pub fn path_finished(&self) -> bool {
        self.path.is_empty() || self.path_index >= self.path.len()
    }

    /// Advances to the next waypoint once within arrival distance, per
    /// §4.6's "advance to the next waypoint when within 0.6 m".
    pub fn advance_waypoint_if_arrived(&mut self) {
        if let Some(wp) = self.current_waypoint() {
            if self.pos.distance(wp) <= WAYPOINT_ARRIVAL_DIST {
                self.path_index += 1;
            }
        }
    }

    /// `v_des = speed * smoke_factor * unit(waypoint - position)`, zero if
    /// there is no current waypoint (§4.6).
    pub fn desired_velocity(&self, smoke: &SmokeGrid) -> Vec2 {
        let Some(wp) = self.current_waypoint() else {
            return Vec2::ZERO;
        };
        let dir = (wp - self.pos).normalize_or_zero();
        let s = smoke.at_world(self.pos.x, self.pos.y);
        let smoke_factor = if s > 0.15 { (1.0 - s * 0.65).max(0.35) } else { 1.0 };
        dir * (self.desired_speed * smoke_factor)
    }

    /// Steering force term: `(v_des - v) / tau`.
    pub fn steering_force(&self, v_des: Vec2) -> Vec2 {
        (v_des - self.vel) * (1.0 / STEERING_TAU)
    }

    /// Agent-agent repulsion summed over nearby `(position, radius)` pairs
    /// already filtered from the spatial hash.
    pub fn agent_repulsion_force(
        &self,
        neighbors: &[(Vec2, f64)],
        personal_space: f64,
        avoidance_strength: f64,
    ) -> Vec2 {
        let mut force = Vec2::ZERO;
        for &(other_pos, other_radius) in neighbors {
            let delta = self.pos - other_pos;
            let d = delta.length();
            if d < 1e-9 {
                continue;
            }
            let overlap = (self.radius + other_radius) - d;
            if overlap > -2.0 * personal_space {
                let n_hat = delta * (1.0 / d);
                let magnitude =
                    AGENT_REPULSION_A * avoidance_strength * (overlap / AGENT_REPULSION_B).exp();
                force += n_hat * magnitude;
            }
        }
        force
    }

    /// Neighbour query radius, per §4.6: "~6*radius + 1.5 m".
    pub fn neighbor_query_radius(&self) -> f64 {
        6.0 * self.radius + AGENT_QUERY_RADIUS_EXTRA
    }

    /// Wall repulsion summed over every wall rectangle within 1.5 m.
    pub fn wall_repulsion_force(&self, walls: &[Rect]) -> Vec2 {
        let mut force = Vec2::ZERO;
        for wall in walls {
            let closest = wall.closest_point(self.pos);
            let delta = self.pos - closest;
            let d = delta.length();
            if d < WALL_REPULSION_RANGE {
                let n_hat = if d > 1e-9 {
                    delta * (1.0 / d)
                } else {
                    Vec2::new(1.0, 0.0)
                };
                let magnitude = WALL_REPULSION_A * ((self.radius - d) / WALL_REPULSION_B).exp();
                force += n_hat * magnitude;
            }
        }
        force
    }

    /// Fire repulsion: scans a +/-6 cell window around the agent for
    /// burning cells.
    pub fn fire_repulsion_force(&self, fire: &FireGrid) -> Vec2 {
        let mut force = Vec2::ZERO;
        let center_col = self.pos.x.floor() as isize;
        let center_row = self.pos.y.floor() as isize;

        for dr in -FIRE_REPULSION_CELL_WINDOW..=FIRE_REPULSION_CELL_WINDOW {
            for dc in -FIRE_REPULSION_CELL_WINDOW..=FIRE_REPULSION_CELL_WINDOW {
                let row = center_row + dr;
                let col = center_col + dc;
                if row < 0 || col < 0 {
                    continue;
                }
                let (row, col) = (row as usize, col as usize);
                if !fire.is_burning(row, col) {
                    continue;
                }
                let cell_center = Vec2::new(col as f64 + 0.5, row as f64 + 0.5);
                let delta = self.pos - cell_center;
                let d = delta.length();
                if d < 1e-9 {
                    continue;
                }
                let n_hat = delta * (1.0 / d);
                force += n_hat * (FIRE_REPULSION_STRENGTH * (-d / FIRE_REPULSION_DECAY).exp());
            }
        }
        force
    }

    /// `v += f*dt`, clamp, `pos += v*dt`, clamp to venue, resolve wall
    /// penetration by shortest-axis pushout (zeroing the velocity component
    /// driven into the wall), per §4.6's "Integration".
    pub fn integrate(&mut self, force: Vec2, dt: f64, venue_width: f64, venue_height: f64, walls: &[Rect]) {
        self.vel += force * dt;
        self.vel = self.vel.clamp_length(MAX_SPEED_MULTIPLIER * self.desired_speed);
        self.pos += self.vel * dt;

        self.pos.x = self.pos.x.clamp(self.radius, venue_width - self.radius);
        self.pos.y = self.pos.y.clamp(self.radius, venue_height - self.radius);

        for wall in walls {
            self.resolve_wall_penetration(wall);
        }

        if self.vel.length() < STUCK_SPEED_THRESHOLD {
            self.stuck_timer += dt;
        } else {
            self.stuck_timer = 0.0;
        }
    }

    fn resolve_wall_penetration(&mut self, wall: &Rect) {
        if !wall.contains(self.pos) {
            return;
        }
        // Shortest-axis pushout: distance to each of the four edges, move
        // along whichever is smallest, and zero the velocity component
        // driven into that edge.
        let left = self.pos.x - wall.min.x;
        let right = wall.max.x - self.pos.x;
        let bottom = self.pos.y - wall.min.y;
        let top = wall.max.y - self.pos.y;

        let min_dist = left.min(right).min(bottom).min(top);
        if min_dist == left {
            self.pos.x = wall.min.x;
            if self.vel.x > 0.0 {
                self.vel.x = 0.0;
            }
        } else if min_dist == right {
            self.pos.x = wall.max.x;
            if self.vel.x < 0.0 {
                self.vel.x = 0.0;
            }
        } else if min_dist == bottom {
            self.pos.y = wall.min.y;
            if self.vel.y > 0.0 {
                self.vel.y = 0.0;
            }
        } else {
            self.pos.y = wall.max.y;
            if self.vel.y < 0.0 {
                self.vel.y = 0.0;
            }
        }
    }

    /// `true` once `stuck_timer` exceeds §4.6's 2.5 s limit; the caller
    /// resets the timer and re-plans.
    pub fn is_stuck(&self) -> bool {
        self.stuck_timer > STUCK_TIME_LIMIT
    }
}
