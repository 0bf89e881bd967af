//! Firefighter sub-engine (§4.8, component H).
//!
//! The teacher has no rescue-unit AI; this is grounded instead on its real
//! unit-movement primitives — `game::simulation::physics::seek` (steer
//! toward a target at a desired speed with a time-constant force) and
//! `game::pathfinding::systems::process_path_requests` (resolve a path,
//! attach it, then follow it waypoint by waypoint) — retargeted from combat
//! engagement to extinguish-on-arrival behaviour over the fire grid.

use crate::fire::FireGrid;
use crate::geometry::{Rect, Vec2};
use crate::grid::PassabilityGrid;
use crate::pathfinding;

pub const FF_COUNT: usize = 3;
pub const FF_RESPONSE_DELAY: f64 = 30.0;
pub const FF_RADIUS: f64 = 0.3;
const FF_SPEED: f64 = 1.6;
const FF_STEERING_TAU: f64 = 0.3;
const FF_WAYPOINT_ARRIVAL_DIST: f64 = 0.6;
const FF_EXTINGUISH_TIME: f64 = 1.5;
const FF_YOUNG_ACCUM_THRESHOLD: f64 = 0.6;
const FF_HOLD_DAMPING: f64 = 0.8;

#[derive(Debug, Clone)]
pub struct Firefighter {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub target_cell: Option<(usize, usize)>,
    pub path: Vec<Vec2>,
    pub path_index: usize,
    pub extinguishing: bool,
    pub extinguish_timer: f64,
}

impl Firefighter {
    fn new(id: u32, pos: Vec2) -> Self {
        Self {
            id,
            pos,
            vel: Vec2::ZERO,
            target_cell: None,
            path: Vec::new(),
            path_index: 0,
            extinguishing: false,
            extinguish_timer: 0.0,
        }
    }

    fn current_waypoint(&self) -> Option<Vec2> {
        self.path.get(self.path_index).copied()
    }

    fn advance_waypoint_if_arrived(&mut self) {
        if let Some(wp) = self.current_waypoint() {
            if self.pos.distance(wp) <= FF_WAYPOINT_ARRIVAL_DIST {
                self.path_index += 1;
            }
        }
    }

    fn path_finished(&self) -> bool {
        self.path.is_empty() || self.path_index >= self.path.len()
    }

    /// Same shortest-axis pushout as [`crate::agent::Agent`], applied with
    /// the firefighter's own radius (§4.8 "obey the same wall-pushout as
    /// agents with a 0.3 m radius").
    fn resolve_wall_penetration(&mut self, wall: &Rect) {
        if !wall.contains(self.pos) {
            return;
        }
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
}

/// Tracks whether the one-time firefighter spawn has already fired.
#[derive(Debug, Default)]
pub struct FirefighterEngine {
    spawned: bool,
    next_entrance: usize,
    next_id: u32,
}

impl FirefighterEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Spawns `FF_COUNT` firefighters, cycling `entrances` round-robin, the
    /// first time this is called `FF_RESPONSE_DELAY` seconds or more after
    /// `fire_start_time`. Returns the newly created units, or an empty
    /// vector if it is not yet time (or they were already spawned).
    pub fn maybe_spawn(&mut self, sim_time: f64, fire_start_time: Option<f64>, entrances: &[Vec2]) -> Vec<Firefighter> {
        if self.spawned || entrances.is_empty() {
            return Vec::new();
        }
        let Some(start) = fire_start_time else {
            return Vec::new();
        };
        if sim_time < start + FF_RESPONSE_DELAY {
            return Vec::new();
        }
        self.spawned = true;
        tracing::info!(sim_time, "spawning firefighters");

        let mut out = Vec::with_capacity(FF_COUNT);
        for _ in 0..FF_COUNT {
            let entrance = entrances[self.next_entrance % entrances.len()];
            self.next_entrance += 1;
            out.push(Firefighter::new(self.next_id, entrance));
            self.next_id += 1;
        }
        out
    }
}

fn nearest_burning_cell(from: Vec2, fire: &FireGrid) -> Option<(usize, usize)> {
    let from_col = from.x.floor() as isize;
    let from_row = from.y.floor() as isize;
    let mut best: Option<((usize, usize), i64)> = None;
    for row in 0..fire.rows() {
        for col in 0..fire.cols() {
            if !fire.is_burning(row, col) {
                continue;
            }
            let dr = row as isize - from_row;
            let dc = col as isize - from_col;
            let dist_sq = (dr * dr + dc * dc) as i64;
            if best.map_or(true, |(_, b)| dist_sq < b) {
                best = Some(((row, col), dist_sq));
            }
        }
    }
    best.map(|(cell, _)| cell)
}

fn eight_neighbors(row: usize, col: usize, rows: usize, cols: usize) -> impl Iterator<Item = (usize, usize)> {
    let row = row as isize;
    let col = col as isize;
    const OFFSETS: [(isize, isize); 8] = [
        (-1, -1),
        (-1, 0),
        (-1, 1),
        (0, -1),
        (0, 1),
        (1, -1),
        (1, 0),
        (1, 1),
    ];
    OFFSETS.into_iter().filter_map(move |(dr, dc)| {
        let r = row + dr;
        let c = col + dc;
        if r >= 0 && c >= 0 && (r as usize) < rows && (c as usize) < cols {
            Some((r as usize, c as usize))
        } else {
            None
        }
    })
}

/// Advances every firefighter by one tick: hold-and-extinguish, re-target, or
/// follow path, per §4.8.
#[allow(clippy::too_many_arguments)]
pub fn update(
    firefighters: &mut [Firefighter],
    dt: f64,
    fire: &mut FireGrid,
    grid: &PassabilityGrid,
    walls: &[Rect],
    venue_width: f64,
    venue_height: f64,
) {
    for ff in firefighters.iter_mut() {
        if ff.extinguishing {
            ff.vel = ff.vel * FF_HOLD_DAMPING;
            ff.extinguish_timer -= dt;
            if ff.extinguish_timer <= 0.0 {
                if let Some((row, col)) = ff.target_cell {
                    fire.extinguish(row, col);
                    tracing::info!(row, col, "firefighter extinguished cell");
                    for (nr, nc) in eight_neighbors(row, col, fire.rows(), fire.cols()) {
                        if fire.is_burning(nr, nc) && fire.accum_at(nr, nc) < FF_YOUNG_ACCUM_THRESHOLD {
                            fire.extinguish(nr, nc);
                        } else {
                            fire.reset_accum(nr, nc);
                        }
                    }
                }
                ff.extinguishing = false;
                ff.target_cell = None;
                ff.path.clear();
                ff.path_index = 0;
            }
            continue;
        }

        let retarget = match ff.target_cell {
            None => true,
            Some((row, col)) => !fire.is_burning(row, col),
        };
        if retarget {
            match nearest_burning_cell(ff.pos, fire) {
                Some((row, col)) => {
                    let (cx, cy) = grid.cell_center(row, col);
                    let waypoints = pathfinding::plan(grid, (ff.pos.x, ff.pos.y), (cx, cy));
                    ff.path = waypoints.into_iter().map(|(x, y)| Vec2::new(x, y)).collect();
                    ff.path_index = 0;
                    ff.target_cell = Some((row, col));
                }
                None => {
                    ff.target_cell = None;
                    ff.path.clear();
                }
            }
            continue;
        }

        ff.advance_waypoint_if_arrived();
        if ff.path_finished() {
            ff.extinguishing = true;
            ff.extinguish_timer = FF_EXTINGUISH_TIME;
            ff.vel = Vec2::ZERO;
            continue;
        }

        let wp = ff.current_waypoint().expect("path not finished");
        let dir = (wp - ff.pos).normalize_or_zero();
        let v_des = dir * FF_SPEED;
        let force = (v_des - ff.vel) * (1.0 / FF_STEERING_TAU);
        ff.vel += force * dt;
        ff.vel = ff.vel.clamp_length(FF_SPEED);
        ff.pos += ff.vel * dt;
        ff.pos.x = ff.pos.x.clamp(FF_RADIUS, venue_width - FF_RADIUS);
        ff.pos.y = ff.pos.y.clamp(FF_RADIUS, venue_height - FF_RADIUS);
        for wall in walls {
            ff.resolve_wall_penetration(wall);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn does_not_spawn_before_response_delay() {
        let mut engine = FirefighterEngine::new();
        let entrances = vec![Vec2::new(0.5, 0.5)];
        assert!(engine.maybe_spawn(10.0, Some(0.0), &entrances).is_empty());
    }

    #[test]
    fn spawns_ff_count_units_once_after_delay() {
        let mut engine = FirefighterEngine::new();
        let entrances = vec![Vec2::new(0.5, 0.5), Vec2::new(9.5, 0.5)];
        let spawned = engine.maybe_spawn(30.0, Some(0.0), &entrances);
        assert_eq!(spawned.len(), FF_COUNT);
        assert!(engine.maybe_spawn(40.0, Some(0.0), &entrances).is_empty());
    }

    #[test]
    fn retargets_to_nearest_burning_cell() {
        let passable = PassabilityGrid::build(10.0, 10.0, &[]);
        let mut fire = FireGrid::new(passable.rows, passable.cols);
        fire.ignite(5, 5, 0.0, &passable);
        let mut ffs = vec![Firefighter::new(0, Vec2::new(0.5, 0.5))];
        update(&mut ffs, 0.05, &mut fire, &passable, &[], 10.0, 10.0);
        assert_eq!(ffs[0].target_cell, Some((5, 5)));
    }

    #[test]
    fn holds_position_and_extinguishes_after_timer_expires() {
        let passable = PassabilityGrid::build(5.0, 5.0, &[]);
        let mut fire = FireGrid::new(passable.rows, passable.cols);
        fire.ignite(2, 2, 0.0, &passable);
        let (cx, cy) = passable.cell_center(2, 2);
        let mut ff = Firefighter::new(0, Vec2::new(cx, cy));
        ff.target_cell = Some((2, 2));
        ff.extinguishing = true;
        ff.extinguish_timer = 0.01;
        let mut ffs = vec![ff];
        update(&mut ffs, 0.05, &mut fire, &passable, &[], 5.0, 5.0);
        assert!(!fire.is_burning(2, 2));
        assert!(!ffs[0].extinguishing);
    }

    #[test]
    fn firefighter_is_pushed_out_of_walls_like_an_agent() {
        let wall = Rect::new(Vec2::new(4.0, 0.0), Vec2::new(6.0, 10.0));
        let mut ff = Firefighter::new(0, Vec2::new(4.5, 5.0));
        ff.vel = Vec2::new(3.0, 0.0);
        ff.resolve_wall_penetration(&wall);
        assert!(ff.pos.x <= wall.min.x + 1e-9);
        assert_eq!(ff.vel.x, 0.0);
    }

    #[test]
    fn firefighter_following_a_path_is_pushed_out_of_a_wall_it_crosses() {
        let wall = Rect::new(Vec2::new(4.0, 0.0), Vec2::new(6.0, 10.0));
        let passable = PassabilityGrid::build(10.0, 10.0, &[wall]);
        let mut fire = FireGrid::new(passable.rows, passable.cols);
        fire.ignite(5, 8, 0.0, &passable);
        let mut ffs = vec![Firefighter::new(0, Vec2::new(0.5, 5.0))];
        for _ in 0..400 {
            update(&mut ffs, 0.05, &mut fire, &passable, &[wall], 10.0, 10.0);
        }
        assert!(!wall.contains(ffs[0].pos));
    }
}
