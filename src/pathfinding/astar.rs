//! 8-connected A* over the passability grid.
//!
//! Grounded on the teacher's `pathfinding::astar::find_path_astar_local_points`
//! (`BinaryHeap` open set keyed by f-score, `BTreeMap` for `came_from`/`g_score`,
//! a Euclidean `heuristic` helper, a `reconstruct_path` walking `came_from`
//! back to the start) — simplified to a single full-grid search, since the
//! venue grids here are small (≈1 m cells over a venue, not a strategy-game
//! map) and don't need the teacher's hierarchical cluster routing.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};

use crate::grid::PassabilityGrid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct Node {
    row: usize,
    col: usize,
}

/// Wraps an `f64` cost so it can live in a `BinaryHeap`, which requires
/// `Ord`. Costs here are always finite, so `partial_cmp().unwrap()` is safe.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Cost(f64);

impl Eq for Cost {}
impl PartialOrd for Cost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Cost {
    fn cmp(&self, other: &Self) -> Ordering {
        other.0.partial_cmp(&self.0).unwrap_or(Ordering::Equal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct State {
    cost: Cost,
    node: Node,
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost.cmp(&other.cost)
    }
}

const DIAGONAL: f64 = std::f64::consts::SQRT_2;

fn neighbors(n: Node, grid: &PassabilityGrid) -> impl Iterator<Item = (Node, f64)> + '_ {
    const OFFSETS: [(isize, isize, f64); 8] = [
        (-1, 0, 1.0),
        (1, 0, 1.0),
        (0, -1, 1.0),
        (0, 1, 1.0),
        (-1, -1, DIAGONAL),
        (-1, 1, DIAGONAL),
        (1, -1, DIAGONAL),
        (1, 1, DIAGONAL),
    ];
    OFFSETS.iter().filter_map(move |&(dr, dc, cost)| {
        let row = n.row as isize + dr;
        let col = n.col as isize + dc;
        if !grid.in_bounds(row, col) {
            return None;
        }
        let (row, col) = (row as usize, col as usize);
        if !grid.is_passable(row, col) {
            return None;
        }
        Some((Node { row, col }, cost))
    })
}

fn heuristic(a: Node, b: Node) -> f64 {
    let dr = a.row as f64 - b.row as f64;
    let dc = a.col as f64 - b.col as f64;
    (dr * dr + dc * dc).sqrt()
}

/// Search a 7x7 window around `goal` for the nearest passable cell,
/// measured by squared distance (§4.2 "Goal-cell repair").
fn nearest_passable(goal: Node, grid: &PassabilityGrid) -> Option<Node> {
    let mut best: Option<(Node, i64)> = None;
    for dr in -3isize..=3 {
        for dc in -3isize..=3 {
            let row = goal.row as isize + dr;
            let col = goal.col as isize + dc;
            if !grid.in_bounds(row, col) {
                continue;
            }
            let (row, col) = (row as usize, col as usize);
            if !grid.is_passable(row, col) {
                continue;
            }
            let dist_sq = dr * dr + dc * dc;
            if best.map_or(true, |(_, best_dist)| dist_sq < best_dist) {
                best = Some((Node { row, col }, dist_sq));
            }
        }
    }
    best.map(|(n, _)| n)
}

fn reconstruct(came_from: &BTreeMap<Node, Node>, mut current: Node) -> Vec<Node> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        current = prev;
        path.push(current);
    }
    path.reverse();
    path
}

/// Drop a middle waypoint iff the cross product of the two adjacent
/// segments is near zero (collinear), per §4.2's straight-line pruning.
fn prune_collinear(waypoints: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    if waypoints.len() < 3 {
        return waypoints;
    }
    let mut pruned = Vec::with_capacity(waypoints.len());
    pruned.push(waypoints[0]);
    for i in 1..waypoints.len() - 1 {
        let (ax, ay) = pruned[pruned.len() - 1];
        let (bx, by) = waypoints[i];
        let (cx, cy) = waypoints[i + 1];
        let v1 = (bx - ax, by - ay);
        let v2 = (cx - bx, cy - by);
        let cross = v1.0 * v2.1 - v1.1 * v2.0;
        if cross.abs() > 1e-6 {
            pruned.push(waypoints[i]);
        }
    }
    pruned.push(waypoints[waypoints.len() - 1]);
    pruned
}

/// Find a passable path from `start_world` to `goal_world`.
///
/// Returns waypoints as `(x, y)` world points: grid-cell centres for the
/// interior of the path, collinearity-pruned, with the exact goal as the
/// final waypoint. Empty only when start and goal fall in the same cell.
pub fn plan(grid: &PassabilityGrid, start_world: (f64, f64), goal_world: (f64, f64)) -> Vec<(f64, f64)> {
    let (start_row, start_col) = grid.world_to_cell(start_world.0, start_world.1);
    let (goal_row, goal_col) = grid.world_to_cell(goal_world.0, goal_world.1);
    let start = Node {
        row: start_row,
        col: start_col,
    };
    let mut goal = Node {
        row: goal_row,
        col: goal_col,
    };

    if start == goal {
        return Vec::new();
    }

    if !grid.is_passable(start.row, start.col) {
        return vec![goal_world];
    }

    if !grid.is_passable(goal.row, goal.col) {
        match nearest_passable(goal, grid) {
            Some(repaired) => goal = repaired,
            None => return vec![goal_world],
        }
    }

    let mut open = BinaryHeap::new();
    open.push(State {
        cost: Cost(0.0),
        node: start,
    });
    let mut came_from: BTreeMap<Node, Node> = BTreeMap::new();
    let mut g_score: BTreeMap<Node, f64> = BTreeMap::new();
    g_score.insert(start, 0.0);

    const MAX_ITERATIONS: usize = 200_000;
    let mut iterations = 0;

    while let Some(State { node: current, .. }) = open.pop() {
        iterations += 1;
        if iterations > MAX_ITERATIONS {
            tracing::warn!("A* exceeded max iterations from {:?} to {:?}", start, goal);
            return vec![goal_world];
        }

        if current == goal {
            let nodes = reconstruct(&came_from, current);
            let mut waypoints: Vec<(f64, f64)> =
                nodes.iter().map(|n| grid.cell_center(n.row, n.col)).collect();
            if let Some(last) = waypoints.last_mut() {
                *last = goal_world;
            }
            return prune_collinear(waypoints);
        }

        let current_g = g_score[&current];
        for (neighbor, step_cost) in neighbors(current, grid) {
            let tentative_g = current_g + step_cost;
            if tentative_g < *g_score.get(&neighbor).unwrap_or(&f64::MAX) {
                came_from.insert(neighbor, current);
                g_score.insert(neighbor, tentative_g);
                let f = tentative_g + heuristic(neighbor, goal);
                open.push(State {
                    cost: Cost(f),
                    node: neighbor,
                });
            }
        }
    }

    // Goal unreachable from start (disconnected region): fall back to a
    // direct waypoint, per §7 "unreachable goal".
    vec![goal_world]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Rect, Vec2};

    #[test]
    fn empty_path_when_start_and_goal_share_a_cell() {
        let grid = PassabilityGrid::build(10.0, 10.0, &[]);
        let path = plan(&grid, (1.1, 1.1), (1.9, 1.4));
        assert!(path.is_empty());
    }

    #[test]
    fn straight_line_path_in_open_room_ends_at_exact_goal() {
        let grid = PassabilityGrid::build(10.0, 10.0, &[]);
        let path = plan(&grid, (0.5, 5.0), (9.5, 5.0));
        assert!(!path.is_empty());
        let last = *path.last().unwrap();
        assert!((last.0 - 9.5).abs() < 1e-9 && (last.1 - 5.0).abs() < 1e-9);
    }

    #[test]
    fn path_cells_are_all_passable_except_possibly_the_goal() {
        let wall = Rect::new(Vec2::new(4.0, 0.0), Vec2::new(6.0, 8.0));
        let grid = PassabilityGrid::build(10.0, 10.0, &[wall]);
        let path = plan(&grid, (1.0, 5.0), (9.0, 5.0));
        assert!(!path.is_empty());
        for &(x, y) in &path[..path.len() - 1] {
            let (row, col) = grid.world_to_cell(x, y);
            assert!(grid.is_passable(row, col), "waypoint ({x},{y}) not passable");
        }
    }

    #[test]
    fn unreachable_goal_falls_back_to_direct_waypoint() {
        // Goal cell is walled off on all sides.
        let walls = vec![
            Rect::new(Vec2::new(4.0, 4.0), Vec2::new(7.0, 5.0)),
            Rect::new(Vec2::new(4.0, 5.0), Vec2::new(5.0, 7.0)),
            Rect::new(Vec2::new(6.0, 5.0), Vec2::new(7.0, 7.0)),
            Rect::new(Vec2::new(4.0, 6.0), Vec2::new(7.0, 7.0)),
        ];
        let grid = PassabilityGrid::build(10.0, 10.0, &walls);
        let path = plan(&grid, (1.0, 1.0), (5.5, 5.5));
        assert_eq!(path, vec![(5.5, 5.5)]);
    }

    #[test]
    fn goal_inside_wall_repairs_to_nearest_passable_cell() {
        let wall = Rect::new(Vec2::new(4.0, 4.0), Vec2::new(6.0, 6.0));
        let grid = PassabilityGrid::build(10.0, 10.0, &[wall]);
        let path = plan(&grid, (0.5, 0.5), (5.0, 5.0));
        assert!(!path.is_empty());
    }
}
