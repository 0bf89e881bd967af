//! Fire cellular automaton (§4.4, component D).
//!
//! Supplements the teacher's repertoire — it has no hazard simulation — so
//! this module is grounded instead on the general grid-buffer idiom used by
//! [`crate::grid::PassabilityGrid`] and the teacher's `FlowField::cost_field`:
//! a flat `Vec` indexed by `row * cols + col`.

use crate::grid::PassabilityGrid;

pub const SPREAD_RATE: f64 = 0.18; // accumulator units per second

pub struct FireGrid {
    rows: usize,
    cols: usize,
    burning: Vec<bool>,
    accum: Vec<f64>,
    burning_count: usize,
    pub fire_start_time: Option<f64>,
}

impl FireGrid {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            burning: vec![false; rows * cols],
            accum: vec![0.0; rows * cols],
            burning_count: 0,
            fire_start_time: None,
        }
    }

    #[inline]
    fn index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    pub fn is_burning(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols && self.burning[self.index(row, col)]
    }

    pub fn accum_at(&self, row: usize, col: usize) -> f64 {
        self.accum[self.index(row, col)]
    }

    pub fn burning_count(&self) -> usize {
        self.burning_count
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns `true` if this is the first ignition of the run (the caller
    /// uses this to decide whether to trigger evacuation, §4.4).
    pub fn ignite(&mut self, row: usize, col: usize, sim_time: f64, passable: &PassabilityGrid) -> bool {
        if row >= self.rows || col >= self.cols || !passable.is_passable(row, col) {
            return false;
        }
        let idx = self.index(row, col);
        let was_first = self.fire_start_time.is_none();
        if !self.burning[idx] {
            self.burning[idx] = true;
            self.burning_count += 1;
        }
        self.accum[idx] = 0.0;
        if was_first {
            self.fire_start_time = Some(sim_time);
        }
        was_first
    }

    /// Flip a burning cell out and reset its accumulator, used both by the
    /// firefighter sub-engine's extinguish action and by tests.
    pub fn extinguish(&mut self, row: usize, col: usize) {
        if row >= self.rows || col >= self.cols {
            return;
        }
        let idx = self.index(row, col);
        if self.burning[idx] {
            self.burning[idx] = false;
            self.burning_count = self.burning_count.saturating_sub(1);
        }
        self.accum[idx] = 0.0;
    }

    pub fn reset_accum(&mut self, row: usize, col: usize) {
        if row < self.rows && col < self.cols {
            self.accum[self.index(row, col)] = 0.0;
        }
    }

    /// Propagate to 4-neighbours of every burning cell, per §4.4.
    pub fn spread(&mut self, dt: f64, passable: &PassabilityGrid) {
        if self.burning_count == 0 {
            return;
        }

        let burning_now: Vec<(usize, usize)> = (0..self.rows)
            .flat_map(|r| (0..self.cols).map(move |c| (r, c)))
            .filter(|&(r, c)| self.burning[self.index(r, c)])
            .collect();

        let mut newly_ignited = Vec::new();

        for (r, c) in burning_now {
            for (nr, nc) in four_neighbors(r, c, self.rows, self.cols) {
                if self.burning[self.index(nr, nc)] || !passable.is_passable(nr, nc) {
                    continue;
                }
                let idx = self.index(nr, nc);
                self.accum[idx] += dt * SPREAD_RATE;
                if self.accum[idx] >= 1.0 {
                    newly_ignited.push((nr, nc));
                }
            }
        }

        for (r, c) in newly_ignited {
            let idx = self.index(r, c);
            if !self.burning[idx] {
                self.burning[idx] = true;
                self.burning_count += 1;
            }
            self.accum[idx] = 0.0;
        }
    }
}

pub(crate) fn four_neighbors(
    row: usize,
    col: usize,
    rows: usize,
    cols: usize,
) -> impl Iterator<Item = (usize, usize)> {
    let row = row as isize;
    let col = col as isize;
    [(-1isize, 0isize), (1, 0), (0, -1), (0, 1)]
        .into_iter()
        .filter_map(move |(dr, dc)| {
            let r = row + dr;
            let c = col + dc;
            if r >= 0 && c >= 0 && (r as usize) < rows && (c as usize) < cols {
                Some((r as usize, c as usize))
            } else {
                None
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignition_only_occurs_on_passable_cells() {
        let passable = PassabilityGrid::build(5.0, 5.0, &[]);
        let mut fire = FireGrid::new(passable.rows, passable.cols);
        assert!(fire.ignite(2, 2, 0.0, &passable));
        assert!(fire.is_burning(2, 2));
        assert_eq!(fire.burning_count(), 1);
    }

    #[test]
    fn only_first_ignition_reports_true_and_sets_start_time() {
        let passable = PassabilityGrid::build(5.0, 5.0, &[]);
        let mut fire = FireGrid::new(passable.rows, passable.cols);
        assert!(fire.ignite(1, 1, 10.0, &passable));
        assert!(!fire.ignite(2, 2, 11.0, &passable));
        assert_eq!(fire.fire_start_time, Some(10.0));
    }

    #[test]
    fn spread_ignites_adjacent_passable_cells_once_accum_saturates() {
        let passable = PassabilityGrid::build(5.0, 5.0, &[]);
        let mut fire = FireGrid::new(passable.rows, passable.cols);
        fire.ignite(2, 2, 0.0, &passable);

        // accum reaches 1.0 after ceil(1 / (0.18 * dt)) steps; use dt=1.0 (> spec's
        // 0.05s cap, fine for unit isolation) so a handful of ticks saturate it.
        for _ in 0..6 {
            fire.spread(1.0, &passable);
        }
        assert!(fire.is_burning(1, 2) || fire.is_burning(3, 2) || fire.is_burning(2, 1) || fire.is_burning(2, 3));
    }

    #[test]
    fn fire_never_spreads_into_walls() {
        use crate::geometry::{Rect, Vec2};
        let wall = Rect::new(Vec2::new(3.0, 2.0), Vec2::new(4.0, 3.0));
        let passable = PassabilityGrid::build(5.0, 5.0, &[wall]);
        let mut fire = FireGrid::new(passable.rows, passable.cols);
        fire.ignite(2, 2, 0.0, &passable);
        for _ in 0..50 {
            fire.spread(0.5, &passable);
        }
        assert!(!fire.is_burning(2, 3));
    }
}
