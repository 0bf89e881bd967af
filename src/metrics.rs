//! Metrics aggregator (§4.10, component J).
//!
//! Grounded on [`crate::grid::PassabilityGrid`]'s flat-`Vec` raster idiom for
//! the density grid. The teacher has no running-statistics module of its
//! own; the never-goes-backwards running-max/accumulator bookkeeping here
//! (§7: "metrics never go backwards") is local logic with no teacher
//! analogue.

use crate::agent::Agent;
use crate::queue::QueueManager;

pub struct MetricsAggregator {
    cell_size: f64,
    rows: usize,
    cols: usize,
    density: Vec<f64>,
    peak_density: f64,
    time_above_warning: f64,
    time_above_danger: f64,
    egress_times: Vec<f64>,
    queue_lengths: Vec<usize>,
}

impl MetricsAggregator {
    pub fn new(width: f64, height: f64, cell_size: f64) -> Self {
        let cell_size = cell_size.max(1e-6);
        let cols = (width / cell_size).ceil().max(1.0) as usize;
        let rows = (height / cell_size).ceil().max(1.0) as usize;
        Self {
            cell_size,
            rows,
            cols,
            density: vec![0.0; rows * cols],
            peak_density: 0.0,
            time_above_warning: 0.0,
            time_above_danger: 0.0,
            egress_times: Vec::new(),
            queue_lengths: Vec::new(),
        }
    }

    pub fn reset(&mut self, width: f64, height: f64, cell_size: f64) {
        *self = Self::new(width, height, cell_size);
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn density_grid(&self) -> &[f64] {
        &self.density
    }

    pub fn peak_density(&self) -> f64 {
        self.peak_density
    }

    pub fn time_above_warning(&self) -> f64 {
        self.time_above_warning
    }

    pub fn time_above_danger(&self) -> f64 {
        self.time_above_danger
    }

    pub fn egress_times(&self) -> &[f64] {
        &self.egress_times
    }

    pub fn queue_lengths(&self) -> &[usize] {
        &self.queue_lengths
    }

    pub fn record_exit(&mut self, sim_time: f64, spawn_time: f64) {
        self.egress_times.push(sim_time - spawn_time);
    }

    pub fn snapshot_queue_lengths(&mut self, queues: &QueueManager, attractor_count: usize) {
        self.queue_lengths = (0..attractor_count).map(|i| queues.state(i).len()).collect();
    }

    #[inline]
    fn index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    /// Rebuilds the density grid in place (cleared, not reallocated) from
    /// the active agents, then rolls the running accumulators forward.
    pub fn compute(&mut self, agents: &[Agent], dt: f64, warning_density: f64, danger_density: f64) {
        self.density.iter_mut().for_each(|v| *v = 0.0);

        let per_agent = 1.0 / (self.cell_size * self.cell_size);
        for agent in agents {
            if !agent.is_active() {
                continue;
            }
            let col = ((agent.pos.x / self.cell_size).floor() as isize).clamp(0, self.cols as isize - 1) as usize;
            let row = ((agent.pos.y / self.cell_size).floor() as isize).clamp(0, self.rows as isize - 1) as usize;
            let idx = self.index(row, col);
            self.density[idx] += per_agent;
        }

        let tick_max = self.density.iter().cloned().fold(0.0_f64, f64::max);
        self.peak_density = self.peak_density.max(tick_max);

        if tick_max >= warning_density {
            self.time_above_warning += dt;
        }
        if tick_max >= danger_density {
            self.time_above_danger += dt;
        }
    }

    /// `idx = max(0, ceil(0.95 * n) - 1)` over a sorted copy of the egress
    /// times, per §4.10.
    pub fn p95_egress_seconds(&self) -> Option<f64> {
        if self.egress_times.is_empty() {
            return None;
        }
        let mut sorted = self.egress_times.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let n = sorted.len();
        let idx = ((0.95 * n as f64).ceil() as usize).saturating_sub(1).min(n - 1);
        Some(sorted[idx])
    }
}
