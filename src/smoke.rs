//! Smoke diffusion cellular automaton (§4.5, component E).
//!
//! Double-buffered per §5 ("allocate the smoke 'next' buffer once per
//! kernel instance"): `step` writes into an internal scratch buffer and
//! swaps it into place, rather than allocating a fresh `Vec` every tick.

use crate::fire::{four_neighbors, FireGrid};

pub const DIFFUSION_RATE: f64 = 0.06;
pub const DECAY_RATE: f64 = 0.018;
const HAS_SMOKE_THRESHOLD: f64 = 0.01;

pub struct SmokeGrid {
    rows: usize,
    cols: usize,
    intensity: Vec<f64>,
    scratch: Vec<f64>,
    pub has_smoke: bool,
}

impl SmokeGrid {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            intensity: vec![0.0; rows * cols],
            scratch: vec![0.0; rows * cols],
            has_smoke: false,
        }
    }

    #[inline]
    fn index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    pub fn at(&self, row: usize, col: usize) -> f64 {
        if row < self.rows && col < self.cols {
            self.intensity[self.index(row, col)]
        } else {
            0.0
        }
    }

    /// Looks up the cell containing world point `(x, y)`.
    pub fn at_world(&self, x: f64, y: f64) -> f64 {
        let col = x.floor().max(0.0) as usize;
        let row = y.floor().max(0.0) as usize;
        self.at(row, col)
    }

    /// Computes the next buffer and swaps it into place. Runs on the
    /// post-spread burning map, observed by agents only on the *next*
    /// phase, per §5's ordering guarantees.
    pub fn step(&mut self, dt: f64, fire: &FireGrid) {
        for row in 0..self.rows {
            for col in 0..self.cols {
                let idx = self.index(row, col);
                if fire.is_burning(row, col) {
                    self.scratch[idx] = 1.0;
                    continue;
                }
                let mut inflow = 0.0;
                for (nr, nc) in four_neighbors(row, col, self.rows, self.cols) {
                    inflow += self.intensity[self.index(nr, nc)] * DIFFUSION_RATE * dt;
                }
                let raised = (self.intensity[idx] + inflow).clamp(0.0, 1.0);
                self.scratch[idx] = raised * (1.0 - DECAY_RATE * dt);
            }
        }
        std::mem::swap(&mut self.intensity, &mut self.scratch);
        self.has_smoke = self.intensity.iter().any(|&v| v > HAS_SMOKE_THRESHOLD);
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.intensity
    }
}
