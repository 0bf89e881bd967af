//! Deterministic RNG stream and the small set of numeric helpers (erf, the
//! normal CDF, a clamped normal sample) that lean on it.
//!
//! Design Notes §9: "Ambient RNG → injected stream." Every stochastic
//! decision in the kernel — entrance choice, attractor weighted draw, spawn
//! jitter, speed sampling — draws from one named [`SimRng`] rather than an
//! ambient thread-local generator, so a run is fully determined by its seed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub struct SimRng(StdRng);

impl SimRng {
    pub fn from_seed(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }

    pub fn uniform(&mut self) -> f64 {
        self.0.random::<f64>()
    }

    pub fn range(&mut self, lo: f64, hi: f64) -> f64 {
        if hi <= lo {
            return lo;
        }
        lo + self.uniform() * (hi - lo)
    }

    pub fn index(&mut self, len: usize) -> usize {
        self.0.random_range(0..len)
    }

    /// Box-Muller transform. No `rand_distr` dependency: the rest of the
    /// pack only ever samples distributions by hand (see e.g. the teacher's
    /// `editor::generation` terrain jitter), so a self-contained transform
    /// matches the corpus rather than pulling in a new crate for one call
    /// site.
    pub fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.uniform().max(1e-12);
        let u2 = self.uniform();
        let z0 = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
        mean + z0 * std_dev
    }

    pub fn normal_clamped(&mut self, mean: f64, std_dev: f64, lo: f64, hi: f64) -> f64 {
        self.normal(mean, std_dev).clamp(lo, hi)
    }
}

/// Abramowitz & Stegun 7.1.26 approximation, accurate to ~1.5e-7.
pub fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let t = 1.0 / (1.0 + P * x);
    let poly = ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t;
    sign * (1.0 - poly * (-x * x).exp())
}

/// Standard normal CDF `Φ(x; mean, std_dev)`, used by the Gaussian arrival
/// curve (§4.9).
pub fn normal_cdf(x: f64, mean: f64, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return if x >= mean { 1.0 } else { 0.0 };
    }
    0.5 * (1.0 + erf((x - mean) / (std_dev * std::f64::consts::SQRT_2)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_cdf_is_half_at_mean() {
        assert!((normal_cdf(5.0, 5.0, 2.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn normal_cdf_saturates_at_extremes() {
        assert!(normal_cdf(-1000.0, 0.0, 1.0) < 1e-6);
        assert!(normal_cdf(1000.0, 0.0, 1.0) > 1.0 - 1e-6);
    }

    #[test]
    fn same_seed_yields_same_stream() {
        let mut a = SimRng::from_seed(42);
        let mut b = SimRng::from_seed(42);
        for _ in 0..50 {
            assert_eq!(a.uniform(), b.uniform());
        }
    }

    #[test]
    fn normal_clamped_respects_bounds() {
        let mut rng = SimRng::from_seed(7);
        for _ in 0..1000 {
            let v = rng.normal_clamped(1.3, 10.0, 0.8, 2.0);
            assert!((0.8..=2.0).contains(&v));
        }
    }
}
