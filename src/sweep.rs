//! Sweep driver (§4.12, component L).
//!
//! Grounded on the teacher's `tests/performance_scaling.rs` harness — a loop
//! that builds a fresh world at increasing unit counts and ticks it a fixed
//! number of times, logging progress per scale — generalised here from a
//! perf benchmark into the spec's capacity sweep: a fresh [`SimulationKernel`]
//! per `N`, run to a simulated-time cap instead of a tick count, judged
//! against the three safety criteria instead of a frame-time budget.

use serde::Serialize;

use crate::config::SimConfig;
use crate::error::SweepError;
use crate::kernel::SimulationKernel;
use crate::layout::VenueLayout;

/// Fixed tick step the sweep always uses, independent of whatever `dt` a
/// host's own kernel is driven at (§4.12).
pub const SWEEP_DT: f64 = 0.05;

/// How long past the evacuation trigger the sweep waits for the venue to
/// empty before giving up on this `N` and moving to the next one.
const POST_EVACUATION_GRACE_SECONDS: f64 = 60.0;

#[derive(Debug, Clone, Serialize)]
pub struct SweepResult {
    pub n: u32,
    pub peak_density: f64,
    pub p95_egress_minutes: Option<f64>,
    pub time_above_warning_pct: f64,
    pub passed: bool,
}

pub struct SweepDriver {
    layout: VenueLayout,
    base_config: SimConfig,
}

impl SweepDriver {
    pub fn new(layout: VenueLayout, base_config: SimConfig) -> Self {
        Self { layout, base_config }
    }

    /// Validates sweep preconditions without running anything: at least one
    /// entrance and one exit (§7 "need at least one entrance and one exit"),
    /// and a well-formed `[minN, maxN]` step range.
    fn check_preconditions(&self) -> Result<(), SweepError> {
        if self.layout.entrances.is_empty() || self.layout.exits.is_empty() {
            return Err(SweepError::NoEntrancesOrExits);
        }
        let sweep = &self.base_config.sweep;
        if sweep.step == 0 || sweep.min_n > sweep.max_n {
            return Err(SweepError::InvalidBounds {
                min_n: sweep.min_n,
                max_n: sweep.max_n,
                step: sweep.step,
            });
        }
        Ok(())
    }

    /// Runs one abbreviated simulation at population `n` per §4.12: a fresh
    /// kernel with evacuation forced on, `evacuationTime = arrivalDuration +
    /// 2 min`, ticked at [`SWEEP_DT`] up to `(arrivalDuration + 10) * 60`
    /// simulated seconds, early-exiting once the venue has been empty for
    /// [`POST_EVACUATION_GRACE_SECONDS`] past the evacuation trigger.
    fn run_one(&self, n: u32) -> SweepResult {
        let mut cfg = self.base_config.clone();
        cfg.population.n = n;
        cfg.evacuation.enabled = true;
        let arrival_duration_secs = cfg.population.arrival_duration_minutes * 60.0;
        cfg.evacuation.trigger_time_secs = arrival_duration_secs + 120.0;

        let sim_duration = (cfg.population.arrival_duration_minutes + 10.0) * 60.0;

        let mut kernel = SimulationKernel::new(cfg.clone(), self.layout.clone())
            .expect("layout already validated by check_preconditions");
        kernel.start();

        let mut sim_time = 0.0;
        while sim_time < sim_duration {
            kernel.tick(SWEEP_DT);
            sim_time += SWEEP_DT;

            if kernel.is_evacuating()
                && sim_time > cfg.evacuation.trigger_time_secs + POST_EVACUATION_GRACE_SECONDS
                && kernel.active_agent_count() == 0
            {
                break;
            }
        }

        let metrics = kernel.get_metrics();
        let time_above_warning_pct = if sim_time > 0.0 {
            metrics.time_above_warning / sim_time * 100.0
        } else {
            0.0
        };
        let p95_egress_minutes = metrics.p95_egress_seconds.map(|s| s / 60.0);

        let peak_ok = metrics.peak_density <= cfg.thresholds.danger_density;
        let egress_ok = p95_egress_minutes
            .map(|m| m <= cfg.sweep.p95_egress_limit_minutes)
            .unwrap_or(true);
        let warning_ok = time_above_warning_pct <= cfg.sweep.warning_time_limit_pct;

        SweepResult {
            n,
            peak_density: metrics.peak_density,
            p95_egress_minutes,
            time_above_warning_pct,
            passed: peak_ok && egress_ok && warning_ok,
        }
    }

    /// Runs the full `[minN, maxN]` sweep, calling `on_progress` after each
    /// `N` completes (§4.12 "reports progress after each N").
    pub fn run(&self, mut on_progress: impl FnMut(&SweepResult)) -> Result<Vec<SweepResult>, SweepError> {
        self.check_preconditions()?;

        let sweep = &self.base_config.sweep;
        let mut results = Vec::new();
        let mut n = sweep.min_n;
        while n <= sweep.max_n {
            let result = self.run_one(n);
            tracing::info!(
                n = result.n,
                peak_density = result.peak_density,
                p95_egress_minutes = result.p95_egress_minutes,
                warning_pct = result.time_above_warning_pct,
                passed = result.passed,
                "sweep step complete"
            );
            on_progress(&result);
            results.push(result);
            n += sweep.step;
        }
        Ok(results)
    }

    /// Largest `N` in the sweep range whose result passed, if any (§GLOSSARY
    /// "Safe max N").
    pub fn safe_max_n(results: &[SweepResult]) -> Option<u32> {
        results.iter().filter(|r| r.passed).map(|r| r.n).max()
    }
}
