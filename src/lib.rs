//! Deterministic crowd-simulation kernel.
//!
//! Owns all simulation state (agents, fire/smoke grids, queues, firefighters)
//! and advances it one fixed step at a time via [`kernel::SimulationKernel::tick`].
//! The kernel never schedules itself: a host (a UI frame loop, a test harness,
//! or [`sweep::SweepDriver`]) is responsible for calling `tick` on a cadence of
//! its choosing.

pub mod agent;
pub mod config;
pub mod error;
pub mod fire;
pub mod firefighter;
pub mod geometry;
pub mod grid;
pub mod kernel;
pub mod layout;
pub mod logging;
pub mod metrics;
pub mod pathfinding;
pub mod queue;
pub mod rng;
pub mod smoke;
pub mod spatial_hash;
pub mod spawn;
pub mod sweep;

/// Conditionally log a message every 100 ticks when the `perf_stats` feature
/// is enabled. Compiles to nothing (and does not evaluate its arguments) when
/// the feature is off.
#[macro_export]
#[cfg(feature = "perf_stats")]
macro_rules! profile_log {
    ($tick:expr, $($arg:tt)*) => {
        if $tick % 100 == 0 {
            tracing::info!($($arg)*);
        }
    };
}

#[macro_export]
#[cfg(not(feature = "perf_stats"))]
macro_rules! profile_log {
    ($tick:expr, $($arg:tt)*) => {};
}
