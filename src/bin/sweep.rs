//! Reference host for [`venuesim::sweep::SweepDriver`] (§6 "CLI / host
//! contract", §9-R).
//!
//! Not part of the core: this binary owns everything the core explicitly
//! pushes out to a host — file I/O, progress printing, process exit codes.
//! Loads a venue layout and config from RON files (or falls back to a small
//! built-in demo venue when none are given) and prints each [`SweepResult`]
//! as it completes, followed by the safe max N.

use std::path::PathBuf;
use std::process::ExitCode;

use serde::Serialize;

use venuesim::config::SimConfig;
use venuesim::error::SweepError;
use venuesim::geometry::Vec2;
use venuesim::layout::{Attractor, Entrance, Exit, VenueLayout};
use venuesim::sweep::{SweepDriver, SweepResult};

/// On-disk shape for `--json-out`: the sweep results plus a completion
/// timestamp, mirroring the pack's own `TestCheckpoint` JSON report (see
/// `freddiehaddad-oxidized`'s file-logging and `peterlauritzson-peregrineRts`'s
/// `tests/performance_scaling.rs` checkpoint, both serialized the same way).
#[derive(Debug, Serialize)]
struct SweepReport {
    completed_at: String,
    results: Vec<SweepResult>,
    safe_max_n: Option<u32>,
}

fn demo_layout() -> VenueLayout {
    VenueLayout {
        version: 1,
        width: 30.0,
        height: 20.0,
        walls: vec![],
        entrances: vec![
            Entrance { id: "main-entrance".into(), position: Vec2::new(0.5, 10.0), width: 2.0 },
        ],
        exits: vec![
            Exit { id: "exit-north".into(), position: Vec2::new(15.0, 19.5), width: 2.0, capacity: 2.0 },
            Exit { id: "exit-south".into(), position: Vec2::new(15.0, 0.5), width: 2.0, capacity: 2.0 },
        ],
        attractors: vec![
            Attractor {
                id: "stage".into(),
                label: "Stage".into(),
                center: Vec2::new(22.0, 10.0),
                radius: 3.0,
                weight: 0.6,
                service_time_secs: 0.0,
                queueing: false,
                queue_capacity: 0,
            },
            Attractor {
                id: "bar".into(),
                label: "Bar".into(),
                center: Vec2::new(8.0, 4.0),
                radius: 1.5,
                weight: 0.3,
                service_time_secs: 20.0,
                queueing: true,
                queue_capacity: 15,
            },
            Attractor {
                id: "restrooms".into(),
                label: "Restrooms".into(),
                center: Vec2::new(8.0, 16.0),
                radius: 1.5,
                weight: 0.1,
                service_time_secs: 45.0,
                queueing: true,
                queue_capacity: 5,
            },
        ],
    }
}

struct Args {
    layout_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
    json_out: Option<PathBuf>,
    log_file: bool,
}

fn parse_args() -> Args {
    let mut layout_path = None;
    let mut config_path = None;
    let mut json_out = None;
    let mut log_file = false;
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--layout" => layout_path = it.next().map(PathBuf::from),
            "--config" => config_path = it.next().map(PathBuf::from),
            "--json-out" => json_out = it.next().map(PathBuf::from),
            "--log-file" => log_file = true,
            other => eprintln!("ignoring unrecognised argument: {other}"),
        }
    }
    Args { layout_path, config_path, json_out, log_file }
}

fn main() -> ExitCode {
    let args = parse_args();

    // held for the process lifetime: dropping it stops the non-blocking
    // file-writer thread and flushes buffered log lines.
    let _log_guard = if args.log_file {
        venuesim::logging::init_with_file(".", "venuesim-sweep.log")
    } else {
        venuesim::logging::init();
        None
    };

    let layout = match args.layout_path {
        Some(path) => match VenueLayout::load_ron(&path) {
            Ok(layout) => layout,
            Err(err) => {
                tracing::error!(path = %path.display(), %err, "failed to load layout");
                return ExitCode::FAILURE;
            }
        },
        None => {
            tracing::info!("no --layout given, using the built-in demo venue");
            demo_layout()
        }
    };

    let config = match args.config_path {
        Some(path) => match SimConfig::load_ron(&path) {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::error!(path = %path.display(), %err, "failed to load config");
                return ExitCode::FAILURE;
            }
        },
        None => SimConfig::default(),
    };

    let driver = SweepDriver::new(layout, config);

    println!("{:>8} {:>14} {:>16} {:>14} {:>8}", "N", "peak (p/m2)", "p95 egress (min)", "warn time (%)", "passed");

    let run_result = driver.run(|result| {
        println!(
            "{:>8} {:>14.3} {:>16} {:>14.2} {:>8}",
            result.n,
            result.peak_density,
            result
                .p95_egress_minutes
                .map(|m| format!("{:.2}", m))
                .unwrap_or_else(|| "-".to_string()),
            result.time_above_warning_pct,
            if result.passed { "yes" } else { "no" },
        );
    });

    match run_result {
        Ok(results) => {
            let safe_max_n = SweepDriver::safe_max_n(&results);
            match safe_max_n {
                Some(n) => println!("\nsafe max N: {n}"),
                None => println!("\nno N in the swept range satisfied all three safety criteria"),
            }

            if let Some(path) = args.json_out {
                let report = SweepReport {
                    completed_at: chrono::Utc::now().to_rfc3339(),
                    results,
                    safe_max_n,
                };
                match serde_json::to_string_pretty(&report) {
                    Ok(json) => {
                        if let Err(err) = std::fs::write(&path, json) {
                            tracing::error!(path = %path.display(), %err, "failed to write json report");
                            return ExitCode::FAILURE;
                        }
                    }
                    Err(err) => {
                        tracing::error!(%err, "failed to serialize sweep report");
                        return ExitCode::FAILURE;
                    }
                }
            }

            ExitCode::SUCCESS
        }
        Err(err @ SweepError::NoEntrancesOrExits) | Err(err @ SweepError::InvalidBounds { .. }) => {
            tracing::error!(%err, "sweep preconditions failed");
            ExitCode::FAILURE
        }
    }
}
