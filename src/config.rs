//! Simulation configuration surface (§3 "Simulation config").
//!
//! Grounded on the teacher's `game::config::GameConfig`: one flat,
//! `serde`-deserializable settings struct. The teacher loads it as a Bevy
//! `Asset` through `bevy_common_assets`'s RON plugin; this crate has no
//! asset server (rendering/UI is out of core scope, §1), so `SimConfig`
//! round-trips through plain `ron::from_str` / `ron::ser::to_string_pretty`
//! instead.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrivalMode {
    Burst,
    Linear,
    Gaussian,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    pub n: u32,
    pub arrival_mode: ArrivalMode,
    pub arrival_duration_minutes: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeedConfig {
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

impl SpeedConfig {
    /// `(max - min) / 4`, the standard deviation the spawn controller uses
    /// for its clamped-normal speed draw (§4.9).
    pub fn std_dev(&self) -> f64 {
        (self.max - self.min) / 4.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrowdConfig {
    pub personal_space: f64,
    pub avoidance_strength: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvacuationConfig {
    pub enabled: bool,
    pub trigger_time_secs: f64,
    pub panic_speed_multiplier: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub warning_density: f64,
    pub danger_density: f64,
    pub heatmap_cell_size: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    pub min_n: u32,
    pub max_n: u32,
    pub step: u32,
    pub p95_egress_limit_minutes: f64,
    pub warning_time_limit_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    pub population: PopulationConfig,
    pub speed: SpeedConfig,
    pub crowd: CrowdConfig,
    pub queue_enabled: bool,
    pub evacuation: EvacuationConfig,
    pub thresholds: ThresholdConfig,
    pub sweep: SweepConfig,
    /// RNG seed for this run (§9 "Ambient RNG → injected stream").
    pub rng_seed: u64,
}

impl SimConfig {
    pub fn load_ron(path: impl AsRef<std::path::Path>) -> Result<Self, crate::error::LayoutError> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|source| crate::error::LayoutError::Io {
                path: path.display().to_string(),
                source,
            })?;
        Ok(ron::from_str(&text)?)
    }

    pub fn save_ron(&self, path: impl AsRef<std::path::Path>) -> Result<(), crate::error::LayoutError> {
        let pretty = ron::ser::PrettyConfig::default();
        let text = ron::ser::to_string_pretty(self, pretty)?;
        std::fs::write(path.as_ref(), text).map_err(|source| crate::error::LayoutError::Io {
            path: path.as_ref().display().to_string(),
            source,
        })
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            population: PopulationConfig {
                n: 50,
                arrival_mode: ArrivalMode::Linear,
                arrival_duration_minutes: 2.0,
            },
            speed: SpeedConfig {
                min: 0.8,
                mean: 1.3,
                max: 1.8,
            },
            crowd: CrowdConfig {
                personal_space: 0.5,
                avoidance_strength: 1.0,
            },
            queue_enabled: true,
            evacuation: EvacuationConfig {
                enabled: false,
                trigger_time_secs: f64::MAX,
                panic_speed_multiplier: 1.5,
            },
            thresholds: ThresholdConfig {
                warning_density: 2.0,
                danger_density: 4.0,
                heatmap_cell_size: 1.0,
            },
            sweep: SweepConfig {
                min_n: 50,
                max_n: 500,
                step: 50,
                p95_egress_limit_minutes: 6.0,
                warning_time_limit_pct: 20.0,
            },
            rng_seed: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn std_dev_matches_spec_formula() {
        let speed = SpeedConfig {
            min: 0.8,
            mean: 1.3,
            max: 1.8,
        };
        assert!((speed.std_dev() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn default_config_round_trips_through_ron() {
        let cfg = SimConfig::default();
        let text = ron::ser::to_string_pretty(&cfg, ron::ser::PrettyConfig::default())
            .expect("serialize");
        let back: SimConfig = ron::from_str(&text).expect("deserialize");
        assert_eq!(back.population.n, cfg.population.n);
        assert_eq!(back.population.arrival_mode, ArrivalMode::Linear);
    }
}
