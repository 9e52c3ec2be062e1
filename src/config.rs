use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::calibration::{RaceSummary, TrackConstants};
use crate::tyres::Compound;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("total laps must be positive, got {0}")]
    NonPositiveLaps(u32),
    #[error("pit lap {pit_lap} outside [1, {total_laps}]")]
    PitLapOutOfRange { pit_lap: u32, total_laps: u32 },
    #[error("base lap time must be positive, got {0}")]
    NonPositiveBaseLap(f64),
    #[error("lap time noise std must be non-negative, got {0}")]
    NegativeLapStd(f64),
    #[error("pit loss must be positive, got {0}")]
    NonPositivePitLoss(f64),
    #[error("starting fuel must be non-negative, got {0}")]
    NegativeFuelLoad(f64),
    #[error("track degradation factor must be positive, got {0}")]
    NonPositiveDegFactor(f64),
    #[error("unknown tyre compound '{0}' (expected soft, medium or hard)")]
    UnknownCompound(String),
}

/// Immutable race setup. Built once, validated, then passed by reference
/// into the simulator, the Monte Carlo driver and the optimizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceConfiguration {
    /// Baseline lap time on a clear track with fresh tyres and no fuel (s)
    pub base_lap_s: f64,
    /// Standard deviation of the per-lap random term (s)
    pub lap_std_s: f64,
    /// Race length in laps
    pub total_laps: u32,
    /// Planned pit-stop lap
    pub pit_lap: u32,
    /// Time lost to a pit stop (s)
    pub pit_loss_s: f64,
    /// Engine stress multiplier (0.5 = conservative, 2.0 = push)
    pub engine_stress: f64,
    /// Base engine reliability (0.90-1.0)
    pub reliability: f64,
    /// Starting fuel load (kg)
    pub fuel_load_kg: f64,
    /// Starting tyre compound
    pub tyre_compound: Compound,
    /// Whether the stochastic safety-car process runs
    pub enable_safety_car: bool,
    /// Track abrasiveness multiplier for tyre degradation
    pub deg_factor: f64,
}

impl Default for RaceConfiguration {
    fn default() -> Self {
        Self {
            base_lap_s: 90.0,
            lap_std_s: 0.5,
            total_laps: 50,
            pit_lap: 25,
            pit_loss_s: 22.0,
            engine_stress: 1.0,
            reliability: 0.98,
            fuel_load_kg: 110.0,
            tyre_compound: Compound::Medium,
            enable_safety_car: true,
            deg_factor: 1.0,
        }
    }
}

impl RaceConfiguration {
    /// Load and validate a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: RaceConfiguration = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Fail fast on out-of-range fields, before any simulation starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_laps == 0 {
            return Err(ConfigError::NonPositiveLaps(self.total_laps));
        }
        if self.pit_lap < 1 || self.pit_lap > self.total_laps {
            return Err(ConfigError::PitLapOutOfRange {
                pit_lap: self.pit_lap,
                total_laps: self.total_laps,
            });
        }
        if self.base_lap_s <= 0.0 {
            return Err(ConfigError::NonPositiveBaseLap(self.base_lap_s));
        }
        if self.lap_std_s < 0.0 {
            return Err(ConfigError::NegativeLapStd(self.lap_std_s));
        }
        if self.pit_loss_s <= 0.0 {
            return Err(ConfigError::NonPositivePitLoss(self.pit_loss_s));
        }
        if self.fuel_load_kg < 0.0 {
            return Err(ConfigError::NegativeFuelLoad(self.fuel_load_kg));
        }
        if self.deg_factor <= 0.0 {
            return Err(ConfigError::NonPositiveDegFactor(self.deg_factor));
        }
        Ok(())
    }

    /// Seed baseline timing fields from a real-session summary. Only the
    /// four calibration numbers are copied; nothing else about the
    /// upstream data shape is consumed.
    pub fn apply_summary(&mut self, summary: &RaceSummary) {
        self.base_lap_s = summary.base_lap_s;
        self.lap_std_s = summary.lap_std_s;
        self.total_laps = summary.total_laps;
        if self.pit_lap > self.total_laps {
            self.pit_lap = self.total_laps / 2;
        }
    }

    /// Seed pit loss and track degradation factor from venue constants.
    pub fn apply_track_constants(&mut self, constants: &TrackConstants) {
        self.pit_loss_s = constants.pit_loss_s;
        self.deg_factor = constants.deg_factor;
    }
}
