use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::ConfigError;

/// Tyre compound choice. Selects a row of the degradation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compound {
    Soft,
    Medium,
    Hard,
}

impl Compound {
    pub const ALL: [Compound; 3] = [Compound::Soft, Compound::Medium, Compound::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Compound::Soft => "soft",
            Compound::Medium => "medium",
            Compound::Hard => "hard",
        }
    }
}

impl fmt::Display for Compound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Compound {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "soft" => Ok(Compound::Soft),
            "medium" => Ok(Compound::Medium),
            "hard" => Ok(Compound::Hard),
            other => Err(ConfigError::UnknownCompound(other.to_string())),
        }
    }
}

/// Per-compound behavior parameters.
///
/// * `grip_bonus_s` - Lap time delta vs medium (seconds, negative = faster)
/// * `base_deg_s` - Degradation penalty per stint lap before the cliff (s/lap)
/// * `cliff_lap` - Stint lap at which wear changes from linear to exponential
#[derive(Debug, Clone, Copy)]
pub struct CompoundParams {
    pub grip_bonus_s: f64,
    pub base_deg_s: f64,
    pub cliff_lap: u32,
}

impl Compound {
    pub fn params(&self) -> CompoundParams {
        match self {
            Compound::Soft => CompoundParams {
                grip_bonus_s: -0.8,
                base_deg_s: 0.030,
                cliff_lap: 12,
            },
            Compound::Medium => CompoundParams {
                grip_bonus_s: 0.0,
                base_deg_s: 0.018,
                cliff_lap: 22,
            },
            Compound::Hard => CompoundParams {
                grip_bonus_s: 0.5,
                base_deg_s: 0.010,
                cliff_lap: 35,
            },
        }
    }
}

/// Tyre state for one stint. The stint-lap counter resets to zero at
/// every pit stop; the compound only changes at a pit stop (the baseline
/// simulator keeps it fixed for the whole race).
#[derive(Debug, Clone)]
pub struct TyreState {
    pub stint_lap: u32,
    pub compound: Compound,
}

impl TyreState {
    pub fn new(compound: Compound) -> Self {
        Self {
            stint_lap: 0,
            compound,
        }
    }

    pub fn next_lap(&mut self) {
        self.stint_lap += 1;
    }

    pub fn pit(&mut self) {
        self.stint_lap = 0;
    }
}

/// Non-linear tyre degradation with cliff effect.
///
/// Before the compound's cliff lap the penalty grows linearly with stint
/// age; past the cliff an exponential term takes over and lap times spike.
///
/// # Arguments
/// * `stint_lap` - Laps since the last pit stop
/// * `compound` - Fitted tyre compound
/// * `deg_factor` - Track abrasiveness multiplier (scales both regimes)
///
/// # Returns
/// `(penalty_s, grip_bonus_s)` - degradation penalty and compound grip delta
pub fn degradation(stint_lap: u32, compound: Compound, deg_factor: f64) -> (f64, f64) {
    let params = compound.params();
    let base_deg = params.base_deg_s * deg_factor;

    let penalty = if stint_lap <= params.cliff_lap {
        base_deg * stint_lap as f64
    } else {
        let over_cliff = (stint_lap - params.cliff_lap) as i32;
        let pre_cliff = base_deg * params.cliff_lap as f64;
        let cliff_penalty = 0.15 * deg_factor * (1.2_f64.powi(over_cliff) - 1.0);
        pre_cliff + cliff_penalty
    };

    (penalty, params.grip_bonus_s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_before_cliff() {
        let params = Compound::Medium.params();
        for stint_lap in 1..=params.cliff_lap {
            let (penalty, _) = degradation(stint_lap, Compound::Medium, 1.0);
            let expected = params.base_deg_s * stint_lap as f64;
            assert!(
                (penalty - expected).abs() < 1e-12,
                "lap {} penalty {} expected {}",
                stint_lap,
                penalty,
                expected
            );
        }
    }

    #[test]
    fn cliff_exceeds_linear_extrapolation() {
        let params = Compound::Soft.params();
        for over in 1..20 {
            let stint_lap = params.cliff_lap + over;
            let (penalty, _) = degradation(stint_lap, Compound::Soft, 1.0);
            let linear = params.base_deg_s * stint_lap as f64;
            assert!(
                penalty > linear,
                "past-cliff penalty {} should exceed linear extrapolation {}",
                penalty,
                linear
            );
        }
    }

    #[test]
    fn track_factor_scales_both_regimes() {
        let cliff = Compound::Hard.params().cliff_lap;
        let (pre_1x, _) = degradation(cliff, Compound::Hard, 1.0);
        let (pre_2x, _) = degradation(cliff, Compound::Hard, 2.0);
        assert!((pre_2x - 2.0 * pre_1x).abs() < 1e-12);

        let (post_1x, _) = degradation(cliff + 5, Compound::Hard, 1.0);
        let (post_2x, _) = degradation(cliff + 5, Compound::Hard, 2.0);
        assert!((post_2x - 2.0 * post_1x).abs() < 1e-12);
    }

    #[test]
    fn grip_bonus_ordering() {
        let (_, soft) = degradation(1, Compound::Soft, 1.0);
        let (_, medium) = degradation(1, Compound::Medium, 1.0);
        let (_, hard) = degradation(1, Compound::Hard, 1.0);
        assert!(soft < medium && medium < hard, "soft should be fastest");
    }

    #[test]
    fn compound_parsing() {
        assert_eq!("SOFT".parse::<Compound>().unwrap(), Compound::Soft);
        assert_eq!("Medium".parse::<Compound>().unwrap(), Compound::Medium);
        assert!("wet".parse::<Compound>().is_err());
    }
}
