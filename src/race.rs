use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::RaceConfiguration;
use crate::engine::{self, EngineState};
use crate::fuel;
use crate::safety_car::{SafetyCarState, SAFETY_CAR_DELTA_S};
use crate::tyres::{self, TyreState};

/// Reference power for the lap-time composition: running above it buys
/// lap time, running below it costs lap time.
const REFERENCE_POWER_HP: f64 = 900.0;
const POWER_TIME_GAIN_S_PER_HP: f64 = 0.002;

/// One completed lap. Appended in lap order, immutable afterwards; the
/// visualization layer consumes these as structured records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LapRecord {
    pub lap: u32,
    pub lap_time_s: f64,
    pub power_hp: f64,
    pub rpm: f64,
    pub temperature_c: f64,
    pub engine_deg: f64,
    pub fuel_penalty_s: f64,
    pub tyre_penalty_s: f64,
    pub safety_car: bool,
}

/// Result of one simulated race.
///
/// `total_time_s` sums completed laps only; when `dnf` is set the total is
/// meaningless for ranking and `dnf_lap` names the terminating lap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceOutcome {
    pub total_time_s: f64,
    pub laps: Vec<LapRecord>,
    pub dnf: bool,
    pub dnf_lap: Option<u32>,
}

impl RaceOutcome {
    pub fn finished(&self) -> bool {
        !self.dnf
    }

    pub fn laps_completed(&self) -> u32 {
        match self.dnf_lap {
            Some(lap) => lap,
            None => self.laps.last().map(|r| r.lap).unwrap_or(0),
        }
    }

    pub fn safety_car_laps(&self) -> u32 {
        self.laps.iter().filter(|r| r.safety_car).count() as u32
    }
}

/// Simulate a single race lap-by-lap.
///
/// All mutable state (engine wear, tyre stint, safety-car period) is
/// local to this call and discarded at its end. Every random draw comes
/// from the supplied `rng`, so callers control stream independence.
///
/// Per-lap order: safety-car check, telemetry sample, fuel penalty, tyre
/// penalty, lap-time composition, reliability check, pit stop, engine
/// degradation advance, telemetry log append.
pub fn simulate_race<R: Rng + ?Sized>(config: &RaceConfiguration, rng: &mut R) -> RaceOutcome {
    let lap_noise = Normal::new(0.0, config.lap_std_s).expect("validated lap std");

    let mut engine_state = EngineState::fresh();
    let mut tyre_state = TyreState::new(config.tyre_compound);
    let mut sc_state = SafetyCarState::new();

    let mut total_time = 0.0;
    let mut records = Vec::with_capacity(config.total_laps as usize);
    let mut dnf = false;
    let mut dnf_lap = None;

    for lap in 1..=config.total_laps {
        tyre_state.next_lap();

        if config.enable_safety_car {
            sc_state.check(rng, lap, config.total_laps);
        }

        let telemetry = engine::sample_telemetry(rng, engine_state.degradation);
        let power = engine::power(telemetry.throttle_pct, telemetry.rpm, engine_state.degradation);

        let fuel_penalty = fuel::fuel_penalty(lap, config.fuel_load_kg, fuel::DEFAULT_BURN_RATE_KG);
        let (tyre_penalty, grip_bonus) =
            tyres::degradation(tyre_state.stint_lap, tyre_state.compound, config.deg_factor);

        let mut lap_time = if sc_state.is_active() {
            // Safety-car pace is fixed; every other term is bypassed.
            config.base_lap_s + SAFETY_CAR_DELTA_S
        } else {
            config.base_lap_s
                + fuel_penalty
                + tyre_penalty
                + grip_bonus
                - (power - REFERENCE_POWER_HP) * POWER_TIME_GAIN_S_PER_HP
                + lap_noise.sample(rng)
        };

        // Reliability check uses the degradation the engine carried into
        // this lap, not the post-lap value.
        let failure_prob = (1.0 - config.reliability) * (1.0 + engine_state.degradation * 10.0);
        if rng.gen::<f64>() < failure_prob {
            dnf = true;
            dnf_lap = Some(lap);
            trace!(lap, failure_prob, "engine failure, race over");
            break;
        }

        if lap == config.pit_lap {
            lap_time += config.pit_loss_s;
            tyre_state.pit();
        }

        engine_state.degradation = engine::advance_degradation(
            rng,
            engine_state.degradation,
            config.engine_stress,
            lap,
            config.total_laps,
        );
        total_time += lap_time;

        records.push(LapRecord {
            lap,
            lap_time_s: lap_time,
            power_hp: power,
            rpm: telemetry.rpm,
            temperature_c: telemetry.temperature_c,
            engine_deg: engine_state.degradation,
            fuel_penalty_s: fuel_penalty,
            tyre_penalty_s: tyre_penalty,
            safety_car: sc_state.is_active(),
        });
    }

    RaceOutcome {
        total_time_s: total_time,
        laps: records,
        dnf,
        dnf_lap,
    }
}
