use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};

const BASE_POWER_HP: f64 = 1000.0;
const BASE_WEAR_RATE: f64 = 0.0001;
const WEAR_NOISE_STD: f64 = 0.0002;

/// Engine wear level for one race run, clamped to [0, 1].
/// Monotonically non-decreasing in expectation; a negative noise draw may
/// pull a single step down but never below zero.
#[derive(Debug, Clone)]
pub struct EngineState {
    pub degradation: f64,
}

impl EngineState {
    pub fn fresh() -> Self {
        Self { degradation: 0.0 }
    }
}

/// One sample of simulated engine telemetry.
#[derive(Debug, Clone, Copy)]
pub struct EngineTelemetry {
    pub rpm: f64,
    pub throttle_pct: f64,
    pub temperature_c: f64,
}

/// Engine output power in horsepower.
///
/// # Arguments
/// * `throttle_pct` - Throttle position (0-100%)
/// * `rpm` - Engine revolutions per minute
/// * `degradation` - Engine wear factor (0-1)
pub fn power(throttle_pct: f64, rpm: f64, degradation: f64) -> f64 {
    BASE_POWER_HP * (throttle_pct / 100.0) * (rpm / 15000.0) * (1.0 - degradation)
}

/// Advance engine degradation by one lap.
///
/// Wear accelerates with engine stress and with race progress, plus a
/// zero-mean stochastic perturbation. The result is always clamped to
/// [0, 1] regardless of the noise sign.
///
/// # Arguments
/// * `current` - Degradation entering the lap (0-1)
/// * `stress` - Engine stress multiplier (0.5 = conservative, 2.0 = push)
/// * `lap` - Current lap number
/// * `total_laps` - Total laps in the race
pub fn advance_degradation<R: Rng + ?Sized>(
    rng: &mut R,
    current: f64,
    stress: f64,
    lap: u32,
    total_laps: u32,
) -> f64 {
    let stress_factor = 1.0 + (stress - 1.0) * 0.5;
    let race_progress = lap as f64 / total_laps as f64;
    let progression_factor = 1.0 + race_progress * 0.5;

    let wear = BASE_WEAR_RATE * stress_factor * progression_factor;
    let noise = Normal::new(0.0, WEAR_NOISE_STD)
        .expect("valid noise std")
        .sample(rng);

    (current + wear + noise).clamp(0.0, 1.0)
}

/// Sample one lap of engine telemetry. Pure sampling, no state mutation.
pub fn sample_telemetry<R: Rng + ?Sized>(rng: &mut R, degradation: f64) -> EngineTelemetry {
    let rpm = Normal::new(12000.0, 400.0)
        .expect("valid rpm distribution")
        .sample(rng);
    let throttle_pct = Uniform::new(85.0, 100.0).sample(rng);
    let temperature_c = 90.0
        + degradation * 220.0
        + Normal::new(0.0, 1.5).expect("valid temp noise").sample(rng);

    EngineTelemetry {
        rpm,
        throttle_pct,
        temperature_c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn power_is_deterministic() {
        // Reference point: full throttle, redline rpm, fresh engine.
        let p = power(100.0, 15000.0, 0.0);
        assert!((p - 1000.0).abs() < 1e-12);

        // Degradation reduces power linearly.
        let p_worn = power(100.0, 15000.0, 0.5);
        assert!((p_worn - 500.0).abs() < 1e-12);
    }

    #[test]
    fn degradation_stays_in_unit_interval() {
        let mut rng = SmallRng::seed_from_u64(7);
        for lap in 1..=100 {
            // Start from both extremes so boundary noise draws are exercised.
            let low = advance_degradation(&mut rng, 0.0, 2.0, lap, 100);
            let high = advance_degradation(&mut rng, 1.0, 2.0, lap, 100);
            assert!((0.0..=1.0).contains(&low), "lap {} low {}", lap, low);
            assert!((0.0..=1.0).contains(&high), "lap {} high {}", lap, high);
        }
    }

    #[test]
    fn wear_increases_in_expectation() {
        let mut rng = SmallRng::seed_from_u64(42);
        let runs = 5000;
        let mut total = 0.0;
        for _ in 0..runs {
            total += advance_degradation(&mut rng, 0.5, 1.0, 25, 50);
        }
        let mean = total / runs as f64;
        assert!(mean > 0.5, "mean degradation {} should exceed start", mean);
    }

    #[test]
    fn telemetry_in_plausible_ranges() {
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..1000 {
            let t = sample_telemetry(&mut rng, 0.2);
            assert!((85.0..100.0).contains(&t.throttle_pct));
            assert!(t.rpm > 9000.0 && t.rpm < 15000.0, "rpm {}", t.rpm);
            // 90 + 0.2*220 = 134, noise std 1.5
            assert!((t.temperature_c - 134.0).abs() < 15.0);
        }
    }
}
