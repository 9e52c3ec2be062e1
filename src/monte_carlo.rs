use rand::rngs::SmallRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{ConfigError, RaceConfiguration};
use crate::race::{simulate_race, RaceOutcome};

/// Number of equal-width bins in the finishing-time histogram.
const HISTOGRAM_BINS: usize = 20;

/// Per-run digest kept for reporting alongside the aggregate numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub sim_id: u64,
    pub laps_completed: u32,
    pub finished: bool,
    /// Total race time; absent for DNF runs.
    pub total_time_s: Option<f64>,
    pub avg_lap_time_s: Option<f64>,
    pub safety_car_laps: u32,
}

impl RunSummary {
    fn from_outcome(sim_id: u64, outcome: &RaceOutcome) -> Self {
        let (total_time_s, avg_lap_time_s) = if outcome.finished() && !outcome.laps.is_empty() {
            (
                Some(outcome.total_time_s),
                Some(outcome.total_time_s / outcome.laps.len() as f64),
            )
        } else {
            (None, None)
        };
        Self {
            sim_id,
            laps_completed: outcome.laps_completed(),
            finished: outcome.finished(),
            total_time_s,
            avg_lap_time_s,
            safety_car_laps: outcome.safety_car_laps(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower_s: f64,
    pub upper_s: f64,
    pub count: usize,
}

/// Derived statistics over the finishing-time distribution. Only exists
/// when at least one run finished.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionStats {
    pub mean_s: f64,
    pub p5_s: f64,
    pub p95_s: f64,
    pub min_s: f64,
    pub max_s: f64,
    pub histogram: Vec<HistogramBin>,
}

/// Aggregate of N independent race simulations under one configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloSummary {
    pub simulations: usize,
    pub finished: usize,
    /// Finishing times of non-DNF runs, sorted ascending.
    pub finishing_times_s: Vec<f64>,
    pub runs: Vec<RunSummary>,
}

impl MonteCarloSummary {
    pub fn finish_rate(&self) -> f64 {
        if self.simulations == 0 {
            0.0
        } else {
            self.finished as f64 / self.simulations as f64
        }
    }

    /// True when every run DNF'd (or none ran) and no numeric statistics
    /// can be derived.
    pub fn all_dnf(&self) -> bool {
        self.finishing_times_s.is_empty()
    }

    /// Distribution statistics, or `None` for the all-DNF case — never
    /// NaN over an empty set.
    pub fn stats(&self) -> Option<DistributionStats> {
        if self.finishing_times_s.is_empty() {
            return None;
        }
        let times = &self.finishing_times_s;
        let mean_s = times.iter().sum::<f64>() / times.len() as f64;

        let percentile = |p: f64| {
            let index = ((p / 100.0) * (times.len() as f64 - 1.0)).round() as usize;
            times[index.min(times.len() - 1)]
        };

        let min_s = times[0];
        let max_s = times[times.len() - 1];
        Some(DistributionStats {
            mean_s,
            p5_s: percentile(5.0),
            p95_s: percentile(95.0),
            min_s,
            max_s,
            histogram: build_histogram(times, min_s, max_s),
        })
    }
}

fn build_histogram(sorted_times: &[f64], min_s: f64, max_s: f64) -> Vec<HistogramBin> {
    let span = max_s - min_s;
    if span <= 0.0 {
        // All runs finished on the identical time; one degenerate bin.
        return vec![HistogramBin {
            lower_s: min_s,
            upper_s: max_s,
            count: sorted_times.len(),
        }];
    }
    let width = span / HISTOGRAM_BINS as f64;
    let mut bins: Vec<HistogramBin> = (0..HISTOGRAM_BINS)
        .map(|i| HistogramBin {
            lower_s: min_s + i as f64 * width,
            upper_s: min_s + (i + 1) as f64 * width,
            count: 0,
        })
        .collect();
    for &t in sorted_times {
        let idx = (((t - min_s) / width) as usize).min(HISTOGRAM_BINS - 1);
        bins[idx].count += 1;
    }
    bins
}

/// Run `num_simulations` independent races under one configuration and
/// reduce to distributional statistics.
///
/// Run `i` draws from its own `SmallRng` seeded with `base_seed + i`, so
/// the batch parallelizes without correlated streams and a fixed base
/// seed reproduces the whole batch.
pub fn run_monte_carlo(
    config: &RaceConfiguration,
    num_simulations: usize,
    base_seed: u64,
) -> Result<MonteCarloSummary, ConfigError> {
    config.validate()?;

    let outcomes: Vec<RaceOutcome> = (0..num_simulations as u64)
        .into_par_iter()
        .map(|i| {
            let mut rng = SmallRng::seed_from_u64(base_seed.wrapping_add(i));
            simulate_race(config, &mut rng)
        })
        .collect();

    let runs: Vec<RunSummary> = outcomes
        .iter()
        .enumerate()
        .map(|(i, outcome)| RunSummary::from_outcome(i as u64, outcome))
        .collect();

    let mut finishing_times_s: Vec<f64> = outcomes
        .iter()
        .filter(|o| o.finished())
        .map(|o| o.total_time_s)
        .collect();
    finishing_times_s.sort_by(|a, b| a.partial_cmp(b).expect("finite race times"));

    let finished = finishing_times_s.len();
    let finish_rate = finished as f64 / num_simulations.max(1) as f64;
    info!(
        simulations = num_simulations,
        finished, finish_rate, "monte carlo batch complete"
    );

    Ok(MonteCarloSummary {
        simulations: num_simulations,
        finished,
        finishing_times_s,
        runs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tyres::Compound;

    fn quiet_config() -> RaceConfiguration {
        RaceConfiguration {
            reliability: 1.0,
            engine_stress: 0.5,
            enable_safety_car: false,
            total_laps: 30,
            pit_lap: 15,
            tyre_compound: Compound::Medium,
            ..RaceConfiguration::default()
        }
    }

    #[test]
    fn batch_is_seed_deterministic() {
        let config = quiet_config();
        let a = run_monte_carlo(&config, 50, 99).unwrap();
        let b = run_monte_carlo(&config, 50, 99).unwrap();
        assert_eq!(a.finishing_times_s, b.finishing_times_s);
    }

    #[test]
    fn fully_reliable_batch_never_dnfs() {
        let config = quiet_config();
        let summary = run_monte_carlo(&config, 2000, 1234).unwrap();
        assert_eq!(summary.finished, 2000);
        assert_eq!(summary.finish_rate(), 1.0);
        assert!(!summary.all_dnf());
    }

    #[test]
    fn all_dnf_batch_reports_empty_not_nan() {
        let mut config = quiet_config();
        config.reliability = 0.0;
        let summary = run_monte_carlo(&config, 100, 7).unwrap();
        assert_eq!(summary.finished, 0);
        assert!(summary.all_dnf());
        assert!(summary.stats().is_none());
        assert_eq!(summary.finish_rate(), 0.0);
    }

    #[test]
    fn stats_are_consistent_with_the_multiset() {
        let config = quiet_config();
        let summary = run_monte_carlo(&config, 500, 42).unwrap();
        let stats = summary.stats().expect("reliable batch has stats");

        assert!(stats.min_s <= stats.p5_s);
        assert!(stats.p5_s <= stats.mean_s);
        assert!(stats.mean_s <= stats.p95_s);
        assert!(stats.p95_s <= stats.max_s);

        let total: usize = stats.histogram.iter().map(|b| b.count).sum();
        assert_eq!(total, summary.finished, "histogram must cover every finish");
    }

    #[test]
    fn invalid_config_fails_before_any_run() {
        let mut config = quiet_config();
        config.pit_lap = 0;
        assert!(run_monte_carlo(&config, 10, 0).is_err());
    }
}
