use rand::rngs::SmallRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{ConfigError, RaceConfiguration};
use crate::race::simulate_race;
use crate::tyres::Compound;

/// Simulations run per grid cell by default.
pub const DEFAULT_SIMS_PER_CELL: usize = 50;

/// One evaluated (compound, pit lap) combination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyCell {
    pub compound: Compound,
    pub pit_lap: u32,
    /// Mean finishing time of the cell's non-DNF runs (s).
    pub expected_time_s: f64,
}

/// Full strategy grid plus its arg-min cell. Recomputed on every
/// invocation; nothing is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyGridResult {
    pub cells: Vec<StrategyCell>,
    pub best: StrategyCell,
}

/// Candidate pit laps: stride 2 inside the realistic window, excluding
/// the opening and closing phases of the race.
fn pit_lap_window(total_laps: u32) -> impl Iterator<Item = u32> {
    let min_pit = 5u32.max((total_laps as f64 * 0.2) as u32);
    let max_pit = total_laps.saturating_sub(5).min((total_laps as f64 * 0.8) as u32);
    (min_pit..=max_pit).step_by(2)
}

/// Grid-search the (compound, pit lap) space for the strategy with the
/// lowest expected race time.
///
/// Each cell averages `sims_per_cell` runs with the safety car disabled
/// to cut optimization noise; cells where every run DNF'd are dropped.
/// Returns `None` when no cell produced a single finish. The whole search
/// is deterministic for a fixed `base_seed`: cell `c`, repetition `r`
/// draws from a stream seeded `base_seed + c*sims_per_cell + r`.
pub fn find_optimal_strategy(
    config: &RaceConfiguration,
    sims_per_cell: usize,
    base_seed: u64,
) -> Result<Option<StrategyGridResult>, ConfigError> {
    config.validate()?;

    let candidates: Vec<(Compound, u32)> = Compound::ALL
        .iter()
        .flat_map(|&compound| pit_lap_window(config.total_laps).map(move |pit_lap| (compound, pit_lap)))
        .collect();

    let cells: Vec<StrategyCell> = candidates
        .par_iter()
        .enumerate()
        .filter_map(|(cell_index, &(compound, pit_lap))| {
            let cell_config = RaceConfiguration {
                tyre_compound: compound,
                pit_lap,
                enable_safety_car: false,
                ..config.clone()
            };

            let cell_seed = base_seed.wrapping_add((cell_index * sims_per_cell) as u64);
            let mut finish_times = Vec::with_capacity(sims_per_cell);
            for rep in 0..sims_per_cell as u64 {
                let mut rng = SmallRng::seed_from_u64(cell_seed.wrapping_add(rep));
                let outcome = simulate_race(&cell_config, &mut rng);
                if outcome.finished() {
                    finish_times.push(outcome.total_time_s);
                }
            }

            if finish_times.is_empty() {
                debug!(%compound, pit_lap, "cell dropped, every run DNF'd");
                return None;
            }

            let expected_time_s = finish_times.iter().sum::<f64>() / finish_times.len() as f64;
            Some(StrategyCell {
                compound,
                pit_lap,
                expected_time_s,
            })
        })
        .collect();

    let Some(best) = cells
        .iter()
        .min_by(|a, b| {
            a.expected_time_s
                .partial_cmp(&b.expected_time_s)
                .expect("finite expected times")
        })
        .cloned()
    else {
        info!("no viable strategy: every grid cell DNF'd out");
        return Ok(None);
    };

    info!(
        compound = %best.compound,
        pit_lap = best.pit_lap,
        expected_time_s = best.expected_time_s,
        cells = cells.len(),
        "strategy search complete"
    );

    Ok(Some(StrategyGridResult { cells, best }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search_config() -> RaceConfiguration {
        RaceConfiguration {
            reliability: 1.0,
            engine_stress: 0.5,
            total_laps: 40,
            pit_lap: 20,
            lap_std_s: 0.2,
            ..RaceConfiguration::default()
        }
    }

    #[test]
    fn pit_window_respects_bounds() {
        let laps: Vec<u32> = pit_lap_window(50).collect();
        assert_eq!(laps.first(), Some(&10)); // max(5, 0.2*50)
        assert!(*laps.last().unwrap() <= 40); // min(45, 0.8*50)
        for pair in laps.windows(2) {
            assert_eq!(pair[1] - pair[0], 2);
        }
    }

    #[test]
    fn short_race_window_floors_at_five() {
        let laps: Vec<u32> = pit_lap_window(20).collect();
        assert_eq!(laps.first(), Some(&5));
        assert!(*laps.last().unwrap() <= 15);
    }

    #[test]
    fn best_cell_is_grid_minimum() {
        let config = search_config();
        let result = find_optimal_strategy(&config, 10, 2024)
            .unwrap()
            .expect("reliable config yields a strategy");
        for cell in &result.cells {
            assert!(
                result.best.expected_time_s <= cell.expected_time_s,
                "best {} beaten by {} at {}/{}",
                result.best.expected_time_s,
                cell.expected_time_s,
                cell.compound,
                cell.pit_lap
            );
        }
    }

    #[test]
    fn search_is_seed_deterministic() {
        let config = search_config();
        let a = find_optimal_strategy(&config, 10, 7).unwrap().unwrap();
        let b = find_optimal_strategy(&config, 10, 7).unwrap().unwrap();
        assert_eq!(a.best.pit_lap, b.best.pit_lap);
        assert_eq!(a.best.compound, b.best.compound);
        assert_eq!(a.best.expected_time_s, b.best.expected_time_s);
        assert_eq!(a.cells.len(), b.cells.len());
    }

    #[test]
    fn hopeless_config_reports_no_viable_strategy() {
        let mut config = search_config();
        config.reliability = 0.0;
        let result = find_optimal_strategy(&config, 5, 1).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn grid_covers_all_compounds() {
        let config = search_config();
        let result = find_optimal_strategy(&config, 5, 3).unwrap().unwrap();
        for compound in Compound::ALL {
            assert!(
                result.cells.iter().any(|c| c.compound == compound),
                "no cells for {}",
                compound
            );
        }
    }
}
