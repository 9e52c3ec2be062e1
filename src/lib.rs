//! Monte Carlo race strategy simulation engine.
//!
//! Models a single-car race lap-by-lap under stochastic physics — fuel
//! burn, tyre wear with a post-cliff spike, engine degradation and
//! failure risk, safety-car interruptions — then estimates outcome
//! distributions over many independent runs and grid-searches the
//! (compound, pit lap) space for the strategy with the lowest expected
//! race time.
//!
//! Every simulation is a pure function of its [`RaceConfiguration`] and
//! an explicit RNG, so batches parallelize freely as long as each run
//! gets its own seeded stream.

pub mod calibration;
pub mod config;
pub mod engine;
pub mod fuel;
pub mod monte_carlo;
pub mod race;
pub mod safety_car;
pub mod strategy;
pub mod tyres;

pub use calibration::{
    track_constants, CalibrationCache, CalibrationError, RaceSummary, SessionSource,
    TrackConstants,
};
pub use config::{ConfigError, RaceConfiguration};
pub use monte_carlo::{run_monte_carlo, DistributionStats, MonteCarloSummary, RunSummary};
pub use race::{simulate_race, LapRecord, RaceOutcome};
pub use strategy::{find_optimal_strategy, StrategyCell, StrategyGridResult};
pub use tyres::Compound;
