use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use race_strategy_sim::{
    find_optimal_strategy, run_monte_carlo, track_constants, Compound, RaceConfiguration,
};

const DEFAULT_SIMS: usize = 1000;
const DEFAULT_SEED: u64 = 1;
const DEFAULT_SIMS_PER_CELL: usize = 50;

#[derive(Debug)]
struct Args {
    config_path: Option<PathBuf>,
    sims: usize,
    seed: u64,
    sims_per_cell: usize,
    venue: Option<String>,
    optimize: bool,
    json: bool,
}

impl Args {
    fn usage() -> &'static str {
        "\
race_strategy_sim — Monte Carlo race strategy simulator

USAGE:
  race_strategy_sim [CONFIG.json] [FLAGS]

FLAGS:
  --sims N            Monte Carlo runs (default: 1000)
  --seed U64          Base seed; run i uses seed + i (default: 1)
  --optimize          Also grid-search (compound, pit lap) strategies
  --sims-per-cell N   Runs averaged per strategy cell (default: 50)
  --venue NAME        Apply venue pit-loss/degradation constants
  --json              Emit summary (and grid) as JSON on stdout
  --help              Show this help

Without a config path the simulator looks for race_config.json next to
the binary or in the working directory, else uses built-in defaults.
"
    }

    fn parse() -> Result<Self> {
        let mut out = Args {
            config_path: None,
            sims: DEFAULT_SIMS,
            seed: DEFAULT_SEED,
            sims_per_cell: DEFAULT_SIMS_PER_CELL,
            venue: None,
            optimize: false,
            json: false,
        };

        let mut argv = env::args().skip(1);
        while let Some(arg) = argv.next() {
            match arg.as_str() {
                "--sims" => {
                    let v = argv.next().context("--sims needs a value")?;
                    out.sims = v.parse().with_context(|| format!("bad --sims '{v}'"))?;
                }
                "--seed" => {
                    let v = argv.next().context("--seed needs a value")?;
                    out.seed = v.parse().with_context(|| format!("bad --seed '{v}'"))?;
                }
                "--sims-per-cell" => {
                    let v = argv.next().context("--sims-per-cell needs a value")?;
                    out.sims_per_cell = v
                        .parse()
                        .with_context(|| format!("bad --sims-per-cell '{v}'"))?;
                }
                "--venue" => {
                    out.venue = Some(argv.next().context("--venue needs a value")?);
                }
                "--optimize" => out.optimize = true,
                "--json" => out.json = true,
                "--help" | "-h" => {
                    println!("{}", Self::usage());
                    std::process::exit(0);
                }
                flag if flag.starts_with("--") => bail!("unknown flag {flag}\n\n{}", Self::usage()),
                path => out.config_path = Some(PathBuf::from(path)),
            }
        }
        Ok(out)
    }
}

/// Prefer an explicit path; otherwise look next to the binary and in the
/// working directory.
fn resolve_config_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path);
    }
    let mut candidates = vec![PathBuf::from("race_config.json")];
    if let Ok(mut exe) = env::current_exe() {
        exe.pop();
        exe.push("race_config.json");
        candidates.push(exe);
    }
    candidates.into_iter().find(|c| c.exists())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse()?;

    let mut config = match resolve_config_path(args.config_path.clone()) {
        Some(path) => {
            info!(path = %path.display(), "loading race configuration");
            RaceConfiguration::load(&path)?
        }
        None => {
            warn!("no config file found, using built-in defaults");
            RaceConfiguration::default()
        }
    };

    if let Some(venue) = &args.venue {
        let constants = track_constants(venue);
        info!(
            venue,
            pit_loss_s = constants.pit_loss_s,
            deg_factor = constants.deg_factor,
            "applying venue constants"
        );
        config.apply_track_constants(&constants);
    }
    config.validate()?;

    let summary = run_monte_carlo(&config, args.sims, args.seed)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "\n=== Monte Carlo ({} sims, {} laps, {} tyres, pit lap {}) ===",
            summary.simulations, config.total_laps, config.tyre_compound, config.pit_lap
        );
        println!(
            "finished: {}/{} ({:.1}%)",
            summary.finished,
            summary.simulations,
            100.0 * summary.finish_rate()
        );
        match summary.stats() {
            Some(stats) => {
                println!("mean total time : {:>9.2} s", stats.mean_s);
                println!("5th percentile  : {:>9.2} s", stats.p5_s);
                println!("95th percentile : {:>9.2} s", stats.p95_s);
            }
            None => println!("every run DNF'd — no time distribution to report"),
        }
    }

    if args.optimize {
        let result = find_optimal_strategy(&config, args.sims_per_cell, args.seed)?;
        match result {
            Some(grid) => {
                if args.json {
                    println!("{}", serde_json::to_string_pretty(&grid)?);
                } else {
                    println!("\n=== Optimal strategy ({} cells) ===", grid.cells.len());
                    for compound in Compound::ALL {
                        let best_for = grid
                            .cells
                            .iter()
                            .filter(|c| c.compound == compound)
                            .min_by(|a, b| {
                                a.expected_time_s.partial_cmp(&b.expected_time_s).unwrap()
                            });
                        if let Some(cell) = best_for {
                            println!(
                                "  {:6} : pit lap {:2}  -> {:.2} s",
                                compound.to_string(),
                                cell.pit_lap,
                                cell.expected_time_s
                            );
                        }
                    }
                    println!(
                        "best: {} tyres, pit lap {} ({:.2} s expected)",
                        grid.best.compound, grid.best.pit_lap, grid.best.expected_time_s
                    );
                }
            }
            None => println!("no viable strategy: every grid cell DNF'd out"),
        }
    }

    Ok(())
}
