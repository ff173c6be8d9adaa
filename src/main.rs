//! Weapon Balls command line
//!
//! Runs battles headless and prints results as JSON.

use clap::{Parser, Subcommand};
use serde::Serialize;

use weapon_balls::error::{Result, SimError};
use weapon_balls::sim::{LogSink, SimRng};
use weapon_balls::{BattleConfig, BattleResult, BestOf, CancelToken, Simulator, StagePreset};

#[derive(Debug, Parser)]
#[command(name = "weapon-balls", version, about = "Deterministic weapon-ball arena battles")]
struct Cli {
    /// JSON file with a full battle config (overrides --preset)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<std::path::PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a single battle
    Battle {
        #[arg(long)]
        left: String,
        #[arg(long)]
        right: String,
        /// Battle seed; drawn at random when omitted
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, value_parser = parse_preset)]
        preset: Option<StagePreset>,
    },
    /// Run many seeded battles and rank them by excitement
    Batch {
        #[arg(long)]
        left: String,
        #[arg(long)]
        right: String,
        #[arg(long, default_value_t = 100)]
        count: usize,
        /// Seed for drawing battle seeds; makes the whole batch reproducible
        #[arg(long)]
        seed: Option<u64>,
        /// Spread battles over all cores
        #[arg(long)]
        parallel: bool,
        /// Only print the N best battles
        #[arg(long, value_name = "N")]
        top: Option<usize>,
        /// Merge the batch into a best-of JSON file (keeps the best 50)
        #[arg(long, value_name = "PATH")]
        save: Option<std::path::PathBuf>,
        #[arg(long, value_parser = parse_preset)]
        preset: Option<StagePreset>,
    },
    /// Re-run a battle from its replay token with event logging
    Replay {
        #[arg(long)]
        left: String,
        #[arg(long)]
        right: String,
        #[arg(long)]
        seed: u64,
        #[arg(long, value_parser = parse_preset)]
        preset: Option<StagePreset>,
    },
    /// List weapon types
    Weapons {
        #[arg(long)]
        category: Option<String>,
    },
    /// List stage presets
    Presets,
}

fn parse_preset(s: &str) -> std::result::Result<StagePreset, String> {
    StagePreset::from_str(s).ok_or_else(|| SimError::UnknownPreset(s.to_string()).to_string())
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// The first `top` ranked results, or all of them
fn best_first(results: &[BattleResult], top: Option<usize>) -> &[BattleResult] {
    let n = top.map_or(results.len(), |n| n.min(results.len()));
    &results[..n]
}

fn simulator(cli_config: &Option<std::path::PathBuf>, preset: Option<StagePreset>) -> Result<Simulator> {
    let config = match (cli_config, preset) {
        (Some(path), _) => BattleConfig::load(path)?,
        (None, Some(preset)) => BattleConfig::from_preset(preset),
        (None, None) => BattleConfig::default(),
    };
    Ok(Simulator::new(config))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplayReport {
    verified: bool,
    result: BattleResult,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WeaponInfo {
    name: &'static str,
    category: &'static str,
    damage: f32,
    reach: f32,
    scaling: &'static str,
    scaling_value: f32,
}

#[derive(Serialize)]
struct PresetInfo {
    name: &'static str,
    width: f32,
    height: f32,
    max_speed: f32,
    ball_radius: f32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Battle {
            left,
            right,
            seed,
            preset,
        } => {
            let sim = simulator(&cli.config, preset)?;
            let seed = seed.unwrap_or_else(|| SimRng::unseeded().generate_seed());
            let result = sim.run_battle(&left, &right, seed)?;
            print_json(&result)
        }
        Command::Batch {
            left,
            right,
            count,
            seed,
            parallel,
            top,
            save,
            preset,
        } => {
            let sim = simulator(&cli.config, preset)?;
            let mut seeds = seed.map_or_else(SimRng::unseeded, SimRng::seeded);
            let results = if parallel {
                sim.run_batch_parallel(&left, &right, count, &mut seeds, &CancelToken::new())?
            } else {
                sim.run_batch(&left, &right, count, &mut seeds)?
            };
            if let Some(path) = save {
                let mut best = match std::fs::read_to_string(&path) {
                    Ok(json) => BestOf::from_json(&json)?,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => BestOf::new(),
                    Err(e) => return Err(e.into()),
                };
                for result in &results {
                    best.save(result.clone());
                }
                std::fs::write(&path, best.to_json()?)?;
                log::info!(
                    "Best-of file {} now holds {} battles, top score {:?}",
                    path.display(),
                    best.len(),
                    best.top_score()
                );
            }
            print_json(&best_first(&results, top))
        }
        Command::Replay {
            left,
            right,
            seed,
            preset,
        } => {
            let sim = simulator(&cli.config, preset)?;
            let headless = sim.run_battle(&left, &right, seed)?;
            let replayed = sim.run_battle_with(&left, &right, seed, &mut LogSink)?;
            let verified = headless == replayed;
            if !verified {
                log::warn!("Replay of seed {} diverged from the headless run", seed);
            }
            print_json(&ReplayReport {
                verified,
                result: replayed,
            })
        }
        Command::Weapons { category } => {
            let sim = Simulator::default();
            let registry = sim.registry();
            if let Some(category) = &category
                && !registry.categories().contains(&category.as_str())
            {
                log::warn!("No weapons in category {}", category);
            }
            let mut rng = SimRng::seeded(0);
            let mut listing = Vec::new();
            for name in registry.types(category.as_deref()) {
                let weapon = registry.create(name, &mut rng, sim.config())?;
                listing.push(WeaponInfo {
                    name,
                    category: registry.category_of(name).unwrap_or("custom"),
                    damage: weapon.core.damage(),
                    reach: weapon.core.reach(),
                    scaling: weapon.core.scaling_name,
                    scaling_value: weapon.scaling_value(),
                });
            }
            print_json(&listing)
        }
        Command::Presets => {
            let presets: Vec<PresetInfo> = StagePreset::all()
                .into_iter()
                .map(|preset| {
                    let (width, height) = preset.dimensions();
                    PresetInfo {
                        name: preset.as_str(),
                        width,
                        height,
                        max_speed: preset.max_speed(),
                        ball_radius: preset.ball_radius(),
                    }
                })
                .collect();
            print_json(&presets)
        }
    }
}
