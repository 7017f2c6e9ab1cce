use clap::Subcommand;
use studycycle_core::storage::Database;
use studycycle_core::{Config, CycleConfig};

use super::timer::{format_clock, load_scheduler, save_scheduler};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "theme", "cycle.study_secs")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
    /// Apply new cycle durations (seconds; fractional input is clamped)
    Cycle {
        #[arg(long)]
        ready: f64,
        #[arg(long)]
        study: f64,
        #[arg(long)]
        rest: f64,
        #[arg(long)]
        sets: f64,
        /// Discard a run in progress without asking
        #[arg(long)]
        yes: bool,
    },
    /// Manage named study presets
    Preset {
        #[command(subcommand)]
        action: PresetAction,
    },
}

#[derive(Subcommand)]
pub enum PresetAction {
    /// List presets (built-ins marked with *)
    List,
    /// Add a user preset
    Add {
        name: String,
        /// Study duration in seconds
        study_secs: u64,
    },
    /// Remove a user preset
    Rm {
        name: String,
        /// Remove without asking
        #[arg(long)]
        yes: bool,
    },
    /// Apply a preset's study duration to the cycle
    Apply {
        name: String,
        /// Discard a run in progress without asking
        #[arg(long)]
        yes: bool,
    },
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load_or_default();
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => {
                    eprintln!("unknown key: {key}");
                    std::process::exit(1);
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load_or_default();
            config.set(&key, &value)?;
            println!("ok");
        }
        ConfigAction::List => {
            let config = Config::load_or_default();
            let json = serde_json::to_string_pretty(&config)?;
            println!("{json}");
        }
        ConfigAction::Reset => {
            let config = Config::default();
            config.save()?;
            println!("config reset to defaults");
        }
        ConfigAction::Cycle {
            ready,
            study,
            rest,
            sets,
            yes,
        } => {
            let cycle = CycleConfig::sanitized(ready, study, rest, sets);
            let db = Database::open()?;
            let mut config = Config::load_or_default();
            let mut scheduler = load_scheduler(&db, &config);
            if scheduler.would_discard_progress() && !yes {
                eprintln!("a run is in progress; pass --yes to discard it");
                std::process::exit(1);
            }
            config.apply_cycle(cycle)?;
            scheduler.set_config(cycle)?;
            save_scheduler(&db, &scheduler)?;
            println!(
                "cycle applied: ready {}s, study {}s, rest {}s, {} set(s)",
                cycle.ready_secs, cycle.study_secs, cycle.rest_secs, cycle.total_sets
            );
        }
        ConfigAction::Preset { action } => run_preset(action)?,
    }
    Ok(())
}

fn run_preset(action: PresetAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        PresetAction::List => {
            let config = Config::load_or_default();
            for preset in &config.presets {
                let marker = if preset.builtin { "*" } else { " " };
                println!(
                    "{marker} {:<12} {}",
                    preset.name,
                    format_clock(preset.study_secs)
                );
            }
        }
        PresetAction::Add { name, study_secs } => {
            let mut config = Config::load_or_default();
            config.add_preset(&name, study_secs)?;
            println!("added '{name}'");
        }
        PresetAction::Rm { name, yes } => {
            if !yes {
                eprintln!("removing preset '{name}'; pass --yes to confirm");
                std::process::exit(1);
            }
            let mut config = Config::load_or_default();
            if config.remove_preset(&name)? {
                println!("removed '{name}'");
            } else {
                println!("no preset named '{name}'");
            }
        }
        PresetAction::Apply { name, yes } => {
            let db = Database::open()?;
            let mut config = Config::load_or_default();
            let mut scheduler = load_scheduler(&db, &config);
            if scheduler.would_discard_progress() && !yes {
                eprintln!("a run is in progress; pass --yes to discard it");
                std::process::exit(1);
            }
            let cycle = config.apply_preset(&name)?;
            scheduler.set_config(cycle)?;
            save_scheduler(&db, &scheduler)?;
            println!("preset '{name}' applied: study {}s", cycle.study_secs);
        }
    }
    Ok(())
}
