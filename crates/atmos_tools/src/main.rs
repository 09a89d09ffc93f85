//! Station Atmospherics - Development Tools

use std::path::{Path, PathBuf};

use atmos_tools::scenario::{run_generator_scenario, GeneratorScenario};
use atmos_tools::{inspect, validate, Result, ToolError};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "atmos-tools")]
#[command(about = "Development tools for station atmospherics")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate data files
    Validate {
        /// Path to data directory
        #[arg(default_value = "assets/data")]
        path: PathBuf,
    },
    /// Run a gas generator on a fixed inlet mix
    Generator {
        /// Ticks to run
        #[arg(long, default_value_t = 20)]
        ticks: u32,
        /// Seconds per tick
        #[arg(long, default_value_t = 0.5)]
        dt: f32,
        /// Methane in the inlet (mol)
        #[arg(long, default_value_t = 40.0)]
        methane: f32,
        /// Oxygen in the inlet (mol)
        #[arg(long, default_value_t = 50.0)]
        oxygen: f32,
        /// Inlet temperature (K)
        #[arg(long, default_value_t = 360.0)]
        temperature: f32,
        /// Generator profile id from the data directory
        #[arg(long)]
        profile: Option<String>,
        /// Path to data directory
        #[arg(long, default_value = "assets/data")]
        data: PathBuf,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Summarise a world save file
    InspectSave {
        /// Save file
        file: PathBuf,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli.command) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Validate { path } => {
            tracing::info!("Validating data files in: {}", path.display());
            let report = validate::validate_data_directory(&path)?;
            tracing::info!(
                reactions = report.reactions,
                recipes = report.recipes,
                generators = report.generators,
                "Validation passed"
            );
        }
        Commands::Generator {
            ticks,
            dt,
            methane,
            oxygen,
            temperature,
            profile,
            data,
            json,
        } => {
            let scenario = GeneratorScenario {
                config: match profile {
                    Some(id) => find_profile(&data, &id)?,
                    None => GeneratorScenario::default().config,
                },
                ticks,
                dt,
                methane,
                oxygen,
                temperature,
            };
            let report = run_generator_scenario(&scenario)?;

            if json {
                print_json(&report)?;
            } else {
                println!(
                    "{:>5} {:>18} {:>10} {:>6} {:>9} {:>9}",
                    "tick", "stage", "power W", "eff %", "mol/s", "inlet"
                );
                for row in &report.ticks {
                    println!(
                        "{:>5} {:>18} {:>10.0} {:>6.1} {:>9.3} {:>9.2}",
                        row.tick,
                        format!("{:?}", row.stage),
                        row.power,
                        row.efficiency * 100.0,
                        row.consumption_rate,
                        row.inlet_moles
                    );
                }
                println!(
                    "mean power {:.0} W, exhaust CO2 {:.3} mol, H2O {:.3} mol",
                    report.mean_power(),
                    report.exhaust_carbon_dioxide,
                    report.exhaust_water_vapor
                );
            }
        }
        Commands::InspectSave { file, json } => {
            let summary = inspect::inspect_save(&file)?;
            if json {
                print_json(&summary)?;
            } else {
                println!("version        {}", summary.version);
                println!("tick           {}", summary.tick);
                println!("maps           {:?}", summary.maps);
                println!("entities       {}", summary.entities);
                println!("grids          {} ({} tiles)", summary.grids, summary.tiles);
                println!("generators     {}", summary.generators);
                println!("recyclers      {}", summary.recyclers);
                println!(
                    "pipe gas       {} mixtures on {} entities, {:.2} mol",
                    summary.snapshot_mixtures, summary.snapshot_owners, summary.snapshot_moles
                );
            }
        }
    }
    Ok(())
}

fn find_profile(data: &Path, id: &str) -> Result<atmos_core::data::GasGeneratorConfig> {
    validate::load_generator_profiles(data)?
        .into_iter()
        .find(|config| config.id == id)
        .ok_or_else(|| ToolError::UnknownProfile(id.to_string()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
