use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use stitch_core::{compose, generate_scene, load_usda, save_usda, validate, RandomSceneConfig, SceneDocument};

#[derive(Parser)]
#[command(name = "stitch")]
#[command(about = "Compose and validate flat USD ASCII scenes")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a randomized test scene
    WriteRandomScene {
        /// Output .usda file
        output: PathBuf,

        /// Fixed RNG seed for reproducible output
        #[arg(short = 's', long = "seed")]
        seed: Option<u64>,

        /// JSON file with generator settings
        #[arg(short = 'c', long = "config", value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Merge two scenes into one (the first scene wins conflicts)
    Compose {
        /// First (stronger) scene
        scene_a: PathBuf,
        /// Second scene
        scene_b: PathBuf,
        /// Output .usda file
        output: PathBuf,
    },

    /// Check that a merged scene preserves both sources
    Validate {
        scene_a: PathBuf,
        scene_b: PathBuf,
        merged: PathBuf,

        /// Print the report as JSON
        #[arg(long = "json")]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match run(cli.command) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

/// Execute a command. `Ok(false)` means validation ran and failed.
fn run(command: Commands) -> Result<bool> {
    match command {
        Commands::WriteRandomScene { output, seed, config } => {
            let mut config = match config {
                Some(path) => read_config(&path)?,
                None => RandomSceneConfig::default(),
            };
            if seed.is_some() {
                config.seed = seed;
            }

            let document = generate_scene(&config).context("Failed to generate random scene")?;
            save_usda(&output, &document).with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Wrote USD scene to: {}", output.display());
            Ok(true)
        }

        Commands::Compose { scene_a, scene_b, output } => {
            let a = load(&scene_a)?;
            let b = load(&scene_b)?;
            let merged = compose(&a, &b);
            save_usda(&output, &merged).with_context(|| format!("Failed to write {}", output.display()))?;
            println!(
                "Composed {} + {} → {}",
                scene_a.display(),
                scene_b.display(),
                output.display()
            );
            Ok(true)
        }

        Commands::Validate { scene_a, scene_b, merged, json } => {
            let a = load(&scene_a)?;
            let b = load(&scene_b)?;
            let m = load(&merged)?;

            let report = validate(&a, &b, &m);
            if json {
                let output = serde_json::json!({
                    "passed": report.passed(),
                    "report": report,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("{}", report);
            }
            Ok(report.passed())
        }
    }
}

fn load(path: &Path) -> Result<SceneDocument> {
    load_usda(path).with_context(|| format!("Failed to load {}", path.display()))
}

fn read_config(path: &Path) -> Result<RandomSceneConfig> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read config {}", path.display()))?;
    let config = serde_json::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))?;
    log::debug!("Loaded generator config from {}", path.display());
    Ok(config)
}
