//! p2p-fleet - Main entry point
//!
//! Provisions the fleet layout, then launches node processes in sequence.

mod cli;
mod config;
mod error;
mod launcher;
mod properties;
mod provision;

use log::{debug, error, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::cli::{Cli, Commands, ConfigOverrides};
use crate::config::FleetConfig;
use crate::launcher::CommandLauncher;
use crate::provision::NodeDescriptor;

/// Initialize the logger with appropriate settings
fn init_logger() {
    use env_logger::Builder;
    use std::io::Write;

    Builder::from_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}:{}] {}",
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .filter_level(log::LevelFilter::Info)
        .parse_default_env() // Allows RUST_LOG env var to override
        .init();
}

/// Main application entry point
fn main() -> anyhow::Result<()> {
    init_logger();
    info!("p2p-fleet starting up");

    let cli = Cli::parse_args();
    debug!("CLI arguments parsed");

    match cli.command {
        Some(Commands::Validate { config }) => {
            info!("Validating fleet configuration file: {:?}", config);
            match FleetConfig::load_from_file(&config) {
                Ok(config) => match config.validate() {
                    Ok(_) => {
                        info!("Configuration validation successful");
                        println!("✓ Configuration file is valid");
                    }
                    Err(e) => {
                        error!("Configuration validation failed: {}", e);
                        eprintln!("✗ Configuration validation failed: {}", e);
                        std::process::exit(1);
                    }
                },
                Err(e) => {
                    error!("Failed to load configuration file: {}", e);
                    eprintln!("✗ Failed to load configuration file: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::Provision { overrides }) => {
            let config = overrides.resolve()?;
            run_provision(&config, cli.seed)?;
        }
        Some(Commands::Launch { overrides }) => {
            let config = overrides.resolve()?;
            run_launch_only(&config)?;
        }
        Some(Commands::Up { overrides }) => {
            let config = overrides.resolve()?;
            run_up(&config, cli.seed)?;
        }
        None => {
            info!("No command specified, provisioning and launching with defaults");
            let config = ConfigOverrides::default().resolve()?;
            run_up(&config, cli.seed)?;
        }
    }

    Ok(())
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => {
            info!("using fixed seed {} for content assignment", seed);
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    }
}

/// Provision the fleet layout and report what was created.
fn run_provision(config: &FleetConfig, seed: Option<u64>) -> anyhow::Result<Vec<NodeDescriptor>> {
    let mut rng = make_rng(seed);
    let descriptors = provision::provision(config, &mut rng)?;
    println!(
        "✓ Provisioned {} node(s) under {}",
        descriptors.len(),
        config.storage_root.display()
    );
    Ok(descriptors)
}

/// Launch nodes of a fleet provisioned by an earlier run.
fn run_launch_only(config: &FleetConfig) -> anyhow::Result<()> {
    config.validate()?;

    let descriptors = provision::fleet_descriptors(config);
    // Catch a missing provisioning run before the node program does.
    for descriptor in descriptors.iter().take(config.launch_count as usize) {
        if !descriptor.config_path.exists() {
            anyhow::bail!(
                "node {} has no properties file at {:?}; run `p2p-fleet provision` first",
                descriptor.id,
                descriptor.config_path
            );
        }
    }

    run_launch(&descriptors, config)
}

/// Provision, then launch.
fn run_up(config: &FleetConfig, seed: Option<u64>) -> anyhow::Result<()> {
    let descriptors = run_provision(config, seed)?;
    run_launch(&descriptors, config)
}

fn run_launch(descriptors: &[NodeDescriptor], config: &FleetConfig) -> anyhow::Result<()> {
    let report = launcher::launch(descriptors, config, &CommandLauncher)?;
    println!(
        "✓ Launched {} of {} node(s)",
        report.launched.len(),
        config.launch_count
    );
    if !report.all_launched() {
        for id in &report.failed {
            eprintln!("✗ node {} failed to spawn", id);
        }
        std::process::exit(1);
    }
    Ok(())
}
