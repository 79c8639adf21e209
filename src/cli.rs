use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{BootstrapAddress, FleetConfig, SpawnFailurePolicy};

/// p2p-fleet - provision and launch a local p2p file-transfer test fleet
#[derive(Parser)]
#[command(name = "p2p-fleet")]
#[command(about = "Provisions node directories and configs, then launches the node fleet")]
#[command(version)]
pub struct Cli {
    /// Seed for reproducible content assignment.
    ///
    /// By default each run draws fresh entropy, so every node gets a
    /// different random catalog subset on every run.
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Provision the fleet layout, then launch nodes (the default)
    Up {
        #[command(flatten)]
        overrides: ConfigOverrides,
    },
    /// Provision node directories, configs, and content lists only
    Provision {
        #[command(flatten)]
        overrides: ConfigOverrides,
    },
    /// Launch nodes of an already-provisioned fleet
    Launch {
        #[command(flatten)]
        overrides: ConfigOverrides,
    },
    /// Validate a fleet configuration file
    Validate {
        /// Path to configuration file to validate
        config: PathBuf,
    },
}

/// Fleet parameters, each overriding the config file (or built-in default).
#[derive(Args, Clone, Default)]
pub struct ConfigOverrides {
    /// Path to fleet configuration file (JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of node directory sets to provision
    #[arg(long)]
    pub node_count: Option<u32>,

    /// Number of provisioned nodes to actually start
    #[arg(long)]
    pub launch_count: Option<u32>,

    /// Seconds to sleep between successive node launches
    #[arg(long)]
    pub delay: Option<u64>,

    /// Absolute base path for all node storage directories
    #[arg(long)]
    pub storage_root: Option<PathBuf>,

    /// Directory where node .properties files are written
    #[arg(long)]
    pub config_dir: Option<PathBuf>,

    /// Node i listens on this port plus i
    #[arg(long)]
    pub base_port: Option<u16>,

    /// Bootstrap server host written into every node config
    #[arg(long)]
    pub bootstrap_host: Option<String>,

    /// Bootstrap server port written into every node config
    #[arg(long)]
    pub bootstrap_port: Option<u16>,

    /// Cache capacity in bytes, uniform across nodes
    #[arg(long)]
    pub cache_size: Option<u64>,

    /// External node executable to launch
    #[arg(long)]
    pub node_program: Option<PathBuf>,

    /// What to do when a node fails to spawn (continue, abort)
    #[arg(long)]
    pub on_spawn_failure: Option<SpawnFailurePolicy>,

    /// File with one content catalog entry per line
    #[arg(long)]
    pub catalog: Option<PathBuf>,
}

impl ConfigOverrides {
    /// Build the effective [`FleetConfig`]: config file (if any) over the
    /// built-in defaults, then individual flags over that.
    pub fn resolve(&self) -> anyhow::Result<FleetConfig> {
        let mut config = match &self.config {
            Some(path) => FleetConfig::load_from_file(path)?,
            None => FleetConfig::default(),
        };

        if let Some(node_count) = self.node_count {
            config.node_count = node_count;
        }
        if let Some(launch_count) = self.launch_count {
            config.launch_count = launch_count;
        }
        if let Some(delay) = self.delay {
            config.launch_delay_secs = delay;
        }
        if let Some(storage_root) = &self.storage_root {
            config.storage_root = storage_root.clone();
        }
        if let Some(config_dir) = &self.config_dir {
            config.config_dir = config_dir.clone();
        }
        if let Some(base_port) = self.base_port {
            config.base_port = base_port;
        }
        if let Some(host) = &self.bootstrap_host {
            config.bootstrap = BootstrapAddress {
                host: host.clone(),
                port: config.bootstrap.port,
            };
        }
        if let Some(port) = self.bootstrap_port {
            config.bootstrap.port = port;
        }
        if let Some(cache_size) = self.cache_size {
            config.cache_size = cache_size;
        }
        if let Some(node_program) = &self.node_program {
            config.node_program = node_program.clone();
        }
        if let Some(policy) = self.on_spawn_failure {
            config.on_spawn_failure = policy;
        }
        if let Some(catalog_path) = &self.catalog {
            config.content_catalog = read_catalog(catalog_path)?;
        }

        Ok(config)
    }
}

/// Read a catalog file: one entry per line, blank lines skipped.
fn read_catalog(path: &std::path::Path) -> anyhow::Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read content catalog from {:?}", path))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}
