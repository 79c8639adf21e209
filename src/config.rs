//! Fleet configuration handling for saving and loading provisioning configs.
//!
//! The whole run is driven by one explicit [`FleetConfig`] value constructed
//! up front (from a JSON file, CLI flags, or both) and passed into the layout
//! generator and the launch sequencer. There is no process-wide mutable state.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use strum::{Display, EnumString};

use crate::error::{FleetError, Result};

/// Address of the shared bootstrap server, identical for every node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapAddress {
    pub host: String,
    pub port: u16,
}

/// What to do when a single node fails to spawn during launch sequencing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SpawnFailurePolicy {
    /// Log the failure for that node and keep launching the rest.
    #[default]
    Continue,
    /// Abort the whole launch sequence on the first failed spawn.
    Abort,
}

/// Fleet provisioning configuration that can be saved/loaded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetConfig {
    /// Number of node directory sets to provision.
    pub node_count: u32,
    /// Number of provisioned nodes to actually start; must not exceed `node_count`.
    pub launch_count: u32,
    /// Delay between successive launches, in seconds.
    pub launch_delay_secs: u64,
    /// Absolute base path under which all node directories are created.
    pub storage_root: PathBuf,
    /// Directory where per-node `.properties` files are written. May be
    /// relative; the node program resolves properties files from here.
    pub config_dir: PathBuf,
    /// Node i listens on `base_port + i`.
    pub base_port: u16,
    /// Shared bootstrap server written into every node's config.
    pub bootstrap: BootstrapAddress,
    /// Fixed cache capacity in bytes, applied uniformly to all nodes.
    pub cache_size: u64,
    /// The external node executable, invoked once per launched node.
    pub node_program: PathBuf,
    #[serde(default)]
    pub on_spawn_failure: SpawnFailurePolicy,
    /// Candidate file names each node's initial local content is sampled from.
    #[serde(default = "default_catalog")]
    pub content_catalog: Vec<String>,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            node_count: 10,
            launch_count: 10,
            launch_delay_secs: 15,
            storage_root: PathBuf::from("/tmp/p2p-fleet"),
            config_dir: PathBuf::from("."),
            base_port: 1235,
            bootstrap: BootstrapAddress {
                host: "127.0.0.1".to_string(),
                port: 55555,
            },
            cache_size: 10_000_000,
            node_program: PathBuf::from("p2p-node"),
            on_spawn_failure: SpawnFailurePolicy::default(),
            content_catalog: default_catalog(),
        }
    }
}

impl FleetConfig {
    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize fleet configuration to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse configuration JSON")?;

        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// Runs before any side effect: a config that fails here has created no
    /// directories and spawned no processes.
    pub fn validate(&self) -> Result<()> {
        if self.launch_count > self.node_count {
            return Err(FleetError::config(format!(
                "launch count {} exceeds node count {}",
                self.launch_count, self.node_count
            )));
        }

        if !self.storage_root.is_absolute() {
            return Err(FleetError::config(format!(
                "storage root must be an absolute path, got {:?}",
                self.storage_root
            )));
        }

        if self.bootstrap.host.trim().is_empty() {
            return Err(FleetError::config("bootstrap host must be specified"));
        }

        if self.node_program.as_os_str().is_empty() {
            return Err(FleetError::config("node program must be specified"));
        }

        // Ports are base_port + id for ids 1..=node_count; the top one must fit in u16.
        let top_port = u32::from(self.base_port) + self.node_count;
        if top_port > u32::from(u16::MAX) {
            return Err(FleetError::config(format!(
                "base port {} plus node count {} overflows the port range",
                self.base_port, self.node_count
            )));
        }

        let mut seen = HashSet::new();
        for name in &self.content_catalog {
            if name.trim().is_empty() {
                return Err(FleetError::config("content catalog entries must be non-empty"));
            }
            if !seen.insert(name.as_str()) {
                return Err(FleetError::config(format!(
                    "content catalog contains duplicate entry {:?}",
                    name
                )));
            }
        }

        Ok(())
    }

    /// Delay between successive launches.
    pub fn launch_delay(&self) -> Duration {
        Duration::from_secs(self.launch_delay_secs)
    }

    /// Listening port for a 1-based node id. Ids are validated against the
    /// port range in [`validate`](Self::validate).
    pub fn port_for(&self, id: u32) -> u16 {
        (u32::from(self.base_port) + id) as u16
    }
}

/// The catalog used when a config supplies none of its own.
fn default_catalog() -> Vec<String> {
    [
        "Adventures of Tintin",
        "Jack and Jill",
        "Glee",
        "The Vampire Diarie",
        "King Arthur",
        "Windows XP",
        "Harry Potter",
        "Kung Fu Panda",
        "Lady Gaga",
        "Twilight",
        "Windows 8",
        "Mission Impossible",
        "Turn Up The Music",
        "Super Mario",
        "American Pickers",
        "Microsoft Office 2010",
        "Happy Feet",
        "Modern Family",
        "American Idol",
        "Hacking for Dummies",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
