//! p2p-fleet library
//!
//! Provisions a local test fleet for a peer-to-peer file-transfer network
//! and launches the node processes with a stagger delay. The node program
//! itself is an external executable; this crate only materializes its
//! directories, configs, and initial content, then starts it.

pub mod cli;
pub mod config;
pub mod error;
pub mod launcher;
pub mod properties;
pub mod provision;

// Re-export main types for convenience
pub use cli::{Cli, Commands, ConfigOverrides};
pub use config::{BootstrapAddress, FleetConfig, SpawnFailurePolicy};
pub use error::{FleetError, Result};
pub use launcher::{launch, CommandLauncher, LaunchReport, ProcessLauncher};
pub use properties::NodeProperties;
pub use provision::{fleet_descriptors, provision, NodeDescriptor};
