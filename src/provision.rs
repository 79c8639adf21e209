//! Fleet layout generation.
//!
//! For each node id the generator creates the node's storage subtree, renders
//! its properties file, and seeds its content lists:
//!
//! ```text
//! <storage_root>/node<id>/local_storage/filelist.txt   random catalog subset
//! <storage_root>/node<id>/cache_storage/filelist.txt   always empty
//! <config_dir>/node<id>.properties
//! ```
//!
//! Directory creation is idempotent; file contents are overwritten on every
//! run. The first IO failure aborts the whole run with the node id and
//! operation that hit it; already-created directories are not rolled back.

use log::{debug, info};
use rand::seq::SliceRandom;
use rand::Rng;
use std::fs;
use std::path::PathBuf;

use crate::config::FleetConfig;
use crate::error::{FleetError, Result};
use crate::properties::NodeProperties;

/// Directory names inside each node's subtree, fixed by the node program.
pub const LOCAL_STORAGE_DIR: &str = "local_storage";
pub const CACHE_STORAGE_DIR: &str = "cache_storage";
/// Content list file name, one entry per line.
pub const FILELIST_NAME: &str = "filelist.txt";

/// One provisioned node: paths and derived values for a 1-based id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDescriptor {
    /// 1-based node id.
    pub id: u32,
    /// Listening port, `base_port + id`.
    pub port: u16,
    /// `<storage_root>/node<id>/local_storage`
    pub local_dir: PathBuf,
    /// `<storage_root>/node<id>/cache_storage`
    pub cache_dir: PathBuf,
    /// `<config_dir>/node<id>.properties`
    pub config_path: PathBuf,
    /// Catalog subset seeded into this node's local storage.
    pub assigned_content: Vec<String>,
}

impl NodeDescriptor {
    /// Derive the descriptor for a 1-based id from the config alone, with no
    /// content assignment and no filesystem access. Used to address an
    /// already-provisioned fleet for launching.
    pub fn derive(config: &FleetConfig, id: u32) -> Self {
        let node_dir = config.storage_root.join(format!("node{}", id));
        Self {
            id,
            port: config.port_for(id),
            local_dir: node_dir.join(LOCAL_STORAGE_DIR),
            cache_dir: node_dir.join(CACHE_STORAGE_DIR),
            config_path: config.config_dir.join(format!("node{}.properties", id)),
            assigned_content: Vec::new(),
        }
    }

    /// File name of the node's properties file, as passed to the node
    /// program (which resolves it relative to its working directory).
    pub fn config_file_name(&self) -> String {
        format!("node{}.properties", self.id)
    }
}

/// Descriptors for every node id the config covers, without touching the
/// filesystem. Content assignments are empty; launching does not need them.
pub fn fleet_descriptors(config: &FleetConfig) -> Vec<NodeDescriptor> {
    (1..=config.node_count)
        .map(|id| NodeDescriptor::derive(config, id))
        .collect()
}

/// Provision the whole fleet layout.
///
/// Validates the config, then materializes directories and files for ids
/// `1..=node_count`. Content assignment draws from `rng`; pass a seeded
/// [`rand::rngs::StdRng`] for a reproducible fleet.
pub fn provision<R: Rng + ?Sized>(config: &FleetConfig, rng: &mut R) -> Result<Vec<NodeDescriptor>> {
    config.validate()?;

    // Properties files land here; the node program later resolves them
    // relative to this directory.
    fs::create_dir_all(&config.config_dir)?;

    let mut descriptors = Vec::with_capacity(config.node_count as usize);
    for id in 1..=config.node_count {
        descriptors.push(provision_node(config, id, rng)?);
    }

    info!(
        "provisioned {} node(s) under {}",
        descriptors.len(),
        config.storage_root.display()
    );
    Ok(descriptors)
}

fn provision_node<R: Rng + ?Sized>(
    config: &FleetConfig,
    id: u32,
    rng: &mut R,
) -> Result<NodeDescriptor> {
    let mut descriptor = NodeDescriptor::derive(config, id);

    fs::create_dir_all(&descriptor.local_dir)
        .map_err(|e| FleetError::provision(id, "create local_storage", e))?;
    fs::create_dir_all(&descriptor.cache_dir)
        .map_err(|e| FleetError::provision(id, "create cache_storage", e))?;

    let properties = NodeProperties {
        cache_dir: descriptor.cache_dir.clone(),
        local_dir: descriptor.local_dir.clone(),
        cache_size: config.cache_size,
        port: descriptor.port,
        bootstrap: config.bootstrap.clone(),
    };
    fs::write(&descriptor.config_path, properties.render())
        .map_err(|e| FleetError::provision(id, "write properties file", e))?;

    descriptor.assigned_content = sample_content(&config.content_catalog, rng);
    let mut filelist = String::new();
    for name in &descriptor.assigned_content {
        filelist.push_str(name);
        filelist.push('\n');
    }
    fs::write(descriptor.local_dir.join(FILELIST_NAME), filelist)
        .map_err(|e| FleetError::provision(id, "write local filelist", e))?;

    // The cache starts empty no matter what content the node was assigned.
    fs::write(descriptor.cache_dir.join(FILELIST_NAME), "")
        .map_err(|e| FleetError::provision(id, "write cache filelist", e))?;

    debug!(
        "node {}: port {}, {} assigned item(s)",
        id,
        descriptor.port,
        descriptor.assigned_content.len()
    );

    Ok(descriptor)
}

/// Draw a random subset of the catalog: size uniform over
/// `0..=catalog.len()`, elements without replacement, in sampled order.
fn sample_content<R: Rng + ?Sized>(catalog: &[String], rng: &mut R) -> Vec<String> {
    let size = rng.gen_range(0..=catalog.len());
    catalog.choose_multiple(rng, size).cloned().collect()
}
