//! Launch sequencing for provisioned nodes.
//!
//! Spawning goes through the [`ProcessLauncher`] trait so the sequencing
//! logic can be exercised without real processes. The production
//! implementation, [`CommandLauncher`], starts the node program detached
//! with its stdio dropped: the sequencer never waits on a node, never reads
//! its output, and never tracks it after the spawn succeeds.
//!
//! The inter-spawn sleep is a race-avoidance heuristic: the bootstrap server
//! registers one new peer at a time, and the delay is a coarse substitute
//! for a readiness handshake.

use log::{info, warn};
use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

use crate::config::{FleetConfig, SpawnFailurePolicy};
use crate::error::{FleetError, Result};
use crate::provision::NodeDescriptor;

/// Capability to start a detached process. One method, no lifetime tracking.
pub trait ProcessLauncher {
    /// Start `program` with `args`, working directory `cwd`, and return as
    /// soon as the process exists. The child's lifetime is the caller's
    /// problem no longer.
    fn spawn_detached(&self, program: &Path, args: &[OsString], cwd: &Path)
        -> std::io::Result<()>;
}

/// Spawns via [`std::process::Command`] with stdio detached.
pub struct CommandLauncher;

impl ProcessLauncher for CommandLauncher {
    fn spawn_detached(
        &self,
        program: &Path,
        args: &[OsString],
        cwd: &Path,
    ) -> std::io::Result<()> {
        info!("spawning {} {:?} in {}", program.display(), args, cwd.display());
        Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
    }
}

/// Outcome of one launch sequence: which node ids spawned, which did not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchReport {
    pub launched: Vec<u32>,
    pub failed: Vec<u32>,
}

impl LaunchReport {
    pub fn all_launched(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Launch the first `launch_count` provisioned nodes in id order.
///
/// Rejects `launch_count > descriptors.len()` before issuing any spawn.
/// Each spawned node gets the properties *file name* as its single
/// argument and `config_dir` as working directory, matching the node
/// program's relative-lookup contract. Sleeps `launch_delay` between
/// spawns; no sleep after the last one.
///
/// A failed spawn either aborts the sequence or is recorded in the report
/// and skipped, per [`FleetConfig::on_spawn_failure`].
pub fn launch<L: ProcessLauncher>(
    descriptors: &[NodeDescriptor],
    config: &FleetConfig,
    launcher: &L,
) -> Result<LaunchReport> {
    let launch_count = config.launch_count as usize;
    if launch_count > descriptors.len() {
        return Err(FleetError::config(format!(
            "launch count {} exceeds the {} provisioned node(s)",
            launch_count,
            descriptors.len()
        )));
    }

    let mut report = LaunchReport::default();
    for (i, descriptor) in descriptors[..launch_count].iter().enumerate() {
        let args = [OsString::from(descriptor.config_file_name())];
        match launcher.spawn_detached(&config.node_program, &args, &config.config_dir) {
            Ok(()) => {
                info!("node {} launched on port {}", descriptor.id, descriptor.port);
                report.launched.push(descriptor.id);
            }
            Err(source) => match config.on_spawn_failure {
                SpawnFailurePolicy::Abort => {
                    return Err(FleetError::Spawn {
                        id: descriptor.id,
                        program: config.node_program.clone(),
                        source,
                    });
                }
                SpawnFailurePolicy::Continue => {
                    warn!(
                        "node {} failed to spawn ({}): {}; continuing with remaining nodes",
                        descriptor.id,
                        config.node_program.display(),
                        source
                    );
                    report.failed.push(descriptor.id);
                }
            },
        }

        if i + 1 < launch_count {
            thread::sleep(config.launch_delay());
        }
    }

    info!(
        "launch sequence finished: {} launched, {} failed",
        report.launched.len(),
        report.failed.len()
    );
    Ok(report)
}
