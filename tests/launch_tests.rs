// Integration tests for launch sequencing.
//
// The stagger delay between spawns is a liveness heuristic (the bootstrap
// server registers one peer at a time), not a correctness guarantee, so the
// timing tests only assert the lower bound the sequencer promises.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;

use p2p_fleet::config::{FleetConfig, SpawnFailurePolicy};
use p2p_fleet::launcher::{launch, CommandLauncher, ProcessLauncher};
use p2p_fleet::provision::provision;
use p2p_fleet::FleetError;

/// Records every spawn instead of starting processes.
struct RecordingLauncher {
    spawns: Mutex<Vec<(Instant, Vec<OsString>)>>,
}

impl RecordingLauncher {
    fn new() -> Self {
        Self {
            spawns: Mutex::new(Vec::new()),
        }
    }

    fn spawn_times(&self) -> Vec<Instant> {
        self.spawns.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }

    fn spawn_args(&self) -> Vec<Vec<OsString>> {
        self.spawns.lock().unwrap().iter().map(|(_, a)| a.clone()).collect()
    }
}

impl ProcessLauncher for RecordingLauncher {
    fn spawn_detached(
        &self,
        _program: &Path,
        args: &[OsString],
        _cwd: &Path,
    ) -> std::io::Result<()> {
        self.spawns.lock().unwrap().push((Instant::now(), args.to_vec()));
        Ok(())
    }
}

fn provisioned_fleet(root: &TempDir, node_count: u32, launch_count: u32) -> FleetConfig {
    let config = FleetConfig {
        node_count,
        launch_count,
        launch_delay_secs: 0,
        storage_root: root.path().join("storage"),
        config_dir: root.path().join("configs"),
        content_catalog: vec!["A".to_string(), "B".to_string()],
        ..Default::default()
    };
    let mut rng = StdRng::seed_from_u64(1);
    provision(&config, &mut rng).unwrap();
    config
}

#[test]
fn test_spawn_count_matches_launch_count() {
    let root = TempDir::new().unwrap();
    let config = provisioned_fleet(&root, 5, 3);
    let descriptors = p2p_fleet::fleet_descriptors(&config);

    let launcher = RecordingLauncher::new();
    let report = launch(&descriptors, &config, &launcher).unwrap();

    assert_eq!(report.launched, vec![1, 2, 3]);
    assert_eq!(
        launcher.spawn_args(),
        vec![
            vec![OsString::from("node1.properties")],
            vec![OsString::from("node2.properties")],
            vec![OsString::from("node3.properties")],
        ]
    );
}

#[test]
fn test_zero_launch_count_spawns_nothing_and_never_sleeps() {
    let root = TempDir::new().unwrap();
    let mut config = provisioned_fleet(&root, 3, 0);
    config.launch_delay_secs = 60;
    let descriptors = p2p_fleet::fleet_descriptors(&config);

    let launcher = RecordingLauncher::new();
    let started = Instant::now();
    let report = launch(&descriptors, &config, &launcher).unwrap();

    assert!(report.launched.is_empty());
    assert!(launcher.spawn_times().is_empty());
    // A 60s delay would be unmissable; completion must be immediate
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_spawns_are_separated_by_at_least_the_delay() {
    let root = TempDir::new().unwrap();
    let mut config = provisioned_fleet(&root, 3, 3);
    config.launch_delay_secs = 1;
    let descriptors = p2p_fleet::fleet_descriptors(&config);

    let launcher = RecordingLauncher::new();
    launch(&descriptors, &config, &launcher).unwrap();

    let times = launcher.spawn_times();
    assert_eq!(times.len(), 3);
    for pair in times.windows(2) {
        // Lower bound only; scheduling jitter can stretch the gap
        assert!(pair[1].duration_since(pair[0]) >= Duration::from_secs(1));
    }
}

#[test]
fn test_launch_count_above_provisioned_is_config_error() {
    let root = TempDir::new().unwrap();
    let mut config = provisioned_fleet(&root, 2, 2);
    config.launch_count = 4;
    let descriptors = p2p_fleet::fleet_descriptors(&config);

    let launcher = RecordingLauncher::new();
    let err = launch(&descriptors, &config, &launcher).unwrap_err();

    assert!(matches!(err, FleetError::Config(_)));
    assert!(launcher.spawn_times().is_empty(), "no spawn before validation");
}

#[test]
fn test_command_launcher_fire_and_forget() {
    // Spawn a real short-lived process; the sequencer must not wait on it
    let root = TempDir::new().unwrap();
    let mut config = provisioned_fleet(&root, 2, 2);
    config.node_program = PathBuf::from("/bin/sh");

    // /bin/sh treats the properties file name as a script; it exits on its
    // own and nobody collects it, which is exactly the contract.
    let descriptors = p2p_fleet::fleet_descriptors(&config);
    let report = launch(&descriptors, &config, &CommandLauncher).unwrap();
    assert_eq!(report.launched, vec![1, 2]);
}

#[test]
fn test_command_launcher_missing_program_continue_policy() {
    let root = TempDir::new().unwrap();
    let mut config = provisioned_fleet(&root, 2, 2);
    config.node_program = PathBuf::from("/nonexistent/p2p-node");
    config.on_spawn_failure = SpawnFailurePolicy::Continue;

    let descriptors = p2p_fleet::fleet_descriptors(&config);
    let report = launch(&descriptors, &config, &CommandLauncher).unwrap();

    assert!(report.launched.is_empty());
    assert_eq!(report.failed, vec![1, 2]);
    assert!(!report.all_launched());
}

#[test]
fn test_command_launcher_missing_program_abort_policy() {
    let root = TempDir::new().unwrap();
    let mut config = provisioned_fleet(&root, 2, 2);
    config.node_program = PathBuf::from("/nonexistent/p2p-node");
    config.on_spawn_failure = SpawnFailurePolicy::Abort;

    let descriptors = p2p_fleet::fleet_descriptors(&config);
    let err = launch(&descriptors, &config, &CommandLauncher).unwrap_err();

    match err {
        FleetError::Spawn { id, program, .. } => {
            assert_eq!(id, 1);
            assert_eq!(program, PathBuf::from("/nonexistent/p2p-node"));
        }
        other => panic!("expected spawn error, got {:?}", other),
    }
}
