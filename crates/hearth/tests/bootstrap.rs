use std::{
    cell::Cell,
    path::{Path, PathBuf},
    time::Duration,
};

use clap::Parser;
use hearth::{
    Startup, StartupConfig, bootstrap,
    storage::LEVEL_FILE,
    upgrade::{
        CHUNKS_DIR, DataFixer, UpgradeDriver, UpgradeProgress, chunk_file_name, force_upgrade,
        progress_line,
    },
};

fn root() -> PathBuf {
    let root = std::env::temp_dir().join(format!("hearth-bootstrap-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&root).unwrap();
    root
}

fn config(args: &[&str]) -> StartupConfig {
    StartupConfig::try_parse_from(std::iter::once("hearth").chain(args.iter().copied())).unwrap()
}

fn accept_eula(root: &Path) {
    std::fs::write(root.join(bootstrap::EULA_FILE), "eula=true\n").unwrap();
}

fn write_level_file(root: &Path, world: &str, contents: &str) {
    let dir = root.join(world);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(LEVEL_FILE), contents).unwrap();
}

#[test]
fn init_settings_writes_both_files_and_stops() {
    let root = root();

    let startup = bootstrap::run(&config(&["--initSettings"]), &root).unwrap();

    assert!(matches!(startup, Startup::SettingsInitialized));
    let properties = std::fs::read_to_string(root.join(bootstrap::PROPERTIES_FILE)).unwrap();
    assert!(properties.contains("server-port=25565"));
    let eula = std::fs::read_to_string(root.join(bootstrap::EULA_FILE)).unwrap();
    assert!(eula.contains("eula=false"));
    assert!(!root.join("world").exists());
}

#[test]
fn no_eula_means_no_world_access() {
    let root = root();

    let startup = bootstrap::run(&config(&["--pidFile", "hearth.pid"]), &root).unwrap();

    assert!(matches!(startup, Startup::EulaNotAccepted));
    assert!(!root.join("world").exists());
    assert!(!root.join("hearth.pid").exists());
}

#[test]
fn worlds_needing_manual_conversion_are_refused() {
    let root = root();
    accept_eula(&root);
    write_level_file(
        &root,
        "world",
        "[version]\nname = \"1.6.4\"\ndata_version = 0\nstorage_version = 19132\n",
    );

    let startup = bootstrap::run(&config(&[]), &root).unwrap();

    assert!(matches!(startup, Startup::RequiresManualConversion));
}

#[test]
fn incompatible_worlds_are_refused() {
    let root = root();
    accept_eula(&root);
    write_level_file(
        &root,
        "other",
        "[version]\nname = \"24w01a\"\ndata_version = 3800\nseries = \"snapshot\"\nstorage_version \
         = 19133\n",
    );

    let startup = bootstrap::run(&config(&["--world", "other"]), &root).unwrap();

    assert!(matches!(startup, Startup::IncompatibleWorld));
}

#[test]
fn broken_data_packs_stop_startup_unless_in_safe_mode() {
    let root = root();
    accept_eula(&root);
    std::fs::write(root.join(bootstrap::PROPERTIES_FILE), "server-port=0\n").unwrap();

    let pack = root.join("world").join("datapacks").join("broken");
    std::fs::create_dir_all(&pack).unwrap();
    std::fs::write(
        pack.join("pack.toml"),
        "pack_format = 18\n[dimension_types.'minecraft:overworld']\nmin_y = 0\nheight = 100\n\
         logical_height = 100\n",
    )
    .unwrap();

    let startup = bootstrap::run(&config(&["--nogui"]), &root).unwrap();
    assert!(matches!(startup, Startup::DataPacksFailed));
    assert!(!root.join("world").join(LEVEL_FILE).exists());

    let startup = bootstrap::run(&config(&["--nogui", "--safeMode"]), &root).unwrap();
    let Startup::Running(running) = startup else {
        panic!("expected the server to start, got {startup:?}");
    };
    running.server.halt(true);
    running.wait().unwrap();
}

#[test]
fn server_runs_until_halted_then_saves() {
    let root = root();
    accept_eula(&root);
    std::fs::write(root.join(bootstrap::PROPERTIES_FILE), "server-port=0\nmotd=Test\n").unwrap();

    let startup = bootstrap::run(
        &config(&["--nogui", "--pidFile", "hearth.pid", "--serverId", "test"]),
        &root,
    )
    .unwrap();
    let Startup::Running(running) = startup else {
        panic!("expected the server to start, got {startup:?}");
    };

    assert!(root.join("hearth.pid").exists());
    assert!(root.join("world").join(LEVEL_FILE).exists());
    std::thread::sleep(Duration::from_millis(200));
    assert!(running.server.is_running());

    running.server.halt(true);
    running.server.halt(true);
    assert!(running.server.is_stopped());
    running.wait().unwrap();

    assert!(!root.join("hearth.pid").exists());
    assert!(root.join("world").join("data").join("scoreboard.toml").exists());

    let properties = std::fs::read_to_string(root.join(bootstrap::PROPERTIES_FILE)).unwrap();
    assert!(properties.contains("motd=Test"));
    assert!(properties.contains("level-name=world"));
}

fn run_and_halt(root: &Path, args: &[&str]) {
    let startup = bootstrap::run(&config(args), root).unwrap();
    let Startup::Running(running) = startup else {
        panic!("expected the server to start, got {startup:?}");
    };
    running.server.halt(true);
    running.wait().unwrap();
}

#[test]
fn forced_upgrade_rewrites_stored_chunks_before_starting() {
    let root = root();
    accept_eula(&root);
    std::fs::write(root.join(bootstrap::PROPERTIES_FILE), "server-port=0\n").unwrap();

    run_and_halt(&root, &["--nogui"]);

    let chunks = root.join("world").join(CHUNKS_DIR);
    std::fs::create_dir_all(&chunks).unwrap();
    let old = chunks.join(chunk_file_name(0, 0));
    std::fs::write(&old, "DataVersion = 2000\n[Level]\nStatus = \"full\"\n").unwrap();
    let current = DataFixer::default().target();
    let lit = chunks.join(chunk_file_name(1, 0));
    std::fs::write(&lit, format!("DataVersion = {current}\nisLightOn = true\n")).unwrap();

    run_and_halt(&root, &["--nogui", "--forceUpgrade", "--eraseCache"]);

    let upgraded: toml::Table = std::fs::read_to_string(&old).unwrap().parse().unwrap();
    assert_eq!(DataFixer::version_of(&upgraded), current);
    assert_eq!(upgraded["Status"].as_str(), Some("minecraft:full"));
    assert!(!upgraded.contains_key("Level"));

    let erased: toml::Table = std::fs::read_to_string(&lit).unwrap().parse().unwrap();
    assert!(!erased.contains_key("isLightOn"));
}

#[test]
fn progress_lines() {
    assert_eq!(
        progress_line(30 + 10, 100).as_deref(),
        Some("40% completed (40 / 100 chunks)...")
    );
    assert_eq!(progress_line(0, 0), None);
}

#[test]
fn omitted_port_uses_the_configured_one() {
    let config = config(&[]);
    assert_eq!(config.port, -1);
    assert_eq!(config.port_override(), None);
}

/// Finishes a few polls after being cancelled.
struct SlowToCancel {
    polls: Cell<u32>,
    cancelled_at: Cell<Option<u32>>,
}

impl UpgradeDriver for SlowToCancel {
    fn progress(&self) -> UpgradeProgress {
        self.polls.set(self.polls.get() + 1);
        UpgradeProgress {
            converted: 30,
            skipped: 10,
            total: 100,
            status: "Upgrading all chunks...".to_owned(),
        }
    }

    fn is_finished(&self) -> bool {
        self.cancelled_at
            .get()
            .is_some_and(|at| self.polls.get() >= at + 3)
    }

    fn cancel(&self) {
        assert!(self.cancelled_at.get().is_none(), "cancelled twice");
        self.cancelled_at.set(Some(self.polls.get()));
    }
}

#[test]
fn cancelled_upgrade_polls_until_finished() {
    let driver = SlowToCancel {
        polls: Cell::new(0),
        cancelled_at: Cell::new(None),
    };
    let mut asked = 0;

    force_upgrade(
        &driver,
        || {
            asked += 1;
            asked < 3
        },
        Duration::from_millis(1),
    );

    assert_eq!(driver.cancelled_at.get(), Some(3));
    assert_eq!(driver.polls.get(), 6);
    assert_eq!(asked, 3);
}
