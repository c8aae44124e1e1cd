//! Startup, in order: pid file, settings, EULA, world access, data packs, optional upgrade, then
//! the server itself and its shutdown hook.

use std::{path::Path, time::Duration};

use anyhow::Context;
use tracing::{info, instrument, warn};

use crate::{
    cli::StartupConfig,
    common::{config::ServerProperties, eula::Eula, pid::PidFile, runtime::AsyncRuntime},
    loader::{self, NewWorldOptions},
    server::{self, ServerHandle, ServerParts, ServerSettings},
    shutdown::{InterruptFlag, ShutdownHook},
    storage::{LevelStorageAccess, LevelStorageSource},
    upgrade::{self, WorldUpgrader},
};

pub const PROPERTIES_FILE: &str = "server.properties";
pub const EULA_FILE: &str = "eula.txt";

const UPGRADE_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// How startup ended.
#[derive(Debug)]
pub enum Startup {
    /// `--initSettings` wrote the settings files.
    SettingsInitialized,
    EulaNotAccepted,
    RequiresManualConversion,
    IncompatibleWorld,
    DataPacksFailed,
    /// A termination signal cancelled the forced upgrade.
    UpgradeCancelled,
    Running(RunningServer),
}

/// A started server with its shutdown hook installed.
#[derive(Debug)]
pub struct RunningServer {
    pub server: ServerHandle,
    shutdown: ShutdownHook,
    pid_file: Option<PidFile>,
}

impl RunningServer {
    /// Blocks until the server thread has exited, then removes the hook and the pid file.
    pub fn wait(self) -> anyhow::Result<()> {
        let Self {
            server,
            shutdown,
            pid_file,
        } = self;

        let joined = server.join();
        shutdown.close();
        drop(pid_file);
        joined
    }
}

/// Runs the startup sequence with files relative to `root`. Only returns an error for failures
/// that should be reported as fatal; refusals to start are [`Startup`] variants.
#[instrument(skip(config))]
pub fn run(config: &StartupConfig, root: &Path) -> anyhow::Result<Startup> {
    let pid_file = config
        .pid_file
        .as_deref()
        .map(|path| PidFile::write(&root.join(path)))
        .transpose()?;

    let properties_path = root.join(PROPERTIES_FILE);
    let properties = ServerProperties::load(&properties_path)?;
    properties.store(&properties_path)?;

    let eula = Eula::load(&root.join(EULA_FILE));

    if config.init_settings {
        info!(
            "Initialized '{}' and '{}'",
            properties_path.display(),
            eula.file().display()
        );
        return Ok(Startup::SettingsInitialized);
    }

    if !eula.has_agreed_to_eula() {
        info!(
            "You need to agree to the EULA in order to run the server. Go to eula.txt for more info."
        );
        return Ok(Startup::EulaNotAccepted);
    }

    let source = LevelStorageSource::new(root.join(&config.universe))
        .context("failed to open the world directory")?;
    let storage = source
        .validate_and_create_access(config.world_name(&properties.level_name))
        .context("failed to access the world")?;

    if let Some(refusal) = check_summary(&storage)? {
        storage.close();
        return Ok(refusal);
    }

    if config.safe_mode {
        warn!("Safe mode active, only vanilla datapack will be loaded");
    }

    let runtime = AsyncRuntime::new().context("failed to create the async runtime")?;

    let new_world = NewWorldOptions {
        demo: config.demo,
        bonus_chest: config.bonus_chest,
    };
    let stem = match loader::load_world_stem(
        &runtime,
        &storage,
        &properties,
        new_world,
        config.safe_mode,
    ) {
        Ok(stem) => stem,
        Err(e) => {
            warn!(
                "Failed to load datapacks, can't proceed with server load. You can either fix \
                 your datapacks or reset to vanilla with --safeMode: {e:#}"
            );
            storage.close();
            return Ok(Startup::DataPacksFailed);
        }
    };

    if config.force_upgrade {
        let dimensions = stem.registries.level_stems.keys().cloned().collect();
        let interrupt = InterruptFlag::register()?;
        let upgrader = WorldUpgrader::start(storage.level_dir(), dimensions, config.erase_cache)?;
        upgrade::force_upgrade(&upgrader, || !interrupt.is_set(), UPGRADE_POLL_INTERVAL);
        drop(upgrader);

        if interrupt.is_set() {
            storage.close();
            return Ok(Startup::UpgradeCancelled);
        }
    }

    storage
        .save_level_data(&stem.world_data)
        .context("failed to save the level data")?;

    let settings = ServerSettings {
        port_override: config.port_override(),
        demo: config.demo,
        server_id: config.server_id.clone(),
        profile: config.jfr_profile,
        front_end: !config.gui_suppressed() && server::display_available(),
        console: true,
    };

    let server = server::spin(
        ServerParts {
            runtime,
            storage,
            stem,
            properties,
            root: root.to_path_buf(),
        },
        settings,
    )?;
    let shutdown = ShutdownHook::install(server.clone())?;

    Ok(Startup::Running(RunningServer {
        server,
        shutdown,
        pid_file,
    }))
}

/// Refuses worlds that this version cannot open. New worlds have no summary and pass.
fn check_summary(storage: &LevelStorageAccess) -> anyhow::Result<Option<Startup>> {
    let Some(summary) = storage
        .summary()
        .context("failed to read the world summary")?
    else {
        return Ok(None);
    };

    if summary.requires_manual_conversion() {
        info!("This world must be opened in an older version (like 1.6.4) to be safely converted");
        return Ok(Some(Startup::RequiresManualConversion));
    }

    if !summary.is_compatible() {
        info!("This world was created by an incompatible version.");
        return Ok(Some(Startup::IncompatibleWorld));
    }

    Ok(None)
}
