use std::path::PathBuf;

use clap::Parser;

/// Dedicated server for a block world.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(version, about)]
#[expect(clippy::struct_excessive_bools, reason = "one per command-line flag")]
pub struct StartupConfig {
    /// Do not start the status front end
    #[arg(long)]
    pub nogui: bool,

    /// Initializes 'server.properties' and 'eula.txt', then quits
    #[arg(long = "initSettings")]
    pub init_settings: bool,

    #[arg(long)]
    pub demo: bool,

    /// Place a bonus chest in a newly created world
    #[arg(long = "bonusChest")]
    pub bonus_chest: bool,

    /// Upgrade every chunk of the world before starting
    #[arg(long = "forceUpgrade")]
    pub force_upgrade: bool,

    /// Drop cached data such as light while upgrading
    #[arg(long = "eraseCache")]
    pub erase_cache: bool,

    /// Loads level with vanilla datapack only
    #[arg(long = "safeMode")]
    pub safe_mode: bool,

    /// Directory holding the worlds
    #[arg(long, default_value = ".")]
    pub universe: PathBuf,

    /// World name, instead of `level-name` from server.properties
    #[arg(long)]
    pub world: Option<String>,

    /// Port to listen on, -1 for `server-port` from server.properties
    #[arg(
        long,
        default_value_t = -1,
        allow_negative_numbers = true,
        value_parser = clap::value_parser!(i32).range(-1..=65535)
    )]
    pub port: i32,

    #[arg(long = "serverId")]
    pub server_id: Option<String>,

    /// Record tick timings to debug/server-<time>.json
    #[arg(long = "jfrProfile")]
    pub jfr_profile: bool,

    #[arg(long = "pidFile")]
    pub pid_file: Option<PathBuf>,

    /// Remaining non-option arguments
    #[arg(trailing_var_arg = true)]
    pub extra: Vec<String>,
}

impl StartupConfig {
    /// The port to use instead of the configured one, if any.
    #[must_use]
    pub fn port_override(&self) -> Option<u16> {
        u16::try_from(self.port).ok()
    }

    /// `--nogui`, or `nogui` among the trailing arguments.
    #[must_use]
    pub fn gui_suppressed(&self) -> bool {
        self.nogui || self.extra.iter().any(|arg| arg == "nogui")
    }

    /// The world to open: `--world`, else the configured level name.
    #[must_use]
    pub fn world_name<'a>(&'a self, level_name: &'a str) -> &'a str {
        self.world.as_deref().unwrap_or(level_name)
    }
}
