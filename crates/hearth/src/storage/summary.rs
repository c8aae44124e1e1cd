use hearth_clap::GameMode;
use serde::Deserialize;

use crate::common::version::LevelVersion;

/// A lightweight description of a stored world, read without loading it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelSummary {
    pub level_id: String,
    pub level_name: String,
    /// Milliseconds since the Unix epoch.
    pub last_played: u64,
    pub game_mode: GameMode,
    pub hardcore: bool,
    pub allow_commands: bool,
    pub version: LevelVersion,
}

impl LevelSummary {
    /// Worlds in an older storage layout must be converted by an older game version first.
    #[must_use]
    pub const fn requires_manual_conversion(&self) -> bool {
        self.version.requires_manual_conversion()
    }

    #[must_use]
    pub fn is_compatible(&self) -> bool {
        self.version.is_compatible()
    }

    /// The world will be upgraded when loaded.
    #[must_use]
    pub const fn needs_upgrade(&self) -> bool {
        self.version.is_older()
    }
}

/// The subset of the level file a summary needs; everything else is ignored so that worlds in
/// other layouts still produce a summary.
#[derive(Deserialize)]
pub(super) struct SummaryFile {
    pub version: LevelVersion,
    #[serde(default)]
    pub settings: SummarySettings,
    #[serde(default)]
    pub last_played: u64,
}

#[derive(Deserialize, Default)]
pub(super) struct SummarySettings {
    #[serde(default)]
    pub level_name: Option<String>,
    #[serde(default)]
    pub game_type: GameMode,
    #[serde(default)]
    pub hardcore: bool,
    #[serde(default)]
    pub allow_commands: bool,
}

impl SummaryFile {
    pub(super) fn into_summary(self, level_id: &str) -> LevelSummary {
        LevelSummary {
            level_id: level_id.to_owned(),
            level_name: self
                .settings
                .level_name
                .unwrap_or_else(|| level_id.to_owned()),
            last_played: self.last_played,
            game_mode: self.settings.game_type,
            hardcore: self.settings.hardcore,
            allow_commands: self.settings.allow_commands,
            version: self.version,
        }
    }
}
