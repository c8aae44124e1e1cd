//! Version information of the running game and of stored worlds.

use serde::{Deserialize, Serialize};

/// The series every release belongs to. Worlds from other series cannot be opened.
pub const MAIN_SERIES: &str = "main";

/// Layout version of the level storage. Anything else needs a manual conversion.
pub const STORAGE_VERSION: i32 = 19133;

/// The version this server runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameVersion {
    pub name: &'static str,
    pub protocol_version: i32,
    pub data_version: i32,
    pub series: &'static str,
    pub stable: bool,
}

pub const CURRENT: GameVersion = GameVersion {
    name: hearth_proto::MINECRAFT_VERSION,
    protocol_version: hearth_proto::PROTOCOL_VERSION,
    data_version: 3578,
    series: MAIN_SERIES,
    stable: true,
};

/// The version recorded in a world's level file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelVersion {
    pub name: String,
    pub data_version: i32,
    #[serde(default = "main_series")]
    pub series: String,
    #[serde(default)]
    pub snapshot: bool,
    pub storage_version: i32,
}

fn main_series() -> String {
    MAIN_SERIES.to_owned()
}

impl LevelVersion {
    #[must_use]
    pub fn current() -> Self {
        Self {
            name: CURRENT.name.to_owned(),
            data_version: CURRENT.data_version,
            series: CURRENT.series.to_owned(),
            snapshot: !CURRENT.stable,
            storage_version: STORAGE_VERSION,
        }
    }

    /// Whether the world was written by a version in the same series as this one.
    #[must_use]
    pub fn is_compatible(&self) -> bool {
        self.series == CURRENT.series
    }

    #[must_use]
    pub const fn requires_manual_conversion(&self) -> bool {
        self.storage_version != STORAGE_VERSION
    }

    #[must_use]
    pub const fn is_older(&self) -> bool {
        self.data_version < CURRENT.data_version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_version_is_compatible_with_itself() {
        let version = LevelVersion::current();
        assert!(version.is_compatible());
        assert!(!version.requires_manual_conversion());
        assert!(!version.is_older());
    }

    #[test]
    fn other_series_are_incompatible() {
        let version = LevelVersion {
            series: "ccpreview".to_owned(),
            ..LevelVersion::current()
        };
        assert!(!version.is_compatible());
    }
}
