//! `server.properties`: flat `key=value` settings for the dedicated server.

use std::{fmt::Debug, path::Path, str::FromStr};

use anyhow::Context;
use hearth_clap::GameMode;
use ini::{Ini, Properties};
use tracing::{info, instrument, warn};

use crate::world::settings::Difficulty;

/// The configuration for the server, read from a `server.properties` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerProperties {
    pub server_port: u16,
    pub server_ip: String,
    pub level_name: String,
    pub level_seed: String,
    pub level_type: String,
    pub gamemode: GameMode,
    pub difficulty: Difficulty,
    pub hardcore: bool,
    pub motd: String,
    pub max_players: u32,
    pub generate_structures: bool,
    pub initial_enabled_packs: Vec<String>,
    pub initial_disabled_packs: Vec<String>,
    pub function_permission_level: u8,
    pub enable_status: bool,
}

impl Default for ServerProperties {
    fn default() -> Self {
        Self {
            server_port: 25565,
            server_ip: String::new(),
            level_name: "world".to_owned(),
            level_seed: String::new(),
            level_type: "minecraft:normal".to_owned(),
            gamemode: GameMode::Survival,
            difficulty: Difficulty::Easy,
            hardcore: false,
            motd: "A Minecraft Server".to_owned(),
            max_players: 20,
            generate_structures: true,
            initial_enabled_packs: vec![crate::packs::VANILLA.to_owned()],
            initial_disabled_packs: Vec::new(),
            function_permission_level: 2,
            enable_status: true,
        }
    }
}

fn parse_or<T: FromStr>(properties: &Properties, key: &str, default: T) -> T {
    let Some(raw) = properties.get(key) else {
        return default;
    };

    raw.trim().parse().unwrap_or_else(|_| {
        warn!("invalid value {raw:?} for {key}, using the default");
        default
    })
}

fn parse_with<T>(
    properties: &Properties,
    key: &str,
    default: T,
    parse: impl FnOnce(&str) -> Option<T>,
) -> T {
    let Some(raw) = properties.get(key) else {
        return default;
    };

    parse(raw).unwrap_or_else(|| {
        warn!("invalid value {raw:?} for {key}, using the default");
        default
    })
}

fn pack_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
        .collect()
}

impl ServerProperties {
    /// Reads `path`, falling back to defaults for missing or unparsable keys.
    #[instrument]
    pub fn load<P: AsRef<Path> + Debug>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("{} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        Ok(Self::from_properties(ini.general_section()))
    }

    #[must_use]
    pub fn from_properties(properties: &Properties) -> Self {
        let defaults = Self::default();

        Self {
            server_port: parse_or(properties, "server-port", defaults.server_port),
            server_ip: properties
                .get("server-ip")
                .map_or(defaults.server_ip, str::to_owned),
            level_name: properties
                .get("level-name")
                .map_or(defaults.level_name, str::to_owned),
            level_seed: properties
                .get("level-seed")
                .map_or(defaults.level_seed, str::to_owned),
            level_type: properties
                .get("level-type")
                .map_or(defaults.level_type, str::to_owned),
            gamemode: parse_with(properties, "gamemode", defaults.gamemode, GameMode::by_name),
            difficulty: parse_with(
                properties,
                "difficulty",
                defaults.difficulty,
                Difficulty::by_name,
            ),
            hardcore: parse_or(properties, "hardcore", defaults.hardcore),
            motd: properties.get("motd").map_or(defaults.motd, str::to_owned),
            max_players: parse_or(properties, "max-players", defaults.max_players),
            generate_structures: parse_or(
                properties,
                "generate-structures",
                defaults.generate_structures,
            ),
            initial_enabled_packs: properties
                .get("initial-enabled-packs")
                .map_or(defaults.initial_enabled_packs, pack_list),
            initial_disabled_packs: properties
                .get("initial-disabled-packs")
                .map_or(defaults.initial_disabled_packs, pack_list),
            function_permission_level: parse_or(
                properties,
                "function-permission-level",
                defaults.function_permission_level,
            )
            .min(4),
            enable_status: parse_or(properties, "enable-status", defaults.enable_status),
        }
    }

    /// Every key with its current value, in file order.
    #[must_use]
    pub fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        ini.with_general_section()
            .set("difficulty", self.difficulty.name())
            .set("enable-status", self.enable_status.to_string())
            .set(
                "function-permission-level",
                self.function_permission_level.to_string(),
            )
            .set("gamemode", self.gamemode.name())
            .set("generate-structures", self.generate_structures.to_string())
            .set("hardcore", self.hardcore.to_string())
            .set("initial-disabled-packs", self.initial_disabled_packs.join(","))
            .set("initial-enabled-packs", self.initial_enabled_packs.join(","))
            .set("level-name", self.level_name.as_str())
            .set("level-seed", self.level_seed.as_str())
            .set("level-type", self.level_type.as_str())
            .set("max-players", self.max_players.to_string())
            .set("motd", self.motd.as_str())
            .set("server-ip", self.server_ip.as_str())
            .set("server-port", self.server_port.to_string());
        ini
    }

    /// Writes every known key back to `path`, so new keys show up for the operator.
    #[instrument(skip(self))]
    pub fn store<P: AsRef<Path> + Debug>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let mut contents = b"#Minecraft server properties\n".to_vec();
        self.to_ini()
            .write_to(&mut contents)
            .context("failed to serialize server properties")?;

        std::fs::write(path, contents)
            .with_context(|| format!("failed to write {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_and_invalid_values_fall_back() {
        let ini = Ini::load_from_str(
            "#comment\nserver-port=abc\nmax-players=7\ndifficulty=3\ngamemode=creative\n\
             level-type=minecraft:flat\ninitial-enabled-packs=vanilla, file/extra\n",
        )
        .unwrap();
        let properties = ServerProperties::from_properties(ini.general_section());

        assert_eq!(properties.server_port, 25565);
        assert_eq!(properties.max_players, 7);
        assert_eq!(properties.difficulty, Difficulty::Hard);
        assert_eq!(properties.gamemode, GameMode::Creative);
        assert_eq!(properties.level_type, "minecraft:flat");
        assert_eq!(properties.initial_enabled_packs, ["vanilla", "file/extra"]);
        assert_eq!(properties.level_name, "world");
    }

    #[test]
    fn stored_properties_read_back_identically() {
        let properties = ServerProperties {
            motd: "Hello there".to_owned(),
            level_seed: "-99".to_owned(),
            server_port: 25570,
            ..ServerProperties::default()
        };

        let mut written = Vec::new();
        properties.to_ini().write_to(&mut written).unwrap();
        let text = String::from_utf8(written).unwrap();
        assert!(text.contains("level-type=minecraft:normal"));

        let ini = Ini::load_from_str(&text).unwrap();
        assert_eq!(ServerProperties::from_properties(ini.general_section()), properties);
    }
}
