//! Settings chosen when a world is created.

use std::fmt;

use hearth_clap::GameMode;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::ResourceLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Peaceful,
    #[default]
    Easy,
    Normal,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Peaceful => "peaceful",
            Self::Easy => "easy",
            Self::Normal => "normal",
            Self::Hard => "hard",
        }
    }

    /// Accepts the name or the legacy numeric id.
    #[must_use]
    pub fn by_name(name: &str) -> Option<Self> {
        match name.trim() {
            "peaceful" | "0" => Some(Self::Peaceful),
            "easy" | "1" => Some(Self::Easy),
            "normal" | "2" => Some(Self::Normal),
            "hard" | "3" => Some(Self::Hard),
            _ => None,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GameRuleValue {
    Bool(bool),
    Int(i32),
}

impl fmt::Display for GameRuleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
        }
    }
}

/// Per-world rules, by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameRules(IndexMap<String, GameRuleValue>);

impl Default for GameRules {
    fn default() -> Self {
        use GameRuleValue::{Bool, Int};

        let rules = [
            ("announceAdvancements", Bool(true)),
            ("commandBlockOutput", Bool(true)),
            ("doDaylightCycle", Bool(true)),
            ("doFireTick", Bool(true)),
            ("doMobSpawning", Bool(true)),
            ("keepInventory", Bool(false)),
            ("maxCommandChainLength", Int(65536)),
            ("randomTickSpeed", Int(3)),
            ("spawnRadius", Int(10)),
        ];

        Self(
            rules
                .into_iter()
                .map(|(name, value)| (name.to_owned(), value))
                .collect(),
        )
    }
}

impl GameRules {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<GameRuleValue> {
        self.0.get(name).copied()
    }

    pub fn set(&mut self, name: impl Into<String>, value: GameRuleValue) {
        self.0.insert(name.into(), value);
    }
}

/// Which data packs a world uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataPackConfig {
    pub enabled: Vec<String>,
    #[serde(default)]
    pub disabled: Vec<String>,
}

impl Default for DataPackConfig {
    fn default() -> Self {
        Self {
            enabled: vec![crate::packs::VANILLA.to_owned()],
            disabled: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldDataConfiguration {
    pub data_packs: DataPackConfig,
    pub enabled_features: Vec<ResourceLocation>,
}

impl Default for WorldDataConfiguration {
    fn default() -> Self {
        Self {
            data_packs: DataPackConfig::default(),
            enabled_features: vec![ResourceLocation::minecraft("vanilla")],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSettings {
    pub level_name: String,
    pub game_type: GameMode,
    pub hardcore: bool,
    pub difficulty: Difficulty,
    pub allow_commands: bool,
    pub game_rules: GameRules,
    pub data_configuration: WorldDataConfiguration,
}

impl LevelSettings {
    /// The fixed settings of the demo world.
    #[must_use]
    pub fn demo(data_configuration: WorldDataConfiguration) -> Self {
        Self {
            level_name: "Demo World".to_owned(),
            game_type: GameMode::Survival,
            hardcore: false,
            difficulty: Difficulty::Normal,
            allow_commands: false,
            game_rules: GameRules::default(),
            data_configuration,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldOptions {
    pub seed: i64,
    pub generate_structures: bool,
    pub generate_bonus_chest: bool,
}

impl WorldOptions {
    /// The demo world always uses the same seed.
    #[must_use]
    pub fn demo() -> Self {
        Self {
            seed: i64::from(text_seed_hash("North Carolina")),
            generate_structures: true,
            generate_bonus_chest: true,
        }
    }

    #[must_use]
    pub fn with_bonus_chest(self, generate_bonus_chest: bool) -> Self {
        Self {
            generate_bonus_chest,
            ..self
        }
    }
}

/// Interprets a `level-seed` value: empty means no seed, integers are used as they are, and any
/// other text is hashed.
#[must_use]
pub fn parse_seed(seed: &str) -> Option<i64> {
    let seed = seed.trim();
    if seed.is_empty() {
        return None;
    }

    Some(
        seed.parse::<i64>()
            .unwrap_or_else(|_| i64::from(text_seed_hash(seed))),
    )
}

/// A fresh random seed.
#[must_use]
pub fn random_seed() -> i64 {
    fastrand::i64(..)
}

/// The 31-based polynomial hash over UTF-16 code units that seeds have always been hashed with.
#[must_use]
pub fn text_seed_hash(text: &str) -> i32 {
    text.encode_utf16()
        .fold(0_i32, |hash, unit| {
            hash.wrapping_mul(31).wrapping_add(i32::from(unit))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_hash_matches_known_values() {
        assert_eq!(text_seed_hash(""), 0);
        assert_eq!(text_seed_hash("a"), 97);
        assert_eq!(text_seed_hash("hello"), 99_162_322);
        assert_eq!(text_seed_hash("North Carolina"), -343_522_682);
    }

    #[test]
    fn seeds_prefer_integer_literals() {
        assert_eq!(parse_seed(""), None);
        assert_eq!(parse_seed("   "), None);
        assert_eq!(parse_seed("-42"), Some(-42));
        assert_eq!(parse_seed("hello"), Some(99_162_322));
    }

    #[test]
    fn difficulty_accepts_ids() {
        assert_eq!(Difficulty::by_name("3"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::by_name("peaceful"), Some(Difficulty::Peaceful));
        assert_eq!(Difficulty::by_name("brutal"), None);
    }
}
