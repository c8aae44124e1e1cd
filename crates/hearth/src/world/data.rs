use std::time::{SystemTime, UNIX_EPOCH};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{
    Lifecycle, Registry, ResourceLocation,
    dimension::{DimensionType, LevelStem},
    generator::SpecialWorldProperty,
    settings::{LevelSettings, WorldDataConfiguration, WorldOptions},
};
use crate::common::version::LevelVersion;

/// Seed, structure flags and dimension definitions of a world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldGenSettings {
    pub options: WorldOptions,
    pub dimensions: IndexMap<ResourceLocation, LevelStem>,
}

/// Everything stored in a world's level file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimaryLevelData {
    pub version: LevelVersion,
    pub settings: LevelSettings,
    pub world_gen: WorldGenSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_property: Option<SpecialWorldProperty>,
    #[serde(default)]
    pub lifecycle: Lifecycle,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub last_played: u64,
    #[serde(default)]
    pub initialized: bool,
}

impl PrimaryLevelData {
    #[must_use]
    pub fn new(
        settings: LevelSettings,
        world_gen: WorldGenSettings,
        special_property: Option<SpecialWorldProperty>,
        lifecycle: Lifecycle,
    ) -> Self {
        Self {
            version: LevelVersion::current(),
            settings,
            world_gen,
            special_property,
            lifecycle,
            last_played: 0,
            initialized: false,
        }
    }

    #[must_use]
    pub fn level_name(&self) -> &str {
        &self.settings.level_name
    }

    #[must_use]
    pub const fn seed(&self) -> i64 {
        self.world_gen.options.seed
    }

    #[must_use]
    pub const fn data_configuration(&self) -> &WorldDataConfiguration {
        &self.settings.data_configuration
    }

    /// Stamps the data with the running version and the current time, ready to be written.
    pub fn touch(&mut self) {
        self.version = LevelVersion::current();
        self.last_played = now_millis();
    }
}

#[must_use]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
        })
}

/// Registries that are fixed once data packs are loaded.
#[derive(Debug, Clone)]
pub struct FrozenRegistries {
    pub dimension_types: Registry<DimensionType>,
    pub level_stems: Registry<LevelStem>,
}

impl FrozenRegistries {
    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.dimension_types
            .lifecycle()
            .add(self.level_stems.lifecycle())
    }
}

/// What the data loader hands to the server.
#[derive(Debug, Clone)]
pub struct WorldStem {
    pub registries: FrozenRegistries,
    pub world_data: PrimaryLevelData,
    /// Ids of the data packs that ended up selected.
    pub selected_packs: Vec<String>,
}
