use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{ResourceLocation, dimension, dimension::LevelStem};

/// Where biomes come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BiomeSource {
    MultiNoise { preset: ResourceLocation },
    TheEnd,
    Fixed { biome: ResourceLocation },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatLayer {
    pub block: ResourceLocation,
    pub height: u32,
}

/// How the terrain of a dimension is generated. Only the description is kept; generation itself
/// is out of scope for this server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChunkGenerator {
    Noise {
        settings: ResourceLocation,
        biome_source: BiomeSource,
    },
    Flat {
        layers: Vec<FlatLayer>,
        biome: ResourceLocation,
        #[serde(default)]
        features: bool,
    },
    Debug,
}

impl ChunkGenerator {
    fn noise(settings: &str, biome_source: BiomeSource) -> Self {
        Self::Noise {
            settings: ResourceLocation::minecraft(settings),
            biome_source,
        }
    }

    fn multi_noise(preset: &str) -> BiomeSource {
        BiomeSource::MultiNoise {
            preset: ResourceLocation::minecraft(preset),
        }
    }

    /// Bedrock, two dirt and a grass block over plains.
    #[must_use]
    pub fn default_flat() -> Self {
        let layer = |block: &str, height| FlatLayer {
            block: ResourceLocation::minecraft(block),
            height,
        };
        Self::Flat {
            layers: vec![
                layer("bedrock", 1),
                layer("dirt", 2),
                layer("grass_block", 1),
            ],
            biome: ResourceLocation::minecraft("plains"),
            features: false,
        }
    }
}

/// The `level-type` choices for new worlds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorldPreset {
    #[default]
    Normal,
    Flat,
    LargeBiomes,
    Amplified,
    DebugAllBlockStates,
}

impl WorldPreset {
    /// Parses a `level-type` value, falling back to [`WorldPreset::Normal`].
    #[must_use]
    pub fn from_level_type(level_type: &str) -> Self {
        let name = level_type.trim().to_lowercase();
        let name = name.strip_prefix("minecraft:").unwrap_or(&name);

        match name {
            "normal" | "default" => Self::Normal,
            "flat" => Self::Flat,
            "large_biomes" | "largebiomes" => Self::LargeBiomes,
            "amplified" => Self::Amplified,
            "debug_all_block_states" | "debug" => Self::DebugAllBlockStates,
            _ => {
                warn!("Failed to parse level-type {level_type}, defaulting to minecraft:normal");
                Self::Normal
            }
        }
    }

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Normal => "minecraft:normal",
            Self::Flat => "minecraft:flat",
            Self::LargeBiomes => "minecraft:large_biomes",
            Self::Amplified => "minecraft:amplified",
            Self::DebugAllBlockStates => "minecraft:debug_all_block_states",
        }
    }

    /// Marker stored with the level for presets clients render differently.
    #[must_use]
    pub const fn special_world_property(self) -> Option<SpecialWorldProperty> {
        match self {
            Self::Flat => Some(SpecialWorldProperty::Flat),
            Self::DebugAllBlockStates => Some(SpecialWorldProperty::Debug),
            _ => None,
        }
    }

    /// The dimensions of a new world made with this preset.
    #[must_use]
    pub fn create_dimensions(self) -> IndexMap<ResourceLocation, LevelStem> {
        let overworld_generator = match self {
            Self::Normal => {
                ChunkGenerator::noise("overworld", ChunkGenerator::multi_noise("overworld"))
            }
            Self::LargeBiomes => {
                ChunkGenerator::noise("large_biomes", ChunkGenerator::multi_noise("overworld"))
            }
            Self::Amplified => {
                ChunkGenerator::noise("amplified", ChunkGenerator::multi_noise("overworld"))
            }
            Self::Flat => ChunkGenerator::default_flat(),
            Self::DebugAllBlockStates => ChunkGenerator::Debug,
        };

        let mut dimensions = IndexMap::new();
        dimensions.insert(dimension::overworld(), LevelStem {
            dimension_type: dimension::overworld(),
            generator: overworld_generator,
        });

        if self == Self::DebugAllBlockStates {
            return dimensions;
        }

        dimensions.insert(dimension::nether(), LevelStem {
            dimension_type: dimension::nether(),
            generator: ChunkGenerator::noise("nether", ChunkGenerator::multi_noise("nether")),
        });
        dimensions.insert(dimension::end(), LevelStem {
            dimension_type: dimension::end(),
            generator: ChunkGenerator::noise("end", BiomeSource::TheEnd),
        });

        dimensions
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialWorldProperty {
    Flat,
    Debug,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_types_accept_legacy_names() {
        assert_eq!(WorldPreset::from_level_type("minecraft:normal"), WorldPreset::Normal);
        assert_eq!(WorldPreset::from_level_type("DEFAULT"), WorldPreset::Normal);
        assert_eq!(WorldPreset::from_level_type("largeBiomes"), WorldPreset::LargeBiomes);
        assert_eq!(WorldPreset::from_level_type("flat"), WorldPreset::Flat);
        assert_eq!(WorldPreset::from_level_type("nonsense"), WorldPreset::Normal);
    }

    #[test]
    fn debug_worlds_only_have_an_overworld() {
        let dimensions = WorldPreset::DebugAllBlockStates.create_dimensions();
        assert_eq!(dimensions.len(), 1);
        assert_eq!(dimensions[&dimension::overworld()].generator, ChunkGenerator::Debug);

        let dimensions = WorldPreset::Amplified.create_dimensions();
        assert_eq!(
            dimensions.keys().map(ToString::to_string).collect::<Vec<_>>(),
            ["minecraft:overworld", "minecraft:the_nether", "minecraft:the_end"]
        );
    }
}
