//! Data packs: the built-in `vanilla` pack and directory packs found in a world's `datapacks`
//! folder.

use std::{
    fmt::Debug,
    path::{Path, PathBuf},
};

use anyhow::Context;
use indexmap::{IndexMap, IndexSet};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::world::{
    Lifecycle, ResourceLocation,
    dimension::{DimensionType, LevelStem},
    settings::{DataPackConfig, WorldDataConfiguration},
};

pub const VANILLA: &str = "vanilla";
pub const PACK_FILE: &str = "pack.toml";
pub const PACK_FORMAT: u32 = 18;

/// Contents of a `pack.toml`.
#[derive(Debug, Clone, Deserialize)]
struct PackFile {
    #[serde(default)]
    description: String,
    pack_format: u32,
    #[serde(default)]
    experimental: bool,
    #[serde(default)]
    dimension_types: IndexMap<ResourceLocation, DimensionType>,
    #[serde(default)]
    dimensions: IndexMap<ResourceLocation, LevelStem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pack {
    pub id: String,
    pub description: String,
    pub pack_format: u32,
    pub lifecycle: Lifecycle,
    pub dimension_types: IndexMap<ResourceLocation, DimensionType>,
    pub dimensions: IndexMap<ResourceLocation, LevelStem>,
}

impl Pack {
    #[must_use]
    pub fn vanilla() -> Self {
        Self {
            id: VANILLA.to_owned(),
            description: "The default data for Minecraft".to_owned(),
            pack_format: PACK_FORMAT,
            lifecycle: Lifecycle::Stable,
            dimension_types: DimensionType::builtin().into_iter().collect(),
            dimensions: IndexMap::new(),
        }
    }

    fn load(id: String, file: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(file)
            .with_context(|| format!("failed to read {}", file.display()))?;
        let pack: PackFile = toml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", file.display()))?;

        if pack.pack_format != PACK_FORMAT {
            warn!(
                "data pack {id} was made for pack format {}, this server uses {PACK_FORMAT}",
                pack.pack_format
            );
        }

        Ok(Self {
            id,
            description: pack.description,
            pack_format: pack.pack_format,
            lifecycle: if pack.experimental {
                Lifecycle::Experimental
            } else {
                Lifecycle::Stable
            },
            dimension_types: pack.dimension_types,
            dimensions: pack.dimensions,
        })
    }
}

/// The packs chosen for a world and the configuration to store alongside it.
#[derive(Debug, Clone)]
pub struct PackSelection<'a> {
    pub packs: Vec<&'a Pack>,
    pub configuration: WorldDataConfiguration,
    /// Packs an existing world had not seen before, enabled automatically.
    pub newly_found: Vec<String>,
}

impl PackSelection<'_> {
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.packs.iter().map(|pack| pack.id.as_str())
    }
}

/// Every pack available to a world, in discovery order with `vanilla` first.
#[derive(Debug, Clone)]
pub struct PackRepository {
    packs: IndexMap<String, Pack>,
}

impl Default for PackRepository {
    fn default() -> Self {
        let mut packs = IndexMap::new();
        packs.insert(VANILLA.to_owned(), Pack::vanilla());
        Self { packs }
    }
}

impl PackRepository {
    /// Scans `datapacks_dir` for `<dir>/pack.toml`. Broken packs are skipped with a warning.
    #[instrument]
    pub fn discover<P: AsRef<Path> + Debug>(datapacks_dir: P) -> anyhow::Result<Self> {
        let datapacks_dir = datapacks_dir.as_ref();
        let mut repository = Self::default();

        if !datapacks_dir.is_dir() {
            return Ok(repository);
        }

        let mut dirs: Vec<PathBuf> = std::fs::read_dir(datapacks_dir)
            .with_context(|| format!("failed to list {}", datapacks_dir.display()))?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.join(PACK_FILE).is_file())
            .collect();
        dirs.sort();

        for dir in dirs {
            let Some(name) = dir.file_name().and_then(|name| name.to_str()) else {
                warn!("skipping data pack with a non UTF-8 name at {}", dir.display());
                continue;
            };
            let id = format!("file/{name}");

            match Pack::load(id.clone(), &dir.join(PACK_FILE)) {
                Ok(pack) => {
                    repository.packs.insert(id, pack);
                }
                Err(e) => warn!("Failed to load data pack {id}: {e:#}"),
            }
        }

        Ok(repository)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Pack> {
        self.packs.get(id)
    }

    pub fn available_ids(&self) -> impl Iterator<Item = &str> {
        self.packs.keys().map(String::as_str)
    }

    /// Picks the packs to load given the world's stored or initial configuration. In `init_mode`
    /// the world has no stored selection yet, so unlisted packs simply join its first one instead
    /// of being reported as new.
    #[must_use]
    pub fn select(
        &self,
        config: &WorldDataConfiguration,
        init_mode: bool,
        safe_mode: bool,
    ) -> PackSelection<'_> {
        let mut selected: IndexSet<&str> = IndexSet::new();
        let mut newly_found = Vec::new();

        if safe_mode {
            selected.insert(VANILLA);
        } else {
            let pack_config = &config.data_packs;

            for id in &pack_config.enabled {
                if self.packs.contains_key(id) {
                    selected.insert(id);
                } else {
                    warn!("Missing data pack {id}");
                }
            }

            for id in self.packs.keys().filter(|id| *id != VANILLA) {
                if !pack_config.enabled.contains(id) && !pack_config.disabled.contains(id) {
                    if !init_mode {
                        info!("Found new data pack {id}, loading it automatically");
                        newly_found.push(id.clone());
                    }
                    selected.insert(id);
                }
            }

            if !selected.contains(VANILLA) {
                selected.shift_insert(0, VANILLA);
            }
        }

        let packs: Vec<&Pack> = selected.iter().filter_map(|id| self.packs.get(*id)).collect();

        let disabled = self
            .packs
            .keys()
            .filter(|id| !selected.contains(id.as_str()))
            .cloned()
            .collect();

        PackSelection {
            configuration: WorldDataConfiguration {
                data_packs: DataPackConfig {
                    enabled: packs.iter().map(|pack| pack.id.clone()).collect(),
                    disabled,
                },
                enabled_features: config.enabled_features.clone(),
            },
            packs,
            newly_found,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn write_pack(datapacks: &Path, name: &str, contents: &str) {
        let dir = datapacks.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(PACK_FILE), contents).unwrap();
    }

    fn datapacks_dir() -> PathBuf {
        std::env::temp_dir().join(format!("hearth-packs-{}", uuid::Uuid::new_v4()))
    }

    fn config(enabled: &[&str], disabled: &[&str]) -> WorldDataConfiguration {
        WorldDataConfiguration {
            data_packs: DataPackConfig {
                enabled: enabled.iter().map(|id| (*id).to_owned()).collect(),
                disabled: disabled.iter().map(|id| (*id).to_owned()).collect(),
            },
            ..WorldDataConfiguration::default()
        }
    }

    #[test]
    fn missing_directory_only_has_vanilla() {
        let repository = PackRepository::discover(datapacks_dir()).unwrap();
        assert_eq!(repository.available_ids().collect::<Vec<_>>(), [VANILLA]);
    }

    #[test]
    fn directory_packs_are_discovered() {
        let dir = datapacks_dir();
        write_pack(
            &dir,
            "caves",
            r#"
            description = "deeper caves"
            pack_format = 18
            experimental = true

            [dimension_types."caves:deep"]
            min_y = -128
            height = 512
            logical_height = 512
            "#,
        );
        write_pack(&dir, "broken", "pack_format = \"eighteen\"");
        std::fs::create_dir_all(dir.join("not_a_pack")).unwrap();

        let repository = PackRepository::discover(&dir).unwrap();
        assert_eq!(
            repository.available_ids().collect::<Vec<_>>(),
            [VANILLA, "file/caves"]
        );

        let caves = repository.get("file/caves").unwrap();
        assert_eq!(caves.lifecycle, Lifecycle::Experimental);
        assert_eq!(caves.description, "deeper caves");
        assert_eq!(
            caves.dimension_types[&"caves:deep".parse::<ResourceLocation>().unwrap()].height,
            512
        );
    }

    #[test]
    fn new_packs_are_enabled_and_missing_ones_dropped() {
        let dir = datapacks_dir();
        write_pack(&dir, "a", "pack_format = 18");
        write_pack(&dir, "b", "pack_format = 18");
        write_pack(&dir, "c", "pack_format = 18");
        let repository = PackRepository::discover(&dir).unwrap();

        let selection =
            repository.select(&config(&["file/a", "file/gone"], &["file/b"]), false, false);

        assert_eq!(
            selection.ids().collect::<Vec<_>>(),
            [VANILLA, "file/a", "file/c"]
        );
        assert_eq!(selection.newly_found, ["file/c"]);
        assert_eq!(selection.configuration.data_packs.enabled, [
            VANILLA, "file/a", "file/c"
        ]);
        assert_eq!(selection.configuration.data_packs.disabled, ["file/b"]);
    }

    #[test]
    fn safe_mode_only_loads_vanilla() {
        let dir = datapacks_dir();
        write_pack(&dir, "a", "pack_format = 18");
        let repository = PackRepository::discover(&dir).unwrap();

        let selection = repository.select(&config(&[VANILLA, "file/a"], &[]), false, true);

        assert_eq!(selection.ids().collect::<Vec<_>>(), [VANILLA]);
        assert_eq!(selection.configuration.data_packs.disabled, ["file/a"]);
    }

    #[test]
    fn a_first_selection_reports_nothing_as_new() {
        let dir = datapacks_dir();
        write_pack(&dir, "a", "pack_format = 18");
        write_pack(&dir, "b", "pack_format = 18");
        let repository = PackRepository::discover(&dir).unwrap();

        let selection = repository.select(&config(&[VANILLA], &["file/b"]), true, false);

        assert_eq!(selection.ids().collect::<Vec<_>>(), [VANILLA, "file/a"]);
        assert!(selection.newly_found.is_empty());
        assert_eq!(selection.configuration.data_packs.disabled, ["file/b"]);
    }
}
