//! Resolves the data packs, registries and world data a server needs before it can start.

use std::path::PathBuf;

use anyhow::{Context, bail};
use indexmap::IndexMap;
use tracing::{info, instrument, warn};

use crate::{
    common::{config::ServerProperties, runtime::AsyncRuntime},
    packs::{Pack, PackRepository},
    storage::LevelStorageAccess,
    world::{
        FrozenRegistries, Lifecycle, PrimaryLevelData, Registry, ResourceLocation,
        WorldGenSettings, WorldStem,
        dimension::{self, DimensionType, LevelStem},
        generator::WorldPreset,
        settings::{
            DataPackConfig, GameRules, LevelSettings, WorldDataConfiguration, WorldOptions,
            parse_seed, random_seed,
        },
    },
};

/// How a world that does not exist yet should be made.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewWorldOptions {
    pub demo: bool,
    pub bonus_chest: bool,
}

/// The data pack configuration to start from. `init_mode` is set when the world has none stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitConfig {
    pub configuration: WorldDataConfiguration,
    pub init_mode: bool,
}

#[must_use]
pub fn load_or_create_config(
    stored: Option<&PrimaryLevelData>,
    properties: &ServerProperties,
) -> InitConfig {
    match stored {
        Some(data) => InitConfig {
            configuration: data.data_configuration().clone(),
            init_mode: false,
        },
        None => InitConfig {
            configuration: WorldDataConfiguration {
                data_packs: DataPackConfig {
                    enabled: properties.initial_enabled_packs.clone(),
                    disabled: properties.initial_disabled_packs.clone(),
                },
                ..WorldDataConfiguration::default()
            },
            init_mode: true,
        },
    }
}

/// Everything the background load needs, owned so it can move onto the runtime.
#[derive(Debug)]
struct LoadRequest {
    datapacks_dir: PathBuf,
    stored: Option<PrimaryLevelData>,
    properties: ServerProperties,
    new_world: NewWorldOptions,
    safe_mode: bool,
}

/// Loads the world stem on `runtime`, blocking the calling thread until it is done.
#[instrument(skip_all, fields(world = storage.level_id()))]
pub fn load_world_stem(
    runtime: &AsyncRuntime,
    storage: &LevelStorageAccess,
    properties: &ServerProperties,
    new_world: NewWorldOptions,
    safe_mode: bool,
) -> anyhow::Result<WorldStem> {
    let request = LoadRequest {
        datapacks_dir: storage.datapacks_dir(),
        stored: storage
            .load_level_data()
            .context("failed to read the stored level data")?,
        properties: properties.clone(),
        new_world,
        safe_mode,
    };

    runtime
        .block_on(runtime.spawn(load(request)))
        .context("the data loading task did not complete")?
}

async fn load(request: LoadRequest) -> anyhow::Result<WorldStem> {
    let datapacks_dir = request.datapacks_dir;
    let repository = tokio::task::spawn_blocking(move || PackRepository::discover(datapacks_dir))
        .await
        .context("data pack discovery did not complete")??;

    let init = load_or_create_config(request.stored.as_ref(), &request.properties);
    let selection = repository.select(&init.configuration, init.init_mode, request.safe_mode);

    info!(
        "Loading data packs: {}",
        selection.ids().collect::<Vec<_>>().join(", ")
    );

    let dimension_types = dimension_types(&selection.packs)?;

    let (mut world_data, mut dimensions) = match request.stored {
        Some(stored) => {
            let dimensions = stored.world_gen.dimensions.clone();
            (stored, dimensions)
        }
        None => new_world_data(&request.properties, request.new_world, &selection.configuration),
    };

    let mut stem_lifecycles = IndexMap::new();
    for pack in &selection.packs {
        for (key, stem) in &pack.dimensions {
            dimensions.insert(key.clone(), stem.clone());
            stem_lifecycles.insert(key.clone(), pack.lifecycle);
        }
    }

    let level_stems = level_stems(&dimensions, &stem_lifecycles, &dimension_types)?;

    let registries = FrozenRegistries {
        dimension_types: dimension_types.freeze(),
        level_stems: level_stems.freeze(),
    };

    if registries.lifecycle() == Lifecycle::Experimental {
        warn!("Using experimental data packs, this world may not load in future versions");
    }

    world_data.settings.data_configuration = selection.configuration.clone();
    world_data.world_gen.dimensions = dimensions;
    world_data.lifecycle = world_data.lifecycle.add(registries.lifecycle());

    Ok(WorldStem {
        selected_packs: selection.ids().map(str::to_owned).collect(),
        registries,
        world_data,
    })
}

fn dimension_types(packs: &[&Pack]) -> anyhow::Result<Registry<DimensionType>> {
    let mut registry = Registry::new("dimension_type");

    for pack in packs {
        for (key, dimension_type) in &pack.dimension_types {
            dimension_type
                .validate()
                .with_context(|| format!("invalid dimension type {key} in data pack {}", pack.id))?;
            registry.register_or_override(key.clone(), dimension_type.clone(), pack.lifecycle)?;
        }
    }

    Ok(registry)
}

fn level_stems(
    dimensions: &IndexMap<ResourceLocation, LevelStem>,
    lifecycles: &IndexMap<ResourceLocation, Lifecycle>,
    dimension_types: &Registry<DimensionType>,
) -> anyhow::Result<Registry<LevelStem>> {
    if !dimensions.contains_key(&dimension::overworld()) {
        bail!("no {} dimension is defined", dimension::overworld());
    }

    let mut registry = Registry::new("dimension");
    for (key, stem) in dimensions {
        if !dimension_types.contains_key(&stem.dimension_type) {
            bail!(
                "dimension {key} uses unknown dimension type {}",
                stem.dimension_type
            );
        }

        let lifecycle = lifecycles.get(key).copied().unwrap_or_default();
        registry.register(key.clone(), stem.clone(), lifecycle)?;
    }

    Ok(registry)
}

fn new_world_data(
    properties: &ServerProperties,
    new_world: NewWorldOptions,
    configuration: &WorldDataConfiguration,
) -> (PrimaryLevelData, IndexMap<ResourceLocation, LevelStem>) {
    let (settings, options, preset) = if new_world.demo {
        (
            LevelSettings::demo(configuration.clone()),
            WorldOptions::demo(),
            WorldPreset::Normal,
        )
    } else {
        let settings = LevelSettings {
            level_name: properties.level_name.clone(),
            game_type: properties.gamemode,
            hardcore: properties.hardcore,
            difficulty: properties.difficulty,
            allow_commands: false,
            game_rules: GameRules::default(),
            data_configuration: configuration.clone(),
        };
        let options = WorldOptions {
            seed: parse_seed(&properties.level_seed).unwrap_or_else(random_seed),
            generate_structures: properties.generate_structures,
            generate_bonus_chest: false,
        }
        .with_bonus_chest(new_world.bonus_chest);

        (
            settings,
            options,
            WorldPreset::from_level_type(&properties.level_type),
        )
    };

    info!("Creating a new world with preset {}", preset.key());

    let dimensions = preset.create_dimensions();
    let world_gen = WorldGenSettings {
        options,
        dimensions: dimensions.clone(),
    };

    (
        PrimaryLevelData::new(
            settings,
            world_gen,
            preset.special_world_property(),
            Lifecycle::Stable,
        ),
        dimensions,
    )
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        packs::tests::write_pack, storage::LevelStorageSource, world::generator::SpecialWorldProperty,
    };

    pub(crate) fn new_level_data() -> PrimaryLevelData {
        new_world_data(
            &ServerProperties::default(),
            NewWorldOptions::default(),
            &WorldDataConfiguration::default(),
        )
        .0
    }

    fn access(name: &str) -> LevelStorageAccess {
        let dir = std::env::temp_dir().join(format!("hearth-loader-{}", uuid::Uuid::new_v4()));
        LevelStorageSource::new(dir)
            .unwrap()
            .validate_and_create_access(name)
            .unwrap()
    }

    fn load_with(
        storage: &LevelStorageAccess,
        properties: &ServerProperties,
        new_world: NewWorldOptions,
        safe_mode: bool,
    ) -> anyhow::Result<WorldStem> {
        let runtime = AsyncRuntime::new().unwrap();
        load_world_stem(&runtime, storage, properties, new_world, safe_mode)
    }

    #[test]
    fn initial_config_comes_from_properties_for_new_worlds() {
        let properties = ServerProperties {
            initial_enabled_packs: vec!["vanilla".to_owned(), "file/extra".to_owned()],
            initial_disabled_packs: vec!["file/off".to_owned()],
            ..ServerProperties::default()
        };

        let init = load_or_create_config(None, &properties);
        assert!(init.init_mode);
        assert_eq!(init.configuration.data_packs.enabled, ["vanilla", "file/extra"]);
        assert_eq!(init.configuration.data_packs.disabled, ["file/off"]);

        let mut stored = new_level_data();
        stored.settings.data_configuration.data_packs.enabled = vec!["file/kept".to_owned()];
        let init = load_or_create_config(Some(&stored), &properties);
        assert!(!init.init_mode);
        assert_eq!(init.configuration.data_packs.enabled, ["file/kept"]);
    }

    #[test]
    fn new_world_follows_the_properties() {
        let storage = access("fresh");
        let properties = ServerProperties {
            level_name: "fresh".to_owned(),
            level_seed: "1234".to_owned(),
            level_type: "minecraft:flat".to_owned(),
            hardcore: true,
            ..ServerProperties::default()
        };

        let stem = load_with(
            &storage,
            &properties,
            NewWorldOptions {
                demo: false,
                bonus_chest: true,
            },
            false,
        )
        .unwrap();

        let data = &stem.world_data;
        assert_eq!(data.level_name(), "fresh");
        assert_eq!(data.seed(), 1234);
        assert!(data.settings.hardcore);
        assert!(data.world_gen.options.generate_bonus_chest);
        assert_eq!(data.special_property, Some(SpecialWorldProperty::Flat));
        assert_eq!(stem.registries.level_stems.len(), 3);
        assert!(stem.registries.level_stems.is_frozen());
        assert_eq!(stem.selected_packs, ["vanilla"]);
    }

    #[test]
    fn demo_worlds_use_the_demo_seed() {
        let storage = access("demo");
        let stem = load_with(
            &storage,
            &ServerProperties::default(),
            NewWorldOptions {
                demo: true,
                bonus_chest: false,
            },
            false,
        )
        .unwrap();

        assert_eq!(stem.world_data.level_name(), "Demo World");
        assert_eq!(stem.world_data.world_gen.options, WorldOptions::demo());
    }

    #[test]
    fn pack_dimensions_extend_existing_worlds() {
        let storage = access("existing");
        let mut stored = new_level_data();
        stored.settings.level_name = "Existing".to_owned();
        storage.save_level_data(&stored).unwrap();

        write_pack(
            &storage.datapacks_dir(),
            "caves",
            r#"
            pack_format = 18
            experimental = true

            [dimension_types."caves:deep"]
            min_y = -128
            height = 512
            logical_height = 512

            [dimensions."caves:deep"]
            type = "caves:deep"
            generator = { kind = "debug" }
            "#,
        );

        let stem = load_with(
            &storage,
            &ServerProperties::default(),
            NewWorldOptions::default(),
            false,
        )
        .unwrap();

        let deep: ResourceLocation = "caves:deep".parse().unwrap();
        assert_eq!(stem.world_data.level_name(), "Existing");
        assert!(stem.registries.level_stems.contains_key(&deep));
        assert!(stem.world_data.world_gen.dimensions.contains_key(&deep));
        assert_eq!(stem.registries.lifecycle(), Lifecycle::Experimental);
        assert_eq!(stem.world_data.lifecycle, Lifecycle::Experimental);
        assert_eq!(stem.selected_packs, ["vanilla", "file/caves"]);

        let safe = load_with(
            &storage,
            &ServerProperties::default(),
            NewWorldOptions::default(),
            true,
        )
        .unwrap();
        assert!(!safe.registries.level_stems.contains_key(&deep));
    }

    #[test]
    fn broken_dimension_data_fails_the_load() {
        let storage = access("broken");
        write_pack(
            &storage.datapacks_dir(),
            "bad_height",
            r"
            pack_format = 18

            [dimension_types.'minecraft:overworld']
            min_y = 0
            height = 100
            logical_height = 100
            ",
        );

        let error = load_with(
            &storage,
            &ServerProperties::default(),
            NewWorldOptions::default(),
            false,
        )
        .unwrap_err();
        assert!(format!("{error:#}").contains("invalid dimension type minecraft:overworld"));
    }

    #[test]
    fn stems_need_known_dimension_types() {
        let storage = access("unknown");
        write_pack(
            &storage.datapacks_dir(),
            "orphan",
            r#"
            pack_format = 18

            [dimensions."orphan:void"]
            type = "orphan:missing"
            generator = { kind = "debug" }
            "#,
        );

        let error = load_with(
            &storage,
            &ServerProperties::default(),
            NewWorldOptions::default(),
            false,
        )
        .unwrap_err();
        assert!(error.to_string().contains("unknown dimension type orphan:missing"));
    }
}
