//! On-disk layout of worlds: where they live, who may open them and how their level file is kept.

use std::{
    io,
    path::{Path, PathBuf},
};

use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use crate::world::{
    PrimaryLevelData, ResourceLocation, dimension, settings::WorldDataConfiguration,
};

mod lock;
mod summary;

pub use lock::{DirectoryLock, LOCK_FILE};
pub use summary::LevelSummary;
use summary::SummaryFile;

pub const LEVEL_FILE: &str = "level.toml";
pub const LEVEL_FILE_OLD: &str = "level.toml_old";
const LEVEL_FILE_NEW: &str = "level.toml_new";

#[derive(Debug, thiserror::Error)]
pub enum LevelStorageError {
    #[error("invalid world name {0:?}")]
    InvalidName(String),
    #[error("{} is already locked by another process", .0.display())]
    Locked(PathBuf),
    #[error("I/O error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize level data")]
    Serialize(#[from] toml::ser::Error),
}

impl LevelStorageError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A directory holding any number of worlds, the `--universe`.
#[derive(Debug, Clone)]
pub struct LevelStorageSource {
    base_dir: PathBuf,
}

impl LevelStorageSource {
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self, LevelStorageError> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)
            .map_err(|source| LevelStorageError::io(&base_dir, source))?;
        Ok(Self { base_dir })
    }

    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// World names become directory names, so they may not escape the universe.
    #[must_use]
    pub fn is_valid_name(name: &str) -> bool {
        !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\', '\0'])
            && name.trim() == name
    }

    #[must_use]
    pub fn level_exists(&self, name: &str) -> bool {
        Self::is_valid_name(name) && self.base_dir.join(name).join(LEVEL_FILE).exists()
    }

    /// Opens (creating if needed) the world directory `name` and locks it.
    #[instrument(skip(self))]
    pub fn validate_and_create_access(
        &self,
        name: &str,
    ) -> Result<LevelStorageAccess, LevelStorageError> {
        if !Self::is_valid_name(name) {
            return Err(LevelStorageError::InvalidName(name.to_owned()));
        }

        let dir = self.base_dir.join(name);
        std::fs::create_dir_all(&dir).map_err(|source| LevelStorageError::io(&dir, source))?;
        let lock = DirectoryLock::create(&dir)?;

        debug!("opened world {name} at {}", dir.display());

        Ok(LevelStorageAccess {
            level_id: name.to_owned(),
            dir,
            lock,
        })
    }
}

/// Exclusive access to one world directory.
#[derive(Debug)]
pub struct LevelStorageAccess {
    level_id: String,
    dir: PathBuf,
    lock: DirectoryLock,
}

fn read_optional(path: &Path) -> Result<Option<String>, LevelStorageError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(LevelStorageError::io(path, source)),
    }
}

impl LevelStorageAccess {
    #[must_use]
    pub fn level_id(&self) -> &str {
        &self.level_id
    }

    #[must_use]
    pub fn level_dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn datapacks_dir(&self) -> PathBuf {
        self.dir.join("datapacks")
    }

    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.dir.join("data")
    }

    /// Where the chunks of a dimension are stored.
    #[must_use]
    pub fn dimension_path(&self, key: &ResourceLocation) -> PathBuf {
        dimension_path(&self.dir, key)
    }

    #[must_use]
    pub fn has_world_data(&self) -> bool {
        self.dir.join(LEVEL_FILE).exists() || self.dir.join(LEVEL_FILE_OLD).exists()
    }

    /// Parses the level file, falling back to the previous copy when it is missing or unreadable.
    fn read_level<T: DeserializeOwned>(&self) -> Result<Option<T>, LevelStorageError> {
        let mut failure = None;

        for name in [LEVEL_FILE, LEVEL_FILE_OLD] {
            let path = self.dir.join(name);
            let parsed = read_optional(&path).and_then(|contents| {
                contents
                    .map(|contents| {
                        toml::from_str(&contents).map_err(|source| LevelStorageError::Parse {
                            path: path.clone(),
                            source,
                        })
                    })
                    .transpose()
            });

            match parsed {
                Ok(Some(level)) => {
                    if name == LEVEL_FILE_OLD {
                        warn!("using {LEVEL_FILE_OLD} in place of {LEVEL_FILE}");
                    }
                    return Ok(Some(level));
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("Failed to load {}: {e}", path.display());
                    failure = Some(e);
                }
            }
        }

        failure.map_or(Ok(None), Err)
    }

    #[instrument(skip(self), fields(world = %self.level_id))]
    pub fn summary(&self) -> Result<Option<LevelSummary>, LevelStorageError> {
        Ok(self
            .read_level::<SummaryFile>()?
            .map(|file| file.into_summary(&self.level_id)))
    }

    pub fn load_level_data(&self) -> Result<Option<PrimaryLevelData>, LevelStorageError> {
        self.read_level()
    }

    /// The data pack selection stored with the world, if there is a world.
    pub fn data_configuration(&self) -> Result<Option<WorldDataConfiguration>, LevelStorageError> {
        Ok(self
            .load_level_data()?
            .map(|data| data.settings.data_configuration))
    }

    /// Writes the level file through a temporary file, keeping the previous one as a backup.
    #[instrument(skip_all, fields(world = %self.level_id))]
    pub fn save_level_data(&self, data: &PrimaryLevelData) -> Result<(), LevelStorageError> {
        let contents = toml::to_string(data)?;

        let new = self.dir.join(LEVEL_FILE_NEW);
        let current = self.dir.join(LEVEL_FILE);
        let old = self.dir.join(LEVEL_FILE_OLD);

        std::fs::write(&new, contents).map_err(|source| LevelStorageError::io(&new, source))?;

        if current.exists() {
            std::fs::rename(&current, &old)
                .map_err(|source| LevelStorageError::io(&current, source))?;
        }

        std::fs::rename(&new, &current).map_err(|source| LevelStorageError::io(&new, source))?;

        debug!("saved level data");
        Ok(())
    }

    /// Whether the lock on the directory is still held.
    #[must_use]
    pub fn check_lock(&self) -> bool {
        self.lock.is_valid()
    }

    /// Releases the lock.
    pub fn close(self) {
        info!("releasing world {}", self.level_id);
    }
}

/// The overworld lives in the world root; other vanilla dimensions keep their historical folders.
#[must_use]
pub fn dimension_path(world_dir: &Path, key: &ResourceLocation) -> PathBuf {
    if *key == dimension::overworld() {
        world_dir.to_path_buf()
    } else if *key == dimension::nether() {
        world_dir.join("DIM-1")
    } else if *key == dimension::end() {
        world_dir.join("DIM1")
    } else {
        world_dir
            .join("dimensions")
            .join(key.namespace())
            .join(key.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::version::LevelVersion;

    fn universe() -> LevelStorageSource {
        let dir = std::env::temp_dir().join(format!("hearth-storage-{}", uuid::Uuid::new_v4()));
        LevelStorageSource::new(dir).unwrap()
    }

    #[test]
    fn names_cannot_escape_the_universe() {
        assert!(LevelStorageSource::is_valid_name("world"));
        assert!(LevelStorageSource::is_valid_name("My World"));
        assert!(!LevelStorageSource::is_valid_name(""));
        assert!(!LevelStorageSource::is_valid_name(".."));
        assert!(!LevelStorageSource::is_valid_name("a/b"));
        assert!(!LevelStorageSource::is_valid_name(" padded"));

        assert!(matches!(
            universe().validate_and_create_access("../escape"),
            Err(LevelStorageError::InvalidName(_))
        ));
    }

    #[test]
    fn a_world_can_only_be_opened_once() {
        let universe = universe();
        let access = universe.validate_and_create_access("world").unwrap();
        assert!(access.check_lock());

        assert!(matches!(
            universe.validate_and_create_access("world"),
            Err(LevelStorageError::Locked(_))
        ));

        access.close();
        assert!(universe.validate_and_create_access("world").is_ok());
    }

    #[test]
    fn summary_survives_unknown_layouts() {
        let universe = universe();
        let access = universe.validate_and_create_access("old").unwrap();
        assert_eq!(access.summary().unwrap(), None);

        std::fs::write(
            access.level_dir().join(LEVEL_FILE_OLD),
            "last_played = 5\n[version]\nname = \"1.6.4\"\ndata_version = 0\nstorage_version = \
             19132\n[chunks]\nformat = \"region\"\n",
        )
        .unwrap();

        let summary = access.summary().unwrap().unwrap();
        assert_eq!(summary.level_name, "old");
        assert_eq!(summary.last_played, 5);
        assert!(summary.requires_manual_conversion());
        assert!(summary.is_compatible());
        assert_eq!(summary.version.series, "main");
    }

    #[test]
    fn saving_keeps_the_previous_file() {
        let universe = universe();
        let access = universe.validate_and_create_access("world").unwrap();

        std::fs::write(access.level_dir().join(LEVEL_FILE), "previous").unwrap();

        let mut data = crate::loader::tests::new_level_data();
        data.touch();
        access.save_level_data(&data).unwrap();

        assert_eq!(
            std::fs::read_to_string(access.level_dir().join(LEVEL_FILE_OLD)).unwrap(),
            "previous"
        );
        let loaded = access.load_level_data().unwrap().unwrap();
        assert_eq!(loaded, data);
        assert_eq!(loaded.version, LevelVersion::current());
        assert!(!access.level_dir().join(LEVEL_FILE_NEW).exists());
    }

    #[test]
    fn a_corrupt_level_file_falls_back_to_the_backup() {
        let universe = universe();
        let access = universe.validate_and_create_access("world").unwrap();

        let data = crate::loader::tests::new_level_data();
        access.save_level_data(&data).unwrap();
        std::fs::rename(
            access.level_dir().join(LEVEL_FILE),
            access.level_dir().join(LEVEL_FILE_OLD),
        )
        .unwrap();
        std::fs::write(access.level_dir().join(LEVEL_FILE), "garbage = = =").unwrap();

        let summary = access.summary().unwrap().unwrap();
        assert_eq!(summary.level_name, "world");
        assert!(!summary.requires_manual_conversion());
        assert_eq!(access.load_level_data().unwrap(), Some(data));

        std::fs::remove_file(access.level_dir().join(LEVEL_FILE_OLD)).unwrap();
        assert!(matches!(
            access.summary(),
            Err(LevelStorageError::Parse { .. })
        ));
    }

    #[test]
    fn dimension_folders() {
        let root = Path::new("w");
        assert_eq!(dimension_path(root, &dimension::overworld()), root);
        assert_eq!(dimension_path(root, &dimension::nether()), root.join("DIM-1"));
        assert_eq!(dimension_path(root, &dimension::end()), root.join("DIM1"));
        assert_eq!(
            dimension_path(root, &"mod:caves/deep".parse().unwrap()),
            root.join("dimensions").join("mod").join("caves/deep")
        );
    }
}
