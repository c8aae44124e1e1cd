//! Ordered data fixes that bring stored chunks up to the current data version.

use toml::{Table, Value};
use tracing::trace;

use crate::common::version::CURRENT;

pub const DATA_VERSION_KEY: &str = "DataVersion";

/// A single change to the chunk layout, applied to chunks older than `version`.
#[derive(Clone, Copy)]
pub struct Fix {
    pub version: i32,
    pub name: &'static str,
    apply: fn(&mut Table),
}

impl std::fmt::Debug for Fix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fix")
            .field("version", &self.version)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

fn rename(chunk: &mut Table, from: &str, to: &str) {
    if let Some(value) = chunk.remove(from) {
        chunk.insert(to.to_owned(), value);
    }
}

/// Chunks used to nest everything under a `Level` table.
fn flatten_level(chunk: &mut Table) {
    if let Some(Value::Table(level)) = chunk.remove("Level") {
        for (key, value) in level {
            chunk.entry(key).or_insert(value);
        }
    }
    rename(chunk, "Sections", "sections");
    rename(chunk, "TileEntities", "block_entities");
}

fn namespace_status(chunk: &mut Table) {
    let Some(Value::String(status)) = chunk.get_mut("Status") else {
        return;
    };
    if !status.contains(':') {
        *status = format!("minecraft:{status}");
    }
}

fn remove_blending_data(chunk: &mut Table) {
    chunk.remove("blending_data");
}

const FIXES: [Fix; 3] = [
    Fix {
        version: 2842,
        name: "flatten chunk level",
        apply: flatten_level,
    },
    Fix {
        version: 3088,
        name: "namespaced chunk status",
        apply: namespace_status,
    },
    Fix {
        version: 3441,
        name: "drop blending data",
        apply: remove_blending_data,
    },
];

/// Applies every fix newer than a chunk's data version, in order.
#[derive(Debug, Clone)]
pub struct DataFixer {
    fixes: Vec<Fix>,
    target: i32,
}

impl Default for DataFixer {
    fn default() -> Self {
        Self {
            fixes: FIXES.to_vec(),
            target: CURRENT.data_version,
        }
    }
}

impl DataFixer {
    #[must_use]
    pub const fn target(&self) -> i32 {
        self.target
    }

    /// The stored data version. Chunks written before versions were recorded count as `0`.
    #[must_use]
    pub fn version_of(chunk: &Table) -> i32 {
        chunk
            .get(DATA_VERSION_KEY)
            .and_then(Value::as_integer)
            .and_then(|version| i32::try_from(version).ok())
            .unwrap_or(0)
    }

    #[must_use]
    pub fn needs_update(&self, chunk: &Table) -> bool {
        Self::version_of(chunk) < self.target
    }

    /// Upgrades `chunk` in place and stamps it with the target version.
    pub fn update(&self, chunk: &mut Table) {
        let from = Self::version_of(chunk);

        for fix in self
            .fixes
            .iter()
            .filter(|fix| fix.version > from && fix.version <= self.target)
        {
            trace!("applying fix {} ({})", fix.version, fix.name);
            (fix.apply)(chunk);
        }

        chunk.insert(
            DATA_VERSION_KEY.to_owned(),
            Value::Integer(i64::from(self.target)),
        );
    }
}

/// Removes data the server recomputes anyway: heightmaps and lighting.
pub fn erase_cache(chunk: &mut Table) {
    chunk.remove("Heightmaps");
    chunk.remove("isLightOn");

    if let Some(Value::Array(sections)) = chunk.get_mut("sections") {
        for section in sections.iter_mut().filter_map(Value::as_table_mut) {
            section.remove("BlockLight");
            section.remove("SkyLight");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(source: &str) -> Table {
        source.parse().unwrap()
    }

    #[test]
    fn old_chunks_are_flattened_and_namespaced() {
        let mut old = chunk(
            r#"
            DataVersion = 2730
            [Level]
            Status = "full"
            xPos = 3
            [[Level.Sections]]
            Y = 0
            "#,
        );

        let fixer = DataFixer::default();
        assert!(fixer.needs_update(&old));
        fixer.update(&mut old);

        assert!(!old.contains_key("Level"));
        assert_eq!(old["Status"].as_str(), Some("minecraft:full"));
        assert_eq!(old["xPos"].as_integer(), Some(3));
        assert_eq!(old["sections"].as_array().map(Vec::len), Some(1));
        assert_eq!(DataFixer::version_of(&old), fixer.target());
        assert!(!fixer.needs_update(&old));
    }

    #[test]
    fn fixes_older_than_the_chunk_are_skipped() {
        let mut recent = chunk(
            r#"
            DataVersion = 3100
            Status = "custom"
            blending_data = { min_section = 0 }
            "#,
        );

        DataFixer::default().update(&mut recent);

        assert_eq!(recent["Status"].as_str(), Some("custom"));
        assert!(!recent.contains_key("blending_data"));
    }

    #[test]
    fn unversioned_chunks_count_as_ancient() {
        assert_eq!(DataFixer::version_of(&Table::new()), 0);
    }

    #[test]
    fn cache_is_erased() {
        let mut cached = chunk(
            r"
            isLightOn = true
            Heightmaps = { WORLD_SURFACE = [1, 2] }
            [[sections]]
            Y = 0
            BlockLight = [0, 0]
            SkyLight = [15, 15]
            ",
        );

        erase_cache(&mut cached);

        assert!(!cached.contains_key("isLightOn"));
        assert!(!cached.contains_key("Heightmaps"));
        let section = cached["sections"][0].as_table().unwrap();
        assert!(!section.contains_key("BlockLight"));
        assert!(!section.contains_key("SkyLight"));
        assert_eq!(section["Y"].as_integer(), Some(0));
    }
}
