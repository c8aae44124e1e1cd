//! The persisted end user license agreement flag.

use std::path::{Path, PathBuf};

use anyhow::Context;
use ini::Ini;
use tracing::{instrument, warn};

const EULA_URL: &str = "https://aka.ms/MinecraftEULA";

/// Whether the operator agreed to the EULA by setting `eula=true`.
#[derive(Debug)]
pub struct Eula {
    file: PathBuf,
    agreed: bool,
}

impl Eula {
    /// Reads the flag from `file`. A missing file is created with `eula=false`; unreadable files
    /// count as not agreed.
    #[instrument]
    pub fn load(file: &Path) -> Self {
        let agreed = match Ini::load_from_file(file) {
            Ok(ini) => ini
                .general_section()
                .get("eula")
                .is_some_and(|value| value.trim().eq_ignore_ascii_case("true")),
            Err(ini::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                if let Err(e) = Self::save_defaults(file) {
                    warn!("Failed to save {}: {e:#}", file.display());
                }
                false
            }
            Err(e) => {
                warn!("Failed to load {}: {e}", file.display());
                false
            }
        };

        Self {
            file: file.to_path_buf(),
            agreed,
        }
    }

    #[must_use]
    pub const fn has_agreed_to_eula(&self) -> bool {
        self.agreed
    }

    #[must_use]
    pub fn file(&self) -> &Path {
        &self.file
    }

    fn save_defaults(file: &Path) -> anyhow::Result<()> {
        let contents = format!(
            "#By changing the setting below to TRUE you are indicating your agreement to our \
             EULA ({EULA_URL}).\n#{}\neula=false\n",
            humantime::format_rfc3339_seconds(std::time::SystemTime::now())
        );
        std::fs::write(file, contents).with_context(|| format!("failed to write {}", file.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("hearth-eula-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn missing_file_is_created_unaccepted() {
        let file = temp_file("eula.txt");
        let eula = Eula::load(&file);

        assert!(!eula.has_agreed_to_eula());
        let written = std::fs::read_to_string(&file).unwrap();
        assert!(written.ends_with("eula=false\n"));
        assert!(written.contains(EULA_URL));

        assert!(!Eula::load(&file).has_agreed_to_eula());
    }

    #[test]
    fn true_is_case_insensitive() {
        let file = temp_file("eula.txt");
        std::fs::write(&file, "#comment\neula=TRUE\n").unwrap();
        assert!(Eula::load(&file).has_agreed_to_eula());

        std::fs::write(&file, "eula=yes\n").unwrap();
        assert!(!Eula::load(&file).has_agreed_to_eula());
    }
}
