use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{info, warn};

/// A file holding this process id, removed again when dropped.
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    pub fn write(path: &Path) -> anyhow::Result<Self> {
        let pid = std::process::id();
        std::fs::write(path, pid.to_string())
            .with_context(|| format!("Failed to write PID file to {}", path.display()))?;

        info!("wrote pid {pid} to {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!("failed to remove pid file {}: {e}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pid_file_lives_as_long_as_the_guard() {
        let path = std::env::temp_dir().join(format!("hearth-{}.pid", uuid::Uuid::new_v4()));

        let pid_file = PidFile::write(&path).unwrap();
        assert_eq!(
            std::fs::read_to_string(pid_file.path()).unwrap(),
            std::process::id().to_string()
        );

        drop(pid_file);
        assert!(!path.exists());
    }

    #[test]
    fn unwritable_location_is_an_error() {
        let path = std::env::temp_dir()
            .join(uuid::Uuid::new_v4().to_string())
            .join("missing")
            .join("server.pid");

        let error = PidFile::write(&path).unwrap_err();
        assert!(error.to_string().starts_with("Failed to write PID file"));
    }
}
