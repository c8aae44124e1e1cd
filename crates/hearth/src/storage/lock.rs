use std::{
    fs::{File, OpenOptions, TryLockError},
    io::Write,
    path::{Path, PathBuf},
};

use super::LevelStorageError;

pub const LOCK_FILE: &str = "session.lock";

/// An exclusive OS lock on a world directory, held until dropped.
#[derive(Debug)]
pub struct DirectoryLock {
    file: File,
    path: PathBuf,
}

impl DirectoryLock {
    pub fn create(dir: &Path) -> Result<Self, LevelStorageError> {
        let path = dir.join(LOCK_FILE);
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|source| LevelStorageError::io(&path, source))?;

        match file.try_lock() {
            Ok(()) => {}
            Err(TryLockError::WouldBlock) => return Err(LevelStorageError::Locked(path)),
            Err(TryLockError::Error(source)) => {
                return Err(LevelStorageError::io(&path, source));
            }
        }

        file.set_len(0)
            .and_then(|()| file.write_all("☃".as_bytes()))
            .map_err(|source| LevelStorageError::io(&path, source))?;

        Ok(Self { file, path })
    }

    /// Whether the lock file still exists and is ours.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.path.exists() && self.file.metadata().is_ok()
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DirectoryLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            tracing::warn!("failed to release {}: {e}", self.path.display());
        }
    }
}
