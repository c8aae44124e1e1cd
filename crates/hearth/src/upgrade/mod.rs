//! Rewrites every stored chunk of a world in the current format, on a background thread.

use std::{
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    thread::JoinHandle,
};

use anyhow::Context;
use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::{storage::dimension_path, world::ResourceLocation};

mod fixer;
mod force;

pub use fixer::{DATA_VERSION_KEY, DataFixer, erase_cache};
pub use force::{UpgradeDriver, UpgradeProgress, force_upgrade, progress_line};

pub const CHUNKS_DIR: &str = "chunks";

pub const STATUS_COUNTING: &str = "Counting chunks...";
pub const STATUS_UPGRADING: &str = "Upgrading all chunks...";
pub const STATUS_DONE: &str = "All chunks done!";
pub const STATUS_FAILED: &str = "Upgrade failed!";

/// File name of the chunk at `x`, `z`.
#[must_use]
pub fn chunk_file_name(x: i32, z: i32) -> String {
    format!("c.{x}.{z}.toml")
}

fn is_chunk_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    let Some(coords) = name
        .strip_prefix("c.")
        .and_then(|rest| rest.strip_suffix(".toml"))
    else {
        return false;
    };
    let Some((x, z)) = coords.split_once('.') else {
        return false;
    };
    x.parse::<i32>().is_ok() && z.parse::<i32>().is_ok()
}

#[derive(Debug)]
struct Shared {
    running: AtomicBool,
    finished: AtomicBool,
    converted: AtomicUsize,
    skipped: AtomicUsize,
    total: AtomicUsize,
    status: Mutex<String>,
    dimension_progress: Mutex<IndexMap<ResourceLocation, f32>>,
}

impl Shared {
    fn set_status(&self, status: &str) {
        status.clone_into(&mut self.status.lock());
    }
}

/// Handle to a running world upgrade. Dropping it cancels the upgrade and waits for the thread.
#[derive(Debug)]
pub struct WorldUpgrader {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
}

/// What a chunk upgrade did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Converted,
    Skipped,
}

struct Job {
    world_dir: PathBuf,
    dimensions: Vec<ResourceLocation>,
    erase_cache: bool,
    fixer: DataFixer,
    shared: Arc<Shared>,
}

impl WorldUpgrader {
    /// Starts upgrading the chunks of `dimensions` below `world_dir`.
    pub fn start(
        world_dir: &Path,
        dimensions: Vec<ResourceLocation>,
        erase_cache: bool,
    ) -> anyhow::Result<Self> {
        let shared = Arc::new(Shared {
            running: AtomicBool::new(true),
            finished: AtomicBool::new(false),
            converted: AtomicUsize::new(0),
            skipped: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
            status: Mutex::new(STATUS_COUNTING.to_owned()),
            dimension_progress: Mutex::new(IndexMap::new()),
        });

        let job = Job {
            world_dir: world_dir.to_path_buf(),
            dimensions,
            erase_cache,
            fixer: DataFixer::default(),
            shared: Arc::clone(&shared),
        };

        let thread = std::thread::Builder::new()
            .name("Worldupgrader".to_owned())
            .spawn(move || job.run())
            .context("failed to spawn world upgrade thread")?;

        Ok(Self {
            shared,
            thread: Some(thread),
        })
    }

    /// How far each dimension has come, from `0.0` to `1.0`.
    #[must_use]
    pub fn dimension_progress(&self) -> IndexMap<ResourceLocation, f32> {
        self.shared.dimension_progress.lock().clone()
    }
}

impl UpgradeDriver for WorldUpgrader {
    fn progress(&self) -> UpgradeProgress {
        // The status lock orders the counters with the status they belong to.
        let guard = self.shared.status.lock();
        let progress = UpgradeProgress {
            converted: self.shared.converted.load(Ordering::Relaxed),
            skipped: self.shared.skipped.load(Ordering::Relaxed),
            total: self.shared.total.load(Ordering::Relaxed),
            status: guard.clone(),
        };
        drop(guard);
        progress
    }

    fn is_finished(&self) -> bool {
        self.shared.finished.load(Ordering::Acquire)
    }

    fn cancel(&self) {
        self.shared.running.store(false, Ordering::Relaxed);
    }
}

impl Drop for WorldUpgrader {
    fn drop(&mut self) {
        self.cancel();
        if self
            .thread
            .take()
            .is_some_and(|thread| thread.join().is_err())
        {
            error!("world upgrade thread panicked");
        }
    }
}

impl Job {
    fn run(self) {
        if let Err(e) = self.upgrade() {
            error!("Error upgrading world: {e:#}");
            self.shared.set_status(STATUS_FAILED);
        }
        self.shared.finished.store(true, Ordering::Release);
    }

    fn chunk_files(&self, dimension: &ResourceLocation) -> anyhow::Result<Vec<PathBuf>> {
        let dir = dimension_path(&self.world_dir, dimension).join(CHUNKS_DIR);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in
            std::fs::read_dir(&dir).with_context(|| format!("failed to list {}", dir.display()))?
        {
            let path = entry
                .with_context(|| format!("failed to list {}", dir.display()))?
                .path();
            if is_chunk_file(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn upgrade(&self) -> anyhow::Result<()> {
        let shared = &self.shared;

        let mut total = 0;
        let mut per_dimension = Vec::with_capacity(self.dimensions.len());
        for dimension in &self.dimensions {
            let files = self.chunk_files(dimension)?;
            total += files.len();
            shared.dimension_progress.lock().insert(dimension.clone(), 0.0);
            per_dimension.push((dimension, files));
        }

        info!(
            "Upgrading {total} chunks in {} dimensions",
            self.dimensions.len()
        );
        {
            let mut status = shared.status.lock();
            shared.total.store(total, Ordering::Relaxed);
            STATUS_UPGRADING.clone_into(&mut status);
        }

        for (dimension, files) in per_dimension {
            let count = files.len();
            for (index, file) in files.into_iter().enumerate() {
                if !shared.running.load(Ordering::Relaxed) {
                    info!("World upgrade cancelled");
                    return Ok(());
                }

                let counter = match self.upgrade_chunk(&file) {
                    Ok(Outcome::Converted) => &shared.converted,
                    Ok(Outcome::Skipped) => &shared.skipped,
                    Err(e) => {
                        warn!("Failed to upgrade chunk {}: {e:#}", file.display());
                        &shared.skipped
                    }
                };
                counter.fetch_add(1, Ordering::Relaxed);

                shared
                    .dimension_progress
                    .lock()
                    .insert(dimension.clone(), (index + 1) as f32 / count as f32);
            }
            debug!("finished upgrading {dimension}");
        }

        shared.set_status(STATUS_DONE);
        Ok(())
    }

    fn upgrade_chunk(&self, file: &Path) -> anyhow::Result<Outcome> {
        let contents = std::fs::read_to_string(file).context("failed to read chunk")?;
        let mut chunk: toml::Table = contents.parse().context("failed to parse chunk")?;

        let mut dirty = false;
        if self.fixer.needs_update(&chunk) {
            self.fixer.update(&mut chunk);
            dirty = true;
        }
        if self.erase_cache {
            erase_cache(&mut chunk);
            dirty = true;
        }

        if !dirty {
            return Ok(Outcome::Skipped);
        }

        let contents = toml::to_string(&chunk).context("failed to serialize chunk")?;
        std::fs::write(file, contents).context("failed to write chunk")?;
        Ok(Outcome::Converted)
    }
}
