use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

use anyhow::Context;
use serde::Serialize;
use tracing::{info, instrument};

pub const PROFILE_DIR: &str = "debug";

/// Records how long every tick took, written out as a JSON report when the server stops.
#[derive(Debug)]
pub struct TickProfiler {
    started_at: SystemTime,
    started: Instant,
    tick_ms: Vec<f64>,
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    started_at_unix: u64,
    uptime: String,
    ticks: usize,
    mean_ms: f64,
    max_ms: f64,
    /// Ticks longer than the 50 ms budget.
    overloaded: usize,
    tick_ms: &'a [f64],
}

impl Default for TickProfiler {
    fn default() -> Self {
        Self::start()
    }
}

impl TickProfiler {
    #[must_use]
    pub fn start() -> Self {
        info!("Profiling ticks");
        Self {
            started_at: SystemTime::now(),
            started: Instant::now(),
            tick_ms: Vec::new(),
        }
    }

    pub fn record(&mut self, tick: Duration) {
        self.tick_ms.push(tick.as_nanos() as f64 / 1_000_000.0);
    }

    /// `debug/server-<unix secs>.json` under `root`.
    #[must_use]
    pub fn report_path(&self, root: &Path) -> PathBuf {
        let secs = self
            .started_at
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs());
        root.join(PROFILE_DIR).join(format!("server-{secs}.json"))
    }

    #[instrument(skip(self))]
    pub fn write_report(&self, root: &Path) -> anyhow::Result<PathBuf> {
        let path = self.report_path(root);

        let max_ms = self.tick_ms.iter().copied().fold(0.0, f64::max);
        let mean_ms = if self.tick_ms.is_empty() {
            0.0
        } else {
            self.tick_ms.iter().sum::<f64>() / self.tick_ms.len() as f64
        };

        // whole seconds read better than nanoseconds
        let uptime = Duration::from_secs(self.started.elapsed().as_secs());

        let report = Report {
            started_at_unix: self
                .started_at
                .duration_since(UNIX_EPOCH)
                .map_or(0, |elapsed| elapsed.as_secs()),
            uptime: humantime::format_duration(uptime).to_string(),
            ticks: self.tick_ms.len(),
            mean_ms,
            max_ms,
            overloaded: self.tick_ms.iter().filter(|ms| **ms > 50.0).count(),
            tick_ms: &self.tick_ms,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let contents =
            serde_json::to_string_pretty(&report).context("failed to serialize tick report")?;
        std::fs::write(&path, contents)
            .with_context(|| format!("failed to write {}", path.display()))?;

        info!("Wrote tick profile to {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_summarises_ticks() {
        let root = std::env::temp_dir().join(format!("hearth-profile-{}", uuid::Uuid::new_v4()));

        let mut profiler = TickProfiler::start();
        profiler.record(Duration::from_millis(10));
        profiler.record(Duration::from_millis(70));
        profiler.record(Duration::from_millis(30));

        let path = profiler.write_report(&root).unwrap();
        assert_eq!(path, profiler.report_path(&root));
        assert!(path.starts_with(root.join(PROFILE_DIR)));

        let report: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(report["ticks"], 3);
        assert_eq!(report["overloaded"], 1);
        assert_eq!(report["max_ms"], 70.0);
        assert!((report["mean_ms"].as_f64().unwrap() - 36.666).abs() < 0.01);

        std::fs::remove_dir_all(root).unwrap();
    }
}
