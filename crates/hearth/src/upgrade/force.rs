//! Drives a running upgrade from the startup thread until it finishes or is cancelled.

use std::time::Duration;

use tracing::info;

/// A snapshot of how far an upgrade has come.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpgradeProgress {
    pub converted: usize,
    pub skipped: usize,
    pub total: usize,
    pub status: String,
}

impl UpgradeProgress {
    /// Chunks that were looked at, whether rewritten or not.
    #[must_use]
    pub const fn done(&self) -> usize {
        self.converted + self.skipped
    }
}

/// Something converting a world in the background.
pub trait UpgradeDriver {
    fn progress(&self) -> UpgradeProgress;

    fn is_finished(&self) -> bool;

    /// Asks the upgrade to stop. It stops cooperatively, so poll [`UpgradeDriver::is_finished`].
    fn cancel(&self);
}

/// `None` while the total is not known yet.
#[must_use]
pub fn progress_line(done: usize, total: usize) -> Option<String> {
    if total == 0 {
        return None;
    }

    let percent = done.saturating_mul(100) / total;
    Some(format!("{percent}% completed ({done} / {total} chunks)..."))
}

/// Logs progress of `driver` every `interval` until it finishes. Once `keep_going` returns false
/// the driver is cancelled and the loop waits for it to wind down.
pub fn force_upgrade(
    driver: &impl UpgradeDriver,
    mut keep_going: impl FnMut() -> bool,
    interval: Duration,
) {
    info!("Forcing world upgrade!");

    let mut last_status: Option<String> = None;
    let mut cancelled = false;

    while !driver.is_finished() {
        let progress = driver.progress();

        if last_status.as_deref() != Some(progress.status.as_str()) {
            info!("{}", progress.status);
            last_status = Some(progress.status.clone());
        }

        if let Some(line) = progress_line(progress.done(), progress.total) {
            info!("{line}");
        }

        if cancelled || keep_going() {
            std::thread::sleep(interval);
        } else {
            info!("Cancelling world upgrade");
            driver.cancel();
            cancelled = true;
        }
    }
}
