//! The status front end. Without a windowing toolkit it reports tick statistics to the log
//! whenever a display is attached.

use tracing::info;

use super::TickStats;

/// Ticks between two status lines, five seconds at full speed.
pub const REPORT_INTERVAL: u64 = 100;

/// Whether a graphical session is attached to this process.
#[must_use]
pub fn display_available() -> bool {
    ["DISPLAY", "WAYLAND_DISPLAY"]
        .into_iter()
        .any(|var| std::env::var_os(var).is_some_and(|value| !value.is_empty()))
}

#[derive(Debug)]
pub struct StatusLog {
    server_id: Option<String>,
}

impl StatusLog {
    #[must_use]
    pub fn start(server_id: Option<String>) -> Self {
        info!(
            "Status front end attached{}",
            server_id
                .as_deref()
                .map(|id| format!(" to {id}"))
                .unwrap_or_default()
        );
        Self { server_id }
    }

    /// Reports every [`REPORT_INTERVAL`] ticks.
    pub fn on_tick(&self, tick: u64, stats: &TickStats, players: u32) {
        if tick == 0 || tick % REPORT_INTERVAL != 0 {
            return;
        }

        let Some(ms_per_tick) = stats.ms_per_tick() else {
            return;
        };

        info!(
            server_id = self.server_id.as_deref(),
            "tick {tick}: {ms_per_tick:.2} ms/tick, {:.1} tps, {players} player(s) connecting",
            stats.tps()
        );
    }
}
