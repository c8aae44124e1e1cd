//! The running server: a 20 TPS loop on the `Server thread`, fed by the console and the network.

use std::{
    collections::VecDeque,
    path::PathBuf,
    sync::{
        Arc, OnceLock,
        atomic::{AtomicBool, Ordering},
    },
    thread::{JoinHandle, ThreadId},
    time::{Duration, Instant},
};

use anyhow::{Context, anyhow};
use hearth_clap::{CommandRegistry, CommandSource};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info, instrument, warn};

use crate::{
    common::{config::ServerProperties, runtime::AsyncRuntime, version},
    net::{NetworkSettings, ServerConnection},
    storage::LevelStorageAccess,
    world::{FrozenRegistries, WorldStem},
};

pub mod commands;
mod console;
mod front_end;
mod profiler;
pub mod scoreboard;

pub use commands::GameState;
pub use console::ConsoleSource;
pub use front_end::{REPORT_INTERVAL, StatusLog, display_available};
pub use profiler::{PROFILE_DIR, TickProfiler};
use scoreboard::{SCOREBOARD_FILE, Scoreboard};

pub const TICK_DURATION: Duration = Duration::from_millis(50);

/// Every five minutes at full speed.
pub const AUTOSAVE_INTERVAL: u64 = 6000;

const OVERLOAD_THRESHOLD: Duration = Duration::from_secs(2);
const OVERLOAD_WARNING_INTERVAL: Duration = Duration::from_secs(15);

/// Configuration applied to the server after it is constructed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[expect(clippy::struct_excessive_bools, reason = "independent switches")]
pub struct ServerSettings {
    /// Replaces `server-port` when set.
    pub port_override: Option<u16>,
    pub demo: bool,
    pub server_id: Option<String>,
    /// Record tick timings and write them out on stop.
    pub profile: bool,
    /// Attach the status front end.
    pub front_end: bool,
    /// Read commands from stdin.
    pub console: bool,
}

/// Recent tick start times and durations.
#[derive(Debug, Default)]
pub struct TickStats {
    last_ticks: VecDeque<Instant>,
    last_ms_per_tick: VecDeque<f64>,
}

impl TickStats {
    const HISTORY_SIZE: usize = 100;

    pub fn record(&mut self, started: Instant, took: Duration) {
        self.last_ticks.push_back(started);
        if self.last_ticks.len() > Self::HISTORY_SIZE {
            self.last_ticks.pop_front();
        }

        let ms = took.as_nanos() as f64 / 1_000_000.0;
        self.last_ms_per_tick.push_back(ms);
        if self.last_ms_per_tick.len() > Self::HISTORY_SIZE {
            self.last_ms_per_tick.pop_front();
        }
    }

    /// Mean tick duration over the history.
    #[must_use]
    pub fn ms_per_tick(&self) -> Option<f64> {
        if self.last_ms_per_tick.is_empty() {
            return None;
        }
        Some(self.last_ms_per_tick.iter().sum::<f64>() / self.last_ms_per_tick.len() as f64)
    }

    #[must_use]
    pub fn tps(&self) -> f64 {
        let (Some(first), Some(last)) = (self.last_ticks.front(), self.last_ticks.back()) else {
            return 0.0;
        };

        let span = last.duration_since(*first).as_secs_f64();
        if span <= 0.0 {
            return 0.0;
        }

        (self.last_ticks.len() - 1) as f64 / span
    }
}

#[derive(Debug, Default)]
struct HandleState {
    running: AtomicBool,
    stopped: Mutex<bool>,
    stopped_changed: Condvar,
    thread: OnceLock<ThreadId>,
    join: Mutex<Option<JoinHandle<()>>>,
}

/// Controls a running server from any thread.
#[derive(Debug, Clone)]
pub struct ServerHandle {
    state: Arc<HandleState>,
}

impl HandleState {
    fn mark_stopped(&self) {
        self.running.store(false, Ordering::Release);
        *self.stopped.lock() = true;
        self.stopped_changed.notify_all();
    }
}

impl ServerHandle {
    pub(crate) fn new() -> Self {
        let state = HandleState {
            running: AtomicBool::new(true),
            ..HandleState::default()
        };
        Self {
            state: Arc::new(state),
        }
    }

    /// Asks the server to stop. Safe to call repeatedly, from any thread and before the loop
    /// started. With `wait`, blocks until the server has stopped unless called from the server
    /// thread itself.
    pub fn halt(&self, wait: bool) {
        if self.state.running.swap(false, Ordering::AcqRel) {
            debug!("server halt requested");
        }

        if wait && !self.is_server_thread() {
            self.wait_until_stopped();
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        *self.state.stopped.lock()
    }

    fn is_server_thread(&self) -> bool {
        self.state.thread.get() == Some(&std::thread::current().id())
    }

    pub fn wait_until_stopped(&self) {
        let mut stopped = self.state.stopped.lock();
        while !*stopped {
            self.state.stopped_changed.wait(&mut stopped);
        }
    }

    #[cfg(test)]
    pub(crate) fn mark_stopped(&self) {
        self.state.mark_stopped();
    }

    /// Waits for the server thread to exit.
    pub fn join(&self) -> anyhow::Result<()> {
        let Some(thread) = self.state.join.lock().take() else {
            return Ok(());
        };
        thread
            .join()
            .map_err(|_| anyhow!("the server thread panicked"))
    }
}

/// Marks the server stopped when the server thread ends, panics included.
struct StoppedGuard(Arc<HandleState>);

impl Drop for StoppedGuard {
    fn drop(&mut self) {
        self.0.mark_stopped();
    }
}

/// Everything the server is built from.
#[derive(Debug)]
pub struct ServerParts {
    pub runtime: AsyncRuntime,
    pub storage: LevelStorageAccess,
    pub stem: WorldStem,
    pub properties: ServerProperties,
    /// Where profile reports go.
    pub root: PathBuf,
}

struct MinecraftServer {
    storage: LevelStorageAccess,
    registries: FrozenRegistries,
    settings: ServerSettings,
    root: PathBuf,
    state: GameState,
    commands: CommandRegistry<GameState>,
    console: Option<flume::Receiver<String>>,
    network: ServerConnection,
    stats: TickStats,
    front_end: Option<StatusLog>,
    profiler: Option<TickProfiler>,
    tick_count: u64,
    handle: ServerHandle,
}

/// Builds the server on the `Server thread` and starts ticking it.
#[instrument(skip_all)]
pub fn spin(parts: ServerParts, settings: ServerSettings) -> anyhow::Result<ServerHandle> {
    let handle = ServerHandle::new();
    let server_handle = handle.clone();

    let thread = std::thread::Builder::new()
        .name("Server thread".to_owned())
        .spawn(move || run_server(parts, settings, server_handle))
        .context("failed to spawn server thread")?;

    if handle.state.thread.set(thread.thread().id()).is_err() {
        warn!("server thread id already recorded");
    }
    *handle.state.join.lock() = Some(thread);

    Ok(handle)
}

fn run_server(parts: ServerParts, settings: ServerSettings, handle: ServerHandle) {
    let _stopped = StoppedGuard(handle.state.clone());

    match MinecraftServer::init(parts, settings, handle) {
        Ok(mut server) => {
            server.run();
            server.stop();
        }
        Err(e) => error!("Encountered an unexpected exception: {e:?}"),
    }
}

impl MinecraftServer {
    fn init(
        parts: ServerParts,
        settings: ServerSettings,
        handle: ServerHandle,
    ) -> anyhow::Result<Self> {
        let started = Instant::now();
        let ServerParts {
            runtime,
            storage,
            stem,
            properties,
            root,
        } = parts;

        info!("Starting minecraft server version {}", version::CURRENT.name);
        if settings.demo {
            info!("Server is running in demo mode");
        }

        let port = settings.port_override.unwrap_or(properties.server_port);
        let network = ServerConnection::bind(&runtime, &properties.server_ip, port, NetworkSettings {
            motd: properties.motd.clone(),
            max_players: properties.max_players,
            enable_status: properties.enable_status,
        })?;

        info!("Preparing level \"{}\"", storage.level_id());
        for key in stem.registries.level_stems.keys() {
            debug!("dimension {key}");
        }

        let scoreboard = Scoreboard::load(storage.data_dir().join(SCOREBOARD_FILE))?;

        let commands = commands::registry();
        let mut state = GameState::new(stem.world_data, scoreboard);
        state.command_names = commands.all().map(str::to_owned).collect();

        let console = if settings.console {
            Some(console::spawn_console_reader()?)
        } else {
            None
        };

        let front_end = settings
            .front_end
            .then(|| StatusLog::start(settings.server_id.clone()));
        let profiler = settings.profile.then(TickProfiler::start);

        info!(
            "Done ({:.3}s)! For help, type \"help\"",
            started.elapsed().as_secs_f64()
        );

        Ok(Self {
            storage,
            registries: stem.registries,
            settings,
            root,
            state,
            commands,
            console,
            network,
            stats: TickStats::default(),
            front_end,
            profiler,
            tick_count: 0,
            handle,
        })
    }

    fn run(&mut self) {
        let mut next_tick = Instant::now();
        let mut last_overload_warning: Option<Instant> = None;

        while self.handle.is_running() {
            let now = Instant::now();
            let behind = now.saturating_duration_since(next_tick);

            if behind > OVERLOAD_THRESHOLD {
                let warned_recently = last_overload_warning
                    .is_some_and(|at| now.duration_since(at) < OVERLOAD_WARNING_INTERVAL);
                if !warned_recently {
                    warn!(
                        "Can't keep up! Is the server overloaded? Running {}ms or {} ticks behind",
                        behind.as_millis(),
                        behind.as_millis() / TICK_DURATION.as_millis()
                    );
                    last_overload_warning = Some(now);
                }
                next_tick = now;
            }

            next_tick += TICK_DURATION;
            self.tick();

            std::thread::sleep(next_tick.saturating_duration_since(Instant::now()));
        }
    }

    fn tick(&mut self) {
        let started = Instant::now();
        self.tick_count += 1;

        self.process_console();

        if self.state.save_requested {
            self.state.save_requested = false;
            let flush = std::mem::take(&mut self.state.flush_requested);
            self.save_all(flush);
        }

        if self.tick_count % AUTOSAVE_INTERVAL == 0 {
            info!("Autosave started");
            self.save_all(false);
            info!("Autosave finished");
        }

        if self.state.stop_requested {
            self.handle.halt(false);
        }

        let took = started.elapsed();
        self.stats.record(started, took);

        if let Some(profiler) = &mut self.profiler {
            profiler.record(took);
        }

        if let Some(front_end) = &self.front_end {
            front_end.on_tick(self.tick_count, &self.stats, self.network.connecting());
        }
    }

    fn process_console(&mut self) {
        let Some(console) = &self.console else {
            return;
        };

        let lines: Vec<String> = console.try_iter().collect();
        let mut source = ConsoleSource;

        for line in lines {
            if let Err(e) = self.commands.execute(&line, &mut self.state, &mut source) {
                source.send_failure(&e.to_string());
            }
        }
    }

    fn save_all(&mut self, flush: bool) {
        info!("Saving the game");
        self.state.world_data.touch();

        if let Err(e) = self.storage.save_level_data(&self.state.world_data) {
            error!("Failed to save level data: {e}");
        }

        if let Err(e) = self
            .state
            .scoreboard
            .save(self.storage.data_dir().join(SCOREBOARD_FILE))
        {
            error!("Failed to save scoreboard: {e:?}");
        }

        if flush {
            info!("All dimensions are saved");
        } else {
            info!("Saved the game");
        }
    }

    fn stop(mut self) {
        info!("Stopping server");

        info!("Saving players");
        self.network.stop();

        info!("Saving worlds");
        for key in self.registries.level_stems.keys() {
            debug!("saving dimension {key}");
        }
        self.save_all(true);

        let report = self
            .profiler
            .as_ref()
            .map(|profiler| profiler.write_report(&self.root));
        if let Some(Err(e)) = report {
            error!("Failed to write tick profile: {e:?}");
        }

        if let Some(server_id) = &self.settings.server_id {
            debug!("stopped server {server_id} after {} ticks", self.tick_count);
        }

        self.storage.close();
    }
}
