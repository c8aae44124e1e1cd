//! Termination signals: the shutdown hook for a running server and an interrupt flag for the
//! startup phases that run before it.

use std::{
    any::Any,
    panic::AssertUnwindSafe,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::JoinHandle,
};

use anyhow::Context;
use signal_hook::{
    SigId,
    consts::{SIGINT, SIGTERM},
    iterator::{Handle, Signals},
};
use tracing::{debug, error, warn};

use crate::server::ServerHandle;

pub const SHUTDOWN_THREAD: &str = "Server Shutdown Thread";

const TERMINATION_SIGNALS: [i32; 2] = [SIGINT, SIGTERM];

/// Logs a panic that escaped the code running on `thread`.
pub fn log_uncaught_panic(thread: &str, payload: &(dyn Any + Send)) {
    let message = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>");

    error!(thread, "Caught previously unhandled exception: {message}");
}

/// Halts the server gracefully on the first SIGINT or SIGTERM.
#[derive(Debug)]
pub struct ShutdownHook {
    signals: Handle,
    thread: Option<JoinHandle<()>>,
}

impl ShutdownHook {
    pub fn install(server: ServerHandle) -> anyhow::Result<Self> {
        let mut signals =
            Signals::new(TERMINATION_SIGNALS).context("failed to create signal handler")?;
        let handle = signals.handle();

        let thread = std::thread::Builder::new()
            .name(SHUTDOWN_THREAD.to_owned())
            .spawn(move || {
                let Some(signal) = signals.forever().next() else {
                    debug!("shutdown hook closed");
                    return;
                };

                warn!("Received signal {signal}, shutting down...");

                let halted = std::panic::catch_unwind(AssertUnwindSafe(|| server.halt(true)));
                if let Err(panic) = halted {
                    log_uncaught_panic(SHUTDOWN_THREAD, panic.as_ref());
                }
            })
            .context("failed to spawn shutdown thread")?;

        Ok(Self {
            signals: handle,
            thread: Some(thread),
        })
    }

    /// Uninstalls the hook. Blocks until a halt it already started has finished.
    pub fn close(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.signals.close();

        let Some(thread) = self.thread.take() else {
            return;
        };
        if let Err(panic) = thread.join() {
            log_uncaught_panic(SHUTDOWN_THREAD, panic.as_ref());
        }
    }
}

impl Drop for ShutdownHook {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Set once a termination signal arrives. Lets long startup work such as a forced upgrade be
/// cancelled before the shutdown hook exists.
#[derive(Debug)]
pub struct InterruptFlag {
    flag: Arc<AtomicBool>,
    ids: Vec<SigId>,
}

impl InterruptFlag {
    pub fn register() -> anyhow::Result<Self> {
        let flag = Arc::new(AtomicBool::new(false));

        let ids: Vec<SigId> = TERMINATION_SIGNALS
            .into_iter()
            .map(|signal| {
                signal_hook::flag::register(signal, flag.clone())
                    .with_context(|| format!("failed to register handler for signal {signal}"))
            })
            .collect::<anyhow::Result<_>>()?;

        Ok(Self { flag, ids })
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

impl Drop for InterruptFlag {
    fn drop(&mut self) {
        for id in self.ids.drain(..) {
            if !signal_hook::low_level::unregister(id) {
                debug!("signal action already removed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;

    fn wait_for(condition: impl Fn() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        false
    }

    // One test so that the raised signals cannot reach a hook installed by another.
    #[test]
    fn termination_signals() {
        let interrupt = InterruptFlag::register().unwrap();
        assert!(!interrupt.is_set());
        signal_hook::low_level::raise(SIGINT).unwrap();
        assert!(wait_for(|| interrupt.is_set()));
        drop(interrupt);

        let server = ServerHandle::new();
        let hook = ShutdownHook::install(server.clone()).unwrap();
        signal_hook::low_level::raise(SIGTERM).unwrap();

        assert!(wait_for(|| !server.is_running()));
        assert!(!server.is_stopped());

        // The hook waits for the server to finish stopping.
        server.mark_stopped();
        hook.close();
        assert!(server.is_stopped());
    }

    #[test]
    fn panic_payloads_are_readable() {
        let payload = std::panic::catch_unwind(|| -> u8 { panic!("boom {}", 1) }).unwrap_err();
        log_uncaught_panic("test", payload.as_ref());
        let payload =
            std::panic::catch_unwind(|| -> u8 { std::panic::panic_any(7_u8) }).unwrap_err();
        log_uncaught_panic("test", payload.as_ref());
    }
}
