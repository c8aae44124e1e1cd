use std::io::BufRead;

use anyhow::Context;
use hearth_clap::CommandSource;
use tracing::{debug, info, warn};

/// Reads commands from stdin on a `Server console handler` thread. The thread ends at end of input.
pub fn spawn_console_reader() -> anyhow::Result<flume::Receiver<String>> {
    let (tx, rx) = flume::unbounded();

    std::thread::Builder::new()
        .name("Server console handler".to_owned())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        warn!("Exception handling console input: {e}");
                        break;
                    }
                };

                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                if tx.send(line.to_owned()).is_err() {
                    break;
                }
            }
            debug!("console input closed");
        })
        .context("failed to spawn console thread")?;

    Ok(rx)
}

/// The server console: full permissions, replies go to the log.
#[derive(Debug, Default)]
pub struct ConsoleSource;

impl CommandSource for ConsoleSource {
    fn send_success(&mut self, message: &str) {
        for line in message.lines() {
            info!("{line}");
        }
    }

    fn send_failure(&mut self, message: &str) {
        for line in message.lines() {
            warn!("{line}");
        }
    }
}
