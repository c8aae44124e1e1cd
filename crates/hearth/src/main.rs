//! The `hearth` binary.

use clap::Parser;
use hearth::{Startup, StartupConfig, bootstrap};
use tracing::error;
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt};

fn setup_logging() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing::subscriber::set_global_default(
        Registry::default().with(filter).with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_names(true)
                .with_file(true)
                .with_line_number(true),
        ),
    )?;

    Ok(())
}

fn run(config: &StartupConfig) -> anyhow::Result<()> {
    match bootstrap::run(config, std::path::Path::new("."))? {
        Startup::Running(server) => server.wait(),
        _ => Ok(()),
    }
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    setup_logging()?;

    let config = StartupConfig::parse();

    if let Err(e) = run(&config) {
        error!(fatal = true, "Failed to start the minecraft server: {e:?}");
        return Err(e);
    }

    Ok(())
}
