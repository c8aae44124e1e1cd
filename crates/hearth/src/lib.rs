//! Hearth: a dedicated block-world server.
//!
//! [`bootstrap::run`] takes a parsed [`cli::StartupConfig`] through the startup sequence and
//! hands back a running server.

pub mod bootstrap;
pub mod cli;
pub mod common;
pub mod loader;
pub mod net;
pub mod packs;
pub mod server;
pub mod shutdown;
pub mod storage;
pub mod upgrade;
pub mod world;

pub use bootstrap::{RunningServer, Startup};
pub use cli::StartupConfig;
