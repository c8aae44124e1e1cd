//! Process-wide plumbing: settings files, runtime and version information.

pub mod config;
pub mod eula;
pub mod pid;
pub mod runtime;
pub mod version;
