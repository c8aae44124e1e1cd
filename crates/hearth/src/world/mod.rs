//! The data describing a world before anything in it is simulated.

pub mod data;
pub mod dimension;
pub mod generator;
mod location;
mod registry;
pub mod settings;

pub use data::{FrozenRegistries, PrimaryLevelData, WorldGenSettings, WorldStem};
pub use location::{DEFAULT_NAMESPACE, ResourceLocation, ResourceLocationError};
pub use registry::{Lifecycle, Registry, RegistryError};
