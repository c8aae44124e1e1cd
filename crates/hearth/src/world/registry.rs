use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::ResourceLocation;

/// How settled the contents of a registry or world are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    #[default]
    Stable,
    Experimental,
}

impl Lifecycle {
    /// The least stable of the two.
    #[must_use]
    pub const fn add(self, other: Self) -> Self {
        match (self, other) {
            (Self::Stable, Self::Stable) => Self::Stable,
            _ => Self::Experimental,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("registry {registry} is frozen, cannot add {key}")]
    Frozen {
        registry: &'static str,
        key: ResourceLocation,
    },
    #[error("duplicate entry {key} in registry {registry}")]
    Duplicate {
        registry: &'static str,
        key: ResourceLocation,
    },
}

/// Entries keyed by identifier, in registration order.
#[derive(Debug, Clone)]
pub struct Registry<T> {
    name: &'static str,
    entries: IndexMap<ResourceLocation, T>,
    lifecycle: Lifecycle,
    frozen: bool,
}

impl<T> Registry<T> {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: IndexMap::new(),
            lifecycle: Lifecycle::Stable,
            frozen: false,
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub fn register(
        &mut self,
        key: ResourceLocation,
        value: T,
        lifecycle: Lifecycle,
    ) -> Result<(), RegistryError> {
        if self.frozen {
            return Err(RegistryError::Frozen {
                registry: self.name,
                key,
            });
        }
        if self.entries.contains_key(&key) {
            return Err(RegistryError::Duplicate {
                registry: self.name,
                key,
            });
        }

        self.lifecycle = self.lifecycle.add(lifecycle);
        self.entries.insert(key, value);
        Ok(())
    }

    /// Adds or replaces an entry. Later data packs override earlier ones this way.
    pub fn register_or_override(
        &mut self,
        key: ResourceLocation,
        value: T,
        lifecycle: Lifecycle,
    ) -> Result<(), RegistryError> {
        if self.frozen {
            return Err(RegistryError::Frozen {
                registry: self.name,
                key,
            });
        }

        self.lifecycle = self.lifecycle.add(lifecycle);
        self.entries.insert(key, value);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, key: &ResourceLocation) -> Option<&T> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &ResourceLocation) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ResourceLocation, &T)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ResourceLocation> {
        self.entries.keys()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub const fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    #[must_use]
    pub const fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Rejects any further registration.
    #[must_use]
    pub fn freeze(mut self) -> Self {
        self.frozen = true;
        self
    }
}
