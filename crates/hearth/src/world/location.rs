use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

pub const DEFAULT_NAMESPACE: &str = "minecraft";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceLocationError {
    #[error("Non [a-z0-9_.-] character in namespace of location: {0}")]
    InvalidNamespace(String),
    #[error("Non [a-z0-9/._-] character in path of location: {0}")]
    InvalidPath(String),
}

/// A namespaced identifier such as `minecraft:overworld`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceLocation {
    namespace: String,
    path: String,
}

const fn valid_namespace_char(c: char) -> bool {
    matches!(c, 'a'..='z' | '0'..='9' | '_' | '-' | '.')
}

const fn valid_path_char(c: char) -> bool {
    valid_namespace_char(c) || c == '/'
}

impl ResourceLocation {
    pub fn new(
        namespace: impl Into<String>,
        path: impl Into<String>,
    ) -> Result<Self, ResourceLocationError> {
        let namespace = namespace.into();
        let path = path.into();

        if !namespace.chars().all(valid_namespace_char) {
            return Err(ResourceLocationError::InvalidNamespace(format!(
                "{namespace}:{path}"
            )));
        }
        if !path.chars().all(valid_path_char) {
            return Err(ResourceLocationError::InvalidPath(format!(
                "{namespace}:{path}"
            )));
        }

        Ok(Self { namespace, path })
    }

    /// An identifier in the default namespace. `path` must be valid.
    #[must_use]
    pub fn minecraft(path: &str) -> Self {
        debug_assert!(path.chars().all(valid_path_char), "invalid path {path}");
        Self {
            namespace: DEFAULT_NAMESPACE.to_owned(),
            path: path.to_owned(),
        }
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl FromStr for ResourceLocation {
    type Err = ResourceLocationError;

    /// Parses `namespace:path`; a missing namespace means `minecraft`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some(("", path)) => Self::new(DEFAULT_NAMESPACE, path),
            Some((namespace, path)) => Self::new(namespace, path),
            None => Self::new(DEFAULT_NAMESPACE, s),
        }
    }
}

impl fmt::Display for ResourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl Serialize for ResourceLocation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResourceLocation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_namespace_defaults_to_minecraft() {
        let location: ResourceLocation = "overworld".parse().unwrap();
        assert_eq!(location, ResourceLocation::minecraft("overworld"));
        assert_eq!(location.to_string(), "minecraft:overworld");

        let location: ResourceLocation = ":the_end".parse().unwrap();
        assert_eq!(location.path(), "the_end");
    }

    #[test]
    fn rejects_invalid_characters() {
        assert!(matches!(
            "Mod:thing".parse::<ResourceLocation>(),
            Err(ResourceLocationError::InvalidNamespace(_))
        ));
        assert!(matches!(
            "mod:a b".parse::<ResourceLocation>(),
            Err(ResourceLocationError::InvalidPath(_))
        ));
        assert!("mod:caves/deep".parse::<ResourceLocation>().is_ok());
    }
}
