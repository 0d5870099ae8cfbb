use std::{fmt::Debug, sync::Arc};

use indexmap::IndexMap;

use crate::{dependency::Dependency, errors::ConfigError, reflection::Reflection};

/// All configured dependencies, keyed by name
///
/// Immutable once built. Holds on to the [Reflection] the dependencies were
/// validated against, so the container can later invoke their callables.
pub struct Configuration {
    dependencies: IndexMap<String, Arc<Dependency>>,
    reflection: Arc<dyn Reflection>,
}
impl Debug for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (name, dependency) in &self.dependencies {
            map.entry(name, &dependency.class_name());
        }
        map.finish()
    }
}

impl Configuration {
    pub fn new(
        dependencies: impl IntoIterator<Item = (String, Dependency)>,
        reflection: Arc<dyn Reflection>,
    ) -> Self {
        Configuration {
            dependencies: dependencies
                .into_iter()
                .map(|(name, dependency)| (name, Arc::new(dependency)))
                .collect(),
            reflection,
        }
    }

    pub fn dependencies(&self) -> &IndexMap<String, Arc<Dependency>> {
        &self.dependencies
    }

    pub fn dependency(&self, name: &str) -> Option<&Arc<Dependency>> {
        self.dependencies.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.dependencies.contains_key(name)
    }

    /// Dependency names in configuration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.dependencies.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    pub fn reflection(&self) -> &dyn Reflection {
        self.reflection.as_ref()
    }
}

/// Source of a [Configuration] for the container
///
/// Implementations must return the same configuration on every call.
pub trait ConfigurationLoader {
    fn configuration(&self) -> Result<Arc<Configuration>, ConfigError>;
}

// An already built configuration loads itself
impl ConfigurationLoader for Arc<Configuration> {
    fn configuration(&self) -> Result<Arc<Configuration>, ConfigError> {
        Ok(self.clone())
    }
}
