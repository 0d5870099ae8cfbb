use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
    sync::{Arc, OnceLock},
};

use rewire_di::{
    ConfigError, Configuration, ConfigurationLoader, Dependency, DependencyBuilder, Reflection,
};
use serde_json::{Map, Value as JsonValue};

use crate::{config::to_arguments, errors::LoadError};

/// Loads container configuration from a nested key-value document
///
/// The document has the shape:
///
/// ```json
/// {
///     "dependencies": {
///         "mailer": {
///             "class": "Mailer",
///             "constructorInjection": ["@transport", "localhost", 25],
///             "setterInjection": { "setLogger": ["@logger"] },
///             "factory": { "class": "MailerFactory", "method": "create", "methodArgs": [] }
///         }
///     }
/// }
/// ```
///
/// Only `class` is required. An argument list is either an array of positional
/// arguments or an object mixing positional (integer keys) and named entries,
/// positional ones first. A `factory` without `class` uses the dependency's own
/// class, and without `method` it is ignored.
///
/// The document is processed on the first call to
/// [ConfigurationLoader::configuration], the result is reused afterwards.
pub struct ArrayLoader {
    document: JsonValue,
    reflection: Arc<dyn Reflection>,
    configuration: OnceLock<Arc<Configuration>>,
}

impl ArrayLoader {
    pub fn new(document: JsonValue, reflection: Arc<dyn Reflection>) -> Self {
        Self {
            document,
            reflection,
            configuration: OnceLock::new(),
        }
    }

    pub fn from_json_str(json: &str, reflection: Arc<dyn Reflection>) -> Result<Self, LoadError> {
        Ok(Self::new(serde_json::from_str(json)?, reflection))
    }

    pub fn from_reader(
        reader: impl Read,
        reflection: Arc<dyn Reflection>,
    ) -> Result<Self, LoadError> {
        Ok(Self::new(serde_json::from_reader(reader)?, reflection))
    }

    pub fn from_path(
        path: impl AsRef<Path>,
        reflection: Arc<dyn Reflection>,
    ) -> Result<Self, LoadError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), reflection)
    }

    fn process_document(&self) -> Result<Configuration, ConfigError> {
        let dependencies = self
            .document
            .get("dependencies")
            .ok_or_else(|| invalid("Required configuration parameter missing: dependencies"))?;

        let empty = Map::new();
        let dependencies = match dependencies {
            JsonValue::Object(dependencies) => dependencies,
            JsonValue::Null => &empty,
            _ => return Err(invalid("'dependencies' must map names to dependencies")),
        };

        let reflection = self.reflection.as_ref();
        let dependencies = dependencies
            .iter()
            .map(|(name, metadata)| -> Result<(String, Dependency), ConfigError> {
                let dependency = build_dependency(name, metadata, reflection)?;
                Ok((name.clone(), dependency))
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        tracing::debug!("Loaded configuration with {} dependencies", dependencies.len());
        Ok(Configuration::new(dependencies, self.reflection.clone()))
    }
}

impl ConfigurationLoader for ArrayLoader {
    fn configuration(&self) -> Result<Arc<Configuration>, ConfigError> {
        if let Some(configuration) = self.configuration.get() {
            return Ok(configuration.clone());
        }

        let configuration = Arc::new(self.process_document()?);
        Ok(self.configuration.get_or_init(|| configuration).clone())
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidConfiguration(message.into())
}

fn build_dependency(
    name: &str,
    metadata: &JsonValue,
    reflection: &dyn Reflection,
) -> Result<Dependency, ConfigError> {
    let Some(metadata) = metadata.as_object() else {
        return Err(invalid(format!("Dependency '{name}' must be a map")));
    };

    let class_name = optional_str(metadata, "class", name)?
        .ok_or_else(|| invalid(format!("Required attribute missing: class (dependency '{name}')")))?;

    // The container only supports singletons
    let mut builder = DependencyBuilder::new(class_name).singleton(true);

    if let Some(args) = metadata.get("constructorInjection") {
        builder = builder.constructor_args(to_arguments(args, "constructorInjection")?);
    }

    match metadata.get("setterInjection") {
        None | Some(JsonValue::Null) => {}
        Some(JsonValue::Object(setters)) => {
            for (method, args) in setters {
                builder = builder.setter(method.clone(), to_arguments(args, method)?);
            }
        }
        Some(_) => {
            return Err(invalid(format!(
                "'setterInjection' of dependency '{name}' must map methods to arguments"
            )))
        }
    }

    match metadata.get("factory") {
        None | Some(JsonValue::Null) => {}
        Some(JsonValue::Object(factory)) => {
            if let Some(class) = optional_str(factory, "class", name)? {
                builder = builder.factory_class(class);
            }
            if let Some(method) = optional_str(factory, "method", name)? {
                builder = builder.factory_method(method);
            }
            if let Some(args) = factory.get("methodArgs") {
                builder = builder.factory_method_args(to_arguments(args, "methodArgs")?);
            }
        }
        Some(_) => {
            return Err(invalid(format!(
                "'factory' of dependency '{name}' must be a map"
            )))
        }
    }

    builder.build(reflection)
}

/// A string attribute where `null` counts as absent
fn optional_str(
    map: &Map<String, JsonValue>,
    key: &str,
    name: &str,
) -> Result<Option<String>, ConfigError> {
    match map.get(key) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(value)) => Ok(Some(value.clone())),
        Some(_) => Err(invalid(format!(
            "Attribute '{key}' of dependency '{name}' must be a string"
        ))),
    }
}
