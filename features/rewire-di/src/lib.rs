//! Rewire DI resolves named, declaratively configured dependencies into singleton instances.
//!
//! Rewire DI consists of the following components:
//!
//! 1. Reflection - a registry of classes, their constructors, setters and static factory methods
//! 2. Dependency - a validated recipe for one named dependency
//! 3. Configuration - all dependencies keyed by name, produced by a [ConfigurationLoader]
//! 4. Container - resolves dependencies on request, caching every instance
//!
//! Arguments are literal [Value]s. A string argument of the form `@name` is a reference and
//! is replaced by the dependency `name` if such a dependency is configured.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use rewire_di::{
//!     reflection::{ClassDefinition, ClassRegistry},
//!     Configuration, Container, Dependency, RawArguments,
//! };
//!
//! #[derive(Default)]
//! struct Database;
//!
//! struct Repository {
//!     database: Arc<Database>,
//! }
//!
//! let registry = ClassRegistry::new()
//!     .register(ClassDefinition::<Database>::with_default("Database"))
//!     .register(
//!         ClassDefinition::<Repository>::new("Repository")
//!             .constructor(&["database"], |args| Ok(Repository { database: args.instance(0)? })),
//!     );
//!
//! let database = Dependency::builder("Database").build(&registry).unwrap();
//! let repository = Dependency::builder("Repository")
//!     .constructor_args(RawArguments::new().push("@database"))
//!     .build(&registry)
//!     .unwrap();
//!
//! let configuration = Configuration::new(
//!     [("database".to_string(), database), ("repository".to_string(), repository)],
//!     Arc::new(registry),
//! );
//! let mut container = Container::new(&Arc::new(configuration)).unwrap();
//!
//! let repository = container.get_as::<Repository>("repository").unwrap();
//! let database = container.get_as::<Database>("database").unwrap();
//! assert!(Arc::ptr_eq(&repository.database, &database));
//! ```

pub use crate::{
    builder::DependencyBuilder,
    configuration::{Configuration, ConfigurationLoader},
    container::Container,
    dependency::{Dependency, SetterCall},
    errors::{ArgumentError, ConfigError, ResolveError},
    normalize::{normalize, ArgKey, RawArguments},
    reflection::{Arguments, ClassDefinition, ClassRegistry, Reflection},
    types::{DynError, Injectable, Instance, TypeInfo, Value, REFERENCE_SIGIL},
};

pub mod builder;
pub mod configuration;
pub mod container;
pub mod dependency;
pub mod dependency_graph;
pub mod errors;
pub mod normalize;
pub mod reflection;
pub mod types;
