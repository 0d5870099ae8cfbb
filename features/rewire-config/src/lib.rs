//! Rewire Config reads container configuration from JSON documents.
//!
//! Rewire Config is split into two parts:
//! 1. ArrayLoader: a [rewire_di::ConfigurationLoader] over a nested key-value document
//! 2. config: conversion of document values and argument lists into container values
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use rewire_config::ArrayLoader;
//! use rewire_di::{ClassDefinition, ClassRegistry, Container};
//!
//! struct Greeter {
//!     greeting: String,
//! }
//!
//! let registry = ClassRegistry::new().register(
//!     ClassDefinition::<Greeter>::new("Greeter")
//!         .constructor(&["greeting"], |args| Ok(Greeter { greeting: args.string(0)? })),
//! );
//!
//! let loader = ArrayLoader::from_json_str(
//!     r#"{"dependencies": {"greeter": {"class": "Greeter", "constructorInjection": {"greeting": "Hello"}}}}"#,
//!     Arc::new(registry),
//! )
//! .unwrap();
//!
//! let mut container = Container::new(&loader).unwrap();
//! let greeter = container.get_as::<Greeter>("greeter").unwrap();
//! assert_eq!(greeter.greeting, "Hello");
//! ```

pub use crate::{errors::LoadError, loader::ArrayLoader};

pub mod config;
pub mod errors;
pub mod loader;
