use std::sync::Arc;

use thiserror::Error;

use crate::types::DynError;

/// Errors while building dependencies from configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The class is not known to the reflection registry
    #[error("Could not locate class with name: '{0}'")]
    ClassNotFound(String),
    /// A setter or factory method does not exist on its class
    #[error("Could not find method: {class}::{method}")]
    MethodNotFound { class: String, method: String },
    /// A factory class could not be located
    #[error("Could not locate class: '{0}'")]
    InvalidArgument(String),
    /// The loader input is malformed
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Errors when resolving a dependency through the container
#[derive(Error, Debug, Clone)]
pub enum ResolveError {
    /// No dependency with that name is configured
    #[error("Could not locate dependency with name: '{0}'")]
    DependencyNotFound(String),
    /// The class is already being constructed further up the stack
    #[error("Cannot instantiate '{class}', circular dependency through {chain:?} - Consider switching to setter injection")]
    CircularDependency { class: String, chain: Vec<String> },
    /// A constructor, factory method or setter returned an error
    #[error("Calling {class}::{method} failed - error: {error}")]
    InvocationFailed {
        class: String,
        method: String,
        error: Arc<DynError>,
    },
    #[error("Failed to downcast, required: '{required_type}' actual: '{actual_type}'")]
    DowncastFailed {
        required_type: &'static str,
        actual_type: &'static str,
    },
}

/// Errors raised while reading positional arguments inside a registered callable
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("Missing argument #{index}")]
    Missing { index: usize },
    #[error("Too few arguments, {expected} expected but {given} given")]
    TooFew { expected: usize, given: usize },
    #[error("Argument #{index} must be {expected}, got {actual}")]
    Mismatch {
        index: usize,
        expected: &'static str,
        actual: &'static str,
    },
}
