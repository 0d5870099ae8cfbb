use crate::{
    dependency::Dependency, errors::ConfigError, normalize::RawArguments, reflection::Reflection,
};

/// Collects the recipe of a [Dependency] before it is validated
///
/// # Example
/// ```rust
/// use rewire_di::{Dependency, RawArguments};
/// # use rewire_di::reflection::{ClassDefinition, ClassRegistry};
/// # #[derive(Default)] struct Engine;
/// # let registry = ClassRegistry::new().register(ClassDefinition::<Engine>::with_default("Engine"));
///
/// let engine = Dependency::builder("Engine")
///     .constructor_args(RawArguments::positional([]))
///     .build(&registry)
///     .unwrap();
/// assert_eq!(engine.class_name(), "Engine");
/// ```
#[derive(Debug, Clone)]
pub struct DependencyBuilder {
    pub(crate) class_name: String,
    pub(crate) singleton: bool,
    pub(crate) constructor_args: RawArguments,
    pub(crate) setter_calls: Vec<(String, RawArguments)>,
    pub(crate) factory_method: Option<String>,
    pub(crate) factory_method_args: RawArguments,
    pub(crate) factory_class_name: Option<String>,
}

impl DependencyBuilder {
    pub fn new(class_name: impl Into<String>) -> Self {
        DependencyBuilder {
            class_name: class_name.into(),
            singleton: true,
            constructor_args: RawArguments::new(),
            setter_calls: Vec::new(),
            factory_method: None,
            factory_method_args: RawArguments::new(),
            factory_class_name: None,
        }
    }
}

impl DependencyBuilder {
    /// Stored on the dependency only - every dependency is resolved as a singleton
    pub fn singleton(mut self, singleton: bool) -> Self {
        self.singleton = singleton;
        self
    }

    pub fn constructor_args(mut self, args: impl Into<RawArguments>) -> Self {
        self.constructor_args = args.into();
        self
    }

    /// Adds a setter call, setters run in the order they are added
    pub fn setter(mut self, method: impl Into<String>, args: impl Into<RawArguments>) -> Self {
        self.setter_calls.push((method.into(), args.into()));
        self
    }

    pub fn factory_method(mut self, method: impl Into<String>) -> Self {
        self.factory_method = Some(method.into());
        self
    }

    pub fn factory_method_args(mut self, args: impl Into<RawArguments>) -> Self {
        self.factory_method_args = args.into();
        self
    }

    /// Class holding the factory method, defaults to the dependency's own class
    pub fn factory_class(mut self, class_name: impl Into<String>) -> Self {
        self.factory_class_name = Some(class_name.into());
        self
    }

    pub fn build(self, reflection: &dyn Reflection) -> Result<Dependency, ConfigError> {
        Dependency::new(reflection, self)
    }
}
