use crate::{
    builder::DependencyBuilder,
    errors::ConfigError,
    normalize::normalize,
    reflection::Reflection,
    types::Value,
};

/// A setter invoked right after the dependency was constructed
#[derive(Debug, Clone, PartialEq)]
pub struct SetterCall {
    pub method: String,
    pub args: Vec<Value>,
}

/// Recipe for instantiating one named dependency
///
/// Built and validated once through [DependencyBuilder], read-only afterwards.
/// Exactly one instantiation path is used - the factory method if one is set,
/// the class constructor otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct Dependency {
    class_name: String,
    singleton: bool,
    constructor_args: Vec<Value>,
    setter_calls: Vec<SetterCall>,
    factory_class_name: Option<String>,
    factory_method: Option<String>,
    factory_method_args: Vec<Value>,
}

impl Dependency {
    pub fn builder(class_name: impl Into<String>) -> DependencyBuilder {
        DependencyBuilder::new(class_name)
    }

    /// Validates the recipe against `reflection` and normalizes all argument lists
    pub(crate) fn new(
        reflection: &dyn Reflection,
        builder: DependencyBuilder,
    ) -> Result<Self, ConfigError> {
        let DependencyBuilder {
            class_name,
            singleton,
            constructor_args,
            setter_calls,
            factory_method,
            factory_method_args,
            factory_class_name,
        } = builder;

        if !reflection.class_exists(&class_name) {
            return Err(ConfigError::ClassNotFound(class_name));
        }

        let constructor_args = normalize(reflection.constructor_parameters(&class_name), constructor_args);

        let setter_calls = setter_calls
            .into_iter()
            .map(|(method, args)| -> Result<SetterCall, ConfigError> {
                let parameters = reflection
                    .method_parameters(&class_name, &method)
                    .ok_or_else(|| ConfigError::MethodNotFound {
                        class: class_name.clone(),
                        method: method.clone(),
                    })?;
                let args = normalize(Some(parameters), args);
                Ok(SetterCall { method, args })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let (factory_class_name, factory_method_args) = match &factory_method {
            Some(method) => {
                let factory_class = factory_class_name.unwrap_or_else(|| class_name.clone());
                if !reflection.class_exists(&factory_class) {
                    return Err(ConfigError::InvalidArgument(factory_class));
                }

                let parameters = reflection
                    .static_method_parameters(&factory_class, method)
                    .ok_or_else(|| ConfigError::MethodNotFound {
                        class: factory_class.clone(),
                        method: method.clone(),
                    })?;
                let args = normalize(Some(parameters), factory_method_args);
                (Some(factory_class), args)
            }
            None => (None, Vec::new()),
        };

        tracing::trace!("Validated dependency of class '{class_name}'");

        Ok(Dependency {
            class_name,
            singleton,
            constructor_args,
            setter_calls,
            factory_class_name,
            factory_method,
            factory_method_args,
        })
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Always honoured as singleton, transient scope is not supported
    pub fn is_singleton(&self) -> bool {
        self.singleton
    }

    pub fn constructor_args(&self) -> &[Value] {
        &self.constructor_args
    }

    pub fn setter_calls(&self) -> &[SetterCall] {
        &self.setter_calls
    }

    pub fn factory_class_name(&self) -> Option<&str> {
        self.factory_class_name.as_deref()
    }

    pub fn factory_method(&self) -> Option<&str> {
        self.factory_method.as_deref()
    }

    pub fn factory_method_args(&self) -> &[Value] {
        &self.factory_method_args
    }

    pub fn has_factory(&self) -> bool {
        self.factory_method.is_some()
    }

    /// Arguments of whichever path instantiates this dependency
    pub fn instantiation_args(&self) -> &[Value] {
        if self.has_factory() {
            &self.factory_method_args
        } else {
            &self.constructor_args
        }
    }
}
