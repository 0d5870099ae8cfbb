use std::{any::type_name, collections::HashMap, fmt::Debug, marker::PhantomData, sync::Arc};

use crate::{
    errors::{ArgumentError, ConfigError, ResolveError},
    types::{DynError, Injectable, Instance, TypeInfo, Value},
};

/// Name of the constructor as reported in errors
pub const CONSTRUCTOR: &str = "new";

/// Runtime introspection over registered classes
///
/// Given a class name and an optional method name, exposes the declared
/// parameter names and a way to invoke the callable with positional arguments.
pub trait Reflection: Send + Sync {
    fn class_exists(&self, class: &str) -> bool;

    /// Whether the class declares an instance or static method with that name
    fn method_exists(&self, class: &str, method: &str) -> bool;

    /// Parameter names of the constructor, `None` if the class has none
    fn constructor_parameters(&self, class: &str) -> Option<&[String]>;

    /// Parameter names of an instance method, as called for setter injection
    fn method_parameters(&self, class: &str, method: &str) -> Option<&[String]>;

    /// Parameter names of a static method, as called for factories
    fn static_method_parameters(&self, class: &str, method: &str) -> Option<&[String]>;

    /// Creates a new instance of the class
    fn construct(&self, class: &str, args: Vec<Value>) -> Result<Instance, DynError>;

    /// Calls a static method which produces an instance
    fn invoke_static(&self, class: &str, method: &str, args: Vec<Value>)
        -> Result<Instance, DynError>;

    /// Calls an instance method on an existing object
    fn invoke(
        &self,
        instance: &Instance,
        class: &str,
        method: &str,
        args: Vec<Value>,
    ) -> Result<(), DynError>;
}

/// Positional arguments handed to a registered callable
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    values: Vec<Value>,
}

impl Arguments {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn get(&self, index: usize) -> Result<&Value, ArgumentError> {
        self.values.get(index).ok_or(ArgumentError::Missing { index })
    }

    /// Shared pointer to an injected object
    pub fn instance<T: Injectable>(&self, index: usize) -> Result<Arc<T>, ArgumentError> {
        match self.get(index)? {
            Value::Instance(instance) => {
                instance
                    .downcast::<T>()
                    .map_err(|actual| ArgumentError::Mismatch {
                        index,
                        expected: type_name::<T>(),
                        actual,
                    })
            }
            other => Err(ArgumentError::Mismatch {
                index,
                expected: type_name::<T>(),
                actual: other.kind(),
            }),
        }
    }

    pub fn string(&self, index: usize) -> Result<String, ArgumentError> {
        match self.get(index)? {
            Value::String(value) => Ok(value.clone()),
            other => Err(mismatch(index, "string", other)),
        }
    }

    pub fn int(&self, index: usize) -> Result<i64, ArgumentError> {
        match self.get(index)? {
            Value::Int(value) => Ok(*value),
            other => Err(mismatch(index, "int", other)),
        }
    }

    pub fn float(&self, index: usize) -> Result<f64, ArgumentError> {
        match self.get(index)? {
            Value::Float(value) => Ok(*value),
            Value::Int(value) => Ok(*value as f64),
            other => Err(mismatch(index, "float", other)),
        }
    }

    pub fn bool(&self, index: usize) -> Result<bool, ArgumentError> {
        match self.get(index)? {
            Value::Bool(value) => Ok(*value),
            other => Err(mismatch(index, "bool", other)),
        }
    }
}

fn mismatch(index: usize, expected: &'static str, actual: &Value) -> ArgumentError {
    ArgumentError::Mismatch {
        index,
        expected,
        actual: actual.kind(),
    }
}

type ConstructFn = Arc<dyn Fn(&Arguments) -> Result<Instance, DynError> + Send + Sync>;
type MethodFn = Arc<dyn Fn(&Instance, &Arguments) -> Result<(), DynError> + Send + Sync>;

/// A registered callable and its declared parameter names
#[derive(Clone)]
struct Callable<F> {
    parameters: Vec<String>,
    call: F,
}

impl<F> Callable<F> {
    fn new(parameters: &[&str], call: F) -> Self {
        Self {
            parameters: parameters.iter().map(|p| p.to_string()).collect(),
            call,
        }
    }

    /// Too many arguments are ignored, too few are an error
    fn check_arity(&self, args: &Arguments) -> Result<(), ArgumentError> {
        if args.len() < self.parameters.len() {
            return Err(ArgumentError::TooFew {
                expected: self.parameters.len(),
                given: args.len(),
            });
        }
        Ok(())
    }
}

/// Describes a class `T` - its constructor, setters and static factory methods
///
/// # Example
/// ```rust
/// use rewire_di::reflection::{ClassDefinition, ClassRegistry};
///
/// struct Greeter {
///     greeting: String,
/// }
///
/// let registry = ClassRegistry::new().register(
///     ClassDefinition::<Greeter>::new("Greeter")
///         .constructor(&["greeting"], |args| Ok(Greeter { greeting: args.string(0)? })),
/// );
/// ```
pub struct ClassDefinition<T> {
    class: RegisteredClass,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Injectable> ClassDefinition<T> {
    pub fn new(name: impl Into<String>) -> Self {
        ClassDefinition {
            class: RegisteredClass {
                name: name.into(),
                info: TypeInfo::of::<T>(),
                constructor: None,
                methods: HashMap::new(),
                static_methods: HashMap::new(),
            },
            _marker: PhantomData,
        }
    }

    pub fn constructor<F>(mut self, parameters: &[&str], constructor: F) -> Self
    where
        F: Fn(&Arguments) -> Result<T, DynError> + Send + Sync + 'static,
    {
        let call: ConstructFn =
            Arc::new(move |args: &Arguments| constructor(args).map(Instance::new));
        self.class.constructor = Some(Callable::new(parameters, call));
        self
    }

    /// Registers an instance method, usually a setter
    ///
    /// Objects are shared once constructed, so setters mutate through interior mutability.
    pub fn method<F>(mut self, name: impl Into<String>, parameters: &[&str], method: F) -> Self
    where
        F: Fn(&T, &Arguments) -> Result<(), DynError> + Send + Sync + 'static,
    {
        let call: MethodFn = Arc::new(move |instance: &Instance, args: &Arguments| {
            let this = instance
                .downcast_ref::<T>()
                .ok_or_else(|| ResolveError::DowncastFailed {
                    required_type: type_name::<T>(),
                    actual_type: instance.info.type_name,
                })?;
            method(this, args)
        });
        self.class
            .methods
            .insert(name.into(), Callable::new(parameters, call));
        self
    }

    /// Registers a static method producing an instance of any type
    pub fn static_method<R, F>(
        mut self,
        name: impl Into<String>,
        parameters: &[&str],
        method: F,
    ) -> Self
    where
        R: Injectable,
        F: Fn(&Arguments) -> Result<R, DynError> + Send + Sync + 'static,
    {
        let call: ConstructFn = Arc::new(move |args: &Arguments| method(args).map(Instance::new));
        self.class
            .static_methods
            .insert(name.into(), Callable::new(parameters, call));
        self
    }
}

impl<T: Injectable + Default> ClassDefinition<T> {
    /// A class whose constructor takes no arguments
    pub fn with_default(name: impl Into<String>) -> Self {
        Self::new(name).constructor(&[], |_| Ok(T::default()))
    }
}

/// Type erased [ClassDefinition]
struct RegisteredClass {
    name: String,
    info: TypeInfo,
    constructor: Option<Callable<ConstructFn>>,
    methods: HashMap<String, Callable<MethodFn>>,
    static_methods: HashMap<String, Callable<ConstructFn>>,
}

impl RegisteredClass {
    fn method_parameters(&self, method: &str) -> Option<&[String]> {
        self.methods
            .get(method)
            .map(|callable| callable.parameters.as_slice())
    }

    fn static_method_parameters(&self, method: &str) -> Option<&[String]> {
        self.static_methods
            .get(method)
            .map(|callable| callable.parameters.as_slice())
    }
}

/// Registry of all classes the container is able to build
#[derive(Default)]
pub struct ClassRegistry {
    classes: HashMap<String, RegisteredClass>,
}
impl Debug for ClassRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for class in self.classes.values() {
            map.entry(&class.name, &class.info.type_name);
        }
        map.finish()
    }
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a class, replacing any previous class with the same name
    pub fn register<T: Injectable>(mut self, definition: ClassDefinition<T>) -> Self {
        let class = definition.class;
        if let Some(previous) = self.classes.insert(class.name.clone(), class) {
            tracing::warn!(
                "Class '{}' was registered twice, replacing {}",
                previous.name,
                previous.info.type_name
            );
        }
        self
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Type information of the Rust type behind a class name
    pub fn type_info(&self, class: &str) -> Option<TypeInfo> {
        self.classes.get(class).map(|class| class.info)
    }

    fn class(&self, class: &str) -> Result<&RegisteredClass, ConfigError> {
        self.classes
            .get(class)
            .ok_or_else(|| ConfigError::ClassNotFound(class.to_string()))
    }
}

fn method_not_found(class: &str, method: &str) -> ConfigError {
    ConfigError::MethodNotFound {
        class: class.to_string(),
        method: method.to_string(),
    }
}

impl Reflection for ClassRegistry {
    fn class_exists(&self, class: &str) -> bool {
        self.classes.contains_key(class)
    }

    fn method_exists(&self, class: &str, method: &str) -> bool {
        self.classes
            .get(class)
            .is_some_and(|class| {
                class.methods.contains_key(method) || class.static_methods.contains_key(method)
            })
    }

    fn constructor_parameters(&self, class: &str) -> Option<&[String]> {
        self.classes
            .get(class)?
            .constructor
            .as_ref()
            .map(|callable| callable.parameters.as_slice())
    }

    fn method_parameters(&self, class: &str, method: &str) -> Option<&[String]> {
        self.classes.get(class)?.method_parameters(method)
    }

    fn static_method_parameters(&self, class: &str, method: &str) -> Option<&[String]> {
        self.classes.get(class)?.static_method_parameters(method)
    }

    fn construct(&self, class: &str, args: Vec<Value>) -> Result<Instance, DynError> {
        let registered = self.class(class)?;
        let constructor = registered
            .constructor
            .as_ref()
            .ok_or_else(|| method_not_found(class, CONSTRUCTOR))?;

        let args = Arguments::new(args);
        constructor.check_arity(&args)?;
        (constructor.call)(&args)
    }

    fn invoke_static(
        &self,
        class: &str,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Instance, DynError> {
        let callable = self
            .class(class)?
            .static_methods
            .get(method)
            .ok_or_else(|| method_not_found(class, method))?;

        let args = Arguments::new(args);
        callable.check_arity(&args)?;
        (callable.call)(&args)
    }

    fn invoke(
        &self,
        instance: &Instance,
        class: &str,
        method: &str,
        args: Vec<Value>,
    ) -> Result<(), DynError> {
        let callable = self
            .class(class)?
            .methods
            .get(method)
            .ok_or_else(|| method_not_found(class, method))?;

        let args = Arguments::new(args);
        callable.check_arity(&args)?;
        (callable.call)(instance, &args)
    }
}
