use std::{any::type_name, collections::HashMap, fmt::Debug, sync::Arc};

use crate::{
    configuration::{Configuration, ConfigurationLoader},
    dependency::Dependency,
    dependency_graph::{DependencyGraph, DependencyGraphErrors},
    errors::{ConfigError, ResolveError},
    reflection::CONSTRUCTOR,
    types::{DynError, Injectable, Instance, Value},
};

/// Container resolving named dependencies into singleton instances
///
/// Instances are created on first request, cached, and returned as the same
/// object on every later request. Resolution is synchronous and not thread
/// safe by itself, share it behind a lock if needed.
pub struct Container {
    configuration: Arc<Configuration>,
    instances: HashMap<String, Instance>,
    /// Classes currently being constructed - used to detect constructor cycles
    instantiation_stack: Vec<String>,
    /// Names cached during the current top level [Container::get]
    journal: Vec<String>,
}
impl Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_struct("Container");
        for name in self.configuration.names() {
            let val = if self.instances.contains_key(name) {
                "instantiated"
            } else {
                "pending"
            };
            map.field(name, &val);
        }
        map.finish()
    }
}

impl Container {
    /// Pulls the configuration from the loader once
    pub fn new<L: ConfigurationLoader + ?Sized>(loader: &L) -> Result<Self, ConfigError> {
        Ok(Self::from_configuration(loader.configuration()?))
    }

    pub fn from_configuration(configuration: Arc<Configuration>) -> Self {
        tracing::debug!(
            "Creating container with {} dependencies",
            configuration.len()
        );
        Container {
            configuration,
            instances: HashMap::new(),
            instantiation_stack: Vec::new(),
            journal: Vec::new(),
        }
    }

    pub fn configuration(&self) -> &Arc<Configuration> {
        &self.configuration
    }

    /// Whether a dependency with that name is configured
    pub fn has(&self, name: &str) -> bool {
        self.configuration.contains(name)
    }

    /// Whether the dependency was already created
    pub fn is_instantiated(&self, name: &str) -> bool {
        self.instances.contains_key(name)
    }

    /// Checks the configuration for constructor cycles without instantiating anything
    pub fn validate(&self) -> Result<(), DependencyGraphErrors> {
        DependencyGraph::new(&self.configuration).check()
    }

    /// Returns the dependency with the given name, creating it on first request
    ///
    /// A new instance is cached before its setters run, so setters may reference
    /// each other in a cycle. If resolution fails, every instance cached while
    /// serving this request is dropped again.
    pub fn get(&mut self, name: &str) -> Result<Instance, ResolveError> {
        let result = self.resolve(name);
        let journal = std::mem::take(&mut self.journal);

        if result.is_err() {
            for name in journal {
                tracing::debug!("Discarding '{name}' after failed resolution");
                self.instances.remove(&name);
            }
        }

        result
    }

    fn resolve(&mut self, name: &str) -> Result<Instance, ResolveError> {
        let dependency = self
            .configuration
            .dependency(name)
            .cloned()
            .ok_or_else(|| ResolveError::DependencyNotFound(name.to_string()))?;

        if let Some(instance) = self.instances.get(name) {
            return Ok(instance.clone());
        }

        if !dependency.is_singleton() {
            tracing::warn!("Dependency '{name}' is not a singleton, transient scope is not supported");
        }

        let instance = self.instance_for(&dependency)?;
        tracing::debug!("Instantiated '{name}' as {}", instance.info.type_name);
        self.instances.insert(name.to_string(), instance.clone());
        self.journal.push(name.to_string());

        self.call_setters(&dependency, &instance)?;

        Ok(instance)
    }

    /// Attempts to get the dependency as a specific type
    pub fn get_as<T: Injectable>(&mut self, name: &str) -> Result<Arc<T>, ResolveError> {
        self.get(name)?
            .downcast()
            .map_err(|actual_type| ResolveError::DowncastFailed {
                required_type: type_name::<T>(),
                actual_type,
            })
    }

    /// Guards against constructor cycles while instantiating
    fn instance_for(&mut self, dependency: &Dependency) -> Result<Instance, ResolveError> {
        let class = dependency.class_name();
        if let Some(position) = self.instantiation_stack.iter().position(|c| c == class) {
            let mut chain = self.instantiation_stack[position..].to_vec();
            chain.push(class.to_string());

            tracing::error!("Circular dependency found while instantiating '{class}': {chain:?}");
            return Err(ResolveError::CircularDependency {
                class: class.to_string(),
                chain,
            });
        }

        self.instantiation_stack.push(class.to_string());
        let result = self.instantiate(dependency);
        self.instantiation_stack.pop();

        result
    }

    fn instantiate(&mut self, dependency: &Dependency) -> Result<Instance, ResolveError> {
        match dependency.factory_method() {
            Some(method) => {
                let class = dependency
                    .factory_class_name()
                    .unwrap_or(dependency.class_name());
                let args = self.resolve_args(dependency.factory_method_args())?;

                tracing::trace!("Calling factory {class}::{method}");
                self.configuration
                    .reflection()
                    .invoke_static(class, method, args)
                    .map_err(|error| invocation_failed(class, method, error))
            }
            None => {
                let class = dependency.class_name();
                let args = self.resolve_args(dependency.constructor_args())?;

                self.configuration
                    .reflection()
                    .construct(class, args)
                    .map_err(|error| invocation_failed(class, CONSTRUCTOR, error))
            }
        }
    }

    fn call_setters(
        &mut self,
        dependency: &Dependency,
        instance: &Instance,
    ) -> Result<(), ResolveError> {
        let class = dependency.class_name();
        for setter in dependency.setter_calls() {
            let args = self.resolve_args(&setter.args)?;

            tracing::debug!("Calling setter {class}::{}", setter.method);
            self.configuration
                .reflection()
                .invoke(instance, class, &setter.method, args)
                .map_err(|error| invocation_failed(class, &setter.method, error))?;
        }

        Ok(())
    }

    /// Replaces references to configured dependencies with their instances
    fn resolve_args(&mut self, args: &[Value]) -> Result<Vec<Value>, ResolveError> {
        let mut resolved = Vec::with_capacity(args.len());
        for value in args {
            match value.reference_name() {
                Some(name) if self.has(name) => {
                    tracing::trace!("Resolving reference to '{name}'");
                    resolved.push(Value::Instance(self.resolve(name)?));
                }
                _ => resolved.push(value.clone()),
            }
        }

        Ok(resolved)
    }
}

fn invocation_failed(class: &str, method: &str, error: DynError) -> ResolveError {
    ResolveError::InvocationFailed {
        class: class.to_string(),
        method: method.to_string(),
        error: Arc::new(error),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, OnceLock};

    use super::*;
    use crate::{
        builder::DependencyBuilder,
        errors::ArgumentError,
        normalize::RawArguments,
        reflection::{ClassDefinition, ClassRegistry},
    };

    #[derive(Debug, Default)]
    struct A;

    #[derive(Debug)]
    struct B {
        a: Arc<A>,
    }

    #[derive(Debug)]
    struct C {
        b: Arc<B>,
    }

    #[derive(Default)]
    struct D {
        b: OnceLock<Arc<B>>,
        e: OnceLock<Arc<E>>,
    }

    struct E {
        name: String,
    }

    struct Factory;

    struct Echo {
        value: Value,
    }

    struct LoopA {
        _b: Arc<LoopB>,
    }

    struct LoopB {
        _a: Arc<LoopA>,
    }

    #[derive(Default)]
    struct LoopC {
        d: OnceLock<Arc<LoopD>>,
    }

    #[derive(Default)]
    struct LoopD {
        c: OnceLock<Arc<LoopC>>,
    }

    struct Broken;

    fn registry() -> ClassRegistry {
        ClassRegistry::new()
            .register(ClassDefinition::<A>::with_default("A"))
            .register(
                ClassDefinition::<B>::new("B")
                    .constructor(&["a"], |args| Ok(B { a: args.instance(0)? })),
            )
            .register(
                ClassDefinition::<C>::new("C")
                    .constructor(&["b"], |args| Ok(C { b: args.instance(0)? })),
            )
            .register(
                ClassDefinition::<D>::with_default("D")
                    .method("setB", &["b"], |this, args| {
                        let _ = this.b.set(args.instance(0)?);
                        Ok(())
                    })
                    .method("setE", &["e"], |this, args| {
                        let _ = this.e.set(args.instance(0)?);
                        Ok(())
                    }),
            )
            .register(
                ClassDefinition::<E>::new("E")
                    .constructor(&["name"], |args| Ok(E { name: args.string(0)? })),
            )
            .register(ClassDefinition::<Factory>::new("Factory").static_method(
                "getInstanceE",
                &["name"],
                |args| Ok(E { name: args.string(0)? }),
            ))
            .register(
                ClassDefinition::<Echo>::new("Echo").constructor(&["value"], |args| {
                    Ok(Echo {
                        value: args.get(0)?.clone(),
                    })
                }),
            )
            .register(
                ClassDefinition::<LoopA>::new("LoopA")
                    .constructor(&["loopB"], |args| Ok(LoopA { _b: args.instance(0)? })),
            )
            .register(
                ClassDefinition::<LoopB>::new("LoopB")
                    .constructor(&["loopA"], |args| Ok(LoopB { _a: args.instance(0)? })),
            )
            .register(
                ClassDefinition::<LoopC>::with_default("LoopC")
                    .method("setLoopD", &["loopD"], |this, args| {
                        let _ = this.d.set(args.instance(0)?);
                        Ok(())
                    })
                    .method("fail", &[], |_, _| Err("setter exploded".into())),
            )
            .register(ClassDefinition::<LoopD>::with_default("LoopD").method(
                "setLoopC",
                &["loopC"],
                |this, args| {
                    let _ = this.c.set(args.instance(0)?);
                    Ok(())
                },
            ))
            .register(
                ClassDefinition::<Broken>::new("Broken")
                    .constructor(&[], |_| Err("constructor exploded".into())),
            )
    }

    fn container(dependencies: Vec<(&str, DependencyBuilder)>) -> Container {
        let registry = registry();
        let dependencies: Vec<_> = dependencies
            .into_iter()
            .map(|(name, builder)| (name.to_string(), builder.build(&registry).unwrap()))
            .collect();

        Container::from_configuration(Arc::new(Configuration::new(dependencies, Arc::new(registry))))
    }

    fn args(values: &[&str]) -> RawArguments {
        RawArguments::positional(values.iter().map(|value| Value::from(*value)))
    }

    fn fixture() -> Container {
        container(vec![
            ("a", Dependency::builder("A")),
            ("b", Dependency::builder("B").constructor_args(args(&["@a"]))),
            ("c", Dependency::builder("C").constructor_args(args(&["@b"]))),
            (
                "d",
                Dependency::builder("D")
                    .setter("setB", args(&["@b"]))
                    .setter("setE", args(&["@e"])),
            ),
            (
                "e",
                Dependency::builder("E")
                    .factory_class("Factory")
                    .factory_method("getInstanceE")
                    .factory_method_args(RawArguments::new().named("name", "namedE")),
            ),
            ("loopA", Dependency::builder("LoopA").constructor_args(args(&["@loopB"]))),
            ("loopB", Dependency::builder("LoopB").constructor_args(args(&["@loopA"]))),
            ("loopC", Dependency::builder("LoopC").setter("setLoopD", args(&["@loopD"]))),
            ("loopD", Dependency::builder("LoopD").setter("setLoopC", args(&["@loopC"]))),
        ])
    }

    #[test]
    fn it_resolves_constructor_chain() {
        let mut container = fixture();

        let b = container.get_as::<B>("b").unwrap();
        let c = container.get_as::<C>("c").unwrap();

        assert!(Arc::ptr_eq(&c.b, &b));
        assert!(Arc::ptr_eq(&c.b.a, &container.get_as::<A>("a").unwrap()));
        assert!(Arc::ptr_eq(&b, &container.get_as::<B>("b").unwrap()));
    }

    #[test]
    fn it_returns_same_instance() {
        let mut container = fixture();

        let first = container.get("a").unwrap();
        let second = container.get("a").unwrap();

        assert!(first.ptr_eq(&second));
    }

    #[test]
    fn it_reports_configured_names() {
        let mut container = fixture();

        assert!(container.has("a"));
        assert!(container.has("loopA"));
        assert!(!container.has("nonexistent"));

        container.get("c").unwrap();

        assert!(container.has("a"));
        assert!(!container.has("nonexistent"));
        assert!(container.is_instantiated("a"));
        assert!(!container.is_instantiated("d"));
    }

    #[test]
    fn it_fails_for_unknown_dependency() {
        let mut container = fixture();

        let err = container.get("nonexistent").unwrap_err();

        assert!(matches!(err, ResolveError::DependencyNotFound(name) if name == "nonexistent"));
    }

    #[test]
    fn it_injects_setters() {
        let mut container = fixture();

        let d = container.get_as::<D>("d").unwrap();

        assert!(Arc::ptr_eq(d.b.get().unwrap(), &container.get_as::<B>("b").unwrap()));
        assert_eq!(d.e.get().unwrap().name, "namedE");
    }

    #[test]
    fn it_builds_through_factory() {
        let mut container = fixture();

        let e = container.get_as::<E>("e").unwrap();

        assert_eq!(e.name, "namedE");
        assert!(Arc::ptr_eq(&e, &container.get_as::<E>("e").unwrap()));
    }

    #[test]
    fn it_detects_constructor_cycles() {
        let mut container = fixture();

        let err = container.get("loopA").unwrap_err();

        match err {
            ResolveError::CircularDependency { class, chain } => {
                assert_eq!(class, "LoopA");
                assert_eq!(chain, ["LoopA", "LoopB", "LoopA"]);
            }
            err => panic!("Expected CircularDependency, got {err:?}"),
        }
        assert!(container.instantiation_stack.is_empty());
        assert!(!container.is_instantiated("loopA"));
        assert!(!container.is_instantiated("loopB"));
    }

    #[test]
    fn it_resolves_setter_cycles() {
        let mut container = fixture();

        let c = container.get_as::<LoopC>("loopC").unwrap();
        let d = container.get_as::<LoopD>("loopD").unwrap();

        assert!(Arc::ptr_eq(c.d.get().unwrap(), &d));
        assert!(Arc::ptr_eq(d.c.get().unwrap(), &c));
    }

    #[test]
    fn it_passes_unknown_references_through() {
        let mut container = container(vec![(
            "echo",
            Dependency::builder("Echo").constructor_args(args(&["@unknown"])),
        )]);

        let echo = container.get_as::<Echo>("echo").unwrap();

        assert_eq!(echo.value, Value::from("@unknown"));
    }

    #[test]
    fn it_passes_literals_through() {
        let mut container = container(vec![(
            "echo",
            Dependency::builder("Echo").constructor_args(vec![Value::List(vec![Value::from("@echo")])]),
        )]);

        let echo = container.get_as::<Echo>("echo").unwrap();

        assert_eq!(echo.value, Value::List(vec![Value::from("@echo")]));
    }

    #[test]
    fn it_resolves_references_to_instances() {
        let mut container = container(vec![
            ("a", Dependency::builder("A")),
            ("echo", Dependency::builder("Echo").constructor_args(args(&["@a"]))),
        ]);

        let echo = container.get_as::<Echo>("echo").unwrap();
        let a = container.get("a").unwrap();

        assert_eq!(echo.value, Value::Instance(a));
    }

    #[test]
    fn it_detects_cycles_by_class() {
        let mut container = container(vec![
            ("outer", Dependency::builder("Echo").constructor_args(args(&["@inner"]))),
            ("inner", Dependency::builder("Echo").constructor_args(args(&["plain"]))),
        ]);

        let err = container.get("outer").unwrap_err();

        assert!(matches!(err, ResolveError::CircularDependency { .. }));
        assert!(container.get("inner").is_ok());
    }

    #[test]
    fn it_unwinds_stack_after_failure() {
        let mut container = container(vec![
            ("a", Dependency::builder("A")),
            ("broken", Dependency::builder("Broken")),
            ("b", Dependency::builder("B").constructor_args(args(&["@a"]))),
            ("wrapper", Dependency::builder("Echo").constructor_args(args(&["@broken"]))),
        ]);

        let err = container.get("wrapper").unwrap_err();

        match err {
            ResolveError::InvocationFailed { class, method, error } => {
                assert_eq!(class, "Broken");
                assert_eq!(method, CONSTRUCTOR);
                assert_eq!(error.to_string(), "constructor exploded");
            }
            err => panic!("Expected InvocationFailed, got {err:?}"),
        }
        assert!(container.instantiation_stack.is_empty());
        assert!(!container.is_instantiated("wrapper"));
        assert!(container.get("b").is_ok());
    }

    #[test]
    fn it_drops_instance_when_setter_fails() {
        let mut container = container(vec![(
            "d",
            Dependency::builder("D").setter("setB", args(&["not a dependency"])),
        )]);

        let err = container.get("d").unwrap_err();

        match err {
            ResolveError::InvocationFailed { class, method, error } => {
                assert_eq!(class, "D");
                assert_eq!(method, "setB");
                assert_eq!(
                    error.downcast_ref::<ArgumentError>(),
                    Some(&ArgumentError::Mismatch {
                        index: 0,
                        expected: type_name::<B>(),
                        actual: "string",
                    })
                );
            }
            err => panic!("Expected InvocationFailed, got {err:?}"),
        }
        assert!(!container.is_instantiated("d"));
    }

    #[test]
    fn it_discards_every_instance_of_a_failed_setter_cycle() {
        let mut container = container(vec![
            (
                "loopC",
                Dependency::builder("LoopC")
                    .setter("setLoopD", args(&["@loopD"]))
                    .setter("fail", RawArguments::new()),
            ),
            ("loopD", Dependency::builder("LoopD").setter("setLoopC", args(&["@loopC"]))),
            ("a", Dependency::builder("A")),
        ]);
        container.get("a").unwrap();

        let err = container.get("loopC").unwrap_err();

        assert!(matches!(err, ResolveError::InvocationFailed { method, .. } if method == "fail"));
        assert!(!container.is_instantiated("loopC"));
        assert!(!container.is_instantiated("loopD"));
        assert!(container.is_instantiated("a"));

        // loopD would otherwise keep the discarded loopC alive
        assert!(container.get("loopD").is_err());
        assert!(!container.is_instantiated("loopC"));
        assert!(!container.is_instantiated("loopD"));
        assert!(container.journal.is_empty());
    }

    #[test]
    fn it_propagates_setter_arity_errors() {
        let mut container = container(vec![("d", Dependency::builder("D").setter("setB", RawArguments::new()))]);

        let err = container.get("d").unwrap_err();

        assert_eq!(
            err.to_string(),
            "Calling D::setB failed - error: Too few arguments, 1 expected but 0 given"
        );
    }

    #[test]
    fn it_fails_to_downcast_to_wrong_type() {
        let mut container = fixture();

        let err = container.get_as::<C>("a").unwrap_err();

        assert!(matches!(err, ResolveError::DowncastFailed { .. }));
    }

    #[test]
    fn it_treats_transient_as_singleton() {
        let mut container = container(vec![("a", Dependency::builder("A").singleton(false))]);

        let first = container.get("a").unwrap();
        let second = container.get("a").unwrap();

        assert!(first.ptr_eq(&second));
    }

    #[test]
    fn it_validates_without_instantiating() {
        let container = fixture();

        let errors = container.validate().unwrap_err();

        assert_eq!(errors.errors.len(), 1);
        assert!(!container.is_instantiated("loopA"));
    }

    #[test]
    fn it_prints_instantiation_state() {
        let mut container = container(vec![("a", Dependency::builder("A")), ("e", Dependency::builder("E"))]);
        container.get("a").unwrap();

        assert_eq!(
            format!("{container:?}"),
            r#"Container { a: "instantiated", e: "pending" }"#
        );
    }
}
