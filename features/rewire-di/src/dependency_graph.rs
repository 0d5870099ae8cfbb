use std::collections::{BTreeMap, HashSet};

use thiserror::Error;

use crate::{configuration::Configuration, types::Value};

/// Graph of all references between configured dependencies
///
/// Used to find constructor cycles before anything is instantiated and
/// enables visualization of the wiring.
pub struct DependencyGraph {
    map: BTreeMap<String, DependencyGraphEntry>,
}
impl DependencyGraph {
    pub fn new(configuration: &Configuration) -> Self {
        let map = configuration
            .dependencies()
            .iter()
            .map(|(name, dependency)| {
                let eager = references(configuration, dependency.instantiation_args());
                let deferred = dependency
                    .setter_calls()
                    .iter()
                    .flat_map(|setter| references(configuration, &setter.args))
                    .collect();

                let entry = DependencyGraphEntry {
                    name: name.clone(),
                    class: dependency.class_name().to_string(),
                    eager,
                    deferred,
                };
                (name.clone(), entry)
            })
            .collect();

        Self { map }
    }

    /// Dependencies referenced by the constructor or factory arguments
    pub fn eager_references(&self, name: &str) -> Option<&[String]> {
        self.map.get(name).map(|entry| entry.eager.as_slice())
    }

    /// Dependencies referenced by setter arguments
    pub fn deferred_references(&self, name: &str) -> Option<&[String]> {
        self.map.get(name).map(|entry| entry.deferred.as_slice())
    }

    /// Validate the graph
    ///
    /// Returns a list of all issues
    pub fn check(&self) -> Result<(), DependencyGraphErrors> {
        let mut checked = HashSet::new();
        let mut errors = Vec::new();
        for entry in self.map.values() {
            // Roots reached from an earlier root were already walked
            if checked.contains(entry.name.as_str()) {
                continue;
            }

            let mut dependency_chain = Vec::new();
            check_recurse(
                self,
                &mut checked,
                &mut errors,
                &mut dependency_chain,
                entry,
            );
        }

        if !errors.is_empty() {
            return Err(DependencyGraphErrors { errors });
        }

        return Ok(());

        fn check_recurse<'a>(
            graph: &'a DependencyGraph,
            checked: &mut HashSet<&'a str>,
            errors: &mut Vec<DependencyGraphError>,
            dependency_chain: &mut Vec<&'a DependencyGraphEntry>,
            entry: &'a DependencyGraphEntry,
        ) {
            // Instantiation is guarded per class, so a class may appear only once in a chain
            if dependency_chain.iter().any(|link| link.class == entry.class) {
                let mut chain: Vec<String> =
                    dependency_chain.iter().map(|link| link.name.clone()).collect();
                chain.push(entry.name.clone());

                errors.push(DependencyGraphError::CircularDependency {
                    from: chain[0].clone(),
                    to: entry.name.clone(),
                    chain,
                });
                return;
            }

            // Nodes are walked again under every chain, the classes above them differ.
            // The walk ends since the chain holds each class at most once.
            checked.insert(entry.name.as_str());
            dependency_chain.push(entry);

            // Setter references are resolved after construction and never recursed into
            for reference in &entry.eager {
                if let Some(next_entry) = graph.map.get(reference) {
                    check_recurse(graph, checked, errors, dependency_chain, next_entry);
                }
            }

            dependency_chain.pop();
        }
    }
}

/// Names of configured dependencies referenced by an argument list
fn references(configuration: &Configuration, args: &[Value]) -> Vec<String> {
    args.iter()
        .filter_map(Value::reference_name)
        .filter(|name| configuration.contains(name))
        .map(str::to_string)
        .collect()
}

struct DependencyGraphEntry {
    name: String,
    class: String,
    eager: Vec<String>,
    deferred: Vec<String>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DependencyGraphError {
    #[error("A Circular Dependency exists between '{from}' and '{to}' through {chain:?} - Consider using setter injection")]
    CircularDependency {
        from: String,
        to: String,
        chain: Vec<String>,
    },
}
impl std::fmt::Display for DependencyGraphErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut display = Vec::new();
        display.push("The dependency graph had one or more errors:".to_string());
        for error in &self.errors {
            display.push(format!("- {}", error));
        }
        f.write_str(&display.join("\n"))
    }
}

#[derive(Error, Debug, Clone)]
pub struct DependencyGraphErrors {
    pub errors: Vec<DependencyGraphError>,
}
