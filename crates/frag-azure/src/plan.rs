//! Deployment plan: module graph resolved into apply order

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

use frag_core::{Error, Result};

use crate::modules::{ModuleKind, ModuleSpec};

/// Modules in the order they are applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentPlan {
    order: Vec<ModuleKind>,
}

impl DeploymentPlan {
    /// Resolve a module graph into a topological order
    ///
    /// Modules become ready once all their dependencies are placed; among ready
    /// modules the one declared first goes next, so the order is deterministic.
    pub fn resolve(specs: &[ModuleSpec]) -> Result<Self> {
        let mut position: HashMap<ModuleKind, usize> = HashMap::new();
        for (i, spec) in specs.iter().enumerate() {
            if position.insert(spec.kind, i).is_some() {
                return Err(Error::Configuration(format!(
                    "Module {} is declared more than once",
                    spec.kind
                )));
            }
        }

        let mut indegree = vec![0usize; specs.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); specs.len()];
        for (i, spec) in specs.iter().enumerate() {
            let mut seen = HashSet::new();
            for dep in &spec.depends_on {
                let &d = position.get(dep).ok_or_else(|| {
                    Error::Configuration(format!(
                        "Module {} depends on undeclared module {}",
                        spec.kind, dep
                    ))
                })?;
                if seen.insert(d) {
                    indegree[i] += 1;
                    dependents[d].push(i);
                }
            }
        }

        let mut placed = vec![false; specs.len()];
        let mut order = Vec::with_capacity(specs.len());
        while order.len() < specs.len() {
            let next = (0..specs.len()).find(|&i| !placed[i] && indegree[i] == 0);
            let Some(i) = next else {
                let stuck: Vec<String> = specs
                    .iter()
                    .zip(&placed)
                    .filter(|(_, placed)| !**placed)
                    .map(|(spec, _)| spec.kind.to_string())
                    .collect();
                return Err(Error::Configuration(format!(
                    "Dependency cycle among modules: {}",
                    stuck.join(", ")
                )));
            };

            placed[i] = true;
            order.push(specs[i].kind);
            for &dependent in &dependents[i] {
                indegree[dependent] -= 1;
            }
        }

        Ok(Self { order })
    }

    /// The standard eight-module graph
    pub fn standard() -> Result<Self> {
        let specs: Vec<ModuleSpec> = ModuleKind::ALL.iter().map(|k| k.spec()).collect();
        Self::resolve(&specs)
    }

    pub fn modules(&self) -> &[ModuleKind] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl fmt::Display for DeploymentPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, kind) in self.order.iter().enumerate() {
            let deps: Vec<&str> = kind.depends_on().iter().map(|d| d.name()).collect();
            if deps.is_empty() {
                writeln!(f, "{}. {}", i + 1, kind)?;
            } else {
                writeln!(f, "{}. {} (after {})", i + 1, kind, deps.join(", "))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ModuleKind::*;

    fn spec(kind: ModuleKind, deps: &[ModuleKind]) -> ModuleSpec {
        ModuleSpec {
            kind,
            depends_on: deps.to_vec(),
        }
    }

    #[test]
    fn test_standard_plan_respects_dependencies() {
        let plan = DeploymentPlan::standard().unwrap();
        assert_eq!(plan.len(), 8);
        let index = |k: ModuleKind| plan.modules().iter().position(|m| *m == k).unwrap();
        for kind in ModuleKind::ALL {
            for dep in kind.depends_on() {
                assert!(index(*dep) < index(kind), "{} placed before {}", kind, dep);
            }
        }
    }

    #[test]
    fn test_ties_follow_declaration_order() {
        let plan = DeploymentPlan::resolve(&[
            spec(Search, &[]),
            spec(Storage, &[]),
            spec(Monitoring, &[Storage]),
            spec(ResourceGroup, &[]),
        ])
        .unwrap();
        assert_eq!(plan.modules(), &[Search, Storage, Monitoring, ResourceGroup]);
    }

    #[test]
    fn test_resolve_rejects_cycle() {
        let err = DeploymentPlan::resolve(&[
            spec(ResourceGroup, &[]),
            spec(KeyVault, &[Storage]),
            spec(Storage, &[KeyVault]),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("cycle among modules: key-vault, storage"));
    }

    #[test]
    fn test_resolve_rejects_unknown_dependency() {
        let err = DeploymentPlan::resolve(&[spec(Monitoring, &[ResourceGroup])]).unwrap_err();
        assert!(err.to_string().contains("undeclared module resource-group"));
    }

    #[test]
    fn test_resolve_rejects_duplicate() {
        let err = DeploymentPlan::resolve(&[spec(Search, &[]), spec(Search, &[])]).unwrap_err();
        assert!(err.to_string().contains("declared more than once"));
    }

    #[test]
    fn test_duplicate_dependency_edges_count_once() {
        let plan = DeploymentPlan::resolve(&[
            spec(ResourceGroup, &[]),
            spec(Monitoring, &[ResourceGroup, ResourceGroup]),
        ])
        .unwrap();
        assert_eq!(plan.modules(), &[ResourceGroup, Monitoring]);
    }
}
