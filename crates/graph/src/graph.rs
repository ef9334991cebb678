//! Dependency graph construction and publish leveling.
//!
//! Uses petgraph to hold package nodes and internal dependency edges.
//! Edges point from a dependency to its dependents, so publish order
//! follows edge direction.

use crate::error::{Error, Result};
use crate::package::Package;
use petgraph::Direction;
use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Directed graph of workspace packages and their internal dependencies.
///
/// Construction fails if any edge targets an unknown package or if the
/// edge set contains a cycle, so a successfully built graph is always a
/// DAG. The graph is owned by the orchestrator for exactly one run.
#[derive(Debug)]
pub struct DependencyGraph {
    graph: DiGraph<Package, ()>,
    name_to_node: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Builds a graph from a scanned package set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicatePackage`] if two packages share a name,
    /// [`Error::MissingDependency`] if an internal dependency names a
    /// package outside the set, and [`Error::Cycle`] listing every cycle
    /// if the dependency edges are not acyclic.
    pub fn build(packages: Vec<Package>) -> Result<Self> {
        let mut graph = DiGraph::new();
        let mut name_to_node = HashMap::new();

        for package in packages {
            let name = package.name.clone();
            let node = graph.add_node(package);
            if name_to_node.insert(name.clone(), node).is_some() {
                return Err(Error::DuplicatePackage { name });
            }
            debug!(package = %name, "Added package node");
        }

        // Edges from dependency to dependent.
        let mut edges = Vec::new();
        for node in graph.node_indices() {
            let package = &graph[node];
            for dep in &package.internal_deps {
                match name_to_node.get(dep) {
                    Some(&dep_node) => edges.push((dep_node, node)),
                    None => {
                        return Err(Error::MissingDependency {
                            package: package.name.clone(),
                            dependency: dep.clone(),
                        });
                    }
                }
            }
        }
        for (from, to) in edges {
            graph.add_edge(from, to, ());
        }

        let built = Self {
            graph,
            name_to_node,
        };

        let cycles = built.detect_cycles();
        if !cycles.is_empty() {
            return Err(Error::Cycle { cycles });
        }

        Ok(built)
    }

    /// Returns every dependency cycle in the graph.
    ///
    /// Each cycle is reported as a sorted list of the package names on it.
    /// An acyclic graph returns an empty list.
    #[must_use]
    pub fn detect_cycles(&self) -> Vec<Vec<String>> {
        let mut cycles: Vec<Vec<String>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| {
                scc.len() > 1
                    || scc
                        .first()
                        .is_some_and(|&n| self.graph.find_edge(n, n).is_some())
            })
            .map(|scc| {
                let mut names: Vec<String> =
                    scc.iter().map(|&n| self.graph[n].name.clone()).collect();
                names.sort();
                names
            })
            .collect();
        cycles.sort();
        cycles
    }

    /// Produces the ordered publish levels.
    ///
    /// Level *i* contains every package whose internal dependencies all lie
    /// in levels `< i`; levels are maximal (each package lands in the
    /// earliest level its dependencies allow) and packages within a level
    /// are sorted by name for determinism.
    #[must_use]
    pub fn levels(&self) -> Vec<Vec<&Package>> {
        // Safe: build() rejects cyclic graphs.
        let Ok(sorted) = toposort(&self.graph, None) else {
            return Vec::new();
        };

        let mut level_of: HashMap<NodeIndex, usize> = HashMap::new();
        let mut levels: Vec<Vec<&Package>> = Vec::new();

        for node in sorted {
            let level = self
                .graph
                .neighbors_directed(node, Direction::Incoming)
                .map(|dep| level_of[&dep] + 1)
                .max()
                .unwrap_or(0);

            if level >= levels.len() {
                levels.resize_with(level + 1, Vec::new);
            }
            levels[level].push(&self.graph[node]);
            level_of.insert(node, level);
        }

        for level in &mut levels {
            level.sort_by(|a, b| a.name.cmp(&b.name));
        }
        levels
    }

    /// Returns the names of every package that transitively depends on
    /// `name`. Used to propagate a publish failure to blocked dependents.
    #[must_use]
    pub fn dependents_of(&self, name: &str) -> HashSet<String> {
        let mut dependents = HashSet::new();
        let Some(&start) = self.name_to_node.get(name) else {
            return dependents;
        };

        let mut frontier = vec![start];
        while let Some(node) = frontier.pop() {
            for dependent in self.graph.neighbors_directed(node, Direction::Outgoing) {
                if dependents.insert(self.graph[dependent].name.clone()) {
                    frontier.push(dependent);
                }
            }
        }
        dependents
    }

    /// Looks up a package by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Package> {
        self.name_to_node.get(name).map(|&n| &self.graph[n])
    }

    /// Number of packages in the graph.
    #[must_use]
    pub fn package_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Iterates over all packages in name order.
    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        let mut names: Vec<&String> = self.name_to_node.keys().collect();
        names.sort();
        names.into_iter().map(|name| &self.graph[self.name_to_node[name]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkg(name: &str, deps: &[&str]) -> Package {
        Package::new(name, "1.0.0", format!("crates/{name}")).with_deps(deps.iter().copied())
    }

    #[test]
    fn test_build_empty() {
        let graph = DependencyGraph::build(vec![]).unwrap();
        assert_eq!(graph.package_count(), 0);
        assert!(graph.levels().is_empty());
    }

    #[test]
    fn test_build_chain_levels() {
        let graph = DependencyGraph::build(vec![
            pkg("app", &["lib"]),
            pkg("lib", &["core"]),
            pkg("core", &[]),
        ])
        .unwrap();

        let levels = graph.levels();
        assert_eq!(levels.len(), 3);
        assert_eq!(levels[0][0].name, "core");
        assert_eq!(levels[1][0].name, "lib");
        assert_eq!(levels[2][0].name, "app");
    }

    #[test]
    fn test_levels_are_maximal() {
        // "standalone" has no deps and must land in level 0, not be pushed
        // later by unrelated packages.
        let graph = DependencyGraph::build(vec![
            pkg("core", &[]),
            pkg("lib", &["core"]),
            pkg("standalone", &[]),
        ])
        .unwrap();

        let levels = graph.levels();
        assert_eq!(levels.len(), 2);
        let level0: Vec<&str> = levels[0].iter().map(|p| p.name.as_str()).collect();
        assert_eq!(level0, vec!["core", "standalone"]);
    }

    #[test]
    fn test_levels_sorted_by_name() {
        let graph =
            DependencyGraph::build(vec![pkg("zeta", &[]), pkg("alpha", &[]), pkg("mid", &[])])
                .unwrap();
        let levels = graph.levels();
        let names: Vec<&str> = levels[0].iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_levels_partition_every_package_once() {
        let graph = DependencyGraph::build(vec![
            pkg("a", &[]),
            pkg("b", &["a"]),
            pkg("c", &["a"]),
            pkg("d", &["b", "c"]),
        ])
        .unwrap();

        let levels = graph.levels();
        let all: Vec<&str> = levels
            .iter()
            .flatten()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(all.len(), 4);
        let unique: HashSet<&str> = all.iter().copied().collect();
        assert_eq!(unique.len(), 4);

        // Diamond: [a], [b, c], [d]
        assert_eq!(levels.len(), 3);
        assert_eq!(levels[1].len(), 2);
    }

    #[test]
    fn test_cycle_detected_and_listed() {
        let err = DependencyGraph::build(vec![
            pkg("a", &["c"]),
            pkg("b", &["a"]),
            pkg("c", &["b"]),
        ])
        .unwrap_err();

        match err {
            Error::Cycle { cycles } => {
                assert_eq!(cycles.len(), 1);
                assert_eq!(cycles[0], vec!["a", "b", "c"]);
            }
            other => panic!("expected cycle error, got {other}"),
        }
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let err = DependencyGraph::build(vec![pkg("selfish", &["selfish"])]).unwrap_err();
        match err {
            Error::Cycle { cycles } => assert_eq!(cycles, vec![vec!["selfish".to_string()]]),
            other => panic!("expected cycle error, got {other}"),
        }
    }

    #[test]
    fn test_two_separate_cycles_both_reported() {
        let err = DependencyGraph::build(vec![
            pkg("a", &["b"]),
            pkg("b", &["a"]),
            pkg("x", &["y"]),
            pkg("y", &["x"]),
            pkg("free", &[]),
        ])
        .unwrap_err();

        match err {
            Error::Cycle { cycles } => {
                assert_eq!(cycles.len(), 2);
                assert!(cycles.contains(&vec!["a".to_string(), "b".to_string()]));
                assert!(cycles.contains(&vec!["x".to_string(), "y".to_string()]));
            }
            other => panic!("expected cycle error, got {other}"),
        }
    }

    #[test]
    fn test_missing_dependency() {
        let err = DependencyGraph::build(vec![pkg("app", &["ghost"])]).unwrap_err();
        assert!(matches!(err, Error::MissingDependency { .. }));
    }

    #[test]
    fn test_duplicate_package() {
        let err =
            DependencyGraph::build(vec![pkg("core", &[]), pkg("core", &[])]).unwrap_err();
        assert!(matches!(err, Error::DuplicatePackage { .. }));
    }

    #[test]
    fn test_dependents_of_transitive() {
        let graph = DependencyGraph::build(vec![
            pkg("core", &[]),
            pkg("lib", &["core"]),
            pkg("app", &["lib"]),
            pkg("other", &[]),
        ])
        .unwrap();

        let dependents = graph.dependents_of("core");
        assert_eq!(dependents.len(), 2);
        assert!(dependents.contains("lib"));
        assert!(dependents.contains("app"));
        assert!(!dependents.contains("other"));

        assert!(graph.dependents_of("app").is_empty());
        assert!(graph.dependents_of("unknown").is_empty());
    }

    #[test]
    fn test_get_and_iter() {
        let graph = DependencyGraph::build(vec![pkg("b", &[]), pkg("a", &[])]).unwrap();
        assert_eq!(graph.get("a").map(|p| p.name.as_str()), Some("a"));
        assert!(graph.get("missing").is_none());

        let names: Vec<&str> = graph.packages().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
