//! Reverse-dependency graph over the package inventory
//!
//! ## Graph Structure
//!
//! - **Directed Graph**: `A → B` means "A imports B"
//! - **Nodes**: one [`PackageNode`] per inventoried package, in inventory order
//! - **Dependants**: incoming edges of a node
//! - **Index**: package path → node index
//!
//! Node weights carry the per-run `retest`/`redeploy` flags, so a graph lives
//! for exactly one evaluation.

use crate::core::error::{BevalResult, GraphError};
use crate::inventory::PackageInfo;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// A package node and its evaluation flags.
#[derive(Debug, Clone)]
pub struct PackageNode {
  pub info: PackageInfo,
  pub retest: bool,
  pub redeploy: bool,
}

impl PackageNode {
  pub fn path(&self) -> &str {
    &self.info.path
  }
}

/// Package dependency graph.
pub struct DependencyGraph {
  /// Edges point from a package to the packages it imports
  graph: DiGraph<PackageNode, ()>,

  /// Index: package path → node index
  path_to_node: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
  /// Allocate one node per package, preserving order. Edges are added by [`build`](Self::build).
  pub fn new(packages: &[PackageInfo]) -> Self {
    let mut graph = DiGraph::with_capacity(packages.len(), 0);
    let mut path_to_node = HashMap::with_capacity(packages.len());

    for package in packages {
      let node_idx = graph.add_node(PackageNode {
        info: package.clone(),
        retest: false,
        redeploy: false,
      });
      path_to_node.insert(package.path.clone(), node_idx);
    }

    Self { graph, path_to_node }
  }

  /// Resolve every declared dependency into an edge.
  ///
  /// Fails on the first dependency that names no package. Calling it again
  /// adds nothing: an edge between two packages exists at most once.
  pub fn build(&mut self) -> BevalResult<()> {
    let mut edges = Vec::new();

    for node_idx in self.graph.node_indices() {
      let node = &self.graph[node_idx];
      for dependency in &node.info.dependencies {
        let dependency_idx = self
          .path_to_node
          .get(dependency)
          .copied()
          .ok_or_else(|| GraphError::UnresolvedDependency {
            dependency: dependency.clone(),
            dependant: node.info.path.clone(),
          })?;
        edges.push((node_idx, dependency_idx));
      }
    }

    for (dependant, dependency) in edges {
      self.graph.update_edge(dependant, dependency, ());
    }

    tracing::debug!(
      packages = self.graph.node_count(),
      edges = self.graph.edge_count(),
      "dependency graph built"
    );
    Ok(())
  }

  /// All nodes, in inventory order.
  pub fn nodes(&self) -> impl Iterator<Item = &PackageNode> {
    self.graph.node_weights()
  }

  pub(crate) fn find(&self, path: &str) -> Option<NodeIndex> {
    self.path_to_node.get(path).copied()
  }

  pub(crate) fn dependant_indices(&self, node_idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
    self.graph.neighbors_directed(node_idx, Direction::Incoming)
  }

  pub(crate) fn node_mut(&mut self, node_idx: NodeIndex) -> &mut PackageNode {
    &mut self.graph[node_idx]
  }

  pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = &mut PackageNode> {
    self.graph.node_weights_mut()
  }
}

/// Inspection accessors for tests
#[cfg(test)]
impl DependencyGraph {
  pub fn len(&self) -> usize {
    self.graph.node_count()
  }

  pub fn is_empty(&self) -> bool {
    self.graph.node_count() == 0
  }

  /// Look up a node by package path.
  pub fn node(&self, path: &str) -> Option<&PackageNode> {
    self.find(path).map(|idx| &self.graph[idx])
  }

  /// Direct dependants of a package (packages importing it), in inventory order.
  pub fn dependants(&self, path: &str) -> Vec<&str> {
    let Some(node_idx) = self.find(path) else {
      return Vec::new();
    };

    let mut dependants: Vec<NodeIndex> = self.dependant_indices(node_idx).collect();
    dependants.sort();
    dependants.into_iter().map(|idx| self.graph[idx].path()).collect()
  }
}
