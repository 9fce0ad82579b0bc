//! Change evaluation
//!
//! Decides which packages to retest and redeploy for a change list. Each change
//! is classified, in order of precedence, as:
//!
//! 1. a full-scale trigger: everything is retested and redeployed, evaluation stops
//! 2. a retest trigger: every test-bearing package is retested (once per run)
//! 3. a root-level file: ignored, it needs a special case to matter
//! 4. a file in an unknown directory: a source file there is an error unless
//!    deleted, anything else is charged to the nearest ancestor package, or
//!    falls back to full scale when there is none
//! 5. a test file of a known package: retests that package only
//! 6. any other file of a known package: marks the package and all of its
//!    transitive dependants dirty

use super::dependency_graph::{DependencyGraph, PackageNode};
use crate::changes::ChangeInfo;
use crate::core::config::{EvaluationsConfig, compile_patterns};
use crate::core::error::{BevalResult, GraphError, ResultExt};
use crate::inventory::{PackageInfo, is_source_file, is_test_file};
use petgraph::graph::NodeIndex;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;

/// Evaluation policy, with patterns compiled up front
#[derive(Debug, Clone)]
pub struct EvaluationConfig {
  deployments_dir: String,
  retest_triggers: Vec<Regex>,
  full_scale_triggers: Vec<Regex>,
}

impl EvaluationConfig {
  pub fn new<S: AsRef<str>>(deployments_dir: impl Into<String>, retest: &[S], full_scale: &[S]) -> BevalResult<Self> {
    Ok(Self {
      deployments_dir: deployments_dir.into(),
      retest_triggers: compile_patterns("evaluations.special_cases.retest", retest)?,
      full_scale_triggers: compile_patterns("evaluations.special_cases.full_scale", full_scale)?,
    })
  }

  pub fn from_config(config: &EvaluationsConfig) -> BevalResult<Self> {
    Self::new(
      config.deployments_dir.as_str(),
      &config.special_cases.retest,
      &config.special_cases.full_scale,
    )
  }

  fn can_be_deployed(&self, node: &PackageNode) -> bool {
    node.path().starts_with(&self.deployments_dir)
  }

  fn is_full_scale_trigger(&self, path: &str) -> bool {
    self.full_scale_triggers.iter().any(|exp| exp.is_match(path))
  }

  fn is_retest_trigger(&self, path: &str) -> bool {
    self.retest_triggers.iter().any(|exp| exp.is_match(path))
  }
}

/// Packages to retest and redeploy, in inventory order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Evaluation {
  pub retest: Vec<String>,
  pub redeploy: Vec<String>,
}

impl Evaluation {
  pub fn is_empty(&self) -> bool {
    self.retest.is_empty() && self.redeploy.is_empty()
  }
}

/// What a single change asks of the rest of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChangeOutcome {
  Handled,
  RetestAll,
  FullScale,
}

pub struct BuildEvaluator {
  config: EvaluationConfig,
}

impl BuildEvaluator {
  pub fn new(config: EvaluationConfig) -> Self {
    Self { config }
  }

  pub fn evaluate(&self, packages: &[PackageInfo], changes: &[ChangeInfo]) -> BevalResult<Evaluation> {
    if packages.is_empty() || changes.is_empty() {
      tracing::debug!(
        packages = packages.len(),
        changes = changes.len(),
        "nothing to evaluate"
      );
      return Ok(Evaluation::default());
    }

    let mut graph = DependencyGraph::new(packages);
    graph.build().context("could not build dependency graph")?;

    let mut issued_full_retest = false;
    for change in changes {
      let outcome = self
        .evaluate_change(change, &mut graph)
        .with_context(|| format!("could not evaluate change {:?}", change.path))?;

      match outcome {
        ChangeOutcome::Handled => {}
        ChangeOutcome::RetestAll => {
          if !issued_full_retest {
            issue_full_scale_retest(&mut graph);
            issued_full_retest = true;
          }
        }
        ChangeOutcome::FullScale => {
          issue_full_scale_retest(&mut graph);
          self.issue_full_scale_redeploy(&mut graph);
          break;
        }
      }
    }

    let evaluation = prepare_evaluation(&graph);
    tracing::info!(
      retest = evaluation.retest.len(),
      redeploy = evaluation.redeploy.len(),
      "evaluation complete"
    );
    Ok(evaluation)
  }

  fn evaluate_change(&self, change: &ChangeInfo, graph: &mut DependencyGraph) -> BevalResult<ChangeOutcome> {
    if self.config.is_full_scale_trigger(&change.path) {
      tracing::info!(path = %change.path, "full-scale trigger matched");
      return Ok(ChangeOutcome::FullScale);
    }
    if self.config.is_retest_trigger(&change.path) {
      tracing::info!(path = %change.path, "retest trigger matched");
      return Ok(ChangeOutcome::RetestAll);
    }

    let Some((dir, _)) = change.path.rsplit_once('/') else {
      tracing::debug!(path = %change.path, "root-level change ignored");
      return Ok(ChangeOutcome::Handled);
    };

    let Some(node_idx) = graph.find(dir) else {
      return self.handle_missing_package(dir, change, graph);
    };

    if is_test_file(&change.path) {
      let node = graph.node_mut(node_idx);
      if node.info.contains_tests {
        node.retest = true;
      }
      return Ok(ChangeOutcome::Handled);
    }

    self.mark_dirty(node_idx, graph);
    Ok(ChangeOutcome::Handled)
  }

  fn handle_missing_package(&self, dir: &str, change: &ChangeInfo, graph: &mut DependencyGraph) -> BevalResult<ChangeOutcome> {
    if is_source_file(&change.path) {
      if change.is_deleted {
        tracing::debug!(path = %change.path, "deleted source file of a removed package");
        return Ok(ChangeOutcome::Handled);
      }

      return Err(GraphError::MissingPackage { path: dir.to_string() }.into());
    }

    let Some(parent_idx) = find_parent(dir, graph) else {
      tracing::warn!(
        path = %change.path,
        "change belongs to no package, falling back to full scale"
      );
      return Ok(ChangeOutcome::FullScale);
    };

    self.mark_dirty(parent_idx, graph);
    Ok(ChangeOutcome::Handled)
  }

  /// Mark a package and every transitive dependant
  fn mark_dirty(&self, start: NodeIndex, graph: &mut DependencyGraph) {
    let mut visited = HashSet::new();
    let mut stack = vec![start];

    while let Some(node_idx) = stack.pop() {
      if !visited.insert(node_idx) {
        continue;
      }

      let node = graph.node_mut(node_idx);
      if node.info.contains_tests {
        node.retest = true;
      }
      if self.config.can_be_deployed(node) {
        node.redeploy = true;
      }

      stack.extend(graph.dependant_indices(node_idx));
    }

    tracing::debug!(visited = visited.len(), "propagated dirty status");
  }

  fn issue_full_scale_redeploy(&self, graph: &mut DependencyGraph) {
    for node in graph.nodes_mut() {
      if self.config.can_be_deployed(node) {
        node.redeploy = true;
      }
    }
  }
}

fn issue_full_scale_retest(graph: &mut DependencyGraph) {
  for node in graph.nodes_mut() {
    if node.info.contains_tests {
      node.retest = true;
    }
  }
}

/// Nearest registered ancestor of `dir`, the tree root excluded
fn find_parent(dir: &str, graph: &DependencyGraph) -> Option<NodeIndex> {
  let mut current = dir;
  while let Some((parent, _)) = current.rsplit_once('/') {
    if let Some(node_idx) = graph.find(parent) {
      return Some(node_idx);
    }
    current = parent;
  }
  None
}

fn prepare_evaluation(graph: &DependencyGraph) -> Evaluation {
  let mut evaluation = Evaluation::default();
  for node in graph.nodes() {
    if node.retest {
      evaluation.retest.push(node.path().to_string());
    }
    if node.redeploy {
      evaluation.redeploy.push(node.path().to_string());
    }
  }
  evaluation
}
