//! Dependency graph and change evaluation
//!
//! Built on petgraph: the inventory becomes a package graph, and changes are
//! propagated along reverse edges to find what must be retested and redeployed.

pub mod dependency_graph;
pub mod evaluator;

pub use evaluator::{BuildEvaluator, Evaluation, EvaluationConfig};
