//! `bevaluate run` - Decide what to retest and redeploy for a set of changes
//!
//! The change list comes from `--changes` (inline text, or a path with
//! `--file`) or from git with `--since <ref>`. Packages are inventoried from
//! the working directory, the evaluation is written to the configured output
//! files and summarized on stdout.

use crate::changes::{ChangeInfo, parse_changes};
use crate::core::config::BevaluateConfig;
use crate::core::error::{BevalError, BevalResult, ResultExt};
use crate::core::vcs::SystemGit;
use crate::graph::{BuildEvaluator, Evaluation, EvaluationConfig};
use crate::inventory::{InventoryConfig, MODULE_FILE, PackageReader, read_module_name};
use crate::storage::{FsStore, write_lines};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Output format for the run command
#[derive(Debug, Clone, Copy)]
enum OutputFormat {
  Text,
  Json,
  NamesOnly,
}

impl OutputFormat {
  fn from_str(s: &str) -> BevalResult<Self> {
    match s.to_lowercase().as_str() {
      "text" => Ok(Self::Text),
      "json" => Ok(Self::Json),
      "names" | "names-only" => Ok(Self::NamesOnly),
      _ => Err(BevalError::message(format!(
        "Unknown format '{}'. Valid formats: text, json, names-only",
        s
      ))),
    }
  }
}

/// Where the change list comes from
#[derive(Debug, Clone)]
pub enum ChangeSource {
  /// Name-status text given inline
  Inline(String),
  /// Path to a file holding name-status text
  File(String),
  /// `git diff --name-status <ref>` in the working directory
  Since(String),
}

/// Run the evaluation for the repository at `root`
pub fn run_evaluate(root: &Path, source: ChangeSource, format: String, dry_run: bool) -> BevalResult<()> {
  let output_format = OutputFormat::from_str(&format)?;
  let config = BevaluateConfig::load(root)?;

  let changes = collect_changes(root, &source)?;

  if dry_run {
    println!("DRY RUN: Would evaluate {} changed files", changes.len());
    for change in &changes {
      let status = if change.is_deleted { "D" } else { "M" };
      println!("  {} {}", status, change.path);
    }
    return Ok(());
  }

  if changes.is_empty() {
    tracing::info!("no changes, nothing evaluated or written");
    return display_results(&changes, &Evaluation::default(), output_format);
  }

  let evaluation = evaluate(root, &config, &changes)?;
  if evaluation.is_empty() {
    tracing::info!("nothing to retest or redeploy");
  }

  write_evaluation(root, &config, &evaluation)?;
  display_results(&changes, &evaluation, output_format)?;

  Ok(())
}

/// Read and parse the change list
fn collect_changes(root: &Path, source: &ChangeSource) -> BevalResult<Vec<ChangeInfo>> {
  let content = match source {
    ChangeSource::Inline(text) => text.clone(),
    ChangeSource::File(path) => {
      fs::read_to_string(path).with_context(|| format!("could not read changes file {}", path))?
    }
    ChangeSource::Since(since) => SystemGit::open(root)?.diff_name_status(since)?,
  };

  let changes = parse_changes(&content).context("could not parse changes")?;
  tracing::debug!(changes = changes.len(), "parsed change list");
  Ok(changes)
}

/// Inventory the repository and evaluate `changes` against it
fn evaluate(root: &Path, config: &BevaluateConfig, changes: &[ChangeInfo]) -> BevalResult<Evaluation> {
  // Patterns are compiled before any filesystem work.
  let inventory_config = InventoryConfig::new(&config.packages.ignored_dirs)?;
  let evaluator = BuildEvaluator::new(EvaluationConfig::from_config(&config.evaluations)?);

  let store = Arc::new(FsStore);
  let module_name =
    read_module_name(&root.join(MODULE_FILE), &*store).context("could not read go module name")?;
  tracing::debug!(module = %module_name, "resolved module");

  let reader = PackageReader::new(Arc::clone(&store), store, inventory_config);
  let packages = reader
    .read_packages(root, &module_name)
    .context("could not read packages")?;

  evaluator
    .evaluate(&packages, changes)
    .context("could not evaluate build")
}

/// Write both result lists, newline-joined, to the configured files
fn write_evaluation(root: &Path, config: &BevaluateConfig, evaluation: &Evaluation) -> BevalResult<()> {
  let retest_out = root.join(&config.evaluations.retest_out);
  write_lines(&retest_out, &evaluation.retest).context("could not write retest result")?;

  let redeploy_out = root.join(&config.evaluations.redeploy_out);
  write_lines(&redeploy_out, &evaluation.redeploy).context("could not write redeploy result")?;

  tracing::debug!(
    retest = %retest_out.display(),
    redeploy = %redeploy_out.display(),
    "wrote evaluation"
  );
  Ok(())
}

fn display_results(changes: &[ChangeInfo], evaluation: &Evaluation, format: OutputFormat) -> BevalResult<()> {
  match format {
    OutputFormat::Text => display_text(changes, evaluation),
    OutputFormat::Json => display_json(changes, evaluation),
    OutputFormat::NamesOnly => display_names_only(evaluation),
  }
}

/// Display results in human-readable text format
fn display_text(changes: &[ChangeInfo], evaluation: &Evaluation) -> BevalResult<()> {
  println!("Build Evaluation");
  println!("================");
  println!();

  println!("Changed files: {}", changes.len());
  if !changes.is_empty() && changes.len() <= 20 {
    for change in changes {
      println!("  {}", change.path);
    }
    println!();
  }

  println!("Retest: {} packages", evaluation.retest.len());
  for path in &evaluation.retest {
    println!("  🧪 {}", path);
  }
  println!();

  println!("Redeploy: {} packages", evaluation.redeploy.len());
  for path in &evaluation.redeploy {
    println!("  🚀 {}", path);
  }

  Ok(())
}

/// Display results in JSON format
fn display_json(changes: &[ChangeInfo], evaluation: &Evaluation) -> BevalResult<()> {
  use serde_json::json;

  let changed_files: Vec<_> = changes
    .iter()
    .map(|c| json!({ "path": c.path, "deleted": c.is_deleted }))
    .collect();

  let output = json!({
      "changed_files": changed_files,
      "retest": evaluation.retest,
      "redeploy": evaluation.redeploy,
      "summary": {
          "changed_files_count": changes.len(),
          "retest_count": evaluation.retest.len(),
          "redeploy_count": evaluation.redeploy.len()
      }
  });

  println!("{}", serde_json::to_string_pretty(&output)?);

  Ok(())
}

/// Display only package paths, retest first
fn display_names_only(evaluation: &Evaluation) -> BevalResult<()> {
  for path in evaluation.retest.iter().chain(&evaluation.redeploy) {
    println!("{}", path);
  }

  Ok(())
}
