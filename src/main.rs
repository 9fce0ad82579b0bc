mod changes;
mod commands;
mod core;
mod graph;
mod inventory;
mod storage;

use clap::{Parser, Subcommand};
use crate::commands::ChangeSource;
use crate::core::error::{BevalError, print_error};
use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter directive
const LOG_ENV: &str = "BEVALUATE_LOG";

/// Decide which packages of a Go monorepo to retest and redeploy
#[derive(Parser)]
#[command(name = "bevaluate")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  /// Log debug details to stderr
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Evaluate changes and write the retest/redeploy lists
  Run {
    /// Changes in `git diff --name-status` format, or a path to them with --file
    /// (e.g. --changes "$(git diff master --name-status)")
    #[arg(long, conflicts_with = "since")]
    changes: Option<String>,
    /// Treat --changes as the path of a file to read
    #[arg(long, requires = "changes")]
    file: bool,
    /// Collect changes with `git diff --name-status <SINCE>`
    #[arg(long)]
    since: Option<String>,
    /// Output format: text (default), json, names-only
    #[arg(long, default_value = "text", value_parser = ["text", "json", "names", "names-only"])]
    format: String,
    /// Show the parsed changes without evaluating
    #[arg(long)]
    dry_run: bool,
  },

  /// Write a default bevaluate.toml in the current directory
  Init,
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

/// Logs go to stderr so they never mix with results on stdout.
fn init_logging(verbose: bool) {
  let filter = if verbose {
    EnvFilter::new("bevaluate=debug")
  } else {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
  };

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_ansi(false)
    .init();
}

fn main() {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  let root = match std::env::current_dir() {
    Ok(dir) => dir,
    Err(e) => handle_error(BevalError::from(e).context("could not get working directory")),
  };

  let result = match cli.command {
    Commands::Run {
      changes,
      file,
      since,
      format,
      dry_run,
    } => {
      let source = match (changes, since) {
        (Some(path), _) if file => ChangeSource::File(path),
        (Some(text), _) => ChangeSource::Inline(text),
        (None, Some(since)) => ChangeSource::Since(since),
        (None, None) => ChangeSource::Inline(String::new()),
      };
      commands::run_evaluate(&root, source, format, dry_run)
    }
    Commands::Init => commands::run_init(&root),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: BevalError) -> ! {
  tracing::debug!(error = ?err, "command failed");
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
