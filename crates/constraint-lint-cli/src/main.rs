//! constraint-lint CLI tool.
//!
//! Usage:
//! ```bash
//! constraint-lint check [OPTIONS] [PATH]
//! constraint-lint list-rules [--rules FILE]...
//! constraint-lint init
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;

/// Rule-based constraint validator for source files
#[derive(Parser)]
#[command(name = "constraint-lint")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate project files against the configured constraints
    Check {
        /// Project root (default: `[engine] root` from the config, else the current directory)
        path: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Include patterns (can be specified multiple times)
        #[arg(short, long)]
        include: Vec<String>,

        /// Exclude patterns (can be specified multiple times)
        #[arg(short, long)]
        exclude: Vec<String>,

        /// Additional rule-set files (can be specified multiple times)
        #[arg(short, long)]
        rules: Vec<PathBuf>,

        /// Maximum number of files validated at once
        #[arg(long, env = "CONSTRAINT_LINT_CONCURRENCY")]
        concurrency: Option<usize>,

        /// Disable the content-hash result cache
        #[arg(long)]
        no_cache: bool,
    },

    /// List the rules that would run
    ListRules {
        /// Project root (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Additional rule-set files (can be specified multiple times)
        #[arg(short, long)]
        rules: Vec<PathBuf>,
    },

    /// Initialize configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

/// Output format for validation results.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output grouped by severity.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// One-line-per-violation compact format.
    Compact,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Check {
            path,
            format,
            include,
            exclude,
            rules,
            concurrency,
            no_cache,
        } => {
            let project_dir = path.as_deref().unwrap_or(Path::new("."));
            let source = config_resolver::resolve(project_dir, cli.config.as_deref());
            let options = commands::check::CheckOptions {
                format,
                include,
                exclude,
                rule_files: rules,
                concurrency,
                cache: !no_cache,
            };
            commands::check::run(path.as_deref(), &source, options)
        }
        Commands::ListRules { path, rules } => {
            let source = config_resolver::resolve(&path, cli.config.as_deref());
            commands::list_rules::run(&source, &rules)
        }
        Commands::Init { force } => commands::init::run(force),
    }
}
