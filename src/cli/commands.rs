//! CLI command definitions for seqpicker.
//!
//! This module provides the `select` and `evaluate` commands over a
//! pairwise identity table.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::info;

use crate::export::{format_representatives, report_to_json, write_report, write_representatives};
use crate::identity::{strip_coordinates, SequenceId};
use crate::pipeline::{SelectionConfig, SelectionRunner};

/// Representative sequence selection by submodular maximization.
#[derive(Parser)]
#[command(name = "seqpicker")]
#[command(about = "Select representative sequences from a pairwise identity table")]
#[command(version)]
#[command(
    long_about = "seqpicker picks an ordered set of representative sequences that cover a \
collection well while avoiding near-duplicates.\n\nThe input is a whitespace-separated \
pairwise identity table (seq1 seq2 %id ...), as produced by esl-alipid.\n\nExample usage:\n  \
seqpicker select identities.txt --maxsize 50 -o representatives.txt"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Select representatives from an identity table.
    Select(SelectArgs),

    /// Score an existing list of IDs under the selection objective.
    #[command(alias = "eval")]
    Evaluate(EvaluateArgs),
}

/// Options shared by every command that builds the objective.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ObjectiveArgs {
    /// YAML configuration file. Environment variables and flags override it.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Weight of the coverage objective; redundancy gets 1 - W.
    #[arg(short = 'w', long)]
    pub mixture_weight: Option<f64>,

    /// Record each identity row only in the listed direction.
    #[arg(long)]
    pub one_way: bool,
}

/// Arguments for `seqpicker select`.
#[derive(Parser, Debug)]
pub struct SelectArgs {
    /// Pairwise identity table.
    pub identities: PathBuf,

    /// Write representatives here instead of stdout.
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Maximum number of representatives.
    #[arg(short = 'n', long = "maxsize", alias = "max-size")]
    pub max_size: Option<usize>,

    /// Approximation ratio (1.0 is exact greedy).
    #[arg(short = 'a', long)]
    pub approx_ratio: Option<f64>,

    /// Acceptance threshold for relative gains (default: approx ratio - 1).
    #[arg(long)]
    pub min_relative_gain: Option<f64>,

    /// Offset added to |gain| in the relative gain denominator.
    #[arg(long)]
    pub gain_offset: Option<f64>,

    /// Stop selecting after this many seconds and keep the partial result.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Print the run report as JSON.
    #[arg(long)]
    pub json: bool,

    /// Also write the run report as JSON to this path.
    #[arg(long)]
    pub report: Option<PathBuf>,

    #[command(flatten)]
    pub objective: ObjectiveArgs,
}

/// Arguments for `seqpicker evaluate`.
#[derive(Parser, Debug)]
pub struct EvaluateArgs {
    /// Pairwise identity table.
    pub identities: PathBuf,

    /// File with one sequence ID per line.
    pub ids: PathBuf,

    /// Print the evaluation as JSON.
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub objective: ObjectiveArgs,
}

/// Parse CLI arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing the command.
pub fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli())
}

/// Run the CLI with the parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Select(args) => run_select_command(args),
        Commands::Evaluate(args) => run_evaluate_command(args),
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Layers the YAML file, environment variables and objective flags.
fn resolve_config(objective: &ObjectiveArgs) -> anyhow::Result<SelectionConfig> {
    let base = match &objective.config {
        Some(path) => SelectionConfig::from_yaml_file(path).map_err(|e| {
            anyhow::anyhow!("Failed to load configuration {}: {}", path.display(), e)
        })?,
        None => SelectionConfig::default(),
    };

    let mut config = base.with_env_overrides()?;
    if let Some(weight) = objective.mixture_weight {
        config = config.with_mixture_weight(weight);
    }
    if objective.one_way {
        config = config.with_symmetric_identities(false);
    }
    Ok(config)
}

fn apply_select_flags(mut config: SelectionConfig, args: &SelectArgs) -> SelectionConfig {
    if let Some(max_size) = args.max_size {
        config = config.with_max_size(max_size);
    }
    if let Some(ratio) = args.approx_ratio {
        config = config.with_approx_ratio(ratio);
    }
    if let Some(gain) = args.min_relative_gain {
        config = config.with_min_relative_gain(gain);
    }
    if let Some(offset) = args.gain_offset {
        config = config.with_gain_denominator_offset(offset);
    }
    if let Some(secs) = args.timeout_secs {
        config.timeout_secs = Some(secs);
    }
    config
}

// ============================================================================
// Select Command Implementation
// ============================================================================

fn run_select_command(args: SelectArgs) -> anyhow::Result<()> {
    let config = apply_select_flags(resolve_config(&args.objective)?, &args);
    let runner = SelectionRunner::new(config)?;

    let report = runner.run(&args.identities)?;

    if let Some(path) = &args.output {
        write_representatives(&report.selected, path)?;
    }
    if let Some(path) = &args.report {
        write_report(&report, path)?;
    }

    if args.json {
        println!("{}", report_to_json(&report)?);
    } else if args.output.is_none() {
        print_lines(&format_representatives(&report.selected))?;
    }

    info!(
        selected = report.selected.len(),
        objective_value = report.objective_value,
        "Done"
    );
    Ok(())
}

// ============================================================================
// Evaluate Command Implementation
// ============================================================================

fn run_evaluate_command(args: EvaluateArgs) -> anyhow::Result<()> {
    let config = resolve_config(&args.objective)?;
    let runner = SelectionRunner::new(config)?;

    let db = runner.load_database(&args.identities)?;
    let ids = read_id_list(&args.ids)?;
    let evaluation = runner.evaluate(&db, &ids)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&evaluation)?);
        return Ok(());
    }

    println!("{}\t{}", evaluation.objective, evaluation.value);
    for component in &evaluation.components {
        println!("{}({})\t{}", component.name, component.weight, component.value);
    }
    Ok(())
}

/// Reads one ID per line, ignoring blank lines and coordinate suffixes.
fn read_id_list(path: &Path) -> anyhow::Result<Vec<SequenceId>> {
    let content = fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read ID list {}: {}", path.display(), e))?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| strip_coordinates(line).to_string())
        .collect())
}

fn print_lines(text: &str) -> io::Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    let mut handle = io::stdout().lock();
    writeln!(handle, "{}", text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_select_command_defaults() {
        let cli = Cli::try_parse_from(["seqpicker", "select", "ids.txt"]).expect("should parse");

        assert_eq!(cli.log_level, "info");
        match cli.command {
            Commands::Select(args) => {
                assert_eq!(args.identities, PathBuf::from("ids.txt"));
                assert!(args.output.is_none());
                assert!(args.max_size.is_none());
                assert!(args.approx_ratio.is_none());
                assert!(args.objective.mixture_weight.is_none());
                assert!(!args.objective.one_way);
                assert!(!args.json);
            }
            _ => panic!("Expected Select command"),
        }
    }

    #[test]
    fn test_select_command_with_all_options() {
        let cli = Cli::try_parse_from([
            "seqpicker",
            "select",
            "table.txt",
            "-o",
            "out/reps.txt",
            "--maxsize",
            "25",
            "--mixture-weight",
            "0.8",
            "--approx-ratio",
            "1.1",
            "--min-relative-gain",
            "0.05",
            "--gain-offset",
            "0.1",
            "--timeout-secs",
            "30",
            "--config",
            "run.yaml",
            "--one-way",
            "--json",
            "--log-level",
            "debug",
        ])
        .expect("should parse");

        assert_eq!(cli.log_level, "debug");
        match cli.command {
            Commands::Select(args) => {
                assert_eq!(args.output, Some(PathBuf::from("out/reps.txt")));
                assert_eq!(args.max_size, Some(25));
                assert_eq!(args.objective.mixture_weight, Some(0.8));
                assert_eq!(args.approx_ratio, Some(1.1));
                assert_eq!(args.min_relative_gain, Some(0.05));
                assert_eq!(args.gain_offset, Some(0.1));
                assert_eq!(args.timeout_secs, Some(30));
                assert_eq!(args.objective.config, Some(PathBuf::from("run.yaml")));
                assert!(args.objective.one_way);
                assert!(args.json);
            }
            _ => panic!("Expected Select command"),
        }
    }

    #[test]
    fn test_evaluate_command() {
        let cli = Cli::try_parse_from(["seqpicker", "eval", "table.txt", "reps.txt", "-w", "0.3"])
            .expect("should parse");

        match cli.command {
            Commands::Evaluate(args) => {
                assert_eq!(args.identities, PathBuf::from("table.txt"));
                assert_eq!(args.ids, PathBuf::from("reps.txt"));
                assert_eq!(args.objective.mixture_weight, Some(0.3));
            }
            _ => panic!("Expected Evaluate command"),
        }
    }

    #[test]
    fn test_select_requires_identities() {
        assert!(Cli::try_parse_from(["seqpicker", "select"]).is_err());
    }

    #[test]
    fn test_select_flags_override_config() {
        let cli = Cli::try_parse_from([
            "seqpicker",
            "select",
            "table.txt",
            "--maxsize",
            "4",
            "--timeout-secs",
            "9",
        ])
        .expect("should parse");
        let Commands::Select(args) = cli.command else {
            panic!("Expected Select command");
        };

        let config = apply_select_flags(SelectionConfig::default().with_max_size(100), &args);
        assert_eq!(config.max_size, Some(4));
        assert_eq!(config.timeout_secs, Some(9));
        assert!((config.approx_ratio - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_select_flags_repair_earlier_layers() {
        let cli = Cli::try_parse_from(["seqpicker", "select", "table.txt", "--maxsize", "5"])
            .expect("should parse");
        let Commands::Select(args) = cli.command else {
            panic!("Expected Select command");
        };

        let base = SelectionConfig::default().with_max_size(0);
        assert!(base.validate().is_err());

        let config = apply_select_flags(base, &args);
        assert_eq!(config.max_size, Some(5));
        assert!(SelectionRunner::new(config).is_ok());
    }

    #[test]
    fn test_read_id_list() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("ids.txt");
        fs::write(&path, "seq1\n\n  seq4/1-80 \nseq6").expect("write");

        let ids = read_id_list(&path).expect("reads");
        assert_eq!(ids, vec!["seq1", "seq4", "seq6"]);
    }
}
