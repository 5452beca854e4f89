//! Reinhardt Snapshot CLI
//!
//! Generates replayable fixture loaders from stored records.
//!
//! ## Usage
//!
//! ```bash
//! reinhardt-snapshot levels
//! reinhardt-snapshot generate --model blog.Book --ids "1 4-6" --name starter_books
//! reinhardt-snapshot snapshot --name seed --overwrite
//! ```

mod reporter;

use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use reinhardt_snapshot::SnapshotConfig;
use reinhardt_snapshot::commands::{
	CommandOutcome, GenerateFixtureArgs, GenerateFixtureCommand, GenerateFixtureOptions,
	LevelsCommand,
};
use reinhardt_snapshot::config::CliArgs;

use crate::reporter::{ConsoleReporter, print_outcome};

/// Configuration file used when `--config` is not given.
const DEFAULT_CONFIG_FILE: &str = "snapshot.toml";

#[derive(Parser)]
#[command(name = "reinhardt-snapshot")]
#[command(about = "Dependency-ordered fixture snapshots for Reinhardt", long_about = None)]
#[command(version)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	/// Verbosity level (can be repeated)
	#[arg(short, long, action = clap::ArgAction::Count, global = true)]
	verbosity: u8,

	/// Configuration file (defaults to ./snapshot.toml when present)
	#[arg(short, long, value_name = "PATH", global = true)]
	config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
	/// Export one model, optionally restricted to some identifiers
	Generate {
		/// Qualified model name (app.Model)
		#[arg(short, long, value_name = "MODEL")]
		model: String,

		/// Identifiers and ranges, for example "12 15-21"
		#[arg(long, value_name = "IDS")]
		ids: Option<String>,

		/// Loader name (required when several identifiers are given)
		#[arg(short, long)]
		name: Option<String>,

		/// Declared load order
		#[arg(long, default_value_t = 1)]
		order: u32,

		#[command(flatten)]
		common: CommonArgs,

		/// Do not write a loader when no record matches
		#[arg(long)]
		skip_empty: bool,
	},

	/// Export every eligible model in dependency order
	Snapshot {
		/// Loader name prefix
		#[arg(short, long)]
		name: Option<String>,

		#[command(flatten)]
		common: CommonArgs,

		/// Also write loaders for models without records
		#[arg(long)]
		keep_empty: bool,
	},

	/// Show the dependency level of every exportable model
	Levels,
}

#[derive(clap::Args)]
struct CommonArgs {
	/// Replace existing loaders
	#[arg(long)]
	overwrite: bool,

	/// Record store alias from the configuration
	#[arg(long, value_name = "ALIAS")]
	connection: Option<String>,

	/// Output directory (overrides the configuration)
	#[arg(short, long, value_name = "DIR")]
	output: Option<PathBuf>,

	/// Exclude models matching this pattern
	#[arg(long, value_name = "REGEX")]
	exclude: Option<String>,
}

fn main() {
	let cli = Cli::parse();
	init_logging(cli.verbosity);
	let reporter = reporter_for(&cli);

	let result = match cli.command {
		Commands::Generate {
			model,
			ids,
			name,
			order,
			common,
			skip_empty,
		} => run_generate(
			cli.config.as_deref(),
			model,
			ids,
			name,
			order,
			common,
			skip_empty,
			&reporter,
		),
		Commands::Snapshot {
			name,
			common,
			keep_empty,
		} => run_snapshot(cli.config.as_deref(), name, common, keep_empty, &reporter),
		Commands::Levels => run_levels(cli.config.as_deref()),
	};

	if let Err(e) = result {
		eprintln!("Error: {:#}", e);
		process::exit(1);
	}
}

fn reporter_for(cli: &Cli) -> ConsoleReporter {
	ConsoleReporter::new(cli.verbosity)
}

fn init_logging(verbosity: u8) {
	tracing_subscriber::fmt()
		.with_max_level(log_level(verbosity))
		.with_writer(std::io::stderr)
		.with_target(false)
		.init();
}

fn log_level(verbosity: u8) -> tracing::Level {
	match verbosity {
		0 => tracing::Level::WARN,
		1 => tracing::Level::INFO,
		2 => tracing::Level::DEBUG,
		_ => tracing::Level::TRACE,
	}
}

fn load_config(path: Option<&Path>) -> anyhow::Result<SnapshotConfig> {
	match path {
		Some(path) => SnapshotConfig::from_file(path)
			.with_context(|| format!("failed to load {}", path.display())),
		None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
			Ok(SnapshotConfig::from_file(DEFAULT_CONFIG_FILE)?)
		}
		None => {
			tracing::debug!("no configuration file, using defaults");
			Ok(SnapshotConfig::default())
		}
	}
}

fn apply_common(config: &mut SnapshotConfig, common: &CommonArgs) -> anyhow::Result<()> {
	let args = CliArgs::new()
		.with_output_dir(common.output.clone())
		.with_exclude_models(common.exclude.clone());
	config
		.merge_cli_args(&args)
		.context("invalid command-line option")
}

fn common_options(common: &CommonArgs) -> GenerateFixtureOptions {
	let mut options = GenerateFixtureOptions::new().with_overwrite(common.overwrite);
	options.connection = common.connection.clone();
	options
}

fn run_generate(
	config_path: Option<&Path>,
	model: String,
	ids: Option<String>,
	name: Option<String>,
	order: u32,
	common: CommonArgs,
	skip_empty: bool,
	reporter: &ConsoleReporter,
) -> anyhow::Result<()> {
	let mut config = load_config(config_path)?;
	apply_common(&mut config, &common)?;

	let mut args = GenerateFixtureArgs::model(model);
	args.ids = ids;
	let mut options = common_options(&common)
		.with_order(order)
		.with_skip_empty(skip_empty);
	options.name = name;

	let outcome = GenerateFixtureCommand::new(config).execute(args, options, reporter)?;
	if let CommandOutcome::Single { model, outcome } = outcome {
		print_outcome(&model, &outcome);
	}
	Ok(())
}

fn run_snapshot(
	config_path: Option<&Path>,
	name: Option<String>,
	common: CommonArgs,
	keep_empty: bool,
	reporter: &ConsoleReporter,
) -> anyhow::Result<()> {
	let mut config = load_config(config_path)?;
	apply_common(&mut config, &common)?;

	let mut options = common_options(&common);
	options.name = name;
	if keep_empty {
		options = options.with_skip_empty(false);
	}

	println!("{}", "Generating snapshot".bold());
	let outcome = GenerateFixtureCommand::new(config).execute(
		GenerateFixtureArgs::snapshot(),
		options,
		reporter,
	)?;
	if let CommandOutcome::Snapshot(report) = outcome {
		reporter.summary(&report);
	}
	Ok(())
}

fn run_levels(config_path: Option<&Path>) -> anyhow::Result<()> {
	let config = load_config(config_path)?;
	let report = LevelsCommand::new(config).execute()?;

	for entity in &report.resolution.ordered {
		println!("{:>3}  {}", entity.level.to_string().cyan(), entity.model);
	}
	for model in &report.resolution.unordered {
		println!("{:>3}  {}", "-".red(), model);
	}
	for (model, reason) in &report.skipped {
		println!("{}", format!("     {} ({})", model, reason).dimmed());
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use clap::CommandFactory;
	use rstest::rstest;

	#[rstest]
	fn test_cli_definition() {
		Cli::command().debug_assert();
	}

	#[rstest]
	fn test_parse_generate() {
		let cli = Cli::try_parse_from([
			"reinhardt-snapshot",
			"-vv",
			"generate",
			"--model",
			"blog.Book",
			"--ids",
			"1 4-6",
			"--name",
			"starter",
			"--overwrite",
		])
		.unwrap();

		assert_eq!(cli.verbosity, 2);
		let Commands::Generate {
			model,
			ids,
			name,
			order,
			common,
			skip_empty,
		} = cli.command
		else {
			panic!("expected generate");
		};
		assert_eq!(model, "blog.Book");
		assert_eq!(ids.as_deref(), Some("1 4-6"));
		assert_eq!(name.as_deref(), Some("starter"));
		assert_eq!(order, 1);
		assert!(common.overwrite);
		assert!(!skip_empty);
	}

	#[rstest]
	fn test_parse_snapshot_with_config() {
		let cli = Cli::try_parse_from([
			"reinhardt-snapshot",
			"snapshot",
			"--config",
			"conf/snapshot.toml",
			"--keep-empty",
			"--connection",
			"replica",
		])
		.unwrap();

		assert_eq!(cli.config, Some(PathBuf::from("conf/snapshot.toml")));
		let Commands::Snapshot {
			common, keep_empty, ..
		} = cli.command
		else {
			panic!("expected snapshot");
		};
		assert!(keep_empty);
		assert_eq!(common.connection.as_deref(), Some("replica"));
	}

	#[rstest]
	fn test_generate_requires_model() {
		let result = Cli::try_parse_from(["reinhardt-snapshot", "generate"]);

		assert!(result.is_err());
	}

	#[rstest]
	#[case(0, tracing::Level::WARN)]
	#[case(1, tracing::Level::INFO)]
	#[case(2, tracing::Level::DEBUG)]
	#[case(5, tracing::Level::TRACE)]
	fn test_log_level(#[case] verbosity: u8, #[case] expected: tracing::Level) {
		assert_eq!(log_level(verbosity), expected);
	}

	#[rstest]
	fn test_load_config_file_and_overrides() {
		// Arrange
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("snapshot.toml");
		std::fs::write(&path, "[output]\ndirectory = \"out\"\n").unwrap();
		let common = CommonArgs {
			overwrite: false,
			connection: None,
			output: None,
			exclude: Some("^auth\\.".to_string()),
		};

		// Act
		let mut config = load_config(Some(path.as_path())).unwrap();
		apply_common(&mut config, &common).unwrap();

		// Assert
		assert_eq!(config.output.directory, dir.path().join("out"));
		assert!(!config.models.should_include_model("auth.User"));
	}

	#[rstest]
	fn test_missing_config_file_is_an_error() {
		let result = load_config(Some(Path::new("does/not/exist.toml")));

		assert!(result.is_err());
	}

	#[rstest]
	fn test_invalid_exclude_pattern_is_an_error() {
		let mut config = SnapshotConfig::default();
		let common = CommonArgs {
			overwrite: false,
			connection: None,
			output: None,
			exclude: Some("blog.(Book".to_string()),
		};

		let result = apply_common(&mut config, &common);

		assert!(result.is_err());
	}

	#[rstest]
	#[case(&["reinhardt-snapshot", "generate", "--model", "blog.Book"], 0)]
	#[case(&["reinhardt-snapshot", "-v", "generate", "--model", "blog.Book"], 1)]
	#[case(&["reinhardt-snapshot", "-vv", "snapshot"], 2)]
	fn test_reporter_follows_verbosity(#[case] argv: &[&str], #[case] expected: u8) {
		let cli = Cli::try_parse_from(argv).unwrap();

		assert_eq!(reporter_for(&cli).verbosity(), expected);
	}
}
