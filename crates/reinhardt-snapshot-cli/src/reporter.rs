//! Console progress output.

use colored::Colorize;
use reinhardt_snapshot::resolver::SkipReason;
use reinhardt_snapshot::snapshot::{ExportOutcome, ExportReport, SnapshotReport, SnapshotReporter};

/// Prints snapshot progress to the terminal.
pub(crate) struct ConsoleReporter {
	verbosity: u8,
}

impl ConsoleReporter {
	pub(crate) fn new(verbosity: u8) -> Self {
		Self { verbosity }
	}

	pub(crate) fn verbosity(&self) -> u8 {
		self.verbosity
	}

	pub(crate) fn summary(&self, report: &SnapshotReport) {
		println!();
		println!(
			"{} loader(s) written, {} model(s) skipped, {} unordered",
			report.generated().to_string().green().bold(),
			report.skipped.len(),
			report.unordered.len()
		);
		if let Some(index) = &report.index {
			println!("Index: {}", index.display());
		}
		if !report.dangling.is_empty() {
			eprintln!(
				"{} {} reference(s) are not created by any loader of this snapshot",
				"Warning:".yellow().bold(),
				report.dangling.len()
			);
		}
		if !report.late.is_empty() {
			eprintln!(
				"{} {} reference(s) are looked up before the loader creating them runs",
				"Warning:".yellow().bold(),
				report.late.len()
			);
		}
	}
}

impl SnapshotReporter for ConsoleReporter {
	fn model_skipped(&self, model: &str, reason: &SkipReason) {
		if self.verbosity > 0 {
			println!("  {} {} ({})", "skip".dimmed(), model, reason);
		}
	}

	fn model_unordered(&self, model: &str) {
		eprintln!(
			"  {} {} has dependencies that can never be loaded first",
			"unordered".red().bold(),
			model
		);
	}

	fn export_finished(&self, report: &ExportReport) {
		let label = format!("[{}] {}", report.level, report.model);
		print_outcome(&label, &report.outcome);
	}

	fn dangling_reference(&self, reference: &str) {
		if self.verbosity > 0 {
			eprintln!("  {} {}", "dangling".yellow(), reference);
		}
	}

	fn late_reference(&self, reference: &str) {
		eprintln!("  {} {}", "late".yellow().bold(), reference);
	}
}

/// Prints one export outcome.
pub(crate) fn print_outcome(label: &str, outcome: &ExportOutcome) {
	match outcome {
		ExportOutcome::Generated { path, records, .. } => println!(
			"  {} {} -> {} ({} record(s))",
			"write".green().bold(),
			label,
			path.display(),
			records
		),
		ExportOutcome::SkippedEmpty => {
			println!("  {} {} (no records)", "empty".dimmed(), label)
		}
		ExportOutcome::Conflict { path } => eprintln!(
			"  {} {}: {} already exists, use --overwrite to replace it",
			"exists".yellow().bold(),
			label,
			path.display()
		),
		ExportOutcome::Failed { message } => {
			eprintln!("  {} {}: {}", "failed".red().bold(), label, message)
		}
	}
}
