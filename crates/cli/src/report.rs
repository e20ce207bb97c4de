//! Human-facing scenario reports.

use colored::Colorize;
use vouch::{ScenarioReport, ScenarioStatus};

/// Prints one scenario's outcome with its verification ledger.
pub fn print_report(report: &ScenarioReport) {
	match &report.status {
		ScenarioStatus::Passed => {
			println!(
				"{} {} ({:.1}s)",
				"PASS".green().bold(),
				report.name,
				report.duration.as_secs_f64()
			);
		}
		ScenarioStatus::Failed { step, cause } => {
			println!(
				"{} {} ({:.1}s)",
				"FAIL".red().bold(),
				report.name,
				report.duration.as_secs_f64()
			);
			println!("     step:  {step}");
			println!("     cause: {cause}");
		}
	}

	for verification in &report.verifications {
		let marker = if verification.passed {
			"ok".green()
		} else {
			"failed".red()
		};
		println!("     [{marker}] {}: {}", verification.label, verification.detail);
	}
}

/// Prints the aggregate line and returns whether everything passed.
pub fn print_summary(reports: &[ScenarioReport]) -> bool {
	let passed = reports.iter().filter(|report| report.passed()).count();
	let failed = reports.len() - passed;

	println!();
	if failed == 0 {
		println!("{}: {passed} scenario(s) passed", "summary".green().bold());
	} else {
		println!(
			"{}: {passed} passed, {failed} failed",
			"summary".red().bold()
		);
	}
	failed == 0
}
