//! Argument-parsing checks for the `vouch` binary surface.

use clap::Parser;
use vouch_cli::cli::{Cli, Command};

#[test]
fn run_without_filter_selects_everything() {
	let cli = Cli::parse_from(["vouch", "run"]);
	match cli.command {
		Command::Run { filter } => assert!(filter.is_none()),
		other => panic!("expected Run, got {other:?}"),
	}
	assert_eq!(cli.verbose, 0);
	assert!(!cli.headed);
}

#[test]
fn run_accepts_a_name_filter() {
	let cli = Cli::parse_from(["vouch", "run", "resource"]);
	match cli.command {
		Command::Run { filter } => assert_eq!(filter.as_deref(), Some("resource")),
		other => panic!("expected Run, got {other:?}"),
	}
}

#[test]
fn verbosity_accumulates() {
	let cli = Cli::parse_from(["vouch", "-vv", "list"]);
	assert_eq!(cli.verbose, 2);
	assert!(matches!(cli.command, Command::List));
}

#[test]
fn global_flags_apply_after_the_subcommand() {
	let cli = Cli::parse_from(["vouch", "run", "--headed", "--slow-mo", "250"]);
	assert!(cli.headed);
	assert_eq!(cli.slow_mo, Some(250));
}

#[test]
fn artifacts_dir_is_a_path() {
	let cli = Cli::parse_from(["vouch", "run", "--artifacts-dir", "/tmp/evidence"]);
	assert_eq!(
		cli.artifacts_dir.as_deref(),
		Some(std::path::Path::new("/tmp/evidence"))
	);
}

#[test]
fn scenario_registry_is_stable() {
	let defs = vouch_cli::scenarios::all();
	let names: Vec<&str> = defs.iter().map(|def| def.name).collect();
	assert_eq!(
		names,
		["login-smoke", "resource-notifications", "invite-student"]
	);
}
