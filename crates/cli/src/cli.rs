use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::styles::cli_styles;

#[derive(Parser, Debug)]
#[command(name = "vouch")]
#[command(about = "Cross-session consistency verification for the target web application")]
#[command(version)]
#[command(styles = cli_styles())]
pub struct Cli {
	/// Increase verbosity (-v engine timeline, -vv protocol debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Show browser windows instead of running headless
	#[arg(long, global = true)]
	pub headed: bool,

	/// Delay each page interaction by this many milliseconds
	#[arg(long, global = true, value_name = "MS")]
	pub slow_mo: Option<u64>,

	/// Directory for failure evidence (screenshots, console tails)
	#[arg(long, global = true, value_name = "DIR")]
	pub artifacts_dir: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Run scenarios (all of them by default)
	Run {
		/// Only run scenarios whose name contains this substring
		#[arg(value_name = "FILTER")]
		filter: Option<String>,
	},
	/// List available scenarios
	List,
}
