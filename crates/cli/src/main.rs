use std::sync::Arc;

use clap::Parser;
use vouch::HarnessConfig;
use vouch_cli::{
	cli::{Cli, Command},
	logging, report, scenarios,
};

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	match dispatch(cli).await {
		Ok(true) => {}
		Ok(false) => std::process::exit(1),
		Err(e) => {
			eprintln!("error: {e}");
			std::process::exit(1);
		}
	}
}

async fn dispatch(cli: Cli) -> anyhow::Result<bool> {
	let mut config = HarnessConfig::from_env()?;
	if cli.headed {
		config.headless = false;
	}
	if let Some(ms) = cli.slow_mo {
		config.slow_mo = std::time::Duration::from_millis(ms);
	}
	if let Some(dir) = cli.artifacts_dir {
		config.artifacts_dir = dir;
	}
	let config = Arc::new(config);

	match cli.command {
		Command::List => {
			for def in scenarios::all() {
				println!("{:<26} {}", def.name, def.description);
			}
			Ok(true)
		}
		Command::Run { filter } => {
			let selected: Vec<_> = scenarios::all()
				.into_iter()
				.filter(|def| {
					filter
						.as_deref()
						.is_none_or(|needle| def.name.contains(needle))
				})
				.collect();
			if selected.is_empty() {
				anyhow::bail!(
					"no scenario matches '{}'",
					filter.as_deref().unwrap_or_default()
				);
			}

			let mut reports = Vec::with_capacity(selected.len());
			for def in &selected {
				let report = def.run(Arc::clone(&config)).await?;
				report::print_report(&report);
				reports.push(report);
			}
			Ok(report::print_summary(&reports))
		}
	}
}
