//! Administrator login smoke check.
//!
//! Exercises the whole stack once: browser launch, isolated context, UI
//! login confirmed by the readiness marker, and a first observation.

use std::sync::Arc;

use tracing::info;
use vouch::{HarnessConfig, ObservationSpec, Result, Scenario, ScenarioReport};

pub async fn run(config: Arc<HarnessConfig>) -> Result<ScenarioReport> {
	let scenario = Scenario::launch("login-smoke", config).await?;
	Ok(scenario
		.run(|scenario| async move {
			let config = scenario.config();

			scenario.step("login as administrator");
			let admin = scenario.open_session("admin", &config.admin).await?;

			scenario.step("read the navbar notification indicator");
			let observation = admin.observe(&ObservationSpec::BadgeIndicator).await?;
			info!(
				target = "vouch",
				badge = observation.is_visible(),
				"post-login navbar state"
			);

			Ok(())
		})
		.await)
}
