//! Built-in scenarios. Each maps to one reportable test case.

mod invite_student;
mod login_smoke;
mod resource_notifications;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use vouch::{HarnessConfig, Result, ScenarioReport};

type ScenarioFuture = Pin<Box<dyn Future<Output = Result<ScenarioReport>> + Send>>;

/// A runnable, individually selectable scenario.
pub struct ScenarioDef {
	pub name: &'static str,
	pub description: &'static str,
	runner: fn(Arc<HarnessConfig>) -> ScenarioFuture,
}

impl ScenarioDef {
	pub async fn run(&self, config: Arc<HarnessConfig>) -> Result<ScenarioReport> {
		(self.runner)(config).await
	}
}

/// Every registered scenario, in execution order.
pub fn all() -> Vec<ScenarioDef> {
	vec![
		ScenarioDef {
			name: "login-smoke",
			description: "administrator UI login reaches an authenticated home page",
			runner: |config| Box::pin(login_smoke::run(config)),
		},
		ScenarioDef {
			name: "resource-notifications",
			description: "a submitted resource notifies the submitter and the administrator",
			runner: |config| Box::pin(resource_notifications::run(config)),
		},
		ScenarioDef {
			name: "invite-student",
			description: "an API-seeded group invitation becomes visible in the teacher's roster",
			runner: |config| Box::pin(invite_student::run(config)),
		},
	]
}
