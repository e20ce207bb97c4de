//! Scenario driver: an ordered composition of actions and verifications
//! across named sessions, owning every session for its lifetime.
//!
//! A scenario-level timeout aborts in-flight polls (every wait is a
//! suspension point, so dropping the body future cancels them) and
//! teardown force-closes all sessions; closing is idempotent, so partial
//! teardown never double-releases.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{error, info, warn};

use crate::browser::Browser;
use crate::config::{Credentials, HarnessConfig};
use crate::error::{Result, VouchError};
use crate::evidence::EvidenceCollector;
use crate::page::PageDriver;
use crate::session::Session;
use crate::verify::{TargetStatus, VerificationResult};

/// Matches the per-test budget the original suite ran with.
pub const DEFAULT_SCENARIO_TIMEOUT: Duration = Duration::from_secs(120);

/// Terminal state of one scenario.
#[derive(Debug)]
pub enum ScenarioStatus {
	Passed,
	Failed { step: String, cause: String },
}

/// One recorded verification, pass or fail.
#[derive(Debug)]
pub struct VerificationRecord {
	pub label: String,
	pub passed: bool,
	pub detail: String,
}

/// What the test-runner surface reports for one scenario.
#[derive(Debug)]
pub struct ScenarioReport {
	pub name: String,
	pub status: ScenarioStatus,
	pub verifications: Vec<VerificationRecord>,
	pub duration: Duration,
}

impl ScenarioReport {
	pub fn passed(&self) -> bool {
		matches!(self.status, ScenarioStatus::Passed)
	}
}

/// Owns the browser, the sessions, and the verification ledger for one
/// test case.
pub struct Scenario {
	name: String,
	config: Arc<HarnessConfig>,
	browser: Option<Browser>,
	evidence: Arc<EvidenceCollector>,
	sessions: Mutex<Vec<Arc<Session>>>,
	current_step: Mutex<String>,
	verifications: Mutex<Vec<VerificationRecord>>,
	timeout: Duration,
}

impl Scenario {
	/// Launches a browser and prepares an evidence directory for `name`.
	pub async fn launch(name: impl Into<String>, config: Arc<HarnessConfig>) -> Result<Self> {
		let browser = Browser::launch(&config).await?;
		Ok(Self::assemble(name.into(), config, Some(browser)))
	}

	/// A scenario without a browser; sessions must be brought via
	/// [`Scenario::adopt`]. Used with custom drivers and in tests.
	pub fn detached(name: impl Into<String>, config: Arc<HarnessConfig>) -> Self {
		Self::assemble(name.into(), config, None)
	}

	fn assemble(name: String, config: Arc<HarnessConfig>, browser: Option<Browser>) -> Self {
		let evidence = Arc::new(EvidenceCollector::new(config.artifacts_dir.join(&name)));
		Self {
			name,
			config,
			browser,
			evidence,
			sessions: Mutex::new(Vec::new()),
			current_step: Mutex::new("setup".to_string()),
			verifications: Mutex::new(Vec::new()),
			timeout: DEFAULT_SCENARIO_TIMEOUT,
		}
	}

	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn config(&self) -> Arc<HarnessConfig> {
		Arc::clone(&self.config)
	}

	/// Marks the current step; failures are attributed to the last mark.
	pub fn step(&self, name: &str) {
		info!(target = "vouch", scenario = %self.name, step = name);
		*self.current_step.lock() = name.to_string();
	}

	/// Opens a UI-authenticated session and registers it for teardown.
	pub async fn open_session(&self, role: &str, credentials: &Credentials) -> Result<Arc<Session>> {
		let page = self.page().await?;
		let session = Session::open(
			role,
			credentials,
			page,
			Arc::clone(&self.config),
			Arc::clone(&self.evidence),
		)
		.await?;
		Ok(self.adopt(session))
	}

	/// Opens an unauthenticated session (for API-seeded identities).
	pub async fn anonymous_session(&self, role: &str) -> Result<Arc<Session>> {
		let page = self.page().await?;
		Ok(self.adopt(Session::anonymous(
			role,
			page,
			Arc::clone(&self.config),
			Arc::clone(&self.evidence),
		)))
	}

	/// Registers an externally-built session for teardown.
	pub fn adopt(&self, session: Session) -> Arc<Session> {
		let session = Arc::new(session);
		self.sessions.lock().push(Arc::clone(&session));
		session
	}

	async fn page(&self) -> Result<Box<dyn PageDriver>> {
		let browser = self.browser.as_ref().ok_or_else(|| {
			VouchError::Config("detached scenario has no browser; adopt sessions instead".to_string())
		})?;
		Ok(Box::new(browser.new_page().await?))
	}

	/// Records a verification and fails the scenario step if it did not
	/// pass.
	pub fn check(&self, label: &str, result: &VerificationResult) -> Result<()> {
		self.record(label, result);
		match result {
			VerificationResult::Passed { .. } => Ok(()),
			VerificationResult::TriggerFailed { action, result } => Err(VouchError::ActionFailed {
				action: action.clone(),
				reason: result.failure_reason().unwrap_or("unknown").to_string(),
			}),
			VerificationResult::Failed { targets } => {
				let culprit = targets.iter().find(|target| !target.acceptable());
				let (label, attempts) = culprit
					.map(|target| {
						let attempts = match target.status {
							TargetStatus::Matched { attempts_used }
							| TargetStatus::TimedOut { attempts_used, .. } => attempts_used,
						};
						(target.label.clone(), attempts)
					})
					.unwrap_or_else(|| (label.to_string(), 0));
				Err(VouchError::VerificationTimeout { label, attempts })
			}
		}
	}

	/// Records a verification without failing on timeout: the
	/// reported-but-non-fatal path for optional flows.
	pub fn record(&self, label: &str, result: &VerificationResult) {
		self.verifications.lock().push(VerificationRecord {
			label: label.to_string(),
			passed: result.passed(),
			detail: result.summary(),
		});
	}

	/// Runs the scenario body under the scenario timeout, then tears
	/// everything down regardless of outcome.
	pub async fn run<F, Fut>(self, body: F) -> ScenarioReport
	where
		F: FnOnce(Arc<Scenario>) -> Fut,
		Fut: Future<Output = Result<()>>,
	{
		let started = Instant::now();
		let timeout = self.timeout;
		let scenario = Arc::new(self);
		info!(target = "vouch", scenario = %scenario.name, "scenario starting");

		let outcome = tokio::time::timeout(timeout, body(Arc::clone(&scenario))).await;
		let status = match outcome {
			Ok(Ok(())) => ScenarioStatus::Passed,
			Ok(Err(e)) => {
				let step = scenario.current_step.lock().clone();
				error!(
					target = "vouch",
					scenario = %scenario.name,
					%step,
					error = %e,
					"scenario failed"
				);
				ScenarioStatus::Failed {
					step,
					cause: e.to_string(),
				}
			}
			Err(_) => {
				let step = scenario.current_step.lock().clone();
				ScenarioStatus::Failed {
					step,
					cause: format!("scenario timed out after {timeout:?}"),
				}
			}
		};

		scenario.teardown().await;

		ScenarioReport {
			name: scenario.name.clone(),
			status,
			verifications: std::mem::take(&mut *scenario.verifications.lock()),
			duration: started.elapsed(),
		}
	}

	/// Closes every session, then the browser. Session close is
	/// idempotent, so sessions already closed by the body are no-ops.
	async fn teardown(&self) {
		let sessions: Vec<Arc<Session>> = self.sessions.lock().clone();
		for session in sessions {
			if let Err(e) = session.close().await {
				warn!(
					target = "vouch",
					role = session.role(),
					error = %e,
					"session close failed during teardown"
				);
			}
		}
		if let Some(browser) = &self.browser {
			if let Err(e) = browser.close().await {
				warn!(target = "vouch", error = %e, "browser close failed during teardown");
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::action::ActionSpec;
	use crate::observe::ObservationSpec;
	use crate::poll::PollBudget;
	use crate::testing::{FakePage, fake_session};
	use crate::verify::{TargetExpectation, verify_effect};

	fn config() -> Arc<HarnessConfig> {
		let mut config = HarnessConfig::default();
		config.artifacts_dir =
			std::env::temp_dir().join(format!("vouch-scenario-tests-{}", std::process::id()));
		Arc::new(config)
	}

	#[tokio::test]
	async fn passing_body_yields_passed_report() {
		let scenario = Scenario::detached("smoke", config());
		let report = scenario
			.run(|scenario| async move {
				scenario.step("noop");
				Ok(())
			})
			.await;
		assert!(report.passed());
		assert_eq!(report.name, "smoke");
	}

	#[tokio::test]
	async fn failure_is_attributed_to_the_current_step() {
		let scenario = Scenario::detached("attribution", config());
		let report = scenario
			.run(|scenario| async move {
				scenario.step("login as admin");
				Err(VouchError::Authentication {
					role: "admin".to_string(),
					reason: "readiness marker missing".to_string(),
				})
			})
			.await;

		match report.status {
			ScenarioStatus::Failed { step, cause } => {
				assert_eq!(step, "login as admin");
				assert!(cause.contains("readiness marker"));
			}
			other => panic!("expected failure, got {other:?}"),
		}
	}

	#[tokio::test(start_paused = true)]
	async fn scenario_timeout_aborts_the_body() {
		let scenario =
			Scenario::detached("hung", config()).with_timeout(Duration::from_secs(1));
		let report = scenario
			.run(|scenario| async move {
				scenario.step("waiting forever");
				tokio::time::sleep(Duration::from_secs(3600)).await;
				Ok(())
			})
			.await;

		match report.status {
			ScenarioStatus::Failed { step, cause } => {
				assert_eq!(step, "waiting forever");
				assert!(cause.contains("timed out"));
			}
			other => panic!("expected timeout failure, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn teardown_closes_adopted_sessions_exactly_once() {
		let page = FakePage::new();
		let scenario = Scenario::detached("teardown", config());
		let tracked = page.clone();
		let report = scenario
			.run(|scenario| {
				let page = page.clone();
				async move {
					let session = scenario.adopt(fake_session("user", page));
					// The body closes it too; teardown must not double-release.
					session.close().await?;
					Ok(())
				}
			})
			.await;

		assert!(report.passed());
		assert_eq!(tracked.close_count(), 1);
	}

	#[tokio::test]
	async fn check_converts_failed_verification_into_step_error() {
		let scenario = Scenario::detached("check", config());
		let report = scenario
			.run(|scenario| async move {
				scenario.step("verify admin alert");

				let trigger_page = FakePage::new();
				let trigger = scenario.adopt(fake_session("user", trigger_page));
				let observer_page = FakePage::new();
				observer_page.push_eval(json!([]));
				let observer = scenario.adopt(fake_session("admin", observer_page));

				let result = verify_effect(
					&trigger,
					&ActionSpec::Click {
						name: "submit".to_string(),
						selector: "#go".to_string(),
					},
					vec![TargetExpectation::keywords(
						observer.as_ref(),
						"admin-alert",
						ObservationSpec::Notifications,
						&["nuevo recurso"],
						PollBudget::new(1, Duration::ZERO).unwrap(),
					)],
				)
				.await;
				scenario.check("admin alert", &result)
			})
			.await;

		assert!(!report.passed());
		assert_eq!(report.verifications.len(), 1);
		assert!(!report.verifications[0].passed);
		match report.status {
			ScenarioStatus::Failed { cause, .. } => {
				assert!(cause.contains("admin-alert"), "cause: {cause}");
			}
			other => panic!("expected failure, got {other:?}"),
		}
	}
}
