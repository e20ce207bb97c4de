//! Cross-Session Verifier: one trigger, many independently-polled targets.
//!
//! Verification is decomposed per target so "the user saw a confirmation"
//! and "the admin saw a pending-approval alert" are independently provable
//! and independently diagnosable. Target polls run concurrently; no part
//! of the result depends on which poll resolves first.

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{info, warn};

use crate::action::{ActionResult, ActionSpec};
use crate::evidence::EvidenceRef;
use crate::observe::{Observation, ObservationSpec};
use crate::poll::{PollBudget, PollOutcome, poll};
use crate::session::Session;

type Predicate = Arc<dyn Fn(&Observation) -> bool + Send + Sync>;

/// One expected effect in one target session.
pub struct TargetExpectation<'a> {
	session: &'a Session,
	label: String,
	spec: ObservationSpec,
	predicate: Predicate,
	budget: PollBudget,
	optional: bool,
}

impl<'a> TargetExpectation<'a> {
	pub fn new(
		session: &'a Session,
		label: impl Into<String>,
		spec: ObservationSpec,
		predicate: impl Fn(&Observation) -> bool + Send + Sync + 'static,
		budget: PollBudget,
	) -> Self {
		Self {
			session,
			label: label.into(),
			spec,
			predicate: Arc::new(predicate),
			budget,
			optional: false,
		}
	}

	/// Expectation that an observation contains every keyword.
	pub fn keywords(
		session: &'a Session,
		label: impl Into<String>,
		spec: ObservationSpec,
		keywords: &[&str],
		budget: PollBudget,
	) -> Self {
		let owned: Vec<String> = keywords.iter().map(|k| k.to_string()).collect();
		Self::new(
			session,
			label,
			spec,
			move |observation| {
				let refs: Vec<&str> = owned.iter().map(String::as_str).collect();
				observation.contains_keywords(&refs)
			},
			budget,
		)
	}

	/// Marks the expectation as reported-but-non-fatal: a timeout shows
	/// up in the result without failing the verification. Used for flows
	/// the application only propagates sometimes (e.g. auto-approval).
	pub fn tolerated(mut self) -> Self {
		self.optional = true;
		self
	}
}

/// Terminal state of one target's poll.
#[derive(Debug)]
pub enum TargetStatus {
	Matched { attempts_used: u32 },
	TimedOut {
		attempts_used: u32,
		last_observation: Observation,
	},
}

/// Per-target record inside a [`VerificationResult`].
#[derive(Debug)]
pub struct TargetReport {
	pub label: String,
	pub role: String,
	pub optional: bool,
	pub status: TargetStatus,
	/// Captured when a required target timed out.
	pub evidence: Option<EvidenceRef>,
}

impl TargetReport {
	pub fn matched(&self) -> bool {
		matches!(self.status, TargetStatus::Matched { .. })
	}

	/// Matched, or timed out but tolerated.
	pub fn acceptable(&self) -> bool {
		self.matched() || self.optional
	}

	/// One-line rendering for reports.
	pub fn describe(&self) -> String {
		match &self.status {
			TargetStatus::Matched { attempts_used } => {
				format!("{} ({}): matched on attempt {attempts_used}", self.label, self.role)
			}
			TargetStatus::TimedOut {
				attempts_used,
				last_observation,
			} => {
				let mut line = format!(
					"{} ({}): timed out after {attempts_used} attempts; last seen: {}",
					self.label,
					self.role,
					last_observation.summary()
				);
				if let Some(screenshot) = self.evidence.as_ref().and_then(|e| e.screenshot.as_deref())
				{
					line.push_str(&format!("; evidence: {}", screenshot.display()));
				}
				line
			}
		}
	}
}

/// Aggregate verdict: all-or-nothing over required targets, with partial
/// success still fully recorded.
#[derive(Debug)]
pub enum VerificationResult {
	Passed { targets: Vec<TargetReport> },
	/// The trigger action itself failed; no target was polled.
	TriggerFailed {
		action: String,
		result: ActionResult,
	},
	Failed { targets: Vec<TargetReport> },
}

impl VerificationResult {
	pub fn passed(&self) -> bool {
		matches!(self, VerificationResult::Passed { .. })
	}

	pub fn targets(&self) -> &[TargetReport] {
		match self {
			VerificationResult::Passed { targets } | VerificationResult::Failed { targets } => {
				targets
			}
			VerificationResult::TriggerFailed { .. } => &[],
		}
	}

	/// Human-readable summary naming every target's outcome.
	pub fn summary(&self) -> String {
		match self {
			VerificationResult::Passed { targets } => {
				format!("passed ({} target(s))", targets.len())
			}
			VerificationResult::TriggerFailed { action, result } => format!(
				"trigger action '{action}' failed: {}",
				result.failure_reason().unwrap_or("unknown")
			),
			VerificationResult::Failed { targets } => {
				let lines: Vec<String> = targets.iter().map(TargetReport::describe).collect();
				format!("failed: {}", lines.join("; "))
			}
		}
	}
}

/// Executes `action` on `trigger`, then polls every target expectation
/// concurrently. Succeeds only if all required targets match; an empty
/// target list with a successful trigger is vacuously true.
pub async fn verify_effect(
	trigger: &Session,
	action: &ActionSpec,
	targets: Vec<TargetExpectation<'_>>,
) -> VerificationResult {
	let result = trigger.act(action).await;
	if !result.succeeded() {
		warn!(
			target = "vouch",
			role = trigger.role(),
			action = action.name(),
			"trigger action failed; skipping target polls"
		);
		return VerificationResult::TriggerFailed {
			action: action.name().to_string(),
			result,
		};
	}

	let reports = join_all(targets.into_iter().map(|expectation| async move {
		let TargetExpectation {
			session,
			label,
			spec,
			predicate,
			budget,
			optional,
		} = expectation;

		let outcome = poll(budget, || session.observe(&spec), |o| (*predicate)(o)).await;
		info!(
			target = "vouch",
			role = session.role(),
			%label,
			matched = outcome.matched(),
			attempts = outcome.attempts_used(),
			"target poll finished"
		);

		let (status, evidence) = match outcome {
			PollOutcome::Matched { attempts_used, .. } => {
				(TargetStatus::Matched { attempts_used }, None)
			}
			PollOutcome::TimedOut {
				last_observation,
				attempts_used,
			} => {
				let evidence = if optional {
					None
				} else {
					Some(session.capture_evidence(&format!("verify-{label}")).await)
				};
				(
					TargetStatus::TimedOut {
						attempts_used,
						last_observation,
					},
					evidence,
				)
			}
		};

		TargetReport {
			label,
			role: session.role().to_string(),
			optional,
			status,
			evidence,
		}
	}))
	.await;

	if reports.iter().all(TargetReport::acceptable) {
		VerificationResult::Passed { targets: reports }
	} else {
		VerificationResult::Failed { targets: reports }
	}
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use super::*;
	use crate::testing::{FakePage, fake_session};

	fn entry_json(texts: &[&str]) -> serde_json::Value {
		serde_json::Value::Array(
			texts
				.iter()
				.map(|text| serde_json::json!({ "text": text, "unread": true }))
				.collect(),
		)
	}

	fn noop_click() -> ActionSpec {
		ActionSpec::Click {
			name: "submit-resource".to_string(),
			selector: "#go".to_string(),
		}
	}

	fn fast_budget(attempts: u32) -> PollBudget {
		PollBudget::new(attempts, Duration::ZERO).unwrap()
	}

	#[tokio::test]
	async fn empty_targets_with_successful_trigger_is_vacuously_true() {
		let page = FakePage::new();
		let session = fake_session("user", page);

		let result = verify_effect(&session, &noop_click(), Vec::new()).await;
		assert!(result.passed());
		assert!(result.targets().is_empty());
	}

	#[tokio::test]
	async fn failed_trigger_short_circuits() {
		let page = FakePage::new();
		page.remove_selector("#go");
		let session = fake_session("user", page);

		let result = verify_effect(&session, &noop_click(), Vec::new()).await;

		match result {
			VerificationResult::TriggerFailed { action, result } => {
				assert_eq!(action, "submit-resource");
				assert!(!result.succeeded());
			}
			other => panic!("expected TriggerFailed, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn all_or_nothing_names_the_timed_out_target() {
		let trigger_page = FakePage::new();
		let trigger = fake_session("user", trigger_page);

		// T1 matches on its second observation.
		let t1_page = FakePage::new();
		t1_page.push_eval(entry_json(&[]));
		t1_page.push_eval(entry_json(&["Recurso enviado para aprobación"]));
		let t1 = fake_session("user", t1_page);

		// T2 never matches.
		let t2_page = FakePage::new();
		for _ in 0..3 {
			t2_page.push_eval(entry_json(&["otra cosa"]));
		}
		let t2 = fake_session("admin", t2_page);

		let result = verify_effect(
			&trigger,
			&noop_click(),
			vec![
				TargetExpectation::keywords(
					&t1,
					"user-confirmation",
					ObservationSpec::Notifications,
					&["recurso", "aprobación"],
					fast_budget(3),
				),
				TargetExpectation::keywords(
					&t2,
					"admin-alert",
					ObservationSpec::Notifications,
					&["nuevo recurso"],
					fast_budget(3),
				),
			],
		)
		.await;

		assert!(!result.passed());
		let targets = result.targets();
		assert_eq!(targets.len(), 2);

		let t1_report = targets.iter().find(|t| t.label == "user-confirmation").unwrap();
		assert!(t1_report.matched(), "partial success must be recorded");
		assert!(matches!(
			t1_report.status,
			TargetStatus::Matched { attempts_used: 2 }
		));

		let t2_report = targets.iter().find(|t| t.label == "admin-alert").unwrap();
		assert!(!t2_report.matched());
		match &t2_report.status {
			TargetStatus::TimedOut {
				attempts_used,
				last_observation,
			} => {
				assert_eq!(*attempts_used, 3);
				assert!(last_observation.contains_keywords(&["otra cosa"]));
			}
			other => panic!("expected TimedOut, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn resource_submission_effects_are_independently_provable() {
		let title = "Recurso Test 1723";

		let trigger_page = FakePage::new();
		let user = fake_session("user", trigger_page.clone());

		// The submitting user's own notification settles on attempt 2.
		let user_obs_page = FakePage::new();
		user_obs_page.push_eval(entry_json(&[]));
		user_obs_page.push_eval(entry_json(&["Tu resource fue enviado y está pending approval"]));
		let user_observer = fake_session("user", user_obs_page);

		// The admin sees the pending alert with the literal title on attempt 3.
		let admin_page = FakePage::new();
		admin_page.push_eval(entry_json(&[]));
		admin_page.push_eval(entry_json(&["otro aviso"]));
		admin_page.push_eval(entry_json(&[&format!("new resource {title} awaiting review")]));
		let admin = fake_session("admin", admin_page);

		let budget = PollBudget::new(5, Duration::ZERO).unwrap();
		let result = verify_effect(
			&user,
			&noop_click(),
			vec![
				TargetExpectation::keywords(
					&user_observer,
					"user-sees-pending",
					ObservationSpec::Notifications,
					&["resource", "pending approval"],
					budget,
				),
				TargetExpectation::keywords(
					&admin,
					"admin-sees-new-resource",
					ObservationSpec::Notifications,
					&["new resource", title],
					budget,
				),
			],
		)
		.await;

		assert!(result.passed(), "summary: {}", result.summary());
		let attempts: Vec<u32> = result
			.targets()
			.iter()
			.map(|t| match t.status {
				TargetStatus::Matched { attempts_used } => attempts_used,
				_ => panic!("both targets must match"),
			})
			.collect();
		assert_eq!(attempts, vec![2, 3]);
	}

	#[tokio::test]
	async fn tolerated_timeout_reports_but_does_not_fail() {
		let trigger_page = FakePage::new();
		let trigger = fake_session("user", trigger_page);

		let obs_page = FakePage::new();
		for _ in 0..2 {
			obs_page.push_eval(entry_json(&[]));
		}
		let observer = fake_session("user", obs_page);

		let result = verify_effect(
			&trigger,
			&noop_click(),
			vec![
				TargetExpectation::keywords(
					&observer,
					"auto-approval",
					ObservationSpec::Notifications,
					&["aprobado"],
					fast_budget(2),
				)
				.tolerated(),
			],
		)
		.await;

		assert!(result.passed());
		let report = &result.targets()[0];
		assert!(!report.matched());
		assert!(report.optional);
		assert!(report.evidence.is_none(), "tolerated targets skip evidence");
	}
}
