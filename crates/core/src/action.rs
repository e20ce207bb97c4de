//! Declarative actions and their single-shot executor.
//!
//! An [`ActionSpec`] names what should happen, not how; a mid-way failure
//! is therefore always attributable to one named action. Actions fire
//! once and never retry: retries belong to the polling layer, which
//! observes the action's *effect* asynchronously.

use serde_json::{Value, json};
use tracing::debug;

use crate::error::Result;
use crate::evidence::EvidenceRef;
use crate::session::Session;

/// One form field and the value to put in it.
#[derive(Debug, Clone)]
pub struct FieldValue {
	pub selector: String,
	pub input: FieldInput,
}

#[derive(Debug, Clone)]
pub enum FieldInput {
	/// Typed into an input or textarea.
	Text(String),
	/// Chosen in a `<select>`.
	Option(String),
}

impl FieldValue {
	pub fn text(selector: impl Into<String>, value: impl Into<String>) -> Self {
		Self {
			selector: selector.into(),
			input: FieldInput::Text(value.into()),
		}
	}

	pub fn option(selector: impl Into<String>, value: impl Into<String>) -> Self {
		Self {
			selector: selector.into(),
			input: FieldInput::Option(value.into()),
		}
	}
}

/// A named UI action against one session.
#[derive(Debug, Clone)]
pub enum ActionSpec {
	/// UI login with the configured selectors, confirmed by the readiness
	/// marker.
	Login { email: String, password: String },
	/// Fill a form and submit it, confirmed by a success marker.
	SubmitForm {
		name: String,
		/// Button that opens the form's modal, when it lives in one.
		open_modal: Option<String>,
		fields: Vec<FieldValue>,
		submit: String,
		success_marker: String,
	},
	/// A single named click.
	Click { name: String, selector: String },
}

impl ActionSpec {
	/// The name failures are attributed to.
	pub fn name(&self) -> &str {
		match self {
			ActionSpec::Login { .. } => "login",
			ActionSpec::SubmitForm { name, .. } => name,
			ActionSpec::Click { name, .. } => name,
		}
	}
}

/// Outcome of one executed action. Immutable once produced.
#[derive(Debug)]
pub enum ActionResult {
	Succeeded { payload: Value },
	Failed {
		reason: String,
		evidence: Option<EvidenceRef>,
	},
}

impl ActionResult {
	pub fn succeeded(&self) -> bool {
		matches!(self, ActionResult::Succeeded { .. })
	}

	pub fn failure_reason(&self) -> Option<&str> {
		match self {
			ActionResult::Succeeded { .. } => None,
			ActionResult::Failed { reason, .. } => Some(reason),
		}
	}
}

/// Runs `spec` against `session`; on any sub-step failure captures
/// evidence and reports `Failed` without retrying.
pub(crate) async fn execute(session: &Session, spec: &ActionSpec) -> ActionResult {
	match run(session, spec).await {
		Ok(payload) => {
			debug!(
				target = "vouch",
				role = session.role(),
				action = spec.name(),
				"action succeeded"
			);
			ActionResult::Succeeded { payload }
		}
		Err(e) => {
			let evidence = session
				.capture_evidence(&format!("action-{}", spec.name()))
				.await;
			ActionResult::Failed {
				reason: e.to_string(),
				evidence: Some(evidence),
			}
		}
	}
}

async fn run(session: &Session, spec: &ActionSpec) -> Result<Value> {
	let config = session.config();
	let timeouts = &config.timeouts;
	let page = session.page();

	match spec {
		ActionSpec::Login { email, password } => {
			let selectors = &config.selectors;
			session.navigate(&config.routes.login).await?;
			page.type_text(&selectors.login_email, email, timeouts.element_wait)
				.await?;
			page.type_text(&selectors.login_password, password, timeouts.element_wait)
				.await?;
			page.click(&selectors.login_submit, timeouts.element_wait)
				.await?;
			// The authenticated signal: anonymous pages never render this.
			page.wait_for_selector(&selectors.ready_marker, timeouts.form_submit)
				.await?;
			session.note_authenticated(email);
			Ok(json!({ "email": email }))
		}

		ActionSpec::SubmitForm {
			open_modal,
			fields,
			submit,
			success_marker,
			..
		} => {
			if let Some(opener) = open_modal {
				page.click(opener, timeouts.element_wait).await?;
			}
			for field in fields {
				match &field.input {
					FieldInput::Text(value) => {
						page.type_text(&field.selector, value, timeouts.element_wait)
							.await?;
					}
					FieldInput::Option(value) => {
						page.select(&field.selector, value, timeouts.element_wait)
							.await?;
					}
				}
			}
			page.click(submit, timeouts.element_wait).await?;
			page.wait_for_selector(success_marker, timeouts.form_submit)
				.await?;
			Ok(json!({ "confirmed_by": success_marker }))
		}

		ActionSpec::Click { selector, .. } => {
			page.click(selector, timeouts.element_wait).await?;
			Ok(Value::Null)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::HarnessConfig;
	use crate::testing::{FakePage, fake_session};

	fn login_spec() -> ActionSpec {
		ActionSpec::Login {
			email: "teacher@test.com".to_string(),
			password: "secret".to_string(),
		}
	}

	#[tokio::test]
	async fn login_drives_the_configured_selectors_in_order() {
		let page = FakePage::new();
		let session = fake_session("teacher", page.clone());

		let result = execute(&session, &login_spec()).await;
		assert!(result.succeeded(), "got {result:?}");

		let config = HarnessConfig::default();
		let ops = page.operations();
		assert_eq!(ops[0], "goto http://localhost:4200/login");
		assert_eq!(ops[1], format!("type {} teacher@test.com", config.selectors.login_email));
		assert_eq!(ops[2], format!("type {} secret", config.selectors.login_password));
		assert_eq!(ops[3], format!("click {}", config.selectors.login_submit));
		assert_eq!(ops[4], format!("wait {}", config.selectors.ready_marker));
	}

	#[tokio::test]
	async fn login_without_readiness_marker_fails_with_evidence() {
		let page = FakePage::new();
		page.remove_selector(&HarnessConfig::default().selectors.ready_marker);
		let session = fake_session("teacher", page.clone());

		let result = execute(&session, &login_spec()).await;

		match result {
			ActionResult::Failed { reason, evidence } => {
				assert!(reason.contains("element not found"), "reason: {reason}");
				assert!(evidence.is_some());
			}
			other => panic!("expected failure, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn form_submission_fills_fields_then_submits() {
		let page = FakePage::new();
		let session = fake_session("teacher", page.clone());

		let spec = ActionSpec::SubmitForm {
			name: "submit-resource".to_string(),
			open_modal: Some("button[data-bs-target=\"#add\"]".to_string()),
			fields: vec![
				FieldValue::text("input[formControlName=\"name\"]", "Recurso X"),
				FieldValue::option("select[formControlName=\"type\"]", "link"),
			],
			submit: "button[type=\"submit\"]".to_string(),
			success_marker: ".alert-success".to_string(),
		};

		let result = execute(&session, &spec).await;
		assert!(result.succeeded(), "got {result:?}");

		let ops = page.operations();
		assert_eq!(ops[0], "click button[data-bs-target=\"#add\"]");
		assert_eq!(ops[1], "type input[formControlName=\"name\"] Recurso X");
		assert_eq!(ops[2], "select select[formControlName=\"type\"] link");
		assert_eq!(ops[3], "click button[type=\"submit\"]");
		assert_eq!(ops[4], "wait .alert-success");
	}

	#[tokio::test]
	async fn failed_sub_step_is_attributed_to_the_action() {
		let page = FakePage::new();
		page.remove_selector(".alert-success");
		let session = fake_session("teacher", page.clone());

		let spec = ActionSpec::SubmitForm {
			name: "submit-resource".to_string(),
			open_modal: None,
			fields: Vec::new(),
			submit: "button[type=\"submit\"]".to_string(),
			success_marker: ".alert-success".to_string(),
		};

		let result = execute(&session, &spec).await;
		assert!(!result.succeeded());
		assert!(
			result.failure_reason().unwrap().contains(".alert-success"),
			"reason names the missing marker"
		);
	}

	#[test]
	fn spec_names_are_stable() {
		assert_eq!(login_spec().name(), "login");
	}
}
