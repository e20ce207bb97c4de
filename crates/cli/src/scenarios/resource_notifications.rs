//! Resource-submission notification propagation.
//!
//! A freshly seeded facilitator suggests a resource through the UI; the
//! engine then proves, independently, that the submitter sees the
//! "sent for approval" notification and that the administrator sees the
//! "new resource pending" alert carrying the resource's literal title.
//! The post-approval notification is only propagated by some deployments,
//! so it is checked as a tolerated expectation.

use std::sync::Arc;

use vouch::{
	ActionSpec, FieldValue, HarnessConfig, ObservationSpec, PollBudget, Result, Scenario,
	ScenarioReport, SeedClient, TargetExpectation, VouchError, poll, unique_email, unique_name,
	verify_effect,
};

pub async fn run(config: Arc<HarnessConfig>) -> Result<ScenarioReport> {
	let scenario = Scenario::launch("resource-notifications", config).await?;
	Ok(scenario
		.run(|scenario| async move {
			let config = scenario.config();
			let seed = SeedClient::new(Arc::clone(&config))?;

			scenario.step("seed the submitting facilitator");
			let email = unique_email("facilitator");
			let password = "Test12345!";
			seed.register("Test", "Facilitator", &email, password, "expert")
				.await?;
			let token = seed.login_token(&email, password).await?;
			let identity = seed.login_identity(&email, password).await?;

			scenario.step("open the actor sessions");
			let user = scenario.anonymous_session("user").await?;
			user.seed_identity(&identity, &token).await?;
			let admin = scenario.open_session("admin", &config.admin).await?;

			scenario.step("suggest a resource");
			let title = unique_name("Recurso Test");
			user.navigate(&config.routes.resources).await?;
			let submit = ActionSpec::SubmitForm {
				name: "suggest-resource".to_string(),
				open_modal: Some("button[data-bs-target=\"#add\"]".to_string()),
				fields: vec![
					FieldValue::text("input[formControlName=\"name\"]", &title),
					FieldValue::option("select[formControlName=\"type\"]", "link"),
					FieldValue::text(
						"textarea[formControlName=\"description\"]",
						"Descripción del recurso de prueba",
					),
					FieldValue::text(
						"textarea[formControlName=\"justification\"]",
						"Justificación del recurso de prueba",
					),
					FieldValue::text("input[formControlName=\"source\"]", "Fuente de prueba"),
					FieldValue::text("input[formControlName=\"url\"]", "https://example.com"),
				],
				submit: "button[type=\"submit\"]".to_string(),
				success_marker: ".alert-success".to_string(),
			};

			scenario.step("verify cross-session notifications");
			let budget = PollBudget::default();
			let approval_budget = PollBudget::new(3, std::time::Duration::from_secs(5))?;
			let result = verify_effect(
				&user,
				&submit,
				vec![
					TargetExpectation::keywords(
						&user,
						"user-sees-submission",
						ObservationSpec::Notifications,
						&["recurso", "enviado", "aprobación"],
						budget,
					),
					TargetExpectation::keywords(
						&admin,
						"admin-sees-pending",
						ObservationSpec::Notifications,
						&["nuevo recurso", "pendiente", &title],
						budget,
					),
					TargetExpectation::keywords(
						&user,
						"user-sees-approval",
						ObservationSpec::Notifications,
						&["recurso", "aprobado"],
						approval_budget,
					)
					.tolerated(),
				],
			)
			.await;
			scenario.check("resource notifications", &result)?;

			scenario.step("verify the resource is listed");
			let listing = ObservationSpec::PageText {
				path: config.routes.resources.clone(),
			};
			let outcome = poll(
				budget,
				|| user.observe(&listing),
				|observation| observation.contains_keywords(&[&title]),
			)
			.await;
			if !outcome.matched() {
				user.capture_evidence("resource-listing").await;
				return Err(VouchError::VerificationTimeout {
					label: "resource-listed".to_string(),
					attempts: outcome.attempts_used(),
				});
			}

			Ok(())
		})
		.await)
}
