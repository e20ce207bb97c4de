//! Academic-group invitation visibility.
//!
//! Group and invitation are seeded over the backend API (the setup
//! shortcut); the verification is that the invited student's email
//! becomes visible in the teacher's roster page within the polling
//! budget, using an identity injected into the teacher's context.

use std::sync::Arc;

use vouch::{
	HarnessConfig, ObservationSpec, PollBudget, Result, Scenario, ScenarioReport, SeedClient,
	VouchError, poll, unique_email, unique_name,
};

pub async fn run(config: Arc<HarnessConfig>) -> Result<ScenarioReport> {
	let scenario = Scenario::launch("invite-student", config).await?;
	Ok(scenario
		.run(|scenario| async move {
			let config = scenario.config();
			let seed = SeedClient::new(Arc::clone(&config))?;

			scenario.step("seed the teacher and the group");
			let teacher_email = unique_email("teacher");
			let password = "Test12345!";
			seed.register("Test", "Teacher", &teacher_email, password, "expert")
				.await?;
			let token = seed.login_token(&teacher_email, password).await?;
			let identity = seed.login_identity(&teacher_email, password).await?;
			let group = seed
				.create_group(&token, &unique_name("Grupo Test"), "Grupo de pruebas automáticas")
				.await?;
			let group_id = group
				.get("_id")
				.and_then(serde_json::Value::as_str)
				.ok_or_else(|| VouchError::Api {
					endpoint: "/api/academic-groups".to_string(),
					status: 200,
					body: "group response carries no _id".to_string(),
				})?
				.to_string();

			scenario.step("invite the student over the API");
			let student_email = unique_email("student");
			seed.invite_student(&token, &group_id, &student_email).await?;

			scenario.step("teacher session observes the roster");
			let teacher = scenario.anonymous_session("teacher").await?;
			teacher.seed_identity(&identity, &token).await?;

			let roster = ObservationSpec::PageText {
				path: format!("/academia/groups/{group_id}"),
			};
			let outcome = poll(
				PollBudget::default(),
				|| teacher.observe(&roster),
				|observation| observation.contains_keywords(&[&student_email]),
			)
			.await;
			if !outcome.matched() {
				teacher.capture_evidence("student-roster").await;
				return Err(VouchError::VerificationTimeout {
					label: "student-in-roster".to_string(),
					attempts: outcome.attempts_used(),
				});
			}

			Ok(())
		})
		.await)
}
