//! HTTP API seeding: the setup shortcut around the UI.
//!
//! Registering actors and creating groups through the backend API keeps
//! scenarios focused on the flow under verification. Requests and
//! responses are opaque JSON; the engine asserts nothing about their
//! shape beyond the fields it needs.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{Value, json};
use tracing::debug;

use crate::config::HarnessConfig;
use crate::error::{Result, VouchError};

pub struct SeedClient {
	http: reqwest::Client,
	config: Arc<HarnessConfig>,
}

impl SeedClient {
	pub fn new(config: Arc<HarnessConfig>) -> Result<Self> {
		let http = reqwest::Client::builder()
			.timeout(config.timeouts.api_response)
			.build()?;
		Ok(Self { http, config })
	}

	/// `POST /register`: creates an account in the given role.
	pub async fn register(
		&self,
		name: &str,
		surname: &str,
		email: &str,
		password: &str,
		role: &str,
	) -> Result<Value> {
		self.post(
			"/register",
			None,
			&json!({
				"name": name,
				"surname": surname,
				"email": email,
				"password": password,
				"role": role,
			}),
		)
		.await
	}

	/// `POST /login` with `getToken`: returns the API token.
	pub async fn login_token(&self, email: &str, password: &str) -> Result<String> {
		let response = self
			.post(
				"/login",
				None,
				&json!({ "email": email, "password": password, "getToken": true }),
			)
			.await?;
		response
			.get("token")
			.and_then(Value::as_str)
			.map(str::to_string)
			.ok_or_else(|| VouchError::Api {
				endpoint: "/login".to_string(),
				status: 200,
				body: "response carries no token".to_string(),
			})
	}

	/// `POST /login` without `getToken`: returns the identity object.
	pub async fn login_identity(&self, email: &str, password: &str) -> Result<Value> {
		let response = self
			.post("/login", None, &json!({ "email": email, "password": password }))
			.await?;
		response.get("user").cloned().ok_or_else(|| VouchError::Api {
			endpoint: "/login".to_string(),
			status: 200,
			body: "response carries no user".to_string(),
		})
	}

	/// `POST /api/academic-groups`: creates a group, returns its object.
	pub async fn create_group(&self, token: &str, name: &str, description: &str) -> Result<Value> {
		let response = self
			.post(
				"/api/academic-groups",
				Some(token),
				&json!({
					"name": name,
					"description": description,
					"academicLevel": "Universidad",
					"grade": "Semestre 1",
					"maxStudents": 30,
					"subjects": ["Pruebas"],
				}),
			)
			.await?;
		Ok(response.get("data").cloned().unwrap_or(response))
	}

	/// `POST /api/academic-groups/{id}/invite`: invites (or creates and
	/// invites) a student by email.
	pub async fn invite_student(&self, token: &str, group_id: &str, email: &str) -> Result<Value> {
		self.post(
			&format!("/api/academic-groups/{group_id}/invite"),
			Some(token),
			&json!({ "email": email }),
		)
		.await
	}

	async fn post(&self, path: &str, token: Option<&str>, body: &Value) -> Result<Value> {
		let url = self.config.backend(path)?;
		let mut request = self.http.post(url).json(body);
		if let Some(token) = token {
			request = request.header("Authorization", token);
		}
		let response = request.send().await?;
		let status = response.status();
		let text = response.text().await?;
		let payload: Value =
			serde_json::from_str(&text).unwrap_or_else(|_| json!({ "raw": text }));

		debug!(target = "vouch", %path, status = status.as_u16(), "seed request");
		if status.is_client_error() || status.is_server_error() {
			return Err(VouchError::Api {
				endpoint: path.to_string(),
				status: status.as_u16(),
				body: payload.to_string(),
			});
		}
		Ok(payload)
	}
}

static UNIQUE_COUNTER: AtomicU64 = AtomicU64::new(0);

fn stamp() -> String {
	let millis = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|d| d.as_millis())
		.unwrap_or(0);
	let n = UNIQUE_COUNTER.fetch_add(1, Ordering::Relaxed);
	format!("{millis}{n:03}")
}

/// A process-unique email, so scenarios can re-run against a dirty backend.
pub fn unique_email(prefix: &str) -> String {
	format!("{prefix}.{}@test.com", stamp())
}

/// A process-unique display name.
pub fn unique_name(prefix: &str) -> String {
	format!("{prefix} {}", stamp())
}
