//! Harness configuration: read once at process start, immutable thereafter.
//!
//! Defaults target a local deployment of the application under test and
//! every value can be overridden through `VOUCH_*` environment variables,
//! mirroring how the suite is pointed at staging environments.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::{Result, VouchError};

/// One actor's login credentials.
#[derive(Debug, Clone)]
pub struct Credentials {
	pub email: String,
	pub password: String,
}

impl Credentials {
	pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
		Self {
			email: email.into(),
			password: password.into(),
		}
	}
}

/// Timeout budget table; one knob per class of wait.
#[derive(Debug, Clone)]
pub struct TimeoutBudget {
	/// Full page navigation including quiescence.
	pub navigation: Duration,
	/// Waiting for a single element to appear.
	pub element_wait: Duration,
	/// Form submission round-trip until the success marker shows.
	pub form_submit: Duration,
	/// Seeding API response.
	pub api_response: Duration,
}

impl Default for TimeoutBudget {
	fn default() -> Self {
		Self {
			navigation: Duration::from_secs(30),
			element_wait: Duration::from_secs(10),
			form_submit: Duration::from_secs(15),
			api_response: Duration::from_secs(10),
		}
	}
}

/// Selectors for the application under test, kept out of scenario code so
/// a markup change is a one-line fix here.
#[derive(Debug, Clone)]
pub struct Selectors {
	pub login_email: String,
	pub login_password: String,
	pub login_submit: String,
	/// Post-login readiness marker; its appearance is the authenticated signal.
	pub ready_marker: String,
	pub notification_items: String,
	pub notification_unread: String,
	pub notification_badge: String,
}

impl Default for Selectors {
	fn default() -> Self {
		Self {
			login_email: "#email".to_string(),
			login_password: "#password".to_string(),
			login_submit: "button[type=\"submit\"]".to_string(),
			ready_marker: ".navbar".to_string(),
			notification_items: ".notification-item, .card-body, .alert".to_string(),
			notification_unread: ".notification-item:not(.read), .badge-danger, .notification-unread"
				.to_string(),
			notification_badge: ".notification-indicator, .badge, .fa-bell".to_string(),
		}
	}
}

/// Frontend routes the harness navigates to.
#[derive(Debug, Clone)]
pub struct Routes {
	pub login: String,
	pub home: String,
	pub notifications: String,
	pub resources: String,
	pub admin_resources: String,
}

impl Default for Routes {
	fn default() -> Self {
		Self {
			login: "/login".to_string(),
			home: "/inicio".to_string(),
			notifications: "/inicio/notificaciones".to_string(),
			resources: "/inicio/recursos".to_string(),
			admin_resources: "/admin/recursos".to_string(),
		}
	}
}

/// Process-wide harness configuration.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
	pub frontend_url: Url,
	pub backend_url: Url,
	pub admin: Credentials,
	pub timeouts: TimeoutBudget,
	pub selectors: Selectors,
	pub routes: Routes,
	/// Run browsers without visible windows.
	pub headless: bool,
	/// Artificial delay after each page interaction, for watching runs live.
	pub slow_mo: Duration,
	/// Where failure evidence lands.
	pub artifacts_dir: PathBuf,
}

impl Default for HarnessConfig {
	fn default() -> Self {
		Self {
			frontend_url: Url::parse("http://localhost:4200").expect("static url"),
			backend_url: Url::parse("http://localhost:3800").expect("static url"),
			admin: Credentials::new("admin@example.com", "admin123"),
			timeouts: TimeoutBudget::default(),
			selectors: Selectors::default(),
			routes: Routes::default(),
			headless: true,
			slow_mo: Duration::ZERO,
			artifacts_dir: PathBuf::from("artifacts"),
		}
	}
}

impl HarnessConfig {
	/// Builds the configuration from `VOUCH_*` environment variables over
	/// the defaults. Call once at startup; clone the result around.
	pub fn from_env() -> Result<Self> {
		let mut config = Self::default();

		if let Ok(value) = std::env::var("VOUCH_FRONTEND_URL") {
			config.frontend_url = parse_url("VOUCH_FRONTEND_URL", &value)?;
		}
		if let Ok(value) = std::env::var("VOUCH_BACKEND_URL") {
			config.backend_url = parse_url("VOUCH_BACKEND_URL", &value)?;
		}
		if let Ok(value) = std::env::var("VOUCH_ADMIN_EMAIL") {
			config.admin.email = value;
		}
		if let Ok(value) = std::env::var("VOUCH_ADMIN_PASSWORD") {
			config.admin.password = value;
		}
		if let Ok(value) = std::env::var("VOUCH_HEADLESS") {
			config.headless = value != "false" && value != "0";
		}
		if let Ok(value) = std::env::var("VOUCH_SLOWMO_MS") {
			let ms: u64 = value
				.parse()
				.map_err(|_| VouchError::Config(format!("VOUCH_SLOWMO_MS is not a number: {value}")))?;
			config.slow_mo = Duration::from_millis(ms);
		}
		if let Ok(value) = std::env::var("VOUCH_ARTIFACTS_DIR") {
			config.artifacts_dir = PathBuf::from(value);
		}

		Ok(config)
	}

	/// Resolves a frontend route against the base URL.
	pub fn frontend(&self, path: &str) -> Result<Url> {
		self.frontend_url
			.join(path)
			.map_err(|e| VouchError::Config(format!("bad frontend path '{path}': {e}")))
	}

	/// Resolves a backend endpoint against the base URL.
	pub fn backend(&self, path: &str) -> Result<Url> {
		self.backend_url
			.join(path)
			.map_err(|e| VouchError::Config(format!("bad backend path '{path}': {e}")))
	}
}

fn parse_url(name: &str, value: &str) -> Result<Url> {
	Url::parse(value).map_err(|e| VouchError::Config(format!("{name} is not a valid URL: {e}")))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_point_at_local_deployment() {
		let config = HarnessConfig::default();
		assert_eq!(config.frontend_url.as_str(), "http://localhost:4200/");
		assert_eq!(config.backend_url.as_str(), "http://localhost:3800/");
		assert!(config.headless);
		assert_eq!(config.timeouts.element_wait, Duration::from_secs(10));
	}

	#[test]
	fn frontend_join_keeps_base() {
		let config = HarnessConfig::default();
		let url = config.frontend("/inicio/notificaciones").unwrap();
		assert_eq!(url.as_str(), "http://localhost:4200/inicio/notificaciones");
	}

	#[test]
	fn bad_route_is_a_config_error() {
		let config = HarnessConfig::default();
		let err = config.frontend("http://[broken").unwrap_err();
		assert!(matches!(err, VouchError::Config(_)));
	}
}
