//! Session Handle: one authenticated actor in one isolated browser context.
//!
//! A session owns exactly one page and one identity. Every navigate, act,
//! and observe is logged with a per-session monotonic sequence number so
//! interleaved timelines across sessions can be reconstructed during
//! failure analysis.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, info};

use crate::action::{self, ActionResult, ActionSpec};
use crate::config::{Credentials, HarnessConfig};
use crate::error::{Result, VouchError};
use crate::evidence::{EvidenceCollector, EvidenceRef};
use crate::observe::{NotificationEntry, Observation, ObservationSpec};
use crate::page::{self, PageDriver};

/// How long an observation waits for list markup before concluding the
/// list is empty. Short on purpose: absence is a valid observation.
const OBSERVE_SETTLE: Duration = Duration::from_secs(2);

/// The identity a session currently acts as.
#[derive(Debug, Clone)]
pub struct SessionIdentity {
	pub email: String,
	/// API token, present when the identity was seeded over HTTP.
	pub token: Option<String>,
}

/// One actor: an isolated authenticated browser context plus its page.
pub struct Session {
	role: String,
	page: Box<dyn PageDriver>,
	config: Arc<HarnessConfig>,
	evidence: Arc<EvidenceCollector>,
	identity: RwLock<Option<SessionIdentity>>,
	seq: AtomicU64,
	closed: AtomicBool,
}

impl Session {
	/// Opens an authenticated session: performs the UI login and waits
	/// for the readiness marker.
	///
	/// Fails with [`VouchError::Authentication`] when the marker never
	/// appears within the form-submit budget.
	pub async fn open(
		role: impl Into<String>,
		credentials: &Credentials,
		page: Box<dyn PageDriver>,
		config: Arc<HarnessConfig>,
		evidence: Arc<EvidenceCollector>,
	) -> Result<Self> {
		let session = Self::anonymous(role, page, config, evidence);
		let result = session
			.act(&ActionSpec::Login {
				email: credentials.email.clone(),
				password: credentials.password.clone(),
			})
			.await;
		match result {
			ActionResult::Succeeded { .. } => {
				info!(
					target = "vouch",
					role = %session.role,
					email = %credentials.email,
					"session authenticated"
				);
				Ok(session)
			}
			ActionResult::Failed { reason, .. } => Err(VouchError::Authentication {
				role: session.role.clone(),
				reason,
			}),
		}
	}

	/// A session with no identity yet; authenticate later through
	/// [`Session::act`] or [`Session::seed_identity`].
	pub fn anonymous(
		role: impl Into<String>,
		page: Box<dyn PageDriver>,
		config: Arc<HarnessConfig>,
		evidence: Arc<EvidenceCollector>,
	) -> Self {
		Self {
			role: role.into(),
			page,
			config,
			evidence,
			identity: RwLock::new(None),
			seq: AtomicU64::new(0),
			closed: AtomicBool::new(false),
		}
	}

	pub fn role(&self) -> &str {
		&self.role
	}

	/// The identity this session currently acts as, if any.
	pub fn identity(&self) -> Option<SessionIdentity> {
		self.identity.read().clone()
	}

	pub(crate) fn config(&self) -> &HarnessConfig {
		&self.config
	}

	pub(crate) fn page(&self) -> &dyn PageDriver {
		self.page.as_ref()
	}

	/// Records a fresh authentication, invalidating any prior identity.
	pub(crate) fn note_authenticated(&self, email: &str) {
		*self.identity.write() = Some(SessionIdentity {
			email: email.to_string(),
			token: None,
		});
	}

	fn next_seq(&self) -> u64 {
		self.seq.fetch_add(1, Ordering::SeqCst) + 1
	}

	fn ensure_open(&self) -> Result<()> {
		if self.closed.load(Ordering::SeqCst) {
			return Err(VouchError::SessionClosed(self.role.clone()));
		}
		Ok(())
	}

	/// Loads a frontend route and waits for quiescence.
	pub async fn navigate(&self, path: &str) -> Result<()> {
		self.ensure_open()?;
		let url = self.config.frontend(path)?;
		info!(
			target = "vouch",
			role = %self.role,
			seq = self.next_seq(),
			op = "navigate",
			%url,
		);
		self.page
			.goto(url.as_str(), self.config.timeouts.navigation)
			.await
	}

	/// Executes a declarative action. Failures come back as values, with
	/// evidence attached; the session stays usable.
	pub async fn act(&self, spec: &ActionSpec) -> ActionResult {
		if let Err(e) = self.ensure_open() {
			return ActionResult::Failed {
				reason: e.to_string(),
				evidence: None,
			};
		}
		info!(
			target = "vouch",
			role = %self.role,
			seq = self.next_seq(),
			op = "act",
			action = spec.name(),
		);
		action::execute(self, spec).await
	}

	/// Takes a point-in-time observation. Absence of the observed thing
	/// is a value, never an error; errors mean the read itself failed.
	pub async fn observe(&self, spec: &ObservationSpec) -> Result<Observation> {
		self.ensure_open()?;
		info!(
			target = "vouch",
			role = %self.role,
			seq = self.next_seq(),
			op = "observe",
			what = %spec.describe(),
		);

		let selectors = &self.config.selectors;
		match spec {
			ObservationSpec::Notifications => {
				self.navigate(&self.config.routes.notifications).await?;
				self.settle(&selectors.notification_items).await;
				let raw = self
					.page
					.eval(&page::collect_entries(&selectors.notification_items))
					.await?;
				let entries: Vec<NotificationEntry> = serde_json::from_value(raw)?;
				Ok(Observation::Notifications(entries))
			}
			ObservationSpec::UnreadCount => {
				self.navigate(&self.config.routes.notifications).await?;
				self.settle(&selectors.notification_items).await;
				let raw = self
					.page
					.eval(&page::count_matches(&selectors.notification_unread))
					.await?;
				Ok(Observation::Count(raw.as_u64().unwrap_or(0)))
			}
			ObservationSpec::BadgeIndicator => {
				self.navigate(&self.config.routes.home).await?;
				let raw = self
					.page
					.eval(&page::element_exists(&selectors.notification_badge))
					.await?;
				Ok(Observation::Visibility(raw.as_bool().unwrap_or(false)))
			}
			ObservationSpec::PageText { path } => {
				self.navigate(path).await?;
				let raw = self.page.eval(page::BODY_TEXT).await?;
				let text = raw.as_str().unwrap_or_default().to_string();
				Ok(Observation::PageText(text))
			}
		}
	}

	/// Waits briefly for list markup to render; an empty page is fine.
	async fn settle(&self, selector: &str) {
		if let Err(e) = self.page.wait_for_selector(selector, OBSERVE_SETTLE).await {
			debug!(
				target = "vouch",
				role = %self.role,
				error = %e,
				"no list markup; treating as empty"
			);
		}
	}

	/// Injects a seeded identity and token into the context's client-side
	/// storage in one step. Nothing reads these back implicitly; the
	/// session's identity field is the source of truth in-process.
	pub async fn seed_identity(&self, identity: &Value, token: &str) -> Result<()> {
		self.ensure_open()?;
		let email = identity
			.get("email")
			.and_then(Value::as_str)
			.unwrap_or_default()
			.to_string();
		info!(
			target = "vouch",
			role = %self.role,
			seq = self.next_seq(),
			op = "seed_identity",
			%email,
		);

		// Storage is origin-scoped; make sure an app page is loaded first.
		self.navigate(&self.config.routes.login).await?;
		let identity_json = serde_json::to_string(identity)?;
		self.page
			.eval(&page::seed_local_storage(&identity_json, token))
			.await?;

		*self.identity.write() = Some(SessionIdentity {
			email,
			token: Some(token.to_string()),
		});
		Ok(())
	}

	/// Captures failure evidence for this session.
	pub async fn capture_evidence(&self, label: &str) -> EvidenceRef {
		self.evidence
			.capture_failure(self.page.as_ref(), &self.role, label)
			.await
	}

	/// Releases the underlying browser context. Idempotent: the second
	/// and later calls are no-ops and never touch the driver again.
	pub async fn close(&self) -> Result<()> {
		if self.closed.swap(true, Ordering::SeqCst) {
			return Ok(());
		}
		debug!(target = "vouch", role = %self.role, "closing session");
		self.page.close().await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{FakePage, fake_session};

	#[tokio::test]
	async fn close_twice_releases_context_once() {
		let page = FakePage::new();
		let session = fake_session("user", page.clone());

		session.close().await.unwrap();
		session.close().await.unwrap();

		assert_eq!(page.close_count(), 1);
	}

	#[tokio::test]
	async fn operations_on_closed_session_are_rejected() {
		let page = FakePage::new();
		let session = fake_session("user", page.clone());
		session.close().await.unwrap();

		let err = session.navigate("/inicio").await.unwrap_err();
		assert!(matches!(err, VouchError::SessionClosed(_)));

		let result = session
			.act(&ActionSpec::Click {
				name: "noop".to_string(),
				selector: "#x".to_string(),
			})
			.await;
		assert!(!result.succeeded());
	}

	#[tokio::test]
	async fn notifications_observation_parses_entries() {
		let page = FakePage::new();
		page.push_eval(serde_json::json!([
			{ "text": "Nuevo recurso pendiente", "unread": true },
			{ "text": "Bienvenida", "unread": false },
		]));
		let session = fake_session("admin", page.clone());

		let observation = session
			.observe(&ObservationSpec::Notifications)
			.await
			.unwrap();

		match observation {
			Observation::Notifications(entries) => {
				assert_eq!(entries.len(), 2);
				assert!(entries[0].unread);
				assert!(!entries[1].unread);
			}
			other => panic!("expected notifications, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn absence_is_an_observation_not_an_error() {
		let page = FakePage::new();
		page.push_eval(serde_json::json!([]));
		let session = fake_session("user", page.clone());

		let observation = session
			.observe(&ObservationSpec::Notifications)
			.await
			.unwrap();
		assert_eq!(observation.count(), Some(0));
	}

	#[tokio::test]
	async fn seed_identity_updates_in_memory_identity() {
		let page = FakePage::new();
		let session = fake_session("teacher", page.clone());

		session
			.seed_identity(
				&serde_json::json!({ "email": "teacher@test.com", "role": "expert" }),
				"tok-123",
			)
			.await
			.unwrap();

		let identity = session.identity().unwrap();
		assert_eq!(identity.email, "teacher@test.com");
		assert_eq!(identity.token.as_deref(), Some("tok-123"));
	}

	#[tokio::test]
	async fn sequence_numbers_are_monotonic_per_session() {
		let page = FakePage::new();
		page.push_eval(serde_json::json!([]));
		let session = fake_session("user", page.clone());

		session.navigate("/inicio").await.unwrap();
		session
			.observe(&ObservationSpec::Notifications)
			.await
			.unwrap();

		// navigate(1) + observe(2) + observe's inner navigate(3)
		assert_eq!(session.seq.load(Ordering::SeqCst), 3);
	}
}
