use thiserror::Error;

pub type Result<T> = std::result::Result<T, VouchError>;

#[derive(Debug, Error)]
pub enum VouchError {
	/// Login readiness marker never appeared; fatal to the scenario.
	#[error("authentication failed for '{role}': {reason}")]
	Authentication { role: String, reason: String },

	/// Target location unreachable within the navigation budget.
	#[error("navigation failed: {url}: {reason}")]
	Navigation { url: String, reason: String },

	#[error("element not found: {selector}")]
	ElementNotFound { selector: String },

	#[error("timeout after {ms}ms waiting for: {condition}")]
	Timeout { ms: u64, condition: String },

	/// A single declarative action's sub-step failed; never retried here.
	#[error("action '{action}' failed: {reason}")]
	ActionFailed { action: String, reason: String },

	/// A poll exhausted its attempts without a match.
	#[error("verification '{label}' timed out after {attempts} attempts")]
	VerificationTimeout { label: String, attempts: u32 },

	#[error("javascript evaluation failed: {0}")]
	JsEval(String),

	#[error("screenshot failed: {0}")]
	Screenshot(String),

	#[error("configuration error: {0}")]
	Config(String),

	/// Seeding endpoint answered with a non-success status.
	#[error("api request to {endpoint} failed with status {status}: {body}")]
	Api {
		endpoint: String,
		status: u16,
		body: String,
	},

	#[error("session '{0}' is closed")]
	SessionClosed(String),

	#[error(transparent)]
	Http(#[from] reqwest::Error),

	#[error(transparent)]
	Runtime(#[from] vouch_runtime::Error),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}

impl VouchError {
	/// True for failures that should abort the whole scenario rather than
	/// just the current verification.
	pub fn is_fatal(&self) -> bool {
		matches!(
			self,
			VouchError::Authentication { .. } | VouchError::SessionClosed(_)
		)
	}
}
