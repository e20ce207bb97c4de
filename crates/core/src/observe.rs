//! Point-in-time observations of application state.
//!
//! An [`Observation`] is a read-only snapshot taken by one poll attempt;
//! it is never mutated after capture and absence is a value, not an
//! error. Predicates are pure functions over a snapshot, which keeps the
//! poller testable without a browser.

use serde::{Deserialize, Serialize};

/// One visible notification entry, as rendered for the observed session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEntry {
	/// Full rendered text of the entry (title and body run together).
	pub text: String,
	/// Whether the entry is still marked unread.
	pub unread: bool,
}

/// What to read from a session. Interpreted by [`Session::observe`].
///
/// [`Session::observe`]: crate::session::Session::observe
#[derive(Debug, Clone)]
pub enum ObservationSpec {
	/// The session's visible notification entries.
	Notifications,
	/// Number of unread notifications.
	UnreadCount,
	/// Whether the navbar notification indicator is present.
	BadgeIndicator,
	/// The visible text of an arbitrary page.
	PageText { path: String },
}

impl ObservationSpec {
	/// Short description for logs and failure reports.
	pub fn describe(&self) -> String {
		match self {
			ObservationSpec::Notifications => "notifications".to_string(),
			ObservationSpec::UnreadCount => "unread count".to_string(),
			ObservationSpec::BadgeIndicator => "notification badge".to_string(),
			ObservationSpec::PageText { path } => format!("page text of {path}"),
		}
	}
}

/// A snapshot of queryable state, produced by one poll attempt.
#[derive(Debug, Clone, Serialize)]
pub enum Observation {
	Notifications(Vec<NotificationEntry>),
	Count(u64),
	Visibility(bool),
	PageText(String),
	/// The read itself failed (mid-navigation DOM, lost connection). Kept
	/// as a value so a timed-out poll can always report what it last saw.
	Unavailable { reason: String },
}

impl Observation {
	/// True when any notification entry (or the page text) contains every
	/// keyword, case-insensitively. Mirrors how a human scans the list:
	/// all keywords must land in the *same* entry.
	pub fn contains_keywords(&self, keywords: &[&str]) -> bool {
		match self {
			Observation::Notifications(entries) => entries.iter().any(|entry| {
				let haystack = entry.text.to_lowercase();
				keywords
					.iter()
					.all(|keyword| haystack.contains(&keyword.to_lowercase()))
			}),
			Observation::PageText(text) => {
				let haystack = text.to_lowercase();
				keywords
					.iter()
					.all(|keyword| haystack.contains(&keyword.to_lowercase()))
			}
			_ => false,
		}
	}

	/// Numeric value for count observations.
	pub fn count(&self) -> Option<u64> {
		match self {
			Observation::Count(n) => Some(*n),
			Observation::Notifications(entries) => Some(entries.len() as u64),
			_ => None,
		}
	}

	/// Truthiness for visibility observations.
	pub fn is_visible(&self) -> bool {
		matches!(self, Observation::Visibility(true))
	}

	/// One-line rendering for failure reports.
	pub fn summary(&self) -> String {
		match self {
			Observation::Notifications(entries) => {
				let preview: Vec<&str> = entries
					.iter()
					.take(5)
					.map(|entry| entry.text.as_str())
					.collect();
				format!("{} notification(s): {:?}", entries.len(), preview)
			}
			Observation::Count(n) => format!("count = {n}"),
			Observation::Visibility(v) => format!("visible = {v}"),
			Observation::PageText(text) => {
				format!("page text ({} chars)", text.len())
			}
			Observation::Unavailable { reason } => format!("unavailable: {reason}"),
		}
	}
}
