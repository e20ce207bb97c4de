//! Failure evidence: screenshots and console tails.
//!
//! Capture is strictly best-effort. A failure to collect evidence is
//! logged and swallowed so it can never mask the failure that triggered
//! the capture in the first place.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tracing::{debug, warn};

use crate::page::PageDriver;

/// Console lines attached to each evidence capture.
const CONSOLE_TAIL: usize = 20;

/// Reference to captured diagnostics, embeddable in failure reports.
#[derive(Debug, Clone, Serialize)]
pub struct EvidenceRef {
	pub label: String,
	pub role: String,
	/// Saved screenshot, when the capture succeeded.
	pub screenshot: Option<PathBuf>,
	/// Recent console lines, oldest first.
	pub console: Vec<String>,
	/// Capture time, milliseconds since the epoch.
	pub captured_at_ms: u64,
}

/// Writes failure artifacts under one directory per scenario.
pub struct EvidenceCollector {
	dir: PathBuf,
}

impl EvidenceCollector {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self { dir: dir.into() }
	}

	/// Captures a screenshot and the console tail for `page`.
	///
	/// Never fails: whatever could not be collected is simply absent from
	/// the returned [`EvidenceRef`].
	pub async fn capture_failure(
		&self,
		page: &dyn PageDriver,
		role: &str,
		label: &str,
	) -> EvidenceRef {
		let captured_at_ms = SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.map(|d| d.as_millis() as u64)
			.unwrap_or(0);

		let console = page
			.console_tail(CONSOLE_TAIL)
			.into_iter()
			.map(|entry| entry.to_string())
			.collect();

		let screenshot = match self.save_screenshot(page, label, captured_at_ms).await {
			Ok(path) => Some(path),
			Err(reason) => {
				warn!(target = "vouch", %label, %reason, "evidence screenshot skipped");
				None
			}
		};

		debug!(
			target = "vouch",
			%role,
			%label,
			screenshot = screenshot.is_some(),
			"captured failure evidence"
		);
		EvidenceRef {
			label: label.to_string(),
			role: role.to_string(),
			screenshot,
			console,
			captured_at_ms,
		}
	}

	async fn save_screenshot(
		&self,
		page: &dyn PageDriver,
		label: &str,
		timestamp: u64,
	) -> std::result::Result<PathBuf, String> {
		std::fs::create_dir_all(&self.dir).map_err(|e| e.to_string())?;
		let bytes = page.screenshot_png().await.map_err(|e| e.to_string())?;
		let path = self
			.dir
			.join(format!("{}-{timestamp}-failure.png", sanitize(label)));
		std::fs::write(&path, bytes).map_err(|e| e.to_string())?;
		Ok(path)
	}
}

/// Keeps labels filesystem-safe without losing readability.
fn sanitize(label: &str) -> String {
	label
		.chars()
		.map(|c| {
			if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
				c
			} else {
				'-'
			}
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use tempfile::TempDir;

	use super::*;
	use crate::testing::FakePage;

	#[tokio::test]
	async fn capture_writes_screenshot_and_console() {
		let temp = TempDir::new().unwrap();
		let collector = EvidenceCollector::new(temp.path());
		let page = FakePage::new();
		page.push_console("error", "Browser Console Error: boom");

		let evidence = collector.capture_failure(&page, "admin", "verify-alert").await;

		let path = evidence.screenshot.expect("screenshot saved");
		assert!(path.exists());
		assert_eq!(evidence.console.len(), 1);
		assert!(evidence.console[0].contains("boom"));
	}

	#[tokio::test]
	async fn capture_never_fails_when_screenshot_does() {
		let temp = TempDir::new().unwrap();
		let collector = EvidenceCollector::new(temp.path());
		let page = FakePage::new();
		page.fail_screenshots();

		let evidence = collector.capture_failure(&page, "user", "verify-alert").await;

		assert!(evidence.screenshot.is_none());
		assert_eq!(evidence.label, "verify-alert");
	}

	#[test]
	fn labels_are_sanitized_for_filenames() {
		assert_eq!(sanitize("verify notif/álbum"), "verify-notif--lbum");
	}
}
