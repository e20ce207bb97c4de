//! Page-automation capability consumed by the engine.
//!
//! The core depends only on [`PageDriver`]; the production implementation
//! drives Chromium over the DevTools protocol ([`CdpPage`]), tests use
//! the scripted fake in [`crate::testing`].

mod cdp;
mod js;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

pub use cdp::CdpPage;
pub(crate) use js::{BODY_TEXT, collect_entries, count_matches, element_exists, seed_local_storage};

use crate::error::Result;

/// One captured console line from the page.
#[derive(Debug, Clone)]
pub struct ConsoleEntry {
	/// Console call type (`log`, `error`, `warning`, ...).
	pub kind: String,
	pub text: String,
}

impl std::fmt::Display for ConsoleEntry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "[{}] {}", self.kind, self.text)
	}
}

/// Driver primitives the engine needs from a page.
///
/// Implementations own exactly one page in exactly one isolated browser
/// context; nothing here is shared between sessions.
#[async_trait]
pub trait PageDriver: Send + Sync {
	/// Loads `url` and waits for document quiescence.
	async fn goto(&self, url: &str, timeout: Duration) -> Result<()>;

	/// Waits until `selector` matches at least one element.
	async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()>;

	/// Clicks the first element matching `selector`.
	async fn click(&self, selector: &str, timeout: Duration) -> Result<()>;

	/// Replaces the value of the matched input, firing framework-visible
	/// input/change events.
	async fn type_text(&self, selector: &str, text: &str, timeout: Duration) -> Result<()>;

	/// Chooses an option of the matched `<select>`.
	async fn select(&self, selector: &str, value: &str, timeout: Duration) -> Result<()>;

	/// Evaluates a JavaScript expression and returns its JSON value.
	async fn eval(&self, expression: &str) -> Result<Value>;

	/// Full-page PNG capture.
	async fn screenshot_png(&self) -> Result<Vec<u8>>;

	/// The most recent console lines, oldest first.
	fn console_tail(&self, limit: usize) -> Vec<ConsoleEntry>;

	/// Last successfully loaded URL.
	fn current_url(&self) -> String;

	/// Releases the underlying page and its browser context.
	async fn close(&self) -> Result<()>;
}
