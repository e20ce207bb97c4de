//! Scripted in-memory doubles for engine tests.
//!
//! [`FakePage`] implements [`PageDriver`] with recorded operations, a
//! deny-list of "missing" selectors, and a queue of scripted evaluation
//! results, which is enough to exercise actions, observations, polling,
//! and verification without a browser.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::config::HarnessConfig;
use crate::error::{Result, VouchError};
use crate::evidence::EvidenceCollector;
use crate::page::{ConsoleEntry, PageDriver};
use crate::session::Session;

enum ScriptedEval {
	Value(Value),
	Error(String),
}

#[derive(Default)]
struct Inner {
	operations: Mutex<Vec<String>>,
	missing: Mutex<HashSet<String>>,
	eval_queue: Mutex<VecDeque<ScriptedEval>>,
	console: Mutex<Vec<ConsoleEntry>>,
	fail_screenshots: AtomicBool,
	fail_navigation: AtomicBool,
	closes: AtomicU32,
	url: Mutex<String>,
}

/// A scripted page: every selector exists unless removed, every eval pops
/// the next queued result (or `null` when the queue is dry).
#[derive(Clone, Default)]
pub struct FakePage {
	inner: Arc<Inner>,
}

impl FakePage {
	pub fn new() -> Self {
		Self::default()
	}

	/// Recorded driver operations, in call order.
	pub fn operations(&self) -> Vec<String> {
		self.inner.operations.lock().clone()
	}

	/// Makes `selector` unfindable from now on.
	pub fn remove_selector(&self, selector: &str) {
		self.inner.missing.lock().insert(selector.to_string());
	}

	/// Queues the next evaluation result.
	pub fn push_eval(&self, value: Value) {
		self.inner
			.eval_queue
			.lock()
			.push_back(ScriptedEval::Value(value));
	}

	/// Queues an evaluation failure (a transiently-broken read).
	pub fn push_eval_error(&self, reason: &str) {
		self.inner
			.eval_queue
			.lock()
			.push_back(ScriptedEval::Error(reason.to_string()));
	}

	pub fn push_console(&self, kind: &str, text: &str) {
		self.inner.console.lock().push(ConsoleEntry {
			kind: kind.to_string(),
			text: text.to_string(),
		});
	}

	pub fn fail_screenshots(&self) {
		self.inner.fail_screenshots.store(true, Ordering::SeqCst);
	}

	pub fn fail_navigation(&self) {
		self.inner.fail_navigation.store(true, Ordering::SeqCst);
	}

	pub fn close_count(&self) -> u32 {
		self.inner.closes.load(Ordering::SeqCst)
	}

	fn record(&self, operation: String) {
		self.inner.operations.lock().push(operation);
	}

	fn present(&self, selector: &str) -> bool {
		!self.inner.missing.lock().contains(selector)
	}

	fn require(&self, selector: &str) -> Result<()> {
		if self.present(selector) {
			Ok(())
		} else {
			Err(VouchError::ElementNotFound {
				selector: selector.to_string(),
			})
		}
	}
}

#[async_trait]
impl PageDriver for FakePage {
	async fn goto(&self, url: &str, _timeout: Duration) -> Result<()> {
		self.record(format!("goto {url}"));
		if self.inner.fail_navigation.load(Ordering::SeqCst) {
			return Err(VouchError::Navigation {
				url: url.to_string(),
				reason: "scripted failure".to_string(),
			});
		}
		*self.inner.url.lock() = url.to_string();
		Ok(())
	}

	async fn wait_for_selector(&self, selector: &str, _timeout: Duration) -> Result<()> {
		self.record(format!("wait {selector}"));
		self.require(selector)
	}

	async fn click(&self, selector: &str, _timeout: Duration) -> Result<()> {
		self.record(format!("click {selector}"));
		self.require(selector)
	}

	async fn type_text(&self, selector: &str, text: &str, _timeout: Duration) -> Result<()> {
		self.record(format!("type {selector} {text}"));
		self.require(selector)
	}

	async fn select(&self, selector: &str, value: &str, _timeout: Duration) -> Result<()> {
		self.record(format!("select {selector} {value}"));
		self.require(selector)
	}

	async fn eval(&self, _expression: &str) -> Result<Value> {
		match self.inner.eval_queue.lock().pop_front() {
			Some(ScriptedEval::Value(value)) => Ok(value),
			Some(ScriptedEval::Error(reason)) => Err(VouchError::JsEval(reason)),
			None => Ok(Value::Null),
		}
	}

	async fn screenshot_png(&self) -> Result<Vec<u8>> {
		if self.inner.fail_screenshots.load(Ordering::SeqCst) {
			return Err(VouchError::Screenshot("scripted failure".to_string()));
		}
		// Enough of a PNG header to be recognizable in artifacts.
		Ok(vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A])
	}

	fn console_tail(&self, limit: usize) -> Vec<ConsoleEntry> {
		let console = self.inner.console.lock();
		let skip = console.len().saturating_sub(limit);
		console.iter().skip(skip).cloned().collect()
	}

	fn current_url(&self) -> String {
		self.inner.url.lock().clone()
	}

	async fn close(&self) -> Result<()> {
		self.inner.closes.fetch_add(1, Ordering::SeqCst);
		Ok(())
	}
}

/// A session over a [`FakePage`] with default configuration, evidence
/// going to a per-process temp directory.
pub fn fake_session(role: &str, page: FakePage) -> Session {
	let artifacts = std::env::temp_dir().join(format!("vouch-test-artifacts-{}", std::process::id()));
	Session::anonymous(
		role,
		Box::new(page),
		Arc::new(HarnessConfig::default()),
		Arc::new(EvidenceCollector::new(artifacts)),
	)
}
