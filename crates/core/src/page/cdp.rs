//! [`PageDriver`] implementation over the Chrome DevTools protocol.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tracing::{debug, trace};
use vouch_protocol::runtime::{ConsoleApiCalled, Evaluate, EvaluateResult};
use vouch_protocol::target::{CloseTarget, DisposeBrowserContext};
use vouch_protocol::{page as page_proto, runtime as runtime_proto, target as target_proto};
use vouch_runtime::Connection;

use super::js;
use super::{ConsoleEntry, PageDriver};
use crate::error::{Result, VouchError};

/// Ring-buffer capacity for captured console lines.
const CONSOLE_BUFFER: usize = 200;

/// How often quiescence and element waits re-sample the page.
const WAIT_PROBE_INTERVAL: Duration = Duration::from_millis(100);

/// One page in one isolated browser context, attached over CDP.
pub struct CdpPage {
	connection: Arc<Connection>,
	session_id: String,
	target_id: String,
	browser_context_id: String,
	url: RwLock<String>,
	console: Arc<Mutex<VecDeque<ConsoleEntry>>>,
	slow_mo: Duration,
}

impl CdpPage {
	/// Creates an isolated context, opens a page in it, attaches, and
	/// enables the event domains. Called by [`crate::browser::Browser`].
	pub(crate) async fn open(connection: Arc<Connection>, slow_mo: Duration) -> Result<Self> {
		let context: target_proto::CreateBrowserContextResult = connection
			.call(
				None,
				target_proto::CreateBrowserContext::METHOD,
				&target_proto::CreateBrowserContext::default(),
			)
			.await?;

		let target: target_proto::CreateTargetResult = connection
			.call(
				None,
				target_proto::CreateTarget::METHOD,
				&target_proto::CreateTarget {
					url: "about:blank".to_string(),
					browser_context_id: Some(context.browser_context_id.clone()),
				},
			)
			.await?;

		let attached: target_proto::AttachToTargetResult = connection
			.call(
				None,
				target_proto::AttachToTarget::METHOD,
				&target_proto::AttachToTarget {
					target_id: target.target_id.clone(),
					flatten: true,
				},
			)
			.await?;

		let console = Arc::new(Mutex::new(VecDeque::with_capacity(CONSOLE_BUFFER)));
		let mut events = connection.subscribe(&attached.session_id);
		let sink = Arc::clone(&console);
		tokio::spawn(async move {
			while let Some(event) = events.recv().await {
				if event.method != runtime_proto::CONSOLE_API_CALLED {
					continue;
				}
				let Ok(payload) = serde_json::from_value::<ConsoleApiCalled>(event.params) else {
					continue;
				};
				let mut buffer = sink.lock();
				if buffer.len() == CONSOLE_BUFFER {
					buffer.pop_front();
				}
				buffer.push_back(ConsoleEntry {
					text: payload.text(),
					kind: payload.kind,
				});
			}
		});

		connection
			.send_command(Some(&attached.session_id), page_proto::ENABLE, Value::Null)
			.await?;
		connection
			.send_command(Some(&attached.session_id), runtime_proto::ENABLE, Value::Null)
			.await?;

		debug!(
			target = "vouch",
			session = %attached.session_id,
			context = %context.browser_context_id,
			"page attached"
		);
		Ok(Self {
			connection,
			session_id: attached.session_id,
			target_id: target.target_id,
			browser_context_id: context.browser_context_id,
			url: RwLock::new("about:blank".to_string()),
			console,
			slow_mo,
		})
	}

	async fn evaluate(&self, expression: &str) -> Result<Value> {
		let result: EvaluateResult = self
			.connection
			.call(
				Some(&self.session_id),
				Evaluate::METHOD,
				&Evaluate::expression(expression),
			)
			.await?;
		if let Some(details) = result.exception_details {
			return Err(VouchError::JsEval(details.message()));
		}
		Ok(result.result.value.unwrap_or(Value::Null))
	}

	/// Polls until the document settles or the deadline passes. Evaluation
	/// errors during the wait are expected (execution context teardown
	/// mid-navigation) and sampled again.
	async fn wait_quiescent(&self, url: &str, timeout: Duration) -> Result<()> {
		let deadline = tokio::time::Instant::now() + timeout;
		loop {
			match self.evaluate(js::READY_STATE_COMPLETE).await {
				Ok(Value::Bool(true)) => return Ok(()),
				Ok(_) => {}
				Err(e) => trace!(target = "vouch", error = %e, "quiescence probe failed"),
			}
			if tokio::time::Instant::now() >= deadline {
				return Err(VouchError::Navigation {
					url: url.to_string(),
					reason: format!("not quiescent within {}ms", timeout.as_millis()),
				});
			}
			tokio::time::sleep(WAIT_PROBE_INTERVAL).await;
		}
	}

	async fn pace(&self) {
		if !self.slow_mo.is_zero() {
			tokio::time::sleep(self.slow_mo).await;
		}
	}
}

#[async_trait]
impl PageDriver for CdpPage {
	async fn goto(&self, url: &str, timeout: Duration) -> Result<()> {
		let result: page_proto::NavigateResult = self
			.connection
			.call(
				Some(&self.session_id),
				page_proto::Navigate::METHOD,
				&page_proto::Navigate {
					url: url.to_string(),
				},
			)
			.await
			.map_err(|e| VouchError::Navigation {
				url: url.to_string(),
				reason: e.to_string(),
			})?;
		if let Some(error_text) = result.error_text {
			return Err(VouchError::Navigation {
				url: url.to_string(),
				reason: error_text,
			});
		}

		self.wait_quiescent(url, timeout).await?;
		*self.url.write() = url.to_string();
		self.pace().await;
		Ok(())
	}

	async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()> {
		let deadline = tokio::time::Instant::now() + timeout;
		let probe = js::element_exists(selector);
		loop {
			match self.evaluate(&probe).await {
				Ok(Value::Bool(true)) => return Ok(()),
				Ok(_) => {}
				Err(e) => trace!(target = "vouch", error = %e, "element probe failed"),
			}
			if tokio::time::Instant::now() >= deadline {
				return Err(VouchError::ElementNotFound {
					selector: selector.to_string(),
				});
			}
			tokio::time::sleep(WAIT_PROBE_INTERVAL).await;
		}
	}

	async fn click(&self, selector: &str, timeout: Duration) -> Result<()> {
		self.wait_for_selector(selector, timeout).await?;
		self.evaluate(&js::click(selector)).await?;
		self.pace().await;
		Ok(())
	}

	async fn type_text(&self, selector: &str, text: &str, timeout: Duration) -> Result<()> {
		self.wait_for_selector(selector, timeout).await?;
		self.evaluate(&js::set_input_value(selector, text)).await?;
		self.pace().await;
		Ok(())
	}

	async fn select(&self, selector: &str, value: &str, timeout: Duration) -> Result<()> {
		self.wait_for_selector(selector, timeout).await?;
		self.evaluate(&js::select_option(selector, value)).await?;
		self.pace().await;
		Ok(())
	}

	async fn eval(&self, expression: &str) -> Result<Value> {
		self.evaluate(expression).await
	}

	async fn screenshot_png(&self) -> Result<Vec<u8>> {
		let result: page_proto::CaptureScreenshotResult = self
			.connection
			.call(
				Some(&self.session_id),
				page_proto::CaptureScreenshot::METHOD,
				&page_proto::CaptureScreenshot::full_page_png(),
			)
			.await
			.map_err(|e| VouchError::Screenshot(e.to_string()))?;
		BASE64
			.decode(result.data)
			.map_err(|e| VouchError::Screenshot(format!("base64 decode: {e}")))
	}

	fn console_tail(&self, limit: usize) -> Vec<ConsoleEntry> {
		let buffer = self.console.lock();
		let skip = buffer.len().saturating_sub(limit);
		buffer.iter().skip(skip).cloned().collect()
	}

	fn current_url(&self) -> String {
		self.url.read().clone()
	}

	/// Best-effort release: the target and its context are closed, the
	/// event subscription dropped. Errors are logged, not surfaced: the
	/// browser teardown at scenario end is the backstop.
	async fn close(&self) -> Result<()> {
		if let Err(e) = self
			.connection
			.call::<_, Value>(
				None,
				CloseTarget::METHOD,
				&CloseTarget {
					target_id: self.target_id.clone(),
				},
			)
			.await
		{
			debug!(target = "vouch", error = %e, "target close failed");
		}
		if let Err(e) = self
			.connection
			.call::<_, Value>(
				None,
				DisposeBrowserContext::METHOD,
				&DisposeBrowserContext {
					browser_context_id: self.browser_context_id.clone(),
				},
			)
			.await
		{
			debug!(target = "vouch", error = %e, "context dispose failed");
		}
		self.connection.unsubscribe(&self.session_id);
		Ok(())
	}
}
