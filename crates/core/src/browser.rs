//! Browser handle: one launched Chromium per scenario.
//!
//! Sessions never share a browser context; the handle only exists to
//! amortize the process launch and to guarantee a hard teardown at the
//! end of a scenario, even when individual sessions leaked.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;
use vouch_runtime::{Connection, LaunchConfig, LaunchedBrowser, WsTransport};

use crate::config::HarnessConfig;
use crate::error::Result;
use crate::page::CdpPage;

pub struct Browser {
	launched: Mutex<Option<LaunchedBrowser>>,
	connection: Arc<Connection>,
	slow_mo: std::time::Duration,
}

impl Browser {
	/// Launches the browser process and connects the DevTools socket.
	pub async fn launch(config: &HarnessConfig) -> Result<Self> {
		let launch_config = LaunchConfig {
			headless: config.headless,
			..LaunchConfig::default()
		};
		let launched = vouch_runtime::launch(&launch_config).await?;
		let transport = WsTransport::connect(launched.ws_url()).await?;
		let (sender, incoming) = transport.start();
		let connection = Connection::new(sender, incoming);

		Ok(Self {
			launched: Mutex::new(Some(launched)),
			connection,
			slow_mo: config.slow_mo,
		})
	}

	/// Opens a page in a fresh isolated browser context.
	pub async fn new_page(&self) -> Result<CdpPage> {
		CdpPage::open(Arc::clone(&self.connection), self.slow_mo).await
	}

	/// Kills the browser process. Idempotent; all pages die with it.
	pub async fn close(&self) -> Result<()> {
		if let Some(mut launched) = self.launched.lock().await.take() {
			debug!(target = "vouch", "closing browser");
			launched.close().await?;
		}
		Ok(())
	}
}
