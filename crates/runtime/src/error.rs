use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
	#[error("browser executable not found; set VOUCH_BROWSER or install Chromium")]
	BrowserNotFound,

	#[error("browser launch failed: {0}")]
	LaunchFailed(String),

	#[error("DevTools endpoint not announced within {0:?}")]
	EndpointTimeout(Duration),

	#[error("websocket error: {0}")]
	WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

	#[error("connection closed")]
	ConnectionClosed,

	#[error("protocol error: {0}")]
	Protocol(String),

	#[error("devtools error {code}: {message}")]
	Cdp { code: i64, message: String },

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}

impl Error {
	/// True when the browser endpoint is gone and retrying is pointless.
	pub fn is_closed(&self) -> bool {
		matches!(self, Error::ConnectionClosed)
	}
}
