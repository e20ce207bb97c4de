//! WebSocket transport for the DevTools endpoint.
//!
//! One socket carries traffic for every attached session; the reader task
//! forwards each parsed frame to the connection layer, the writer task
//! serializes outbound commands. Both tasks end when the socket closes,
//! which the connection layer observes as channel closure.

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Outbound channel depth; DevTools commands are small and acked quickly.
const OUTBOUND_BUFFER: usize = 256;
const INBOUND_BUFFER: usize = 256;

/// An established DevTools socket, not yet pumping messages.
pub struct WsTransport {
	stream: WsStream,
}

/// Handle for writing commands to the socket.
#[derive(Clone)]
pub struct MessageSender {
	pub(crate) tx: mpsc::Sender<Value>,
}

impl MessageSender {
	/// Queues one command frame for transmission.
	pub async fn send(&self, message: Value) -> Result<()> {
		self.tx
			.send(message)
			.await
			.map_err(|_| Error::ConnectionClosed)
	}
}

impl WsTransport {
	/// Connects to the browser's announced WebSocket debugger URL.
	pub async fn connect(url: &str) -> Result<Self> {
		debug!(target = "vouch", %url, "connecting DevTools socket");
		let (stream, _response) = connect_async(url).await?;
		Ok(Self { stream })
	}

	/// Splits the socket into pump tasks and returns the endpoints:
	/// a [`MessageSender`] for outbound commands and the inbound frame
	/// receiver consumed by the connection layer.
	pub fn start(self) -> (MessageSender, mpsc::Receiver<Value>) {
		let (mut write, mut read) = self.stream.split();
		let (out_tx, mut out_rx) = mpsc::channel::<Value>(OUTBOUND_BUFFER);
		let (in_tx, in_rx) = mpsc::channel::<Value>(INBOUND_BUFFER);

		tokio::spawn(async move {
			while let Some(message) = out_rx.recv().await {
				let text = match serde_json::to_string(&message) {
					Ok(text) => text,
					Err(e) => {
						warn!(target = "vouch", error = %e, "dropping unserializable frame");
						continue;
					}
				};
				trace!(target = "vouch", frame = %text, "send");
				if let Err(e) = write.send(WsMessage::Text(text.into())).await {
					warn!(target = "vouch", error = %e, "DevTools socket write failed");
					break;
				}
			}
			let _ = write.close().await;
		});

		tokio::spawn(async move {
			while let Some(frame) = read.next().await {
				match frame {
					Ok(WsMessage::Text(text)) => {
						let parsed: Value = match serde_json::from_str(&text) {
							Ok(parsed) => parsed,
							Err(e) => {
								warn!(target = "vouch", error = %e, "malformed DevTools frame");
								continue;
							}
						};
						trace!(target = "vouch", frame = %text, "recv");
						if in_tx.send(parsed).await.is_err() {
							break;
						}
					}
					Ok(WsMessage::Close(_)) => {
						debug!(target = "vouch", "DevTools socket closed by peer");
						break;
					}
					Ok(_) => {}
					Err(e) => {
						warn!(target = "vouch", error = %e, "DevTools socket read failed");
						break;
					}
				}
			}
		});

		(MessageSender { tx: out_tx }, in_rx)
	}
}
