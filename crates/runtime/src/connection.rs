//! Request/response correlation on top of the transport.
//!
//! Commands get a process-unique id and a oneshot callback; the dispatch
//! task resolves callbacks as responses arrive and fans session-scoped
//! events out to per-session subscribers. When the transport dies, every
//! pending callback is failed with [`Error::ConnectionClosed`] so no
//! caller hangs on a dead socket.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};
use vouch_protocol::{Event, Message, Request};

use crate::error::{Error, Result};
use crate::transport::MessageSender;

type CallbackMap = Arc<DashMap<u64, oneshot::Sender<Result<Value>>>>;
type SubscriberMap = Arc<DashMap<String, mpsc::UnboundedSender<Event>>>;

/// Removes the pending callback if the command future is dropped before
/// its response arrives.
struct CancelGuard {
	id: u64,
	callbacks: CallbackMap,
	completed: bool,
}

impl Drop for CancelGuard {
	fn drop(&mut self) {
		if !self.completed {
			self.callbacks.remove(&self.id);
		}
	}
}

/// Correlated command/event channel over one DevTools socket.
pub struct Connection {
	sender: MessageSender,
	last_id: AtomicU64,
	callbacks: CallbackMap,
	subscribers: SubscriberMap,
}

impl Connection {
	/// Wires the dispatch task to the transport endpoints.
	pub fn new(sender: MessageSender, incoming: mpsc::Receiver<Value>) -> Arc<Self> {
		let connection = Arc::new(Self {
			sender,
			last_id: AtomicU64::new(0),
			callbacks: Arc::new(DashMap::new()),
			subscribers: Arc::new(DashMap::new()),
		});

		let callbacks = Arc::clone(&connection.callbacks);
		let subscribers = Arc::clone(&connection.subscribers);
		tokio::spawn(dispatch_loop(incoming, callbacks, subscribers));

		connection
	}

	/// Sends a raw command and awaits its result payload.
	pub async fn send_command(
		&self,
		session_id: Option<&str>,
		method: &str,
		params: Value,
	) -> Result<Value> {
		let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
		let (tx, rx) = oneshot::channel();
		self.callbacks.insert(id, tx);
		let mut guard = CancelGuard {
			id,
			callbacks: Arc::clone(&self.callbacks),
			completed: false,
		};

		let request = Request {
			id,
			method: method.to_string(),
			params,
			session_id: session_id.map(str::to_string),
		};
		trace!(target = "vouch", id, method, session = ?session_id, "command");
		self.sender.send(serde_json::to_value(&request)?).await?;

		let result = match rx.await {
			Ok(result) => result,
			Err(_) => Err(Error::ConnectionClosed),
		};
		guard.completed = true;
		result
	}

	/// Typed wrapper over [`Connection::send_command`].
	pub async fn call<P: Serialize, R: DeserializeOwned>(
		&self,
		session_id: Option<&str>,
		method: &str,
		params: &P,
	) -> Result<R> {
		let result = self
			.send_command(session_id, method, serde_json::to_value(params)?)
			.await?;
		Ok(serde_json::from_value(result)?)
	}

	/// Subscribes to events scoped to `session_id`.
	///
	/// One subscriber per session; a second subscription replaces the first.
	pub fn subscribe(&self, session_id: &str) -> mpsc::UnboundedReceiver<Event> {
		let (tx, rx) = mpsc::unbounded_channel();
		self.subscribers.insert(session_id.to_string(), tx);
		rx
	}

	/// Drops the event subscription for `session_id`, if any.
	pub fn unsubscribe(&self, session_id: &str) {
		self.subscribers.remove(session_id);
	}
}

async fn dispatch_loop(
	mut incoming: mpsc::Receiver<Value>,
	callbacks: CallbackMap,
	subscribers: SubscriberMap,
) {
	while let Some(raw) = incoming.recv().await {
		match serde_json::from_value::<Message>(raw) {
			Ok(Message::Response(response)) => {
				let Some((_, tx)) = callbacks.remove(&response.id) else {
					warn!(target = "vouch", id = response.id, "response without pending command");
					continue;
				};
				let result = match response.error {
					Some(error) => Err(Error::Cdp {
						code: error.code,
						message: error.message,
					}),
					None => Ok(response.result.unwrap_or(Value::Null)),
				};
				let _ = tx.send(result);
			}
			Ok(Message::Event(event)) => {
				let Some(session_id) = event.session_id.as_deref() else {
					trace!(target = "vouch", method = %event.method, "browser-level event ignored");
					continue;
				};
				if let Some(tx) = subscribers.get(session_id) {
					// Subscriber gone means the session is closing; drop silently.
					let _ = tx.send(event.clone());
				}
			}
			Ok(Message::Unknown(value)) => {
				trace!(target = "vouch", frame = %value, "unclassified frame");
			}
			Err(e) => {
				warn!(target = "vouch", error = %e, "undecodable frame");
			}
		}
	}

	debug!(target = "vouch", "transport gone; failing pending commands");
	let pending: Vec<u64> = callbacks.iter().map(|entry| *entry.key()).collect();
	for id in pending {
		if let Some((_, tx)) = callbacks.remove(&id) {
			let _ = tx.send(Err(Error::ConnectionClosed));
		}
	}
}
