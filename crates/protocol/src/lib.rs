//! Wire types for the Chrome DevTools protocol subset spoken by the harness.
//!
//! Only the domains the verification engine actually drives are modeled:
//! `Target` (isolated browser contexts and session attachment), `Page`
//! (navigation and screenshots), and `Runtime` (script evaluation and
//! console events). Everything else travels as raw [`serde_json::Value`]
//! so unknown server payloads never fail deserialization.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod page;
pub mod runtime;
pub mod target;

/// Command message sent to the browser.
///
/// `session_id` scopes the command to an attached target; commands without
/// it address the browser endpoint itself (e.g. `Target.*`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
	/// Unique command id for correlating the response.
	pub id: u64,
	/// Qualified method name, e.g. `"Page.navigate"`.
	pub method: String,
	/// Method parameters as a JSON object.
	#[serde(skip_serializing_if = "Value::is_null", default)]
	pub params: Value,
	/// Target session this command is scoped to, if any.
	#[serde(rename = "sessionId", skip_serializing_if = "Option::is_none", default)]
	pub session_id: Option<String>,
}

/// Command response from the browser.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
	/// Command id this response correlates to.
	pub id: u64,
	/// Success result (mutually exclusive with `error`).
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub result: Option<Value>,
	/// Error payload (mutually exclusive with `result`).
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub error: Option<ErrorPayload>,
	/// Session the original command was scoped to.
	#[serde(rename = "sessionId", skip_serializing_if = "Option::is_none", default)]
	pub session_id: Option<String>,
}

/// DevTools error payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
	/// Numeric error code.
	pub code: i64,
	/// Error message.
	pub message: String,
	/// Additional error context, when present.
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub data: Option<String>,
}

/// Unsolicited event from the browser.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
	/// Qualified event name, e.g. `"Runtime.consoleAPICalled"`.
	pub method: String,
	/// Event parameters as a JSON object.
	#[serde(default)]
	pub params: Value,
	/// Session that emitted the event, if target-scoped.
	#[serde(rename = "sessionId", skip_serializing_if = "Option::is_none", default)]
	pub session_id: Option<String>,
}

/// Discriminated union of inbound messages.
///
/// Responses carry an `id`, events a `method`; the untagged representation
/// resolves on whichever required field is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
	/// Response message (has `id` field).
	Response(Response),
	/// Event message (has `method`, no `id`).
	Event(Event),
	/// Unknown message shape (forward-compatible catch-all).
	Unknown(Value),
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn response_classified_by_id() {
		let json = r#"{"id": 7, "result": {"frameId": "F1"}}"#;
		let message: Message = serde_json::from_str(json).unwrap();
		match message {
			Message::Response(response) => {
				assert_eq!(response.id, 7);
				assert!(response.result.is_some());
				assert!(response.error.is_none());
			}
			other => panic!("expected Response, got {other:?}"),
		}
	}

	#[test]
	fn event_classified_by_method() {
		let json = r#"{"method": "Runtime.consoleAPICalled", "params": {"type": "error"}, "sessionId": "S1"}"#;
		let message: Message = serde_json::from_str(json).unwrap();
		match message {
			Message::Event(event) => {
				assert_eq!(event.method, "Runtime.consoleAPICalled");
				assert_eq!(event.params["type"], "error");
				assert_eq!(event.session_id.as_deref(), Some("S1"));
			}
			other => panic!("expected Event, got {other:?}"),
		}
	}

	#[test]
	fn error_response_round_trips() {
		let json = r#"{"id": 3, "error": {"code": -32000, "message": "Target closed"}}"#;
		let message: Message = serde_json::from_str(json).unwrap();
		match message {
			Message::Response(response) => {
				let error = response.error.unwrap();
				assert_eq!(error.code, -32000);
				assert_eq!(error.message, "Target closed");
			}
			other => panic!("expected Response, got {other:?}"),
		}
	}

	#[test]
	fn request_omits_absent_session_id() {
		let request = Request {
			id: 1,
			method: "Target.createBrowserContext".to_string(),
			params: serde_json::json!({}),
			session_id: None,
		};
		let encoded = serde_json::to_string(&request).unwrap();
		assert!(!encoded.contains("sessionId"));
	}
}
