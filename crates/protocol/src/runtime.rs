//! `Runtime` domain payloads: script evaluation and console events.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `Runtime.enable`: required before `consoleAPICalled` events flow.
pub const ENABLE: &str = "Runtime.enable";

/// `Runtime.consoleAPICalled` event name.
pub const CONSOLE_API_CALLED: &str = "Runtime.consoleAPICalled";

/// Params for `Runtime.evaluate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluate {
	/// JavaScript expression evaluated in the page's main world.
	pub expression: String,
	/// Return the result as a plain JSON value instead of a remote handle.
	pub return_by_value: bool,
	/// Await the expression if it evaluates to a promise.
	pub await_promise: bool,
}

impl Evaluate {
	pub const METHOD: &'static str = "Runtime.evaluate";

	/// An expression whose resolved value is wanted by the caller.
	pub fn expression(expression: impl Into<String>) -> Self {
		Self {
			expression: expression.into(),
			return_by_value: true,
			await_promise: true,
		}
	}
}

/// Result of `Runtime.evaluate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResult {
	pub result: RemoteObject,
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub exception_details: Option<ExceptionDetails>,
}

/// A mirror of the DevTools `RemoteObject`, restricted to by-value use.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
	/// Object type (`"string"`, `"number"`, `"undefined"`, ...).
	#[serde(rename = "type")]
	pub kind: String,
	/// Plain JSON value when `returnByValue` was requested.
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub value: Option<Value>,
	/// Human-readable description (used for console arguments).
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub description: Option<String>,
}

/// Exception details attached to a failed evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionDetails {
	pub text: String,
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub exception: Option<RemoteObject>,
}

impl ExceptionDetails {
	/// Best human-readable rendering of the thrown value.
	pub fn message(&self) -> String {
		self.exception
			.as_ref()
			.and_then(|e| e.description.clone())
			.unwrap_or_else(|| self.text.clone())
	}
}

/// `Runtime.consoleAPICalled` event payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleApiCalled {
	/// Call type (`"log"`, `"error"`, `"warning"`, ...).
	#[serde(rename = "type")]
	pub kind: String,
	/// Arguments passed to the console call.
	#[serde(default)]
	pub args: Vec<RemoteObject>,
	/// Monotonic timestamp in milliseconds.
	#[serde(default)]
	pub timestamp: f64,
}

impl ConsoleApiCalled {
	/// Flattens the console arguments into one display line.
	pub fn text(&self) -> String {
		self.args
			.iter()
			.map(|arg| match (&arg.value, &arg.description) {
				(Some(Value::String(s)), _) => s.clone(),
				(Some(value), _) => value.to_string(),
				(None, Some(description)) => description.clone(),
				(None, None) => String::from("<unserializable>"),
			})
			.collect::<Vec<_>>()
			.join(" ")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn evaluate_result_surfaces_exception() {
		let json = r#"{
			"result": {"type": "object", "description": "Error: boom"},
			"exceptionDetails": {"text": "Uncaught", "exception": {"type": "object", "description": "Error: boom"}}
		}"#;
		let result: EvaluateResult = serde_json::from_str(json).unwrap();
		let details = result.exception_details.unwrap();
		assert_eq!(details.message(), "Error: boom");
	}

	#[test]
	fn console_event_text_joins_args() {
		let json = r#"{
			"type": "error",
			"args": [
				{"type": "string", "value": "API Response:"},
				{"type": "number", "value": 500}
			],
			"timestamp": 1.0
		}"#;
		let event: ConsoleApiCalled = serde_json::from_str(json).unwrap();
		assert_eq!(event.kind, "error");
		assert_eq!(event.text(), "API Response: 500");
	}
}
