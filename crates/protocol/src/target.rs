//! `Target` domain payloads: browser contexts, targets, and attachment.
//!
//! Each actor gets its own browser context so cookies and storage are never
//! shared between sessions; attachment with `flatten: true` multiplexes all
//! sessions over the single browser WebSocket.

use serde::{Deserialize, Serialize};

/// Params for `Target.createBrowserContext`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBrowserContext {
	/// Dispose the context automatically when the debugging session detaches.
	#[serde(skip_serializing_if = "std::ops::Not::not", default)]
	pub dispose_on_detach: bool,
}

impl CreateBrowserContext {
	pub const METHOD: &'static str = "Target.createBrowserContext";
}

/// Result of `Target.createBrowserContext`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBrowserContextResult {
	pub browser_context_id: String,
}

/// Params for `Target.createTarget`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTarget {
	/// Initial URL for the new page.
	pub url: String,
	/// Context to create the page in; omitted means the default context.
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub browser_context_id: Option<String>,
}

impl CreateTarget {
	pub const METHOD: &'static str = "Target.createTarget";
}

/// Result of `Target.createTarget`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTargetResult {
	pub target_id: String,
}

/// Params for `Target.attachToTarget`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachToTarget {
	pub target_id: String,
	/// Must be `true`: flat session routing via the `sessionId` envelope field.
	pub flatten: bool,
}

impl AttachToTarget {
	pub const METHOD: &'static str = "Target.attachToTarget";
}

/// Result of `Target.attachToTarget`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachToTargetResult {
	pub session_id: String,
}

/// Params for `Target.closeTarget`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseTarget {
	pub target_id: String,
}

impl CloseTarget {
	pub const METHOD: &'static str = "Target.closeTarget";
}

/// Params for `Target.disposeBrowserContext`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisposeBrowserContext {
	pub browser_context_id: String,
}

impl DisposeBrowserContext {
	pub const METHOD: &'static str = "Target.disposeBrowserContext";
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn create_target_omits_default_context() {
		let params = CreateTarget {
			url: "about:blank".to_string(),
			browser_context_id: None,
		};
		let encoded = serde_json::to_string(&params).unwrap();
		assert!(!encoded.contains("browserContextId"));
	}

	#[test]
	fn attach_result_uses_camel_case() {
		let json = r#"{"sessionId": "ABCDEF"}"#;
		let result: AttachToTargetResult = serde_json::from_str(json).unwrap();
		assert_eq!(result.session_id, "ABCDEF");
	}
}
