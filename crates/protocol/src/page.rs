//! `Page` domain payloads: navigation, lifecycle, and screenshots.

use serde::{Deserialize, Serialize};

/// `Page.enable`: no parameters; needed before lifecycle events arrive.
pub const ENABLE: &str = "Page.enable";

/// Params for `Page.navigate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Navigate {
	pub url: String,
}

impl Navigate {
	pub const METHOD: &'static str = "Page.navigate";
}

/// Result of `Page.navigate`.
///
/// `error_text` is set when the navigation request itself failed
/// (DNS failure, connection refused); the command still succeeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateResult {
	pub frame_id: String,
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub error_text: Option<String>,
}

/// Params for `Page.captureScreenshot`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureScreenshot {
	/// Image format, `"png"` or `"jpeg"`.
	pub format: String,
	/// Capture the full scrollable page, not just the viewport.
	pub capture_beyond_viewport: bool,
}

impl CaptureScreenshot {
	pub const METHOD: &'static str = "Page.captureScreenshot";

	/// Full-page PNG capture, the only variant the evidence collector uses.
	pub fn full_page_png() -> Self {
		Self {
			format: "png".to_string(),
			capture_beyond_viewport: true,
		}
	}
}

/// Result of `Page.captureScreenshot`: base64-encoded image data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureScreenshotResult {
	pub data: String,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn navigate_result_tolerates_missing_error_text() {
		let json = r#"{"frameId": "F1"}"#;
		let result: NavigateResult = serde_json::from_str(json).unwrap();
		assert_eq!(result.frame_id, "F1");
		assert!(result.error_text.is_none());
	}
}
