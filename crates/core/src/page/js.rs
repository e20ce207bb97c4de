//! JavaScript snippet builders for in-page reads and interactions.
//!
//! All dynamic values are embedded as JSON string literals, so selectors
//! and user data can never break out of the expression.

/// Encodes `value` as a JavaScript string literal.
pub(crate) fn js_string(value: &str) -> String {
	serde_json::to_string(value).expect("strings always serialize")
}

pub(crate) const READY_STATE_COMPLETE: &str = r#"document.readyState === "complete""#;

pub(crate) const BODY_TEXT: &str = "(document.body && document.body.innerText) || \"\"";

pub(crate) fn element_exists(selector: &str) -> String {
	format!("!!document.querySelector({})", js_string(selector))
}

pub(crate) fn click(selector: &str) -> String {
	format!(
		r#"(() => {{
	const el = document.querySelector({sel});
	if (!el) throw new Error("no element for selector");
	el.click();
	return true;
}})()"#,
		sel = js_string(selector)
	)
}

/// Sets an input/textarea value through the prototype setter and fires
/// the events reactive frameworks listen for.
pub(crate) fn set_input_value(selector: &str, value: &str) -> String {
	format!(
		r#"(() => {{
	const el = document.querySelector({sel});
	if (!el) throw new Error("no element for selector");
	el.focus();
	const proto = el.tagName === "TEXTAREA"
		? HTMLTextAreaElement.prototype
		: HTMLInputElement.prototype;
	Object.getOwnPropertyDescriptor(proto, "value").set.call(el, {value});
	el.dispatchEvent(new Event("input", {{ bubbles: true }}));
	el.dispatchEvent(new Event("change", {{ bubbles: true }}));
	return true;
}})()"#,
		sel = js_string(selector),
		value = js_string(value)
	)
}

pub(crate) fn select_option(selector: &str, value: &str) -> String {
	format!(
		r#"(() => {{
	const el = document.querySelector({sel});
	if (!el) throw new Error("no element for selector");
	el.value = {value};
	el.dispatchEvent(new Event("change", {{ bubbles: true }}));
	return true;
}})()"#,
		sel = js_string(selector),
		value = js_string(value)
	)
}

/// Collects visible entry texts and their unread flag for a list selector.
pub(crate) fn collect_entries(selector: &str) -> String {
	format!(
		r#"Array.from(document.querySelectorAll({sel}))
	.map(el => ({{
		text: (el.textContent || "").trim(),
		unread: !el.classList.contains("read"),
	}}))
	.filter(entry => entry.text.length > 0)"#,
		sel = js_string(selector)
	)
}

pub(crate) fn count_matches(selector: &str) -> String {
	format!("document.querySelectorAll({}).length", js_string(selector))
}

/// Writes the identity and token into the context's local storage in one
/// step; nothing in the engine reads these back implicitly.
pub(crate) fn seed_local_storage(identity_json: &str, token: &str) -> String {
	format!(
		r#"(() => {{
	localStorage.setItem("token", {token});
	localStorage.setItem("identity", {identity});
	return true;
}})()"#,
		token = js_string(token),
		identity = js_string(identity_json)
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn js_string_escapes_quotes_and_newlines() {
		assert_eq!(js_string(r#"a"b"#), r#""a\"b""#);
		assert_eq!(js_string("a\nb"), r#""a\nb""#);
	}

	#[test]
	fn selectors_are_embedded_as_literals() {
		let script = element_exists("button[type=\"submit\"]");
		assert!(script.contains(r#""button[type=\"submit\"]""#));
	}

	#[test]
	fn input_script_carries_both_events() {
		let script = set_input_value("#email", "user@test.com");
		assert!(script.contains("\"input\""));
		assert!(script.contains("\"change\""));
		assert!(script.contains(r#""user@test.com""#));
	}
}
