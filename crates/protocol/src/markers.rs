//! Launch-marker codec.
//!
//! A shadow shortcut's launch-options string carries `KEY=value` markers
//! so a helper script can recover session context (app id, resolution
//! mode, linked display, interpreter path) from its environment. Values
//! containing a space or a quote are wrapped in single quotes with the
//! shell escape `'` -> `'\''`; decoding reverses that exactly, nested
//! escapes included.

/// Marks a shortcut as managed by castway.
pub const MANAGED_KEY: &str = "CASTWAY_MANAGED";
/// Source application id the shadow shortcut stands in for.
pub const APP_ID_KEY: &str = "CASTWAY_APP_ID";
/// Display mode to stream at when automatic resolution is enabled.
pub const AUTO_RES_KEY: &str = "CASTWAY_AUTO_RES";
/// Identifier of the display the session is linked to.
pub const LINKED_DISPLAY_KEY: &str = "CASTWAY_LINKED_DISPLAY";
/// Interpreter used to execute the runner script.
pub const INTERPRETER_KEY: &str = "CASTWAY_INTERPRETER";

/// Encodes one `KEY=value` marker, quoting the value when required.
pub fn encode_pair(key: &str, value: &str) -> String {
	if value.contains([' ', '\'']) {
		format!("{}='{}'", key, value.replace('\'', "'\\''"))
	} else {
		format!("{key}={value}")
	}
}

/// Splits a launch-options blob into unescaped tokens.
///
/// Single quotes group, `\'` outside quotes is a literal quote, spaces
/// outside quotes separate. An unterminated quote is treated leniently
/// as running to the end of the blob.
fn tokens(blob: &str) -> Vec<String> {
	let mut out = Vec::new();
	let mut current = String::new();
	let mut has_content = false;
	let mut quoted = false;
	let mut chars = blob.chars().peekable();

	while let Some(ch) = chars.next() {
		if quoted {
			if ch == '\'' {
				quoted = false;
			} else {
				current.push(ch);
			}
			continue;
		}

		match ch {
			'\'' => {
				quoted = true;
				has_content = true;
			}
			'\\' if chars.peek() == Some(&'\'') => {
				chars.next();
				current.push('\'');
				has_content = true;
			}
			' ' => {
				if has_content {
					out.push(std::mem::take(&mut current));
					has_content = false;
				}
			}
			other => {
				current.push(other);
				has_content = true;
			}
		}
	}

	if has_content {
		out.push(current);
	}
	out
}

/// Returns the first decoded value for `key`, if present.
pub fn value_of(blob: &str, key: &str) -> Option<String> {
	let prefix = format!("{key}=");
	tokens(blob)
		.into_iter()
		.find_map(|token| token.strip_prefix(&prefix).map(str::to_string))
}

/// Returns the first value for `key` parsed as a number.
pub fn number_of(blob: &str, key: &str) -> Option<i64> {
	value_of(blob, key)?.parse().ok()
}

/// Returns the numeric value for `key` only when the marker appears
/// exactly once and parses cleanly. Used for app-id recovery where an
/// ambiguous blob must be rejected rather than guessed at.
pub fn unique_number_of(blob: &str, key: &str) -> Option<i64> {
	let prefix = format!("{key}=");
	let mut found: Option<i64> = None;

	for token in tokens(blob) {
		let Some(raw) = token.strip_prefix(&prefix) else {
			continue;
		};
		if found.is_some() {
			return None;
		}
		found = raw.parse().ok();
		found?;
	}

	found
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn plain_values_are_not_quoted() {
		assert_eq!(encode_pair(APP_ID_KEY, "1290"), "CASTWAY_APP_ID=1290");
	}

	#[test]
	fn values_with_spaces_round_trip() {
		let blob = encode_pair(AUTO_RES_KEY, "2560 x 1600");
		assert_eq!(blob, "CASTWAY_AUTO_RES='2560 x 1600'");
		assert_eq!(value_of(&blob, AUTO_RES_KEY).as_deref(), Some("2560 x 1600"));
	}

	#[test]
	fn values_with_quotes_round_trip_with_nested_escapes() {
		let original = "it's a 'display'";
		let blob = encode_pair(LINKED_DISPLAY_KEY, original);
		assert_eq!(value_of(&blob, LINKED_DISPLAY_KEY).as_deref(), Some(original));
	}

	#[test]
	fn lookup_ignores_keys_hidden_inside_quoted_values() {
		let blob = format!(
			"{} {}",
			encode_pair(LINKED_DISPLAY_KEY, "CASTWAY_APP_ID=999 fake"),
			encode_pair(APP_ID_KEY, "42"),
		);
		assert_eq!(number_of(&blob, APP_ID_KEY), Some(42));
	}

	#[test]
	fn markers_survive_surrounding_command_template() {
		let blob = format!("{} %command%", encode_pair(APP_ID_KEY, "730"));
		assert_eq!(unique_number_of(&blob, APP_ID_KEY), Some(730));
		assert_eq!(value_of(&blob, MANAGED_KEY), None);
	}

	#[test]
	fn duplicate_app_id_markers_are_rejected() {
		let blob = "CASTWAY_APP_ID=1 CASTWAY_APP_ID=2 %command%";
		assert_eq!(unique_number_of(blob, APP_ID_KEY), None);
	}

	#[test]
	fn non_numeric_app_id_is_rejected() {
		let blob = "CASTWAY_APP_ID=nope %command%";
		assert_eq!(unique_number_of(blob, APP_ID_KEY), None);
	}

	#[test]
	fn unterminated_quote_is_lenient() {
		let blob = "CASTWAY_LINKED_DISPLAY='half open";
		assert_eq!(value_of(blob, LINKED_DISPLAY_KEY).as_deref(), Some("half open"));
	}
}
