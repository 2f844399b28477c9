// ---------------------------------------------------------------------------
// Key normalization
// ---------------------------------------------------------------------------
//
// A title and a record line collate under the same normalized key: everything
// from the first `>` on is discarded, every character outside [A-Za-z0-9_] is
// removed, underscores are removed, and the remainder is lowercased.  The
// backing file is sorted by exactly this key, so the store and its callers
// must share one implementation.
// ---------------------------------------------------------------------------

use std::sync::OnceLock;

use regex::Regex;

fn non_word() -> &'static Regex {
	static RE: OnceLock<Regex> = OnceLock::new();
	RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_]").expect("static pattern compiles"))
}

/// Normalize a title (or a full record line) to its lookup key.
pub fn normalize_key(title: &str) -> String {
	let head = title.split('>').next().unwrap_or("");
	let cleaned = non_word().replace_all(head, "");
	cleaned.replace('_', "").to_lowercase()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn strips_everything_after_first_delimiter() {
		assert_eq!(normalize_key("apple> fruit:0.9, plant:0.3"), "apple");
		assert_eq!(normalize_key("a>b>c"), "a");
	}

	#[test]
	fn removes_punctuation_and_underscores() {
		assert_eq!(normalize_key("The_Cat!"), "thecat");
		assert_eq!(normalize_key("thecat"), "thecat");
	}

	#[test]
	fn lowercases() {
		assert_eq!(normalize_key("New York City"), "newyorkcity");
	}

	#[test]
	fn idempotent() {
		for title in ["The_Cat!", "apple> x", "New York City", "", "a_b c-d"] {
			let once = normalize_key(title);
			assert_eq!(normalize_key(&once), once);
		}
	}

	#[test]
	fn digits_survive() {
		assert_eq!(normalize_key("Boeing 747"), "boeing747");
	}

	#[test]
	fn empty_input() {
		assert_eq!(normalize_key(""), "");
		assert_eq!(normalize_key("!!!"), "");
	}
}
