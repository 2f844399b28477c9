// ---------------------------------------------------------------------------
// Record parsing
// ---------------------------------------------------------------------------
//
// One record line reads `Title> cat1:score1, cat2:score2, ...`.  The raw
// comma-separated fragments keep their leading space from the serializer, so
// the noise filter (length <= 5) runs on the untrimmed fragment before any
// trimming; real category names are comfortably longer, short tails are
// serializer garbage.  A fragment that survives the filter but does not parse
// marks the whole record as corrupt.
// ---------------------------------------------------------------------------

use std::collections::HashMap;

use crate::error::CategoryError;

/// Per-record category-relevance vector.
pub type CategoryVector = HashMap<String, f64>;

/// Parse a raw record line into its title and category vector.
pub fn parse_record(raw: &str) -> Result<(String, CategoryVector), CategoryError> {
	let (title, rest) = match raw.split_once('>') {
		Some((title, rest)) => (title, rest),
		None => (raw, ""),
	};

	let mut categories = CategoryVector::new();
	for fragment in rest.split(',') {
		// Noise tolerance, not an error: drop malformed short tails.
		if fragment.len() <= 5 {
			continue;
		}

		let fragment = fragment.trim();
		let (name, score) = fragment.split_once(':').ok_or_else(|| {
			CategoryError::CorruptRecord(format!("fragment without ':': '{}'", fragment))
		})?;
		let score: f64 = score.trim().parse().map_err(|_| {
			CategoryError::CorruptRecord(format!("unparseable score in '{}'", fragment))
		})?;
		categories.insert(name.trim().to_string(), score);
	}

	Ok((title.to_string(), categories))
}
