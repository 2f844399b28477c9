// ---------------------------------------------------------------------------
// Resolution pipeline -- upstream response to scored output
// ---------------------------------------------------------------------------

use std::collections::HashMap;

use crate::aggregate::{aggregate, ZeroWeightBehavior};
use crate::error::CategoryError;
use crate::record::parse_record;
use crate::store::SortedKeyStore;
use crate::types::{ResolvedDocument, ScoredQuery, SearchDoc, SearchResponse};

/// Options for a scoring run.
#[derive(Debug, Clone)]
pub struct ScoreOptions {
	/// Keep the per-cluster summaries in the output.  Dropping them shrinks
	/// the payload; the query vector is computed either way.
	pub keep_cluster_vectors: bool,
	pub zero_weight_behavior: ZeroWeightBehavior,
}

impl Default for ScoreOptions {
	fn default() -> Self {
		Self {
			keep_cluster_vectors: true,
			zero_weight_behavior: ZeroWeightBehavior::default(),
		}
	}
}

/// Resolve every upstream document title through the store.
///
/// A title the store does not carry is a normal miss and is skipped; corrupt
/// records and I/O failures abort the whole resolution.
pub fn resolve_documents(
	store: &mut SortedKeyStore,
	docs: &[SearchDoc],
) -> Result<HashMap<String, ResolvedDocument>, CategoryError> {
	let mut resolved = HashMap::new();

	for doc in docs {
		let raw = match store.lookup_title(&doc.title)? {
			Some(raw) => raw,
			None => {
				tracing::debug!(title = %doc.title, "no supercat record for title");
				continue;
			}
		};
		let (_, supercats) = parse_record(&raw)?;
		resolved.insert(
			doc.id.clone(),
			ResolvedDocument {
				id: doc.id.clone(),
				title: doc.title.clone(),
				score: doc.score,
				supercats,
			},
		);
	}

	tracing::debug!(
		requested = docs.len(),
		resolved = resolved.len(),
		"document resolution finished"
	);
	Ok(resolved)
}

/// Full pipeline: resolve, aggregate, assemble the output maps.
pub fn score_response(
	store: &mut SortedKeyStore,
	response: &SearchResponse,
	options: &ScoreOptions,
) -> Result<ScoredQuery, CategoryError> {
	let documents = resolve_documents(store, &response.docs)?;
	let (summaries, total_query_scores) =
		aggregate(&response.clusters, &documents, options.zero_weight_behavior);

	let clusters = if options.keep_cluster_vectors {
		Some(summaries)
	} else {
		None
	};

	Ok(ScoredQuery {
		documents,
		clusters,
		total_query_scores,
	})
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
