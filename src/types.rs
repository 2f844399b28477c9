use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::record::CategoryVector;

// ── Upstream search/clustering response (consumed shape only) ───────────────

/// The slice of the upstream search service's response this engine consumes:
/// candidate documents and their clustering.  Unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
	pub docs: Vec<SearchDoc>,
	#[serde(default)]
	pub clusters: Vec<SearchCluster>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchDoc {
	pub id: String,
	pub title: String,
	pub score: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchCluster {
	/// Member document ids.  Ids absent from the resolved set are ignored.
	pub docs: Vec<String>,
	pub score: f64,
}

// ── Resolved and aggregated output ──────────────────────────────────────────

/// A document whose title resolved to a record in the sorted store.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedDocument {
	pub id: String,
	pub title: String,
	/// External relevance weight from the upstream search service.
	pub score: f64,
	pub supercats: CategoryVector,
}

/// Aggregated scores for one cluster.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSummary {
	/// Raw member count, including members that did not resolve.
	pub num_docs: usize,
	/// Accumulated weight denominator divided by the raw member count.
	pub average_doc_weight: f64,
	pub supercat_scores: HashMap<String, f64>,
}

/// Full scoring output for one query: the three logical maps.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredQuery {
	pub documents: HashMap<String, ResolvedDocument>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub clusters: Option<Vec<ClusterSummary>>,
	pub total_query_scores: HashMap<String, f64>,
}
