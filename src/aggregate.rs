// ---------------------------------------------------------------------------
// ScoreAggregator -- weighted cluster and query score aggregation
// ---------------------------------------------------------------------------
//
// Cluster level: weighted average of member documents' category scores.  The
// denominator accumulates the document weight once per (document, category)
// pair visited, not once per document, so a document listing more categories
// contributes a proportionally larger denominator.  That accumulation order
// is a pinned behavioral property of this scoring scheme.
//
// Query level: weighted sum over non-empty cluster vectors.  No division
// happens at the query level -- the cluster level normalizes, the query
// level does not.
// ---------------------------------------------------------------------------

use std::collections::HashMap;

use crate::types::{ClusterSummary, ResolvedDocument, SearchCluster};

// ---------------------------------------------------------------------------
// Zero-weight policy
// ---------------------------------------------------------------------------

/// What to do when a cluster's accumulated weight denominator is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZeroWeightBehavior {
	/// Drop the cluster's vector (it becomes empty and contributes nothing
	/// to the query sum) and log a warning.
	Skip,
	/// Divide anyway, propagating non-finite values downstream.
	Propagate,
}

impl Default for ZeroWeightBehavior {
	fn default() -> Self {
		Self::Skip
	}
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Aggregate resolved documents into per-cluster summaries and the
/// query-level score vector.
pub fn aggregate(
	clusters: &[SearchCluster],
	documents: &HashMap<String, ResolvedDocument>,
	behavior: ZeroWeightBehavior,
) -> (Vec<ClusterSummary>, HashMap<String, f64>) {
	let summaries: Vec<ClusterSummary> = clusters
		.iter()
		.map(|cluster| cluster_summary(cluster, documents, behavior))
		.collect();
	let totals = query_scores(clusters, &summaries);
	(summaries, totals)
}

/// Weighted-average category vector for one cluster.
pub fn cluster_summary(
	cluster: &SearchCluster,
	documents: &HashMap<String, ResolvedDocument>,
	behavior: ZeroWeightBehavior,
) -> ClusterSummary {
	let mut totals: HashMap<String, f64> = HashMap::new();
	let mut total_weight = 0.0f64;

	for doc_id in &cluster.docs {
		let doc = match documents.get(doc_id) {
			Some(doc) => doc,
			// Member never resolved: ignored, never double-counted.
			None => continue,
		};
		for (supercat, score) in &doc.supercats {
			*totals.entry(supercat.clone()).or_insert(0.0) += score * doc.score;
			// Denominator grows once per (document, category) pair.
			total_weight += doc.score;
		}
	}

	let supercat_scores = if total_weight == 0.0 && behavior == ZeroWeightBehavior::Skip {
		if !totals.is_empty() {
			tracing::warn!(
				num_docs = cluster.docs.len(),
				"cluster weight sum is zero, dropping its supercat vector"
			);
		}
		HashMap::new()
	} else {
		for value in totals.values_mut() {
			*value /= total_weight;
		}
		totals
	};

	let num_docs = cluster.docs.len();
	let average_doc_weight = if num_docs == 0 {
		0.0
	} else {
		total_weight / num_docs as f64
	};

	ClusterSummary {
		num_docs,
		average_doc_weight,
		supercat_scores,
	}
}

/// Query-level weighted sum over non-empty cluster vectors.
pub fn query_scores(
	clusters: &[SearchCluster],
	summaries: &[ClusterSummary],
) -> HashMap<String, f64> {
	let mut totals: HashMap<String, f64> = HashMap::new();
	for (cluster, summary) in clusters.iter().zip(summaries) {
		for (supercat, score) in &summary.supercat_scores {
			*totals.entry(supercat.clone()).or_insert(0.0) += score * cluster.score;
		}
	}
	totals
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
