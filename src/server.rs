// ---------------------------------------------------------------------------
// CategoryServer -- JSON-RPC dispatcher
// ---------------------------------------------------------------------------
//
// Routes incoming JSON-RPC 2.0 requests (NDJSON over stdin) to the sorted
// store and the scoring pipeline: a main `run()` loop, a `dispatch()` match,
// a `with_store_mut` accessor, and free-standing handler functions.
//
// The store is held by this single-threaded loop, so the mutable file cursor
// inside a lookup is never shared mid-search; requests are serialized by
// construction.
// ---------------------------------------------------------------------------

use std::io::{self, BufRead};
use std::path::PathBuf;

use serde::Deserialize;

use crate::aggregate::ZeroWeightBehavior;
use crate::error::CategoryError;
use crate::protocol::*;
use crate::record::parse_record;
use crate::resolve::{score_response, ScoreOptions};
use crate::store::SortedKeyStore;
use crate::transport::NdjsonTransport;
use crate::types::SearchResponse;

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// JSON-RPC server owning one open [`SortedKeyStore`] across requests.
pub struct CategoryServer {
	transport: NdjsonTransport,
	store: Option<SortedKeyStore>,
}

impl CategoryServer {
	/// Create a server with no store attached; `store/initialize` opens one.
	pub fn new(transport: NdjsonTransport) -> Self {
		Self {
			transport,
			store: None,
		}
	}

	/// Attach an already-open store (used by the `--store` startup path).
	pub fn attach_store(&mut self, store: SortedKeyStore) {
		self.store = Some(store);
	}

	/// Main loop: read JSON-RPC messages from stdin, dispatch to handlers.
	pub fn run(&mut self) -> Result<(), CategoryError> {
		let stdin = io::stdin();
		let reader = stdin.lock();

		for line_result in reader.lines() {
			let line = line_result?;
			if line.trim().is_empty() {
				continue;
			}

			let request: JsonRpcRequest = match serde_json::from_str(&line) {
				Ok(r) => r,
				Err(e) => {
					tracing::error!("Failed to parse request: {}", e);
					continue;
				}
			};

			self.dispatch(request);
		}

		Ok(())
	}

	// ── Dispatch ──────────────────────────────────────────────────────────

	fn dispatch(&mut self, req: JsonRpcRequest) {
		let id = req.id;
		let result = match req.method.as_str() {
			"store/initialize" => self.handle_initialize(req.params),
			"store/dispose" => match self.store.take() {
				Some(_) => Ok(serde_json::json!({})),
				None => Err(CategoryError::NotInitialized),
			},
			"store/lookup" => self.with_store_mut(|s| handle_lookup(s, req.params)),
			"query/score" => self.with_store_mut(|s| handle_score(s, req.params)),
			_ => {
				self.transport.write_error(
					id,
					METHOD_NOT_FOUND,
					format!("Unknown method: {}", req.method),
					None,
				);
				return;
			}
		};

		match result {
			Ok(value) => self.transport.write_response(id, value),
			Err(e) => self.transport.write_error(
				id,
				CATEGORY_ERROR,
				e.to_string(),
				Some(e.to_json_rpc_error()),
			),
		}
	}

	fn with_store_mut<F>(&mut self, f: F) -> Result<serde_json::Value, CategoryError>
	where
		F: FnOnce(&mut SortedKeyStore) -> Result<serde_json::Value, CategoryError>,
	{
		match &mut self.store {
			Some(s) => f(s),
			None => Err(CategoryError::NotInitialized),
		}
	}

	// ── Initialize ────────────────────────────────────────────────────────

	fn handle_initialize(
		&mut self,
		params: serde_json::Value,
	) -> Result<serde_json::Value, CategoryError> {
		let p: InitializeParams = parse_params(params)?;
		let store = SortedKeyStore::open(&p.path)?;
		tracing::info!(
			path = %p.path.display(),
			bytes = store.len_bytes(),
			"Sorted store opened"
		);
		let bytes = store.len_bytes();
		self.store = Some(store);
		Ok(serde_json::json!({ "sizeBytes": bytes }))
	}
}

// ---------------------------------------------------------------------------
// Param types
// ---------------------------------------------------------------------------

fn parse_params<T: serde::de::DeserializeOwned>(
	params: serde_json::Value,
) -> Result<T, CategoryError> {
	serde_json::from_value(params)
		.map_err(|e| CategoryError::Serialization(format!("Invalid params: {}", e)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitializeParams {
	path: PathBuf,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupParams {
	title: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScoreParams {
	response: SearchResponse,
	keep_cluster_vectors: Option<bool>,
	zero_weight_behavior: Option<String>,
}

// ---------------------------------------------------------------------------
// Free-standing handler functions
// ---------------------------------------------------------------------------

fn handle_lookup(
	store: &mut SortedKeyStore,
	params: serde_json::Value,
) -> Result<serde_json::Value, CategoryError> {
	let p: LookupParams = parse_params(params)?;

	let raw = match store.lookup_title(&p.title)? {
		Some(raw) => raw,
		None => return Ok(serde_json::json!({ "found": false })),
	};

	let (title, categories) = parse_record(&raw)?;
	Ok(serde_json::json!({
		"found": true,
		"title": title,
		"categories": categories,
	}))
}

fn handle_score(
	store: &mut SortedKeyStore,
	params: serde_json::Value,
) -> Result<serde_json::Value, CategoryError> {
	let p: ScoreParams = parse_params(params)?;

	let zero_weight_behavior = match p.zero_weight_behavior.as_deref() {
		Some("propagate") => ZeroWeightBehavior::Propagate,
		Some("skip") | None => ZeroWeightBehavior::Skip,
		Some(other) => {
			return Err(CategoryError::Serialization(format!(
				"Invalid params: unknown zeroWeightBehavior '{}'",
				other
			)))
		}
	};
	let options = ScoreOptions {
		keep_cluster_vectors: p.keep_cluster_vectors.unwrap_or(true),
		zero_weight_behavior,
	};

	let scored = score_response(store, &p.response, &options)?;
	serde_json::to_value(scored)
		.map_err(|e| CategoryError::Serialization(format!("Unencodable result: {}", e)))
}
