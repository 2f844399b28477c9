// ---------------------------------------------------------------------------
// Integration tests for supercat-engine JSON-RPC 2.0 / NDJSON protocol
// ---------------------------------------------------------------------------
//
// Each test spawns a fresh supercat-engine binary with a sorted fixture file
// on disk and communicates via stdin/stdout using newline-delimited JSON-RPC
// 2.0 messages.
// ---------------------------------------------------------------------------

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::{json, Value};

const FIXTURE: &str = "apple> fruit:0.9, plant:0.3\n\
	banana> fruit:0.8, plant:0.2\n\
	cherry> fruit:0.7\n\
	zebra> animal:0.8\n";

// ---------------------------------------------------------------------------
// Helper
// ---------------------------------------------------------------------------

fn write_fixture() -> tempfile::NamedTempFile {
	let mut file = tempfile::NamedTempFile::new().expect("temp file");
	file.write_all(FIXTURE.as_bytes()).expect("write fixture");
	file.flush().expect("flush fixture");
	file
}

struct EngineProcess {
	child: Child,
	reader: BufReader<std::process::ChildStdout>,
	next_id: AtomicU64,
}

impl EngineProcess {
	fn spawn() -> Self {
		Self::spawn_with_args(&[])
	}

	fn spawn_with_args(args: &[&str]) -> Self {
		let bin = env!("CARGO_BIN_EXE_supercat-engine");
		let mut child = Command::new(bin)
			.args(args)
			.stdin(Stdio::piped())
			.stdout(Stdio::piped())
			.stderr(Stdio::null())
			.spawn()
			.expect("failed to spawn supercat-engine");

		let stdout = child.stdout.take().expect("no stdout");
		let reader = BufReader::new(stdout);

		Self {
			child,
			reader,
			next_id: AtomicU64::new(1),
		}
	}

	fn send(&mut self, method: &str, params: Value) -> RpcResponse {
		let id = self.next_id.fetch_add(1, Ordering::SeqCst);
		let request = json!({
			"jsonrpc": "2.0",
			"id": id,
			"method": method,
			"params": params,
		});

		let stdin = self.child.stdin.as_mut().expect("no stdin");
		let mut line = serde_json::to_string(&request).unwrap();
		line.push('\n');
		stdin.write_all(line.as_bytes()).unwrap();
		stdin.flush().unwrap();

		loop {
			let mut buf = String::new();
			let bytes_read = self
				.reader
				.read_line(&mut buf)
				.expect("failed to read from stdout");
			if bytes_read == 0 {
				panic!("unexpected EOF while waiting for response to id={}", id);
			}
			let buf = buf.trim();
			if buf.is_empty() {
				continue;
			}
			let parsed: Value = serde_json::from_str(buf)
				.unwrap_or_else(|e| panic!("invalid JSON from engine: {e}\nline: {buf}"));
			if parsed.get("id").is_none() {
				continue;
			}
			let resp_id = parsed["id"].as_u64().expect("response id is not u64");
			assert_eq!(resp_id, id, "response id mismatch");
			if let Some(error) = parsed.get("error") {
				return RpcResponse::Error(error.clone());
			}
			return RpcResponse::Ok(parsed.get("result").cloned().unwrap_or(Value::Null));
		}
	}

	fn call(&mut self, method: &str, params: Value) -> Value {
		match self.send(method, params) {
			RpcResponse::Ok(v) => v,
			RpcResponse::Error(e) => panic!("expected success, got error: {e}"),
		}
	}

	fn call_err(&mut self, method: &str, params: Value) -> Value {
		match self.send(method, params) {
			RpcResponse::Error(e) => e,
			RpcResponse::Ok(v) => panic!("expected error, got success: {v}"),
		}
	}

	fn initialize(&mut self, path: &std::path::Path) -> Value {
		self.call(
			"store/initialize",
			json!({ "path": path.to_str().expect("utf8 path") }),
		)
	}
}

impl Drop for EngineProcess {
	fn drop(&mut self) {
		drop(self.child.stdin.take());
		let _ = self.child.wait();
	}
}

#[derive(Debug)]
enum RpcResponse {
	Ok(Value),
	Error(Value),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn initialize_and_lookup() {
	let fixture = write_fixture();
	let mut proc = EngineProcess::spawn();

	let result = proc.initialize(fixture.path());
	assert_eq!(result["sizeBytes"].as_u64().unwrap(), FIXTURE.len() as u64);

	// Normalization: "Apple!" resolves the "apple" record.
	let result = proc.call("store/lookup", json!({ "title": "Apple!" }));
	assert_eq!(result["found"].as_bool(), Some(true));
	assert_eq!(result["title"].as_str(), Some("apple"));
	assert_eq!(result["categories"]["fruit"].as_f64(), Some(0.9));
	assert_eq!(result["categories"]["plant"].as_f64(), Some(0.3));
}

#[test]
fn lookup_miss_is_a_clean_negative() {
	let fixture = write_fixture();
	let mut proc = EngineProcess::spawn();
	proc.initialize(fixture.path());

	let result = proc.call("store/lookup", json!({ "title": "mango" }));
	assert_eq!(result["found"].as_bool(), Some(false));
	assert!(result.get("categories").is_none());
}

#[test]
fn lookup_before_initialize_errors() {
	let mut proc = EngineProcess::spawn();
	let error = proc.call_err("store/lookup", json!({ "title": "apple" }));
	assert_eq!(
		error["data"]["categoryCode"].as_str(),
		Some("SUPERCAT_NOT_LOADED")
	);
}

#[test]
fn initialize_with_missing_file_errors() {
	let mut proc = EngineProcess::spawn();
	let error = proc.call_err(
		"store/initialize",
		json!({ "path": "/nonexistent/supercats.txt" }),
	);
	assert_eq!(error["data"]["categoryCode"].as_str(), Some("SUPERCAT_IO"));
}

#[test]
fn unknown_method_errors() {
	let mut proc = EngineProcess::spawn();
	let error = proc.call_err("store/unknown", json!({}));
	assert_eq!(error["code"].as_i64(), Some(-32601));
}

#[test]
fn dispose_releases_the_store() {
	let fixture = write_fixture();
	let mut proc = EngineProcess::spawn();
	proc.initialize(fixture.path());

	proc.call("store/dispose", json!({}));
	let error = proc.call_err("store/lookup", json!({ "title": "apple" }));
	assert_eq!(
		error["data"]["categoryCode"].as_str(),
		Some("SUPERCAT_NOT_LOADED")
	);
}

#[test]
fn cli_store_flag_preloads() {
	let fixture = write_fixture();
	let path = fixture.path().to_str().expect("utf8 path").to_string();
	let mut proc = EngineProcess::spawn_with_args(&["--store", &path]);

	// No store/initialize call needed.
	let result = proc.call("store/lookup", json!({ "title": "zebra" }));
	assert_eq!(result["found"].as_bool(), Some(true));
	assert_eq!(result["categories"]["animal"].as_f64(), Some(0.8));
}

#[test]
fn score_end_to_end() {
	let fixture = write_fixture();
	let mut proc = EngineProcess::spawn();
	proc.initialize(fixture.path());

	let result = proc.call(
		"query/score",
		json!({
			"response": {
				"docs": [
					{ "id": "1", "title": "apple", "score": 1.0 },
					{ "id": "2", "title": "zebra", "score": 1.0 },
					{ "id": "3", "title": "mango", "score": 9.0 }
				],
				"clusters": [
					{ "docs": ["1", "3"], "score": 2.0 },
					{ "docs": ["2"], "score": 3.0 }
				]
			}
		}),
	);

	// mango is absent from the store: resolved set has two documents.
	let documents = result["documents"].as_object().expect("documents map");
	assert_eq!(documents.len(), 2);
	assert!(documents.contains_key("1"));
	assert!(documents.contains_key("2"));

	let clusters = result["clusters"].as_array().expect("clusters array");
	assert_eq!(clusters.len(), 2);
	assert_eq!(clusters[0]["numDocs"].as_u64(), Some(2));
	// apple's weight enters the denominator once per category entry.
	assert!((clusters[0]["supercatScores"]["fruit"].as_f64().unwrap() - 0.45).abs() < 1e-9);
	assert!((clusters[0]["supercatScores"]["plant"].as_f64().unwrap() - 0.15).abs() < 1e-9);
	assert!((clusters[1]["supercatScores"]["animal"].as_f64().unwrap() - 0.8).abs() < 1e-9);

	// Query level is a weighted sum, never renormalized.
	let totals = &result["totalQueryScores"];
	assert!((totals["fruit"].as_f64().unwrap() - 0.9).abs() < 1e-9);
	assert!((totals["plant"].as_f64().unwrap() - 0.3).abs() < 1e-9);
	assert!((totals["animal"].as_f64().unwrap() - 2.4).abs() < 1e-9);
}

#[test]
fn score_can_drop_cluster_vectors() {
	let fixture = write_fixture();
	let mut proc = EngineProcess::spawn();
	proc.initialize(fixture.path());

	let result = proc.call(
		"query/score",
		json!({
			"response": {
				"docs": [{ "id": "1", "title": "apple", "score": 1.0 }],
				"clusters": [{ "docs": ["1"], "score": 2.0 }]
			},
			"keepClusterVectors": false
		}),
	);

	assert!(result.get("clusters").is_none());
	assert!((result["totalQueryScores"]["fruit"].as_f64().unwrap() - 0.9).abs() < 1e-9);
}

#[test]
fn score_zero_weight_cluster_is_skipped_by_default() {
	let fixture = write_fixture();
	let mut proc = EngineProcess::spawn();
	proc.initialize(fixture.path());

	let result = proc.call(
		"query/score",
		json!({
			"response": {
				"docs": [{ "id": "1", "title": "apple", "score": 0.0 }],
				"clusters": [{ "docs": ["1"], "score": 5.0 }]
			}
		}),
	);

	let clusters = result["clusters"].as_array().expect("clusters array");
	assert!(clusters[0]["supercatScores"]
		.as_object()
		.expect("scores map")
		.is_empty());
	assert!(result["totalQueryScores"]
		.as_object()
		.expect("totals map")
		.is_empty());
}

#[test]
fn score_rejects_unknown_zero_weight_behavior() {
	let fixture = write_fixture();
	let mut proc = EngineProcess::spawn();
	proc.initialize(fixture.path());

	let error = proc.call_err(
		"query/score",
		json!({
			"response": {
				"docs": [{ "id": "1", "title": "apple", "score": 1.0 }],
				"clusters": [{ "docs": ["1"], "score": 2.0 }]
			},
			"zeroWeightBehavior": "propogate"
		}),
	);
	assert_eq!(
		error["data"]["categoryCode"].as_str(),
		Some("SUPERCAT_SERIALIZATION")
	);
}

#[test]
fn lookup_of_minimal_record_line_responds() {
	// A two-byte record line must not stall the search loop; the request
	// has to come back, and with the stored line's contents.
	let mut file = tempfile::NamedTempFile::new().expect("temp file");
	file.write_all(b"x\nz> animal:0.8\n").expect("write fixture");
	file.flush().expect("flush fixture");

	let mut proc = EngineProcess::spawn();
	proc.initialize(file.path());

	let result = proc.call("store/lookup", json!({ "title": "x" }));
	assert_eq!(result["found"].as_bool(), Some(true));
	assert_eq!(result["title"].as_str(), Some("x"));

	let result = proc.call("store/lookup", json!({ "title": "y" }));
	assert_eq!(result["found"].as_bool(), Some(false));
}

#[test]
fn score_corrupt_record_is_fatal() {
	let mut file = tempfile::NamedTempFile::new().expect("temp file");
	file.write_all(b"apple> fruit:bad\n").expect("write fixture");
	file.flush().expect("flush fixture");

	let mut proc = EngineProcess::spawn();
	proc.initialize(file.path());

	let error = proc.call_err(
		"query/score",
		json!({
			"response": {
				"docs": [{ "id": "1", "title": "apple", "score": 1.0 }],
				"clusters": []
			}
		}),
	);
	assert_eq!(
		error["data"]["categoryCode"].as_str(),
		Some("SUPERCAT_CORRUPT_RECORD")
	);
}
