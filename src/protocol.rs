use serde::Deserialize;

// JSON-RPC 2.0 error codes
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const CATEGORY_ERROR: i32 = -32000;

#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
	pub id: u64,
	pub method: String,
	#[serde(default)]
	pub params: serde_json::Value,
}
