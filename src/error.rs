use thiserror::Error;

#[derive(Debug, Error)]
pub enum CategoryError {
	#[error("Store not initialized: call store/initialize first")]
	NotInitialized,
	#[error("Corrupt record: {0}")]
	CorruptRecord(String),
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	#[error("Serialization error: {0}")]
	Serialization(String),
}

impl CategoryError {
	pub fn code(&self) -> &str {
		match self {
			Self::NotInitialized => "SUPERCAT_NOT_LOADED",
			Self::CorruptRecord(_) => "SUPERCAT_CORRUPT_RECORD",
			Self::Io(_) => "SUPERCAT_IO",
			Self::Serialization(_) => "SUPERCAT_SERIALIZATION",
		}
	}

	pub fn to_json_rpc_error(&self) -> serde_json::Value {
		serde_json::json!({
			"categoryCode": self.code(),
			"message": self.to_string(),
		})
	}
}
