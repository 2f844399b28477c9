use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
	name = "supercat-engine",
	about = "Sorted-file supercategory score lookup and cluster scoring over JSON-RPC 2.0 / NDJSON stdio"
)]
pub struct CliArgs {
	/// Sorted supercategory score file to open at startup.
	/// When omitted, a store is opened later via the store/initialize method.
	#[arg(long, env = "SUPERCAT_STORE")]
	pub store: Option<PathBuf>,

	/// Log level filter when RUST_LOG is not set
	#[arg(long, default_value = "info")]
	pub log_level: String,
}
