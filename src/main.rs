use anyhow::Result;
use clap::Parser;
use supercat_engine::config::CliArgs;
use supercat_engine::server::CategoryServer;
use supercat_engine::store::SortedKeyStore;
use supercat_engine::transport::NdjsonTransport;

fn main() -> Result<()> {
	let args = CliArgs::parse();

	// Logging goes to stderr; stdout carries the NDJSON protocol.
	tracing_subscriber::fmt()
		.with_writer(std::io::stderr)
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level)),
		)
		.init();

	let mut server = CategoryServer::new(NdjsonTransport::new());

	if let Some(path) = &args.store {
		let store = SortedKeyStore::open(path)?;
		tracing::info!(
			path = %path.display(),
			bytes = store.len_bytes(),
			"Sorted store opened"
		);
		server.attach_store(store);
	}

	tracing::info!("supercat-engine ready");

	if let Err(e) = server.run() {
		tracing::error!("Server error: {}", e);
		std::process::exit(1);
	}
	Ok(())
}
