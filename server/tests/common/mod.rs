//! Shared test harness: the in-memory directory adapter and app fixtures.

pub mod adapters;
pub mod fixtures;

/// Optional tracing output for test debugging.
#[allow(dead_code)]
pub fn setup_test_logging() {
	let _ = tracing_subscriber::fmt()
		.with_test_writer()
		.with_max_level(tracing::Level::DEBUG)
		.try_init();
}

// vim: ts=4
