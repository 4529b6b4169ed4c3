//! Process-wide tracing setup.

use tracing_subscriber::EnvFilter;

/// Initializes the global subscriber. `-v` raises the floor to info,
/// `-vv` to debug; `RUST_LOG` overrides both when set.
pub fn init(verbose: u8) {
	let default_directives = match verbose {
		0 => "warn",
		1 => "info",
		_ => "debug",
	};
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));
	tracing_subscriber::fmt().with_env_filter(filter).init();
}
