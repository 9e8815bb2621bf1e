//! Diagnostic logging to stderr.
//!
//! `RUST_LOG` takes precedence. Otherwise the `-v` count selects the level
//! for this crate: warnings by default, then info, debug and trace.

use tracing_subscriber::EnvFilter;

/// Default filter directive for a `-v` count
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "ersummary=warn",
        1 => "ersummary=info",
        2 => "ersummary=debug",
        _ => "ersummary=trace",
    }
}

/// Install the global fmt subscriber. Later calls are ignored.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbosity >= 2)
        .with_level(true)
        .with_line_number(verbosity >= 3)
        .try_init();
}
