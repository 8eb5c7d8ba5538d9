//! Tracing setup for the CLI
//!
//! Library crates log through the `log` facade; the subscriber installed
//! here also picks those records up, so one filter covers everything.

use tracing_subscriber::{fmt, EnvFilter};

/// Filter directives for our own crates at `level`, everything else at warn.
pub fn filter_directives(level: &str) -> String {
    format!("warn,civicsim={level},civicsim_core={level},civicsim_logic={level}")
}

/// Install a compact stderr subscriber. Stdout stays reserved for command output.
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(filter_directives(level))
        .unwrap_or_else(|_| EnvFilter::new(filter_directives("info")));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}
