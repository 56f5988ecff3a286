#![forbid(unsafe_code)]

//! Library backing the `streamqueue` CLI and the `routine_fetch` job.

pub mod config;
pub mod download;
pub mod error;
pub mod fetch;
pub mod lister;
pub mod maintenance;
pub mod model;
pub mod store;
pub mod title;
pub mod watermark;

/// Installs the global `tracing` subscriber used by the binaries.
///
/// `RUST_LOG` wins when set; otherwise `debug` enables debug output.
pub fn init_tracing(debug: bool) {
    use tracing_subscriber::EnvFilter;

    let fallback = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
