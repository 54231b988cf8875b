//! Personal-finance projection and tax engine.
//!
//! `core` holds the pure numeric algorithms (tax, debt, retirement
//! simulation, budget health). `api` exposes them over HTTP and the CLI.

pub mod api;
pub mod core;
pub mod error;

use std::sync::Once;

pub use error::{PlannerError, Result};

static TRACING_INIT: Once = Once::new();

/// Installs the global `fmt` subscriber, honouring `RUST_LOG`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("finplan=info"));

        fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_tracing_is_idempotent() {
        super::init_tracing();
        super::init_tracing();
    }
}
