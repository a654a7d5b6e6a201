#![forbid(unsafe_code)]
#![expect(
    clippy::expect_used,
    reason = "test utility crate, failing fast is the point"
)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Shared test utilities for the paystream workspace.

pub mod http_server;
pub mod paywall;
pub mod rng;
pub mod signer;
pub mod sink;

pub use http_server::TestHttpServer;
pub use paywall::{Paywall, PaywallMode, PaywallServer};
pub use rng::{Xorshift64, pseudo_random_bytes};
pub use signer::StaticSigner;
pub use sink::RecordingSink;

/// Install a `fmt` subscriber honoring `RUST_LOG`, once per process.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
