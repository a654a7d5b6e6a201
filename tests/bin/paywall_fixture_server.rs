//! Standalone paywall for poking at the protocol by hand.
//!
//! Serves pseudo-random bytes under `/object/track` at 1000 units per MiB
//! until killed.
//!
//! ```bash
//! cargo run --bin paywall_fixture_server -- 5000000
//! # → object: http://127.0.0.1:PORT/object/track?offset=0&length=524288
//! ```

use std::env::args;

use paystream_core::UnitPrice;
use paystream_test_utils::{Paywall, init_tracing, pseudo_random_bytes};

const DEFAULT_SIZE: usize = 5_000_000;

#[tokio::main]
async fn main() {
    init_tracing();

    let size = args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_SIZE);
    let server = Paywall::new("track", pseudo_random_bytes(size, 42))
        .with_price(UnitPrice::per_mib(1000))
        .start()
        .await;

    let base = server.base_url();
    tracing::info!(%base, size, "paywall listening");
    println!("object: {base}object/track?offset=0&length=524288");
    println!("price:  {base}price/track");

    std::future::pending::<()>().await;
}
