//! End-to-end tests for paystream
#![expect(
    clippy::unwrap_used,
    reason = "integration test crate, unwraps are acceptable in test code"
)]

mod common;
mod paystream_net;
mod paystream_pay;
mod paystream_play;
