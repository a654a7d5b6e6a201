#![forbid(unsafe_code)]

//! HTTP transport for paystream.
//!
//! [`Net`] is the single request seam. [`HttpClient`] implements it on top of
//! reqwest; [`TimeoutNet`] and [`RetryNet`] are decorators composed through
//! [`NetExt`]. Unlike a typical client, [`Net::get`] hands back non-2xx
//! responses untouched so upper layers can react to `402 Payment Required`.

mod client;
mod endpoint;
mod error;
mod retry;
mod timeout;
mod traits;
mod types;

#[cfg(any(test, feature = "test-utils"))]
pub use crate::traits::NetMock;
pub use crate::{
    client::HttpClient,
    endpoint::endpoint,
    error::{NetError, NetResult},
    retry::{DefaultRetryPolicy, RetryNet, RetryPolicyTrait},
    timeout::TimeoutNet,
    traits::{Net, NetExt},
    types::{Headers, NetOptions, Response, RetryPolicy},
};
