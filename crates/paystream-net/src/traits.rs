use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
#[cfg(any(test, feature = "test-utils"))]
use unimock::unimock;
use url::Url;

use crate::{
    error::NetError,
    retry::{DefaultRetryPolicy, RetryNet},
    timeout::TimeoutNet,
    types::{Headers, Response, RetryPolicy},
};

#[cfg_attr(any(test, feature = "test-utils"), unimock(api = NetMock))]
#[async_trait]
pub trait Net: Send + Sync {
    /// Issue a GET request and return the response whatever its status.
    ///
    /// Only transport failures (connect, TLS, timeout, body read) are errors;
    /// callers decide what a non-2xx status means. Use
    /// [`Response::error_for_status`] for plain "must succeed" fetches.
    async fn get(&self, url: Url, headers: Option<Headers>) -> Result<Response, NetError>;
}

#[async_trait]
impl<N: Net + ?Sized> Net for Arc<N> {
    async fn get(&self, url: Url, headers: Option<Headers>) -> Result<Response, NetError> {
        (**self).get(url, headers).await
    }
}

pub trait NetExt: Net + Sized {
    /// Add timeout layer
    fn with_timeout(self, timeout: Duration) -> TimeoutNet<Self> {
        TimeoutNet::new(self, timeout)
    }

    /// Add retry layer.
    ///
    /// Never put this under a layer that attaches single-use credentials: a
    /// replayed request would carry the same credential twice.
    fn with_retry(self, policy: RetryPolicy) -> RetryNet<Self, DefaultRetryPolicy> {
        RetryNet::new(self, DefaultRetryPolicy::new(policy))
    }
}

impl<T: Net> NetExt for T {}
