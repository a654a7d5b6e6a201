use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::{
    error::NetError,
    traits::Net,
    types::{Headers, Response},
};

/// Timeout decorator for Net implementations
pub struct TimeoutNet<N> {
    inner: N,
    timeout: Duration,
}

impl<N: Net> TimeoutNet<N> {
    pub fn new(inner: N, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl<N: Net> Net for TimeoutNet<N> {
    async fn get(&self, url: Url, headers: Option<Headers>) -> Result<Response, NetError> {
        tokio::time::timeout(self.timeout, self.inner.get(url, headers))
            .await
            .map_err(|_| NetError::timeout())?
    }
}
