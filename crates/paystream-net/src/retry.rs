use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::debug;
#[cfg(test)]
use unimock::unimock;
use url::Url;

use crate::{
    error::NetError,
    traits::Net,
    types::{Headers, Response, RetryPolicy},
};

pub trait RetryClassifier {
    fn should_retry(&self, error: &NetError) -> bool;
}

pub struct DefaultRetryClassifier;

impl RetryClassifier for DefaultRetryClassifier {
    fn should_retry(&self, error: &NetError) -> bool {
        error.is_retryable()
    }
}

pub struct DefaultRetryPolicy {
    classifier: DefaultRetryClassifier,
    policy: RetryPolicy,
}

impl DefaultRetryPolicy {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            classifier: DefaultRetryClassifier,
            policy,
        }
    }
}

#[cfg_attr(test, unimock(api = RetryPolicyMock))]
pub trait RetryPolicyTrait: Send + Sync {
    fn should_retry(&self, error: &NetError, attempt: u32) -> bool;
    fn delay_for_attempt(&self, attempt: u32) -> Duration;
    fn max_attempts(&self) -> u32;
}

impl RetryPolicyTrait for DefaultRetryPolicy {
    fn should_retry(&self, error: &NetError, attempt: u32) -> bool {
        if attempt >= self.policy.max_retries {
            return false;
        }

        self.classifier.should_retry(error)
    }

    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.policy.delay_for_attempt(attempt)
    }

    fn max_attempts(&self) -> u32 {
        self.policy.max_retries
    }
}

/// Retry decorator for Net implementations.
///
/// Retries transport errors the policy classifies as retryable, and responses
/// with a retryable status (5xx, 429, 408). When attempts run out on a
/// retryable status the last response is returned as-is.
pub struct RetryNet<N, P> {
    inner: N,
    retry_policy: P,
}

impl<N: Net, P: RetryPolicyTrait> RetryNet<N, P> {
    pub fn new(inner: N, retry_policy: P) -> Self {
        Self {
            inner,
            retry_policy,
        }
    }
}

#[async_trait]
impl<N: Net, P: RetryPolicyTrait> Net for RetryNet<N, P> {
    async fn get(&self, url: Url, headers: Option<Headers>) -> Result<Response, NetError> {
        let max_attempts = self.retry_policy.max_attempts();
        let mut last_error = None;

        for attempt in 0..=max_attempts {
            if attempt > 0 {
                sleep(self.retry_policy.delay_for_attempt(attempt)).await;
            }

            match self.inner.get(url.clone(), headers.clone()).await {
                Ok(resp) if resp.is_retryable_status() && attempt < max_attempts => {
                    debug!(%url, status = resp.status, attempt, "retrying on status");
                }
                Ok(resp) => return Ok(resp),
                Err(error) => {
                    if !self.retry_policy.should_retry(&error, attempt) {
                        return Err(match last_error {
                            Some(_) if error.is_retryable() => NetError::RetryExhausted {
                                max_retries: max_attempts,
                                source: Box::new(error),
                            },
                            _ => error,
                        });
                    }
                    debug!(%url, %error, attempt, "retrying on error");
                    last_error = Some(error);
                }
            }
        }

        Err(NetError::RetryExhausted {
            max_retries: max_attempts,
            source: Box::new(last_error.unwrap_or(NetError::Timeout)),
        })
    }
}
