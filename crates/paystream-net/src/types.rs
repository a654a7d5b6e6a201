use std::{cmp::min, collections::HashMap, time::Duration};

use bytes::Bytes;
use url::Url;

use crate::error::{NetError, NetResult, is_retryable_status};

#[derive(Clone, Debug, PartialEq)]
pub struct Headers {
    inner: HashMap<String, String>,
}

impl Headers {
    pub fn new() -> Self {
        Self {
            inner: HashMap::new(),
        }
    }

    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.inner.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for Headers {
    fn default() -> Self {
        Self::new()
    }
}

impl From<HashMap<String, String>> for Headers {
    fn from(map: HashMap<String, String>) -> Self {
        Self { inner: map }
    }
}

/// A fully buffered HTTP response.
///
/// Header names are stored lowercase by [`HttpClient`](crate::HttpClient).
#[derive(Clone, Debug)]
pub struct Response {
    pub url: Url,
    pub status: u16,
    pub headers: Headers,
    pub body: Bytes,
}

impl Response {
    pub fn new(url: Url, status: u16, headers: Headers, body: Bytes) -> Self {
        Self {
            url,
            status,
            headers,
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_payment_required(&self) -> bool {
        self.status == 402
    }

    pub fn is_retryable_status(&self) -> bool {
        is_retryable_status(self.status)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .or_else(|| self.headers.get(name))
    }

    /// Turn a non-2xx response into [`NetError::HttpError`].
    ///
    /// # Errors
    ///
    /// Returns [`NetError::HttpError`] carrying the status and a lossy UTF-8
    /// copy of the body when the status is not 2xx.
    pub fn error_for_status(self) -> NetResult<Self> {
        if self.is_success() {
            return Ok(self);
        }
        let body = (!self.body.is_empty()).then(|| String::from_utf8_lossy(&self.body).into_owned());
        Err(NetError::http_error(self.status, self.url, body))
    }
}

#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        let exponential_delay = self.base_delay.saturating_mul(factor);
        min(exponential_delay, self.max_delay)
    }
}

#[derive(Clone, Debug)]
pub struct NetOptions {
    pub request_timeout: Duration,
    pub retry_policy: RetryPolicy,
    /// Max idle connections per host. Set to 0 to disable pooling.
    pub pool_max_idle_per_host: usize,
}

impl Default for NetOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            retry_policy: RetryPolicy::default(),
            pool_max_idle_per_host: 4,
        }
    }
}

impl NetOptions {
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }
}
