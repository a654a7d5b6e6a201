use async_trait::async_trait;
use reqwest::Client;
use tracing::trace;
use url::Url;

use crate::{
    error::{NetError, NetResult},
    traits::Net,
    types::{Headers, NetOptions, Response},
};

/// reqwest-backed [`Net`] implementation.
///
/// Every request carries `options.request_timeout`, so a stalled server
/// surfaces as [`NetError::Timeout`].
#[derive(Clone, Debug)]
pub struct HttpClient {
    inner: Client,
    options: NetOptions,
}

impl HttpClient {
    /// # Errors
    ///
    /// Returns [`NetError::Http`] if the reqwest client cannot be built
    /// (TLS backend initialization failure).
    pub fn new(options: NetOptions) -> NetResult<Self> {
        let inner = Client::builder()
            .use_rustls_tls()
            .pool_max_idle_per_host(options.pool_max_idle_per_host)
            .build()
            .map_err(|e| NetError::http(e.to_string()))?;
        Ok(Self { inner, options })
    }

    #[must_use]
    pub fn options(&self) -> &NetOptions {
        &self.options
    }

    fn apply_headers(
        mut req: reqwest::RequestBuilder,
        headers: Option<Headers>,
    ) -> reqwest::RequestBuilder {
        if let Some(headers) = headers {
            for (k, v) in headers.iter() {
                req = req.header(k, v);
            }
        }
        req
    }
}

#[async_trait]
impl Net for HttpClient {
    async fn get(&self, url: Url, headers: Option<Headers>) -> Result<Response, NetError> {
        let req = self.inner.get(url.clone());
        let req = Self::apply_headers(req, headers);
        let req = req.timeout(self.options.request_timeout);

        let resp = req.send().await.map_err(NetError::from)?;
        let status = resp.status().as_u16();

        // reqwest yields lowercase names already; keep them that way so
        // `Response::header` lookups are case-insensitive.
        let mut out = Headers::new();
        for (name, value) in resp.headers() {
            if let Ok(v) = value.to_str() {
                out.insert(name.as_str().to_ascii_lowercase(), v);
            }
        }

        let body = resp.bytes().await.map_err(NetError::from)?;
        trace!(%url, status, len = body.len(), "response received");

        Ok(Response::new(url, status, out, body))
    }
}
