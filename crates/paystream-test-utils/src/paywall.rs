//! Axum fixture speaking the range and payment protocol.
//!
//! Routes:
//! - `GET /object/{key}?offset=&length=`: range of the content. Metered
//!   content answers an unpaid request with `402` and `X-Payment-Required`,
//!   and a paid one with the bytes plus an `X-Payment-Response` receipt.
//! - `GET /price/{key}`: `{"price", "unitSize", "decimals"}` quote.

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use bytes::Bytes;
use derive_setters::Setters;
use parking_lot::Mutex;
use paystream_core::{ByteRange, UnitPrice};
use paystream_pay::{
    PAYMENT_HEADER, PaymentAuthorization, PaymentReceipt, PaymentRequirements, PaymentScheme,
    RECEIPT_HEADER, REQUIREMENTS_HEADER,
};
use serde::Deserialize;
use url::Url;

use crate::http_server::TestHttpServer;

/// How the fixture treats a request that carries a payment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PaywallMode {
    /// Accept valid payments and serve the range.
    #[default]
    Honest,
    /// Answer `402` again even after payment.
    DoubleCharge,
    /// Refuse every payment with `403`.
    Reject,
}

/// Fixture settings; [`start`](Self::start) serves them.
#[derive(Clone, Debug, Setters)]
#[setters(prefix = "with_", strip_option)]
pub struct Paywall {
    #[setters(skip)]
    pub key: String,
    #[setters(skip)]
    pub content: Bytes,
    pub price: UnitPrice,
    #[setters(into)]
    pub payee: String,
    #[setters(into)]
    pub network: String,
    pub max_timeout: Duration,
    pub mode: PaywallMode,
    /// Delay before every range response.
    pub delay: Option<Duration>,
    /// How far the paywall's clock runs ahead of the client's when judging
    /// authorization windows.
    pub clock_ahead: Duration,
}

impl Paywall {
    /// 1000 smallest units per MiB, six decimals.
    #[must_use]
    pub fn new(key: &str, content: Bytes) -> Self {
        Self {
            key: key.to_string(),
            content,
            price: UnitPrice::per_mib(1000),
            payee: "0xpayee".to_string(),
            network: "base-sepolia".to_string(),
            max_timeout: Duration::from_secs(60),
            mode: PaywallMode::Honest,
            delay: None,
            clock_ahead: Duration::ZERO,
        }
    }

    pub async fn start(self) -> PaywallServer {
        let state = Arc::new(PaywallState {
            paywall: self,
            unpaid_requests: AtomicUsize::new(0),
            paid: AtomicUsize::new(0),
            authorizations: Mutex::new(Vec::new()),
            ranges: Mutex::new(Vec::new()),
        });
        let router = Router::new()
            .route("/object/{key}", get(object))
            .route("/price/{key}", get(price))
            .with_state(Arc::clone(&state));
        PaywallServer {
            server: TestHttpServer::new(router).await,
            state,
        }
    }
}

struct PaywallState {
    paywall: Paywall,
    unpaid_requests: AtomicUsize,
    paid: AtomicUsize,
    authorizations: Mutex<Vec<PaymentAuthorization>>,
    ranges: Mutex<Vec<ByteRange>>,
}

impl PaywallState {
    fn requirements(&self, range: ByteRange) -> PaymentRequirements {
        let paywall = &self.paywall;
        PaymentRequirements {
            scheme: PaymentScheme::Exact,
            network: paywall.network.clone(),
            amount: paywall.price.amount_for(range.length()).unwrap_or(u64::MAX),
            pay_to: paywall.payee.clone(),
            asset: "0xusdc".to_string(),
            resource: Some(format!("/object/{}", paywall.key)),
            max_timeout: paywall.max_timeout,
        }
    }

    fn payment_required(&self, range: ByteRange) -> Response {
        (
            StatusCode::PAYMENT_REQUIRED,
            [(REQUIREMENTS_HEADER, self.requirements(range).to_header())],
        )
            .into_response()
    }

    fn now(&self) -> u64 {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        (since_epoch + self.paywall.clock_ahead).as_secs()
    }

    fn slice(&self, range: ByteRange) -> Bytes {
        let len = self.paywall.content.len() as u64;
        let start = range.offset().min(len) as usize;
        let end = range.end().min(len) as usize;
        self.paywall.content.slice(start..end)
    }
}

/// Running paywall fixture. Stops when dropped.
pub struct PaywallServer {
    server: TestHttpServer,
    state: Arc<PaywallState>,
}

impl PaywallServer {
    /// Root serving `/object/...` and `/price/...`.
    pub fn base_url(&self) -> &Url {
        self.server.base_url()
    }

    pub fn content(&self) -> &Bytes {
        &self.state.paywall.content
    }

    pub fn price(&self) -> UnitPrice {
        self.state.paywall.price
    }

    /// Range requests that arrived without a payment.
    pub fn unpaid_requests(&self) -> usize {
        self.state.unpaid_requests.load(Ordering::SeqCst)
    }

    /// Range requests that arrived with a decodable payment.
    pub fn paid_requests(&self) -> usize {
        self.state.paid.load(Ordering::SeqCst)
    }

    pub fn authorizations(&self) -> Vec<PaymentAuthorization> {
        self.state.authorizations.lock().clone()
    }

    /// Every requested range, in arrival order.
    pub fn ranges(&self) -> Vec<ByteRange> {
        self.state.ranges.lock().clone()
    }
}

#[derive(Deserialize)]
struct RangeQuery {
    offset: u64,
    length: u64,
}

async fn object(
    State(state): State<Arc<PaywallState>>,
    Path(key): Path<String>,
    Query(query): Query<RangeQuery>,
    headers: HeaderMap,
) -> Response {
    if key != state.paywall.key {
        return StatusCode::NOT_FOUND.into_response();
    }
    let Ok(range) = ByteRange::new(query.offset, query.length) else {
        return (StatusCode::BAD_REQUEST, "empty range").into_response();
    };
    state.ranges.lock().push(range);
    if let Some(delay) = state.paywall.delay {
        tokio::time::sleep(delay).await;
    }

    if state.paywall.price.is_unmetered() {
        return state.slice(range).into_response();
    }

    let Some(header) = headers.get(PAYMENT_HEADER).and_then(|v| v.to_str().ok()) else {
        state.unpaid_requests.fetch_add(1, Ordering::SeqCst);
        return state.payment_required(range);
    };
    let auth = match PaymentAuthorization::from_header(header) {
        Ok(auth) => auth,
        Err(error) => return (StatusCode::BAD_REQUEST, error.to_string()).into_response(),
    };
    state.paid.fetch_add(1, Ordering::SeqCst);
    state.authorizations.lock().push(auth.clone());

    match state.paywall.mode {
        PaywallMode::DoubleCharge => return state.payment_required(range),
        PaywallMode::Reject => {
            return (StatusCode::FORBIDDEN, "payment rejected").into_response();
        }
        PaywallMode::Honest => {}
    }

    let required = state.requirements(range);
    if auth.value() < required.amount || auth.payee() != required.pay_to {
        return state.payment_required(range);
    }
    let now = state.now();
    if !auth.is_valid_at(now) {
        tracing::debug!(nonce = auth.nonce(), now, "authorization outside its window");
        return state.payment_required(range);
    }

    let receipt = PaymentReceipt {
        success: true,
        transaction: Some(format!("0xtx{}", &auth.nonce()[2..10])),
        network: auth.network().to_string(),
        payer: Some(auth.payer().to_string()),
    };
    (
        StatusCode::OK,
        [(RECEIPT_HEADER, receipt.to_header())],
        state.slice(range),
    )
        .into_response()
}

async fn price(State(state): State<Arc<PaywallState>>, Path(key): Path<String>) -> Response {
    if key != state.paywall.key {
        return StatusCode::NOT_FOUND.into_response();
    }
    let price = state.paywall.price;
    Json(serde_json::json!({
        "price": price.amount(),
        "unitSize": price.unit_size(),
        "decimals": price.decimals(),
    }))
    .into_response()
}
