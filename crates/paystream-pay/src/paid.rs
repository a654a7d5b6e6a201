use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use paystream_events::{EventBus, PaymentEvent};
use paystream_net::{Headers, Net, Response};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    PAYMENT_HEADER,
    authorization::{PaymentAuthorization, PaymentIntent},
    error::{PayError, PayResult},
    flow::{FlowObserver, NoopObserver, PaymentPhase},
    options::PaymentOptions,
    requirements::{PaymentReceipt, PaymentRequirements},
    signer::PaymentSigner,
};

/// Source of the current time in unix seconds.
pub type Clock = Arc<dyn Fn() -> u64 + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    })
}

/// What was paid for a response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentSummary {
    pub value: u64,
    pub nonce: String,
    pub receipt: Option<PaymentReceipt>,
}

#[derive(Clone, Debug)]
pub struct PaidResponse {
    pub response: Response,
    /// `None` when the server served the request without asking for payment.
    pub payment: Option<PaymentSummary>,
}

enum FlowState {
    Quote,
    Authorize(PaymentRequirements),
    Submit(PaymentAuthorization),
    Done(PaidResponse),
}

/// Payment decorator for [`Net`] implementations.
///
/// Every request runs through `Quote -> Authorize -> Submit -> Done`. The
/// `Authorize` and `Submit` states are entered at most once per request, so
/// a single call never signs or sends more than one authorization.
///
/// The inner transport must not retry on its own: a replayed paid request
/// carries the same single-use authorization.
pub struct PaidNet<N> {
    inner: N,
    signer: Arc<dyn PaymentSigner>,
    ceiling: u64,
    options: PaymentOptions,
    bus: Option<EventBus>,
    clock: Clock,
}

impl<N: Net> PaidNet<N> {
    pub fn new(inner: N, signer: Arc<dyn PaymentSigner>, ceiling: u64) -> Self {
        Self {
            inner,
            signer,
            ceiling,
            options: PaymentOptions::default(),
            bus: None,
            clock: system_clock(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: PaymentOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Default ceiling used by [`PaidNet::get`].
    pub fn ceiling(&self) -> u64 {
        self.ceiling
    }

    pub fn options(&self) -> &PaymentOptions {
        &self.options
    }

    /// Fetch `url`, paying up to the default ceiling if asked.
    pub async fn get(&self, url: Url, headers: Option<Headers>) -> PayResult<PaidResponse> {
        self.fetch(url, headers, self.ceiling, &NoopObserver).await
    }

    /// Fetch `url`, paying at most `ceiling` if the server answers 402.
    ///
    /// # Errors
    ///
    /// - [`PayError::Net`] if the unpaid request fails in transit.
    /// - [`PayError::CeilingExceeded`] if the server asks for more than
    ///   `ceiling`. The signer is never called.
    /// - [`PayError::Protocol`] for missing or unacceptable terms.
    /// - [`PayError::Signing`] if the wallet declines or fails.
    /// - [`PayError::AuthorizationExpired`] if signing outlasted the validity
    ///   window. The stale authorization is not sent.
    /// - [`PayError::PaymentRejected`] / [`PayError::PaymentUnconfirmed`] if
    ///   the paid request does not succeed. It is not reissued.
    pub async fn fetch(
        &self,
        url: Url,
        headers: Option<Headers>,
        ceiling: u64,
        observer: &dyn FlowObserver,
    ) -> PayResult<PaidResponse> {
        let mut state = FlowState::Quote;
        loop {
            state = match state {
                FlowState::Quote => {
                    observer.on_phase(&PaymentPhase::Probing);
                    let resp = self.inner.get(url.clone(), headers.clone()).await?;
                    if resp.is_payment_required() {
                        FlowState::Authorize(PaymentRequirements::from_response(&resp)?)
                    } else {
                        FlowState::Done(PaidResponse {
                            response: resp,
                            payment: None,
                        })
                    }
                }
                FlowState::Authorize(req) => {
                    observer.on_phase(&PaymentPhase::PaymentRequired { amount: req.amount });
                    FlowState::Submit(self.authorize(&url, &req, ceiling, observer).await?)
                }
                FlowState::Submit(auth) => {
                    observer.on_phase(&PaymentPhase::Submitting);
                    FlowState::Done(self.submit(&url, headers.clone(), &auth).await?)
                }
                FlowState::Done(resp) => {
                    observer.on_phase(&PaymentPhase::Completed);
                    return Ok(resp);
                }
            };
        }
    }

    async fn authorize(
        &self,
        url: &Url,
        req: &PaymentRequirements,
        ceiling: u64,
        observer: &dyn FlowObserver,
    ) -> PayResult<PaymentAuthorization> {
        let resource = resource_of(url);
        debug!(%resource, amount = req.amount, ceiling, network = %req.network, "payment required");
        self.publish(PaymentEvent::Required {
            resource: resource.clone(),
            amount: req.amount,
            payee: req.pay_to.clone(),
            network: req.network.clone(),
        });

        if let Some(network) = &self.options.network
            && *network != req.network
        {
            return Err(PayError::protocol(format!(
                "server wants payment on {:?}, configured for {network:?}",
                req.network
            )));
        }

        if req.amount > ceiling {
            warn!(%resource, required = req.amount, ceiling, "payment exceeds ceiling");
            self.publish(PaymentEvent::CeilingExceeded {
                resource,
                required: req.amount,
                ceiling,
            });
            return Err(PayError::CeilingExceeded {
                required: req.amount,
                ceiling,
            });
        }

        let intent = self.intent_for(req);
        intent.validate()?;
        observer.on_phase(&PaymentPhase::Signing);
        let signature = self.signer.sign(&intent).await?;
        let auth = PaymentAuthorization::new(&intent, self.signer.payer(), signature)?;

        let now = (self.clock)();
        if !auth.is_valid_at(now) {
            warn!(
                %resource,
                nonce = auth.nonce(),
                now,
                valid_before = auth.valid_before(),
                "authorization expired while signing"
            );
            return Err(PayError::AuthorizationExpired {
                nonce: auth.nonce().to_string(),
                valid_after: auth.valid_after(),
                valid_before: auth.valid_before(),
                now,
            });
        }

        self.publish(PaymentEvent::Authorized {
            resource,
            value: auth.value(),
            nonce: auth.nonce().to_string(),
        });
        Ok(auth)
    }

    fn intent_for(&self, req: &PaymentRequirements) -> PaymentIntent {
        let now = (self.clock)();
        let validity = req.max_timeout.min(self.options.max_validity);
        PaymentIntent {
            payee: req.pay_to.clone(),
            value: req.amount,
            asset: req.asset.clone(),
            network: req.network.clone(),
            valid_after: now.saturating_sub(self.options.clock_skew.as_secs()),
            valid_before: now.saturating_add(validity.as_secs()),
            nonce: format!("0x{}", hex::encode(rand::random::<[u8; 32]>())),
        }
    }

    async fn submit(
        &self,
        url: &Url,
        headers: Option<Headers>,
        auth: &PaymentAuthorization,
    ) -> PayResult<PaidResponse> {
        let resource = resource_of(url);
        let mut headers = headers.unwrap_or_default();
        headers.insert(PAYMENT_HEADER, auth.to_header());

        let resp = match self.inner.get(url.clone(), Some(headers)).await {
            Ok(resp) => resp,
            Err(source) => {
                warn!(%resource, nonce = auth.nonce(), error = %source, "paid request lost in transit");
                return Err(PayError::PaymentUnconfirmed {
                    nonce: auth.nonce().to_string(),
                    source,
                });
            }
        };

        if !resp.is_success() {
            warn!(%resource, status = resp.status, "paid request refused");
            self.publish(PaymentEvent::Rejected {
                resource,
                status: resp.status,
            });
            return Err(PayError::PaymentRejected {
                status: resp.status,
                reason: refusal_reason(&resp),
            });
        }

        let receipt = PaymentReceipt::from_response(&resp);
        info!(%resource, value = auth.value(), nonce = auth.nonce(), "payment settled");
        self.publish(PaymentEvent::Settled {
            resource,
            value: auth.value(),
            transaction: receipt.as_ref().and_then(|r| r.transaction.clone()),
        });
        Ok(PaidResponse {
            response: resp,
            payment: Some(PaymentSummary {
                value: auth.value(),
                nonce: auth.nonce().to_string(),
                receipt,
            }),
        })
    }

    fn publish(&self, event: PaymentEvent) {
        if let Some(bus) = &self.bus {
            bus.publish(event);
        }
    }
}

fn resource_of(url: &Url) -> String {
    match url.query() {
        Some(q) => format!("{}?{q}", url.path()),
        None => url.path().to_string(),
    }
}

fn refusal_reason(resp: &Response) -> String {
    const MAX_REASON: usize = 200;
    if resp.is_payment_required() {
        return "payment required again after paying".to_string();
    }
    let body = String::from_utf8_lossy(&resp.body);
    let body = body.trim();
    if body.is_empty() {
        return format!("HTTP {}", resp.status);
    }
    body.chars().take(MAX_REASON).collect()
}

pub trait PayNetExt: Net + Sized {
    /// Add payment layer.
    fn with_payment(self, signer: Arc<dyn PaymentSigner>, ceiling: u64) -> PaidNet<Self> {
        PaidNet::new(self, signer, ceiling)
    }
}

impl<T: Net> PayNetExt for T {}
