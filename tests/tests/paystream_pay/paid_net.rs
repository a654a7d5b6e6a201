use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use paystream::prelude::*;
use paystream_events::PaymentEvent;
use paystream_pay::{FlowObserver, NoopObserver, PaidNet, PaymentPhase, RECEIPT_HEADER};
use paystream_test_utils::{Paywall, PaywallMode, PaywallServer, StaticSigner};
use rstest::*;

use crate::common::{CHUNK_PRICE, TRACK, track};

/// Records every phase the flow reports.
#[derive(Default)]
struct Phases(Mutex<Vec<PaymentPhase>>);

impl Phases {
    fn seen(&self) -> Vec<PaymentPhase> {
        self.0.lock().unwrap().clone()
    }
}

impl FlowObserver for Phases {
    fn on_phase(&self, phase: &PaymentPhase) {
        self.0.lock().unwrap().push(phase.clone());
    }
}

fn paid_net(signer: &Arc<StaticSigner>, ceiling: u64) -> PaidNet<HttpClient> {
    HttpClient::new(NetOptions::default())
        .unwrap()
        .with_payment(Arc::clone(signer) as Arc<dyn PaymentSigner>, ceiling)
}

fn range_url(server: &PaywallServer, offset: u64, length: u64) -> Url {
    server
        .base_url()
        .join(&format!("object/{TRACK}?offset={offset}&length={length}"))
        .unwrap()
}

#[rstest]
#[tokio::test]
async fn pays_once_and_gets_receipt() {
    let server = Paywall::new(TRACK, track(2_000_000)).start().await;
    let signer = Arc::new(StaticSigner::new("0xlistener"));
    let net = paid_net(&signer, CHUNK_PRICE);
    let phases = Phases::default();

    let paid = net
        .fetch(range_url(&server, 0, 524_288), None, CHUNK_PRICE, &phases)
        .await
        .unwrap();

    assert_eq!(paid.response.status, 200);
    assert_eq!(paid.response.body, server.content().slice(0..524_288));
    assert!(paid.response.header(RECEIPT_HEADER).is_some());
    let summary = paid.payment.unwrap();
    assert_eq!(summary.value, CHUNK_PRICE);
    let receipt = summary.receipt.unwrap();
    assert!(receipt.success);
    assert_eq!(receipt.payer.as_deref(), Some("0xlistener"));

    assert_eq!(signer.calls(), 1);
    assert_eq!((server.unpaid_requests(), server.paid_requests()), (1, 1));
    let auth = &server.authorizations()[0];
    assert_eq!(auth.value(), CHUNK_PRICE);
    assert_eq!(auth.payee(), "0xpayee");
    assert_eq!(auth.nonce(), summary.nonce);
    assert_eq!(
        phases.seen(),
        vec![
            PaymentPhase::Probing,
            PaymentPhase::PaymentRequired { amount: CHUNK_PRICE },
            PaymentPhase::Signing,
            PaymentPhase::Submitting,
            PaymentPhase::Completed,
        ]
    );
}

#[rstest]
#[tokio::test]
async fn nonces_are_unique_per_request() {
    let server = Paywall::new(TRACK, track(2_000_000)).start().await;
    let signer = Arc::new(StaticSigner::new("0xlistener"));
    let net = paid_net(&signer, CHUNK_PRICE);

    for offset in [0, 524_288, 1_048_576] {
        net.fetch(range_url(&server, offset, 524_288), None, CHUNK_PRICE, &NoopObserver)
            .await
            .unwrap();
    }

    let mut nonces: Vec<_> = server
        .authorizations()
        .iter()
        .map(|a| a.nonce().to_string())
        .collect();
    nonces.sort();
    nonces.dedup();
    assert_eq!(nonces.len(), 3);
}

#[rstest]
#[tokio::test]
async fn free_content_skips_payment() {
    let server = Paywall::new(TRACK, track(1000))
        .with_price(UnitPrice::per_mib(0))
        .start()
        .await;
    let signer = Arc::new(StaticSigner::new("0xlistener"));

    let paid = paid_net(&signer, 0)
        .get(range_url(&server, 0, 1000), None)
        .await
        .unwrap();

    assert!(paid.payment.is_none());
    assert_eq!(paid.response.body.len(), 1000);
    assert_eq!(signer.calls(), 0);
}

#[rstest]
#[case::below(400, true)]
#[case::exact(500, false)]
#[case::above(10_000, false)]
#[tokio::test]
async fn ceiling_guards_the_signer(#[case] ceiling: u64, #[case] refused: bool) {
    let server = Paywall::new(TRACK, track(1_000_000)).start().await;
    let signer = Arc::new(StaticSigner::new("0xlistener"));
    let net = paid_net(&signer, ceiling);

    let result = net
        .fetch(range_url(&server, 0, 524_288), None, ceiling, &NoopObserver)
        .await;

    if refused {
        assert!(matches!(
            result,
            Err(PayError::CeilingExceeded {
                required: 500,
                ceiling: 400
            })
        ));
        assert_eq!(signer.calls(), 0);
        assert_eq!(server.paid_requests(), 0);
    } else {
        assert_eq!(result.unwrap().payment.unwrap().value, 500);
        assert_eq!(signer.calls(), 1);
    }
}

#[rstest]
#[case::double_charge(PaywallMode::DoubleCharge, 402)]
#[case::refused(PaywallMode::Reject, 403)]
#[tokio::test]
async fn refused_payment_is_not_resent(#[case] mode: PaywallMode, #[case] status: u16) {
    let server = Paywall::new(TRACK, track(1_000_000))
        .with_mode(mode)
        .start()
        .await;
    let signer = Arc::new(StaticSigner::new("0xlistener"));
    let bus = EventBus::new(32);
    let mut rx = bus.events();
    let net = paid_net(&signer, CHUNK_PRICE).with_bus(bus);

    let err = net
        .fetch(range_url(&server, 0, 524_288), None, CHUNK_PRICE, &NoopObserver)
        .await
        .unwrap_err();

    assert!(matches!(err, PayError::PaymentRejected { status: s, .. } if s == status));
    assert!(err.funds_at_risk());
    assert_eq!(signer.calls(), 1);
    assert_eq!(server.paid_requests(), 1);

    let rejected = rx.drain().into_iter().any(|e| {
        matches!(e, Event::Payment(PaymentEvent::Rejected { status: s, .. }) if s == status)
    });
    assert!(rejected);
}

#[rstest]
#[tokio::test]
async fn declined_signature_sends_nothing() {
    let server = Paywall::new(TRACK, track(1_000_000)).start().await;
    let signer = Arc::new(StaticSigner::new("0xlistener"));
    signer.set_declining(true);

    let err = paid_net(&signer, CHUNK_PRICE)
        .fetch(range_url(&server, 0, 524_288), None, CHUNK_PRICE, &NoopObserver)
        .await
        .unwrap_err();

    assert!(matches!(err, PayError::Signing(SignerError::Declined)));
    assert!(!err.funds_at_risk());
    assert_eq!(server.paid_requests(), 0);
}

#[rstest]
#[tokio::test]
async fn unsupported_network_is_a_protocol_error() {
    let server = Paywall::new(TRACK, track(1_000_000))
        .with_network("mainnet")
        .start()
        .await;
    let signer = Arc::new(StaticSigner::new("0xlistener"));
    let net = paid_net(&signer, CHUNK_PRICE)
        .with_options(PaymentOptions::default().with_network("base-sepolia"));

    let err = net
        .fetch(range_url(&server, 0, 524_288), None, CHUNK_PRICE, &NoopObserver)
        .await
        .unwrap_err();

    assert!(matches!(err, PayError::Protocol(_)));
    assert_eq!(signer.calls(), 0);
}

#[rstest]
#[case::in_sync(Duration::ZERO, true)]
#[case::server_ten_minutes_ahead(Duration::from_secs(600), false)]
#[tokio::test]
async fn paywall_checks_authorization_window(#[case] ahead: Duration, #[case] accepted: bool) {
    let server = Paywall::new(TRACK, track(1_000_000))
        .with_clock_ahead(ahead)
        .start()
        .await;
    let signer = Arc::new(StaticSigner::new("0xlistener"));

    let result = paid_net(&signer, CHUNK_PRICE)
        .fetch(range_url(&server, 0, 524_288), None, CHUNK_PRICE, &NoopObserver)
        .await;

    if accepted {
        assert_eq!(result.unwrap().response.status, 200);
    } else {
        assert!(matches!(result, Err(PayError::PaymentRejected { status: 402, .. })));
    }
    assert_eq!(server.paid_requests(), 1);
}
