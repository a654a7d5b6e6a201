use std::{sync::Arc, time::Duration};

use paystream::prelude::*;
use paystream_events::{ChunkEvent, PlaybackEvent};
use paystream_test_utils::{Paywall, PaywallMode, RecordingSink, StaticSigner};
use rstest::*;

use crate::common::{MIME, TRACK, harness, track};

const TRACK_LEN: usize = 1_200_000;

fn slow_paywall() -> Paywall {
    Paywall::new(TRACK, track(TRACK_LEN)).with_delay(Duration::from_millis(200))
}

#[rstest]
#[tokio::test]
async fn ceiling_below_price_refuses_before_signing() {
    let h = harness(Paywall::new(TRACK, track(TRACK_LEN)), |c| {
        c.with_max_value_per_chunk(400)
    })
    .await;
    let mut rx = h.player.bus().events();

    let err = h.player.fetch_next_chunk().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::PaymentCeilingExceeded);
    assert!(!err.is_retryable());
    assert_eq!(h.signer.calls(), 0);
    assert_eq!(h.server.paid_requests(), 0);
    assert_eq!(h.player.phase(), PlaybackPhase::Idle);

    let phases: Vec<_> = rx.drain()
        .into_iter()
        .filter_map(|e| match e {
            Event::Playback(PlaybackEvent::PhaseChanged { to, .. }) => Some(to),
            _ => None,
        })
        .collect();
    assert_eq!(
        phases,
        vec![
            PlaybackPhase::AwaitingPayment,
            PlaybackPhase::Error,
            PlaybackPhase::Idle
        ]
    );
}

#[rstest]
#[case::double_charge(PaywallMode::DoubleCharge)]
#[case::refused(PaywallMode::Reject)]
#[tokio::test]
async fn refused_payment_signs_once(#[case] mode: PaywallMode) {
    let h = harness(Paywall::new(TRACK, track(TRACK_LEN)).with_mode(mode), |c| c).await;

    let err = h.player.fetch_next_chunk().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::PaymentProtocol);
    assert_eq!(h.signer.calls(), 1);
    assert_eq!(h.server.paid_requests(), 1);
    assert_eq!(h.player.snapshot().loaded_bytes, 0);
}

#[rstest]
#[tokio::test]
async fn declined_wallet_is_retryable_at_same_offset() {
    let h = harness(Paywall::new(TRACK, track(TRACK_LEN)), |c| c).await;
    h.player.fetch_next_chunk().await.unwrap();

    h.signer.set_declining(true);
    let err = h.player.fetch_next_chunk().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Signing);
    assert!(err.is_retryable());
    assert_eq!(h.player.snapshot().loaded_bytes, 524_288);

    h.signer.set_declining(false);
    let ChunkOutcome::Appended { range, .. } = h.player.fetch_next_chunk().await.unwrap() else {
        panic!("expected a chunk");
    };
    assert_eq!(range.offset(), 524_288);
    assert_eq!(h.server.paid_requests(), 2);
}

#[rstest]
#[tokio::test]
async fn second_fetch_while_in_flight_is_refused() {
    let h = harness(slow_paywall(), |c| c).await;

    let (first, second) = tokio::join!(h.player.fetch_next_chunk(), h.player.fetch_next_chunk());

    assert!(matches!(first.unwrap(), ChunkOutcome::Appended { .. }));
    let err = second.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FetchInProgress);
    assert_eq!(h.server.paid_requests(), 1);
    assert_eq!(h.signer.calls(), 1);
}

#[rstest]
#[tokio::test]
async fn reset_discards_in_flight_chunk() {
    let h = harness(slow_paywall(), |c| c).await;
    let mut rx = h.player.bus().events();

    let (outcome, ()) = tokio::join!(h.player.fetch_next_chunk(), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        h.player.reset().unwrap();
    });

    assert_eq!(outcome.unwrap(), ChunkOutcome::Discarded);
    assert_eq!(h.player.snapshot().loaded_bytes, 0);
    assert_eq!(h.player.phase(), PlaybackPhase::Idle);
    assert!(h.sink().sources().is_empty());
    assert!(rx.drain().iter().any(|e| matches!(
        e,
        Event::Chunk(ChunkEvent::Discarded { generation: 1, .. })
    )));
}

#[rstest]
#[tokio::test]
async fn new_session_fetches_while_stale_one_is_in_flight() {
    let h = harness(slow_paywall(), |c| c).await;

    let (stale, fresh) = tokio::join!(h.player.fetch_next_chunk(), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        h.player.reset().unwrap();
        h.player.fetch_next_chunk().await
    });

    assert_eq!(stale.unwrap(), ChunkOutcome::Discarded);
    let ChunkOutcome::Appended { range, snapshot, .. } = fresh.unwrap() else {
        panic!("expected a chunk");
    };
    assert_eq!(range.offset(), 0);
    assert_eq!(snapshot.loaded_bytes, 524_288);
    assert_eq!(h.player.blobs().live_count(), 1);
    assert_eq!(h.played_bytes(), h.server.content().slice(0..524_288));
}

#[rstest]
#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let h = harness(Paywall::new(TRACK, track(TRACK_LEN)), |c| c).await;
    let mut endpoint = h.server.base_url().clone();
    endpoint.set_port(Some(1)).unwrap();
    let store = BlobStore::default();
    let player = PlaybackController::new(
        PlayerConfig::new(endpoint)
            .with_blob_store(store.clone())
            .with_net(NetOptions::default().with_request_timeout(Duration::from_secs(2))),
        h.signer.clone(),
        RecordingSink::new(store),
    )
    .unwrap();
    player
        .load(ContentRef::new(ContentKey::new(TRACK).unwrap(), MIME, h.server.price()).unwrap())
        .unwrap();

    let err = player.fetch_next_chunk().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(err.is_retryable());
    assert_eq!(h.signer.calls(), 0);
}

#[rstest]
#[tokio::test]
async fn fetch_without_content_fails() {
    let store = BlobStore::default();
    let player = PlaybackController::new(
        PlayerConfig::new(Url::parse("http://127.0.0.1:1/").unwrap()),
        Arc::new(StaticSigner::new("0xlistener")),
        RecordingSink::new(store),
    )
    .unwrap();

    let err = player.fetch_next_chunk().await.unwrap_err();

    assert!(matches!(err, PlaybackError::NoContent));
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}
