use std::time::Duration;

use paystream::prelude::*;
use paystream_events::{ChunkEvent, PaymentEvent, PlaybackEvent};
use paystream_test_utils::Paywall;
use rstest::*;

use crate::common::{CHUNK_PRICE, MIME, TRACK, harness, track};

const TRACK_LEN: usize = 1_200_000;

#[rstest]
#[tokio::test]
async fn whole_track_is_paid_chunk_by_chunk() {
    let h = harness(Paywall::new(TRACK, track(TRACK_LEN)), |c| c).await;

    let mut offsets = Vec::new();
    loop {
        match h.player.fetch_next_chunk().await.unwrap() {
            ChunkOutcome::Appended { range, .. } => offsets.push(range.offset()),
            ChunkOutcome::EndOfContent { total_bytes } => {
                assert_eq!(total_bytes, TRACK_LEN as u64);
                break;
            }
            ChunkOutcome::Discarded => panic!("nothing reset the session"),
        }
    }

    assert_eq!(offsets, vec![0, 524_288, 1_048_576]);
    assert_eq!(h.played_bytes(), *h.server.content());
    assert_eq!(h.server.paid_requests(), 3);
    assert_eq!(h.signer.calls(), 3);
    assert!(
        h.server
            .authorizations()
            .iter()
            .all(|a| a.value() == CHUNK_PRICE)
    );

    let snapshot = h.player.snapshot();
    assert!(snapshot.complete);
    assert_eq!(snapshot.phase, PlaybackPhase::Ready);
    assert_eq!(snapshot.chunk_count, 3);
    assert_eq!(h.player.blobs().live_count(), 1);
}

#[rstest]
#[tokio::test]
async fn finished_track_fetches_nothing_more() {
    let h = harness(Paywall::new(TRACK, track(1000)), |c| c).await;

    let first = h.player.fetch_next_chunk().await.unwrap();
    assert!(matches!(first, ChunkOutcome::Appended { received: 1000, .. }));

    let again = h.player.fetch_next_chunk().await.unwrap();
    assert_eq!(again, ChunkOutcome::EndOfContent { total_bytes: 1000 });
    assert_eq!(h.server.ranges().len(), 1);
}

#[rstest]
#[tokio::test]
async fn track_ending_on_chunk_boundary() {
    let paywall = Paywall::new(TRACK, track(1024)).with_price(UnitPrice::per_mib(1_000_000));
    let h = harness(paywall, |c| c.with_chunk_size(512)).await;

    for _ in 0..2 {
        assert!(matches!(
            h.player.fetch_next_chunk().await.unwrap(),
            ChunkOutcome::Appended { received: 512, .. }
        ));
    }
    assert!(!h.player.snapshot().complete);

    // The empty range past the end is still priced and paid.
    assert_eq!(
        h.player.fetch_next_chunk().await.unwrap(),
        ChunkOutcome::EndOfContent { total_bytes: 1024 }
    );
    assert!(h.player.snapshot().complete);
    assert_eq!(h.played_bytes(), *h.server.content());
}

#[rstest]
#[tokio::test]
async fn playback_position_survives_append() {
    let h = harness(Paywall::new(TRACK, track(TRACK_LEN)), |c| c).await;
    h.player.fetch_next_chunk().await.unwrap();

    h.player.play();
    h.sink().set_position(Duration::from_secs(3));
    h.player.fetch_next_chunk().await.unwrap();

    assert_eq!(h.sink().seeks().last(), Some(&Duration::from_secs(3)));
    assert!(!h.sink().is_paused());
    assert_eq!(h.sink().play_count(), 2);
    assert_eq!(h.sink().sources().len(), 2);
}

#[rstest]
#[tokio::test]
async fn paused_sink_stays_paused() {
    let h = harness(Paywall::new(TRACK, track(TRACK_LEN)), |c| c).await;

    h.player.fetch_next_chunk().await.unwrap();

    assert!(h.sink().is_paused());
    assert_eq!(h.sink().play_count(), 0);
}

#[rstest]
#[tokio::test]
async fn budget_resizes_next_range() {
    let h = harness(Paywall::new(TRACK, track(TRACK_LEN)), |c| c).await;

    assert_eq!(h.player.set_chunk_budget(250).unwrap(), 262_144);
    let ChunkOutcome::Appended { range, .. } = h.player.fetch_next_chunk().await.unwrap() else {
        panic!("expected a chunk");
    };

    assert_eq!(range.length(), 262_144);
    assert_eq!(h.server.authorizations()[0].value(), 250);
}

#[rstest]
#[tokio::test]
async fn price_lookup_then_load() {
    let h = harness(
        Paywall::new(TRACK, track(1000)).with_price(UnitPrice::per_mib(2000)),
        |c| c,
    )
    .await;

    let content = h
        .player
        .load_by_key(ContentKey::new(TRACK).unwrap(), MIME)
        .await
        .unwrap();

    assert_eq!(*content.price(), UnitPrice::per_mib(2000));
    assert_eq!(h.player.content(), Some(content));
    assert_eq!(h.player.generation(), 2);
}

#[rstest]
#[tokio::test]
async fn one_chunk_emits_flow_events_in_order() {
    let h = harness(Paywall::new(TRACK, track(TRACK_LEN)), |c| c).await;
    let mut rx = h.player.bus().events();

    h.player.fetch_next_chunk().await.unwrap();

    let events = rx.drain();
    let phases: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            Event::Playback(PlaybackEvent::PhaseChanged { to, .. }) => Some(*to),
            _ => None,
        })
        .collect();
    assert_eq!(
        phases,
        vec![
            PlaybackPhase::AwaitingPayment,
            PlaybackPhase::Buffering,
            PlaybackPhase::Ready
        ]
    );

    let position = |pred: fn(&Event) -> bool| events.iter().position(pred).unwrap();
    let requested = position(|e| matches!(e, Event::Chunk(ChunkEvent::Requested { .. })));
    let required = position(|e| matches!(e, Event::Payment(PaymentEvent::Required { amount: 500, .. })));
    let authorized = position(|e| matches!(e, Event::Payment(PaymentEvent::Authorized { .. })));
    let settled = position(|e| matches!(e, Event::Payment(PaymentEvent::Settled { transaction: Some(_), .. })));
    let appended = position(|e| matches!(e, Event::Chunk(ChunkEvent::Appended { offset: 0, .. })));
    assert!(requested < required);
    assert!(required < authorized);
    assert!(authorized < settled);
    assert!(settled < appended);
}
