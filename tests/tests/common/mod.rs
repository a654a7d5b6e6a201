//! Paywall-backed player harness shared by the integration tests.

use std::sync::Arc;

use bytes::Bytes;
use paystream::prelude::*;
use paystream_test_utils::{
    Paywall, PaywallServer, RecordingSink, StaticSigner, init_tracing, pseudo_random_bytes,
};

pub(crate) const TRACK: &str = "track";
pub(crate) const MIME: &str = "audio/mpeg";
/// 512 KiB at 1000 units per MiB.
pub(crate) const CHUNK_PRICE: u64 = 500;

pub(crate) struct Harness {
    pub server: PaywallServer,
    pub signer: Arc<StaticSigner>,
    pub player: PlaybackController<RecordingSink>,
}

impl Harness {
    pub(crate) fn sink(&self) -> &RecordingSink {
        self.player.sink()
    }

    /// Loaded bytes as the sink would play them.
    pub(crate) fn played_bytes(&self) -> Bytes {
        self.sink().current_bytes().unwrap_or_default()
    }
}

pub(crate) fn track(len: usize) -> Bytes {
    pseudo_random_bytes(len, 0x5eed)
}

/// Starts `paywall`, builds a player through `configure` and loads the track
/// at the paywall's price.
pub(crate) async fn harness<F>(paywall: Paywall, configure: F) -> Harness
where
    F: FnOnce(PlayerConfig) -> PlayerConfig,
{
    init_tracing();
    let server = paywall.start().await;
    let store = BlobStore::default();
    let config = configure(
        PlayerConfig::new(server.base_url().clone())
            .with_blob_store(store.clone())
            .with_event_channel_capacity(256),
    );
    let signer = Arc::new(StaticSigner::new("0xlistener"));
    let player = PlaybackController::new(
        config,
        Arc::clone(&signer) as Arc<dyn PaymentSigner>,
        RecordingSink::new(store),
    )
    .unwrap();

    let content = ContentRef::new(ContentKey::new(TRACK).unwrap(), MIME, server.price()).unwrap();
    player.load(content).unwrap();

    Harness {
        server,
        signer,
        player,
    }
}
