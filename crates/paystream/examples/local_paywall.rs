//! Example: stream a track from a local paywall, paying per chunk.
//!
//! Starts an in-process paywall serving pseudo-random bytes at 1000 units per
//! MiB, then loads and fetches the whole track in 256 KiB chunks while
//! printing payment and chunk events.
//!
//! Run with:
//! ```
//! cargo run -p paystream --example local_paywall [SIZE_BYTES]
//! ```

use std::{env::args, error::Error, sync::Arc};

use paystream::{events::Event, prelude::*};
use paystream_test_utils::{Paywall, RecordingSink, StaticSigner, pseudo_random_bytes};
use tracing::{info, metadata::LevelFilter};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::default()
                .add_directive("paystream_play=info".parse()?)
                .add_directive("paystream_pay=info".parse()?)
                .add_directive("paystream_net=warn".parse()?)
                .add_directive(LevelFilter::INFO.into()),
        )
        .with_line_number(false)
        .with_file(false)
        .init();

    let size = args()
        .nth(1)
        .map(|s| s.parse::<usize>())
        .transpose()?
        .unwrap_or(1_500_000);

    let server = Paywall::new("demo-track", pseudo_random_bytes(size, 7))
        .start()
        .await;
    info!(base = %server.base_url(), size, "paywall listening");

    let store = BlobStore::default();
    let config = PlayerConfig::new(server.base_url().clone())
        .with_chunk_size(256 * 1024)
        .with_blob_store(store.clone());
    let player = PlaybackController::new(
        config,
        Arc::new(StaticSigner::new("0xlistener")),
        RecordingSink::new(store),
    )?;

    let mut events = player.bus().events();
    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            match event {
                Event::Payment(ev) => info!(?ev, "payment"),
                Event::Chunk(ev) => info!(?ev, "chunk"),
                Event::Playback(_) => {}
            }
        }
    });

    let content = player
        .load_by_key(ContentKey::new("demo-track")?, "audio/mpeg")
        .await?;
    info!(price = ?content.price(), "loaded");
    player.play();

    loop {
        match player.fetch_next_chunk().await? {
            ChunkOutcome::Appended { range, snapshot, .. } => {
                info!(offset = range.offset(), loaded = snapshot.loaded_bytes, "chunk paid");
            }
            ChunkOutcome::EndOfContent { total_bytes } => {
                info!(total_bytes, "track fully loaded");
                break;
            }
            ChunkOutcome::Discarded => {}
        }
    }

    let sink = player.sink();
    assert_eq!(sink.current_bytes().as_deref(), Some(server.content().as_ref()));
    info!(payments = server.paid_requests(), "done");
    Ok(())
}
