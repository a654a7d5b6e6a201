use derive_setters::Setters;
use paystream_events::EventBus;
use paystream_net::NetOptions;
use paystream_pay::PaymentOptions;
use paystream_stream::BlobStore;
use url::Url;

/// 512 KiB.
pub const DEFAULT_CHUNK_SIZE: u64 = 512 * 1024;

const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 32;

/// Configuration for a [`PlaybackController`](crate::PlaybackController).
///
/// ```ignore
/// let config = PlayerConfig::new(Url::parse("https://cdn.example/api/")?)
///     .with_chunk_size(256 * 1024)
///     .with_max_value_per_chunk(1_000);
/// ```
#[derive(Clone, Debug, Setters)]
#[setters(prefix = "with_", strip_option)]
pub struct PlayerConfig {
    /// Base URL serving `/object/{key}` and `/price/{key}`.
    #[setters(skip)]
    pub endpoint: Url,
    /// Bytes requested per range until changed at runtime.
    pub chunk_size: u64,
    /// Hard cap on what one chunk may cost. When `None`, the expected price
    /// of the requested range is the cap.
    pub max_value_per_chunk: Option<u64>,
    /// Resume playback after swapping in a grown buffer if it was playing.
    pub resume_after_append: bool,
    /// Capacity of the bus created when `bus` is `None`.
    pub event_channel_capacity: usize,
    /// Event bus shared with the caller. When `None`, the controller creates
    /// its own; see [`PlaybackController::bus`](crate::PlaybackController::bus).
    #[setters(rename = "with_events")]
    pub bus: Option<EventBus>,
    /// Registry materialized buffers are published to. The sink resolves
    /// handles against it.
    pub blob_store: Option<BlobStore>,
    /// Transport settings (timeouts, retries for price lookups).
    pub net: NetOptions,
    pub payment: PaymentOptions,
}

impl PlayerConfig {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_value_per_chunk: None,
            resume_after_append: true,
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
            bus: None,
            blob_store: None,
            net: NetOptions::default(),
            payment: PaymentOptions::default(),
        }
    }
}
