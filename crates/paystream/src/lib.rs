#![forbid(unsafe_code)]

//! # Paystream
//!
//! Facade over the paystream crates: metered media fetched range by range,
//! each range paid for through the HTTP 402 handshake.
//!
//! ## Quick start
//!
//! ```ignore
//! use paystream::prelude::*;
//!
//! let config = PlayerConfig::new(Url::parse("https://cdn.example/api/")?)
//!     .with_max_value_per_chunk(1_000);
//! let player = PlaybackController::new(config, signer, sink)?;
//! player.load_by_key(ContentKey::new("track-01")?, "audio/mpeg").await?;
//! while let ChunkOutcome::Appended { .. } = player.fetch_next_chunk().await? {}
//! ```

pub mod core {
    pub use paystream_core::*;
}

pub mod events {
    pub use paystream_events::*;
}

pub mod net {
    pub use paystream_net::*;
}

pub mod pay {
    pub use paystream_pay::*;
}

pub mod play {
    pub use paystream_play::*;
}

pub mod stream {
    pub use paystream_stream::*;
}

pub mod prelude {
    pub use paystream_core::{ByteRange, ContentKey, ContentRef, UnitPrice};
    pub use paystream_events::{Event, EventBus, PlaybackPhase};
    pub use paystream_net::{HttpClient, Net, NetExt, NetOptions};
    pub use paystream_pay::{
        PayError, PayNetExt, PaymentIntent, PaymentOptions, PaymentSigner, Signature,
        SignerError,
    };
    pub use paystream_play::{
        ChunkOutcome, ErrorKind, MediaSink, PlaybackController, PlaybackError,
        PlaybackSnapshot, PlayerConfig,
    };
    pub use paystream_stream::{BlobStore, MaterializedBuffer};
    pub use url::Url;
}
