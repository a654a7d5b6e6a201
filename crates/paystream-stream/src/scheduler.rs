#![forbid(unsafe_code)]

use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use paystream_core::{ByteRange, ContentKey, CoreResult};
use paystream_events::{ChunkEvent, EventBus};
use paystream_net::{Net, endpoint};
use paystream_pay::{FlowObserver, PaidNet, PayError};
use tracing::{debug, trace};
use url::Url;

use crate::{
    error::{FetchError, FetchResult},
    state::ChunkState,
};

/// Marks a scheduler busy for as long as it lives.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Issues paid range requests for one session, one at a time.
pub struct ChunkScheduler<N> {
    net: PaidNet<N>,
    base: Url,
    busy: AtomicBool,
    bus: Option<EventBus>,
}

impl<N: Net> ChunkScheduler<N> {
    pub fn new(net: PaidNet<N>, base: Url) -> Self {
        Self {
            net,
            base,
            busy: AtomicBool::new(false),
            bus: None,
        }
    }

    #[must_use]
    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Range following everything already in `state`, or `None` once the
    /// content is complete.
    ///
    /// # Errors
    ///
    /// [`CoreError`](paystream_core::CoreError) if `chunk_size` is zero or
    /// the range end overflows.
    pub fn next_range(state: &ChunkState, chunk_size: u64) -> CoreResult<Option<ByteRange>> {
        if state.is_complete() {
            return Ok(None);
        }
        ByteRange::new(state.offset(), chunk_size).map(Some)
    }

    /// URL of the range request for `key`.
    pub fn range_url(&self, key: &ContentKey, range: ByteRange) -> FetchResult<Url> {
        let mut url =
            endpoint(&self.base, &["object", key.as_str()]).map_err(PayError::from)?;
        url.query_pairs_mut()
            .append_pair("offset", &range.offset().to_string())
            .append_pair("length", &range.length().to_string());
        Ok(url)
    }

    /// Fetch `range` of `key`, paying at most `ceiling`.
    ///
    /// Fails with [`FetchError::InProgress`] without touching the network if
    /// another fetch of this scheduler has not finished. The busy flag is
    /// cleared however this call ends, including when its future is dropped.
    ///
    /// A body shorter than `range` is returned as is and means the content
    /// ended; a longer one is [`FetchError::InvalidResponse`].
    pub async fn fetch_chunk(
        &self,
        key: &ContentKey,
        range: ByteRange,
        ceiling: u64,
        observer: &dyn FlowObserver,
    ) -> FetchResult<Bytes> {
        let Some(_guard) = BusyGuard::acquire(&self.busy) else {
            debug!(%key, %range, "fetch refused: scheduler busy");
            return Err(FetchError::InProgress);
        };

        let url = self.range_url(key, range)?;
        trace!(%url, ceiling, "requesting range");
        self.publish(ChunkEvent::Requested {
            key: key.to_string(),
            offset: range.offset(),
            length: range.length(),
        });

        let paid = self.net.fetch(url, None, ceiling, observer).await?;
        let response = paid.response.error_for_status().map_err(PayError::from)?;

        let received = response.body.len() as u64;
        if received > range.length() {
            return Err(FetchError::InvalidResponse {
                expected: range.length(),
                received,
            });
        }
        debug!(
            %key,
            %range,
            received,
            paid = paid.payment.as_ref().map(|p| p.value),
            "range fetched"
        );
        Ok(response.body)
    }

    fn publish(&self, event: ChunkEvent) {
        if let Some(bus) = &self.bus {
            bus.publish(event);
        }
    }
}
