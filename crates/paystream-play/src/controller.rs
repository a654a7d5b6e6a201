use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use paystream_core::{ByteRange, ContentKey, ContentRef, CoreError};
use paystream_events::{ChunkEvent, EventBus, PlaybackEvent, PlaybackPhase};
use paystream_net::{HttpClient, Net, NetExt};
use paystream_pay::{PaidNet, PayError, PaymentPhase, PaymentSigner, PriceClient};
use paystream_stream::{BlobStore, ChunkScheduler, ChunkState, FetchError, StreamAssembler};
use tracing::{debug, info, warn};

use crate::{
    config::PlayerConfig,
    error::{PlaybackError, PlaybackResult},
    sink::MediaSink,
    snapshot::PlaybackSnapshot,
};

type Transport = Arc<dyn Net>;
type Scheduler = ChunkScheduler<Transport>;

/// Result of one [`PlaybackController::fetch_next_chunk`] call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// Range fetched, appended and handed to the sink.
    Appended {
        range: ByteRange,
        received: u64,
        snapshot: PlaybackSnapshot,
    },
    /// Content fully loaded. Nothing was fetched.
    EndOfContent { total_bytes: u64 },
    /// Session was reset or replaced while the fetch was in flight; its
    /// bytes were dropped.
    Discarded,
}

struct Session {
    phase: PlaybackPhase,
    generation: u64,
    content: Option<ContentRef>,
    chunks: Option<ChunkState>,
    chunk_size: u64,
    scheduler: Arc<Scheduler>,
    assembler: StreamAssembler,
}

struct FetchJob {
    generation: u64,
    key: ContentKey,
    range: ByteRange,
    ceiling: u64,
    scheduler: Arc<Scheduler>,
}

/// Rolls the session back if a fetch future is dropped mid-flight.
struct InFlight<'a, S: MediaSink> {
    controller: &'a PlaybackController<S>,
    job: &'a FetchJob,
    armed: bool,
}

impl<S: MediaSink> InFlight<'_, S> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<S: MediaSink> Drop for InFlight<'_, S> {
    fn drop(&mut self) {
        if self.armed {
            self.controller.abandon(self.job);
        }
    }
}

enum Next {
    Fetch(FetchJob),
    End(u64),
}

/// Drives one playback session: schedule, pay, fetch, append, play.
///
/// Phases move `Idle|Ready -> AwaitingPayment -> Buffering -> Ready`, or
/// through `Error` back to `Idle` when a fetch fails. Session state sits
/// behind a mutex that is never held across an await; each fetch is tagged
/// with the session generation so a result arriving after
/// [`reset`](Self::reset) or [`load`](Self::load) is dropped.
pub struct PlaybackController<S> {
    sink: S,
    config: PlayerConfig,
    net: Transport,
    signer: Arc<dyn PaymentSigner>,
    prices: PriceClient,
    bus: EventBus,
    blobs: BlobStore,
    session: Mutex<Session>,
}

impl<S: MediaSink> PlaybackController<S> {
    /// Controller talking to `config.endpoint` over a fresh HTTP client.
    pub fn new(
        config: PlayerConfig,
        signer: Arc<dyn PaymentSigner>,
        sink: S,
    ) -> PlaybackResult<Self> {
        let client = HttpClient::new(config.net.clone()).map_err(PayError::from)?;
        Self::with_transport(config, Arc::new(client), signer, sink)
    }

    /// Controller over a caller-supplied transport.
    ///
    /// `net` carries paid requests and must not retry on its own. Price
    /// lookups get a retry layer from `config.net.retry_policy` on top.
    pub fn with_transport(
        config: PlayerConfig,
        net: Transport,
        signer: Arc<dyn PaymentSigner>,
        sink: S,
    ) -> PlaybackResult<Self> {
        if config.chunk_size == 0 {
            return Err(CoreError::InvalidInput("chunk size must be positive".into()).into());
        }
        let bus = config
            .bus
            .clone()
            .unwrap_or_else(|| EventBus::new(config.event_channel_capacity));
        let blobs = config.blob_store.clone().unwrap_or_default();
        let prices = PriceClient::new(
            Arc::new(net.clone().with_retry(config.net.retry_policy.clone())),
            config.endpoint.clone(),
        );
        let scheduler = new_scheduler(&config, &net, &signer, &bus);
        let session = Session {
            phase: PlaybackPhase::Idle,
            generation: 0,
            content: None,
            chunks: None,
            chunk_size: config.chunk_size,
            scheduler,
            assembler: StreamAssembler::new(blobs.clone()),
        };
        Ok(Self {
            sink,
            config,
            net,
            signer,
            prices,
            bus,
            blobs,
            session: Mutex::new(session),
        })
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Registry the sink resolves buffer handles against.
    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.session.lock().phase
    }

    pub fn generation(&self) -> u64 {
        self.session.lock().generation
    }

    pub fn content(&self) -> Option<ContentRef> {
        self.session.lock().content.clone()
    }

    pub fn chunk_state(&self) -> Option<ChunkState> {
        self.session.lock().chunks.clone()
    }

    pub fn chunk_size(&self) -> u64 {
        self.session.lock().chunk_size
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        let session = self.session.lock();
        self.snapshot_of(&session)
    }

    /// Start a new session for `content`, dropping whatever was loaded.
    pub fn load(&self, content: ContentRef) -> PlaybackResult<()> {
        let mut guard = self.session.lock();
        let s = &mut *guard;
        let chunks = s.assembler.reset_session(content.key().clone(), s.chunk_size)?;
        info!(key = %content.key(), mime = content.mime_type(), "content loaded");
        s.content = Some(content);
        s.chunks = Some(chunks);
        self.begin_session(s);
        Ok(())
    }

    /// Look up the price of `key` and [`load`](Self::load) it.
    pub async fn load_by_key(&self, key: ContentKey, mime_type: &str) -> PlaybackResult<ContentRef> {
        let price = self.prices.lookup(&key).await?;
        let content = ContentRef::new(key, mime_type, price)?;
        self.load(content.clone())?;
        Ok(content)
    }

    /// Drop all loaded bytes and return to `Idle`. The content stays loaded.
    pub fn reset(&self) -> PlaybackResult<()> {
        let mut guard = self.session.lock();
        let s = &mut *guard;
        s.chunks = match &s.content {
            Some(content) => Some(s.assembler.reset_session(content.key().clone(), s.chunk_size)?),
            None => {
                s.assembler.release();
                None
            }
        };
        self.begin_session(s);
        Ok(())
    }

    /// Size of the next range. Already loaded bytes are kept.
    pub fn set_chunk_size(&self, chunk_size: u64) -> PlaybackResult<()> {
        let mut guard = self.session.lock();
        let s = &mut *guard;
        if let Some(chunks) = &s.chunks {
            s.chunks = Some(chunks.with_chunk_size(chunk_size)?);
        } else if chunk_size == 0 {
            return Err(CoreError::InvalidInput("chunk size must be positive".into()).into());
        }
        debug!(chunk_size, "chunk size changed");
        s.chunk_size = chunk_size;
        Ok(())
    }

    /// Size the next ranges so each costs about `amount`. Returns the new
    /// chunk size.
    pub fn set_chunk_budget(&self, amount: u64) -> PlaybackResult<u64> {
        let price = {
            let session = self.session.lock();
            *session.content.as_ref().ok_or(PlaybackError::NoContent)?.price()
        };
        if price.is_unmetered() {
            return Err(CoreError::InvalidInput("unmetered content has no chunk budget".into()).into());
        }
        let chunk_size = price.chunk_size_for(amount)?;
        self.set_chunk_size(chunk_size)?;
        Ok(chunk_size)
    }

    pub fn play(&self) {
        self.sink.play();
    }

    pub fn pause(&self) {
        self.sink.pause();
    }

    pub fn seek(&self, position: std::time::Duration) {
        self.sink.seek(position);
    }

    /// Fetch, pay for and append the range after everything loaded so far.
    ///
    /// # Errors
    ///
    /// - [`PlaybackError::NoContent`] if nothing is loaded.
    /// - [`FetchError::InProgress`] if a fetch of this session is still
    ///   outstanding.
    /// - Any fetch or payment failure. The session goes through `Error` back
    ///   to `Idle` and keeps every byte loaded before.
    ///
    /// Dropping the returned future has the same effect as a failure: the
    /// session returns to `Idle` and the range can be fetched again.
    pub async fn fetch_next_chunk(&self) -> PlaybackResult<ChunkOutcome> {
        let job = {
            let mut guard = self.session.lock();
            match self.prepare(&mut guard)? {
                Next::Fetch(job) => job,
                Next::End(total_bytes) => return Ok(ChunkOutcome::EndOfContent { total_bytes }),
            }
        };

        let generation = job.generation;
        let in_flight = InFlight {
            controller: self,
            job: &job,
            armed: true,
        };
        let observer = |phase: &PaymentPhase| self.on_payment_phase(generation, phase);
        let fetched = job
            .scheduler
            .fetch_chunk(&job.key, job.range, job.ceiling, &observer)
            .await;
        in_flight.disarm();

        let mut guard = self.session.lock();
        let s = &mut *guard;
        if s.generation != job.generation {
            debug!(key = %job.key, generation = job.generation, current = s.generation, "discarding stale chunk");
            self.bus.publish(ChunkEvent::Discarded {
                key: job.key.to_string(),
                generation: job.generation,
            });
            return Ok(ChunkOutcome::Discarded);
        }

        let outcome = fetched
            .map_err(PlaybackError::from)
            .and_then(|bytes| self.accept(s, job.range, bytes));
        if let Err(error) = &outcome {
            self.fail(s, &job.key, job.range, error);
        }
        outcome
    }

    fn prepare(&self, s: &mut Session) -> PlaybackResult<Next> {
        let (Some(content), Some(chunks)) = (&s.content, &s.chunks) else {
            return Err(PlaybackError::NoContent);
        };
        if matches!(s.phase, PlaybackPhase::AwaitingPayment | PlaybackPhase::Buffering) {
            return Err(FetchError::InProgress.into());
        }
        let Some(range) = Scheduler::next_range(chunks, s.chunk_size)? else {
            return Ok(Next::End(chunks.total_bytes()));
        };
        let ceiling = match self.config.max_value_per_chunk {
            Some(ceiling) => ceiling,
            None => content.price().amount_for(range.length())?,
        };
        let job = FetchJob {
            generation: s.generation,
            key: content.key().clone(),
            range,
            ceiling,
            scheduler: Arc::clone(&s.scheduler),
        };
        debug!(key = %job.key, %range, ceiling, "fetching next chunk");
        self.transition(s, PlaybackPhase::AwaitingPayment);
        Ok(Next::Fetch(job))
    }

    fn on_payment_phase(&self, generation: u64, phase: &PaymentPhase) {
        if !matches!(phase, PaymentPhase::Submitting | PaymentPhase::Completed) {
            return;
        }
        let mut session = self.session.lock();
        if session.generation == generation && session.phase == PlaybackPhase::AwaitingPayment {
            self.transition(&mut session, PlaybackPhase::Buffering);
        }
    }

    fn accept(&self, s: &mut Session, range: ByteRange, bytes: Bytes) -> PlaybackResult<ChunkOutcome> {
        let (Some(content), Some(current)) = (&s.content, &s.chunks) else {
            return Err(PlaybackError::NoContent);
        };
        let received = bytes.len() as u64;
        let mut next = if bytes.is_empty() {
            current.clone()
        } else {
            StreamAssembler::append_chunk(current, bytes)?
        };
        if received < range.length() {
            next = StreamAssembler::finish(&next);
        }
        let key = next.key().to_string();
        let mime_type = content.mime_type().to_string();

        if received == 0 {
            let total_bytes = next.total_bytes();
            s.chunks = Some(next);
            self.bus.publish(ChunkEvent::EndOfContent {
                key,
                total_bytes,
            });
            self.transition(s, PlaybackPhase::Ready);
            return Ok(ChunkOutcome::EndOfContent { total_bytes });
        }

        let position = self.sink.current_time();
        let was_playing = !self.sink.is_paused();
        let buffer = s.assembler.materialize(&next, &mime_type);
        self.sink.set_source(&buffer);
        self.sink.seek(position);
        if was_playing && self.config.resume_after_append {
            self.sink.play();
        }
        self.bus.publish(PlaybackEvent::SourceReplaced {
            handle: buffer.handle().to_string(),
            len: buffer.len(),
        });

        let total_bytes = next.total_bytes();
        let complete = next.is_complete();
        s.chunks = Some(next);
        self.bus.publish(ChunkEvent::Appended {
            key: key.clone(),
            offset: range.offset(),
            len: received,
            total_bytes,
        });
        if complete {
            self.bus.publish(ChunkEvent::EndOfContent { key, total_bytes });
        }

        self.transition(s, PlaybackPhase::Ready);
        let snapshot = self.snapshot_of(s);
        self.bus.publish(PlaybackEvent::Snapshot {
            position: snapshot.position,
            duration: snapshot.duration,
            loaded_bytes: snapshot.loaded_bytes,
            chunk_count: snapshot.chunk_count,
            complete: snapshot.complete,
        });
        Ok(ChunkOutcome::Appended {
            range,
            received,
            snapshot,
        })
    }

    fn fail(&self, s: &mut Session, key: &ContentKey, range: ByteRange, error: &PlaybackError) {
        let kind = error.kind();
        warn!(%key, %range, %kind, %error, "chunk fetch failed");
        self.bus.publish(ChunkEvent::Failed {
            key: key.to_string(),
            offset: range.offset(),
            error: error.to_string(),
            retryable: kind.is_retryable(),
        });
        self.transition(s, PlaybackPhase::Error);
        self.transition(s, PlaybackPhase::Idle);
    }

    /// The fetch future was dropped before it finished. A session still
    /// waiting on it goes through `Error` to `Idle` so the next fetch is
    /// accepted.
    fn abandon(&self, job: &FetchJob) {
        let mut guard = self.session.lock();
        let s = &mut *guard;
        if s.generation != job.generation
            || !matches!(s.phase, PlaybackPhase::AwaitingPayment | PlaybackPhase::Buffering)
        {
            return;
        }
        warn!(key = %job.key, range = %job.range, "chunk fetch cancelled");
        self.bus.publish(ChunkEvent::Failed {
            key: job.key.to_string(),
            offset: job.range.offset(),
            error: "fetch cancelled".to_string(),
            retryable: true,
        });
        self.transition(s, PlaybackPhase::Error);
        self.transition(s, PlaybackPhase::Idle);
    }

    fn begin_session(&self, s: &mut Session) {
        s.generation += 1;
        s.scheduler = new_scheduler(&self.config, &self.net, &self.signer, &self.bus);
        self.transition(s, PlaybackPhase::Idle);
        self.bus.publish(PlaybackEvent::Reset {
            generation: s.generation,
        });
    }

    fn transition(&self, s: &mut Session, to: PlaybackPhase) {
        let from = s.phase;
        if from == to {
            return;
        }
        debug!(%from, %to, generation = s.generation, "playback phase");
        s.phase = to;
        self.bus.publish(PlaybackEvent::PhaseChanged { from, to });
    }

    fn snapshot_of(&self, s: &Session) -> PlaybackSnapshot {
        let (loaded_bytes, chunk_count, complete) = s
            .chunks
            .as_ref()
            .map_or((0, 0, false), |c| (c.total_bytes(), c.chunk_count(), c.is_complete()));
        PlaybackSnapshot {
            phase: s.phase,
            position: self.sink.current_time(),
            duration: self.sink.duration(),
            loaded_bytes,
            chunk_count,
            complete,
        }
    }
}

fn new_scheduler(
    config: &PlayerConfig,
    net: &Transport,
    signer: &Arc<dyn PaymentSigner>,
    bus: &EventBus,
) -> Arc<Scheduler> {
    let paid = PaidNet::new(Arc::clone(net), Arc::clone(signer), 0)
        .with_options(config.payment.clone())
        .with_bus(bus.clone());
    Arc::new(ChunkScheduler::new(paid, config.endpoint.clone()).with_bus(bus.clone()))
}
