//! Media sink that records what it was told.

use std::{
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
    time::Duration,
};

use bytes::Bytes;
use parking_lot::Mutex;
use paystream_play::MediaSink;
use paystream_stream::{BlobStore, MaterializedBuffer};

/// [`MediaSink`] that keeps every source and seek, and resolves buffers
/// against a [`BlobStore`] so tests can inspect the bytes it would play.
pub struct RecordingSink {
    store: BlobStore,
    position: Mutex<Duration>,
    duration: Mutex<Option<Duration>>,
    paused: AtomicBool,
    plays: AtomicUsize,
    sources: Mutex<Vec<MaterializedBuffer>>,
    seeks: Mutex<Vec<Duration>>,
}

impl RecordingSink {
    /// Starts paused at position zero.
    #[must_use]
    pub fn new(store: BlobStore) -> Self {
        Self {
            store,
            position: Mutex::new(Duration::ZERO),
            duration: Mutex::new(None),
            paused: AtomicBool::new(true),
            plays: AtomicUsize::new(0),
            sources: Mutex::new(Vec::new()),
            seeks: Mutex::new(Vec::new()),
        }
    }

    pub fn set_position(&self, position: Duration) {
        *self.position.lock() = position;
    }

    pub fn set_duration(&self, duration: Option<Duration>) {
        *self.duration.lock() = duration;
    }

    pub fn sources(&self) -> Vec<MaterializedBuffer> {
        self.sources.lock().clone()
    }

    pub fn seeks(&self) -> Vec<Duration> {
        self.seeks.lock().clone()
    }

    pub fn play_count(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }

    /// Bytes behind the most recent source, if it is still registered.
    pub fn current_bytes(&self) -> Option<Bytes> {
        let sources = self.sources.lock();
        sources.last().and_then(|b| self.store.resolve(b.handle()))
    }
}

impl MediaSink for RecordingSink {
    fn current_time(&self) -> Duration {
        *self.position.lock()
    }

    fn duration(&self) -> Option<Duration> {
        *self.duration.lock()
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    fn play(&self) {
        self.plays.fetch_add(1, Ordering::SeqCst);
        self.paused.store(false, Ordering::SeqCst);
    }

    fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    fn seek(&self, position: Duration) {
        self.seeks.lock().push(position);
        *self.position.lock() = position;
    }

    fn set_source(&self, buffer: &MaterializedBuffer) {
        self.sources.lock().push(buffer.clone());
    }
}
