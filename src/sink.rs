//! Result sink: the event queue and image cache shared by fetch workers and consumers
//!
//! Producers push [`Event`]s; a polling consumer drains them with
//! [`ResultSink::drain_all`] while push consumers receive the same events over a
//! broadcast channel. Image bytes live in a separate id→bytes cache.
//!
//! Every event is queued whether or not anyone polls. A consumer that only
//! subscribes leaves the queue to grow for the length of one run;
//! [`ImageHarvester::start`](crate::ImageHarvester::start) discards whatever the
//! previous run left behind.
//!
//! Both locks are `std::sync` locks held only for short non-async sections.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError, RwLock};

use bytes::Bytes;
use tokio::sync::broadcast;

use crate::types::{Event, ImageId};

/// Concurrent FIFO event queue plus image cache
#[derive(Debug)]
pub struct ResultSink {
    queue: Mutex<VecDeque<Event>>,
    cache: RwLock<HashMap<ImageId, Bytes>>,
    event_tx: broadcast::Sender<Event>,
}

impl ResultSink {
    /// Create a sink whose broadcast channel holds up to `event_buffer` events
    pub fn new(event_buffer: usize) -> Self {
        let (event_tx, _rx) = broadcast::channel(event_buffer.max(1));
        Self {
            queue: Mutex::new(VecDeque::new()),
            cache: RwLock::new(HashMap::new()),
            event_tx,
        }
    }

    /// Append an event
    pub fn push(&self, event: Event) {
        self.push_with(|| event);
    }

    /// Build and append an event while holding the queue lock
    ///
    /// Anything `build` reads (e.g. a counter it increments) is ordered the same
    /// way as the queue, which keeps `Progress.done` non-decreasing.
    pub(crate) fn push_with(&self, build: impl FnOnce() -> Event) {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        let event = build();
        // No subscribers is fine
        self.event_tx.send(event.clone()).ok();
        queue.push_back(event);
    }

    /// Remove and return every queued event in FIFO order
    pub fn drain_all(&self) -> Vec<Event> {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        queue.drain(..).collect()
    }

    /// Number of events waiting to be drained
    pub fn pending(&self) -> usize {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Store image bytes under `id`
    pub fn put_bytes(&self, id: ImageId, bytes: Bytes) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, bytes);
    }

    /// Bytes previously stored under `id`
    pub fn cached_bytes(&self, id: &ImageId) -> Option<Bytes> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Snapshot of every cached image
    pub fn cached_images(&self) -> Vec<(ImageId, Bytes)> {
        let mut images: Vec<(ImageId, Bytes)> = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, bytes)| (*id, bytes.clone()))
            .collect();
        images.sort_by_key(|(id, _)| *id);
        images
    }

    /// Number of cached images
    pub fn cache_len(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Drop every cached image
    pub fn clear_cache(&self) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Receive every event pushed from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }
}
