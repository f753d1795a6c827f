//! Fan-out of job events to live subscribers over bounded mailboxes.
//!
//! Publishing never blocks and never waits on a slow consumer: a full
//! mailbox costs that subscriber the event, a closed one costs it the
//! registration.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info};
use uuid::Uuid;

use jobcast_core::JobView;

/// Per-subscriber queue depth. Once full, further events are dropped for
/// that subscriber until it drains.
pub const MAILBOX_CAPACITY: usize = 100;

/// Idle time after which a subscriber stream yields a keepalive.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Event delivered to subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Full current posting set; always the first event a subscriber sees.
    Snapshot { jobs: Vec<JobView> },
    /// Batch of newly ingested postings.
    NewJobs { jobs: Vec<JobView> },
    /// Keepalive. Never serialized as JSON; the transport turns it into a
    /// comment frame.
    #[serde(skip)]
    Heartbeat,
}

/// Receiving half of a registration.
pub struct Subscriber {
    pub id: Uuid,
    rx: mpsc::Receiver<StreamEvent>,
}

impl Subscriber {
    /// Next event, waiting at most [`HEARTBEAT_INTERVAL`]. An idle wait
    /// yields [`StreamEvent::Heartbeat`]; `None` means the registration is
    /// gone and the stream should end.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        match tokio::time::timeout(HEARTBEAT_INTERVAL, self.rx.recv()).await {
            Ok(event) => event,
            Err(_elapsed) => Some(StreamEvent::Heartbeat),
        }
    }
}

/// Registry of live subscribers with non-blocking fan-out.
///
/// The registry lock is its own domain: publish runs after the pipeline
/// state lock has been released, so the two never nest.
#[derive(Default)]
pub struct BroadcastHub {
    subscribers: Mutex<HashMap<Uuid, mpsc::Sender<StreamEvent>>>,
    total_dropped: AtomicU64,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber. The snapshot is queued before the registration
    /// becomes visible to `publish`, so it is always the first event out.
    pub fn subscribe(&self, snapshot: Vec<JobView>) -> Subscriber {
        let (tx, rx) = mpsc::channel(MAILBOX_CAPACITY);
        let id = Uuid::new_v4();
        // fresh channel, capacity >= 1: cannot be full or closed
        let _ = tx.try_send(StreamEvent::Snapshot { jobs: snapshot });
        let mut subscribers = self.lock_registry();
        subscribers.insert(id, tx);
        info!(subscriber = %id, total = subscribers.len(), "subscriber registered");
        Subscriber { id, rx }
    }

    /// Fan one batch out to every subscriber without blocking. A full
    /// mailbox drops the batch for that subscriber only; a closed one is
    /// unregistered. Returns the number of successful deliveries.
    pub fn publish(&self, jobs: Vec<JobView>) -> usize {
        if jobs.is_empty() {
            return 0;
        }
        let mut delivered = 0;
        let mut closed = Vec::new();
        let mut subscribers = self.lock_registry();
        for (id, tx) in subscribers.iter() {
            match tx.try_send(StreamEvent::NewJobs { jobs: jobs.clone() }) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    self.total_dropped.fetch_add(1, Ordering::Relaxed);
                    debug!(subscriber = %id, "mailbox full, dropping batch");
                }
                Err(TrySendError::Closed(_)) => closed.push(*id),
            }
        }
        for id in closed {
            subscribers.remove(&id);
            debug!(subscriber = %id, "pruned closed subscriber");
        }
        delivered
    }

    /// Drop a registration. The subscriber's stream ends on its next poll.
    pub fn unregister(&self, id: Uuid) -> bool {
        let removed = self.lock_registry().remove(&id).is_some();
        if removed {
            info!(subscriber = %id, "subscriber unregistered");
        }
        removed
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock_registry().len()
    }

    pub fn stats(&self) -> HubStats {
        HubStats {
            subscribers: self.lock_registry().len(),
            total_dropped: self.total_dropped.load(Ordering::Relaxed),
        }
    }

    fn lock_registry(&self) -> MutexGuard<'_, HashMap<Uuid, mpsc::Sender<StreamEvent>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Registry counters reported in the status payload.
#[derive(Debug, Clone, Copy, Serialize, utoipa::ToSchema)]
pub struct HubStats {
    pub subscribers: usize,
    pub total_dropped: u64,
}
