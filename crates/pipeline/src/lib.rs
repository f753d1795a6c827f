//! Ingestion pipeline: dedup, snapshot, eviction, broadcast, coordination.
//!
//! The [`coordinator::Coordinator`] ties the pieces together: postings come
//! in through a [`jobcast_connector::SourceConnector`], pass the dedup
//! window into the snapshot store, and fan out to live subscribers through
//! the [`hub::BroadcastHub`].

pub mod coordinator;
pub mod dedup;
pub mod eviction;
pub mod hub;
pub mod sink;
pub mod snapshot;
pub mod status;

#[cfg(test)]
pub(crate) mod testutil;

pub use coordinator::Coordinator;
pub use dedup::IdWindow;
pub use eviction::{EvictionPolicy, EvictionReport};
pub use hub::{
    BroadcastHub, HubStats, StreamEvent, Subscriber, HEARTBEAT_INTERVAL, MAILBOX_CAPACITY,
};
pub use sink::{JsonlSink, NullSink, PersistenceSink};
pub use snapshot::SnapshotStore;
pub use status::{BotState, BotStatus, StatusEvent};
