//! Age-based pruning of the snapshot, with id-window resync.
//!
//! Pruning runs at most once per `cleanup_interval_secs`, gated from inside
//! the ingestion cycle rather than by a timer of its own.

use chrono::{DateTime, Utc};

use crate::dedup::IdWindow;
use crate::snapshot::SnapshotStore;

/// Whether a cleanup pass is due. The first cycle after start always runs one.
pub fn cleanup_due(last: Option<DateTime<Utc>>, now: DateTime<Utc>, interval_secs: u64) -> bool {
    match last {
        None => true,
        Some(then) => (now - then).num_seconds() >= interval_secs as i64,
    }
}

/// Removes postings older than `max_age_hours` from the snapshot and
/// intersects both id windows with the survivors.
#[derive(Debug, Clone, Copy)]
pub struct EvictionPolicy {
    pub max_age_hours: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionReport {
    pub removed: usize,
    pub surviving: usize,
}

impl EvictionPolicy {
    /// Epoch seconds below which a posting counts as expired. Postings with
    /// unparsable timestamps normalize to epoch 0 and always expire.
    pub fn cutoff_epoch(&self, now: DateTime<Utc>) -> i64 {
        now.timestamp() - i64::from(self.max_age_hours) * 3600
    }

    /// One pruning pass. The windows are intersected with surviving snapshot
    /// ids even when nothing aged out, so ids whose postings were truncated
    /// away at merge time get forgotten here as well.
    pub fn run(
        &self,
        snapshot: &mut SnapshotStore,
        dedup: &mut IdWindow,
        sent: &mut IdWindow,
        now: DateTime<Utc>,
    ) -> EvictionReport {
        let removed = snapshot.prune_older_than(self.cutoff_epoch(now));
        let keep = snapshot.ids();
        dedup.retain_known(&keep);
        sent.retain_known(&keep);
        EvictionReport {
            removed,
            surviving: snapshot.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::job;
    use chrono::TimeZone;

    fn at_noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 14, 12, 0, 0).unwrap()
    }

    #[test]
    fn cutoff_is_now_minus_age() {
        let policy = EvictionPolicy { max_age_hours: 24 };
        let now = at_noon();
        assert_eq!(policy.cutoff_epoch(now), now.timestamp() - 86_400);
    }

    #[test]
    fn run_prunes_expired_and_resyncs_windows() {
        let mut snapshot = SnapshotStore::new();
        snapshot.merge(
            vec![
                job("fresh", "2025-06-14T08:00:00"),
                job("expired", "2025-06-12T08:00:00"),
                job("garbled", "not-a-timestamp"),
            ],
            50,
        );
        let mut dedup = IdWindow::new(100);
        for id in ["fresh", "expired", "garbled", "truncated-away"] {
            dedup.admit(id);
        }
        let mut sent = IdWindow::new(100);
        sent.admit("expired");

        let policy = EvictionPolicy { max_age_hours: 24 };
        let report = policy.run(&mut snapshot, &mut dedup, &mut sent, at_noon());

        assert_eq!(report, EvictionReport { removed: 2, surviving: 1 });
        assert_eq!(snapshot.jobs()[0].id, "fresh");
        assert!(dedup.contains("fresh"));
        assert!(!dedup.contains("expired"));
        assert!(!dedup.contains("garbled"));
        assert!(!dedup.contains("truncated-away"));
        assert!(sent.is_empty());
    }

    #[test]
    fn run_resyncs_even_without_removals() {
        let mut snapshot = SnapshotStore::new();
        snapshot.merge(vec![job("fresh", "2025-06-14T08:00:00")], 50);
        let mut dedup = IdWindow::new(100);
        dedup.admit("fresh");
        dedup.admit("orphan");
        let mut sent = IdWindow::new(100);

        let policy = EvictionPolicy { max_age_hours: 24 };
        let report = policy.run(&mut snapshot, &mut dedup, &mut sent, at_noon());

        assert_eq!(report.removed, 0);
        assert!(dedup.contains("fresh"));
        assert!(!dedup.contains("orphan"));
    }

    #[test]
    fn cleanup_gate_honors_interval() {
        let now = at_noon();
        assert!(cleanup_due(None, now, 3600));
        let recent = now - chrono::Duration::seconds(1800);
        assert!(!cleanup_due(Some(recent), now, 3600));
        let boundary = now - chrono::Duration::seconds(3600);
        assert!(cleanup_due(Some(boundary), now, 3600));
        let stale = now - chrono::Duration::seconds(7200);
        assert!(cleanup_due(Some(stale), now, 3600));
    }
}
