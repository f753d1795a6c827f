//! Bounded, newest-first working set of job postings.
//!
//! The snapshot is the single authority on which postings are "current".
//! Merge keeps at most `max_jobs` postings, newest first, and carries the
//! read flag across re-ingestion of an id that is already present.

use std::collections::HashSet;

use indexmap::IndexMap;
use jobcast_core::Job;

/// In-memory posting set with merge, read-marking and age-pruning.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    jobs: Vec<Job>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Postings in snapshot order (newest first).
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Current ids, for resyncing the id windows after eviction.
    pub fn ids(&self) -> HashSet<String> {
        self.jobs.iter().map(|job| job.id.clone()).collect()
    }

    /// Number of postings not yet marked read.
    pub fn unread(&self) -> usize {
        self.jobs.iter().filter(|job| !job.is_read).count()
    }

    /// Merge a batch of postings into the snapshot.
    ///
    /// Steps, in order: concatenate batch before existing, dedup by id
    /// keeping the first occurrence (so a re-ingested posting wins over the
    /// stale copy), carry `is_read` forward from any previous copy, sort
    /// newest first, truncate to `max_jobs`. Ties in `posted_at` keep their
    /// concatenation order.
    pub fn merge(&mut self, batch: Vec<Job>, max_jobs: usize) {
        let read_ids: HashSet<String> = self
            .jobs
            .iter()
            .filter(|job| job.is_read)
            .map(|job| job.id.clone())
            .collect();

        let mut merged: IndexMap<String, Job> =
            IndexMap::with_capacity(batch.len() + self.jobs.len());
        for job in batch.into_iter().chain(self.jobs.drain(..)) {
            merged.entry(job.id.clone()).or_insert(job);
        }

        self.jobs = merged
            .into_values()
            .map(|mut job| {
                if read_ids.contains(&job.id) {
                    job.is_read = true;
                }
                job
            })
            .collect();
        self.jobs.sort_by(|a, b| b.posted_at.cmp(&a.posted_at));
        self.jobs.truncate(max_jobs);
    }

    /// Filtered clone of the current postings, order preserved.
    pub fn get_active<F>(&self, predicate: F) -> Vec<Job>
    where
        F: Fn(&Job) -> bool,
    {
        self.jobs
            .iter()
            .filter(|job| predicate(job))
            .cloned()
            .collect()
    }

    /// Mark one posting read. Returns `false` if the id is unknown.
    /// Idempotent; unread never goes below zero.
    pub fn mark_read(&mut self, id: &str) -> bool {
        match self.jobs.iter_mut().find(|job| job.id == id) {
            Some(job) => {
                job.is_read = true;
                true
            }
            None => false,
        }
    }

    /// Mark every posting read. Returns how many flipped.
    pub fn mark_all_read(&mut self) -> usize {
        let mut changed = 0;
        for job in &mut self.jobs {
            if !job.is_read {
                job.is_read = true;
                changed += 1;
            }
        }
        changed
    }

    /// Drop postings at or older than `cutoff_epoch`. Unparsable timestamps
    /// normalize to epoch 0 and are always dropped. Returns the removal count.
    pub fn prune_older_than(&mut self, cutoff_epoch: i64) -> usize {
        let before = self.jobs.len();
        self.jobs.retain(|job| job.posted_at_epoch() > cutoff_epoch);
        before - self.jobs.len()
    }

    /// Enforce a (possibly lowered) capacity immediately.
    pub fn truncate(&mut self, max_jobs: usize) {
        self.jobs.truncate(max_jobs);
    }

    pub fn clear(&mut self) {
        self.jobs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::job;

    #[test]
    fn merge_dedups_by_id_keeping_first() {
        let mut store = SnapshotStore::new();
        store.merge(vec![job("a", "2025-06-14T10:00:00")], 50);

        let mut stale = job("a", "2025-06-14T10:00:00");
        stale.title = "stale copy".to_string();
        let mut fresh = job("a", "2025-06-14T10:00:00");
        fresh.title = "fresh copy".to_string();
        store.merge(vec![fresh, stale], 50);

        assert_eq!(store.len(), 1);
        assert_eq!(store.jobs()[0].title, "fresh copy");
    }

    #[test]
    fn merge_sorts_newest_first_with_stable_ties() {
        let mut store = SnapshotStore::new();
        store.merge(
            vec![
                job("old", "2025-06-14T08:00:00"),
                job("tie-1", "2025-06-14T12:00:00"),
                job("tie-2", "2025-06-14T12:00:00"),
                job("new", "2025-06-14T15:00:00"),
            ],
            50,
        );
        let order: Vec<&str> = store.jobs().iter().map(|j| j.id.as_str()).collect();
        assert_eq!(order, vec!["new", "tie-1", "tie-2", "old"]);
    }

    #[test]
    fn merge_never_exceeds_capacity() {
        let mut store = SnapshotStore::new();
        let batch: Vec<Job> = (0..15)
            .map(|i| job(&format!("j{i:02}"), &format!("2025-06-14T{:02}:00:00", i + 1)))
            .collect();
        store.merge(batch, 10);
        assert_eq!(store.len(), 10);
        // the five oldest fell off the bottom
        assert!(store.jobs().iter().all(|j| j.id.as_str() >= "j05"));
    }

    #[test]
    fn merge_of_older_batch_into_full_store_keeps_newer_set() {
        let mut store = SnapshotStore::new();
        let newer: Vec<Job> = (0..10)
            .map(|i| job(&format!("new{i}"), &format!("2025-06-14T{:02}:30:00", i + 10)))
            .collect();
        store.merge(newer, 10);

        let older: Vec<Job> = (0..3)
            .map(|i| job(&format!("old{i}"), &format!("2025-06-13T{:02}:00:00", i + 1)))
            .collect();
        store.merge(older, 10);

        assert_eq!(store.len(), 10);
        assert!(store.jobs().iter().all(|j| j.id.starts_with("new")));
    }

    #[test]
    fn read_flag_survives_reingestion() {
        let mut store = SnapshotStore::new();
        store.merge(vec![job("a", "2025-06-14T10:00:00")], 50);
        assert!(store.mark_read("a"));

        // the source hands the same posting back, unread
        store.merge(vec![job("a", "2025-06-14T10:00:00")], 50);
        assert!(store.jobs()[0].is_read);
        assert_eq!(store.unread(), 0);
    }

    #[test]
    fn mark_read_is_idempotent_and_bottoms_out_at_zero() {
        let mut store = SnapshotStore::new();
        store.merge(
            vec![job("a", "2025-06-14T10:00:00"), job("b", "2025-06-14T11:00:00")],
            50,
        );
        assert_eq!(store.unread(), 2);
        assert!(store.mark_read("a"));
        assert_eq!(store.unread(), 1);
        assert!(store.mark_read("a"));
        assert_eq!(store.unread(), 1);
        assert!(!store.mark_read("missing"));
        assert!(store.mark_read("b"));
        assert_eq!(store.unread(), 0);
        assert!(!store.mark_read("missing"));
        assert_eq!(store.unread(), 0);
    }

    #[test]
    fn mark_all_read_counts_flips_only() {
        let mut store = SnapshotStore::new();
        store.merge(
            vec![job("a", "2025-06-14T10:00:00"), job("b", "2025-06-14T11:00:00")],
            50,
        );
        store.mark_read("a");
        assert_eq!(store.mark_all_read(), 1);
        assert_eq!(store.unread(), 0);
        assert_eq!(store.mark_all_read(), 0);
    }

    #[test]
    fn get_active_filters_without_reordering() {
        let mut store = SnapshotStore::new();
        let mut blocked = job("blocked", "2025-06-14T12:00:00");
        blocked.client.username = Some("spam-house".to_string());
        store.merge(
            vec![
                blocked,
                job("a", "2025-06-14T11:00:00"),
                job("b", "2025-06-14T13:00:00"),
            ],
            50,
        );
        let active = store.get_active(|j| j.client.username.is_none());
        let order: Vec<&str> = active.iter().map(|j| j.id.as_str()).collect();
        assert_eq!(order, vec!["b", "a"]);
    }

    #[test]
    fn prune_drops_stale_and_unparsable_timestamps() {
        let mut store = SnapshotStore::new();
        store.merge(
            vec![
                job("fresh", "2025-06-14T12:00:00"),
                job("stale", "2025-06-12T12:00:00"),
                job("garbled", "yesterday-ish"),
            ],
            50,
        );
        let cutoff = job("fresh", "2025-06-13T12:00:00").posted_at_epoch();
        let removed = store.prune_older_than(cutoff);
        assert_eq!(removed, 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.jobs()[0].id, "fresh");
    }
}
