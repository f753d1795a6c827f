//! Ingestion coordinator: lifecycle, per-category fan-out, merge, publish.
//!
//! One coordinator owns the pipeline state behind a short-lived mutex. Each
//! cycle fetches every configured category in parallel, admits new postings
//! through the dedup window under the lock, then persists and broadcasts
//! outside it. A poisoned state lock is the one fatal failure: it stops the
//! loop and forces the lifecycle to Stopped. An explicit stop recovers it,
//! resetting the state and clearing the poison.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use jobcast_connector::SourceConnector;
use jobcast_core::config::{SettingsUpdate, WatchConfig};
use jobcast_core::{BlockList, Job, JobView, PipelineError};

use crate::dedup::IdWindow;
use crate::eviction::{cleanup_due, EvictionPolicy};
use crate::hub::{BroadcastHub, HubStats, Subscriber};
use crate::sink::PersistenceSink;
use crate::snapshot::SnapshotStore;
use crate::status::{BotState, BotStatus, Counters, StatusEvent, StatusLog};

/// How long `stop()` waits for the loop task before abandoning it.
const STOP_JOIN_TIMEOUT: Duration = Duration::from_secs(2);
/// Stop-flag polling resolution of the inter-cycle wait.
const WAIT_STEP: Duration = Duration::from_secs(1);
/// History entries included in the status payload.
const STATUS_HISTORY_LEN: usize = 10;

/// Everything the ingestion path mutates, behind one lock.
struct PipelineState {
    snapshot: SnapshotStore,
    dedup: IdWindow,
    sent: IdWindow,
    settings: WatchConfig,
    counters: Counters,
    last_error: Option<String>,
    last_scrape: Option<DateTime<Utc>>,
    last_cleanup: Option<DateTime<Utc>>,
}

/// Lifecycle bookkeeping, locked independently of the pipeline state.
struct Lifecycle {
    state: BotState,
    log: StatusLog,
    started_at: Option<DateTime<Utc>>,
    loop_task: Option<JoinHandle<()>>,
}

/// Drives ingestion cycles against an injected source, sink and hub.
pub struct Coordinator {
    connector: Arc<dyn SourceConnector>,
    sink: Arc<dyn PersistenceSink>,
    hub: Arc<BroadcastHub>,
    blocklist: BlockList,
    state: Mutex<PipelineState>,
    lifecycle: Mutex<Lifecycle>,
    stop_flag: AtomicBool,
}

impl Coordinator {
    pub fn new(
        connector: Arc<dyn SourceConnector>,
        sink: Arc<dyn PersistenceSink>,
        hub: Arc<BroadcastHub>,
        blocklist: BlockList,
        watch: WatchConfig,
    ) -> Self {
        let dedup = IdWindow::new(watch.max_seen_ids);
        let sent = IdWindow::new(watch.max_sent_ids);
        Self {
            connector,
            sink,
            hub,
            blocklist,
            state: Mutex::new(PipelineState {
                snapshot: SnapshotStore::new(),
                dedup,
                sent,
                settings: watch,
                counters: Counters::default(),
                last_error: None,
                last_scrape: None,
                last_cleanup: None,
            }),
            lifecycle: Mutex::new(Lifecycle {
                state: BotState::Stopped,
                log: StatusLog::default(),
                started_at: None,
                loop_task: None,
            }),
            stop_flag: AtomicBool::new(false),
        }
    }

    // ── Lifecycle ──────────────────────────────────────────────────────

    /// Start the ingestion loop. Validates the connector before any state
    /// change; an unreachable source fails fast with no transition.
    pub async fn start(self: Arc<Self>) -> Result<(), PipelineError> {
        self.connector
            .health_check()
            .await
            .map_err(|err| PipelineError::ConnectorUnavailable(err.to_string()))?;

        let event = self.snapshot_event(BotState::Running);
        let mut lifecycle = self.lifecycle_guard();
        if lifecycle.state != BotState::Stopped {
            return Err(PipelineError::InvalidTransition(format!(
                "cannot start while {}",
                lifecycle.state.as_str()
            )));
        }
        // An abandoned loop from a timed-out stop still polls this flag.
        self.stop_flag.store(false, Ordering::Relaxed);
        lifecycle.state = BotState::Running;
        lifecycle.started_at = Some(Utc::now());
        lifecycle.log.push(event);
        lifecycle.loop_task = Some(tokio::spawn(Arc::clone(&self).run_loop()));
        info!(source = self.connector.source_name(), "ingestion started");
        Ok(())
    }

    /// Stop the loop and clear all pipeline state. Waits up to
    /// [`STOP_JOIN_TIMEOUT`] for the loop task, then abandons it; an
    /// abandoned task exits on its own at the next stop-flag check.
    /// Stopping an already stopped coordinator is a no-op. This is also
    /// the recovery path for a poisoned state lock: the reset puts fresh
    /// state behind it.
    pub async fn stop(&self) -> Result<(), PipelineError> {
        let handle = {
            let mut lifecycle = self.lifecycle_guard();
            if lifecycle.state == BotState::Stopped {
                return Ok(());
            }
            self.stop_flag.store(true, Ordering::Relaxed);
            lifecycle.loop_task.take()
        };
        if let Some(handle) = handle {
            match timeout(STOP_JOIN_TIMEOUT, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(join_err)) => {
                    warn!(error = %join_err, "ingestion loop task failed at join");
                }
                Err(_elapsed) => {
                    warn!(
                        timeout_secs = STOP_JOIN_TIMEOUT.as_secs(),
                        "ingestion loop still busy, abandoning task"
                    );
                }
            }
        }
        {
            let mut st = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            st.snapshot.clear();
            st.dedup.clear();
            st.sent.clear();
            st.counters = Counters::default();
            st.last_error = None;
            st.last_scrape = None;
            st.last_cleanup = None;
        }
        // The reset leaves consistent state behind, so the poison flag is stale.
        self.state.clear_poison();
        let event = self.snapshot_event(BotState::Stopped);
        let mut lifecycle = self.lifecycle_guard();
        lifecycle.state = BotState::Stopped;
        lifecycle.started_at = None;
        lifecycle.log.push(event);
        info!("ingestion stopped, state cleared");
        Ok(())
    }

    /// Pause ingestion. The loop keeps ticking but skips cycles.
    pub fn pause(&self) -> Result<(), PipelineError> {
        let event = self.snapshot_event(BotState::Paused);
        let mut lifecycle = self.lifecycle_guard();
        if lifecycle.state != BotState::Running {
            return Err(PipelineError::InvalidTransition(format!(
                "cannot pause while {}",
                lifecycle.state.as_str()
            )));
        }
        lifecycle.state = BotState::Paused;
        lifecycle.log.push(event);
        info!("ingestion paused");
        Ok(())
    }

    pub fn resume(&self) -> Result<(), PipelineError> {
        let event = self.snapshot_event(BotState::Running);
        let mut lifecycle = self.lifecycle_guard();
        if lifecycle.state != BotState::Paused {
            return Err(PipelineError::InvalidTransition(format!(
                "cannot resume while {}",
                lifecycle.state.as_str()
            )));
        }
        lifecycle.state = BotState::Running;
        lifecycle.log.push(event);
        info!("ingestion resumed");
        Ok(())
    }

    pub fn state(&self) -> BotState {
        self.lifecycle_guard().state
    }

    /// Fan-out stats only; touches the hub registry, not the state lock.
    pub fn hub_stats(&self) -> HubStats {
        self.hub.stats()
    }

    // ── Queries and commands ───────────────────────────────────────────

    /// Full status payload. Answers in every lifecycle state; a poisoned
    /// state lock degrades the numbers rather than the endpoint.
    pub fn status(&self) -> BotStatus {
        let (jobs_count, unread_count, counters, last_error, last_scrape, settings) = {
            let st = match self.state.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            (
                st.snapshot.len(),
                st.snapshot.unread(),
                st.counters,
                st.last_error.clone(),
                st.last_scrape,
                st.settings.clone(),
            )
        };
        let (state, started_at, history) = {
            let lifecycle = self.lifecycle_guard();
            (
                lifecycle.state,
                lifecycle.started_at,
                lifecycle.log.recent(STATUS_HISTORY_LEN),
            )
        };
        BotStatus {
            state,
            running: state == BotState::Running,
            paused: state == BotState::Paused,
            jobs_count,
            unread_count,
            jobs_found: counters.jobs_found,
            cycles: counters.cycles,
            error_count: counters.error_count,
            last_error,
            last_scrape_time: last_scrape,
            uptime_secs: started_at.map_or(0, |t| (Utc::now() - t).num_seconds().max(0) as u64),
            settings,
            hub: self.hub.stats(),
            history,
        }
    }

    /// Current postings with blocked clients filtered out, newest first.
    pub fn active_jobs(&self) -> Result<Vec<Job>, PipelineError> {
        let st = self.state_guard()?;
        Ok(st.snapshot.get_active(|job| self.blocklist.allows(job)))
    }

    /// Register a live subscriber; its first event is the current active set.
    pub fn subscribe(&self) -> Result<Subscriber, PipelineError> {
        let views: Vec<JobView> = {
            let st = self.state_guard()?;
            st.snapshot
                .get_active(|job| self.blocklist.allows(job))
                .iter()
                .map(Job::to_view)
                .collect()
        };
        Ok(self.hub.subscribe(views))
    }

    pub fn unsubscribe(&self, subscriber: &Subscriber) {
        self.hub.unregister(subscriber.id);
    }

    /// Mark one posting read. `Ok(false)` means the id is unknown.
    pub fn mark_read(&self, id: &str) -> Result<bool, PipelineError> {
        let mut st = self.state_guard()?;
        Ok(st.snapshot.mark_read(id))
    }

    /// Mark everything read; returns how many postings flipped.
    pub fn mark_all_read(&self) -> Result<usize, PipelineError> {
        let mut st = self.state_guard()?;
        Ok(st.snapshot.mark_all_read())
    }

    pub fn settings(&self) -> Result<WatchConfig, PipelineError> {
        Ok(self.state_guard()?.settings.clone())
    }

    /// Apply a partial settings update. Validation failures leave the
    /// current settings untouched. A lowered `max_jobs` truncates the
    /// snapshot immediately; everything else takes effect next cycle.
    pub fn update_settings(&self, update: &SettingsUpdate) -> Result<WatchConfig, PipelineError> {
        let mut guard = self.state_guard()?;
        let st = &mut *guard;
        update.apply_to(&mut st.settings)?;
        st.snapshot.truncate(st.settings.max_jobs);
        info!(
            categories = ?st.settings.categories,
            interval_secs = st.settings.interval_secs,
            max_jobs = st.settings.max_jobs,
            "settings updated"
        );
        Ok(st.settings.clone())
    }

    // ── Ingestion loop ─────────────────────────────────────────────────

    async fn run_loop(self: Arc<Self>) {
        info!("ingestion loop started");
        'outer: loop {
            if self.stop_flag.load(Ordering::Relaxed) {
                break;
            }
            let paused = self.lifecycle_guard().state == BotState::Paused;
            if !paused {
                if let Err(err) = self.run_cycle().await {
                    self.record_fatal(err);
                    break;
                }
            }
            let interval_secs = match self.state.lock() {
                Ok(st) => st.settings.interval_secs,
                Err(_) => {
                    self.record_fatal(PipelineError::FatalLoop(
                        "pipeline state lock poisoned".to_string(),
                    ));
                    break;
                }
            };
            for _ in 0..interval_secs {
                if self.stop_flag.load(Ordering::Relaxed) {
                    break 'outer;
                }
                sleep(WAIT_STEP).await;
            }
        }
        debug!("ingestion loop exited");
    }

    /// One ingestion cycle. Per-category failures are counted and skipped;
    /// only a poisoned state lock escapes as an error.
    async fn run_cycle(&self) -> Result<(), PipelineError> {
        let (categories, keywords, lookback_hours) = {
            let st = self.state_guard()?;
            (
                st.settings.categories.clone(),
                st.settings.keywords.clone(),
                st.settings.lookback_hours,
            )
        };

        let mut tasks = JoinSet::new();
        for category in categories {
            let connector = Arc::clone(&self.connector);
            let keywords = keywords.clone();
            tasks.spawn(async move {
                let result = connector.fetch(&category, &keywords, lookback_hours).await;
                (category, result)
            });
        }

        let mut cycle_new = 0usize;
        while let Some(joined) = tasks.join_next().await {
            let (category, result) = match joined {
                Ok(pair) => pair,
                Err(join_err) => {
                    warn!(error = %join_err, "category fetch task panicked");
                    let mut st = self.state_guard()?;
                    st.counters.error_count += 1;
                    continue;
                }
            };
            let jobs = match result {
                Ok(jobs) => jobs,
                Err(err) => {
                    warn!(category = %category, error = %err, "category fetch failed");
                    let mut st = self.state_guard()?;
                    st.counters.error_count += 1;
                    st.last_error = Some(PipelineError::source(&category, &err).to_string());
                    continue;
                }
            };
            if jobs.is_empty() {
                continue;
            }

            // Short critical section: dedup admit, merge, sent-window filter.
            let fresh = {
                let mut guard = self.state_guard()?;
                let st = &mut *guard;
                let mut batch: Vec<Job> = jobs
                    .into_iter()
                    .filter(|job| st.dedup.admit(&job.id))
                    .collect();
                if !batch.is_empty() {
                    st.counters.jobs_found += batch.len() as u64;
                    st.snapshot.merge(batch.clone(), st.settings.max_jobs);
                    batch.retain(|job| st.sent.admit(&job.id));
                }
                batch
            };
            if fresh.is_empty() {
                continue;
            }
            info!(category = %category, count = fresh.len(), "new postings ingested");

            // Persistence and broadcast run outside the lock.
            for job in &fresh {
                if let Err(err) = self.sink.upsert(job).await {
                    warn!(
                        job_id = %job.id,
                        sink = self.sink.sink_name(),
                        error = %err,
                        "sink upsert failed"
                    );
                }
            }
            let views: Vec<JobView> = fresh
                .iter()
                .filter(|job| self.blocklist.allows(job))
                .map(|job| job.to_view())
                .collect();
            self.hub.publish(views);
            cycle_new += fresh.len();
        }

        {
            let mut guard = self.state_guard()?;
            let st = &mut *guard;
            st.counters.cycles += 1;
            st.last_scrape = Some(Utc::now());
            let now = Utc::now();
            if cleanup_due(st.last_cleanup, now, st.settings.cleanup_interval_secs) {
                let policy = EvictionPolicy {
                    max_age_hours: st.settings.job_max_age_hours,
                };
                let report = policy.run(&mut st.snapshot, &mut st.dedup, &mut st.sent, now);
                st.last_cleanup = Some(now);
                if report.removed > 0 {
                    info!(
                        removed = report.removed,
                        surviving = report.surviving,
                        "evicted aged postings"
                    );
                }
            }
        }

        debug!(new_jobs = cycle_new, "ingestion cycle complete");
        Ok(())
    }

    /// Record an unrecoverable loop failure and force Stopped. The snapshot
    /// is left as-is; only an explicit stop clears state.
    fn record_fatal(&self, err: PipelineError) {
        error!(error = %err, "fatal ingestion loop failure");
        {
            // The poison case is exactly the one this must record.
            let mut st = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            st.counters.error_count += 1;
            st.last_error = Some(err.to_string());
        }
        self.stop_flag.store(true, Ordering::Relaxed);
        let event = self.snapshot_event(BotState::Stopped);
        let mut lifecycle = self.lifecycle_guard();
        lifecycle.state = BotState::Stopped;
        lifecycle.started_at = None;
        lifecycle.loop_task = None;
        lifecycle.log.push(event);
    }

    /// Status event from the current counters. Never takes the lifecycle
    /// lock, so callers can hold it.
    fn snapshot_event(&self, state: BotState) -> StatusEvent {
        let (jobs_found, unread, error_count) = {
            let st = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            (
                st.counters.jobs_found,
                st.snapshot.unread(),
                st.counters.error_count,
            )
        };
        StatusEvent {
            timestamp: Utc::now(),
            state,
            jobs_found,
            unread,
            error_count,
        }
    }

    fn state_guard(&self) -> Result<MutexGuard<'_, PipelineState>, PipelineError> {
        self.state
            .lock()
            .map_err(|_| PipelineError::FatalLoop("pipeline state lock poisoned".to_string()))
    }

    fn lifecycle_guard(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
