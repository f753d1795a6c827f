//! Persistence boundary for ingested postings.
//!
//! Sink failures never abort an ingestion cycle; the coordinator logs them
//! and moves on. Implementations must be idempotent per job id.

use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use jobcast_core::{Job, PipelineError};

/// Where newly ingested postings get written.
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    /// Persist one posting. Repeated calls with the same id must be no-ops.
    async fn upsert(&self, job: &Job) -> Result<(), PipelineError>;

    /// Short name for logs.
    fn sink_name(&self) -> &str;
}

/// Append-only JSONL event log, one posting per line.
///
/// The id set makes repeat upserts within one process lifetime no-ops; the
/// file itself is never rewritten.
pub struct JsonlSink {
    path: PathBuf,
    written: Mutex<HashSet<String>>,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            written: Mutex::new(HashSet::new()),
        }
    }
}

#[async_trait]
impl PersistenceSink for JsonlSink {
    async fn upsert(&self, job: &Job) -> Result<(), PipelineError> {
        let mut written = self
            .written
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if written.contains(&job.id) {
            return Ok(());
        }
        let line = serde_json::to_string(job)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;
        written.insert(job.id.clone());
        Ok(())
    }

    fn sink_name(&self) -> &str {
        "jsonl"
    }
}

/// Sink that drops everything. Used when no sink path is configured.
pub struct NullSink;

#[async_trait]
impl PersistenceSink for NullSink {
    async fn upsert(&self, _job: &Job) -> Result<(), PipelineError> {
        Ok(())
    }

    fn sink_name(&self) -> &str {
        "null"
    }
}
