//! Lifecycle states, transition history and the status payload.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use jobcast_core::config::WatchConfig;

use crate::hub::HubStats;

/// Coordinator lifecycle. Legal transitions: Stopped -> Running,
/// Running <-> Paused, Running or Paused -> Stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BotState {
    Stopped,
    Running,
    Paused,
}

impl BotState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BotState::Stopped => "stopped",
            BotState::Running => "running",
            BotState::Paused => "paused",
        }
    }
}

/// One entry of the status history ring.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct StatusEvent {
    pub timestamp: DateTime<Utc>,
    pub state: BotState,
    pub jobs_found: u64,
    pub unread: usize,
    pub error_count: u64,
}

/// Fixed upper bound of the status history ring.
pub const STATUS_LOG_CAPACITY: usize = 100;

/// Bounded ring of lifecycle transitions, oldest dropped first.
#[derive(Debug, Default)]
pub struct StatusLog {
    events: VecDeque<StatusEvent>,
}

impl StatusLog {
    pub fn push(&mut self, event: StatusEvent) {
        if self.events.len() == STATUS_LOG_CAPACITY {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Last `n` events, oldest first.
    pub fn recent(&self, n: usize) -> Vec<StatusEvent> {
        let skip = self.events.len().saturating_sub(n);
        self.events.iter().skip(skip).cloned().collect()
    }
}

/// Counters accumulated across ingestion cycles. Cleared on stop.
#[derive(Debug, Default, Clone, Copy)]
pub struct Counters {
    pub jobs_found: u64,
    pub cycles: u64,
    pub error_count: u64,
}

/// Full status payload as reported by the coordinator.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct BotStatus {
    pub state: BotState,
    pub running: bool,
    pub paused: bool,
    pub jobs_count: usize,
    pub unread_count: usize,
    pub jobs_found: u64,
    pub cycles: u64,
    pub error_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_scrape_time: Option<DateTime<Utc>>,
    pub uptime_secs: u64,
    pub settings: WatchConfig,
    pub hub: HubStats,
    pub history: Vec<StatusEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(jobs_found: u64) -> StatusEvent {
        StatusEvent {
            timestamp: Utc::now(),
            state: BotState::Running,
            jobs_found,
            unread: 0,
            error_count: 0,
        }
    }

    #[test]
    fn ring_holds_at_most_capacity() {
        let mut log = StatusLog::default();
        for i in 0..(STATUS_LOG_CAPACITY as u64 + 20) {
            log.push(event(i));
        }
        assert_eq!(log.len(), STATUS_LOG_CAPACITY);
        // the 20 oldest entries are gone
        assert_eq!(log.recent(STATUS_LOG_CAPACITY)[0].jobs_found, 20);
    }

    #[test]
    fn recent_returns_last_n_oldest_first() {
        let mut log = StatusLog::default();
        for i in 0..15 {
            log.push(event(i));
        }
        let tail = log.recent(10);
        assert_eq!(tail.len(), 10);
        assert_eq!(tail[0].jobs_found, 5);
        assert_eq!(tail[9].jobs_found, 14);
    }

    #[test]
    fn recent_handles_short_history() {
        let mut log = StatusLog::default();
        log.push(event(1));
        assert_eq!(log.recent(10).len(), 1);
        assert!(StatusLog::default().recent(10).is_empty());
    }

    #[test]
    fn state_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(BotState::Running).unwrap(),
            serde_json::json!("running")
        );
        assert_eq!(
            serde_json::from_value::<BotState>(serde_json::json!("paused")).unwrap(),
            BotState::Paused
        );
    }
}
