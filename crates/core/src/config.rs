use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_u16(key: &str, default: u16) -> u16 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    env_opt(key)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}

/// Split a comma-separated env value into trimmed, non-empty entries.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn env_list(key: &str, default: &[&str]) -> Vec<String> {
    match env_opt(key) {
        Some(raw) => parse_list(&raw),
        None => default.iter().map(|s| s.to_string()).collect(),
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub watch: WatchConfig,
    pub feed: FeedConfig,
    pub sink: SinkConfig,
    pub blocklist: BlockListConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig::from_env(),
            watch: WatchConfig::from_env(),
            feed: FeedConfig::from_env(),
            sink: SinkConfig::from_env(),
            blocklist: BlockListConfig::from_env(),
        }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!(
            "  server:    host={}, port={}, autostart={}",
            self.server.host,
            self.server.port,
            self.server.autostart
        );
        tracing::info!(
            "  watch:     categories={:?}, interval={}s, lookback={}h, max_jobs={}",
            self.watch.categories,
            self.watch.interval_secs,
            self.watch.lookback_hours,
            self.watch.max_jobs
        );
        tracing::info!(
            "  eviction:  max_age={}h, cleanup_interval={}s, max_seen_ids={}, max_sent_ids={}",
            self.watch.job_max_age_hours,
            self.watch.cleanup_interval_secs,
            self.watch.max_seen_ids,
            self.watch.max_sent_ids
        );
        tracing::info!(
            "  feed:      url={}, timeout={}s",
            self.feed.base_url.as_deref().unwrap_or("(none)"),
            self.feed.timeout_secs
        );
        tracing::info!(
            "  sink:      path={}",
            self.sink
                .path
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(none)".to_string())
        );
        tracing::info!(
            "  blocklist: {} usernames, {} employer ids",
            self.blocklist.usernames.len(),
            self.blocklist.employer_ids.len()
        );
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Start the ingestion loop on boot instead of waiting for the API call.
    pub autostart: bool,
}

impl ServerConfig {
    fn from_env() -> Self {
        Self {
            host: env_or("HOST", "0.0.0.0"),
            port: env_u16("PORT", 3001),
            autostart: env_bool("AUTOSTART", false),
        }
    }
}

// ── Watch (ingestion pipeline) ────────────────────────────────

/// Lower bound of the documented `max_jobs` clamp range.
pub const MAX_JOBS_MIN: usize = 10;
/// Upper bound of the documented `max_jobs` clamp range.
pub const MAX_JOBS_MAX: usize = 200;

/// Clamp a requested snapshot cap into the documented 10..=200 range.
pub fn clamp_max_jobs(requested: usize) -> usize {
    requested.clamp(MAX_JOBS_MIN, MAX_JOBS_MAX)
}

/// Floor the poll interval at one second; a zero interval would spin the
/// ingestion loop without sleeping.
pub fn clamp_interval_secs(requested: u64) -> u64 {
    requested.max(1)
}

/// Ingestion settings. The subset covered by [`SettingsUpdate`] is mutable
/// at runtime through the settings API; the rest is env-only.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct WatchConfig {
    pub categories: Vec<String>,
    pub keywords: Vec<String>,
    pub interval_secs: u64,
    pub lookback_hours: u32,
    /// Snapshot cap, always within 10..=200.
    pub max_jobs: usize,
    pub job_max_age_hours: u32,
    pub cleanup_interval_secs: u64,
    pub max_seen_ids: usize,
    pub max_sent_ids: usize,
}

impl WatchConfig {
    fn from_env() -> Self {
        Self {
            categories: env_list("WATCH_CATEGORIES", &["web"]),
            keywords: env_list("WATCH_KEYWORDS", &[]),
            interval_secs: clamp_interval_secs(env_u64("WATCH_INTERVAL_SECS", 60)),
            lookback_hours: env_u32("WATCH_LOOKBACK_HOURS", 24),
            max_jobs: clamp_max_jobs(env_usize("WATCH_MAX_JOBS", 50)),
            job_max_age_hours: env_u32("WATCH_JOB_MAX_AGE_HOURS", 24),
            cleanup_interval_secs: env_u64("WATCH_CLEANUP_INTERVAL_SECS", 3600),
            max_seen_ids: env_usize("WATCH_MAX_SEEN_IDS", 5000),
            max_sent_ids: env_usize("WATCH_MAX_SENT_IDS", 1000),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            categories: vec!["web".to_string()],
            keywords: Vec::new(),
            interval_secs: 60,
            lookback_hours: 24,
            max_jobs: 50,
            job_max_age_hours: 24,
            cleanup_interval_secs: 3600,
            max_seen_ids: 5000,
            max_sent_ids: 1000,
        }
    }
}

/// Runtime settings update, validated at the API boundary. Omitted fields
/// keep their current value; `max_jobs` is clamped rather than rejected.
#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema)]
pub struct SettingsUpdate {
    pub categories: Option<Vec<String>>,
    pub keywords: Option<Vec<String>>,
    pub interval_secs: Option<u64>,
    pub lookback_hours: Option<u32>,
    pub max_jobs: Option<usize>,
}

impl SettingsUpdate {
    /// Validate and apply onto the current settings.
    pub fn apply_to(&self, current: &mut WatchConfig) -> Result<(), PipelineError> {
        if let Some(categories) = &self.categories {
            if categories.is_empty() || categories.iter().any(|c| c.trim().is_empty()) {
                return Err(PipelineError::InvalidSettings(
                    "categories must be a non-empty list of non-empty names".to_string(),
                ));
            }
        }
        if self.interval_secs == Some(0) {
            return Err(PipelineError::InvalidSettings(
                "interval_secs must be at least 1".to_string(),
            ));
        }
        if self.lookback_hours == Some(0) {
            return Err(PipelineError::InvalidSettings(
                "lookback_hours must be at least 1".to_string(),
            ));
        }

        if let Some(categories) = &self.categories {
            current.categories = categories.clone();
        }
        if let Some(keywords) = &self.keywords {
            current.keywords = keywords.clone();
        }
        if let Some(interval) = self.interval_secs {
            current.interval_secs = interval;
        }
        if let Some(lookback) = self.lookback_hours {
            current.lookback_hours = lookback;
        }
        if let Some(max_jobs) = self.max_jobs {
            current.max_jobs = clamp_max_jobs(max_jobs);
        }
        Ok(())
    }
}

// ── Feed (source connector) ───────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Base URL of the job feed; connector is unavailable without it.
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

impl FeedConfig {
    fn from_env() -> Self {
        Self {
            base_url: env_opt("FEED_BASE_URL"),
            timeout_secs: env_u64("FEED_TIMEOUT_SECS", 30),
        }
    }
}

// ── Sink (persistence) ────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// JSONL event-log path; no path means persistence is disabled.
    pub path: Option<PathBuf>,
}

impl SinkConfig {
    fn from_env() -> Self {
        Self {
            path: env_opt("SINK_PATH").map(PathBuf::from),
        }
    }
}

// ── Blocklist ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockListConfig {
    pub usernames: Vec<String>,
    pub employer_ids: Vec<String>,
}

impl BlockListConfig {
    fn from_env() -> Self {
        Self {
            usernames: env_list("BLOCKED_USERNAMES", &[]),
            employer_ids: env_list("BLOCKED_EMPLOYER_IDS", &[]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_list_trims_and_drops_empties() {
        assert_eq!(parse_list("web, app ,,ai "), vec!["web", "app", "ai"]);
        assert!(parse_list("  ,").is_empty());
    }

    #[test]
    fn max_jobs_clamped_into_documented_range() {
        assert_eq!(clamp_max_jobs(3), 10);
        assert_eq!(clamp_max_jobs(50), 50);
        assert_eq!(clamp_max_jobs(9999), 200);
    }

    #[test]
    fn interval_secs_floored_at_one_second() {
        assert_eq!(clamp_interval_secs(0), 1);
        assert_eq!(clamp_interval_secs(60), 60);
    }

    #[test]
    fn settings_update_applies_partial_fields() {
        let mut settings = WatchConfig::default();
        let update = SettingsUpdate {
            categories: Some(vec!["web".to_string(), "app".to_string()]),
            max_jobs: Some(500),
            ..SettingsUpdate::default()
        };
        update.apply_to(&mut settings).unwrap();
        assert_eq!(settings.categories, vec!["web", "app"]);
        assert_eq!(settings.max_jobs, 200);
        // Untouched fields keep defaults
        assert_eq!(settings.interval_secs, 60);
    }

    #[test]
    fn settings_update_rejects_empty_categories() {
        let mut settings = WatchConfig::default();
        let update = SettingsUpdate {
            categories: Some(vec![]),
            ..SettingsUpdate::default()
        };
        assert!(update.apply_to(&mut settings).is_err());

        let update = SettingsUpdate {
            categories: Some(vec!["web".to_string(), "  ".to_string()]),
            ..SettingsUpdate::default()
        };
        assert!(update.apply_to(&mut settings).is_err());
        // Current settings untouched on rejection
        assert_eq!(settings.categories, vec!["web"]);
    }

    #[test]
    fn settings_update_rejects_zero_interval_and_lookback() {
        let mut settings = WatchConfig::default();
        let update = SettingsUpdate {
            interval_secs: Some(0),
            ..SettingsUpdate::default()
        };
        assert!(update.apply_to(&mut settings).is_err());

        let update = SettingsUpdate {
            lookback_hours: Some(0),
            ..SettingsUpdate::default()
        };
        assert!(update.apply_to(&mut settings).is_err());
    }
}
