//! HTTP JSON-feed connector.
//!
//! Fetches `GET {base_url}/jobs?category=..&hours=..[&keywords=..]`, maps the
//! feed payload into [`Job`] records, annotates keyword matches, and applies
//! a local lookback guard on parseable timestamps.

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use jobcast_core::config::FeedConfig;
use jobcast_core::{Client, Job, JobPrice, PriceKind, POSTED_AT_FORMAT};

use crate::{ConnectorError, SourceConnector};

/// Connector backed by a JSON job feed.
pub struct FeedConnector {
    base_url: Option<String>,
    client: reqwest::Client,
}

impl FeedConnector {
    pub fn new(config: &FeedConfig) -> Result<Self, ConnectorError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            base_url: config.base_url.clone(),
            client,
        })
    }

    fn base_url(&self) -> Result<&str, ConnectorError> {
        match self.base_url.as_deref() {
            Some(url) if !url.is_empty() => Ok(url),
            _ => Err(ConnectorError::Unavailable(
                "FEED_BASE_URL is not set".to_string(),
            )),
        }
    }
}

#[async_trait]
impl SourceConnector for FeedConnector {
    async fn fetch(
        &self,
        category: &str,
        keywords: &[String],
        lookback_hours: u32,
    ) -> Result<Vec<Job>, ConnectorError> {
        let base = self.base_url()?;
        let url = format!("{}/jobs", base.trim_end_matches('/'));

        let hours = lookback_hours.to_string();
        let mut request = self
            .client
            .get(&url)
            .query(&[("category", category), ("hours", hours.as_str())]);
        if !keywords.is_empty() {
            request = request.query(&[("keywords", keywords.join(","))]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ConnectorError::Status {
                status,
                category: category.to_string(),
            });
        }

        let payload: Vec<FeedJob> = response.json().await?;
        let fetched = payload.len();

        let threshold_epoch =
            (Utc::now() - chrono::Duration::hours(i64::from(lookback_hours))).timestamp();
        let jobs: Vec<Job> = payload
            .into_iter()
            .map(|raw| raw.into_job(category, keywords))
            .filter(|job| within_lookback(job, threshold_epoch))
            .collect();

        debug!(
            category = %category,
            fetched,
            kept = jobs.len(),
            "feed fetch complete"
        );
        Ok(jobs)
    }

    async fn health_check(&self) -> Result<(), ConnectorError> {
        let base = self.base_url()?;
        let parsed = reqwest::Url::parse(base)
            .map_err(|e| ConnectorError::Unavailable(format!("invalid FEED_BASE_URL: {e}")))?;
        match parsed.scheme() {
            "http" | "https" => Ok(()),
            other => Err(ConnectorError::Unavailable(format!(
                "unsupported feed scheme '{other}'"
            ))),
        }
    }

    fn source_name(&self) -> &str {
        "feed"
    }
}

/// Lookback guard: postings with parseable timestamps must fall inside the
/// window; unparsable ones pass through and age out at the next eviction.
fn within_lookback(job: &Job, threshold_epoch: i64) -> bool {
    let epoch = job.posted_at_epoch();
    epoch == 0 || epoch >= threshold_epoch
}

// ── Feed payload ──────────────────────────────────────────────

/// One posting as the feed serves it.
#[derive(Debug, Deserialize)]
struct FeedJob {
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    full_description: Option<String>,
    url: String,
    #[serde(default)]
    posted_at: String,
    #[serde(default)]
    price: Option<FeedPrice>,
    #[serde(default)]
    client: Option<FeedClient>,
}

#[derive(Debug, Default, Deserialize)]
struct FeedPrice {
    #[serde(rename = "type", default)]
    kind: PriceKind,
    #[serde(default)]
    amount: Option<i64>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    formatted: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FeedClient {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    employer_id: Option<String>,
    #[serde(default)]
    avatar: Option<String>,
    #[serde(default)]
    contracts_count: Option<u32>,
    #[serde(default)]
    completed_count: Option<u32>,
    #[serde(default)]
    last_activity_minutes: Option<i64>,
    #[serde(default)]
    identity_verified: Option<bool>,
}

impl FeedJob {
    fn into_job(self, category: &str, keywords: &[String]) -> Job {
        let price = self.price.unwrap_or_default();
        let client = self.client.unwrap_or_default();
        let posted_at = normalize_posted_at(&self.posted_at);
        let matched_keywords = match_keywords(&self.title, &self.description, keywords);

        Job {
            id: self.id,
            title: self.title,
            description: self.description,
            full_description: self.full_description,
            url: self.url,
            category: category.to_string(),
            posted_at,
            price: JobPrice {
                kind: price.kind,
                amount: price.amount,
                currency: price.currency,
                formatted: price.formatted.unwrap_or_else(|| "N/A".to_string()),
            },
            client: Client {
                username: client.username,
                display_name: client.display_name,
                employer_id: client.employer_id,
                avatar_url: client.avatar,
                contracts_count: client.contracts_count,
                completed_count: client.completed_count,
                last_activity_minutes: client.last_activity_minutes,
                identity_verified: client.identity_verified,
            },
            matched_keywords,
            is_read: false,
        }
    }
}

/// Normalize feed timestamps to [`POSTED_AT_FORMAT`]. Accepts the canonical
/// format, RFC 3339, and the space-separated variant; anything else is kept
/// verbatim (it normalizes to epoch 0 downstream and ages out).
fn normalize_posted_at(raw: &str) -> String {
    let raw = raw.trim();
    if NaiveDateTime::parse_from_str(raw, POSTED_AT_FORMAT).is_ok() {
        return raw.to_string();
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return dt.naive_utc().format(POSTED_AT_FORMAT).to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return dt.format(POSTED_AT_FORMAT).to_string();
    }
    raw.to_string()
}

/// Case-insensitive keyword hits against title and description.
fn match_keywords(title: &str, description: &str, keywords: &[String]) -> Vec<String> {
    if keywords.is_empty() {
        return Vec::new();
    }
    let haystack = format!("{} {}", title, description).to_lowercase();
    keywords
        .iter()
        .filter(|k| !k.is_empty() && haystack.contains(&k.to_lowercase()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_accepts_canonical_format() {
        assert_eq!(
            normalize_posted_at("2025-06-14T09:30:00"),
            "2025-06-14T09:30:00"
        );
    }

    #[test]
    fn normalize_converts_rfc3339_to_utc() {
        assert_eq!(
            normalize_posted_at("2025-06-14T18:30:00+09:00"),
            "2025-06-14T09:30:00"
        );
    }

    #[test]
    fn normalize_accepts_space_separator() {
        assert_eq!(
            normalize_posted_at("2025-06-14 09:30:00"),
            "2025-06-14T09:30:00"
        );
    }

    #[test]
    fn normalize_keeps_garbage_verbatim() {
        assert_eq!(normalize_posted_at("3 hours ago"), "3 hours ago");
    }

    #[test]
    fn match_keywords_is_case_insensitive() {
        let keywords = vec!["Rust".to_string(), "python".to_string()];
        let hits = match_keywords("Senior RUST engineer", "backend services", &keywords);
        assert_eq!(hits, vec!["Rust"]);
    }

    #[test]
    fn match_keywords_empty_config_matches_nothing() {
        assert!(match_keywords("any title", "any body", &[]).is_empty());
    }

    #[test]
    fn feed_job_maps_into_domain_job() {
        let raw = r#"{
            "id": "feed-1",
            "title": "Rust scraper",
            "description": "Build a scraper",
            "url": "https://example.com/jobs/feed-1",
            "posted_at": "2025-06-14 09:30:00",
            "price": {"type": "hourly", "amount": 3000, "currency": "JPY", "formatted": "3,000円/時間"},
            "client": {"username": "acme", "employer_id": "emp-1", "avatar": "https://example.com/a.png"}
        }"#;
        let feed_job: FeedJob = serde_json::from_str(raw).unwrap();
        let job = feed_job.into_job("web", &["rust".to_string()]);

        assert_eq!(job.id, "feed-1");
        assert_eq!(job.category, "web");
        assert_eq!(job.posted_at, "2025-06-14T09:30:00");
        assert_eq!(job.price.kind, PriceKind::Hourly);
        assert_eq!(job.client.avatar_url.as_deref(), Some("https://example.com/a.png"));
        assert_eq!(job.matched_keywords, vec!["rust"]);
        assert!(!job.is_read);
    }

    #[test]
    fn feed_job_tolerates_missing_optionals() {
        let raw = r#"{"id": "feed-2", "title": "t", "url": "https://example.com/2"}"#;
        let feed_job: FeedJob = serde_json::from_str(raw).unwrap();
        let job = feed_job.into_job("app", &[]);

        assert_eq!(job.price.kind, PriceKind::Unknown);
        assert_eq!(job.price.formatted, "N/A");
        assert!(job.client.username.is_none());
        // Unparsable (empty) timestamp normalizes to epoch 0
        assert_eq!(job.posted_at_epoch(), 0);
    }

    #[test]
    fn lookback_guard_drops_old_keeps_unparsable() {
        let mk = |posted_at: &str| {
            let raw = format!(
                r#"{{"id": "x", "title": "t", "url": "u", "posted_at": "{posted_at}"}}"#
            );
            let feed_job: FeedJob = serde_json::from_str(&raw).unwrap();
            feed_job.into_job("web", &[])
        };
        let threshold = mk("2025-06-14T00:00:00").posted_at_epoch();

        assert!(within_lookback(&mk("2025-06-14T05:00:00"), threshold));
        assert!(!within_lookback(&mk("2025-06-13T23:59:59"), threshold));
        assert!(within_lookback(&mk("who knows"), threshold));
    }

    #[tokio::test]
    async fn health_check_requires_configured_base_url() {
        let connector = FeedConnector::new(&FeedConfig {
            base_url: None,
            timeout_secs: 5,
        })
        .unwrap();
        assert!(matches!(
            connector.health_check().await,
            Err(ConnectorError::Unavailable(_))
        ));

        let connector = FeedConnector::new(&FeedConfig {
            base_url: Some("ftp://feed.example.com".to_string()),
            timeout_secs: 5,
        })
        .unwrap();
        assert!(connector.health_check().await.is_err());

        let connector = FeedConnector::new(&FeedConfig {
            base_url: Some("https://feed.example.com".to_string()),
            timeout_secs: 5,
        })
        .unwrap();
        assert!(connector.health_check().await.is_ok());
    }
}
