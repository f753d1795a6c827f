use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Timestamp format used for `Job::posted_at`. Fixed-width and zero-padded,
/// so lexicographic string comparison matches chronological order.
pub const POSTED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// One ingested job posting with a source-assigned unique id.
///
/// Owned by the snapshot store once merged: mutated only by read-marking and
/// by merge-time carry-forward of `is_read`, removed only by age eviction or
/// capacity truncation.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Job {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Untruncated body text. Heavy; dropped from the wire projection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_description: Option<String>,
    pub url: String,
    pub category: String,
    /// Posting time in [`POSTED_AT_FORMAT`], interpreted as UTC.
    pub posted_at: String,
    pub price: JobPrice,
    pub client: Client,
    /// Configured keywords that matched this posting at fetch time.
    #[serde(default)]
    pub matched_keywords: Vec<String>,
    #[serde(default)]
    pub is_read: bool,
}

/// Price attached to a posting.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct JobPrice {
    pub kind: PriceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// Display string as the source rendered it (e.g. "5,000円 〜 10,000円").
    pub formatted: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PriceKind {
    Fixed,
    Hourly,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Client (employer) details attached to a posting.
///
/// Activity recency is expressed in minutes everywhere; no hours-based field
/// exists in this model.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Client {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contracts_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity_minutes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_verified: Option<bool>,
}

impl Job {
    /// Normalized epoch seconds of `posted_at` (UTC). Unparsable timestamps
    /// normalize to 0, so age-based eviction removes them.
    pub fn posted_at_epoch(&self) -> i64 {
        NaiveDateTime::parse_from_str(&self.posted_at, POSTED_AT_FORMAT)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or(0)
    }

    /// Wire projection sent to subscribers: everything except the heavy
    /// `full_description` body and the keyword annotations.
    pub fn to_view(&self) -> JobView {
        JobView {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            url: self.url.clone(),
            category: self.category.clone(),
            posted_at: self.posted_at.clone(),
            price: self.price.clone(),
            client: self.client.clone(),
            is_read: self.is_read,
        }
    }
}

/// Field-projected view of a [`Job`] for snapshot and new-jobs messages.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct JobView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub url: String,
    pub category: String,
    pub posted_at: String,
    pub price: JobPrice,
    pub client: Client,
    pub is_read: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: &str, posted_at: &str) -> Job {
        Job {
            id: id.to_string(),
            title: "Rust backend developer".to_string(),
            description: "API work".to_string(),
            full_description: Some("Long body".to_string()),
            url: format!("https://example.com/jobs/{id}"),
            category: "web".to_string(),
            posted_at: posted_at.to_string(),
            price: JobPrice {
                kind: PriceKind::Fixed,
                amount: Some(50_000),
                currency: Some("JPY".to_string()),
                formatted: "50,000円".to_string(),
            },
            client: Client::default(),
            matched_keywords: vec!["rust".to_string()],
            is_read: false,
        }
    }

    #[test]
    fn posted_at_epoch_parses_utc() {
        let job = sample("j1", "2025-06-14T09:30:00");
        assert_eq!(job.posted_at_epoch(), 1_749_893_400);
    }

    #[test]
    fn posted_at_epoch_zero_on_garbage() {
        let job = sample("j1", "yesterday-ish");
        assert_eq!(job.posted_at_epoch(), 0);
    }

    #[test]
    fn lexicographic_order_matches_time_order() {
        let older = sample("a", "2025-06-14T09:30:00");
        let newer = sample("b", "2025-06-14T10:00:00");
        assert!(newer.posted_at > older.posted_at);
        assert!(newer.posted_at_epoch() > older.posted_at_epoch());
    }

    #[test]
    fn view_drops_heavy_fields() {
        let job = sample("j1", "2025-06-14T09:30:00");
        let view = job.to_view();
        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("full_description").is_none());
        assert!(json.get("matched_keywords").is_none());
        assert_eq!(json["id"], "j1");
        assert_eq!(json["price"]["kind"], "fixed");
    }

    #[test]
    fn price_kind_unknown_roundtrip() {
        let kind: PriceKind = serde_json::from_str("\"per_project\"").unwrap();
        assert_eq!(kind, PriceKind::Unknown);
        let kind: PriceKind = serde_json::from_str("\"hourly\"").unwrap();
        assert_eq!(kind, PriceKind::Hourly);
    }
}
