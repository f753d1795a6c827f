use std::collections::HashSet;

use crate::config::BlockListConfig;
use crate::job::Job;

/// Blocked-client filter, applied only when computing the externally visible
/// active set (REST reads and broadcast payloads), never during ingestion.
#[derive(Debug, Default, Clone)]
pub struct BlockList {
    usernames: HashSet<String>,
    employer_ids: HashSet<String>,
}

impl BlockList {
    pub fn new(usernames: HashSet<String>, employer_ids: HashSet<String>) -> Self {
        Self {
            usernames,
            employer_ids,
        }
    }

    pub fn from_config(config: &BlockListConfig) -> Self {
        Self {
            usernames: config.usernames.iter().cloned().collect(),
            employer_ids: config.employer_ids.iter().cloned().collect(),
        }
    }

    /// True when the posting's client matches neither blocked set.
    pub fn allows(&self, job: &Job) -> bool {
        if let Some(username) = &job.client.username {
            if self.usernames.contains(username) {
                return false;
            }
        }
        if let Some(employer_id) = &job.client.employer_id {
            if self.employer_ids.contains(employer_id) {
                return false;
            }
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.usernames.is_empty() && self.employer_ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{Client, JobPrice, PriceKind};

    fn job_from(username: Option<&str>, employer_id: Option<&str>) -> Job {
        Job {
            id: "j1".to_string(),
            title: "t".to_string(),
            description: "d".to_string(),
            full_description: None,
            url: "https://example.com/j1".to_string(),
            category: "web".to_string(),
            posted_at: "2025-06-14T09:30:00".to_string(),
            price: JobPrice {
                kind: PriceKind::Unknown,
                amount: None,
                currency: None,
                formatted: "N/A".to_string(),
            },
            client: Client {
                username: username.map(str::to_string),
                employer_id: employer_id.map(str::to_string),
                ..Client::default()
            },
            matched_keywords: vec![],
            is_read: false,
        }
    }

    #[test]
    fn blocks_on_username_or_employer_id() {
        let blocklist = BlockList::new(
            ["spammer".to_string()].into_iter().collect(),
            ["emp-9".to_string()].into_iter().collect(),
        );
        assert!(!blocklist.allows(&job_from(Some("spammer"), None)));
        assert!(!blocklist.allows(&job_from(None, Some("emp-9"))));
        assert!(blocklist.allows(&job_from(Some("fine"), Some("emp-1"))));
        assert!(blocklist.allows(&job_from(None, None)));
    }

    #[test]
    fn empty_blocklist_allows_everything() {
        let blocklist = BlockList::default();
        assert!(blocklist.is_empty());
        assert!(blocklist.allows(&job_from(Some("anyone"), Some("emp-1"))));
    }
}
