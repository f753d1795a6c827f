//! Shared fixtures for the crate's unit tests.

use jobcast_core::{Client, Job, JobPrice, PriceKind};

pub fn job(id: &str, posted_at: &str) -> Job {
    Job {
        id: id.to_string(),
        title: format!("posting {id}"),
        description: "need a rust developer".to_string(),
        full_description: None,
        url: format!("https://example.test/jobs/{id}"),
        category: "web".to_string(),
        posted_at: posted_at.to_string(),
        price: JobPrice {
            kind: PriceKind::Fixed,
            amount: Some(50_000),
            currency: Some("JPY".to_string()),
            formatted: "50,000円".to_string(),
        },
        client: Client::default(),
        matched_keywords: Vec::new(),
        is_read: false,
    }
}
