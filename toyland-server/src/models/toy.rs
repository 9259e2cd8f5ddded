//! Toy document helpers

use bson::{DateTime, Document};
use chrono::Utc;
use serde::Serialize;

/// Set `createdAt` to the current time, replacing any caller value.
pub fn stamp_created_at(toy: &mut Document) {
    toy.insert("createdAt", DateTime::from_chrono(Utc::now()));
}

/// Body of `GET /totalToys`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalToys {
    pub total_toys: u64,
}
