use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::types::RejectionReason;

/// Blob storage addressed by bucket and key
#[async_trait]
pub trait ObjectStorePort: Send + Sync {
    /// Fails with `CleanerError::NotFound` when the object does not exist
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;

    /// Store the object and return a location string for it
    async fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>, content_type: &str)
        -> Result<String>;
}

/// Persistence for one summary row per processed file
#[async_trait]
pub trait SummaryStorePort: Send + Sync {
    async fn put_summary(&self, summary: &ProcessingSummary) -> Result<()>;

    /// Most recent first
    async fn list_summaries(&self, limit: usize) -> Result<Vec<ProcessingSummary>>;
}

/// What was done with one source file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingSummary {
    pub run_id: Uuid,
    pub source_bucket: String,
    pub source_key: String,
    /// Last path segment of the source key
    pub file_name: String,
    /// Accepted records
    pub row_count: usize,
    /// Columns per accepted record
    pub column_count: usize,
    pub processed_count: usize,
    pub skipped_count: usize,
    pub rejection_reasons: BTreeMap<RejectionReason, usize>,
    pub source_encoding: String,
    pub processed_at: DateTime<Utc>,
    /// Locations of every artifact written for this file
    pub outputs: Vec<String>,
}
