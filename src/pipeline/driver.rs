use std::collections::BTreeMap;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::config::PipelineConfig;
use crate::observability::metrics::PipelineMetrics;
use crate::pipeline::processing::dedup::{DedupPolicy, Deduplicator};
use crate::pipeline::processing::enrich::{DefaultEnricher, Enricher};
use crate::pipeline::processing::validate::{DefaultValidator, Validator};
use crate::types::{EnrichedRecord, RawRecord, RejectionReason};

/// Outcome of one pipeline run
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineResult {
    /// Accepted records, in input order
    pub accepted_records: Vec<EnrichedRecord>,
    pub processed_count: usize,
    pub skipped_count: usize,
    pub rejection_reasons: BTreeMap<RejectionReason, usize>,
}

impl PipelineResult {
    pub fn accepted_count(&self) -> usize {
        self.accepted_records.len()
    }

    pub fn rejections(&self, reason: RejectionReason) -> usize {
        self.rejection_reasons.get(&reason).copied().unwrap_or(0)
    }

    /// Output column names shared by every accepted record
    pub fn column_names(&self) -> Vec<String> {
        self.accepted_records
            .first()
            .map(EnrichedRecord::column_names)
            .unwrap_or_default()
    }

    fn reject(&mut self, reason: RejectionReason) {
        self.skipped_count += 1;
        *self.rejection_reasons.entry(reason).or_insert(0) += 1;
    }
}

/// Per-record state machine: validate, enrich, deduplicate, accept.
/// Holds no I/O handles; each `run` owns its own seen-set.
pub struct Pipeline {
    validator: Box<dyn Validator + Send + Sync>,
    enricher: Box<dyn Enricher + Send + Sync>,
    dedup_policy: DedupPolicy,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl Pipeline {
    pub fn new(
        validator: Box<dyn Validator + Send + Sync>,
        enricher: Box<dyn Enricher + Send + Sync>,
        dedup_policy: DedupPolicy,
    ) -> Self {
        Self {
            validator,
            enricher,
            dedup_policy,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            Box::new(DefaultValidator::new()),
            Box::new(DefaultEnricher::from_config(config)),
            config.dedup_policy,
        )
    }

    /// Run one record through validation, enrichment and the seen-set
    fn process_record(
        &self,
        record: RawRecord,
        dedup: &mut Deduplicator,
    ) -> Result<EnrichedRecord, RejectionReason> {
        let validated = self.validator.validate(record)?;
        let enriched = self.enricher.enrich(validated);
        dedup.admit(&enriched)?;
        Ok(enriched)
    }

    #[instrument(skip_all, fields(dedup_policy = ?self.dedup_policy))]
    pub fn run<I>(&self, records: I) -> PipelineResult
    where
        I: IntoIterator<Item = RawRecord>,
    {
        let started = Instant::now();
        let mut dedup = Deduplicator::new(self.dedup_policy);
        let mut result = PipelineResult::default();

        for (index, record) in records.into_iter().enumerate() {
            result.processed_count += 1;
            match self.process_record(record, &mut dedup) {
                Ok(enriched) => result.accepted_records.push(enriched),
                Err(reason) => {
                    debug!(record_index = index, %reason, "Skipping record");
                    PipelineMetrics::record_rejected(reason);
                    result.reject(reason);
                }
            }
        }

        PipelineMetrics::record_run(
            result.processed_count,
            result.accepted_count(),
            started.elapsed().as_secs_f64(),
        );
        info!(
            "Total rows processed: {}. Rows cleaned: {}. Rows skipped: {}.",
            result.processed_count,
            result.accepted_count(),
            result.skipped_count
        );
        result
    }
}
