use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::app::ports::{ObjectStorePort, ProcessingSummary, SummaryStorePort};
use crate::config::{Config, OutputConfig, OutputFormat};
use crate::error::{CleanerError, Result};
use crate::observability::metrics::PipelineMetrics;
use crate::pipeline::driver::{Pipeline, PipelineResult};
use crate::pipeline::ingestion::CsvSource;
use crate::pipeline::output::{describe, to_csv_bytes, to_html, to_json_bytes};

/// Object-created notification, in the S3 event layout
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TriggerEvent {
    #[serde(rename = "Records")]
    pub records: Vec<TriggerRecord>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TriggerRecord {
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct S3Entity {
    pub bucket: BucketRef,
    pub object: ObjectRef,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BucketRef {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObjectRef {
    pub key: String,
}

impl TriggerEvent {
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| CleanerError::MalformedEvent(e.to_string()))
    }

    /// Bucket and key of the first record; later records are ignored
    pub fn object_location(&self) -> Result<(&str, &str)> {
        let record = self
            .records
            .first()
            .ok_or_else(|| CleanerError::MalformedEvent("event has no records".to_string()))?;
        Ok((record.s3.bucket.name.as_str(), record.s3.object.key.as_str()))
    }
}

/// Status code and message returned to the trigger
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    pub status_code: u16,
    pub body: String,
}

impl HandlerResponse {
    pub fn new(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code,
            body: body.into(),
        }
    }
}

/// Result of cleaning one file
#[derive(Debug)]
pub struct CleanFileOutcome {
    pub result: PipelineResult,
    pub summary: ProcessingSummary,
}

/// Use case: read one CSV object, clean it, write the artifacts and a
/// summary row.
pub struct CleanFileUseCase {
    store: Arc<dyn ObjectStorePort>,
    summaries: Arc<dyn SummaryStorePort>,
    pipeline: Pipeline,
    csv_source: CsvSource,
    output: OutputConfig,
    output_bucket: String,
}

impl CleanFileUseCase {
    pub fn new(
        store: Arc<dyn ObjectStorePort>,
        summaries: Arc<dyn SummaryStorePort>,
        pipeline: Pipeline,
        output: OutputConfig,
        output_bucket: impl Into<String>,
    ) -> Self {
        Self {
            store,
            summaries,
            pipeline,
            csv_source: CsvSource::new(),
            output,
            output_bucket: output_bucket.into(),
        }
    }

    /// Wire the use case from configuration. Fails when no output bucket
    /// is configured.
    pub fn from_config(
        config: &Config,
        store: Arc<dyn ObjectStorePort>,
        summaries: Arc<dyn SummaryStorePort>,
    ) -> Result<Self> {
        let output_bucket = config.storage.output_bucket()?.to_string();
        Ok(Self::new(
            store,
            summaries,
            Pipeline::from_config(&config.pipeline),
            config.output.clone(),
            output_bucket,
        ))
    }

    /// Handle a raw trigger payload; every failure becomes a status code
    pub async fn handle(&self, event: serde_json::Value) -> HandlerResponse {
        let event = match TriggerEvent::from_value(event) {
            Ok(event) => event,
            Err(e) => return Self::failure_response(&e),
        };
        let (bucket, key) = match event.object_location() {
            Ok(location) => location,
            Err(e) => return Self::failure_response(&e),
        };

        match self.process(bucket, key).await {
            Ok(outcome) if outcome.summary.row_count > 0 => match outcome.summary.outputs.first() {
                Some(location) => HandlerResponse::new(
                    200,
                    format!("Successfully processed {}. Cleaned data at {}.", key, location),
                ),
                None => HandlerResponse::new(200, format!("Successfully processed {}.", key)),
            },
            Ok(_) => HandlerResponse::new(200, "Processed file, but no valid data found to save."),
            Err(e) => Self::failure_response(&e),
        }
    }

    fn failure_response(e: &CleanerError) -> HandlerResponse {
        let response = match e {
            CleanerError::NotFound { bucket, key } => {
                error!("Error: The object key '{}' does not exist in bucket '{}'.", key, bucket);
                HandlerResponse::new(404, "File not found.")
            }
            CleanerError::MalformedEvent(detail) => {
                error!("Error parsing trigger event structure: {}", detail);
                HandlerResponse::new(400, "Malformed S3 event trigger.")
            }
            other => {
                error!("An unexpected error occurred during execution: {}", other);
                HandlerResponse::new(500, format!("Error processing file: {}", other))
            }
        };
        PipelineMetrics::record_file_failed(response.status_code);
        response
    }

    /// Read, clean and persist one object
    #[instrument(skip(self), fields(output_bucket = %self.output_bucket))]
    pub async fn process(&self, bucket: &str, key: &str) -> Result<CleanFileOutcome> {
        info!("Processing file: {}/{}", bucket, key);
        let bytes = self.store.get(bucket, key).await?;
        self.process_bytes(bucket, key, &bytes).await
    }

    /// Clean bytes that were already read from `bucket/key`
    pub async fn process_bytes(
        &self,
        bucket: &str,
        key: &str,
        bytes: &[u8],
    ) -> Result<CleanFileOutcome> {
        let (records, encoding) = self.csv_source.read_bytes(bytes)?;
        let result = self.pipeline.run(records);

        let outputs = if result.accepted_records.is_empty() {
            warn!("No valid rows found after cleaning. No output file was generated.");
            Vec::new()
        } else {
            self.write_outputs(key, &result).await?
        };

        let summary = ProcessingSummary {
            run_id: Uuid::new_v4(),
            source_bucket: bucket.to_string(),
            source_key: key.to_string(),
            file_name: file_name(key).to_string(),
            row_count: result.accepted_count(),
            column_count: result.column_names().len(),
            processed_count: result.processed_count,
            skipped_count: result.skipped_count,
            rejection_reasons: result.rejection_reasons.clone(),
            source_encoding: encoding.as_str().to_string(),
            processed_at: Utc::now(),
            outputs,
        };
        self.summaries.put_summary(&summary).await?;
        PipelineMetrics::record_file_processed();

        Ok(CleanFileOutcome { result, summary })
    }

    async fn write_outputs(&self, key: &str, result: &PipelineResult) -> Result<Vec<String>> {
        let records = &result.accepted_records;
        let mut locations = Vec::new();

        for format in &self.output.formats {
            let (bytes, content_type) = match format {
                OutputFormat::Json => (to_json_bytes(records)?, "application/json"),
                OutputFormat::Csv => (to_csv_bytes(records)?, "text/csv"),
                OutputFormat::Html => (
                    to_html(records, file_name(key))?.into_bytes(),
                    "text/html; charset=utf-8",
                ),
            };
            let out_key = output_key(key, "", format.extension());
            let location = self
                .store
                .put(&self.output_bucket, &out_key, bytes, content_type)
                .await?;
            info!("Successfully wrote cleaned file to: {}", location);
            PipelineMetrics::record_artifact_written(format.extension());
            locations.push(location);
        }

        if !self.output.stats_columns.is_empty() {
            let report = describe(records, &self.output.stats_columns, self.output.histogram_bins);
            let out_key = output_key(key, "_stats", "json");
            let location = self
                .store
                .put(
                    &self.output_bucket,
                    &out_key,
                    serde_json::to_vec_pretty(&report)?,
                    "application/json",
                )
                .await?;
            info!("Wrote stats to: {}", location);
            PipelineMetrics::record_artifact_written("stats");
            locations.push(location);
        }

        Ok(locations)
    }
}

/// Last path segment of an object key
pub fn file_name(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// Replace the extension of the key's last segment: `in/a.csv` with
/// suffix `_stats` and extension `json` becomes `in/a_stats.json`.
pub fn output_key(key: &str, suffix: &str, extension: &str) -> String {
    let name = file_name(key);
    let prefix = &key[..key.len() - name.len()];
    let stem = match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    };
    format!("{}{}{}.{}", prefix, stem, suffix, extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_output_key() {
        assert_eq!(output_key("sales.csv", "", "json"), "sales.json");
        assert_eq!(output_key("in/2024/sales.csv", "", "html"), "in/2024/sales.html");
        assert_eq!(output_key("in/sales.data.csv", "_stats", "json"), "in/sales.data_stats.json");
        assert_eq!(output_key("noext", "", "json"), "noext.json");
        assert_eq!(output_key("dir.v2/.hidden", "", "json"), "dir.v2/.hidden.json");
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("a/b/c.csv"), "c.csv");
        assert_eq!(file_name("c.csv"), "c.csv");
    }

    #[test]
    fn test_trigger_event_location() {
        let event = TriggerEvent::from_value(json!({
            "Records": [{"s3": {"bucket": {"name": "raw"}, "object": {"key": "in/sales.csv"}}}]
        }))
        .unwrap();
        assert_eq!(event.object_location().unwrap(), ("raw", "in/sales.csv"));
    }

    #[test]
    fn test_malformed_trigger_events() {
        let missing_key = TriggerEvent::from_value(json!({"Records": [{"s3": {"bucket": {"name": "raw"}}}]}));
        assert!(matches!(missing_key, Err(CleanerError::MalformedEvent(_))));

        let empty = TriggerEvent::from_value(json!({"Records": []})).unwrap();
        assert!(matches!(empty.object_location(), Err(CleanerError::MalformedEvent(_))));
    }

    #[test]
    fn test_handler_response_wire_shape() {
        let value = serde_json::to_value(HandlerResponse::new(404, "File not found.")).unwrap();
        assert_eq!(value, json!({"statusCode": 404, "body": "File not found."}));
    }
}
