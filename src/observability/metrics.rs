//! Metrics for the cleaning pipeline
//!
//! Recording goes through the `metrics` facade; without an installed
//! recorder every call is a no-op, so the core can record unconditionally.

use std::fmt;
use std::net::SocketAddr;
use std::sync::{Once, OnceLock};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::{info, warn};

use crate::types::RejectionReason;

static INIT: Once = Once::new();
static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub const METRICS_ADDR_ENV: &str = "SALES_CLEANER_METRICS_ADDR";

/// Every metric name the crate emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    RecordsProcessed,
    RecordsAccepted,
    RecordsRejected,
    PipelineDuration,
    FilesProcessed,
    FilesFailed,
    ArtifactsWritten,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::RecordsProcessed => "sales_cleaner_records_processed_total",
            MetricName::RecordsAccepted => "sales_cleaner_records_accepted_total",
            MetricName::RecordsRejected => "sales_cleaner_records_rejected_total",
            MetricName::PipelineDuration => "sales_cleaner_pipeline_duration_seconds",
            MetricName::FilesProcessed => "sales_cleaner_files_processed_total",
            MetricName::FilesFailed => "sales_cleaner_files_failed_total",
            MetricName::ArtifactsWritten => "sales_cleaner_artifacts_written_total",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Install the Prometheus recorder once. An HTTP listener is started only
/// when `SALES_CLEANER_METRICS_ADDR` is set; it needs a running tokio runtime.
pub fn init_metrics() {
    INIT.call_once(|| {
        let listen_addr = std::env::var(METRICS_ADDR_ENV)
            .ok()
            .and_then(|addr| match addr.parse::<SocketAddr>() {
                Ok(addr) => Some(addr),
                Err(e) => {
                    warn!("Ignoring invalid {}='{}': {}", METRICS_ADDR_ENV, addr, e);
                    None
                }
            });

        match listen_addr {
            Some(addr) => match PrometheusBuilder::new().with_http_listener(addr).install() {
                Ok(()) => info!("Prometheus exporter listening at http://{}/metrics", addr),
                Err(e) => warn!("Failed to start Prometheus exporter: {}", e),
            },
            None => match PrometheusBuilder::new().install_recorder() {
                Ok(handle) => {
                    let _ = HANDLE.set(handle);
                    info!("Prometheus recorder installed");
                }
                Err(e) => warn!("Failed to install Prometheus recorder: {}", e),
            },
        }
    });
}

/// Render the in-process snapshot, if a recorder without listener is installed
pub fn render() -> Option<String> {
    HANDLE.get().map(|h| h.render())
}

/// Metrics emitted by the pipeline driver and the file handler
pub struct PipelineMetrics;

impl PipelineMetrics {
    pub fn record_rejected(reason: RejectionReason) {
        ::metrics::counter!(MetricName::RecordsRejected.as_str(), "reason" => reason.as_str())
            .increment(1);
    }

    pub fn record_run(processed: usize, accepted: usize, duration_secs: f64) {
        ::metrics::counter!(MetricName::RecordsProcessed.as_str()).increment(processed as u64);
        ::metrics::counter!(MetricName::RecordsAccepted.as_str()).increment(accepted as u64);
        ::metrics::histogram!(MetricName::PipelineDuration.as_str()).record(duration_secs);
    }

    pub fn record_file_processed() {
        ::metrics::counter!(MetricName::FilesProcessed.as_str()).increment(1);
    }

    pub fn record_file_failed(status_code: u16) {
        ::metrics::counter!(MetricName::FilesFailed.as_str(), "status" => status_code.to_string())
            .increment(1);
    }

    pub fn record_artifact_written(kind: &'static str) {
        ::metrics::counter!(MetricName::ArtifactsWritten.as_str(), "kind" => kind).increment(1);
    }
}
