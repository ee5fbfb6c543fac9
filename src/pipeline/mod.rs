// Cleaning pipeline: ingestion, per-record processing, and output

pub mod driver;
pub mod ingestion;
pub mod output;
pub mod processing;

// Re-export key types from each stage
pub use driver::{Pipeline, PipelineResult};
