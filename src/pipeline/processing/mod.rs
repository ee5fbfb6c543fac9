// Record processing: coercion, validation, enrichment, deduplication

pub mod coerce;
pub mod dedup;
pub mod enrich;
pub mod validate;

pub use dedup::{DedupPolicy, Deduplicator, Fingerprint};
pub use enrich::{DefaultEnricher, Enricher};
pub use validate::{DefaultValidator, Validator};
