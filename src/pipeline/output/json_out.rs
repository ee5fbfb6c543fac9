use crate::error::Result;
use crate::types::EnrichedRecord;

/// Pretty-printed JSON array of records; non-ASCII text is written as-is
pub fn to_json_bytes(records: &[EnrichedRecord]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(records)?)
}
