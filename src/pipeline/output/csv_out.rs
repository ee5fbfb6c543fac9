use csv::WriterBuilder;

use crate::error::{CleanerError, Result};
use crate::types::EnrichedRecord;

/// CSV with a header row. Column order comes from the first record; every
/// record of a run shares it.
pub fn to_csv_bytes(records: &[EnrichedRecord]) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());

    if let Some(first) = records.first() {
        let columns = first.column_names();
        writer.write_record(&columns)?;
        for record in records {
            let cells: Vec<String> = columns
                .iter()
                .map(|column| record.get(column).map(|v| v.to_cell()).unwrap_or_default())
                .collect();
            writer.write_record(&cells)?;
        }
    }

    writer
        .into_inner()
        .map_err(|e| CleanerError::Io(e.into_error()))
}
