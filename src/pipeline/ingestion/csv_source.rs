// Decode an uploaded CSV file into raw records

use std::borrow::Cow;

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::Result;
use crate::types::RawRecord;

const UTF8_BOM: char = '\u{feff}';

/// Text encoding a source file was read with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceEncoding {
    Utf8,
    /// Single-byte fallback; never fails, every byte maps to a character
    Latin1,
}

impl SourceEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceEncoding::Utf8 => "utf8",
            SourceEncoding::Latin1 => "latin1",
        }
    }
}

/// Decode as UTF-8, falling back to Latin-1 when the bytes are not valid
/// UTF-8. A leading byte-order mark is dropped.
pub fn decode_bytes(bytes: &[u8]) -> (Cow<'_, str>, SourceEncoding) {
    match std::str::from_utf8(bytes) {
        Ok(text) => (
            Cow::Borrowed(text.strip_prefix(UTF8_BOM).unwrap_or(text)),
            SourceEncoding::Utf8,
        ),
        Err(e) => {
            warn!(
                "Source is not valid UTF-8 (at byte {}), decoding as Latin-1",
                e.valid_up_to()
            );
            let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            (text, SourceEncoding::Latin1)
        }
    }
}

/// CSV reader producing one `RawRecord` per data line
#[derive(Debug, Clone)]
pub struct CsvSource {
    /// Delimiter character (default: comma)
    delimiter: u8,
}

impl Default for CsvSource {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Decode and parse a whole file
    pub fn read_bytes(&self, bytes: &[u8]) -> Result<(Vec<RawRecord>, SourceEncoding)> {
        let (text, encoding) = decode_bytes(bytes);
        let records = self.read_str(&text)?;
        Ok((records, encoding))
    }

    /// Parse CSV text. The first line is the header; short rows are padded
    /// with empty cells and cells beyond the header are dropped. Cell text
    /// is kept verbatim (no trimming).
    pub fn read_str(&self, content: &str) -> Result<Vec<RawRecord>> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .trim(Trim::None)
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers = reader.headers()?.clone();
        debug!("CSV header has {} columns", headers.len());

        let mut records = Vec::new();
        for result in reader.records() {
            let row = result?;
            records.push(Self::to_raw_record(&headers, &row));
        }
        Ok(records)
    }

    fn to_raw_record(headers: &StringRecord, row: &StringRecord) -> RawRecord {
        RawRecord::from_pairs(
            headers
                .iter()
                .enumerate()
                .map(|(idx, name)| (name, row.get(idx).unwrap_or(""))),
        )
    }
}
