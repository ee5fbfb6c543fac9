// Ingestion: turning source bytes into raw records

pub mod csv_source;

pub use csv_source::{decode_bytes, CsvSource, SourceEncoding};
