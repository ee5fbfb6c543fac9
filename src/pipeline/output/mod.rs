// Output: serializers and statistics for accepted records

pub mod csv_out;
pub mod html_out;
pub mod json_out;
pub mod stats;

pub use csv_out::to_csv_bytes;
pub use html_out::to_html;
pub use json_out::to_json_bytes;
pub use stats::{describe, StatsReport};
