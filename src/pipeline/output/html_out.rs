use askama::Template;

use crate::error::Result;
use crate::types::EnrichedRecord;

/// Standalone page with one table row per record; cells are HTML-escaped
/// by the template.
#[derive(Template)]
#[template(path = "records.html")]
pub struct RecordsTemplate {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RecordsTemplate {
    pub fn from_records(records: &[EnrichedRecord], title: &str) -> Self {
        let columns = records
            .first()
            .map(EnrichedRecord::column_names)
            .unwrap_or_default();
        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|column| record.get(column).map(|v| v.to_cell()).unwrap_or_default())
                    .collect()
            })
            .collect();
        Self {
            title: title.to_string(),
            columns,
            rows,
        }
    }
}

pub fn to_html(records: &[EnrichedRecord], title: &str) -> Result<String> {
    Ok(RecordsTemplate::from_records(records, title).render()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::driver::Pipeline;
    use crate::types::RawRecord;

    #[test]
    fn test_table_has_header_and_escaped_cells() {
        let row = RawRecord::from_pairs([
            ("ORDERNUMBER", "10107"),
            ("QUANTITYORDERED", "5"),
            ("PRICEEACH", "10"),
            ("ORDERLINENUMBER", "1"),
            ("ORDERDATE", "2024-01-15"),
            ("CITY", "<Lyon & Co>"),
        ]);
        let result = Pipeline::default().run(vec![row]);
        let html = to_html(&result.accepted_records, "sales & orders").unwrap();

        assert!(html.contains("<title>sales &amp; orders</title>"));
        assert!(html.contains("<th>ORDERNUMBER</th>"));
        assert!(html.contains("<td>&lt;Lyon &amp; Co&gt;</td>"));
        assert!(!html.contains("<Lyon"));
        assert_eq!(html.matches("<tr>").count(), 2);
    }

    #[test]
    fn test_rows_follow_header_columns() {
        let template = RecordsTemplate::from_records(
            &Pipeline::default()
                .run(vec![RawRecord::from_pairs([
                    ("ORDERNUMBER", "1"),
                    ("QUANTITYORDERED", "2"),
                    ("PRICEEACH", "3"),
                    ("ORDERLINENUMBER", "1"),
                    ("ORDERDATE", "2024-01-15"),
                ])])
                .accepted_records,
            "one",
        );
        assert_eq!(template.rows.len(), 1);
        assert_eq!(template.rows[0].len(), template.columns.len());
        assert_eq!(template.rows[0][0], "1");
    }

    #[test]
    fn test_empty_table() {
        let html = to_html(&[], "empty").unwrap();
        assert!(html.contains("<table border=\"1\">"));
        assert!(!html.contains("<thead>"));
        assert!(!html.contains("<td>"));
    }
}
