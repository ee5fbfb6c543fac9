use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};

use sales_cleaner::app::{CleanFileUseCase, ObjectStorePort, SummaryStorePort};
use sales_cleaner::config::{Config, OutputConfig, OutputFormat};
use sales_cleaner::infra::{FsObjectStore, SqliteSummaryStore};
use sales_cleaner::pipeline::Pipeline;
use sales_cleaner::types::RejectionReason;

const SALES_CSV: &str = "\
ORDERNUMBER,QUANTITYORDERED,PRICEEACH,ORDERLINENUMBER,SALES,ORDERDATE,STATUS,MSRP,PRODUCTLINE,PRODUCTCODE,PHONE,CITY,COUNTRY,TERRITORY,CONTACTLASTNAME,CONTACTFIRSTNAME,DEALSIZE
10100,5,10.0,1,49,2024-01-15,DLEIVERED,12,Classic Cars,S10_1678,555-0100-99,NYC,USA,,Young,Kwai,Small
10101,0,10.0,1,0,2024-01-15,Shipped,12,Classic Cars,S10_1678,,NYC,USA,,Young,Kwai,Small
10102,2,25.5,3,51,01/20/2024,Shipped,20,Planes,S18_2248,,Lyon,France,,Roux,Ana,Medium
10102,2,25.5,3,51,01/20/2024,Shipped,20,Planes,S18_2248,,Lyon,France,,Roux,Ana,Medium
";

struct Harness {
    _dir: TempDir,
    root: std::path::PathBuf,
    summaries: Arc<SqliteSummaryStore>,
    use_case: CleanFileUseCase,
}

fn harness(output: OutputConfig) -> Result<Harness> {
    let dir = tempdir()?;
    let root = dir.path().to_path_buf();
    let store: Arc<dyn ObjectStorePort> = Arc::new(FsObjectStore::new(&root));
    let summaries = Arc::new(SqliteSummaryStore::in_memory()?);
    let use_case = CleanFileUseCase::new(
        store,
        summaries.clone(),
        Pipeline::default(),
        output,
        "cleaned",
    );
    Ok(Harness {
        _dir: dir,
        root,
        summaries,
        use_case,
    })
}

fn put_source(root: &Path, key: &str, content: &[u8]) -> Result<()> {
    let path = root.join("raw").join(key);
    fs::create_dir_all(path.parent().unwrap())?;
    fs::write(path, content)?;
    Ok(())
}

fn event(bucket: &str, key: &str) -> Value {
    json!({
        "Records": [{
            "s3": {
                "bucket": {"name": bucket},
                "object": {"key": key}
            }
        }]
    })
}

#[tokio::test]
async fn test_handle_writes_all_artifacts_and_summary() -> Result<()> {
    let h = harness(OutputConfig::default())?;
    put_source(&h.root, "in/sales.csv", SALES_CSV.as_bytes())?;

    let response = h.use_case.handle(event("raw", "in/sales.csv")).await;
    assert_eq!(response.status_code, 200);
    assert!(response.body.contains("in/sales.json"));
    assert!(response.body.starts_with("Successfully processed in/sales.csv."));

    let out = h.root.join("cleaned").join("in");
    let records: Vec<Value> = serde_json::from_slice(&fs::read(out.join("sales.json"))?)?;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["SALES"], json!(50.0));
    assert_eq!(records[0]["STATUS"], json!("DELIVERED"));
    assert_eq!(records[0]["QUANTITYORDERED"], json!(5));
    assert_eq!(records[0]["MSRP_ISSUE"], json!(false));
    assert_eq!(records[0]["TERRITORY"], json!("NA"));
    assert_eq!(records[1]["ORDERDATE"], json!("2024-01-20"));
    assert_eq!(records[1]["TERRITORY"], json!("EMEA"));

    let csv_out = fs::read_to_string(out.join("sales.csv"))?;
    let mut lines = csv_out.lines();
    assert!(lines.next().unwrap().starts_with("ORDERNUMBER,QUANTITYORDERED,PRICEEACH"));
    assert_eq!(lines.count(), 2);

    let html = fs::read_to_string(out.join("sales.html"))?;
    assert!(html.contains("<th>MSRP_ISSUE</th>"));

    let stats: Value = serde_json::from_slice(&fs::read(out.join("sales_stats.json"))?)?;
    assert_eq!(stats["record_count"], json!(2));
    assert_eq!(stats["columns"][0]["column"], json!("SALES"));

    let summaries = h.summaries.list_summaries(10).await?;
    assert_eq!(summaries.len(), 1);
    let summary = &summaries[0];
    assert_eq!(summary.source_bucket, "raw");
    assert_eq!(summary.file_name, "sales.csv");
    assert_eq!(summary.row_count, 2);
    assert_eq!(summary.processed_count, 4);
    assert_eq!(summary.skipped_count, 2);
    assert_eq!(summary.rejection_reasons[&RejectionReason::InvalidQuantity], 1);
    assert_eq!(summary.rejection_reasons[&RejectionReason::DuplicateRecord], 1);
    assert_eq!(summary.outputs.len(), 4);
    assert_eq!(summary.source_encoding, "utf8");
    Ok(())
}

#[tokio::test]
async fn test_missing_object_returns_404() -> Result<()> {
    let h = harness(OutputConfig::default())?;

    let response = h.use_case.handle(event("raw", "nope.csv")).await;
    assert_eq!(response.status_code, 404);
    assert_eq!(response.body, "File not found.");
    assert!(h.summaries.list_summaries(10).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_malformed_event_returns_400() -> Result<()> {
    let h = harness(OutputConfig::default())?;

    let response = h.use_case.handle(json!({"detail": "not an s3 event"})).await;
    assert_eq!(response.status_code, 400);

    let response = h.use_case.handle(json!({"Records": []})).await;
    assert_eq!(response.status_code, 400);
    Ok(())
}

#[tokio::test]
async fn test_unwritable_output_returns_500() -> Result<()> {
    let h = harness(OutputConfig::default())?;
    put_source(&h.root, "sales.csv", SALES_CSV.as_bytes())?;
    // A plain file where the output bucket directory should be
    fs::write(h.root.join("cleaned"), b"")?;

    let response = h.use_case.handle(event("raw", "sales.csv")).await;
    assert_eq!(response.status_code, 500);
    assert!(response.body.starts_with("Error processing file:"));
    assert!(h.summaries.list_summaries(10).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_no_valid_rows_returns_200_without_outputs() -> Result<()> {
    let h = harness(OutputConfig::default())?;
    put_source(
        &h.root,
        "empty.csv",
        b"ORDERNUMBER,QUANTITYORDERED,PRICEEACH,ORDERLINENUMBER,ORDERDATE\n1,0,1,1,2024-01-01\n",
    )?;

    let response = h.use_case.handle(event("raw", "empty.csv")).await;
    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, "Processed file, but no valid data found to save.");
    assert!(!h.root.join("cleaned").exists());

    let summaries = h.summaries.list_summaries(10).await?;
    assert_eq!(summaries[0].row_count, 0);
    assert!(summaries[0].outputs.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_output_formats_follow_config() -> Result<()> {
    let output = OutputConfig {
        formats: vec![OutputFormat::Csv],
        stats_columns: Vec::new(),
        ..OutputConfig::default()
    };
    let h = harness(output)?;
    put_source(&h.root, "sales.csv", SALES_CSV.as_bytes())?;

    let response = h.use_case.handle(event("raw", "sales.csv")).await;
    assert_eq!(response.status_code, 200);
    assert!(response.body.ends_with("cleaned/sales.csv."));
    assert!(!response.body.contains(".json"));

    let outcome = h.use_case.process("raw", "sales.csv").await?;
    assert_eq!(outcome.result.accepted_count(), 2);

    let out = h.root.join("cleaned");
    assert!(out.join("sales.csv").exists());
    assert!(!out.join("sales.json").exists());
    assert!(!out.join("sales_stats.json").exists());
    assert_eq!(outcome.summary.outputs.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_from_config_requires_output_bucket() -> Result<()> {
    let dir = tempdir()?;
    let store: Arc<dyn ObjectStorePort> = Arc::new(FsObjectStore::new(dir.path()));
    let summaries: Arc<dyn SummaryStorePort> = Arc::new(SqliteSummaryStore::in_memory()?);

    let mut config = Config::default();
    assert!(CleanFileUseCase::from_config(&config, store.clone(), summaries.clone()).is_err());

    config.storage.output_bucket = Some("cleaned".to_string());
    assert!(CleanFileUseCase::from_config(&config, store, summaries).is_ok());
    Ok(())
}
