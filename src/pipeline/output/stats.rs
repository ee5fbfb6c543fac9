//! Column statistics and histogram data over accepted records.
//!
//! Only count/min/max/mean/stddev are computed; anything fancier belongs to
//! whatever consumes the stats artifact.

use serde::Serialize;

use crate::types::EnrichedRecord;

/// Summary statistics for one numeric column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStats {
    pub column: String,
    /// Records with a numeric value in this column
    pub count: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    /// Population standard deviation
    pub std_dev: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Equal-width histogram, ready to plot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub column: String,
    pub bins: Vec<HistogramBin>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReport {
    pub record_count: usize,
    pub columns: Vec<ColumnStats>,
    pub histograms: Vec<Histogram>,
}

/// Numeric values of `column`; nulls and text cells are skipped
pub fn numeric_values(records: &[EnrichedRecord], column: &str) -> Vec<f64> {
    records
        .iter()
        .filter_map(|r| r.get(column).and_then(|v| v.as_f64()))
        .collect()
}

pub fn describe_values(column: &str, values: &[f64]) -> ColumnStats {
    if values.is_empty() {
        return ColumnStats {
            column: column.to_string(),
            count: 0,
            min: None,
            max: None,
            mean: None,
            std_dev: None,
        };
    }

    let n = values.len() as f64;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    ColumnStats {
        column: column.to_string(),
        count: values.len(),
        min: Some(min),
        max: Some(max),
        mean: Some(mean),
        std_dev: Some(variance.sqrt()),
    }
}

/// Split `[min, max]` into `bins` equal buckets; the last bucket includes
/// `max`. A constant column collapses into one bucket.
pub fn histogram(column: &str, values: &[f64], bins: usize) -> Histogram {
    let mut histogram = Histogram {
        column: column.to_string(),
        bins: Vec::new(),
    };
    if values.is_empty() || bins == 0 {
        return histogram;
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max <= min {
        histogram.bins.push(HistogramBin {
            lower: min,
            upper: max,
            count: values.len(),
        });
        return histogram;
    }

    let width = (max - min) / bins as f64;
    histogram.bins = (0..bins)
        .map(|i| HistogramBin {
            lower: min + width * i as f64,
            upper: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();

    for value in values {
        let idx = (((value - min) / width).floor() as usize).min(bins - 1);
        histogram.bins[idx].count += 1;
    }
    histogram
}

pub fn describe(records: &[EnrichedRecord], columns: &[String], bins: usize) -> StatsReport {
    let mut report = StatsReport {
        record_count: records.len(),
        columns: Vec::with_capacity(columns.len()),
        histograms: Vec::with_capacity(columns.len()),
    };
    for column in columns {
        let values = numeric_values(records, column);
        report.columns.push(describe_values(column, &values));
        report.histograms.push(histogram(column, &values, bins));
    }
    report
}
