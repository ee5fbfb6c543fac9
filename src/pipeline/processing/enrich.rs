use std::collections::HashMap;

use crate::config::PipelineConfig;
use crate::constants::{
    self, DEFAULT_CITY, DELIVERED, MISSPELLED_DELIVERED, TERRITORY_TABLE, UNKNOWN_STATUS,
    UNKNOWN_TERRITORY,
};
use crate::pipeline::processing::coerce::{
    parse_numeric, round2, sanitize_phone, sanitize_text, truncate_chars,
};
use crate::types::{EnrichedRecord, ValidatedRecord};

/// Trait for deriving output fields from a validated record.
/// Enrichment is total: every rule has a default, nothing is rejected here.
pub trait Enricher {
    fn enrich(&self, record: ValidatedRecord) -> EnrichedRecord;
}

/// Enricher for the sales-order layout
#[derive(Debug, Clone)]
pub struct DefaultEnricher {
    /// Max characters kept from PRODUCTCODE
    pub product_code_limit: usize,
    /// Max characters kept from PRODUCTLINE
    pub product_line_limit: usize,
    /// Largest accepted gap between SALES and quantity × price
    pub sales_tolerance: f64,
    /// Sanitized country name to region code
    pub territories: HashMap<String, String>,
}

impl Default for DefaultEnricher {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl DefaultEnricher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an enricher from pipeline settings; configured territories
    /// extend or override the built-in table.
    pub fn from_config(config: &PipelineConfig) -> Self {
        let mut territories: HashMap<String, String> = TERRITORY_TABLE
            .iter()
            .map(|(country, region)| (country.to_string(), region.to_string()))
            .collect();
        territories.extend(config.territories.clone());

        Self {
            product_code_limit: config.product_code_limit,
            product_line_limit: config.product_line_limit,
            sales_tolerance: config.sales_tolerance,
            territories,
        }
    }

    fn normalize_status(raw: &str) -> String {
        let status = raw.trim().to_uppercase();
        if status == MISSPELLED_DELIVERED {
            DELIVERED.to_string()
        } else if status.is_empty() {
            UNKNOWN_STATUS.to_string()
        } else {
            status
        }
    }

    /// Keep the reported figure unless it drifts from quantity × price by
    /// more than the tolerance; a missing figure counts as 0.
    fn reconcile_sales(&self, raw: &str, quantity: u64, unit_price: f64) -> f64 {
        let reported = parse_numeric(raw).unwrap_or(0.0);
        let calculated = quantity as f64 * unit_price;
        if (reported - calculated).abs() > self.sales_tolerance {
            round2(calculated)
        } else {
            reported
        }
    }

    fn lookup_territory(&self, raw_territory: &str, country: &str) -> String {
        if !raw_territory.is_empty() {
            return raw_territory.to_string();
        }
        self.territories
            .get(country)
            .cloned()
            .unwrap_or_else(|| UNKNOWN_TERRITORY.to_string())
    }

    fn normalize_city(raw: &str) -> String {
        let city = raw.trim();
        if city.is_empty() {
            DEFAULT_CITY.to_string()
        } else {
            city.to_string()
        }
    }
}

impl Enricher for DefaultEnricher {
    fn enrich(&self, record: ValidatedRecord) -> EnrichedRecord {
        let raw = &record.source;

        let sales = self.reconcile_sales(
            raw.get(constants::SALES),
            record.quantity,
            record.unit_price,
        );

        let msrp = parse_numeric(raw.get(constants::MSRP));
        let msrp_issue = msrp.map_or(false, |msrp| record.unit_price > msrp);

        let country = sanitize_text(raw.get(constants::COUNTRY));
        let territory = self.lookup_territory(raw.get(constants::TERRITORY), &country);

        EnrichedRecord {
            status: Self::normalize_status(raw.get(constants::STATUS)),
            sales,
            msrp,
            msrp_issue,
            territory,
            country,
            city: Self::normalize_city(raw.get(constants::CITY)),
            product_code: truncate_chars(raw.get(constants::PRODUCT_CODE), self.product_code_limit),
            product_line: truncate_chars(raw.get(constants::PRODUCT_LINE), self.product_line_limit),
            phone: sanitize_phone(raw.get(constants::PHONE)),
            contact_last_name: sanitize_text(raw.get(constants::CONTACT_LAST_NAME)),
            contact_first_name: sanitize_text(raw.get(constants::CONTACT_FIRST_NAME)),
            deal_size: sanitize_text(raw.get(constants::DEAL_SIZE)),
            order_number: record.order_number,
            quantity: record.quantity,
            unit_price: record.unit_price,
            order_line_number: record.order_line_number,
            order_date: record.order_date,
            source: record.source,
        }
    }
}
