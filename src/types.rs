use chrono::NaiveDate;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::constants::{self, MANAGED_COLUMNS, OUTPUT_DATE_FORMAT};

/// One decoded CSV data line: column name to raw cell text, in header order.
///
/// Missing cells read as the empty string; no other invariant holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    fields: Vec<(String, String)>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from `(column, value)` pairs. A repeated column keeps
    /// its first position and its last value.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut record = Self::new();
        for (name, value) in pairs {
            record.insert(name, value);
        }
        record
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Raw cell text, or `""` when the column is absent
    pub fn get(&self, name: &str) -> &str {
        self.get_opt(name).unwrap_or("")
    }

    pub fn get_opt(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get_opt(name).is_some()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A typed output cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(u64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Stable text form used for CSV/HTML cells and fingerprints.
    /// Floats keep their fractional part (`50.0`, not `50`).
    pub fn to_cell(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Integer(i) => i.to_string(),
            FieldValue::Float(f) => format!("{:?}", f),
            FieldValue::Text(s) => s.clone(),
        }
    }

    fn kind_tag(&self) -> &'static str {
        match self {
            FieldValue::Null => "n",
            FieldValue::Bool(_) => "b",
            FieldValue::Integer(_) => "i",
            FieldValue::Float(_) => "f",
            FieldValue::Text(_) => "s",
        }
    }

    /// Type-tagged text form, so `Text("5")` and `Integer(5)` never collide
    pub fn canonical(&self) -> String {
        format!("{}:{}", self.kind_tag(), self.to_cell())
    }
}

/// Why a record was discarded. Every variant is recovered locally: the run
/// counts it and moves on to the next record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RejectionReason {
    InvalidQuantity,
    InvalidPrice,
    InvalidDate,
    InvalidIdentifier,
    DuplicateRecord,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::InvalidQuantity => "invalid-quantity",
            RejectionReason::InvalidPrice => "invalid-price",
            RejectionReason::InvalidDate => "invalid-date",
            RejectionReason::InvalidIdentifier => "invalid-identifier",
            RejectionReason::DuplicateRecord => "duplicate-record",
        }
    }
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw record whose required fields all coerced successfully.
///
/// Only the row validator can build one, so a rejected row can never reach
/// the enricher.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRecord {
    pub quantity: u64,
    pub unit_price: f64,
    pub order_date: NaiveDate,
    pub order_number: String,
    pub order_line_number: String,
    pub(crate) source: RawRecord,
}

impl ValidatedRecord {
    /// The untouched raw record the typed fields were coerced from
    pub fn source(&self) -> &RawRecord {
        &self.source
    }
}

/// A validated record with every derived field filled in
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    pub order_number: String,
    pub quantity: u64,
    pub unit_price: f64,
    pub order_line_number: String,
    pub sales: f64,
    pub order_date: NaiveDate,
    pub status: String,
    pub msrp: Option<f64>,
    pub msrp_issue: bool,
    pub product_line: String,
    pub product_code: String,
    pub phone: Option<String>,
    pub city: String,
    pub country: String,
    pub territory: String,
    pub contact_last_name: String,
    pub contact_first_name: String,
    pub deal_size: String,
    pub(crate) source: RawRecord,
}

impl EnrichedRecord {
    /// Value of a column this crate writes, `None` for passthrough columns
    pub fn managed_value(&self, column: &str) -> Option<FieldValue> {
        let text = |s: &str| FieldValue::Text(s.to_string());
        let value = match column {
            constants::ORDER_NUMBER => text(&self.order_number),
            constants::QUANTITY_ORDERED => FieldValue::Integer(self.quantity),
            constants::PRICE_EACH => FieldValue::Float(self.unit_price),
            constants::ORDER_LINE_NUMBER => text(&self.order_line_number),
            constants::SALES => FieldValue::Float(self.sales),
            constants::ORDER_DATE => {
                FieldValue::Text(self.order_date.format(OUTPUT_DATE_FORMAT).to_string())
            }
            constants::STATUS => text(&self.status),
            constants::MSRP => self.msrp.map_or(FieldValue::Null, FieldValue::Float),
            constants::MSRP_ISSUE => FieldValue::Bool(self.msrp_issue),
            constants::PRODUCT_LINE => text(&self.product_line),
            constants::PRODUCT_CODE => text(&self.product_code),
            constants::PHONE => self
                .phone
                .as_deref()
                .map_or(FieldValue::Null, text),
            constants::CITY => text(&self.city),
            constants::COUNTRY => text(&self.country),
            constants::TERRITORY => text(&self.territory),
            constants::CONTACT_LAST_NAME => text(&self.contact_last_name),
            constants::CONTACT_FIRST_NAME => text(&self.contact_first_name),
            constants::DEAL_SIZE => text(&self.deal_size),
            _ => return None,
        };
        Some(value)
    }

    /// The full output row: source header order first, then any managed
    /// column the header did not declare, in `MANAGED_COLUMNS` order.
    pub fn to_row(&self) -> Vec<(String, FieldValue)> {
        let mut row: Vec<(String, FieldValue)> = self
            .source
            .iter()
            .map(|(name, raw)| {
                let value = self
                    .managed_value(name)
                    .unwrap_or_else(|| FieldValue::Text(raw.to_string()));
                (name.to_string(), value)
            })
            .collect();

        for column in MANAGED_COLUMNS {
            if !self.source.contains(column) {
                if let Some(value) = self.managed_value(column) {
                    row.push((column.to_string(), value));
                }
            }
        }
        row
    }

    /// Output column names, in `to_row` order
    pub fn column_names(&self) -> Vec<String> {
        self.to_row().into_iter().map(|(name, _)| name).collect()
    }

    pub fn get(&self, column: &str) -> Option<FieldValue> {
        self.managed_value(column).or_else(|| {
            self.source
                .get_opt(column)
                .map(|raw| FieldValue::Text(raw.to_string()))
        })
    }
}

impl Serialize for EnrichedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let row = self.to_row();
        let mut map = serializer.serialize_map(Some(row.len()))?;
        for (name, value) in &row {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
