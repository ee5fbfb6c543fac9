/// Column name constants for the sales-order CSV layout.
/// These match the header of the classic sales sample export and are used
/// as the output keys as well.

pub const ORDER_NUMBER: &str = "ORDERNUMBER";
pub const QUANTITY_ORDERED: &str = "QUANTITYORDERED";
pub const PRICE_EACH: &str = "PRICEEACH";
pub const ORDER_LINE_NUMBER: &str = "ORDERLINENUMBER";
pub const SALES: &str = "SALES";
pub const ORDER_DATE: &str = "ORDERDATE";
pub const STATUS: &str = "STATUS";
pub const MSRP: &str = "MSRP";
pub const PRODUCT_LINE: &str = "PRODUCTLINE";
pub const PRODUCT_CODE: &str = "PRODUCTCODE";
pub const PHONE: &str = "PHONE";
pub const CITY: &str = "CITY";
pub const COUNTRY: &str = "COUNTRY";
pub const TERRITORY: &str = "TERRITORY";
pub const CONTACT_LAST_NAME: &str = "CONTACTLASTNAME";
pub const CONTACT_FIRST_NAME: &str = "CONTACTFIRSTNAME";
pub const DEAL_SIZE: &str = "DEALSIZE";

// Added by the enricher, never present in the source header
pub const MSRP_ISSUE: &str = "MSRP_ISSUE";

/// Every column the validator or enricher writes, in the order they are
/// appended to an output row when the source header did not declare them.
pub const MANAGED_COLUMNS: &[&str] = &[
    ORDER_NUMBER,
    QUANTITY_ORDERED,
    PRICE_EACH,
    ORDER_LINE_NUMBER,
    SALES,
    ORDER_DATE,
    STATUS,
    MSRP,
    MSRP_ISSUE,
    PRODUCT_LINE,
    PRODUCT_CODE,
    PHONE,
    CITY,
    COUNTRY,
    TERRITORY,
    CONTACT_LAST_NAME,
    CONTACT_FIRST_NAME,
    DEAL_SIZE,
];

/// Accepted order-date layouts, tried in order. Day/month ambiguity in the
/// slash forms is settled by this order, not by locale.
pub const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %I:%M %p",
];

/// Normalized output layout for order dates
pub const OUTPUT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Sanitized country name to sales region
pub const TERRITORY_TABLE: &[(&str, &str)] = &[
    ("USA", "NA"),
    ("France", "EMEA"),
    ("Australia", "APAC"),
    ("Japan", "APAC"),
    ("Germany", "EMEA"),
    ("UK", "EMEA"),
    ("Spain", "EMEA"),
];

pub const UNKNOWN_TERRITORY: &str = "UNKNOWN";
pub const UNKNOWN_STATUS: &str = "UNKNOWN";
pub const DEFAULT_CITY: &str = "SIN CIUDAD";

// Single-character transposition seen in exports, and its correction
pub const MISSPELLED_DELIVERED: &str = "DLEIVERED";
pub const DELIVERED: &str = "DELIVERED";

pub const DEFAULT_PRODUCT_CODE_LIMIT: usize = 15;
pub const DEFAULT_PRODUCT_LINE_LIMIT: usize = 60;
pub const DEFAULT_SALES_TOLERANCE: f64 = 0.1;
pub const MIN_PHONE_DIGITS: usize = 7;

pub const DEFAULT_HISTOGRAM_BINS: usize = 10;

/// Numeric columns described in the stats artifact by default
pub fn default_stats_columns() -> Vec<String> {
    [SALES, QUANTITY_ORDERED, PRICE_EACH, MSRP]
        .iter()
        .map(|c| c.to_string())
        .collect()
}
