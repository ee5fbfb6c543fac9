use crate::constants;
use crate::pipeline::processing::coerce::{is_digits, parse_date, parse_numeric};
use crate::types::{RawRecord, RejectionReason, ValidatedRecord};

/// Trait for turning raw records into validated ones
pub trait Validator {
    /// Coerce the required fields of a raw record, or report the first
    /// check that failed. Later checks are not evaluated.
    fn validate(&self, record: RawRecord) -> Result<ValidatedRecord, RejectionReason>;
}

/// Validator with the fixed check order: quantity, unit price, order date,
/// then the order/line identifiers.
#[derive(Debug, Clone, Default)]
pub struct DefaultValidator;

impl DefaultValidator {
    pub fn new() -> Self {
        Self
    }

    /// Trimmed, digits only, strictly positive, fits in a `u64`
    fn check_quantity(raw: &str) -> Result<u64, RejectionReason> {
        let raw = raw.trim();
        if !is_digits(raw) {
            return Err(RejectionReason::InvalidQuantity);
        }
        match raw.parse::<u64>() {
            Ok(quantity) if quantity > 0 => Ok(quantity),
            _ => Err(RejectionReason::InvalidQuantity),
        }
    }

    fn check_unit_price(raw: &str) -> Result<f64, RejectionReason> {
        match parse_numeric(raw) {
            Some(price) if price >= 0.0 => Ok(price),
            _ => Err(RejectionReason::InvalidPrice),
        }
    }

    /// Identifiers are checked as-is, surrounding whitespace included
    fn check_identifiers(order_number: &str, line_number: &str) -> Result<(), RejectionReason> {
        if is_digits(order_number) && is_digits(line_number) {
            Ok(())
        } else {
            Err(RejectionReason::InvalidIdentifier)
        }
    }
}

impl Validator for DefaultValidator {
    fn validate(&self, record: RawRecord) -> Result<ValidatedRecord, RejectionReason> {
        let quantity = Self::check_quantity(record.get(constants::QUANTITY_ORDERED))?;
        let unit_price = Self::check_unit_price(record.get(constants::PRICE_EACH))?;
        let order_date =
            parse_date(record.get(constants::ORDER_DATE)).ok_or(RejectionReason::InvalidDate)?;

        let order_number = record.get(constants::ORDER_NUMBER);
        let order_line_number = record.get(constants::ORDER_LINE_NUMBER);
        Self::check_identifiers(order_number, order_line_number)?;

        Ok(ValidatedRecord {
            quantity,
            unit_price,
            order_date,
            order_number: order_number.to_string(),
            order_line_number: order_line_number.to_string(),
            source: record,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn valid_row() -> RawRecord {
        RawRecord::from_pairs([
            ("ORDERNUMBER", "10107"),
            ("QUANTITYORDERED", "30"),
            ("PRICEEACH", "95.70"),
            ("ORDERLINENUMBER", "2"),
            ("ORDERDATE", "2/24/2003 0:00"),
        ])
    }

    fn with(field: &str, value: &str) -> RawRecord {
        let mut row = valid_row();
        row.insert(field, value);
        row
    }

    #[test]
    fn test_validator_coerces_required_fields() {
        let validated = DefaultValidator::new().validate(valid_row()).unwrap();
        assert_eq!(validated.quantity, 30);
        assert_eq!(validated.unit_price, 95.70);
        assert_eq!(validated.order_date, NaiveDate::from_ymd_opt(2003, 2, 24).unwrap());
        assert_eq!(validated.order_number, "10107");
        assert_eq!(validated.order_line_number, "2");
        assert_eq!(validated.source().get("PRICEEACH"), "95.70");
    }

    #[test]
    fn test_quantity_rules() {
        let v = DefaultValidator::new();
        for bad in ["0", "-1", "1.5", "", "abc", "+3", "99999999999999999999999"] {
            assert_eq!(
                v.validate(with("QUANTITYORDERED", bad)),
                Err(RejectionReason::InvalidQuantity),
                "quantity {bad:?} should reject"
            );
        }
        assert_eq!(v.validate(with("QUANTITYORDERED", " 7 ")).unwrap().quantity, 7);
    }

    #[test]
    fn test_price_rules() {
        let v = DefaultValidator::new();
        for bad in ["-0.01", "", "free", "nan"] {
            assert_eq!(
                v.validate(with("PRICEEACH", bad)),
                Err(RejectionReason::InvalidPrice),
                "price {bad:?} should reject"
            );
        }
        assert_eq!(v.validate(with("PRICEEACH", "0")).unwrap().unit_price, 0.0);
    }

    #[test]
    fn test_date_rule() {
        let v = DefaultValidator::new();
        assert_eq!(
            v.validate(with("ORDERDATE", "not a date")),
            Err(RejectionReason::InvalidDate)
        );
    }

    #[test]
    fn test_identifier_rules() {
        let v = DefaultValidator::new();
        assert_eq!(
            v.validate(with("ORDERNUMBER", "A-10107")),
            Err(RejectionReason::InvalidIdentifier)
        );
        assert_eq!(
            v.validate(with("ORDERLINENUMBER", "")),
            Err(RejectionReason::InvalidIdentifier)
        );
        assert_eq!(
            v.validate(with("ORDERNUMBER", " 10107")),
            Err(RejectionReason::InvalidIdentifier)
        );
    }

    #[test]
    fn test_first_failure_wins() {
        let mut row = with("QUANTITYORDERED", "0");
        row.insert("PRICEEACH", "-5");
        row.insert("ORDERDATE", "never");
        assert_eq!(
            DefaultValidator::new().validate(row),
            Err(RejectionReason::InvalidQuantity)
        );

        let mut row = with("PRICEEACH", "-5");
        row.insert("ORDERDATE", "never");
        assert_eq!(
            DefaultValidator::new().validate(row),
            Err(RejectionReason::InvalidPrice)
        );
    }

    #[test]
    fn test_missing_columns_reject() {
        assert_eq!(
            DefaultValidator::new().validate(RawRecord::new()),
            Err(RejectionReason::InvalidQuantity)
        );
    }
}
