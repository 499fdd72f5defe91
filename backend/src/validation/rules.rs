//! Conversion rules for raw form values.

use chrono::NaiveDate;
use validator::ValidationError;

/// Date format used by the request form's date inputs.
pub const FORM_DATE_FORMAT: &str = "%Y-%m-%d";

/// Trims a text field and treats an empty value as absent.
pub fn normalize_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses a required date-only field, returning a `field: code` message on failure.
pub fn parse_form_date(field: &str, value: Option<&str>) -> Result<NaiveDate, String> {
    let value = value.ok_or_else(|| format!("{}: required", field))?;
    NaiveDate::parse_from_str(value.trim(), FORM_DATE_FORMAT)
        .map_err(|_| format!("{}: invalid_date", field))
}

/// Purchase quantity; anything that is not a positive integer becomes 1.
pub fn parse_quantity(value: Option<&str>) -> i64 {
    value
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|quantity| *quantity >= 1)
        .unwrap_or(1)
}

/// Estimated cost; anything that is not a finite non-negative number becomes 0.
pub fn parse_estimated_cost(value: Option<&str>) -> f64 {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|cost| cost.is_finite() && *cost >= 0.0)
        .unwrap_or(0.0)
}

/// Validates that a leave window does not end before it starts.
pub fn validate_leave_window(start: NaiveDate, end: NaiveDate) -> Result<(), ValidationError> {
    if end < start {
        return Err(ValidationError::new("before_start_date"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_drops_blank_values() {
        assert_eq!(normalize_text(Some("  IT ".into())), Some("IT".into()));
        assert_eq!(normalize_text(Some("   ".into())), None);
        assert_eq!(normalize_text(None), None);
    }

    #[test]
    fn parse_form_date_reports_field_and_reason() {
        assert_eq!(
            parse_form_date("leave_start_date", Some("2025-04-30")),
            Ok(NaiveDate::from_ymd_opt(2025, 4, 30).unwrap())
        );
        assert_eq!(
            parse_form_date("leave_start_date", Some("2025-02-30")),
            Err("leave_start_date: invalid_date".to_string())
        );
        assert_eq!(
            parse_form_date("leave_end_date", None),
            Err("leave_end_date: required".to_string())
        );
    }

    #[test]
    fn quantity_defaults_to_one() {
        assert_eq!(parse_quantity(Some("4")), 4);
        assert_eq!(parse_quantity(Some("abc")), 1);
        assert_eq!(parse_quantity(Some("0")), 1);
        assert_eq!(parse_quantity(Some("-2")), 1);
        assert_eq!(parse_quantity(Some("2.5")), 1);
        assert_eq!(parse_quantity(None), 1);
    }

    #[test]
    fn estimated_cost_defaults_to_zero() {
        assert_eq!(parse_estimated_cost(Some("5999.00")), 5999.0);
        assert_eq!(parse_estimated_cost(Some("12")), 12.0);
        assert_eq!(parse_estimated_cost(Some("abc")), 0.0);
        assert_eq!(parse_estimated_cost(Some("-5")), 0.0);
        assert_eq!(parse_estimated_cost(Some("NaN")), 0.0);
        assert_eq!(parse_estimated_cost(Some("inf")), 0.0);
        assert_eq!(parse_estimated_cost(None), 0.0);
    }

    #[test]
    fn leave_window_rejects_reversed_dates() {
        let start = NaiveDate::from_ymd_opt(2025, 5, 10).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 5, 9).unwrap();
        let err = validate_leave_window(start, end).unwrap_err();
        assert_eq!(err.code, "before_start_date");
        assert!(validate_leave_window(start, start).is_ok());
    }
}
