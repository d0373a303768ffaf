use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;

// Compiled regexes for user-entered values
static DATE_FILTER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").expect("valid date regex"));
static QUANTITY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?(\d+)$").expect("valid quantity regex"));

/// Date parsing error types for the day filter input
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateParseError {
    #[error("Date cannot be empty")]
    EmptyInput,
    #[error("Invalid date format. Use YYYY-MM-DD")]
    InvalidFormat,
    #[error("No such calendar day: {0}")]
    NoSuchDay(String),
}

/// Parse a `YYYY-MM-DD` day filter.
///
/// # Examples
/// ```
/// use backoffice_dashboard::utils::parse_day_filter;
/// use chrono::NaiveDate;
/// assert_eq!(parse_day_filter("2024-05-03"), Ok(NaiveDate::from_ymd_opt(2024, 5, 3).unwrap()));
/// assert!(parse_day_filter("05/03/2024").is_err());
/// ```
pub fn parse_day_filter(input: &str) -> Result<NaiveDate, DateParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DateParseError::EmptyInput);
    }
    let captures = DATE_FILTER_REGEX
        .captures(trimmed)
        .ok_or(DateParseError::InvalidFormat)?;
    let year: i32 = captures[1].parse().map_err(|_| DateParseError::InvalidFormat)?;
    let month: u32 = captures[2].parse().map_err(|_| DateParseError::InvalidFormat)?;
    let day: u32 = captures[3].parse().map_err(|_| DateParseError::InvalidFormat)?;
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| DateParseError::NoSuchDay(trimmed.to_string()))
}

/// Three-letter weekday used for chart labels.
pub fn weekday_label(day: NaiveDate) -> &'static str {
    match day.weekday() {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

/// Peso amount with two decimals, e.g. `₱1234.50`.
pub fn format_peso(amount: f64) -> String {
    let amount = if amount.is_finite() { amount } else { 0.0 };
    format!("₱{:.2}", amount)
}

/// Order date as `MM/DD/YYYY` in UTC, or "Invalid Date".
pub fn format_order_date(created_at: Option<DateTime<FixedOffset>>) -> String {
    match created_at {
        Some(ts) => ts.naive_utc().format("%m/%d/%Y").to_string(),
        None => "Invalid Date".to_string(),
    }
}

/// Generic numeric input validation
pub fn validate_numeric_input<T>(
    input: &str,
    min: Option<T>,
    max: Option<T>,
    field_name: &str,
) -> Result<T, String>
where
    T: std::str::FromStr + std::fmt::Display + PartialOrd,
{
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(format!("{} cannot be empty", field_name));
    }

    match trimmed.parse::<T>() {
        Ok(val) => {
            if let Some(min_val) = min {
                if val < min_val {
                    return Err(format!("{} must be at least {}", field_name, min_val));
                }
            }
            if let Some(max_val) = max {
                if val > max_val {
                    return Err(format!("{} cannot exceed {}", field_name, max_val));
                }
            }
            Ok(val)
        }
        Err(_) => Err(format!("{} must be a valid number", field_name)),
    }
}

/// Validate a restock quantity: a whole, positive number of units.
pub fn validate_restock_quantity(input: &str) -> Result<i64, String> {
    let trimmed = input.trim();
    if !trimmed.is_empty() && !QUANTITY_REGEX.is_match(trimmed) {
        return Err("Quantity must be a whole number".to_string());
    }
    validate_numeric_input(trimmed.trim_start_matches('+'), Some(1), None, "Quantity")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_filter_parsing() {
        assert_eq!(
            parse_day_filter(" 2024-02-29 "),
            Ok(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
        );
        assert_eq!(parse_day_filter(""), Err(DateParseError::EmptyInput));
        assert_eq!(parse_day_filter("2024/02/01"), Err(DateParseError::InvalidFormat));
        assert_eq!(
            parse_day_filter("2023-02-29"),
            Err(DateParseError::NoSuchDay("2023-02-29".into()))
        );
    }

    #[test]
    fn weekday_labels() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();
        assert_eq!(weekday_label(day), "Fri");
    }

    #[test]
    fn peso_formatting() {
        assert_eq!(format_peso(1234.5), "₱1234.50");
        assert_eq!(format_peso(f64::NAN), "₱0.00");
    }

    #[test]
    fn order_date_uses_utc() {
        let ts = DateTime::parse_from_rfc3339("2024-05-03T01:00:00+08:00").unwrap();
        assert_eq!(format_order_date(Some(ts)), "05/02/2024");
        assert_eq!(format_order_date(None), "Invalid Date");
    }

    #[test]
    fn restock_quantity_validation() {
        assert_eq!(validate_restock_quantity("12"), Ok(12));
        assert_eq!(validate_restock_quantity("+3"), Ok(3));
        assert!(validate_restock_quantity("0").is_err());
        assert!(validate_restock_quantity("2.5").is_err());
        assert!(validate_restock_quantity("").is_err());
    }
}
