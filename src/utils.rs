use once_cell::sync::Lazy;
use regex::Regex;

// "5000", "1500ms", "5s"
static DURATION_UNIT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\s*(ms|s)?$").unwrap());
// "0:05" (minutes:seconds)
static DURATION_CLOCK_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+):(\d{2})$").unwrap());

/// Why a countdown duration string was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum DurationParseError {
    EmptyInput,
    UnknownFormat(String),
    SecondsOutOfRange(u64),
    Overflow(String),
}

impl std::fmt::Display for DurationParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DurationParseError::EmptyInput => write!(f, "duration is empty"),
            DurationParseError::UnknownFormat(input) => {
                write!(f, "'{}' is not one of 5000, 1500ms, 5s or 0:05", input)
            }
            DurationParseError::SecondsOutOfRange(s) => {
                write!(f, "{} seconds in m:ss form (must be 0-59)", s)
            }
            DurationParseError::Overflow(input) => write!(f, "'{}' does not fit in u32 ms", input),
        }
    }
}

impl std::error::Error for DurationParseError {}

/// Parse a countdown duration to milliseconds.
///
/// A bare number is milliseconds; `ms` and `s` suffixes and `m:ss` are also accepted.
pub fn parse_duration_ms(input: &str) -> Result<u32, DurationParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DurationParseError::EmptyInput);
    }
    let number = |digits: &str| -> Result<u64, DurationParseError> {
        digits
            .parse()
            .map_err(|_| DurationParseError::Overflow(trimmed.to_string()))
    };

    let millis = if let Some(captures) = DURATION_UNIT_REGEX.captures(trimmed) {
        let value = number(&captures[1])?;
        match captures.get(2).map(|unit| unit.as_str()) {
            Some("s") => value.saturating_mul(1_000),
            _ => value,
        }
    } else if let Some(captures) = DURATION_CLOCK_REGEX.captures(trimmed) {
        let minutes = number(&captures[1])?;
        let seconds = number(&captures[2])?;
        if seconds > 59 {
            return Err(DurationParseError::SecondsOutOfRange(seconds));
        }
        minutes.saturating_mul(60_000).saturating_add(seconds * 1_000)
    } else {
        return Err(DurationParseError::UnknownFormat(trimmed.to_string()));
    };

    u32::try_from(millis).map_err(|_| DurationParseError::Overflow(trimmed.to_string()))
}

/// Generic range validation for already-parsed values
pub fn validate_range<T>(value: T, min: Option<T>, max: Option<T>, field_name: &str) -> Result<T, String>
where
    T: std::fmt::Display + PartialOrd,
{
    if let Some(min_val) = min {
        if value < min_val {
            return Err(format!("{} must be at least {}", field_name, min_val));
        }
    }
    if let Some(max_val) = max {
        if value > max_val {
            return Err(format!("{} cannot exceed {}", field_name, max_val));
        }
    }
    Ok(value)
}

/// CSS width for the linear bar, e.g. `"87.5%"`.
pub fn format_fill_width(percent: f64) -> String {
    format!("{:.2}%", percent)
}

/// Numeric label text, e.g. `"88%"`.
pub fn format_percent_label(percent: u32) -> String {
    format!("{}%", percent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_formats() {
        assert_eq!(parse_duration_ms("5000"), Ok(5_000));
        assert_eq!(parse_duration_ms(" 1500ms "), Ok(1_500));
        assert_eq!(parse_duration_ms("5s"), Ok(5_000));
        assert_eq!(parse_duration_ms("0:05"), Ok(5_000));
        assert_eq!(parse_duration_ms("1:30"), Ok(90_000));
    }

    #[test]
    fn rejects_malformed_durations() {
        assert_eq!(parse_duration_ms("  "), Err(DurationParseError::EmptyInput));
        assert_eq!(
            parse_duration_ms("five seconds"),
            Err(DurationParseError::UnknownFormat("five seconds".to_string()))
        );
        assert_eq!(parse_duration_ms("1:75"), Err(DurationParseError::SecondsOutOfRange(75)));
        assert!(matches!(
            parse_duration_ms("99999999999s"),
            Err(DurationParseError::Overflow(_))
        ));
        assert!(matches!(parse_duration_ms("1m30s"), Err(DurationParseError::UnknownFormat(_))));
    }

    #[test]
    fn range_validation_reports_field() {
        assert_eq!(validate_range(5, Some(1), Some(10), "Count"), Ok(5));
        assert_eq!(
            validate_range(0, Some(1), None, "Count"),
            Err("Count must be at least 1".to_string())
        );
        assert_eq!(
            validate_range(11, None, Some(10), "Count"),
            Err("Count cannot exceed 10".to_string())
        );
    }

    #[test]
    fn formats_display_values() {
        assert_eq!(format_fill_width(87.5), "87.50%");
        assert_eq!(format_percent_label(88), "88%");
    }
}
