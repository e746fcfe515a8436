pub mod config;
pub mod contract;
pub mod dcim;
pub mod hardware;
pub mod report;
pub mod software;
pub mod validated_software;
pub mod validation_result;

use chrono::NaiveDate;
use url::Url;

pub use config::{ChartColors, ChartConfig, Config};

/// Input rejected before reaching the database
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Field-level checks on write payloads
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

pub(crate) fn require_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "This field may not be blank"));
    }
    Ok(())
}

pub(crate) fn validate_url(field: &'static str, value: Option<&str>) -> Result<(), ValidationError> {
    match value {
        Some(v) if !v.is_empty() => Url::parse(v)
            .map(|_| ())
            .map_err(|e| ValidationError::new(field, format!("Enter a valid URL ({})", e))),
        _ => Ok(()),
    }
}

pub(crate) fn validate_date_order(
    start_field: &'static str,
    start: Option<NaiveDate>,
    end_field: &'static str,
    end: Option<NaiveDate>,
) -> Result<(), ValidationError> {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(ValidationError::new(
                end_field,
                format!("{} must not be earlier than {}", end_field, start_field),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_rejected() {
        assert!(require_non_empty("version", "  ").is_err());
        assert!(require_non_empty("version", "17.3.1").is_ok());
    }

    #[test]
    fn test_url_validation() {
        assert!(validate_url("documentation_url", None).is_ok());
        assert!(validate_url("documentation_url", Some("")).is_ok());
        assert!(validate_url("documentation_url", Some("https://vendor.example/eol")).is_ok());
        let err = validate_url("documentation_url", Some("not a url")).unwrap_err();
        assert_eq!(err.field, "documentation_url");
    }

    #[test]
    fn test_date_order() {
        let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok();
        assert!(validate_date_order("start", d("2024-01-01"), "end", d("2024-01-01")).is_ok());
        assert!(validate_date_order("start", d("2024-01-01"), "end", None).is_ok());
        let err =
            validate_date_order("start", d("2024-02-01"), "end", d("2024-01-01")).unwrap_err();
        assert_eq!(err.field, "end");
    }
}
