//! Software releases per platform

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::dcim::NestedPlatform;
use super::{require_non_empty, validate_date_order, validate_url, Validate, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SoftwareLcm {
    pub id: Uuid,
    pub device_platform: NestedPlatform,
    pub version: String,
    pub alias: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub end_of_support: Option<NaiveDate>,
    pub documentation_url: Option<String>,
    pub download_url: Option<String>,
    pub image_file_name: Option<String>,
    pub image_file_checksum: Option<String>,
    pub long_term_support: bool,
    pub pre_release: bool,
    pub tags: Vec<String>,
}

/// Compact form embedded in policies and validation results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NestedSoftware {
    pub id: Uuid,
    pub device_platform: Uuid,
    pub version: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SoftwareLcmInput {
    pub device_platform: Uuid,
    pub version: String,
    pub alias: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub end_of_support: Option<NaiveDate>,
    pub documentation_url: Option<String>,
    pub download_url: Option<String>,
    pub image_file_name: Option<String>,
    pub image_file_checksum: Option<String>,
    #[serde(default)]
    pub long_term_support: bool,
    #[serde(default)]
    pub pre_release: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Validate for SoftwareLcmInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("version", &self.version)?;
        validate_date_order(
            "release_date",
            self.release_date,
            "end_of_support",
            self.end_of_support,
        )?;
        validate_url("documentation_url", self.documentation_url.as_deref())?;
        validate_url("download_url", self.download_url.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SoftwareLcmFilter {
    /// Platform ID
    pub device_platform: Option<Uuid>,
    pub version: Option<String>,
    pub long_term_support: Option<bool>,
    pub pre_release: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> SoftwareLcmInput {
        SoftwareLcmInput {
            device_platform: Uuid::new_v4(),
            version: "17.3.3".to_string(),
            alias: Some("Amsterdam".to_string()),
            release_date: None,
            end_of_support: None,
            documentation_url: None,
            download_url: Some("https://downloads.example/ios/17.3.3.bin".to_string()),
            image_file_name: None,
            image_file_checksum: None,
            long_term_support: true,
            pre_release: false,
            tags: vec![],
        }
    }

    #[test]
    fn test_valid_input() {
        assert!(input().validate().is_ok());
    }

    #[test]
    fn test_blank_version_rejected() {
        let bad = SoftwareLcmInput {
            version: String::new(),
            ..input()
        };
        assert_eq!(bad.validate().unwrap_err().field, "version");
    }

    #[test]
    fn test_bad_download_url_rejected() {
        let bad = SoftwareLcmInput {
            download_url: Some("ftp//broken".to_string()),
            ..input()
        };
        assert_eq!(bad.validate().unwrap_err().field, "download_url");
    }

    #[test]
    fn test_flags_default_false() {
        let parsed: SoftwareLcmInput = serde_json::from_value(serde_json::json!({
            "device_platform": Uuid::new_v4(),
            "version": "9.3(8)"
        }))
        .unwrap();
        assert!(!parsed.long_term_support);
        assert!(!parsed.pre_release);
        assert!(parsed.tags.is_empty());
    }
}
