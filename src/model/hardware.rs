//! Hardware end-of-life notices

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::dcim::{NestedDevice, NestedDeviceType};
use super::{validate_date_order, validate_url, Validate, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HardwareLcm {
    pub id: Uuid,
    pub expired: bool,
    /// Devices tied to the device type or carrying the inventory item part
    pub devices: Vec<NestedDevice>,
    pub device_type: Option<NestedDeviceType>,
    pub inventory_item: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub end_of_sale: Option<NaiveDate>,
    pub end_of_support: Option<NaiveDate>,
    pub end_of_sw_releases: Option<NaiveDate>,
    pub end_of_security_patches: Option<NaiveDate>,
    pub documentation_url: Option<String>,
}

/// Expiry uses end of support, falling back to end of sale.
pub fn is_expired(
    end_of_support: Option<NaiveDate>,
    end_of_sale: Option<NaiveDate>,
    today: NaiveDate,
) -> bool {
    end_of_support
        .or(end_of_sale)
        .is_some_and(|expiry| expiry <= today)
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct HardwareLcmInput {
    pub device_type: Option<Uuid>,
    pub inventory_item: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub end_of_sale: Option<NaiveDate>,
    pub end_of_support: Option<NaiveDate>,
    pub end_of_sw_releases: Option<NaiveDate>,
    pub end_of_security_patches: Option<NaiveDate>,
    pub documentation_url: Option<String>,
}

impl Validate for HardwareLcmInput {
    fn validate(&self) -> Result<(), ValidationError> {
        let has_part = self
            .inventory_item
            .as_deref()
            .is_some_and(|p| !p.trim().is_empty());
        match (self.device_type.is_some(), has_part) {
            (true, true) => {
                return Err(ValidationError::new(
                    "device_type",
                    "Cannot set both device_type and inventory_item",
                ))
            }
            (false, false) => {
                return Err(ValidationError::new(
                    "device_type",
                    "One of device_type or inventory_item is required",
                ))
            }
            _ => {}
        }
        validate_date_order(
            "release_date",
            self.release_date,
            "end_of_sale",
            self.end_of_sale,
        )?;
        validate_url("documentation_url", self.documentation_url.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HardwareLcmFilter {
    /// Device type ID
    pub device_type: Option<Uuid>,
    /// Inventory item part ID
    pub inventory_item: Option<String>,
    pub expired: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn input() -> HardwareLcmInput {
        HardwareLcmInput {
            device_type: Some(Uuid::new_v4()),
            inventory_item: None,
            release_date: None,
            end_of_sale: Some(date("2023-06-01")),
            end_of_support: None,
            end_of_sw_releases: None,
            end_of_security_patches: None,
            documentation_url: None,
        }
    }

    #[test]
    fn test_expired_prefers_end_of_support() {
        let today = date("2024-01-01");
        // end of sale passed, support still running
        assert!(!is_expired(
            Some(date("2025-01-01")),
            Some(date("2023-01-01")),
            today
        ));
        assert!(is_expired(Some(date("2024-01-01")), None, today));
    }

    #[test]
    fn test_expired_falls_back_to_end_of_sale() {
        let today = date("2024-01-01");
        assert!(is_expired(None, Some(date("2023-12-31")), today));
        assert!(!is_expired(None, Some(date("2024-01-02")), today));
        assert!(!is_expired(None, None, today));
    }

    #[test]
    fn test_requires_exactly_one_target() {
        assert!(input().validate().is_ok());

        let both = HardwareLcmInput {
            inventory_item: Some("WS-X4748".to_string()),
            ..input()
        };
        assert!(both.validate().is_err());

        let neither = HardwareLcmInput {
            device_type: None,
            ..input()
        };
        assert!(neither.validate().is_err());

        let part_only = HardwareLcmInput {
            device_type: None,
            inventory_item: Some("WS-X4748".to_string()),
            ..input()
        };
        assert!(part_only.validate().is_ok());
    }

    #[test]
    fn test_blank_part_counts_as_missing() {
        let blank = HardwareLcmInput {
            device_type: None,
            inventory_item: Some("   ".to_string()),
            ..input()
        };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_sale_before_release_rejected() {
        let bad = HardwareLcmInput {
            release_date: Some(date("2024-01-01")),
            end_of_sale: Some(date("2023-01-01")),
            ..input()
        };
        assert_eq!(bad.validate().unwrap_err().field, "end_of_sale");
    }
}
