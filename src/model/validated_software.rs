//! Validated software policies and their polymorphic assignment target

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::dcim::{NestedDevice, NestedDeviceType, NestedInventoryItem};
use super::software::NestedSoftware;
use super::{validate_date_order, Validate, ValidationError};

/// Kind of object a policy is assigned to.
///
/// The discriminant indexes the accessor table used to resolve the target
/// (see `db::repository::validated_software::ACCESSORS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum AssignedToType {
    #[serde(rename = "dcim.device")]
    Device,
    #[serde(rename = "dcim.devicetype")]
    DeviceType,
    #[serde(rename = "dcim.inventoryitem")]
    InventoryItem,
}

impl AssignedToType {
    pub const ALL: [AssignedToType; 3] = [Self::Device, Self::DeviceType, Self::InventoryItem];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Device => "dcim.device",
            Self::DeviceType => "dcim.devicetype",
            Self::InventoryItem => "dcim.inventoryitem",
        }
    }
}

impl fmt::Display for AssignedToType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Unknown content type: {0}")]
pub struct UnknownContentType(pub String);

impl FromStr for AssignedToType {
    type Err = UnknownContentType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownContentType(s.to_string()))
    }
}

/// Resolved assignment target, serialized as the target's nested form
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum AssignedObject {
    Device(NestedDevice),
    DeviceType(NestedDeviceType),
    InventoryItem(NestedInventoryItem),
}

impl AssignedObject {
    pub fn kind(&self) -> AssignedToType {
        match self {
            Self::Device(_) => AssignedToType::Device,
            Self::DeviceType(_) => AssignedToType::DeviceType,
            Self::InventoryItem(_) => AssignedToType::InventoryItem,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ValidatedSoftwareLcm {
    pub id: Uuid,
    pub software: NestedSoftware,
    pub assigned_to_content_type: AssignedToType,
    pub assigned_to_object_id: Uuid,
    /// `null` when the referenced object no longer exists
    pub assigned_to: Option<AssignedObject>,
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
    pub preferred: bool,
    pub valid: bool,
    pub tags: Vec<String>,
}

/// A policy is in force from `start` through `end` inclusive; no end means open-ended.
pub fn is_valid_on(start: NaiveDate, end: Option<NaiveDate>, today: NaiveDate) -> bool {
    start <= today && end.map_or(true, |end| end >= today)
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ValidatedSoftwareLcmInput {
    pub software: Uuid,
    pub assigned_to_content_type: AssignedToType,
    pub assigned_to_object_id: Uuid,
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
    #[serde(default)]
    pub preferred: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Validate for ValidatedSoftwareLcmInput {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_date_order("start", Some(self.start), "end", self.end)
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ValidatedSoftwareLcmFilter {
    /// Software ID
    pub software: Option<Uuid>,
    pub assigned_to_content_type: Option<AssignedToType>,
    pub assigned_to_object_id: Option<Uuid>,
    pub preferred: Option<bool>,
    /// Only policies currently in force (or, when false, not in force)
    pub valid: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_content_type_round_trip_strings() {
        for kind in AssignedToType::ALL {
            assert_eq!(kind.as_str().parse::<AssignedToType>().unwrap(), kind);
        }
        assert!("dcim.site".parse::<AssignedToType>().is_err());
    }

    #[test]
    fn test_content_type_serde_names() {
        let json = serde_json::to_string(&AssignedToType::InventoryItem).unwrap();
        assert_eq!(json, "\"dcim.inventoryitem\"");
        let parsed: AssignedToType = serde_json::from_str("\"dcim.devicetype\"").unwrap();
        assert_eq!(parsed, AssignedToType::DeviceType);
    }

    #[test]
    fn test_validity_window() {
        let today = date("2024-06-15");
        assert!(is_valid_on(date("2024-01-01"), None, today));
        assert!(is_valid_on(date("2024-06-15"), Some(date("2024-06-15")), today));
        assert!(!is_valid_on(date("2024-06-16"), None, today));
        assert!(!is_valid_on(date("2023-01-01"), Some(date("2024-06-14")), today));
    }

    #[test]
    fn test_end_before_start_rejected() {
        let input = ValidatedSoftwareLcmInput {
            software: Uuid::new_v4(),
            assigned_to_content_type: AssignedToType::Device,
            assigned_to_object_id: Uuid::new_v4(),
            start: date("2024-06-01"),
            end: Some(date("2024-05-01")),
            preferred: false,
            tags: vec![],
        };
        assert_eq!(input.validate().unwrap_err().field, "end");
    }

    #[test]
    fn test_assigned_object_serializes_flat() {
        let id = Uuid::new_v4();
        let obj = AssignedObject::Device(NestedDevice {
            id,
            name: "ams01-edge-01".to_string(),
        });
        assert_eq!(obj.kind(), AssignedToType::Device);
        let value = serde_json::to_value(&obj).unwrap();
        assert_eq!(value["name"], "ams01-edge-01");
        assert_eq!(value["id"], id.to_string());
    }
}
