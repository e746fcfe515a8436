//! Cached outcome of comparing installed software against validated software policies

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::dcim::{NestedDevice, NestedInventoryItem};
use super::software::NestedSoftware;
use super::{Validate, ValidationError};

/// Batch job execution mode; only full runs mark report freshness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum RunType {
    #[serde(rename = "full-report-run")]
    Full,
    #[serde(rename = "single-object-run")]
    SingleObject,
}

impl RunType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full-report-run",
            Self::SingleObject => "single-object-run",
        }
    }
}

impl fmt::Display for RunType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full-report-run" => Ok(Self::Full),
            "single-object-run" => Ok(Self::SingleObject),
            other => Err(ValidationError::new(
                "run_type",
                format!("Unknown run type: {}", other),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DeviceSoftwareValidationResult {
    pub id: Uuid,
    pub device: NestedDevice,
    pub software: Option<NestedSoftware>,
    pub is_validated: bool,
    pub last_run: DateTime<Utc>,
    pub run_type: RunType,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InventoryItemSoftwareValidationResult {
    pub id: Uuid,
    pub inventory_item: NestedInventoryItem,
    pub software: Option<NestedSoftware>,
    pub is_validated: bool,
    pub last_run: DateTime<Utc>,
    pub run_type: RunType,
    pub last_updated: DateTime<Utc>,
}

/// One result written by the validation batch job.
///
/// `subject` is the device ID or inventory item ID depending on the endpoint.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ValidationResultInput {
    pub subject: Uuid,
    pub software: Option<Uuid>,
    pub is_validated: bool,
    pub last_run: DateTime<Utc>,
    pub run_type: RunType,
}

impl Validate for ValidationResultInput {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.is_validated && self.software.is_none() {
            return Err(ValidationError::new(
                "is_validated",
                "A result without matched software cannot be validated",
            ));
        }
        Ok(())
    }
}

impl Validate for Vec<ValidationResultInput> {
    fn validate(&self) -> Result<(), ValidationError> {
        self.iter().try_for_each(Validate::validate)
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ValidationResultFilter {
    /// Software ID
    pub software: Option<Uuid>,
    pub is_validated: Option<bool>,
    pub run_type: Option<RunType>,
}
