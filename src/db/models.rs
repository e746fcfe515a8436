//! Database row types and pagination

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::DbError;
use crate::model::contract::{
    contract_expired, ContactLcm, ContactType, ContractLcm, NestedContract, NestedProvider,
    ProviderLcm,
};
use crate::model::dcim::{
    NestedDevice, NestedDeviceType, NestedInventoryItem, NestedManufacturer, NestedPlatform,
};
use crate::model::hardware::{is_expired, HardwareLcm};
use crate::model::report::{Counts, GroupTally};
use crate::model::software::{NestedSoftware, SoftwareLcm};
use crate::model::validated_software::{
    is_valid_on, AssignedObject, AssignedToType, ValidatedSoftwareLcm,
};
use crate::model::validation_result::{
    DeviceSoftwareValidationResult, InventoryItemSoftwareValidationResult, RunType,
};

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;

/// Pagination query parameters
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageRequest {
    /// Page number (1-indexed, default: 1)
    pub page: Option<u32>,
    /// Page size (default: 20, max: 100)
    pub page_size: Option<u32>,
}

impl PageRequest {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size())
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page() - 1) * self.limit()
    }
}

/// One page of results
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Page<T> {
    pub results: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total_count: i64,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn new(results: Vec<T>, request: PageRequest, total_count: i64) -> Self {
        let page_size = request.page_size();
        let total_pages = ((total_count.max(0) as f64) / (page_size as f64)).ceil() as u32;
        Self {
            results,
            page: request.page(),
            page_size,
            total_count,
            total_pages,
        }
    }

    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        Ok(Page {
            results: self.results.into_iter().map(f).collect::<Result<_, _>>()?,
            page: self.page,
            page_size: self.page_size,
            total_count: self.total_count,
            total_pages: self.total_pages,
        })
    }
}

fn nested_software(
    id: Option<Uuid>,
    platform: Option<Uuid>,
    version: Option<String>,
) -> Option<NestedSoftware> {
    match (id, platform, version) {
        (Some(id), Some(device_platform), Some(version)) => Some(NestedSoftware {
            id,
            device_platform,
            version,
        }),
        _ => None,
    }
}

fn parse_run_type(value: &str) -> Result<RunType, DbError> {
    value
        .parse()
        .map_err(|e: crate::model::ValidationError| DbError::Serialization(e.to_string()))
}

/// Hardware notice joined with its device type and manufacturer
#[derive(Debug, Clone, FromRow)]
pub struct HardwareRow {
    pub id: Uuid,
    pub device_type_id: Option<Uuid>,
    pub device_type_model: Option<String>,
    pub manufacturer_id: Option<Uuid>,
    pub manufacturer_name: Option<String>,
    pub inventory_item: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub end_of_sale: Option<NaiveDate>,
    pub end_of_support: Option<NaiveDate>,
    pub end_of_sw_releases: Option<NaiveDate>,
    pub end_of_security_patches: Option<NaiveDate>,
    pub documentation_url: Option<String>,
}

impl HardwareRow {
    pub fn into_domain(self, devices: Vec<NestedDevice>, today: NaiveDate) -> HardwareLcm {
        let manufacturer = match (self.manufacturer_id, self.manufacturer_name) {
            (Some(id), Some(name)) => Some(NestedManufacturer { id, name }),
            _ => None,
        };
        let device_type = match (self.device_type_id, self.device_type_model) {
            (Some(id), Some(model)) => Some(NestedDeviceType {
                id,
                manufacturer,
                model,
            }),
            _ => None,
        };
        HardwareLcm {
            id: self.id,
            expired: is_expired(self.end_of_support, self.end_of_sale, today),
            devices,
            device_type,
            inventory_item: self.inventory_item,
            release_date: self.release_date,
            end_of_sale: self.end_of_sale,
            end_of_support: self.end_of_support,
            end_of_sw_releases: self.end_of_sw_releases,
            end_of_security_patches: self.end_of_security_patches,
            documentation_url: self.documentation_url,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct SoftwareRow {
    pub id: Uuid,
    pub platform_id: Uuid,
    pub platform_name: String,
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

impl SoftwareRow {
    pub fn into_domain(self) -> SoftwareLcm {
        SoftwareLcm {
            id: self.id,
            device_platform: NestedPlatform {
                id: self.platform_id,
                name: self.platform_name,
            },
            version: self.version,
            alias: self.alias,
            release_date: self.release_date,
            end_of_support: self.end_of_support,
            documentation_url: self.documentation_url,
            download_url: self.download_url,
            image_file_name: self.image_file_name,
            image_file_checksum: self.image_file_checksum,
            long_term_support: self.long_term_support,
            pre_release: self.pre_release,
            tags: self.tags,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ValidatedSoftwareRow {
    pub id: Uuid,
    pub software_id: Uuid,
    pub software_platform_id: Uuid,
    pub software_version: String,
    pub assigned_to_content_type: String,
    pub assigned_to_object_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub preferred: bool,
    pub tags: Vec<String>,
}

impl ValidatedSoftwareRow {
    pub fn content_type(&self) -> Result<AssignedToType, DbError> {
        self.assigned_to_content_type
            .parse()
            .map_err(|e: crate::model::validated_software::UnknownContentType| {
                DbError::Serialization(e.to_string())
            })
    }

    pub fn into_domain(
        self,
        assigned_to_content_type: AssignedToType,
        assigned_to: Option<AssignedObject>,
        today: NaiveDate,
    ) -> ValidatedSoftwareLcm {
        ValidatedSoftwareLcm {
            id: self.id,
            software: NestedSoftware {
                id: self.software_id,
                device_platform: self.software_platform_id,
                version: self.software_version,
            },
            assigned_to_content_type,
            assigned_to_object_id: self.assigned_to_object_id,
            assigned_to,
            start: self.start_date,
            end: self.end_date,
            preferred: self.preferred,
            valid: is_valid_on(self.start_date, self.end_date, today),
            tags: self.tags,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ProviderRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub physical_address: Option<String>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub comments: Option<String>,
}

impl ProviderRow {
    pub fn into_domain(self) -> ProviderLcm {
        ProviderLcm {
            id: self.id,
            name: self.name,
            description: self.description,
            physical_address: self.physical_address,
            contact_name: self.contact_name,
            contact_phone: self.contact_phone,
            contact_email: self.contact_email,
            comments: self.comments,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ContractRow {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub provider_name: String,
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub cost: Option<f64>,
    pub support_level: Option<String>,
    pub contract_type: Option<String>,
}

impl ContractRow {
    pub fn into_domain(self, today: NaiveDate) -> ContractLcm {
        ContractLcm {
            id: self.id,
            provider: NestedProvider {
                id: self.provider_id,
                name: self.provider_name,
            },
            name: self.name,
            start: self.start_date,
            end: self.end_date,
            cost: self.cost,
            support_level: self.support_level,
            contract_type: self.contract_type,
            expired: contract_expired(self.end_date, today),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ContactRow {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub contract_name: String,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub comments: Option<String>,
    pub priority: i32,
    pub contact_type: String,
}

impl ContactRow {
    pub fn into_domain(self) -> Result<ContactLcm, DbError> {
        let contact_type: ContactType = self
            .contact_type
            .parse()
            .map_err(|e: crate::model::ValidationError| DbError::Serialization(e.to_string()))?;
        Ok(ContactLcm {
            id: self.id,
            contract: NestedContract {
                id: self.contract_id,
                name: self.contract_name,
            },
            name: self.name,
            address: self.address,
            phone: self.phone,
            email: self.email,
            comments: self.comments,
            priority: self.priority,
            contact_type,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DeviceResultRow {
    pub id: Uuid,
    pub device_id: Uuid,
    pub device_name: String,
    pub software_id: Option<Uuid>,
    pub software_platform_id: Option<Uuid>,
    pub software_version: Option<String>,
    pub is_validated: bool,
    pub last_run: DateTime<Utc>,
    pub run_type: String,
    pub last_updated: DateTime<Utc>,
}

impl DeviceResultRow {
    pub fn into_domain(self) -> Result<DeviceSoftwareValidationResult, DbError> {
        Ok(DeviceSoftwareValidationResult {
            id: self.id,
            device: NestedDevice {
                id: self.device_id,
                name: self.device_name,
            },
            software: nested_software(
                self.software_id,
                self.software_platform_id,
                self.software_version,
            ),
            is_validated: self.is_validated,
            last_run: self.last_run,
            run_type: parse_run_type(&self.run_type)?,
            last_updated: self.last_updated,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct InventoryItemResultRow {
    pub id: Uuid,
    pub inventory_item_id: Uuid,
    pub inventory_item_name: String,
    pub device_id: Uuid,
    pub device_name: String,
    pub software_id: Option<Uuid>,
    pub software_platform_id: Option<Uuid>,
    pub software_version: Option<String>,
    pub is_validated: bool,
    pub last_run: DateTime<Utc>,
    pub run_type: String,
    pub last_updated: DateTime<Utc>,
}

impl InventoryItemResultRow {
    pub fn into_domain(self) -> Result<InventoryItemSoftwareValidationResult, DbError> {
        Ok(InventoryItemSoftwareValidationResult {
            id: self.id,
            inventory_item: NestedInventoryItem {
                id: self.inventory_item_id,
                device: NestedDevice {
                    id: self.device_id,
                    name: self.device_name,
                },
                name: self.inventory_item_name,
            },
            software: nested_software(
                self.software_id,
                self.software_platform_id,
                self.software_version,
            ),
            is_validated: self.is_validated,
            last_run: self.last_run,
            run_type: parse_run_type(&self.run_type)?,
            last_updated: self.last_updated,
        })
    }
}

/// Per-group counts as returned by the aggregation queries
#[derive(Debug, Clone, FromRow)]
pub struct GroupCountRow {
    pub label: Option<String>,
    pub total: i64,
    pub valid: i64,
    pub invalid: i64,
    pub no_software: i64,
}

impl GroupCountRow {
    pub fn into_domain(self) -> GroupTally {
        GroupTally::new(
            self.label,
            Counts::new(self.total, self.valid, self.invalid, self.no_software),
        )
    }
}
