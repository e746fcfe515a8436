//! Nested representations of the DCIM records this service mirrors

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NestedManufacturer {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NestedPlatform {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NestedDeviceType {
    pub id: Uuid,
    pub manufacturer: Option<NestedManufacturer>,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NestedDevice {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NestedInventoryItem {
    pub id: Uuid,
    pub device: NestedDevice,
    pub name: String,
}

// Snapshot pushed by the source-of-truth inventory system

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ManufacturerInput {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PlatformInput {
    pub id: Uuid,
    pub name: String,
    pub manufacturer: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DeviceTypeInput {
    pub id: Uuid,
    pub manufacturer: Uuid,
    pub model: String,
    pub part_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DeviceInput {
    pub id: Uuid,
    pub name: String,
    pub device_type: Uuid,
    pub platform: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct InventoryItemInput {
    pub id: Uuid,
    pub name: String,
    pub device: Uuid,
    pub manufacturer: Option<Uuid>,
    pub part_id: Option<String>,
}

/// Full or partial DCIM snapshot, applied parents first
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct DcimSnapshot {
    #[serde(default)]
    pub manufacturers: Vec<ManufacturerInput>,
    #[serde(default)]
    pub platforms: Vec<PlatformInput>,
    #[serde(default)]
    pub device_types: Vec<DeviceTypeInput>,
    #[serde(default)]
    pub devices: Vec<DeviceInput>,
    #[serde(default)]
    pub inventory_items: Vec<InventoryItemInput>,
}

/// Number of records written per DCIM table
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct DcimSyncSummary {
    pub manufacturers: u64,
    pub platforms: u64,
    pub device_types: u64,
    pub devices: u64,
    pub inventory_items: u64,
}
