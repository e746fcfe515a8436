//! OpenAPI specification endpoints

use actix_web::{HttpResponse, get};
use utoipa::OpenApi;

use crate::api::error::ApiError;
use crate::api::{
    contract, dcim, error, hardware, health, provider, report, software, validated_software,
    validation_result,
};
use crate::model::{
    contract as contract_model, dcim as dcim_model, hardware as hardware_model,
    report as report_model, software as software_model,
    validated_software as validated_software_model, validation_result as validation_result_model,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Device Lifecycle Management API",
        description = "Hardware, software and contract lifecycle tracking with software validation reports"
    ),
    paths(
        health::liveness,
        health::readiness,
        hardware::list_hardware,
        hardware::get_hardware,
        hardware::create_hardware,
        hardware::update_hardware,
        hardware::delete_hardware,
        software::list_software,
        software::get_software,
        software::create_software,
        software::update_software,
        software::delete_software,
        validated_software::list_validated_software,
        validated_software::get_validated_software,
        validated_software::create_validated_software,
        validated_software::update_validated_software,
        validated_software::delete_validated_software,
        provider::list_providers,
        provider::get_provider,
        provider::list_provider_contracts,
        provider::create_provider,
        provider::update_provider,
        provider::delete_provider,
        contract::list_contracts,
        contract::get_contract,
        contract::list_contract_contacts,
        contract::create_contract,
        contract::update_contract,
        contract::delete_contract,
        contract::list_contacts,
        contract::get_contact,
        contract::create_contact,
        contract::update_contact,
        contract::delete_contact,
        validation_result::list_device_results,
        validation_result::upsert_device_results,
        validation_result::list_inventory_item_results,
        validation_result::upsert_inventory_item_results,
        dcim::sync_dcim,
        report::device_report,
        report::inventory_item_report,
        report::device_report_page,
        report::inventory_item_report_page,
    ),
    components(schemas(
        error::ErrorResponse,
        health::HealthStatus,
        health::ReadinessStatus,
        health::DependencyHealth,
        hardware_model::HardwareLcm,
        hardware_model::HardwareLcmInput,
        software_model::SoftwareLcm,
        software_model::SoftwareLcmInput,
        software_model::NestedSoftware,
        validated_software_model::ValidatedSoftwareLcm,
        validated_software_model::ValidatedSoftwareLcmInput,
        validated_software_model::AssignedToType,
        validated_software_model::AssignedObject,
        contract_model::ProviderLcm,
        contract_model::ProviderLcmInput,
        contract_model::ContractLcm,
        contract_model::ContractLcmInput,
        contract_model::ContactLcm,
        contract_model::ContactLcmInput,
        contract_model::ContactType,
        contract_model::ContractContacts,
        validation_result_model::DeviceSoftwareValidationResult,
        validation_result_model::InventoryItemSoftwareValidationResult,
        validation_result_model::ValidationResultInput,
        validation_result_model::RunType,
        validation_result::UpsertSummary,
        dcim_model::DcimSnapshot,
        dcim_model::DcimSyncSummary,
        dcim_model::NestedDevice,
        dcim_model::NestedDeviceType,
        dcim_model::NestedInventoryItem,
        report_model::Tally,
        report_model::GroupTally,
        report::DeviceReport,
        report::InventoryItemReport,
    )),
    tags(
        (name = "health", description = "Liveness and readiness probes"),
        (name = "hardware", description = "Hardware end-of-life notices"),
        (name = "software", description = "Software releases"),
        (name = "validated-software", description = "Validated software policies"),
        (name = "contracts", description = "Providers, contracts and contacts"),
        (name = "validation-results", description = "Software validation result caches"),
        (name = "dcim", description = "DCIM mirror synchronisation"),
        (name = "reports", description = "Software validation reports"),
    )
)]
pub struct ApiDoc;

/// Serve OpenAPI JSON specification
#[get("/openapi.json")]
pub async fn openapi_json() -> HttpResponse {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

/// Serve OpenAPI YAML specification
#[get("/openapi.yaml")]
pub async fn openapi_yaml() -> Result<HttpResponse, ApiError> {
    let yaml = ApiDoc::openapi()
        .to_yaml()
        .map_err(|e| ApiError::Internal(format!("OpenAPI serialization failed: {}", e)))?;
    Ok(HttpResponse::Ok().content_type("text/yaml").body(yaml))
}

/// Configure OpenAPI routes
pub fn configure(cfg: &mut actix_web::web::ServiceConfig) {
    cfg.service(openapi_json).service(openapi_yaml);
}
