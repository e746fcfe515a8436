//! Application state and service initialization
//!
//! Builds the database pool, the repositories and the report services once,
//! then hands them to every actix worker through `configure`.

use actix_web::web;
use sqlx::PgPool;

use crate::api;
use crate::api::report::{DeviceReportService, InventoryItemReportService};
use crate::chart::parse_color;
use crate::db::repository::{
    ContactRepository, ContractRepository, DcimRepository, DeviceResultRepository,
    HardwareRepository, InventoryItemResultRepository, ProviderRepository, SoftwareRepository,
    ValidatedSoftwareRepository,
};
use crate::model::report::ReportKind;
use crate::model::{ChartConfig, Config};

/// Shared handles injected into the handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: web::Data<PgPool>,
    pub hardware: web::Data<HardwareRepository>,
    pub software: web::Data<SoftwareRepository>,
    pub validated_software: web::Data<ValidatedSoftwareRepository>,
    pub providers: web::Data<ProviderRepository>,
    pub contracts: web::Data<ContractRepository>,
    pub contacts: web::Data<ContactRepository>,
    pub dcim: web::Data<DcimRepository>,
    pub device_results: web::Data<DeviceResultRepository>,
    pub inventory_item_results: web::Data<InventoryItemResultRepository>,
    pub device_report: web::Data<DeviceReportService>,
    pub inventory_item_report: web::Data<InventoryItemReportService>,
}

impl AppState {
    /// Initialize all services and build application state
    ///
    /// This performs:
    /// 1. Chart configuration checks
    /// 2. Database connection and schema initialization
    /// 3. Repository and report service construction
    pub async fn new(config: Config) -> Result<Self, AppError> {
        check_charts(&config.charts)?;

        let db_pool = crate::db::create_pool()
            .await
            .map_err(|e| AppError::DatabaseInit(e.to_string()))?;

        crate::db::init_schema(&db_pool)
            .await
            .map_err(|e| AppError::DatabaseInit(e.to_string()))?;

        let device_report = DeviceReportService::new(
            DeviceResultRepository::new(db_pool.clone()),
            ReportKind::Device,
            config.charts.clone(),
        );
        let inventory_item_report = InventoryItemReportService::new(
            InventoryItemResultRepository::new(db_pool.clone()),
            ReportKind::InventoryItem,
            config.charts,
        );

        Ok(Self {
            hardware: web::Data::new(HardwareRepository::new(db_pool.clone())),
            software: web::Data::new(SoftwareRepository::new(db_pool.clone())),
            validated_software: web::Data::new(ValidatedSoftwareRepository::new(db_pool.clone())),
            providers: web::Data::new(ProviderRepository::new(db_pool.clone())),
            contracts: web::Data::new(ContractRepository::new(db_pool.clone())),
            contacts: web::Data::new(ContactRepository::new(db_pool.clone())),
            dcim: web::Data::new(DcimRepository::new(db_pool.clone())),
            device_results: web::Data::new(DeviceResultRepository::new(db_pool.clone())),
            inventory_item_results: web::Data::new(InventoryItemResultRepository::new(
                db_pool.clone(),
            )),
            device_report: web::Data::new(device_report),
            inventory_item_report: web::Data::new(inventory_item_report),
            db_pool: web::Data::new(db_pool),
        })
    }

    /// Register shared state and every route
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.db_pool.clone())
            .app_data(self.hardware.clone())
            .app_data(self.software.clone())
            .app_data(self.validated_software.clone())
            .app_data(self.providers.clone())
            .app_data(self.contracts.clone())
            .app_data(self.contacts.clone())
            .app_data(self.dcim.clone())
            .app_data(self.device_results.clone())
            .app_data(self.inventory_item_results.clone())
            .app_data(self.device_report.clone())
            .app_data(self.inventory_item_report.clone())
            .configure(api::health::configure)
            .configure(api::openapi::configure)
            .configure(api::hardware::configure)
            .configure(api::software::configure)
            .configure(api::validated_software::configure)
            .configure(api::provider::configure)
            .configure(api::contract::configure)
            .configure(api::validation_result::configure)
            .configure(api::dcim::configure)
            .configure(api::report::configure);
    }
}

/// Reject chart colors the renderers could not use
fn check_charts(charts: &ChartConfig) -> Result<(), AppError> {
    for color in [
        &charts.colors.valid,
        &charts.colors.invalid,
        &charts.colors.no_software,
    ] {
        parse_color(color).map_err(|e| AppError::InvalidConfig(e.to_string()))?;
    }
    Ok(())
}

/// Application-level errors
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AppError {
    /// Database initialization failed
    #[error("Database initialization failed: {0}")]
    DatabaseInit(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_charts_accepted() {
        assert!(check_charts(&ChartConfig::default()).is_ok());
    }

    #[test]
    fn test_bad_color_rejected() {
        let mut charts = ChartConfig::default();
        charts.colors.invalid = "red".to_string();
        let err = check_charts(&charts).unwrap_err();
        assert!(matches!(err, AppError::InvalidConfig(_)));
        assert!(err.to_string().contains("red"));
    }
}
