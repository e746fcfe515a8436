//! Repositories for lifecycle records, the DCIM mirror and validation results

pub mod contact;
pub mod contract;
pub mod dcim;
pub mod hardware;
pub mod provider;
pub mod software;
pub mod validated_software;
pub mod validation_result;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::models::{Page, PageRequest};
use super::DbError;
use crate::model::report::{Counts, GroupTally};
use crate::model::Validate;

pub use contact::ContactRepository;
pub use contract::ContractRepository;
pub use dcim::DcimRepository;
pub use hardware::HardwareRepository;
pub use provider::ProviderRepository;
pub use software::SoftwareRepository;
pub use validated_software::ValidatedSoftwareRepository;
pub use validation_result::{DeviceResultRepository, InventoryItemResultRepository};

/// Basic persistence operations shared by the lifecycle entities
#[async_trait]
pub trait Repository: Send + Sync {
    type Record: Serialize + Send;
    type Input: Validate + Send + Sync;
    type Filter: Send + Sync;

    /// Human readable entity name used in errors and logs
    const NAME: &'static str;

    async fn list(
        &self,
        filter: &Self::Filter,
        page: PageRequest,
    ) -> Result<Page<Self::Record>, DbError>;

    async fn get(&self, id: Uuid) -> Result<Self::Record, DbError>;

    async fn create(&self, input: &Self::Input) -> Result<Self::Record, DbError>;

    async fn update(&self, id: Uuid, input: &Self::Input) -> Result<Self::Record, DbError>;

    async fn delete(&self, id: Uuid) -> Result<(), DbError>;
}

/// Read side of a validation result cache, as consumed by the reports
#[async_trait]
pub trait ValidationResultStore: Send + Sync {
    type Filter: Send + Sync;

    /// Most recent write made by a full run, if any
    async fn latest_full_run(&self) -> Result<Option<DateTime<Utc>>, DbError>;

    async fn global_counts(&self, filter: &Self::Filter) -> Result<Counts, DbError>;

    /// Counts per chart group, largest group first
    async fn group_counts(&self, filter: &Self::Filter) -> Result<Vec<GroupTally>, DbError>;

    /// Counts per table row, best validated first
    async fn row_counts(
        &self,
        filter: &Self::Filter,
        page: PageRequest,
    ) -> Result<Page<GroupTally>, DbError>;
}

pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub(crate) fn not_found(name: &str, id: Uuid) -> DbError {
    DbError::NotFound(format!("{} {}", name, id))
}

/// Shared aggregate columns over a result table aliased `r`
pub(crate) const COUNT_COLUMNS: &str = r#"
    COUNT(*) AS total,
    COUNT(*) FILTER (WHERE r.is_validated) AS valid,
    COUNT(*) FILTER (WHERE NOT r.is_validated AND r.software_id IS NOT NULL) AS invalid,
    COUNT(*) FILTER (WHERE r.software_id IS NULL) AS no_software
"#;

/// Order table rows by their valid ratio
pub(crate) const VALID_RATIO_ORDER: &str =
    " ORDER BY (COUNT(*) FILTER (WHERE r.is_validated))::float8 / COUNT(*) DESC, label";
