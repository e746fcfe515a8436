//! Validation result caches for devices and inventory items
//!
//! Rows are written in bulk by the external validation job (one row per
//! subject, overwritten on every run) and aggregated by the reports.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{ValidationResultStore, COUNT_COLUMNS, VALID_RATIO_ORDER};
use crate::db::models::{
    DeviceResultRow, GroupCountRow, InventoryItemResultRow, Page, PageRequest,
};
use crate::db::DbError;
use crate::model::report::{
    Counts, DeviceReportFilter, GroupTally, InventoryItemReportFilter,
};
use crate::model::validation_result::{
    DeviceSoftwareValidationResult, InventoryItemSoftwareValidationResult, RunType,
    ValidationResultFilter, ValidationResultInput,
};

fn push_result_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ValidationResultFilter) {
    qb.push(" WHERE TRUE");
    if let Some(software) = filter.software {
        qb.push(" AND r.software_id = ").push_bind(software);
    }
    if let Some(is_validated) = filter.is_validated {
        qb.push(" AND r.is_validated = ").push_bind(is_validated);
    }
    if let Some(run_type) = filter.run_type {
        qb.push(" AND r.run_type = ").push_bind(run_type.as_str());
    }
}

fn push_last_run(
    qb: &mut QueryBuilder<'_, Postgres>,
    after: Option<chrono::NaiveDate>,
    before: Option<chrono::NaiveDate>,
) {
    if let Some(after) = after {
        qb.push(" AND r.last_run::date >= ").push_bind(after);
    }
    if let Some(before) = before {
        qb.push(" AND r.last_run::date <= ").push_bind(before);
    }
}

/// `last_run` of the most recently written full-run row
async fn latest_full_run(
    pool: &PgPool,
    table: &str,
) -> Result<Option<DateTime<Utc>>, DbError> {
    let latest: Option<DateTime<Utc>> = sqlx::query_scalar(&format!(
        "SELECT last_run FROM {} WHERE run_type = $1 ORDER BY last_updated DESC LIMIT 1",
        table
    ))
    .bind(RunType::Full.as_str())
    .fetch_optional(pool)
    .await?;
    Ok(latest)
}

// ============================================================================
// Devices
// ============================================================================

const DEVICE_SELECT: &str = r#"
    SELECT r.id, r.device_id, d.name AS device_name, r.software_id,
           s.platform_id AS software_platform_id, s.version AS software_version,
           r.is_validated, r.last_run, r.run_type, r.last_updated
    FROM device_software_validation_results r
    JOIN devices d ON d.id = r.device_id
    LEFT JOIN software_lcm s ON s.id = r.software_id
"#;

const DEVICE_REPORT_FROM: &str = r#"
    FROM device_software_validation_results r
    JOIN devices d ON d.id = r.device_id
    LEFT JOIN platforms p ON p.id = d.platform_id
    LEFT JOIN device_types dt ON dt.id = d.device_type_id
"#;

#[derive(Clone)]
pub struct DeviceResultRepository {
    pool: PgPool,
}

impl DeviceResultRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        filter: &ValidationResultFilter,
        page: PageRequest,
    ) -> Result<Page<DeviceSoftwareValidationResult>, DbError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM device_software_validation_results r");
        push_result_filters(&mut count, filter);
        let total_count = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut select = QueryBuilder::new(DEVICE_SELECT);
        push_result_filters(&mut select, filter);
        select
            .push(" ORDER BY d.name LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = select
            .build_query_as::<DeviceResultRow>()
            .fetch_all(&self.pool)
            .await?;

        Page::new(rows, page, total_count).try_map(DeviceResultRow::into_domain)
    }

    /// Insert or overwrite one result per device
    pub async fn upsert_many(&self, results: &[ValidationResultInput]) -> Result<u64, DbError> {
        let mut tx = self.pool.begin().await?;
        let mut written = 0;
        for result in results {
            written += sqlx::query(
                r#"
                INSERT INTO device_software_validation_results (
                    id, device_id, software_id, is_validated, last_run, run_type
                ) VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (device_id) DO UPDATE SET
                    software_id = EXCLUDED.software_id,
                    is_validated = EXCLUDED.is_validated,
                    last_run = EXCLUDED.last_run,
                    run_type = EXCLUDED.run_type,
                    last_updated = NOW()
                "#,
            )
            .bind(uuid::Uuid::new_v4())
            .bind(result.subject)
            .bind(result.software)
            .bind(result.is_validated)
            .bind(result.last_run)
            .bind(result.run_type.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }
        tx.commit().await?;

        tracing::info!(written = written, "Stored device validation results");
        Ok(written)
    }

    fn push_report_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &DeviceReportFilter) {
        qb.push(" WHERE TRUE");
        if let Some(platform) = &filter.platform {
            qb.push(" AND p.name = ").push_bind(platform.clone());
        }
        if let Some(model) = &filter.device_type {
            qb.push(" AND dt.model = ").push_bind(model.clone());
        }
        if let Some(device) = &filter.device {
            qb.push(" AND d.name = ").push_bind(device.clone());
        }
        push_last_run(qb, filter.last_run_after, filter.last_run_before);
    }

    async fn grouped(
        &self,
        column: &str,
        filter: &DeviceReportFilter,
        tail: impl FnOnce(&mut QueryBuilder<'_, Postgres>),
    ) -> Result<Vec<GroupTally>, DbError> {
        let mut qb = QueryBuilder::new(format!(
            "SELECT {} AS label, {} {}",
            column, COUNT_COLUMNS, DEVICE_REPORT_FROM
        ));
        Self::push_report_filters(&mut qb, filter);
        qb.push(format!(" GROUP BY {}", column));
        tail(&mut qb);
        let rows = qb
            .build_query_as::<GroupCountRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(GroupCountRow::into_domain).collect())
    }
}

#[async_trait]
impl ValidationResultStore for DeviceResultRepository {
    type Filter = DeviceReportFilter;

    async fn latest_full_run(&self) -> Result<Option<DateTime<Utc>>, DbError> {
        latest_full_run(&self.pool, "device_software_validation_results").await
    }

    async fn global_counts(&self, filter: &DeviceReportFilter) -> Result<Counts, DbError> {
        let mut qb = QueryBuilder::new(format!("SELECT {} {}", COUNT_COLUMNS, DEVICE_REPORT_FROM));
        Self::push_report_filters(&mut qb, filter);
        Ok(qb.build_query_as::<Counts>().fetch_one(&self.pool).await?)
    }

    async fn group_counts(&self, filter: &DeviceReportFilter) -> Result<Vec<GroupTally>, DbError> {
        self.grouped("p.name", filter, |qb| {
            qb.push(" ORDER BY total DESC, label");
        })
        .await
    }

    async fn row_counts(
        &self,
        filter: &DeviceReportFilter,
        page: PageRequest,
    ) -> Result<Page<GroupTally>, DbError> {
        let mut count = QueryBuilder::new(format!(
            "SELECT COUNT(*) FROM (SELECT dt.model {}",
            DEVICE_REPORT_FROM
        ));
        Self::push_report_filters(&mut count, filter);
        count.push(" GROUP BY dt.model) g");
        let total_count = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let rows = self
            .grouped("dt.model", filter, |qb| {
                qb.push(VALID_RATIO_ORDER)
                    .push(" LIMIT ")
                    .push_bind(page.limit())
                    .push(" OFFSET ")
                    .push_bind(page.offset());
            })
            .await?;
        Ok(Page::new(rows, page, total_count))
    }
}

// ============================================================================
// Inventory items
// ============================================================================

const INVENTORY_SELECT: &str = r#"
    SELECT r.id, r.inventory_item_id, ii.name AS inventory_item_name,
           d.id AS device_id, d.name AS device_name, r.software_id,
           s.platform_id AS software_platform_id, s.version AS software_version,
           r.is_validated, r.last_run, r.run_type, r.last_updated
    FROM inventory_item_software_validation_results r
    JOIN inventory_items ii ON ii.id = r.inventory_item_id
    JOIN devices d ON d.id = ii.device_id
    LEFT JOIN software_lcm s ON s.id = r.software_id
"#;

const INVENTORY_REPORT_FROM: &str = r#"
    FROM inventory_item_software_validation_results r
    JOIN inventory_items ii ON ii.id = r.inventory_item_id
    LEFT JOIN manufacturers m ON m.id = ii.manufacturer_id
    LEFT JOIN devices d ON d.id = ii.device_id
"#;

#[derive(Clone)]
pub struct InventoryItemResultRepository {
    pool: PgPool,
}

impl InventoryItemResultRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        filter: &ValidationResultFilter,
        page: PageRequest,
    ) -> Result<Page<InventoryItemSoftwareValidationResult>, DbError> {
        let mut count = QueryBuilder::new(
            "SELECT COUNT(*) FROM inventory_item_software_validation_results r",
        );
        push_result_filters(&mut count, filter);
        let total_count = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut select = QueryBuilder::new(INVENTORY_SELECT);
        push_result_filters(&mut select, filter);
        select
            .push(" ORDER BY d.name, ii.name LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = select
            .build_query_as::<InventoryItemResultRow>()
            .fetch_all(&self.pool)
            .await?;

        Page::new(rows, page, total_count).try_map(InventoryItemResultRow::into_domain)
    }

    /// Insert or overwrite one result per inventory item
    pub async fn upsert_many(&self, results: &[ValidationResultInput]) -> Result<u64, DbError> {
        let mut tx = self.pool.begin().await?;
        let mut written = 0;
        for result in results {
            written += sqlx::query(
                r#"
                INSERT INTO inventory_item_software_validation_results (
                    id, inventory_item_id, software_id, is_validated, last_run, run_type
                ) VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (inventory_item_id) DO UPDATE SET
                    software_id = EXCLUDED.software_id,
                    is_validated = EXCLUDED.is_validated,
                    last_run = EXCLUDED.last_run,
                    run_type = EXCLUDED.run_type,
                    last_updated = NOW()
                "#,
            )
            .bind(uuid::Uuid::new_v4())
            .bind(result.subject)
            .bind(result.software)
            .bind(result.is_validated)
            .bind(result.last_run)
            .bind(result.run_type.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }
        tx.commit().await?;

        tracing::info!(written = written, "Stored inventory item validation results");
        Ok(written)
    }

    fn push_report_filters(
        qb: &mut QueryBuilder<'_, Postgres>,
        filter: &InventoryItemReportFilter,
    ) {
        qb.push(" WHERE TRUE");
        if let Some(manufacturer) = &filter.manufacturer {
            qb.push(" AND m.name = ").push_bind(manufacturer.clone());
        }
        if let Some(part_id) = &filter.part_id {
            qb.push(" AND ii.part_id = ").push_bind(part_id.clone());
        }
        if let Some(device) = &filter.device {
            qb.push(" AND d.name = ").push_bind(device.clone());
        }
        if let Some(item) = &filter.inventory_item {
            qb.push(" AND ii.name = ").push_bind(item.clone());
        }
        push_last_run(qb, filter.last_run_after, filter.last_run_before);
    }

    async fn grouped(
        &self,
        column: &str,
        filter: &InventoryItemReportFilter,
        tail: impl FnOnce(&mut QueryBuilder<'_, Postgres>),
    ) -> Result<Vec<GroupTally>, DbError> {
        let mut qb = QueryBuilder::new(format!(
            "SELECT {} AS label, {} {}",
            column, COUNT_COLUMNS, INVENTORY_REPORT_FROM
        ));
        Self::push_report_filters(&mut qb, filter);
        qb.push(format!(" GROUP BY {}", column));
        tail(&mut qb);
        let rows = qb
            .build_query_as::<GroupCountRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(GroupCountRow::into_domain).collect())
    }
}

#[async_trait]
impl ValidationResultStore for InventoryItemResultRepository {
    type Filter = InventoryItemReportFilter;

    async fn latest_full_run(&self) -> Result<Option<DateTime<Utc>>, DbError> {
        latest_full_run(&self.pool, "inventory_item_software_validation_results").await
    }

    async fn global_counts(&self, filter: &InventoryItemReportFilter) -> Result<Counts, DbError> {
        let mut qb = QueryBuilder::new(format!(
            "SELECT {} {}",
            COUNT_COLUMNS, INVENTORY_REPORT_FROM
        ));
        Self::push_report_filters(&mut qb, filter);
        Ok(qb.build_query_as::<Counts>().fetch_one(&self.pool).await?)
    }

    async fn group_counts(
        &self,
        filter: &InventoryItemReportFilter,
    ) -> Result<Vec<GroupTally>, DbError> {
        self.grouped("m.name", filter, |qb| {
            qb.push(" ORDER BY total DESC, label");
        })
        .await
    }

    async fn row_counts(
        &self,
        filter: &InventoryItemReportFilter,
        page: PageRequest,
    ) -> Result<Page<GroupTally>, DbError> {
        let mut count = QueryBuilder::new(format!(
            "SELECT COUNT(*) FROM (SELECT ii.name {}",
            INVENTORY_REPORT_FROM
        ));
        Self::push_report_filters(&mut count, filter);
        count.push(" GROUP BY ii.name) g");
        let total_count = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let rows = self
            .grouped("ii.name", filter, |qb| {
                qb.push(VALID_RATIO_ORDER)
                    .push(" LIMIT ")
                    .push_bind(page.limit())
                    .push(" OFFSET ")
                    .push_bind(page.offset());
            })
            .await?;
        Ok(Page::new(rows, page, total_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_device_report_filters() {
        let mut qb = QueryBuilder::new("SELECT 1 FROM x");
        DeviceResultRepository::push_report_filters(
            &mut qb,
            &DeviceReportFilter {
                platform: Some("cisco_ios".to_string()),
                last_run_after: NaiveDate::from_ymd_opt(2024, 1, 1),
                ..DeviceReportFilter::default()
            },
        );
        let sql = qb.sql();
        assert!(sql.contains("p.name = $1"));
        assert!(sql.contains("r.last_run::date >= $2"));
        assert!(!sql.contains("dt.model ="));
    }

    #[test]
    fn test_inventory_report_filters() {
        let mut qb = QueryBuilder::new("SELECT 1 FROM x");
        InventoryItemResultRepository::push_report_filters(
            &mut qb,
            &InventoryItemReportFilter {
                part_id: Some("WS-X4748".to_string()),
                inventory_item: Some("Linecard 1".to_string()),
                ..InventoryItemReportFilter::default()
            },
        );
        let sql = qb.sql();
        assert!(sql.contains("ii.part_id = $1"));
        assert!(sql.contains("ii.name = $2"));
    }

    #[test]
    fn test_result_filters() {
        let mut qb = QueryBuilder::new("SELECT 1 FROM x r");
        push_result_filters(
            &mut qb,
            &ValidationResultFilter {
                software: None,
                is_validated: Some(false),
                run_type: Some(RunType::Full),
            },
        );
        let sql = qb.sql();
        assert!(sql.contains("r.is_validated = $1"));
        assert!(sql.contains("r.run_type = $2"));
    }

    use chrono::TimeZone;
    use uuid::Uuid;

    use crate::db::repository::DcimRepository;
    use crate::model::dcim::{
        DcimSnapshot, DeviceInput, DeviceTypeInput, ManufacturerInput, PlatformInput,
    };

    struct SeededDevices {
        model: String,
        /// Device ids per platform, platform names in seed order
        platforms: Vec<(String, Vec<Uuid>)>,
        /// One software release per platform
        software: Vec<Uuid>,
    }

    /// Devices of one fresh device type spread over fresh platforms
    async fn seed_devices(pool: &PgPool, per_platform: &[usize]) -> SeededDevices {
        let tag = Uuid::new_v4();
        let manufacturer = Uuid::new_v4();
        let device_type = Uuid::new_v4();
        let model = format!("model-{}", tag);
        let mut snapshot = DcimSnapshot {
            manufacturers: vec![ManufacturerInput {
                id: manufacturer,
                name: format!("vendor-{}", tag),
            }],
            device_types: vec![DeviceTypeInput {
                id: device_type,
                manufacturer,
                model: model.clone(),
                part_number: None,
            }],
            ..DcimSnapshot::default()
        };

        let mut platforms = Vec::new();
        let mut platform_ids = Vec::new();
        for (i, count) in per_platform.iter().enumerate() {
            let platform = Uuid::new_v4();
            let name = format!("os{}-{}", i, tag);
            snapshot.platforms.push(PlatformInput {
                id: platform,
                name: name.clone(),
                manufacturer: Some(manufacturer),
            });
            let mut devices = Vec::new();
            for n in 0..*count {
                let id = Uuid::new_v4();
                snapshot.devices.push(DeviceInput {
                    id,
                    name: format!("dev{}-{}-{}", i, n, tag),
                    device_type,
                    platform: Some(platform),
                });
                devices.push(id);
            }
            platforms.push((name, devices));
            platform_ids.push(platform);
        }
        DcimRepository::new(pool.clone()).sync(&snapshot).await.unwrap();

        let mut software = Vec::new();
        for platform in platform_ids {
            let id = Uuid::new_v4();
            sqlx::query("INSERT INTO software_lcm (id, platform_id, version) VALUES ($1, $2, $3)")
                .bind(id)
                .bind(platform)
                .bind("1.0.0")
                .execute(pool)
                .await
                .unwrap();
            software.push(id);
        }

        SeededDevices {
            model,
            platforms,
            software,
        }
    }

    fn full_run(
        device: Uuid,
        software: Option<Uuid>,
        is_validated: bool,
        last_run: DateTime<Utc>,
    ) -> ValidationResultInput {
        ValidationResultInput {
            subject: device,
            software,
            is_validated,
            last_run,
            run_type: RunType::Full,
        }
    }

    #[tokio::test]
    #[ignore] // Requires PostgreSQL
    async fn test_latest_full_run_is_job_run_time() {
        let pool = crate::db::create_pool().await.unwrap();
        crate::db::init_schema(&pool).await.unwrap();
        let seeded = seed_devices(&pool, &[1]).await;
        let repo = DeviceResultRepository::new(pool);

        // Written now, run hours earlier
        let run = Utc.with_ymd_and_hms(2024, 3, 1, 6, 0, 0).unwrap();
        let device = seeded.platforms[0].1[0];
        repo.upsert_many(&[full_run(device, Some(seeded.software[0]), true, run)])
            .await
            .unwrap();

        assert_eq!(repo.latest_full_run().await.unwrap(), Some(run));
    }

    #[tokio::test]
    #[ignore] // Requires PostgreSQL
    async fn test_report_counts_on_seeded_results() {
        let pool = crate::db::create_pool().await.unwrap();
        crate::db::init_schema(&pool).await.unwrap();
        let seeded = seed_devices(&pool, &[3, 1, 1]).await;
        let repo = DeviceResultRepository::new(pool);

        let run = Utc.with_ymd_and_hms(2024, 3, 1, 6, 0, 0).unwrap();
        let large = &seeded.platforms[0].1;
        let small = &seeded.platforms[1].1;
        let written = repo
            .upsert_many(&[
                full_run(large[0], Some(seeded.software[0]), true, run),
                full_run(large[1], Some(seeded.software[0]), false, run),
                full_run(large[2], None, false, run),
                full_run(small[0], Some(seeded.software[1]), true, run),
            ])
            .await
            .unwrap();
        assert_eq!(written, 4);

        let filter = DeviceReportFilter {
            device_type: Some(seeded.model.clone()),
            ..DeviceReportFilter::default()
        };

        let counts = repo.global_counts(&filter).await.unwrap();
        assert_eq!(counts, Counts::new(4, 2, 1, 1));
        assert!(counts.is_consistent());

        let groups = repo.group_counts(&filter).await.unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].label.as_deref(), Some(seeded.platforms[0].0.as_str()));
        assert_eq!(groups[0].counts, Counts::new(3, 1, 1, 1));
        assert!(groups.windows(2).all(|w| w[0].counts.total >= w[1].counts.total));
        assert!(groups.iter().all(|g| g.counts.is_consistent()));

        let rows = repo.row_counts(&filter, PageRequest::default()).await.unwrap();
        assert_eq!(rows.total_count, 1);
        assert_eq!(rows.results[0].valid_percent, 50.0);

        // A later partial run does not move the report freshness
        let partial = ValidationResultInput {
            run_type: RunType::SingleObject,
            ..full_run(
                seeded.platforms[2].1[0],
                Some(seeded.software[2]),
                true,
                run + chrono::Duration::hours(3),
            )
        };
        repo.upsert_many(&[partial]).await.unwrap();
        assert_eq!(repo.latest_full_run().await.unwrap(), Some(run));
    }

    #[tokio::test]
    #[ignore] // Requires PostgreSQL
    async fn test_empty_cache_reports_zero() {
        let pool = crate::db::create_pool().await.unwrap();
        crate::db::init_schema(&pool).await.unwrap();
        let repo = DeviceResultRepository::new(pool);

        let filter = DeviceReportFilter {
            device: Some(format!("missing-{}", uuid::Uuid::new_v4())),
            ..DeviceReportFilter::default()
        };
        let counts = repo.global_counts(&filter).await.unwrap();
        assert_eq!(counts, Counts::default());
        assert!(repo.group_counts(&filter).await.unwrap().is_empty());
        let rows = repo.row_counts(&filter, PageRequest::default()).await.unwrap();
        assert_eq!(rows.total_count, 0);
    }
}
