//! Repository for hardware end-of-life notices

use async_trait::async_trait;
use futures::future::try_join_all;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{dcim, not_found, today, Repository};
use crate::db::models::{HardwareRow, Page, PageRequest};
use crate::db::DbError;
use crate::model::hardware::{HardwareLcm, HardwareLcmFilter, HardwareLcmInput};

const SELECT: &str = r#"
    SELECT h.id, h.device_type_id, dt.model AS device_type_model,
           m.id AS manufacturer_id, m.name AS manufacturer_name,
           h.inventory_item, h.release_date, h.end_of_sale, h.end_of_support,
           h.end_of_sw_releases, h.end_of_security_patches, h.documentation_url
    FROM hardware_lcm h
    LEFT JOIN device_types dt ON dt.id = h.device_type_id
    LEFT JOIN manufacturers m ON m.id = dt.manufacturer_id
"#;

const EXPIRY: &str = "COALESCE(h.end_of_support, h.end_of_sale)";

#[derive(Clone)]
pub struct HardwareRepository {
    pool: PgPool,
}

impl HardwareRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &HardwareLcmFilter) {
        qb.push(" WHERE TRUE");
        if let Some(device_type) = filter.device_type {
            qb.push(" AND h.device_type_id = ").push_bind(device_type);
        }
        if let Some(part) = &filter.inventory_item {
            qb.push(" AND h.inventory_item = ").push_bind(part.clone());
        }
        match filter.expired {
            Some(true) => {
                qb.push(format!(" AND {} <= ", EXPIRY)).push_bind(today());
            }
            Some(false) => {
                qb.push(format!(" AND ({0} IS NULL OR {0} > ", EXPIRY))
                    .push_bind(today())
                    .push(")");
            }
            None => {}
        }
    }

    async fn hydrate(&self, row: HardwareRow) -> Result<HardwareLcm, DbError> {
        let devices = dcim::devices_for_hardware(
            &self.pool,
            row.device_type_id,
            row.inventory_item.as_deref(),
        )
        .await?;
        Ok(row.into_domain(devices, today()))
    }
}

#[async_trait]
impl Repository for HardwareRepository {
    type Record = HardwareLcm;
    type Input = HardwareLcmInput;
    type Filter = HardwareLcmFilter;

    const NAME: &'static str = "Hardware notice";

    async fn list(
        &self,
        filter: &HardwareLcmFilter,
        page: PageRequest,
    ) -> Result<Page<HardwareLcm>, DbError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM hardware_lcm h");
        Self::push_filters(&mut count, filter);
        let total_count = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut select = QueryBuilder::new(SELECT);
        Self::push_filters(&mut select, filter);
        select
            .push(" ORDER BY dt.model NULLS LAST, h.inventory_item")
            .push(" LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = select
            .build_query_as::<HardwareRow>()
            .fetch_all(&self.pool)
            .await?;

        let records = try_join_all(rows.into_iter().map(|row| self.hydrate(row))).await?;
        Ok(Page::new(records, page, total_count))
    }

    async fn get(&self, id: Uuid) -> Result<HardwareLcm, DbError> {
        let row: HardwareRow = sqlx::query_as(&format!("{} WHERE h.id = $1", SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(Self::NAME, id))?;
        self.hydrate(row).await
    }

    async fn create(&self, input: &HardwareLcmInput) -> Result<HardwareLcm, DbError> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO hardware_lcm (
                id, device_type_id, inventory_item, release_date, end_of_sale,
                end_of_support, end_of_sw_releases, end_of_security_patches, documentation_url
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(id)
        .bind(input.device_type)
        .bind(&input.inventory_item)
        .bind(input.release_date)
        .bind(input.end_of_sale)
        .bind(input.end_of_support)
        .bind(input.end_of_sw_releases)
        .bind(input.end_of_security_patches)
        .bind(&input.documentation_url)
        .execute(&self.pool)
        .await?;

        tracing::debug!(id = %id, "Created hardware notice");
        self.get(id).await
    }

    async fn update(&self, id: Uuid, input: &HardwareLcmInput) -> Result<HardwareLcm, DbError> {
        let result = sqlx::query(
            r#"
            UPDATE hardware_lcm SET
                device_type_id = $2,
                inventory_item = $3,
                release_date = $4,
                end_of_sale = $5,
                end_of_support = $6,
                end_of_sw_releases = $7,
                end_of_security_patches = $8,
                documentation_url = $9
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(input.device_type)
        .bind(&input.inventory_item)
        .bind(input.release_date)
        .bind(input.end_of_sale)
        .bind(input.end_of_support)
        .bind(input.end_of_sw_releases)
        .bind(input.end_of_security_patches)
        .bind(&input.documentation_url)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(Self::NAME, id));
        }
        tracing::debug!(id = %id, "Updated hardware notice");
        self.get(id).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM hardware_lcm WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found(Self::NAME, id));
        }
        tracing::debug!(id = %id, "Deleted hardware notice");
        Ok(())
    }
}
