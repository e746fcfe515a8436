//! Repository for contract providers

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{not_found, Repository};
use crate::db::models::{Page, PageRequest, ProviderRow};
use crate::db::DbError;
use crate::model::contract::{ProviderLcm, ProviderLcmFilter, ProviderLcmInput};

const SELECT: &str = r#"
    SELECT id, name, description, physical_address, contact_name,
           contact_phone, contact_email, comments
    FROM provider_lcm
"#;

#[derive(Clone)]
pub struct ProviderRepository {
    pool: PgPool,
}

impl ProviderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProviderLcmFilter) {
        qb.push(" WHERE TRUE");
        if let Some(name) = &filter.name {
            qb.push(" AND name ILIKE ")
                .push_bind(format!("%{}%", name));
        }
    }

    /// Fail with `NotFound` unless the provider exists
    pub async fn ensure_exists(&self, id: Uuid) -> Result<(), DbError> {
        let found: Option<(i32,)> = sqlx::query_as("SELECT 1 FROM provider_lcm WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        found.map(|_| ()).ok_or_else(|| not_found(Self::NAME, id))
    }
}

#[async_trait]
impl Repository for ProviderRepository {
    type Record = ProviderLcm;
    type Input = ProviderLcmInput;
    type Filter = ProviderLcmFilter;

    const NAME: &'static str = "Provider";

    async fn list(
        &self,
        filter: &ProviderLcmFilter,
        page: PageRequest,
    ) -> Result<Page<ProviderLcm>, DbError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM provider_lcm");
        Self::push_filters(&mut count, filter);
        let total_count = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut select = QueryBuilder::new(SELECT);
        Self::push_filters(&mut select, filter);
        select
            .push(" ORDER BY name LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = select
            .build_query_as::<ProviderRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(
            rows.into_iter().map(ProviderRow::into_domain).collect(),
            page,
            total_count,
        ))
    }

    async fn get(&self, id: Uuid) -> Result<ProviderLcm, DbError> {
        let row: ProviderRow = sqlx::query_as(&format!("{} WHERE id = $1", SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(Self::NAME, id))?;
        Ok(row.into_domain())
    }

    async fn create(&self, input: &ProviderLcmInput) -> Result<ProviderLcm, DbError> {
        let row: ProviderRow = sqlx::query_as(
            r#"
            INSERT INTO provider_lcm (
                id, name, description, physical_address, contact_name,
                contact_phone, contact_email, comments
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, name, description, physical_address, contact_name,
                      contact_phone, contact_email, comments
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.physical_address)
        .bind(&input.contact_name)
        .bind(&input.contact_phone)
        .bind(&input.contact_email)
        .bind(&input.comments)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(id = %row.id, name = %row.name, "Created provider");
        Ok(row.into_domain())
    }

    async fn update(&self, id: Uuid, input: &ProviderLcmInput) -> Result<ProviderLcm, DbError> {
        let row: ProviderRow = sqlx::query_as(
            r#"
            UPDATE provider_lcm SET
                name = $2,
                description = $3,
                physical_address = $4,
                contact_name = $5,
                contact_phone = $6,
                contact_email = $7,
                comments = $8
            WHERE id = $1
            RETURNING id, name, description, physical_address, contact_name,
                      contact_phone, contact_email, comments
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.physical_address)
        .bind(&input.contact_name)
        .bind(&input.contact_phone)
        .bind(&input.contact_email)
        .bind(&input.comments)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(Self::NAME, id))?;

        tracing::debug!(id = %id, "Updated provider");
        Ok(row.into_domain())
    }

    async fn delete(&self, id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM provider_lcm WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found(Self::NAME, id));
        }
        tracing::debug!(id = %id, "Deleted provider");
        Ok(())
    }
}
