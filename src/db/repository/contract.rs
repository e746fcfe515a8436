//! Repository for support contracts

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{not_found, today, Repository};
use crate::db::models::{ContractRow, Page, PageRequest};
use crate::db::DbError;
use crate::model::contract::{ContractLcm, ContractLcmFilter, ContractLcmInput};

const SELECT: &str = r#"
    SELECT c.id, c.provider_id, p.name AS provider_name, c.name, c.start_date,
           c.end_date, c.cost, c.support_level, c.contract_type
    FROM contract_lcm c
    JOIN provider_lcm p ON p.id = c.provider_id
"#;

#[derive(Clone)]
pub struct ContractRepository {
    pool: PgPool,
}

impl ContractRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ContractLcmFilter) {
        qb.push(" WHERE TRUE");
        if let Some(provider) = filter.provider {
            qb.push(" AND c.provider_id = ").push_bind(provider);
        }
        if let Some(name) = &filter.name {
            qb.push(" AND c.name = ").push_bind(name.clone());
        }
        match filter.expired {
            Some(true) => {
                qb.push(" AND c.end_date <= ").push_bind(today());
            }
            Some(false) => {
                qb.push(" AND (c.end_date IS NULL OR c.end_date > ")
                    .push_bind(today())
                    .push(")");
            }
            None => {}
        }
    }

    /// Fail with `NotFound` unless the contract exists
    pub async fn ensure_exists(&self, id: Uuid) -> Result<(), DbError> {
        let found: Option<(i32,)> = sqlx::query_as("SELECT 1 FROM contract_lcm WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        found.map(|_| ()).ok_or_else(|| not_found(Self::NAME, id))
    }

    /// All contracts of a provider, unpaginated
    pub async fn for_provider(&self, provider: Uuid) -> Result<Vec<ContractLcm>, DbError> {
        let rows: Vec<ContractRow> = sqlx::query_as(&format!(
            "{} WHERE c.provider_id = $1 ORDER BY c.end_date NULLS LAST, c.name",
            SELECT
        ))
        .bind(provider)
        .fetch_all(&self.pool)
        .await?;
        let today = today();
        Ok(rows.into_iter().map(|row| row.into_domain(today)).collect())
    }
}

#[async_trait]
impl Repository for ContractRepository {
    type Record = ContractLcm;
    type Input = ContractLcmInput;
    type Filter = ContractLcmFilter;

    const NAME: &'static str = "Contract";

    async fn list(
        &self,
        filter: &ContractLcmFilter,
        page: PageRequest,
    ) -> Result<Page<ContractLcm>, DbError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM contract_lcm c");
        Self::push_filters(&mut count, filter);
        let total_count = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut select = QueryBuilder::new(SELECT);
        Self::push_filters(&mut select, filter);
        select
            .push(" ORDER BY c.end_date NULLS LAST, c.name LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = select
            .build_query_as::<ContractRow>()
            .fetch_all(&self.pool)
            .await?;

        let today = today();
        Ok(Page::new(
            rows.into_iter().map(|row| row.into_domain(today)).collect(),
            page,
            total_count,
        ))
    }

    async fn get(&self, id: Uuid) -> Result<ContractLcm, DbError> {
        let row: ContractRow = sqlx::query_as(&format!("{} WHERE c.id = $1", SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(Self::NAME, id))?;
        Ok(row.into_domain(today()))
    }

    async fn create(&self, input: &ContractLcmInput) -> Result<ContractLcm, DbError> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO contract_lcm (
                id, provider_id, name, start_date, end_date, cost, support_level, contract_type
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(id)
        .bind(input.provider)
        .bind(&input.name)
        .bind(input.start)
        .bind(input.end)
        .bind(input.cost)
        .bind(&input.support_level)
        .bind(&input.contract_type)
        .execute(&self.pool)
        .await?;

        tracing::debug!(id = %id, name = %input.name, "Created contract");
        self.get(id).await
    }

    async fn update(&self, id: Uuid, input: &ContractLcmInput) -> Result<ContractLcm, DbError> {
        let result = sqlx::query(
            r#"
            UPDATE contract_lcm SET
                provider_id = $2,
                name = $3,
                start_date = $4,
                end_date = $5,
                cost = $6,
                support_level = $7,
                contract_type = $8
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(input.provider)
        .bind(&input.name)
        .bind(input.start)
        .bind(input.end)
        .bind(input.cost)
        .bind(&input.support_level)
        .bind(&input.contract_type)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(Self::NAME, id));
        }
        tracing::debug!(id = %id, "Updated contract");
        self.get(id).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM contract_lcm WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found(Self::NAME, id));
        }
        tracing::debug!(id = %id, "Deleted contract");
        Ok(())
    }
}
