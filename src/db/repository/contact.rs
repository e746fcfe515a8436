//! Repository for contract contacts

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{not_found, Repository};
use crate::db::models::{ContactRow, Page, PageRequest};
use crate::db::DbError;
use crate::model::contract::{ContactLcm, ContactLcmFilter, ContactLcmInput};

const SELECT: &str = r#"
    SELECT ct.id, ct.contract_id, c.name AS contract_name, ct.name, ct.address,
           ct.phone, ct.email, ct.comments, ct.priority, ct.contact_type
    FROM contact_lcm ct
    JOIN contract_lcm c ON c.id = ct.contract_id
"#;

#[derive(Clone)]
pub struct ContactRepository {
    pool: PgPool,
}

impl ContactRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ContactLcmFilter) {
        qb.push(" WHERE TRUE");
        if let Some(contract) = filter.contract {
            qb.push(" AND ct.contract_id = ").push_bind(contract);
        }
        if let Some(contact_type) = filter.contact_type {
            qb.push(" AND ct.contact_type = ")
                .push_bind(contact_type.as_str());
        }
    }

    /// All contacts of a contract, unpaginated
    pub async fn for_contract(&self, contract: Uuid) -> Result<Vec<ContactLcm>, DbError> {
        let rows: Vec<ContactRow> = sqlx::query_as(&format!(
            "{} WHERE ct.contract_id = $1 ORDER BY ct.contact_type, ct.priority, ct.name",
            SELECT
        ))
        .bind(contract)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(ContactRow::into_domain).collect()
    }
}

#[async_trait]
impl Repository for ContactRepository {
    type Record = ContactLcm;
    type Input = ContactLcmInput;
    type Filter = ContactLcmFilter;

    const NAME: &'static str = "Contact";

    async fn list(
        &self,
        filter: &ContactLcmFilter,
        page: PageRequest,
    ) -> Result<Page<ContactLcm>, DbError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM contact_lcm ct");
        Self::push_filters(&mut count, filter);
        let total_count = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut select = QueryBuilder::new(SELECT);
        Self::push_filters(&mut select, filter);
        select
            .push(" ORDER BY ct.contact_type, ct.priority, ct.name LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = select
            .build_query_as::<ContactRow>()
            .fetch_all(&self.pool)
            .await?;

        Page::new(rows, page, total_count).try_map(ContactRow::into_domain)
    }

    async fn get(&self, id: Uuid) -> Result<ContactLcm, DbError> {
        let row: ContactRow = sqlx::query_as(&format!("{} WHERE ct.id = $1", SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(Self::NAME, id))?;
        row.into_domain()
    }

    async fn create(&self, input: &ContactLcmInput) -> Result<ContactLcm, DbError> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO contact_lcm (
                id, contract_id, name, address, phone, email, comments, priority, contact_type
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(id)
        .bind(input.contract)
        .bind(&input.name)
        .bind(&input.address)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.comments)
        .bind(input.priority)
        .bind(input.contact_type.as_str())
        .execute(&self.pool)
        .await?;

        tracing::debug!(id = %id, contract = %input.contract, "Created contact");
        self.get(id).await
    }

    async fn update(&self, id: Uuid, input: &ContactLcmInput) -> Result<ContactLcm, DbError> {
        let result = sqlx::query(
            r#"
            UPDATE contact_lcm SET
                contract_id = $2,
                name = $3,
                address = $4,
                phone = $5,
                email = $6,
                comments = $7,
                priority = $8,
                contact_type = $9
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(input.contract)
        .bind(&input.name)
        .bind(&input.address)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.comments)
        .bind(input.priority)
        .bind(input.contact_type.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(Self::NAME, id));
        }
        tracing::debug!(id = %id, "Updated contact");
        self.get(id).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM contact_lcm WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found(Self::NAME, id));
        }
        tracing::debug!(id = %id, "Deleted contact");
        Ok(())
    }
}
