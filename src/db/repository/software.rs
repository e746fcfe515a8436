//! Repository for software releases

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{not_found, Repository};
use crate::db::models::{Page, PageRequest, SoftwareRow};
use crate::db::DbError;
use crate::model::software::{SoftwareLcm, SoftwareLcmFilter, SoftwareLcmInput};

const SELECT: &str = r#"
    SELECT s.id, s.platform_id, p.name AS platform_name, s.version, s.alias,
           s.release_date, s.end_of_support, s.documentation_url, s.download_url,
           s.image_file_name, s.image_file_checksum, s.long_term_support,
           s.pre_release, s.tags
    FROM software_lcm s
    JOIN platforms p ON p.id = s.platform_id
"#;

#[derive(Clone)]
pub struct SoftwareRepository {
    pool: PgPool,
}

impl SoftwareRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &SoftwareLcmFilter) {
        qb.push(" WHERE TRUE");
        if let Some(platform) = filter.device_platform {
            qb.push(" AND s.platform_id = ").push_bind(platform);
        }
        if let Some(version) = &filter.version {
            qb.push(" AND s.version = ").push_bind(version.clone());
        }
        if let Some(lts) = filter.long_term_support {
            qb.push(" AND s.long_term_support = ").push_bind(lts);
        }
        if let Some(pre) = filter.pre_release {
            qb.push(" AND s.pre_release = ").push_bind(pre);
        }
    }
}

#[async_trait]
impl Repository for SoftwareRepository {
    type Record = SoftwareLcm;
    type Input = SoftwareLcmInput;
    type Filter = SoftwareLcmFilter;

    const NAME: &'static str = "Software";

    async fn list(
        &self,
        filter: &SoftwareLcmFilter,
        page: PageRequest,
    ) -> Result<Page<SoftwareLcm>, DbError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM software_lcm s");
        Self::push_filters(&mut count, filter);
        let total_count = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut select = QueryBuilder::new(SELECT);
        Self::push_filters(&mut select, filter);
        select
            .push(" ORDER BY p.name, s.version")
            .push(" LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = select
            .build_query_as::<SoftwareRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(
            rows.into_iter().map(SoftwareRow::into_domain).collect(),
            page,
            total_count,
        ))
    }

    async fn get(&self, id: Uuid) -> Result<SoftwareLcm, DbError> {
        let row: SoftwareRow = sqlx::query_as(&format!("{} WHERE s.id = $1", SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(Self::NAME, id))?;
        Ok(row.into_domain())
    }

    async fn create(&self, input: &SoftwareLcmInput) -> Result<SoftwareLcm, DbError> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO software_lcm (
                id, platform_id, version, alias, release_date, end_of_support,
                documentation_url, download_url, image_file_name, image_file_checksum,
                long_term_support, pre_release, tags
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(id)
        .bind(input.device_platform)
        .bind(&input.version)
        .bind(&input.alias)
        .bind(input.release_date)
        .bind(input.end_of_support)
        .bind(&input.documentation_url)
        .bind(&input.download_url)
        .bind(&input.image_file_name)
        .bind(&input.image_file_checksum)
        .bind(input.long_term_support)
        .bind(input.pre_release)
        .bind(&input.tags)
        .execute(&self.pool)
        .await?;

        tracing::debug!(id = %id, version = %input.version, "Created software");
        self.get(id).await
    }

    async fn update(&self, id: Uuid, input: &SoftwareLcmInput) -> Result<SoftwareLcm, DbError> {
        let result = sqlx::query(
            r#"
            UPDATE software_lcm SET
                platform_id = $2,
                version = $3,
                alias = $4,
                release_date = $5,
                end_of_support = $6,
                documentation_url = $7,
                download_url = $8,
                image_file_name = $9,
                image_file_checksum = $10,
                long_term_support = $11,
                pre_release = $12,
                tags = $13
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(input.device_platform)
        .bind(&input.version)
        .bind(&input.alias)
        .bind(input.release_date)
        .bind(input.end_of_support)
        .bind(&input.documentation_url)
        .bind(&input.download_url)
        .bind(&input.image_file_name)
        .bind(&input.image_file_checksum)
        .bind(input.long_term_support)
        .bind(input.pre_release)
        .bind(&input.tags)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(Self::NAME, id));
        }
        tracing::debug!(id = %id, "Updated software");
        self.get(id).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM software_lcm WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found(Self::NAME, id));
        }
        tracing::debug!(id = %id, "Deleted software");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters_bind_each_field() {
        let mut qb = QueryBuilder::new("SELECT 1 FROM software_lcm s");
        SoftwareRepository::push_filters(
            &mut qb,
            &SoftwareLcmFilter {
                device_platform: Some(Uuid::new_v4()),
                version: Some("17.3.3".to_string()),
                long_term_support: Some(true),
                pre_release: None,
            },
        );
        let sql = qb.sql();
        assert!(sql.contains("s.platform_id = $1"));
        assert!(sql.contains("s.version = $2"));
        assert!(sql.contains("s.long_term_support = $3"));
        assert!(!sql.contains("pre_release"));
    }

    #[tokio::test]
    #[ignore] // Requires PostgreSQL
    async fn test_unknown_platform_is_invalid_reference() {
        let pool = crate::db::create_pool().await.unwrap();
        crate::db::init_schema(&pool).await.unwrap();
        let repo = SoftwareRepository::new(pool);

        let input = SoftwareLcmInput {
            device_platform: Uuid::new_v4(),
            version: "1.0".to_string(),
            alias: None,
            release_date: None,
            end_of_support: None,
            documentation_url: None,
            download_url: None,
            image_file_name: None,
            image_file_checksum: None,
            long_term_support: false,
            pre_release: false,
            tags: vec![],
        };
        let err = repo.create(&input).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidReference(_)));
    }
}
