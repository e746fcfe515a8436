//! Repository for validated software policies
//!
//! A policy targets a device, a device type or an inventory item. The target
//! is resolved through [`ACCESSORS`], a table of lookup functions indexed by
//! the [`AssignedToType`] discriminant.

use async_trait::async_trait;
use futures::future::{try_join_all, BoxFuture};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{dcim, not_found, today, Repository};
use crate::db::models::{Page, PageRequest, ValidatedSoftwareRow};
use crate::db::DbError;
use crate::model::validated_software::{
    AssignedObject, AssignedToType, ValidatedSoftwareLcm, ValidatedSoftwareLcmFilter,
    ValidatedSoftwareLcmInput,
};

/// Looks up the nested form of an assignment target
pub type Accessor =
    for<'a> fn(&'a PgPool, Uuid) -> BoxFuture<'a, Result<Option<AssignedObject>, sqlx::Error>>;

/// Indexed by `AssignedToType as usize`
pub static ACCESSORS: [Accessor; 3] = [
    device_accessor,
    device_type_accessor,
    inventory_item_accessor,
];

fn device_accessor(
    pool: &PgPool,
    id: Uuid,
) -> BoxFuture<'_, Result<Option<AssignedObject>, sqlx::Error>> {
    Box::pin(async move { Ok(dcim::device(pool, id).await?.map(AssignedObject::Device)) })
}

fn device_type_accessor(
    pool: &PgPool,
    id: Uuid,
) -> BoxFuture<'_, Result<Option<AssignedObject>, sqlx::Error>> {
    Box::pin(async move {
        Ok(dcim::device_type(pool, id)
            .await?
            .map(AssignedObject::DeviceType))
    })
}

fn inventory_item_accessor(
    pool: &PgPool,
    id: Uuid,
) -> BoxFuture<'_, Result<Option<AssignedObject>, sqlx::Error>> {
    Box::pin(async move {
        Ok(dcim::inventory_item(pool, id)
            .await?
            .map(AssignedObject::InventoryItem))
    })
}

/// Resolve a policy target; `None` when the object no longer exists
pub async fn resolve_assigned(
    pool: &PgPool,
    kind: AssignedToType,
    id: Uuid,
) -> Result<Option<AssignedObject>, DbError> {
    let accessor = ACCESSORS[kind as usize];
    let resolved = accessor(pool, id).await?;
    Ok(resolved.filter(|object| {
        let matches = object.kind() == kind;
        if !matches {
            tracing::warn!(
                kind = %kind,
                resolved = %object.kind(),
                id = %id,
                "Accessor resolved the wrong kind"
            );
        }
        matches
    }))
}

const SELECT: &str = r#"
    SELECT v.id, v.software_id, s.platform_id AS software_platform_id,
           s.version AS software_version, v.assigned_to_content_type,
           v.assigned_to_object_id, v.start_date, v.end_date, v.preferred, v.tags
    FROM validated_software_lcm v
    JOIN software_lcm s ON s.id = v.software_id
"#;

#[derive(Clone)]
pub struct ValidatedSoftwareRepository {
    pool: PgPool,
}

impl ValidatedSoftwareRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ValidatedSoftwareLcmFilter) {
        qb.push(" WHERE TRUE");
        if let Some(software) = filter.software {
            qb.push(" AND v.software_id = ").push_bind(software);
        }
        if let Some(kind) = filter.assigned_to_content_type {
            qb.push(" AND v.assigned_to_content_type = ")
                .push_bind(kind.as_str());
        }
        if let Some(object_id) = filter.assigned_to_object_id {
            qb.push(" AND v.assigned_to_object_id = ")
                .push_bind(object_id);
        }
        if let Some(preferred) = filter.preferred {
            qb.push(" AND v.preferred = ").push_bind(preferred);
        }
        if let Some(valid) = filter.valid {
            let today = today();
            qb.push(if valid { " AND " } else { " AND NOT " })
                .push("(v.start_date <= ")
                .push_bind(today)
                .push(" AND (v.end_date IS NULL OR v.end_date >= ")
                .push_bind(today)
                .push("))");
        }
    }

    async fn hydrate(&self, row: ValidatedSoftwareRow) -> Result<ValidatedSoftwareLcm, DbError> {
        let kind = row.content_type()?;
        let assigned_to = resolve_assigned(&self.pool, kind, row.assigned_to_object_id).await?;
        if assigned_to.is_none() {
            tracing::debug!(
                id = %row.id,
                content_type = %kind,
                object_id = %row.assigned_to_object_id,
                "Policy target no longer exists"
            );
        }
        Ok(row.into_domain(kind, assigned_to, today()))
    }

    async fn ensure_target(&self, input: &ValidatedSoftwareLcmInput) -> Result<(), DbError> {
        let kind = input.assigned_to_content_type;
        let id = input.assigned_to_object_id;
        if resolve_assigned(&self.pool, kind, id).await?.is_none() {
            return Err(DbError::InvalidReference(format!("{} {} does not exist", kind, id)));
        }
        Ok(())
    }
}

#[async_trait]
impl Repository for ValidatedSoftwareRepository {
    type Record = ValidatedSoftwareLcm;
    type Input = ValidatedSoftwareLcmInput;
    type Filter = ValidatedSoftwareLcmFilter;

    const NAME: &'static str = "Validated software";

    async fn list(
        &self,
        filter: &ValidatedSoftwareLcmFilter,
        page: PageRequest,
    ) -> Result<Page<ValidatedSoftwareLcm>, DbError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM validated_software_lcm v");
        Self::push_filters(&mut count, filter);
        let total_count = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut select = QueryBuilder::new(SELECT);
        Self::push_filters(&mut select, filter);
        select
            .push(" ORDER BY v.start_date DESC, s.version")
            .push(" LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = select
            .build_query_as::<ValidatedSoftwareRow>()
            .fetch_all(&self.pool)
            .await?;

        let records = try_join_all(rows.into_iter().map(|row| self.hydrate(row))).await?;
        Ok(Page::new(records, page, total_count))
    }

    async fn get(&self, id: Uuid) -> Result<ValidatedSoftwareLcm, DbError> {
        let row: ValidatedSoftwareRow = sqlx::query_as(&format!("{} WHERE v.id = $1", SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(Self::NAME, id))?;
        self.hydrate(row).await
    }

    async fn create(
        &self,
        input: &ValidatedSoftwareLcmInput,
    ) -> Result<ValidatedSoftwareLcm, DbError> {
        self.ensure_target(input).await?;

        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO validated_software_lcm (
                id, software_id, assigned_to_content_type, assigned_to_object_id,
                start_date, end_date, preferred, tags
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(id)
        .bind(input.software)
        .bind(input.assigned_to_content_type.as_str())
        .bind(input.assigned_to_object_id)
        .bind(input.start)
        .bind(input.end)
        .bind(input.preferred)
        .bind(&input.tags)
        .execute(&self.pool)
        .await?;

        tracing::debug!(
            id = %id,
            content_type = %input.assigned_to_content_type,
            "Created validated software policy"
        );
        self.get(id).await
    }

    async fn update(
        &self,
        id: Uuid,
        input: &ValidatedSoftwareLcmInput,
    ) -> Result<ValidatedSoftwareLcm, DbError> {
        self.ensure_target(input).await?;

        let result = sqlx::query(
            r#"
            UPDATE validated_software_lcm SET
                software_id = $2,
                assigned_to_content_type = $3,
                assigned_to_object_id = $4,
                start_date = $5,
                end_date = $6,
                preferred = $7,
                tags = $8
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(input.software)
        .bind(input.assigned_to_content_type.as_str())
        .bind(input.assigned_to_object_id)
        .bind(input.start)
        .bind(input.end)
        .bind(input.preferred)
        .bind(&input.tags)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(Self::NAME, id));
        }
        tracing::debug!(id = %id, "Updated validated software policy");
        self.get(id).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM validated_software_lcm WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found(Self::NAME, id));
        }
        tracing::debug!(id = %id, "Deleted validated software policy");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessor_table_covers_every_kind() {
        assert_eq!(ACCESSORS.len(), AssignedToType::ALL.len());
        for (index, kind) in AssignedToType::ALL.into_iter().enumerate() {
            assert_eq!(kind as usize, index);
        }
    }

    #[test]
    fn test_each_kind_uses_its_own_accessor() {
        let expected: [(AssignedToType, Accessor); 3] = [
            (AssignedToType::Device, device_accessor),
            (AssignedToType::DeviceType, device_type_accessor),
            (AssignedToType::InventoryItem, inventory_item_accessor),
        ];
        for (kind, accessor) in expected {
            assert_eq!(
                ACCESSORS[kind as usize] as usize,
                accessor as usize,
                "wrong accessor for {}",
                kind
            );
        }
    }

    #[test]
    fn test_validity_filter_negates_window() {
        let mut qb = QueryBuilder::new("SELECT 1 FROM validated_software_lcm v");
        ValidatedSoftwareRepository::push_filters(
            &mut qb,
            &ValidatedSoftwareLcmFilter {
                valid: Some(false),
                ..ValidatedSoftwareLcmFilter::default()
            },
        );
        let sql = qb.sql();
        assert!(sql.contains("AND NOT (v.start_date <= $1"));
        assert!(sql.contains("v.end_date >= $2"));
    }

    #[tokio::test]
    #[ignore] // Requires PostgreSQL
    async fn test_missing_target_resolves_to_none() {
        let pool = crate::db::create_pool().await.unwrap();
        crate::db::init_schema(&pool).await.unwrap();
        for kind in AssignedToType::ALL {
            let resolved = resolve_assigned(&pool, kind, Uuid::new_v4()).await.unwrap();
            assert!(resolved.is_none());
        }
    }

    #[tokio::test]
    #[ignore] // Requires PostgreSQL
    async fn test_each_kind_resolves_its_target() {
        use crate::db::repository::DcimRepository;
        use crate::model::dcim::{
            DcimSnapshot, DeviceInput, DeviceTypeInput, InventoryItemInput, ManufacturerInput,
        };

        let pool = crate::db::create_pool().await.unwrap();
        crate::db::init_schema(&pool).await.unwrap();

        let tag = Uuid::new_v4();
        let (manufacturer, device_type, device, item) =
            (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let snapshot = DcimSnapshot {
            manufacturers: vec![ManufacturerInput {
                id: manufacturer,
                name: format!("vendor-{}", tag),
            }],
            device_types: vec![DeviceTypeInput {
                id: device_type,
                manufacturer,
                model: format!("model-{}", tag),
                part_number: None,
            }],
            devices: vec![DeviceInput {
                id: device,
                name: format!("router-{}", tag),
                device_type,
                platform: None,
            }],
            inventory_items: vec![InventoryItemInput {
                id: item,
                name: format!("linecard-{}", tag),
                device,
                manufacturer: Some(manufacturer),
                part_id: None,
            }],
            ..DcimSnapshot::default()
        };
        DcimRepository::new(pool.clone()).sync(&snapshot).await.unwrap();

        for (kind, id) in [
            (AssignedToType::Device, device),
            (AssignedToType::DeviceType, device_type),
            (AssignedToType::InventoryItem, item),
        ] {
            let resolved = resolve_assigned(&pool, kind, id).await.unwrap().unwrap();
            assert_eq!(resolved.kind(), kind);
        }

        // An id of one kind does not resolve as another
        let crossed = resolve_assigned(&pool, AssignedToType::Device, device_type)
            .await
            .unwrap();
        assert!(crossed.is_none());
    }
}
