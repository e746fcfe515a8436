//! Local mirror of the DCIM inventory (manufacturers, platforms, device
//! types, devices and inventory items).
//!
//! The mirror is fed by snapshots pushed from the source of truth and
//! provides the nested representations embedded in lifecycle records.

use sqlx::PgPool;
use uuid::Uuid;

use crate::db::DbError;
use crate::model::dcim::{
    DcimSnapshot, DcimSyncSummary, NestedDevice, NestedDeviceType, NestedInventoryItem,
    NestedManufacturer,
};

#[derive(Clone)]
pub struct DcimRepository {
    pool: PgPool,
}

impl DcimRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upsert a snapshot in one transaction, parents before children
    pub async fn sync(&self, snapshot: &DcimSnapshot) -> Result<DcimSyncSummary, DbError> {
        let mut tx = self.pool.begin().await?;
        let mut summary = DcimSyncSummary::default();

        for m in &snapshot.manufacturers {
            summary.manufacturers += sqlx::query(
                r#"
                INSERT INTO manufacturers (id, name) VALUES ($1, $2)
                ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name
                "#,
            )
            .bind(m.id)
            .bind(&m.name)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        for p in &snapshot.platforms {
            summary.platforms += sqlx::query(
                r#"
                INSERT INTO platforms (id, name, manufacturer_id) VALUES ($1, $2, $3)
                ON CONFLICT (id) DO UPDATE SET
                    name = EXCLUDED.name,
                    manufacturer_id = EXCLUDED.manufacturer_id
                "#,
            )
            .bind(p.id)
            .bind(&p.name)
            .bind(p.manufacturer)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        for dt in &snapshot.device_types {
            summary.device_types += sqlx::query(
                r#"
                INSERT INTO device_types (id, manufacturer_id, model, part_number)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (id) DO UPDATE SET
                    manufacturer_id = EXCLUDED.manufacturer_id,
                    model = EXCLUDED.model,
                    part_number = EXCLUDED.part_number
                "#,
            )
            .bind(dt.id)
            .bind(dt.manufacturer)
            .bind(&dt.model)
            .bind(&dt.part_number)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        for d in &snapshot.devices {
            summary.devices += sqlx::query(
                r#"
                INSERT INTO devices (id, name, device_type_id, platform_id)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (id) DO UPDATE SET
                    name = EXCLUDED.name,
                    device_type_id = EXCLUDED.device_type_id,
                    platform_id = EXCLUDED.platform_id
                "#,
            )
            .bind(d.id)
            .bind(&d.name)
            .bind(d.device_type)
            .bind(d.platform)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        for ii in &snapshot.inventory_items {
            summary.inventory_items += sqlx::query(
                r#"
                INSERT INTO inventory_items (id, name, device_id, manufacturer_id, part_id)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (id) DO UPDATE SET
                    name = EXCLUDED.name,
                    device_id = EXCLUDED.device_id,
                    manufacturer_id = EXCLUDED.manufacturer_id,
                    part_id = EXCLUDED.part_id
                "#,
            )
            .bind(ii.id)
            .bind(&ii.name)
            .bind(ii.device)
            .bind(ii.manufacturer)
            .bind(&ii.part_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        tx.commit().await?;

        tracing::info!(
            manufacturers = summary.manufacturers,
            platforms = summary.platforms,
            device_types = summary.device_types,
            devices = summary.devices,
            inventory_items = summary.inventory_items,
            "DCIM snapshot applied"
        );

        Ok(summary)
    }
}

pub async fn device(pool: &PgPool, id: Uuid) -> Result<Option<NestedDevice>, sqlx::Error> {
    let row: Option<(Uuid, String)> = sqlx::query_as("SELECT id, name FROM devices WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|(id, name)| NestedDevice { id, name }))
}

pub async fn device_type(pool: &PgPool, id: Uuid) -> Result<Option<NestedDeviceType>, sqlx::Error> {
    let row: Option<(Uuid, String, Uuid, String)> = sqlx::query_as(
        r#"
        SELECT dt.id, dt.model, m.id, m.name
        FROM device_types dt
        JOIN manufacturers m ON m.id = dt.manufacturer_id
        WHERE dt.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|(id, model, m_id, m_name)| NestedDeviceType {
        id,
        manufacturer: Some(NestedManufacturer {
            id: m_id,
            name: m_name,
        }),
        model,
    }))
}

pub async fn inventory_item(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<NestedInventoryItem>, sqlx::Error> {
    let row: Option<(Uuid, String, Uuid, String)> = sqlx::query_as(
        r#"
        SELECT ii.id, ii.name, d.id, d.name
        FROM inventory_items ii
        JOIN devices d ON d.id = ii.device_id
        WHERE ii.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|(id, name, device_id, device_name)| NestedInventoryItem {
        id,
        device: NestedDevice {
            id: device_id,
            name: device_name,
        },
        name,
    }))
}

/// Devices of a device type, or devices carrying an inventory item with the given part ID
pub async fn devices_for_hardware(
    pool: &PgPool,
    device_type: Option<Uuid>,
    part_id: Option<&str>,
) -> Result<Vec<NestedDevice>, sqlx::Error> {
    if device_type.is_none() && part_id.is_none() {
        return Ok(Vec::new());
    }
    let rows: Vec<(Uuid, String)> = sqlx::query_as(
        r#"
        SELECT DISTINCT d.id, d.name
        FROM devices d
        LEFT JOIN inventory_items ii ON ii.device_id = d.id
        WHERE ($1::uuid IS NOT NULL AND d.device_type_id = $1)
           OR ($2::text IS NOT NULL AND ii.part_id = $2)
        ORDER BY d.name
        "#,
    )
    .bind(device_type)
    .bind(part_id)
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(|(id, name)| NestedDevice { id, name })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::dcim::{DeviceInput, DeviceTypeInput, ManufacturerInput};

    async fn pool() -> PgPool {
        let pool = crate::db::create_pool().await.unwrap();
        crate::db::init_schema(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    #[ignore] // Requires PostgreSQL
    async fn test_sync_is_idempotent_and_resolves_nested() {
        let pool = pool().await;
        let repo = DcimRepository::new(pool.clone());

        let manufacturer = Uuid::new_v4();
        let device_type_id = Uuid::new_v4();
        let device_id = Uuid::new_v4();
        let snapshot = DcimSnapshot {
            manufacturers: vec![ManufacturerInput {
                id: manufacturer,
                name: format!("Cisco {}", manufacturer),
            }],
            device_types: vec![DeviceTypeInput {
                id: device_type_id,
                manufacturer,
                model: "ASR-1001".to_string(),
                part_number: None,
            }],
            devices: vec![DeviceInput {
                id: device_id,
                name: "ams01-edge-01".to_string(),
                device_type: device_type_id,
                platform: None,
            }],
            ..DcimSnapshot::default()
        };

        let first = repo.sync(&snapshot).await.unwrap();
        assert_eq!(first.devices, 1);
        let second = repo.sync(&snapshot).await.unwrap();
        assert_eq!(second, first);

        let dt = device_type(&pool, device_type_id).await.unwrap().unwrap();
        assert_eq!(dt.model, "ASR-1001");
        assert_eq!(dt.manufacturer.unwrap().id, manufacturer);

        let devices = devices_for_hardware(&pool, Some(device_type_id), None)
            .await
            .unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].id, device_id);
    }

    #[tokio::test]
    #[ignore] // Requires PostgreSQL
    async fn test_sync_rejects_orphan_device() {
        let repo = DcimRepository::new(pool().await);
        let snapshot = DcimSnapshot {
            devices: vec![DeviceInput {
                id: Uuid::new_v4(),
                name: "orphan".to_string(),
                device_type: Uuid::new_v4(),
                platform: None,
            }],
            ..DcimSnapshot::default()
        };
        let err = repo.sync(&snapshot).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidReference(_)));
    }

    #[tokio::test]
    #[ignore] // Requires PostgreSQL
    async fn test_missing_objects_resolve_to_none() {
        let pool = pool().await;
        assert!(device(&pool, Uuid::new_v4()).await.unwrap().is_none());
        assert!(inventory_item(&pool, Uuid::new_v4()).await.unwrap().is_none());
        assert!(devices_for_hardware(&pool, None, None).await.unwrap().is_empty());
    }
}
