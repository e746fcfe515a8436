//! DCIM mirror synchronisation endpoint

use actix_web::{HttpResponse, post, web};

use crate::api::error::{ApiError, ErrorResponse};
use crate::db::repository::DcimRepository;
use crate::model::dcim::{DcimSnapshot, DcimSyncSummary};

/// Upsert a DCIM snapshot
///
/// Records are matched on their DCIM IDs; records absent from the snapshot
/// are left untouched.
#[utoipa::path(
    post,
    path = "/v1/dcim/sync",
    request_body = DcimSnapshot,
    responses(
        (status = 200, description = "Snapshot applied", body = DcimSyncSummary),
        (status = 400, description = "Snapshot references an unknown parent", body = ErrorResponse)
    ),
    tag = "dcim"
)]
#[post("/v1/dcim/sync")]
pub async fn sync_dcim(
    repo: web::Data<DcimRepository>,
    body: web::Json<DcimSnapshot>,
) -> Result<HttpResponse, ApiError> {
    let summary = repo.sync(&body).await?;
    tracing::info!(
        manufacturers = summary.manufacturers,
        platforms = summary.platforms,
        device_types = summary.device_types,
        devices = summary.devices,
        inventory_items = summary.inventory_items,
        "DCIM snapshot applied"
    );
    Ok(HttpResponse::Ok().json(summary))
}

/// Configure DCIM routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(sync_dcim);
}
