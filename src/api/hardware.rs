//! REST API endpoints for hardware lifecycle notices

use actix_web::{HttpResponse, delete, get, post, put, web};
use uuid::Uuid;

use crate::api::crud;
use crate::api::error::{ApiError, ErrorResponse};
use crate::db::models::{Page, PageRequest};
use crate::db::repository::HardwareRepository;
use crate::model::hardware::{HardwareLcm, HardwareLcmFilter, HardwareLcmInput};

/// List hardware notices
#[utoipa::path(
    get,
    path = "/v1/hardware",
    params(HardwareLcmFilter, PageRequest),
    responses(
        (status = 200, description = "Hardware notices retrieved", body = Page<HardwareLcm>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "hardware"
)]
#[get("/v1/hardware")]
pub async fn list_hardware(
    repo: web::Data<HardwareRepository>,
    filter: web::Query<HardwareLcmFilter>,
    page: web::Query<PageRequest>,
) -> Result<HttpResponse, ApiError> {
    crud::list(repo.get_ref(), &filter.into_inner(), page.into_inner()).await
}

/// Get a hardware notice by ID
#[utoipa::path(
    get,
    path = "/v1/hardware/{id}",
    params(("id" = Uuid, Path, description = "Hardware notice ID")),
    responses(
        (status = 200, description = "Hardware notice retrieved", body = HardwareLcm),
        (status = 404, description = "Hardware notice not found", body = ErrorResponse)
    ),
    tag = "hardware"
)]
#[get("/v1/hardware/{id}")]
pub async fn get_hardware(
    repo: web::Data<HardwareRepository>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    crud::retrieve(repo.get_ref(), path.into_inner()).await
}

/// Create a hardware notice for a device type or an inventory item part
#[utoipa::path(
    post,
    path = "/v1/hardware",
    request_body = HardwareLcmInput,
    responses(
        (status = 201, description = "Hardware notice created", body = HardwareLcm),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "A notice already exists for this target", body = ErrorResponse)
    ),
    tag = "hardware"
)]
#[post("/v1/hardware")]
pub async fn create_hardware(
    repo: web::Data<HardwareRepository>,
    body: web::Json<HardwareLcmInput>,
) -> Result<HttpResponse, ApiError> {
    crud::create(repo.get_ref(), &body.into_inner()).await
}

#[utoipa::path(
    put,
    path = "/v1/hardware/{id}",
    params(("id" = Uuid, Path, description = "Hardware notice ID")),
    request_body = HardwareLcmInput,
    responses(
        (status = 200, description = "Hardware notice updated", body = HardwareLcm),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Hardware notice not found", body = ErrorResponse)
    ),
    tag = "hardware"
)]
#[put("/v1/hardware/{id}")]
pub async fn update_hardware(
    repo: web::Data<HardwareRepository>,
    path: web::Path<Uuid>,
    body: web::Json<HardwareLcmInput>,
) -> Result<HttpResponse, ApiError> {
    crud::update(repo.get_ref(), path.into_inner(), &body.into_inner()).await
}

#[utoipa::path(
    delete,
    path = "/v1/hardware/{id}",
    params(("id" = Uuid, Path, description = "Hardware notice ID")),
    responses(
        (status = 204, description = "Hardware notice deleted"),
        (status = 404, description = "Hardware notice not found", body = ErrorResponse)
    ),
    tag = "hardware"
)]
#[delete("/v1/hardware/{id}")]
pub async fn delete_hardware(
    repo: web::Data<HardwareRepository>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    crud::destroy(repo.get_ref(), path.into_inner()).await
}

/// Configure hardware routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_hardware)
        .service(get_hardware)
        .service(create_hardware)
        .service(update_hardware)
        .service(delete_hardware);
}
