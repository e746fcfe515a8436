//! REST API endpoints for software releases

use actix_web::{HttpResponse, delete, get, post, put, web};
use uuid::Uuid;

use crate::api::crud;
use crate::api::error::{ApiError, ErrorResponse};
use crate::db::models::{Page, PageRequest};
use crate::db::repository::SoftwareRepository;
use crate::model::software::{SoftwareLcm, SoftwareLcmFilter, SoftwareLcmInput};

#[utoipa::path(
    get,
    path = "/v1/software",
    params(SoftwareLcmFilter, PageRequest),
    responses(
        (status = 200, description = "Software releases retrieved", body = Page<SoftwareLcm>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "software"
)]
#[get("/v1/software")]
pub async fn list_software(
    repo: web::Data<SoftwareRepository>,
    filter: web::Query<SoftwareLcmFilter>,
    page: web::Query<PageRequest>,
) -> Result<HttpResponse, ApiError> {
    crud::list(repo.get_ref(), &filter.into_inner(), page.into_inner()).await
}

#[utoipa::path(
    get,
    path = "/v1/software/{id}",
    params(("id" = Uuid, Path, description = "Software ID")),
    responses(
        (status = 200, description = "Software release retrieved", body = SoftwareLcm),
        (status = 404, description = "Software not found", body = ErrorResponse)
    ),
    tag = "software"
)]
#[get("/v1/software/{id}")]
pub async fn get_software(
    repo: web::Data<SoftwareRepository>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    crud::retrieve(repo.get_ref(), path.into_inner()).await
}

/// Register a software release for a platform
#[utoipa::path(
    post,
    path = "/v1/software",
    request_body = SoftwareLcmInput,
    responses(
        (status = 201, description = "Software release created", body = SoftwareLcm),
        (status = 400, description = "Invalid input or unknown platform", body = ErrorResponse),
        (status = 409, description = "Version already exists for this platform", body = ErrorResponse)
    ),
    tag = "software"
)]
#[post("/v1/software")]
pub async fn create_software(
    repo: web::Data<SoftwareRepository>,
    body: web::Json<SoftwareLcmInput>,
) -> Result<HttpResponse, ApiError> {
    crud::create(repo.get_ref(), &body.into_inner()).await
}

#[utoipa::path(
    put,
    path = "/v1/software/{id}",
    params(("id" = Uuid, Path, description = "Software ID")),
    request_body = SoftwareLcmInput,
    responses(
        (status = 200, description = "Software release updated", body = SoftwareLcm),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Software not found", body = ErrorResponse)
    ),
    tag = "software"
)]
#[put("/v1/software/{id}")]
pub async fn update_software(
    repo: web::Data<SoftwareRepository>,
    path: web::Path<Uuid>,
    body: web::Json<SoftwareLcmInput>,
) -> Result<HttpResponse, ApiError> {
    crud::update(repo.get_ref(), path.into_inner(), &body.into_inner()).await
}

/// Delete a software release and the policies that reference it
#[utoipa::path(
    delete,
    path = "/v1/software/{id}",
    params(("id" = Uuid, Path, description = "Software ID")),
    responses(
        (status = 204, description = "Software release deleted"),
        (status = 404, description = "Software not found", body = ErrorResponse)
    ),
    tag = "software"
)]
#[delete("/v1/software/{id}")]
pub async fn delete_software(
    repo: web::Data<SoftwareRepository>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    crud::destroy(repo.get_ref(), path.into_inner()).await
}

/// Configure software routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_software)
        .service(get_software)
        .service(create_software)
        .service(update_software)
        .service(delete_software);
}
