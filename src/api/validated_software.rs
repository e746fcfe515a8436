//! REST API endpoints for validated software policies

use actix_web::{HttpResponse, delete, get, post, put, web};
use uuid::Uuid;

use crate::api::crud;
use crate::api::error::{ApiError, ErrorResponse};
use crate::db::models::{Page, PageRequest};
use crate::db::repository::ValidatedSoftwareRepository;
use crate::model::validated_software::{
    ValidatedSoftwareLcm, ValidatedSoftwareLcmFilter, ValidatedSoftwareLcmInput,
};

/// List validated software policies
///
/// `valid=true` keeps the policies whose window covers today.
#[utoipa::path(
    get,
    path = "/v1/validated-software",
    params(ValidatedSoftwareLcmFilter, PageRequest),
    responses(
        (status = 200, description = "Policies retrieved", body = Page<ValidatedSoftwareLcm>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "validated-software"
)]
#[get("/v1/validated-software")]
pub async fn list_validated_software(
    repo: web::Data<ValidatedSoftwareRepository>,
    filter: web::Query<ValidatedSoftwareLcmFilter>,
    page: web::Query<PageRequest>,
) -> Result<HttpResponse, ApiError> {
    crud::list(repo.get_ref(), &filter.into_inner(), page.into_inner()).await
}

#[utoipa::path(
    get,
    path = "/v1/validated-software/{id}",
    params(("id" = Uuid, Path, description = "Policy ID")),
    responses(
        (status = 200, description = "Policy retrieved", body = ValidatedSoftwareLcm),
        (status = 404, description = "Policy not found", body = ErrorResponse)
    ),
    tag = "validated-software"
)]
#[get("/v1/validated-software/{id}")]
pub async fn get_validated_software(
    repo: web::Data<ValidatedSoftwareRepository>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    crud::retrieve(repo.get_ref(), path.into_inner()).await
}

#[utoipa::path(
    post,
    path = "/v1/validated-software",
    request_body = ValidatedSoftwareLcmInput,
    responses(
        (status = 201, description = "Policy created", body = ValidatedSoftwareLcm),
        (status = 400, description = "Invalid input or unknown target", body = ErrorResponse)
    ),
    tag = "validated-software"
)]
#[post("/v1/validated-software")]
pub async fn create_validated_software(
    repo: web::Data<ValidatedSoftwareRepository>,
    body: web::Json<ValidatedSoftwareLcmInput>,
) -> Result<HttpResponse, ApiError> {
    crud::create(repo.get_ref(), &body.into_inner()).await
}

#[utoipa::path(
    put,
    path = "/v1/validated-software/{id}",
    params(("id" = Uuid, Path, description = "Policy ID")),
    request_body = ValidatedSoftwareLcmInput,
    responses(
        (status = 200, description = "Policy updated", body = ValidatedSoftwareLcm),
        (status = 400, description = "Invalid input or unknown target", body = ErrorResponse),
        (status = 404, description = "Policy not found", body = ErrorResponse)
    ),
    tag = "validated-software"
)]
#[put("/v1/validated-software/{id}")]
pub async fn update_validated_software(
    repo: web::Data<ValidatedSoftwareRepository>,
    path: web::Path<Uuid>,
    body: web::Json<ValidatedSoftwareLcmInput>,
) -> Result<HttpResponse, ApiError> {
    crud::update(repo.get_ref(), path.into_inner(), &body.into_inner()).await
}

#[utoipa::path(
    delete,
    path = "/v1/validated-software/{id}",
    params(("id" = Uuid, Path, description = "Policy ID")),
    responses(
        (status = 204, description = "Policy deleted"),
        (status = 404, description = "Policy not found", body = ErrorResponse)
    ),
    tag = "validated-software"
)]
#[delete("/v1/validated-software/{id}")]
pub async fn delete_validated_software(
    repo: web::Data<ValidatedSoftwareRepository>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    crud::destroy(repo.get_ref(), path.into_inner()).await
}

/// Configure validated software routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_validated_software)
        .service(get_validated_software)
        .service(create_validated_software)
        .service(update_validated_software)
        .service(delete_validated_software);
}
