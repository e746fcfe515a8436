//! REST API endpoints for contract providers

use actix_web::{HttpResponse, delete, get, post, put, web};
use uuid::Uuid;

use crate::api::crud;
use crate::api::error::{ApiError, ErrorResponse};
use crate::db::models::{Page, PageRequest};
use crate::db::repository::{ContractRepository, ProviderRepository};
use crate::model::contract::{ContractLcm, ProviderLcm, ProviderLcmFilter, ProviderLcmInput};

#[utoipa::path(
    get,
    path = "/v1/providers",
    params(ProviderLcmFilter, PageRequest),
    responses(
        (status = 200, description = "Providers retrieved", body = Page<ProviderLcm>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "contracts"
)]
#[get("/v1/providers")]
pub async fn list_providers(
    repo: web::Data<ProviderRepository>,
    filter: web::Query<ProviderLcmFilter>,
    page: web::Query<PageRequest>,
) -> Result<HttpResponse, ApiError> {
    crud::list(repo.get_ref(), &filter.into_inner(), page.into_inner()).await
}

#[utoipa::path(
    get,
    path = "/v1/providers/{id}",
    params(("id" = Uuid, Path, description = "Provider ID")),
    responses(
        (status = 200, description = "Provider retrieved", body = ProviderLcm),
        (status = 404, description = "Provider not found", body = ErrorResponse)
    ),
    tag = "contracts"
)]
#[get("/v1/providers/{id}")]
pub async fn get_provider(
    repo: web::Data<ProviderRepository>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    crud::retrieve(repo.get_ref(), path.into_inner()).await
}

/// Contracts held with a provider
#[utoipa::path(
    get,
    path = "/v1/providers/{id}/contracts",
    params(("id" = Uuid, Path, description = "Provider ID")),
    responses(
        (status = 200, description = "Contracts retrieved", body = Vec<ContractLcm>),
        (status = 404, description = "Provider not found", body = ErrorResponse)
    ),
    tag = "contracts"
)]
#[get("/v1/providers/{id}/contracts")]
pub async fn list_provider_contracts(
    providers: web::Data<ProviderRepository>,
    contracts: web::Data<ContractRepository>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    providers.ensure_exists(id).await?;
    let contracts = contracts.for_provider(id).await?;
    Ok(HttpResponse::Ok().json(contracts))
}

#[utoipa::path(
    post,
    path = "/v1/providers",
    request_body = ProviderLcmInput,
    responses(
        (status = 201, description = "Provider created", body = ProviderLcm),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "Provider name already in use", body = ErrorResponse)
    ),
    tag = "contracts"
)]
#[post("/v1/providers")]
pub async fn create_provider(
    repo: web::Data<ProviderRepository>,
    body: web::Json<ProviderLcmInput>,
) -> Result<HttpResponse, ApiError> {
    crud::create(repo.get_ref(), &body.into_inner()).await
}

#[utoipa::path(
    put,
    path = "/v1/providers/{id}",
    params(("id" = Uuid, Path, description = "Provider ID")),
    request_body = ProviderLcmInput,
    responses(
        (status = 200, description = "Provider updated", body = ProviderLcm),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Provider not found", body = ErrorResponse),
        (status = 409, description = "Provider name already in use", body = ErrorResponse)
    ),
    tag = "contracts"
)]
#[put("/v1/providers/{id}")]
pub async fn update_provider(
    repo: web::Data<ProviderRepository>,
    path: web::Path<Uuid>,
    body: web::Json<ProviderLcmInput>,
) -> Result<HttpResponse, ApiError> {
    crud::update(repo.get_ref(), path.into_inner(), &body.into_inner()).await
}

/// Delete a provider along with its contracts and their contacts
#[utoipa::path(
    delete,
    path = "/v1/providers/{id}",
    params(("id" = Uuid, Path, description = "Provider ID")),
    responses(
        (status = 204, description = "Provider deleted"),
        (status = 404, description = "Provider not found", body = ErrorResponse)
    ),
    tag = "contracts"
)]
#[delete("/v1/providers/{id}")]
pub async fn delete_provider(
    repo: web::Data<ProviderRepository>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    crud::destroy(repo.get_ref(), path.into_inner()).await
}

/// Configure provider routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_providers)
        .service(list_provider_contracts)
        .service(get_provider)
        .service(create_provider)
        .service(update_provider)
        .service(delete_provider);
}
