//! REST API endpoints for support contracts and their contacts

use actix_web::{HttpResponse, delete, get, post, put, web};
use uuid::Uuid;

use crate::api::crud;
use crate::api::error::{ApiError, ErrorResponse};
use crate::db::models::{Page, PageRequest};
use crate::db::repository::{ContactRepository, ContractRepository};
use crate::model::contract::{
    ContactLcm, ContactLcmFilter, ContactLcmInput, ContractContacts, ContractLcm,
    ContractLcmFilter, ContractLcmInput,
};

#[utoipa::path(
    get,
    path = "/v1/contracts",
    params(ContractLcmFilter, PageRequest),
    responses(
        (status = 200, description = "Contracts retrieved", body = Page<ContractLcm>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "contracts"
)]
#[get("/v1/contracts")]
pub async fn list_contracts(
    repo: web::Data<ContractRepository>,
    filter: web::Query<ContractLcmFilter>,
    page: web::Query<PageRequest>,
) -> Result<HttpResponse, ApiError> {
    crud::list(repo.get_ref(), &filter.into_inner(), page.into_inner()).await
}

#[utoipa::path(
    get,
    path = "/v1/contracts/{id}",
    params(("id" = Uuid, Path, description = "Contract ID")),
    responses(
        (status = 200, description = "Contract retrieved", body = ContractLcm),
        (status = 404, description = "Contract not found", body = ErrorResponse)
    ),
    tag = "contracts"
)]
#[get("/v1/contracts/{id}")]
pub async fn get_contract(
    repo: web::Data<ContractRepository>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    crud::retrieve(repo.get_ref(), path.into_inner()).await
}

/// Contacts of a contract, owners listed apart from escalation tiers
#[utoipa::path(
    get,
    path = "/v1/contracts/{id}/contacts",
    params(("id" = Uuid, Path, description = "Contract ID")),
    responses(
        (status = 200, description = "Contacts retrieved", body = ContractContacts),
        (status = 404, description = "Contract not found", body = ErrorResponse)
    ),
    tag = "contracts"
)]
#[get("/v1/contracts/{id}/contacts")]
pub async fn list_contract_contacts(
    contracts: web::Data<ContractRepository>,
    contacts: web::Data<ContactRepository>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    contracts.ensure_exists(id).await?;
    let all = contacts.for_contract(id).await?;
    Ok(HttpResponse::Ok().json(ContractContacts::split(all)))
}

#[utoipa::path(
    post,
    path = "/v1/contracts",
    request_body = ContractLcmInput,
    responses(
        (status = 201, description = "Contract created", body = ContractLcm),
        (status = 400, description = "Invalid input or unknown provider", body = ErrorResponse)
    ),
    tag = "contracts"
)]
#[post("/v1/contracts")]
pub async fn create_contract(
    repo: web::Data<ContractRepository>,
    body: web::Json<ContractLcmInput>,
) -> Result<HttpResponse, ApiError> {
    crud::create(repo.get_ref(), &body.into_inner()).await
}

#[utoipa::path(
    put,
    path = "/v1/contracts/{id}",
    params(("id" = Uuid, Path, description = "Contract ID")),
    request_body = ContractLcmInput,
    responses(
        (status = 200, description = "Contract updated", body = ContractLcm),
        (status = 400, description = "Invalid input or unknown provider", body = ErrorResponse),
        (status = 404, description = "Contract not found", body = ErrorResponse)
    ),
    tag = "contracts"
)]
#[put("/v1/contracts/{id}")]
pub async fn update_contract(
    repo: web::Data<ContractRepository>,
    path: web::Path<Uuid>,
    body: web::Json<ContractLcmInput>,
) -> Result<HttpResponse, ApiError> {
    crud::update(repo.get_ref(), path.into_inner(), &body.into_inner()).await
}

#[utoipa::path(
    delete,
    path = "/v1/contracts/{id}",
    params(("id" = Uuid, Path, description = "Contract ID")),
    responses(
        (status = 204, description = "Contract deleted"),
        (status = 404, description = "Contract not found", body = ErrorResponse)
    ),
    tag = "contracts"
)]
#[delete("/v1/contracts/{id}")]
pub async fn delete_contract(
    repo: web::Data<ContractRepository>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    crud::destroy(repo.get_ref(), path.into_inner()).await
}

#[utoipa::path(
    get,
    path = "/v1/contacts",
    params(ContactLcmFilter, PageRequest),
    responses(
        (status = 200, description = "Contacts retrieved", body = Page<ContactLcm>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "contracts"
)]
#[get("/v1/contacts")]
pub async fn list_contacts(
    repo: web::Data<ContactRepository>,
    filter: web::Query<ContactLcmFilter>,
    page: web::Query<PageRequest>,
) -> Result<HttpResponse, ApiError> {
    crud::list(repo.get_ref(), &filter.into_inner(), page.into_inner()).await
}

#[utoipa::path(
    get,
    path = "/v1/contacts/{id}",
    params(("id" = Uuid, Path, description = "Contact ID")),
    responses(
        (status = 200, description = "Contact retrieved", body = ContactLcm),
        (status = 404, description = "Contact not found", body = ErrorResponse)
    ),
    tag = "contracts"
)]
#[get("/v1/contacts/{id}")]
pub async fn get_contact(
    repo: web::Data<ContactRepository>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    crud::retrieve(repo.get_ref(), path.into_inner()).await
}

#[utoipa::path(
    post,
    path = "/v1/contacts",
    request_body = ContactLcmInput,
    responses(
        (status = 201, description = "Contact created", body = ContactLcm),
        (status = 400, description = "Invalid input or unknown contract", body = ErrorResponse)
    ),
    tag = "contracts"
)]
#[post("/v1/contacts")]
pub async fn create_contact(
    repo: web::Data<ContactRepository>,
    body: web::Json<ContactLcmInput>,
) -> Result<HttpResponse, ApiError> {
    crud::create(repo.get_ref(), &body.into_inner()).await
}

#[utoipa::path(
    put,
    path = "/v1/contacts/{id}",
    params(("id" = Uuid, Path, description = "Contact ID")),
    request_body = ContactLcmInput,
    responses(
        (status = 200, description = "Contact updated", body = ContactLcm),
        (status = 400, description = "Invalid input or unknown contract", body = ErrorResponse),
        (status = 404, description = "Contact not found", body = ErrorResponse)
    ),
    tag = "contracts"
)]
#[put("/v1/contacts/{id}")]
pub async fn update_contact(
    repo: web::Data<ContactRepository>,
    path: web::Path<Uuid>,
    body: web::Json<ContactLcmInput>,
) -> Result<HttpResponse, ApiError> {
    crud::update(repo.get_ref(), path.into_inner(), &body.into_inner()).await
}

#[utoipa::path(
    delete,
    path = "/v1/contacts/{id}",
    params(("id" = Uuid, Path, description = "Contact ID")),
    responses(
        (status = 204, description = "Contact deleted"),
        (status = 404, description = "Contact not found", body = ErrorResponse)
    ),
    tag = "contracts"
)]
#[delete("/v1/contacts/{id}")]
pub async fn delete_contact(
    repo: web::Data<ContactRepository>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    crud::destroy(repo.get_ref(), path.into_inner()).await
}

/// Configure contract and contact routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_contracts)
        .service(list_contract_contacts)
        .service(get_contract)
        .service(create_contract)
        .service(update_contract)
        .service(delete_contract)
        .service(list_contacts)
        .service(get_contact)
        .service(create_contact)
        .service(update_contact)
        .service(delete_contact);
}
