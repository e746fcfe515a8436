//! Shared list / retrieve / create / update / delete handlers
//!
//! Entity modules declare their own routes and OpenAPI docs and delegate the
//! request handling to these functions.

use actix_web::HttpResponse;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::db::models::PageRequest;
use crate::db::repository::Repository;
use crate::model::Validate;

pub async fn list<R: Repository>(
    repo: &R,
    filter: &R::Filter,
    page: PageRequest,
) -> Result<HttpResponse, ApiError> {
    let page = repo.list(filter, page).await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn retrieve<R: Repository>(repo: &R, id: Uuid) -> Result<HttpResponse, ApiError> {
    let record = repo.get(id).await?;
    Ok(HttpResponse::Ok().json(record))
}

/// Validate the payload, then insert it
pub async fn create<R: Repository>(repo: &R, input: &R::Input) -> Result<HttpResponse, ApiError> {
    input.validate()?;
    let record = repo.create(input).await?;
    tracing::info!(entity = R::NAME, "Record created");
    Ok(HttpResponse::Created().json(record))
}

pub async fn update<R: Repository>(
    repo: &R,
    id: Uuid,
    input: &R::Input,
) -> Result<HttpResponse, ApiError> {
    input.validate()?;
    let record = repo.update(id, input).await?;
    tracing::info!(entity = R::NAME, id = %id, "Record updated");
    Ok(HttpResponse::Ok().json(record))
}

pub async fn destroy<R: Repository>(repo: &R, id: Uuid) -> Result<HttpResponse, ApiError> {
    repo.delete(id).await?;
    tracing::info!(entity = R::NAME, id = %id, "Record deleted");
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use actix_web::{body::to_bytes, http::StatusCode, ResponseError};
    use async_trait::async_trait;
    use serde::Serialize;

    use crate::db::models::Page;
    use crate::db::DbError;
    use crate::model::ValidationError;

    #[derive(Debug, Clone, Serialize)]
    pub struct Note {
        pub id: Uuid,
        pub text: String,
    }

    pub struct NoteInput {
        pub text: String,
    }

    impl Validate for NoteInput {
        fn validate(&self) -> Result<(), ValidationError> {
            crate::model::require_non_empty("text", &self.text)
        }
    }

    /// In-memory repository used to exercise the handler templates
    #[derive(Default)]
    pub struct NoteRepository {
        notes: Mutex<BTreeMap<Uuid, Note>>,
    }

    #[async_trait]
    impl Repository for NoteRepository {
        type Record = Note;
        type Input = NoteInput;
        type Filter = ();

        const NAME: &'static str = "Note";

        async fn list(&self, _: &(), page: PageRequest) -> Result<Page<Note>, DbError> {
            let notes = self.notes.lock().unwrap();
            let results = notes
                .values()
                .skip(page.offset() as usize)
                .take(page.limit() as usize)
                .cloned()
                .collect();
            Ok(Page::new(results, page, notes.len() as i64))
        }

        async fn get(&self, id: Uuid) -> Result<Note, DbError> {
            self.notes
                .lock()
                .unwrap()
                .get(&id)
                .cloned()
                .ok_or_else(|| DbError::NotFound(format!("Note {}", id)))
        }

        async fn create(&self, input: &NoteInput) -> Result<Note, DbError> {
            let note = Note {
                id: Uuid::new_v4(),
                text: input.text.clone(),
            };
            self.notes.lock().unwrap().insert(note.id, note.clone());
            Ok(note)
        }

        async fn update(&self, id: Uuid, input: &NoteInput) -> Result<Note, DbError> {
            let mut notes = self.notes.lock().unwrap();
            let note = notes
                .get_mut(&id)
                .ok_or_else(|| DbError::NotFound(format!("Note {}", id)))?;
            note.text = input.text.clone();
            Ok(note.clone())
        }

        async fn delete(&self, id: Uuid) -> Result<(), DbError> {
            self.notes
                .lock()
                .unwrap()
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| DbError::NotFound(format!("Note {}", id)))
        }
    }

    async fn json(response: HttpResponse) -> serde_json::Value {
        let body = to_bytes(response.into_body()).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn note(text: &str) -> NoteInput {
        NoteInput {
            text: text.to_string(),
        }
    }

    #[actix_web::test]
    async fn test_create_then_retrieve() {
        let repo = NoteRepository::default();
        let response = create(&repo, &note("spare PSU")).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = json(response).await;

        let id = Uuid::parse_str(created["id"].as_str().unwrap()).unwrap();
        let fetched = json(retrieve(&repo, id).await.unwrap()).await;
        assert_eq!(fetched["text"], "spare PSU");
    }

    #[actix_web::test]
    async fn test_invalid_input_never_reaches_repository() {
        let repo = NoteRepository::default();
        let err = create(&repo, &note("   ")).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(repo.notes.lock().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_list_is_paginated() {
        let repo = NoteRepository::default();
        for i in 0..3 {
            create(&repo, &note(&format!("note {}", i))).await.unwrap();
        }
        let page = PageRequest {
            page: Some(2),
            page_size: Some(2),
        };
        let body = json(list(&repo, &(), page).await.unwrap()).await;
        assert_eq!(body["total_count"], 3);
        assert_eq!(body["total_pages"], 2);
        assert_eq!(body["results"].as_array().unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn test_update_and_delete_missing() {
        let repo = NoteRepository::default();
        let missing = Uuid::new_v4();
        let err = update(&repo, missing, &note("x")).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        let err = destroy(&repo, missing).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_delete_returns_no_content() {
        let repo = NoteRepository::default();
        let created = json(create(&repo, &note("rack 4")).await.unwrap()).await;
        let id = Uuid::parse_str(created["id"].as_str().unwrap()).unwrap();

        let response = destroy(&repo, id).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(retrieve(&repo, id).await.is_err());
    }
}
