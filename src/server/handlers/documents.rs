use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::utils::with_deadline;
use crate::core::errors::ApiError;
use crate::rag::{DocumentSummary, Metadata, NewDocument};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddDocumentRequest {
    pub text: String,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Serialize)]
pub struct AddDocumentResponse {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct AddDocumentsRequest {
    pub documents: Vec<NewDocument>,
}

#[derive(Debug, Serialize)]
pub struct AddDocumentsResponse {
    pub ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ListDocumentsResponse {
    pub documents: Vec<DocumentSummary>,
}

pub async fn add_document(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AddDocumentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = with_deadline(state.settings.request_timeout(), async {
        state.rag.add_document(&payload.text, payload.metadata).await.map_err(ApiError::from)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(AddDocumentResponse { id })))
}

pub async fn add_documents(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AddDocumentsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ids = with_deadline(state.settings.request_timeout(), async {
        state.rag.add_documents(payload.documents).await.map_err(ApiError::from)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(AddDocumentsResponse { ids })))
}

pub async fn list_documents(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let documents = with_deadline(state.settings.request_timeout(), async {
        state.rag.list_documents().await.map_err(ApiError::from)
    })
    .await?;

    Ok(Json(ListDocumentsResponse { documents }))
}
