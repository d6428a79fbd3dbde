use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use super::utils::with_deadline;
use crate::core::errors::ApiError;
use crate::state::AppState;

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "healthy" }))
}

pub async fn get_status(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let document_count = with_deadline(state.settings.request_timeout(), async {
        state.rag.document_count().await.map_err(ApiError::from)
    })
    .await?;
    let embedder = state.rag.embedder();

    Ok(Json(json!({
        "status": "ok",
        "document_count": document_count,
        "embedding_model": embedder.model_id(),
        "embedding_dimensions": embedder.dimensions(),
        "completion_configured": state.rag.completion_configured(),
        "completion_model": state.settings.llm.completion_model,
    })))
}
