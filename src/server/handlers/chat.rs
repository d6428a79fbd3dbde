use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::utils::with_deadline;
use crate::core::errors::ApiError;
use crate::rag::DEFAULT_RESULTS;
use crate::state::AppState;

fn default_n_results() -> i64 {
    DEFAULT_RESULTS
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    /// Silently clamped to `1..=5`.
    #[serde(default = "default_n_results")]
    pub n_results: i64,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    pub context_used: bool,
}

/// Completion failures come back as a 200 with the error text as `answer`;
/// only validation, retrieval and configuration failures are HTTP errors.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let exchange = with_deadline(state.settings.request_timeout(), async {
        state.rag.chat(&payload.query, payload.n_results).await.map_err(ApiError::from)
    })
    .await?;

    Ok(Json(ChatResponse {
        answer: exchange.answer,
        context_used: exchange.context_used,
    }))
}
