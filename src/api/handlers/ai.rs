use axum::extract::{Query, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::auth::CurrentUser;
use crate::errors::AppError;
use crate::reasoning::CompletionRequest;
use crate::AppState;

use super::ApiResponse;

const ADVISOR_ROLE: &str =
    "You are a professional trader evaluating other traders' work and giving alerts.";

#[derive(Deserialize)]
pub struct AskQuery {
    pub question: String,
}

#[derive(Serialize)]
pub struct AskResponse {
    pub answer: String,
}

/// POST /api/ai/ask: forward a free-form question to the trading assistant
pub async fn ask(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<AskQuery>,
) -> Result<Json<ApiResponse<AskResponse>>, AppError> {
    let question = query.question.trim();
    if question.is_empty() {
        return Err(AppError::BadRequest("question must not be empty".into()));
    }

    let service = state
        .reasoning
        .as_ref()
        .ok_or_else(|| AppError::BadGateway("reasoning service is not configured".into()))?;

    tracing::debug!(user = %user.username, chars = question.len(), "Assistant question");

    let answer = service
        .complete(&CompletionRequest::new(ADVISOR_ROLE, question))
        .await
        .map_err(|e| AppError::BadGateway(e.to_string()))?;

    Ok(Json(ApiResponse::ok(AskResponse { answer })))
}
