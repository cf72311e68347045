use axum::extract::State;
use axum::{Extension, Json};

use crate::analytics::{build_report, Report};
use crate::api::auth::CurrentUser;
use crate::db::trade_repo;
use crate::errors::AppError;
use crate::AppState;

use super::ApiResponse;

/// GET /api/report: performance over the current user's non-cancelled trades
pub async fn get_report(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Report>>, AppError> {
    let trades = trade_repo::get_trades_by_owner(&state.db, user.id, false).await?;
    let report = build_report(&trades, user.initial_capital);

    Ok(Json(ApiResponse::ok(report)))
}
