use axum::extract::{Multipart, Path, Query, State};
use axum::{Extension, Json};
use chrono::NaiveDate;
use metrics::counter;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::auth::CurrentUser;
use crate::db::trade_repo;
use crate::errors::AppError;
use crate::import::{ColumnMapper, ImportIssue, Sheet, SpreadsheetImporter};
use crate::models::{NewTrade, Trade, TradeData, TradeField};
use crate::AppState;

use super::{read_upload, ApiResponse};

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// Explicit submission: journal fields are required, brokerage fields optional.
#[derive(Debug, Deserialize)]
pub struct CreateTradeRequest {
    pub date: NaiveDate,
    pub pair: String,
    pub system: String,
    pub action: String,
    pub risk: String,
    pub risk_percent: Decimal,
    pub lots: Decimal,
    pub entry: Decimal,
    pub sl1_pips: Decimal,
    pub tp1_pips: Decimal,
    pub sl2_pips: Decimal,
    pub tp2_pips: Decimal,
    #[serde(default)]
    pub cancelled: bool,
    pub profit_or_loss: Decimal,
    #[serde(default)]
    pub comments: String,
    pub instrument_name: Option<String>,
    pub isin: Option<String>,
    pub currency: Option<String>,
    pub operation_type: Option<String>,
    pub sign: Option<String>,
    pub quantity: Option<Decimal>,
    pub exchange_rate: Option<Decimal>,
    pub gross_amount: Option<Decimal>,
    pub commission_fund: Option<Decimal>,
    pub commission_bank: Option<Decimal>,
    pub commission_sgr: Option<Decimal>,
    pub commission_admin: Option<Decimal>,
}

impl CreateTradeRequest {
    fn into_data(self) -> TradeData {
        TradeData {
            date: Some(self.date),
            pair: Some(self.pair),
            system: Some(self.system),
            action: Some(self.action),
            risk: Some(self.risk),
            risk_percent: Some(self.risk_percent),
            lots: Some(self.lots),
            entry: Some(self.entry),
            sl1_pips: Some(self.sl1_pips),
            tp1_pips: Some(self.tp1_pips),
            sl2_pips: Some(self.sl2_pips),
            tp2_pips: Some(self.tp2_pips),
            cancelled: Some(self.cancelled),
            profit_or_loss: Some(self.profit_or_loss),
            comments: Some(self.comments),
            instrument_name: self.instrument_name,
            isin: self.isin,
            currency: self.currency,
            operation_type: self.operation_type,
            sign: self.sign,
            quantity: self.quantity,
            exchange_rate: self.exchange_rate,
            gross_amount: self.gross_amount,
            commission_fund: self.commission_fund,
            commission_bank: self.commission_bank,
            commission_sgr: self.commission_sgr,
            commission_admin: self.commission_admin,
        }
    }
}

/// Partial update: provided fields are overwritten, fields named in `clear`
/// are reset to empty. A field both provided and cleared ends up empty.
#[derive(Debug, Deserialize)]
pub struct UpdateTradeRequest {
    #[serde(flatten)]
    pub changes: TradeData,
    #[serde(default)]
    pub clear: Vec<TradeField>,
}

impl UpdateTradeRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.clear.contains(&TradeField::Cancelled) {
            return Err(AppError::BadRequest("cancelled cannot be cleared".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub include_cancelled: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub imported: u64,
    pub issues: Vec<ImportIssue>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/trades: record a trade for the current user
pub async fn create(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<CreateTradeRequest>,
) -> Result<Json<ApiResponse<Trade>>, AppError> {
    let new_trade = NewTrade {
        owner_id: user.id,
        data: body.into_data(),
    };
    let trade = trade_repo::insert_trade(&state.db, &new_trade).await?;
    counter!("trades_created_total").increment(1);

    Ok(Json(ApiResponse::ok(trade)))
}

/// GET /api/trades: the current user's trades
pub async fn list(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<Trade>>>, AppError> {
    let include_cancelled = query.include_cancelled.unwrap_or(true);
    let trades = trade_repo::get_trades_by_owner(&state.db, user.id, include_cancelled).await?;

    Ok(Json(ApiResponse::ok(trades)))
}

/// PUT /api/trades/{id}: change the provided fields, reset the cleared ones
pub async fn update(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateTradeRequest>,
) -> Result<Json<ApiResponse<Trade>>, AppError> {
    body.validate()?;

    let trade = trade_repo::update_trade(&state.db, id, user.id, &body.changes, &body.clear)
        .await?
        .ok_or_else(|| AppError::NotFound("trade not found".into()))?;

    Ok(Json(ApiResponse::ok(trade)))
}

/// POST /api/trades/{id}/cancel: exclude a trade from reports without deleting it
pub async fn cancel(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Trade>>, AppError> {
    let trade = trade_repo::cancel_trade(&state.db, id, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("trade not found".into()))?;

    Ok(Json(ApiResponse::ok(trade)))
}

/// DELETE /api/trades/{id}
pub async fn delete(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    if !trade_repo::delete_trade(&state.db, id, user.id).await? {
        return Err(AppError::NotFound("trade not found".into()));
    }

    Ok(Json(ApiResponse::ok(())))
}

/// POST /api/trades/import: map a spreadsheet onto trades and store them all
pub async fn import(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<ImportResponse>>, AppError> {
    let service = state
        .reasoning
        .clone()
        .ok_or_else(|| AppError::BadGateway("reasoning service is not configured".into()))?;

    let upload = read_upload(multipart).await?;
    tracing::info!(
        owner_id = %user.id,
        file = upload.file_name.as_deref().unwrap_or("<unnamed>"),
        bytes = upload.bytes.len(),
        "Spreadsheet import started"
    );

    let importer = SpreadsheetImporter::new(ColumnMapper::new(service));
    let outcome = match Sheet::from_bytes(upload.bytes.to_vec()) {
        Ok(sheet) => importer.import(&sheet, user.id).await,
        Err(e) => Err(e.into()),
    };

    let outcome = outcome.map_err(|e| {
        counter!("imports_failed_total").increment(1);
        tracing::warn!(owner_id = %user.id, error = %e, "Spreadsheet import aborted");
        AppError::from(e)
    })?;

    let imported = trade_repo::insert_trades(&state.db, &outcome.trades).await?;
    counter!("trades_imported_total").increment(imported);
    counter!("import_issues_total").increment(outcome.issues.len() as u64);

    Ok(Json(ApiResponse::ok(ImportResponse {
        imported,
        issues: outcome.issues,
    })))
}
