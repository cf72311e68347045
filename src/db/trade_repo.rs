use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::{PgExecutor, PgPool, Postgres};
use uuid::Uuid;

use crate::models::{NewTrade, Trade, TradeData, TradeField};

type TradeQuery<'q> = QueryAs<'q, Postgres, Trade, PgArguments>;

/// Bind the 27 content columns in schema order.
fn bind_data<'q>(query: TradeQuery<'q>, data: &'q TradeData) -> TradeQuery<'q> {
    query
        .bind(data.date)
        .bind(data.pair.as_deref())
        .bind(data.system.as_deref())
        .bind(data.action.as_deref())
        .bind(data.risk.as_deref())
        .bind(data.risk_percent)
        .bind(data.lots)
        .bind(data.entry)
        .bind(data.sl1_pips)
        .bind(data.tp1_pips)
        .bind(data.sl2_pips)
        .bind(data.tp2_pips)
        .bind(data.cancelled)
        .bind(data.profit_or_loss)
        .bind(data.comments.as_deref())
        .bind(data.instrument_name.as_deref())
        .bind(data.isin.as_deref())
        .bind(data.currency.as_deref())
        .bind(data.operation_type.as_deref())
        .bind(data.sign.as_deref())
        .bind(data.quantity)
        .bind(data.exchange_rate)
        .bind(data.gross_amount)
        .bind(data.commission_fund)
        .bind(data.commission_bank)
        .bind(data.commission_sgr)
        .bind(data.commission_admin)
}

/// Insert one trade. Unset fields are stored as NULL; `cancelled` defaults to false.
pub async fn insert_trade<'e, E: PgExecutor<'e>>(
    executor: E,
    trade: &NewTrade,
) -> anyhow::Result<Trade> {
    let query = sqlx::query_as::<_, Trade>(
        r#"
        INSERT INTO trades (
            owner_id, date, pair, system, action, risk, risk_percent, lots, entry,
            sl1_pips, tp1_pips, sl2_pips, tp2_pips, cancelled, profit_or_loss, comments,
            instrument_name, isin, currency, operation_type, sign, quantity, exchange_rate,
            gross_amount, commission_fund, commission_bank, commission_sgr, commission_admin
        )
        VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9,
            $10, $11, $12, $13, COALESCE($14, FALSE), $15, $16,
            $17, $18, $19, $20, $21, $22, $23,
            $24, $25, $26, $27, $28
        )
        RETURNING *
        "#,
    )
    .bind(trade.owner_id);

    let created = bind_data(query, &trade.data).fetch_one(executor).await?;
    Ok(created)
}

/// Insert a batch atomically: either every trade is stored or none is.
pub async fn insert_trades(pool: &PgPool, trades: &[NewTrade]) -> anyhow::Result<u64> {
    let mut tx = pool.begin().await?;
    for trade in trades {
        insert_trade(&mut *tx, trade).await?;
    }
    tx.commit().await?;

    Ok(trades.len() as u64)
}

/// Trades for an owner, newest first. Cancelled trades are skipped unless requested.
pub async fn get_trades_by_owner(
    pool: &PgPool,
    owner_id: Uuid,
    include_cancelled: bool,
) -> anyhow::Result<Vec<Trade>> {
    let trades = sqlx::query_as::<_, Trade>(
        r#"
        SELECT * FROM trades
        WHERE owner_id = $1 AND ($2 OR cancelled = FALSE)
        ORDER BY date DESC NULLS LAST, created_at DESC
        "#,
    )
    .bind(owner_id)
    .bind(include_cancelled)
    .fetch_all(pool)
    .await?;

    Ok(trades)
}

/// Apply the provided fields and null out the `cleared` ones; everything
/// else keeps its stored value. `cancelled` is never nulled.
/// Returns `None` when the trade does not exist or belongs to someone else.
pub async fn update_trade(
    pool: &PgPool,
    id: Uuid,
    owner_id: Uuid,
    changes: &TradeData,
    cleared: &[TradeField],
) -> anyhow::Result<Option<Trade>> {
    let query = sqlx::query_as::<_, Trade>(
        r#"
        UPDATE trades SET
            date             = CASE WHEN 'date' = ANY($30) THEN NULL ELSE COALESCE($3, date) END,
            pair             = CASE WHEN 'pair' = ANY($30) THEN NULL ELSE COALESCE($4, pair) END,
            system           = CASE WHEN 'system' = ANY($30) THEN NULL ELSE COALESCE($5, system) END,
            action           = CASE WHEN 'action' = ANY($30) THEN NULL ELSE COALESCE($6, action) END,
            risk             = CASE WHEN 'risk' = ANY($30) THEN NULL ELSE COALESCE($7, risk) END,
            risk_percent     = CASE WHEN 'risk_percent' = ANY($30) THEN NULL ELSE COALESCE($8, risk_percent) END,
            lots             = CASE WHEN 'lots' = ANY($30) THEN NULL ELSE COALESCE($9, lots) END,
            entry            = CASE WHEN 'entry' = ANY($30) THEN NULL ELSE COALESCE($10, entry) END,
            sl1_pips         = CASE WHEN 'sl1_pips' = ANY($30) THEN NULL ELSE COALESCE($11, sl1_pips) END,
            tp1_pips         = CASE WHEN 'tp1_pips' = ANY($30) THEN NULL ELSE COALESCE($12, tp1_pips) END,
            sl2_pips         = CASE WHEN 'sl2_pips' = ANY($30) THEN NULL ELSE COALESCE($13, sl2_pips) END,
            tp2_pips         = CASE WHEN 'tp2_pips' = ANY($30) THEN NULL ELSE COALESCE($14, tp2_pips) END,
            cancelled        = COALESCE($15, cancelled),
            profit_or_loss   = CASE WHEN 'profit_or_loss' = ANY($30) THEN NULL ELSE COALESCE($16, profit_or_loss) END,
            comments         = CASE WHEN 'comments' = ANY($30) THEN NULL ELSE COALESCE($17, comments) END,
            instrument_name  = CASE WHEN 'instrument_name' = ANY($30) THEN NULL ELSE COALESCE($18, instrument_name) END,
            isin             = CASE WHEN 'isin' = ANY($30) THEN NULL ELSE COALESCE($19, isin) END,
            currency         = CASE WHEN 'currency' = ANY($30) THEN NULL ELSE COALESCE($20, currency) END,
            operation_type   = CASE WHEN 'operation_type' = ANY($30) THEN NULL ELSE COALESCE($21, operation_type) END,
            sign             = CASE WHEN 'sign' = ANY($30) THEN NULL ELSE COALESCE($22, sign) END,
            quantity         = CASE WHEN 'quantity' = ANY($30) THEN NULL ELSE COALESCE($23, quantity) END,
            exchange_rate    = CASE WHEN 'exchange_rate' = ANY($30) THEN NULL ELSE COALESCE($24, exchange_rate) END,
            gross_amount     = CASE WHEN 'gross_amount' = ANY($30) THEN NULL ELSE COALESCE($25, gross_amount) END,
            commission_fund  = CASE WHEN 'commission_fund' = ANY($30) THEN NULL ELSE COALESCE($26, commission_fund) END,
            commission_bank  = CASE WHEN 'commission_bank' = ANY($30) THEN NULL ELSE COALESCE($27, commission_bank) END,
            commission_sgr   = CASE WHEN 'commission_sgr' = ANY($30) THEN NULL ELSE COALESCE($28, commission_sgr) END,
            commission_admin = CASE WHEN 'commission_admin' = ANY($30) THEN NULL ELSE COALESCE($29, commission_admin) END
        WHERE id = $1 AND owner_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(owner_id);

    let cleared: Vec<&'static str> = cleared.iter().map(TradeField::as_str).collect();
    let updated = bind_data(query, changes)
        .bind(cleared)
        .fetch_optional(pool)
        .await?;
    Ok(updated)
}

/// Soft-delete: mark the trade cancelled so reports skip it.
pub async fn cancel_trade(pool: &PgPool, id: Uuid, owner_id: Uuid) -> anyhow::Result<Option<Trade>> {
    let trade = sqlx::query_as::<_, Trade>(
        "UPDATE trades SET cancelled = TRUE WHERE id = $1 AND owner_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(owner_id)
    .fetch_optional(pool)
    .await?;

    Ok(trade)
}

/// Remove a trade. Returns false if nothing matched.
pub async fn delete_trade(pool: &PgPool, id: Uuid, owner_id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM trades WHERE id = $1 AND owner_id = $2")
        .bind(id)
        .bind(owner_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
