use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::field::TradeField;

/// Database row for the trades table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Trade {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub date: Option<NaiveDate>,
    pub pair: Option<String>,
    pub system: Option<String>,
    pub action: Option<String>,
    pub risk: Option<String>,
    pub risk_percent: Option<Decimal>,
    pub lots: Option<Decimal>,
    pub entry: Option<Decimal>,
    pub sl1_pips: Option<Decimal>,
    pub tp1_pips: Option<Decimal>,
    pub sl2_pips: Option<Decimal>,
    pub tp2_pips: Option<Decimal>,
    pub cancelled: bool,
    pub profit_or_loss: Option<Decimal>,
    pub comments: Option<String>,
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
    pub created_at: Option<DateTime<Utc>>,
}

impl Trade {
    /// Realized result, with an unrecorded P/L counted as flat.
    pub fn pnl(&self) -> Decimal {
        self.profit_or_loss.unwrap_or(Decimal::ZERO)
    }
}

// ---------------------------------------------------------------------------
// TradeData: field set used for inserts, partial updates and imports
// ---------------------------------------------------------------------------

/// A coerced value ready to be stored in a trade field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Date(NaiveDate),
    Flag(bool),
    Number(Decimal),
    Text(String),
}

impl FieldValue {
    fn into_date(self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => Some(d),
            _ => None,
        }
    }

    fn into_flag(self) -> Option<bool> {
        match self {
            FieldValue::Flag(b) => Some(b),
            _ => None,
        }
    }

    fn into_number(self) -> Option<Decimal> {
        match self {
            FieldValue::Number(n) => Some(n),
            _ => None,
        }
    }

    fn into_text(self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Every trade column except identity and ownership. Unset fields stay
/// `None`: null on insert, unchanged on update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeData {
    pub date: Option<NaiveDate>,
    pub pair: Option<String>,
    pub system: Option<String>,
    pub action: Option<String>,
    pub risk: Option<String>,
    pub risk_percent: Option<Decimal>,
    pub lots: Option<Decimal>,
    pub entry: Option<Decimal>,
    pub sl1_pips: Option<Decimal>,
    pub tp1_pips: Option<Decimal>,
    pub sl2_pips: Option<Decimal>,
    pub tp2_pips: Option<Decimal>,
    pub cancelled: Option<bool>,
    pub profit_or_loss: Option<Decimal>,
    pub comments: Option<String>,
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

impl TradeData {
    /// Store `value` in `field`. A value of the wrong kind clears the field.
    pub fn set(&mut self, field: TradeField, value: FieldValue) {
        match field {
            TradeField::Date => self.date = value.into_date(),
            TradeField::Pair => self.pair = value.into_text(),
            TradeField::System => self.system = value.into_text(),
            TradeField::Action => self.action = value.into_text(),
            TradeField::Risk => self.risk = value.into_text(),
            TradeField::RiskPercent => self.risk_percent = value.into_number(),
            TradeField::Lots => self.lots = value.into_number(),
            TradeField::Entry => self.entry = value.into_number(),
            TradeField::Sl1Pips => self.sl1_pips = value.into_number(),
            TradeField::Tp1Pips => self.tp1_pips = value.into_number(),
            TradeField::Sl2Pips => self.sl2_pips = value.into_number(),
            TradeField::Tp2Pips => self.tp2_pips = value.into_number(),
            TradeField::Cancelled => self.cancelled = value.into_flag(),
            TradeField::ProfitOrLoss => self.profit_or_loss = value.into_number(),
            TradeField::Comments => self.comments = value.into_text(),
            TradeField::InstrumentName => self.instrument_name = value.into_text(),
            TradeField::Isin => self.isin = value.into_text(),
            TradeField::Currency => self.currency = value.into_text(),
            TradeField::OperationType => self.operation_type = value.into_text(),
            TradeField::Sign => self.sign = value.into_text(),
            TradeField::Quantity => self.quantity = value.into_number(),
            TradeField::ExchangeRate => self.exchange_rate = value.into_number(),
            TradeField::GrossAmount => self.gross_amount = value.into_number(),
            TradeField::CommissionFund => self.commission_fund = value.into_number(),
            TradeField::CommissionBank => self.commission_bank = value.into_number(),
            TradeField::CommissionSgr => self.commission_sgr = value.into_number(),
            TradeField::CommissionAdmin => self.commission_admin = value.into_number(),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == TradeData::default()
    }
}

/// A trade built from a submission or an import row, not yet persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTrade {
    pub owner_id: Uuid,
    pub data: TradeData,
}
