use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// How a raw spreadsheet cell is coerced into a trade field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Date,
    Flag,
    Number,
    Text,
}

// ---------------------------------------------------------------------------
// TradeField: the fixed set of importable trade columns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradeField {
    Date,
    Pair,
    System,
    Action,
    Risk,
    RiskPercent,
    Lots,
    Entry,
    Sl1Pips,
    Tp1Pips,
    Sl2Pips,
    Tp2Pips,
    Cancelled,
    ProfitOrLoss,
    Comments,
    InstrumentName,
    Isin,
    Currency,
    OperationType,
    Sign,
    Quantity,
    ExchangeRate,
    GrossAmount,
    CommissionFund,
    CommissionBank,
    CommissionSgr,
    CommissionAdmin,
}

impl TradeField {
    /// Every field, in the order reported in import issues.
    pub const ALL: [TradeField; 27] = [
        TradeField::Date,
        TradeField::Pair,
        TradeField::System,
        TradeField::Action,
        TradeField::Risk,
        TradeField::RiskPercent,
        TradeField::Lots,
        TradeField::Entry,
        TradeField::Sl1Pips,
        TradeField::Tp1Pips,
        TradeField::Sl2Pips,
        TradeField::Tp2Pips,
        TradeField::Cancelled,
        TradeField::ProfitOrLoss,
        TradeField::Comments,
        TradeField::InstrumentName,
        TradeField::Isin,
        TradeField::Currency,
        TradeField::OperationType,
        TradeField::Sign,
        TradeField::Quantity,
        TradeField::ExchangeRate,
        TradeField::GrossAmount,
        TradeField::CommissionFund,
        TradeField::CommissionBank,
        TradeField::CommissionSgr,
        TradeField::CommissionAdmin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TradeField::Date => "date",
            TradeField::Pair => "pair",
            TradeField::System => "system",
            TradeField::Action => "action",
            TradeField::Risk => "risk",
            TradeField::RiskPercent => "risk_percent",
            TradeField::Lots => "lots",
            TradeField::Entry => "entry",
            TradeField::Sl1Pips => "sl1_pips",
            TradeField::Tp1Pips => "tp1_pips",
            TradeField::Sl2Pips => "sl2_pips",
            TradeField::Tp2Pips => "tp2_pips",
            TradeField::Cancelled => "cancelled",
            TradeField::ProfitOrLoss => "profit_or_loss",
            TradeField::Comments => "comments",
            TradeField::InstrumentName => "instrument_name",
            TradeField::Isin => "isin",
            TradeField::Currency => "currency",
            TradeField::OperationType => "operation_type",
            TradeField::Sign => "sign",
            TradeField::Quantity => "quantity",
            TradeField::ExchangeRate => "exchange_rate",
            TradeField::GrossAmount => "gross_amount",
            TradeField::CommissionFund => "commission_fund",
            TradeField::CommissionBank => "commission_bank",
            TradeField::CommissionSgr => "commission_sgr",
            TradeField::CommissionAdmin => "commission_admin",
        }
    }

    /// Look up a field by its schema name. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.iter().copied().find(|f| f.as_str() == name)
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            TradeField::Date => FieldKind::Date,
            TradeField::Cancelled => FieldKind::Flag,
            TradeField::RiskPercent
            | TradeField::Lots
            | TradeField::Entry
            | TradeField::Sl1Pips
            | TradeField::Tp1Pips
            | TradeField::Sl2Pips
            | TradeField::Tp2Pips
            | TradeField::ProfitOrLoss
            | TradeField::Quantity
            | TradeField::ExchangeRate
            | TradeField::GrossAmount
            | TradeField::CommissionFund
            | TradeField::CommissionBank
            | TradeField::CommissionSgr
            | TradeField::CommissionAdmin => FieldKind::Number,
            TradeField::Pair
            | TradeField::System
            | TradeField::Action
            | TradeField::Risk
            | TradeField::Comments
            | TradeField::InstrumentName
            | TradeField::Isin
            | TradeField::Currency
            | TradeField::OperationType
            | TradeField::Sign => FieldKind::Text,
        }
    }
}

impl fmt::Display for TradeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TradeField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TradeField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        TradeField::from_name(&name)
            .ok_or_else(|| D::Error::custom(format!("unknown trade field `{name}`")))
    }
}
