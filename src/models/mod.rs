pub mod field;
pub mod trade;
pub mod user;

pub use field::{FieldKind, TradeField};
pub use trade::{FieldValue, NewTrade, Trade, TradeData};
pub use user::{Role, User};
