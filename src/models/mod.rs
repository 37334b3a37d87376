//! Domain models shared across the journal backend.

pub mod params;
pub mod serde_helpers;
pub mod trade;

pub use params::{TradeEnvelope, TradeParams, TradePatch};
pub use trade::{OptionLeg, OptionType, ShareLeg, Trade, TradeFields, TradeKind, TradeType};
