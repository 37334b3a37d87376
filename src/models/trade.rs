//! # models::trade
//!
//! Defines [`Trade`], one recorded position in the journal, and the pieces it
//! is built from.
//!
//! ## Shape
//! A trade is a set of common fields ([`TradeFields`]) plus exactly one
//! type-specific leg ([`TradeKind`]):
//!
//! ```text
//!  TradeFields ── ticker, entry/exit datetime, traded_on, notes
//!      └─ TradeKind ─┬─ Share(ShareLeg)   shares, entry/exit price
//!                    └─ Option(OptionLeg) call/put, contracts, premiums,
//!                                         strike, expiration
//! ```
//!
//! Fields belonging to the other trade type are not representable, so a trade
//! switched from share to option on update simply loses its share leg.
//!
//! On the wire everything is flattened into a single JSON object keyed by
//! `trade_type`, the same flat shape the frontend form edits.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ─── Enums ────────────────────────────────────────────────────────────────────

/// Discriminant choosing which leg a trade carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeType {
    Share,
    Option,
}

impl TradeType {
    /// Case-insensitive parse of the wire name (`"share"` / `"option"`).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "share" => Some(Self::Share),
            "option" => Some(Self::Option),
            _ => None,
        }
    }
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeType::Share => write!(f, "share"),
            TradeType::Option => write!(f, "option"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "call" => Some(Self::Call),
            "put" => Some(Self::Put),
            _ => None,
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Call => write!(f, "call"),
            OptionType::Put => write!(f, "put"),
        }
    }
}

// ─── Legs ─────────────────────────────────────────────────────────────────────

/// Equity position quantified in shares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareLeg {
    pub shares: u32,
    pub entry_price: f64,
    /// `None` while the position is still open.
    #[serde(default)]
    pub exit_price: Option<f64>,
}

/// Option position quantified in contracts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionLeg {
    pub option_type: OptionType,
    pub contracts: u32,
    pub entry_premium: f64,
    /// `None` while the position is still open.
    #[serde(default)]
    pub exit_premium: Option<f64>,
    pub strike_price: f64,
    pub expiration_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "trade_type", rename_all = "lowercase")]
pub enum TradeKind {
    Share(ShareLeg),
    Option(OptionLeg),
}

impl TradeKind {
    pub fn trade_type(&self) -> TradeType {
        match self {
            TradeKind::Share(_) => TradeType::Share,
            TradeKind::Option(_) => TradeType::Option,
        }
    }

    /// Exit price (share) or exit premium (option), if the position is closed.
    pub fn exit_value(&self) -> Option<f64> {
        match self {
            TradeKind::Share(leg) => leg.exit_price,
            TradeKind::Option(leg) => leg.exit_premium,
        }
    }
}

// ─── TradeFields ──────────────────────────────────────────────────────────────

/// A validated trade that has not been assigned an id yet.
///
/// Only [`crate::validation::validate`] produces these from user input, so
/// every value reaching the store has passed the required-field rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeFields {
    /// Instrument symbol, trimmed and uppercased.  Empty when not given.
    pub ticker: String,

    #[serde(flatten)]
    pub kind: TradeKind,

    /// When the position was opened.
    pub entry_datetime: DateTime<Utc>,

    /// When the position was closed.
    #[serde(default)]
    pub exit_datetime: Option<DateTime<Utc>>,

    /// Coarse trade date, independent of the precise entry/exit timestamps.
    #[serde(default)]
    pub traded_on: Option<NaiveDate>,

    #[serde(default)]
    pub notes: Option<String>,
}

impl TradeFields {
    pub fn trade_type(&self) -> TradeType {
        self.kind.trade_type()
    }

    /// `true` while no exit price/premium has been recorded.
    pub fn is_open(&self) -> bool {
        self.kind.exit_value().is_none()
    }
}

// ─── Trade ────────────────────────────────────────────────────────────────────

/// A stored trade, as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Surrogate key assigned by the store; never changes.
    pub id: i64,

    #[serde(flatten)]
    pub fields: TradeFields,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trade {
    pub fn trade_type(&self) -> TradeType {
        self.fields.trade_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn option_trade() -> Trade {
        let at = Utc.with_ymd_and_hms(2024, 2, 1, 10, 0, 0).unwrap();
        Trade {
            id: 7,
            fields: TradeFields {
                ticker: "SPY".into(),
                kind: TradeKind::Option(OptionLeg {
                    option_type: OptionType::Call,
                    contracts: 2,
                    entry_premium: 1.2,
                    exit_premium: None,
                    strike_price: 450.0,
                    expiration_date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
                }),
                entry_datetime: at,
                exit_datetime: None,
                traded_on: None,
                notes: None,
            },
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn serializes_flat_with_only_the_active_leg() {
        let value = serde_json::to_value(option_trade()).unwrap();
        assert_eq!(value["id"], json!(7));
        assert_eq!(value["trade_type"], json!("option"));
        assert_eq!(value["option_type"], json!("call"));
        assert_eq!(value["strike_price"], json!(450.0));
        assert_eq!(value["expiration_date"], json!("2024-03-15"));
        assert_eq!(value["exit_premium"], json!(null));
        assert!(value.get("shares").is_none());
        assert!(value.get("entry_price").is_none());
    }

    #[test]
    fn flat_json_reads_back() {
        let trade = option_trade();
        let value = serde_json::to_value(&trade).unwrap();
        let back: Trade = serde_json::from_value(value).unwrap();
        assert_eq!(back, trade);
    }

    #[test]
    fn open_until_exit_value_recorded() {
        let mut trade = option_trade();
        assert!(trade.fields.is_open());
        if let TradeKind::Option(leg) = &mut trade.fields.kind {
            leg.exit_premium = Some(2.5);
        }
        assert!(!trade.fields.is_open());
        assert_eq!(trade.trade_type(), TradeType::Option);
    }

    #[test]
    fn enum_parse_is_case_insensitive() {
        assert_eq!(TradeType::parse(" Share "), Some(TradeType::Share));
        assert_eq!(TradeType::parse("future"), None);
        assert_eq!(OptionType::parse("PUT"), Some(OptionType::Put));
    }
}
