//! # models::params
//!
//! Request-side shapes.  Nothing here is trusted: [`TradeParams`] is a loose
//! candidate that only becomes a [`TradeFields`] after passing
//! [`crate::validation::validate`].
//!
//! Fields outside the permitted set are ignored by serde, not rejected.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::models::serde_helpers as lenient;
use crate::models::trade::{Trade, TradeKind};

/// Rails-style `{ "trade": { … } }` request body.
#[derive(Debug, Deserialize)]
pub struct TradeEnvelope<T> {
    pub trade: T,
}

// ─── TradeParams ──────────────────────────────────────────────────────────────

/// Candidate trade as submitted by a create request (or as produced by
/// merging a [`TradePatch`] over a stored trade).
///
/// Enum fields stay raw strings so an unknown `trade_type` surfaces as a field
/// error rather than a body decode failure.  Quantities stay signed so a
/// negative value can be reported as such.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TradeParams {
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub ticker: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub trade_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub option_type: Option<String>,

    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub shares: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub contracts: Option<i64>,

    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub entry_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub exit_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub entry_premium: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub exit_premium: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub strike_price: Option<f64>,

    #[serde(default, deserialize_with = "lenient::opt_date")]
    pub expiration_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::opt_datetime")]
    pub entry_datetime: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::opt_datetime")]
    pub exit_datetime: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::opt_date")]
    pub traded_on: Option<NaiveDate>,

    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub notes: Option<String>,
}

impl From<&Trade> for TradeParams {
    /// Unfolds a stored trade back into a candidate, so an update can be
    /// validated as a whole record.
    fn from(trade: &Trade) -> Self {
        let f = &trade.fields;
        let mut params = TradeParams {
            ticker: Some(f.ticker.clone()).filter(|t| !t.is_empty()),
            trade_type: Some(f.trade_type().to_string()),
            entry_datetime: Some(f.entry_datetime),
            exit_datetime: f.exit_datetime,
            traded_on: f.traded_on,
            notes: f.notes.clone(),
            ..Default::default()
        };

        match &f.kind {
            TradeKind::Share(leg) => {
                params.shares = Some(i64::from(leg.shares));
                params.entry_price = Some(leg.entry_price);
                params.exit_price = leg.exit_price;
            }
            TradeKind::Option(leg) => {
                params.option_type = Some(leg.option_type.to_string());
                params.contracts = Some(i64::from(leg.contracts));
                params.entry_premium = Some(leg.entry_premium);
                params.exit_premium = leg.exit_premium;
                params.strike_price = Some(leg.strike_price);
                params.expiration_date = Some(leg.expiration_date);
            }
        }

        params
    }
}

// ─── TradePatch ───────────────────────────────────────────────────────────────

/// Partial update.  Outer `None` = key absent (keep), `Some(None)` = explicit
/// `null` or blank (clear), `Some(Some(v))` = overwrite.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TradePatch {
    #[serde(default, deserialize_with = "lenient::patch_text")]
    pub ticker: Option<Option<String>>,
    #[serde(default, deserialize_with = "lenient::patch_text")]
    pub trade_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "lenient::patch_text")]
    pub option_type: Option<Option<String>>,

    #[serde(default, deserialize_with = "lenient::patch_i64")]
    pub shares: Option<Option<i64>>,
    #[serde(default, deserialize_with = "lenient::patch_i64")]
    pub contracts: Option<Option<i64>>,

    #[serde(default, deserialize_with = "lenient::patch_f64")]
    pub entry_price: Option<Option<f64>>,
    #[serde(default, deserialize_with = "lenient::patch_f64")]
    pub exit_price: Option<Option<f64>>,
    #[serde(default, deserialize_with = "lenient::patch_f64")]
    pub entry_premium: Option<Option<f64>>,
    #[serde(default, deserialize_with = "lenient::patch_f64")]
    pub exit_premium: Option<Option<f64>>,
    #[serde(default, deserialize_with = "lenient::patch_f64")]
    pub strike_price: Option<Option<f64>>,

    #[serde(default, deserialize_with = "lenient::patch_date")]
    pub expiration_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "lenient::patch_datetime")]
    pub entry_datetime: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "lenient::patch_datetime")]
    pub exit_datetime: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "lenient::patch_date")]
    pub traded_on: Option<Option<NaiveDate>>,

    #[serde(default, deserialize_with = "lenient::patch_text")]
    pub notes: Option<Option<String>>,
}

macro_rules! merge_fields {
    ($patch:ident, $base:ident; $($field:ident),* $(,)?) => {
        $(
            if let Some(value) = $patch.$field {
                $base.$field = value;
            }
        )*
    };
}

impl TradePatch {
    /// Overlays the keys present in this patch onto `base`.
    pub fn apply(self, mut base: TradeParams) -> TradeParams {
        let patch = self;
        merge_fields!(patch, base;
            ticker, trade_type, option_type,
            shares, contracts,
            entry_price, exit_price, entry_premium, exit_premium, strike_price,
            expiration_date, entry_datetime, exit_datetime, traded_on,
            notes,
        );
        base
    }
}
