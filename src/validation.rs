//! # validation — Trade Validation Gate
//!
//! Decides whether a candidate [`TradeParams`] is a well-formed trade.  Create
//! and update both pass through here before the store is touched.
//!
//! ## Rules
//! 1. **Trade type**      — `trade_type` must be `share` or `option`
//! 2. **Entry timestamp** — `entry_datetime` is always required
//! 3. **Leg fields**      — required set depends on the trade type
//!    - share:  `shares`, `entry_price`, `exit_price`
//!    - option: `contracts`, `entry_premium`, `exit_premium`, `strike_price`,
//!      `expiration_date`, `option_type`
//! 4. **Exit timestamp**  — required once an exit price/premium is recorded
//!
//! Quantities and amounts must also be non-negative.  A negative value is
//! reported as `must_be_non_negative` instead of `required`.
//!
//! Every violation is collected; the caller gets the whole list at once.
//!
//! Whether the exit price/premium is mandatory is governed by [`ExitPolicy`].

use std::fmt;
use std::str::FromStr;

use serde::ser::{Serialize, SerializeStruct, Serializer};
use tracing::debug;

use crate::models::{
    OptionLeg, OptionType, ShareLeg, TradeFields, TradeKind, TradeParams, TradeType,
};

// ─── Policy ───────────────────────────────────────────────────────────────────

/// How the exit side of a trade is treated at validation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExitPolicy {
    /// Exit price/premium is required: every journaled trade is a closed one.
    #[default]
    RequireExit,
    /// Exit price/premium may be omitted; such a trade is an open position.
    AllowOpen,
}

impl FromStr for ExitPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "require_exit" => Ok(Self::RequireExit),
            "allow_open" => Ok(Self::AllowOpen),
            other => Err(format!(
                "unknown exit policy '{other}'. Use 'require_exit' or 'allow_open'"
            )),
        }
    }
}

impl fmt::Display for ExitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitPolicy::RequireExit => write!(f, "require_exit"),
            ExitPolicy::AllowOpen => write!(f, "allow_open"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidationPolicy {
    pub exit: ExitPolicy,
}

// ─── FieldError ───────────────────────────────────────────────────────────────

/// Candidate fields that can carry a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TradeField {
    TradeType,
    EntryDatetime,
    Shares,
    EntryPrice,
    ExitPrice,
    Contracts,
    EntryPremium,
    ExitPremium,
    StrikePrice,
    ExpirationDate,
    OptionType,
    ExitDatetime,
}

impl TradeField {
    /// Wire name, matching the request/response JSON keys.
    pub fn name(self) -> &'static str {
        match self {
            TradeField::TradeType => "trade_type",
            TradeField::EntryDatetime => "entry_datetime",
            TradeField::Shares => "shares",
            TradeField::EntryPrice => "entry_price",
            TradeField::ExitPrice => "exit_price",
            TradeField::Contracts => "contracts",
            TradeField::EntryPremium => "entry_premium",
            TradeField::ExitPremium => "exit_premium",
            TradeField::StrikePrice => "strike_price",
            TradeField::ExpirationDate => "expiration_date",
            TradeField::OptionType => "option_type",
            TradeField::ExitDatetime => "exit_datetime",
        }
    }

    fn label(self) -> &'static str {
        match self {
            TradeField::TradeType => "Trade type",
            TradeField::EntryDatetime => "Entry datetime",
            TradeField::Shares => "Shares",
            TradeField::EntryPrice => "Entry price",
            TradeField::ExitPrice => "Exit price",
            TradeField::Contracts => "Contracts",
            TradeField::EntryPremium => "Entry premium",
            TradeField::ExitPremium => "Exit premium",
            TradeField::StrikePrice => "Strike price",
            TradeField::ExpirationDate => "Expiration date",
            TradeField::OptionType => "Option type",
            TradeField::ExitDatetime => "Exit datetime",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reason {
    Required,
    /// Present but not one of the accepted enum values, or a non-finite amount.
    Invalid,
    MustBeNonNegative,
    /// Quantity beyond what a journal entry can hold.
    TooLarge,
}

impl Reason {
    pub fn code(self) -> &'static str {
        match self {
            Reason::Required => "required",
            Reason::Invalid => "invalid",
            Reason::MustBeNonNegative => "must_be_non_negative",
            Reason::TooLarge => "too_large",
        }
    }

    fn phrase(self) -> &'static str {
        match self {
            Reason::Required => "can't be blank",
            Reason::Invalid => "is not a recognised value",
            Reason::MustBeNonNegative => "must be non-negative",
            Reason::TooLarge => "is too large",
        }
    }
}

/// One rejected field and why.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldError {
    pub field: TradeField,
    pub reason: Reason,
}

impl FieldError {
    pub fn new(field: TradeField, reason: Reason) -> Self {
        Self { field, reason }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field.label(), self.reason.phrase())
    }
}

impl Serialize for FieldError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("FieldError", 3)?;
        s.serialize_field("field", self.field.name())?;
        s.serialize_field("code", self.reason.code())?;
        s.serialize_field("message", &self.to_string())?;
        s.end()
    }
}

// ─── Collector ────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Violations(Vec<FieldError>);

impl Violations {
    fn push(&mut self, field: TradeField, reason: Reason) {
        self.0.push(FieldError::new(field, reason));
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn require<T>(&mut self, field: TradeField, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.push(field, Reason::Required);
        }
        value
    }

    /// Required whole-number quantity.
    fn quantity(&mut self, field: TradeField, value: Option<i64>) -> Option<u32> {
        let raw = self.require(field, value)?;
        if raw < 0 {
            self.push(field, Reason::MustBeNonNegative);
            return None;
        }
        match u32::try_from(raw) {
            Ok(qty) => Some(qty),
            Err(_) => {
                self.push(field, Reason::TooLarge);
                None
            }
        }
    }

    /// Non-negative check for an amount that is already known to be present.
    fn non_negative(&mut self, field: TradeField, value: f64) -> Option<f64> {
        if !value.is_finite() {
            self.push(field, Reason::Invalid);
            None
        } else if value < 0.0 {
            self.push(field, Reason::MustBeNonNegative);
            None
        } else {
            Some(value)
        }
    }

    /// Required decimal amount.
    fn amount(&mut self, field: TradeField, value: Option<f64>) -> Option<f64> {
        let raw = self.require(field, value)?;
        self.non_negative(field, raw)
    }

    /// Exit amount, required or not depending on `policy`.
    ///
    /// Returns `Some(None)` for an accepted absence (open position) and
    /// `None` when a violation was recorded.
    fn exit_amount(
        &mut self,
        field: TradeField,
        value: Option<f64>,
        policy: ExitPolicy,
    ) -> Option<Option<f64>> {
        match (value, policy) {
            (Some(raw), _) => self.non_negative(field, raw).map(Some),
            (None, ExitPolicy::AllowOpen) => Some(None),
            (None, ExitPolicy::RequireExit) => {
                self.push(field, Reason::Required);
                None
            }
        }
    }

    fn into_inner(self) -> Vec<FieldError> {
        self.0
    }
}

// ─── Main Check ───────────────────────────────────────────────────────────────

/// Validates `candidate` under `policy`.
///
/// On success the returned [`TradeFields`] carries only the leg matching
/// `trade_type`; fields of the other leg are dropped.  On failure every
/// violation is returned, ordered as the rules are listed above.
pub fn validate(
    candidate: &TradeParams,
    policy: &ValidationPolicy,
) -> Result<TradeFields, Vec<FieldError>> {
    let mut v = Violations::default();

    // ── [1] Trade type ────────────────────────────────────────────────────────
    let trade_type = match candidate.trade_type.as_deref() {
        None => {
            v.push(TradeField::TradeType, Reason::Required);
            None
        }
        Some(raw) => {
            let parsed = TradeType::parse(raw);
            if parsed.is_none() {
                v.push(TradeField::TradeType, Reason::Invalid);
            }
            parsed
        }
    };

    // ── [2] Entry timestamp ───────────────────────────────────────────────────
    let entry_datetime = v.require(TradeField::EntryDatetime, candidate.entry_datetime);

    // ── [3] Leg fields ────────────────────────────────────────────────────────
    // Without a usable trade type there is no leg to check.
    let kind = match trade_type {
        Some(TradeType::Share) => share_leg(candidate, policy.exit, &mut v),
        Some(TradeType::Option) => option_leg(candidate, policy.exit, &mut v),
        None => None,
    };

    // ── [4] Exit timestamp ────────────────────────────────────────────────────
    let exit_recorded = match trade_type {
        Some(TradeType::Share) => candidate.exit_price.is_some(),
        Some(TradeType::Option) => candidate.exit_premium.is_some(),
        None => false,
    };
    if exit_recorded && candidate.exit_datetime.is_none() {
        v.push(TradeField::ExitDatetime, Reason::Required);
    }

    match (kind, entry_datetime) {
        (Some(kind), Some(entry_datetime)) if v.is_empty() => Ok(TradeFields {
            ticker: normalise_ticker(candidate.ticker.as_deref()),
            kind,
            entry_datetime,
            exit_datetime: candidate.exit_datetime,
            traded_on: candidate.traded_on,
            notes: candidate.notes.clone(),
        }),
        _ => {
            let errors = v.into_inner();
            debug!(
                trade_type = ?trade_type,
                violations = errors.len(),
                "trade candidate rejected"
            );
            Err(errors)
        }
    }
}

fn share_leg(p: &TradeParams, exit: ExitPolicy, v: &mut Violations) -> Option<TradeKind> {
    // All checks run before any `?` so every violation is recorded.
    let shares = v.quantity(TradeField::Shares, p.shares);
    let entry_price = v.amount(TradeField::EntryPrice, p.entry_price);
    let exit_price = v.exit_amount(TradeField::ExitPrice, p.exit_price, exit);

    Some(TradeKind::Share(ShareLeg {
        shares: shares?,
        entry_price: entry_price?,
        exit_price: exit_price?,
    }))
}

fn option_leg(p: &TradeParams, exit: ExitPolicy, v: &mut Violations) -> Option<TradeKind> {
    let contracts = v.quantity(TradeField::Contracts, p.contracts);
    let entry_premium = v.amount(TradeField::EntryPremium, p.entry_premium);
    let exit_premium = v.exit_amount(TradeField::ExitPremium, p.exit_premium, exit);
    let strike_price = v.amount(TradeField::StrikePrice, p.strike_price);
    let expiration_date = v.require(TradeField::ExpirationDate, p.expiration_date);
    let option_type = match p.option_type.as_deref() {
        None => {
            v.push(TradeField::OptionType, Reason::Required);
            None
        }
        Some(raw) => {
            let parsed = OptionType::parse(raw);
            if parsed.is_none() {
                v.push(TradeField::OptionType, Reason::Invalid);
            }
            parsed
        }
    };

    Some(TradeKind::Option(OptionLeg {
        option_type: option_type?,
        contracts: contracts?,
        entry_premium: entry_premium?,
        exit_premium: exit_premium?,
        strike_price: strike_price?,
        expiration_date: expiration_date?,
    }))
}

fn normalise_ticker(raw: Option<&str>) -> String {
    raw.map(|t| t.trim().to_ascii_uppercase()).unwrap_or_default()
}

// ─── Tests ────────────────────────────────────────────────────────────────────
