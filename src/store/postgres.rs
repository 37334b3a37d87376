//! # store::postgres — PostgreSQL Trade Store
//!
//! Uses `sqlx` (runtime-checked queries, no database needed at build time).
//!
//! ## Setup
//! 1. Create a database
//! 2. Set `DATABASE_URL` in `.env`
//! 3. `cargo run --features postgres` — the schema in `migrations/001_init.sql`
//!    is applied on startup
//!
//! ## Encoding
//! Enum columns are SMALLINT codes (`trade_type`: share=0 option=1,
//! `option_type`: call=0 put=1) and money columns are unconstrained `NUMERIC`,
//! written from the shortest decimal form of the `f64` so every finite amount
//! fits and reads back unchanged.  This module is the only place that knows
//! either.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{
    postgres::{PgArguments, PgPoolOptions},
    query::QueryAs,
    PgPool, Postgres,
};
use tracing::info;

use super::{StoreError, TradeStore};
use crate::models::{
    OptionLeg, OptionType, ShareLeg, Trade, TradeFields, TradeKind, TradeType,
};

// ─── Pool Init ────────────────────────────────────────────────────────────────

/// Creates the pool and applies the embedded migration.
pub async fn init_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    run_migrations(&pool).await?;

    info!("PostgreSQL connected and migrations applied");
    Ok(pool)
}

async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::raw_sql(include_str!("../../migrations/001_init.sql"))
        .execute(pool)
        .await
        .context("Failed to run migration 001_init.sql")?;

    Ok(())
}

// ─── Errors ───────────────────────────────────────────────────────────────────

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => StoreError::Unavailable(err.to_string()),
            _ => StoreError::Query(err.to_string()),
        }
    }
}

// ─── Enum Codes ───────────────────────────────────────────────────────────────

fn trade_type_code(trade_type: TradeType) -> i16 {
    match trade_type {
        TradeType::Share => 0,
        TradeType::Option => 1,
    }
}

fn decode_trade_type(code: i16) -> Result<TradeType, StoreError> {
    match code {
        0 => Ok(TradeType::Share),
        1 => Ok(TradeType::Option),
        other => Err(StoreError::Corrupt(format!("unknown trade_type code {other}"))),
    }
}

fn option_type_code(option_type: OptionType) -> i16 {
    match option_type {
        OptionType::Call => 0,
        OptionType::Put => 1,
    }
}

fn decode_option_type(code: i16) -> Result<OptionType, StoreError> {
    match code {
        0 => Ok(OptionType::Call),
        1 => Ok(OptionType::Put),
        other => Err(StoreError::Corrupt(format!("unknown option_type code {other}"))),
    }
}

// ─── Write Side ───────────────────────────────────────────────────────────────

/// A [`TradeFields`] laid out as table columns.
struct Columns {
    ticker:          String,
    trade_type:      i16,
    option_type:     Option<i16>,
    shares:          Option<i64>,
    contracts:       Option<i64>,
    entry_price:     Option<BigDecimal>,
    exit_price:      Option<BigDecimal>,
    entry_premium:   Option<BigDecimal>,
    exit_premium:    Option<BigDecimal>,
    strike_price:    Option<BigDecimal>,
    expiration_date: Option<NaiveDate>,
    entry_datetime:  DateTime<Utc>,
    exit_datetime:   Option<DateTime<Utc>>,
    traded_on:       Option<NaiveDate>,
    notes:           Option<String>,
}

fn to_decimal(column: &str, value: f64) -> Result<BigDecimal, StoreError> {
    if !value.is_finite() {
        return Err(StoreError::Query(format!("{column}: {value} is not a finite amount")));
    }
    value
        .to_string()
        .parse::<BigDecimal>()
        .map_err(|e| StoreError::Query(format!("{column}: {value}: {e}")))
}

fn opt_decimal(column: &str, value: Option<f64>) -> Result<Option<BigDecimal>, StoreError> {
    value.map(|v| to_decimal(column, v)).transpose()
}

impl TryFrom<TradeFields> for Columns {
    type Error = StoreError;

    fn try_from(fields: TradeFields) -> Result<Self, Self::Error> {
        let mut cols = Columns {
            ticker:          fields.ticker,
            trade_type:      trade_type_code(fields.kind.trade_type()),
            option_type:     None,
            shares:          None,
            contracts:       None,
            entry_price:     None,
            exit_price:      None,
            entry_premium:   None,
            exit_premium:    None,
            strike_price:    None,
            expiration_date: None,
            entry_datetime:  fields.entry_datetime,
            exit_datetime:   fields.exit_datetime,
            traded_on:       fields.traded_on,
            notes:           fields.notes,
        };

        match fields.kind {
            TradeKind::Share(leg) => {
                cols.shares      = Some(i64::from(leg.shares));
                cols.entry_price = Some(to_decimal("entry_price", leg.entry_price)?);
                cols.exit_price  = opt_decimal("exit_price", leg.exit_price)?;
            }
            TradeKind::Option(leg) => {
                cols.option_type     = Some(option_type_code(leg.option_type));
                cols.contracts       = Some(i64::from(leg.contracts));
                cols.entry_premium   = Some(to_decimal("entry_premium", leg.entry_premium)?);
                cols.exit_premium    = opt_decimal("exit_premium", leg.exit_premium)?;
                cols.strike_price    = Some(to_decimal("strike_price", leg.strike_price)?);
                cols.expiration_date = Some(leg.expiration_date);
            }
        }

        Ok(cols)
    }
}

/// Binds `$1..$15` in table column order.
fn bind_columns<'q>(
    query: QueryAs<'q, Postgres, TradeRow, PgArguments>,
    cols: Columns,
) -> QueryAs<'q, Postgres, TradeRow, PgArguments> {
    query
        .bind(cols.ticker)
        .bind(cols.trade_type)
        .bind(cols.option_type)
        .bind(cols.shares)
        .bind(cols.contracts)
        .bind(cols.entry_price)
        .bind(cols.exit_price)
        .bind(cols.entry_premium)
        .bind(cols.exit_premium)
        .bind(cols.strike_price)
        .bind(cols.expiration_date)
        .bind(cols.entry_datetime)
        .bind(cols.exit_datetime)
        .bind(cols.traded_on)
        .bind(cols.notes)
}

// ─── Read Side ────────────────────────────────────────────────────────────────

#[derive(Debug, sqlx::FromRow)]
struct TradeRow {
    id:              i64,
    ticker:          String,
    trade_type:      i16,
    option_type:     Option<i16>,
    shares:          Option<i64>,
    contracts:       Option<i64>,
    entry_price:     Option<BigDecimal>,
    exit_price:      Option<BigDecimal>,
    entry_premium:   Option<BigDecimal>,
    exit_premium:    Option<BigDecimal>,
    strike_price:    Option<BigDecimal>,
    expiration_date: Option<NaiveDate>,
    entry_datetime:  DateTime<Utc>,
    exit_datetime:   Option<DateTime<Utc>>,
    traded_on:       Option<NaiveDate>,
    notes:           Option<String>,
    created_at:      DateTime<Utc>,
    updated_at:      DateTime<Utc>,
}

impl TradeRow {
    fn present<T>(&self, column: &str, value: Option<T>) -> Result<T, StoreError> {
        value.ok_or_else(|| {
            StoreError::Corrupt(format!("trade {}: {column} is NULL", self.id))
        })
    }

    fn quantity(&self, column: &str, value: Option<i64>) -> Result<u32, StoreError> {
        let raw = self.present(column, value)?;
        u32::try_from(raw).map_err(|_| {
            StoreError::Corrupt(format!("trade {}: {column} = {raw} out of range", self.id))
        })
    }

    fn amount(&self, column: &str, value: Option<&BigDecimal>) -> Result<f64, StoreError> {
        self.present(column, value)?.to_f64().ok_or_else(|| {
            StoreError::Corrupt(format!("trade {}: {column} not representable", self.id))
        })
    }

    fn opt_amount(&self, column: &str, value: Option<&BigDecimal>) -> Result<Option<f64>, StoreError> {
        value.map(|v| self.amount(column, Some(v))).transpose()
    }

    fn kind(&self) -> Result<TradeKind, StoreError> {
        Ok(match decode_trade_type(self.trade_type)? {
            TradeType::Share => TradeKind::Share(ShareLeg {
                shares:      self.quantity("shares", self.shares)?,
                entry_price: self.amount("entry_price", self.entry_price.as_ref())?,
                exit_price:  self.opt_amount("exit_price", self.exit_price.as_ref())?,
            }),
            TradeType::Option => TradeKind::Option(OptionLeg {
                option_type:     decode_option_type(self.present("option_type", self.option_type)?)?,
                contracts:       self.quantity("contracts", self.contracts)?,
                entry_premium:   self.amount("entry_premium", self.entry_premium.as_ref())?,
                exit_premium:    self.opt_amount("exit_premium", self.exit_premium.as_ref())?,
                strike_price:    self.amount("strike_price", self.strike_price.as_ref())?,
                expiration_date: self.present("expiration_date", self.expiration_date)?,
            }),
        })
    }
}

impl TryFrom<TradeRow> for Trade {
    type Error = StoreError;

    fn try_from(row: TradeRow) -> Result<Self, Self::Error> {
        let kind = row.kind()?;
        Ok(Trade {
            id: row.id,
            fields: TradeFields {
                ticker: row.ticker,
                kind,
                entry_datetime: row.entry_datetime,
                exit_datetime: row.exit_datetime,
                traded_on: row.traded_on,
                notes: row.notes,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// ─── Store ────────────────────────────────────────────────────────────────────

const INSERT_TRADE: &str = r#"
    INSERT INTO trades
      (ticker, trade_type, option_type, shares, contracts,
       entry_price, exit_price, entry_premium, exit_premium, strike_price,
       expiration_date, entry_datetime, exit_datetime, traded_on, notes)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
    RETURNING *
"#;

const UPDATE_TRADE: &str = r#"
    UPDATE trades SET
      ticker = $1, trade_type = $2, option_type = $3, shares = $4, contracts = $5,
      entry_price = $6, exit_price = $7, entry_premium = $8, exit_premium = $9,
      strike_price = $10, expiration_date = $11, entry_datetime = $12,
      exit_datetime = $13, traded_on = $14, notes = $15, updated_at = now()
    WHERE id = $16
    RETURNING *
"#;

pub struct PgTradeStore {
    pool: PgPool,
}

impl PgTradeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TradeStore for PgTradeStore {
    async fn list(&self) -> Result<Vec<Trade>, StoreError> {
        let rows = sqlx::query_as::<_, TradeRow>(
            "SELECT * FROM trades ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Trade::try_from).collect()
    }

    async fn get(&self, id: i64) -> Result<Option<Trade>, StoreError> {
        sqlx::query_as::<_, TradeRow>("SELECT * FROM trades WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Trade::try_from)
            .transpose()
    }

    async fn insert(&self, fields: TradeFields) -> Result<Trade, StoreError> {
        let cols = Columns::try_from(fields)?;
        let row = bind_columns(sqlx::query_as(INSERT_TRADE), cols)
            .fetch_one(&self.pool)
            .await?;

        Trade::try_from(row)
    }

    async fn replace(&self, id: i64, fields: TradeFields) -> Result<Option<Trade>, StoreError> {
        let cols = Columns::try_from(fields)?;
        bind_columns(sqlx::query_as(UPDATE_TRADE), cols)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Trade::try_from)
            .transpose()
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM trades WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
