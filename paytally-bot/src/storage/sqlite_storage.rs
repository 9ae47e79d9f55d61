use super::{NewTransaction, TransactionStore};
use crate::database::AsyncDbConnection;
use crate::reports::date_range::local_midnight;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Days, Utc};
use chrono_tz::Tz;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use shared_types::{
    Currency, CurrencySummary, CurrencyTotals, Dimension, ReportFilter, ReportWindow,
};

pub struct SqliteTransactionStore {
    db_conn: AsyncDbConnection,
    /// Zone that `ReportWindow::AsOf` days are interpreted in
    tz: Tz,
}

impl SqliteTransactionStore {
    pub fn new(db_conn: AsyncDbConnection, tz: Tz) -> Self {
        Self { db_conn, tz }
    }

    /// Half-open `[start, end)` in unix seconds
    fn bounds(&self, window: &ReportWindow) -> Result<(i64, i64)> {
        match *window {
            ReportWindow::AsOf(day) => {
                let next = day
                    .checked_add_days(Days::new(1))
                    .context("date out of range")?;
                let start = local_midnight(self.tz, day)?;
                let end = local_midnight(self.tz, next)?;
                Ok((start.timestamp(), end.timestamp()))
            }
            ReportWindow::Between { start, end } => Ok((start.timestamp(), ceil_seconds(end))),
        }
    }
}

fn ceil_seconds(instant: DateTime<Utc>) -> i64 {
    if instant.timestamp_subsec_nanos() > 0 {
        instant.timestamp() + 1
    } else {
        instant.timestamp()
    }
}

/// Exact hundredths; amounts with finer precision or beyond `i64` are rejected
fn to_minor(amount: Decimal) -> Result<i64> {
    let minor = amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .with_context(|| format!("amount out of range: {amount}"))?;
    if !minor.fract().is_zero() {
        anyhow::bail!("amount has more than two decimal places: {amount}");
    }
    minor
        .to_i64()
        .with_context(|| format!("amount out of range: {amount}"))
}

fn from_minor(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}

fn parse_currency(symbol: &str) -> Result<Currency> {
    symbol
        .parse::<Currency>()
        .map_err(|e| anyhow::anyhow!("stored row has {e}"))
}

#[async_trait]
impl TransactionStore for SqliteTransactionStore {
    async fn create_transaction(&self, transaction: &NewTransaction) -> Result<i64> {
        let conn = self.db_conn.lock().await?;
        let record = &transaction.record;

        let id: i64 = conn.query_row(
            "INSERT INTO payment_transactions
             (group_id, bot_name, format, currency, amount_minor, sender, receiver, transport,
              bank, trx_id, apv, occurred_on, raw_text, received_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING id",
            rusqlite::params![
                transaction.group_id,
                &transaction.bot_name,
                record.format.name(),
                record.currency.symbol(),
                to_minor(record.amount)?,
                &record.sender,
                &record.receiver,
                &record.transport,
                &record.bank,
                &record.trx_id,
                &record.apv,
                &record.occurred_on,
                &record.raw_text,
                transaction.received_at.timestamp(),
            ],
            |row| row.get(0),
        )?;

        Ok(id)
    }

    async fn sum_by_currency(&self, filter: &ReportFilter) -> Result<CurrencyTotals> {
        let (start, end) = self.bounds(&filter.window)?;
        let conn = self.db_conn.lock().await?;

        let mut stmt = conn.prepare(
            "SELECT currency, COALESCE(SUM(amount_minor), 0), COUNT(*)
             FROM payment_transactions
             WHERE group_id = ? AND received_at >= ? AND received_at < ?
             GROUP BY currency",
        )?;

        let rows = stmt
            .query_map(rusqlite::params![filter.group_id, start, end], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut totals = CurrencyTotals::default();
        for (symbol, minor, count) in rows {
            match parse_currency(&symbol)? {
                Currency::Usd => {
                    totals.usd_total = from_minor(minor);
                    totals.usd_count = count;
                }
                Currency::Khr => {
                    totals.khr_total = from_minor(minor);
                    totals.khr_count = count;
                }
            }
        }

        Ok(totals)
    }

    async fn summary_by_dimension_and_currency(
        &self,
        filter: &ReportFilter,
        dimension: Dimension,
    ) -> Result<Vec<CurrencySummary>> {
        let (start, end) = self.bounds(&filter.window)?;
        let conn = self.db_conn.lock().await?;

        // column comes from a closed enum, never from user input
        let column = dimension.column();
        let mut stmt = conn.prepare(&format!(
            "SELECT {column}, currency, SUM(amount_minor), COUNT(*)
             FROM payment_transactions
             WHERE group_id = ? AND received_at >= ? AND received_at < ?
             GROUP BY {column}, currency
             ORDER BY {column}, currency"
        ))?;

        let rows = stmt
            .query_map(rusqlite::params![filter.group_id, start, end], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(value, symbol, minor, count)| {
                let (bank, transport) = match dimension {
                    Dimension::Bank => (Some(value), None),
                    Dimension::Transport => (None, Some(value)),
                };
                Ok(CurrencySummary {
                    bank,
                    transport,
                    currency: parse_currency(&symbol)?,
                    total: from_minor(minor),
                    count,
                })
            })
            .collect()
    }
}
