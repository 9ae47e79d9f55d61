use crate::storage::TransactionStore;
use rust_decimal::Decimal;
use shared_types::{Currency, CurrencySummary, Dimension, ReportError, ReportFilter};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Grouping key for breakdown reports. Field order gives the output order:
/// dimension value alphabetically, then `$` before `៛`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct AggregationKey {
    pub value: Option<String>,
    pub currency: Currency,
}

type Buckets = BTreeMap<AggregationKey, (Decimal, i64)>;

fn add(buckets: &mut Buckets, key: AggregationKey, total: Decimal, count: i64) {
    let entry = buckets.entry(key).or_insert((Decimal::ZERO, 0));
    entry.0 += total;
    entry.1 += count;
}

fn into_summaries(buckets: Buckets, dimension: Dimension) -> Vec<CurrencySummary> {
    buckets
        .into_iter()
        .map(|(key, (total, count))| {
            let (bank, transport) = match dimension {
                Dimension::Bank => (key.value, None),
                Dimension::Transport => (None, key.value),
            };
            CurrencySummary {
                bank,
                transport,
                currency: key.currency,
                total,
                count,
            }
        })
        .collect()
}

pub struct ReportAggregator {
    store: Arc<dyn TransactionStore>,
}

impl ReportAggregator {
    pub fn new(store: Arc<dyn TransactionStore>) -> Self {
        Self { store }
    }

    /// Per-currency totals, or per (dimension value, currency) when a
    /// dimension is given. Combinations with no transactions are absent.
    pub async fn summarize(
        &self,
        filter: &ReportFilter,
        dimension: Option<Dimension>,
    ) -> Result<Vec<CurrencySummary>, ReportError> {
        let store_error = |e: anyhow::Error| {
            tracing::error!("Report query failed for {}: {:#}", filter, e);
            ReportError::StoreQuery {
                filter: filter.to_string(),
                message: format!("{e:#}"),
            }
        };

        let Some(dimension) = dimension else {
            let totals = self
                .store
                .sum_by_currency(filter)
                .await
                .map_err(store_error)?;
            return Ok(Currency::ALL
                .iter()
                .filter_map(|&currency| {
                    let (total, count) = totals.get(currency);
                    (count > 0).then_some(CurrencySummary {
                        bank: None,
                        transport: None,
                        currency,
                        total,
                        count,
                    })
                })
                .collect());
        };

        let rows = self
            .store
            .summary_by_dimension_and_currency(filter, dimension)
            .await
            .map_err(store_error)?;

        let mut buckets = Buckets::new();
        for row in rows {
            let key = AggregationKey {
                value: row.dimension_value(dimension).map(str::to_string),
                currency: row.currency,
            };
            add(&mut buckets, key, row.total, row.count);
        }

        let summaries = into_summaries(buckets, dimension);
        tracing::debug!(
            "Summarized {} rows by {} for {}",
            summaries.len(),
            dimension.column(),
            filter
        );
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::NewTransaction;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use shared_types::CurrencyTotals;

    /// Returns canned rows, or fails every query
    struct CannedStore {
        totals: CurrencyTotals,
        rows: Vec<CurrencySummary>,
        fail: bool,
    }

    #[async_trait]
    impl TransactionStore for CannedStore {
        async fn create_transaction(&self, _transaction: &NewTransaction) -> anyhow::Result<i64> {
            Ok(1)
        }

        async fn sum_by_currency(&self, _filter: &ReportFilter) -> anyhow::Result<CurrencyTotals> {
            if self.fail {
                anyhow::bail!("database is locked");
            }
            Ok(self.totals)
        }

        async fn summary_by_dimension_and_currency(
            &self,
            _filter: &ReportFilter,
            _dimension: Dimension,
        ) -> anyhow::Result<Vec<CurrencySummary>> {
            if self.fail {
                anyhow::bail!("database is locked");
            }
            Ok(self.rows.clone())
        }
    }

    fn filter() -> ReportFilter {
        ReportFilter::as_of(-100, NaiveDate::from_ymd_opt(2025, 7, 15).unwrap())
    }

    fn bank_row(bank: &str, currency: Currency, total: Decimal, count: i64) -> CurrencySummary {
        CurrencySummary {
            bank: Some(bank.to_string()),
            transport: None,
            currency,
            total,
            count,
        }
    }

    #[tokio::test]
    async fn test_totals_skip_empty_currency() {
        let aggregator = ReportAggregator::new(Arc::new(CannedStore {
            totals: CurrencyTotals {
                usd_total: Decimal::new(1550, 2),
                usd_count: 2,
                ..Default::default()
            },
            rows: vec![],
            fail: false,
        }));

        let summaries = aggregator.summarize(&filter(), None).await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].currency, Currency::Usd);
        assert_eq!(summaries[0].total, Decimal::new(1550, 2));
        assert_eq!(summaries[0].count, 2);
    }

    #[tokio::test]
    async fn test_dimension_rows_are_merged_and_sorted() {
        let aggregator = ReportAggregator::new(Arc::new(CannedStore {
            totals: CurrencyTotals::default(),
            rows: vec![
                bank_row("Wing Bank", Currency::Khr, Decimal::from(4000), 1),
                bank_row("ABA", Currency::Khr, Decimal::from(1000), 1),
                bank_row("ABA", Currency::Usd, Decimal::new(300, 2), 1),
                bank_row("ABA", Currency::Khr, Decimal::from(500), 2),
            ],
            fail: false,
        }));

        let summaries = aggregator
            .summarize(&filter(), Some(Dimension::Bank))
            .await
            .unwrap();

        assert_eq!(
            summaries,
            vec![
                bank_row("ABA", Currency::Usd, Decimal::new(300, 2), 1),
                bank_row("ABA", Currency::Khr, Decimal::from(1500), 3),
                bank_row("Wing Bank", Currency::Khr, Decimal::from(4000), 1),
            ]
        );
    }

    #[tokio::test]
    async fn test_store_failure_is_store_query_error() {
        let aggregator = ReportAggregator::new(Arc::new(CannedStore {
            totals: CurrencyTotals::default(),
            rows: vec![],
            fail: true,
        }));

        let err = aggregator.summarize(&filter(), None).await.unwrap_err();
        match err {
            ReportError::StoreQuery { filter, message } => {
                assert_eq!(filter, "group=-100 as_of=2025-07-15");
                assert!(message.contains("database is locked"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
