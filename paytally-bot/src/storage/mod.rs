pub mod sqlite_storage;

pub use sqlite_storage::SqliteTransactionStore;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared_types::{CurrencySummary, CurrencyTotals, Dimension, ReportFilter, TransactionRecord};

/// A parsed record together with where and when it was received
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub group_id: i64,
    pub bot_name: String,
    pub record: TransactionRecord,
    pub received_at: DateTime<Utc>,
}

/// Query interface the reporting core needs from persistent storage
#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn create_transaction(&self, transaction: &NewTransaction) -> Result<i64>;

    async fn sum_by_currency(&self, filter: &ReportFilter) -> Result<CurrencyTotals>;

    async fn summary_by_dimension_and_currency(
        &self,
        filter: &ReportFilter,
        dimension: Dimension,
    ) -> Result<Vec<CurrencySummary>>;
}
