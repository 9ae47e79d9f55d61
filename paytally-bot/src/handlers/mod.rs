pub mod ingestion;
pub mod reports;
