pub mod config;
pub mod database;
pub mod handlers;
pub mod helpers;
pub mod integrations;
pub mod jobs;
pub mod reports;
pub mod storage;

pub use database::Database;
