//! Extractors Crate
//!
//! Turns free-text payment notifications posted by banks and payment apps
//! into structured [`shared_types::TransactionRecord`]s.
//!
//! # Available Extractors
//!
//! - `NotificationParser`: ordered table of notification shapes, first match wins
//!
//! # Example
//!
//! ```rust,ignore
//! use extractors::NotificationParser;
//!
//! let parser = NotificationParser::new()?;
//! let text = "$3.00 paid by JOHN DOE on 01-Jan-2025 via ABA PAY at SHOP. Trx. ID: 1, APV: 2.";
//! let record = parser.parse(text)?;
//! ```

pub mod notification_patterns;

pub use notification_patterns::NotificationParser;
