pub mod aggregator;
pub mod callback;
pub mod controller;
pub mod date_range;
pub mod formatter;

pub use aggregator::ReportAggregator;
pub use callback::{ReportKind, ReportMenu, ReportPeriod, ReportRequest};
pub use controller::ReportController;
pub use date_range::{DateRangeResolver, ResolvedRange};
pub use formatter::{escape_markdown, ReportFormatter};
