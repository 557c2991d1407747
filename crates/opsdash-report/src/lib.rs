//! Sales reporting over the synced Sage tables.
//!
//! [`sales::sales_report_rows`] lists invoice lines for a date range,
//! [`summary::summarize`] totals them by item and by year, and
//! [`export::write_sales_csv`] exports the listing.

pub mod error;
pub mod export;
pub mod format;
pub mod sales;
pub mod summary;

pub use error::ReportError;
pub use export::write_sales_csv;
pub use format::format_with_commas;
pub use sales::{SalesReportRow, sales_report_rows};
pub use summary::{ItemSummary, SalesSummary, YearSummary, summarize};
