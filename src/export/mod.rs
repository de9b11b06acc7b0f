//! Issue exporters.
//!
//! - [`csv`]: one row per issue with selected fields and derived metrics,
//!   driven by an [`ExportProfile`](crate::config::ExportProfile)
//! - [`json`]: one `<KEY>.json` and `<KEY>.md` pair per issue

pub mod csv;
pub mod json;

pub use self::csv::{CsvExport, export_csv};
pub use self::json::{JsonExportSummary, export_json};

/// Page size used to resolve keys before downloading.
pub(crate) const KEY_PAGE_SIZE: u64 = 100;
