//! Report generation: period parsing, aggregation, rendering and archival

pub mod archive;
pub mod criteria;
pub mod pdf;

pub use archive::{FsReportArchive, MemoryReportArchive, ReportArchive, report_key};
pub use criteria::{ReportPeriod, aggregate};
pub use pdf::{ReportDocument, render};
