//! Data models for the API service

pub mod collection;
pub mod payment;
pub mod report;
pub mod schedule;

pub use collection::{CollectionRecord, CollectionStatus, CollectionView, WasteCategory};
pub use payment::{Payment, PaymentMethod, PaymentStatus, PaymentView};
pub use report::{Report, ReportRow, ReportType, ReportView};
pub use schedule::{Schedule, ScheduleView};
