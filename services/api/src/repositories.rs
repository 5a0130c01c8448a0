//! Record stores for the API service
//!
//! Each store is a trait with a PostgreSQL implementation and an in-memory
//! one. Updates write only the columns they change. A status write lands
//! only while the row is still pending, so a closed record stays closed no
//! matter how writers interleave.

pub mod collection;
pub mod payment;
pub mod report;
pub mod schedule;

pub use collection::{CollectionRepository, CollectionStore, MemoryCollectionRepository};
pub use payment::{MemoryPaymentRepository, PaymentRepository, PaymentStore};
pub use report::{MemoryReportRepository, ReportRepository, ReportStore};
pub use schedule::{MemoryScheduleRepository, ScheduleRepository, ScheduleStore};
