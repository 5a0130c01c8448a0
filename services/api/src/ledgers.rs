//! Ancillary ledgers: payments, recycling credits and reports
//!
//! Each ledger checks the actor's role first and applies ownership rules
//! to non-admin reads.

pub mod payments;
pub mod recycling;
pub mod reports;

pub use payments::PaymentLedger;
pub use recycling::{CreditBalance, RecyclingLedger};
pub use reports::{ReportFile, ReportLedger};
