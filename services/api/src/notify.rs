//! Outbound notifications
//!
//! Delivery is fire-and-forget: a notifier never fails the operation that
//! triggered it.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracing::info;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, subject: &str, body: &str);
}

/// Emits each notification as a tracing event
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, subject: &str, body: &str) {
        info!(target: "wastewise::notifications", subject, body, "Notification sent");
    }
}

/// Keeps every notification in memory for inspection
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subjects and bodies sent so far, oldest first
    pub fn sent(&self) -> Vec<(String, String)> {
        match self.sent.lock() {
            Ok(sent) => sent.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, subject: &str, body: &str) {
        let mut sent = match self.sent.lock() {
            Ok(sent) => sent,
            Err(poisoned) => poisoned.into_inner(),
        };
        sent.push((subject.to_string(), body.to_string()));
    }
}
