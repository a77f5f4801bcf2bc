//! Local notification seam.
//!
//! Delivery is the platform's job; the core only builds requests and
//! hands them to a [`Notifier`]. A request either fires immediately
//! (`trigger: None`) or carries a cron-like calendar trigger.

use std::sync::Mutex;

use chrono::Weekday;
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Cron-like calendar trigger, mirroring the platform's shape.
///
/// `weekday` uses the platform's native numbering, 1 = Sunday through
/// 7 = Saturday. Convert through [`platform_weekday`] -- nothing else
/// in this crate speaks that convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CronTrigger {
    pub hour: u32,
    pub minute: u32,
    pub weekday: Option<u8>,
    pub repeats: bool,
}

/// Map a `Weekday` onto the platform trigger numbering (1 = Sunday).
pub fn platform_weekday(day: Weekday) -> u8 {
    day.num_days_from_sunday() as u8 + 1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub title: String,
    pub body: String,
    pub sound: Option<String>,
    /// `None` fires immediately.
    pub trigger: Option<CronTrigger>,
}

impl NotificationRequest {
    pub fn immediate(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            sound: None,
            trigger: None,
        }
    }

    pub fn with_sound(mut self, sound: Option<String>) -> Self {
        self.sound = sound;
        self
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, request: &NotificationRequest) -> Result<(), CoreError>;
}

/// Notifier for headless contexts: writes to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, request: &NotificationRequest) -> Result<(), CoreError> {
        info!("notification: {} -- {}", request.title, request.body);
        Ok(())
    }
}

/// Test double that keeps every request it was handed.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<NotificationRequest>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<NotificationRequest> {
        self.sent.lock().expect("notifier mutex poisoned").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, request: &NotificationRequest) -> Result<(), CoreError> {
        self.sent
            .lock()
            .expect("notifier mutex poisoned")
            .push(request.clone());
        Ok(())
    }
}
