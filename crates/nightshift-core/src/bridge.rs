//! Shield bridge abstraction.
//!
//! The OS-level content restriction ("shield") lives in a native module
//! outside this crate. The core talks to it through this trait with
//! fire-and-forget semantics plus a resolved/rejected result; the
//! native module's apply semantics are additive and sticky, which is why
//! the save protocol tears down before rebuilding (see `blocker`).

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::BridgeError;
use crate::schedule::BlockSchedule;

/// One "apply schedule" command: the resolved window instants plus the
/// opaque identifier lists populated by the native picker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyRequest {
    pub schedule_id: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub blocked_apps: Vec<String>,
    pub blocked_categories: Vec<String>,
    pub blocked_web_domains: Vec<String>,
}

impl ApplyRequest {
    pub fn for_schedule(
        schedule: &BlockSchedule,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> Self {
        Self {
            schedule_id: schedule.id.clone(),
            starts_at,
            ends_at,
            blocked_apps: schedule.blocked_apps.clone(),
            blocked_categories: schedule.blocked_categories.clone(),
            blocked_web_domains: schedule.blocked_web_domains.clone(),
        }
    }
}

/// Commands the native shield module accepts.
///
/// All calls are asynchronous and awaited sequentially by callers; the
/// native side's internal atomicity is its own concern.
#[async_trait]
pub trait ShieldBridge: Send + Sync {
    /// Arm the shield for one schedule's resolved window.
    async fn apply_schedule(&self, request: &ApplyRequest) -> Result<(), BridgeError>;

    /// Drop every active shield, regardless of which schedule armed it.
    async fn remove_all_shields(&self) -> Result<(), BridgeError>;

    /// Suspend monitoring for one schedule for `minutes` (0 = indefinitely).
    async fn stop_monitoring(&self, schedule_id: &str, minutes: u32) -> Result<(), BridgeError>;

    /// Ask the native side to re-read its schedule set.
    async fn refresh_schedules(&self) -> Result<(), BridgeError>;
}

/// Bridge used where no native module exists (the CLI, tests by
/// default): logs each command and reports success.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBridge;

#[async_trait]
impl ShieldBridge for NullBridge {
    async fn apply_schedule(&self, request: &ApplyRequest) -> Result<(), BridgeError> {
        debug!(
            "bridge: apply schedule {} until {}",
            request.schedule_id, request.ends_at
        );
        Ok(())
    }

    async fn remove_all_shields(&self) -> Result<(), BridgeError> {
        debug!("bridge: remove all shields");
        Ok(())
    }

    async fn stop_monitoring(&self, schedule_id: &str, minutes: u32) -> Result<(), BridgeError> {
        debug!("bridge: stop monitoring {schedule_id} for {minutes} min");
        Ok(())
    }

    async fn refresh_schedules(&self) -> Result<(), BridgeError> {
        debug!("bridge: refresh schedules");
        Ok(())
    }
}

/// A bridge command as observed by [`RecordingBridge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeCall {
    Apply { schedule_id: String },
    RemoveAll,
    StopMonitoring { schedule_id: String, minutes: u32 },
    Refresh,
}

/// Test double that records every command, optionally failing them all.
#[derive(Debug, Default)]
pub struct RecordingBridge {
    calls: Mutex<Vec<BridgeCall>>,
    fail: Mutex<bool>,
}

impl RecordingBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent command fail.
    pub fn fail_commands(&self, fail: bool) {
        *self.fail.lock().expect("bridge mutex poisoned") = fail;
    }

    pub fn calls(&self) -> Vec<BridgeCall> {
        self.calls.lock().expect("bridge mutex poisoned").clone()
    }

    pub fn clear(&self) {
        self.calls.lock().expect("bridge mutex poisoned").clear();
    }

    fn record(&self, call: BridgeCall) -> Result<(), BridgeError> {
        self.calls.lock().expect("bridge mutex poisoned").push(call);
        if *self.fail.lock().expect("bridge mutex poisoned") {
            Err(BridgeError::Unavailable("recording bridge set to fail".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ShieldBridge for RecordingBridge {
    async fn apply_schedule(&self, request: &ApplyRequest) -> Result<(), BridgeError> {
        self.record(BridgeCall::Apply {
            schedule_id: request.schedule_id.clone(),
        })
    }

    async fn remove_all_shields(&self) -> Result<(), BridgeError> {
        self.record(BridgeCall::RemoveAll)
    }

    async fn stop_monitoring(&self, schedule_id: &str, minutes: u32) -> Result<(), BridgeError> {
        self.record(BridgeCall::StopMonitoring {
            schedule_id: schedule_id.to_string(),
            minutes,
        })
    }

    async fn refresh_schedules(&self) -> Result<(), BridgeError> {
        self.record(BridgeCall::Refresh)
    }
}
