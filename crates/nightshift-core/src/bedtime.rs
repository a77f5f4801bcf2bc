//! Background bedtime check.
//!
//! The OS invokes the check on a best-effort cadence of roughly fifteen
//! minutes -- no guarantee of exact timing, no guarantee of execution at
//! all. The check is therefore a cooperative unit of work with injected
//! clock, probe, and notifier, and it never escapes an error: the OS
//! scheduler treats an uncaught failure as a hard failure, so every step
//! degrades to "not bedtime" with a log line instead.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use chrono::Utc;
use log::{debug, warn};

use crate::clock::Clock;
use crate::events::Event;
use crate::notify::{NotificationRequest, Notifier};
use crate::probe::ConnectivityProbe;
use crate::sleep::{SleepSettings, SleepStore};
use crate::storage::{Database, NightRow, NotificationsConfig};
use crate::window::wall_clock;

/// Escalating reminder bodies. The level is capped at the last variant.
pub const REMINDER_MESSAGES: [&str; 4] = [
    "Time to wind down for bed.",
    "Still up? Your sleep window started a while ago.",
    "Screens off -- you are cutting into your sleep.",
    "Way past bedtime. Tomorrow is going to hurt.",
];

/// Message body for an escalation level (0-3, clamped).
pub fn reminder_message(level: u8) -> &'static str {
    REMINDER_MESSAGES[usize::from(level).min(REMINDER_MESSAGES.len() - 1)]
}

/// Dependencies injected into the checker.
pub struct BedtimeDeps<'a> {
    pub clock: &'a dyn Clock,
    pub probe: &'a dyn ConnectivityProbe,
    pub notifier: &'a dyn Notifier,
}

/// The background bedtime check and its in-session reminder loop.
pub struct BedtimeChecker<'a> {
    db: &'a Database,
    deps: BedtimeDeps<'a>,
    notifications: NotificationsConfig,
}

impl<'a> BedtimeChecker<'a> {
    pub fn new(db: &'a Database, deps: BedtimeDeps<'a>, notifications: NotificationsConfig) -> Self {
        Self {
            db,
            deps,
            notifications,
        }
    }

    /// Run one check. Returns whether "now" is inside the sleep window.
    ///
    /// Order matters: the connectivity probe runs first and an offline
    /// device short-circuits to `false` -- there is no benefit to
    /// alerting a disconnected user.
    pub async fn run_once(&self) -> bool {
        if !self.deps.probe.is_reachable().await {
            debug!("bedtime check: offline, skipping");
            return false;
        }

        let settings = match SleepStore::new(self.db).load() {
            Ok(settings) => settings,
            Err(e) => {
                warn!("bedtime check: failed to load sleep settings: {e}");
                return false;
            }
        };
        if !settings.enabled {
            return false;
        }

        let now = self.deps.clock.now();
        let (day, time) = wall_clock(&now);
        if !settings.is_day_enabled(day) {
            return false;
        }
        if !settings.window_for(day).contains(time) {
            return false;
        }

        self.fire(0);
        self.record_alert(&settings);
        true
    }

    /// Keep re-firing reminders at `cadence` while the device stays
    /// connected and "now" stays inside the window, escalating the
    /// message each round. `deadline` bounds the whole loop; the count
    /// of reminders actually fired is returned either way.
    ///
    /// This is an in-process loop: it dies with the process and provides
    /// no delivery guarantee beyond the current invocation.
    pub async fn run_reminder_loop(&self, cadence: Duration, deadline: Duration) -> u32 {
        let fired = AtomicU32::new(0);
        let result = tokio::time::timeout(deadline, self.reminder_rounds(cadence, &fired)).await;
        if result.is_err() {
            debug!("reminder loop: deadline reached");
        }
        fired.load(Ordering::Relaxed)
    }

    async fn reminder_rounds(&self, cadence: Duration, fired: &AtomicU32) {
        let mut level: u8 = 1;
        loop {
            tokio::time::sleep(cadence).await;

            if !self.deps.probe.is_reachable().await {
                debug!("reminder loop: offline, stopping");
                return;
            }
            let settings = match SleepStore::new(self.db).load() {
                Ok(settings) => settings,
                Err(e) => {
                    warn!("reminder loop: failed to load sleep settings: {e}");
                    return;
                }
            };
            let now = self.deps.clock.now();
            let (day, time) = wall_clock(&now);
            if !settings.enabled
                || !settings.is_day_enabled(day)
                || !settings.window_for(day).contains(time)
            {
                debug!("reminder loop: left the sleep window, stopping");
                return;
            }

            self.fire(level);
            fired.fetch_add(1, Ordering::Relaxed);
            level = level.saturating_add(1).min((REMINDER_MESSAGES.len() - 1) as u8);
        }
    }

    /// Send one notification and journal it. Failures are logged.
    fn fire(&self, level: u8) {
        if self.notifications.enabled {
            let request = NotificationRequest::immediate("Bedtime", reminder_message(level))
                .with_sound(self.notifications.sound.clone());
            if let Err(e) = self.deps.notifier.notify(&request) {
                warn!("bedtime check: notification failed: {e}");
            }
        }
        let event = if level == 0 {
            Event::BedtimeDetected { at: Utc::now() }
        } else {
            Event::ReminderFired {
                level,
                at: Utc::now(),
            }
        };
        if let Err(e) = self.db.append_event(&event) {
            warn!("bedtime check: failed to journal event: {e}");
        }
    }

    /// Record tonight's alert for the adherence report. An overnight
    /// window past midnight belongs to the previous calendar day.
    fn record_alert(&self, settings: &SleepSettings) {
        let now = self.deps.clock.now();
        let (day, time) = wall_clock(&now);
        let window = settings.window_for(day);
        let date = if window.crosses_midnight() && time <= window.end {
            now.date_naive().pred_opt().unwrap_or_else(|| now.date_naive())
        } else {
            now.date_naive()
        };
        let night = NightRow {
            date,
            alerted_at: Some(now.with_timezone(&Utc)),
            quiet_at: None,
        };
        if let Err(e) = self.db.upsert_night(&night) {
            warn!("bedtime check: failed to record night {}: {e}", night.date);
        }
    }
}
