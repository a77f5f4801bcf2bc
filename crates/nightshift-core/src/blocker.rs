//! Blocker orchestration: the save protocol, snooze lifecycle, and the
//! schedule poller.
//!
//! The native module's apply semantics are additive and sticky rather
//! than idempotent-replace, so replacing a schedule always tears down
//! (remove all shields, stop monitoring) before rebuilding. Bridge
//! failures never block a user-initiated save -- they are logged and
//! absorbed -- while storage and validation failures propagate.

use chrono::{DateTime, Duration as ChronoDuration, Local, TimeZone, Utc};
use log::{info, warn};
use serde::Serialize;

use crate::bridge::{ApplyRequest, ShieldBridge};
use crate::clock::Clock;
use crate::error::{CoreError, ValidationError};
use crate::events::Event;
use crate::schedule::{detect_overlaps, BlockSchedule, OverlapWarning, ScheduleStore};
use crate::snooze::{SnoozeState, SnoozeStore};
use crate::storage::Database;
use crate::window::{wall_clock, TimeOfDay};

/// Resolve a time-of-day onto the next instant it occurs after `now`.
///
/// The result is strictly in the future and at most 24 hours ahead: a
/// schedule edited at 23:00 with a 22:00 end still gets a sensible end
/// tomorrow evening.
pub fn resolve_end_instant(now: DateTime<Local>, end: TimeOfDay) -> DateTime<Local> {
    let naive = now.date_naive().and_time(end.to_naive_time());
    let candidate = match now.timezone().from_local_datetime(&naive).earliest() {
        Some(t) => t,
        // DST gap swallowed the wall-clock time; fall through a day.
        None => now + ChronoDuration::days(1),
    };
    if candidate <= now {
        candidate + ChronoDuration::days(1)
    } else {
        candidate
    }
}

/// What a save did, including any overlap warnings worth surfacing.
#[derive(Debug, Clone, Serialize)]
pub struct SaveOutcome {
    pub schedule: BlockSchedule,
    pub replaced: bool,
    pub applied_until: DateTime<Utc>,
    pub overlaps: Vec<OverlapWarning>,
}

/// A snooze countdown as re-read from the store.
#[derive(Debug, Clone, Serialize)]
pub struct SnoozeStatus {
    pub state: SnoozeState,
    pub remaining_secs: i64,
}

/// Owns the schedule/snooze stores and the shield bridge.
pub struct BlockerService<'a> {
    db: &'a Database,
    bridge: &'a dyn ShieldBridge,
    clock: &'a dyn Clock,
}

impl<'a> BlockerService<'a> {
    pub fn new(db: &'a Database, bridge: &'a dyn ShieldBridge, clock: &'a dyn Clock) -> Self {
        Self { db, bridge, clock }
    }

    fn store(&self) -> ScheduleStore<'a> {
        ScheduleStore::new(self.db)
    }

    fn snoozes(&self) -> SnoozeStore<'a> {
        SnoozeStore::new(self.db)
    }

    fn journal(&self, event: Event) {
        if let Err(e) = self.db.append_event(&event) {
            warn!("failed to journal event: {e}");
        }
    }

    /// Issue one apply call for a schedule's re-anchored window.
    /// Returns the resolved end instant; bridge failure is absorbed.
    async fn apply(&self, schedule: &BlockSchedule) -> DateTime<Utc> {
        let now = self.clock.now();
        let ends_at = resolve_end_instant(now, schedule.end_time).with_timezone(&Utc);
        let request = ApplyRequest::for_schedule(schedule, now.with_timezone(&Utc), ends_at);
        match self.bridge.apply_schedule(&request).await {
            Ok(()) => self.journal(Event::ShieldsApplied {
                schedule_id: schedule.id.clone(),
                ends_at,
                at: Utc::now(),
            }),
            Err(e) => warn!("apply failed for schedule {}: {e}", schedule.id),
        }
        ends_at
    }

    /// Save a new or edited schedule.
    ///
    /// Replacing an existing id first tears down every shield and stops
    /// monitoring for that id, then persists (replace-by-id, never
    /// duplicate) and issues one apply call with the window re-anchored
    /// onto "now".
    pub async fn save_schedule(&self, mut schedule: BlockSchedule) -> Result<SaveOutcome, CoreError> {
        let store = self.store();
        let exists = store.find(&schedule.id)?.is_some();

        if exists {
            if let Err(e) = self.bridge.remove_all_shields().await {
                warn!("teardown: remove_all_shields failed: {e}");
            }
            if let Err(e) = self.bridge.stop_monitoring(&schedule.id, 0).await {
                warn!("teardown: stop_monitoring failed for {}: {e}", schedule.id);
            }
        }

        schedule.is_active = true;
        schedule.updated_at = Utc::now();
        let replaced = store.upsert(schedule.clone())?;

        let applied_until = self.apply(&schedule).await;

        self.journal(Event::ScheduleSaved {
            schedule_id: schedule.id.clone(),
            name: schedule.name.clone(),
            replaced,
            at: Utc::now(),
        });

        let overlaps = detect_overlaps(&store.list()?)
            .into_iter()
            .filter(|w| w.first_id == schedule.id || w.second_id == schedule.id)
            .collect();

        Ok(SaveOutcome {
            schedule,
            replaced,
            applied_until,
            overlaps,
        })
    }

    /// Hard-delete a schedule: exactly one record removed, shields
    /// dropped, monitoring stopped.
    pub async fn delete_schedule(&self, id: &str) -> Result<BlockSchedule, CoreError> {
        let removed = self.store().remove(id)?;
        if let Err(e) = self.bridge.remove_all_shields().await {
            warn!("delete: remove_all_shields failed: {e}");
        }
        if let Err(e) = self.bridge.stop_monitoring(id, 0).await {
            warn!("delete: stop_monitoring failed for {id}: {e}");
        }
        self.journal(Event::ScheduleDeleted {
            schedule_id: id.to_string(),
            at: Utc::now(),
        });
        self.journal(Event::ShieldsRemoved { at: Utc::now() });
        Ok(removed)
    }

    /// "Take a break for today": deactivate until explicitly resumed.
    /// Materially different from a snooze -- there is no timer.
    pub async fn pause_schedule(&self, id: &str) -> Result<BlockSchedule, CoreError> {
        let schedule = self.store().set_active(id, false)?;
        if let Err(e) = self.bridge.remove_all_shields().await {
            warn!("pause: remove_all_shields failed: {e}");
        }
        self.journal(Event::SchedulePaused {
            schedule_id: id.to_string(),
            at: Utc::now(),
        });
        self.journal(Event::ShieldsRemoved { at: Utc::now() });
        Ok(schedule)
    }

    /// Re-activate a paused schedule and re-arm its shield.
    pub async fn resume_schedule(&self, id: &str) -> Result<BlockSchedule, CoreError> {
        let schedule = self.store().set_active(id, true)?;
        self.apply(&schedule).await;
        self.journal(Event::ScheduleResumed {
            schedule_id: id.to_string(),
            at: Utc::now(),
        });
        Ok(schedule)
    }

    /// Start a time-boxed snooze for one schedule.
    pub async fn snooze(&self, id: &str, minutes: u32) -> Result<SnoozeState, CoreError> {
        if minutes == 0 {
            return Err(ValidationError::InvalidValue {
                field: "minutes".into(),
                message: "snooze must be at least one minute".into(),
            }
            .into());
        }
        let schedule = self
            .store()
            .find(id)?
            .ok_or_else(|| ValidationError::UnknownSchedule(id.to_string()))?;

        let now = self.clock.now().with_timezone(&Utc);
        let state = SnoozeState {
            schedule_id: schedule.id.clone(),
            started_at: now,
            until: now + ChronoDuration::minutes(i64::from(minutes)),
            ended_manually: false,
        };
        self.snoozes().set(&state)?;

        if let Err(e) = self.bridge.stop_monitoring(id, minutes).await {
            warn!("snooze: stop_monitoring failed for {id}: {e}");
        }
        self.journal(Event::SnoozeStarted {
            schedule_id: state.schedule_id.clone(),
            until: state.until,
            at: Utc::now(),
        });
        Ok(state)
    }

    /// End the current snooze early, re-arming the schedule.
    pub async fn end_snooze(&self) -> Result<Option<SnoozeState>, CoreError> {
        let Some(mut state) = self.snoozes().get()? else {
            return Ok(None);
        };
        state.ended_manually = true;
        self.snoozes().clear()?;
        self.rearm(&state.schedule_id).await;
        self.journal(Event::SnoozeEnded {
            schedule_id: state.schedule_id.clone(),
            manual: true,
            at: Utc::now(),
        });
        Ok(Some(state))
    }

    /// Clear an expired snooze and re-arm. Called on app-foreground and
    /// from the poller; a no-op while the countdown is still running.
    pub async fn tick_snooze(&self) -> Result<Option<SnoozeState>, CoreError> {
        let Some(state) = self.snoozes().get()? else {
            return Ok(None);
        };
        let now = self.clock.now().with_timezone(&Utc);
        if state.is_live(now) {
            return Ok(None);
        }
        self.snoozes().clear()?;
        self.rearm(&state.schedule_id).await;
        self.journal(Event::SnoozeEnded {
            schedule_id: state.schedule_id.clone(),
            manual: false,
            at: Utc::now(),
        });
        Ok(Some(state))
    }

    async fn rearm(&self, schedule_id: &str) {
        match self.store().find(schedule_id) {
            Ok(Some(schedule)) if schedule.is_active => {
                self.apply(&schedule).await;
            }
            Ok(_) => {}
            Err(e) => warn!("re-arm: failed to look up schedule {schedule_id}: {e}"),
        }
    }

    /// Current snooze countdown, re-read from the store on every call so
    /// a backgrounded or restarted process sees the same end time.
    pub fn snooze_status(&self) -> Result<Option<SnoozeStatus>, CoreError> {
        let Some(state) = self.snoozes().get()? else {
            return Ok(None);
        };
        let now = self.clock.now().with_timezone(&Utc);
        let remaining_secs = state.remaining(now).num_seconds();
        Ok(Some(SnoozeStatus {
            state,
            remaining_secs,
        }))
    }

    /// Re-evaluate every schedule and arm the ones whose window contains
    /// "now". Background semantics: every failure is absorbed and
    /// logged; the returned list holds the ids actually applied.
    pub async fn poll(&self) -> Vec<String> {
        if let Err(e) = self.tick_snooze().await {
            warn!("poll: snooze tick failed: {e}");
        }

        let schedules = match self.store().list() {
            Ok(schedules) => schedules,
            Err(e) => {
                warn!("poll: failed to load schedules: {e}");
                return Vec::new();
            }
        };
        let snooze = match self.snoozes().get() {
            Ok(snooze) => snooze,
            Err(e) => {
                warn!("poll: failed to read snooze state: {e}");
                None
            }
        };

        let now_local = self.clock.now();
        let now = now_local.with_timezone(&Utc);
        let (day, time) = wall_clock(&now_local);

        let mut applied = Vec::new();
        for schedule in schedules {
            if !schedule.is_current(day, time) {
                continue;
            }
            if let Some(s) = &snooze {
                if s.schedule_id == schedule.id && s.is_live(now) {
                    info!("poll: schedule {} snoozed, skipping", schedule.id);
                    continue;
                }
            }
            let ends_at = resolve_end_instant(now_local, schedule.end_time).with_timezone(&Utc);
            let request = ApplyRequest::for_schedule(&schedule, now, ends_at);
            match self.bridge.apply_schedule(&request).await {
                Ok(()) => {
                    self.journal(Event::ShieldsApplied {
                        schedule_id: schedule.id.clone(),
                        ends_at,
                        at: Utc::now(),
                    });
                    applied.push(schedule.id.clone());
                }
                Err(e) => warn!("poll: apply failed for {}: {e}", schedule.id),
            }
        }
        applied
    }
}
