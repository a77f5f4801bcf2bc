//! # Nightshift Core Library
//!
//! This library provides the core business logic for Nightshift's
//! sleep-window engine. It implements a CLI-first philosophy where all
//! operations are available via a standalone CLI binary, with any app
//! shell being a thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Window evaluator**: one pure implementation of "is now inside
//!   the configured window", handling midnight wraparound
//! - **Blocker service**: schedule persistence plus the tear-down /
//!   re-anchor / apply protocol against the native shield bridge
//! - **Bedtime checker**: the best-effort background check with
//!   injected clock, connectivity probe, and notifier
//! - **Storage**: SQLite key-value store, event journal, and TOML-based
//!   configuration
//!
//! ## Key Components
//!
//! - [`TimeWindow`]: the window evaluator
//! - [`BlockerService`]: save/snooze/poll orchestration
//! - [`BedtimeChecker`]: the background bedtime check
//! - [`ShieldBridge`]: seam to the native restriction module
//! - [`Database`]: persistence and the event journal

pub mod bedtime;
pub mod blocker;
pub mod bridge;
pub mod clock;
pub mod error;
pub mod events;
pub mod notify;
pub mod probe;
pub mod schedule;
pub mod sleep;
pub mod snooze;
pub mod stats;
pub mod storage;
pub mod streak;
pub mod window;

pub use bedtime::{BedtimeChecker, BedtimeDeps};
pub use blocker::{resolve_end_instant, BlockerService, SaveOutcome, SnoozeStatus};
pub use bridge::{ApplyRequest, NullBridge, RecordingBridge, ShieldBridge};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{BridgeError, ConfigError, CoreError, StorageError, ValidationError};
pub use events::Event;
pub use notify::{LogNotifier, NotificationRequest, Notifier};
pub use probe::{ConnectivityProbe, HttpProbe, StaticProbe};
pub use schedule::{detect_overlaps, BlockSchedule, OverlapWarning, ScheduleStore};
pub use sleep::{SleepSettings, SleepStore};
pub use snooze::{SnoozeState, SnoozeStore};
pub use stats::{AdherenceAnalyzer, AdherenceReport, AdherenceStatus};
pub use storage::{Config, Database};
pub use streak::{StreakCalculator, StreakState, StreakStore};
pub use window::{DaySet, TimeOfDay, TimeWindow};
