//! Sleep statistics.

pub mod adherence;

pub use adherence::{
    AdherenceAnalyzer, AdherenceReport, AdherenceStats, AdherenceStatus, AdherenceThresholds,
    WeekdayAdherence,
};
