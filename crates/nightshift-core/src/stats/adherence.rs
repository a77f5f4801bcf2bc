//! Bedtime adherence tracking and analytics.
//!
//! Classifies each recorded night by how the user responded to the
//! bedtime alert:
//! - **OnTime**: device went quiet within the grace threshold
//! - **Late**: quiet after grace but within the late threshold
//! - **Missed**: never went quiet, or past the late threshold

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::storage::NightRow;
use crate::window::{day_name, ALL_WEEKDAYS};

/// How a night went, relative to the bedtime alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdherenceStatus {
    OnTime,
    Late,
    Missed,
}

/// Thresholds for classifying a night.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AdherenceThresholds {
    /// Minutes after the alert within which going quiet counts as on time.
    pub grace_min: i64,
    /// Minutes after the alert beyond which the night counts as missed.
    pub late_min: i64,
}

impl Default for AdherenceThresholds {
    fn default() -> Self {
        Self {
            grace_min: 30,
            late_min: 90,
        }
    }
}

/// Aggregate adherence statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdherenceStats {
    pub total_nights: u32,
    pub on_time: u32,
    pub late: u32,
    pub missed: u32,
    /// Ratio of on-time nights (0.0 to 1.0).
    pub adherence_rate: f64,
    /// Average delay in minutes across late nights.
    pub avg_delay_min: f64,
}

/// Adherence breakdown for one weekday.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekdayAdherence {
    /// Day name, Monday-first ordering.
    pub day: String,
    pub total: u32,
    pub on_time: u32,
    pub late: u32,
    pub missed: u32,
    /// Ratio of missed nights (0.0 to 1.0).
    pub miss_rate: f64,
}

/// Complete adherence report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdherenceReport {
    pub stats: AdherenceStats,
    /// One entry per weekday with at least one recorded night.
    pub by_weekday: Vec<WeekdayAdherence>,
    /// Weekdays where more than half the nights were missed.
    pub worst_weekdays: Vec<String>,
}

/// Analyzer for bedtime adherence patterns.
#[derive(Debug, Clone, Default)]
pub struct AdherenceAnalyzer {
    thresholds: AdherenceThresholds,
}

impl AdherenceAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(thresholds: AdherenceThresholds) -> Self {
        Self { thresholds }
    }

    /// Classify one night. Returns `None` when nothing was recorded for
    /// it (no alert and no quiet timestamp).
    pub fn classify(&self, night: &NightRow) -> Option<AdherenceStatus> {
        match (night.alerted_at, night.quiet_at) {
            (None, None) => None,
            // Went quiet without ever needing an alert.
            (None, Some(_)) => Some(AdherenceStatus::OnTime),
            (Some(_), None) => Some(AdherenceStatus::Missed),
            (Some(alerted), Some(quiet)) => {
                let delay_min = (quiet - alerted).num_minutes();
                if delay_min <= self.thresholds.grace_min {
                    Some(AdherenceStatus::OnTime)
                } else if delay_min <= self.thresholds.late_min {
                    Some(AdherenceStatus::Late)
                } else {
                    Some(AdherenceStatus::Missed)
                }
            }
        }
    }

    /// Build the full report from recorded nights.
    pub fn analyze(&self, nights: &[NightRow]) -> AdherenceReport {
        let mut stats = AdherenceStats::default();
        let mut delay_sum: i64 = 0;
        // Monday-first counters: (total, on_time, late, missed).
        let mut per_day = [(0u32, 0u32, 0u32, 0u32); 7];

        for night in nights {
            let Some(status) = self.classify(night) else {
                continue;
            };
            stats.total_nights += 1;
            let slot = &mut per_day[night.date.weekday().num_days_from_monday() as usize];
            slot.0 += 1;
            match status {
                AdherenceStatus::OnTime => {
                    stats.on_time += 1;
                    slot.1 += 1;
                }
                AdherenceStatus::Late => {
                    stats.late += 1;
                    slot.2 += 1;
                    if let (Some(alerted), Some(quiet)) = (night.alerted_at, night.quiet_at) {
                        delay_sum += (quiet - alerted).num_minutes();
                    }
                }
                AdherenceStatus::Missed => {
                    stats.missed += 1;
                    slot.3 += 1;
                }
            }
        }

        if stats.total_nights > 0 {
            stats.adherence_rate = f64::from(stats.on_time) / f64::from(stats.total_nights);
        }
        if stats.late > 0 {
            stats.avg_delay_min = delay_sum as f64 / f64::from(stats.late);
        }

        let mut by_weekday = Vec::new();
        let mut worst_weekdays = Vec::new();
        for (i, day) in ALL_WEEKDAYS.iter().enumerate() {
            let (total, on_time, late, missed) = per_day[i];
            if total == 0 {
                continue;
            }
            let miss_rate = f64::from(missed) / f64::from(total);
            if miss_rate > 0.5 {
                worst_weekdays.push(day_name(*day).to_string());
            }
            by_weekday.push(WeekdayAdherence {
                day: day_name(*day).to_string(),
                total,
                on_time,
                late,
                missed,
                miss_rate,
            });
        }

        AdherenceReport {
            stats,
            by_weekday,
            worst_weekdays,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn night(date: (i32, u32, u32), alert_hm: Option<(u32, u32)>, quiet_hm: Option<(u32, u32)>) -> NightRow {
        let date = NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap();
        let at = |(h, m): (u32, u32)| {
            Utc.from_utc_datetime(&date.and_hms_opt(h, m, 0).unwrap())
        };
        NightRow {
            date,
            alerted_at: alert_hm.map(at),
            quiet_at: quiet_hm.map(at),
        }
    }

    #[test]
    fn classification_thresholds() {
        let analyzer = AdherenceAnalyzer::new();

        // Quiet 20 minutes after the alert: on time.
        let on_time = night((2025, 6, 2), Some((22, 0)), Some((22, 20)));
        assert_eq!(analyzer.classify(&on_time), Some(AdherenceStatus::OnTime));

        // 60 minutes: late.
        let late = night((2025, 6, 3), Some((22, 0)), Some((23, 0)));
        assert_eq!(analyzer.classify(&late), Some(AdherenceStatus::Late));

        // Two hours: missed.
        let very_late = night((2025, 6, 4), Some((22, 0)), Some((23, 59)));
        assert_eq!(analyzer.classify(&very_late), Some(AdherenceStatus::Missed));

        // Never went quiet: missed.
        let never = night((2025, 6, 5), Some((22, 0)), None);
        assert_eq!(analyzer.classify(&never), Some(AdherenceStatus::Missed));

        // Quiet without an alert: on time.
        let early = night((2025, 6, 6), None, Some((21, 30)));
        assert_eq!(analyzer.classify(&early), Some(AdherenceStatus::OnTime));

        // Nothing recorded.
        let empty = night((2025, 6, 7), None, None);
        assert_eq!(analyzer.classify(&empty), None);
    }

    #[test]
    fn report_rates_and_weekday_breakdown() {
        let analyzer = AdherenceAnalyzer::new();
        let nights = vec![
            // Monday on time, Tuesday late by 45 min, Wednesday missed.
            night((2025, 6, 2), Some((22, 0)), Some((22, 10))),
            night((2025, 6, 3), Some((22, 0)), Some((22, 45))),
            night((2025, 6, 4), Some((22, 0)), None),
        ];

        let report = analyzer.analyze(&nights);
        assert_eq!(report.stats.total_nights, 3);
        assert_eq!(report.stats.on_time, 1);
        assert_eq!(report.stats.late, 1);
        assert_eq!(report.stats.missed, 1);
        assert!((report.stats.adherence_rate - 1.0 / 3.0).abs() < 1e-9);
        assert!((report.stats.avg_delay_min - 45.0).abs() < 1e-9);

        assert_eq!(report.by_weekday.len(), 3);
        assert_eq!(report.by_weekday[0].day, "monday");
        assert_eq!(report.worst_weekdays, vec!["wednesday"]);
    }

    #[test]
    fn empty_input_yields_empty_report() {
        let report = AdherenceAnalyzer::new().analyze(&[]);
        assert_eq!(report.stats.total_nights, 0);
        assert!(report.by_weekday.is_empty());
        assert!(report.worst_weekdays.is_empty());
    }
}
