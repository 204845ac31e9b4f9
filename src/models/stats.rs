use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::PrayerType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStats {
    pub date: NaiveDate,
    pub prayers_done: u32,
    pub prayers_total: u32,
}

impl DailyStats {
    pub fn completion_ratio(&self) -> f64 {
        if self.prayers_total == 0 {
            0.0
        } else {
            self.prayers_done as f64 / self.prayers_total as f64
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streak {
    pub current: u32,
    pub longest: u32,
    /// Most recent fully completed day.
    pub last_completed: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrayerBreakdown {
    pub total: u32,
    pub completed: u32,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub completion_rate: f64,
    pub fine: i64,
}

/// Fine owed on one date after payments covering it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayFine {
    pub date: NaiveDate,
    pub total_fine: i64,
    pub paid: i64,
    pub remaining: i64,
    pub missed: Vec<PrayerType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub total_prayers: u32,
    pub completed_prayers: u32,
    pub missed_prayers: u32,
    pub completion_rate: f64,
    pub total_fine: i64,
    pub streak: Streak,
    pub per_prayer: BTreeMap<PrayerType, PrayerBreakdown>,
    pub best_day_of_week: Option<String>,
    pub most_missed_prayer: Option<PrayerType>,
    /// Completed prayers per hour of their scheduled start, index 0..=23.
    pub time_distribution: [u32; 24],
}

/// Percentage of `part` in `whole`, 0 for an empty whole.
pub fn rate(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
