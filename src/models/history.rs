use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::models::prayer::{DailyRecord, Prayer, PrayerType, PrayerWindow};

/// All recorded days keyed by date. Iteration is ascending by date.
pub type History = BTreeMap<NaiveDate, DailyRecord>;

/// Inclusive calendar-day window. `start > end` is allowed and matches
/// nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn single(date: NaiveDate) -> Self {
        Self { start: date, end: date }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Every date in the range, ascending. Empty when inverted.
    pub fn days(&self) -> Vec<NaiveDate> {
        self.start
            .iter_days()
            .take_while(|d| *d <= self.end)
            .collect()
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start.format("%Y-%m-%d"))
        } else {
            write!(
                f,
                "{} → {}",
                self.start.format("%Y-%m-%d"),
                self.end.format("%Y-%m-%d")
            )
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePreset {
    Today,
    ThisWeek,
    ThisMonth,
    Custom(DateRange),
}

impl RangePreset {
    pub fn resolve(&self, today: NaiveDate, week_start: WeekStart) -> DateRange {
        match self {
            RangePreset::Today => DateRange::single(today),
            RangePreset::ThisWeek => {
                let back = (7 + today.weekday().num_days_from_monday()
                    - week_start.weekday().num_days_from_monday())
                    % 7;
                let start = today - Duration::days(back as i64);
                DateRange::new(start, start + Duration::days(6))
            }
            RangePreset::ThisMonth => {
                let start = today.with_day(1).unwrap_or(today);
                let next_month = if today.month() == 12 {
                    NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)
                } else {
                    NaiveDate::from_ymd_opt(today.year(), today.month() + 1, 1)
                };
                let end = next_month.and_then(|d| d.pred_opt()).unwrap_or(today);
                DateRange::new(start, end)
            }
            RangePreset::Custom(range) => *range,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl WeekStart {
    pub fn weekday(&self) -> Weekday {
        match self {
            WeekStart::Sunday => Weekday::Sun,
            WeekStart::Monday => Weekday::Mon,
        }
    }
}

impl FromStr for WeekStart {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sunday" | "sun" => Ok(WeekStart::Sunday),
            "monday" | "mon" => Ok(WeekStart::Monday),
            _ => Err(anyhow::anyhow!("Unknown week start: {}", s)),
        }
    }
}

/// Fines and windows used to create a day the first time it is touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayTemplate {
    pub fines: BTreeMap<PrayerType, i64>,
    pub windows: BTreeMap<PrayerType, PrayerWindow>,
}

impl DayTemplate {
    pub fn record_for(&self, date: NaiveDate) -> DailyRecord {
        let prayers = PrayerType::all()
            .into_iter()
            .map(|pt| {
                let window = self
                    .windows
                    .get(&pt)
                    .copied()
                    .unwrap_or_else(|| pt.default_window());
                let fine = self
                    .fines
                    .get(&pt)
                    .copied()
                    .unwrap_or(crate::models::prayer::DEFAULT_FINE);
                Prayer::new(pt, window, fine)
            })
            .collect();
        DailyRecord::from_prayers(date, prayers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn week_preset_honours_week_start() {
        // 2024-01-10 is a Wednesday
        let today = date("2024-01-10");
        let sunday = RangePreset::ThisWeek.resolve(today, WeekStart::Sunday);
        assert_eq!(sunday, DateRange::new(date("2024-01-07"), date("2024-01-13")));
        let monday = RangePreset::ThisWeek.resolve(today, WeekStart::Monday);
        assert_eq!(monday, DateRange::new(date("2024-01-08"), date("2024-01-14")));
    }

    #[test]
    fn week_preset_on_the_start_day_begins_today() {
        let sunday = date("2024-01-07");
        let range = RangePreset::ThisWeek.resolve(sunday, WeekStart::Sunday);
        assert_eq!(range.start, sunday);
    }

    #[test]
    fn month_preset_covers_whole_month() {
        let range = RangePreset::ThisMonth.resolve(date("2024-02-14"), WeekStart::Sunday);
        assert_eq!(range, DateRange::new(date("2024-02-01"), date("2024-02-29")));
        let range = RangePreset::ThisMonth.resolve(date("2023-12-31"), WeekStart::Sunday);
        assert_eq!(range, DateRange::new(date("2023-12-01"), date("2023-12-31")));
    }

    #[test]
    fn today_and_custom_presets() {
        let today = date("2024-05-05");
        assert_eq!(
            RangePreset::Today.resolve(today, WeekStart::Monday),
            DateRange::single(today)
        );
        let custom = DateRange::new(date("2024-01-01"), date("2024-01-31"));
        assert_eq!(RangePreset::Custom(custom).resolve(today, WeekStart::Monday), custom);
    }

    #[test]
    fn inverted_range_matches_nothing() {
        let inverted = DateRange::new(date("2024-01-05"), date("2024-01-01"));
        assert!(!inverted.contains(date("2024-01-03")));
        assert!(inverted.days().is_empty());
    }

    #[test]
    fn range_is_inclusive() {
        let a = DateRange::new(date("2024-01-01"), date("2024-01-05"));
        assert!(a.contains(date("2024-01-05")));
        assert!(!a.contains(date("2024-01-06")));
        assert_eq!(a.days().len(), 5);
    }

    #[test]
    fn template_fills_missing_entries_with_defaults() {
        let mut template = DayTemplate::default();
        template.fines.insert(PrayerType::Isha, 20);
        let day = template.record_for(date("2024-01-01"));
        assert_eq!(day.prayers().len(), 5);
        assert_eq!(day.total_fine(), 60);
        assert_eq!(
            day.prayer(PrayerType::Fajr).unwrap().window,
            PrayerType::Fajr.default_window()
        );
    }
}
