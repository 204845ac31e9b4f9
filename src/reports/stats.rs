use chrono::{Datelike, Duration, NaiveDate, Timelike, Weekday};
use std::collections::BTreeMap;

use crate::models::stats::rate;
use crate::models::{
    DailyStats, DateRange, History, PrayerBreakdown, PrayerType, Stats, Streak, TrendPoint,
};

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Sun => "Sunday",
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
    }
}

pub fn compute_stats(history: &History) -> Stats {
    let mut total_prayers = 0u32;
    let mut completed_prayers = 0u32;
    let mut total_fine = 0i64;
    let mut per_prayer: BTreeMap<PrayerType, PrayerBreakdown> = BTreeMap::new();
    let mut missed_counts: BTreeMap<PrayerType, u32> = BTreeMap::new();
    let mut full_days_by_weekday = [0u32; 7];
    let mut time_distribution = [0u32; 24];

    for day in history.values() {
        total_fine = total_fine.saturating_add(day.total_fine());
        if day.is_fully_completed() {
            full_days_by_weekday[day.date().weekday().num_days_from_sunday() as usize] += 1;
        }

        for prayer in day.prayers() {
            total_prayers += 1;
            let entry = per_prayer.entry(prayer.name).or_default();
            entry.total += 1;
            if prayer.completed {
                completed_prayers += 1;
                entry.completed += 1;
                time_distribution[prayer.window.start.hour() as usize] += 1;
            } else {
                *missed_counts.entry(prayer.name).or_default() += 1;
            }
        }
    }

    for entry in per_prayer.values_mut() {
        entry.completion_rate = rate(entry.completed, entry.total);
    }

    Stats {
        total_prayers,
        completed_prayers,
        missed_prayers: total_prayers - completed_prayers,
        completion_rate: rate(completed_prayers, total_prayers),
        total_fine,
        streak: streak(history),
        per_prayer,
        best_day_of_week: best_weekday(&full_days_by_weekday).map(str::to_string),
        most_missed_prayer: most_missed(&missed_counts),
        time_distribution,
    }
}

/// Walks recorded days oldest to newest: a fully completed day extends the
/// run, any other day resets it.
pub fn streak(history: &History) -> Streak {
    let mut running = 0u32;
    let mut longest = 0u32;
    let mut last_completed = None;
    for day in history.values() {
        if day.is_fully_completed() {
            running += 1;
            longest = longest.max(running);
            last_completed = Some(day.date());
        } else {
            running = 0;
        }
    }
    Streak {
        current: running,
        longest,
        last_completed,
    }
}

// Ties resolve to the earliest weekday, Sunday first.
fn best_weekday(counts: &[u32; 7]) -> Option<&'static str> {
    let mut best: Option<(usize, u32)> = None;
    for (idx, count) in counts.iter().enumerate() {
        if *count > 0 && best.is_none_or(|(_, c)| *count > c) {
            best = Some((idx, *count));
        }
    }
    best.map(|(idx, _)| weekday_name(WEEKDAYS[idx]))
}

fn most_missed(counts: &BTreeMap<PrayerType, u32>) -> Option<PrayerType> {
    let mut best: Option<(PrayerType, u32)> = None;
    for (name, count) in counts {
        if best.is_none_or(|(_, c)| *count > c) {
            best = Some((*name, *count));
        }
    }
    best.map(|(name, _)| name)
}

/// One entry per date of `week`; dates without a record count as 0 of 5.
pub fn weekly_overview(history: &History, week: &DateRange) -> Vec<DailyStats> {
    week.days()
        .into_iter()
        .map(|date| match history.get(&date) {
            Some(day) => DailyStats {
                date,
                prayers_done: day.total_completed(),
                prayers_total: day.prayers().len() as u32,
            },
            None => DailyStats {
                date,
                prayers_done: 0,
                prayers_total: PrayerType::all().len() as u32,
            },
        })
        .collect()
}

/// Daily completion rate and fine from `end - days` through `end`.
pub fn trend(history: &History, end: NaiveDate, days: u32) -> Vec<TrendPoint> {
    let range = DateRange::new(end - Duration::days(days as i64), end);
    range
        .days()
        .into_iter()
        .map(|date| match history.get(&date) {
            Some(day) => TrendPoint {
                date,
                completion_rate: rate(day.total_completed(), day.prayers().len() as u32),
                fine: day.total_fine(),
            },
            None => TrendPoint {
                date,
                completion_rate: 0.0,
                fine: 0,
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DailyRecord, DayTemplate};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn day_with(d: NaiveDate, done: &[PrayerType]) -> DailyRecord {
        let mut day = DayTemplate::default().record_for(d);
        for pt in done {
            day = day.set_prayer_status(*pt, true, None).unwrap();
        }
        day
    }

    fn build(days: &[(&str, &[PrayerType])]) -> History {
        days.iter()
            .map(|(d, done)| {
                let day = day_with(date(d), done);
                (day.date(), day)
            })
            .collect()
    }

    const NONE: &[PrayerType] = &[];
    const ALL: &[PrayerType] = &[
        PrayerType::Fajr,
        PrayerType::Dhuhr,
        PrayerType::Asr,
        PrayerType::Maghrib,
        PrayerType::Isha,
    ];

    #[test]
    fn empty_history_is_all_zero() {
        let stats = compute_stats(&History::new());
        assert_eq!(stats.total_prayers, 0);
        assert_eq!(stats.completion_rate, 0.0);
        assert_eq!(stats.streak, Streak::default());
        assert_eq!(stats.best_day_of_week, None);
        assert_eq!(stats.most_missed_prayer, None);
        assert!(stats.per_prayer.is_empty());
    }

    #[test]
    fn streak_resets_on_a_missed_day() {
        let history = build(&[
            ("2024-01-01", ALL),
            ("2024-01-02", ALL),
            ("2024-01-03", ALL),
            ("2024-01-04", &ALL[1..]),
            ("2024-01-05", ALL),
            ("2024-01-06", ALL),
        ]);
        let s = streak(&history);
        assert_eq!(s.longest, 3);
        assert_eq!(s.current, 2);
        assert_eq!(s.last_completed, Some(date("2024-01-06")));
    }

    #[test]
    fn streak_follows_date_order_not_insertion_order() {
        let mut history = History::new();
        for (d, done) in [
            ("2024-01-06", ALL),
            ("2024-01-04", &ALL[..2]),
            ("2024-01-05", ALL),
            ("2024-01-01", ALL),
        ] {
            let day = day_with(date(d), done);
            history.insert(day.date(), day);
        }
        assert_eq!(
            streak(&history),
            Streak {
                current: 2,
                longest: 2,
                last_completed: Some(date("2024-01-06")),
            }
        );
    }

    #[test]
    fn last_completed_survives_a_broken_streak() {
        let history = build(&[
            ("2024-01-01", ALL),
            ("2024-01-02", ALL),
            ("2024-01-03", &ALL[..4]),
        ]);
        assert_eq!(
            streak(&history),
            Streak {
                current: 0,
                longest: 2,
                last_completed: Some(date("2024-01-02")),
            }
        );
    }

    #[test]
    fn no_full_day_means_no_streak() {
        let history = build(&[("2024-01-01", &ALL[..4]), ("2024-01-02", NONE)]);
        assert_eq!(streak(&history), Streak::default());
    }

    #[test]
    fn counts_rates_and_fines() {
        let history = build(&[("2024-01-01", ALL), ("2024-01-02", &[PrayerType::Fajr])]);
        let stats = compute_stats(&history);
        assert_eq!(stats.total_prayers, 10);
        assert_eq!(stats.completed_prayers, 6);
        assert_eq!(stats.missed_prayers, 4);
        assert!((stats.completion_rate - 60.0).abs() < 1e-9);
        assert_eq!(stats.total_fine, 40);
        assert!(stats.streak.longest >= stats.streak.current);

        let fajr = &stats.per_prayer[&PrayerType::Fajr];
        assert_eq!((fajr.total, fajr.completed), (2, 2));
        assert!((fajr.completion_rate - 100.0).abs() < 1e-9);
        let isha = &stats.per_prayer[&PrayerType::Isha];
        assert!((isha.completion_rate - 50.0).abs() < 1e-9);
    }

    #[test]
    fn completion_rate_stays_in_bounds() {
        for history in [
            build(&[("2024-01-01", NONE)]),
            build(&[("2024-01-01", ALL)]),
            build(&[("2024-01-01", &ALL[..3]), ("2024-01-02", ALL)]),
        ] {
            let rate = compute_stats(&history).completion_rate;
            assert!((0.0..=100.0).contains(&rate));
        }
    }

    #[test]
    fn best_weekday_prefers_most_full_days_then_sunday_first() {
        // 2024-01-07 Sunday, 2024-01-08 Monday, 2024-01-15 Monday
        let history = build(&[
            ("2024-01-07", ALL),
            ("2024-01-08", ALL),
            ("2024-01-15", ALL),
        ]);
        assert_eq!(
            compute_stats(&history).best_day_of_week.as_deref(),
            Some("Monday")
        );

        // One Saturday and one Sunday: tie goes to Sunday.
        let tied = build(&[("2024-01-06", ALL), ("2024-01-07", ALL)]);
        assert_eq!(
            compute_stats(&tied).best_day_of_week.as_deref(),
            Some("Sunday")
        );
    }

    #[test]
    fn most_missed_prayer_breaks_ties_in_prayer_order() {
        let history = build(&[
            ("2024-01-01", &[PrayerType::Fajr, PrayerType::Dhuhr, PrayerType::Asr]),
            ("2024-01-02", &[PrayerType::Fajr, PrayerType::Dhuhr, PrayerType::Asr, PrayerType::Maghrib]),
        ]);
        assert_eq!(
            compute_stats(&history).most_missed_prayer,
            Some(PrayerType::Isha)
        );

        let tied = build(&[("2024-01-01", &[PrayerType::Fajr, PrayerType::Dhuhr, PrayerType::Asr])]);
        assert_eq!(
            compute_stats(&tied).most_missed_prayer,
            Some(PrayerType::Maghrib)
        );
    }

    #[test]
    fn time_distribution_buckets_completed_starts() {
        let history = build(&[("2024-01-01", &[PrayerType::Fajr, PrayerType::Isha])]);
        let stats = compute_stats(&history);
        assert_eq!(stats.time_distribution[5], 1);
        assert_eq!(stats.time_distribution[20], 1);
        assert_eq!(stats.time_distribution.iter().sum::<u32>(), 2);
    }

    #[test]
    fn weekly_overview_fills_missing_days() {
        let history = build(&[("2024-01-08", &[PrayerType::Fajr])]);
        let week = DateRange::new(date("2024-01-07"), date("2024-01-13"));
        let grid = weekly_overview(&history, &week);
        assert_eq!(grid.len(), 7);
        assert_eq!(grid[0].prayers_done, 0);
        assert_eq!(grid[0].prayers_total, 5);
        assert_eq!(grid[1].prayers_done, 1);
        assert!((grid[1].completion_ratio() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn trend_spans_days_plus_one_points() {
        let history = build(&[("2024-01-10", ALL), ("2024-01-09", NONE)]);
        let points = trend(&history, date("2024-01-10"), 3);
        assert_eq!(points.len(), 4);
        assert_eq!(points[0].date, date("2024-01-07"));
        assert_eq!(points[2].fine, 50);
        assert!((points[3].completion_rate - 100.0).abs() < 1e-9);
    }
}
