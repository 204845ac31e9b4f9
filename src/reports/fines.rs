use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::models::{DateRange, DayFine, History, PaymentHistory};

/// How much of each day's fine has been paid. Payments apply in the order
/// they were made; each one settles the fined days it covers oldest first,
/// never more than a day's fine. Whatever is left over is dropped.
fn allocate_payments(history: &History, payments: &PaymentHistory) -> BTreeMap<NaiveDate, i64> {
    let mut paid: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for payment in payments.records() {
        let covered = payment.covered_range;
        if covered.start > covered.end {
            continue;
        }
        let mut left = payment.amount;
        for (date, day) in history.range(covered.start..=covered.end) {
            if left == 0 {
                break;
            }
            let settled = paid.entry(*date).or_default();
            let take = (day.total_fine() - *settled).max(0).min(left);
            *settled += take;
            left -= take;
        }
    }
    paid
}

/// Unpaid fine across `range` after payments are spread over the days
/// they cover. Never negative; overpayment is not carried as credit.
pub fn outstanding_fine(history: &History, payments: &PaymentHistory, range: &DateRange) -> i64 {
    if range.start > range.end {
        return 0;
    }
    let paid = allocate_payments(history, payments);
    history
        .range(range.start..=range.end)
        .map(|(date, day)| (day.total_fine() - paid.get(date).copied().unwrap_or(0)).max(0))
        .fold(0, i64::saturating_add)
}

/// Per-day fines in `range`, newest first. Only days with a fine appear.
/// `remaining` sums to [`outstanding_fine`] over the same range.
pub fn fine_breakdown(
    history: &History,
    payments: &PaymentHistory,
    range: &DateRange,
) -> Vec<DayFine> {
    if range.start > range.end {
        return Vec::new();
    }
    let allocated = allocate_payments(history, payments);
    history
        .range(range.start..=range.end)
        .rev()
        .filter(|(_, day)| day.total_fine() > 0)
        .map(|(date, day)| {
            let paid = allocated.get(date).copied().unwrap_or(0);
            DayFine {
                date: *date,
                total_fine: day.total_fine(),
                paid,
                remaining: (day.total_fine() - paid).max(0),
                missed: day
                    .prayers()
                    .iter()
                    .filter(|p| !p.completed)
                    .map(|p| p.name)
                    .collect(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DayTemplate, PrayerType};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn one_missed_day(d: &str) -> History {
        let day = DayTemplate::default().record_for(date(d));
        let mut history = History::new();
        history.insert(day.date(), day);
        history
    }

    #[test]
    fn partial_payment_leaves_remainder() {
        let history = one_missed_day("2024-01-01");
        let range = DateRange::single(date("2024-01-01"));
        let mut payments = PaymentHistory::default();
        assert_eq!(outstanding_fine(&history, &payments, &range), 50);

        payments.record_payment(30, range, None).unwrap();
        assert_eq!(outstanding_fine(&history, &payments, &range), 20);
    }

    #[test]
    fn overpayment_floors_at_zero() {
        let history = one_missed_day("2024-01-01");
        let range = DateRange::single(date("2024-01-01"));
        let mut payments = PaymentHistory::default();
        payments.record_payment(80, range, Some("bank".into())).unwrap();
        assert_eq!(outstanding_fine(&history, &payments, &range), 0);
    }

    #[test]
    fn never_negative_for_any_payment_size() {
        let history = one_missed_day("2024-01-01");
        let range = DateRange::single(date("2024-01-01"));
        for amount in [1, 49, 50, 51, 1_000_000] {
            let mut payments = PaymentHistory::default();
            payments.record_payment(amount, range, None).unwrap();
            assert!(outstanding_fine(&history, &payments, &range) >= 0);
        }
    }

    #[test]
    fn payments_outside_the_range_do_not_count() {
        let mut history = one_missed_day("2024-01-01");
        let second = DayTemplate::default().record_for(date("2024-01-05"));
        history.insert(second.date(), second);

        let mut payments = PaymentHistory::default();
        payments
            .record_payment(50, DateRange::single(date("2024-01-05")), None)
            .unwrap();

        let first = DateRange::single(date("2024-01-01"));
        assert_eq!(outstanding_fine(&history, &payments, &first), 50);
        let both = DateRange::new(date("2024-01-01"), date("2024-01-05"));
        assert_eq!(outstanding_fine(&history, &payments, &both), 50);
    }

    #[test]
    fn breakdown_lists_missed_prayers_newest_first() {
        let mut history = one_missed_day("2024-01-01");
        let mut day = DayTemplate::default().record_for(date("2024-01-02"));
        for pt in [PrayerType::Fajr, PrayerType::Dhuhr, PrayerType::Asr] {
            day = day.set_prayer_status(pt, true, None).unwrap();
        }
        history.insert(day.date(), day);

        let mut payments = PaymentHistory::default();
        payments
            .record_payment(15, DateRange::single(date("2024-01-02")), None)
            .unwrap();

        let range = DateRange::new(date("2024-01-01"), date("2024-01-31"));
        let rows = fine_breakdown(&history, &payments, &range);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, date("2024-01-02"));
        assert_eq!(rows[0].total_fine, 20);
        assert_eq!(rows[0].paid, 15);
        assert_eq!(rows[0].remaining, 5);
        assert_eq!(rows[0].missed, vec![PrayerType::Maghrib, PrayerType::Isha]);
        assert_eq!(rows[1].remaining, 50);
    }

    fn unfilled_days(from: &str, count: i64) -> History {
        let first = date(from);
        (0..count)
            .map(|i| {
                let day = DayTemplate::default().record_for(first + chrono::Duration::days(i));
                (day.date(), day)
            })
            .collect()
    }

    #[test]
    fn multi_day_payment_settles_oldest_days_first() {
        let history = unfilled_days("2024-01-01", 7);
        let week = DateRange::new(date("2024-01-01"), date("2024-01-07"));
        let mut payments = PaymentHistory::default();
        payments.record_payment(70, week, None).unwrap();

        assert_eq!(outstanding_fine(&history, &payments, &week), 280);
        let rows = fine_breakdown(&history, &payments, &week);
        assert_eq!(rows.iter().map(|r| r.paid).sum::<i64>(), 70);
        assert_eq!(rows.iter().map(|r| r.remaining).sum::<i64>(), 280);

        // Newest first: Jan 1 fully paid, Jan 2 partly, the rest untouched.
        assert_eq!((rows[6].paid, rows[6].remaining), (50, 0));
        assert_eq!((rows[5].paid, rows[5].remaining), (20, 30));
        assert_eq!(rows[0].paid, 0);

        let jan1 = DateRange::single(date("2024-01-01"));
        let jan3 = DateRange::single(date("2024-01-03"));
        assert_eq!(outstanding_fine(&history, &payments, &jan1), 0);
        assert_eq!(outstanding_fine(&history, &payments, &jan3), 50);
    }

    #[test]
    fn breakdown_agrees_with_outstanding_across_payments() {
        let history = unfilled_days("2024-01-01", 7);
        let week = DateRange::new(date("2024-01-01"), date("2024-01-07"));
        let mut payments = PaymentHistory::default();
        payments.record_payment(50, week, None).unwrap();
        payments
            .record_payment(30, DateRange::new(date("2024-01-01"), date("2024-01-02")), None)
            .unwrap();
        payments
            .record_payment(500, DateRange::single(date("2024-01-07")), None)
            .unwrap();

        for range in [
            week,
            DateRange::new(date("2024-01-02"), date("2024-01-06")),
            DateRange::single(date("2024-01-02")),
        ] {
            let rows = fine_breakdown(&history, &payments, &range);
            assert_eq!(
                rows.iter().map(|r| r.remaining).sum::<i64>(),
                outstanding_fine(&history, &payments, &range)
            );
            assert!(rows.iter().all(|r| r.paid <= r.total_fine));
        }
        // Jan 1 by the first payment, 30 of Jan 2 by the second, Jan 7 by the third.
        assert_eq!(outstanding_fine(&history, &payments, &week), 350 - 50 - 30 - 50);
    }

    #[test]
    fn huge_fines_do_not_overflow_the_total() {
        let mut history = History::new();
        let fines = DayTemplate {
            fines: PrayerType::all().into_iter().map(|pt| (pt, i64::MAX / 5)).collect(),
            ..DayTemplate::default()
        };
        for d in ["2024-01-01", "2024-01-02"] {
            let day = fines.record_for(date(d));
            history.insert(day.date(), day);
        }
        let range = DateRange::new(date("2024-01-01"), date("2024-01-02"));
        assert_eq!(
            outstanding_fine(&history, &PaymentHistory::default(), &range),
            i64::MAX
        );
    }
}
