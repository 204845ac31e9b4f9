pub mod store;

use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};

use crate::models::{DailyRecord, DateRange, History, Payment, PaymentHistory, PrayerType};

pub use store::RecordStore;
#[cfg(test)]
pub use store::MemoryStore;

/// Emitted to subscribers after a mutation has been persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    PrayerStatus {
        date: NaiveDate,
        prayer: PrayerType,
        completed: bool,
    },
    PrayerWindow {
        date: NaiveDate,
        prayer: PrayerType,
    },
    Payment(Payment),
}

pub type DayFactory = Box<dyn Fn(NaiveDate) -> DailyRecord>;
type Subscriber = Box<dyn FnMut(&Change)>;

/// Write-through front for a [`RecordStore`]: every mutation loads the
/// current state, applies one pure transition, saves, then notifies.
pub struct Tracker<S: RecordStore> {
    store: S,
    new_day: DayFactory,
    subscribers: Vec<Subscriber>,
}

impl<S: RecordStore> Tracker<S> {
    pub fn new(store: S, new_day: DayFactory) -> Self {
        Self {
            store,
            new_day,
            subscribers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&Change) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    pub fn history(&self) -> Result<History> {
        self.store.load_history()
    }

    pub fn payments(&self) -> Result<PaymentHistory> {
        self.store.load_payments()
    }

    /// The stored record for `date`, or the unfilled template for it.
    pub fn day(&self, date: NaiveDate) -> Result<DailyRecord> {
        let history = self.store.load_history()?;
        Ok(history
            .get(&date)
            .cloned()
            .unwrap_or_else(|| (self.new_day)(date)))
    }

    pub fn set_prayer_status(
        &mut self,
        date: NaiveDate,
        prayer: PrayerType,
        completed: bool,
        reason: Option<&str>,
    ) -> Result<DailyRecord> {
        let updated = self.update_day(date, |day| {
            day.set_prayer_status(prayer, completed, reason)
        })?;
        log::info!(
            "{} {} on {}",
            prayer,
            if completed { "completed" } else { "missed" },
            date
        );
        self.notify(&Change::PrayerStatus {
            date,
            prayer,
            completed,
        });
        Ok(updated)
    }

    pub fn set_prayer_window(
        &mut self,
        date: NaiveDate,
        prayer: PrayerType,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<DailyRecord> {
        let updated = self.update_day(date, |day| day.set_prayer_window(prayer, start, end))?;
        log::info!("{} window on {} set to {}-{}", prayer, date, start, end);
        self.notify(&Change::PrayerWindow { date, prayer });
        Ok(updated)
    }

    pub fn record_payment(
        &mut self,
        amount: i64,
        covered_range: DateRange,
        method: Option<String>,
    ) -> Result<Payment> {
        let mut payments = self.store.load_payments()?;
        let payment = payments.record_payment(amount, covered_range, method)?;
        self.store.save_payments(&payments)?;
        log::info!("payment {} of {} for {}", payment.id, amount, covered_range);
        self.notify(&Change::Payment(payment.clone()));
        Ok(payment)
    }

    fn update_day<F>(&mut self, date: NaiveDate, apply: F) -> Result<DailyRecord>
    where
        F: FnOnce(&DailyRecord) -> crate::error::TrackerResult<DailyRecord>,
    {
        let mut history = self.store.load_history()?;
        let current = history
            .get(&date)
            .cloned()
            .unwrap_or_else(|| (self.new_day)(date));
        let updated = apply(&current)?;
        history.insert(date, updated.clone());
        self.store.save_history(&history)?;
        Ok(updated)
    }

    fn notify(&mut self, change: &Change) {
        for subscriber in self.subscribers.iter_mut() {
            subscriber(change);
        }
    }
}
