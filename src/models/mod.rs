pub mod history;
pub mod payment;
pub mod prayer;
pub mod stats;

pub use history::{DateRange, DayTemplate, History, RangePreset, WeekStart};
pub use payment::{Payment, PaymentHistory};
pub use prayer::{DailyRecord, Prayer, PrayerType, PrayerWindow, DEFAULT_FINE};
pub use stats::{DailyStats, DayFine, PrayerBreakdown, Stats, Streak, TrendPoint};
