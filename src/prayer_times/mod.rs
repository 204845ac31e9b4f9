pub mod calculator;
pub mod qibla;

pub use calculator::PrayerCalculator;
pub use qibla::{compass_point, qibla_bearing};
