use chrono::NaiveDate;
use thiserror::Error;

use crate::models::PrayerType;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    #[error("{prayer} is not part of the record for {date}")]
    NotFound { date: NaiveDate, prayer: PrayerType },

    #[error("payment amount must be positive, got {0}")]
    InvalidAmount(i64),

    #[error("payment of {0} would overflow the total paid")]
    AmountOverflow(i64),

    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("invalid time '{0}', expected HH:MM")]
    InvalidTime(String),
}

pub type TrackerResult<T> = std::result::Result<T, TrackerError>;
