use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{TrackerError, TrackerResult};

pub const DEFAULT_FINE: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrayerType {
    Fajr,
    Dhuhr,
    Asr,
    Maghrib,
    Isha,
}

impl PrayerType {
    pub fn all() -> Vec<PrayerType> {
        vec![
            PrayerType::Fajr,
            PrayerType::Dhuhr,
            PrayerType::Asr,
            PrayerType::Maghrib,
            PrayerType::Isha,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PrayerType::Fajr => "fajr",
            PrayerType::Dhuhr => "dhuhr",
            PrayerType::Asr => "asr",
            PrayerType::Maghrib => "maghrib",
            PrayerType::Isha => "isha",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PrayerType::Fajr => "Fajr",
            PrayerType::Dhuhr => "Dhuhr",
            PrayerType::Asr => "Asr",
            PrayerType::Maghrib => "Maghrib",
            PrayerType::Isha => "Isha",
        }
    }

    /// Window used when no calculated prayer times are available.
    pub fn default_window(&self) -> PrayerWindow {
        let (start, end) = match self {
            PrayerType::Fajr => ((5, 30), (6, 45)),
            PrayerType::Dhuhr => ((13, 30), (16, 30)),
            PrayerType::Asr => ((16, 30), (18, 30)),
            PrayerType::Maghrib => ((18, 30), (20, 0)),
            PrayerType::Isha => ((20, 0), (5, 30)),
        };
        PrayerWindow {
            start: hm(start.0, start.1),
            end: hm(end.0, end.1),
        }
    }
}

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN)
}

impl std::fmt::Display for PrayerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for PrayerType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fajr" => Ok(PrayerType::Fajr),
            "dhuhr" | "zuhr" | "dhuhur" => Ok(PrayerType::Dhuhr),
            "asr" => Ok(PrayerType::Asr),
            "maghrib" => Ok(PrayerType::Maghrib),
            "isha" => Ok(PrayerType::Isha),
            _ => Err(anyhow::anyhow!("Unknown prayer type: {}", s)),
        }
    }
}

/// Scheduled wall-clock window of a prayer. `end` may be earlier than
/// `start` when the window runs past midnight (Isha).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrayerWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prayer {
    pub name: PrayerType,
    pub window: PrayerWindow,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub fine_amount: i64,
}

impl Prayer {
    pub fn new(name: PrayerType, window: PrayerWindow, fine_amount: i64) -> Self {
        Self {
            name,
            window,
            completed: false,
            reason: None,
            fine_amount,
        }
    }

    /// Fine currently owed for this prayer.
    pub fn owed(&self) -> i64 {
        if self.completed { 0 } else { self.fine_amount }
    }
}

/// Shape persisted for a day. Totals are never read back from storage.
#[derive(Debug, Clone, Deserialize)]
struct StoredDay {
    date: NaiveDate,
    prayers: Vec<Prayer>,
}

impl From<StoredDay> for DailyRecord {
    fn from(stored: StoredDay) -> Self {
        DailyRecord::from_prayers(stored.date, stored.prayers)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredDay")]
pub struct DailyRecord {
    date: NaiveDate,
    prayers: Vec<Prayer>,
    total_completed: u32,
    total_fine: i64,
}

impl DailyRecord {
    /// Build a record from arbitrary prayers: entries are put in canonical
    /// order and later duplicates of a name are dropped.
    pub fn from_prayers(date: NaiveDate, mut prayers: Vec<Prayer>) -> Self {
        prayers.sort_by_key(|p| p.name);
        prayers.dedup_by_key(|p| p.name);
        for p in prayers.iter_mut().filter(|p| p.completed) {
            p.reason = None;
        }
        let mut record = Self {
            date,
            prayers,
            total_completed: 0,
            total_fine: 0,
        };
        record.recount();
        record
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn prayers(&self) -> &[Prayer] {
        &self.prayers
    }

    pub fn prayer(&self, name: PrayerType) -> Option<&Prayer> {
        self.prayers.iter().find(|p| p.name == name)
    }

    pub fn total_completed(&self) -> u32 {
        self.total_completed
    }

    pub fn total_fine(&self) -> i64 {
        self.total_fine
    }

    pub fn total_missed(&self) -> u32 {
        self.prayers.len() as u32 - self.total_completed
    }

    pub fn is_fully_completed(&self) -> bool {
        !self.prayers.is_empty() && self.prayers.iter().all(|p| p.completed)
    }

    /// Mark one prayer completed or missed. A completed prayer drops its
    /// reason; a missed one keeps the given reason (empty if none).
    pub fn set_prayer_status(
        &self,
        name: PrayerType,
        completed: bool,
        reason: Option<&str>,
    ) -> TrackerResult<DailyRecord> {
        let mut next = self.clone();
        let prayer = next.find_mut(name)?;
        prayer.completed = completed;
        prayer.reason = if completed {
            None
        } else {
            Some(reason.unwrap_or_default().to_string())
        };
        next.recount();
        Ok(next)
    }

    pub fn set_prayer_window(
        &self,
        name: PrayerType,
        start: NaiveTime,
        end: NaiveTime,
    ) -> TrackerResult<DailyRecord> {
        let mut next = self.clone();
        next.find_mut(name)?.window = PrayerWindow { start, end };
        next.recount();
        Ok(next)
    }

    /// Same day restricted to the prayers matching `keep`, totals recounted
    /// over the subset.
    pub fn retain_view(&self, keep: impl Fn(&Prayer) -> bool) -> DailyRecord {
        let prayers = self.prayers.iter().filter(|p| keep(p)).cloned().collect();
        let mut view = Self {
            date: self.date,
            prayers,
            total_completed: 0,
            total_fine: 0,
        };
        view.recount();
        view
    }

    fn find_mut(&mut self, name: PrayerType) -> TrackerResult<&mut Prayer> {
        let date = self.date;
        self.prayers
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or(TrackerError::NotFound { date, prayer: name })
    }

    fn recount(&mut self) {
        self.total_completed = self.prayers.iter().filter(|p| p.completed).count() as u32;
        self.total_fine = self
            .prayers
            .iter()
            .map(Prayer::owed)
            .fold(0, i64::saturating_add);
    }
}
