use anyhow::{anyhow, Result};
use chrono::{Duration, NaiveDate, NaiveTime, Timelike};
use salah::prelude::*;
use std::collections::BTreeMap;

use crate::config::settings::{SalahConfig, TimeAdjustments};
use crate::models::{PrayerType, PrayerWindow};

#[derive(Debug, Clone)]
pub struct PrayerTimesLocal {
    pub fajr: NaiveTime,
    pub sunrise: NaiveTime,
    pub dhuhr: NaiveTime,
    pub asr: NaiveTime,
    pub maghrib: NaiveTime,
    pub isha: NaiveTime,
}

pub struct PrayerCalculator {
    pub lat: f64,
    pub lng: f64,
    pub method_str: String,
    pub madhab_str: String,
    pub tz_offset_minutes: i32,
    pub adjustments: TimeAdjustments,
}

impl PrayerCalculator {
    pub fn new(
        lat: f64,
        lng: f64,
        method: &str,
        madhab: &str,
        tz_offset_minutes: i32,
    ) -> Result<Self> {
        // Validate method + madhab early
        parse_method(method)?;
        parse_madhab(madhab)?;
        chrono::FixedOffset::east_opt(tz_offset_minutes * 60)
            .ok_or_else(|| anyhow!("Invalid timezone offset: {}", tz_offset_minutes))?;
        Ok(Self {
            lat,
            lng,
            method_str: method.to_string(),
            madhab_str: madhab.to_string(),
            tz_offset_minutes,
            adjustments: TimeAdjustments::default(),
        })
    }

    pub fn with_adjustments(mut self, adjustments: TimeAdjustments) -> Self {
        self.adjustments = adjustments;
        self
    }

    pub fn from_config(salah: &SalahConfig) -> Result<Self> {
        Self::new(
            salah.latitude,
            salah.longitude,
            &salah.calc_method,
            &salah.madhab,
            salah.timezone_offset,
        )
        .map(|calc| calc.with_adjustments(salah.adjustments))
    }

    pub fn times_for_date(&self, date: NaiveDate) -> Result<PrayerTimesLocal> {
        let coords = Coordinates::new(self.lat, self.lng);
        let method = parse_method(&self.method_str)?;
        let madhab = parse_madhab(&self.madhab_str)?;
        let params = Configuration::with(method, madhab);

        let times = PrayerSchedule::new()
            .on(date)
            .for_location(coords)
            .with_configuration(params)
            .calculate()
            .map_err(|e| anyhow!("Prayer calculation failed: {}", e))?;

        let offset = chrono::FixedOffset::east_opt(self.tz_offset_minutes * 60)
            .ok_or_else(|| anyhow!("Invalid timezone offset: {}", self.tz_offset_minutes))?;

        // Whole minutes, matching what the store keeps.
        let to_local = |utc: chrono::DateTime<chrono::Utc>| -> NaiveTime {
            let t = utc.with_timezone(&offset).time();
            NaiveTime::from_hms_opt(t.hour(), t.minute(), 0).unwrap_or(t)
        };

        let local = PrayerTimesLocal {
            fajr: to_local(times.time(Prayer::Fajr)),
            sunrise: to_local(times.time(Prayer::Sunrise)),
            dhuhr: to_local(times.time(Prayer::Dhuhr)),
            asr: to_local(times.time(Prayer::Asr)),
            maghrib: to_local(times.time(Prayer::Maghrib)),
            isha: to_local(times.time(Prayer::Isha)),
        };
        Ok(adjust(local, &self.adjustments))
    }

    /// Windows of the obligatory prayers on `date`. Each closes when the next
    /// one opens; Fajr closes at sunrise and Isha at the next day's Fajr.
    pub fn windows_for_date(&self, date: NaiveDate) -> Result<BTreeMap<PrayerType, PrayerWindow>> {
        let today = self.times_for_date(date)?;
        let tomorrow = self.times_for_date(date.succ_opt().unwrap_or(date))?;
        Ok(windows_from_times(&today, tomorrow.fajr))
    }

    /// Returns (next PrayerType, seconds until it).
    pub fn get_next_prayer(
        &self,
        now_date: NaiveDate,
        now_time: NaiveTime,
    ) -> Result<Option<(PrayerType, i64)>> {
        let today_times = self.times_for_date(now_date)?;

        let schedule = [
            (PrayerType::Fajr, today_times.fajr),
            (PrayerType::Dhuhr, today_times.dhuhr),
            (PrayerType::Asr, today_times.asr),
            (PrayerType::Maghrib, today_times.maghrib),
            (PrayerType::Isha, today_times.isha),
        ];

        for (prayer, time) in &schedule {
            if *time > now_time {
                let secs = (*time - now_time).num_seconds();
                return Ok(Some((*prayer, secs)));
            }
        }

        // All prayers passed, next is Fajr tomorrow
        let tomorrow = now_date.succ_opt().unwrap_or(now_date);
        let tomorrow_times = self.times_for_date(tomorrow)?;
        let until_midnight = 86_400 - (now_time - NaiveTime::MIN).num_seconds();
        let midnight_to_fajr = (tomorrow_times.fajr - NaiveTime::MIN).num_seconds();
        Ok(Some((PrayerType::Fajr, until_midnight + midnight_to_fajr)))
    }
}

// Shifts wrap around midnight.
fn adjust(t: PrayerTimesLocal, by: &TimeAdjustments) -> PrayerTimesLocal {
    let shift = |time: NaiveTime, minutes: i64| time + Duration::minutes(minutes);
    PrayerTimesLocal {
        fajr: shift(t.fajr, by.fajr),
        sunrise: shift(t.sunrise, by.sunrise),
        dhuhr: shift(t.dhuhr, by.dhuhr),
        asr: shift(t.asr, by.asr),
        maghrib: shift(t.maghrib, by.maghrib),
        isha: shift(t.isha, by.isha),
    }
}

fn windows_from_times(
    t: &PrayerTimesLocal,
    next_fajr: NaiveTime,
) -> BTreeMap<PrayerType, PrayerWindow> {
    let window = |start, end| PrayerWindow { start, end };
    BTreeMap::from([
        (PrayerType::Fajr, window(t.fajr, t.sunrise)),
        (PrayerType::Dhuhr, window(t.dhuhr, t.asr)),
        (PrayerType::Asr, window(t.asr, t.maghrib)),
        (PrayerType::Maghrib, window(t.maghrib, t.isha)),
        (PrayerType::Isha, window(t.isha, next_fajr)),
    ])
}

fn parse_method(s: &str) -> Result<Method> {
    match s {
        "MuslimWorldLeague" => Ok(Method::MuslimWorldLeague),
        "Egyptian" => Ok(Method::Egyptian),
        "Karachi" => Ok(Method::Karachi),
        "UmmAlQura" => Ok(Method::UmmAlQura),
        "Dubai" => Ok(Method::Dubai),
        "MoonsightingCommittee" => Ok(Method::MoonsightingCommittee),
        "NorthAmerica" => Ok(Method::NorthAmerica),
        "Kuwait" => Ok(Method::Kuwait),
        "Qatar" => Ok(Method::Qatar),
        "Singapore" => Ok(Method::Singapore),
        "Tehran" => Ok(Method::Tehran),
        "Turkey" => Ok(Method::Turkey),
        "Other" => Ok(Method::Other),
        _ => Err(anyhow!("Unknown calculation method: '{}'", s)),
    }
}

fn parse_madhab(s: &str) -> Result<Madhab> {
    match s {
        "Hanafi" => Ok(Madhab::Hanafi),
        "Shafi" | "Shafi'i" => Ok(Madhab::Shafi),
        _ => Err(anyhow!("Unknown madhab: '{}'", s)),
    }
}

pub const CALC_METHODS: &[&str] = &[
    "MuslimWorldLeague",
    "Egyptian",
    "Karachi",
    "UmmAlQura",
    "Dubai",
    "MoonsightingCommittee",
    "NorthAmerica",
    "Kuwait",
    "Qatar",
    "Singapore",
    "Tehran",
    "Turkey",
    "Other",
];

pub const MADHABS: &[&str] = &["Hanafi", "Shafi"];
