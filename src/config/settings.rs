use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::models::{PrayerType, WeekStart, DEFAULT_FINE};

fn default_latitude() -> f64 {
    33.6938
}
fn default_longitude() -> f64 {
    73.0651
}
fn default_location_name() -> String {
    "Islamabad".to_string()
}
fn default_calc_method() -> String {
    "MuslimWorldLeague".to_string()
}
fn default_madhab() -> String {
    "Hanafi".to_string()
}
fn default_timezone_offset() -> i32 {
    300
}
fn default_fine() -> i64 {
    DEFAULT_FINE
}
fn default_currency() -> String {
    "Rs".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalahConfig {
    #[serde(default = "default_location_name")]
    pub location_name: String,
    #[serde(default = "default_latitude")]
    pub latitude: f64,
    #[serde(default = "default_longitude")]
    pub longitude: f64,
    #[serde(default = "default_calc_method")]
    pub calc_method: String,
    #[serde(default = "default_madhab")]
    pub madhab: String,
    #[serde(default = "default_timezone_offset")]
    pub timezone_offset: i32, // minutes from UTC
    #[serde(default)]
    pub adjustments: TimeAdjustments,
}

pub const MAX_ADJUSTMENT_MINUTES: i64 = 24 * 60;

/// Minutes added to each calculated time, negative to move it earlier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeAdjustments {
    #[serde(default)]
    pub fajr: i64,
    #[serde(default)]
    pub sunrise: i64,
    #[serde(default)]
    pub dhuhr: i64,
    #[serde(default)]
    pub asr: i64,
    #[serde(default)]
    pub maghrib: i64,
    #[serde(default)]
    pub isha: i64,
}

impl Default for SalahConfig {
    fn default() -> Self {
        Self {
            location_name: default_location_name(),
            latitude: default_latitude(),
            longitude: default_longitude(),
            calc_method: default_calc_method(),
            madhab: default_madhab(),
            timezone_offset: default_timezone_offset(),
            adjustments: TimeAdjustments::default(),
        }
    }
}

/// Fine charged for each prayer left incomplete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FineConfig {
    #[serde(default = "default_fine")]
    pub fajr: i64,
    #[serde(default = "default_fine")]
    pub dhuhr: i64,
    #[serde(default = "default_fine")]
    pub asr: i64,
    #[serde(default = "default_fine")]
    pub maghrib: i64,
    #[serde(default = "default_fine")]
    pub isha: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Default for FineConfig {
    fn default() -> Self {
        Self {
            fajr: DEFAULT_FINE,
            dhuhr: DEFAULT_FINE,
            asr: DEFAULT_FINE,
            maghrib: DEFAULT_FINE,
            isha: DEFAULT_FINE,
            currency: default_currency(),
        }
    }
}

impl FineConfig {
    pub fn amount(&self, prayer: PrayerType) -> i64 {
        match prayer {
            PrayerType::Fajr => self.fajr,
            PrayerType::Dhuhr => self.dhuhr,
            PrayerType::Asr => self.asr,
            PrayerType::Maghrib => self.maghrib,
            PrayerType::Isha => self.isha,
        }
    }

    pub fn amount_mut(&mut self, prayer: PrayerType) -> &mut i64 {
        match prayer {
            PrayerType::Fajr => &mut self.fajr,
            PrayerType::Dhuhr => &mut self.dhuhr,
            PrayerType::Asr => &mut self.asr,
            PrayerType::Maghrib => &mut self.maghrib,
            PrayerType::Isha => &mut self.isha,
        }
    }

    pub fn per_prayer(&self) -> BTreeMap<PrayerType, i64> {
        PrayerType::all()
            .into_iter()
            .map(|pt| (pt, self.amount(pt)))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub week_start: WeekStart,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub salah: SalahConfig,
    #[serde(default)]
    pub fines: FineConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

impl AppConfig {
    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("", "", "fardh")
            .context("Could not determine project directories")
    }

    pub fn config_path() -> Result<PathBuf> {
        let dirs = Self::project_dirs()?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn data_dir() -> Result<PathBuf> {
        let dirs = Self::project_dirs()?;
        Ok(dirs.data_dir().to_path_buf())
    }

    pub fn db_path() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("fardh.db"))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("no config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Reading {:?}", path))?;
        let config: AppConfig = toml::from_str(&content).context("Parsing config.toml")?;
        config.validate().with_context(|| format!("Invalid config {:?}", path))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (prayer, amount) in self.fines.per_prayer() {
            if amount < 0 {
                bail!("fine for {} cannot be negative, got {}", prayer, amount);
            }
        }
        let a = &self.salah.adjustments;
        for (name, minutes) in [
            ("fajr", a.fajr),
            ("sunrise", a.sunrise),
            ("dhuhr", a.dhuhr),
            ("asr", a.asr),
            ("maghrib", a.maghrib),
            ("isha", a.isha),
        ] {
            if minutes.abs() > MAX_ADJUSTMENT_MINUTES {
                bail!(
                    "{} adjustment must be within {} minutes, got {}",
                    name,
                    MAX_ADJUSTMENT_MINUTES,
                    minutes
                );
            }
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).context("Serializing config")?;
        std::fs::write(path, content).with_context(|| format!("Writing {:?}", path))?;
        Ok(())
    }

    pub fn ensure_data_dir() -> Result<PathBuf> {
        let dir = Self::data_dir()?;
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.fines.amount(PrayerType::Asr), 10);
        assert_eq!(config.display.week_start, WeekStart::Sunday);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[fines]\nfajr = 25\ncurrency = \"USD\"\n\n[display]\nweek_start = \"monday\"\n",
        )
        .unwrap();
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.fines.fajr, 25);
        assert_eq!(config.fines.isha, 10);
        assert_eq!(config.fines.currency, "USD");
        assert_eq!(config.display.week_start, WeekStart::Monday);
        assert_eq!(config.salah, SalahConfig::default());
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = AppConfig::default();
        config.salah.location_name = "Makkah".into();
        config.fines.maghrib = 50;
        config.save_to(&path).unwrap();
        assert_eq!(AppConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn per_prayer_fines_follow_config() {
        let mut fines = FineConfig::default();
        fines.isha = 3;
        let map = fines.per_prayer();
        assert_eq!(map.len(), 5);
        assert_eq!(map[&PrayerType::Isha], 3);
        assert_eq!(map[&PrayerType::Fajr], 10);
    }

    #[test]
    fn negative_fine_in_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[fines]\nasr = -5\n").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("cannot be negative"));
    }

    #[test]
    fn adjustments_default_to_zero_and_load_per_prayer() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[salah.adjustments]\nfajr = -3\nisha = 10\n").unwrap();
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.salah.adjustments.fajr, -3);
        assert_eq!(config.salah.adjustments.isha, 10);
        assert_eq!(config.salah.adjustments.dhuhr, 0);
        assert_eq!(config.salah.latitude, SalahConfig::default().latitude);
        assert_eq!(AppConfig::default().salah.adjustments, TimeAdjustments::default());
    }

    #[test]
    fn out_of_range_adjustment_is_rejected() {
        let mut config = AppConfig::default();
        config.salah.adjustments.maghrib = MAX_ADJUSTMENT_MINUTES + 1;
        assert!(config.validate().is_err());
        config.salah.adjustments.maghrib = -MAX_ADJUSTMENT_MINUTES;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn amount_mut_edits_one_prayer() {
        let mut fines = FineConfig::default();
        *fines.amount_mut(PrayerType::Dhuhr) = 25;
        assert_eq!(fines.dhuhr, 25);
        assert_eq!(fines.asr, 10);
    }
}
