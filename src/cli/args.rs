use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::models::{DateRange, RangePreset, WeekStart};
use crate::utils::dates::parse_date;

#[derive(Parser, Debug)]
#[command(name = "fardh", version, author, about = "Track the five daily prayers, missed-prayer fines and fine payments")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// First-run setup (location, calculation method, madhab, fines)
    Setup {
        /// Reset existing configuration
        #[arg(long)]
        reset: bool,
    },
    /// Show today's prayer times, countdown to next prayer and Qibla
    Times,
    /// Mark a prayer as completed or missed
    Mark {
        /// Prayer name (fajr, dhuhr, asr, maghrib, isha)
        prayer: String,
        /// Mark as missed instead of completed
        #[arg(long)]
        missed: bool,
        /// Why the prayer was missed
        #[arg(long, requires = "missed")]
        reason: Option<String>,
        /// Day to update (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Change the scheduled window of a prayer
    Window {
        /// Prayer name
        prayer: String,
        /// Window start (HH:MM)
        start: String,
        /// Window end (HH:MM)
        end: String,
        /// Day to update (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<String>,
    },
    /// List recorded days
    History {
        #[command(flatten)]
        period: RangeArgs,
        /// Hide completed prayers
        #[arg(long)]
        hide_completed: bool,
        /// Hide missed prayers
        #[arg(long)]
        hide_missed: bool,
    },
    /// Show statistics
    Stats {
        #[command(flatten)]
        period: RangeArgs,
        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show outstanding fines per day
    Fines {
        #[command(flatten)]
        period: RangeArgs,
    },
    /// Record a fine payment
    Pay {
        /// Amount paid
        #[arg(allow_negative_numbers = true)]
        amount: i64,
        /// First day the payment settles (YYYY-MM-DD, default today)
        #[arg(long)]
        from: Option<String>,
        /// Last day the payment settles (YYYY-MM-DD, default --from)
        #[arg(long)]
        to: Option<String>,
        /// Payment method (cash, bank, mobile-wallet, ...)
        #[arg(long)]
        method: Option<String>,
    },
    /// List recorded payments
    Payments,
    /// Export a weekly text summary to stdout
    Export,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RangeKind {
    Today,
    Week,
    Month,
    All,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RangeArgs {
    /// Preset window; ignored when --from or --to is given
    #[arg(long, value_enum)]
    pub range: Option<RangeKind>,
    /// Custom window start (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,
    /// Custom window end (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,
}

impl RangeArgs {
    /// A custom --from/--to wins over the preset. An open end of a custom
    /// window is unbounded.
    pub fn resolve(
        &self,
        today: NaiveDate,
        week_start: WeekStart,
        fallback: RangeKind,
    ) -> Result<DateRange> {
        if self.from.is_some() || self.to.is_some() {
            let start = self.from.as_deref().map(parse_date).transpose()?;
            let end = self.to.as_deref().map(parse_date).transpose()?;
            let custom = DateRange::new(
                start.unwrap_or(NaiveDate::MIN),
                end.unwrap_or(NaiveDate::MAX),
            );
            return Ok(RangePreset::Custom(custom).resolve(today, week_start));
        }
        let preset = match self.range.unwrap_or(fallback) {
            RangeKind::Today => RangePreset::Today,
            RangeKind::Week => RangePreset::ThisWeek,
            RangeKind::Month => RangePreset::ThisMonth,
            RangeKind::All => {
                return Ok(DateRange::new(NaiveDate::MIN, NaiveDate::MAX));
            }
        };
        Ok(preset.resolve(today, week_start))
    }
}
