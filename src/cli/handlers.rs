use anyhow::{anyhow, Context, Result};
use chrono::{Local, NaiveDate};
use rusqlite::Connection;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

use crate::cli::args::{RangeArgs, RangeKind};
use crate::config::AppConfig;
use crate::db::repository::MetaRepo;
use crate::db::SqliteStore;
use crate::models::{DailyRecord, DateRange, PrayerType, RangePreset};
use crate::prayer_times::calculator::{CALC_METHODS, MADHABS};
use crate::prayer_times::{compass_point, qibla_bearing, PrayerCalculator};
use crate::reports::{self, Visibility};
use crate::tracker::{Change, Tracker};
use crate::utils::dates::{format_date, format_tz_offset, parse_date, parse_time, parse_tz_offset};
use crate::utils::format::{
    format_duration_secs, format_money, format_percent, format_time, progress_bar,
};

pub type AppTracker = Tracker<SqliteStore>;

// ─── ANSI helpers ────────────────────────────────────────────────────────────

macro_rules! println_colored {
    ($color:expr, $($arg:tt)*) => {{
        print!("{}", $color);
        print!($($arg)*);
        println!("\x1b[0m");
    }};
}

const GREEN: &str = "\x1b[32m";
const AMBER: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const GOLD: &str = "\x1b[38;2;196;160;68m";

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn date_or_today(date: Option<&str>) -> Result<NaiveDate> {
    match date {
        Some(d) => Ok(parse_date(d)?),
        None => Ok(today()),
    }
}

fn parse_prayer(s: &str) -> Result<PrayerType> {
    PrayerType::from_str(s)
        .map_err(|_| anyhow!("Unknown prayer '{}'. Use: fajr, dhuhr, asr, maghrib, isha", s))
}

// ─── Change feedback ─────────────────────────────────────────────────────────

/// Subscriber that echoes each persisted change.
pub fn render_change(change: &Change, currency: &str) {
    match change {
        Change::PrayerStatus {
            prayer,
            completed: true,
            date,
        } => println_colored!(GREEN, "  ✓ {} marked as done ({})", prayer, date),
        Change::PrayerStatus {
            prayer,
            completed: false,
            date,
        } => println_colored!(RED, "  ✗ {} marked as missed ({})", prayer, date),
        Change::PrayerWindow { prayer, date } => {
            println_colored!(AMBER, "  {} window updated ({})", prayer, date)
        }
        Change::Payment(p) => println_colored!(
            GREEN,
            "  ✓ Recorded payment of {} for {}",
            format_money(p.amount, currency),
            p.covered_range
        ),
    }
}

// ─── Setup ───────────────────────────────────────────────────────────────────

pub fn handle_setup(conn: &Connection, config: &mut AppConfig, reset: bool) -> Result<()> {
    if !reset {
        if let Some(done) = MetaRepo::get(conn, "setup_done")? {
            if done == "1" {
                println!("fardh is already configured. Use --reset to reconfigure.");
                return Ok(());
            }
        }
    }

    println!();
    println_colored!(GOLD, "  fardh setup");
    println_colored!(DIM, "  Press Enter to keep the value in brackets.");
    println!();

    let salah = &mut config.salah;
    salah.location_name = prompt_or("Location name", &salah.location_name)?;
    salah.latitude = prompt_parsed("Latitude", salah.latitude)?;
    salah.longitude = prompt_parsed("Longitude", salah.longitude)?;

    println_colored!(DIM, "  Methods: {}", CALC_METHODS.join(", "));
    let method = prompt_or("Calculation method", &salah.calc_method)?;
    let madhab = prompt_or(&format!("Madhab ({})", MADHABS.join("/")), &salah.madhab)?;
    let tz = prompt_or(
        "UTC offset (e.g. +5, -3:30)",
        &format_tz_offset(salah.timezone_offset),
    )?;
    let tz_minutes = parse_tz_offset(&tz).with_context(|| format!("Bad UTC offset '{}'", tz))?;

    PrayerCalculator::new(salah.latitude, salah.longitude, &method, &madhab, tz_minutes)?;
    salah.calc_method = method;
    salah.madhab = madhab;
    salah.timezone_offset = tz_minutes;

    for prayer in PrayerType::all() {
        let current = config.fines.amount(prayer);
        let fine: i64 =
            prompt_parsed(&format!("Fine for missing {}", prayer.display_name()), current)?;
        *config.fines.amount_mut(prayer) = fine;
    }
    config.fines.currency = prompt_or("Currency label", &config.fines.currency)?;

    config.validate()?;
    config.save()?;
    MetaRepo::set(conn, "setup_done", "1")?;
    log::info!("configuration saved to {:?}", AppConfig::config_path()?);
    println!();
    println_colored!(GREEN, "  ✓ Saved. Time adjustments can be edited in the config file.");
    println!();
    Ok(())
}

// ─── Times ───────────────────────────────────────────────────────────────────

pub fn handle_times(config: &AppConfig) -> Result<()> {
    let today = today();
    let now_time = Local::now().time();
    let calc = PrayerCalculator::from_config(&config.salah)?;
    let times = calc.times_for_date(today)?;

    println!();
    println_colored!(
        GOLD,
        "  Prayer Times — {} ({})",
        config.salah.location_name,
        format_date(today)
    );
    println!();

    let prayers_with_times = [
        ("Fajr", times.fajr),
        ("Sunrise", times.sunrise),
        ("Dhuhr", times.dhuhr),
        ("Asr", times.asr),
        ("Maghrib", times.maghrib),
        ("Isha", times.isha),
    ];

    for (name, time) in &prayers_with_times {
        let time_str = format_time(*time);
        if *time < now_time {
            println_colored!(DIM, "  {:<10}  {}", name, time_str);
        } else {
            println_colored!(BOLD, "  {:<10}  {}", name, time_str);
        }
    }

    if let Some((next_prayer, secs)) = calc.get_next_prayer(today, now_time)? {
        println!();
        println_colored!(
            AMBER,
            "  Next: {} in {}",
            next_prayer.display_name(),
            format_duration_secs(secs)
        );
    }

    let bearing = qibla_bearing(config.salah.latitude, config.salah.longitude);
    println_colored!(DIM, "  Qibla: {:.1}° ({})", bearing, compass_point(bearing));
    println!();
    Ok(())
}

// ─── Today ───────────────────────────────────────────────────────────────────

pub fn handle_today(tracker: &AppTracker, config: &AppConfig) -> Result<()> {
    let day = tracker.day(today())?;
    println!();
    println_colored!(GOLD, "  Today — {}", format_date(day.date()));
    println!();
    print_day(&day, &config.fines.currency);
    println!();
    Ok(())
}

fn print_day(day: &DailyRecord, currency: &str) {
    for p in day.prayers() {
        let window = format!("{}–{}", format_time(p.window.start), format_time(p.window.end));
        if p.completed {
            println_colored!(GREEN, "  ✓ {:<8} {}", p.name.display_name(), window);
        } else {
            let reason = p
                .reason
                .as_deref()
                .filter(|r| !r.is_empty())
                .map(|r| format!("  ({})", r))
                .unwrap_or_default();
            println_colored!(
                RED,
                "  ✗ {:<8} {}  {}{}",
                p.name.display_name(),
                window,
                format_money(p.fine_amount, currency),
                reason
            );
        }
    }
    println_colored!(
        DIM,
        "  {}/{} completed · fine {}",
        day.total_completed(),
        day.prayers().len(),
        format_money(day.total_fine(), currency)
    );
}

// ─── Mark / window ───────────────────────────────────────────────────────────

pub fn handle_mark(
    tracker: &mut AppTracker,
    config: &AppConfig,
    prayer_str: &str,
    missed: bool,
    reason: Option<&str>,
    date: Option<&str>,
) -> Result<()> {
    let prayer = parse_prayer(prayer_str)?;
    let date = date_or_today(date)?;
    let day = tracker.set_prayer_status(date, prayer, !missed, reason)?;
    println_colored!(
        DIM,
        "  {}/{} completed · fine {}",
        day.total_completed(),
        day.prayers().len(),
        format_money(day.total_fine(), &config.fines.currency)
    );
    Ok(())
}

pub fn handle_window(
    tracker: &mut AppTracker,
    prayer_str: &str,
    start: &str,
    end: &str,
    date: Option<&str>,
) -> Result<()> {
    let prayer = parse_prayer(prayer_str)?;
    let date = date_or_today(date)?;
    let (start, end) = (parse_time(start)?, parse_time(end)?);
    tracker.set_prayer_window(date, prayer, start, end)?;
    Ok(())
}

// ─── History ─────────────────────────────────────────────────────────────────

pub fn handle_history(
    tracker: &AppTracker,
    config: &AppConfig,
    period: &RangeArgs,
    visibility: Visibility,
) -> Result<()> {
    let range = period.resolve(today(), config.display.week_start, RangeKind::Month)?;
    let history = tracker.history()?;
    let filtered = reports::filter_history(&history, &range, visibility);

    println!();
    println_colored!(GOLD, "  History");
    println!();
    if filtered.is_empty() {
        println_colored!(DIM, "  Nothing recorded in this range");
        println!();
        return Ok(());
    }
    for day in filtered.values().rev() {
        println_colored!(BOLD, "  {}", format_date(day.date()));
        print_day(day, &config.fines.currency);
        println!();
    }
    Ok(())
}

// ─── Stats ───────────────────────────────────────────────────────────────────

pub fn handle_stats(
    tracker: &AppTracker,
    config: &AppConfig,
    period: &RangeArgs,
    json: bool,
) -> Result<()> {
    let range = period.resolve(today(), config.display.week_start, RangeKind::All)?;
    let history = reports::filter_history(&tracker.history()?, &range, Visibility::default());
    let stats = reports::compute_stats(&history);

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    let currency = &config.fines.currency;
    println!();
    println_colored!(GOLD, "  Statistics");
    println!();
    println_colored!(
        BOLD,
        "  Prayers:     {}/{} completed ({})",
        stats.completed_prayers,
        stats.total_prayers,
        format_percent(stats.completion_rate)
    );
    println_colored!(
        BOLD,
        "  Streak:      {} days current  |  {} days best",
        stats.streak.current,
        stats.streak.longest
    );
    if let Some(date) = stats.streak.last_completed {
        println!("  Last full:   {}", format_date(date));
    }
    if stats.total_fine == 0 {
        println_colored!(GREEN, "  Fines:       {} ✓", format_money(0, currency));
    } else {
        println_colored!(AMBER, "  Fines:       {}", format_money(stats.total_fine, currency));
    }
    if let Some(day) = &stats.best_day_of_week {
        println!("  Best day:    {}", day);
    }
    if let Some(prayer) = stats.most_missed_prayer {
        println!("  Most missed: {}", prayer);
    }

    println!();
    for (prayer, b) in &stats.per_prayer {
        println!(
            "  {:<8} {}  {}/{}  {}",
            prayer.display_name(),
            progress_bar(b.completed, b.total, 10),
            b.completed,
            b.total,
            format_percent(b.completion_rate)
        );
    }

    let busiest = stats
        .time_distribution
        .iter()
        .enumerate()
        .filter(|(_, count)| **count > 0)
        .map(|(hour, count)| format!("{:02}:00×{}", hour, count))
        .collect::<Vec<_>>();
    if !busiest.is_empty() {
        println!();
        println_colored!(DIM, "  By hour: {}", busiest.join("  "));
    }
    println!();
    Ok(())
}

// ─── Fines & payments ────────────────────────────────────────────────────────

pub fn handle_fines(tracker: &AppTracker, config: &AppConfig, period: &RangeArgs) -> Result<()> {
    let range = period.resolve(today(), config.display.week_start, RangeKind::All)?;
    let history = tracker.history()?;
    let payments = tracker.payments()?;
    let currency = &config.fines.currency;

    let rows = reports::fine_breakdown(&history, &payments, &range);
    let outstanding = reports::outstanding_fine(&history, &payments, &range);

    println!();
    println_colored!(GOLD, "  Fines");
    println!();
    if rows.is_empty() {
        println_colored!(GREEN, "  ✓ No fines in this range");
    }
    for row in &rows {
        let missed = row
            .missed
            .iter()
            .map(|p| p.display_name())
            .collect::<Vec<_>>()
            .join(", ");
        let color = if row.remaining > 0 { RED } else { GREEN };
        println_colored!(
            color,
            "  {}  owed {}  paid {}  remaining {}  [{}]",
            format_date(row.date),
            format_money(row.total_fine, currency),
            format_money(row.paid, currency),
            format_money(row.remaining, currency),
            missed
        );
    }
    println!();
    println_colored!(BOLD, "  Outstanding: {}", format_money(outstanding, currency));
    println!();
    Ok(())
}

pub fn handle_pay(
    tracker: &mut AppTracker,
    amount: i64,
    from: Option<&str>,
    to: Option<&str>,
    method: Option<&str>,
) -> Result<()> {
    let start = date_or_today(from)?;
    let end = match to {
        Some(d) => parse_date(d)?,
        None => start,
    };
    tracker.record_payment(amount, DateRange::new(start, end), method.map(str::to_string))?;
    Ok(())
}

pub fn handle_payments(tracker: &AppTracker, config: &AppConfig) -> Result<()> {
    let payments = tracker.payments()?;
    let currency = &config.fines.currency;

    println!();
    println_colored!(GOLD, "  Payments ({})", payments.len());
    println!();
    for p in payments.records().iter().rev() {
        println!(
            "  {}  {:>10}  {}  {}",
            p.paid_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            format_money(p.amount, currency),
            p.covered_range,
            p.method.as_deref().unwrap_or("-")
        );
    }
    println!();
    println_colored!(BOLD, "  Total paid: {}", format_money(payments.total_paid(), currency));
    println!();
    Ok(())
}

// ─── Export ──────────────────────────────────────────────────────────────────

pub fn handle_export(tracker: &AppTracker, config: &AppConfig) -> Result<()> {
    let today = today();
    let week = RangePreset::ThisWeek.resolve(today, config.display.week_start);
    let history = tracker.history()?;
    let payments = tracker.payments()?;
    let currency = &config.fines.currency;

    let week_history = reports::filter_history(&history, &week, Visibility::default());
    let stats = reports::compute_stats(&week_history);
    let streak = reports::streak(&history);
    let daily = reports::weekly_overview(&history, &week);
    let outstanding = reports::outstanding_fine(&history, &payments, &week);

    println!("# fardh — Weekly Summary");
    println!("# {}", format_date(today));
    println!();
    println!("Location: {}", config.salah.location_name);
    println!("Week:     {}", week);
    println!();
    println!("## Prayer Completion");
    for stat in &daily {
        println!(
            "  {}  {}/{}  {}",
            format_date(stat.date),
            stat.prayers_done,
            stat.prayers_total,
            progress_bar(stat.prayers_done, stat.prayers_total, 5)
        );
    }
    println!();
    println!("## Last 30 days");
    let trend = reports::trend(&history, today, 30);
    let recorded = trend.iter().filter(|p| p.completion_rate > 0.0).count();
    let fines = trend.iter().map(|p| p.fine).fold(0, i64::saturating_add);
    println!("  Days with prayers: {}/{}", recorded, trend.len());
    println!("  Fines accrued:     {}", format_money(fines, currency));
    println!();
    println!("## Summary");
    println!("  Completion:  {}", format_percent(stats.completion_rate));
    println!("  Streak:      {} days (best: {})", streak.current, streak.longest);
    if let Some(date) = streak.last_completed {
        println!("  Last full:   {}", format_date(date));
    }
    println!("  Fines owed:  {}", format_money(outstanding, currency));
    Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    io::stdout().flush()?;
    let mut buf = String::new();
    io::stdin().lock().read_line(&mut buf)?;
    Ok(buf.trim_end_matches('\n').trim_end_matches('\r').to_string())
}

fn prompt_or(label: &str, current: &str) -> Result<String> {
    let answer = prompt(&format!("  {} [{}]: ", label, current))?;
    let answer = answer.trim();
    Ok(if answer.is_empty() {
        current.to_string()
    } else {
        answer.to_string()
    })
}

fn prompt_parsed<T>(label: &str, current: T) -> Result<T>
where
    T: FromStr + std::fmt::Display,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let answer = prompt_or(label, &current.to_string())?;
    answer
        .parse()
        .with_context(|| format!("Invalid value for {}: '{}'", label, answer))
}
