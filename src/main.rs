mod cli;
mod config;
mod db;
mod error;
mod models;
mod prayer_times;
mod reports;
mod tracker;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use rusqlite::Connection;

use cli::args::{Cli, Commands};
use cli::handlers::{self, AppTracker};
use config::AppConfig;
use db::migrations::run_migrations;
use db::repository::MetaRepo;
use db::SqliteStore;
use models::DayTemplate;
use prayer_times::PrayerCalculator;
use reports::Visibility;
use tracker::{DayFactory, Tracker};

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut config = AppConfig::load().context("Loading config")?;

    // Ensure data directory exists and open DB
    AppConfig::ensure_data_dir()?;
    let db_path = AppConfig::db_path()?;
    let conn = Connection::open(&db_path)
        .with_context(|| format!("Opening database at {:?}", db_path))?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    run_migrations(&conn)?;

    if let Some(Commands::Setup { reset }) = cli.command {
        return handlers::handle_setup(&conn, &mut config, reset);
    }
    ensure_setup(&conn, &mut config)?;

    let mut tracker: AppTracker = Tracker::new(SqliteStore::new(conn), day_factory(&config));
    let currency = config.fines.currency.clone();
    tracker.subscribe(move |change| handlers::render_change(change, &currency));

    match cli.command {
        None => handlers::handle_today(&tracker, &config)?,
        Some(Commands::Times) => handlers::handle_times(&config)?,
        Some(Commands::Mark {
            prayer,
            missed,
            reason,
            date,
        }) => handlers::handle_mark(
            &mut tracker,
            &config,
            &prayer,
            missed,
            reason.as_deref(),
            date.as_deref(),
        )?,
        Some(Commands::Window {
            prayer,
            start,
            end,
            date,
        }) => handlers::handle_window(&mut tracker, &prayer, &start, &end, date.as_deref())?,
        Some(Commands::History {
            period,
            hide_completed,
            hide_missed,
        }) => handlers::handle_history(
            &tracker,
            &config,
            &period,
            Visibility {
                show_completed: !hide_completed,
                show_missed: !hide_missed,
            },
        )?,
        Some(Commands::Stats { period, json }) => {
            handlers::handle_stats(&tracker, &config, &period, json)?
        }
        Some(Commands::Fines { period }) => handlers::handle_fines(&tracker, &config, &period)?,
        Some(Commands::Pay {
            amount,
            from,
            to,
            method,
        }) => handlers::handle_pay(
            &mut tracker,
            amount,
            from.as_deref(),
            to.as_deref(),
            method.as_deref(),
        )?,
        Some(Commands::Payments) => handlers::handle_payments(&tracker, &config)?,
        Some(Commands::Export) => handlers::handle_export(&tracker, &config)?,
        Some(Commands::Setup { .. }) => unreachable!(),
    }

    Ok(())
}

/// Check if setup has been done; if not, run the wizard automatically.
fn ensure_setup(conn: &Connection, config: &mut AppConfig) -> Result<()> {
    let done = MetaRepo::get(conn, "setup_done")?;
    if done.as_deref() != Some("1") {
        eprintln!("No configuration found. Running setup...");
        eprintln!();
        handlers::handle_setup(conn, config, false)?;
    }
    Ok(())
}

/// New days take their fines from config and their windows from the
/// prayer-time calculator, falling back to fixed defaults.
fn day_factory(config: &AppConfig) -> DayFactory {
    let fines = config.fines.per_prayer();
    let calc = match PrayerCalculator::from_config(&config.salah) {
        Ok(calc) => Some(calc),
        Err(e) => {
            log::warn!("prayer times unavailable, using default windows: {}", e);
            None
        }
    };

    Box::new(move |date| {
        let windows = calc
            .as_ref()
            .and_then(|c| match c.windows_for_date(date) {
                Ok(w) => Some(w),
                Err(e) => {
                    log::warn!("no prayer windows for {}: {}", date, e);
                    None
                }
            })
            .unwrap_or_default();
        DayTemplate {
            fines: fines.clone(),
            windows,
        }
        .record_for(date)
    })
}
