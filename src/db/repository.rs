use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::models::{
    DailyRecord, DateRange, History, Payment, PaymentHistory, Prayer, PrayerType, PrayerWindow,
};
use crate::tracker::RecordStore;

fn parse_time(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|e| anyhow!("Bad time '{}': {}", s, e))
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| anyhow!("Bad date '{}': {}", s, e))
}

fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

// ─── Prayer repo ─────────────────────────────────────────────────────────────

pub struct PrayerRepo;

impl PrayerRepo {
    pub fn get_all(conn: &Connection) -> Result<History> {
        let mut stmt = conn.prepare(
            "SELECT date, name, start_time, end_time, completed, reason, fine_amount
             FROM prayers
             ORDER BY date, CASE name
               WHEN 'fajr' THEN 1 WHEN 'dhuhr' THEN 2 WHEN 'asr' THEN 3
               WHEN 'maghrib' THEN 4 WHEN 'isha' THEN 5 END",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i32>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, i64>(6)?,
            ))
        })?;

        let mut by_date: BTreeMap<NaiveDate, Vec<Prayer>> = BTreeMap::new();
        for r in rows {
            let (date, name, start, end, completed, reason, fine_amount) = r?;
            by_date.entry(parse_date(&date)?).or_default().push(Prayer {
                name: PrayerType::from_str(&name)?,
                window: PrayerWindow {
                    start: parse_time(&start)?,
                    end: parse_time(&end)?,
                },
                completed: completed != 0,
                reason,
                fine_amount,
            });
        }

        Ok(by_date
            .into_iter()
            .map(|(date, prayers)| (date, DailyRecord::from_prayers(date, prayers)))
            .collect())
    }

    pub fn upsert_day(conn: &Connection, day: &DailyRecord) -> Result<()> {
        let date = date_key(day.date());
        for p in day.prayers() {
            conn.execute(
                "INSERT INTO prayers (date, name, start_time, end_time, completed, reason, fine_amount)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(date, name) DO UPDATE SET
                    start_time = ?3, end_time = ?4, completed = ?5, reason = ?6,
                    fine_amount = ?7, updated_at = datetime('now')",
                params![
                    date,
                    p.name.as_str(),
                    p.window.start.format("%H:%M").to_string(),
                    p.window.end.format("%H:%M").to_string(),
                    p.completed as i32,
                    p.reason,
                    p.fine_amount,
                ],
            )?;
        }
        Ok(())
    }
}

// ─── Payment repo ────────────────────────────────────────────────────────────

pub struct PaymentRepo;

impl PaymentRepo {
    pub fn get_all(conn: &Connection) -> Result<PaymentHistory> {
        let mut stmt = conn.prepare(
            "SELECT id, amount, paid_at, range_start, range_end, method
             FROM payments ORDER BY paid_at, id",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })?;

        let mut records = Vec::new();
        for r in rows {
            let (id, amount, paid_at, start, end, method) = r?;
            records.push(Payment {
                id,
                amount,
                paid_at: DateTime::parse_from_rfc3339(&paid_at)
                    .with_context(|| format!("Bad payment timestamp '{}'", paid_at))?
                    .with_timezone(&Utc),
                covered_range: DateRange::new(parse_date(&start)?, parse_date(&end)?),
                method,
            });
        }
        Ok(PaymentHistory::from(records))
    }

    /// Payments are append-only: an id already stored is never rewritten.
    pub fn insert(conn: &Connection, payment: &Payment) -> Result<()> {
        conn.execute(
            "INSERT OR IGNORE INTO payments (id, amount, paid_at, range_start, range_end, method)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                payment.id,
                payment.amount,
                payment.paid_at.to_rfc3339(),
                date_key(payment.covered_range.start),
                date_key(payment.covered_range.end),
                payment.method,
            ],
        )?;
        Ok(())
    }
}

// ─── App meta ────────────────────────────────────────────────────────────────

pub struct MetaRepo;

impl MetaRepo {
    pub fn get(conn: &Connection, key: &str) -> Result<Option<String>> {
        conn.query_row(
            "SELECT value FROM app_meta WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(anyhow::Error::from)
    }

    pub fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
        conn.execute(
            "INSERT INTO app_meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }
}

// ─── Store ───────────────────────────────────────────────────────────────────

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl RecordStore for SqliteStore {
    fn load_history(&self) -> Result<History> {
        let history = PrayerRepo::get_all(&self.conn)?;
        log::debug!("loaded {} days", history.len());
        Ok(history)
    }

    fn save_history(&mut self, history: &History) -> Result<()> {
        let tx = self.conn.transaction()?;
        for day in history.values() {
            PrayerRepo::upsert_day(&tx, day)?;
        }
        tx.commit()?;
        log::debug!("saved {} days", history.len());
        Ok(())
    }

    fn load_payments(&self) -> Result<PaymentHistory> {
        PaymentRepo::get_all(&self.conn)
    }

    fn save_payments(&mut self, payments: &PaymentHistory) -> Result<()> {
        let tx = self.conn.transaction()?;
        for payment in payments.records() {
            PaymentRepo::insert(&tx, payment)?;
        }
        tx.commit()?;
        log::debug!("saved {} payments", payments.len());
        Ok(())
    }
}
