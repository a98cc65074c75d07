//! SQLite-backed ledger of balances, VIP flags, daily completions and settings.
//!
//! Only this module talks to the database. One connection behind a mutex is
//! the single writer for the process; every write runs in an IMMEDIATE
//! transaction so other processes sharing the file serialize behind it too.

use crate::errors::{LedgerError, LedgerResult};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, types::Type, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::{
    path::Path,
    sync::{Mutex, MutexGuard},
    time::Duration,
};
use tracing::{debug, info};

pub const MAX_BALANCE: i64 = 1_000_000;
pub const EVENT_SETTING_KEY: &str = "double_bp_event";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const PRAGMAS: &str = "
    PRAGMA synchronous=NORMAL;
    PRAGMA cache_size=-10000;
    PRAGMA temp_store=MEMORY;
";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        user_id TEXT PRIMARY KEY,
        vip     INTEGER NOT NULL DEFAULT 0,
        balance INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS completions (
        user_id      TEXT    NOT NULL,
        activity_id  TEXT    NOT NULL,
        day          TEXT    NOT NULL,
        completed_at TEXT    NOT NULL,
        bp_awarded   INTEGER NOT NULL,
        PRIMARY KEY (user_id, activity_id, day)
    );

    CREATE INDEX IF NOT EXISTS idx_completions_user_day
        ON completions(user_id, day, completed_at);

    CREATE TABLE IF NOT EXISTS settings (
        key     TEXT    PRIMARY KEY,
        value   TEXT    NOT NULL,
        version INTEGER NOT NULL DEFAULT 1
    );
";

/// One user having completed one activity on one activity day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRecord {
    pub activity_id: String,
    pub day: NaiveDate,
    pub completed_at: DateTime<Utc>,
    /// BP credited when the record was created; refunded verbatim on removal.
    pub bp_awarded: i64,
}

/// Everything the views need for one user and day, read in one transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserSnapshot {
    pub balance: i64,
    pub vip: bool,
    pub event_active: bool,
    /// Most recently completed first.
    pub completed: Vec<String>,
}

pub struct Ledger {
    conn: Mutex<Connection>,
}

impl Ledger {
    pub fn open(path: &Path) -> LedgerResult<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let journal_mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.execute_batch(PRAGMAS)?;
        debug!(journal_mode = %journal_mode, "ledger pragmas applied");
        info!("opened ledger at {}", path.display());
        Self::init(conn)
    }

    /// Open a private in-memory ledger (used in tests).
    pub fn in_memory() -> LedgerResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> LedgerResult<Self> {
        conn.execute_batch(SCHEMA)?;
        debug!("ledger schema ready");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> LedgerResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| LedgerError::LockPoisoned)
    }

    /// Run `f` inside one write transaction. Nothing is committed unless `f`
    /// returns `Ok`.
    pub fn write<T>(&self, f: impl FnOnce(&LedgerTx<'_>) -> LedgerResult<T>) -> LedgerResult<T> {
        let mut conn = self.lock()?;
        let tx = LedgerTx {
            tx: conn.transaction_with_behavior(TransactionBehavior::Immediate)?,
        };
        let value = f(&tx)?;
        tx.tx.commit()?;
        Ok(value)
    }

    /// Run `f` against a consistent read snapshot.
    pub fn read<T>(&self, f: impl FnOnce(&LedgerTx<'_>) -> LedgerResult<T>) -> LedgerResult<T> {
        let mut conn = self.lock()?;
        let tx = LedgerTx {
            tx: conn.transaction_with_behavior(TransactionBehavior::Deferred)?,
        };
        f(&tx)
    }

    // ── Users ──────────────────────────────────────────────────

    pub fn get_balance(&self, user_id: &str) -> LedgerResult<i64> {
        self.read(|tx| tx.balance(user_id))
    }

    pub fn adjust_balance(&self, user_id: &str, delta: i64) -> LedgerResult<i64> {
        self.write(|tx| tx.adjust_balance(user_id, delta))
    }

    pub fn set_balance(&self, user_id: &str, amount: i64) -> LedgerResult<i64> {
        validate_balance(amount)?;
        self.write(|tx| tx.set_balance(user_id, amount))
    }

    pub fn get_vip(&self, user_id: &str) -> LedgerResult<bool> {
        self.read(|tx| tx.vip(user_id))
    }

    pub fn set_vip(&self, user_id: &str, vip: bool) -> LedgerResult<bool> {
        self.write(|tx| tx.set_vip(user_id, vip))
    }

    // ── Completions ────────────────────────────────────────────

    pub fn is_completed(&self, user_id: &str, activity_id: &str, day: NaiveDate) -> LedgerResult<bool> {
        self.read(|tx| Ok(tx.completion(user_id, activity_id, day)?.is_some()))
    }

    pub fn completion(
        &self,
        user_id: &str,
        activity_id: &str,
        day: NaiveDate,
    ) -> LedgerResult<Option<CompletionRecord>> {
        self.read(|tx| tx.completion(user_id, activity_id, day))
    }

    /// Raw completion flag write with no balance effect. Setting the current
    /// state again changes nothing. Returns whether a record was added or removed.
    pub fn set_completed(
        &self,
        user_id: &str,
        activity_id: &str,
        day: NaiveDate,
        completed: bool,
        at: DateTime<Utc>,
    ) -> LedgerResult<bool> {
        self.write(|tx| {
            if completed {
                tx.insert_completion(user_id, activity_id, day, at, 0)
            } else {
                Ok(tx.delete_completion(user_id, activity_id, day)?.is_some())
            }
        })
    }

    pub fn completed_activities(&self, user_id: &str, day: NaiveDate) -> LedgerResult<Vec<String>> {
        self.read(|tx| tx.completed_activities(user_id, day))
    }

    pub fn snapshot(&self, user_id: &str, day: NaiveDate) -> LedgerResult<UserSnapshot> {
        self.read(|tx| {
            Ok(UserSnapshot {
                balance: tx.balance(user_id)?,
                vip: tx.vip(user_id)?,
                event_active: tx.event_active()?,
                completed: tx.completed_activities(user_id, day)?,
            })
        })
    }

    // ── Settings ───────────────────────────────────────────────

    pub fn get_event_active(&self) -> LedgerResult<bool> {
        self.read(|tx| tx.event_active())
    }

    /// Current event flag and the version of its settings row (0 if never written).
    pub fn event_setting(&self) -> LedgerResult<(bool, i64)> {
        self.read(|tx| tx.event_setting())
    }

    pub fn set_event_active(&self, active: bool) -> LedgerResult<bool> {
        let version = self.write(|tx| tx.set_setting(EVENT_SETTING_KEY, &active.to_string()))?;
        info!(active, version, "double BP event updated");
        Ok(active)
    }

    /// Write the event flag only if it has never been set; returns the effective value.
    pub fn seed_event_active(&self, active: bool) -> LedgerResult<bool> {
        self.write(|tx| {
            let (current, version) = tx.event_setting()?;
            if version > 0 {
                return Ok(current);
            }
            tx.set_setting(EVENT_SETTING_KEY, &active.to_string())?;
            info!(active, "seeded double BP event flag");
            Ok(active)
        })
    }

    // ── Maintenance ────────────────────────────────────────────

    pub fn optimize(&self) -> LedgerResult<()> {
        let conn = self.lock()?;
        conn.execute_batch("ANALYZE; VACUUM;")?;
        info!("ledger optimized");
        Ok(())
    }
}

pub fn validate_balance(amount: i64) -> LedgerResult<()> {
    if amount < 0 {
        return Err(LedgerError::validation("Amount cannot be negative"));
    }
    if amount > MAX_BALANCE {
        return Err(LedgerError::validation("Amount cannot exceed 1,000,000"));
    }
    Ok(())
}

/// Statement-level access inside an open transaction.
pub struct LedgerTx<'conn> {
    tx: Transaction<'conn>,
}

impl LedgerTx<'_> {
    pub fn balance(&self, user_id: &str) -> LedgerResult<i64> {
        let balance = self
            .tx
            .query_row(
                "SELECT balance FROM users WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(balance.unwrap_or(0))
    }

    pub fn adjust_balance(&self, user_id: &str, delta: i64) -> LedgerResult<i64> {
        let balance: i64 = self.tx.query_row(
            "INSERT INTO users (user_id, balance) VALUES (?1, ?2)
             ON CONFLICT(user_id) DO UPDATE SET balance = balance + excluded.balance
             RETURNING balance",
            params![user_id, delta],
            |row| row.get(0),
        )?;
        info!(user_id, delta, balance, "balance adjusted");
        Ok(balance)
    }

    pub fn set_balance(&self, user_id: &str, amount: i64) -> LedgerResult<i64> {
        let balance: i64 = self.tx.query_row(
            "INSERT INTO users (user_id, balance) VALUES (?1, ?2)
             ON CONFLICT(user_id) DO UPDATE SET balance = excluded.balance
             RETURNING balance",
            params![user_id, amount],
            |row| row.get(0),
        )?;
        info!(user_id, balance, "balance set");
        Ok(balance)
    }

    pub fn vip(&self, user_id: &str) -> LedgerResult<bool> {
        let vip = self
            .tx
            .query_row(
                "SELECT vip FROM users WHERE user_id = ?1",
                params![user_id],
                |row| row.get::<_, bool>(0),
            )
            .optional()?;
        Ok(vip.unwrap_or(false))
    }

    pub fn set_vip(&self, user_id: &str, vip: bool) -> LedgerResult<bool> {
        self.tx.execute(
            "INSERT INTO users (user_id, vip) VALUES (?1, ?2)
             ON CONFLICT(user_id) DO UPDATE SET vip = excluded.vip",
            params![user_id, vip],
        )?;
        info!(user_id, vip, "vip status set");
        Ok(vip)
    }

    pub fn completion(
        &self,
        user_id: &str,
        activity_id: &str,
        day: NaiveDate,
    ) -> LedgerResult<Option<CompletionRecord>> {
        let record = self
            .tx
            .query_row(
                "SELECT completed_at, bp_awarded FROM completions
                 WHERE user_id = ?1 AND activity_id = ?2 AND day = ?3",
                params![user_id, activity_id, day_key(day)],
                |row| {
                    Ok(CompletionRecord {
                        activity_id: activity_id.to_string(),
                        day,
                        completed_at: parse_timestamp(0, row.get(0)?)?,
                        bp_awarded: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    /// Returns false if the record already existed; the stored one is kept.
    pub fn insert_completion(
        &self,
        user_id: &str,
        activity_id: &str,
        day: NaiveDate,
        at: DateTime<Utc>,
        bp_awarded: i64,
    ) -> LedgerResult<bool> {
        let inserted = self.tx.execute(
            "INSERT INTO completions (user_id, activity_id, day, completed_at, bp_awarded)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(user_id, activity_id, day) DO NOTHING",
            params![user_id, activity_id, day_key(day), timestamp_key(at), bp_awarded],
        )?;
        if inserted == 1 {
            info!(user_id, activity_id, %day, bp_awarded, "activity completed");
        }
        Ok(inserted == 1)
    }

    /// Removes the record and hands it back, if there was one.
    pub fn delete_completion(
        &self,
        user_id: &str,
        activity_id: &str,
        day: NaiveDate,
    ) -> LedgerResult<Option<CompletionRecord>> {
        let record = self.completion(user_id, activity_id, day)?;
        if record.is_some() {
            self.tx.execute(
                "DELETE FROM completions WHERE user_id = ?1 AND activity_id = ?2 AND day = ?3",
                params![user_id, activity_id, day_key(day)],
            )?;
            info!(user_id, activity_id, %day, "activity uncompleted");
        }
        Ok(record)
    }

    pub fn completed_activities(&self, user_id: &str, day: NaiveDate) -> LedgerResult<Vec<String>> {
        let mut stmt = self.tx.prepare(
            "SELECT activity_id FROM completions
             WHERE user_id = ?1 AND day = ?2
             ORDER BY completed_at DESC, activity_id",
        )?;
        let rows = stmt.query_map(params![user_id, day_key(day)], |row| row.get(0))?;
        rows.collect::<Result<Vec<String>, _>>().map_err(Into::into)
    }

    pub fn event_active(&self) -> LedgerResult<bool> {
        Ok(self.event_setting()?.0)
    }

    pub fn event_setting(&self) -> LedgerResult<(bool, i64)> {
        let setting = self
            .tx
            .query_row(
                "SELECT value, version FROM settings WHERE key = ?1",
                params![EVENT_SETTING_KEY],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;
        Ok(match setting {
            Some((value, version)) => (value.eq_ignore_ascii_case("true"), version),
            None => (false, 0),
        })
    }

    /// Upsert a settings row, bumping its version. Returns the new version.
    pub fn set_setting(&self, key: &str, value: &str) -> LedgerResult<i64> {
        let version = self.tx.query_row(
            "INSERT INTO settings (key, value, version) VALUES (?1, ?2, 1)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, version = version + 1
             RETURNING version",
            params![key, value],
            |row| row.get(0),
        )?;
        Ok(version)
    }
}

fn day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

// Fixed-width UTC so lexical order matches chronological order.
fn timestamp_key(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(column: usize, text: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&text)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err)))
}
