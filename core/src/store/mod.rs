//! SQLite persistence layer.
//!
//! RULE: Only the store module talks to the database.
//! Stages write through the RecordSink trait, implemented here by a
//! per-customer `CustomerSession`; they never execute SQL directly.

use crate::{
    error::SimResult,
    event::FlowEvent,
    sink::{CustomerRecord, FlagReport, KycRecord, RecordSink, ScreeningLogEntry, TransactionRecord},
};
use chrono::NaiveDate;
use rusqlite::{params, types::Type, Connection, Row, Transaction};
use std::str::FromStr;

mod compliance;
mod customer;
mod event_log;
mod transaction;

pub use compliance::KycRow;

pub struct SimStore {
    conn: Connection,
}

impl SimStore {
    /// Open (or create) the simulation database at `path`.
    pub fn open(path: &str) -> SimResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode only for real files (:memory: ignores it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> SimResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> SimResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_bank.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    /// Register a run. `started_at` is in Unix seconds.
    pub fn insert_run(&self, run_id: &str, seed: u64, version: &str, started_at: u64) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO run (run_id, seed, version, started_at) VALUES (?1, ?2, ?3, ?4)",
            params![run_id, seed as i64, version, started_at as i64],
        )?;
        Ok(())
    }

    /// Unix seconds recorded when the run was registered.
    pub fn run_started_at(&self, run_id: &str) -> SimResult<u64> {
        let secs: i64 = self.conn.query_row(
            "SELECT started_at FROM run WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(secs as u64)
    }

    pub fn run_seed(&self, run_id: &str) -> SimResult<u64> {
        let seed: i64 = self.conn.query_row(
            "SELECT seed FROM run WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(seed as u64)
    }

    /// Append an event that belongs to the run rather than a customer.
    pub fn append_run_event(&self, run_id: &str, event: &FlowEvent) -> SimResult<()> {
        event_log::append(&self.conn, run_id, None, 0, event)
    }

    // ── Sessions ───────────────────────────────────────────────

    /// Begin a storage session scoped to one customer's simulation.
    /// Writes become visible on `commit`; dropping the session
    /// without committing discards everything it wrote.
    pub fn session<'a>(&'a self, run_id: &'a str) -> SimResult<CustomerSession<'a>> {
        let tx = self.conn.unchecked_transaction()?;
        Ok(CustomerSession { tx, run_id })
    }
}

/// One customer's writes, applied atomically.
pub struct CustomerSession<'a> {
    tx: Transaction<'a>,
    run_id: &'a str,
}

impl CustomerSession<'_> {
    pub fn commit(self) -> SimResult<()> {
        self.tx.commit()?;
        Ok(())
    }
}

impl RecordSink for CustomerSession<'_> {
    fn insert_customer(&mut self, c: &CustomerRecord) -> SimResult<()> {
        customer::insert_customer(&self.tx, self.run_id, c)
    }

    fn insert_kyc(&mut self, kyc: &KycRecord) -> SimResult<()> {
        compliance::insert_kyc(&self.tx, self.run_id, kyc)
    }

    fn insert_screening_log(&mut self, entry: &ScreeningLogEntry) -> SimResult<()> {
        compliance::insert_screening_log(&self.tx, self.run_id, entry)
    }

    fn insert_transaction(&mut self, txn: &TransactionRecord) -> SimResult<()> {
        transaction::insert_transaction(&self.tx, self.run_id, txn)
    }

    fn update_kyc_flag(&mut self, customer_id: &str, is_flagged: bool) -> SimResult<()> {
        compliance::update_kyc_flag(&self.tx, self.run_id, customer_id, is_flagged)
    }

    fn update_kyc_last_screening_date(&mut self, customer_id: &str, date: NaiveDate) -> SimResult<()> {
        compliance::update_kyc_last_screening_date(&self.tx, self.run_id, customer_id, date)
    }

    fn insert_flag_report(&mut self, report: &FlagReport) -> SimResult<()> {
        compliance::insert_flag_report(&self.tx, self.run_id, report)
    }

    fn append_event(&mut self, customer_id: Option<&str>, step: u32, event: &FlowEvent) -> SimResult<()> {
        event_log::append(&self.tx, self.run_id, customer_id, step, event)
    }
}

/// Read a TEXT column holding one of the crate's named enums.
fn parse_column<T: FromStr<Err = String>>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e: String| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}
