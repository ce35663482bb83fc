use super::{parse_column, SimStore};
use crate::{
    error::SimResult,
    sink::{FlagReport, KycRecord, ScreeningLogEntry},
    types::{FlagReason, RiskLevel},
};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

/// Stored KYC state, including the mutable flag.
#[derive(Debug, Clone, PartialEq)]
pub struct KycRow {
    pub customer_id: String,
    pub risk_level: RiskLevel,
    pub identity_verified: bool,
    pub address_verified: bool,
    pub last_screening_date: Option<NaiveDate>,
    pub is_flagged: bool,
}

// ── KYC ───────────────────────────────────────────────────────

pub(super) fn insert_kyc(conn: &Connection, run_id: &str, k: &KycRecord) -> SimResult<()> {
    conn.execute(
        "INSERT INTO kyc (
            run_id, customer_id, risk_level, identity_verified,
            address_verified, last_screening_date
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            run_id,
            &k.customer_id,
            k.risk_level.as_str(),
            k.identity_verified,
            k.address_verified,
            k.last_screening_date,
        ],
    )?;
    Ok(())
}

pub(super) fn update_kyc_flag(
    conn: &Connection,
    run_id: &str,
    customer_id: &str,
    is_flagged: bool,
) -> SimResult<()> {
    conn.execute(
        "UPDATE kyc SET is_flagged = ?1 WHERE run_id = ?2 AND customer_id = ?3",
        params![is_flagged, run_id, customer_id],
    )?;
    Ok(())
}

pub(super) fn update_kyc_last_screening_date(
    conn: &Connection,
    run_id: &str,
    customer_id: &str,
    date: NaiveDate,
) -> SimResult<()> {
    conn.execute(
        "UPDATE kyc SET last_screening_date = ?1 WHERE run_id = ?2 AND customer_id = ?3",
        params![date, run_id, customer_id],
    )?;
    Ok(())
}

// ── Screening log ─────────────────────────────────────────────

pub(super) fn insert_screening_log(
    conn: &Connection,
    run_id: &str,
    s: &ScreeningLogEntry,
) -> SimResult<()> {
    conn.execute(
        "INSERT INTO screening_log (
            run_id, customer_id, screening_type, screening_date, result, details
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            run_id,
            &s.customer_id,
            s.screening_type.as_str(),
            s.screening_date,
            s.result.as_str(),
            &s.details,
        ],
    )?;
    Ok(())
}

// ── Flag reports ──────────────────────────────────────────────

pub(super) fn insert_flag_report(conn: &Connection, run_id: &str, r: &FlagReport) -> SimResult<()> {
    conn.execute(
        "INSERT INTO flag_report (run_id, customer_id, flag_date, reason)
         VALUES (?1, ?2, ?3, ?4)",
        params![run_id, &r.customer_id, r.flag_date, r.reason.as_str()],
    )?;
    Ok(())
}

impl SimStore {
    pub fn kyc_for_customer(&self, run_id: &str, customer_id: &str) -> SimResult<Option<KycRow>> {
        let row = self
            .conn
            .query_row(
                "SELECT customer_id, risk_level, identity_verified, address_verified,
                        last_screening_date, is_flagged
                 FROM kyc WHERE run_id = ?1 AND customer_id = ?2",
                params![run_id, customer_id],
                |row| {
                    Ok(KycRow {
                        customer_id: row.get(0)?,
                        risk_level: parse_column(row, 1)?,
                        identity_verified: row.get(2)?,
                        address_verified: row.get(3)?,
                        last_screening_date: row.get(4)?,
                        is_flagged: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    pub fn screening_logs_for_customer(
        &self,
        run_id: &str,
        customer_id: &str,
    ) -> SimResult<Vec<ScreeningLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT customer_id, screening_type, screening_date, result, details
             FROM screening_log WHERE run_id = ?1 AND customer_id = ?2
             ORDER BY log_id ASC",
        )?;
        let rows = stmt.query_map(params![run_id, customer_id], |row| {
            Ok(ScreeningLogEntry {
                customer_id: row.get(0)?,
                screening_type: parse_column(row, 1)?,
                screening_date: row.get(2)?,
                result: parse_column(row, 3)?,
                details: row.get(4)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn flag_reports(&self, run_id: &str) -> SimResult<Vec<FlagReport>> {
        let mut stmt = self.conn.prepare(
            "SELECT customer_id, flag_date, reason
             FROM flag_report WHERE run_id = ?1 ORDER BY report_id ASC",
        )?;
        let rows = stmt.query_map(params![run_id], |row| {
            Ok(FlagReport {
                customer_id: row.get(0)?,
                flag_date: row.get(1)?,
                reason: parse_column(row, 2)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn flag_report_count(&self, run_id: &str, customer_id: &str) -> SimResult<i64> {
        let n = self.conn.query_row(
            "SELECT COUNT(*) FROM flag_report WHERE run_id = ?1 AND customer_id = ?2",
            params![run_id, customer_id],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    pub fn flag_count_by_reason(&self, run_id: &str, reason: FlagReason) -> SimResult<i64> {
        let n = self.conn.query_row(
            "SELECT COUNT(*) FROM flag_report WHERE run_id = ?1 AND reason = ?2",
            params![run_id, reason.as_str()],
            |row| row.get(0),
        )?;
        Ok(n)
    }
}
