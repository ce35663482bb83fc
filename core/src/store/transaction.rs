use super::{parse_column, SimStore};
use crate::{error::SimResult, sink::TransactionRecord, types::BusinessLine};
use rusqlite::{params, Connection};

pub(super) fn insert_transaction(conn: &Connection, run_id: &str, t: &TransactionRecord) -> SimResult<()> {
    conn.execute(
        "INSERT INTO txn (
            run_id, transaction_id, customer_id, transaction_date, amount,
            transaction_type, business_line, description, is_suspicious
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            run_id,
            &t.transaction_id,
            &t.customer_id,
            t.date,
            t.amount,
            t.transaction_type.label(),
            t.business_line.code(),
            &t.description,
            t.is_suspicious,
        ],
    )?;
    Ok(())
}

impl SimStore {
    pub fn txn_count_total(&self, run_id: &str) -> SimResult<i64> {
        let n = self.conn.query_row(
            "SELECT COUNT(*) FROM txn WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    pub fn txn_count_for_customer(&self, run_id: &str, customer_id: &str) -> SimResult<i64> {
        let n = self.conn.query_row(
            "SELECT COUNT(*) FROM txn WHERE run_id = ?1 AND customer_id = ?2",
            params![run_id, customer_id],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    /// A customer's transactions in generation order.
    pub fn transactions_for_customer(
        &self,
        run_id: &str,
        customer_id: &str,
    ) -> SimResult<Vec<TransactionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT transaction_id, customer_id, transaction_date, amount,
                    transaction_type, business_line, description, is_suspicious
             FROM txn WHERE run_id = ?1 AND customer_id = ?2
             ORDER BY rowid ASC",
        )?;
        let rows = stmt.query_map(params![run_id, customer_id], |row| {
            Ok(TransactionRecord {
                transaction_id: row.get(0)?,
                customer_id: row.get(1)?,
                date: row.get(2)?,
                amount: row.get(3)?,
                transaction_type: parse_column(row, 4)?,
                business_line: parse_column(row, 5)?,
                description: row.get(6)?,
                is_suspicious: row.get(7)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn all_txn_amounts(&self, run_id: &str) -> SimResult<Vec<f64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT amount FROM txn WHERE run_id = ?1 ORDER BY rowid ASC")?;
        let rows = stmt.query_map(params![run_id], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn txn_amounts_for_line(&self, run_id: &str, line: BusinessLine) -> SimResult<Vec<f64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT amount FROM txn WHERE run_id = ?1 AND business_line = ?2")?;
        let rows = stmt.query_map(params![run_id, line.code()], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn suspicious_txn_count(&self, run_id: &str) -> SimResult<i64> {
        let n = self.conn.query_row(
            "SELECT COUNT(*) FROM txn WHERE run_id = ?1 AND is_suspicious = 1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(n)
    }
}
