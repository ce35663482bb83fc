use super::{parse_column, SimStore};
use crate::{error::SimResult, sink::CustomerRecord};
use rusqlite::{params, Connection};

// ── Customer ──────────────────────────────────────────────────

pub(super) fn insert_customer(conn: &Connection, run_id: &str, c: &CustomerRecord) -> SimResult<()> {
    conn.execute(
        "INSERT INTO customer (
            run_id, customer_id, first_name, last_name, date_of_birth,
            nationality, residence_country, business_line
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            run_id,
            &c.customer_id,
            &c.first_name,
            &c.last_name,
            c.date_of_birth,
            &c.nationality,
            &c.residence_country,
            c.business_line.code(),
        ],
    )?;
    Ok(())
}

impl SimStore {
    pub fn customer_count(&self, run_id: &str) -> SimResult<i64> {
        let n = self.conn.query_row(
            "SELECT COUNT(*) FROM customer WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    /// All customers of a run in insertion order.
    pub fn customers(&self, run_id: &str) -> SimResult<Vec<CustomerRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT customer_id, first_name, last_name, date_of_birth,
                    nationality, residence_country, business_line
             FROM customer WHERE run_id = ?1 ORDER BY rowid ASC",
        )?;
        let rows = stmt.query_map(params![run_id], |row| {
            Ok(CustomerRecord {
                customer_id: row.get(0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
                date_of_birth: row.get(3)?,
                nationality: row.get(4)?,
                residence_country: row.get(5)?,
                business_line: parse_column(row, 6)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
