use super::SimStore;
use crate::{
    error::SimResult,
    event::{EventLogEntry, FlowEvent},
};
use rusqlite::{params, Connection};

pub(super) fn append(
    conn: &Connection,
    run_id: &str,
    customer_id: Option<&str>,
    step: u32,
    event: &FlowEvent,
) -> SimResult<()> {
    let payload = serde_json::to_string(event)?;
    conn.execute(
        "INSERT INTO event_log (run_id, customer_id, step, event_type, payload)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![run_id, customer_id, step, event.type_name(), payload],
    )?;
    Ok(())
}

impl SimStore {
    /// The whole event log of a run in append order.
    /// Used by the determinism test and replay tooling.
    pub fn events_for_run(&self, run_id: &str) -> SimResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, customer_id, step, event_type, payload
             FROM event_log WHERE run_id = ?1
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![run_id], |row| {
                Ok(EventLogEntry {
                    id: Some(row.get(0)?),
                    run_id: row.get(1)?,
                    customer_id: row.get(2)?,
                    step: row.get(3)?,
                    event_type: row.get(4)?,
                    payload: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn events_for_customer(&self, run_id: &str, customer_id: &str) -> SimResult<Vec<FlowEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT payload FROM event_log
             WHERE run_id = ?1 AND customer_id = ?2
             ORDER BY id ASC",
        )?;
        let payloads = stmt
            .query_map(params![run_id, customer_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        payloads
            .iter()
            .map(|p| serde_json::from_str(p).map_err(Into::into))
            .collect()
    }
}
