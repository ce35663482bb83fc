//! The storage collaborator seam.
//!
//! Stages write through `RecordSink` and never see SQL. Every write is
//! fire-and-forget: the only thing a stage does with the result is
//! propagate a failure, which abandons the current customer.

use crate::{
    error::SimResult,
    event::FlowEvent,
    types::{BusinessLine, EntityId, FlagReason, RiskLevel, ScreeningResult, ScreeningType, TransactionType},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerRecord {
    pub customer_id: EntityId,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub nationality: String,
    pub residence_country: String,
    pub business_line: BusinessLine,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KycRecord {
    pub customer_id: EntityId,
    pub risk_level: RiskLevel,
    pub identity_verified: bool,
    pub address_verified: bool,
    pub last_screening_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScreeningLogEntry {
    pub customer_id: EntityId,
    pub screening_type: ScreeningType,
    pub screening_date: NaiveDate,
    pub result: ScreeningResult,
    pub details: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionRecord {
    pub transaction_id: EntityId,
    pub customer_id: EntityId,
    pub date: NaiveDate,
    pub amount: f64,
    pub transaction_type: TransactionType,
    pub business_line: BusinessLine,
    pub description: String,
    pub is_suspicious: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlagReport {
    pub customer_id: EntityId,
    pub flag_date: NaiveDate,
    pub reason: FlagReason,
}

/// Write operations the simulation needs from storage.
pub trait RecordSink {
    fn insert_customer(&mut self, customer: &CustomerRecord) -> SimResult<()>;

    fn insert_kyc(&mut self, kyc: &KycRecord) -> SimResult<()>;

    fn insert_screening_log(&mut self, entry: &ScreeningLogEntry) -> SimResult<()>;

    fn insert_transaction(&mut self, txn: &TransactionRecord) -> SimResult<()>;

    fn update_kyc_flag(&mut self, customer_id: &str, is_flagged: bool) -> SimResult<()>;

    fn update_kyc_last_screening_date(&mut self, customer_id: &str, date: NaiveDate) -> SimResult<()>;

    fn insert_flag_report(&mut self, report: &FlagReport) -> SimResult<()>;

    /// Append one entry to the flow event log. `step` is the 1-based
    /// stage execution count within the customer's run.
    fn append_event(&mut self, customer_id: Option<&str>, step: u32, event: &FlowEvent) -> SimResult<()>;
}

/// A sink that keeps every write in memory. Lets stages run without a
/// database, e.g. when unit testing a single stage.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub customers: Vec<CustomerRecord>,
    pub kyc: Vec<KycRecord>,
    pub screening_logs: Vec<ScreeningLogEntry>,
    pub transactions: Vec<TransactionRecord>,
    pub kyc_flag_updates: Vec<(EntityId, bool)>,
    pub screening_date_updates: Vec<(EntityId, NaiveDate)>,
    pub flag_reports: Vec<FlagReport>,
    pub events: Vec<(u32, FlowEvent)>,
}

impl MemorySink {
    /// The stored KYC flag after all updates so far.
    pub fn kyc_flag(&self, customer_id: &str) -> Option<bool> {
        self.kyc_flag_updates
            .iter()
            .rev()
            .find(|(id, _)| id == customer_id)
            .map(|(_, flagged)| *flagged)
    }
}

impl RecordSink for MemorySink {
    fn insert_customer(&mut self, customer: &CustomerRecord) -> SimResult<()> {
        self.customers.push(customer.clone());
        Ok(())
    }

    fn insert_kyc(&mut self, kyc: &KycRecord) -> SimResult<()> {
        self.kyc.push(kyc.clone());
        Ok(())
    }

    fn insert_screening_log(&mut self, entry: &ScreeningLogEntry) -> SimResult<()> {
        self.screening_logs.push(entry.clone());
        Ok(())
    }

    fn insert_transaction(&mut self, txn: &TransactionRecord) -> SimResult<()> {
        self.transactions.push(txn.clone());
        Ok(())
    }

    fn update_kyc_flag(&mut self, customer_id: &str, is_flagged: bool) -> SimResult<()> {
        self.kyc_flag_updates.push((customer_id.to_string(), is_flagged));
        Ok(())
    }

    fn update_kyc_last_screening_date(&mut self, customer_id: &str, date: NaiveDate) -> SimResult<()> {
        self.screening_date_updates.push((customer_id.to_string(), date));
        Ok(())
    }

    fn insert_flag_report(&mut self, report: &FlagReport) -> SimResult<()> {
        self.flag_reports.push(report.clone());
        Ok(())
    }

    fn append_event(&mut self, _customer_id: Option<&str>, step: u32, event: &FlowEvent) -> SimResult<()> {
        self.events.push((step, event.clone()));
        Ok(())
    }
}
