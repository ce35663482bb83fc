//! The flow event log.
//!
//! RULE: Every stage execution emits exactly one event.
//! Events are serialized into event_log so two runs with the same
//! seed can be compared entry by entry.

use crate::types::{
    BusinessLine, EntityId, FlagReason, RiskLevel, RunId, ScreeningResult, ScreeningType,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Every event emitted during a customer simulation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowEvent {
    RunInitialized {
        run_id: RunId,
        seed: u64,
    },
    CustomerOnboarded {
        customer_id: EntityId,
        business_line: BusinessLine,
        start_date: NaiveDate,
    },
    RiskAssigned {
        customer_id: EntityId,
        risk_level: RiskLevel,
    },
    TransactionBatchGenerated {
        customer_id: EntityId,
        count: u64,
        total_count: u64,
        last_date: NaiveDate,
        is_flagged: bool,
    },
    ScreeningPerformed {
        customer_id: EntityId,
        screening_type: ScreeningType,
        result: ScreeningResult,
        date: NaiveDate,
    },
    CustomerFlagged {
        customer_id: EntityId,
        reason: FlagReason,
    },
    SimulationEnded {
        customer_id: EntityId,
        transaction_count: u64,
    },
}

impl FlowEvent {
    /// Stable name for the event_type column.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::RunInitialized { .. }            => "run_initialized",
            Self::CustomerOnboarded { .. }         => "customer_onboarded",
            Self::RiskAssigned { .. }              => "risk_assigned",
            Self::TransactionBatchGenerated { .. } => "transaction_batch_generated",
            Self::ScreeningPerformed { .. }        => "screening_performed",
            Self::CustomerFlagged { .. }           => "customer_flagged",
            Self::SimulationEnded { .. }           => "simulation_ended",
        }
    }
}

/// A persisted event_log row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub run_id: RunId,
    pub customer_id: Option<EntityId>,
    pub step: u32,
    pub event_type: String,
    pub payload: String,
}
