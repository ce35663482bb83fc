//! Per-customer lifecycle state threaded through every stage.

use crate::{
    error::{SimError, SimResult},
    types::{BusinessLine, ChainState, EntityId, RiskLevel, ScreeningResult},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One entry of a customer's run history.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StageOutcome {
    CustomerCreated,
    KycUpdated,
    TransactionsGenerated { count: u64 },
    ScreeningPerformed { result: ScreeningResult },
    CustomerFlagged,
}

impl StageOutcome {
    /// Whether this entry records a screening hit.
    pub fn mentions_hit(&self) -> bool {
        matches!(self, Self::ScreeningPerformed { result: ScreeningResult::Hit })
    }
}

impl fmt::Display for StageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CustomerCreated                   => f.write_str("CustomerCreated"),
            Self::KycUpdated                        => f.write_str("KYCUpdated"),
            Self::TransactionsGenerated { count }   => write!(f, "Generated {count} transactions"),
            Self::ScreeningPerformed { result }     => write!(f, "ScreeningPerformed: {}", result.as_str()),
            Self::CustomerFlagged                   => f.write_str("CustomerFlagged"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LifecycleState {
    pub customer_id: EntityId,
    pub business_line: BusinessLine,
    /// Assigned once by the risk stage.
    pub risk_level: Option<RiskLevel>,
    pub transaction_count: u64,
    pub current_date: NaiveDate,
    pub last_transaction_type: ChainState,
    pub is_flagged: bool,
    pub run_history: Vec<StageOutcome>,
}

impl LifecycleState {
    /// A freshly onboarded customer: no risk level, no transactions.
    pub fn onboarded(customer_id: EntityId, business_line: BusinessLine, start_date: NaiveDate) -> Self {
        Self {
            customer_id,
            business_line,
            risk_level: None,
            transaction_count: 0,
            current_date: start_date,
            last_transaction_type: ChainState::Start,
            is_flagged: false,
            run_history: vec![StageOutcome::CustomerCreated],
        }
    }

    pub fn risk(&self) -> SimResult<RiskLevel> {
        self.risk_level.ok_or_else(|| {
            SimError::Other(anyhow::anyhow!(
                "customer '{}' has no risk level assigned",
                self.customer_id
            ))
        })
    }

    pub fn record(&mut self, outcome: StageOutcome) {
        self.run_history.push(outcome);
    }

    /// True if either of the two most recent history entries is a screening hit.
    pub fn recent_screening_hit(&self) -> bool {
        self.run_history.iter().rev().take(2).any(StageOutcome::mentions_hit)
    }

    pub fn history_labels(&self) -> Vec<String> {
        self.run_history.iter().map(ToString::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> LifecycleState {
        LifecycleState::onboarded(
            "c-1".into(),
            BusinessLine::Retail,
            NaiveDate::from_ymd_opt(2020, 5, 1).unwrap(),
        )
    }

    #[test]
    fn labels_match_stage_names() {
        let mut s = state();
        s.record(StageOutcome::KycUpdated);
        s.record(StageOutcome::TransactionsGenerated { count: 7 });
        s.record(StageOutcome::ScreeningPerformed { result: ScreeningResult::Clear });
        s.record(StageOutcome::CustomerFlagged);
        assert_eq!(
            s.history_labels(),
            vec![
                "CustomerCreated",
                "KYCUpdated",
                "Generated 7 transactions",
                "ScreeningPerformed: Clear",
                "CustomerFlagged",
            ]
        );
    }

    #[test]
    fn hit_only_counts_within_last_two_entries() {
        let mut s = state();
        s.record(StageOutcome::ScreeningPerformed { result: ScreeningResult::Hit });
        assert!(s.recent_screening_hit());
        s.record(StageOutcome::TransactionsGenerated { count: 0 });
        assert!(s.recent_screening_hit());
        s.record(StageOutcome::ScreeningPerformed { result: ScreeningResult::Clear });
        assert!(!s.recent_screening_hit());
    }

    #[test]
    fn risk_is_required_after_assignment() {
        let mut s = state();
        assert!(s.risk().is_err());
        s.risk_level = Some(RiskLevel::Medium);
        assert_eq!(s.risk().unwrap(), RiskLevel::Medium);
    }
}
