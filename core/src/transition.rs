//! Markov chain over transaction types.
//!
//! The next transaction's type depends only on the previous one.
//! The table is static configuration, validated once at startup:
//! a malformed table aborts the run before any customer is simulated.

use crate::{
    config::{SimConfig, TransitionRow, WEIGHT_TOLERANCE},
    error::{SimError, SimResult},
    rng::SimRng,
    types::{ChainState, TransactionType},
};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

#[derive(Debug, Clone)]
pub struct TransitionModel {
    rows: BTreeMap<ChainState, Vec<(TransactionType, f64)>>,
}

impl TransitionModel {
    pub fn from_config(config: &SimConfig) -> SimResult<Self> {
        Self::from_rows(&config.transitions)
    }

    pub fn from_rows(table: &[TransitionRow]) -> SimResult<Self> {
        let mut rows = BTreeMap::new();
        for row in table {
            if row.to.is_empty() {
                return Err(SimError::config(format!(
                    "transition row '{}' has no outgoing edges",
                    row.from
                )));
            }
            let edges: Vec<(TransactionType, f64)> =
                row.to.iter().map(|e| (e.to, e.weight)).collect();
            if rows.insert(row.from, edges).is_some() {
                return Err(SimError::config(format!(
                    "duplicate transition row for '{}'",
                    row.from
                )));
            }
        }
        let model = Self { rows };
        model.validate()?;
        Ok(model)
    }

    /// Every state reachable from `start` must have a row whose
    /// non-negative weights sum to 1.0.
    fn validate(&self) -> SimResult<()> {
        for state in self.reachable_states()? {
            let edges = self.rows.get(&state).ok_or_else(|| {
                SimError::config(format!("no transition row for reachable state '{state}'"))
            })?;
            if let Some((to, w)) = edges.iter().find(|(_, w)| !(*w >= 0.0)) {
                return Err(SimError::config(format!(
                    "transition '{state}' -> '{to}' has invalid weight {w}"
                )));
            }
            let total: f64 = edges.iter().map(|(_, w)| w).sum();
            if (total - 1.0).abs() > WEIGHT_TOLERANCE {
                return Err(SimError::config(format!(
                    "transitions out of '{state}' sum to {total}, expected 1.0"
                )));
            }
        }
        Ok(())
    }

    /// Breadth-first walk from `start`, following edges with positive weight.
    /// Reports states that are targeted but have no row.
    pub fn reachable_states(&self) -> SimResult<BTreeSet<ChainState>> {
        if !self.rows.contains_key(&ChainState::Start) {
            return Err(SimError::config("transition table has no 'start' row"));
        }
        let mut seen = BTreeSet::from([ChainState::Start]);
        let mut queue = VecDeque::from([ChainState::Start]);
        while let Some(state) = queue.pop_front() {
            let Some(edges) = self.rows.get(&state) else {
                continue;
            };
            for (to, weight) in edges {
                let next = ChainState::After(*to);
                if *weight > 0.0 && seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        Ok(seen)
    }

    /// Types that can follow `current`.
    pub fn successors(&self, current: ChainState) -> impl Iterator<Item = TransactionType> + '_ {
        self.rows
            .get(&current)
            .into_iter()
            .flat_map(|edges| edges.iter().map(|(t, _)| *t))
    }

    /// Draw the next transaction type. Fails only for a state with no
    /// row, which validation rules out for everything reachable from `start`.
    pub fn next_type(&self, current: ChainState, rng: &mut SimRng) -> SimResult<TransactionType> {
        let edges = self.rows.get(&current).ok_or_else(|| {
            SimError::config(format!("no transition row for state '{current}'"))
        })?;
        Ok(*rng.weighted(edges))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransitionEdge;
    use crate::types::TransactionType::*;

    fn default_model() -> TransitionModel {
        TransitionModel::from_config(&SimConfig::default_test()).unwrap()
    }

    #[test]
    fn first_type_comes_from_start_row() {
        let model = default_model();
        let mut rng = SimRng::new(11, 0);
        for _ in 0..1_000 {
            let t = model.next_type(ChainState::Start, &mut rng).unwrap();
            assert!(
                matches!(t, Deposit | InternationalTransfer | SecuritiesTrade),
                "unexpected first type {t}"
            );
        }
    }

    #[test]
    fn walk_never_leaves_the_table() {
        let model = default_model();
        let mut rng = SimRng::new(12, 0);
        let mut state = ChainState::Start;
        for _ in 0..10_000 {
            let next = model.next_type(state, &mut rng).unwrap();
            assert!(model.successors(state).any(|t| t == next));
            state = ChainState::After(next);
        }
    }

    #[test]
    fn single_exit_states_are_deterministic() {
        let model = default_model();
        let mut rng = SimRng::new(13, 0);
        for _ in 0..100 {
            assert_eq!(model.next_type(LoanRepayment.into(), &mut rng).unwrap(), CardPayment);
            assert_eq!(
                model.next_type(AssetManagementFee.into(), &mut rng).unwrap(),
                SecuritiesTrade
            );
        }
    }

    #[test]
    fn missing_start_row_is_a_config_error() {
        let mut config = SimConfig::default_test();
        config.transitions.retain(|r| r.from != ChainState::Start);
        let err = TransitionModel::from_config(&config).unwrap_err();
        assert!(matches!(err, SimError::Config { .. }));
    }

    #[test]
    fn reachable_state_without_row_is_rejected() {
        let mut config = SimConfig::default_test();
        config.transitions.retain(|r| r.from != ChainState::After(BondPurchase));
        let err = TransitionModel::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("Bond Purchase"), "{err}");
    }

    #[test]
    fn weights_must_sum_to_one() {
        let mut config = SimConfig::default_test();
        let deposit = config
            .transitions
            .iter_mut()
            .find(|r| r.from == ChainState::After(Deposit))
            .unwrap();
        deposit.to.push(TransitionEdge { to: LoanRepayment, weight: 0.2 });
        assert!(TransitionModel::from_config(&config).is_err());
    }

    #[test]
    fn unreachable_rows_are_not_required() {
        // Loan Repayment is never reached from start in the default table.
        let model = default_model();
        let reachable = model.reachable_states().unwrap();
        assert!(!reachable.contains(&ChainState::After(LoanRepayment)));
        assert!(reachable.contains(&ChainState::After(AssetManagementFee)));
    }
}
