//! The per-customer flow controller.
//!
//! Onboarding → RiskAssignment → (TransactionBatch ⇄ PeriodicScreening)
//! → Flagging | End.
//!
//! RULES:
//!   - Stages are plain functions; the controller alone picks the next one.
//!   - The continuation predicate is evaluated only after a batch.
//!   - Every stage execution, terminals included, counts toward the step limit.

use crate::{
    config::SimConfig,
    error::{SimError, SimResult},
    event::FlowEvent,
    lifecycle::LifecycleState,
    sampler::Sampler,
    sink::RecordSink,
    stages::{self, StageContext},
    types::FlagReason,
};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Stage {
    Onboarding,
    RiskAssignment,
    TransactionBatch,
    PeriodicScreening,
    Flagging,
    End,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Onboarding        => "onboarding",
            Self::RiskAssignment    => "risk_assignment",
            Self::TransactionBatch  => "transaction_batch",
            Self::PeriodicScreening => "periodic_screening",
            Self::Flagging          => "flagging",
            Self::End               => "end",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a customer's simulation finished.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Terminal {
    Flagged(FlagReason),
    Ended,
}

#[derive(Debug, Clone)]
pub struct CustomerOutcome {
    pub state: LifecycleState,
    pub terminal: Terminal,
    /// Stage executions, terminal stage included.
    pub steps: u32,
}

/// The continuation predicate, evaluated after every batch.
///
/// A flagged customer goes to Flagging whatever the transaction count.
/// Otherwise a fresh threshold is drawn and compared with the count.
pub fn decide_after_batch(state: &LifecycleState, sampler: &mut dyn Sampler) -> Stage {
    if state.is_flagged {
        return Stage::Flagging;
    }
    if state.transaction_count > sampler.continuation_threshold() {
        Stage::End
    } else {
        Stage::PeriodicScreening
    }
}

/// Run one customer from onboarding to a terminal stage.
///
/// Any error aborts the customer immediately; the caller decides
/// whether the run survives it.
pub fn run_customer(
    config: &SimConfig,
    sink: &mut dyn RecordSink,
    sampler: &mut dyn Sampler,
) -> SimResult<CustomerOutcome> {
    let mut ctx = StageContext::new(config, sink, sampler);

    enter(&mut ctx, Stage::Onboarding, None)?;
    let mut state = stages::onboard(&mut ctx)?;
    let mut next = Stage::RiskAssignment;

    loop {
        enter(&mut ctx, next, Some(state.customer_id.as_str()))?;
        next = match next {
            Stage::Onboarding => {
                return Err(SimError::Other(anyhow::anyhow!(
                    "customer '{}' re-entered onboarding",
                    state.customer_id
                )));
            }
            Stage::RiskAssignment => {
                state = stages::assign_risk(state, &mut ctx)?;
                Stage::TransactionBatch
            }
            Stage::TransactionBatch => {
                state = stages::generate_batch(state, &mut ctx)?;
                decide_after_batch(&state, ctx.sampler)
            }
            Stage::PeriodicScreening => {
                state = stages::periodic_screening(state, &mut ctx)?;
                Stage::TransactionBatch
            }
            Stage::Flagging => {
                let (flagged, reason) = stages::flag_customer(state, &mut ctx)?;
                log::info!(
                    "customer={} flagged ({}) after {} transactions",
                    flagged.customer_id,
                    reason.as_str(),
                    flagged.transaction_count
                );
                return Ok(CustomerOutcome {
                    state: flagged,
                    terminal: Terminal::Flagged(reason),
                    steps: ctx.step,
                });
            }
            Stage::End => {
                ctx.sink.append_event(
                    Some(state.customer_id.as_str()),
                    ctx.step,
                    &FlowEvent::SimulationEnded {
                        customer_id: state.customer_id.clone(),
                        transaction_count: state.transaction_count,
                    },
                )?;
                log::info!(
                    "customer={} ended after {} transactions",
                    state.customer_id,
                    state.transaction_count
                );
                return Ok(CustomerOutcome {
                    state,
                    terminal: Terminal::Ended,
                    steps: ctx.step,
                });
            }
        };
    }
}

/// Count one stage execution, failing once the limit is spent.
fn enter(ctx: &mut StageContext<'_>, stage: Stage, customer_id: Option<&str>) -> SimResult<()> {
    let customer_id = customer_id.unwrap_or("<onboarding>");
    if ctx.step >= ctx.config.step_limit {
        return Err(SimError::StepLimitExceeded {
            customer_id: customer_id.to_string(),
            limit: ctx.config.step_limit,
        });
    }
    ctx.step += 1;
    log::debug!("customer={customer_id} stage={stage} step={}", ctx.step);
    Ok(())
}
