//! Stage functions of the per-customer flow.
//!
//! Each stage takes the lifecycle state by value, performs its writes
//! through the sink, and hands the updated state back. Stages read all
//! randomness from the context's sampler and every constant from config.

use crate::{
    config::SimConfig,
    error::SimResult,
    event::FlowEvent,
    lifecycle::{LifecycleState, StageOutcome},
    sampler::Sampler,
    sink::{CustomerRecord, FlagReport, KycRecord, RecordSink, ScreeningLogEntry, TransactionRecord},
    types::{BusinessLine, ChainState, FlagReason, RiskLevel, ScreeningResult, ScreeningType},
};
use chrono::Days;

/// Residence country of every Retail (FRB) customer.
pub const RETAIL_RESIDENCE: &str = "France";
pub const BANK_NAME: &str = "OmniBanque";

const INITIAL_SCREENING_DETAILS: &str = "Initial onboarding screening.";
const ROUTINE_CLEAR_DETAILS: &str = "Routine periodic screening.";
const ROUTINE_HIT_DETAILS: &str = "Match found against sanctions list during routine check.";

/// Everything a stage may touch besides the lifecycle state.
pub struct StageContext<'a> {
    pub config: &'a SimConfig,
    pub sink: &'a mut dyn RecordSink,
    pub sampler: &'a mut dyn Sampler,
    /// 1-based count of stage executions so far for this customer.
    pub step: u32,
}

impl<'a> StageContext<'a> {
    pub fn new(config: &'a SimConfig, sink: &'a mut dyn RecordSink, sampler: &'a mut dyn Sampler) -> Self {
        Self { config, sink, sampler, step: 0 }
    }

    fn emit(&mut self, customer_id: &str, event: FlowEvent) -> SimResult<()> {
        self.sink.append_event(Some(customer_id), self.step, &event)
    }
}

/// Onboarding: create the customer and the lifecycle state.
pub fn onboard(ctx: &mut StageContext<'_>) -> SimResult<LifecycleState> {
    let as_of = ctx.config.anchor_date();
    let business_line = ctx.sampler.business_line();
    let customer_id = ctx.sampler.entity_id();
    let identity = ctx.sampler.identity(as_of);
    let residence_country = match business_line {
        BusinessLine::Retail => RETAIL_RESIDENCE,
        BusinessLine::InternationalPersonal | BusinessLine::MarketsAndBanking => ctx.sampler.country(),
    };
    let start_date = as_of
        .checked_sub_days(Days::new(ctx.sampler.lookback_days()))
        .unwrap_or(as_of);

    ctx.sink.insert_customer(&CustomerRecord {
        customer_id: customer_id.clone(),
        first_name: identity.first_name.to_string(),
        last_name: identity.last_name.to_string(),
        date_of_birth: identity.date_of_birth,
        nationality: identity.nationality.to_string(),
        residence_country: residence_country.to_string(),
        business_line,
    })?;

    let state = LifecycleState::onboarded(customer_id, business_line, start_date);
    ctx.emit(
        &state.customer_id,
        FlowEvent::CustomerOnboarded {
            customer_id: state.customer_id.clone(),
            business_line,
            start_date,
        },
    )?;
    Ok(state)
}

/// Risk assignment: complete KYC, record the initial screening round.
pub fn assign_risk(mut state: LifecycleState, ctx: &mut StageContext<'_>) -> SimResult<LifecycleState> {
    let risk_level = ctx.sampler.risk_level();

    ctx.sink.insert_kyc(&KycRecord {
        customer_id: state.customer_id.clone(),
        risk_level,
        identity_verified: true,
        address_verified: true,
        last_screening_date: state.current_date,
    })?;
    for screening_type in ScreeningType::ALL {
        ctx.sink.insert_screening_log(&ScreeningLogEntry {
            customer_id: state.customer_id.clone(),
            screening_type,
            screening_date: state.current_date,
            result: ScreeningResult::Clear,
            details: INITIAL_SCREENING_DETAILS.to_string(),
        })?;
    }

    state.risk_level = Some(risk_level);
    state.last_transaction_type = ChainState::Start;
    state.record(StageOutcome::KycUpdated);
    ctx.emit(
        &state.customer_id,
        FlowEvent::RiskAssigned {
            customer_id: state.customer_id.clone(),
            risk_level,
        },
    )?;
    Ok(state)
}

/// Transaction batch: draw a Poisson-sized batch and persist each
/// transaction in date order.
///
/// The flag is overwritten by every transaction's verdict, so only the
/// last transaction of the batch decides the post-batch flag.
pub fn generate_batch(mut state: LifecycleState, ctx: &mut StageContext<'_>) -> SimResult<LifecycleState> {
    let risk_level = state.risk()?;
    let n = ctx.sampler.batch_size(risk_level);

    for _ in 0..n {
        let offset = ctx.sampler.day_offset();
        state.current_date = state
            .current_date
            .checked_add_days(Days::new(offset))
            .unwrap_or(state.current_date);

        let transaction_type = ctx.sampler.next_type(state.last_transaction_type)?;
        state.last_transaction_type = transaction_type.into();

        let amount = ctx.sampler.amount(state.business_line);
        let suspicious = is_suspicious(ctx.config, amount, risk_level);

        ctx.sink.insert_transaction(&TransactionRecord {
            transaction_id: ctx.sampler.entity_id(),
            customer_id: state.customer_id.clone(),
            date: state.current_date,
            amount,
            transaction_type,
            business_line: state.business_line,
            description: format!("{transaction_type} via {BANK_NAME} {}", state.business_line),
            is_suspicious: suspicious,
        })?;

        state.is_flagged = suspicious;
        ctx.sink.update_kyc_flag(&state.customer_id, suspicious)?;
    }

    state.transaction_count += n;
    state.record(StageOutcome::TransactionsGenerated { count: n });
    ctx.emit(
        &state.customer_id,
        FlowEvent::TransactionBatchGenerated {
            customer_id: state.customer_id.clone(),
            count: n,
            total_count: state.transaction_count,
            last_date: state.current_date,
            is_flagged: state.is_flagged,
        },
    )?;
    Ok(state)
}

/// Large transactions are only suspicious for customers not already High risk.
pub fn is_suspicious(config: &SimConfig, amount: f64, risk: RiskLevel) -> bool {
    amount > config.suspicious_amount_threshold && risk != RiskLevel::High
}

/// Periodic screening: a rare hit flags the customer.
pub fn periodic_screening(mut state: LifecycleState, ctx: &mut StageContext<'_>) -> SimResult<LifecycleState> {
    let risk_level = state.risk()?;
    let (result, details) = if ctx.sampler.screening_hit(risk_level) {
        state.is_flagged = true;
        ctx.sink.update_kyc_flag(&state.customer_id, true)?;
        (ScreeningResult::Hit, ROUTINE_HIT_DETAILS)
    } else {
        (ScreeningResult::Clear, ROUTINE_CLEAR_DETAILS)
    };

    let screening_type = ctx.sampler.screening_type();
    ctx.sink.insert_screening_log(&ScreeningLogEntry {
        customer_id: state.customer_id.clone(),
        screening_type,
        screening_date: state.current_date,
        result,
        details: details.to_string(),
    })?;
    ctx.sink
        .update_kyc_last_screening_date(&state.customer_id, state.current_date)?;

    state.record(StageOutcome::ScreeningPerformed { result });
    ctx.emit(
        &state.customer_id,
        FlowEvent::ScreeningPerformed {
            customer_id: state.customer_id.clone(),
            screening_type,
            result,
            date: state.current_date,
        },
    )?;
    Ok(state)
}

/// The reason a flag report gives: a screening hit in the last two
/// history entries, otherwise the transaction pattern.
pub fn flag_reason(state: &LifecycleState) -> FlagReason {
    if state.recent_screening_hit() {
        FlagReason::SanctionHit
    } else {
        FlagReason::SuspiciousTransactionPattern
    }
}

/// Flagging: file the report. Terminal.
pub fn flag_customer(mut state: LifecycleState, ctx: &mut StageContext<'_>) -> SimResult<(LifecycleState, FlagReason)> {
    let reason = flag_reason(&state);
    ctx.sink.insert_flag_report(&FlagReport {
        customer_id: state.customer_id.clone(),
        flag_date: state.current_date,
        reason,
    })?;
    state.record(StageOutcome::CustomerFlagged);
    ctx.emit(
        &state.customer_id,
        FlowEvent::CustomerFlagged {
            customer_id: state.customer_id.clone(),
            reason,
        },
    )?;
    Ok((state, reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        rng::SimRng,
        sampler::{ScriptedSampler, SeededSampler},
        sampling::SamplingModel,
        sink::MemorySink,
        transition::TransitionModel,
    };

    struct Fixture {
        config: SimConfig,
        sampling: SamplingModel,
        chain: TransitionModel,
    }

    impl Fixture {
        fn new() -> Self {
            let config = SimConfig::default_test();
            let sampling = SamplingModel::new(&config.sampling).unwrap();
            let chain = TransitionModel::from_config(&config).unwrap();
            Self { config, sampling, chain }
        }

        fn sampler(&self, seed: u64) -> ScriptedSampler<SeededSampler<'_>> {
            ScriptedSampler::new(SeededSampler::new(
                &self.config,
                &self.sampling,
                &self.chain,
                SimRng::new(seed, 0),
            ))
        }
    }

    fn onboarded(ctx: &mut StageContext<'_>) -> LifecycleState {
        let state = onboard(ctx).unwrap();
        assign_risk(state, ctx).unwrap()
    }

    #[test]
    fn onboarding_writes_customer_and_starts_in_the_past() {
        let fx = Fixture::new();
        let mut sink = MemorySink::default();
        let mut sampler = fx.sampler(1).with_business_line(BusinessLine::Retail);
        let mut ctx = StageContext::new(&fx.config, &mut sink, &mut sampler);

        let state = onboard(&mut ctx).unwrap();
        let as_of = fx.config.anchor_date();
        let lookback = (as_of - state.current_date).num_days();
        assert!(fx.config.onboarding_lookback_days.contains(lookback as u64), "lookback {lookback}");
        assert_eq!(state.last_transaction_type, ChainState::Start);
        assert_eq!(state.history_labels(), vec!["CustomerCreated"]);

        assert_eq!(sink.customers.len(), 1);
        assert_eq!(sink.customers[0].residence_country, RETAIL_RESIDENCE);
        assert_eq!(sink.customers[0].customer_id, state.customer_id);
    }

    #[test]
    fn risk_assignment_records_initial_clear_screenings() {
        let fx = Fixture::new();
        let mut sink = MemorySink::default();
        let mut sampler = fx.sampler(2).with_risk_level(RiskLevel::Medium);
        let mut ctx = StageContext::new(&fx.config, &mut sink, &mut sampler);

        let state = onboarded(&mut ctx);
        assert_eq!(state.risk_level, Some(RiskLevel::Medium));
        assert_eq!(sink.kyc.len(), 1);
        assert!(sink.kyc[0].identity_verified && sink.kyc[0].address_verified);
        assert_eq!(sink.kyc[0].last_screening_date, state.current_date);
        assert_eq!(sink.screening_logs.len(), ScreeningType::ALL.len());
        assert!(sink.screening_logs.iter().all(|l| l.result == ScreeningResult::Clear));
    }

    #[test]
    fn batch_advances_dates_and_counts() {
        let fx = Fixture::new();
        let mut sink = MemorySink::default();
        let mut sampler = fx.sampler(3).with_batch_sizes([12]);
        let mut ctx = StageContext::new(&fx.config, &mut sink, &mut sampler);

        let state = onboarded(&mut ctx);
        let start = state.current_date;
        let state = generate_batch(state, &mut ctx).unwrap();

        assert_eq!(state.transaction_count, 12);
        assert_eq!(sink.transactions.len(), 12);
        let mut previous = start;
        for txn in &sink.transactions {
            let gap = (txn.date - previous).num_days();
            assert!(fx.config.sampling.day_offset.contains(gap as u64), "gap {gap}");
            previous = txn.date;
        }
        assert_eq!(state.current_date, previous);
        assert_eq!(state.last_transaction_type, ChainState::After(sink.transactions[11].transaction_type));
        assert!(state.run_history.contains(&StageOutcome::TransactionsGenerated { count: 12 }));
    }

    #[test]
    fn only_the_last_verdict_of_a_batch_survives() {
        let fx = Fixture::new();
        let mut sink = MemorySink::default();
        let mut sampler = fx
            .sampler(4)
            .with_risk_level(RiskLevel::Low)
            .with_batch_sizes([2, 2])
            .with_amounts([60_000.0, 10.0, 10.0, 60_000.0]);
        let mut ctx = StageContext::new(&fx.config, &mut sink, &mut sampler);

        let state = onboarded(&mut ctx);
        let state = generate_batch(state, &mut ctx).unwrap();
        assert!(!state.is_flagged, "suspicious first transaction is overwritten");

        let state = generate_batch(state, &mut ctx).unwrap();
        assert!(state.is_flagged);
        assert_eq!(sink.kyc_flag(&state.customer_id), Some(true));
        let suspicious: Vec<bool> = sink.transactions.iter().map(|t| t.is_suspicious).collect();
        assert_eq!(suspicious, vec![true, false, false, true]);
    }

    #[test]
    fn high_risk_large_amounts_are_not_suspicious() {
        let config = SimConfig::default_test();
        assert!(!is_suspicious(&config, 1_000_000.0, RiskLevel::High));
        assert!(is_suspicious(&config, 50_000.01, RiskLevel::Medium));
        assert!(!is_suspicious(&config, 50_000.0, RiskLevel::Low));
    }

    #[test]
    fn screening_hit_flags_and_dates_kyc() {
        let fx = Fixture::new();
        let mut sink = MemorySink::default();
        let mut sampler = fx.sampler(5).with_screening_hits([true]);
        let mut ctx = StageContext::new(&fx.config, &mut sink, &mut sampler);

        let state = onboarded(&mut ctx);
        let state = periodic_screening(state, &mut ctx).unwrap();

        assert!(state.is_flagged);
        let last = sink.screening_logs.last().unwrap();
        assert_eq!(last.result, ScreeningResult::Hit);
        assert_eq!(last.details, ROUTINE_HIT_DETAILS);
        assert_eq!(sink.screening_date_updates, vec![(state.customer_id.clone(), state.current_date)]);
        assert_eq!(flag_reason(&state), FlagReason::SanctionHit);
    }

    #[test]
    fn clear_screening_keeps_flag_untouched() {
        let fx = Fixture::new();
        let mut sink = MemorySink::default();
        let mut sampler = fx.sampler(6).with_screening_hits([false]);
        let mut ctx = StageContext::new(&fx.config, &mut sink, &mut sampler);

        let state = onboarded(&mut ctx);
        let state = periodic_screening(state, &mut ctx).unwrap();
        assert!(!state.is_flagged);
        assert_eq!(sink.screening_logs.last().unwrap().result, ScreeningResult::Clear);
        assert_eq!(sink.screening_date_updates.len(), 1);
    }

    #[test]
    fn flagging_files_one_report() {
        let fx = Fixture::new();
        let mut sink = MemorySink::default();
        let mut sampler = fx.sampler(7);
        let mut ctx = StageContext::new(&fx.config, &mut sink, &mut sampler);

        let state = onboarded(&mut ctx);
        let (state, reason) = flag_customer(state, &mut ctx).unwrap();
        assert_eq!(reason, FlagReason::SuspiciousTransactionPattern);
        assert_eq!(state.run_history.last(), Some(&StageOutcome::CustomerFlagged));
        assert_eq!(sink.flag_reports.len(), 1);
        assert_eq!(sink.flag_reports[0].reason, reason);
    }
}
