//! End-to-end customer scenarios with individual draws forced.

use bankgen_core::{
    engine::{CustomerReport, SimEngine},
    flow::{CustomerOutcome, Terminal},
    sampler::ScriptedSampler,
    types::{BusinessLine, FlagReason, RiskLevel, ScreeningResult},
};

const RUN_ID: &str = "scenario-test";

fn engine() -> SimEngine {
    let _ = env_logger::builder().is_test(true).try_init();
    SimEngine::build_test(RUN_ID.into(), 42).unwrap()
}

fn completed(report: CustomerReport) -> CustomerOutcome {
    match report {
        CustomerReport::Completed(outcome) => outcome,
        CustomerReport::Abandoned { reason, .. } => panic!("customer abandoned: {reason}"),
    }
}

#[test]
fn low_risk_customer_without_large_amounts_ends_quietly() {
    let engine = engine();
    let mut sampler = ScriptedSampler::new(engine.seeded_sampler(0))
        .with_business_line(BusinessLine::Retail)
        .with_risk_level(RiskLevel::Low)
        .with_screening_hits([false; 200]);

    let outcome = completed(engine.simulate_customer(0, &mut sampler).unwrap());
    assert_eq!(outcome.terminal, Terminal::Ended);
    assert!(!outcome.state.is_flagged);
    assert!(outcome.state.transaction_count > 200);

    let id = &outcome.state.customer_id;
    assert_eq!(engine.store.flag_report_count(RUN_ID, id).unwrap(), 0);
    assert_eq!(
        engine.store.txn_count_for_customer(RUN_ID, id).unwrap(),
        outcome.state.transaction_count as i64
    );
    let kyc = engine.store.kyc_for_customer(RUN_ID, id).unwrap().unwrap();
    assert_eq!(kyc.risk_level, RiskLevel::Low);
    assert!(!kyc.is_flagged);
    let logs = engine.store.screening_logs_for_customer(RUN_ID, id).unwrap();
    assert!(logs.iter().all(|l| l.result == ScreeningResult::Clear));
    assert_eq!(kyc.last_screening_date, logs.last().map(|l| l.screening_date));
}

#[test]
fn large_amount_flags_medium_customer_for_pattern() {
    let engine = engine();
    let mut sampler = ScriptedSampler::new(engine.seeded_sampler(0))
        .with_risk_level(RiskLevel::Medium)
        .with_batch_sizes([1])
        .with_amounts([60_000.0]);

    let outcome = completed(engine.simulate_customer(0, &mut sampler).unwrap());
    assert_eq!(outcome.terminal, Terminal::Flagged(FlagReason::SuspiciousTransactionPattern));
    assert_eq!(
        outcome.state.history_labels(),
        vec!["CustomerCreated", "KYCUpdated", "Generated 1 transactions", "CustomerFlagged"]
    );

    let id = &outcome.state.customer_id;
    let txns = engine.store.transactions_for_customer(RUN_ID, id).unwrap();
    assert_eq!(txns.len(), 1);
    assert!(txns[0].is_suspicious);
    assert_eq!(txns[0].amount, 60_000.0);

    let reports = engine.store.flag_reports(RUN_ID).unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].reason, FlagReason::SuspiciousTransactionPattern);
    assert_eq!(reports[0].flag_date, txns[0].date);
    assert!(engine.store.kyc_for_customer(RUN_ID, id).unwrap().unwrap().is_flagged);
}

#[test]
fn screening_hit_flags_for_sanctions() {
    let engine = engine();
    let mut sampler = ScriptedSampler::new(engine.seeded_sampler(0))
        .with_risk_level(RiskLevel::Low)
        .with_batch_sizes([3, 0])
        .with_amounts([10.0, 20.0, 30.0])
        .with_screening_hits([true])
        .with_thresholds([1_000]);

    let outcome = completed(engine.simulate_customer(0, &mut sampler).unwrap());
    assert_eq!(outcome.terminal, Terminal::Flagged(FlagReason::SanctionHit));
    assert!(outcome.state.is_flagged);

    let id = &outcome.state.customer_id;
    let logs = engine.store.screening_logs_for_customer(RUN_ID, id).unwrap();
    let last = logs.last().unwrap();
    assert_eq!(last.result, ScreeningResult::Hit);
    assert_eq!(last.details, "Match found against sanctions list during routine check.");

    let kyc = engine.store.kyc_for_customer(RUN_ID, id).unwrap().unwrap();
    assert!(kyc.is_flagged);
    assert_eq!(kyc.last_screening_date, Some(last.screening_date));
    assert_eq!(engine.store.flag_count_by_reason(RUN_ID, FlagReason::SanctionHit).unwrap(), 1);
}

#[test]
fn clean_batch_after_a_hit_clears_the_flag() {
    let engine = engine();
    let mut sampler = ScriptedSampler::new(engine.seeded_sampler(0))
        .with_business_line(BusinessLine::Retail)
        .with_risk_level(RiskLevel::Low)
        .with_batch_sizes([2, 2])
        .with_amounts([10.0, 10.0, 10.0, 10.0])
        .with_screening_hits([true])
        .with_thresholds([100, 0]);

    let outcome = completed(engine.simulate_customer(0, &mut sampler).unwrap());
    assert_eq!(outcome.terminal, Terminal::Ended);
    assert!(!outcome.state.is_flagged);
    assert!(outcome
        .state
        .history_labels()
        .contains(&"ScreeningPerformed: Hit".to_string()));
    assert_eq!(engine.store.flag_reports(RUN_ID).unwrap().len(), 0);
}

#[test]
fn high_risk_large_amount_is_not_suspicious() {
    let engine = engine();
    let mut sampler = ScriptedSampler::new(engine.seeded_sampler(0))
        .with_risk_level(RiskLevel::High)
        .with_batch_sizes([1])
        .with_amounts([60_000.0])
        .with_thresholds([0]);

    let outcome = completed(engine.simulate_customer(0, &mut sampler).unwrap());
    assert_eq!(outcome.terminal, Terminal::Ended);
    let txns = engine
        .store
        .transactions_for_customer(RUN_ID, &outcome.state.customer_id)
        .unwrap();
    assert_eq!(txns.len(), 1);
    assert!(!txns[0].is_suspicious);
}
