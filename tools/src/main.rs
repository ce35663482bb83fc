//! bank-sim: populate a SQLite database with synthetic bank customers.
//!
//! Usage:
//!   bank-sim --customers 50
//!   bank-sim -c 200 --seed 7 --db run.db --config data/bank_config.json

use anyhow::{Context, Result};
use bankgen_core::{
    config::SimConfig,
    engine::{RunSummary, SimEngine},
    store::SimStore,
    types::FlagReason,
};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "bank-sim", version, about = "Generate synthetic bank customers, transactions and screening data")]
struct Args {
    /// Number of customers to simulate
    #[arg(short = 'c', long, default_value_t = 10)]
    customers: u64,

    /// Master seed for the run
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// SQLite database file (created if missing)
    #[arg(long, default_value = "fictional_bank.db")]
    db: String,

    /// JSON config file; built-in defaults when omitted
    #[arg(long)]
    config: Option<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };

    println!("bank-sim");
    println!("  seed:      {}", args.seed);
    println!("  customers: {}", args.customers);
    println!("  db:        {}", args.db);
    println!();

    let store = SimStore::open(&args.db).with_context(|| format!("Cannot open {}", args.db))?;
    store.migrate()?;

    let started_at = unix_secs();
    let run_id = format!("run-{}-{started_at}", args.seed);
    store.insert_run(&run_id, args.seed, env!("CARGO_PKG_VERSION"), started_at)?;
    log::info!("run {run_id} registered in {}", args.db);

    let mut engine = SimEngine::build(run_id, args.seed, config, store)?;
    let summary = engine.run_customers_with_progress(args.customers, |i, n| {
        println!("--- Generating data for customer {i}/{n} ---");
    })?;

    if summary.abandoned > 0 {
        log::warn!("{} of {} customers were abandoned", summary.abandoned, summary.customers);
    }
    print_summary(&engine, &summary)?;
    Ok(())
}

fn print_summary(engine: &SimEngine, summary: &RunSummary) -> Result<()> {
    let run_id = &engine.run_id;
    let stored_customers = engine.store.customer_count(run_id)?;
    let stored_txns = engine.store.txn_count_total(run_id)?;
    let suspicious = engine.store.suspicious_txn_count(run_id)?;
    let sanction_reports = engine.store.flag_count_by_reason(run_id, FlagReason::SanctionHit)?;
    let pattern_reports = engine
        .store
        .flag_count_by_reason(run_id, FlagReason::SuspiciousTransactionPattern)?;

    println!();
    println!("=== RUN SUMMARY ===");
    println!("  run_id:           {run_id}");
    println!("  customers run:    {}", summary.customers);
    println!("  customers stored: {stored_customers}");
    println!("  flagged:          {}", summary.flagged);
    println!("    sanction hit:   {sanction_reports}");
    println!("    txn pattern:    {pattern_reports}");
    println!("  ended:            {}", summary.ended);
    println!("  abandoned:        {}", summary.abandoned);
    println!("  transactions:     {stored_txns}");
    println!("  suspicious txns:  {suspicious}");
    if summary.customers > 0 {
        println!(
            "  avg txns/customer: {:.1}",
            summary.transactions as f64 / summary.customers as f64
        );
    }
    Ok(())
}

fn unix_secs() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
