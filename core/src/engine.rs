//! The simulation engine: runs customers one after another.
//!
//! RULES:
//!   - Config and the transition table are validated before the first customer.
//!   - Each customer draws from its own RNG stream, keyed by its index.
//!   - Each customer's writes share one storage session; an abandoned
//!     customer leaves nothing behind.
//!   - Only configuration errors stop the run.

use crate::{
    config::SimConfig,
    error::SimResult,
    event::FlowEvent,
    flow::{self, CustomerOutcome, Terminal},
    rng::RngBank,
    sampler::{Sampler, SeededSampler},
    sampling::SamplingModel,
    store::SimStore,
    transition::TransitionModel,
    types::{FlagReason, RunId},
};

pub struct SimEngine {
    pub run_id:  RunId,
    pub config:  SimConfig,
    pub store:   SimStore,
    seed:        u64,
    rng_bank:    RngBank,
    sampling:    SamplingModel,
    chain:       TransitionModel,
    next_index:  u64,
    initialized: bool,
}

/// What happened to one customer.
#[derive(Debug, Clone)]
pub enum CustomerReport {
    Completed(CustomerOutcome),
    /// The customer's writes were rolled back.
    Abandoned { index: u64, reason: String },
}

/// End-of-run totals printed by the runner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub customers: u64,
    pub flagged: u64,
    pub sanction_hits: u64,
    pub suspicious_patterns: u64,
    pub ended: u64,
    pub abandoned: u64,
    pub transactions: u64,
}

impl RunSummary {
    pub fn record(&mut self, report: &CustomerReport) {
        self.customers += 1;
        match report {
            CustomerReport::Completed(outcome) => {
                self.transactions += outcome.state.transaction_count;
                match outcome.terminal {
                    Terminal::Flagged(reason) => {
                        self.flagged += 1;
                        match reason {
                            FlagReason::SanctionHit => self.sanction_hits += 1,
                            FlagReason::SuspiciousTransactionPattern => self.suspicious_patterns += 1,
                        }
                    }
                    Terminal::Ended => self.ended += 1,
                }
            }
            CustomerReport::Abandoned { .. } => self.abandoned += 1,
        }
    }
}

impl SimEngine {
    /// Validate `config`, build the sampling and transition models, and
    /// take ownership of `store`. Any configuration error is returned here,
    /// before a single customer is simulated.
    pub fn build(run_id: RunId, seed: u64, mut config: SimConfig, store: SimStore) -> SimResult<Self> {
        config.validate()?;
        let sampling = SamplingModel::new(&config.sampling)?;
        let chain = TransitionModel::from_config(&config)?;

        // Pin the anchor so every customer of the run counts back from the same day.
        let as_of = config.anchor_date();
        config.as_of = Some(as_of);

        log::info!(
            "engine ready: run={run_id} seed={seed} as_of={as_of} chain_states={}",
            chain.reachable_states()?.len()
        );

        Ok(Self {
            rng_bank: RngBank::new(seed),
            seed,
            sampling,
            chain,
            config,
            store,
            run_id,
            next_index: 0,
            initialized: false,
        })
    }

    /// Engine over a migrated in-memory store with the test config.
    pub fn build_test(run_id: RunId, seed: u64) -> SimResult<Self> {
        Self::build_test_with(run_id, seed, SimConfig::default_test())
    }

    pub fn build_test_with(run_id: RunId, seed: u64, config: SimConfig) -> SimResult<Self> {
        let store = SimStore::in_memory()?;
        store.migrate()?;
        store.insert_run(&run_id, seed, "0.1.0-test", 0)?;
        Self::build(run_id, seed, config, store)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The production sampler for the customer at `index`.
    pub fn seeded_sampler(&self, index: u64) -> SeededSampler<'_> {
        SeededSampler::new(
            &self.config,
            &self.sampling,
            &self.chain,
            self.rng_bank.for_customer(index),
        )
    }

    /// Simulate one customer inside its own storage session.
    ///
    /// A failure that only concerns this customer (storage, step limit)
    /// is logged and reported as `Abandoned`; the session is rolled back.
    pub fn simulate_customer(&self, index: u64, sampler: &mut dyn Sampler) -> SimResult<CustomerReport> {
        match self.run_in_session(sampler) {
            Ok(outcome) => Ok(CustomerReport::Completed(outcome)),
            Err(e) if e.is_customer_fatal() => {
                log::warn!("customer #{index} abandoned: {e}");
                Ok(CustomerReport::Abandoned { index, reason: e.to_string() })
            }
            Err(e) => Err(e),
        }
    }

    fn run_in_session(&self, sampler: &mut dyn Sampler) -> SimResult<CustomerOutcome> {
        let mut session = self.store.session(&self.run_id)?;
        let outcome = flow::run_customer(&self.config, &mut session, sampler)?;
        session.commit()?;
        Ok(outcome)
    }

    /// Simulate `n` more customers with their seeded samplers.
    pub fn run_customers(&mut self, n: u64) -> SimResult<RunSummary> {
        self.run_customers_with_progress(n, |_, _| {})
    }

    /// As `run_customers`, calling `progress(i, n)` before the i-th customer.
    pub fn run_customers_with_progress(
        &mut self,
        n: u64,
        mut progress: impl FnMut(u64, u64),
    ) -> SimResult<RunSummary> {
        self.initialize()?;

        let mut summary = RunSummary::default();
        for i in 1..=n {
            progress(i, n);
            let index = self.next_index;
            self.next_index += 1;

            let mut sampler = self.seeded_sampler(index);
            let report = self.simulate_customer(index, &mut sampler)?;
            summary.record(&report);
        }

        log::info!(
            "run={} finished: {} customers, {} flagged, {} ended, {} abandoned",
            self.run_id, summary.customers, summary.flagged, summary.ended, summary.abandoned
        );
        Ok(summary)
    }

    /// Emit RunInitialized once, so seed differences show up in the log.
    fn initialize(&mut self) -> SimResult<()> {
        if !self.initialized {
            self.store.append_run_event(
                &self.run_id,
                &FlowEvent::RunInitialized {
                    run_id: self.run_id.clone(),
                    seed: self.seed,
                },
            )?;
            self.initialized = true;
        }
        Ok(())
    }
}
