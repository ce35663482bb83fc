//! The randomness seam between stages and the sampling primitives.
//!
//! Stages never touch an RNG directly. They ask a `Sampler` for each
//! draw, so a test can replace any single draw (force a risk level,
//! an amount, a screening hit) while every other draw stays seeded.

use crate::{
    config::SimConfig,
    error::SimResult,
    identity::{FakeIdentity, IdentityGenerator},
    rng::SimRng,
    sampling::SamplingModel,
    transition::TransitionModel,
    types::{BusinessLine, ChainState, EntityId, RiskLevel, ScreeningType, TransactionType},
};
use chrono::NaiveDate;
use std::collections::VecDeque;

pub trait Sampler {
    fn entity_id(&mut self) -> EntityId;
    fn business_line(&mut self) -> BusinessLine;
    fn identity(&mut self, as_of: NaiveDate) -> FakeIdentity;
    fn country(&mut self) -> &'static str;
    /// Days between the as-of date and the customer's first simulated day.
    fn lookback_days(&mut self) -> u64;
    fn risk_level(&mut self) -> RiskLevel;
    fn batch_size(&mut self, risk: RiskLevel) -> u64;
    fn day_offset(&mut self) -> u64;
    fn next_type(&mut self, current: ChainState) -> SimResult<TransactionType>;
    fn amount(&mut self, line: BusinessLine) -> f64;
    fn screening_hit(&mut self, risk: RiskLevel) -> bool;
    fn screening_type(&mut self) -> ScreeningType;
    /// Transaction-count cap for one continuation decision.
    fn continuation_threshold(&mut self) -> u64;
}

/// Production sampler: every draw comes from one customer's RNG stream.
pub struct SeededSampler<'a> {
    config: &'a SimConfig,
    sampling: &'a SamplingModel,
    chain: &'a TransitionModel,
    rng: SimRng,
}

impl<'a> SeededSampler<'a> {
    pub fn new(
        config: &'a SimConfig,
        sampling: &'a SamplingModel,
        chain: &'a TransitionModel,
        rng: SimRng,
    ) -> Self {
        Self { config, sampling, chain, rng }
    }
}

impl Sampler for SeededSampler<'_> {
    fn entity_id(&mut self) -> EntityId {
        uuid::Builder::from_random_bytes(self.rng.next_bytes16())
            .into_uuid()
            .to_string()
    }

    fn business_line(&mut self) -> BusinessLine {
        self.sampling.sample_business_line(&mut self.rng)
    }

    fn identity(&mut self, as_of: NaiveDate) -> FakeIdentity {
        IdentityGenerator::generate(&mut self.rng, as_of, self.config.age_range_years)
    }

    fn country(&mut self) -> &'static str {
        IdentityGenerator::country(&mut self.rng)
    }

    fn lookback_days(&mut self) -> u64 {
        let r = self.config.onboarding_lookback_days;
        self.rng.range_inclusive(r.min, r.max)
    }

    fn risk_level(&mut self) -> RiskLevel {
        self.sampling.sample_risk_level(&mut self.rng)
    }

    fn batch_size(&mut self, risk: RiskLevel) -> u64 {
        self.sampling.sample_batch_size(risk, &mut self.rng)
    }

    fn day_offset(&mut self) -> u64 {
        self.sampling.sample_day_offset(&mut self.rng)
    }

    fn next_type(&mut self, current: ChainState) -> SimResult<TransactionType> {
        self.chain.next_type(current, &mut self.rng)
    }

    fn amount(&mut self, line: BusinessLine) -> f64 {
        self.sampling.sample_amount(line, &mut self.rng)
    }

    fn screening_hit(&mut self, risk: RiskLevel) -> bool {
        self.sampling.sample_screening_hit(risk, &mut self.rng)
    }

    fn screening_type(&mut self) -> ScreeningType {
        self.sampling.sample_screening_type(&mut self.rng)
    }

    fn continuation_threshold(&mut self) -> u64 {
        let r = self.config.continuation_threshold;
        self.rng.range_inclusive(r.min, r.max)
    }
}

/// A sampler that replays scripted values before falling back to a
/// seeded stream. Used to drive specific scenarios end to end.
pub struct ScriptedSampler<S> {
    inner: S,
    pub business_line: Option<BusinessLine>,
    pub risk_level: Option<RiskLevel>,
    pub batch_sizes: VecDeque<u64>,
    pub amounts: VecDeque<f64>,
    pub screening_hits: VecDeque<bool>,
    pub thresholds: VecDeque<u64>,
}

impl<S: Sampler> ScriptedSampler<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            business_line: None,
            risk_level: None,
            batch_sizes: VecDeque::new(),
            amounts: VecDeque::new(),
            screening_hits: VecDeque::new(),
            thresholds: VecDeque::new(),
        }
    }

    pub fn with_business_line(mut self, line: BusinessLine) -> Self {
        self.business_line = Some(line);
        self
    }

    pub fn with_risk_level(mut self, risk: RiskLevel) -> Self {
        self.risk_level = Some(risk);
        self
    }

    pub fn with_batch_sizes(mut self, sizes: impl IntoIterator<Item = u64>) -> Self {
        self.batch_sizes.extend(sizes);
        self
    }

    pub fn with_amounts(mut self, amounts: impl IntoIterator<Item = f64>) -> Self {
        self.amounts.extend(amounts);
        self
    }

    pub fn with_screening_hits(mut self, hits: impl IntoIterator<Item = bool>) -> Self {
        self.screening_hits.extend(hits);
        self
    }

    pub fn with_thresholds(mut self, thresholds: impl IntoIterator<Item = u64>) -> Self {
        self.thresholds.extend(thresholds);
        self
    }
}

impl<S: Sampler> Sampler for ScriptedSampler<S> {
    fn entity_id(&mut self) -> EntityId {
        self.inner.entity_id()
    }

    fn business_line(&mut self) -> BusinessLine {
        let drawn = self.inner.business_line();
        self.business_line.unwrap_or(drawn)
    }

    fn identity(&mut self, as_of: NaiveDate) -> FakeIdentity {
        self.inner.identity(as_of)
    }

    fn country(&mut self) -> &'static str {
        self.inner.country()
    }

    fn lookback_days(&mut self) -> u64 {
        self.inner.lookback_days()
    }

    fn risk_level(&mut self) -> RiskLevel {
        let drawn = self.inner.risk_level();
        self.risk_level.unwrap_or(drawn)
    }

    fn batch_size(&mut self, risk: RiskLevel) -> u64 {
        let drawn = self.inner.batch_size(risk);
        self.batch_sizes.pop_front().unwrap_or(drawn)
    }

    fn day_offset(&mut self) -> u64 {
        self.inner.day_offset()
    }

    fn next_type(&mut self, current: ChainState) -> SimResult<TransactionType> {
        self.inner.next_type(current)
    }

    fn amount(&mut self, line: BusinessLine) -> f64 {
        let drawn = self.inner.amount(line);
        self.amounts.pop_front().unwrap_or(drawn)
    }

    fn screening_hit(&mut self, risk: RiskLevel) -> bool {
        let drawn = self.inner.screening_hit(risk);
        self.screening_hits.pop_front().unwrap_or(drawn)
    }

    fn screening_type(&mut self) -> ScreeningType {
        self.inner.screening_type()
    }

    fn continuation_threshold(&mut self) -> u64 {
        let drawn = self.inner.continuation_threshold();
        self.thresholds.pop_front().unwrap_or(drawn)
    }
}
