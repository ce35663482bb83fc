//! Sampling primitives: the three distributions behind customer behaviour.
//!
//!   - weighted categorical: risk level, screening hit
//!   - Poisson:              transactions per batch, mean by risk level
//!   - log-normal:           transaction amount, parameters by business line
//!
//! Distributions are built once from validated config and reused for
//! every draw. All draws take the caller's RNG stream.

use crate::{
    config::{RiskTable, SamplingConfig},
    error::{SimError, SimResult},
    rng::SimRng,
    types::{BusinessLine, RiskLevel, ScreeningType},
};
use rand_distr::{LogNormal, Poisson};

/// Smallest amount a transaction can carry, one minor currency unit.
pub const MIN_AMOUNT: f64 = 0.01;

#[derive(Debug, Clone)]
pub struct SamplingModel {
    risk_weights: [(RiskLevel, f64); 3],
    batch_size: RiskTable<Poisson<f64>>,
    amount_markets: LogNormal<f64>,
    amount_other: LogNormal<f64>,
    screening_hit_high: f64,
    screening_hit_other: f64,
    day_offset_min: u64,
    day_offset_max: u64,
}

impl SamplingModel {
    pub fn new(config: &SamplingConfig) -> SimResult<Self> {
        let poisson = |risk: RiskLevel| {
            let mean = config.batch_size_means.get(risk);
            Poisson::new(mean)
                .map_err(|e| SimError::config(format!("batch size mean {mean} for {risk}: {e}")))
        };
        let log_normal = |line: BusinessLine| {
            let p = config.amount.for_line(line);
            LogNormal::new(p.mu, p.sigma)
                .map_err(|e| SimError::config(format!("amount distribution for {line}: {e}")))
        };
        let w = config.risk_level_weights;

        Ok(Self {
            risk_weights: [
                (RiskLevel::Low, w.low),
                (RiskLevel::Medium, w.medium),
                (RiskLevel::High, w.high),
            ],
            batch_size: RiskTable {
                low: poisson(RiskLevel::Low)?,
                medium: poisson(RiskLevel::Medium)?,
                high: poisson(RiskLevel::High)?,
            },
            amount_markets: log_normal(BusinessLine::MarketsAndBanking)?,
            amount_other: log_normal(BusinessLine::Retail)?,
            screening_hit_high: config.screening_hit_chance.high_risk,
            screening_hit_other: config.screening_hit_chance.other,
            day_offset_min: config.day_offset.min,
            day_offset_max: config.day_offset.max,
        })
    }

    pub fn sample_risk_level(&self, rng: &mut SimRng) -> RiskLevel {
        *rng.weighted(&self.risk_weights)
    }

    pub fn sample_business_line(&self, rng: &mut SimRng) -> BusinessLine {
        *rng.pick(&BusinessLine::ALL)
    }

    /// Higher risk customers transact more per simulated period.
    pub fn sample_batch_size(&self, risk: RiskLevel, rng: &mut SimRng) -> u64 {
        let draw: f64 = rng.sample(&self.batch_size.get(risk));
        draw as u64
    }

    /// Positive, right-skewed, rounded to cents.
    pub fn sample_amount(&self, line: BusinessLine, rng: &mut SimRng) -> f64 {
        let dist = match line {
            BusinessLine::MarketsAndBanking => &self.amount_markets,
            BusinessLine::Retail | BusinessLine::InternationalPersonal => &self.amount_other,
        };
        round_to_cents(rng.sample(dist)).max(MIN_AMOUNT)
    }

    pub fn sample_screening_hit(&self, risk: RiskLevel, rng: &mut SimRng) -> bool {
        let p = match risk {
            RiskLevel::High => self.screening_hit_high,
            RiskLevel::Low | RiskLevel::Medium => self.screening_hit_other,
        };
        rng.chance(p)
    }

    pub fn sample_screening_type(&self, rng: &mut SimRng) -> ScreeningType {
        *rng.pick(&ScreeningType::ALL)
    }

    /// Days to advance the simulated clock before the next transaction.
    pub fn sample_day_offset(&self, rng: &mut SimRng) -> u64 {
        rng.range_inclusive(self.day_offset_min, self.day_offset_max)
    }
}

pub fn round_to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
