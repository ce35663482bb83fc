use crate::{
    error::{SimError, SimResult},
    types::{BusinessLine, ChainState, RiskLevel, TransactionType},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One value per risk level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RiskTable<T> {
    pub low: T,
    pub medium: T,
    pub high: T,
}

impl<T: Copy> RiskTable<T> {
    pub fn get(&self, risk: RiskLevel) -> T {
        match risk {
            RiskLevel::Low    => self.low,
            RiskLevel::Medium => self.medium,
            RiskLevel::High   => self.high,
        }
    }
}

/// Parameters of the underlying normal distribution of a log-normal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LogNormalParams {
    pub mu: f64,
    pub sigma: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AmountConfig {
    /// GBIS customers trade in much larger tickets.
    pub markets_and_banking: LogNormalParams,
    pub other_lines: LogNormalParams,
}

impl AmountConfig {
    pub fn for_line(&self, line: BusinessLine) -> LogNormalParams {
        match line {
            BusinessLine::MarketsAndBanking => self.markets_and_banking,
            BusinessLine::Retail | BusinessLine::InternationalPersonal => self.other_lines,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScreeningHitConfig {
    pub high_risk: f64,
    pub other: f64,
}

/// Inclusive integer range `[min, max]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct InclusiveRange {
    pub min: u64,
    pub max: u64,
}

impl InclusiveRange {
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, v: u64) -> bool {
        (self.min..=self.max).contains(&v)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SamplingConfig {
    pub risk_level_weights: RiskTable<f64>,
    /// Poisson mean of the batch size.
    pub batch_size_means: RiskTable<f64>,
    pub amount: AmountConfig,
    pub screening_hit_chance: ScreeningHitConfig,
    /// Days between consecutive transactions.
    pub day_offset: InclusiveRange,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TransitionEdge {
    #[serde(rename = "type")]
    pub to: TransactionType,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransitionRow {
    pub from: ChainState,
    pub to: Vec<TransitionEdge>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimConfig {
    pub sampling: SamplingConfig,
    /// Amounts strictly above this are suspicious for non-High customers.
    pub suspicious_amount_threshold: f64,
    /// Transaction-count cap, re-drawn at every continuation decision.
    pub continuation_threshold: InclusiveRange,
    /// How far before the as-of date a customer's history starts.
    pub onboarding_lookback_days: InclusiveRange,
    pub age_range_years: InclusiveRange,
    /// Maximum stage executions per customer before the run is abandoned.
    pub step_limit: u32,
    /// Anchor date for onboarding. `None` means today.
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
    pub transitions: Vec<TransitionRow>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            sampling: SamplingConfig {
                risk_level_weights: RiskTable { low: 0.6, medium: 0.3, high: 0.1 },
                batch_size_means: RiskTable { low: 5.0, medium: 10.0, high: 20.0 },
                amount: AmountConfig {
                    markets_and_banking: LogNormalParams { mu: 10.0, sigma: 1.5 },
                    other_lines: LogNormalParams { mu: 5.0, sigma: 1.0 },
                },
                screening_hit_chance: ScreeningHitConfig { high_risk: 0.01, other: 0.001 },
                day_offset: InclusiveRange::new(1, 30),
            },
            suspicious_amount_threshold: 50_000.0,
            continuation_threshold: InclusiveRange::new(200, 280),
            onboarding_lookback_days: InclusiveRange::new(365, 1825),
            age_range_years: InclusiveRange::new(18, 90),
            step_limit: 300,
            as_of: None,
            transitions: default_transitions(),
        }
    }
}

impl SimConfig {
    /// Load from a JSON file. In tests, use SimConfig::default_test().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: SimConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults with a pinned as-of date so test output never depends
    /// on the wall clock.
    pub fn default_test() -> Self {
        Self {
            as_of: NaiveDate::from_ymd_opt(2024, 1, 1),
            ..Self::default()
        }
    }

    /// Check every scalar parameter. The transition table is checked
    /// by `TransitionModel::from_config`.
    pub fn validate(&self) -> SimResult<()> {
        let s = &self.sampling;

        let w = s.risk_level_weights;
        for (risk, weight) in RiskLevel::ALL.iter().map(|r| (r, w.get(*r))) {
            if !(weight >= 0.0) {
                return Err(SimError::config(format!("risk weight for {risk} is {weight}")));
            }
        }
        let total = w.low + w.medium + w.high;
        if (total - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(SimError::config(format!("risk weights sum to {total}, expected 1.0")));
        }

        for risk in RiskLevel::ALL {
            let mean = s.batch_size_means.get(risk);
            if !(mean > 0.0 && mean.is_finite()) {
                return Err(SimError::config(format!("batch size mean for {risk} is {mean}")));
            }
        }

        for line in BusinessLine::ALL {
            let p = s.amount.for_line(line);
            if !p.mu.is_finite() || !(p.sigma > 0.0 && p.sigma.is_finite()) {
                return Err(SimError::config(format!(
                    "amount parameters for {line} are mu={} sigma={}",
                    p.mu, p.sigma
                )));
            }
        }

        let hit = s.screening_hit_chance;
        for p in [hit.high_risk, hit.other] {
            if !(0.0..=1.0).contains(&p) {
                return Err(SimError::config(format!("screening hit chance {p} outside [0, 1]")));
            }
        }

        if s.day_offset.min == 0 {
            return Err(SimError::config("day offset must be at least one day"));
        }
        for (name, r) in [
            ("day_offset", s.day_offset),
            ("continuation_threshold", self.continuation_threshold),
            ("onboarding_lookback_days", self.onboarding_lookback_days),
            ("age_range_years", self.age_range_years),
        ] {
            if r.min > r.max {
                return Err(SimError::config(format!("{name} range {}..={} is empty", r.min, r.max)));
            }
            if r.max == u64::MAX {
                return Err(SimError::config(format!("{name} range {}..={} is unbounded", r.min, r.max)));
            }
        }
        if self.age_range_years.max > MAX_AGE_YEARS {
            return Err(SimError::config(format!(
                "age range upper bound {} exceeds {MAX_AGE_YEARS} years",
                self.age_range_years.max
            )));
        }

        if !(self.suspicious_amount_threshold > 0.0) {
            return Err(SimError::config("suspicious amount threshold must be positive"));
        }
        if self.step_limit == 0 {
            return Err(SimError::config("step limit must be positive"));
        }
        Ok(())
    }

    /// The date onboarding counts back from.
    pub fn anchor_date(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

/// Tolerance used when checking that probability weights sum to one.
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Oldest age a generated customer may have.
pub const MAX_AGE_YEARS: u64 = 150;

fn row(from: ChainState, to: &[(TransactionType, f64)]) -> TransitionRow {
    TransitionRow {
        from,
        to: to.iter().map(|&(to, weight)| TransitionEdge { to, weight }).collect(),
    }
}

fn default_transitions() -> Vec<TransitionRow> {
    use ChainState::{After, Start};
    use TransactionType::*;
    vec![
        row(Start, &[(Deposit, 0.4), (InternationalTransfer, 0.3), (SecuritiesTrade, 0.3)]),
        row(After(Deposit), &[(Withdrawal, 0.5), (CardPayment, 0.5)]),
        row(After(Withdrawal), &[(Deposit, 0.3), (CardPayment, 0.7)]),
        row(After(CardPayment), &[(CardPayment, 0.6), (Deposit, 0.2), (Withdrawal, 0.2)]),
        row(After(InternationalTransfer), &[(CurrencyExchange, 0.8), (CardPayment, 0.2)]),
        row(After(CurrencyExchange), &[(InternationalTransfer, 0.5), (SecuritiesTrade, 0.5)]),
        row(
            After(SecuritiesTrade),
            &[(BondPurchase, 0.6), (DerivativesTrade, 0.3), (AssetManagementFee, 0.1)],
        ),
        row(After(BondPurchase), &[(SecuritiesTrade, 0.7), (AssetManagementFee, 0.3)]),
        row(After(DerivativesTrade), &[(SecuritiesTrade, 0.9), (AssetManagementFee, 0.1)]),
        row(After(LoanRepayment), &[(CardPayment, 1.0)]),
        row(After(AssetManagementFee), &[(SecuritiesTrade, 1.0)]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        SimConfig::default().validate().unwrap();
        SimConfig::default_test().validate().unwrap();
    }

    #[test]
    fn shipped_config_file_matches_defaults() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../data/bank_config.json");
        let loaded = SimConfig::load(path).unwrap();
        let expected = SimConfig { as_of: loaded.as_of, ..SimConfig::default() };
        assert_eq!(loaded, expected);
    }

    #[test]
    fn unbalanced_risk_weights_are_rejected() {
        let mut config = SimConfig::default_test();
        config.sampling.risk_level_weights.high = 0.5;
        let err = config.validate().unwrap_err();
        assert!(!err.is_customer_fatal());
        assert!(err.to_string().contains("risk weights"), "{err}");
    }

    #[test]
    fn zero_day_offset_is_rejected() {
        let mut config = SimConfig::default_test();
        config.sampling.day_offset = InclusiveRange::new(0, 30);
        assert!(config.validate().is_err());
    }

    #[test]
    fn non_positive_poisson_mean_is_rejected() {
        let mut config = SimConfig::default_test();
        config.sampling.batch_size_means.medium = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn unbounded_ranges_are_rejected() {
        let mut config = SimConfig::default_test();
        config.continuation_threshold = InclusiveRange::new(0, u64::MAX);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("continuation_threshold"), "{err}");

        let mut config = SimConfig::default_test();
        config.sampling.day_offset = InclusiveRange::new(1, u64::MAX);
        assert!(config.validate().is_err());
    }

    #[test]
    fn implausible_ages_are_rejected() {
        let mut config = SimConfig::default_test();
        config.age_range_years = InclusiveRange::new(18, MAX_AGE_YEARS + 1);
        assert!(config.validate().is_err());

        config.age_range_years = InclusiveRange::new(18, MAX_AGE_YEARS);
        assert!(config.validate().is_ok());
    }
}
