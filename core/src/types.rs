//! Shared primitive types used across the entire simulation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A stable, unique identifier for any entity in the simulation.
pub type EntityId = String;

/// The canonical run identifier.
pub type RunId = String;

/// Bank business line. Stored as the legacy line code.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BusinessLine {
    #[serde(rename = "FRB")]
    Retail,
    #[serde(rename = "IRFS")]
    InternationalPersonal,
    #[serde(rename = "GBIS")]
    MarketsAndBanking,
}

impl BusinessLine {
    pub const ALL: [BusinessLine; 3] = [
        BusinessLine::Retail,
        BusinessLine::InternationalPersonal,
        BusinessLine::MarketsAndBanking,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Self::Retail                => "FRB",
            Self::InternationalPersonal => "IRFS",
            Self::MarketsAndBanking     => "GBIS",
        }
    }
}

impl fmt::Display for BusinessLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low    => "Low",
            Self::Medium => "Medium",
            Self::High   => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ScreeningType {
    Sanctions,
    #[serde(rename = "PEP")]
    Pep,
    NegativeNews,
}

impl ScreeningType {
    pub const ALL: [ScreeningType; 3] = [
        ScreeningType::Sanctions,
        ScreeningType::Pep,
        ScreeningType::NegativeNews,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sanctions    => "Sanctions",
            Self::Pep          => "PEP",
            Self::NegativeNews => "NegativeNews",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ScreeningResult {
    Clear,
    Hit,
}

impl ScreeningResult {
    pub const ALL: [ScreeningResult; 2] = [ScreeningResult::Clear, ScreeningResult::Hit];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::Hit   => "Hit",
        }
    }
}

/// Why a customer ended up with a flag report.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FlagReason {
    #[serde(rename = "Sanction Hit")]
    SanctionHit,
    #[serde(rename = "Suspicious Transaction Pattern")]
    SuspiciousTransactionPattern,
}

impl FlagReason {
    pub const ALL: [FlagReason; 2] = [FlagReason::SanctionHit, FlagReason::SuspiciousTransactionPattern];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SanctionHit                  => "Sanction Hit",
            Self::SuspiciousTransactionPattern => "Suspicious Transaction Pattern",
        }
    }
}

/// Transaction categories produced by the transition model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    #[serde(rename = "Card Payment")]
    CardPayment,
    #[serde(rename = "Loan Repayment")]
    LoanRepayment,
    #[serde(rename = "International Transfer")]
    InternationalTransfer,
    #[serde(rename = "Currency Exchange")]
    CurrencyExchange,
    #[serde(rename = "Securities Trade")]
    SecuritiesTrade,
    #[serde(rename = "Bond Purchase")]
    BondPurchase,
    #[serde(rename = "Derivatives Trade")]
    DerivativesTrade,
    #[serde(rename = "Asset Management Fee")]
    AssetManagementFee,
}

impl TransactionType {
    pub const ALL: [TransactionType; 10] = [
        TransactionType::Deposit,
        TransactionType::Withdrawal,
        TransactionType::CardPayment,
        TransactionType::LoanRepayment,
        TransactionType::InternationalTransfer,
        TransactionType::CurrencyExchange,
        TransactionType::SecuritiesTrade,
        TransactionType::BondPurchase,
        TransactionType::DerivativesTrade,
        TransactionType::AssetManagementFee,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Deposit               => "Deposit",
            Self::Withdrawal            => "Withdrawal",
            Self::CardPayment           => "Card Payment",
            Self::LoanRepayment         => "Loan Repayment",
            Self::InternationalTransfer => "International Transfer",
            Self::CurrencyExchange      => "Currency Exchange",
            Self::SecuritiesTrade       => "Securities Trade",
            Self::BondPurchase          => "Bond Purchase",
            Self::DerivativesTrade      => "Derivatives Trade",
            Self::AssetManagementFee    => "Asset Management Fee",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Look up the variant whose stored name is `s`.
fn parse_named<T: Copy>(all: &[T], name: fn(&T) -> &'static str, kind: &str, s: &str) -> Result<T, String> {
    all.iter()
        .copied()
        .find(|v| name(v) == s)
        .ok_or_else(|| format!("unknown {kind} '{s}'"))
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_named(&Self::ALL, Self::label, "transaction type", s)
    }
}

impl FromStr for BusinessLine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_named(&Self::ALL, Self::code, "business line", s)
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_named(&Self::ALL, Self::as_str, "risk level", s)
    }
}

impl FromStr for ScreeningType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_named(&Self::ALL, Self::as_str, "screening type", s)
    }
}

impl FromStr for ScreeningResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_named(&Self::ALL, Self::as_str, "screening result", s)
    }
}

impl FromStr for FlagReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_named(&Self::ALL, Self::as_str, "flag reason", s)
    }
}

/// A state of the transaction-type Markov chain: the `start` sentinel
/// or the last generated transaction type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub enum ChainState {
    Start,
    After(TransactionType),
}

impl ChainState {
    pub const START_LABEL: &'static str = "start";

    pub fn label(&self) -> &'static str {
        match self {
            Self::Start    => Self::START_LABEL,
            Self::After(t) => t.label(),
        }
    }
}

impl fmt::Display for ChainState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<String> for ChainState {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if s == Self::START_LABEL {
            Ok(Self::Start)
        } else {
            s.parse().map(Self::After)
        }
    }
}

impl From<ChainState> for String {
    fn from(state: ChainState) -> Self {
        state.label().to_string()
    }
}

impl From<TransactionType> for ChainState {
    fn from(t: TransactionType) -> Self {
        Self::After(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_state_labels_parse_back() {
        assert_eq!(ChainState::try_from("start".to_string()), Ok(ChainState::Start));
        for t in TransactionType::ALL {
            let parsed = ChainState::try_from(t.label().to_string()).unwrap();
            assert_eq!(parsed, ChainState::After(t));
        }
        assert!(ChainState::try_from("Teleport".to_string()).is_err());
    }

    #[test]
    fn business_line_serializes_as_legacy_code() {
        let json = serde_json::to_string(&BusinessLine::MarketsAndBanking).unwrap();
        assert_eq!(json, "\"GBIS\"");
    }
}
