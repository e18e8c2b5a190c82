use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A financial goal a product is suitable for and a user can select.
///
/// Serialises as the human label ("Tax Saving"); the compact variant name
/// ("TaxSaving") is accepted on input as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Goal {
    #[serde(rename = "Tax Saving", alias = "TaxSaving")]
    TaxSaving,
    #[serde(rename = "Wealth Creation", alias = "WealthCreation")]
    WealthCreation,
    #[serde(rename = "Life Cover", alias = "LifeCover")]
    LifeCover,
    #[serde(rename = "Health Security", alias = "HealthSecurity")]
    HealthSecurity,
    #[serde(rename = "Emergency Fund", alias = "EmergencyFund")]
    EmergencyFund,
    #[serde(rename = "Retirement Planning", alias = "RetirementPlanning")]
    RetirementPlanning,
    #[serde(rename = "Child Education", alias = "ChildEducation")]
    ChildEducation,
    #[serde(rename = "Estate Planning", alias = "EstatePlanning")]
    EstatePlanning,
}

impl Goal {
    pub const ALL: [Goal; 8] = [
        Goal::TaxSaving,
        Goal::WealthCreation,
        Goal::LifeCover,
        Goal::HealthSecurity,
        Goal::EmergencyFund,
        Goal::RetirementPlanning,
        Goal::ChildEducation,
        Goal::EstatePlanning,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Goal::TaxSaving => "Tax Saving",
            Goal::WealthCreation => "Wealth Creation",
            Goal::LifeCover => "Life Cover",
            Goal::HealthSecurity => "Health Security",
            Goal::EmergencyFund => "Emergency Fund",
            Goal::RetirementPlanning => "Retirement Planning",
            Goal::ChildEducation => "Child Education",
            Goal::EstatePlanning => "Estate Planning",
        }
    }

    fn compact(self) -> &'static str {
        match self {
            Goal::TaxSaving => "TaxSaving",
            Goal::WealthCreation => "WealthCreation",
            Goal::LifeCover => "LifeCover",
            Goal::HealthSecurity => "HealthSecurity",
            Goal::EmergencyFund => "EmergencyFund",
            Goal::RetirementPlanning => "RetirementPlanning",
            Goal::ChildEducation => "ChildEducation",
            Goal::EstatePlanning => "EstatePlanning",
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Goal {
    type Err = UnknownVariant;

    /// Matching is exact (case-sensitive) against either the label or the compact name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Goal::ALL
            .into_iter()
            .find(|g| g.label() == s || g.compact() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];

    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RiskLevel {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RiskLevel::ALL
            .into_iter()
            .find(|r| r.label() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown value '{0}'")]
pub struct UnknownVariant(pub String);

/// A normalized catalog product. Built once at catalog load and never mutated.
///
/// Invariants (enforced by the normalizer): `min_age <= max_age`,
/// `premium_factor > 0`, `suitable_for` and `risk` non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    pub min_age: u32,
    pub max_age: u32,
    pub min_income: f64,
    pub premium_factor: f64,
    pub tax_benefit: bool,
    pub suitable_for: BTreeSet<Goal>,
    pub risk: BTreeSet<RiskLevel>,
}

impl ProductRecord {
    pub fn covers_age(&self, age: u32) -> bool {
        self.min_age <= age && age <= self.max_age
    }

    pub fn affordable_at(&self, income: f64) -> bool {
        income >= self.min_income
    }
}
