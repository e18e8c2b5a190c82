use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::product::{Goal, RiskLevel};

pub const MIN_AGE: u32 = 18;
pub const MAX_AGE: u32 = 100;

#[derive(Debug, Error, PartialEq)]
pub enum ProfileError {
    #[error("age must be between 18 and 100, got {0}")]
    AgeOutOfRange(u32),

    #[error("income must be a positive number, got {0}")]
    InvalidIncome(f64),
}

/// The per-request profile a user submits. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub age: u32,
    pub income: f64,
    pub financial_goal: Goal,
    pub risk_appetite: RiskLevel,
}

impl UserProfile {
    pub fn new(
        age: u32,
        income: f64,
        financial_goal: Goal,
        risk_appetite: RiskLevel,
    ) -> Result<Self, ProfileError> {
        let profile = Self {
            age,
            income,
            financial_goal,
            risk_appetite,
        };
        profile.validate()?;
        Ok(profile)
    }

    /// Checks the range constraints. Deserialized profiles must pass through here
    /// before reaching the matcher.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if !(MIN_AGE..=MAX_AGE).contains(&self.age) {
            return Err(ProfileError::AgeOutOfRange(self.age));
        }
        if !self.income.is_finite() || self.income <= 0.0 {
            return Err(ProfileError::InvalidIncome(self.income));
        }
        Ok(())
    }
}
