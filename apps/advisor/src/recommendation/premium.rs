//! Premium estimation for a matched product.

/// Monthly and annual premium for one product at one income.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PremiumEstimate {
    pub monthly: f64,
    pub annual: f64,
}

/// Rounds half away from zero to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `monthly = round2(income * factor / 12)`; `annual` is derived from the rounded
/// monthly figure so the two always reconcile exactly.
pub fn estimate(income: f64, premium_factor: f64) -> PremiumEstimate {
    let monthly = round2(income * premium_factor / 12.0);
    PremiumEstimate {
        monthly,
        annual: monthly * 12.0,
    }
}
