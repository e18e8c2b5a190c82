//! Deterministic template responder. Used when AI mode is off and as the
//! fallback body for every degraded result.

use crate::models::product::{Goal, RiskLevel};
use crate::models::profile::UserProfile;
use crate::models::recommendation::MatchedProduct;

pub const NO_MATCHES_MESSAGE: &str = "Based on your profile, we couldn't find suitable insurance products. \
Please consider adjusting your preferences or consult with our financial advisors for personalized recommendations.";

const PARTIAL_MATCH_NOTE: &str = "\n\nSome recommendations are based on partial matches to your criteria, \
but still align well with your overall profile.";

const RISK_DESCRIPTIONS: &[(RiskLevel, &str)] = &[
    (RiskLevel::Low, "conservative approach to financial planning"),
    (RiskLevel::Medium, "balanced approach to risk and returns"),
    (RiskLevel::High, "growth-oriented investment strategy"),
];

const GOAL_DESCRIPTIONS: &[(Goal, &str)] = &[
    (Goal::TaxSaving, "optimize your tax liabilities"),
    (Goal::WealthCreation, "build wealth over the long term"),
    (Goal::LifeCover, "provide financial security for your loved ones"),
    (Goal::HealthSecurity, "secure your health and well-being"),
    (Goal::EmergencyFund, "prepare for unexpected financial needs"),
    (Goal::RetirementPlanning, "ensure a comfortable retirement"),
    (Goal::ChildEducation, "secure your child's educational future"),
    (Goal::EstatePlanning, "effectively transfer wealth to the next generation"),
];

const GENERIC_RISK_DESCRIPTION: &str = "personalized investment strategy";
const GENERIC_GOAL_DESCRIPTION: &str = "meet your specific financial objectives";

fn describe_risk(risk: RiskLevel) -> &'static str {
    RISK_DESCRIPTIONS
        .iter()
        .find(|(level, _)| *level == risk)
        .map(|(_, text)| *text)
        .unwrap_or(GENERIC_RISK_DESCRIPTION)
}

fn describe_goal(goal: Goal) -> &'static str {
    GOAL_DESCRIPTIONS
        .iter()
        .find(|(g, _)| *g == goal)
        .map(|(_, text)| *text)
        .unwrap_or(GENERIC_GOAL_DESCRIPTION)
}

/// "A", "A and B", "A, B and C".
pub fn join_names(names: &[&str]) -> String {
    match names {
        [] => String::new(),
        [only] => only.to_string(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

/// Formats an amount with thousands separators and up to three fraction digits,
/// trailing zeros trimmed: `500000.0` → `500,000`, `9999.96` → `9,999.96`.
pub fn format_amount(value: f64) -> String {
    let scaled = (value.abs() * 1000.0).round() as u64;
    let whole = (scaled / 1000).to_string();
    let fraction = scaled % 1000;

    let mut out = String::with_capacity(whole.len() + whole.len() / 3 + 5);
    if value < 0.0 && scaled > 0 {
        out.push('-');
    }
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if fraction > 0 {
        let digits = format!("{fraction:03}");
        out.push('.');
        out.push_str(digits.trim_end_matches('0'));
    }
    out
}

/// Renders the fixed-template recommendation. Same inputs, same text.
pub fn render(profile: &UserProfile, matches: &[MatchedProduct]) -> String {
    if matches.is_empty() {
        return NO_MATCHES_MESSAGE.to_string();
    }

    let names: Vec<&str> = matches.iter().map(MatchedProduct::name).collect();
    let partial_note = if matches.iter().any(|m| m.partial_match) {
        PARTIAL_MATCH_NOTE
    } else {
        ""
    };

    format!(
        "As a {age}-year-old with a {risk} risk appetite (a {risk_desc}) \
and a primary goal of {goal} (looking to {goal_desc}), we recommend {names}.\n\n\
These products align well with your financial profile and can help you achieve your objectives \
while staying within your risk comfort zone. The estimated premiums are based on your annual income \
of ₹{income}.{partial_note}\n\n\
We suggest scheduling a consultation with a financial advisor to customize these recommendations \
further based on your specific needs and circumstances.",
        age = profile.age,
        risk = profile.risk_appetite.label().to_lowercase(),
        risk_desc = describe_risk(profile.risk_appetite),
        goal = profile.financial_goal,
        goal_desc = describe_goal(profile.financial_goal),
        names = join_names(&names),
        income = format_amount(profile.income),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use crate::models::product::ProductRecord;
    use crate::models::recommendation::MatchTier;

    fn make_match(name: &str, tier: MatchTier) -> MatchedProduct {
        let product = ProductRecord {
            id: name.to_string(),
            name: name.to_string(),
            description: String::new(),
            min_age: 18,
            max_age: 60,
            min_income: 0.0,
            premium_factor: 0.02,
            tax_benefit: false,
            suitable_for: BTreeSet::from([Goal::TaxSaving]),
            risk: BTreeSet::from([RiskLevel::Medium]),
        };
        let partial = tier == MatchTier::Partial;
        MatchedProduct::new(product, 833.33, 9999.96, tier, true, !partial)
    }

    fn reference_profile() -> UserProfile {
        UserProfile::new(30, 500_000.0, Goal::TaxSaving, RiskLevel::Medium).unwrap()
    }

    #[test]
    fn test_no_matches_returns_fixed_message() {
        assert_eq!(render(&reference_profile(), &[]), NO_MATCHES_MESSAGE);
    }

    #[test]
    fn test_join_names_oxford_and() {
        assert_eq!(join_names(&["A"]), "A");
        assert_eq!(join_names(&["A", "B"]), "A and B");
        assert_eq!(join_names(&["A", "B", "C"]), "A, B and C");
        assert_eq!(join_names(&[]), "");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(500_000.0), "500,000");
        assert_eq!(format_amount(833.33), "833.33");
        assert_eq!(format_amount(833.33 * 12.0), "9,999.96");
        assert_eq!(format_amount(1_234_567.5), "1,234,567.5");
        assert_eq!(format_amount(999.0), "999");
        assert_eq!(format_amount(0.0), "0");
    }

    #[test]
    fn test_render_exact_matches() {
        let matches = vec![
            make_match("Tax Shield", MatchTier::Exact),
            make_match("Term Secure", MatchTier::Exact),
        ];
        let text = render(&reference_profile(), &matches);

        assert!(text.starts_with("As a 30-year-old with a medium risk appetite (a balanced approach to risk and returns)"));
        assert!(text.contains("a primary goal of Tax Saving (looking to optimize your tax liabilities)"));
        assert!(text.contains("we recommend Tax Shield and Term Secure."));
        assert!(text.contains("annual income of ₹500,000."));
        assert!(!text.contains("partial matches"));
        assert!(text.ends_with("based on your specific needs and circumstances."));
    }

    #[test]
    fn test_render_notes_partial_matches() {
        let matches = vec![make_match("Term Secure", MatchTier::Partial)];
        let text = render(&reference_profile(), &matches);
        assert!(text.contains("we recommend Term Secure."));
        assert!(text.contains(PARTIAL_MATCH_NOTE));
    }

    #[test]
    fn test_render_is_deterministic() {
        let matches = vec![
            make_match("A", MatchTier::Exact),
            make_match("B", MatchTier::Exact),
            make_match("C", MatchTier::Exact),
        ];
        let profile = reference_profile();
        assert_eq!(render(&profile, &matches), render(&profile, &matches));
        assert!(render(&profile, &matches).contains("we recommend A, B and C."));
    }

    #[test]
    fn test_every_enum_value_has_a_description() {
        for goal in Goal::ALL {
            assert_ne!(describe_goal(goal), GENERIC_GOAL_DESCRIPTION);
        }
        for risk in RiskLevel::ALL {
            assert_ne!(describe_risk(risk), GENERIC_RISK_DESCRIPTION);
        }
    }
}
