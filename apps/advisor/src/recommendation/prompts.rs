//! Prompt text for the recommendation model plus the fixed fallback copy shown
//! when the model cannot be reached.

use std::fmt::Write;

use crate::models::profile::UserProfile;
use crate::models::recommendation::MatchedProduct;
use crate::recommendation::template::format_amount;

/// System instruction sent with every recommendation call.
pub const ADVISOR_SYSTEM_PROMPT: &str = "You are an experienced, friendly, and conversational insurance advisor. \
Your job is to understand the user's profile and recommend the most suitable insurance products based only on \
their age, income, financial goals, and risk appetite. Do NOT act like a financial planner. \
Avoid suggesting investments, wealth building, or tax-saving unless it's part of an insurance plan. \
Respond like a human advisor speaking in natural, helpful language. Do not write in formal letter format. \
Avoid using greetings like 'Hello', 'Dear', or 'Respected'. \
Do NOT close your message with 'Best regards', 'Thanks', or 'Have a nice day'. \
Focus entirely on giving clear, helpful, and friendly recommendations - no fluff, no formality.";

pub const NO_PRODUCTS_MARKER: &str = "No products matched the user's criteria.";

const RECOMMENDATION_INSTRUCTION: &str = "Based on the user's profile and the recommended insurance products, \
provide a detailed, personalized recommendation.
Explain why these products are suitable for the user's age, income level, financial goals, and risk appetite.
If there are partial matches, explain why they might still be good options.
Include advice on how the user might optimize their insurance coverage based on their specific situation.
";

/// Banner placed above the template text when no credential is configured.
pub const CONFIGURATION_MISSING_NOTICE: &str = "AI-powered recommendations are currently unavailable due to API configuration issues.

Here's a standard recommendation based on your profile:
-----------------------------------------------------";

/// Note placed below the template text when every model failed.
pub const PROVIDERS_EXHAUSTED_NOTICE: &str = "[Note: We're experiencing technical difficulties with our AI recommendation system. This is a standard recommendation.]";

/// Reply for the raw prompt endpoint when no model produced an answer. It has no
/// profile to work from, so the advice stays generic.
pub const GENERIC_FALLBACK_REPLY: &str = "I'm sorry, but I couldn't generate an AI-powered recommendation at this moment due to technical difficulties.

Based on the information you've provided, here are some general insurance recommendations:

1. For your age group and income level, consider products that balance protection and investment.
2. Given your financial goals, look for products that specifically address those needs.
3. Your risk appetite suggests you might prefer products with moderate risk-return profiles.

Please try again later for a more personalized AI recommendation, or contact our support team for assistance.";

pub const FALLBACK_MESSAGE: &str = "Using fallback response due to API unavailability";

/// Builds the user prompt: profile block, numbered product list (or the
/// no-match marker), then the instruction paragraph.
pub fn build_prompt(profile: &UserProfile, matches: &[MatchedProduct]) -> String {
    let mut prompt = String::new();

    // Writing to a String cannot fail.
    let _ = write!(
        prompt,
        "User Profile:\n\
- Age: {} years\n\
- Annual Income: ₹{}\n\
- Financial Goal: {}\n\
- Risk Appetite: {}\n\
\n\
Recommended Insurance Products:\n",
        profile.age,
        format_amount(profile.income),
        profile.financial_goal,
        profile.risk_appetite,
    );

    if matches.is_empty() {
        prompt.push_str(NO_PRODUCTS_MARKER);
        prompt.push('\n');
    } else {
        for (index, product) in matches.iter().enumerate() {
            let _ = write!(
                prompt,
                "\n{}. {}\n   Description: {}\n   Monthly Premium: ₹{}\n   Annual Premium: ₹{}\n   Tax Benefit: {}\n   {}\n",
                index + 1,
                product.product.name,
                product.product.description,
                format_amount(product.monthly_premium),
                format_amount(product.annual_premium),
                if product.product.tax_benefit { "Yes" } else { "No" },
                if product.partial_match {
                    "(Partial match)"
                } else {
                    "(Exact match)"
                },
            );
        }
    }

    prompt.push('\n');
    prompt.push_str(RECOMMENDATION_INSTRUCTION);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use crate::models::product::{Goal, ProductRecord, RiskLevel};
    use crate::models::recommendation::MatchTier;

    fn reference_profile() -> UserProfile {
        UserProfile::new(30, 500_000.0, Goal::TaxSaving, RiskLevel::Medium).unwrap()
    }

    fn make_match(name: &str, tax_benefit: bool, tier: MatchTier) -> MatchedProduct {
        let product = ProductRecord {
            id: "1".to_string(),
            name: name.to_string(),
            description: "Pure term cover".to_string(),
            min_age: 18,
            max_age: 60,
            min_income: 100_000.0,
            premium_factor: 0.02,
            tax_benefit,
            suitable_for: BTreeSet::from([Goal::TaxSaving]),
            risk: BTreeSet::from([RiskLevel::Medium]),
        };
        MatchedProduct::new(product, 833.33, 833.33 * 12.0, tier, true, true)
    }

    #[test]
    fn test_prompt_contains_profile_block() {
        let prompt = build_prompt(&reference_profile(), &[]);
        assert!(prompt.starts_with("User Profile:\n- Age: 30 years\n"));
        assert!(prompt.contains("- Annual Income: ₹500,000\n"));
        assert!(prompt.contains("- Financial Goal: Tax Saving\n"));
        assert!(prompt.contains("- Risk Appetite: Medium\n"));
    }

    #[test]
    fn test_prompt_marks_empty_match_list() {
        let prompt = build_prompt(&reference_profile(), &[]);
        assert!(prompt.contains(NO_PRODUCTS_MARKER));
        assert!(prompt.trim_end().ends_with("specific situation."));
    }

    #[test]
    fn test_prompt_lists_every_product() {
        let matches = vec![
            make_match("Tax Shield", true, MatchTier::Exact),
            make_match("Term Secure", false, MatchTier::Exact),
        ];
        let prompt = build_prompt(&reference_profile(), &matches);

        assert!(prompt.contains("\n1. Tax Shield\n"));
        assert!(prompt.contains("\n2. Term Secure\n"));
        assert!(prompt.contains("Monthly Premium: ₹833.33"));
        assert!(prompt.contains("Annual Premium: ₹9,999.96"));
        assert!(prompt.contains("Tax Benefit: Yes"));
        assert!(prompt.contains("Tax Benefit: No"));
        assert!(prompt.contains("(Exact match)"));
        assert!(!prompt.contains(NO_PRODUCTS_MARKER));
    }

    #[test]
    fn test_prompt_flags_partial_matches() {
        let matches = vec![make_match("Term Secure", false, MatchTier::Partial)];
        assert!(build_prompt(&reference_profile(), &matches).contains("(Partial match)"));
    }

    #[test]
    fn test_system_prompt_constrains_domain_and_tone() {
        assert!(ADVISOR_SYSTEM_PROMPT.contains("insurance advisor"));
        assert!(ADVISOR_SYSTEM_PROMPT.contains("Do NOT act like a financial planner"));
        assert!(ADVISOR_SYSTEM_PROMPT.contains("'Hello'"));
        assert!(ADVISOR_SYSTEM_PROMPT.contains("'Best regards'"));
    }
}
