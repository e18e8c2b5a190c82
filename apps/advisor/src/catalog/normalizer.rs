//! Product normalizer: turns a loosely-typed catalog row into a `ProductRecord`.
//!
//! Catalog sources disagree on encodings: numbers arrive as strings, and the
//! `suitableFor` / `risk` columns arrive either as real lists or as strings such as
//! `"['TaxSaving','LifeCover']"`. Everything is funnelled through `FieldValue` first.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::models::product::{Goal, ProductRecord, RiskLevel};

/// A single cell after numeric coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    fn as_u32(&self) -> Option<u32> {
        match self {
            FieldValue::Integer(i) => u32::try_from(*i).ok(),
            FieldValue::Float(f) if f.fract() == 0.0 && *f >= 0.0 && *f <= u32::MAX as f64 => {
                Some(*f as u32)
            }
            _ => None,
        }
    }

    fn as_text(&self) -> String {
        match self {
            FieldValue::Integer(i) => i.to_string(),
            FieldValue::Float(f) => f.to_string(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Text(s) => s.clone(),
            FieldValue::List(items) => items.join(", "),
        }
    }
}

/// One catalog row keyed by header name.
pub type RawProductRow = BTreeMap<String, FieldValue>;

#[derive(Debug, Error, PartialEq)]
pub enum CatalogRowError {
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("field '{field}' is not numeric: {value:?}")]
    NotNumeric { field: &'static str, value: String },

    #[error("minAge {min_age} is greater than maxAge {max_age}")]
    InvalidAgeRange { min_age: u32, max_age: u32 },

    #[error("premiumFactor must be positive, got {0}")]
    NonPositivePremiumFactor(f64),

    #[error("field '{0}' has no recognised values")]
    EmptyTagSet(&'static str),
}

fn integer_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d+$").expect("valid integer regex"))
}

fn decimal_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d+\.\d+$").expect("valid decimal regex"))
}

/// Coerces a raw string cell: all-digit strings become integers, `digits.digits`
/// become floats, anything else passes through as text.
pub fn coerce_field(raw: &str) -> FieldValue {
    if integer_pattern().is_match(raw) {
        if let Ok(value) = raw.parse::<i64>() {
            return FieldValue::Integer(value);
        }
    }
    if decimal_pattern().is_match(raw) {
        if let Ok(value) = raw.parse::<f64>() {
            return FieldValue::Float(value);
        }
    }
    FieldValue::Text(raw.to_string())
}

/// Splits a bracket/quote-decorated list string into trimmed, non-empty tokens.
///
/// `"['TaxSaving', 'LifeCover']"` → `["TaxSaving", "LifeCover"]`.
pub fn split_encoded_list(raw: &str) -> Vec<String> {
    raw.chars()
        .filter(|c| !matches!(c, '[' | ']' | '\'' | '"'))
        .collect::<String>()
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses tokens into a set of enum values. Unrecognised tokens are dropped silently.
pub fn parse_tag_set<T>(tokens: &[String]) -> BTreeSet<T>
where
    T: FromStr + Ord,
{
    tokens
        .iter()
        .flat_map(|token| split_encoded_list(token))
        .filter_map(|token| token.parse::<T>().ok())
        .collect()
}

fn tag_tokens(value: &FieldValue) -> Vec<String> {
    match value {
        FieldValue::List(items) => items.clone(),
        other => split_encoded_list(&other.as_text()),
    }
}

fn required<'a>(row: &'a RawProductRow, field: &'static str) -> Result<&'a FieldValue, CatalogRowError> {
    row.get(field).ok_or(CatalogRowError::MissingField(field))
}

fn required_f64(row: &RawProductRow, field: &'static str) -> Result<f64, CatalogRowError> {
    let value = required(row, field)?;
    value.as_f64().ok_or_else(|| CatalogRowError::NotNumeric {
        field,
        value: value.as_text(),
    })
}

fn required_u32(row: &RawProductRow, field: &'static str) -> Result<u32, CatalogRowError> {
    let value = required(row, field)?;
    value.as_u32().ok_or_else(|| CatalogRowError::NotNumeric {
        field,
        value: value.as_text(),
    })
}

fn optional_text(row: &RawProductRow, field: &str) -> Option<String> {
    row.get(field)
        .map(FieldValue::as_text)
        .filter(|s| !s.is_empty())
}

fn parse_tax_benefit(value: Option<&FieldValue>) -> bool {
    match value {
        Some(FieldValue::Bool(b)) => *b,
        Some(FieldValue::Integer(i)) => *i == 1,
        Some(FieldValue::Text(s)) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "yes" | "y" | "1"
        ),
        _ => false,
    }
}

/// Normalizes one row. `position` is the 1-based row number, used as the id
/// when the row carries none.
pub fn normalize_row(row: &RawProductRow, position: usize) -> Result<ProductRecord, CatalogRowError> {
    let min_age = required_u32(row, "minAge")?;
    let max_age = required_u32(row, "maxAge")?;
    let min_income = required_f64(row, "minIncome")?;
    let premium_factor = required_f64(row, "premiumFactor")?;

    if min_age > max_age {
        return Err(CatalogRowError::InvalidAgeRange { min_age, max_age });
    }
    if premium_factor <= 0.0 {
        return Err(CatalogRowError::NonPositivePremiumFactor(premium_factor));
    }

    let suitable_for: BTreeSet<Goal> = row
        .get("suitableFor")
        .map(|v| parse_tag_set(&tag_tokens(v)))
        .unwrap_or_default();
    if suitable_for.is_empty() {
        return Err(CatalogRowError::EmptyTagSet("suitableFor"));
    }

    let risk: BTreeSet<RiskLevel> = row
        .get("risk")
        .map(|v| parse_tag_set(&tag_tokens(v)))
        .unwrap_or_default();
    if risk.is_empty() {
        return Err(CatalogRowError::EmptyTagSet("risk"));
    }

    let name = optional_text(row, "name").ok_or(CatalogRowError::MissingField("name"))?;

    Ok(ProductRecord {
        id: optional_text(row, "id").unwrap_or_else(|| position.to_string()),
        name,
        description: optional_text(row, "description").unwrap_or_default(),
        min_age,
        max_age,
        min_income,
        premium_factor,
        tax_benefit: parse_tax_benefit(row.get("taxBenefit")),
        suitable_for,
        risk,
    })
}
