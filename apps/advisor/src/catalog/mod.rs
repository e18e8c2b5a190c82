//! Product catalog: loaded once at startup, read-only afterwards.
//!
//! Rows that fail normalization are logged and skipped; a bad row never aborts the load.

pub mod normalizer;

use std::io::Read;
use std::path::Path;

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::normalizer::{coerce_field, normalize_row, FieldValue, RawProductRow};
use crate::models::product::ProductRecord;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed CSV catalog: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed JSON catalog: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JSON catalog must be an array of objects")]
    NotAnArray,
}

/// Counts from a single load, for startup logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ProductCatalog {
    products: Vec<ProductRecord>,
}

impl ProductCatalog {
    #[cfg(test)]
    pub fn from_products(products: Vec<ProductRecord>) -> Self {
        Self { products }
    }

    pub fn products(&self) -> &[ProductRecord] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Loads a catalog file. `.json` files are parsed as JSON, everything else as CSV.
    pub fn load(path: &Path) -> Result<(Self, LoadReport), CatalogError> {
        info!("Loading product catalog from {}", path.display());
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json {
            let text = std::fs::read_to_string(path)?;
            Self::from_json_str(&text)
        } else {
            Self::from_csv_reader(std::fs::File::open(path)?)
        }
    }

    /// Parses comma-separated text with a header row. Fields may be double-quoted.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<(Self, LoadReport), CatalogError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let mut rows = Vec::new();
        let mut undecodable = 0;
        for record in csv_reader.records() {
            let position = rows.len() + undecodable + 1;
            let record = match record {
                Ok(record) => record,
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => {
                    warn!("Skipping catalog row {position}: {e}");
                    undecodable += 1;
                    continue;
                }
            };
            if record.iter().all(|field| field.is_empty()) {
                continue;
            }
            let row: RawProductRow = headers
                .iter()
                .zip(record.iter())
                .map(|(header, field)| (header.to_string(), coerce_field(field)))
                .collect();
            rows.push((position, row));
        }

        Ok(Self::from_rows(rows, undecodable))
    }

    /// Parses a JSON array of product objects. List-valued tag fields may be real
    /// arrays or encoded strings. Items that are not objects are skipped.
    pub fn from_json_str(text: &str) -> Result<(Self, LoadReport), CatalogError> {
        let value: Value = serde_json::from_str(text)?;
        let Value::Array(items) = value else {
            return Err(CatalogError::NotAnArray);
        };

        let mut rows = Vec::with_capacity(items.len());
        let mut malformed = 0;
        for (index, item) in items.into_iter().enumerate() {
            let position = index + 1;
            let fields = match item {
                Value::Object(fields) => fields,
                other => {
                    warn!("Skipping catalog row {position}: expected an object, got {other}");
                    malformed += 1;
                    continue;
                }
            };
            let row: RawProductRow = fields
                .into_iter()
                .filter_map(|(key, value)| json_field(value).map(|field| (key, field)))
                .collect();
            rows.push((position, row));
        }

        Ok(Self::from_rows(rows, malformed))
    }

    /// `rows` carry their 1-based source position; `skipped` counts rows already
    /// dropped before normalization.
    fn from_rows(rows: Vec<(usize, RawProductRow)>, skipped: usize) -> (Self, LoadReport) {
        let mut products = Vec::with_capacity(rows.len());
        let mut report = LoadReport {
            loaded: 0,
            skipped,
        };

        for (position, row) in &rows {
            match normalize_row(row, *position) {
                Ok(product) => {
                    products.push(product);
                    report.loaded += 1;
                }
                Err(e) => {
                    warn!("Skipping catalog row {position}: {e}");
                    report.skipped += 1;
                }
            }
        }

        info!(
            "Product catalog loaded: {} products, {} rows skipped",
            report.loaded, report.skipped
        );
        (Self { products }, report)
    }
}

fn json_field(value: Value) -> Option<FieldValue> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(FieldValue::Bool(b)),
        Value::Number(n) => n
            .as_i64()
            .map(FieldValue::Integer)
            .or_else(|| n.as_f64().map(FieldValue::Float)),
        Value::String(s) => Some(coerce_field(s.trim())),
        Value::Array(items) => Some(FieldValue::List(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .collect(),
        )),
        Value::Object(_) => None,
    }
}
