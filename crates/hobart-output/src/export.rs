//! Export functionality for assembled datasets.
//!
//! Cleaned matrices are written with one row per entity: the symbol, every
//! surviving indicator, then the price variation and class when outcomes are
//! attached. Raw matrices keep missing cells empty in CSV and `null` in JSON.

use hobart_dataset::{CleanedMatrix, RawMatrix};
use hobart_dataset::matrix::{CLASS_COLUMN, ENTITY_COLUMN, PRICE_VARIATION_COLUMN};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Output was not valid UTF-8.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    #[default]
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "pretty-json" | "pretty" => Ok(Self::PrettyJson),
            other => Err(ExportError::InvalidFormat(other.to_string())),
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

fn write_csv<I>(header: &[String], rows: I) -> Result<String, ExportError>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(header)?;
    for row in rows {
        wtr.write_record(&row)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

fn write_json(records: Map<String, Value>, format: ExportFormat) -> Result<String, ExportError> {
    let value = Value::Object(records);
    match format {
        ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(&value)?),
        _ => Ok(serde_json::to_string(&value)?),
    }
}

fn number(value: f64) -> Value {
    serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
}

impl Exporter for CleanedMatrix {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        let outcomes = self.outcomes();
        match format {
            ExportFormat::Csv => {
                let rows = self.entities().iter().enumerate().map(|(i, symbol)| {
                    let mut row = Vec::with_capacity(self.ncols() + 3);
                    row.push(symbol.clone());
                    row.extend(self.values().row(i).iter().map(f64::to_string));
                    if let Some(outcome) = outcomes.map(|o| o[i]) {
                        row.push(outcome.price_variation.to_string());
                        row.push(outcome.label.as_u8().to_string());
                    }
                    row
                });
                write_csv(&self.header(), rows)
            }
            ExportFormat::Json | ExportFormat::PrettyJson => {
                let mut records = Map::new();
                for (i, symbol) in self.entities().iter().enumerate() {
                    let mut record: Map<String, Value> = self
                        .indicators()
                        .iter()
                        .zip(self.values().row(i))
                        .map(|(name, &v)| (name.clone(), number(v)))
                        .collect();
                    if let Some(outcome) = outcomes.map(|o| o[i]) {
                        record.insert(
                            PRICE_VARIATION_COLUMN.to_string(),
                            number(outcome.price_variation),
                        );
                        record.insert(CLASS_COLUMN.to_string(), Value::from(outcome.label.as_u8()));
                    }
                    records.insert(symbol.clone(), Value::Object(record));
                }
                write_json(records, format)
            }
        }
    }
}

impl Exporter for RawMatrix {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut header = Vec::with_capacity(self.ncols() + 1);
                header.push(ENTITY_COLUMN.to_string());
                header.extend(self.indicators().iter().cloned());

                let rows = self.entities().iter().enumerate().map(|(i, symbol)| {
                    let mut row = Vec::with_capacity(self.ncols() + 1);
                    row.push(symbol.clone());
                    row.extend(
                        self.values()
                            .row(i)
                            .iter()
                            .map(|v| v.map(|v| v.to_string()).unwrap_or_default()),
                    );
                    row
                });
                write_csv(&header, rows)
            }
            ExportFormat::Json | ExportFormat::PrettyJson => {
                let mut records = Map::new();
                for (i, symbol) in self.entities().iter().enumerate() {
                    let record: Map<String, Value> = self
                        .indicators()
                        .iter()
                        .zip(self.values().row(i))
                        .map(|(name, v)| (name.clone(), v.map_or(Value::Null, number)))
                        .collect();
                    records.insert(symbol.clone(), Value::Object(record));
                }
                write_json(records, format)
            }
        }
    }
}
