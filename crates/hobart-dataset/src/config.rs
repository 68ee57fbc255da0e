//! Dataset configuration: indicator list, sparsity thresholds, alignment.

use crate::align::AlignmentPolicy;
use crate::error::{DatasetError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Indicator list shipped with the crate.
const BUNDLED_INDICATORS: &str = include_str!("../config/indicators.txt");

/// Ordered, deduplicated list of indicator names.
///
/// Order defines the column order of the assembled matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorList {
    names: Vec<String>,
}

impl IndicatorList {
    /// Build a list from names. Names are trimmed, blanks dropped and
    /// duplicates removed, keeping the first occurrence.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let names = names
            .into_iter()
            .map(|name| name.as_ref().trim().to_string())
            .filter(|name| !name.is_empty())
            .filter(|name| seen.insert(name.clone()))
            .collect();
        Self { names }
    }

    /// Parse the flat text format: one name per line, `#` starts a comment.
    pub fn parse(text: &str) -> Self {
        Self::new(
            text.lines()
                .map(|line| line.split_once('#').map_or(line, |(name, _)| name)),
        )
    }

    /// Load a list from a text file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    /// The default indicator list.
    pub fn bundled() -> Self {
        Self::parse(BUNDLED_INDICATORS)
    }

    /// Indicator names in column order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Iterate over indicator names.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Column position of `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Number of indicators.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Maximum tolerated count of a condition within a column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Threshold {
    /// Absolute number of rows.
    Count(usize),
    /// Fraction of the row count, in `[0, 1]`.
    Fraction(f64),
}

impl Threshold {
    /// Whether `count` exceeds this threshold for a matrix of `rows` rows.
    pub fn exceeded(&self, count: usize, rows: usize) -> bool {
        match *self {
            Self::Count(limit) => count > limit,
            Self::Fraction(fraction) => count as f64 > fraction * rows as f64,
        }
    }

    fn validate(&self, name: &str) -> Result<()> {
        match *self {
            Self::Fraction(f) if !(0.0..=1.0).contains(&f) => Err(DatasetError::InvalidConfig(
                format!("{name} fraction must be within [0, 1], got {f}"),
            )),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(n) => write!(f, "{n}"),
            Self::Fraction(x) => write!(f, "{:.1}%", x * 100.0),
        }
    }
}

impl FromStr for Threshold {
    type Err = String;

    /// Integers are counts; anything with a decimal point is a fraction.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.contains('.') {
            s.parse::<f64>()
                .map(Self::Fraction)
                .map_err(|e| format!("invalid fraction {s:?}: {e}"))
        } else {
            s.parse::<usize>()
                .map(Self::Count)
                .map_err(|e| format!("invalid count {s:?}: {e}"))
        }
    }
}

/// Column sparsity limits applied by the cleaner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SparsityThresholds {
    /// Drop a column with more missing cells than this.
    pub max_missing: Threshold,
    /// Drop a column with more exact zeros than this.
    pub max_zeros: Threshold,
}

impl SparsityThresholds {
    /// Absolute limits used on the ~640-row reference universe.
    pub const fn reference() -> Self {
        Self {
            max_missing: Threshold::Count(15),
            max_zeros: Threshold::Count(20),
        }
    }
}

impl Default for SparsityThresholds {
    /// The reference limits expressed as fractions, so they scale with the
    /// number of rows.
    fn default() -> Self {
        Self {
            max_missing: Threshold::Fraction(0.024),
            max_zeros: Threshold::Fraction(20.0 / 640.0),
        }
    }
}

/// Everything the dataset pipeline needs, passed explicitly to each stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Substring selecting the fiscal year, e.g. `"2018"`.
    pub fiscal_year_tag: String,
    /// Indicator columns.
    pub indicators: IndicatorList,
    /// Column sparsity limits.
    pub thresholds: SparsityThresholds,
    /// Duplicate-filing policy.
    pub policy: AlignmentPolicy,
}

impl DatasetConfig {
    /// Create a configuration with default thresholds and policy.
    pub fn new(fiscal_year_tag: impl Into<String>, indicators: IndicatorList) -> Self {
        Self {
            fiscal_year_tag: fiscal_year_tag.into(),
            indicators,
            thresholds: SparsityThresholds::default(),
            policy: AlignmentPolicy::default(),
        }
    }

    /// Set the sparsity thresholds.
    pub fn with_thresholds(mut self, thresholds: SparsityThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Set the alignment policy.
    pub fn with_policy(mut self, policy: AlignmentPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Check the configuration before running.
    pub fn validate(&self) -> Result<()> {
        if self.fiscal_year_tag.trim().is_empty() {
            return Err(DatasetError::InvalidConfig(
                "fiscal year tag is empty".to_string(),
            ));
        }
        if self.indicators.is_empty() {
            return Err(DatasetError::InvalidConfig(
                "indicator list is empty".to_string(),
            ));
        }
        self.thresholds.max_missing.validate("max_missing")?;
        self.thresholds.max_zeros.validate("max_zeros")?;
        Ok(())
    }
}
