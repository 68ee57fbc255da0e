//! Entity × indicator matrices.

use crate::error::{DatasetError, Result};
use crate::label::Label;
use ndarray::{Array2, ArrayView1, Axis};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Name of the entity identifier column in tabular output.
pub const ENTITY_COLUMN: &str = "symbol";
/// Name of the price variation column in tabular output.
pub const PRICE_VARIATION_COLUMN: &str = "price_var_pct";
/// Name of the class column in tabular output.
pub const CLASS_COLUMN: &str = "class";

/// Assembled indicator values, one row per retained entity.
///
/// Missing cells are `None` and are never conflated with zero. Rows keep the
/// order in which entities were scanned and identifiers are unique.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMatrix {
    entities: Vec<String>,
    indicators: Vec<String>,
    values: Array2<Option<f64>>,
}

impl RawMatrix {
    /// Create an empty matrix with the given columns.
    pub fn new(indicators: Vec<String>) -> Self {
        let width = indicators.len();
        Self {
            entities: Vec::new(),
            indicators,
            values: Array2::from_elem((0, width), None),
        }
    }

    /// Create a matrix from `(entity, row)` pairs.
    pub fn from_rows<I, S>(indicators: Vec<String>, rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<Option<f64>>)>,
        S: Into<String>,
    {
        let mut matrix = Self::new(indicators);
        for (entity, row) in rows {
            matrix.push_row(entity, row)?;
        }
        Ok(matrix)
    }

    /// Append a row. Non-finite values are stored as missing.
    ///
    /// # Errors
    /// Returns `DatasetError::RowLength` if `row` does not have one value per
    /// indicator, and `DatasetError::DuplicateEntity` if `entity` is already
    /// present.
    pub fn push_row(&mut self, entity: impl Into<String>, row: Vec<Option<f64>>) -> Result<()> {
        let entity = entity.into();
        if row.len() != self.ncols() {
            return Err(DatasetError::RowLength {
                entity,
                expected: self.ncols(),
                actual: row.len(),
            });
        }
        if self.contains(&entity) {
            return Err(DatasetError::DuplicateEntity(entity));
        }

        let row: Vec<Option<f64>> = row
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect();
        self.values.push_row(ArrayView1::from(&row))?;
        self.entities.push(entity);
        Ok(())
    }

    /// Keep only rows whose entity satisfies `keep`. Returns the removed
    /// entities in their original order.
    pub fn retain_entities<F>(&mut self, mut keep: F) -> Vec<String>
    where
        F: FnMut(&str) -> bool,
    {
        let (kept, removed): (Vec<usize>, Vec<usize>) =
            (0..self.nrows()).partition(|&i| keep(&self.entities[i]));
        if removed.is_empty() {
            return Vec::new();
        }

        let removed_entities = removed.iter().map(|&i| self.entities[i].clone()).collect();
        self.values = self.values.select(Axis(0), &kept);
        self.entities = kept.iter().map(|&i| self.entities[i].clone()).collect();
        removed_entities
    }

    /// Number of rows.
    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    /// Number of columns.
    pub fn ncols(&self) -> usize {
        self.indicators.len()
    }

    /// Row identifiers, in row order.
    pub fn entities(&self) -> &[String] {
        &self.entities
    }

    /// Column names, in column order.
    pub fn indicators(&self) -> &[String] {
        &self.indicators
    }

    /// Underlying cell values.
    pub const fn values(&self) -> &Array2<Option<f64>> {
        &self.values
    }

    /// Whether `entity` has a row.
    pub fn contains(&self, entity: &str) -> bool {
        self.entities.iter().any(|e| e == entity)
    }

    /// Row of `entity`.
    pub fn row(&self, entity: &str) -> Option<ArrayView1<'_, Option<f64>>> {
        let index = self.entities.iter().position(|e| e == entity)?;
        Some(self.values.row(index))
    }

    /// Column of `indicator`.
    pub fn column(&self, indicator: &str) -> Option<ArrayView1<'_, Option<f64>>> {
        let index = self.indicators.iter().position(|i| i == indicator)?;
        Some(self.values.column(index))
    }

    /// Number of missing cells in column `col`.
    pub fn missing_count(&self, col: usize) -> usize {
        self.values.column(col).iter().filter(|v| v.is_none()).count()
    }

    /// Number of cells in column `col` that are exactly zero.
    pub fn zero_count(&self, col: usize) -> usize {
        self.values
            .column(col)
            .iter()
            .filter(|v| **v == Some(0.0))
            .count()
    }

    /// Mean of the present values in column `col`, `None` when there are none.
    pub fn column_mean(&self, col: usize) -> Option<f64> {
        let (sum, n) = self
            .values
            .column(col)
            .iter()
            .flatten()
            .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
        (n > 0).then(|| sum / n as f64)
    }

    /// Total number of missing cells.
    pub fn total_missing(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }

    /// Convert to a polars `DataFrame` with a leading symbol column. Missing
    /// cells become nulls.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns: Vec<Column> = Vec::with_capacity(self.ncols() + 1);
        columns.push(Series::new(ENTITY_COLUMN.into(), self.entities.clone()).into());
        for (j, name) in self.indicators.iter().enumerate() {
            let values: Vec<Option<f64>> = self.values.column(j).to_vec();
            columns.push(Series::new(name.as_str().into(), values).into());
        }
        Ok(DataFrame::new(columns)?)
    }
}

/// Realized outcome attached to a cleaned row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    /// Price variation over the evaluation window, in percent.
    pub price_variation: f64,
    /// Class derived from the price variation.
    pub label: Label,
}

impl Outcome {
    /// Outcome for a price variation.
    pub fn new(price_variation: f64) -> Self {
        Self {
            price_variation,
            label: Label::from_price_variation(price_variation),
        }
    }
}

/// Dense matrix produced by the cleaner, optionally labeled.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedMatrix {
    entities: Vec<String>,
    indicators: Vec<String>,
    values: Array2<f64>,
    outcomes: Option<Vec<Outcome>>,
}

impl CleanedMatrix {
    /// Assemble a cleaned matrix from its parts.
    ///
    /// # Errors
    /// Returns `DatasetError::Shape` if `values` is not
    /// `entities.len() × indicators.len()`.
    pub fn from_parts(
        entities: Vec<String>,
        indicators: Vec<String>,
        values: Array2<f64>,
    ) -> Result<Self> {
        if values.dim() != (entities.len(), indicators.len()) {
            return Err(DatasetError::Shape(ndarray::ShapeError::from_kind(
                ndarray::ErrorKind::IncompatibleShape,
            )));
        }
        Ok(Self::dense(entities, indicators, values))
    }

    pub(crate) fn dense(
        entities: Vec<String>,
        indicators: Vec<String>,
        values: Array2<f64>,
    ) -> Self {
        Self {
            entities,
            indicators,
            values,
            outcomes: None,
        }
    }

    /// Attach the price variation and label of every row.
    ///
    /// # Errors
    /// Returns `DatasetError::MissingOutcome` naming the first entity without
    /// a price variation; nothing is attached in that case.
    pub fn attach_outcomes(&mut self, price_variations: &HashMap<String, f64>) -> Result<()> {
        let outcomes = self
            .entities
            .iter()
            .map(|entity| {
                price_variations
                    .get(entity)
                    .map(|&pv| Outcome::new(pv))
                    .ok_or_else(|| DatasetError::MissingOutcome(entity.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        self.outcomes = Some(outcomes);
        Ok(())
    }

    /// Number of rows.
    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    /// Number of indicator columns, excluding outcome columns.
    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    /// Row identifiers.
    pub fn entities(&self) -> &[String] {
        &self.entities
    }

    /// Surviving indicator columns.
    pub fn indicators(&self) -> &[String] {
        &self.indicators
    }

    /// Feature values.
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Per-row outcomes, if attached.
    pub fn outcomes(&self) -> Option<&[Outcome]> {
        self.outcomes.as_deref()
    }

    /// Per-row labels, if outcomes are attached.
    pub fn labels(&self) -> Option<Vec<Label>> {
        self.outcomes
            .as_ref()
            .map(|outcomes| outcomes.iter().map(|o| o.label).collect())
    }

    /// Column of `indicator`.
    pub fn column(&self, indicator: &str) -> Option<ArrayView1<'_, f64>> {
        let index = self.indicators.iter().position(|i| i == indicator)?;
        Some(self.values.column(index))
    }

    /// Header for tabular output: symbol, indicators, then outcome columns
    /// when attached.
    pub fn header(&self) -> Vec<String> {
        let mut header = Vec::with_capacity(self.ncols() + 3);
        header.push(ENTITY_COLUMN.to_string());
        header.extend(self.indicators.iter().cloned());
        if self.outcomes.is_some() {
            header.push(PRICE_VARIATION_COLUMN.to_string());
            header.push(CLASS_COLUMN.to_string());
        }
        header
    }

    /// The same data as a raw matrix with every cell present. Outcomes are
    /// not carried over.
    pub fn to_raw(&self) -> RawMatrix {
        RawMatrix {
            entities: self.entities.clone(),
            indicators: self.indicators.clone(),
            values: self.values.mapv(Some),
        }
    }

    /// Convert to a polars `DataFrame`, including outcome columns when
    /// attached.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns: Vec<Column> = Vec::with_capacity(self.ncols() + 3);
        columns.push(Series::new(ENTITY_COLUMN.into(), self.entities.clone()).into());
        for (j, name) in self.indicators.iter().enumerate() {
            columns.push(Series::new(name.as_str().into(), self.values.column(j).to_vec()).into());
        }
        if let Some(outcomes) = &self.outcomes {
            let variations: Vec<f64> = outcomes.iter().map(|o| o.price_variation).collect();
            let classes: Vec<i32> = outcomes.iter().map(|o| i32::from(o.label.as_u8())).collect();
            columns.push(Series::new(PRICE_VARIATION_COLUMN.into(), variations).into());
            columns.push(Series::new(CLASS_COLUMN.into(), classes).into());
        }
        Ok(DataFrame::new(columns)?)
    }
}
