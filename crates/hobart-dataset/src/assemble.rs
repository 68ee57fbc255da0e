//! Indicator row assembly for an aligned entity.

use crate::config::IndicatorList;
use crate::entity::EntityDocumentSet;
use crate::json;
use serde_json::Value;
use std::collections::HashMap;

/// Reads every configured indicator at an entity's alignment index.
///
/// Each indicator's values are gathered across the same six-family
/// concatenation that produced the alignment index, and the value at that
/// index is taken. Indicators are scanned independently of the date field,
/// so their sequences may be shorter than the date sequence; an index past
/// the end, or a value that is not numeric, becomes a missing cell.
#[derive(Debug, Clone)]
pub struct IndicatorAssembler<'a> {
    indicators: &'a IndicatorList,
    columns: HashMap<&'a str, usize>,
}

impl<'a> IndicatorAssembler<'a> {
    /// Create an assembler for `indicators`.
    pub fn new(indicators: &'a IndicatorList) -> Self {
        let columns = indicators.iter().enumerate().map(|(i, name)| (name, i)).collect();
        Self {
            indicators,
            columns,
        }
    }

    /// Number of output columns.
    pub fn width(&self) -> usize {
        self.indicators.len()
    }

    /// Assemble one row, in indicator order.
    pub fn assemble(&self, entity: &EntityDocumentSet, index: usize) -> Vec<Option<f64>> {
        self.collect(entity)
            .iter()
            .map(|values| values.get(index).and_then(|value| json::as_number(value)))
            .collect()
    }

    /// All values of every indicator, one sequence per column.
    ///
    /// Equivalent to extracting each indicator separately, but walks the
    /// documents once.
    pub fn collect<'e>(&self, entity: &'e EntityDocumentSet) -> Vec<Vec<&'e Value>> {
        let mut sequences = vec![Vec::new(); self.width()];
        for (_, document) in entity.documents() {
            json::visit_scalars(document, |key, value| {
                if let Some(&column) = self.columns.get(key) {
                    sequences[column].push(value);
                }
            });
        }
        sequences
    }
}
