//! Sparse column removal and mean imputation.

use crate::config::SparsityThresholds;
use crate::matrix::{CleanedMatrix, RawMatrix};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// Why a column was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnDropReason {
    /// No row has a value.
    AllMissing,
    /// More missing cells than allowed.
    TooManyMissing {
        /// Missing cells in the column.
        count: usize,
    },
    /// More exact zeros than allowed.
    TooManyZeros {
        /// Zero cells in the column.
        count: usize,
    },
}

impl fmt::Display for ColumnDropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllMissing => f.write_str("no values"),
            Self::TooManyMissing { count } => write!(f, "{count} missing"),
            Self::TooManyZeros { count } => write!(f, "{count} zeros"),
        }
    }
}

/// A removed column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedColumn {
    /// Indicator name.
    pub indicator: String,
    /// Why it was removed.
    pub reason: ColumnDropReason,
}

/// Result of cleaning.
#[derive(Debug, Clone)]
pub struct CleanOutput {
    /// Dense matrix with surviving columns.
    pub matrix: CleanedMatrix,
    /// Removed columns, in original column order.
    pub dropped_columns: Vec<DroppedColumn>,
    /// Number of cells filled with a column mean.
    pub imputed_cells: usize,
}

/// Removes sparse columns and fills remaining gaps with column means.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatasetCleaner {
    thresholds: SparsityThresholds,
}

impl DatasetCleaner {
    /// Create a cleaner with the given limits.
    pub const fn new(thresholds: SparsityThresholds) -> Self {
        Self { thresholds }
    }

    /// Configured limits.
    pub const fn thresholds(&self) -> SparsityThresholds {
        self.thresholds
    }

    /// Reason to drop column `col`, if any.
    ///
    /// Counts are taken on `matrix` as given, so the decision for one column
    /// never depends on another column's removal.
    fn drop_reason(&self, matrix: &RawMatrix, col: usize) -> Option<ColumnDropReason> {
        let rows = matrix.nrows();
        let missing = matrix.missing_count(col);
        let zeros = matrix.zero_count(col);

        if self.thresholds.max_missing.exceeded(missing, rows) {
            Some(ColumnDropReason::TooManyMissing { count: missing })
        } else if self.thresholds.max_zeros.exceeded(zeros, rows) {
            Some(ColumnDropReason::TooManyZeros { count: zeros })
        } else if rows > 0 && missing == rows {
            Some(ColumnDropReason::AllMissing)
        } else {
            None
        }
    }

    /// Clean `matrix`. Rows are never removed and columns are never added.
    pub fn clean(&self, matrix: &RawMatrix) -> CleanOutput {
        let mut kept = Vec::new();
        let mut dropped_columns = Vec::new();

        for (col, indicator) in matrix.indicators().iter().enumerate() {
            match self.drop_reason(matrix, col) {
                Some(reason) => {
                    debug!(indicator = %indicator, %reason, "dropping column");
                    dropped_columns.push(DroppedColumn {
                        indicator: indicator.clone(),
                        reason,
                    });
                }
                // An all-missing column only survives on an empty matrix,
                // where the mean is never read.
                None => kept.push((col, matrix.column_mean(col).unwrap_or(0.0))),
            }
        }

        let values = matrix.values();
        let mut imputed_cells = 0;
        let dense = Array2::from_shape_fn((matrix.nrows(), kept.len()), |(row, j)| {
            let (col, mean) = kept[j];
            values[[row, col]].unwrap_or_else(|| {
                imputed_cells += 1;
                mean
            })
        });

        let indicators = kept
            .iter()
            .map(|&(col, _)| matrix.indicators()[col].clone())
            .collect();

        info!(
            kept = kept.len(),
            dropped = dropped_columns.len(),
            imputed = imputed_cells,
            "cleaned dataset"
        );

        CleanOutput {
            matrix: CleanedMatrix::dense(matrix.entities().to_vec(), indicators, dense),
            dropped_columns,
            imputed_cells,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Threshold;
    use approx::assert_relative_eq;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn counts(max_missing: usize, max_zeros: usize) -> DatasetCleaner {
        DatasetCleaner::new(SparsityThresholds {
            max_missing: Threshold::Count(max_missing),
            max_zeros: Threshold::Count(max_zeros),
        })
    }

    /// 10 rows × 5 columns; column `c3` has 6 missing cells and `c1` has 2.
    fn ten_by_five() -> RawMatrix {
        let rows = (0..10).map(|i| {
            let x = i as f64 + 1.0;
            let c1 = if i < 2 { None } else { Some(x) };
            let c3 = if i < 6 { None } else { Some(x * 10.0) };
            (
                format!("E{i}"),
                vec![c1, Some(x * 2.0), c3, Some(x * 3.0), Some(x - 0.5)],
            )
        });
        RawMatrix::from_rows(names(&["c1", "c2", "c3", "c4", "c5"]), rows).unwrap()
    }

    #[test]
    fn test_drops_sparse_column_and_imputes_means() {
        let raw = ten_by_five();
        let out = counts(5, 100).clean(&raw);

        assert_eq!(out.matrix.indicators(), ["c1", "c2", "c4", "c5"]);
        assert_eq!(
            out.dropped_columns,
            vec![DroppedColumn {
                indicator: "c3".to_string(),
                reason: ColumnDropReason::TooManyMissing { count: 6 },
            }]
        );
        assert_eq!(out.imputed_cells, 2);

        // Mean of 3..=10.
        let c1 = out.matrix.column("c1").unwrap();
        assert_relative_eq!(c1[0], 6.5);
        assert_relative_eq!(c1[1], 6.5);
        assert_relative_eq!(c1[2], 3.0);
        assert_eq!(out.matrix.nrows(), 10);
    }

    #[test]
    fn test_zero_threshold() {
        let raw = RawMatrix::from_rows(
            names(&["a", "b"]),
            vec![
                ("X", vec![Some(0.0), Some(1.0)]),
                ("Y", vec![Some(0.0), Some(0.0)]),
                ("Z", vec![Some(-0.0), Some(2.0)]),
            ],
        )
        .unwrap();

        let out = counts(10, 2).clean(&raw);
        assert_eq!(out.matrix.indicators(), ["b"]);
        assert_eq!(
            out.dropped_columns[0].reason,
            ColumnDropReason::TooManyZeros { count: 3 }
        );
    }

    #[test]
    fn test_non_finite_input_is_imputed() {
        let raw = RawMatrix::from_rows(
            names(&["a"]),
            vec![
                ("X", vec![Some(f64::NAN)]),
                ("Y", vec![None]),
                ("Z", vec![Some(1.0)]),
                ("W", vec![Some(f64::NEG_INFINITY)]),
            ],
        )
        .unwrap();

        let out = DatasetCleaner::new(SparsityThresholds::reference()).clean(&raw);
        let a = out.matrix.column("a").unwrap();
        assert!(a.iter().all(|v| v.is_finite()));
        assert_eq!(a.to_vec(), vec![1.0, 1.0, 1.0, 1.0]);
        assert_eq!(out.imputed_cells, 3);
    }

    #[test]
    fn test_all_missing_column_always_dropped() {
        let raw = RawMatrix::from_rows(
            names(&["a", "b"]),
            vec![("X", vec![None, Some(1.0)]), ("Y", vec![None, Some(3.0)])],
        )
        .unwrap();

        let out = counts(100, 100).clean(&raw);
        assert_eq!(out.matrix.indicators(), ["b"]);
        assert_eq!(out.dropped_columns[0].reason, ColumnDropReason::AllMissing);
    }

    #[test]
    fn test_fraction_thresholds_scale() {
        let cleaner = DatasetCleaner::new(SparsityThresholds {
            max_missing: Threshold::Fraction(0.2),
            max_zeros: Threshold::Fraction(1.0),
        });
        // c1 has 2 of 10 missing (kept); c3 has 6 of 10 (dropped).
        let out = cleaner.clean(&ten_by_five());
        assert_eq!(out.matrix.indicators(), ["c1", "c2", "c4", "c5"]);
    }

    #[test]
    fn test_clean_is_idempotent() {
        let cleaner = counts(5, 5);
        let once = cleaner.clean(&ten_by_five());
        let twice = cleaner.clean(&once.matrix.to_raw());

        assert_eq!(twice.matrix, once.matrix);
        assert!(twice.dropped_columns.is_empty());
        assert_eq!(twice.imputed_cells, 0);
    }

    #[test]
    fn test_surviving_columns_are_subset() {
        let raw = ten_by_five();
        let out = counts(0, 0).clean(&raw);
        for indicator in out.matrix.indicators() {
            assert!(raw.indicators().contains(indicator));
        }
        assert_eq!(
            out.matrix.indicators().len() + out.dropped_columns.len(),
            raw.ncols()
        );
    }

    #[test]
    fn test_empty_matrix() {
        let raw = RawMatrix::new(names(&["a", "b"]));
        let out = DatasetCleaner::default().clean(&raw);
        assert_eq!(out.matrix.nrows(), 0);
        assert_eq!(out.matrix.indicators(), ["a", "b"]);
    }
}
