//! Dataset construction over a universe of entities.

use crate::align::DateAligner;
use crate::assemble::IndicatorAssembler;
use crate::config::DatasetConfig;
use crate::entity::EntityDocumentSet;
use crate::error::Result;
use crate::matrix::RawMatrix;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, warn};

/// An entity whose filings could not be retrieved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalFailure {
    /// Entity identifier.
    pub symbol: String,
    /// Human readable cause.
    pub reason: String,
}

impl RetrievalFailure {
    /// Create a failure record.
    pub fn new(symbol: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self {
            symbol: symbol.into(),
            reason: reason.to_string(),
        }
    }
}

/// Why an entity has no row in the matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Retrieval failed.
    Retrieval(String),
    /// No filing date contains the fiscal year tag.
    Unaligned {
        /// Tag that was searched for.
        fiscal_year_tag: String,
    },
    /// The symbol already has a row.
    Duplicate,
}

impl DropReason {
    /// Short category name, used for grouping in summaries.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Retrieval(_) => "retrieval",
            Self::Unaligned { .. } => "unaligned",
            Self::Duplicate => "duplicate",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retrieval(reason) => write!(f, "retrieval failed: {reason}"),
            Self::Unaligned { fiscal_year_tag } => {
                write!(f, "no filing for fiscal year {fiscal_year_tag}")
            }
            Self::Duplicate => f.write_str("duplicate symbol"),
        }
    }
}

/// An entity excluded from the matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedEntity {
    /// Entity identifier.
    pub symbol: String,
    /// Why it was excluded.
    pub reason: DropReason,
}

/// Result of a build.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    /// One row per retained entity, in scan order.
    pub matrix: RawMatrix,
    /// Excluded entities, in scan order.
    pub dropped: Vec<DroppedEntity>,
}

impl BuildOutput {
    /// Number of entities scanned.
    pub fn attempted(&self) -> usize {
        self.matrix.nrows() + self.dropped.len()
    }

    /// Number of entities with a row.
    pub fn retained(&self) -> usize {
        self.matrix.nrows()
    }

    /// Number of dropped entities per [`DropReason::kind`].
    pub fn dropped_by_kind(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for entry in &self.dropped {
            *counts.entry(entry.reason.kind()).or_insert(0) += 1;
        }
        counts
    }
}

/// Scans entities and assembles one indicator row per aligned entity.
#[derive(Debug, Clone)]
pub struct DatasetBuilder {
    config: DatasetConfig,
    aligner: DateAligner,
}

impl DatasetBuilder {
    /// Create a builder for `config`.
    pub fn new(config: DatasetConfig) -> Self {
        let aligner = DateAligner::new(config.policy);
        Self { config, aligner }
    }

    /// Configuration in use.
    pub const fn config(&self) -> &DatasetConfig {
        &self.config
    }

    /// Build the raw matrix.
    ///
    /// Per-entity problems never abort the batch: failed retrievals,
    /// entities without a filing for the fiscal year and repeated symbols are
    /// recorded in [`BuildOutput::dropped`].
    pub fn build<I>(&self, entities: I) -> Result<BuildOutput>
    where
        I: IntoIterator<Item = std::result::Result<EntityDocumentSet, RetrievalFailure>>,
    {
        let tag = self.config.fiscal_year_tag.as_str();
        let assembler = IndicatorAssembler::new(&self.config.indicators);
        let mut matrix = RawMatrix::new(self.config.indicators.names().to_vec());
        let mut dropped = Vec::new();

        for entity in entities {
            let entity = match entity {
                Ok(entity) => entity,
                Err(failure) => {
                    warn!(symbol = %failure.symbol, reason = %failure.reason, "retrieval failed");
                    dropped.push(DroppedEntity {
                        symbol: failure.symbol,
                        reason: DropReason::Retrieval(failure.reason),
                    });
                    continue;
                }
            };

            if matrix.contains(entity.symbol()) {
                debug!(symbol = entity.symbol(), "duplicate symbol skipped");
                dropped.push(DroppedEntity {
                    symbol: entity.symbol().to_string(),
                    reason: DropReason::Duplicate,
                });
                continue;
            }

            let Some(index) = self.aligner.align(&entity, tag) else {
                debug!(symbol = entity.symbol(), tag, "no filing for fiscal year");
                dropped.push(DroppedEntity {
                    symbol: entity.symbol().to_string(),
                    reason: DropReason::Unaligned {
                        fiscal_year_tag: tag.to_string(),
                    },
                });
                continue;
            };

            let row = assembler.assemble(&entity, index);
            debug!(
                symbol = entity.symbol(),
                index,
                missing = row.iter().filter(|v| v.is_none()).count(),
                "assembled row"
            );
            matrix.push_row(entity.symbol(), row)?;
        }

        let output = BuildOutput { matrix, dropped };
        info!(
            attempted = output.attempted(),
            retained = output.retained(),
            "dataset built"
        );
        Ok(output)
    }
}
