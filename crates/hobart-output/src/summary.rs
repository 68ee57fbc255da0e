//! Run summary for a dataset build.
//!
//! Collects the counts a user needs to judge a run: how many entities were
//! scanned and kept, why the others were dropped, which indicator columns
//! the cleaner removed, and how the final rows split between classes.

use chrono::NaiveDate;
use hobart_dataset::{BuildOutput, CleanOutput, DroppedColumn, Label};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Summary of one dataset build.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    /// Fiscal year tag the filings were aligned on.
    pub fiscal_year_tag: String,

    /// Window the price variation was measured over, if any.
    pub price_window: Option<(NaiveDate, NaiveDate)>,

    /// Entities scanned.
    pub attempted: usize,

    /// Entities with an aligned filing.
    pub aligned: usize,

    /// Dropped entities per reason.
    pub dropped: BTreeMap<String, usize>,

    /// Aligned entities excluded for lack of a price variation.
    pub unlabeled: Vec<String>,

    /// Rows in the final dataset.
    pub rows: usize,

    /// Indicator columns requested.
    pub requested_columns: usize,

    /// Indicator columns kept by the cleaner.
    pub kept_columns: usize,

    /// Columns removed by the cleaner.
    pub dropped_columns: Vec<DroppedColumn>,

    /// Cells filled with a column mean.
    pub imputed_cells: usize,

    /// Rows labeled [`Label::Buy`].
    pub buy: usize,

    /// Rows labeled [`Label::Ignore`].
    pub ignore: usize,
}

impl RunSummary {
    /// Summarize a build and its cleaning pass.
    ///
    /// `unlabeled` lists aligned entities removed before cleaning because no
    /// price variation was available. Class counts are taken from the cleaned
    /// matrix when outcomes are attached.
    pub fn new(
        fiscal_year_tag: impl Into<String>,
        build: &BuildOutput,
        unlabeled: Vec<String>,
        clean: &CleanOutput,
    ) -> Self {
        let dropped = build
            .dropped_by_kind()
            .into_iter()
            .map(|(kind, count)| (kind.to_string(), count))
            .collect();

        let labels = clean.matrix.labels().unwrap_or_default();
        let buy = labels.iter().filter(|&&l| l == Label::Buy).count();

        Self {
            fiscal_year_tag: fiscal_year_tag.into(),
            price_window: None,
            attempted: build.attempted(),
            aligned: build.retained(),
            dropped,
            unlabeled,
            rows: clean.matrix.nrows(),
            requested_columns: build.matrix.ncols(),
            kept_columns: clean.matrix.ncols(),
            dropped_columns: clean.dropped_columns.clone(),
            imputed_cells: clean.imputed_cells,
            buy,
            ignore: labels.len() - buy,
        }
    }

    /// Record the price variation window.
    pub fn with_price_window(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.price_window = Some((start, end));
        self
    }

    /// Fraction of scanned entities that made it into the dataset.
    pub fn retention_rate(&self) -> f64 {
        if self.attempted == 0 {
            return 0.0;
        }
        self.rows as f64 / self.attempted as f64
    }

    /// Fraction of labeled rows in the buy class.
    pub fn buy_ratio(&self) -> f64 {
        let labeled = self.buy + self.ignore;
        if labeled == 0 {
            return 0.0;
        }
        self.buy as f64 / labeled as f64
    }

    /// Format as ASCII table for terminal display.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("\nDataset Summary: fiscal year {}\n", self.fiscal_year_tag));
        if let Some((start, end)) = self.price_window {
            output.push_str(&format!("Price window: {} to {}\n", start, end));
        }
        output.push_str(&"=".repeat(60));
        output.push('\n');

        output.push_str("\nEntities:\n");
        output.push_str(&"-".repeat(60));
        output.push('\n');
        output.push_str(&format!("  Scanned:                {:>8}\n", self.attempted));
        output.push_str(&format!("  Aligned:                {:>8}\n", self.aligned));
        for (reason, count) in &self.dropped {
            let label = format!("Dropped ({reason}):");
            output.push_str(&format!("  {:<24}{:>8}\n", label, count));
        }
        output.push_str(&format!("  Without price:          {:>8}\n", self.unlabeled.len()));
        output.push_str(&format!(
            "  Rows:                   {:>8} ({:.1}% of scanned)\n",
            self.rows,
            self.retention_rate() * 100.0
        ));

        output.push_str("\nColumns:\n");
        output.push_str(&"-".repeat(60));
        output.push('\n');
        output.push_str(&format!("  Requested:              {:>8}\n", self.requested_columns));
        output.push_str(&format!("  Kept:                   {:>8}\n", self.kept_columns));
        output.push_str(&format!("  Imputed cells:          {:>8}\n", self.imputed_cells));

        if !self.dropped_columns.is_empty() {
            output.push_str(&format!("\n{:<40} {:>19}\n", "Dropped column", "Reason"));
            output.push_str(&"-".repeat(60));
            output.push('\n');
            for column in &self.dropped_columns {
                output.push_str(&format!(
                    "{:<40} {:>19}\n",
                    column.indicator,
                    column.reason.to_string()
                ));
            }
        }

        output.push_str("\nClasses:\n");
        output.push_str(&"-".repeat(60));
        output.push('\n');
        output.push_str(&format!(
            "  BUY:                    {:>8} ({:.1}%)\n",
            self.buy,
            self.buy_ratio() * 100.0
        ));
        output.push_str(&format!("  IGNORE:                 {:>8}\n", self.ignore));

        output
    }

    /// Format as Markdown.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("# Dataset Summary: {}\n\n", self.fiscal_year_tag));
        if let Some((start, end)) = self.price_window {
            output.push_str(&format!("**Price window:** {} to {}\n\n", start, end));
        }

        output.push_str("## Entities\n\n");
        output.push_str("| Metric | Count |\n");
        output.push_str("|--------|-------|\n");
        output.push_str(&format!("| Scanned | {} |\n", self.attempted));
        output.push_str(&format!("| Aligned | {} |\n", self.aligned));
        for (reason, count) in &self.dropped {
            output.push_str(&format!("| Dropped ({}) | {} |\n", reason, count));
        }
        output.push_str(&format!("| Without price | {} |\n", self.unlabeled.len()));
        output.push_str(&format!("| Rows | {} |\n\n", self.rows));

        output.push_str("## Columns\n\n");
        output.push_str(&format!(
            "{} of {} indicators kept, {} cells imputed.\n\n",
            self.kept_columns, self.requested_columns, self.imputed_cells
        ));
        if !self.dropped_columns.is_empty() {
            output.push_str("| Dropped column | Reason |\n");
            output.push_str("|----------------|--------|\n");
            for column in &self.dropped_columns {
                output.push_str(&format!("| {} | {} |\n", column.indicator, column.reason));
            }
            output.push('\n');
        }

        output.push_str("## Classes\n\n");
        output.push_str("| Class | Rows |\n");
        output.push_str("|-------|------|\n");
        output.push_str(&format!("| BUY | {} |\n", self.buy));
        output.push_str(&format!("| IGNORE | {} |\n", self.ignore));

        output
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} of {} entities, {} of {} indicators, {} BUY / {} IGNORE",
            self.fiscal_year_tag,
            self.rows,
            self.attempted,
            self.kept_columns,
            self.requested_columns,
            self.buy,
            self.ignore
        )
    }
}
