//! Dataset pipeline: build, label, clean and write.
//!
//! Retrieval happens elsewhere. These functions take what was retrieved and
//! produce the cleaned, labeled dataset plus its summary.

use chrono::NaiveDate;
use hobart_dataset::{
    BuildOutput, CleanOutput, DatasetBuilder, DatasetCleaner, DatasetConfig, DatasetError,
    EntityDocumentSet, RawMatrix, RetrievalFailure,
};
use hobart_output::{ExportError, ExportFormat, Exporter, RunSummary};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Error type for pipeline operations.
#[derive(Debug, thiserror::Error)]
pub(crate) enum PipelineError {
    /// Dataset assembly error.
    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),
    /// Export error.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
    /// No price window given and none derivable from the fiscal year tag.
    #[error("No price window for fiscal year tag {0:?}; pass --price-start and --price-end")]
    PriceWindow(String),
}

/// Everything a finished run produced.
#[derive(Debug)]
pub(crate) struct PipelineRun {
    /// Aligned matrix before labeling and cleaning.
    pub raw: RawMatrix,
    /// Cleaned matrix with outcomes attached.
    pub clean: CleanOutput,
    /// Counts for the user.
    pub summary: RunSummary,
}

/// The calendar year following a numeric fiscal year tag.
pub(crate) fn default_price_window(
    fiscal_year_tag: &str,
) -> Result<(NaiveDate, NaiveDate), PipelineError> {
    let year: i32 = fiscal_year_tag
        .trim()
        .parse()
        .map_err(|_| PipelineError::PriceWindow(fiscal_year_tag.to_string()))?;

    let window =
        NaiveDate::from_ymd_opt(year + 1, 1, 1).zip(NaiveDate::from_ymd_opt(year + 1, 12, 31));
    window.ok_or_else(|| PipelineError::PriceWindow(fiscal_year_tag.to_string()))
}

/// Assemble the raw matrix from retrieval results.
pub(crate) fn build<I>(config: &DatasetConfig, retrieved: I) -> Result<BuildOutput, PipelineError>
where
    I: IntoIterator<Item = Result<EntityDocumentSet, RetrievalFailure>>,
{
    Ok(DatasetBuilder::new(config.clone()).build(retrieved)?)
}

/// Label, clean and summarize a build.
///
/// Entities without a price variation are removed before cleaning, so
/// column statistics only cover rows that end up in the dataset.
pub(crate) fn finish(
    config: &DatasetConfig,
    build: &BuildOutput,
    price_variations: &HashMap<String, f64>,
    window: (NaiveDate, NaiveDate),
) -> Result<PipelineRun, PipelineError> {
    let mut raw = build.matrix.clone();
    let unlabeled = raw.retain_entities(|symbol| price_variations.contains_key(symbol));
    if !unlabeled.is_empty() {
        info!(count = unlabeled.len(), "excluded entities without a price variation");
    }

    let mut clean = DatasetCleaner::new(config.thresholds).clean(&raw);
    clean.matrix.attach_outcomes(price_variations)?;

    let summary = RunSummary::new(config.fiscal_year_tag.clone(), build, unlabeled, &clean)
        .with_price_window(window.0, window.1);
    info!(%summary, "dataset ready");

    Ok(PipelineRun {
        raw,
        clean,
        summary,
    })
}

/// Write the cleaned dataset and, optionally, the raw matrix.
pub(crate) fn write_outputs(
    run: &PipelineRun,
    output: &Path,
    raw_output: Option<&Path>,
    format: ExportFormat,
) -> Result<(), PipelineError> {
    run.clean.matrix.export_to_file(output, format)?;
    info!(path = %output.display(), rows = run.clean.matrix.nrows(), "wrote dataset");

    if let Some(path) = raw_output {
        run.raw.export_to_file(path, format)?;
        info!(path = %path.display(), rows = run.raw.nrows(), "wrote raw matrix");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hobart_dataset::{IndicatorList, Label, SparsityThresholds, StatementFamily, Threshold};
    use rstest::rstest;
    use serde_json::json;

    fn entity(symbol: &str, date: &str, revenue: Option<f64>, debt: f64) -> EntityDocumentSet {
        let mut record = json!({ "date": date, "totalDebt": debt });
        if let Some(revenue) = revenue {
            record["revenue"] = json!(revenue);
        }
        EntityDocumentSet::new(symbol).with_document(StatementFamily::Income, json!([record]))
    }

    fn config() -> DatasetConfig {
        DatasetConfig::new("2018", IndicatorList::new(["revenue", "totalDebt"])).with_thresholds(
            SparsityThresholds {
                max_missing: Threshold::Count(1),
                max_zeros: Threshold::Count(1),
            },
        )
    }

    fn window() -> (NaiveDate, NaiveDate) {
        default_price_window("2018").unwrap()
    }

    #[rstest]
    #[case("2018", 2019)]
    #[case(" 2020 ", 2021)]
    fn test_default_price_window(#[case] tag: &str, #[case] year: i32) {
        let (start, end) = default_price_window(tag).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(year, 1, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(year, 12, 31).unwrap());
    }

    #[test]
    fn test_non_numeric_tag_needs_explicit_window() {
        assert!(matches!(
            default_price_window("FY18"),
            Err(PipelineError::PriceWindow(_))
        ));
    }

    #[test]
    fn test_full_run() {
        let config = config();
        let build = build(
            &config,
            vec![
                Ok(entity("AAA", "2018-12-31", Some(10.0), 4.0)),
                Err(RetrievalFailure::new("BBB", "HTTP 429")),
                Ok(entity("CCC", "2018-09-30", None, 2.0)),
                Ok(entity("DDD", "2018-06-30", Some(30.0), 0.0)),
                Ok(entity("EEE", "2017-12-31", Some(1.0), 1.0)),
                Ok(entity("FFF", "2018-03-31", Some(50.0), 6.0)),
            ],
        )
        .unwrap();
        assert_eq!(build.matrix.entities(), ["AAA", "CCC", "DDD", "FFF"]);

        let variations = HashMap::from([
            ("AAA".to_string(), 12.0),
            ("CCC".to_string(), -4.0),
            ("DDD".to_string(), 0.0),
        ]);
        let run = finish(&config, &build, &variations, window()).unwrap();

        assert_eq!(run.raw.entities(), ["AAA", "CCC", "DDD"]);
        assert_eq!(run.summary.unlabeled, vec!["FFF".to_string()]);

        let matrix = &run.clean.matrix;
        assert_eq!(matrix.indicators(), ["revenue", "totalDebt"]);
        // CCC has no revenue: filled with the mean of AAA and DDD.
        assert_eq!(matrix.column("revenue").unwrap().to_vec(), vec![10.0, 20.0, 30.0]);
        assert_eq!(run.clean.imputed_cells, 1);
        assert_eq!(
            matrix.labels().unwrap(),
            vec![Label::Buy, Label::Ignore, Label::Buy]
        );

        assert_eq!(run.summary.attempted, 6);
        assert_eq!(run.summary.rows, 3);
        assert_eq!((run.summary.buy, run.summary.ignore), (2, 1));
    }

    #[test]
    fn test_empty_universe_reports_empty_dataset() {
        let config = config();
        let build = build(&config, Vec::new()).unwrap();
        let run = finish(&config, &build, &HashMap::new(), window()).unwrap();

        assert_eq!(run.clean.matrix.nrows(), 0);
        assert_eq!(run.summary.attempted, 0);
        assert_eq!(run.summary.retention_rate(), 0.0);
    }

    #[test]
    fn test_write_outputs() {
        let config = config();
        let build = build(
            &config,
            vec![
                Ok(entity("AAA", "2018-12-31", Some(10.0), 4.0)),
                Ok(entity("BBB", "2018-12-31", None, 2.0)),
            ],
        )
        .unwrap();
        let variations = HashMap::from([("AAA".to_string(), 1.0), ("BBB".to_string(), -1.0)]);
        let run = finish(&config, &build, &variations, window()).unwrap();

        let dir = std::env::temp_dir();
        let output = dir.join(format!("hobart-dataset-{}.csv", std::process::id()));
        let raw = dir.join(format!("hobart-raw-{}.csv", std::process::id()));
        write_outputs(&run, &output, Some(&raw), ExportFormat::Csv).unwrap();

        let written = std::fs::read_to_string(&output).unwrap();
        assert_eq!(
            written.lines().next(),
            Some("symbol,revenue,totalDebt,price_var_pct,class")
        );
        let written_raw = std::fs::read_to_string(&raw).unwrap();
        assert_eq!(written_raw.lines().nth(2), Some("BBB,,2"));

        let _ = std::fs::remove_file(&output);
        let _ = std::fs::remove_file(&raw);
    }
}
