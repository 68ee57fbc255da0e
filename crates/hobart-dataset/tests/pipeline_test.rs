//! End-to-end tests: documents to a labeled, cleaned matrix.

use approx::assert_relative_eq;
use hobart_dataset::{
    AlignmentPolicy, DatasetBuilder, DatasetCleaner, DatasetConfig, DropReason,
    EntityDocumentSet, IndicatorList, Label, RetrievalFailure, SparsityThresholds,
    StatementFamily, Threshold, label,
};
use serde_json::json;
use std::collections::HashMap;

/// An entity whose filings are split across families and nested the way the
/// upstream API returns them.
fn filer(symbol: &str, dates: &[&str], revenue: &[f64], current_ratio: &[&str]) -> EntityDocumentSet {
    let income: Vec<_> = dates
        .iter()
        .zip(revenue)
        .map(|(date, revenue)| json!({ "date": date, "symbol": symbol, "revenue": revenue }))
        .collect();
    let ratios: Vec<_> = current_ratio
        .iter()
        .map(|ratio| json!({ "liquidity": { "currentRatio": ratio } }))
        .collect();

    EntityDocumentSet::new(symbol)
        .with_document(StatementFamily::Income, json!(income))
        .with_document(StatementFamily::Ratios, json!({ "symbol": symbol, "ratios": ratios }))
}

fn config() -> DatasetConfig {
    DatasetConfig::new("2018", IndicatorList::new(["revenue", "currentRatio", "ebitda"]))
        .with_thresholds(SparsityThresholds {
            max_missing: Threshold::Count(1),
            max_zeros: Threshold::Count(1),
        })
}

#[test]
fn test_first_filing_for_year_is_used() {
    let entity = filer(
        "A",
        &["2018-12-31", "2018-06-30", "2017-12-31"],
        &[300.0, 200.0, 100.0],
        &["1.5", "1.4", "1.3"],
    );

    let output = DatasetBuilder::new(config()).build(vec![Ok(entity)]).unwrap();
    let row = output.matrix.row("A").unwrap();
    assert_eq!(row[0], Some(300.0));
    assert_eq!(row[1], Some(1.5));
    assert_eq!(row[2], None);
}

#[test]
fn test_latest_policy_is_order_independent() {
    let entity = filer(
        "A",
        &["2018-06-30", "2018-12-31", "2017-12-31"],
        &[200.0, 300.0, 100.0],
        &["1.4", "1.5", "1.3"],
    );
    let config = config().with_policy(AlignmentPolicy::LatestDate);

    let output = DatasetBuilder::new(config).build(vec![Ok(entity)]).unwrap();
    assert_eq!(output.matrix.row("A").unwrap()[0], Some(300.0));
}

#[test]
fn test_full_pipeline() {
    let entities = vec![
        Ok(filer("AAA", &["2018-12-31"], &[10.0], &["2.0"])),
        Ok(filer("BBB", &["2019-12-31", "2018-12-31"], &[25.0, 20.0], &["1.0", "3.0"])),
        Err(RetrievalFailure::new("CCC", "HTTP 404")),
        Ok(filer("DDD", &["2017-12-31"], &[5.0], &["1.0"])),
        Ok(filer("EEE", &["2018-09-30"], &[30.0], &[])),
    ];

    let config = config();
    let built = DatasetBuilder::new(config.clone()).build(entities).unwrap();

    assert_eq!(built.attempted(), 5);
    assert_eq!(built.matrix.entities(), ["AAA", "BBB", "EEE"]);
    let reasons: Vec<_> = built.dropped.iter().map(|d| (d.symbol.as_str(), d.reason.kind())).collect();
    assert_eq!(reasons, vec![("CCC", "retrieval"), ("DDD", "unaligned")]);

    let cleaned = DatasetCleaner::new(config.thresholds).clean(&built.matrix);
    // ebitda is never reported.
    assert_eq!(cleaned.matrix.indicators(), ["revenue", "currentRatio"]);
    assert_eq!(cleaned.imputed_cells, 1);

    let ratios = cleaned.matrix.column("currentRatio").unwrap();
    assert_relative_eq!(ratios[1], 3.0);
    assert_relative_eq!(ratios[2], 2.5);

    let mut variations = HashMap::new();
    variations.insert("AAA".to_string(), 12.0);
    variations.insert("BBB".to_string(), -0.01);
    variations.insert("EEE".to_string(), 0.0);

    let mut matrix = cleaned.matrix;
    matrix.attach_outcomes(&variations).unwrap();
    assert_eq!(
        matrix.labels(),
        Some(vec![Label::Buy, Label::Ignore, Label::Buy])
    );

    let df = matrix.to_dataframe().unwrap();
    assert_eq!(df.height(), 3);
    assert_eq!(
        df.get_column_names_str(),
        vec!["symbol", "revenue", "currentRatio", "price_var_pct", "class"]
    );
}

#[test]
fn test_unaligned_entity_reported() {
    let output = DatasetBuilder::new(config())
        .build(vec![Ok(filer("B", &["2017-12-31"], &[1.0], &["1.0"]))])
        .unwrap();

    assert_eq!(output.matrix.nrows(), 0);
    assert_eq!(output.dropped.len(), 1);
    assert!(matches!(output.dropped[0].reason, DropReason::Unaligned { .. }));
}

#[test]
fn test_label_boundary() {
    assert_eq!(label(-0.01).as_u8(), 0);
    assert_eq!(label(0.0).as_u8(), 1);
}
