//! Integration tests for cached statement documents

use hobart_data::{SqliteCache, fmp::check_error_payload};
use hobart_dataset::{DateAligner, EntityDocumentSet, IndicatorAssembler, IndicatorList, StatementFamily};
use serde_json::{Value, json};

fn payloads() -> Vec<(StatementFamily, Value)> {
    vec![
        (
            StatementFamily::Income,
            json!([
                { "date": "2019-09-28", "symbol": "AAPL", "revenue": 260174000000i64 },
                { "date": "2018-09-29", "symbol": "AAPL", "revenue": 265595000000i64 }
            ]),
        ),
        (StatementFamily::BalanceSheet, json!([])),
        (StatementFamily::CashFlow, json!([])),
        (
            StatementFamily::Ratios,
            json!([{ "date": "2019-09-28", "currentRatio": "1.54" }]),
        ),
        (StatementFamily::KeyMetrics, json!([])),
        (StatementFamily::Growth, json!([])),
    ]
}

#[test]
fn test_cached_documents_align_like_fetched_ones() {
    let cache = SqliteCache::in_memory().unwrap();

    let mut fetched = EntityDocumentSet::new("AAPL");
    for (family, body) in payloads() {
        let body = check_error_payload(body).unwrap();
        cache.put_document("AAPL", family, &body).unwrap();
        fetched.set_document(family, body);
    }

    assert!(cache.has_document_set("AAPL").unwrap());
    let cached = cache.get_document_set("AAPL").unwrap().unwrap();
    assert_eq!(cached, fetched);

    let aligner = DateAligner::default();
    assert_eq!(aligner.align(&cached, "2018"), Some(1));
    assert_eq!(aligner.align(&cached, "2018"), aligner.align(&fetched, "2018"));

    let indicators = IndicatorList::new(["revenue", "currentRatio"]);
    let row = IndicatorAssembler::new(&indicators).assemble(&cached, 1);
    assert_eq!(row, vec![Some(265595000000.0), None]);
}

#[test]
fn test_partial_set_is_not_served() {
    let cache = SqliteCache::in_memory().unwrap();
    for (family, body) in payloads().into_iter().take(5) {
        cache.put_document("MSFT", family, &body).unwrap();
    }

    assert!(!cache.has_document_set("MSFT").unwrap());
    assert!(cache.get_document_set("MSFT").unwrap().is_none());
}

#[test]
fn test_error_payload_is_never_cached_as_data() {
    let result = check_error_payload(json!({ "Error Message": "Limit Reach" }));
    assert!(result.is_err());
}
