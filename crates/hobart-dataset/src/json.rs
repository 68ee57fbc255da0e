//! Field extraction over arbitrary nested JSON.
//!
//! Filings come back from the upstream API in several shapes: flat arrays of
//! records, records wrapped in an object, and records whose fields are grouped
//! into nested sub-objects. Extraction therefore ignores schema entirely and
//! walks the structure, collecting every scalar stored under a given key.
//!
//! Results are in document order: objects are visited key by key in the order
//! the keys appeared in the source (requires `serde_json/preserve_order`),
//! arrays element by element, depth first. Positional alignment between
//! different fields relies on this ordering.

use serde_json::Value;

enum Step<'a> {
    Walk(&'a Value),
    Visit(&'a str, &'a Value),
}

/// Calls `visit` with every `(key, scalar)` pair reachable from `node`, in
/// document order.
///
/// Values that are objects or arrays are descended into rather than visited.
/// Scalars at the root, or directly inside arrays, have no key and are never
/// visited. Uses an explicit stack, so nesting depth is bounded only by memory.
pub fn visit_scalars<'a, F>(node: &'a Value, mut visit: F)
where
    F: FnMut(&'a str, &'a Value),
{
    let mut stack = vec![Step::Walk(node)];

    while let Some(step) = stack.pop() {
        match step {
            Step::Visit(key, value) => visit(key, value),
            Step::Walk(Value::Object(map)) => {
                // Pushed in reverse so the pops come out in key order.
                for (key, value) in map.iter().rev() {
                    match value {
                        Value::Object(_) | Value::Array(_) => stack.push(Step::Walk(value)),
                        _ => stack.push(Step::Visit(key.as_str(), value)),
                    }
                }
            }
            Step::Walk(Value::Array(items)) => {
                stack.extend(items.iter().rev().map(Step::Walk));
            }
            Step::Walk(_) => {}
        }
    }
}

/// Collects every scalar stored under `field` anywhere in `node`.
///
/// Returns an empty vector when the field never occurs, including for empty
/// objects, empty arrays and bare scalars.
///
/// # Example
///
/// ```
/// use hobart_dataset::json::extract;
/// use serde_json::json;
///
/// let doc = json!([
///     {"date": "2018-12-31", "ratios": {"currentRatio": 1.4}},
///     {"date": "2017-12-31", "ratios": {"currentRatio": 1.1}},
/// ]);
///
/// assert_eq!(extract(&doc, "date"), vec![&json!("2018-12-31"), &json!("2017-12-31")]);
/// assert_eq!(extract(&doc, "currentRatio").len(), 2);
/// assert!(extract(&json!({}), "date").is_empty());
/// ```
pub fn extract<'a>(node: &'a Value, field: &str) -> Vec<&'a Value> {
    let mut found = Vec::new();
    visit_scalars(node, |key, value| {
        if key == field {
            found.push(value);
        }
    });
    found
}

/// Concatenates [`extract`] over several documents, in the order given.
pub fn extract_concat<'a, I>(nodes: I, field: &str) -> Vec<&'a Value>
where
    I: IntoIterator<Item = &'a Value>,
{
    nodes
        .into_iter()
        .flat_map(|node| extract(node, field))
        .collect()
}

/// Reads a scalar as a finite number.
///
/// Numbers are taken as-is. Strings are parsed, since the upstream API has
/// historically served numeric fields as text. Everything else, including
/// empty or unparseable strings and non-finite results, is `None`; a missing
/// value is never turned into zero.
pub fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_extract_empty_inputs() {
        assert!(extract(&json!({}), "x").is_empty());
        assert!(extract(&json!([]), "x").is_empty());
        assert!(extract(&json!(null), "x").is_empty());
        assert!(extract(&json!("x"), "x").is_empty());
    }

    #[test]
    fn test_extract_preserves_document_order() {
        let doc = json!({
            "x": 1,
            "nested": {"x": 2, "deeper": [{"x": 3}, {"y": 9, "x": 4}]},
            "after": [{"x": 5}],
            "y": {"x": 6}
        });

        let values: Vec<i64> = extract(&doc, "x")
            .into_iter()
            .filter_map(Value::as_i64)
            .collect();
        assert_eq!(values, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_extract_key_order_not_alphabetical() {
        let doc: Value = serde_json::from_str(r#"{"z": {"x": "first"}, "a": {"x": "second"}}"#)
            .unwrap();
        assert_eq!(extract(&doc, "x"), vec![&json!("first"), &json!("second")]);
    }

    #[test]
    fn test_extract_skips_container_values_under_field() {
        // A key matching the field whose value is a container is descended into,
        // not collected.
        let doc = json!({"x": {"x": 7}, "list": {"x": [1, 2]}});
        assert_eq!(extract(&doc, "x"), vec![&json!(7)]);
    }

    #[test]
    fn test_extract_exact_key_match() {
        let doc = json!({"date": "2018", "dates": "2017", "Date": "2016", "filingDate": "2019"});
        assert_eq!(extract(&doc, "date"), vec![&json!("2018")]);
    }

    #[test]
    fn test_extract_collects_all_scalar_kinds() {
        let doc = json!([{"x": 1.5}, {"x": "a"}, {"x": true}, {"x": null}]);
        assert_eq!(extract(&doc, "x").len(), 4);
    }

    #[test]
    fn test_extract_deep_nesting() {
        let mut doc = json!({"x": "bottom"});
        for _ in 0..1_000 {
            doc = json!([{ "wrap": doc }]);
        }
        assert_eq!(extract(&doc, "x"), vec![&json!("bottom")]);
    }

    #[test]
    fn test_extract_concat_order() {
        let a = json!([{"date": "a1"}, {"date": "a2"}]);
        let b = json!({"financials": [{"date": "b1"}]});
        let dates = extract_concat([&a, &b], "date");
        assert_eq!(dates, vec![&json!("a1"), &json!("a2"), &json!("b1")]);
    }

    #[test]
    fn test_visit_scalars_reports_keys() {
        let doc = json!({"a": 1, "b": [{"c": 2}]});
        let mut keys = Vec::new();
        visit_scalars(&doc, |key, _| keys.push(key.to_string()));
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[rstest]
    #[case(json!(1.25), Some(1.25))]
    #[case(json!(-3), Some(-3.0))]
    #[case(json!("0.5"), Some(0.5))]
    #[case(json!(" 42 "), Some(42.0))]
    #[case(json!("0"), Some(0.0))]
    #[case(json!(""), None)]
    #[case(json!("n/a"), None)]
    #[case(json!("NaN"), None)]
    #[case(json!("inf"), None)]
    #[case(json!(null), None)]
    #[case(json!(true), None)]
    fn test_as_number(#[case] value: Value, #[case] expected: Option<f64>) {
        assert_eq!(as_number(&value), expected);
    }
}
