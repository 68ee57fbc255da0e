//! Fiscal-year alignment across statement families.
//!
//! The dates of all six families are concatenated (family order, then record
//! order) into one sequence. The alignment index is a position in that
//! sequence, and indicator values are later read at the same position of each
//! indicator's own concatenated sequence.

use crate::entity::EntityDocumentSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Field holding a record's filing date.
pub const DATE_FIELD: &str = "date";

/// Position in the concatenated date sequence, or `None` when the entity has
/// no record for the requested fiscal year.
pub type AlignmentIndex = Option<usize>;

/// How to choose between several records tagged with the same fiscal year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentPolicy {
    /// First match in retrieval order. The upstream API lists records newest
    /// first, so this keeps the most recent filing for the year.
    #[default]
    FirstMatch,
    /// Greatest full date among the matches, independent of retrieval order.
    /// Ties keep the earliest position.
    LatestDate,
}

impl fmt::Display for AlignmentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirstMatch => f.write_str("first"),
            Self::LatestDate => f.write_str("latest"),
        }
    }
}

impl FromStr for AlignmentPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "first" | "first-match" => Ok(Self::FirstMatch),
            "latest" | "latest-date" => Ok(Self::LatestDate),
            other => Err(format!("unknown alignment policy: {other}")),
        }
    }
}

/// Locates the record for a fiscal year within an entity's filings.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateAligner {
    policy: AlignmentPolicy,
}

impl DateAligner {
    /// Create an aligner with the given duplicate-filing policy.
    pub const fn new(policy: AlignmentPolicy) -> Self {
        Self { policy }
    }

    /// Configured policy.
    pub const fn policy(&self) -> AlignmentPolicy {
        self.policy
    }

    /// Alignment index of `entity` for `fiscal_year_tag`.
    pub fn align(&self, entity: &EntityDocumentSet, fiscal_year_tag: &str) -> AlignmentIndex {
        self.align_dates(&entity.extract(DATE_FIELD), fiscal_year_tag)
    }

    /// Alignment over an already-extracted date sequence.
    ///
    /// An entry matches when it is a string containing `fiscal_year_tag`.
    /// Non-string dates never match.
    pub fn align_dates(&self, dates: &[&Value], fiscal_year_tag: &str) -> AlignmentIndex {
        let mut matches = dates
            .iter()
            .enumerate()
            .filter_map(|(i, date)| date.as_str().map(|d| (i, d)))
            .filter(|(_, date)| date.contains(fiscal_year_tag));

        match self.policy {
            AlignmentPolicy::FirstMatch => matches.next().map(|(i, _)| i),
            AlignmentPolicy::LatestDate => matches
                .fold(None::<(usize, &str)>, |best, (i, date)| match best {
                    Some((_, best_date)) if date <= best_date => best,
                    _ => Some((i, date)),
                })
                .map(|(i, _)| i),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::StatementFamily;
    use rstest::rstest;
    use serde_json::json;

    fn entity_with_dates(dates: &[&str]) -> EntityDocumentSet {
        let records: Vec<Value> = dates.iter().map(|d| json!({ "date": d })).collect();
        EntityDocumentSet::new("A").with_document(StatementFamily::Income, Value::Array(records))
    }

    #[test]
    fn test_first_match_keeps_first_filing_for_year() {
        let entity = entity_with_dates(&["2018-12-31", "2018-06-30", "2017-12-31"]);
        let aligner = DateAligner::default();
        assert_eq!(aligner.align(&entity, "2018"), Some(0));
    }

    #[test]
    fn test_first_match_ignores_later_duplicates() {
        let entity = entity_with_dates(&["2019-12-31", "2018-06-30", "2018-12-31"]);
        let aligner = DateAligner::new(AlignmentPolicy::FirstMatch);
        assert_eq!(aligner.align(&entity, "2018"), Some(1));
    }

    #[test]
    fn test_latest_date_picks_maximum() {
        let entity = entity_with_dates(&["2019-12-31", "2018-06-30", "2018-12-31"]);
        let aligner = DateAligner::new(AlignmentPolicy::LatestDate);
        assert_eq!(aligner.align(&entity, "2018"), Some(2));
    }

    #[test]
    fn test_latest_date_ties_keep_first() {
        let entity = entity_with_dates(&["2018-12-31", "2018-12-31"]);
        let aligner = DateAligner::new(AlignmentPolicy::LatestDate);
        assert_eq!(aligner.align(&entity, "2018"), Some(0));
    }

    #[rstest]
    #[case(AlignmentPolicy::FirstMatch)]
    #[case(AlignmentPolicy::LatestDate)]
    fn test_unaligned_when_no_date_matches(#[case] policy: AlignmentPolicy) {
        let entity = entity_with_dates(&["2017-12-31", "2016-12-31"]);
        assert_eq!(DateAligner::new(policy).align(&entity, "2018"), None);
        assert_eq!(DateAligner::new(policy).align(&EntityDocumentSet::new("B"), "2018"), None);
    }

    #[test]
    fn test_index_spans_families() {
        let entity = EntityDocumentSet::new("A")
            .with_document(StatementFamily::Income, json!([{"date": "2017-12-31"}]))
            .with_document(StatementFamily::BalanceSheet, json!([{"date": "2016-12-31"}]))
            .with_document(StatementFamily::Growth, json!([{"date": "2018-12-31"}]));
        assert_eq!(DateAligner::default().align(&entity, "2018"), Some(2));
    }

    #[test]
    fn test_non_string_dates_never_match() {
        let dates = [json!(2018), json!(null), json!("2018-12-31")];
        let refs: Vec<&Value> = dates.iter().collect();
        assert_eq!(DateAligner::default().align_dates(&refs, "2018"), Some(2));
    }

    #[test]
    fn test_align_is_deterministic() {
        let entity = entity_with_dates(&["2019-03-31", "2018-09-30", "2018-12-31"]);
        let aligner = DateAligner::default();
        let first = aligner.align(&entity, "2018");
        for _ in 0..10 {
            assert_eq!(aligner.align(&entity, "2018"), first);
        }
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("first".parse::<AlignmentPolicy>(), Ok(AlignmentPolicy::FirstMatch));
        assert_eq!("Latest".parse::<AlignmentPolicy>(), Ok(AlignmentPolicy::LatestDate));
        assert!("newest".parse::<AlignmentPolicy>().is_err());
        assert_eq!(AlignmentPolicy::LatestDate.to_string(), "latest");
    }
}
