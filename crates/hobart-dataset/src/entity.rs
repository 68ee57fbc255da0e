//! Per-entity statement documents.

use crate::json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The six statement families retrieved for every entity.
///
/// Declaration order is the concatenation order used for alignment and
/// indicator assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementFamily {
    /// Income statement
    Income,
    /// Balance sheet
    BalanceSheet,
    /// Cash flow statement
    CashFlow,
    /// Financial ratios
    Ratios,
    /// Key metrics
    KeyMetrics,
    /// Year-over-year growth
    Growth,
}

impl StatementFamily {
    /// All families, in concatenation order.
    pub const ALL: [Self; 6] = [
        Self::Income,
        Self::BalanceSheet,
        Self::CashFlow,
        Self::Ratios,
        Self::KeyMetrics,
        Self::Growth,
    ];

    /// Position of this family in [`Self::ALL`].
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Short stable name, used as a cache key.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::BalanceSheet => "balance_sheet",
            Self::CashFlow => "cash_flow",
            Self::Ratios => "ratios",
            Self::KeyMetrics => "key_metrics",
            Self::Growth => "growth",
        }
    }

    /// Parse a family from its short name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|family| family.name() == name)
    }
}

impl fmt::Display for StatementFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// All statement documents retrieved for one entity.
///
/// Families that were never set hold `Value::Null`, which contributes nothing
/// to extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDocumentSet {
    symbol: String,
    documents: [Value; 6],
}

impl EntityDocumentSet {
    /// Create an empty document set for `symbol`.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            documents: Default::default(),
        }
    }

    /// Builder-style variant of [`Self::set_document`].
    pub fn with_document(mut self, family: StatementFamily, document: Value) -> Self {
        self.set_document(family, document);
        self
    }

    /// Replace the document for `family`.
    pub fn set_document(&mut self, family: StatementFamily, document: Value) {
        self.documents[family.index()] = document;
    }

    /// Entity identifier.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Document for `family`.
    pub fn document(&self, family: StatementFamily) -> &Value {
        &self.documents[family.index()]
    }

    /// Documents in concatenation order.
    pub fn documents(&self) -> impl Iterator<Item = (StatementFamily, &Value)> {
        StatementFamily::ALL.into_iter().zip(self.documents.iter())
    }

    /// Every scalar stored under `field`, concatenated across all families.
    pub fn extract(&self, field: &str) -> Vec<&Value> {
        json::extract_concat(self.documents.iter(), field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_family_order_and_names() {
        for (i, family) in StatementFamily::ALL.into_iter().enumerate() {
            assert_eq!(family.index(), i);
            assert_eq!(StatementFamily::from_name(family.name()), Some(family));
        }
        assert_eq!(StatementFamily::from_name("unknown"), None);
        assert_eq!(StatementFamily::KeyMetrics.to_string(), "key_metrics");
    }

    #[test]
    fn test_unset_documents_are_null() {
        let set = EntityDocumentSet::new("AAPL");
        assert_eq!(set.symbol(), "AAPL");
        assert!(set.documents().all(|(_, doc)| doc.is_null()));
        assert!(set.extract("date").is_empty());
    }

    #[test]
    fn test_extract_follows_family_order() {
        // Set out of order; extraction must still follow family order.
        let set = EntityDocumentSet::new("AAPL")
            .with_document(StatementFamily::Growth, json!([{"date": "growth"}]))
            .with_document(StatementFamily::Income, json!([{"date": "income"}]))
            .with_document(StatementFamily::Ratios, json!([{"date": "ratios"}]));

        assert_eq!(
            set.extract("date"),
            vec![&json!("income"), &json!("ratios"), &json!("growth")]
        );
    }
}
