//! Binary outcome labels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Class derived from an entity's price variation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Label {
    /// Price fell over the evaluation window.
    Ignore = 0,
    /// Price held or rose over the evaluation window.
    Buy = 1,
}

impl Label {
    /// Label for a price variation: non-negative is [`Label::Buy`].
    ///
    /// Total over `f64`; NaN compares false and is [`Label::Ignore`].
    pub fn from_price_variation(price_variation: f64) -> Self {
        if price_variation >= 0.0 {
            Self::Buy
        } else {
            Self::Ignore
        }
    }

    /// Numeric class, `0` or `1`.
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ignore => f.write_str("IGNORE"),
            Self::Buy => f.write_str("BUY"),
        }
    }
}

/// Shorthand for [`Label::from_price_variation`].
pub fn label(price_variation: f64) -> Label {
    Label::from_price_variation(price_variation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(-0.01, Label::Ignore)]
    #[case(0.0, Label::Buy)]
    #[case(-0.0, Label::Buy)]
    #[case(12.5, Label::Buy)]
    #[case(-87.3, Label::Ignore)]
    #[case(f64::INFINITY, Label::Buy)]
    #[case(f64::NEG_INFINITY, Label::Ignore)]
    #[case(f64::NAN, Label::Ignore)]
    fn test_label(#[case] price_variation: f64, #[case] expected: Label) {
        assert_eq!(label(price_variation), expected);
    }

    #[test]
    fn test_label_is_buy_iff_non_negative() {
        for x in [-1e9, -1.0, -1e-12, 0.0, 1e-12, 1.0, 1e9] {
            assert_eq!(label(x) == Label::Buy, x >= 0.0);
        }
    }

    #[test]
    fn test_numeric_class() {
        assert_eq!(Label::Ignore.as_u8(), 0);
        assert_eq!(Label::Buy.as_u8(), 1);
        assert_eq!(Label::Buy.to_string(), "BUY");
    }
}
