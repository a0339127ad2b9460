//! Numeric values scraped from rendered text.
//!
//! Every parse either yields a number or a [`PomError::ParseFailure`] naming
//! the offending text; there is no silent NaN.

use crate::result::{PomError, PomResult};

/// Parse a cart badge label such as `"2"`
pub fn parse_count(text: &str) -> PomResult<u32> {
    text.trim().parse().map_err(|_| PomError::ParseFailure {
        target: "cart count",
        text: text.to_string(),
    })
}

/// Parse a price label such as `"$29.99"`, ignoring everything but digits and
/// the decimal point
pub fn parse_price(text: &str) -> PomResult<f64> {
    let digits: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let failure = || PomError::ParseFailure {
        target: "price",
        text: text.to_string(),
    };
    if !digits.chars().any(|c| c.is_ascii_digit()) {
        return Err(failure());
    }
    digits.parse().map_err(|_| failure())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_count() {
        assert_eq!(parse_count("2").unwrap(), 2);
        assert_eq!(parse_count(" 12\n").unwrap(), 12);
    }

    #[test]
    fn test_count_rejects_text() {
        let err = parse_count("two").unwrap_err();
        assert!(matches!(err, PomError::ParseFailure { target: "cart count", .. }));
        assert!(parse_count("").is_err());
        assert!(parse_count("-1").is_err());
    }

    #[test]
    fn test_price() {
        assert_eq!(parse_price("$29.99").unwrap(), 29.99);
        assert_eq!(parse_price("Price: 7.99 USD").unwrap(), 7.99);
        assert_eq!(parse_price("$1,049.00").unwrap(), 1049.0);
    }

    #[test]
    fn test_price_rejects_non_numeric() {
        assert!(matches!(
            parse_price("free"),
            Err(PomError::ParseFailure { target: "price", .. })
        ));
        assert!(parse_price("$.").is_err());
        assert!(parse_price("1.2.3").is_err());
    }

    proptest! {
        #[test]
        fn prop_price_label_parses_back(cents in 0u32..10_000_000) {
            let label = format!("${}.{:02}", cents / 100, cents % 100);
            let parsed = parse_price(&label).unwrap();
            prop_assert!((parsed - f64::from(cents) / 100.0).abs() < 1e-9);
        }

        #[test]
        fn prop_count_label_parses_back(n in 0u32..10_000) {
            prop_assert_eq!(parse_count(&n.to_string()).unwrap(), n);
        }
    }
}
