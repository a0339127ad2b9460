//! Text patterns and ordering checks used by post-conditions and scenarios.

use crate::navigation::PageState;
use crate::result::{PomError, PomResult};
use regex::{Regex, RegexBuilder};
use std::fmt;

/// Case-insensitive regular expression matched against rendered text
#[derive(Debug, Clone)]
pub struct TextPattern {
    source: String,
    regex: Regex,
}

impl TextPattern {
    /// Compile `source` as a case-insensitive pattern
    pub fn case_insensitive(source: &str) -> PomResult<Self> {
        let regex = RegexBuilder::new(source)
            .case_insensitive(true)
            .build()
            .map_err(|e| PomError::config(format!("invalid text pattern /{source}/: {e}")))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// Title shown on `state`
    pub fn page_title(state: PageState) -> PomResult<Self> {
        match state.title_pattern() {
            Some(source) => Self::case_insensitive(source),
            None => Err(PomError::config(format!("the {state} page has no title"))),
        }
    }

    /// Title of the inventory listing
    pub fn products_title() -> PomResult<Self> {
        Self::page_title(PageState::Inventory)
    }

    /// Title of the order confirmation page
    pub fn checkout_complete_title() -> PomResult<Self> {
        Self::page_title(PageState::Complete)
    }

    /// Whether `text` contains a match
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl fmt::Display for TextPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/i", self.source)
    }
}

/// Whether `values` is non-decreasing
#[must_use]
pub fn is_ascending(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] <= w[1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_products_title() {
        let p = TextPattern::products_title().unwrap();
        assert!(p.is_match("Products"));
        assert!(p.is_match("PRODUCTS"));
        assert!(!p.is_match("Your Cart"));
        assert_eq!(p.to_string(), "/Products/i");
    }

    #[test]
    fn test_checkout_complete_title() {
        let p = TextPattern::checkout_complete_title().unwrap();
        assert!(p.is_match("Checkout: Complete!"));
        assert!(p.is_match("checkout:complete!"));
        assert!(p.is_match("Checkout:   COMPLETE!"));
        assert!(!p.is_match("Checkout: Overview"));
    }

    #[test]
    fn test_login_form_has_no_title() {
        assert!(matches!(
            TextPattern::page_title(PageState::Unauthenticated),
            Err(PomError::Config { .. })
        ));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(matches!(
            TextPattern::case_insensitive("(unclosed"),
            Err(PomError::Config { .. })
        ));
    }

    #[test]
    fn test_is_ascending_examples() {
        assert!(is_ascending(&[]));
        assert!(is_ascending(&[9.99]));
        assert!(is_ascending(&[7.99, 9.99, 15.99, 15.99, 29.99, 49.99]));
        assert!(!is_ascending(&[29.99, 9.99]));
    }

    proptest! {
        #[test]
        fn prop_sorted_is_ascending(mut values in prop::collection::vec(0.0f64..1000.0, 0..32)) {
            values.sort_by(f64::total_cmp);
            prop_assert!(is_ascending(&values));
        }

        #[test]
        fn prop_strictly_descending_pair_is_not_ascending(a in 0.0f64..1000.0, d in 0.01f64..100.0) {
            prop_assert!(!is_ascending(&[a + d, a]));
        }
    }
}
