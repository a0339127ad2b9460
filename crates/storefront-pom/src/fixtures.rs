//! Fixture data fed into scenarios.

use crate::result::PomResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Customer details entered on the first checkout step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutInfo {
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Postal code
    pub postal_code: String,
}

impl CheckoutInfo {
    /// Create checkout details
    #[must_use]
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        postal_code: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            postal_code: postal_code.into(),
        }
    }
}

impl Default for CheckoutInfo {
    fn default() -> Self {
        Self::new("John", "Doe", "12345")
    }
}

/// Inputs for the cart and checkout scenarios
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FixtureData {
    /// Products added in order by the cart scenario
    pub cart_products: Vec<String>,
    /// Product bought by the checkout scenario
    pub checkout_product: String,
    /// Details entered at checkout
    pub checkout_info: CheckoutInfo,
}

impl Default for FixtureData {
    fn default() -> Self {
        Self {
            cart_products: vec![
                "Sauce Labs Backpack".to_string(),
                "Sauce Labs Bike Light".to_string(),
            ],
            checkout_product: "Sauce Labs Backpack".to_string(),
            checkout_info: CheckoutInfo::default(),
        }
    }
}

impl FixtureData {
    /// Parse fixtures from YAML; missing keys keep their defaults.
    pub fn from_yaml(text: &str) -> PomResult<Self> {
        serde_yaml_ng::from_str(text)
            .map_err(|e| crate::PomError::config(format!("invalid fixture file: {e}")))
    }

    /// Load fixtures from a YAML file
    pub fn load(path: &Path) -> PomResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            crate::PomError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let data = FixtureData::default();
        assert_eq!(data.cart_products.len(), 2);
        assert_eq!(data.checkout_info.first_name, "John");
        assert_eq!(data.checkout_info.postal_code, "12345");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let data = FixtureData::from_yaml(
            "cartProducts:\n  - Sauce Labs Onesie\ncheckoutInfo:\n  firstName: Ada\n  lastName: Lovelace\n  postalCode: '10001'\n",
        )
        .unwrap();
        assert_eq!(data.cart_products, vec!["Sauce Labs Onesie".to_string()]);
        assert_eq!(data.checkout_info.last_name, "Lovelace");
        assert_eq!(data.checkout_product, "Sauce Labs Backpack");
    }

    #[test]
    fn test_malformed_yaml() {
        let err = FixtureData::from_yaml("cartProducts: {").unwrap_err();
        assert!(matches!(err, crate::PomError::Config { .. }));
    }
}
