//! Selector resolution with ordered fallback strategies.
//!
//! # Design Philosophy
//!
//! - **Logical names**: page objects ask for a [`UiElement`], never a raw selector
//! - **Drift tolerance**: each element carries a [`LocatorDescriptor`], a non-empty
//!   list of strategies tried in priority order; the first strategy matching at
//!   least one element wins
//! - **Per-call resolution**: nothing is cached, every action resolves again so a
//!   re-rendered DOM never leaves a page object holding dead handles

use crate::config::HarnessConfig;
use crate::driver::{ElementRef, PageHandle};
use crate::result::{PomError, PomResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Accessible role used by role-based strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AriaRole {
    /// `<button>`, `role="button"`, submit/button inputs
    Button,
    /// `<a href>`, `role="link"`
    Link,
    /// `<select>`, `role="combobox"`
    Combobox,
}

impl AriaRole {
    /// Role name as used in ARIA
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Button => "button",
            Self::Link => "link",
            Self::Combobox => "combobox",
        }
    }
}

/// One way of locating an element
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    /// Stable test identifier attribute (e.g. `data-test="username"`)
    TestId {
        /// Attribute name
        attribute: String,
        /// Attribute value
        value: String,
    },
    /// Legacy CSS selector (id or class)
    Css(String),
    /// Accessible role plus a case-insensitive name pattern
    Role {
        /// Role
        role: AriaRole,
        /// Regular expression matched case-insensitively against the accessible name
        name: String,
    },
}

impl Strategy {
    /// Create a test-id strategy
    #[must_use]
    pub fn test_id(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::TestId {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Create a CSS strategy
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a role strategy
    #[must_use]
    pub fn role(role: AriaRole, name: impl Into<String>) -> Self {
        Self::Role {
            role,
            name: name.into(),
        }
    }

    /// Equivalent CSS selector, if the strategy can be expressed as one
    #[must_use]
    pub fn to_css(&self) -> Option<String> {
        match self {
            Self::TestId { attribute, value } => Some(format!("[{attribute}={value:?}]")),
            Self::Css(css) => Some(css.clone()),
            Self::Role { .. } => None,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TestId { attribute, value } => write!(f, "[{attribute}={value:?}]"),
            Self::Css(css) => write!(f, "css={css}"),
            Self::Role { role, name } => write!(f, "role={}[name=/{name}/i]", role.as_str()),
        }
    }
}

/// Ordered, non-empty strategy list for one logical element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorDescriptor {
    name: String,
    strategies: Vec<Strategy>,
}

impl LocatorDescriptor {
    /// Create a descriptor with its primary strategy
    #[must_use]
    pub fn new(name: impl Into<String>, primary: Strategy) -> Self {
        Self {
            name: name.into(),
            strategies: vec![primary],
        }
    }

    /// Append a lower-priority fallback strategy
    #[must_use]
    pub fn or(mut self, fallback: Strategy) -> Self {
        self.strategies.push(fallback);
        self
    }

    /// Logical element name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Strategies in priority order
    #[must_use]
    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }
}

/// Every element the page objects touch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UiElement {
    /// Login form username field
    Username,
    /// Login form password field
    Password,
    /// Login form submit button
    LoginButton,
    /// Error banner on the login and checkout forms
    ErrorBanner,
    /// Page title in the header
    Title,
    /// Shopping cart link
    CartLink,
    /// Item count badge on the cart link
    CartBadge,
    /// Product sort dropdown
    SortSelect,
    /// One catalog row
    InventoryItem,
    /// Price label in a catalog row
    InventoryItemPrice,
    /// Add-to-cart control inside a catalog row
    AddToCartButton,
    /// Cart page checkout button
    CheckoutButton,
    /// Checkout first name field
    FirstName,
    /// Checkout last name field
    LastName,
    /// Checkout postal code field
    PostalCode,
    /// Checkout continue button
    ContinueButton,
    /// Checkout finish button
    FinishButton,
}

impl UiElement {
    /// Logical name used in diagnostics
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Username => "username",
            Self::Password => "password",
            Self::LoginButton => "login-button",
            Self::ErrorBanner => "error-banner",
            Self::Title => "title",
            Self::CartLink => "cart-link",
            Self::CartBadge => "cart-badge",
            Self::SortSelect => "sort-select",
            Self::InventoryItem => "inventory-item",
            Self::InventoryItemPrice => "inventory-item-price",
            Self::AddToCartButton => "add-to-cart",
            Self::CheckoutButton => "checkout",
            Self::FirstName => "first-name",
            Self::LastName => "last-name",
            Self::PostalCode => "postal-code",
            Self::ContinueButton => "continue",
            Self::FinishButton => "finish",
        }
    }

    /// Strategies for this element, test id first
    #[must_use]
    pub fn descriptor(&self, test_id_attribute: &str) -> LocatorDescriptor {
        let tid = |value: &str| Strategy::test_id(test_id_attribute, value);
        let d = |value: &str, legacy: &str| {
            LocatorDescriptor::new(self.name(), tid(value)).or(Strategy::css(legacy))
        };
        match self {
            Self::Username => d("username", "#user-name"),
            Self::Password => d("password", "#password"),
            Self::LoginButton => d("login-button", "#login-button"),
            Self::ErrorBanner => d("error", ".error-message-container.error"),
            Self::Title => d("title", ".title"),
            Self::CartLink => d("shopping-cart-link", ".shopping_cart_link"),
            Self::CartBadge => d("shopping-cart-badge", ".shopping_cart_badge"),
            Self::SortSelect => d("product-sort-container", ".product_sort_container"),
            Self::InventoryItem => d("inventory-item", ".inventory_item"),
            Self::InventoryItemPrice => d("inventory-item-price", ".inventory_item_price"),
            Self::AddToCartButton => LocatorDescriptor::new(
                self.name(),
                Strategy::role(AriaRole::Button, "add to cart"),
            ),
            Self::CheckoutButton => d("checkout", "#checkout"),
            Self::FirstName => d("firstName", "#first-name"),
            Self::LastName => d("lastName", "#last-name"),
            Self::PostalCode => d("postalCode", "#postal-code"),
            Self::ContinueButton => d("continue", "#continue"),
            Self::FinishButton => d("finish", "#finish"),
        }
    }
}

impl fmt::Display for UiElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolves logical elements to live element references on one page handle
#[derive(Debug)]
pub struct SelectorResolver<'a, P: ?Sized> {
    page: &'a P,
    test_id_attribute: &'a str,
    action_timeout: Duration,
    poll_interval: Duration,
}

impl<'a, P: PageHandle + ?Sized> SelectorResolver<'a, P> {
    /// Create a resolver over `page`
    #[must_use]
    pub fn new(page: &'a P, config: &'a HarnessConfig) -> Self {
        Self {
            page,
            test_id_attribute: &config.test_id_attribute,
            action_timeout: config.timeouts.action(),
            poll_interval: config.timeouts.poll_interval(),
        }
    }

    /// Descriptor for `element` under the configured test-id attribute
    #[must_use]
    pub fn descriptor(&self, element: UiElement) -> LocatorDescriptor {
        element.descriptor(self.test_id_attribute)
    }

    /// Single resolution pass without waiting; no match is an empty vec
    pub async fn find_now(&self, element: UiElement) -> PomResult<Vec<ElementRef>> {
        self.first_match(None, &self.descriptor(element)).await
    }

    /// All matches of the first strategy that yields any, waiting up to the
    /// action timeout for one to appear
    pub async fn resolve_all(&self, element: UiElement) -> PomResult<Vec<ElementRef>> {
        self.wait_for_match(None, &self.descriptor(element)).await
    }

    /// First match, waiting up to the action timeout
    pub async fn resolve(&self, element: UiElement) -> PomResult<ElementRef> {
        let mut found = self.resolve_all(element).await?;
        Ok(found.swap_remove(0))
    }

    /// First match below `scope`, waiting up to the action timeout
    pub async fn resolve_within(
        &self,
        scope: &ElementRef,
        element: UiElement,
    ) -> PomResult<ElementRef> {
        let mut found = self
            .wait_for_match(Some(scope), &self.descriptor(element))
            .await?;
        Ok(found.swap_remove(0))
    }

    async fn first_match(
        &self,
        scope: Option<&ElementRef>,
        descriptor: &LocatorDescriptor,
    ) -> PomResult<Vec<ElementRef>> {
        for strategy in descriptor.strategies() {
            let found = self.page.locate(scope, strategy).await?;
            if !found.is_empty() {
                trace!(
                    element = descriptor.name(),
                    %strategy,
                    matches = found.len(),
                    "resolved"
                );
                return Ok(found);
            }
        }
        Ok(Vec::new())
    }

    async fn wait_for_match(
        &self,
        scope: Option<&ElementRef>,
        descriptor: &LocatorDescriptor,
    ) -> PomResult<Vec<ElementRef>> {
        let start = Instant::now();
        loop {
            let found = self.first_match(scope, descriptor).await?;
            if !found.is_empty() {
                return Ok(found);
            }
            if start.elapsed() >= self.action_timeout {
                debug!(element = descriptor.name(), "no strategy matched");
                return Err(PomError::ResolutionFailure {
                    element: descriptor.name().to_string(),
                    strategies: descriptor
                        .strategies()
                        .iter()
                        .map(ToString::to_string)
                        .collect(),
                    timeout_ms: self.action_timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Timeouts;
    use crate::mock::{Markup, MockStorefront};

    fn fast_config() -> HarnessConfig {
        HarnessConfig::new()
            .with_base_url(crate::mock::MOCK_BASE_URL)
            .with_timeouts(Timeouts::fast())
    }

    mod strategy_tests {
        use super::*;

        #[test]
        fn test_test_id_css() {
            let s = Strategy::test_id("data-test", "username");
            assert_eq!(s.to_css().unwrap(), "[data-test=\"username\"]");
        }

        #[test]
        fn test_role_has_no_css() {
            let s = Strategy::role(AriaRole::Button, "add to cart");
            assert!(s.to_css().is_none());
            assert_eq!(s.to_string(), "role=button[name=/add to cart/i]");
        }

        #[test]
        fn test_descriptor_priority_order() {
            let d = UiElement::Username.descriptor("data-test");
            assert_eq!(d.strategies().len(), 2);
            assert_eq!(d.strategies()[0], Strategy::test_id("data-test", "username"));
            assert_eq!(d.strategies()[1], Strategy::css("#user-name"));
        }

        #[test]
        fn test_every_descriptor_non_empty() {
            use UiElement::*;
            for el in [
                Username,
                Password,
                LoginButton,
                ErrorBanner,
                Title,
                CartLink,
                CartBadge,
                SortSelect,
                InventoryItem,
                InventoryItemPrice,
                AddToCartButton,
                CheckoutButton,
                FirstName,
                LastName,
                PostalCode,
                ContinueButton,
                FinishButton,
            ] {
                assert!(!el.descriptor("data-test").strategies().is_empty(), "{el}");
            }
        }

        #[test]
        fn test_custom_attribute() {
            let d = UiElement::Title.descriptor("data-testid");
            assert_eq!(d.strategies()[0].to_css().unwrap(), "[data-testid=\"title\"]");
        }
    }

    mod resolver_tests {
        use super::*;

        #[tokio::test]
        async fn test_resolves_primary_strategy() {
            let page = MockStorefront::new();
            let config = fast_config();
            page.navigate(&config.root_url()).await.unwrap();

            let resolver = SelectorResolver::new(&page, &config);
            let el = resolver.resolve(UiElement::Username).await.unwrap();
            assert!(el.id().ends_with("username"));
            assert!(page.was_called("locate:[data-test=\"username\"]"));
            assert!(!page.was_called("locate:css=#user-name"));
        }

        #[tokio::test]
        async fn test_falls_back_to_legacy_markup() {
            let page = MockStorefront::new().with_markup(Markup::Legacy);
            let config = fast_config();
            page.navigate(&config.root_url()).await.unwrap();

            let resolver = SelectorResolver::new(&page, &config);
            let el = resolver.resolve(UiElement::Username).await.unwrap();
            assert!(el.id().ends_with("username"));
            assert!(page.was_called("locate:css=#user-name"));
        }

        #[tokio::test]
        async fn test_find_now_empty_is_ok() {
            let page = MockStorefront::new();
            let config = fast_config();
            page.navigate(&config.root_url()).await.unwrap();

            let resolver = SelectorResolver::new(&page, &config);
            let badge = resolver.find_now(UiElement::CartBadge).await.unwrap();
            assert!(badge.is_empty());
        }

        #[tokio::test]
        async fn test_resolution_failure_lists_strategies() {
            let page = MockStorefront::new();
            let config = fast_config();
            page.navigate(&config.root_url()).await.unwrap();

            let resolver = SelectorResolver::new(&page, &config);
            let err = resolver.resolve(UiElement::FinishButton).await.unwrap_err();
            match err {
                PomError::ResolutionFailure {
                    element,
                    strategies,
                    timeout_ms,
                } => {
                    assert_eq!(element, "finish");
                    assert_eq!(strategies.len(), 2);
                    assert_eq!(timeout_ms, 500);
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[tokio::test]
        async fn test_waits_for_slow_render() {
            let page = MockStorefront::new().with_render_delay(3);
            let config = fast_config();
            page.navigate(&config.root_url()).await.unwrap();

            let resolver = SelectorResolver::new(&page, &config);
            assert!(resolver.find_now(UiElement::Username).await.unwrap().is_empty());
            assert!(resolver.resolve(UiElement::Username).await.is_ok());
        }
    }
}
