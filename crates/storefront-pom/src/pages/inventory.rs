//! Product listing.

use super::{PageContext, PageObject};
use crate::config::HarnessConfig;
use crate::driver::{ElementRef, PageHandle};
use crate::navigation::PageState;
use crate::parse::{parse_count, parse_price};
use crate::poll::Poll;
use crate::result::{PomError, PomResult};
use crate::selector::UiElement;
use crate::wait::wait_for_visible;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// Options of the product sort dropdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortOrder {
    /// Name (A to Z)
    NameAscending,
    /// Name (Z to A)
    NameDescending,
    /// Price (low to high)
    PriceLowToHigh,
    /// Price (high to low)
    PriceHighToLow,
}

impl SortOrder {
    /// `value` attribute of the matching `<option>`
    #[must_use]
    pub const fn option_value(self) -> &'static str {
        match self {
            Self::NameAscending => "az",
            Self::NameDescending => "za",
            Self::PriceLowToHigh => "lohi",
            Self::PriceHighToLow => "hilo",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.option_value())
    }
}

/// Page object for the product listing
#[derive(Debug)]
pub struct InventoryPage<'a, P: ?Sized> {
    ctx: PageContext<'a, P>,
}

impl<P: ?Sized> PageObject for InventoryPage<'_, P> {
    fn state(&self) -> PageState {
        PageState::Inventory
    }

    fn page_name(&self) -> &'static str {
        "inventory"
    }
}

impl<'a, P: PageHandle + ?Sized> InventoryPage<'a, P> {
    /// Bind to `page`
    #[must_use]
    pub const fn new(page: &'a P, config: &'a HarnessConfig) -> Self {
        Self {
            ctx: PageContext::new(page, config),
        }
    }

    /// Add the single product whose row text contains `name`.
    ///
    /// The add control is looked up inside the matched row only.
    ///
    /// # Errors
    ///
    /// - [`PomError::ElementNotFound`] if no row mentions `name`
    /// - [`PomError::AmbiguousMatch`] if more than one row does
    pub async fn add_product_by_name(&self, name: &str) -> PomResult<()> {
        let page = self.ctx.page();
        let resolver = self.ctx.resolver();

        let row = self.find_row(name).await?;
        wait_for_visible(page, &row, self.ctx.action_poll()).await?;

        let button = resolver
            .resolve_within(&row, UiElement::AddToCartButton)
            .await?;
        page.click(&button).await?;
        info!(product = name, "added to cart");
        Ok(())
    }

    /// Add each product in order, stopping at the first failure
    pub async fn add_products<S: AsRef<str>>(&self, names: &[S]) -> PomResult<()> {
        for name in names {
            self.add_product_by_name(name.as_ref()).await?;
        }
        Ok(())
    }

    /// Count shown on the cart badge; no badge means an empty cart.
    ///
    /// # Errors
    ///
    /// [`PomError::ParseFailure`] if the badge text is not a number.
    pub async fn cart_count(&self) -> PomResult<u32> {
        let badges = self.ctx.resolver().find_now(UiElement::CartBadge).await?;
        match badges.first() {
            Some(badge) => parse_count(&self.ctx.page().read_text(badge).await?),
            None => Ok(0),
        }
    }

    /// Poll the cart badge until it shows `expected`
    pub async fn expect_cart_count(&self, expected: u32) -> PomResult<u32> {
        Poll::new("cart badge count", move || self.cart_count())
            .with_config(self.ctx.assertion_poll())
            .to_equal(expected)
            .await
    }

    /// Follow the cart link and wait for the cart page
    pub async fn open_cart(&self) -> PomResult<()> {
        debug!("opening cart");
        self.ctx.click(UiElement::CartLink).await?;
        self.ctx.expect_state(PageState::Cart).await
    }

    /// Pick a sort order from the dropdown
    pub async fn sort_by(&self, order: SortOrder) -> PomResult<()> {
        let select = self.ctx.resolver().resolve(UiElement::SortSelect).await?;
        self.ctx
            .page()
            .select_option(&select, order.option_value())
            .await?;
        debug!(%order, "sorted products");
        Ok(())
    }

    /// Sort by ascending price
    pub async fn sort_low_to_high(&self) -> PomResult<()> {
        self.sort_by(SortOrder::PriceLowToHigh).await
    }

    /// Prices of all listed products, in display order.
    ///
    /// The listing is read again if it re-renders mid-read.
    pub async fn prices(&self) -> PomResult<Vec<f64>> {
        Poll::new("product prices", move || self.read_prices())
            .with_config(self.ctx.action_poll())
            .until("every price label read", |_| true)
            .await
            .map(|outcome| outcome.value)
    }

    async fn read_prices(&self) -> PomResult<Vec<f64>> {
        let page = self.ctx.page();
        let labels = self
            .ctx
            .resolver()
            .resolve_all(UiElement::InventoryItemPrice)
            .await?;
        let mut prices = Vec::with_capacity(labels.len());
        for label in &labels {
            prices.push(parse_price(&page.read_text(label).await?)?);
        }
        Ok(prices)
    }

    async fn find_row(&self, name: &str) -> PomResult<ElementRef> {
        let page = self.ctx.page();
        let rows = self
            .ctx
            .resolver()
            .resolve_all(UiElement::InventoryItem)
            .await?;

        let needle = name.to_lowercase();
        let mut matching = Vec::new();
        for row in rows {
            if page.read_text(&row).await?.to_lowercase().contains(&needle) {
                matching.push(row);
            }
        }

        let what = format!("product {name:?}");
        match matching.len() {
            0 => Err(PomError::ElementNotFound { what }),
            1 => Ok(matching.swap_remove(0)),
            count => Err(PomError::AmbiguousMatch { what, count }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertions::is_ascending;
    use crate::config::Timeouts;
    use crate::mock::{Markup, MockProduct, MockStorefront, MOCK_BASE_URL};

    fn config() -> HarnessConfig {
        HarnessConfig::new()
            .with_base_url(MOCK_BASE_URL)
            .with_timeouts(Timeouts::fast())
    }

    async fn logged_in(page: &MockStorefront) {
        page.navigate(MOCK_BASE_URL).await.unwrap();
        page.login_directly().unwrap();
    }

    mod cart_tests {
        use super::*;

        #[tokio::test]
        async fn test_empty_cart_has_no_badge() {
            let page = MockStorefront::new();
            let config = config();
            logged_in(&page).await;

            let inventory = InventoryPage::new(&page, &config);
            assert_eq!(inventory.cart_count().await.unwrap(), 0);
        }

        #[tokio::test]
        async fn test_add_products_updates_badge() {
            let page = MockStorefront::new();
            let config = config();
            logged_in(&page).await;

            let inventory = InventoryPage::new(&page, &config);
            inventory
                .add_products(&["Sauce Labs Backpack", "Sauce Labs Bike Light"])
                .await
                .unwrap();
            assert_eq!(inventory.cart_count().await.unwrap(), 2);
            assert_eq!(page.cart_size(), 2);
        }

        #[tokio::test]
        async fn test_add_is_scoped_to_row() {
            let page = MockStorefront::new();
            let config = config();
            logged_in(&page).await;

            let inventory = InventoryPage::new(&page, &config);
            inventory.add_product_by_name("Bike Light").await.unwrap();
            assert!(page.was_called("click:item:1/button"));
            assert!(!page.was_called("click:item:0/button"));
        }

        #[tokio::test]
        async fn test_lagging_badge_needs_polling() {
            let page = MockStorefront::new().with_badge_lag(6);
            let config = config();
            logged_in(&page).await;

            let inventory = InventoryPage::new(&page, &config);
            inventory
                .add_products(&["Sauce Labs Backpack", "Sauce Labs Onesie"])
                .await
                .unwrap();
            assert_ne!(inventory.cart_count().await.unwrap(), 2);
            assert_eq!(inventory.expect_cart_count(2).await.unwrap(), 2);
        }

        #[tokio::test]
        async fn test_expect_cart_count_times_out() {
            let page = MockStorefront::new();
            let config = config();
            logged_in(&page).await;

            let inventory = InventoryPage::new(&page, &config);
            inventory.add_product_by_name("Onesie").await.unwrap();
            match inventory.expect_cart_count(3).await.unwrap_err() {
                PomError::AssertionTimeout {
                    expected,
                    last_observed,
                    ..
                } => {
                    assert_eq!(expected, "3");
                    assert_eq!(last_observed, "1");
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[tokio::test]
        async fn test_unknown_product() {
            let page = MockStorefront::new();
            let config = config();
            logged_in(&page).await;

            let inventory = InventoryPage::new(&page, &config);
            let err = inventory
                .add_product_by_name("Sauce Labs Hoverboard")
                .await
                .unwrap_err();
            assert!(matches!(err, PomError::ElementNotFound { .. }));
            assert_eq!(page.cart_size(), 0);
        }

        #[tokio::test]
        async fn test_ambiguous_product() {
            let page = MockStorefront::new();
            let config = config();
            logged_in(&page).await;

            let inventory = InventoryPage::new(&page, &config);
            let err = inventory.add_product_by_name("T-Shirt").await.unwrap_err();
            assert!(matches!(err, PomError::AmbiguousMatch { count: 2, .. }));
            assert_eq!(page.cart_size(), 0);
        }

        #[tokio::test]
        async fn test_add_products_stops_at_first_failure() {
            let page = MockStorefront::new();
            let config = config();
            logged_in(&page).await;

            let inventory = InventoryPage::new(&page, &config);
            let err = inventory
                .add_products(&["Sauce Labs Backpack", "Nope", "Sauce Labs Onesie"])
                .await
                .unwrap_err();
            assert!(matches!(err, PomError::ElementNotFound { .. }));
            assert_eq!(page.cart_size(), 1);
        }

        #[tokio::test]
        async fn test_open_cart() {
            let page = MockStorefront::new();
            let config = config();
            logged_in(&page).await;

            InventoryPage::new(&page, &config).open_cart().await.unwrap();
            assert_eq!(page.page_state(), Some(PageState::Cart));
        }
    }

    mod sort_tests {
        use super::*;

        #[tokio::test]
        async fn test_default_order_is_by_name() {
            let page = MockStorefront::new();
            let config = config();
            logged_in(&page).await;

            let prices = InventoryPage::new(&page, &config).prices().await.unwrap();
            assert_eq!(prices, vec![29.99, 9.99, 15.99, 49.99, 7.99, 15.99]);
            assert!(!is_ascending(&prices));
        }

        #[tokio::test]
        async fn test_sort_low_to_high() {
            let page = MockStorefront::new();
            let config = config();
            logged_in(&page).await;

            let inventory = InventoryPage::new(&page, &config);
            inventory.sort_low_to_high().await.unwrap();
            let prices = inventory.prices().await.unwrap();
            assert_eq!(prices.len(), 6);
            assert!(is_ascending(&prices));
            assert!(page.was_called("select_option:sort=lohi"));
        }

        #[tokio::test]
        async fn test_sort_high_to_low_with_legacy_markup() {
            let page = MockStorefront::new().with_markup(Markup::Legacy);
            let config = config();
            logged_in(&page).await;

            let inventory = InventoryPage::new(&page, &config);
            inventory.sort_by(SortOrder::PriceHighToLow).await.unwrap();
            let mut prices = inventory.prices().await.unwrap();
            prices.reverse();
            assert!(is_ascending(&prices));
        }

        #[tokio::test]
        async fn test_zero_price() {
            let page = MockStorefront::new()
                .with_products(vec![MockProduct::new("Free Sticker", 0)]);
            let config = config();
            logged_in(&page).await;

            let prices = InventoryPage::new(&page, &config).prices().await.unwrap();
            assert_eq!(prices, vec![0.0]);
        }

        #[test]
        fn test_option_values() {
            assert_eq!(SortOrder::PriceLowToHigh.option_value(), "lohi");
            assert_eq!(SortOrder::NameDescending.to_string(), "za");
        }
    }
}
