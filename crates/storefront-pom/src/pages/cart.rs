//! Cart review.

use super::{PageContext, PageObject};
use crate::config::HarnessConfig;
use crate::driver::PageHandle;
use crate::navigation::PageState;
use crate::result::PomResult;
use crate::selector::UiElement;
use tracing::debug;

/// Page object for the cart
#[derive(Debug)]
pub struct CartPage<'a, P: ?Sized> {
    ctx: PageContext<'a, P>,
}

impl<P: ?Sized> PageObject for CartPage<'_, P> {
    fn state(&self) -> PageState {
        PageState::Cart
    }

    fn page_name(&self) -> &'static str {
        "cart"
    }
}

impl<'a, P: PageHandle + ?Sized> CartPage<'a, P> {
    /// Bind to `page`
    #[must_use]
    pub const fn new(page: &'a P, config: &'a HarnessConfig) -> Self {
        Self {
            ctx: PageContext::new(page, config),
        }
    }

    /// Start checkout and wait for the customer information form
    pub async fn checkout(&self) -> PomResult<()> {
        debug!("starting checkout");
        self.ctx.click(UiElement::CheckoutButton).await?;
        self.ctx.expect_state(PageState::CheckoutInfo).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Timeouts;
    use crate::mock::{MockStorefront, MOCK_BASE_URL};
    use crate::pages::InventoryPage;
    use crate::PomError;

    fn config() -> HarnessConfig {
        HarnessConfig::new()
            .with_base_url(MOCK_BASE_URL)
            .with_timeouts(Timeouts::fast())
    }

    #[tokio::test]
    async fn test_checkout_from_cart() {
        let page = MockStorefront::new();
        let config = config();
        page.navigate(MOCK_BASE_URL).await.unwrap();
        page.login_directly().unwrap();
        InventoryPage::new(&page, &config).open_cart().await.unwrap();

        CartPage::new(&page, &config).checkout().await.unwrap();
        assert_eq!(page.page_state(), Some(PageState::CheckoutInfo));
    }

    #[tokio::test]
    async fn test_checkout_off_the_cart_page_fails_resolution() {
        let page = MockStorefront::new();
        let config = config();
        page.navigate(MOCK_BASE_URL).await.unwrap();
        page.login_directly().unwrap();

        let err = CartPage::new(&page, &config).checkout().await.unwrap_err();
        assert!(matches!(err, PomError::ResolutionFailure { .. }));
        assert_eq!(page.page_state(), Some(PageState::Inventory));
    }
}
