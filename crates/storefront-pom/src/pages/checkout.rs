//! Checkout steps: customer information, overview and confirmation.

use super::{PageContext, PageObject};
use crate::assertions::TextPattern;
use crate::config::HarnessConfig;
use crate::driver::PageHandle;
use crate::fixtures::CheckoutInfo;
use crate::navigation::PageState;
use crate::result::PomResult;
use crate::selector::UiElement;
use crate::wait::wait_for_text;
use tracing::{debug, info};

/// Page object for the checkout flow
#[derive(Debug)]
pub struct CheckoutPage<'a, P: ?Sized> {
    ctx: PageContext<'a, P>,
}

impl<P: ?Sized> PageObject for CheckoutPage<'_, P> {
    fn state(&self) -> PageState {
        PageState::CheckoutInfo
    }

    fn page_name(&self) -> &'static str {
        "checkout"
    }
}

impl<'a, P: PageHandle + ?Sized> CheckoutPage<'a, P> {
    /// Bind to `page`
    #[must_use]
    pub const fn new(page: &'a P, config: &'a HarnessConfig) -> Self {
        Self {
            ctx: PageContext::new(page, config),
        }
    }

    /// Fill the customer information form and wait for the overview.
    ///
    /// # Errors
    ///
    /// [`crate::PomError::AssertionFailure`] with the form's error text when
    /// a field is rejected.
    pub async fn fill_information(&self, info: &CheckoutInfo) -> PomResult<()> {
        self.ctx.fill(UiElement::FirstName, &info.first_name).await?;
        self.ctx.fill(UiElement::LastName, &info.last_name).await?;
        self.ctx.fill(UiElement::PostalCode, &info.postal_code).await?;
        self.ctx.click(UiElement::ContinueButton).await?;
        debug!(postal_code = %info.postal_code, "customer information submitted");
        self.ctx.expect_state(PageState::CheckoutOverview).await
    }

    /// Place the order
    pub async fn finish(&self) -> PomResult<()> {
        self.ctx.click(UiElement::FinishButton).await
    }

    /// Assert the confirmation page title is shown
    pub async fn expect_complete(&self) -> PomResult<()> {
        let pattern = TextPattern::checkout_complete_title()?;
        let title = self.ctx.resolver().resolve(UiElement::Title).await?;
        let text = wait_for_text(
            self.ctx.page(),
            &title,
            &pattern,
            self.ctx.assertion_poll(),
        )
        .await?;
        info!(title = %text, "order complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Timeouts;
    use crate::mock::{Markup, MockStorefront, MOCK_BASE_URL};
    use crate::pages::{CartPage, InventoryPage};
    use crate::PomError;

    fn config() -> HarnessConfig {
        HarnessConfig::new()
            .with_base_url(MOCK_BASE_URL)
            .with_timeouts(Timeouts::fast())
    }

    async fn at_checkout(page: &MockStorefront, config: &HarnessConfig) {
        page.navigate(MOCK_BASE_URL).await.unwrap();
        page.login_directly().unwrap();
        let inventory = InventoryPage::new(page, config);
        inventory
            .add_product_by_name("Sauce Labs Backpack")
            .await
            .unwrap();
        inventory.open_cart().await.unwrap();
        CartPage::new(page, config).checkout().await.unwrap();
    }

    #[tokio::test]
    async fn test_full_checkout() {
        let page = MockStorefront::new();
        let config = config();
        at_checkout(&page, &config).await;

        let checkout = CheckoutPage::new(&page, &config);
        checkout
            .fill_information(&CheckoutInfo::default())
            .await
            .unwrap();
        assert_eq!(page.page_state(), Some(PageState::CheckoutOverview));
        checkout.finish().await.unwrap();
        checkout.expect_complete().await.unwrap();
        assert_eq!(page.page_state(), Some(PageState::Complete));
        assert_eq!(page.cart_size(), 0);
    }

    #[tokio::test]
    async fn test_full_checkout_with_legacy_markup() {
        let page = MockStorefront::new().with_markup(Markup::Legacy);
        let config = config();
        at_checkout(&page, &config).await;

        let checkout = CheckoutPage::new(&page, &config);
        checkout
            .fill_information(&CheckoutInfo::new("Ada", "Lovelace", "N1 9GU"))
            .await
            .unwrap();
        checkout.finish().await.unwrap();
        checkout.expect_complete().await.unwrap();
        assert!(page.was_called("locate:css=#postal-code"));
    }

    #[tokio::test]
    async fn test_missing_information_blocks_overview() {
        let page = MockStorefront::new();
        let config = config();
        at_checkout(&page, &config).await;

        let checkout = CheckoutPage::new(&page, &config);
        let err = checkout
            .fill_information(&CheckoutInfo::new("John", "Doe", ""))
            .await
            .unwrap_err();
        match err {
            PomError::AssertionFailure { expected, actual, .. } => {
                assert_eq!(expected, r"/Checkout:\s*Overview/i");
                assert!(actual.contains("Postal Code is required"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(page.page_state(), Some(PageState::CheckoutInfo));
    }

    #[tokio::test]
    async fn test_empty_error_container_does_not_block_overview() {
        let page = MockStorefront::new().with_empty_error_container();
        let config = config();
        at_checkout(&page, &config).await;

        CheckoutPage::new(&page, &config)
            .fill_information(&CheckoutInfo::default())
            .await
            .unwrap();
        assert_eq!(page.page_state(), Some(PageState::CheckoutOverview));
    }

    #[tokio::test]
    async fn test_expect_complete_before_finish_times_out() {
        let page = MockStorefront::new();
        let config = config();
        at_checkout(&page, &config).await;

        let err = CheckoutPage::new(&page, &config)
            .expect_complete()
            .await
            .unwrap_err();
        match err {
            PomError::AssertionTimeout { last_observed, .. } => {
                assert_eq!(last_observed, "\"Checkout: Your Information\"");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
