//! Login screen.

use super::{PageContext, PageObject};
use crate::config::HarnessConfig;
use crate::driver::PageHandle;
use crate::navigation::PageState;
use crate::result::{PomError, PomResult};
use crate::selector::UiElement;
use crate::wait::wait_for_visible;
use tracing::{debug, info};

/// Page object for the login form
#[derive(Debug)]
pub struct LoginPage<'a, P: ?Sized> {
    ctx: PageContext<'a, P>,
}

impl<P: ?Sized> PageObject for LoginPage<'_, P> {
    fn state(&self) -> PageState {
        PageState::Unauthenticated
    }

    fn page_name(&self) -> &'static str {
        "login"
    }
}

impl<'a, P: PageHandle + ?Sized> LoginPage<'a, P> {
    /// Bind to `page`
    #[must_use]
    pub const fn new(page: &'a P, config: &'a HarnessConfig) -> Self {
        Self {
            ctx: PageContext::new(page, config),
        }
    }

    /// Load the application root.
    ///
    /// # Errors
    ///
    /// [`PomError::NavigationFailure`] if the load fails or exceeds the
    /// navigation timeout.
    pub async fn navigate(&self) -> PomResult<()> {
        let config = self.ctx.config();
        let url = config.root_url();
        info!(%url, "opening storefront");

        let timeout = config.timeouts.navigation();
        match tokio::time::timeout(timeout, self.ctx.page().navigate(&url)).await {
            Ok(result) => result,
            Err(_) => Err(PomError::NavigationFailure {
                url,
                message: format!("timed out after {}ms", timeout.as_millis()),
            }),
        }
    }

    /// Submit credentials and wait until the inventory listing is shown.
    ///
    /// # Errors
    ///
    /// - [`PomError::AssertionFailure`] with the login error text if the
    ///   credentials are rejected
    /// - [`PomError::AssertionTimeout`] if the inventory never appears
    /// - any resolution or browser error from filling the form
    pub async fn login(&self, username: &str, password: &str) -> PomResult<()> {
        let page = self.ctx.page();
        let resolver = self.ctx.resolver();

        // The form can render before it is shown.
        let field = resolver.resolve(UiElement::Username).await?;
        wait_for_visible(page, &field, self.ctx.action_poll()).await?;

        self.ctx.fill(UiElement::Username, username).await?;
        self.ctx.fill(UiElement::Password, password).await?;
        self.ctx.click(UiElement::LoginButton).await?;
        debug!(username, "credentials submitted");

        self.expect_on_inventory().await
    }

    /// Assert the inventory listing is shown, without submitting anything.
    ///
    /// Fails fast with [`PomError::AssertionFailure`] if the login error
    /// banner shows a message instead.
    pub async fn expect_on_inventory(&self) -> PomResult<()> {
        self.ctx.expect_state(PageState::Inventory).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Timeouts;
    use crate::mock::{Markup, MockStorefront, MOCK_BASE_URL};

    fn config() -> HarnessConfig {
        HarnessConfig::new()
            .with_base_url(MOCK_BASE_URL)
            .with_timeouts(Timeouts::fast())
    }

    #[tokio::test]
    async fn test_valid_login_reaches_inventory() {
        let page = MockStorefront::new();
        let config = config();
        let login = LoginPage::new(&page, &config);

        login.navigate().await.unwrap();
        login.login("standard_user", "secret_sauce").await.unwrap();

        assert_eq!(page.page_state(), Some(PageState::Inventory));
        assert!(page.was_called("fill:username"));
        assert!(page.was_called("fill:password"));
        assert!(page.was_called("click:login-button"));
    }

    #[tokio::test]
    async fn test_login_waits_for_slow_render() {
        let page = MockStorefront::new().with_render_delay(4);
        let config = config();
        let login = LoginPage::new(&page, &config);

        login.navigate().await.unwrap();
        login.login("standard_user", "secret_sauce").await.unwrap();
        assert_eq!(page.page_state(), Some(PageState::Inventory));
    }

    #[tokio::test]
    async fn test_login_with_legacy_markup() {
        let page = MockStorefront::new().with_markup(Markup::Legacy);
        let config = config();
        let login = LoginPage::new(&page, &config);

        login.navigate().await.unwrap();
        login.login("standard_user", "secret_sauce").await.unwrap();
        assert!(page.was_called("locate:css=#user-name"));
        assert!(page.was_called("locate:css=.title"));
    }

    #[tokio::test]
    async fn test_empty_error_container_does_not_reject_login() {
        let page = MockStorefront::new()
            .with_empty_error_container()
            .with_login_latency(6);
        let config = config();
        let login = LoginPage::new(&page, &config);

        login.navigate().await.unwrap();
        login.login("standard_user", "secret_sauce").await.unwrap();
        assert_eq!(page.page_state(), Some(PageState::Inventory));
    }

    #[tokio::test]
    async fn test_empty_error_container_with_legacy_markup() {
        let page = MockStorefront::new()
            .with_markup(Markup::Legacy)
            .with_empty_error_container()
            .with_login_latency(6);
        let config = config();
        let login = LoginPage::new(&page, &config);

        login.navigate().await.unwrap();
        login.login("standard_user", "secret_sauce").await.unwrap();
        assert!(page.was_called("locate:css=.error-message-container.error"));
        assert_eq!(page.page_state(), Some(PageState::Inventory));
    }

    #[tokio::test]
    async fn test_rejected_credentials_with_error_container_present() {
        let page = MockStorefront::new().with_empty_error_container();
        let config = config();
        let login = LoginPage::new(&page, &config);

        login.navigate().await.unwrap();
        let err = login.login("standard_user", "wrong").await.unwrap_err();
        match err {
            PomError::AssertionFailure { actual, .. } => assert!(actual.contains("do not match")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_rejected_credentials_fail_fast() {
        let page = MockStorefront::new();
        let config = config();
        let login = LoginPage::new(&page, &config);

        login.navigate().await.unwrap();
        let err = login.login("standard_user", "wrong").await.unwrap_err();
        match err {
            PomError::AssertionFailure { expected, actual, .. } => {
                assert_eq!(expected, "/Products/i");
                assert!(actual.contains("do not match"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(page.page_state(), Some(PageState::Unauthenticated));
    }

    #[tokio::test]
    async fn test_locked_out_user() {
        let page = MockStorefront::new();
        let config = config();
        let login = LoginPage::new(&page, &config);

        login.navigate().await.unwrap();
        let err = login
            .login("locked_out_user", "secret_sauce")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("locked out"));
    }

    #[tokio::test]
    async fn test_expect_on_inventory_is_idempotent() {
        let page = MockStorefront::new();
        let config = config();
        let login = LoginPage::new(&page, &config);

        login.navigate().await.unwrap();
        login.login("standard_user", "secret_sauce").await.unwrap();
        login.expect_on_inventory().await.unwrap();
        login.expect_on_inventory().await.unwrap();
        assert_eq!(page.page_state(), Some(PageState::Inventory));
    }

    #[tokio::test]
    async fn test_expect_on_inventory_times_out_on_login_form() {
        let page = MockStorefront::new();
        let config = config();
        let login = LoginPage::new(&page, &config);

        login.navigate().await.unwrap();
        let err = login.expect_on_inventory().await.unwrap_err();
        match err {
            PomError::AssertionTimeout { last_observed, timeout_ms, .. } => {
                assert_eq!(last_observed, "no page title");
                assert_eq!(timeout_ms, 500);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_navigate_failure() {
        let page = MockStorefront::new();
        let config = HarnessConfig::new()
            .with_base_url("http://unreachable.test")
            .with_timeouts(Timeouts::fast());
        let login = LoginPage::new(&page, &config);
        assert!(matches!(
            login.navigate().await,
            Err(PomError::NavigationFailure { .. })
        ));
    }

    #[test]
    fn test_page_object_metadata() {
        let page = MockStorefront::new();
        let config = config();
        let login = LoginPage::new(&page, &config);
        assert_eq!(login.state(), PageState::Unauthenticated);
        assert_eq!(login.page_name(), "login");
    }
}
