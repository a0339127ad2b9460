//! Page objects for the storefront screens.
//!
//! Each page object borrows a [`PageHandle`] and the [`HarnessConfig`] for the
//! duration of a scenario. Page objects hold no element handles between
//! calls: every action resolves its elements again through the
//! [`SelectorResolver`], so a re-rendered DOM never leaves them pointing at
//! detached nodes.
//!
//! # Example
//!
//! ```ignore
//! let login = LoginPage::new(&page, &config);
//! login.navigate().await?;
//! login.login(&config.credentials.username, &config.credentials.password).await?;
//!
//! let inventory = InventoryPage::new(&page, &config);
//! inventory.add_product_by_name("Sauce Labs Backpack").await?;
//! assert_eq!(inventory.cart_count().await?, 1);
//! ```

pub mod cart;
pub mod checkout;
pub mod inventory;
pub mod login;

pub use cart::CartPage;
pub use checkout::CheckoutPage;
pub use inventory::{InventoryPage, SortOrder};
pub use login::LoginPage;

use crate::assertions::TextPattern;
use crate::config::HarnessConfig;
use crate::driver::PageHandle;
use crate::navigation::PageState;
use crate::poll::{Poll, PollConfig};
use crate::result::{PomError, PomResult};
use crate::selector::{SelectorResolver, UiElement};
use std::fmt;
use tracing::{debug, warn};

/// Trait for page objects representing one storefront screen
pub trait PageObject {
    /// Navigation state this page object drives
    fn state(&self) -> PageState;

    /// Page name for logging
    fn page_name(&self) -> &'static str;
}

/// What the page shows while a transition lands
enum Landing {
    /// No title rendered yet
    Pending,
    /// A page title is shown
    Title(String),
    /// The form rejected its input
    Rejected(String),
}

impl fmt::Debug for Landing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("no page title"),
            Self::Title(text) => write!(f, "{text:?}"),
            Self::Rejected(text) => write!(f, "error banner {text:?}"),
        }
    }
}

/// Borrowed page handle plus configuration shared by every page object
pub struct PageContext<'a, P: ?Sized> {
    page: &'a P,
    config: &'a HarnessConfig,
}

impl<P: ?Sized> Clone for PageContext<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P: ?Sized> Copy for PageContext<'_, P> {}

impl<P: ?Sized> fmt::Debug for PageContext<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageContext")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl<'a, P: PageHandle + ?Sized> PageContext<'a, P> {
    /// Bind a page handle and configuration
    #[must_use]
    pub const fn new(page: &'a P, config: &'a HarnessConfig) -> Self {
        Self { page, config }
    }

    /// The page handle
    #[must_use]
    pub const fn page(&self) -> &'a P {
        self.page
    }

    /// The harness configuration
    #[must_use]
    pub const fn config(&self) -> &'a HarnessConfig {
        self.config
    }

    /// A fresh resolver over the page
    #[must_use]
    pub fn resolver(&self) -> SelectorResolver<'a, P> {
        SelectorResolver::new(self.page, self.config)
    }

    /// Deadline for an element to become actionable
    #[must_use]
    pub const fn action_poll(&self) -> PollConfig {
        PollConfig::action(&self.config.timeouts)
    }

    /// Deadline for a post-condition to hold
    #[must_use]
    pub const fn assertion_poll(&self) -> PollConfig {
        PollConfig::from_timeouts(&self.config.timeouts)
    }

    /// Wait until the title of `state` is shown.
    ///
    /// A non-empty error banner ends the wait early with
    /// [`PomError::AssertionFailure`] carrying the banner text. An empty
    /// banner container is ignored.
    ///
    /// # Errors
    ///
    /// - [`PomError::AssertionFailure`] if the form reports an error
    /// - [`PomError::AssertionTimeout`] if the title never matches
    pub async fn expect_state(&self, state: PageState) -> PomResult<()> {
        let pattern = TextPattern::page_title(state)?;
        let description = format!("{state} page title");

        let ctx = *self;
        let landing = Poll::new(description.clone(), move || ctx.read_landing())
            .with_config(self.assertion_poll())
            .until(pattern.to_string(), |landing| match landing {
                Landing::Pending => false,
                Landing::Title(text) => pattern.is_match(text),
                Landing::Rejected(_) => true,
            })
            .await?
            .value;

        match landing {
            Landing::Rejected(message) => {
                warn!(%state, %message, "form rejected");
                Err(PomError::AssertionFailure {
                    description,
                    expected: pattern.to_string(),
                    actual: message,
                })
            }
            Landing::Title(_) | Landing::Pending => {
                debug!(%state, "page reached");
                Ok(())
            }
        }
    }

    async fn read_landing(self) -> PomResult<Landing> {
        let resolver = self.resolver();
        for banner in resolver.find_now(UiElement::ErrorBanner).await? {
            let text = self.page.read_text(&banner).await?;
            if !text.trim().is_empty() {
                return Ok(Landing::Rejected(text));
            }
        }
        let titles = resolver.find_now(UiElement::Title).await?;
        match titles.first() {
            Some(title) => Ok(Landing::Title(self.page.read_text(title).await?)),
            None => Ok(Landing::Pending),
        }
    }

    pub(crate) async fn click(&self, element: UiElement) -> PomResult<()> {
        let target = self.resolver().resolve(element).await?;
        self.page.click(&target).await
    }

    pub(crate) async fn fill(&self, element: UiElement, text: &str) -> PomResult<()> {
        let target = self.resolver().resolve(element).await?;
        self.page.fill(&target, text).await
    }
}
