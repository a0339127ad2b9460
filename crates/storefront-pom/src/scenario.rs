//! End-to-end scenarios composed from the page objects.
//!
//! Each scenario drives one page handle from the login form to its final
//! assertion, recording the pages it passes through in a [`Journey`]. The
//! whole run is bounded by the per-test deadline; when it elapses the
//! in-flight action is dropped and the failure reports the last page
//! reached.

use crate::assertions::is_ascending;
use crate::config::HarnessConfig;
use crate::driver::PageHandle;
use crate::fixtures::FixtureData;
use crate::navigation::{Journey, PageState, Transition};
use crate::pages::{CartPage, CheckoutPage, InventoryPage, LoginPage, PageObject};
use crate::result::{PomError, PomResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{info, warn};

/// The end-to-end flows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scenario {
    /// Standard user logs in and lands on the inventory
    Login,
    /// Adding products updates the cart badge
    AddToCart,
    /// Sorting by price orders the listing ascending
    SortByPrice,
    /// Buy one product through to the confirmation page
    Checkout,
}

impl Scenario {
    /// Every scenario, in run order
    pub const ALL: [Self; 4] = [Self::Login, Self::AddToCart, Self::SortByPrice, Self::Checkout];

    /// Short name used on the command line
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::AddToCart => "add-to-cart",
            Self::SortByPrice => "sort-by-price",
            Self::Checkout => "checkout",
        }
    }

    /// Human-readable title
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Login => "standard user can log in",
            Self::AddToCart => "adding two items updates the cart badge",
            Self::SortByPrice => "sorting low to high orders prices ascending",
            Self::Checkout => "checkout completes an order",
        }
    }

    /// Run against `page`, bounded by the configured test deadline.
    ///
    /// # Errors
    ///
    /// [`ScenarioFailure`] wrapping the first error, with the last page
    /// reached.
    #[tracing::instrument(skip_all, fields(scenario = self.name()))]
    pub async fn run<P: PageHandle + ?Sized>(
        self,
        page: &P,
        config: &HarnessConfig,
        fixtures: &FixtureData,
    ) -> Result<ScenarioReport, ScenarioFailure> {
        let start = Instant::now();
        let deadline = config.timeouts.test();
        let mut journey = Journey::new();

        let outcome = tokio::time::timeout(
            deadline,
            self.execute(page, config, fixtures, &mut journey),
        )
        .await
        .unwrap_or_else(|_| {
            Err(PomError::Timeout {
                ms: deadline.as_millis() as u64,
            })
        });

        match outcome {
            Ok(detail) => {
                let duration = start.elapsed();
                info!(
                    final_state = %journey.current(),
                    duration_ms = duration.as_millis() as u64,
                    "scenario passed"
                );
                Ok(ScenarioReport {
                    scenario: self,
                    final_state: journey.current(),
                    visited: journey.visited().to_vec(),
                    duration,
                    detail,
                })
            }
            Err(source) => {
                warn!(state = %journey.current(), error = %source, "scenario failed");
                Err(ScenarioFailure {
                    scenario: self,
                    state: journey.current(),
                    duration: start.elapsed(),
                    source,
                })
            }
        }
    }

    async fn execute<P: PageHandle + ?Sized>(
        self,
        page: &P,
        config: &HarnessConfig,
        fixtures: &FixtureData,
        journey: &mut Journey,
    ) -> PomResult<String> {
        let login = LoginPage::new(page, config);
        login.navigate().await?;
        login
            .login(&config.credentials.username, &config.credentials.password)
            .await?;
        journey.advance(Transition::Login)?;

        let inventory = InventoryPage::new(page, config);
        journey.expect_at(inventory.state())?;

        match self {
            Self::Login => {
                login.expect_on_inventory().await?;
                Ok(format!("logged in as {}", config.credentials.username))
            }
            Self::AddToCart => {
                inventory
                    .add_products(fixtures.cart_products.as_slice())
                    .await?;
                let expected = u32::try_from(fixtures.cart_products.len())
                    .map_err(|_| PomError::config("too many cart products"))?;
                let count = inventory.expect_cart_count(expected).await?;
                Ok(format!("cart badge shows {count}"))
            }
            Self::SortByPrice => {
                inventory.sort_low_to_high().await?;
                let prices = inventory.prices().await?;
                if !is_ascending(&prices) {
                    return Err(PomError::AssertionFailure {
                        description: "prices after sorting low to high".to_string(),
                        expected: "ascending".to_string(),
                        actual: format!("{prices:?}"),
                    });
                }
                Ok(format!("{} prices ascending", prices.len()))
            }
            Self::Checkout => {
                inventory
                    .add_product_by_name(&fixtures.checkout_product)
                    .await?;
                inventory.open_cart().await?;
                journey.advance(Transition::OpenCart)?;

                let cart = CartPage::new(page, config);
                journey.expect_at(cart.state())?;
                cart.checkout().await?;
                journey.advance(Transition::Checkout)?;

                let checkout = CheckoutPage::new(page, config);
                journey.expect_at(checkout.state())?;
                checkout.fill_information(&fixtures.checkout_info).await?;
                journey.advance(Transition::FillInformation)?;
                checkout.finish().await?;
                checkout.expect_complete().await?;
                journey.advance(Transition::Finish)?;
                Ok(format!("bought {}", fixtures.checkout_product))
            }
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scenario {
    type Err = PomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|scenario| scenario.name() == s)
            .ok_or_else(|| PomError::config(format!("unknown scenario: {s}")))
    }
}

/// Result of a passing scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// Scenario that ran
    pub scenario: Scenario,
    /// Page the scenario ended on
    pub final_state: PageState,
    /// Pages passed through, in order
    pub visited: Vec<PageState>,
    /// Wall time
    pub duration: Duration,
    /// What the final assertion observed
    pub detail: String,
}

/// A scenario that stopped on an error
#[derive(Debug, Error)]
#[error("scenario `{scenario}` failed on the {state} page: {source}")]
pub struct ScenarioFailure {
    /// Scenario that failed
    pub scenario: Scenario,
    /// Last page reached
    pub state: PageState,
    /// Wall time until the failure
    pub duration: Duration,
    /// Underlying error
    pub source: PomError,
}
