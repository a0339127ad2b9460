//! Navigation state machine over the storefront pages.
//!
//! ```text
//! Unauthenticated --login--> Inventory --open_cart--> Cart --checkout--> CheckoutInfo
//!                                                                         |
//!                         Complete <--finish-- CheckoutOverview <--fill_information
//! ```
//!
//! Transitions are one-directional. Each page object action that performs a
//! transition only returns once the target page's title is shown, so
//! [`Journey`] records pages that were actually reached and failures report
//! where the flow stopped.

use crate::result::{PomError, PomResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Page the browser is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PageState {
    /// Login form
    Unauthenticated,
    /// Product listing
    Inventory,
    /// Cart review
    Cart,
    /// Checkout step one: customer information
    CheckoutInfo,
    /// Checkout step two: order overview
    CheckoutOverview,
    /// Order confirmation
    Complete,
}

impl PageState {
    /// State reached by applying `transition`, if allowed from here
    pub fn apply(self, transition: Transition) -> PomResult<Self> {
        if transition.from() == self {
            Ok(transition.to())
        } else {
            Err(PomError::InvalidTransition {
                from: self.to_string(),
                transition: transition.to_string(),
            })
        }
    }

    /// Case-insensitive pattern for the page title, `None` for the login
    /// form which has no title
    #[must_use]
    pub const fn title_pattern(self) -> Option<&'static str> {
        match self {
            Self::Unauthenticated => None,
            Self::Inventory => Some("Products"),
            Self::Cart => Some("Your Cart"),
            Self::CheckoutInfo => Some(r"Checkout:\s*Your Information"),
            Self::CheckoutOverview => Some(r"Checkout:\s*Overview"),
            Self::Complete => Some(r"Checkout:\s*Complete!"),
        }
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Inventory => "inventory",
            Self::Cart => "cart",
            Self::CheckoutInfo => "checkout-info",
            Self::CheckoutOverview => "checkout-overview",
            Self::Complete => "complete",
        };
        f.write_str(name)
    }
}

/// Action that moves between pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transition {
    /// Submit valid credentials
    Login,
    /// Follow the cart link
    OpenCart,
    /// Start checkout from the cart
    Checkout,
    /// Submit customer information
    FillInformation,
    /// Place the order
    Finish,
}

impl Transition {
    /// Source state
    #[must_use]
    pub const fn from(self) -> PageState {
        match self {
            Self::Login => PageState::Unauthenticated,
            Self::OpenCart => PageState::Inventory,
            Self::Checkout => PageState::Cart,
            Self::FillInformation => PageState::CheckoutInfo,
            Self::Finish => PageState::CheckoutOverview,
        }
    }

    /// Target state
    #[must_use]
    pub const fn to(self) -> PageState {
        match self {
            Self::Login => PageState::Inventory,
            Self::OpenCart => PageState::Cart,
            Self::Checkout => PageState::CheckoutInfo,
            Self::FillInformation => PageState::CheckoutOverview,
            Self::Finish => PageState::Complete,
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Login => "login",
            Self::OpenCart => "open-cart",
            Self::Checkout => "checkout",
            Self::FillInformation => "fill-information",
            Self::Finish => "finish",
        };
        f.write_str(name)
    }
}

/// Path a scenario has taken through the pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journey {
    visited: Vec<PageState>,
}

impl Default for Journey {
    fn default() -> Self {
        Self::new()
    }
}

impl Journey {
    /// Start at the login page
    #[must_use]
    pub fn new() -> Self {
        Self {
            visited: vec![PageState::Unauthenticated],
        }
    }

    /// Current state
    #[must_use]
    pub fn current(&self) -> PageState {
        self.visited
            .last()
            .copied()
            .unwrap_or(PageState::Unauthenticated)
    }

    /// Record a completed transition
    pub fn advance(&mut self, transition: Transition) -> PomResult<PageState> {
        let next = self.current().apply(transition)?;
        debug!(from = %self.current(), to = %next, %transition, "page transition");
        self.visited.push(next);
        Ok(next)
    }

    /// Fail unless the journey currently sits on `state`
    pub fn expect_at(&self, state: PageState) -> PomResult<()> {
        let current = self.current();
        if current == state {
            Ok(())
        } else {
            Err(PomError::InvalidTransition {
                from: current.to_string(),
                transition: format!("act on the {state} page"),
            })
        }
    }

    /// States visited so far, in order
    #[must_use]
    pub fn visited(&self) -> &[PageState] {
        &self.visited
    }
}
