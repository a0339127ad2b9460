//! Storefront POM: page objects for end-to-end storefront tests
//!
//! Typed page objects for a demo storefront (login, inventory, cart and
//! checkout), a selector resolver that tolerates markup drift, and a
//! poll-based assertion helper for UI state that settles asynchronously.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────────┐
//! │  Scenario    │───►│ Page Objects │───►│ SelectorResolver │
//! │ (+ Journey)  │    │ Login, ...   │    │ test id → css    │
//! └──────────────┘    └──────┬───────┘    └────────┬─────────┘
//!                            │ Poll                │
//!                            ▼                     ▼
//!                     ┌─────────────────────────────────────┐
//!                     │ PageHandle: MockStorefront │ Chromium│
//!                     └─────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use storefront_pom::{FixtureData, HarnessConfig, MockStorefront, Scenario};
//!
//! let config = HarnessConfig::from_env()?;
//! let page = MockStorefront::new();
//! let report = Scenario::Checkout
//!     .run(&page, &config, &FixtureData::default())
//!     .await?;
//! println!("{}", report.detail);
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::float_cmp))]

mod assertions;
#[cfg(feature = "browser")]
mod chromium;
mod config;
mod driver;
mod fixtures;
mod mock;
mod navigation;
mod parse;
mod poll;
mod result;
mod scenario;
mod selector;
mod wait;

/// Page objects for each storefront screen
pub mod pages;

pub use assertions::{is_ascending, TextPattern};
#[cfg(feature = "browser")]
pub use chromium::{ChromiumPage, ChromiumSession};
pub use config::{
    BrowserSettings, Credentials, HarnessConfig, Timeouts, DEFAULT_BASE_URL, DEFAULT_PASSWORD,
    DEFAULT_TEST_ID_ATTRIBUTE, DEFAULT_USERNAME,
};
pub use driver::{ElementRef, PageHandle};
pub use fixtures::{CheckoutInfo, FixtureData};
pub use mock::{Markup, MockProduct, MockStorefront, MOCK_BASE_URL};
pub use navigation::{Journey, PageState, Transition};
pub use pages::{
    CartPage, CheckoutPage, InventoryPage, LoginPage, PageContext, PageObject, SortOrder,
};
pub use parse::{parse_count, parse_price};
pub use poll::{Poll, PollConfig, PollOutcome};
pub use result::{PomError, PomResult};
pub use scenario::{Scenario, ScenarioFailure, ScenarioReport};
pub use selector::{AriaRole, LocatorDescriptor, SelectorResolver, Strategy, UiElement};
pub use wait::{wait_for_text, wait_for_visible};
