//! In-memory storefront implementing [`PageHandle`].
//!
//! Models the pages the scenarios walk through (login, inventory, cart, the
//! two checkout steps and the confirmation) closely enough to exercise every
//! page-object contract without a browser:
//!
//! - [`Markup::Legacy`] drops the test-id attributes so only id/class
//!   fallbacks resolve
//! - [`MockStorefront::with_render_delay`] keeps the document empty, then
//!   hidden, for a number of queries after each navigation
//! - [`MockStorefront::with_badge_lag`] delays cart badge updates
//! - [`MockStorefront::with_login_latency`] keeps the login form up for a
//!   number of queries after valid credentials are submitted
//! - [`MockStorefront::with_empty_error_container`] renders the error
//!   banner container on form pages even when it holds no message
//! - every re-render bumps a generation counter; element references from an
//!   older generation fail with [`PomError::StaleElement`]
//!
//! CSS support is limited to `#id` and `.class` selectors (classes may be
//! chained, as in `.a.b`).

use crate::driver::{ElementRef, PageHandle};
use crate::navigation::PageState;
use crate::result::{PomError, PomResult};
use crate::selector::{AriaRole, Strategy};
use async_trait::async_trait;
use regex::RegexBuilder;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Base URL the mock answers on
pub const MOCK_BASE_URL: &str = "http://storefront.test";

const VALID_PASSWORD: &str = "secret_sauce";
const LOCKED_OUT_USER: &str = "locked_out_user";

/// Markup generation served by the mock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Markup {
    /// Elements carry `data-test` attributes plus legacy ids/classes
    #[default]
    Modern,
    /// Only legacy ids/classes
    Legacy,
}

/// Catalog entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockProduct {
    /// Display name
    pub name: String,
    /// Price in cents
    pub price_cents: u32,
}

impl MockProduct {
    /// Create a product
    #[must_use]
    pub fn new(name: impl Into<String>, price_cents: u32) -> Self {
        Self {
            name: name.into(),
            price_cents,
        }
    }

    fn price_label(&self) -> String {
        format!("${}.{:02}", self.price_cents / 100, self.price_cents % 100)
    }

    /// The six products of the demo storefront
    #[must_use]
    pub fn demo_catalog() -> Vec<Self> {
        vec![
            Self::new("Sauce Labs Backpack", 2999),
            Self::new("Sauce Labs Bike Light", 999),
            Self::new("Sauce Labs Bolt T-Shirt", 1599),
            Self::new("Sauce Labs Fleece Jacket", 4999),
            Self::new("Sauce Labs Onesie", 799),
            Self::new("Test.allTheThings() T-Shirt (Red)", 1599),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Blank,
    Login,
    Inventory,
    Cart,
    CheckoutInfo,
    CheckoutOverview,
    Complete,
}

impl Screen {
    const fn title(self) -> &'static str {
        match self {
            Self::Blank | Self::Login => "",
            Self::Inventory => "Products",
            Self::Cart => "Your Cart",
            Self::CheckoutInfo => "Checkout: Your Information",
            Self::CheckoutOverview => "Checkout: Overview",
            Self::Complete => "Checkout: Complete!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Plain,
    Input,
    Select,
}

#[derive(Debug, Clone)]
struct Node {
    key: String,
    parent: Option<String>,
    test_id: Option<String>,
    css_id: Option<&'static str>,
    class: Option<&'static str>,
    role: Option<AriaRole>,
    text: String,
    kind: NodeKind,
}

impl Node {
    fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            parent: None,
            test_id: None,
            css_id: None,
            class: None,
            role: None,
            text: text.into(),
            kind: NodeKind::Plain,
        }
    }

    fn test_id(mut self, value: impl Into<String>) -> Self {
        self.test_id = Some(value.into());
        self
    }

    const fn id(mut self, id: &'static str) -> Self {
        self.css_id = Some(id);
        self
    }

    const fn class(mut self, class: &'static str) -> Self {
        self.class = Some(class);
        self
    }

    const fn role(mut self, role: AriaRole) -> Self {
        self.role = Some(role);
        self
    }

    fn parent(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    const fn kind(mut self, kind: NodeKind) -> Self {
        self.kind = kind;
        self
    }

    fn matches(&self, strategy: &Strategy) -> PomResult<bool> {
        Ok(match strategy {
            Strategy::TestId { attribute, value } => {
                attribute == "data-test" && self.test_id.as_deref() == Some(value.as_str())
            }
            Strategy::Css(css) => {
                if let Some(id) = css.strip_prefix('#') {
                    self.css_id == Some(id)
                } else if let Some(classes) = css.strip_prefix('.') {
                    let own: Vec<&str> = self.class.unwrap_or_default().split_whitespace().collect();
                    classes.split('.').all(|c| own.contains(&c))
                } else {
                    false
                }
            }
            Strategy::Role { role, name } => {
                let pattern = RegexBuilder::new(name)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| PomError::config(format!("invalid role name /{name}/: {e}")))?;
                self.role == Some(*role) && pattern.is_match(&self.text)
            }
        })
    }
}

#[derive(Debug)]
struct MockState {
    screen: Screen,
    generation: u64,
    pending_render: u32,
    pending_visible: u32,
    pending_badge: u32,
    pending_login: u32,
    shown_count: usize,
    cart: Vec<usize>,
    order: Vec<usize>,
    inputs: HashMap<String, String>,
    error: Option<String>,
    history: Vec<String>,
}

/// Scripted storefront page handle
#[derive(Debug)]
pub struct MockStorefront {
    base_url: String,
    markup: Markup,
    render_delay: u32,
    badge_lag: u32,
    login_latency: u32,
    empty_error_container: bool,
    products: Vec<MockProduct>,
    state: Mutex<MockState>,
}

impl Default for MockStorefront {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStorefront {
    /// Storefront at [`MOCK_BASE_URL`] with the demo catalog
    #[must_use]
    pub fn new() -> Self {
        let products = MockProduct::demo_catalog();
        let order = (0..products.len()).collect();
        Self {
            base_url: MOCK_BASE_URL.to_string(),
            markup: Markup::Modern,
            render_delay: 0,
            badge_lag: 0,
            login_latency: 0,
            empty_error_container: false,
            products,
            state: Mutex::new(MockState {
                screen: Screen::Blank,
                generation: 0,
                pending_render: 0,
                pending_visible: 0,
                pending_badge: 0,
                pending_login: 0,
                shown_count: 0,
                cart: Vec::new(),
                order,
                inputs: HashMap::new(),
                error: None,
                history: Vec::new(),
            }),
        }
    }

    /// Serve the given markup generation
    #[must_use]
    pub const fn with_markup(mut self, markup: Markup) -> Self {
        self.markup = markup;
        self
    }

    /// After each navigation, return no elements for the next `queries`
    /// locate calls and report elements hidden for the next `queries`
    /// visibility checks
    #[must_use]
    pub const fn with_render_delay(mut self, queries: u32) -> Self {
        self.render_delay = queries;
        self
    }

    /// Keep showing the previous badge count for `queries` locate calls after
    /// the cart changes
    #[must_use]
    pub const fn with_badge_lag(mut self, queries: u32) -> Self {
        self.badge_lag = queries;
        self
    }

    /// Replace the catalog
    #[must_use]
    pub fn with_products(mut self, products: Vec<MockProduct>) -> Self {
        if let Ok(state) = self.state.get_mut() {
            state.order = (0..products.len()).collect();
        }
        self.products = products;
        self
    }

    /// After valid credentials, keep showing the login form for the next
    /// `queries` locate calls before the inventory appears
    #[must_use]
    pub const fn with_login_latency(mut self, queries: u32) -> Self {
        self.login_latency = queries;
        self
    }

    /// Render an empty `.error-message-container` on form pages when no
    /// error is shown, as the live storefront does
    #[must_use]
    pub const fn with_empty_error_container(mut self) -> Self {
        self.empty_error_container = true;
        self
    }

    /// Calls received so far, e.g. `click:login-button`
    pub fn history(&self) -> Vec<String> {
        self.state().map(|s| s.history.clone()).unwrap_or_default()
    }

    /// Whether any recorded call starts with `prefix`
    pub fn was_called(&self, prefix: &str) -> bool {
        self.history().iter().any(|c| c.starts_with(prefix))
    }

    /// Number of items actually in the cart, regardless of the badge
    pub fn cart_size(&self) -> usize {
        self.state().map(|s| s.cart.len()).unwrap_or_default()
    }

    /// Page the mock is currently showing
    pub fn page_state(&self) -> Option<PageState> {
        let screen = self.state().ok()?.screen;
        match screen {
            Screen::Blank => None,
            Screen::Login => Some(PageState::Unauthenticated),
            Screen::Inventory => Some(PageState::Inventory),
            Screen::Cart => Some(PageState::Cart),
            Screen::CheckoutInfo => Some(PageState::CheckoutInfo),
            Screen::CheckoutOverview => Some(PageState::CheckoutOverview),
            Screen::Complete => Some(PageState::Complete),
        }
    }

    /// Skip the login form and show the inventory
    pub fn login_directly(&self) -> PomResult<()> {
        let mut st = self.state()?;
        Self::show(&mut st, Screen::Inventory);
        Ok(())
    }

    fn state(&self) -> PomResult<MutexGuard<'_, MockState>> {
        self.state
            .lock()
            .map_err(|_| PomError::driver("mock storefront state poisoned"))
    }

    fn show(st: &mut MockState, screen: Screen) {
        st.screen = screen;
        st.pending_login = 0;
        st.generation += 1;
        st.error = None;
    }

    fn rerender(st: &mut MockState) {
        st.generation += 1;
    }

    fn cart_changed(&self, st: &mut MockState) {
        if self.badge_lag == 0 {
            st.shown_count = st.cart.len();
        } else {
            st.pending_badge = self.badge_lag;
        }
        Self::rerender(st);
    }

    fn tick_badge(st: &mut MockState) {
        if st.pending_badge > 0 {
            st.pending_badge -= 1;
            if st.pending_badge == 0 {
                st.shown_count = st.cart.len();
            }
        }
    }

    fn nodes(&self, st: &MockState) -> Vec<Node> {
        let mut nodes = Vec::new();
        match st.screen {
            Screen::Blank => {}
            Screen::Login => {
                nodes.push(
                    Node::new("username", "")
                        .test_id("username")
                        .id("user-name")
                        .kind(NodeKind::Input),
                );
                nodes.push(
                    Node::new("password", "")
                        .test_id("password")
                        .id("password")
                        .kind(NodeKind::Input),
                );
                nodes.push(
                    Node::new("login-button", "Login")
                        .test_id("login-button")
                        .id("login-button")
                        .role(AriaRole::Button),
                );
            }
            screen => {
                nodes.push(
                    Node::new("title", screen.title())
                        .test_id("title")
                        .class("title"),
                );
                nodes.push(
                    Node::new("cart-link", "")
                        .test_id("shopping-cart-link")
                        .class("shopping_cart_link")
                        .role(AriaRole::Link),
                );
                if st.shown_count > 0 {
                    nodes.push(
                        Node::new("cart-badge", st.shown_count.to_string())
                            .test_id("shopping-cart-badge")
                            .class("shopping_cart_badge")
                            .parent("cart-link"),
                    );
                }
                self.screen_nodes(st, screen, &mut nodes);
            }
        }
        let banner_slot =
            self.empty_error_container && matches!(st.screen, Screen::Login | Screen::CheckoutInfo);
        match &st.error {
            Some(error) => nodes.push(
                Node::new("error", error.clone())
                    .test_id("error")
                    .class("error-message-container error"),
            ),
            None if banner_slot => nodes.push(Node::new("error", "").class("error-message-container")),
            None => {}
        }
        if self.markup == Markup::Legacy {
            for node in &mut nodes {
                node.test_id = None;
            }
        }
        nodes
    }

    fn screen_nodes(&self, st: &MockState, screen: Screen, nodes: &mut Vec<Node>) {
        match screen {
            Screen::Inventory => {
                nodes.push(
                    Node::new("sort", "")
                        .test_id("product-sort-container")
                        .class("product_sort_container")
                        .role(AriaRole::Combobox)
                        .kind(NodeKind::Select),
                );
                for &i in &st.order {
                    let product = &self.products[i];
                    let row = format!("item:{i}");
                    let button = if st.cart.contains(&i) {
                        "Remove"
                    } else {
                        "Add to cart"
                    };
                    nodes.push(
                        Node::new(
                            row.clone(),
                            format!("{}\n{}\n{button}", product.name, product.price_label()),
                        )
                        .test_id("inventory-item")
                        .class("inventory_item"),
                    );
                    nodes.push(
                        Node::new(format!("{row}/price"), product.price_label())
                            .test_id("inventory-item-price")
                            .class("inventory_item_price")
                            .parent(&row),
                    );
                    nodes.push(
                        Node::new(format!("{row}/button"), button)
                            .class("btn_inventory")
                            .role(AriaRole::Button)
                            .parent(&row),
                    );
                }
            }
            Screen::Cart => {
                nodes.push(
                    Node::new("checkout", "Checkout")
                        .test_id("checkout")
                        .id("checkout")
                        .role(AriaRole::Button),
                );
            }
            Screen::CheckoutInfo => {
                for (key, test_id, id) in [
                    ("first-name", "firstName", "first-name"),
                    ("last-name", "lastName", "last-name"),
                    ("postal-code", "postalCode", "postal-code"),
                ] {
                    nodes.push(
                        Node::new(key, "")
                            .test_id(test_id)
                            .id(id)
                            .kind(NodeKind::Input),
                    );
                }
                nodes.push(
                    Node::new("continue", "Continue")
                        .test_id("continue")
                        .id("continue")
                        .role(AriaRole::Button),
                );
            }
            Screen::CheckoutOverview => {
                nodes.push(
                    Node::new("finish", "Finish")
                        .test_id("finish")
                        .id("finish")
                        .role(AriaRole::Button),
                );
            }
            Screen::Blank | Screen::Login | Screen::Complete => {}
        }
    }

    /// Validate `element` against the current render and return its node
    fn node(&self, st: &MockState, element: &ElementRef) -> PomResult<Node> {
        let stale = || PomError::StaleElement {
            id: element.id().to_string(),
        };
        let (generation, key) = element.id().split_once(':').ok_or_else(stale)?;
        if generation != st.generation.to_string() {
            return Err(stale());
        }
        self.nodes(st)
            .into_iter()
            .find(|n| n.key == key)
            .ok_or_else(stale)
    }

    fn submit_login(&self, st: &mut MockState) {
        let username = st.inputs.get("username").cloned().unwrap_or_default();
        let password = st.inputs.get("password").cloned().unwrap_or_default();
        let error = if username.is_empty() {
            Some("Epic sadface: Username is required")
        } else if password.is_empty() {
            Some("Epic sadface: Password is required")
        } else if password != VALID_PASSWORD {
            Some("Epic sadface: Username and password do not match any user in this service")
        } else if username == LOCKED_OUT_USER {
            Some("Epic sadface: Sorry, this user has been locked out.")
        } else {
            None
        };
        match error {
            Some(message) => {
                st.error = Some(message.to_string());
                Self::rerender(st);
            }
            None if self.login_latency > 0 => {
                st.error = None;
                st.pending_login = self.login_latency;
                Self::rerender(st);
            }
            None => Self::show(st, Screen::Inventory),
        }
    }

    fn tick_login(st: &mut MockState) {
        if st.pending_login > 0 {
            st.pending_login -= 1;
            if st.pending_login == 0 {
                Self::show(st, Screen::Inventory);
            }
        }
    }

    fn submit_information(st: &mut MockState) {
        let missing = [
            ("first-name", "First Name"),
            ("last-name", "Last Name"),
            ("postal-code", "Postal Code"),
        ]
        .into_iter()
        .find(|(key, _)| st.inputs.get(*key).map_or(true, |v| v.trim().is_empty()));
        match missing {
            Some((_, label)) => {
                st.error = Some(format!("Error: {label} is required"));
                Self::rerender(st);
            }
            None => Self::show(st, Screen::CheckoutOverview),
        }
    }
}

#[async_trait]
impl PageHandle for MockStorefront {
    async fn navigate(&self, url: &str) -> PomResult<()> {
        let mut st = self.state()?;
        st.history.push(format!("navigate:{url}"));
        if !url.starts_with(&self.base_url) {
            return Err(PomError::NavigationFailure {
                url: url.to_string(),
                message: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            });
        }
        st.inputs.clear();
        Self::show(&mut st, Screen::Login);
        st.pending_render = self.render_delay;
        st.pending_visible = self.render_delay;
        Ok(())
    }

    async fn locate(
        &self,
        scope: Option<&ElementRef>,
        strategy: &Strategy,
    ) -> PomResult<Vec<ElementRef>> {
        let mut st = self.state()?;
        st.history.push(format!("locate:{strategy}"));
        Self::tick_badge(&mut st);
        Self::tick_login(&mut st);

        let scope_key = match scope {
            Some(el) => Some(self.node(&st, el)?.key),
            None => None,
        };
        if st.pending_render > 0 {
            st.pending_render -= 1;
            return Ok(Vec::new());
        }

        let mut found = Vec::new();
        for node in self.nodes(&st) {
            if scope_key.is_some() && node.parent != scope_key {
                continue;
            }
            if node.matches(strategy)? {
                found.push(ElementRef::new(format!("{}:{}", st.generation, node.key)));
            }
        }
        Ok(found)
    }

    async fn fill(&self, element: &ElementRef, text: &str) -> PomResult<()> {
        let mut st = self.state()?;
        let node = self.node(&st, element)?;
        st.history.push(format!("fill:{}", node.key));
        if node.kind != NodeKind::Input {
            return Err(PomError::driver(format!("{} is not an input", node.key)));
        }
        st.inputs.insert(node.key, text.to_string());
        Ok(())
    }

    async fn click(&self, element: &ElementRef) -> PomResult<()> {
        let mut st = self.state()?;
        let node = self.node(&st, element)?;
        st.history.push(format!("click:{}", node.key));

        match node.key.as_str() {
            "login-button" => self.submit_login(&mut st),
            "cart-link" => Self::show(&mut st, Screen::Cart),
            "checkout" => Self::show(&mut st, Screen::CheckoutInfo),
            "continue" => Self::submit_information(&mut st),
            "finish" => {
                st.cart.clear();
                self.cart_changed(&mut st);
                Self::show(&mut st, Screen::Complete);
            }
            key => {
                if let Some(index) = key
                    .strip_prefix("item:")
                    .and_then(|rest| rest.strip_suffix("/button"))
                    .and_then(|i| i.parse::<usize>().ok())
                {
                    if let Some(pos) = st.cart.iter().position(|&i| i == index) {
                        st.cart.remove(pos);
                    } else {
                        st.cart.push(index);
                    }
                    self.cart_changed(&mut st);
                }
            }
        }
        Ok(())
    }

    async fn read_text(&self, element: &ElementRef) -> PomResult<String> {
        let mut st = self.state()?;
        let node = self.node(&st, element)?;
        st.history.push(format!("read_text:{}", node.key));
        Ok(node.text)
    }

    async fn is_visible(&self, element: &ElementRef) -> PomResult<bool> {
        let mut st = self.state()?;
        self.node(&st, element)?;
        if st.pending_visible > 0 {
            st.pending_visible -= 1;
            return Ok(false);
        }
        Ok(true)
    }

    async fn select_option(&self, element: &ElementRef, value: &str) -> PomResult<()> {
        let mut st = self.state()?;
        let node = self.node(&st, element)?;
        st.history.push(format!("select_option:{}={value}", node.key));
        if node.kind != NodeKind::Select {
            return Err(PomError::driver(format!("{} is not a select", node.key)));
        }

        let products = &self.products;
        let mut order: Vec<usize> = (0..products.len()).collect();
        match value {
            "az" => order.sort_by(|&a, &b| products[a].name.cmp(&products[b].name)),
            "za" => order.sort_by(|&a, &b| products[b].name.cmp(&products[a].name)),
            "lohi" => order.sort_by_key(|&i| products[i].price_cents),
            "hilo" => order.sort_by(|&a, &b| products[b].price_cents.cmp(&products[a].price_cents)),
            other => {
                return Err(PomError::driver(format!("no option with value {other:?}")));
            }
        }
        st.order = order;
        Self::rerender(&mut st);
        Ok(())
    }
}
