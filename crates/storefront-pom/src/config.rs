//! Harness configuration, resolved once at process start.
//!
//! Page objects receive a `&HarnessConfig`; nothing below the scenario layer
//! reads the environment.

use crate::result::{PomError, PomResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default storefront under test
pub const DEFAULT_BASE_URL: &str = "https://www.saucedemo.com";

/// Default test user
pub const DEFAULT_USERNAME: &str = "standard_user";

/// Default test password
pub const DEFAULT_PASSWORD: &str = "secret_sauce";

/// Attribute carrying stable test identifiers
pub const DEFAULT_TEST_ID_ATTRIBUTE: &str = "data-test";

/// Login credential pair
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Username
    pub username: String,
    /// Password
    pub password: String,
}

impl Credentials {
    /// Create a credential pair
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Copy with the password replaced by a placeholder, for printing
    #[must_use]
    pub fn redacted(&self) -> Self {
        Self {
            username: self.username.clone(),
            password: "********".to_string(),
        }
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::new(DEFAULT_USERNAME, DEFAULT_PASSWORD)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

/// Layered timeouts, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeouts {
    /// Wait for an element to become actionable
    pub action_ms: u64,
    /// Wait for a page load
    pub navigation_ms: u64,
    /// Wait for a polled assertion or state-transition check
    pub assertion_ms: u64,
    /// Whole-scenario deadline, enforced by the runner
    pub test_ms: u64,
    /// Interval between poll attempts
    pub poll_interval_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            action_ms: 10_000,
            navigation_ms: 20_000,
            assertion_ms: 10_000,
            test_ms: 60_000,
            poll_interval_ms: 100,
        }
    }
}

impl Timeouts {
    /// Action wait as Duration
    #[must_use]
    pub const fn action(&self) -> Duration {
        Duration::from_millis(self.action_ms)
    }

    /// Navigation wait as Duration
    #[must_use]
    pub const fn navigation(&self) -> Duration {
        Duration::from_millis(self.navigation_ms)
    }

    /// Assertion wait as Duration
    #[must_use]
    pub const fn assertion(&self) -> Duration {
        Duration::from_millis(self.assertion_ms)
    }

    /// Per-test deadline as Duration
    #[must_use]
    pub const fn test(&self) -> Duration {
        Duration::from_millis(self.test_ms)
    }

    /// Poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Millisecond-scale timeouts for in-memory runs
    #[must_use]
    pub const fn fast() -> Self {
        Self {
            action_ms: 500,
            navigation_ms: 500,
            assertion_ms: 500,
            test_ms: 5_000,
            poll_interval_ms: 5,
        }
    }
}

/// Browser launch settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserSettings {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 800,
            chromium_path: None,
            sandbox: true,
        }
    }
}

/// Complete harness configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Application root
    pub base_url: String,
    /// Login credentials
    pub credentials: Credentials,
    /// Attribute holding stable test identifiers
    pub test_id_attribute: String,
    /// Layered timeouts
    pub timeouts: Timeouts,
    /// Browser launch settings
    pub browser: BrowserSettings,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            credentials: Credentials::default(),
            test_id_attribute: DEFAULT_TEST_ID_ATTRIBUTE.to_string(),
            timeouts: Timeouts::default(),
            browser: BrowserSettings::default(),
        }
    }
}

impl HarnessConfig {
    /// Create a configuration with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`PomError::Config`] if a numeric or boolean variable is set
    /// but cannot be parsed.
    pub fn from_env() -> PomResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration through an arbitrary variable lookup.
    ///
    /// Unset and empty variables fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> PomResult<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = var("BASE_URL") {
            config.base_url = url;
        }
        if let Some(username) = var("SAUCE_USERNAME") {
            config.credentials.username = username;
        }
        if let Some(password) = var("SAUCE_PASSWORD") {
            config.credentials.password = password;
        }
        if let Some(attr) = var("TEST_ID_ATTRIBUTE") {
            config.test_id_attribute = attr;
        }

        let t = &mut config.timeouts;
        for (key, slot) in [
            ("ACTION_TIMEOUT_MS", &mut t.action_ms),
            ("NAVIGATION_TIMEOUT_MS", &mut t.navigation_ms),
            ("EXPECT_TIMEOUT_MS", &mut t.assertion_ms),
            ("TEST_TIMEOUT_MS", &mut t.test_ms),
            ("POLL_INTERVAL_MS", &mut t.poll_interval_ms),
        ] {
            if let Some(raw) = var(key) {
                *slot = raw
                    .trim()
                    .parse()
                    .map_err(|_| PomError::config(format!("{key}={raw:?} is not a number")))?;
            }
        }

        if let Some(raw) = var("HEADLESS") {
            config.browser.headless = parse_bool("HEADLESS", &raw)?;
        }
        if let Some(path) = var("CHROMIUM_PATH") {
            config.browser.chromium_path = Some(path);
        }

        Ok(config)
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the credentials
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Set the timeouts
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.browser.headless = headless;
        self
    }

    /// URL of the application root
    #[must_use]
    pub fn root_url(&self) -> String {
        format!("{}/", self.base_url.trim_end_matches('/'))
    }

    /// Copy safe to print or serialize into reports
    #[must_use]
    pub fn redacted(&self) -> Self {
        Self {
            credentials: self.credentials.redacted(),
            ..self.clone()
        }
    }
}

fn parse_bool(key: &str, raw: &str) -> PomResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(PomError::config(format!("{key}={raw:?} is not a boolean"))),
    }
}
