//! Page handle - the browser capability set the page objects consume.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  PageHandle (abstract trait)                                  │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────────────────┐      ┌──────────────────────────┐  │
//! │  │  ChromiumPage        │      │  MockStorefront          │  │
//! │  │  (feature `browser`) │      │  (in-memory storefront)  │  │
//! │  │  CDP (chromiumoxide) │      │  unit tests, --mock runs │  │
//! │  └──────────────────────┘      └──────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! A handle is owned by the scenario for the duration of one test and lent to
//! every page object it constructs. Element references returned by
//! [`PageHandle::locate`] are only valid until the next re-render; using one
//! afterwards fails with [`PomError::StaleElement`](crate::PomError::StaleElement).

use crate::result::PomResult;
use crate::selector::Strategy;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque reference to one element of a live document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementRef {
    id: String,
}

impl ElementRef {
    /// Wrap a driver-specific element id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Driver-specific element id
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Browser operations available to page objects.
///
/// Implementations perform each operation once and return; auto-waiting and
/// polling live in [`SelectorResolver`](crate::SelectorResolver),
/// [`wait_for_visible`](crate::wait_for_visible) and [`Poll`](crate::Poll).
#[async_trait]
pub trait PageHandle: Send + Sync {
    /// Load `url` and wait for the document to settle
    async fn navigate(&self, url: &str) -> PomResult<()>;

    /// Elements matching `strategy`, in document order, optionally searched
    /// only below `scope`. An empty result is not an error.
    async fn locate(
        &self,
        scope: Option<&ElementRef>,
        strategy: &Strategy,
    ) -> PomResult<Vec<ElementRef>>;

    /// Replace the value of an input with `text`
    async fn fill(&self, element: &ElementRef, text: &str) -> PomResult<()>;

    /// Click an element
    async fn click(&self, element: &ElementRef) -> PomResult<()>;

    /// Rendered text of an element
    async fn read_text(&self, element: &ElementRef) -> PomResult<String>;

    /// Whether an element is currently rendered with a non-empty box
    async fn is_visible(&self, element: &ElementRef) -> PomResult<bool>;

    /// Choose the `<option>` with `value` in a `<select>`
    async fn select_option(&self, element: &ElementRef, value: &str) -> PomResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_ref_roundtrip_id() {
        let el = ElementRef::new("3:username");
        assert_eq!(el.id(), "3:username");
        assert_eq!(el.to_string(), "3:username");
    }
}
