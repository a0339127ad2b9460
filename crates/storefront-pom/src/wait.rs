//! Element waits built on the poll helper.

use crate::assertions::TextPattern;
use crate::driver::{ElementRef, PageHandle};
use crate::poll::{Poll, PollConfig};
use crate::result::PomResult;

/// Wait until `element` is rendered visibly.
///
/// # Errors
///
/// [`PomError::AssertionTimeout`](crate::PomError::AssertionTimeout) if it
/// stays hidden past the deadline.
pub async fn wait_for_visible<P: PageHandle + ?Sized>(
    page: &P,
    element: &ElementRef,
    config: PollConfig,
) -> PomResult<()> {
    Poll::new(format!("{element} is visible"), move || {
        page.is_visible(element)
    })
    .with_config(config)
    .until("visible", |visible| *visible)
    .await
    .map(|_| ())
}

/// Wait until the text of `element` matches `pattern`; returns that text.
pub async fn wait_for_text<P: PageHandle + ?Sized>(
    page: &P,
    element: &ElementRef,
    pattern: &TextPattern,
    config: PollConfig,
) -> PomResult<String> {
    Poll::new(format!("text of {element}"), move || page.read_text(element))
        .with_config(config)
        .to_match(pattern)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HarnessConfig, Timeouts};
    use crate::mock::{MockStorefront, MOCK_BASE_URL};
    use crate::selector::{SelectorResolver, UiElement};
    use crate::PomError;

    fn config() -> HarnessConfig {
        HarnessConfig::new()
            .with_base_url(MOCK_BASE_URL)
            .with_timeouts(Timeouts::fast())
    }

    #[tokio::test]
    async fn test_wait_for_visible_after_render() {
        let page = MockStorefront::new().with_render_delay(2);
        let config = config();
        page.navigate(&config.root_url()).await.unwrap();

        let resolver = SelectorResolver::new(&page, &config);
        let username = resolver.resolve(UiElement::Username).await.unwrap();
        assert!(!page.is_visible(&username).await.unwrap());
        wait_for_visible(&page, &username, PollConfig::action(&config.timeouts))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_for_text_mismatch_times_out() {
        let page = MockStorefront::new();
        let config = config();
        page.navigate(&config.root_url()).await.unwrap();
        page.login_directly().unwrap();

        let resolver = SelectorResolver::new(&page, &config);
        let title = resolver.resolve(UiElement::Title).await.unwrap();
        let pattern = TextPattern::checkout_complete_title().unwrap();
        let err = wait_for_text(&page, &title, &pattern, PollConfig::from_timeouts(&config.timeouts))
            .await
            .unwrap_err();
        match err {
            PomError::AssertionTimeout { last_observed, .. } => {
                assert_eq!(last_observed, "\"Products\"");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
