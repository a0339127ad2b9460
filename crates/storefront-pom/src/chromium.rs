//! Chromium page handle over the DevTools protocol.
//!
//! Element lookup runs in the page: every match is tagged with a
//! `data-pom-ref` attribute whose value becomes the [`ElementRef`] id. A ref
//! that no longer resolves in the live document is reported as
//! [`PomError::StaleElement`]. Refs carry a per-document prefix so a handle
//! from before a navigation never aliases an element after it.
//!
//! Each [`ChromiumPage`] lives in its own browser context, so cookies and
//! local storage (which holds the cart) are never shared between scenarios.

#![allow(clippy::module_name_repetitions)]

use crate::config::BrowserSettings;
use crate::driver::{ElementRef, PageHandle};
use crate::result::{PomError, PomResult};
use crate::selector::{AriaRole, Strategy};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams,
};
use chromiumoxide::element::Element;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const REF_ATTRIBUTE: &str = "data-pom-ref";

/// A running Chromium instance
#[derive(Debug)]
pub struct ChromiumSession {
    browser: Arc<Mutex<Browser>>,
    handler: JoinHandle<()>,
}

impl ChromiumSession {
    /// Launch Chromium with `settings`.
    ///
    /// # Errors
    ///
    /// [`PomError::BrowserLaunch`] if no browser can be started.
    pub async fn launch(settings: &BrowserSettings) -> PomResult<Self> {
        let mut builder = BrowserConfig::builder()
            .window_size(settings.viewport_width, settings.viewport_height)
            .viewport(Viewport {
                width: settings.viewport_width,
                height: settings.viewport_height,
                ..Viewport::default()
            });

        if !settings.headless {
            builder = builder.with_head();
        }
        if !settings.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = settings.chromium_path {
            builder = builder.chrome_executable(path);
        }

        let config = builder
            .build()
            .map_err(|message| PomError::BrowserLaunch { message })?;
        let (browser, mut handler) =
            Browser::launch(config)
                .await
                .map_err(|e| PomError::BrowserLaunch {
                    message: e.to_string(),
                })?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        info!(headless = settings.headless, "chromium launched");
        Ok(Self {
            browser: Arc::new(Mutex::new(browser)),
            handler,
        })
    }

    /// Open a blank page in a fresh browser context
    pub async fn open_page(&self) -> PomResult<ChromiumPage> {
        let mut browser = self.browser.lock().await;
        let context = browser
            .create_browser_context(CreateBrowserContextParams::default())
            .await
            .map_err(|e| PomError::driver(e.to_string()))?;
        let params = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context.clone())
            .build()
            .map_err(PomError::driver)?;
        let page = browser
            .new_page(params)
            .await
            .map_err(|e| PomError::driver(e.to_string()))?;
        debug!(context = ?context, "opened page");
        Ok(ChromiumPage { page, context })
    }

    /// Close `page` and discard its browser context
    pub async fn close_page(&self, page: ChromiumPage) -> PomResult<()> {
        let ChromiumPage { page, context } = page;
        if let Err(e) = page.close().await {
            warn!(error = %e, "page already closed");
        }
        let browser = self.browser.lock().await;
        browser
            .dispose_browser_context(context)
            .await
            .map_err(|e| PomError::driver(e.to_string()))
    }

    /// Shut the browser down
    pub async fn close(self) -> PomResult<()> {
        let mut browser = self.browser.lock().await;
        browser
            .close()
            .await
            .map_err(|e| PomError::driver(e.to_string()))?;
        let _ = browser.wait().await;
        self.handler.abort();
        info!("chromium closed");
        Ok(())
    }
}

/// One tab in its own browser context
#[derive(Debug)]
pub struct ChromiumPage {
    page: Page,
    context: BrowserContextId,
}

impl ChromiumPage {
    async fn eval<T: DeserializeOwned>(&self, script: String) -> PomResult<T> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| PomError::driver(e.to_string()))?
            .into_value()
            .map_err(|e| PomError::driver(e.to_string()))
    }

    async fn element(&self, element: &ElementRef) -> PomResult<Element> {
        self.page
            .find_element(ref_selector(element)?)
            .await
            .map_err(|_| stale(element))
    }
}

fn stale(element: &ElementRef) -> PomError {
    PomError::StaleElement {
        id: element.id().to_string(),
    }
}

fn ref_selector(element: &ElementRef) -> PomResult<String> {
    Ok(format!(
        "[{REF_ATTRIBUTE}={}]",
        serde_json::to_string(element.id())?
    ))
}

const fn role_selector(role: AriaRole) -> &'static str {
    match role {
        AriaRole::Button => {
            r#"button, [role="button"], input[type="button"], input[type="submit"]"#
        }
        AriaRole::Link => r#"a[href], [role="link"]"#,
        AriaRole::Combobox => r#"select, [role="combobox"]"#,
    }
}

/// What the locate script reports
#[derive(Debug, Deserialize)]
struct Located {
    #[serde(default)]
    stale: bool,
    #[serde(default)]
    refs: Vec<String>,
}

/// Script returning the refs of every match, or `stale` if the scope is gone
fn locate_script(scope: Option<&ElementRef>, strategy: &Strategy) -> PomResult<String> {
    let scope = match scope {
        Some(el) => serde_json::to_string(&ref_selector(el)?)?,
        None => "null".to_string(),
    };
    let (css, name) = match strategy {
        Strategy::Role { role, name } => (role_selector(*role).to_string(), Some(name.as_str())),
        other => (other.to_css().unwrap_or_default(), None),
    };
    let css = serde_json::to_string(&css)?;
    let name = serde_json::to_string(&name)?;

    Ok(format!(
        r"(() => {{
  const root = {scope} === null ? document : document.querySelector({scope});
  if (!root) return {{ stale: true }};
  let nodes = Array.from(root.querySelectorAll({css}));
  const name = {name};
  if (name !== null) {{
    const re = new RegExp(name, 'i');
    nodes = nodes.filter(n => re.test((n.getAttribute('aria-label') || n.innerText || n.value || '').trim()));
  }}
  if (!window.__pomDoc) {{
    window.__pomDoc = Math.random().toString(36).slice(2);
    window.__pomSeq = 0;
  }}
  const refs = nodes.map(n => {{
    if (!n.getAttribute('{REF_ATTRIBUTE}')) {{
      n.setAttribute('{REF_ATTRIBUTE}', window.__pomDoc + '-' + (++window.__pomSeq));
    }}
    return n.getAttribute('{REF_ATTRIBUTE}');
  }});
  return {{ stale: false, refs }};
}})()"
    ))
}

fn visible_script(element: &ElementRef) -> PomResult<String> {
    let selector = serde_json::to_string(&ref_selector(element)?)?;
    Ok(format!(
        r"(() => {{
  const el = document.querySelector({selector});
  if (!el) return 'stale';
  const style = getComputedStyle(el);
  const rect = el.getBoundingClientRect();
  const shown = style.visibility !== 'hidden' && style.display !== 'none' && rect.width > 0 && rect.height > 0;
  return shown ? 'visible' : 'hidden';
}})()"
    ))
}

fn select_script(element: &ElementRef, value: &str) -> PomResult<String> {
    let selector = serde_json::to_string(&ref_selector(element)?)?;
    let value = serde_json::to_string(value)?;
    Ok(format!(
        r"(() => {{
  const el = document.querySelector({selector});
  if (!el) return 'stale';
  if (!Array.from(el.options || []).some(o => o.value === {value})) return 'missing';
  const setter = Object.getOwnPropertyDescriptor(HTMLSelectElement.prototype, 'value').set;
  setter.call(el, {value});
  el.dispatchEvent(new Event('change', {{ bubbles: true }}));
  return 'ok';
}})()"
    ))
}

/// Focuses a field and empties it, notifying framework listeners so an
/// empty fill is seen as a change
const CLEAR_FIELD_FN: &str = "function() {
  this.focus();
  this.value = '';
  this.dispatchEvent(new Event('input', { bubbles: true }));
  this.dispatchEvent(new Event('change', { bubbles: true }));
}";

#[async_trait]
impl PageHandle for ChromiumPage {
    async fn navigate(&self, url: &str) -> PomResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| PomError::NavigationFailure {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn locate(
        &self,
        scope: Option<&ElementRef>,
        strategy: &Strategy,
    ) -> PomResult<Vec<ElementRef>> {
        let located: Located = self.eval(locate_script(scope, strategy)?).await?;
        match (located.stale, scope) {
            (true, Some(scope)) => Err(stale(scope)),
            (true, None) => Err(PomError::driver("document unavailable")),
            (false, _) => Ok(located.refs.into_iter().map(ElementRef::new).collect()),
        }
    }

    async fn fill(&self, element: &ElementRef, text: &str) -> PomResult<()> {
        let el = self.element(element).await?;
        el.call_js_fn(CLEAR_FIELD_FN, false)
            .await
            .map_err(|e| PomError::driver(e.to_string()))?;
        if text.is_empty() {
            return Ok(());
        }
        el.type_str(text)
            .await
            .map_err(|e| PomError::driver(e.to_string()))?;
        Ok(())
    }

    async fn click(&self, element: &ElementRef) -> PomResult<()> {
        self.element(element)
            .await?
            .click()
            .await
            .map_err(|e| PomError::driver(e.to_string()))?;
        Ok(())
    }

    async fn read_text(&self, element: &ElementRef) -> PomResult<String> {
        let text = self
            .element(element)
            .await?
            .inner_text()
            .await
            .map_err(|e| PomError::driver(e.to_string()))?;
        Ok(text.unwrap_or_default())
    }

    async fn is_visible(&self, element: &ElementRef) -> PomResult<bool> {
        let status: String = self.eval(visible_script(element)?).await?;
        match status.as_str() {
            "visible" => Ok(true),
            "hidden" => Ok(false),
            _ => Err(stale(element)),
        }
    }

    async fn select_option(&self, element: &ElementRef, value: &str) -> PomResult<()> {
        let status: String = self.eval(select_script(element, value)?).await?;
        match status.as_str() {
            "ok" => Ok(()),
            "stale" => Err(stale(element)),
            _ => Err(PomError::driver(format!("no option with value {value:?}"))),
        }
    }
}
