//! Scenario runner
//!
//! Every scenario gets its own page from a [`PageSource`] and runs under
//! the per-test deadline. Up to `workers` scenarios are in flight at once
//! on the calling task; an interrupt drops whatever is still running.

use crate::config::CliConfig;
use crate::error::CliResult;
use crate::output::ProgressReporter;
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use storefront_pom::{
    FixtureData, HarnessConfig, Markup, MockStorefront, PageHandle, PageState, Scenario,
};
use tracing::{debug, info, warn};

/// Hands out one isolated page per scenario
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Page handle type
    type Page: PageHandle;

    /// Open a fresh page that shares no state with any other
    async fn open(&self) -> CliResult<Self::Page>;

    /// Tear a page down; failures are logged, not raised
    async fn close(&self, page: Self::Page);

    /// Release the source and every page still open on it
    async fn shutdown(self) -> CliResult<()>;
}

/// Pages backed by [`MockStorefront`]
#[derive(Debug)]
pub struct MockSource {
    markup: Markup,
    render_delay: u32,
    badge_lag: u32,
    live: AtomicUsize,
}

impl Default for MockSource {
    fn default() -> Self {
        Self {
            markup: Markup::Modern,
            render_delay: 2,
            badge_lag: 2,
            live: AtomicUsize::new(0),
        }
    }
}

impl MockSource {
    /// Mock pages with a short render delay and badge lag
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve the given markup
    #[must_use]
    pub const fn with_markup(mut self, markup: Markup) -> Self {
        self.markup = markup;
        self
    }

    /// Locate calls that come back empty after each navigation
    #[must_use]
    pub const fn with_render_delay(mut self, queries: u32) -> Self {
        self.render_delay = queries;
        self
    }

    /// Pages opened and not yet closed
    #[must_use]
    pub fn live_pages(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageSource for MockSource {
    type Page = MockStorefront;

    async fn open(&self) -> CliResult<MockStorefront> {
        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(MockStorefront::new()
            .with_markup(self.markup)
            .with_render_delay(self.render_delay)
            .with_badge_lag(self.badge_lag))
    }

    async fn close(&self, page: MockStorefront) {
        debug!(calls = page.history().len(), "closing mock page");
        self.live.fetch_sub(1, Ordering::SeqCst);
    }

    async fn shutdown(self) -> CliResult<()> {
        Ok(())
    }
}

/// Pages in isolated Chromium browser contexts
#[cfg(feature = "browser")]
#[derive(Debug)]
pub struct ChromiumSource {
    session: storefront_pom::ChromiumSession,
}

#[cfg(feature = "browser")]
impl ChromiumSource {
    /// Launch the browser
    pub async fn launch(settings: &storefront_pom::BrowserSettings) -> CliResult<Self> {
        storefront_pom::ChromiumSession::launch(settings)
            .await
            .map(|session| Self { session })
            .map_err(|e| crate::error::CliError::browser_unavailable(e.to_string()))
    }
}

#[cfg(feature = "browser")]
#[async_trait]
impl PageSource for ChromiumSource {
    type Page = storefront_pom::ChromiumPage;

    async fn open(&self) -> CliResult<Self::Page> {
        Ok(self.session.open_page().await?)
    }

    async fn close(&self, page: Self::Page) {
        if let Err(e) = self.session.close_page(page).await {
            warn!(error = %e, "failed to dispose browser context");
        }
    }

    async fn shutdown(self) -> CliResult<()> {
        Ok(self.session.close().await?)
    }
}

/// Outcome of one scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Scenario that ran
    pub scenario: Scenario,
    /// Whether it passed
    pub passed: bool,
    /// Last page reached
    pub state: PageState,
    /// Pages passed through; empty when the scenario failed
    pub visited: Vec<PageState>,
    /// What the final assertion observed
    pub detail: Option<String>,
    /// Error kind if failed
    pub error_kind: Option<String>,
    /// Error message if failed
    pub error: Option<String>,
    /// Wall time in milliseconds
    pub duration_ms: u64,
}

impl ScenarioResult {
    /// Create a passing result
    #[must_use]
    pub fn pass(report: storefront_pom::ScenarioReport) -> Self {
        Self {
            scenario: report.scenario,
            passed: true,
            state: report.final_state,
            visited: report.visited,
            detail: Some(report.detail),
            error_kind: None,
            error: None,
            duration_ms: millis(report.duration),
        }
    }

    /// Create a failing result
    #[must_use]
    pub fn fail(
        scenario: Scenario,
        state: PageState,
        kind: impl Into<String>,
        error: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            scenario,
            passed: false,
            state,
            visited: Vec::new(),
            detail: None,
            error_kind: Some(kind.into()),
            error: Some(error.into()),
            duration_ms: millis(duration),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Aggregated run results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// Results in scenario order
    pub results: Vec<ScenarioResult>,
    /// Scenarios never started or dropped mid-run
    pub skipped: usize,
    /// Whether the run was interrupted
    pub interrupted: bool,
    /// Wall time in milliseconds
    pub duration_ms: u64,
}

impl RunSummary {
    /// Count passed scenarios
    #[must_use]
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    /// Count failed scenarios
    #[must_use]
    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| !r.passed).count()
    }

    /// Scenarios that finished
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Check if every requested scenario ran and passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        !self.interrupted && self.skipped == 0 && self.failed() == 0
    }

    /// Get failed results
    #[must_use]
    pub fn failures(&self) -> Vec<&ScenarioResult> {
        self.results.iter().filter(|r| !r.passed).collect()
    }
}

/// Runs scenarios against pages from a [`PageSource`]
#[derive(Debug)]
pub struct ScenarioRunner {
    config: CliConfig,
    harness: HarnessConfig,
    fixtures: FixtureData,
}

impl ScenarioRunner {
    /// Create a runner
    #[must_use]
    pub const fn new(config: CliConfig, harness: HarnessConfig, fixtures: FixtureData) -> Self {
        Self {
            config,
            harness,
            fixtures,
        }
    }

    /// Run `scenarios` until done or until Ctrl-C
    pub async fn run<S: PageSource>(
        &self,
        source: &S,
        scenarios: &[Scenario],
        reporter: &mut ProgressReporter,
    ) -> RunSummary {
        let interrupt = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "cannot listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        };
        self.run_until(source, scenarios, reporter, interrupt).await
    }

    /// Run `scenarios` until done or until `interrupt` resolves.
    ///
    /// An interrupt drops every in-flight scenario; their pages are left to
    /// [`PageSource::shutdown`].
    pub async fn run_until<S, I>(
        &self,
        source: &S,
        scenarios: &[Scenario],
        reporter: &mut ProgressReporter,
        interrupt: I,
    ) -> RunSummary
    where
        S: PageSource,
        I: Future<Output = ()>,
    {
        let start = Instant::now();
        let workers = self.config.workers.max(1);
        info!(scenarios = scenarios.len(), workers, "starting run");
        reporter.run_started(scenarios.len());

        let shared = &*reporter;
        let mut results = Vec::with_capacity(scenarios.len());
        let interrupted = {
            let collect = async {
                let runs = futures::stream::iter(scenarios.iter().copied())
                    .map(|scenario| self.run_one(source, scenario))
                    .buffer_unordered(workers);
                let mut runs = std::pin::pin!(runs);
                while let Some(result) = runs.next().await {
                    shared.scenario_finished(&result);
                    let stop = self.config.fail_fast && !result.passed;
                    results.push(result);
                    if stop {
                        info!("stopping after first failure");
                        break;
                    }
                }
            };
            tokio::select! {
                () = collect => false,
                () = interrupt => true,
            }
        };
        reporter.run_finished();

        if interrupted {
            warn!(finished = results.len(), "run interrupted");
            reporter.run_interrupted(results.len(), scenarios.len());
        }

        results.sort_by_key(|r: &ScenarioResult| {
            Scenario::ALL
                .iter()
                .position(|s| *s == r.scenario)
                .unwrap_or(usize::MAX)
        });
        RunSummary {
            skipped: scenarios.len() - results.len(),
            results,
            interrupted,
            duration_ms: millis(start.elapsed()),
        }
    }

    async fn run_one<S: PageSource>(&self, source: &S, scenario: Scenario) -> ScenarioResult {
        let start = Instant::now();
        let page = match source.open().await {
            Ok(page) => page,
            Err(e) => {
                warn!(scenario = scenario.name(), error = %e, "cannot open page");
                return ScenarioResult::fail(
                    scenario,
                    PageState::Unauthenticated,
                    "Driver",
                    e.to_string(),
                    start.elapsed(),
                );
            }
        };

        let outcome = scenario.run(&page, &self.harness, &self.fixtures).await;
        source.close(page).await;

        match outcome {
            Ok(report) => ScenarioResult::pass(report),
            Err(failure) => ScenarioResult::fail(
                scenario,
                failure.state,
                failure.source.kind(),
                failure.source.to_string(),
                failure.duration,
            ),
        }
    }
}
