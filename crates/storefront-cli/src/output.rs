//! Run reporting: per-scenario result lines, a progress bar and the summary

use crate::runner::{RunSummary, ScenarioResult};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

/// Output format for run results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text on stderr
    #[default]
    Text,
    /// JSON summary on stdout
    Json,
}

/// Writes scenario results to stderr as they finish.
///
/// Quiet mode keeps failures and a failing summary, nothing else. The
/// progress bar is only drawn on a terminal.
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    bar: Option<ProgressBar>,
    color: bool,
    quiet: bool,
}

impl ProgressReporter {
    /// Create a reporter on stderr
    #[must_use]
    pub fn new(color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            bar: None,
            color,
            quiet,
        }
    }

    /// Announce a run of `total` scenarios
    pub fn run_started(&mut self, total: usize) {
        if self.quiet {
            return;
        }
        let title = format!("Running {total} scenarios");
        self.line("");
        if self.color {
            self.line(&style(title).bold().underlined().to_string());
        } else {
            self.line(&format!("=== {title} ==="));
        }

        if self.term.is_term() {
            let bar = ProgressBar::new(total as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=>-"),
            );
            self.bar = Some(bar);
        }
    }

    /// Report one finished scenario
    pub fn scenario_finished(&self, result: &ScenarioResult) {
        if let Some(ref bar) = self.bar {
            bar.set_message(result.scenario.name());
            bar.inc(1);
        }
        if result.passed && self.quiet {
            return;
        }
        self.line(&result_line(result, self.color));
    }

    /// Report that in-flight scenarios were dropped
    pub fn run_interrupted(&self, finished: usize, total: usize) {
        if self.quiet {
            return;
        }
        let mark = if self.color {
            style("⚠").yellow().bold().to_string()
        } else {
            "WARN".to_string()
        };
        self.line(&format!(
            "{mark} interrupted after {finished} of {total} scenarios; in-flight scenarios were aborted"
        ));
    }

    /// Clear the progress bar
    pub fn run_finished(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }

    /// Print the closing summary line
    pub fn summary(&self, summary: &RunSummary) {
        if self.quiet && summary.failed() == 0 {
            return;
        }
        self.line("");
        self.line(&summary_line(summary, self.color));
    }

    fn line(&self, message: &str) {
        let write = || {
            let _ = self.term.write_line(message);
        };
        match self.bar {
            Some(ref bar) => bar.suspend(write),
            None => write(),
        }
    }
}

/// `PASS Title (12 ms): detail` or `FAIL Title on the cart page: error`
fn result_line(result: &ScenarioResult, color: bool) -> String {
    let title = result.scenario.title();
    if result.passed {
        let mark = if color {
            style("✓").green().bold().to_string()
        } else {
            "PASS".to_string()
        };
        let detail = result.detail.as_deref().unwrap_or_default();
        format!("{mark} {title} ({} ms): {detail}", result.duration_ms)
    } else {
        let mark = if color {
            style("✗").red().bold().to_string()
        } else {
            "FAIL".to_string()
        };
        let error = result.error.as_deref().unwrap_or_default();
        format!("{mark} {title} on the {} page: {error}", result.state)
    }
}

fn summary_line(summary: &RunSummary, color: bool) -> String {
    let failed = summary.failed();
    let status = match (failed > 0 || summary.interrupted, color) {
        (true, true) => style("FAILED").red().bold().to_string(),
        (true, false) => "FAILED".to_string(),
        (false, true) => style("PASSED").green().bold().to_string(),
        (false, false) => "PASSED".to_string(),
    };
    let total = summary.total() + summary.skipped;
    let secs = summary.duration_ms as f64 / 1000.0;
    format!(
        "{status} {total} scenarios in {secs:.2}s ({} passed, {failed} failed, {} skipped)",
        summary.passed(),
        summary.skipped
    )
}
