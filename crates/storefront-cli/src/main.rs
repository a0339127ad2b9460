//! Storefront E2E CLI
//!
//! Usage:
//!   storefront-e2e run                   # Run every scenario in Chromium
//!   storefront-e2e run --mock            # Run against the in-memory storefront
//!   storefront-e2e run -s checkout -j 1  # One scenario, one worker
//!   storefront-e2e list                  # List scenarios
//!   storefront-e2e config                # Show resolved configuration

use clap::Parser;
use std::process::ExitCode;
use storefront_e2e::{
    load_env_file, logging, Cli, CliConfig, CliError, CliResult, Commands, MockSource,
    OutputFormat, PageSource, ProgressReporter, RunArgs, RunSummary, ScenarioRunner, Verbosity,
};
use storefront_pom::{FixtureData, HarnessConfig, Scenario, MOCK_BASE_URL};
use tracing::{debug, warn};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let env_file = load_env_file(cli.env_file.as_deref())?;
    let config = build_config(&cli);
    logging::init(config.verbosity.default_log_filter(), cli.log_json);
    if let Some(path) = env_file {
        debug!(path = %path.display(), "loaded env file");
    }

    match cli.command {
        Commands::Run(ref args) => run_scenarios(&config, args),
        Commands::List => {
            list_scenarios();
            Ok(())
        }
        Commands::Config => show_config(),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let config = CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(cli.color.into());
    match cli.command {
        Commands::Run(ref args) => config
            .with_workers(args.workers)
            .with_fail_fast(args.fail_fast),
        _ => config,
    }
}

fn run_scenarios(config: &CliConfig, args: &RunArgs) -> CliResult<()> {
    let mut harness = HarnessConfig::from_env()?;
    if args.headed {
        harness = harness.with_headless(false);
    }
    if args.mock {
        harness = harness.with_base_url(MOCK_BASE_URL);
    }
    let fixtures = match args.fixtures {
        Some(ref path) => FixtureData::load(path)?,
        None => FixtureData::default(),
    };

    let mut scenarios: Vec<Scenario> = Vec::new();
    for scenario in args.scenarios.iter().copied().map(Scenario::from) {
        if !scenarios.contains(&scenario) {
            scenarios.push(scenario);
        }
    }
    if scenarios.is_empty() {
        scenarios = Scenario::ALL.to_vec();
    }

    let format = OutputFormat::from(args.format);
    let mut reporter =
        ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());

    let runner = ScenarioRunner::new(config.clone(), harness.clone(), fixtures);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let summary = runtime.block_on(async {
        if args.mock {
            execute(&runner, MockSource::new(), &scenarios, &mut reporter).await
        } else {
            launch_and_execute(&runner, &harness, &scenarios, &mut reporter).await
        }
    })?;

    match format {
        OutputFormat::Text => reporter.summary(&summary),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }

    if summary.interrupted {
        return Err(CliError::Interrupted);
    }
    if !summary.all_passed() {
        return Err(CliError::ScenariosFailed {
            failed: summary.failed(),
            total: scenarios.len(),
        });
    }
    Ok(())
}

async fn execute<S: PageSource>(
    runner: &ScenarioRunner,
    source: S,
    scenarios: &[Scenario],
    reporter: &mut ProgressReporter,
) -> CliResult<RunSummary> {
    let summary = runner.run(&source, scenarios, reporter).await;
    if let Err(e) = source.shutdown().await {
        warn!(error = %e, "page source shutdown failed");
    }
    Ok(summary)
}

#[cfg(feature = "browser")]
async fn launch_and_execute(
    runner: &ScenarioRunner,
    harness: &HarnessConfig,
    scenarios: &[Scenario],
    reporter: &mut ProgressReporter,
) -> CliResult<RunSummary> {
    let source = storefront_e2e::ChromiumSource::launch(&harness.browser).await?;
    execute(runner, source, scenarios, reporter).await
}

#[cfg(not(feature = "browser"))]
async fn launch_and_execute(
    _runner: &ScenarioRunner,
    _harness: &HarnessConfig,
    _scenarios: &[Scenario],
    _reporter: &mut ProgressReporter,
) -> CliResult<RunSummary> {
    Err(CliError::browser_unavailable(
        "built without the `browser` feature; use --mock",
    ))
}

fn list_scenarios() {
    for scenario in Scenario::ALL {
        println!("{:<14} {}", scenario.name(), scenario.title());
    }
}

fn show_config() -> CliResult<()> {
    let harness = HarnessConfig::from_env()?;
    println!("{}", serde_json::to_string_pretty(&harness.redacted())?);
    Ok(())
}
