//! CLI interface and run driver.
//!
//! One invocation reaps one project: list its deployments, keep the newest,
//! delete the rest one by one, then print a summary banner.
//!
//! Per-deployment failures never fail the run. Only configuration problems
//! and driver errors produce a non-zero exit.

mod format;

use clap::Parser;
use jiff::Timestamp;

use crate::api::{CloudflareClient, DeleteDeployment};
use crate::config::{Config, ConfigError, Overrides};
use crate::console::Console;
use crate::list::{ListDeployments, WranglerLister};
use crate::model::{Failure, Outcome, RunReport};
use crate::reap::Reaper;
use crate::retention::Retention;

use format::{format_banner, format_elapsed};

/// Delete every Cloudflare Pages deployment of a project except the newest.
///
/// Credentials come from `CF_ACCOUNT_ID` and `CF_API_TOKEN`.
#[derive(Debug, Parser)]
#[command(name = "pages-reaper", version, after_long_help = ENV_HELP)]
pub struct Cli {
    /// Pages project to reap. Defaults to `CF_PAGES_PROJECT_NAME`,
    /// then the config file, then the built-in project.
    #[arg(long)]
    project: Option<String>,

    /// Program to run instead of `npx wrangler` for listing deployments.
    #[arg(long)]
    wrangler: Option<String>,

    /// List and plan, but delete nothing.
    #[arg(long)]
    dry_run: bool,

    /// Also print the run report as JSON after the banner.
    #[arg(long)]
    json: bool,
}

const ENV_HELP: &str = r"Environment:
  CF_ACCOUNT_ID           Cloudflare account id (required)
  CF_API_TOKEN            API token with Pages edit permission (required)
  CF_PAGES_PROJECT_NAME   Project to reap (optional)
  PAGES_REAPER_LOG        Log filter, e.g. `debug` (default: warn)

Config file (optional): ~/.pages-reaper/config.toml
  project, api-base, wrangler, request-timeout-secs";

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build HTTP client: {0}")]
    Client(reqwest::Error),

    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Options that shape a run without touching configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub dry_run: bool,
}

/// Parse arguments, wire real collaborators, and run.
pub fn run() -> Result<(), RunError> {
    let cli = Cli::parse();
    let overrides = Overrides {
        project: cli.project,
        wrangler: cli.wrangler,
    };

    // Fails before anything is spawned or sent.
    let config = Config::load(&overrides)?;

    let lister = WranglerLister::new(config.wrangler.clone(), config.credentials.clone());
    let api = CloudflareClient::new(&config).map_err(|e| RunError::Client(e.without_url()))?;
    let mut console = Console::stdio();

    let report = execute(
        &config,
        &lister,
        &api,
        RunOptions {
            dry_run: cli.dry_run,
        },
        &mut console,
    );

    if cli.json {
        console.say(serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}

/// Run the pipeline against the given collaborators and return the report.
///
/// A listing failure degrades to an empty list.
pub fn execute(
    config: &Config,
    lister: &impl ListDeployments,
    api: &impl DeleteDeployment,
    options: RunOptions,
    console: &mut Console,
) -> RunReport {
    let started_at = Timestamp::now();
    let project = config.project.as_str();
    tracing::info!(project, dry_run = options.dry_run, "starting run");

    console.say(format!("Cloudflare Pages reaper: project {project}"));
    console.say("Listing deployments...");

    let deployments = lister.list(project).unwrap_or_else(|e| {
        console.warn(format!("error: could not list deployments: {e}"));
        tracing::warn!(error = %e, "listing degraded to empty");
        Vec::new()
    });
    console.say(format!("Found {} deployments", deployments.len()));

    let Retention { keep, delete } = Retention::partition(deployments);

    if let Some(id) = &keep {
        console.say(format!("Keeping most recent deployment: {id}"));
    }

    let mut report = RunReport {
        project: project.to_string(),
        deleted: 0,
        failed: 0,
        kept: keep,
        failures: Vec::new(),
        planned: Vec::new(),
        dry_run: options.dry_run,
        started_at,
        finished_at: started_at,
    };

    if delete.is_empty() {
        console.say("No deployments found to delete");
    } else if options.dry_run {
        console.say(format!("Dry run: would delete {} deployments", delete.len()));
        for id in &delete {
            console.say(format!("  {id}"));
        }
        report.planned = delete;
    } else {
        console.say(format!("Deleting {} deployments...", delete.len()));
        let tally =
            Reaper::new(api, config.pause, config.progress_every).run(&delete, console);
        report.deleted = tally.deleted;
        report.failed = tally.failed;
        report.failures = tally
            .outcomes
            .into_iter()
            .filter_map(|(deployment, outcome)| match outcome {
                Outcome::Failed { reason } => Some(Failure { deployment, reason }),
                Outcome::Deleted => None,
            })
            .collect();
    }

    report.finished_at = Timestamp::now();
    tracing::info!(
        total = report.total(),
        deleted = report.deleted,
        failed = report.failed,
        kept = report.kept_count(),
        "run finished"
    );

    console.say(format_banner(&report));
    console.say(format!("Finished in {}", format_elapsed(&report)));
    report
}
