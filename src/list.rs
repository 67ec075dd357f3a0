//! Deployment listing via the `wrangler` CLI.
//!
//! `wrangler pages deployment list` prints a human-readable table, newest
//! deployment first. There is no stable machine-readable mode, so rows are
//! matched line by line: the first canonical deployment id sitting in a
//! table cell wins. This tolerates reordered and extra columns.

use std::io::{self, Read};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::LazyLock;

use regex::Regex;

use crate::config::Credentials;
use crate::model::DeploymentId;

/// Upper bound on captured `wrangler` stdout.
pub const MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// A deployment id inside a table cell. Wrangler draws cells with the
/// box-drawing `│`; plain `|` is accepted too.
static DEPLOYMENT_CELL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"[|│]\s+([0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12})\s+[|│]",
    )
    .expect("deployment cell pattern is valid")
});

#[derive(Debug, thiserror::Error)]
pub enum ListError {
    #[error("failed to run {program}: {source}")]
    Spawn { program: String, source: io::Error },

    #[error("wrangler exited with {0}")]
    Exit(ExitStatus),

    #[error("wrangler output exceeded {limit} bytes")]
    Overflow { limit: usize },

    #[error("failed to capture wrangler output: {0}")]
    Capture(io::Error),
}

/// Source of a project's deployments, newest first.
pub trait ListDeployments {
    fn list(&self, project: &str) -> Result<Vec<DeploymentId>, ListError>;
}

/// Lists deployments by running `wrangler pages deployment list`.
pub struct WranglerLister {
    /// Program followed by any leading arguments, e.g. `["npx", "wrangler"]`.
    command: Vec<String>,
    credentials: Credentials,
}

impl WranglerLister {
    pub fn new(command: Vec<String>, credentials: Credentials) -> Self {
        Self {
            command,
            credentials,
        }
    }
}

impl ListDeployments for WranglerLister {
    fn list(&self, project: &str) -> Result<Vec<DeploymentId>, ListError> {
        let (program, leading) = self
            .command
            .split_first()
            .map_or(("wrangler", &[][..]), |(p, rest)| (p.as_str(), rest));

        tracing::debug!(program, project, "listing deployments");

        let mut child = Command::new(program)
            .args(leading)
            .args(["pages", "deployment", "list", "--project-name", project])
            .env("CLOUDFLARE_ACCOUNT_ID", &self.credentials.account_id)
            .env("CLOUDFLARE_API_TOKEN", self.credentials.api_token.expose())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| ListError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let Some(stdout) = child.stdout.take() else {
            abandon(&mut child);
            return Err(ListError::Capture(io::Error::other("stdout was not piped")));
        };

        // Read one byte past the limit to tell "exactly full" from "overflowed".
        let mut captured = Vec::new();
        if let Err(e) = stdout
            .take(MAX_OUTPUT_BYTES as u64 + 1)
            .read_to_end(&mut captured)
        {
            abandon(&mut child);
            return Err(ListError::Capture(e));
        }
        if captured.len() > MAX_OUTPUT_BYTES {
            abandon(&mut child);
            return Err(ListError::Overflow {
                limit: MAX_OUTPUT_BYTES,
            });
        }

        let status = child.wait().map_err(ListError::Capture)?;
        if !status.success() {
            return Err(ListError::Exit(status));
        }

        let ids = parse_deployment_table(&String::from_utf8_lossy(&captured));
        tracing::debug!(count = ids.len(), "parsed deployment table");
        Ok(ids)
    }
}

/// Kill and reap a child we no longer want output from.
fn abandon(child: &mut std::process::Child) {
    if let Err(e) = child.kill() {
        tracing::debug!(error = %e, "wrangler already exited");
    }
    let _ = child.wait();
}

/// Extract deployment ids from wrangler's table output, in row order.
///
/// Rows without an id cell (borders, headers, banners) are skipped.
/// Duplicates are kept.
pub fn parse_deployment_table(output: &str) -> Vec<DeploymentId> {
    output
        .lines()
        .filter_map(|line| DEPLOYMENT_CELL.captures(line))
        .filter_map(|caps| DeploymentId::parse(&caps[1]).ok())
        .collect()
}
