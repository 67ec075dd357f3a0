//! Per-deployment outcomes and the end-of-run summary.

use jiff::Timestamp;
use serde::Serialize;

use super::DeploymentId;

/// Terminal state of one deletion attempt.
///
/// Both states are final for the run; failed deployments are not retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Deleted,

    Failed {
        /// Human-readable reason, free of credentials.
        reason: String,
    },
}

impl Outcome {
    pub fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted)
    }
}

/// A deletion that failed, as reported to the operator.
#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    pub deployment: DeploymentId,
    pub reason: String,
}

/// Summary of a reaping run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub project: String,
    pub deleted: usize,
    pub failed: usize,

    /// The retained deployment, if the project had any.
    pub kept: Option<DeploymentId>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<Failure>,

    /// Deployments that would have been deleted, filled only on dry runs.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub planned: Vec<DeploymentId>,

    pub dry_run: bool,
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
}

impl RunReport {
    /// Number of retained deployments: zero or one.
    pub fn kept_count(&self) -> usize {
        usize::from(self.kept.is_some())
    }

    /// Total deployments the run accounted for.
    pub fn total(&self) -> usize {
        self.kept_count() + self.deleted + self.failed + self.planned.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(kept: Option<&str>, deleted: usize, failed: usize) -> RunReport {
        let now = Timestamp::now();
        RunReport {
            project: "site".to_string(),
            deleted,
            failed,
            kept: kept.map(|k| DeploymentId::parse(k).unwrap()),
            failures: Vec::new(),
            planned: Vec::new(),
            dry_run: false,
            started_at: now,
            finished_at: now,
        }
    }

    #[test]
    fn kept_count_is_zero_or_one() {
        assert_eq!(report(None, 0, 0).kept_count(), 0);
        assert_eq!(
            report(Some("aaaaaaaa-aaaa-aaaa-aaaa-aaaaaaaaaaaa"), 0, 0).kept_count(),
            1
        );
    }

    #[test]
    fn total_adds_every_bucket() {
        let r = report(Some("aaaaaaaa-aaaa-aaaa-aaaa-aaaaaaaaaaaa"), 2, 1);
        assert_eq!(r.total(), 4);
    }

    #[test]
    fn serializes_camel_case_without_credentials() {
        let r = report(Some("aaaaaaaa-aaaa-aaaa-aaaa-aaaaaaaaaaaa"), 2, 1);
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"dryRun\":false"));
        assert!(json.contains("\"kept\":\"aaaaaaaa-aaaa-aaaa-aaaa-aaaaaaaaaaaa\""));
        assert!(!json.contains("planned"));
        assert!(!json.contains("failures"));
    }
}
