//! Retention policy: which deployments survive a run.
//!
//! Wrangler lists newest first, so the first entry is the live production
//! deployment. It is kept; everything after it is deleted in listed order.

use crate::model::DeploymentId;

/// A deployment list split into the one to keep and the ones to delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retention {
    pub keep: Option<DeploymentId>,
    pub delete: Vec<DeploymentId>,
}

impl Retention {
    /// Keep the newest deployment, delete the rest.
    pub fn partition(deployments: Vec<DeploymentId>) -> Self {
        let mut deployments = deployments.into_iter();
        let keep = deployments.next();
        Self {
            keep,
            delete: deployments.collect(),
        }
    }
}
