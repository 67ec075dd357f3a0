//! Core data model for the reaper.
//!
//! These types flow through the pipeline: deployment identifiers produced by
//! the lister, per-deployment outcomes from the reaper loop, and the run
//! report printed at the end.

mod deployment;
mod report;

pub use deployment::DeploymentId;
pub use report::{Failure, Outcome, RunReport};
